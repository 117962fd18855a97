use super::helpers::{bytes_i32, i32_bytes, run_collective};
use strata::{DataType, Datatype, Locality, StrataConfig, StrataError, TransferDescriptor};

fn flat() -> StrataConfig {
    StrataConfig {
        hierarchical: false,
        ..StrataConfig::default()
    }
}

#[tokio::test]
async fn test_flat_scatterv_gatherv_round_trip() {
    let results = run_collective(Locality::cluster(&[5]), flat(), |c| async move {
        let i32s = Datatype::predefined(DataType::I32);
        let counts = [2usize, 1, 0, 3, 1];
        let displs = [0isize, 2, 3, 3, 6];
        let desc = TransferDescriptor::wide(&counts, &displs).unwrap();
        let rank = c.rank() as usize;

        let sbuf = i32_bytes(&(0..7).collect::<Vec<_>>());
        let mut mine = vec![0u8; counts[rank] * 4];
        c.scatterv(&sbuf, &desc, &i32s, &mut mine, counts[rank], &i32s, 4)
            .await
            .unwrap();

        let mut back = vec![0u8; 7 * 4];
        c.gatherv(&mine, counts[rank], &i32s, &mut back, &desc, &i32s, 4)
            .await
            .unwrap();
        (bytes_i32(&mine), bytes_i32(&back))
    })
    .await;

    assert_eq!(results[0].0, vec![0, 1]);
    assert_eq!(results[2].0, Vec::<i32>::new());
    assert_eq!(results[3].0, vec![3, 4, 5]);
    assert_eq!(results[4].1, (0..7).collect::<Vec<_>>());
}

#[tokio::test]
async fn test_invalid_root_rejected() {
    let results = run_collective(Locality::cluster(&[2]), flat(), |c| async move {
        let u8s = Datatype::bytes();
        let mut rbuf = [0u8; 1];
        c.scatterv(&[], &TransferDescriptor::empty(), &u8s, &mut rbuf, 1, &u8s, 9)
            .await
    })
    .await;

    for r in results {
        assert!(matches!(r, Err(StrataError::InvalidRank { rank: 9, .. })));
    }
}

#[tokio::test]
async fn test_descriptor_length_checked_at_root() {
    let results = run_collective(Locality::cluster(&[1]), flat(), |c| async move {
        let u8s = Datatype::bytes();
        let desc = TransferDescriptor::wide(&[1, 1], &[0, 1]).unwrap();
        let mut rbuf = [0u8; 1];
        c.scatterv(&[1, 2], &desc, &u8s, &mut rbuf, 1, &u8s, 0)
            .await
    })
    .await;

    assert!(matches!(
        results[0],
        Err(StrataError::DescriptorLength {
            expected: 1,
            actual: 2
        })
    ));
}
