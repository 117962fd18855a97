use super::helpers::{bytes_i32, i32_bytes, run_collective};
use strata::{DataType, Datatype, Locality, Operation, Strategy, StrataConfig, TransferDescriptor};

/// Rank `r` contributes `counts[r]` values `1000 * r + k`; returns what the
/// root assembled (empty elsewhere) and each rank's stats.
async fn gather_i32(
    ppn: &[usize],
    counts: Vec<usize>,
    displs: Vec<isize>,
    root: u32,
    config: StrataConfig,
) -> Vec<(Vec<i32>, strata::CollectiveStats)> {
    let len = counts
        .iter()
        .zip(&displs)
        .map(|(&c, &d)| d as usize + c)
        .max()
        .unwrap_or(0);
    let counts = std::sync::Arc::new(counts);
    let displs = std::sync::Arc::new(displs);

    run_collective(Locality::cluster(ppn), config, move |c| {
        let counts = std::sync::Arc::clone(&counts);
        let displs = std::sync::Arc::clone(&displs);
        async move {
            let i32s = Datatype::predefined(DataType::I32);
            let rank = c.rank() as usize;
            let mine: Vec<i32> = (0..counts[rank]).map(|k| contribution(rank, k)).collect();
            let desc = TransferDescriptor::wide(&counts, &displs).unwrap();
            let mut rbuf = if c.rank() == root {
                i32_bytes(&vec![-1; len])
            } else {
                Vec::new()
            };
            c.gatherv(&i32_bytes(&mine), mine.len(), &i32s, &mut rbuf, &desc, &i32s, root)
                .await
                .unwrap();
            (bytes_i32(&rbuf), c.stats())
        }
    })
    .await
}

fn contribution(rank: usize, k: usize) -> i32 {
    (1000 * rank + k) as i32
}

/// What a correct gatherv leaves in the root buffer.
fn assembled(counts: &[usize], displs: &[isize]) -> Vec<i32> {
    let len = counts
        .iter()
        .zip(displs)
        .map(|(&c, &d)| d as usize + c)
        .max()
        .unwrap_or(0);
    let mut out = vec![-1; len];
    for (rank, (&c, &d)) in counts.iter().zip(displs).enumerate() {
        for k in 0..c {
            out[d as usize + k] = contribution(rank, k);
        }
    }
    out
}

#[tokio::test]
async fn test_contiguous_gatherv_two_nodes() {
    let counts = vec![1; 8];
    let displs: Vec<isize> = (0..8).collect();
    let results = gather_i32(&[4, 4], counts.clone(), displs.clone(), 0, StrataConfig::default()).await;

    assert_eq!(results[0].0, assembled(&counts, &displs));
    for (rank, (values, stats)) in results.iter().enumerate().skip(1) {
        assert!(values.is_empty(), "rank {rank}");
        let exchanges = if rank == 4 { 1 } else { 0 };
        assert_eq!(stats.inter_node_exchanges, exchanges, "rank {rank}");
    }
    assert_eq!(results[0].1.inter_node_exchanges, 1);
    assert_eq!(results[0].1.bounce_buffers, 0);
}

#[tokio::test]
async fn test_permuted_gatherv_uses_bounce_buffer() {
    let counts = vec![1, 2, 1, 2, 2, 1, 3, 1];
    let displs = vec![0, 1, 3, 4, 16, 14, 9, 6];
    let results = gather_i32(&[4, 4], counts.clone(), displs.clone(), 0, StrataConfig::default()).await;

    assert_eq!(results[0].0, assembled(&counts, &displs));
    assert_eq!(results[0].1.bounce_buffers, 1);
}

#[tokio::test]
async fn test_gatherv_three_nodes_root_not_first() {
    let counts: Vec<usize> = (0..9).map(|r| (r * 7) % 4).collect();
    let mut displs = Vec::new();
    let mut acc = 0isize;
    for &c in counts.iter().rev() {
        displs.push(acc);
        acc += c as isize;
    }
    displs.reverse();
    let results = gather_i32(&[3, 3, 3], counts.clone(), displs.clone(), 4, StrataConfig::default()).await;

    assert_eq!(results[4].0, assembled(&counts, &displs));
    // Rank 4 is the middle process of node 1: ranks 1 and 7 lead.
    assert_eq!(results[1].1.inter_node_exchanges, 1);
    assert_eq!(results[7].1.inter_node_exchanges, 1);
    assert_eq!(results[0].1.inter_node_exchanges, 0);
}

#[tokio::test]
async fn test_gatherv_matches_flat() {
    let counts = vec![3, 0, 2, 4, 1, 5];
    let displs = vec![20, 0, 0, 2, 19, 10];
    let hier = gather_i32(&[2, 2, 2], counts.clone(), displs.clone(), 3, StrataConfig::default()).await;
    let flat = gather_i32(
        &[2, 2, 2],
        counts.clone(),
        displs.clone(),
        3,
        StrataConfig {
            hierarchical: false,
            ..StrataConfig::default()
        },
    )
    .await;

    assert_eq!(hier[3].0, flat[3].0);
    assert_eq!(hier[3].0, assembled(&counts, &displs));
    assert_eq!(hier[3].1.hierarchical_calls, 1);
    assert_eq!(flat[3].1.flat_calls, 1);
}

#[tokio::test]
async fn test_gatherv_into_strided_receive_type() {
    // Root lays received i32 values out 8 bytes apart, leaving padding alone.
    let results = run_collective(Locality::cluster(&[2, 2]), StrataConfig::default(), |c| async move {
        let i32s = Datatype::predefined(DataType::I32);
        let padded = Datatype::resized(&i32s, 8);
        let r = c.rank() as i32;
        let sbuf = i32_bytes(&[10 * r, 10 * r + 1]);
        let counts = [2usize; 4];
        let displs = [6isize, 4, 2, 0];
        let desc = TransferDescriptor::wide(&counts, &displs).unwrap();
        let mut rbuf = i32_bytes(&[-1; 16]);
        c.gatherv(&sbuf, 2, &i32s, &mut rbuf, &desc, &padded, 0)
            .await
            .unwrap();
        (bytes_i32(&rbuf), c.strategy(Operation::Gatherv))
    })
    .await;

    let (root, strategy) = &results[0];
    assert_eq!(*strategy, Some(Strategy::Hierarchical));
    assert_eq!(
        root,
        &vec![30, -1, 31, -1, 20, -1, 21, -1, 10, -1, 11, -1, 0, -1, 1, -1]
    );
}

#[tokio::test]
async fn test_regular_gather() {
    let results = run_collective(Locality::cluster(&[2, 2]), StrataConfig::default(), |c| async move {
        let u8s = Datatype::bytes();
        let r = c.rank() as u8;
        let mut rbuf = vec![0u8; 8];
        c.gather(&[r, r + 10], 2, &u8s, &mut rbuf, 2, &u8s, 2)
            .await
            .unwrap();
        rbuf
    })
    .await;

    assert_eq!(results[2], vec![0, 10, 1, 11, 2, 12, 3, 13]);
}
