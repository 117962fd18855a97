use super::helpers::{bytes_i32, i32_bytes, run_collective, source_value};
use strata::{DataType, Datatype, Locality, Operation, Strategy, StrataConfig, TransferDescriptor};

/// Scatter `counts`/`displs` (element units) of an i32 source from `root`
/// and return each rank's received values and stats.
async fn scatter_i32(
    ppn: &[usize],
    counts: Vec<usize>,
    displs: Vec<isize>,
    root: u32,
) -> Vec<(Vec<i32>, strata::CollectiveStats, Option<Strategy>)> {
    let len = counts
        .iter()
        .zip(&displs)
        .map(|(&c, &d)| d as usize + c)
        .max()
        .unwrap_or(0);
    let counts = std::sync::Arc::new(counts);
    let displs = std::sync::Arc::new(displs);

    run_collective(Locality::cluster(ppn), StrataConfig::default(), move |c| {
        let counts = std::sync::Arc::clone(&counts);
        let displs = std::sync::Arc::clone(&displs);
        async move {
            let i32s = Datatype::predefined(DataType::I32);
            let src: Vec<i32> = (0..len).map(source_value).collect();
            let sbuf = i32_bytes(&src);
            let desc = TransferDescriptor::wide(&counts, &displs).unwrap();
            let rcount = counts[c.rank() as usize];
            let mut rbuf = vec![0u8; rcount * 4];
            c.scatterv(&sbuf, &desc, &i32s, &mut rbuf, rcount, &i32s, root)
                .await
                .unwrap();
            (bytes_i32(&rbuf), c.stats(), c.strategy(Operation::Scatterv))
        }
    })
    .await
}

fn expected_block(count: usize, displ: isize) -> Vec<i32> {
    (0..count).map(|k| source_value(displ as usize + k)).collect()
}

#[tokio::test]
async fn test_contiguous_scatterv_two_nodes() {
    let results = scatter_i32(&[4, 4], vec![1; 8], (0..8).collect(), 0).await;

    for (rank, (values, stats, strategy)) in results.iter().enumerate() {
        assert_eq!(values, &vec![source_value(rank)], "rank {rank}");
        assert_eq!(*strategy, Some(Strategy::Hierarchical));
        assert_eq!(stats.hierarchical_calls, 1);
        assert_eq!(stats.bounce_buffers, 0);
        let exchanges = if rank == 0 || rank == 4 { 1 } else { 0 };
        assert_eq!(stats.inter_node_exchanges, exchanges, "rank {rank}");
    }
}

#[tokio::test]
async fn test_permuted_displacements_use_bounce_buffer() {
    let displs = vec![0, 1, 2, 3, 7, 6, 5, 4];
    let results = scatter_i32(&[4, 4], vec![1; 8], displs.clone(), 0).await;

    for (rank, (values, stats, _)) in results.iter().enumerate() {
        assert_eq!(values, &expected_block(1, displs[rank]), "rank {rank}");
        let bounces = if rank == 0 { 1 } else { 0 };
        assert_eq!(stats.bounce_buffers, bounces, "rank {rank}");
    }
}

#[tokio::test]
async fn test_gapped_irregular_blocks() {
    // Node 1's blocks are separated by gaps of one element.
    let counts = vec![2, 1, 0, 3, 1, 2, 0, 2];
    let displs = vec![0, 2, 0, 3, 8, 10, 0, 13];
    let results = scatter_i32(&[4, 4], counts.clone(), displs.clone(), 0).await;

    assert_eq!(results[0].1.bounce_buffers, 1);
    for (rank, (values, _, _)) in results.iter().enumerate() {
        assert_eq!(values, &expected_block(counts[rank], displs[rank]), "rank {rank}");
    }
}

#[tokio::test]
async fn test_root_in_middle_of_node() {
    // Root is rank 5, the last process of node 1, so the other nodes are
    // led by their last process too.
    let counts: Vec<usize> = (0..9).map(|r| r % 3 + 1).collect();
    let mut displs = Vec::new();
    let mut acc = 0isize;
    for &c in &counts {
        displs.push(acc);
        acc += c as isize;
    }
    let results = scatter_i32(&[3, 3, 3], counts.clone(), displs.clone(), 5).await;

    for (rank, (values, stats, _)) in results.iter().enumerate() {
        assert_eq!(values, &expected_block(counts[rank], displs[rank]), "rank {rank}");
        let exchanges = match rank {
            5 => 2,
            2 | 8 => 1,
            _ => 0,
        };
        assert_eq!(stats.inter_node_exchanges, exchanges, "rank {rank}");
    }
}

#[tokio::test]
async fn test_zero_counts() {
    let counts = vec![0, 2, 0, 1, 0, 0, 0, 0];
    let displs = vec![5, 0, 5, 2, 7, 7, 7, 7];
    let results = scatter_i32(&[4, 4], counts.clone(), displs.clone(), 1).await;

    for (rank, (values, _, _)) in results.iter().enumerate() {
        assert_eq!(values, &expected_block(counts[rank], displs[rank]), "rank {rank}");
    }
}

#[tokio::test]
async fn test_narrow_and_wide_descriptors_agree() {
    let narrow = run_collective(Locality::cluster(&[2, 2]), StrataConfig::default(), |c| async move {
        let i32s = Datatype::predefined(DataType::I32);
        let sbuf = i32_bytes(&[10, 11, 12, 13, 14, 15]);
        let counts = [1i32, 2, 1, 2];
        let displs = [5i32, 3, 0, 1];
        let desc = TransferDescriptor::narrow(&counts, &displs).unwrap();
        let rcount = counts[c.rank() as usize] as usize;
        let mut rbuf = vec![0u8; rcount * 4];
        c.scatterv(&sbuf, &desc, &i32s, &mut rbuf, rcount, &i32s, 0)
            .await
            .unwrap();
        bytes_i32(&rbuf)
    })
    .await;

    let wide = run_collective(Locality::cluster(&[2, 2]), StrataConfig::default(), |c| async move {
        let i32s = Datatype::predefined(DataType::I32);
        let sbuf = i32_bytes(&[10, 11, 12, 13, 14, 15]);
        let counts = [1usize, 2, 1, 2];
        let displs = [5isize, 3, 0, 1];
        let desc = TransferDescriptor::wide(&counts, &displs).unwrap();
        let rcount = counts[c.rank() as usize];
        let mut rbuf = vec![0u8; rcount * 4];
        c.scatterv(&sbuf, &desc, &i32s, &mut rbuf, rcount, &i32s, 0)
            .await
            .unwrap();
        bytes_i32(&rbuf)
    })
    .await;

    assert_eq!(narrow, wide);
    assert_eq!(narrow[0], vec![15]);
    assert_eq!(narrow[1], vec![13, 14]);
    assert_eq!(narrow[2], vec![10]);
    assert_eq!(narrow[3], vec![11, 12]);
}

#[tokio::test]
async fn test_strided_send_type_contiguous_receive() {
    // Root's elements are i32 values 8 bytes apart; receivers take plain i32.
    let results = run_collective(Locality::cluster(&[2, 2]), StrataConfig::default(), |c| async move {
        let i32s = Datatype::predefined(DataType::I32);
        let padded = Datatype::resized(&i32s, 8);
        let src: Vec<i32> = (0..16).collect();
        let sbuf = i32_bytes(&src);
        let counts = [2usize; 4];
        // Node 1 is reversed, which also forces the bounce path.
        let displs = [0isize, 2, 6, 4];
        let desc = TransferDescriptor::wide(&counts, &displs).unwrap();
        let mut rbuf = vec![0u8; 8];
        c.scatterv(&sbuf, &desc, &padded, &mut rbuf, 2, &i32s, 0)
            .await
            .unwrap();
        (bytes_i32(&rbuf), c.stats().bounce_buffers)
    })
    .await;

    assert_eq!(results[0].0, vec![0, 2]);
    assert_eq!(results[1].0, vec![4, 6]);
    assert_eq!(results[2].0, vec![12, 14]);
    assert_eq!(results[3].0, vec![8, 10]);
    assert_eq!(results[0].1, 1);
}

#[tokio::test]
async fn test_hierarchical_matches_flat() {
    let run = |hierarchical: bool| {
        let config = StrataConfig {
            hierarchical,
            ..StrataConfig::default()
        };
        run_collective(Locality::cluster(&[3, 3]), config, |c| async move {
            let u8s = Datatype::bytes();
            let sbuf: Vec<u8> = (0..64).collect();
            let counts = [4usize, 0, 7, 3, 5, 1];
            let displs = [40isize, 0, 1, 20, 8, 30];
            let desc = TransferDescriptor::wide(&counts, &displs).unwrap();
            let rcount = counts[c.rank() as usize];
            let mut rbuf = vec![0u8; rcount];
            c.scatterv(&sbuf, &desc, &u8s, &mut rbuf, rcount, &u8s, 2)
                .await
                .unwrap();
            (rbuf, c.strategy(Operation::Scatterv))
        })
    };

    let hier = run(true).await;
    let flat = run(false).await;
    for rank in 0..6 {
        assert_eq!(hier[rank].0, flat[rank].0, "rank {rank}");
        assert_eq!(hier[rank].1, Some(Strategy::Hierarchical));
        assert_eq!(flat[rank].1, Some(Strategy::Flat));
    }
}

#[tokio::test]
async fn test_regular_scatter() {
    let results = run_collective(Locality::cluster(&[2, 2]), StrataConfig::default(), |c| async move {
        let i32s = Datatype::predefined(DataType::I32);
        let sbuf = i32_bytes(&(0..8).collect::<Vec<_>>());
        let mut rbuf = vec![0u8; 8];
        c.scatter(&sbuf, 2, &i32s, &mut rbuf, 2, &i32s, 3)
            .await
            .unwrap();
        bytes_i32(&rbuf)
    })
    .await;

    for (rank, values) in results.iter().enumerate() {
        let r = rank as i32;
        assert_eq!(values, &vec![2 * r, 2 * r + 1]);
    }
}

#[tokio::test]
async fn test_repeated_calls_reuse_topology() {
    let results = run_collective(Locality::cluster(&[2, 2]), StrataConfig::default(), |c| async move {
        let u8s = Datatype::bytes();
        let sbuf: Vec<u8> = (0..4).collect();
        let counts = [1usize; 4];
        let displs = [0isize, 1, 2, 3];
        let desc = TransferDescriptor::wide(&counts, &displs).unwrap();
        let mut out = Vec::new();
        for _ in 0..3 {
            let mut rbuf = vec![0u8; 1];
            c.scatterv(&sbuf, &desc, &u8s, &mut rbuf, 1, &u8s, 0)
                .await
                .unwrap();
            out.push(rbuf[0]);
        }
        (out, c.stats())
    })
    .await;

    for (rank, (values, stats)) in results.iter().enumerate() {
        assert_eq!(values, &vec![rank as u8; 3]);
        assert_eq!(stats.topology_probes, 1);
        assert_eq!(stats.gate_evaluations, 1);
        assert_eq!(stats.hierarchical_calls, 3);
    }
}
