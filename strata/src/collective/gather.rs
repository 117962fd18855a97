use crate::collective::helpers::{CollectiveTag, collective_recv, collective_send};
use crate::comm::Comm;
use crate::error::Result;
use crate::types::Rank;
use futures::future::try_join_all;

/// Gather variable-length byte messages at `root`.
///
/// Root returns one entry per rank (its own included, at index `root`);
/// every other rank returns `None`. Uses flat gather: root posts N-1
/// concurrent receives.
pub(crate) async fn gather_bytes(
    comm: &Comm,
    data: Vec<u8>,
    root: Rank,
    tag: CollectiveTag,
) -> Result<Option<Vec<Vec<u8>>>> {
    comm.check_rank(root)?;
    let world = comm.size();

    if comm.rank() != root {
        collective_send(comm, root, data, "gather", tag).await?;
        return Ok(None);
    }

    let futs: Vec<_> = (0..world)
        .filter(|&r| r != root)
        .map(|r| async move { collective_recv(comm, r, "gather", tag).await.map(|d| (r, d)) })
        .collect();
    let received = try_join_all(futs).await?;

    let mut out = vec![Vec::new(); world as usize];
    out[root as usize] = data;
    for (r, d) in received {
        out[r as usize] = d;
    }
    Ok(Some(out))
}

/// Every rank contributes a byte message and receives everyone's, indexed
/// by rank. Sends to all peers and receives from all peers concurrently.
pub(crate) async fn allgather_bytes(
    comm: &Comm,
    data: Vec<u8>,
    tag: CollectiveTag,
) -> Result<Vec<Vec<u8>>> {
    let world = comm.size();
    let rank = comm.rank();

    let sends: Vec<_> = (0..world)
        .filter(|&r| r != rank)
        .map(|r| collective_send(comm, r, data.clone(), "allgather", tag))
        .collect();
    let recvs: Vec<_> = (0..world)
        .filter(|&r| r != rank)
        .map(|r| async move { collective_recv(comm, r, "allgather", tag).await.map(|d| (r, d)) })
        .collect();

    let (_, received) = futures::future::try_join(try_join_all(sends), try_join_all(recvs)).await?;

    let mut out = vec![Vec::new(); world as usize];
    out[rank as usize] = data;
    for (r, d) in received {
        out[r as usize] = d;
    }
    Ok(out)
}
