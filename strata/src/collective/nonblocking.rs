//! Non-blocking inter-node forms.
//!
//! Each returns a [`PendingExchange`] whose task owns everything it needs:
//! the communicator handle and the already-packed payloads. The caller's
//! buffers are never touched after the call returns, so overlapping the
//! exchange with other work on the same buffers is safe.

use crate::collective::handle::PendingExchange;
use crate::collective::helpers::{CollectiveTag, collective_recv_exact, collective_send};
use crate::comm::Comm;
use crate::datatype::{Datatype, Region};
use crate::descriptor::TransferDescriptor;
use crate::error::Result;
use crate::types::Rank;
use futures::future::try_join_all;
use std::sync::Arc;

/// Root side of a non-blocking scatterv. Blocks are packed before this
/// returns; the sends run in the background. The root's own slot is
/// skipped.
pub(crate) fn iscatterv_root(
    comm: &Arc<Comm>,
    src: Region<'_>,
    desc: &TransferDescriptor<'_>,
    dtype: &Datatype,
    tag: CollectiveTag,
) -> Result<PendingExchange<()>> {
    desc.expect_len(comm.size() as usize)?;
    let me = comm.rank() as usize;

    let mut blocks = Vec::with_capacity(desc.len().saturating_sub(1));
    for r in (0..desc.len()).filter(|&r| r != me) {
        let mut block = Vec::new();
        dtype.pack_into(src, desc.displ(r), desc.count(r), &mut block)?;
        blocks.push((r as Rank, block));
    }

    let comm = Arc::clone(comm);
    Ok(PendingExchange::spawn(async move {
        let futs: Vec<_> = blocks
            .into_iter()
            .map(|(r, block)| collective_send(&comm, r, block, "iscatterv", tag))
            .collect();
        try_join_all(futs).await?;
        Ok(())
    }))
}

/// Receiving side of a non-blocking scatterv: yields exactly
/// `expected_bytes` from `root`.
pub(crate) fn iscatterv_leaf(
    comm: &Arc<Comm>,
    root: Rank,
    expected_bytes: usize,
    tag: CollectiveTag,
) -> PendingExchange<Vec<u8>> {
    let comm = Arc::clone(comm);
    PendingExchange::spawn(async move {
        collective_recv_exact(&comm, root, expected_bytes, "iscatterv", tag).await
    })
}

/// Root side of a non-blocking gatherv. Yields one block per rank, indexed
/// by rank; the root's own entry is empty.
pub(crate) fn igatherv_root(
    comm: &Arc<Comm>,
    expected: Vec<usize>,
    tag: CollectiveTag,
) -> PendingExchange<Vec<Vec<u8>>> {
    let comm = Arc::clone(comm);
    PendingExchange::spawn(async move {
        let me = comm.rank();
        let futs: Vec<_> = (0..comm.size())
            .filter(|&r| r != me)
            .map(|r| {
                let comm = &comm;
                let len = expected.get(r as usize).copied().unwrap_or(0);
                async move {
                    collective_recv_exact(comm, r, len, "igatherv", tag)
                        .await
                        .map(|d| (r, d))
                }
            })
            .collect();
        let received = try_join_all(futs).await?;

        let mut out = vec![Vec::new(); comm.size() as usize];
        for (r, d) in received {
            out[r as usize] = d;
        }
        Ok(out)
    })
}

/// Sending side of a non-blocking gatherv.
pub(crate) fn igatherv_leaf(
    comm: &Arc<Comm>,
    root: Rank,
    data: Vec<u8>,
    tag: CollectiveTag,
) -> PendingExchange<()> {
    let comm = Arc::clone(comm);
    PendingExchange::spawn(async move { collective_send(&comm, root, data, "igatherv", tag).await })
}
