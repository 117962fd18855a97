use crate::collective::helpers::{CollectiveTag, collective_recv_exact, collective_send};
use crate::comm::Comm;
use crate::datatype::{Datatype, Region, RegionMut};
use crate::descriptor::TransferDescriptor;
use crate::error::{Result, StrataError};
use crate::types::Rank;
use futures::future::try_join_all;

/// Flat scatterv: root sends `desc.count(r)` elements of `sdtype`, found at
/// element displacement `desc.displ(r)` of `src`, to each rank `r`. Every
/// rank unpacks what it receives as `rcount` elements of `rdtype` into
/// `dst`.
///
/// Root packs every block up front, then posts N-1 concurrent sends. This
/// is the reference the hierarchical path must agree with byte for byte.
#[allow(clippy::too_many_arguments)]
pub(crate) async fn scatterv(
    comm: &Comm,
    src: Region<'_>,
    desc: &TransferDescriptor<'_>,
    sdtype: &Datatype,
    dst: &mut RegionMut<'_>,
    rcount: usize,
    rdtype: &Datatype,
    root: Rank,
    tag: CollectiveTag,
) -> Result<()> {
    comm.check_rank(root)?;
    let rank = comm.rank();

    if rank != root {
        let expected = rdtype.packed_len(rcount)?;
        let data = collective_recv_exact(comm, root, expected, "scatterv", tag).await?;
        return rdtype.unpack(&data, dst, 0, rcount);
    }

    desc.expect_len(comm.size() as usize)?;
    let mut blocks = Vec::with_capacity(desc.len());
    for r in 0..desc.len() {
        let mut block = Vec::new();
        sdtype.pack_into(src, desc.displ(r), desc.count(r), &mut block)?;
        blocks.push(block);
    }

    let own = std::mem::take(&mut blocks[root as usize]);
    let futs: Vec<_> = blocks
        .into_iter()
        .enumerate()
        .filter(|&(r, _)| r != root as usize)
        .map(|(r, block)| collective_send(comm, r as Rank, block, "scatterv", tag))
        .collect();
    try_join_all(futs).await?;

    let expected = rdtype.packed_len(rcount)?;
    if own.len() != expected {
        return Err(StrataError::BufferSizeMismatch {
            expected,
            actual: own.len(),
        });
    }
    rdtype.unpack(&own, dst, 0, rcount)
}
