use crate::collective::helpers::{CollectiveTag, collective_recv_exact, collective_send};
use crate::comm::Comm;
use crate::datatype::{Datatype, Region, RegionMut};
use crate::descriptor::TransferDescriptor;
use crate::error::{Result, StrataError};
use crate::types::Rank;
use futures::future::try_join_all;

/// Flat gatherv: every rank packs `scount` elements of `sdtype` from `src`
/// and sends them to root, which unpacks rank `r`'s contribution as
/// `desc.count(r)` elements of `rdtype` at element displacement
/// `desc.displ(r)` of `dst`.
#[allow(clippy::too_many_arguments)]
pub(crate) async fn gatherv(
    comm: &Comm,
    src: Region<'_>,
    scount: usize,
    sdtype: &Datatype,
    dst: &mut RegionMut<'_>,
    desc: &TransferDescriptor<'_>,
    rdtype: &Datatype,
    root: Rank,
    tag: CollectiveTag,
) -> Result<()> {
    comm.check_rank(root)?;
    let rank = comm.rank();

    let mut own = Vec::new();
    sdtype.pack_into(src, 0, scount, &mut own)?;

    if rank != root {
        return collective_send(comm, root, own, "gatherv", tag).await;
    }

    desc.expect_len(comm.size() as usize)?;
    let futs: Vec<_> = (0..comm.size())
        .filter(|&r| r != root)
        .map(|r| async move {
            let expected = rdtype.packed_len(desc.count(r as usize))?;
            collective_recv_exact(comm, r, expected, "gatherv", tag)
                .await
                .map(|d| (r, d))
        })
        .collect();
    let received = try_join_all(futs).await?;

    let own_expected = rdtype.packed_len(desc.count(root as usize))?;
    if own.len() != own_expected {
        return Err(StrataError::BufferSizeMismatch {
            expected: own_expected,
            actual: own.len(),
        });
    }
    rdtype.unpack(&own, dst, desc.displ(root as usize), desc.count(root as usize))?;
    for (r, data) in received {
        let r = r as usize;
        rdtype.unpack(&data, dst, desc.displ(r), desc.count(r))?;
    }
    Ok(())
}
