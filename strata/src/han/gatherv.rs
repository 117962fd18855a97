use crate::collective::{self, CollectiveTag, gather_bytes, igatherv_leaf, igatherv_root};
use crate::comm::Comm;
use crate::datatype::{Datatype, Region, RegionMut};
use crate::descriptor::TransferDescriptor;
use crate::error::Result;
use crate::han::reconcile::{self, BounceBuffer};
use crate::han::role::{self, Role};
use crate::han::scatterv::collect_sizes;
use crate::han::scratch;
use crate::han::topology::{Topology, VirtualRank};
use crate::types::Rank;

/// Two-level gatherv, the mirror of the scatterv protocol: leaders collect
/// their node's packed contributions and forward them to the root as one
/// block, while the root gathers its own node directly.
#[allow(clippy::too_many_arguments)]
pub(crate) async fn gatherv(
    comm: &Comm,
    topo: &Topology,
    src: Region<'_>,
    scount: usize,
    sdtype: &Datatype,
    dst: &mut RegionMut<'_>,
    desc: &TransferDescriptor<'_>,
    rdtype: &Datatype,
    root: Rank,
) -> Result<()> {
    let root_v = topo.layout.vrank(root)?;
    let role = role::classify(comm.rank(), root, &topo.layout)?;
    tracing::debug!(rank = comm.rank(), root, ?role, "hierarchical gatherv");

    match role {
        Role::Root => {
            root_gatherv(comm, topo, root_v, src, scount, sdtype, dst, desc, rdtype).await
        }
        Role::RootLocalPeer => follower_gatherv(topo, root_v, src, scount, sdtype).await,
        Role::OtherFollower => {
            let size = sdtype.packed_len(scount)? as u64;
            gather_bytes(
                &topo.intra,
                size.to_le_bytes().to_vec(),
                root_v.intra,
                CollectiveTag::SizeHandshake,
            )
            .await?;
            follower_gatherv(topo, root_v, src, scount, sdtype).await
        }
        Role::NodeLeader => leader_gatherv(comm, topo, root_v, src, scount, sdtype).await,
    }
}

#[allow(clippy::too_many_arguments)]
async fn root_gatherv(
    comm: &Comm,
    topo: &Topology,
    root_v: VirtualRank,
    src: Region<'_>,
    scount: usize,
    sdtype: &Datatype,
    dst: &mut RegionMut<'_>,
    desc: &TransferDescriptor<'_>,
    rdtype: &Datatype,
) -> Result<()> {
    desc.expect_len(comm.size() as usize)?;
    let limit = comm.scratch_limit();
    let plan = reconcile::plan(desc, &topo.layout, root_v.inter, limit)?;

    let mut bounce = if plan.needs_bounce {
        let bounce = BounceBuffer::allocate(rdtype, plan.aggregate.total(), limit)?;
        comm.counters.record_bounce_buffer();
        Some(bounce)
    } else {
        None
    };

    let expected = plan
        .aggregate
        .counts
        .iter()
        .map(|&c| rdtype.packed_len(c))
        .collect::<Result<Vec<_>>>()?;
    let pending = igatherv_root(&topo.inter, expected, CollectiveTag::InterGatherv);
    for _ in 1..topo.inter.size() {
        comm.counters.record_inter_node_exchange();
    }

    let local_desc = TransferDescriptor::wide(&plan.local_counts, &plan.local_displs)?;
    let local = collective::gatherv(
        &topo.intra,
        src,
        scount,
        sdtype,
        dst,
        &local_desc,
        rdtype,
        root_v.intra,
        CollectiveTag::Gatherv,
    )
    .await;
    let blocks = pending.wait().await;
    local?;
    let blocks = blocks?;

    let agg = &plan.aggregate;
    match &mut bounce {
        None => {
            for (node, block) in blocks.iter().enumerate() {
                rdtype.unpack(block, dst, agg.displs[node], agg.counts[node])?;
            }
        }
        Some(bounce) => {
            let packed = agg.packed_displs();
            let mut staging = bounce.region_mut();
            for (node, block) in blocks.iter().enumerate() {
                rdtype.unpack(block, &mut staging, packed[node], agg.counts[node])?;
            }
            bounce.drain_into(rdtype, dst, desc, &topo.layout, root_v.inter)?;
        }
    }
    Ok(())
}

async fn leader_gatherv(
    comm: &Comm,
    topo: &Topology,
    root_v: VirtualRank,
    src: Region<'_>,
    scount: usize,
    sdtype: &Datatype,
) -> Result<()> {
    let limit = comm.scratch_limit();
    let (counts, displs) = collect_sizes(topo, root_v, sdtype.packed_len(scount)?, limit).await?;
    let total: usize = counts.iter().sum();
    let mut staging = scratch::zeroed(total, "leader staging", limit)?;

    let desc = TransferDescriptor::wide(&counts, &displs)?;
    collective::gatherv(
        &topo.intra,
        src,
        scount,
        sdtype,
        &mut RegionMut::new(&mut staging),
        &desc,
        &Datatype::bytes(),
        root_v.intra,
        CollectiveTag::Gatherv,
    )
    .await?;

    let pending = igatherv_leaf(&topo.inter, root_v.inter, staging, CollectiveTag::InterGatherv);
    comm.counters.record_inter_node_exchange();
    pending.wait().await
}

async fn follower_gatherv(
    topo: &Topology,
    root_v: VirtualRank,
    src: Region<'_>,
    scount: usize,
    sdtype: &Datatype,
) -> Result<()> {
    let unused = Datatype::bytes();
    collective::gatherv(
        &topo.intra,
        src,
        scount,
        sdtype,
        &mut RegionMut::new(&mut []),
        &TransferDescriptor::empty(),
        &unused,
        root_v.intra,
        CollectiveTag::Gatherv,
    )
    .await
}
