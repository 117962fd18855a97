use crate::collective::{self, CollectiveTag, gather_bytes, iscatterv_leaf, iscatterv_root};
use crate::comm::Comm;
use crate::datatype::{Datatype, Region, RegionMut};
use crate::descriptor::TransferDescriptor;
use crate::error::{Result, StrataError};
use crate::han::reconcile::{self, BounceBuffer};
use crate::han::role::{self, Role};
use crate::han::scratch;
use crate::han::topology::{Topology, VirtualRank};
use crate::types::{Operation, Rank};

/// Two-level scatterv. Same contract as the flat form; `comm` is the
/// communicator the call was made on and `topo` its decomposition.
#[allow(clippy::too_many_arguments)]
pub(crate) async fn scatterv(
    comm: &Comm,
    topo: &Topology,
    src: Region<'_>,
    desc: &TransferDescriptor<'_>,
    sdtype: &Datatype,
    dst: &mut RegionMut<'_>,
    rcount: usize,
    rdtype: &Datatype,
    root: Rank,
) -> Result<()> {
    let root_v = topo.layout.vrank(root)?;
    let role = role::classify(comm.rank(), root, &topo.layout)?;
    tracing::debug!(rank = comm.rank(), root, ?role, "hierarchical scatterv");

    match role {
        Role::Root => {
            root_scatterv(comm, topo, root_v, src, desc, sdtype, dst, rcount, rdtype).await
        }
        Role::RootLocalPeer => follower_scatterv(topo, root_v, dst, rcount, rdtype).await,
        Role::OtherFollower => {
            // The leader only learns what to forward from its followers.
            let size = rdtype.packed_len(rcount)? as u64;
            gather_bytes(
                &topo.intra,
                size.to_le_bytes().to_vec(),
                root_v.intra,
                CollectiveTag::SizeHandshake,
            )
            .await?;
            follower_scatterv(topo, root_v, dst, rcount, rdtype).await
        }
        Role::NodeLeader => leader_scatterv(comm, topo, root_v, dst, rcount, rdtype).await,
    }
}

async fn follower_scatterv(
    topo: &Topology,
    root_v: VirtualRank,
    dst: &mut RegionMut<'_>,
    rcount: usize,
    rdtype: &Datatype,
) -> Result<()> {
    let unused = Datatype::bytes();
    local_scatterv(
        topo,
        root_v,
        Region::new(&[]),
        &TransferDescriptor::empty(),
        &unused,
        dst,
        rcount,
        rdtype,
    )
    .await
}

#[allow(clippy::too_many_arguments)]
async fn root_scatterv(
    comm: &Comm,
    topo: &Topology,
    root_v: VirtualRank,
    src: Region<'_>,
    desc: &TransferDescriptor<'_>,
    sdtype: &Datatype,
    dst: &mut RegionMut<'_>,
    rcount: usize,
    rdtype: &Datatype,
) -> Result<()> {
    desc.expect_len(comm.size() as usize)?;
    let limit = comm.scratch_limit();
    let plan = reconcile::plan(desc, &topo.layout, root_v.inter, limit)?;

    let bounce = if plan.needs_bounce {
        let mut bounce = BounceBuffer::allocate(sdtype, plan.aggregate.total(), limit)?;
        bounce.fill_from(sdtype, src, desc, &topo.layout, root_v.inter)?;
        comm.counters.record_bounce_buffer();
        Some(bounce)
    } else {
        None
    };

    let packed_displs;
    let (inter_src, inter_desc) = match &bounce {
        Some(bounce) => {
            packed_displs = plan.aggregate.packed_displs();
            (
                bounce.region(),
                TransferDescriptor::wide(&plan.aggregate.counts, &packed_displs)?,
            )
        }
        None => (
            src,
            TransferDescriptor::wide(&plan.aggregate.counts, &plan.aggregate.displs)?,
        ),
    };
    tracing::debug!(
        bounce = bounce.is_some(),
        remote_elements = plan.aggregate.total(),
        "scatterv root reconciled descriptor"
    );

    // Inter-node sends go out in the background while this node is served.
    let pending = iscatterv_root(
        &topo.inter,
        inter_src,
        &inter_desc,
        sdtype,
        CollectiveTag::InterScatterv,
    )?;
    for _ in 1..topo.inter.size() {
        comm.counters.record_inter_node_exchange();
    }

    let local_desc = TransferDescriptor::wide(&plan.local_counts, &plan.local_displs)?;
    let local = local_scatterv(topo, root_v, src, &local_desc, sdtype, dst, rcount, rdtype).await;
    let inter = pending.wait().await;
    local.and(inter)
}

async fn leader_scatterv(
    comm: &Comm,
    topo: &Topology,
    root_v: VirtualRank,
    dst: &mut RegionMut<'_>,
    rcount: usize,
    rdtype: &Datatype,
) -> Result<()> {
    // The gate already routes heterogeneous groups to the flat path; the
    // leader still never forwards bytes it cannot interpret on both ends.
    topo.layout.ensure_homogeneous(Operation::Scatterv)?;
    let limit = comm.scratch_limit();

    let (counts, displs) = collect_sizes(topo, root_v, rdtype.packed_len(rcount)?, limit).await?;
    let total: usize = counts.iter().sum();
    scratch::ensure_within(total, "leader staging", limit)?;

    let pending = iscatterv_leaf(&topo.inter, root_v.inter, total, CollectiveTag::InterScatterv);
    comm.counters.record_inter_node_exchange();
    let staging = pending.wait().await?;

    // The leader only brokers packed bytes; followers unpack with their own type.
    let desc = TransferDescriptor::wide(&counts, &displs)?;
    local_scatterv(
        topo,
        root_v,
        Region::new(&staging),
        &desc,
        &Datatype::bytes(),
        dst,
        rcount,
        rdtype,
    )
    .await
}

/// Leader side of the size handshake: every follower's byte count, and the
/// prefix-summed displacements of their blocks.
pub(super) async fn collect_sizes(
    topo: &Topology,
    root_v: VirtualRank,
    own: usize,
    limit: Option<usize>,
) -> Result<(Vec<usize>, Vec<isize>)> {
    let n = topo.intra.size() as usize;
    scratch::ensure_within(n * 8, "follower sizes", limit)?;
    let reports = gather_bytes(
        &topo.intra,
        (own as u64).to_le_bytes().to_vec(),
        root_v.intra,
        CollectiveTag::SizeHandshake,
    )
    .await?
    .ok_or_else(|| StrataError::transport("size handshake delivered nothing to the leader"))?;

    let mut counts = scratch::array(n, 0usize, "follower sizes", limit)?;
    let mut displs = scratch::array(n, 0isize, "follower displacements", limit)?;
    let mut acc = 0usize;
    for (i, report) in reports.iter().enumerate() {
        let bytes: [u8; 8] = report.as_slice().try_into().map_err(|_| {
            StrataError::DecodeFailed(format!("size report of {} bytes", report.len()))
        })?;
        counts[i] = usize::try_from(u64::from_le_bytes(bytes))
            .map_err(|_| StrataError::out_of_resource("follower block", usize::MAX))?;
        displs[i] = acc as isize;
        acc = acc
            .checked_add(counts[i])
            .filter(|&a| a <= isize::MAX as usize)
            .ok_or(StrataError::out_of_resource("leader staging", usize::MAX))?;
    }
    Ok((counts, displs))
}

#[allow(clippy::too_many_arguments)]
async fn local_scatterv(
    topo: &Topology,
    root_v: VirtualRank,
    src: Region<'_>,
    desc: &TransferDescriptor<'_>,
    sdtype: &Datatype,
    dst: &mut RegionMut<'_>,
    rcount: usize,
    rdtype: &Datatype,
) -> Result<()> {
    collective::scatterv(
        &topo.intra,
        src,
        desc,
        sdtype,
        dst,
        rcount,
        rdtype,
        root_v.intra,
        CollectiveTag::Scatterv,
    )
    .await
}
