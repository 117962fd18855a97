//! Turning one flat per-rank descriptor into the per-node and per-local-peer
//! descriptors the two phases run on.

use crate::datatype::{Datatype, Region, RegionMut};
use crate::descriptor::TransferDescriptor;
use crate::error::{Result, StrataError};
use crate::han::scratch;
use crate::han::topology::Layout;
use crate::types::NodeId;

/// Per-node totals, indexed by node. The root's node carries count 0.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct AggregateDescriptor {
    pub counts: Vec<usize>,
    /// Lowest displacement of any non-empty block of the node; 0 if none.
    pub displs: Vec<isize>,
    /// Highest `displ + count` of any non-empty block of the node.
    pub upper_bounds: Vec<isize>,
}

impl AggregateDescriptor {
    pub fn total(&self) -> usize {
        self.counts.iter().sum()
    }

    /// Displacements of the node blocks once laid out back to back.
    pub fn packed_displs(&self) -> Vec<isize> {
        let mut acc = 0isize;
        self.counts
            .iter()
            .map(|&c| {
                let d = acc;
                acc += c as isize;
                d
            })
            .collect()
    }
}

#[derive(Debug)]
pub(crate) struct ReconcilePlan {
    /// The root node's slice of the descriptor, indexed by intra rank.
    pub local_counts: Vec<usize>,
    pub local_displs: Vec<isize>,
    pub aggregate: AggregateDescriptor,
    pub needs_bounce: bool,
}

/// Split `desc` (indexed by parent rank) along `layout`.
///
/// A node's data can be moved straight out of the caller's buffer only if
/// its non-empty blocks sit back to back in intra-rank order. Anything else
/// (a block placed before its predecessor, a gap, an overlap, another
/// node's data in between) needs a bounce buffer.
pub(crate) fn plan(
    desc: &TransferDescriptor<'_>,
    layout: &Layout,
    root_node: NodeId,
    limit: Option<usize>,
) -> Result<ReconcilePlan> {
    let local_size = layout.node_size(root_node);
    let nodes = layout.num_nodes();

    let mut local_counts = scratch::array(local_size, 0usize, "local counts", limit)?;
    let mut local_displs = scratch::array(local_size, 0isize, "local displacements", limit)?;
    let mut counts = scratch::array(nodes, 0usize, "node counts", limit)?;
    let mut displs = scratch::array(nodes, isize::MAX, "node displacements", limit)?;
    let mut upper_bounds = scratch::array(nodes, isize::MIN, "node upper bounds", limit)?;

    let mut needs_bounce = false;
    // Previous non-empty block (displ, count) of the node being walked.
    let mut prev: Option<(NodeId, isize, isize)> = None;

    for &(node, rank) in layout.order() {
        let vr = layout.vrank(rank)?;
        let count = desc.count(rank as usize);
        let displ = desc.displ(rank as usize);

        if node == root_node {
            local_counts[vr.intra as usize] = count;
            local_displs[vr.intra as usize] = displ;
            continue;
        }
        if count == 0 {
            continue;
        }

        let n = node as usize;
        let end = isize::try_from(count)
            .ok()
            .and_then(|c| displ.checked_add(c))
            .ok_or_else(|| too_large(displ, count))?;
        counts[n] = counts[n]
            .checked_add(count)
            .ok_or_else(|| too_large(displ, count))?;
        displs[n] = displs[n].min(displ);
        upper_bounds[n] = upper_bounds[n].max(end);

        if let Some((prev_node, prev_displ, prev_end)) = prev
            && prev_node == node
            && (displ < prev_displ || displ != prev_end)
        {
            needs_bounce = true;
        }
        prev = Some((node, displ, end));
    }

    for n in 0..nodes {
        if counts[n] == 0 {
            displs[n] = 0;
            upper_bounds[n] = 0;
        } else if upper_bounds[n]
            .checked_sub(displs[n])
            .is_none_or(|span| span as usize != counts[n])
        {
            needs_bounce = true;
        }
    }
    // Node blocks are laid out back to back in the bounce buffer and on the wire.
    counts
        .iter()
        .try_fold(0usize, |acc, &c| acc.checked_add(c))
        .filter(|&t| t <= isize::MAX as usize)
        .ok_or_else(|| StrataError::out_of_resource("remote elements", usize::MAX))?;

    Ok(ReconcilePlan {
        local_counts,
        local_displs,
        aggregate: AggregateDescriptor {
            counts,
            displs,
            upper_bounds,
        },
        needs_bounce,
    })
}

fn too_large(displ: isize, count: usize) -> StrataError {
    StrataError::BufferOutOfBounds {
        offset: displ,
        len: count,
        capacity: isize::MAX as usize,
    }
}

/// Contiguous staging for the inter-node phase, holding every remote node's
/// elements in topology order.
pub(crate) struct BounceBuffer {
    storage: Vec<u8>,
    gap: isize,
}

impl BounceBuffer {
    /// Room for `total` elements of `dtype`, including its leading gap.
    pub fn allocate(dtype: &Datatype, total: usize, limit: Option<usize>) -> Result<Self> {
        let (span, gap) = dtype.span(total)?;
        let storage = scratch::zeroed(span, "bounce buffer", limit)?;
        tracing::debug!(bytes = span, elements = total, "allocated bounce buffer");
        Ok(Self { storage, gap })
    }

    pub fn region(&self) -> Region<'_> {
        Region::with_start(&self.storage, self.gap)
    }

    pub fn region_mut(&mut self) -> RegionMut<'_> {
        RegionMut::with_start(&mut self.storage, self.gap)
    }

    /// Copy every remote rank's elements out of `src`, node by node, in
    /// intra-rank order.
    pub fn fill_from(
        &mut self,
        dtype: &Datatype,
        src: Region<'_>,
        desc: &TransferDescriptor<'_>,
        layout: &Layout,
        root_node: NodeId,
    ) -> Result<()> {
        let extent = dtype.extent() as isize;
        let mut offset = 0isize;
        let mut dst = self.region_mut();
        for &(node, rank) in layout.order() {
            if node == root_node {
                continue;
            }
            let r = rank as usize;
            let count = desc.count(r);
            let at = dtype.element_offset(desc.displ(r))?;
            dtype.copy_content(count, &mut dst, offset, src, at)?;
            offset += extent * count as isize;
        }
        Ok(())
    }

    /// Inverse of [`fill_from`](Self::fill_from): place every remote rank's
    /// elements at its displacement in `dst`.
    pub fn drain_into(
        &self,
        dtype: &Datatype,
        dst: &mut RegionMut<'_>,
        desc: &TransferDescriptor<'_>,
        layout: &Layout,
        root_node: NodeId,
    ) -> Result<()> {
        let extent = dtype.extent() as isize;
        let mut offset = 0isize;
        let src = self.region();
        for &(node, rank) in layout.order() {
            if node == root_node {
                continue;
            }
            let r = rank as usize;
            let count = desc.count(r);
            let at = dtype.element_offset(desc.displ(r))?;
            dtype.copy_content(count, dst, at, src, offset)?;
            offset += extent * count as isize;
        }
        Ok(())
    }
}
