use crate::collective::{CollectiveTag, allgather_bytes};
use crate::comm::{Comm, LOCALITY_RECORD_BYTES, Locality};
use crate::error::{Result, StrataError};
use crate::han::scratch;
use crate::types::{NodeId, Operation, Rank};
use std::sync::Arc;

/// A process's coordinates in the two-level decomposition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VirtualRank {
    /// Rank among the processes of its node.
    pub intra: Rank,
    /// Index of its node.
    pub inter: NodeId,
}

/// Node layout of a communicator, derived from every member's locality.
#[derive(Debug, Clone)]
pub struct Layout {
    /// Indexed by rank in the parent communicator.
    vranks: Vec<VirtualRank>,
    /// `(node, rank)` pairs, node-major, then by intra rank within a node.
    order: Vec<(NodeId, Rank)>,
    node_sizes: Vec<usize>,
    ppn_imbalanced: bool,
    heterogeneous: bool,
}

impl Layout {
    /// Nodes are numbered by first appearance in rank order; within a node
    /// processes are numbered by ascending rank.
    pub fn compute(localities: &[Locality]) -> Self {
        let mut nodes: indexmap::IndexSet<&str> = indexmap::IndexSet::new();
        let mut vranks = Vec::with_capacity(localities.len());
        let mut node_sizes: Vec<usize> = Vec::new();

        for loc in localities {
            let (node, inserted) = nodes.insert_full(loc.node.as_str());
            if inserted {
                node_sizes.push(0);
            }
            vranks.push(VirtualRank {
                intra: node_sizes[node] as Rank,
                inter: node as NodeId,
            });
            node_sizes[node] += 1;
        }

        let mut order: Vec<(NodeId, Rank)> = vranks
            .iter()
            .enumerate()
            .map(|(r, v)| (v.inter, r as Rank))
            .collect();
        // Ranks ascend within a node, so sorting by (node, rank) is also
        // sorting by (node, intra).
        order.sort_unstable();

        let ppn_imbalanced = node_sizes.windows(2).any(|w| w[0] != w[1]);
        let heterogeneous = localities
            .first()
            .is_some_and(|first| localities.iter().any(|l| l.arch != first.arch));

        Self {
            vranks,
            order,
            node_sizes,
            ppn_imbalanced,
            heterogeneous,
        }
    }

    pub fn vrank(&self, rank: Rank) -> Result<VirtualRank> {
        self.vranks
            .get(rank as usize)
            .copied()
            .ok_or(StrataError::InvalidRank {
                rank,
                world_size: self.vranks.len() as u32,
            })
    }

    /// Every process as `(node, rank)`, node-major.
    pub fn order(&self) -> &[(NodeId, Rank)] {
        &self.order
    }

    pub fn num_nodes(&self) -> usize {
        self.node_sizes.len()
    }

    pub fn node_size(&self, node: NodeId) -> usize {
        self.node_sizes.get(node as usize).copied().unwrap_or(0)
    }

    pub fn world_size(&self) -> usize {
        self.vranks.len()
    }

    pub fn ppn_imbalanced(&self) -> bool {
        self.ppn_imbalanced
    }

    pub fn heterogeneous(&self) -> bool {
        self.heterogeneous
    }

    /// Refuse to broker raw bytes between differing representations.
    pub(crate) fn ensure_homogeneous(&self, op: Operation) -> Result<()> {
        if self.heterogeneous {
            return Err(StrataError::HeterogeneousBroker {
                operation: op.name(),
            });
        }
        Ok(())
    }
}

/// A resolved decomposition: the layout plus this process's two sub-groups.
#[derive(Debug)]
pub struct Topology {
    pub layout: Layout,
    /// Processes on this node, ordered by intra rank.
    pub intra: Arc<Comm>,
    /// Processes sharing this process's intra rank, one per node, ordered
    /// by node.
    pub inter: Arc<Comm>,
}

#[derive(Debug)]
pub(crate) enum TopologyState {
    Ready(Topology),
    Unavailable { reason: String },
}

/// Discover the node layout and build the sub-groups. Collective over
/// `comm`.
pub(crate) async fn resolve(comm: &Comm) -> Result<TopologyState> {
    let world = comm.size() as usize;
    if world < 2 {
        return Ok(TopologyState::Unavailable {
            reason: "communicator has a single process".into(),
        });
    }

    scratch::ensure_within(
        world.saturating_mul(LOCALITY_RECORD_BYTES),
        "locality records",
        comm.scratch_limit(),
    )?;
    let records = allgather_bytes(comm, comm.locality().encode(), CollectiveTag::Allgather).await?;
    let localities = records
        .iter()
        .map(|r| Locality::decode(r))
        .collect::<Result<Vec<_>>>()?;

    let layout = Layout::compute(&localities);
    let me = layout.vrank(comm.rank())?;

    let intra = comm.split(me.inter, comm.rank()).await?;
    let inter = comm.split(me.intra, me.inter).await?;

    if !layout.ppn_imbalanced() && (intra.rank() != me.intra || inter.rank() != me.inter) {
        return Err(StrataError::Topology {
            reason: format!(
                "rank {} landed at ({}, {}) in its sub-groups, expected ({}, {})",
                comm.rank(),
                intra.rank(),
                inter.rank(),
                me.intra,
                me.inter
            ),
        });
    }

    tracing::debug!(
        rank = comm.rank(),
        nodes = layout.num_nodes(),
        intra = me.intra,
        inter = me.inter,
        imbalanced = layout.ppn_imbalanced(),
        heterogeneous = layout.heterogeneous(),
        "resolved topology"
    );

    Ok(TopologyState::Ready(Topology {
        layout,
        intra: Arc::new(intra),
        inter: Arc::new(inter),
    }))
}
