//! Hierarchical (two-level) collectives.
//!
//! A flat group operation is split into an inter-node phase between one
//! process per node and an intra-node phase among the processes of each
//! node. The decomposition is resolved once per communicator, on first use,
//! and each operation then gets a permanent verdict: run hierarchically, or
//! hand every call to the flat implementation.

mod gate;
mod gatherv;
mod reconcile;
mod role;
mod scatterv;
mod scratch;
mod topology;

pub use gate::{FallbackReason, Strategy};
pub use role::{Role, classify};
pub use topology::{Layout, Topology, VirtualRank};

pub(crate) use gatherv::gatherv;
pub(crate) use scatterv::scatterv;

use crate::comm::Comm;
use crate::error::Result;
use crate::types::Operation;
use gate::Verdict;
use std::sync::OnceLock;
use topology::TopologyState;

/// Per-communicator cache. Populated lazily and never invalidated.
#[derive(Debug, Default)]
pub(crate) struct HanState {
    topology: tokio::sync::OnceCell<TopologyState>,
    verdicts: [OnceLock<Strategy>; Operation::COUNT],
}

impl HanState {
    pub(crate) fn strategy(&self, op: Operation) -> Option<Strategy> {
        self.verdicts[op.index()].get().copied()
    }

    fn install(&self, op: Operation, strategy: Strategy) -> Strategy {
        *self.verdicts[op.index()].get_or_init(|| strategy)
    }

    fn ready(&self) -> Option<&Topology> {
        match self.topology.get() {
            Some(TopologyState::Ready(topo)) => Some(topo),
            _ => None,
        }
    }
}

/// Pick the algorithm for `op` on `comm`, resolving the topology on first
/// use. `Some` carries the decomposition to run on; `None` means flat.
///
/// Every member reaches the same verdict: it depends only on data all of
/// them exchanged.
pub(crate) async fn select(comm: &Comm, op: Operation) -> Result<Option<&Topology>> {
    let han = &comm.han;
    match han.strategy(op) {
        Some(Strategy::Flat) => return Ok(None),
        Some(Strategy::Hierarchical) => return Ok(han.ready()),
        None => {}
    }

    if !comm.config().hierarchical {
        for op in Operation::ALL {
            han.install(op, Strategy::Flat);
        }
        tracing::warn!(
            comm_id = comm.comm_id(),
            "hierarchical collectives disabled by configuration"
        );
        return Ok(None);
    }

    let state = han
        .topology
        .get_or_try_init(|| async {
            comm.counters.record_topology_probe();
            topology::resolve(comm).await
        })
        .await?;

    comm.counters.record_gate_evaluation();
    match gate::evaluate(state) {
        Verdict::Proceed => {
            han.install(op, Strategy::Hierarchical);
            tracing::debug!(rank = comm.rank(), %op, "hierarchical path selected");
            Ok(han.ready())
        }
        Verdict::FallbackPermanent(reason) if reason.is_global() => {
            for op in Operation::ALL {
                han.install(op, Strategy::Flat);
            }
            if let TopologyState::Unavailable { reason: detail } = state {
                tracing::warn!(
                    comm_id = comm.comm_id(),
                    %reason,
                    detail = detail.as_str(),
                    "hierarchical path disabled for every operation"
                );
            }
            Ok(None)
        }
        Verdict::FallbackPermanent(reason) => {
            han.install(op, Strategy::Flat);
            tracing::debug!(rank = comm.rank(), %op, %reason, "falling back to flat");
            Ok(None)
        }
    }
}
