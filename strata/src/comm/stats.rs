use std::sync::atomic::{AtomicU64, Ordering};

/// Per-communicator counters, readable through [`Comm::stats`](super::Comm::stats).
#[derive(Debug, Default)]
pub(crate) struct Counters {
    topology_probes: AtomicU64,
    gate_evaluations: AtomicU64,
    inter_node_exchanges: AtomicU64,
    bounce_buffers: AtomicU64,
    hierarchical_calls: AtomicU64,
    flat_calls: AtomicU64,
}

impl Counters {
    pub(crate) fn record_topology_probe(&self) {
        self.topology_probes.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_gate_evaluation(&self) {
        self.gate_evaluations.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_inter_node_exchange(&self) {
        self.inter_node_exchanges.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_bounce_buffer(&self) {
        self.bounce_buffers.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_hierarchical_call(&self) {
        self.hierarchical_calls.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_flat_call(&self) {
        self.flat_calls.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> CollectiveStats {
        CollectiveStats {
            topology_probes: self.topology_probes.load(Ordering::Relaxed),
            gate_evaluations: self.gate_evaluations.load(Ordering::Relaxed),
            inter_node_exchanges: self.inter_node_exchanges.load(Ordering::Relaxed),
            bounce_buffers: self.bounce_buffers.load(Ordering::Relaxed),
            hierarchical_calls: self.hierarchical_calls.load(Ordering::Relaxed),
            flat_calls: self.flat_calls.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time view of a communicator's collective counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CollectiveStats {
    /// Topology resolutions attempted; a failed one is retried on the next call.
    pub topology_probes: u64,
    /// Times an operation's hierarchical/flat verdict was computed. Once
    /// installed, a verdict is reused, so this stays at one per operation.
    pub gate_evaluations: u64,
    /// Inter-node phases this process issued (root or node leader).
    pub inter_node_exchanges: u64,
    /// Bounce buffers allocated for non-contiguous layouts.
    pub bounce_buffers: u64,
    /// Calls served by the two-level path.
    pub hierarchical_calls: u64,
    /// Calls served by the flat path.
    pub flat_calls: u64,
}
