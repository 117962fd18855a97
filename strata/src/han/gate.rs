use crate::han::topology::TopologyState;

/// Algorithm installed for one operation on one communicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    Hierarchical,
    Flat,
}

/// Why the hierarchical path was turned down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackReason {
    /// No decomposition could be built. Disables every operation.
    SubgroupsUnavailable,
    /// Nodes host different numbers of processes.
    PpnImbalanced,
    /// Members disagree on data representation.
    Heterogeneous,
}

impl FallbackReason {
    /// True when the verdict applies to all operations, not just the one
    /// being evaluated.
    pub fn is_global(self) -> bool {
        matches!(self, FallbackReason::SubgroupsUnavailable)
    }
}

impl std::fmt::Display for FallbackReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            FallbackReason::SubgroupsUnavailable => "sub-groups unavailable",
            FallbackReason::PpnImbalanced => "processes per node imbalanced",
            FallbackReason::Heterogeneous => "heterogeneous data representations",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Verdict {
    Proceed,
    FallbackPermanent(FallbackReason),
}

/// Eligibility rules, first match wins.
pub(crate) fn evaluate(state: &TopologyState) -> Verdict {
    let layout = match state {
        TopologyState::Unavailable { .. } => {
            return Verdict::FallbackPermanent(FallbackReason::SubgroupsUnavailable);
        }
        TopologyState::Ready(topo) => &topo.layout,
    };
    if layout.ppn_imbalanced() {
        return Verdict::FallbackPermanent(FallbackReason::PpnImbalanced);
    }
    if layout.heterogeneous() {
        return Verdict::FallbackPermanent(FallbackReason::Heterogeneous);
    }
    Verdict::Proceed
}
