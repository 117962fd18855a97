use crate::comm::{CollectiveStats, Counters, Locality};
use crate::config::StrataConfig;
use crate::error::{Result, StrataError};
use crate::han::{HanState, Strategy};
use crate::transport::Fabric;
use crate::types::{Operation, Rank};
use std::sync::Arc;
use std::sync::atomic::AtomicU64;

/// A process group that collectives execute over.
///
/// Every member holds its own `Comm`. Besides addressing (rank, size and the
/// mapping of group ranks onto fabric addresses) it owns the state the
/// hierarchical engine caches for the group's lifetime: the resolved
/// topology with its two sub-groups, and the per-operation choice between
/// the two-level and the flat algorithm.
///
/// # Example
///
/// ```no_run
/// use strata::{Comm, Locality};
///
/// let comms = Comm::bootstrap_local(Locality::cluster(&[4, 4]));
/// assert_eq!(comms[5].rank(), 5);
/// assert_eq!(comms[5].size(), 8);
/// ```
pub struct Comm {
    pub(super) rank: Rank,
    pub(super) size: u32,
    /// Communicator ID. 0 = the bootstrap (world) communicator.
    pub(super) comm_id: u32,
    /// Fabric address of each member, indexed by rank in this group.
    pub(super) members: Vec<Rank>,
    pub(super) fabric: Arc<Fabric>,
    pub(super) locality: Locality,
    pub(super) config: Arc<StrataConfig>,
    /// Advanced in lockstep by every member on each `split()`, so it can be
    /// used to derive deterministic comm_ids.
    pub(super) split_generation: AtomicU64,
    pub(crate) han: HanState,
    pub(crate) counters: Counters,
}

impl Comm {
    pub(super) fn from_parts(
        rank: Rank,
        comm_id: u32,
        members: Vec<Rank>,
        fabric: Arc<Fabric>,
        locality: Locality,
        config: Arc<StrataConfig>,
    ) -> Self {
        Self {
            rank,
            size: members.len() as u32,
            comm_id,
            members,
            fabric,
            locality,
            config,
            split_generation: AtomicU64::new(0),
            han: HanState::default(),
            counters: Counters::default(),
        }
    }

    /// This process's rank within the group (0-indexed).
    pub fn rank(&self) -> Rank {
        self.rank
    }

    /// Number of processes in the group.
    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn comm_id(&self) -> u32 {
        self.comm_id
    }

    pub fn locality(&self) -> &Locality {
        &self.locality
    }

    pub fn config(&self) -> &StrataConfig {
        &self.config
    }

    /// Counters of the collectives run on this communicator by this process.
    pub fn stats(&self) -> CollectiveStats {
        self.counters.snapshot()
    }

    /// Algorithm installed for `op`, or `None` before its first call.
    pub fn strategy(&self, op: Operation) -> Option<Strategy> {
        self.han.strategy(op)
    }

    /// Mark this process dead on the fabric. Its peers observe
    /// `PeerDisconnected` or a collective timeout.
    pub async fn close(&self) {
        self.fabric.close(self.members[self.rank as usize]).await;
    }

    /// Fabric address of group rank `rank`.
    pub(crate) fn address(&self, rank: Rank) -> Result<Rank> {
        self.members
            .get(rank as usize)
            .copied()
            .ok_or(StrataError::InvalidRank {
                rank,
                world_size: self.size,
            })
    }

    pub(crate) fn check_rank(&self, rank: Rank) -> Result<()> {
        if rank >= self.size {
            return Err(StrataError::InvalidRank {
                rank,
                world_size: self.size,
            });
        }
        Ok(())
    }

    pub(crate) fn scratch_limit(&self) -> Option<usize> {
        self.config.max_scratch_bytes
    }
}

impl std::fmt::Debug for Comm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Comm")
            .field("rank", &self.rank)
            .field("size", &self.size)
            .field("comm_id", &self.comm_id)
            .field("node", &self.locality.node)
            .finish_non_exhaustive()
    }
}
