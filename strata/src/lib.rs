//! Topology-aware collectives for process groups spread over many nodes.
//!
//! A [`Comm`] runs `scatterv`/`gatherv` (and their regular forms) either as
//! a two-level protocol (one exchange per node between the root and each
//! node's leader, then a fan-out or fan-in inside every node) or, when the
//! group's layout does not allow it, as a plain flat collective. Callers
//! see the same results either way.

pub mod collective;
pub mod comm;
pub mod config;
pub mod datatype;
pub mod descriptor;
pub mod error;
pub mod han;
pub mod transport;
pub mod types;

pub use collective::PendingExchange;
pub use comm::{ArchSignature, CollectiveStats, Comm, Locality};
pub use config::StrataConfig;
pub use datatype::{Datatype, Region, RegionMut};
pub use descriptor::{CountArray, DispArray, TransferDescriptor};
pub use error::{Result, StrataError};
pub use han::{FallbackReason, Role, Strategy};
pub use types::{DataType, NodeId, Operation, Rank};
