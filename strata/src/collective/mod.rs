//! Flat collectives.
//!
//! These run over any [`Comm`](crate::Comm) and serve twice: as the
//! fallback when the hierarchical path is not eligible, and as the
//! sub-group provider the hierarchical path composes.

mod gather;
mod gatherv;
mod handle;
mod helpers;
mod nonblocking;
mod scatterv;

pub use handle::PendingExchange;

pub(crate) use gather::{allgather_bytes, gather_bytes};
pub(crate) use gatherv::gatherv;
pub(crate) use helpers::CollectiveTag;
pub(crate) use nonblocking::{igatherv_leaf, igatherv_root, iscatterv_leaf, iscatterv_root};
pub(crate) use scatterv::scatterv;
