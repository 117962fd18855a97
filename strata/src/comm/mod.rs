mod bootstrap;
mod byte_transport;
mod collectives;
mod communicator;
mod hash;
mod locality;
mod split;
mod stats;

pub use communicator::Comm;
pub use locality::{ArchSignature, Locality};
pub(crate) use locality::RECORD_BYTES as LOCALITY_RECORD_BYTES;
pub use stats::CollectiveStats;
pub(crate) use stats::Counters;
