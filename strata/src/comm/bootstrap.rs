use crate::comm::{Comm, Locality};
use crate::config::StrataConfig;
use crate::transport::Fabric;
use std::sync::Arc;

impl Comm {
    /// Build a world communicator for processes living in this process,
    /// one per entry of `localities`, connected through a shared fabric.
    ///
    /// This is a convenience for tests and simulations: each returned
    /// `Comm` is driven by its own task. Config comes from the environment.
    pub fn bootstrap_local(localities: Vec<Locality>) -> Vec<Comm> {
        Self::bootstrap_local_with_config(localities, StrataConfig::from_env())
    }

    /// Same as [`bootstrap_local`](Self::bootstrap_local) with explicit tuning.
    pub fn bootstrap_local_with_config(
        localities: Vec<Locality>,
        config: StrataConfig,
    ) -> Vec<Comm> {
        let fabric = Fabric::new();
        let config = Arc::new(config);
        let members: Vec<u32> = (0..localities.len() as u32).collect();
        tracing::debug!(world_size = members.len(), "bootstrapping local world");

        localities
            .into_iter()
            .enumerate()
            .map(|(rank, locality)| {
                Comm::from_parts(
                    rank as u32,
                    0,
                    members.clone(),
                    Arc::clone(&fabric),
                    locality,
                    Arc::clone(&config),
                )
            })
            .collect()
    }
}
