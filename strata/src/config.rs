//! Runtime-configurable tuning parameters for strata.
//!
//! All values have sensible defaults. Override via environment variables
//! (prefixed `STRATA_`) or by constructing a custom `StrataConfig`.

use std::time::Duration;

/// Tuning parameters for collective operations.
#[derive(Debug, Clone)]
pub struct StrataConfig {
    /// Timeout for individual send/recv operations within collectives.
    pub collective_timeout: Duration,

    /// Allow the hierarchical (two-level) path. When false every operation
    /// is permanently routed to the flat implementation.
    pub hierarchical: bool,

    /// Upper bound for a single call-scoped scratch allocation (count
    /// arrays, bounce buffers, leader staging). `None` means only the
    /// allocator limits apply.
    pub max_scratch_bytes: Option<usize>,
}

impl Default for StrataConfig {
    fn default() -> Self {
        Self {
            collective_timeout: Duration::from_secs(30),
            hierarchical: true,
            max_scratch_bytes: None,
        }
    }
}

impl StrataConfig {
    /// Load config from environment variables, falling back to defaults.
    ///
    /// Recognized variables:
    /// - `STRATA_COLLECTIVE_TIMEOUT_SECS`
    /// - `STRATA_HIERARCHICAL` (`0`/`false` disables)
    /// - `STRATA_MAX_SCRATCH_BYTES`
    pub fn from_env() -> Self {
        let mut cfg = Self::default();

        if let Ok(v) = std::env::var("STRATA_COLLECTIVE_TIMEOUT_SECS")
            && let Ok(s) = v.parse::<u64>()
        {
            cfg.collective_timeout = Duration::from_secs(s);
        }
        if let Ok(v) = std::env::var("STRATA_HIERARCHICAL") {
            cfg.hierarchical = parse_flag(&v).unwrap_or(cfg.hierarchical);
        }
        if let Ok(v) = std::env::var("STRATA_MAX_SCRATCH_BYTES")
            && let Ok(n) = v.parse::<usize>()
        {
            cfg.max_scratch_bytes = Some(n);
        }

        cfg
    }
}

fn parse_flag(v: &str) -> Option<bool> {
    match v.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
