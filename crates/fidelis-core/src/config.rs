//! Engine configuration.
//!
//! One `EngineConfig` is constructed at process start and passed by value
//! into the orchestrator. There is no ambient global state and no
//! environment-variable read anywhere inside the core — everything the
//! engine needs to know arrives through this struct.

use std::time::Duration;

/// Configuration for one evaluation engine instance.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Whether to attempt cryptographic proof generation. When false the
    /// decision is tagged `ProofTag::None` and the prover is never invoked.
    pub proof_enabled: bool,

    /// Hard ceiling on one prover invocation. On expiry the child process is
    /// killed and the evaluation degrades to the manual decision.
    pub proof_timeout: Duration,

    /// Reference timezone for hour-of-day / weekday derivation, as minutes
    /// east of UTC. The default of 0 (UTC) is the documented reference zone;
    /// both the manual evaluator and the circuit encoding apply the same
    /// offset, so the two paths always agree on time derivation.
    pub timezone_offset_minutes: i32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            proof_enabled: false,
            proof_timeout: Duration::from_secs(30),
            timezone_offset_minutes: 0,
        }
    }
}
