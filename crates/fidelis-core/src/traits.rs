//! The proof-backend trait seam.
//!
//! The manual evaluator is the trusted, deterministic ground truth; a
//! `ProofBackend` is an **untrusted accelerator of confidence** — an
//! external process whose output is only ever combined conjunctively with
//! the manual result. The orchestrator guarantees a backend can lower the
//! chance of approval but never raise it:
//!
//! - `Proved` is returned only for an artifact whose public signals already
//!   verified; the composed approval is `manual && proof`.
//! - `VerificationFailed` forces rejection.
//! - `Unavailable` degrades to the manual decision, explicitly tagged.

use std::time::Duration;

use fidelis_contracts::{
    decision::ProofArtifact, intent::Intent, policy::Policy, spending::SpendingContext,
};

/// The prover's verified claim about one evaluation.
#[derive(Debug, Clone, PartialEq)]
pub struct ProofEvaluation {
    pub approved: bool,
    pub risk_score: u8,
    /// Number of violated constraints the circuit counted. The circuit
    /// reports a count, not descriptors; the orchestrator reconciles it
    /// with the manual violation list.
    pub violation_count: u32,
    pub artifact: ProofArtifact,
}

/// Everything a proof attempt can come back as.
///
/// `Unavailable` is a domain outcome, not an error: timeouts, missing
/// binaries, crashes, and malformed output all land here and the caller
/// degrades gracefully. Only `VerificationFailed` carries negative trust —
/// the prover *claimed* an outcome its own artifact does not support.
#[derive(Debug, Clone, PartialEq)]
pub enum ProofOutcome {
    /// A proof was generated and its public signals verified.
    Proved(ProofEvaluation),
    /// A proof came back but its public signals contradict the claimed
    /// outcome. Treated as a violation by the orchestrator.
    VerificationFailed { reason: String },
    /// No usable proof: timeout, spawn failure, crash, malformed response.
    /// The cause string is diagnostic only.
    Unavailable { cause: String },
}

/// An external proof-generating backend.
///
/// Implementations must be safe to call from multiple threads; each call
/// performs one self-contained invocation bounded by `timeout`. The
/// orchestrator never retries within a single evaluation.
pub trait ProofBackend: Send + Sync {
    /// Attempt to generate and verify a compliance proof for the intent.
    ///
    /// Must never panic on backend failure — every failure mode maps to
    /// `ProofOutcome::Unavailable` or `ProofOutcome::VerificationFailed`.
    fn prove(
        &self,
        intent: &Intent,
        policy: &Policy,
        spending: &SpendingContext,
        timeout: Duration,
    ) -> ProofOutcome;
}
