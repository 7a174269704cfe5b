//! Error types for the FIDELIS evaluation pipeline.
//!
//! All fallible operations in the FIDELIS crates return `FidelisResult<T>`.
//! Error variants carry enough context to name the offending field or rule.
//!
//! Note what is *not* here: proof-backend unavailability. A missing, timed-out
//! or crashed prover is a recoverable domain outcome (the orchestrator
//! degrades to the manual decision and tags it), never an error surfaced to
//! the caller.

use thiserror::Error;

/// The unified error type for the FIDELIS crates.
#[derive(Debug, Error)]
pub enum FidelisError {
    /// An intent or policy failed validation at construction time.
    ///
    /// `field` names the offending field so callers can surface it directly.
    #[error("validation failed for field '{field}': {reason}")]
    Validation { field: &'static str, reason: String },

    /// A conditional-rule condition was not recognized or carried an
    /// out-of-range parameter.
    ///
    /// Raised at policy-edit / policy-load time, never at evaluation time —
    /// a policy holding an invalid expression can never reach the evaluator.
    #[error("invalid conditional-rule expression: {reason}")]
    InvalidExpression { reason: String },

    /// A policy document or engine configuration value is missing or malformed.
    #[error("configuration error: {reason}")]
    Config { reason: String },

    /// A proof artifact's public signals did not match the prover's claimed
    /// outcome.
    ///
    /// This is treated as equivalent to a violation: it forces
    /// `approved = false` on the composed decision. It is never swallowed.
    #[error("proof verification failed: {reason}")]
    ProofVerificationFailed { reason: String },
}

/// Convenience alias used throughout the FIDELIS crates.
pub type FidelisResult<T> = Result<T, FidelisError>;
