//! The `ProofBackend` implementation over the external prover process.
//!
//! One `prove` call is: encode → invoke → check artifact presence → verify
//! public signals. The artifact's cryptographic soundness is the external
//! circuit's concern; what the adapter enforces is that the signals the
//! artifact commits to actually say what the prover claims they say. A
//! prover whose claim and artifact disagree gets `VerificationFailed` —
//! negative trust, which the orchestrator turns into a rejection — while
//! every mechanical failure is a plain `Unavailable`.

use std::time::Duration;

use tracing::{debug, warn};

use fidelis_contracts::{
    decision::ProofArtifact, intent::Intent, policy::Policy, spending::SpendingContext,
};
use fidelis_core::traits::{ProofBackend, ProofEvaluation, ProofOutcome};

use crate::{
    encode::encode,
    process::{invoke, ProverConfig, ProverResponse},
};

/// The external proof-generating backend.
///
/// Stateless between calls: each `prove` spawns one child process bounded
/// by the caller's timeout. Safe to share across threads; concurrency
/// limits (each invocation is a separate OS process) are the integrating
/// service's responsibility.
pub struct ExternalProver {
    config: ProverConfig,
    timezone_offset_minutes: i32,
}

impl ExternalProver {
    pub fn new(config: ProverConfig, timezone_offset_minutes: i32) -> Self {
        Self {
            config,
            timezone_offset_minutes,
        }
    }
}

impl ProofBackend for ExternalProver {
    fn prove(
        &self,
        intent: &Intent,
        policy: &Policy,
        spending: &SpendingContext,
        timeout: Duration,
    ) -> ProofOutcome {
        let (input, truncation) = encode(intent, policy, spending, self.timezone_offset_minutes);

        if truncation.any() {
            // A known circuit limitation, surfaced rather than silent: the
            // proof covers only the embedded slots. The manual evaluator
            // still checks the full policy.
            warn!(
                allow_list_dropped = truncation.allow_list_dropped,
                category_rules_dropped = truncation.category_rules_dropped,
                conditional_rules_dropped = truncation.conditional_rules_dropped,
                "policy exceeds circuit slots; proof covers a truncated policy"
            );
        }

        let response = match invoke(&self.config.binary, &input, timeout) {
            Ok(response) => response,
            Err(cause) => return ProofOutcome::Unavailable { cause },
        };

        match extract_verified(response) {
            Ok(evaluation) => {
                debug!(
                    approved = evaluation.approved,
                    risk_score = evaluation.risk_score,
                    "proof generated and signals verified"
                );
                ProofOutcome::Proved(evaluation)
            }
            Err(Verdict::Unavailable(cause)) => ProofOutcome::Unavailable { cause },
            Err(Verdict::Mismatch(reason)) => ProofOutcome::VerificationFailed { reason },
        }
    }
}

/// Why a response could not be promoted to a verified proof.
#[derive(Debug)]
enum Verdict {
    /// No usable artifact came back — a degradation, not a contradiction.
    Unavailable(String),
    /// The artifact contradicts the prover's claimed outcome.
    Mismatch(String),
}

/// Promote a schema-valid response to a verified `ProofEvaluation`.
///
/// The first three public signals commit to (approved, risk score,
/// violation count); each must match the response's claimed field
/// before the artifact's `approved` flag is trusted.
fn extract_verified(response: ProverResponse) -> Result<ProofEvaluation, Verdict> {
    let proof = match response.proof {
        Some(ref proof) if !proof.is_empty() => proof.clone(),
        _ => {
            return Err(Verdict::Unavailable(
                "prover response carried no proof artifact".to_string(),
            ))
        }
    };
    let signals = match response.public_signals {
        Some(ref signals) if signals.len() >= 3 => signals.clone(),
        Some(ref signals) => {
            return Err(Verdict::Mismatch(format!(
                "artifact commits to {} public signals, expected at least 3",
                signals.len()
            )))
        }
        None => {
            return Err(Verdict::Unavailable(
                "prover response carried no public signals".to_string(),
            ))
        }
    };

    let expected_approved = if response.approved { "1" } else { "0" };
    if signals[0] != expected_approved {
        return Err(Verdict::Mismatch(format!(
            "public signal 0 is '{}' but the prover claims approved = {}",
            signals[0], response.approved
        )));
    }
    if signals[1] != response.risk_score.to_string() {
        return Err(Verdict::Mismatch(format!(
            "public signal 1 is '{}' but the prover claims risk score {}",
            signals[1], response.risk_score
        )));
    }
    if signals[2] != response.violation_count.to_string() {
        return Err(Verdict::Mismatch(format!(
            "public signal 2 is '{}' but the prover claims {} violations",
            signals[2], response.violation_count
        )));
    }

    Ok(ProofEvaluation {
        approved: response.approved,
        risk_score: response.risk_score,
        violation_count: response.violation_count,
        artifact: ProofArtifact {
            proof,
            public_signals: signals,
        },
    })
}

// ── Tests ────────────────────────────────────────────────────────────────────
