//! The evaluation orchestrator: composes the manual and proof paths.
//!
//! The composition invariant is absolute: the proof backend can only ever
//! LOWER the chance of approval, never raise it. The manual decision is
//! always computed; a verified proof is combined conjunctively
//! (`manual && proof`); an unavailable backend degrades to the manual
//! decision with an explicit `Manual { degraded_reason }` tag; a proof
//! whose signals fail verification forces rejection outright.
//!
//! One evaluation is one pass through
//!
//!   Start → ManualEvaluated → {ProofAttempted → ProofSucceeded |
//!   ProofUnavailable} → Composed → Returned
//!
//! with no retries and no state carried between calls.

use chrono::Utc;
use tracing::{debug, info, warn};

use fidelis_contracts::{
    decision::{Decision, ProofTag, Violation, ViolationKind},
    intent::Intent,
    policy::Policy,
    spending::SpendingContext,
};

use crate::{
    config::EngineConfig,
    evaluator::ManualEvaluator,
    traits::{ProofBackend, ProofOutcome},
};

/// The single evaluation entry point callers use.
///
/// Construct one orchestrator at startup with the engine configuration and
/// an optional proof backend; `evaluate` may then be called concurrently
/// from any number of threads.
pub struct Orchestrator {
    config: EngineConfig,
    evaluator: ManualEvaluator,
    proof: Option<Box<dyn ProofBackend>>,
}

impl Orchestrator {
    pub fn new(config: EngineConfig, proof: Option<Box<dyn ProofBackend>>) -> Self {
        let evaluator = ManualEvaluator::new(&config);
        Self {
            config,
            evaluator,
            proof,
        }
    }

    /// Evaluate one intent and return the composed decision.
    ///
    /// Never returns an error: given a valid intent and policy, every
    /// failure mode of the proof path is absorbed into the decision's
    /// `proof` tag. The caller gates the side-effecting action on
    /// `Decision::executable()`.
    pub fn evaluate(
        &self,
        intent: &Intent,
        policy: &Policy,
        spending: &SpendingContext,
    ) -> Decision {
        let evaluated_at = Utc::now();

        // ── Manual path: always computed, always authoritative ───────────────
        let mut decision = self
            .evaluator
            .evaluate(intent, policy, spending, evaluated_at);
        let manual_violations = decision.violations.len();

        if !self.config.proof_enabled {
            debug!(policy_version = policy.version, "proof disabled by configuration");
            return decision;
        }

        // ── Proof path ───────────────────────────────────────────────────────
        let outcome = match &self.proof {
            Some(backend) => backend.prove(intent, policy, spending, self.config.proof_timeout),
            None => ProofOutcome::Unavailable {
                cause: "proof enabled but no proof backend configured".to_string(),
            },
        };

        match outcome {
            ProofOutcome::Proved(proof) => {
                // The circuit reports a count, not descriptors. When the
                // verified proof rejects on grounds the manual path did not
                // find, surface that as one synthesized violation.
                if !proof.approved && proof.violation_count as usize > manual_violations {
                    decision.violations.push(Violation::new(
                        ViolationKind::ProofReported,
                        format!(
                            "proof backend reported {} violations (manual path found {})",
                            proof.violation_count, manual_violations
                        ),
                    ));
                }
                decision.risk_score = decision.risk_score.max(proof.risk_score);
                decision.approved = decision.approved && proof.approved;
                decision.proof = ProofTag::Cryptographic {
                    artifact: proof.artifact,
                };

                info!(
                    approved = decision.approved,
                    risk_score = decision.risk_score,
                    policy_version = policy.version,
                    "decision composed with cryptographic proof"
                );
            }

            ProofOutcome::VerificationFailed { reason } => {
                // The prover claimed an outcome its artifact does not
                // support. Fail closed: this is a violation, not a
                // degradation, and the claimed artifact is never attached.
                warn!(reason = %reason, "proof artifact failed verification");

                decision.approved = false;
                decision.violations.push(Violation::new(
                    ViolationKind::ProofVerificationFailed,
                    reason.clone(),
                ));
                decision.proof = ProofTag::Manual {
                    degraded_reason: Some(format!("proof artifact failed verification: {}", reason)),
                };
            }

            ProofOutcome::Unavailable { cause } => {
                // Degraded but defined: the manual decision stands, tagged
                // so callers and dashboards can tell the modes apart.
                warn!(cause = %cause, "proof backend unavailable; using manual decision");

                decision.proof = ProofTag::Manual {
                    degraded_reason: Some(cause),
                };
            }
        }

        decision
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────
