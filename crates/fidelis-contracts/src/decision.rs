//! The decision emitted for a single intent evaluation.
//!
//! A `Decision` is immutable output: approval state, risk score, the ordered
//! violation list, the rules that fired, and an explicit proof tag. The tag
//! is deliberately a tagged variant rather than a boolean so callers and
//! tests can always distinguish a cryptographically-verified approval from a
//! manual-only one — the two must never collapse into one path.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Machine-readable classification of a violation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ViolationKind {
    AmountExceedsTransactionLimit,
    DailyLimitExceeded,
    WeeklyLimitExceeded,
    BlockedCounterparty,
    NotOnAllowList,
    OutsideAllowedHours,
    DisallowedWeekday,
    CategoryLimitExceeded,
    ConditionalRuleRejected,
    /// The proof backend rejected with violations the manual path did not
    /// find; the count is carried in the message.
    ProofReported,
    /// The proof artifact's public signals did not verify.
    ProofVerificationFailed,
}

/// One violated constraint: a machine-readable kind plus a human-readable
/// description for operators and audit output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    pub kind: ViolationKind,
    pub message: String,
}

impl Violation {
    pub fn new(kind: ViolationKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// The raw proof material returned by the external prover.
///
/// `proof` is opaque to this system — its cryptographic soundness is the
/// external circuit's concern. `public_signals` are the committed outputs
/// the adapter checks against the prover's claimed decision before the
/// artifact is trusted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofArtifact {
    pub proof: String,
    pub public_signals: Vec<String>,
}

/// How the decision's approval was established.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum ProofTag {
    /// Proof generation was disabled by configuration.
    None,
    /// The decision rests on the manual evaluator alone.
    ///
    /// `degraded_reason` is present when a proof was requested but the
    /// backend was unavailable or its artifact failed verification — the
    /// degraded-but-defined mode, kept visible for observability.
    Manual {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        degraded_reason: Option<String>,
    },
    /// Both the manual evaluator and a verified cryptographic proof agree.
    Cryptographic { artifact: ProofArtifact },
}

/// The output of one evaluation. Immutable; the caller gates the actual
/// side-effecting action on `approved` and `requires_manual_approval`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    /// True only when zero violations accumulated, no approval hold was
    /// raised, and — when a cryptographic proof was produced — the proof
    /// also approved.
    pub approved: bool,
    /// A soft stop, distinct from rejection: the intent is held for a human.
    pub requires_manual_approval: bool,
    /// Accumulated risk, saturating, capped at 100.
    pub risk_score: u8,
    /// Ordered per the fixed evaluation order; manual violations first, then
    /// proof-reported ones.
    pub violations: Vec<Violation>,
    /// Stable identifiers of every rule that fired, for audit.
    pub matched_rules: Vec<String>,
    pub proof: ProofTag,
    /// The policy version this decision binds to, for reproducibility.
    pub policy_version: u32,
    pub evaluated_at: DateTime<Utc>,
}

impl Decision {
    /// Whether the gated action may execute: approved and not held.
    pub fn executable(&self) -> bool {
        self.approved && !self.requires_manual_approval
    }
}
