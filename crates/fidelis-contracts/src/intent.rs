//! The canonical intent model.
//!
//! An `Intent` is the trusted representation of one proposed action — a
//! payment or a calendar booking — derived from AI-extracted email content.
//! It is constructed once per inbound email, validated eagerly, never
//! mutated, and consumed exactly once by the evaluation orchestrator.
//!
//! Validation happens at construction: the evaluator assumes every `Intent`
//! it receives already satisfies the invariants documented on the fields.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::{FidelisError, FidelisResult};

/// Upper bound on accepted timestamps: 2100-01-01T00:00:00Z.
///
/// Anything at or beyond this is treated as an extraction artifact (a
/// garbled date), not a plausible execution time.
pub const MAX_TIMESTAMP: i64 = 4_102_444_800;

/// The closed set of recognized spending categories.
///
/// Anything the classifier produces outside this set is normalized to
/// `"other"` rather than rejected — category is advisory input to category
/// rules, not a trust boundary.
pub const KNOWN_CATEGORIES: &[&str] = &[
    "utilities",
    "software",
    "office",
    "travel",
    "marketing",
    "payroll",
    "rent",
    "insurance",
    "other",
];

/// Which kind of action the intent proposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IntentKind {
    /// A funds transfer to `recipient`.
    Payment,
    /// A calendar booking; `amount` is always 0.
    Schedule,
}

/// Where the intent came from and how much the extractor trusted itself.
///
/// Provenance is audit metadata. The evaluator never branches on it directly;
/// low confidence is gated through an ordinary `ConfidenceBelow` conditional
/// rule so the evaluator stays uniform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Provenance {
    /// Extraction confidence in [0, 1] as reported by the AI classifier.
    pub confidence: f64,
    /// Lowercase hex SHA-256 of the source email text, for audit linkage.
    pub source_digest: String,
}

/// One proposed payment or schedule action.
///
/// Amounts are integers in the smallest currency unit — no floating point
/// ever touches money. `recipient` is an opaque identifier: the engine only
/// compares it for equality and list membership, never interprets it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Intent {
    pub kind: IntentKind,
    /// Amount in the smallest currency unit; 0 for schedule intents.
    pub amount: u64,
    /// Opaque account/address identifier of the counterparty.
    pub recipient: String,
    /// Free-text vendor name (payments) or event title (schedules), used for
    /// category inference and list membership.
    pub vendor_or_title: String,
    /// Normalized lowercase category; one of `KNOWN_CATEGORIES`.
    pub category: String,
    /// Proposed execution time, Unix seconds.
    pub timestamp: i64,
    pub provenance: Provenance,
}

impl Intent {
    /// Construct a validated payment intent.
    ///
    /// `category` is the classifier's suggestion; when absent or unknown the
    /// category is inferred from `vendor` keywords, defaulting to `"other"`.
    /// `source_text` is the raw email body; only its SHA-256 digest is kept.
    ///
    /// # Errors
    ///
    /// Returns `FidelisError::Validation` naming the offending field when
    /// `recipient` or `vendor` is blank, `timestamp` falls outside
    /// `[0, MAX_TIMESTAMP)`, or `confidence` is outside `[0, 1]`.
    pub fn payment(
        amount: u64,
        recipient: impl Into<String>,
        vendor: impl Into<String>,
        category: Option<&str>,
        timestamp: i64,
        confidence: f64,
        source_text: &str,
    ) -> FidelisResult<Self> {
        let recipient = recipient.into();
        let vendor = vendor.into();

        if recipient.trim().is_empty() {
            return Err(FidelisError::Validation {
                field: "recipient",
                reason: "recipient identifier must not be blank".to_string(),
            });
        }

        Self::build(
            IntentKind::Payment,
            amount,
            recipient,
            vendor,
            category,
            timestamp,
            confidence,
            source_text,
        )
    }

    /// Construct a validated schedule intent.
    ///
    /// Schedule intents carry `amount = 0` and flow through the same
    /// evaluation path as payments: spend checks trivially pass while list,
    /// time-window, and conditional rules still apply. `organizer` fills the
    /// opaque `recipient` slot.
    pub fn schedule(
        title: impl Into<String>,
        organizer: impl Into<String>,
        timestamp: i64,
        confidence: f64,
        source_text: &str,
    ) -> FidelisResult<Self> {
        Self::build(
            IntentKind::Schedule,
            0,
            organizer.into(),
            title.into(),
            None,
            timestamp,
            confidence,
            source_text,
        )
    }

    #[allow(clippy::too_many_arguments)]
    fn build(
        kind: IntentKind,
        amount: u64,
        recipient: String,
        vendor_or_title: String,
        category: Option<&str>,
        timestamp: i64,
        confidence: f64,
        source_text: &str,
    ) -> FidelisResult<Self> {
        if vendor_or_title.trim().is_empty() {
            return Err(FidelisError::Validation {
                field: "vendor_or_title",
                reason: "vendor or title must not be blank".to_string(),
            });
        }

        if !(0..MAX_TIMESTAMP).contains(&timestamp) {
            return Err(FidelisError::Validation {
                field: "timestamp",
                reason: format!(
                    "timestamp {} outside accepted range [0, {})",
                    timestamp, MAX_TIMESTAMP
                ),
            });
        }

        if !(0.0..=1.0).contains(&confidence) || confidence.is_nan() {
            return Err(FidelisError::Validation {
                field: "confidence",
                reason: format!("confidence {} outside [0, 1]", confidence),
            });
        }

        let category = match category {
            Some(c) => normalize_category(c),
            None => infer_category(&vendor_or_title),
        };

        Ok(Self {
            kind,
            amount,
            recipient,
            vendor_or_title,
            category,
            timestamp,
            provenance: Provenance {
                confidence,
                source_digest: source_digest(source_text),
            },
        })
    }
}

/// Compute the lowercase hex SHA-256 digest of the source email text.
pub fn source_digest(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    hex::encode(hasher.finalize())
}

/// Normalize a classifier-supplied category to the known set.
///
/// Lowercases and trims; unknown values become `"other"` — never an error,
/// because the classifier is untrusted and category rules are advisory.
pub fn normalize_category(raw: &str) -> String {
    let c = raw.trim().to_lowercase();
    if KNOWN_CATEGORIES.contains(&c.as_str()) {
        c
    } else {
        "other".to_string()
    }
}

/// Infer a category from vendor/title keywords when the classifier supplied
/// none. First matching table row wins; no match means `"other"`.
pub fn infer_category(vendor_or_title: &str) -> String {
    const KEYWORDS: &[(&str, &str)] = &[
        ("electric", "utilities"),
        ("power", "utilities"),
        ("water", "utilities"),
        ("gas", "utilities"),
        ("internet", "utilities"),
        ("software", "software"),
        ("saas", "software"),
        ("license", "software"),
        ("cloud", "software"),
        ("hosting", "software"),
        ("flight", "travel"),
        ("hotel", "travel"),
        ("airline", "travel"),
        ("ads", "marketing"),
        ("advertis", "marketing"),
        ("rent", "rent"),
        ("lease", "rent"),
        ("insurance", "insurance"),
        ("payroll", "payroll"),
        ("salary", "payroll"),
        ("office", "office"),
        ("supplies", "office"),
    ];

    let haystack = vendor_or_title.to_lowercase();
    for (needle, category) in KEYWORDS {
        if haystack.contains(needle) {
            return (*category).to_string();
        }
    }
    "other".to_string()
}
