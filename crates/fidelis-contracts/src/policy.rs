//! The versioned policy model and the closed conditional-rule grammar.
//!
//! A `Policy` is the rule-set an intent is evaluated against: static numeric
//! and time-window limits, allow/block lists, per-category overrides, and an
//! ordered list of conditional rules. Policies are immutable per version —
//! every edit produces a new value with `version` incremented (the edit
//! operations live in `fidelis-policy`), and every decision records the
//! version it was evaluated against.
//!
//! Conditional-rule conditions are a **closed, enumerable grammar**: the
//! `Predicate` enum. There is no expression parser and no string matching of
//! arbitrary conditions — anything outside the enum is unrepresentable, and
//! parameter ranges are checked at policy-edit / policy-load time so a bad
//! predicate can never reach evaluation.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{FidelisError, FidelisResult};

/// How allow/block list entries are matched against a recipient or vendor.
///
/// Both modes are case-insensitive. `Substring` treats each list entry as a
/// fragment the candidate must contain (entry `"gift card"` matches vendor
/// `"Acme Gift Card Dept"`); `Exact` requires the whole string to match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ListMatch {
    Exact,
    Substring,
}

/// Per-category overrides layered on top of the static limits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryRule {
    /// Category-specific amount cap; `None` means the category adds no cap.
    pub max_amount: Option<u64>,
    /// When true, any intent in this category is held for manual approval.
    #[serde(default)]
    pub require_approval: bool,
}

/// What a matching conditional rule does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RuleAction {
    /// Documents an intentional carve-out. Records the match for audit but
    /// never removes violations — a reject always wins over an approve.
    Approve,
    /// Adds a violation (the intent is rejected).
    Reject,
    /// Holds the intent for manual approval without adding a violation.
    RequireApproval,
}

/// The closed grammar of conditional-rule conditions.
///
/// Every predicate evaluates against the fixed context {amount, vendor,
/// category, hour, weekday, confidence, allow list, per-transaction cap}.
/// Parameters are typed; `validate()` enforces their ranges.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Predicate {
    /// `amount > threshold`.
    AmountAbove { threshold: u64 },
    /// `amount < threshold`.
    AmountBelow { threshold: u64 },
    /// Extraction confidence strictly below `threshold` (0–1).
    ConfidenceBelow { threshold: f64 },
    /// Case-insensitive exact match on the vendor/title.
    VendorEquals { vendor: String },
    /// Match on the normalized category.
    CategoryEquals { category: String },
    /// Hour-of-day strictly after `hour` (0–23).
    HourAfter { hour: u8 },
    /// `amount` exceeds the matching category rule's `max_amount`.
    /// False when the category has no rule or the rule has no cap.
    AmountAboveCategoryLimit,
    /// Neither recipient nor vendor appears on a non-empty allow list.
    /// False when the allow list is empty, consistent with the list check.
    VendorNotInAllowList,
    /// Hour-of-day outside the policy's `[allowed_hour_start,
    /// allowed_hour_end)` window.
    HourOutsideAllowedWindow,
    /// Weekday is Saturday or Sunday.
    WeekdayIsWeekend,
}

impl Predicate {
    /// Stable kebab-case name, used in rule identifiers and messages.
    pub fn name(&self) -> &'static str {
        match self {
            Predicate::AmountAbove { .. } => "amount-above",
            Predicate::AmountBelow { .. } => "amount-below",
            Predicate::ConfidenceBelow { .. } => "confidence-below",
            Predicate::VendorEquals { .. } => "vendor-equals",
            Predicate::CategoryEquals { .. } => "category-equals",
            Predicate::HourAfter { .. } => "hour-after",
            Predicate::AmountAboveCategoryLimit => "amount-above-category-limit",
            Predicate::VendorNotInAllowList => "vendor-not-in-allow-list",
            Predicate::HourOutsideAllowedWindow => "hour-outside-allowed-window",
            Predicate::WeekdayIsWeekend => "weekday-is-weekend",
        }
    }

    /// Check parameter ranges.
    ///
    /// Called by the edit operations and the TOML loader — the two gates
    /// through which predicates enter a policy.
    pub fn validate(&self) -> FidelisResult<()> {
        match self {
            Predicate::ConfidenceBelow { threshold } => {
                if !(0.0..=1.0).contains(threshold) || threshold.is_nan() {
                    return Err(FidelisError::InvalidExpression {
                        reason: format!(
                            "confidence-below threshold {} outside [0, 1]",
                            threshold
                        ),
                    });
                }
            }
            Predicate::HourAfter { hour } => {
                if *hour > 23 {
                    return Err(FidelisError::InvalidExpression {
                        reason: format!("hour-after hour {} outside 0-23", hour),
                    });
                }
            }
            Predicate::VendorEquals { vendor } => {
                if vendor.trim().is_empty() {
                    return Err(FidelisError::InvalidExpression {
                        reason: "vendor-equals vendor must not be blank".to_string(),
                    });
                }
            }
            Predicate::CategoryEquals { category } => {
                if category.trim().is_empty() {
                    return Err(FidelisError::InvalidExpression {
                        reason: "category-equals category must not be blank".to_string(),
                    });
                }
            }
            _ => {}
        }
        Ok(())
    }
}

/// One conditional rule: a predicate and the action taken when it matches.
///
/// Rules are evaluated in the order they appear in the policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionalRule {
    /// Stable identifier, unique within the policy; appears in
    /// `Decision::matched_rules` and audit output.
    pub id: String,
    pub condition: Predicate,
    pub action: RuleAction,
}

/// The versioned rule-set an intent is evaluated against.
///
/// Read-only input to evaluation; long-lived and cached by the caller.
/// Weekdays are numbered 0 = Sunday … 6 = Saturday, matching the proof
/// circuit's `(days_since_epoch + 4) % 7` derivation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Policy {
    pub id: Uuid,
    pub user_id: String,
    /// Monotonically increasing per user; every edit produces version + 1.
    pub version: u32,
    pub updated_at: DateTime<Utc>,

    /// Cap on a single transaction, smallest currency unit.
    pub max_per_transaction: u64,
    /// Cap on `spent_today + amount`.
    pub max_per_day: u64,
    /// Cap on `spent_this_week + amount`.
    pub max_per_week: u64,

    /// Start of the allowed half-open hour window `[start, end)`, 0–23.
    pub allowed_hour_start: u8,
    /// End of the allowed hour window; `start <= end`. A zero-width window
    /// (`start == end`) blocks every hour.
    pub allowed_hour_end: u8,
    /// Allowed weekdays, 0 = Sunday … 6 = Saturday.
    pub allowed_weekdays: BTreeSet<u8>,

    /// Identifiers/vendors explicitly permitted. Empty means "no allow-list
    /// restriction"; non-empty means everything off the list violates.
    pub allow_list: Vec<String>,
    /// Identifiers/vendors explicitly forbidden. Block always wins over allow.
    pub block_list: Vec<String>,
    pub list_match: ListMatch,

    /// Per-category overrides, keyed by normalized category name.
    pub category_rules: BTreeMap<String, CategoryRule>,
    /// Ordered conditional rules over the closed grammar.
    pub conditional_rules: Vec<ConditionalRule>,
}

impl Policy {
    /// Structural validation of the static fields.
    ///
    /// The edit operations and the TOML loader call this before handing a
    /// policy to callers; the evaluator assumes it has passed.
    pub fn validate(&self) -> FidelisResult<()> {
        if self.allowed_hour_start > 23 || self.allowed_hour_end > 23 {
            return Err(FidelisError::Validation {
                field: "allowed_hours",
                reason: format!(
                    "hour window [{}, {}) outside 0-23",
                    self.allowed_hour_start, self.allowed_hour_end
                ),
            });
        }
        if self.allowed_hour_start > self.allowed_hour_end {
            return Err(FidelisError::Validation {
                field: "allowed_hours",
                reason: format!(
                    "hour window start {} after end {}",
                    self.allowed_hour_start, self.allowed_hour_end
                ),
            });
        }
        if let Some(day) = self.allowed_weekdays.iter().find(|d| **d > 6) {
            return Err(FidelisError::Validation {
                field: "allowed_weekdays",
                reason: format!("weekday {} outside 0-6", day),
            });
        }
        for entry in self.allow_list.iter().chain(self.block_list.iter()) {
            // An empty entry would substring-match every candidate.
            if entry.trim().is_empty() {
                return Err(FidelisError::Validation {
                    field: "lists",
                    reason: "list entries must not be blank".to_string(),
                });
            }
        }
        let mut seen = BTreeSet::new();
        for rule in &self.conditional_rules {
            if rule.id.trim().is_empty() {
                return Err(FidelisError::Validation {
                    field: "conditional_rules",
                    reason: "conditional rule ids must not be blank".to_string(),
                });
            }
            if !seen.insert(rule.id.as_str()) {
                return Err(FidelisError::Validation {
                    field: "conditional_rules",
                    reason: format!("duplicate conditional rule id '{}'", rule.id),
                });
            }
            rule.condition.validate()?;
        }
        Ok(())
    }

    /// Return true if `candidate` matches any entry of `list` under this
    /// policy's match mode. Matching is case-insensitive in both modes.
    pub fn list_contains(&self, list: &[String], candidate: &str) -> bool {
        let candidate = candidate.to_lowercase();
        list.iter().any(|entry| {
            let entry = entry.to_lowercase();
            match self.list_match {
                ListMatch::Exact => entry == candidate,
                ListMatch::Substring => candidate.contains(&entry),
            }
        })
    }

    /// Block-list membership for a recipient/vendor pair.
    pub fn blocks(&self, recipient: &str, vendor: &str) -> bool {
        self.list_contains(&self.block_list, recipient)
            || self.list_contains(&self.block_list, vendor)
    }

    /// Allow-list membership for a recipient/vendor pair.
    ///
    /// Only meaningful when the allow list is non-empty; callers check that.
    pub fn allows(&self, recipient: &str, vendor: &str) -> bool {
        self.list_contains(&self.allow_list, recipient)
            || self.list_contains(&self.allow_list, vendor)
    }
}
