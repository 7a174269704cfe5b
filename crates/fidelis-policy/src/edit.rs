//! Copy-on-write policy edit operations.
//!
//! Policies are immutable per version: every edit returns a new `Policy`
//! with `version` incremented and `updated_at` refreshed, leaving the input
//! untouched. Evaluation always binds to exactly one version, so in-flight
//! evaluations are unaffected by concurrent edits.
//!
//! Conditional rules are validated here, at edit time — the evaluator never
//! sees an unrecognized predicate or an out-of-range parameter.

use std::collections::{BTreeMap, BTreeSet};

use chrono::Utc;
use tracing::debug;
use uuid::Uuid;

use fidelis_contracts::{
    error::{FidelisError, FidelisResult},
    intent::normalize_category,
    policy::{CategoryRule, ConditionalRule, ListMatch, Policy, Predicate, RuleAction},
};

/// Block-list entries every default policy starts with: the classic
/// email-payment-fraud vocabulary.
pub const DEFAULT_BLOCK_LIST: &[&str] = &[
    "gift card",
    "giftcard",
    "western union",
    "moneygram",
    "prepaid card",
];

/// The edit surface for [`Policy`].
///
/// Implemented as an extension trait so the contracts crate stays free of
/// business logic; import `PolicyEdit` to use these on any `Policy`.
pub trait PolicyEdit: Sized {
    /// Build a conservative version-1 policy for a new user: business-hours
    /// window Mon–Fri 9–18, moderate spend caps, empty allow list, and the
    /// default fraud-vocabulary block list with substring matching.
    fn default_for_user(user_id: impl Into<String>) -> Self;

    /// Insert or overwrite the rule for `category` (normalized first).
    /// Returns the incremented-version copy.
    fn with_category_rule(&self, category: &str, rule: CategoryRule) -> Self;

    /// Append a conditional rule after validating the predicate and the id.
    ///
    /// # Errors
    ///
    /// `FidelisError::InvalidExpression` when the predicate's parameters are
    /// out of range or `id` is blank or already taken.
    fn with_conditional_rule(
        &self,
        id: &str,
        condition: Predicate,
        action: RuleAction,
    ) -> FidelisResult<Self>;

    /// Remove the conditional rule with the given id, if present. Follows
    /// the same copy-on-write + version-increment pattern; removing an
    /// unknown id still produces a new version (the edit was requested).
    fn without_conditional_rule(&self, id: &str) -> Self;
}

impl PolicyEdit for Policy {
    fn default_for_user(user_id: impl Into<String>) -> Self {
        let user_id = user_id.into();
        debug!(user_id = %user_id, "creating default policy");

        Policy {
            id: Uuid::new_v4(),
            user_id,
            version: 1,
            updated_at: Utc::now(),
            max_per_transaction: 100_000,
            max_per_day: 250_000,
            max_per_week: 1_000_000,
            allowed_hour_start: 9,
            allowed_hour_end: 18,
            // 0 = Sunday … 6 = Saturday; Mon–Fri.
            allowed_weekdays: BTreeSet::from([1, 2, 3, 4, 5]),
            allow_list: Vec::new(),
            block_list: DEFAULT_BLOCK_LIST.iter().map(|s| s.to_string()).collect(),
            list_match: ListMatch::Substring,
            category_rules: BTreeMap::new(),
            conditional_rules: Vec::new(),
        }
    }

    fn with_category_rule(&self, category: &str, rule: CategoryRule) -> Self {
        let mut next = self.clone();
        next.category_rules.insert(normalize_category(category), rule);
        bump(&mut next);
        next
    }

    fn with_conditional_rule(
        &self,
        id: &str,
        condition: Predicate,
        action: RuleAction,
    ) -> FidelisResult<Self> {
        if id.trim().is_empty() {
            return Err(FidelisError::InvalidExpression {
                reason: "conditional rule id must not be blank".to_string(),
            });
        }
        if self.conditional_rules.iter().any(|r| r.id == id) {
            return Err(FidelisError::InvalidExpression {
                reason: format!("conditional rule id '{}' already exists", id),
            });
        }
        condition.validate()?;

        let mut next = self.clone();
        next.conditional_rules.push(ConditionalRule {
            id: id.to_string(),
            condition,
            action,
        });
        bump(&mut next);
        Ok(next)
    }

    fn without_conditional_rule(&self, id: &str) -> Self {
        let mut next = self.clone();
        next.conditional_rules.retain(|r| r.id != id);
        bump(&mut next);
        next
    }
}

fn bump(policy: &mut Policy) {
    policy.version += 1;
    policy.updated_at = Utc::now();
}
