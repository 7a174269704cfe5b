//! TOML policy documents.
//!
//! `PolicyDoc` is the user-editable, on-disk shape of a policy. Conversion
//! into a runtime [`Policy`] happens at load time and validates everything:
//! malformed TOML is a `Config` error, an unrecognized predicate name or
//! out-of-range parameter is an `InvalidExpression` error, and structural
//! problems (hour windows, weekday ranges, blank list entries) surface as
//! `Validation` errors. A document that loads cleanly can always be
//! evaluated.
//!
//! Example document:
//!
//! ```toml
//! user_id = "alice"
//! version = 3
//!
//! [limits]
//! max_per_transaction = 100000
//! max_per_day = 250000
//! max_per_week = 1000000
//! allowed_hour_start = 9
//! allowed_hour_end = 18
//! allowed_weekdays = [1, 2, 3, 4, 5]
//!
//! [lists]
//! allow = ["Acme Corp"]
//! block = ["gift card"]
//! match = "substring"
//!
//! [[category_rules]]
//! category = "software"
//! max_amount = 200000
//! require_approval = true
//!
//! [[conditional_rules]]
//! id = "large-amount-hold"
//! action = "require-approval"
//! condition = { kind = "amount-above", threshold = 500000 }
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use fidelis_contracts::{
    error::{FidelisError, FidelisResult},
    intent::normalize_category,
    policy::{CategoryRule, ConditionalRule, ListMatch, Policy, Predicate, RuleAction},
};

/// Static limit table of a policy document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitsDoc {
    pub max_per_transaction: u64,
    pub max_per_day: u64,
    pub max_per_week: u64,
    pub allowed_hour_start: u8,
    pub allowed_hour_end: u8,
    /// Weekdays 0 = Sunday … 6 = Saturday.
    pub allowed_weekdays: Vec<u8>,
}

/// Allow/block list table. Omitted sections mean empty lists with
/// substring matching.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListsDoc {
    #[serde(default)]
    pub allow: Vec<String>,
    #[serde(default)]
    pub block: Vec<String>,
    #[serde(rename = "match", default = "default_match")]
    pub match_mode: ListMatch,
}

impl Default for ListsDoc {
    fn default() -> Self {
        Self {
            allow: Vec::new(),
            block: Vec::new(),
            match_mode: ListMatch::Substring,
        }
    }
}

fn default_match() -> ListMatch {
    ListMatch::Substring
}

/// One `[[category_rules]]` entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryRuleDoc {
    pub category: String,
    #[serde(default)]
    pub max_amount: Option<u64>,
    #[serde(default)]
    pub require_approval: bool,
}

/// One `[[conditional_rules]]` entry. The `condition` table names a
/// predicate from the closed grammar by kebab-case `kind`; unknown kinds
/// fail deserialization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConditionalRuleDoc {
    pub id: String,
    pub condition: Predicate,
    pub action: RuleAction,
}

/// The top-level structure deserialized from a TOML policy file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyDoc {
    pub user_id: String,
    #[serde(default = "default_version")]
    pub version: u32,
    pub limits: LimitsDoc,
    #[serde(default)]
    pub lists: ListsDoc,
    #[serde(default)]
    pub category_rules: Vec<CategoryRuleDoc>,
    #[serde(default)]
    pub conditional_rules: Vec<ConditionalRuleDoc>,
}

fn default_version() -> u32 {
    1
}

impl PolicyDoc {
    /// Parse `s` as a TOML policy document.
    ///
    /// Returns `FidelisError::Config` when the TOML is malformed or does not
    /// match the document schema — which includes naming a predicate outside
    /// the closed grammar, since `Predicate` refuses unknown kinds.
    pub fn from_toml_str(s: &str) -> FidelisResult<Self> {
        toml::from_str(s).map_err(|e| FidelisError::Config {
            reason: format!("failed to parse policy TOML: {}", e),
        })
    }

    /// Read the file at `path` and parse it as a TOML policy document.
    pub fn from_file(path: &Path) -> FidelisResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| FidelisError::Config {
            reason: format!("failed to read policy file '{}': {}", path.display(), e),
        })?;
        Self::from_toml_str(&contents)
    }

    /// Convert the document into a validated runtime [`Policy`].
    ///
    /// Assigns a fresh policy id and stamps `updated_at`; category names are
    /// normalized. Predicate parameter ranges and structural invariants are
    /// checked before the policy is returned.
    pub fn into_policy(self) -> FidelisResult<Policy> {
        let mut category_rules = BTreeMap::new();
        for doc in self.category_rules {
            category_rules.insert(
                normalize_category(&doc.category),
                CategoryRule {
                    max_amount: doc.max_amount,
                    require_approval: doc.require_approval,
                },
            );
        }

        let conditional_rules = self
            .conditional_rules
            .into_iter()
            .map(|doc| ConditionalRule {
                id: doc.id,
                condition: doc.condition,
                action: doc.action,
            })
            .collect();

        let policy = Policy {
            id: Uuid::new_v4(),
            user_id: self.user_id,
            version: self.version,
            updated_at: Utc::now(),
            max_per_transaction: self.limits.max_per_transaction,
            max_per_day: self.limits.max_per_day,
            max_per_week: self.limits.max_per_week,
            allowed_hour_start: self.limits.allowed_hour_start,
            allowed_hour_end: self.limits.allowed_hour_end,
            allowed_weekdays: BTreeSet::from_iter(self.limits.allowed_weekdays),
            allow_list: self.lists.allow,
            block_list: self.lists.block,
            list_match: self.lists.match_mode,
            category_rules,
            conditional_rules,
        };

        policy.validate()?;

        debug!(
            user_id = %policy.user_id,
            version = policy.version,
            conditional_rules = policy.conditional_rules.len(),
            "policy document loaded"
        );

        Ok(policy)
    }
}

/// Convenience: parse and convert in one step.
pub fn load_policy_str(s: &str) -> FidelisResult<Policy> {
    PolicyDoc::from_toml_str(s)?.into_policy()
}

/// Convenience: read, parse, and convert in one step.
pub fn load_policy_file(path: &Path) -> FidelisResult<Policy> {
    PolicyDoc::from_file(path)?.into_policy()
}
