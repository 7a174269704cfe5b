//! Circuit input encoding.
//!
//! The external circuit consumes a fixed-shape, numeric-only input: strings
//! become 53-bit hashes, the weekday set becomes a bitmask, lists fill a
//! bounded number of slots. `encode` is pure and deterministic — the same
//! intent, policy, and spending context always produce byte-identical
//! request JSON.
//!
//! ## Identifier hashing
//!
//! Identifiers are lowercased, trimmed, SHA-256 hashed, and truncated to the
//! top 53 bits of the digest so values stay inside the IEEE-754 safe-integer
//! range the circuit tooling requires. Folding arbitrary strings into 53
//! bits induces collisions: by the birthday bound, ~10⁴ distinct real-world
//! identifiers collide with probability ≈ 5·10⁻⁹. The manual evaluator is
//! authoritative on all identity and list-membership checks, so a collision
//! can only cause a spurious proof-path rejection (fail-closed), never an
//! approval the manual path would deny.
//!
//! ## Slot limits
//!
//! The circuit embeds at most [`ALLOW_LIST_SLOTS`] allow-list entries,
//! [`CATEGORY_RULE_SLOTS`] category rules, and [`CONDITIONAL_RULE_SLOTS`]
//! conditional rules. Overflow is truncated — a known circuit limitation,
//! reported in [`CircuitTruncation`] and logged by the backend, never
//! silently dropped.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use fidelis_contracts::{
    intent::Intent,
    policy::{Policy, Predicate, RuleAction},
    spending::SpendingContext,
};
use fidelis_core::clock::local_timestamp;

/// Maximum allow-list entries the circuit can embed.
pub const ALLOW_LIST_SLOTS: usize = 10;
/// Maximum category rules the circuit can embed.
pub const CATEGORY_RULE_SLOTS: usize = 5;
/// Maximum conditional rules the circuit can embed.
pub const CONDITIONAL_RULE_SLOTS: usize = 5;

/// Width of the truncated identifier hash.
const HASH_BITS: u32 = 53;

/// Hash an identifier into the circuit's 53-bit integer space.
///
/// Case-insensitive to match the evaluator's list matching: the input is
/// trimmed and lowercased before hashing.
pub fn hash_identifier(s: &str) -> u64 {
    let digest = Sha256::digest(s.trim().to_lowercase().as_bytes());
    let mut prefix = [0u8; 8];
    prefix.copy_from_slice(&digest[..8]);
    u64::from_be_bytes(prefix) >> (64 - HASH_BITS)
}

/// Pack the allowed-weekday set into a bitmask: bit i set iff weekday i
/// (0 = Sunday … 6 = Saturday) is allowed.
pub fn weekday_mask(policy: &Policy) -> u8 {
    policy
        .allowed_weekdays
        .iter()
        .fold(0u8, |mask, day| mask | (1 << day))
}

/// Numeric condition-type codes of the closed predicate grammar, as the
/// circuit understands them.
///
/// String parameters travel as identifier hashes; confidence thresholds are
/// scaled to 0–100 to stay integral.
pub fn condition_code(predicate: &Predicate) -> (u8, u64) {
    match predicate {
        Predicate::AmountAbove { threshold } => (1, *threshold),
        Predicate::AmountBelow { threshold } => (2, *threshold),
        Predicate::ConfidenceBelow { threshold } => (3, scale_confidence(*threshold)),
        Predicate::VendorEquals { vendor } => (4, hash_identifier(vendor)),
        Predicate::CategoryEquals { category } => (5, hash_identifier(category)),
        Predicate::HourAfter { hour } => (6, u64::from(*hour)),
        Predicate::AmountAboveCategoryLimit => (7, 0),
        Predicate::VendorNotInAllowList => (8, 0),
        Predicate::HourOutsideAllowedWindow => (9, 0),
        Predicate::WeekdayIsWeekend => (10, 0),
    }
}

/// Numeric action codes the circuit understands.
pub fn action_code(action: RuleAction) -> u8 {
    match action {
        RuleAction::Approve => 1,
        RuleAction::Reject => 2,
        RuleAction::RequireApproval => 3,
    }
}

/// Confidence in [0, 1] scaled to the circuit's 0–100 integer range.
pub fn scale_confidence(confidence: f64) -> u64 {
    (confidence * 100.0).round() as u64
}

/// The fixed-shape, numeric-only request the prover process consumes.
///
/// Field layout mirrors the circuit's read order. Unused slots are
/// zero-filled; the corresponding count fields bound what the circuit reads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CircuitInput {
    // Intent.
    pub amount: u64,
    pub recipient_hash: u64,
    pub vendor_hash: u64,
    pub category_hash: u64,
    /// Timestamp pre-shifted into the reference zone so the circuit's
    /// `(ts / 3600) % 24` / `(ts / 86400 + 4) % 7` derivation agrees with
    /// the manual evaluator.
    pub timestamp: i64,
    /// Extraction confidence scaled to 0–100.
    pub ai_confidence: u64,

    // Static limits.
    pub max_per_transaction: u64,
    pub max_per_day: u64,
    pub max_per_week: u64,
    pub allowed_hour_start: u8,
    pub allowed_hour_end: u8,
    pub allowed_weekday_mask: u8,

    // Allow list (block-list checks stay on the manual path: the block list
    // is unbounded and block supremacy is already enforced there).
    pub allowed_vendor_count: u8,
    pub allowed_vendor_hashes: [u64; ALLOW_LIST_SLOTS],

    // Category rules.
    pub category_rules_count: u8,
    pub category_hashes: [u64; CATEGORY_RULE_SLOTS],
    pub category_max_amounts: [u64; CATEGORY_RULE_SLOTS],

    // Conditional rules.
    pub conditional_rules_count: u8,
    pub condition_types: [u8; CONDITIONAL_RULE_SLOTS],
    pub condition_values: [u64; CONDITIONAL_RULE_SLOTS],
    pub condition_actions: [u8; CONDITIONAL_RULE_SLOTS],

    // Spending context.
    pub spent_today: u64,
    pub spent_this_week: u64,
}

/// How much of the policy did not fit the circuit's fixed slots.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CircuitTruncation {
    pub allow_list_dropped: usize,
    pub category_rules_dropped: usize,
    pub conditional_rules_dropped: usize,
}

impl CircuitTruncation {
    pub fn any(&self) -> bool {
        self.allow_list_dropped > 0
            || self.category_rules_dropped > 0
            || self.conditional_rules_dropped > 0
    }
}

/// Encode one evaluation into the circuit's input shape.
///
/// Pure and deterministic. Returns the input together with a truncation
/// report; callers surface non-empty truncation to observability.
pub fn encode(
    intent: &Intent,
    policy: &Policy,
    spending: &SpendingContext,
    timezone_offset_minutes: i32,
) -> (CircuitInput, CircuitTruncation) {
    let mut truncation = CircuitTruncation::default();

    let mut allowed_vendor_hashes = [0u64; ALLOW_LIST_SLOTS];
    let embedded_allow = policy.allow_list.len().min(ALLOW_LIST_SLOTS);
    truncation.allow_list_dropped = policy.allow_list.len() - embedded_allow;
    for (slot, entry) in policy.allow_list.iter().take(ALLOW_LIST_SLOTS).enumerate() {
        allowed_vendor_hashes[slot] = hash_identifier(entry);
    }

    let mut category_hashes = [0u64; CATEGORY_RULE_SLOTS];
    let mut category_max_amounts = [0u64; CATEGORY_RULE_SLOTS];
    // Only rules with an amount cap are circuit-relevant; require_approval
    // is a soft stop the manual path owns.
    let capped: Vec<_> = policy
        .category_rules
        .iter()
        .filter_map(|(name, rule)| rule.max_amount.map(|max| (name, max)))
        .collect();
    let embedded_categories = capped.len().min(CATEGORY_RULE_SLOTS);
    truncation.category_rules_dropped = capped.len() - embedded_categories;
    for (slot, (name, max)) in capped.into_iter().take(CATEGORY_RULE_SLOTS).enumerate() {
        category_hashes[slot] = hash_identifier(name);
        category_max_amounts[slot] = max;
    }

    let mut condition_types = [0u8; CONDITIONAL_RULE_SLOTS];
    let mut condition_values = [0u64; CONDITIONAL_RULE_SLOTS];
    let mut condition_actions = [0u8; CONDITIONAL_RULE_SLOTS];
    let embedded_rules = policy.conditional_rules.len().min(CONDITIONAL_RULE_SLOTS);
    truncation.conditional_rules_dropped = policy.conditional_rules.len() - embedded_rules;
    for (slot, rule) in policy
        .conditional_rules
        .iter()
        .take(CONDITIONAL_RULE_SLOTS)
        .enumerate()
    {
        let (code, value) = condition_code(&rule.condition);
        condition_types[slot] = code;
        condition_values[slot] = value;
        condition_actions[slot] = action_code(rule.action);
    }

    let input = CircuitInput {
        amount: intent.amount,
        recipient_hash: hash_identifier(&intent.recipient),
        vendor_hash: hash_identifier(&intent.vendor_or_title),
        category_hash: hash_identifier(&intent.category),
        timestamp: local_timestamp(intent.timestamp, timezone_offset_minutes),
        ai_confidence: scale_confidence(intent.provenance.confidence),
        max_per_transaction: policy.max_per_transaction,
        max_per_day: policy.max_per_day,
        max_per_week: policy.max_per_week,
        allowed_hour_start: policy.allowed_hour_start,
        allowed_hour_end: policy.allowed_hour_end,
        allowed_weekday_mask: weekday_mask(policy),
        allowed_vendor_count: embedded_allow as u8,
        allowed_vendor_hashes,
        category_rules_count: embedded_categories as u8,
        category_hashes,
        category_max_amounts,
        conditional_rules_count: embedded_rules as u8,
        condition_types,
        condition_values,
        condition_actions,
        spent_today: spending.spent_today,
        spent_this_week: spending.spent_this_week,
    };

    (input, truncation)
}

// ── Tests ────────────────────────────────────────────────────────────────────
