//! The manual evaluator: the deterministic, in-process reference path.
//!
//! `ManualEvaluator::evaluate` is a pure function of its inputs — no I/O,
//! no randomness, no clock reads (the decision timestamp is passed in by
//! the orchestrator). Identical inputs produce bit-identical decisions
//! across runs, which is what makes cross-checking against the proof
//! circuit possible.
//!
//! Checks run in a fixed order because violations accumulate and ordering
//! shows in the `violations` list; the approve/reject outcome itself is
//! order-independent — approval requires **zero** violations and no
//! approval hold:
//!
//!   Amounts → Lists → Time window → Category rule → Conditional rules
//!
//! Risk weights: per-transaction 30, daily 25, weekly 20, block-list 50,
//! allow-list miss 25, hour window 15, weekday 10, category cap 20,
//! conditional reject 30. Additions saturate and the total caps at 100.

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use fidelis_contracts::{
    decision::{Decision, ProofTag, Violation, ViolationKind},
    intent::Intent,
    policy::{Policy, Predicate, RuleAction},
    spending::SpendingContext,
};

use crate::{
    clock::{hour_of_day, weekday},
    config::EngineConfig,
};

/// The deterministic rule-checker. Holds only the reference-timezone offset;
/// everything else arrives per call.
#[derive(Debug, Clone)]
pub struct ManualEvaluator {
    timezone_offset_minutes: i32,
}

impl ManualEvaluator {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            timezone_offset_minutes: config.timezone_offset_minutes,
        }
    }

    /// Evaluate one intent against one policy version.
    ///
    /// `evaluated_at` is stamped into the decision but never consulted —
    /// time checks derive from `intent.timestamp`, the proposed execution
    /// time, not from the wall clock.
    pub fn evaluate(
        &self,
        intent: &Intent,
        policy: &Policy,
        spending: &SpendingContext,
        evaluated_at: DateTime<Utc>,
    ) -> Decision {
        debug!(
            amount = intent.amount,
            vendor = %intent.vendor_or_title,
            category = %intent.category,
            policy_version = policy.version,
            "manual evaluation starting"
        );

        let mut violations: Vec<Violation> = Vec::new();
        let mut matched_rules: Vec<String> = Vec::new();
        let mut risk_score: u8 = 0;
        let mut requires_manual_approval = false;

        // ── 1. Amount checks ─────────────────────────────────────────────────
        //
        // Boundaries are inclusive on the pass side: amount == limit passes,
        // only strictly-greater violates.
        if intent.amount > policy.max_per_transaction {
            record(
                &mut violations,
                &mut matched_rules,
                &mut risk_score,
                "max-per-transaction",
                ViolationKind::AmountExceedsTransactionLimit,
                30,
                format!(
                    "amount {} exceeds per-transaction limit {}",
                    intent.amount, policy.max_per_transaction
                ),
            );
        }
        if spending.spent_today.saturating_add(intent.amount) > policy.max_per_day {
            record(
                &mut violations,
                &mut matched_rules,
                &mut risk_score,
                "max-per-day",
                ViolationKind::DailyLimitExceeded,
                25,
                format!(
                    "amount {} on top of {} spent today exceeds daily limit {}",
                    intent.amount, spending.spent_today, policy.max_per_day
                ),
            );
        }
        if spending.spent_this_week.saturating_add(intent.amount) > policy.max_per_week {
            record(
                &mut violations,
                &mut matched_rules,
                &mut risk_score,
                "max-per-week",
                ViolationKind::WeeklyLimitExceeded,
                20,
                format!(
                    "amount {} on top of {} spent this week exceeds weekly limit {}",
                    intent.amount, spending.spent_this_week, policy.max_per_week
                ),
            );
        }

        // ── 2. List checks ───────────────────────────────────────────────────
        //
        // Block always wins: a blocked counterparty is rejected even if it
        // also appears on the allow list.
        if policy.blocks(&intent.recipient, &intent.vendor_or_title) {
            record(
                &mut violations,
                &mut matched_rules,
                &mut risk_score,
                "block-list",
                ViolationKind::BlockedCounterparty,
                50,
                format!(
                    "recipient '{}' or vendor '{}' matches the block list",
                    intent.recipient, intent.vendor_or_title
                ),
            );
        } else if !policy.allow_list.is_empty()
            && !policy.allows(&intent.recipient, &intent.vendor_or_title)
        {
            record(
                &mut violations,
                &mut matched_rules,
                &mut risk_score,
                "allow-list",
                ViolationKind::NotOnAllowList,
                25,
                format!(
                    "recipient '{}' and vendor '{}' are not on the allow list",
                    intent.recipient, intent.vendor_or_title
                ),
            );
        }

        // ── 3. Time checks ───────────────────────────────────────────────────
        let hour = hour_of_day(intent.timestamp, self.timezone_offset_minutes);
        let day = weekday(intent.timestamp, self.timezone_offset_minutes);

        if hour < policy.allowed_hour_start || hour >= policy.allowed_hour_end {
            record(
                &mut violations,
                &mut matched_rules,
                &mut risk_score,
                "allowed-hours",
                ViolationKind::OutsideAllowedHours,
                15,
                format!(
                    "hour {} outside allowed window [{}, {})",
                    hour, policy.allowed_hour_start, policy.allowed_hour_end
                ),
            );
        }
        if !policy.allowed_weekdays.contains(&day) {
            record(
                &mut violations,
                &mut matched_rules,
                &mut risk_score,
                "allowed-weekdays",
                ViolationKind::DisallowedWeekday,
                10,
                format!("weekday {} (0 = Sunday) is not an allowed day", day),
            );
        }

        // ── 4. Category rule ─────────────────────────────────────────────────
        if let Some(rule) = policy.category_rules.get(&intent.category) {
            if let Some(max_amount) = rule.max_amount {
                if intent.amount > max_amount {
                    record(
                        &mut violations,
                        &mut matched_rules,
                        &mut risk_score,
                        &format!("category:{}", intent.category),
                        ViolationKind::CategoryLimitExceeded,
                        20,
                        format!(
                            "amount {} exceeds '{}' category limit {}",
                            intent.amount, intent.category, max_amount
                        ),
                    );
                }
            }
            if rule.require_approval {
                // A soft stop, not a violation.
                matched_rules.push(format!("category:{}:require-approval", intent.category));
                requires_manual_approval = true;
            }
        }

        // ── 5. Conditional rules ─────────────────────────────────────────────
        //
        // Policy-defined order. An Approve match is recorded for audit but
        // has no effect on violations — reject always wins over approve.
        for rule in &policy.conditional_rules {
            if !predicate_matches(&rule.condition, intent, policy, hour, day) {
                continue;
            }
            match rule.action {
                RuleAction::Reject => {
                    record(
                        &mut violations,
                        &mut matched_rules,
                        &mut risk_score,
                        &rule.id,
                        ViolationKind::ConditionalRuleRejected,
                        30,
                        format!(
                            "conditional rule '{}' ({}) rejected the intent",
                            rule.id,
                            rule.condition.name()
                        ),
                    );
                }
                RuleAction::RequireApproval => {
                    matched_rules.push(rule.id.clone());
                    requires_manual_approval = true;
                }
                RuleAction::Approve => {
                    matched_rules.push(rule.id.clone());
                }
            }
        }

        // ── 6. Compose ───────────────────────────────────────────────────────
        let risk_score = risk_score.min(100);
        let approved = violations.is_empty() && !requires_manual_approval;

        if !approved {
            warn!(
                violations = violations.len(),
                risk_score,
                requires_manual_approval,
                policy_version = policy.version,
                "intent not approved by manual evaluation"
            );
        }

        Decision {
            approved,
            requires_manual_approval,
            risk_score,
            violations,
            matched_rules,
            proof: ProofTag::None,
            policy_version: policy.version,
            evaluated_at,
        }
    }
}

/// Record one fired rule: the identifier, the violation, and its risk weight.
fn record(
    violations: &mut Vec<Violation>,
    matched_rules: &mut Vec<String>,
    risk_score: &mut u8,
    rule: &str,
    kind: ViolationKind,
    weight: u8,
    message: String,
) {
    matched_rules.push(rule.to_string());
    violations.push(Violation::new(kind, message));
    *risk_score = risk_score.saturating_add(weight);
}

/// Evaluate one predicate against the fixed context
/// {amount, vendor, category, hour, weekday, confidence, allow list,
/// per-transaction cap}.
fn predicate_matches(
    predicate: &Predicate,
    intent: &Intent,
    policy: &Policy,
    hour: u8,
    day: u8,
) -> bool {
    match predicate {
        Predicate::AmountAbove { threshold } => intent.amount > *threshold,
        Predicate::AmountBelow { threshold } => intent.amount < *threshold,
        Predicate::ConfidenceBelow { threshold } => intent.provenance.confidence < *threshold,
        Predicate::VendorEquals { vendor } => intent.vendor_or_title.eq_ignore_ascii_case(vendor),
        Predicate::CategoryEquals { category } => intent.category.eq_ignore_ascii_case(category),
        Predicate::HourAfter { hour: h } => hour > *h,
        Predicate::AmountAboveCategoryLimit => policy
            .category_rules
            .get(&intent.category)
            .and_then(|r| r.max_amount)
            .map(|max| intent.amount > max)
            .unwrap_or(false),
        // False on an empty allow list, consistent with the step-2 check.
        Predicate::VendorNotInAllowList => {
            !policy.allow_list.is_empty()
                && !policy.allows(&intent.recipient, &intent.vendor_or_title)
        }
        Predicate::HourOutsideAllowedWindow => {
            hour < policy.allowed_hour_start || hour >= policy.allowed_hour_end
        }
        Predicate::WeekdayIsWeekend => day == 0 || day == 6,
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use fidelis_contracts::{
        decision::ViolationKind,
        intent::Intent,
        policy::{CategoryRule, ListMatch, Policy, Predicate, RuleAction},
        spending::SpendingContext,
    };
    use fidelis_policy::PolicyEdit;

    use crate::config::EngineConfig;

    use super::ManualEvaluator;

    // 2024-01-02 (Tuesday) 10:00:00 UTC.
    const TUESDAY_10H: i64 = 1_704_189_600;
    // 2024-01-06 (Saturday) 22:00:00 UTC.
    const SATURDAY_22H: i64 = 1_704_578_400;

    fn evaluator() -> ManualEvaluator {
        ManualEvaluator::new(&EngineConfig::default())
    }

    /// Policy matching the reference scenarios: cap 100000, hours [9,18),
    /// Mon–Fri, allow list ["Acme"].
    fn scenario_policy() -> Policy {
        let mut policy = Policy::default_for_user("alice");
        policy.allow_list = vec!["Acme".to_string()];
        policy.block_list.clear();
        policy
    }

    fn acme_payment(amount: u64, timestamp: i64) -> Intent {
        Intent::payment(
            amount,
            "acct-acme-001",
            "Acme",
            None,
            timestamp,
            0.95,
            "Invoice from Acme",
        )
        .unwrap()
    }

    // ── Determinism ───────────────────────────────────────────────────────────

    /// Two invocations with identical inputs produce identical decisions.
    #[test]
    fn test_determinism() {
        let policy = scenario_policy();
        let intent = acme_payment(50_000, TUESDAY_10H);
        let spending = SpendingContext::new(10_000, 40_000);
        let at = Utc::now();

        let a = evaluator().evaluate(&intent, &policy, &spending, at);
        let b = evaluator().evaluate(&intent, &policy, &spending, at);

        assert_eq!(a, b, "manual evaluation must be deterministic");
    }

    // ── Reference scenarios ───────────────────────────────────────────────────

    /// Tuesday 10:00, amount under every limit, vendor on the allow list.
    #[test]
    fn test_approved_payment() {
        let decision = evaluator().evaluate(
            &acme_payment(50_000, TUESDAY_10H),
            &scenario_policy(),
            &SpendingContext::default(),
            Utc::now(),
        );

        assert!(decision.approved, "violations: {:?}", decision.violations);
        assert!(decision.violations.is_empty());
        assert!(!decision.requires_manual_approval);
        assert_eq!(decision.risk_score, 0);
        assert!(decision.executable());
    }

    /// Same scenario with amount 150000: one violation, risk exactly 30.
    #[test]
    fn test_amount_over_cap() {
        let decision = evaluator().evaluate(
            &acme_payment(150_000, TUESDAY_10H),
            &scenario_policy(),
            &SpendingContext::default(),
            Utc::now(),
        );

        assert!(!decision.approved);
        assert_eq!(decision.risk_score, 30);
        assert_eq!(decision.violations.len(), 1);
        assert_eq!(
            decision.violations[0].kind,
            ViolationKind::AmountExceedsTransactionLimit
        );
        assert!(decision.matched_rules.contains(&"max-per-transaction".to_string()));
    }

    /// Saturday 22:00: hour-window and weekday violations, risk 15 + 10 = 25.
    #[test]
    fn test_outside_business_hours() {
        let decision = evaluator().evaluate(
            &acme_payment(50_000, SATURDAY_22H),
            &scenario_policy(),
            &SpendingContext::default(),
            Utc::now(),
        );

        assert!(!decision.approved);
        assert_eq!(decision.risk_score, 25);
        let kinds: Vec<_> = decision.violations.iter().map(|v| v.kind).collect();
        assert!(kinds.contains(&ViolationKind::OutsideAllowedHours));
        assert!(kinds.contains(&ViolationKind::DisallowedWeekday));
    }

    /// A category rule with require_approval holds the intent without adding
    /// a violation: a soft stop, distinct from rejection.
    #[test]
    fn test_category_requires_approval() {
        let policy = scenario_policy().with_category_rule(
            "software",
            CategoryRule {
                max_amount: Some(200_000),
                require_approval: true,
            },
        );
        let intent = Intent::payment(
            50_000,
            "acct-acme-001",
            "Acme",
            Some("software"),
            TUESDAY_10H,
            0.95,
            "Invoice",
        )
        .unwrap();

        let decision =
            evaluator().evaluate(&intent, &policy, &SpendingContext::default(), Utc::now());

        assert!(decision.violations.is_empty(), "under the category cap");
        assert!(decision.requires_manual_approval);
        assert!(!decision.approved, "an approval hold blocks approval");
        assert!(!decision.executable());
    }

    // ── Amount boundaries ─────────────────────────────────────────────────────

    /// amount == limit is allowed; limit + 1 violates.
    #[test]
    fn test_amount_boundary_inclusive_on_pass_side() {
        let policy = scenario_policy();

        let at_limit = evaluator().evaluate(
            &acme_payment(policy.max_per_transaction, TUESDAY_10H),
            &policy,
            &SpendingContext::default(),
            Utc::now(),
        );
        assert!(at_limit.approved, "amount == limit must pass");

        let over_limit = evaluator().evaluate(
            &acme_payment(policy.max_per_transaction + 1, TUESDAY_10H),
            &policy,
            &SpendingContext::default(),
            Utc::now(),
        );
        assert!(!over_limit.approved, "amount == limit + 1 must violate");
    }

    #[test]
    fn test_daily_and_weekly_limits_include_prior_spend() {
        let policy = scenario_policy();
        // 50000 alone is fine; on top of 220000 spent today it breaches the
        // 250000 daily limit, and on top of 980000 this week the weekly one.
        let decision = evaluator().evaluate(
            &acme_payment(50_000, TUESDAY_10H),
            &policy,
            &SpendingContext::new(220_000, 980_000),
            Utc::now(),
        );

        assert!(!decision.approved);
        assert_eq!(decision.risk_score, 25 + 20);
        let kinds: Vec<_> = decision.violations.iter().map(|v| v.kind).collect();
        assert_eq!(
            kinds,
            vec![
                ViolationKind::DailyLimitExceeded,
                ViolationKind::WeeklyLimitExceeded
            ]
        );
    }

    // ── List checks ───────────────────────────────────────────────────────────

    /// Block-list supremacy: a vendor on both lists is always rejected.
    #[test]
    fn test_block_list_beats_allow_list() {
        let mut policy = scenario_policy();
        policy.allow_list = vec!["Acme".to_string()];
        policy.block_list = vec!["Acme".to_string()];

        let decision = evaluator().evaluate(
            &acme_payment(50_000, TUESDAY_10H),
            &policy,
            &SpendingContext::default(),
            Utc::now(),
        );

        assert!(!decision.approved);
        assert_eq!(decision.violations.len(), 1);
        assert_eq!(decision.violations[0].kind, ViolationKind::BlockedCounterparty);
        assert_eq!(decision.risk_score, 50);
    }

    #[test]
    fn test_vendor_off_nonempty_allow_list_violates() {
        let policy = scenario_policy(); // allow list = ["Acme"]
        let intent = Intent::payment(
            50_000,
            "acct-unknown",
            "Globex",
            None,
            TUESDAY_10H,
            0.95,
            "Invoice",
        )
        .unwrap();

        let decision =
            evaluator().evaluate(&intent, &policy, &SpendingContext::default(), Utc::now());

        assert!(!decision.approved);
        assert_eq!(decision.violations[0].kind, ViolationKind::NotOnAllowList);
        assert_eq!(decision.risk_score, 25);
    }

    /// Substring matching: block entry "gift card" hits a longer vendor name,
    /// case-insensitively.
    #[test]
    fn test_substring_block_match() {
        let policy = Policy::default_for_user("alice"); // default block list
        let intent = Intent::payment(
            10_000,
            "acct-x",
            "Speedy GIFT CARD Outlet",
            None,
            TUESDAY_10H,
            0.95,
            "Invoice",
        )
        .unwrap();

        let decision =
            evaluator().evaluate(&intent, &policy, &SpendingContext::default(), Utc::now());

        assert!(decision
            .violations
            .iter()
            .any(|v| v.kind == ViolationKind::BlockedCounterparty));
    }

    #[test]
    fn test_exact_match_mode_requires_whole_string() {
        let mut policy = scenario_policy();
        policy.list_match = ListMatch::Exact;
        policy.allow_list = vec!["Acme Corp".to_string()];

        let partial = Intent::payment(
            50_000, "acct-1", "Acme", None, TUESDAY_10H, 0.95, "Invoice",
        )
        .unwrap();
        let decision =
            evaluator().evaluate(&partial, &policy, &SpendingContext::default(), Utc::now());
        assert!(
            decision
                .violations
                .iter()
                .any(|v| v.kind == ViolationKind::NotOnAllowList),
            "'Acme' must not exact-match 'Acme Corp'"
        );

        let exact = Intent::payment(
            50_000, "acct-1", "acme corp", None, TUESDAY_10H, 0.95, "Invoice",
        )
        .unwrap();
        let decision =
            evaluator().evaluate(&exact, &policy, &SpendingContext::default(), Utc::now());
        assert!(decision.approved, "case-insensitive exact match must pass");
    }

    // ── Conditional rules ─────────────────────────────────────────────────────

    #[test]
    fn test_conditional_reject_adds_violation() {
        let policy = scenario_policy()
            .with_conditional_rule(
                "low-confidence",
                Predicate::ConfidenceBelow { threshold: 0.8 },
                RuleAction::Reject,
            )
            .unwrap();
        let intent = Intent::payment(
            50_000, "acct-acme-001", "Acme", None, TUESDAY_10H, 0.5, "Invoice",
        )
        .unwrap();

        let decision =
            evaluator().evaluate(&intent, &policy, &SpendingContext::default(), Utc::now());

        assert!(!decision.approved);
        assert_eq!(decision.risk_score, 30);
        assert_eq!(
            decision.violations[0].kind,
            ViolationKind::ConditionalRuleRejected
        );
        assert!(decision.matched_rules.contains(&"low-confidence".to_string()));
    }

    #[test]
    fn test_conditional_require_approval_is_soft_stop() {
        let policy = scenario_policy()
            .with_conditional_rule(
                "large-amount-hold",
                Predicate::AmountAbove { threshold: 40_000 },
                RuleAction::RequireApproval,
            )
            .unwrap();

        let decision = evaluator().evaluate(
            &acme_payment(50_000, TUESDAY_10H),
            &policy,
            &SpendingContext::default(),
            Utc::now(),
        );

        assert!(decision.violations.is_empty());
        assert!(decision.requires_manual_approval);
        assert!(!decision.approved);
    }

    /// An Approve rule documents a carve-out: it is recorded in
    /// matched_rules but cannot override a violation.
    #[test]
    fn test_approve_rule_cannot_override_violation() {
        let policy = scenario_policy()
            .with_conditional_rule(
                "bless-acme",
                Predicate::VendorEquals {
                    vendor: "Acme".to_string(),
                },
                RuleAction::Approve,
            )
            .unwrap();

        let decision = evaluator().evaluate(
            &acme_payment(150_000, TUESDAY_10H),
            &policy,
            &SpendingContext::default(),
            Utc::now(),
        );

        assert!(!decision.approved, "reject always wins over approve");
        assert!(decision.matched_rules.contains(&"bless-acme".to_string()));
        assert_eq!(decision.violations.len(), 1);
    }

    #[test]
    fn test_weekend_predicate() {
        let policy = scenario_policy()
            .with_conditional_rule("no-weekends", Predicate::WeekdayIsWeekend, RuleAction::Reject)
            .unwrap();

        let decision = evaluator().evaluate(
            &acme_payment(50_000, SATURDAY_22H),
            &policy,
            &SpendingContext::default(),
            Utc::now(),
        );

        // Saturday 22:00 also trips the hour and weekday checks.
        assert!(decision
            .violations
            .iter()
            .any(|v| v.kind == ViolationKind::ConditionalRuleRejected));
    }

    // ── Monotonicity and capping ──────────────────────────────────────────────

    /// Adding one more violating condition never lowers the risk score and
    /// never flips a rejection into an approval.
    #[test]
    fn test_risk_monotonic_under_additional_violation() {
        let passing_policy = scenario_policy();
        let baseline = evaluator().evaluate(
            &acme_payment(150_000, TUESDAY_10H),
            &passing_policy,
            &SpendingContext::default(),
            Utc::now(),
        );

        // Same intent, plus a conditional rejection on top.
        let stricter = passing_policy
            .with_conditional_rule(
                "cap-hold",
                Predicate::AmountAbove { threshold: 100_000 },
                RuleAction::Reject,
            )
            .unwrap();
        let with_extra = evaluator().evaluate(
            &acme_payment(150_000, TUESDAY_10H),
            &stricter,
            &SpendingContext::default(),
            Utc::now(),
        );

        assert!(with_extra.risk_score >= baseline.risk_score);
        assert!(!with_extra.approved);
        assert!(with_extra.violations.len() > baseline.violations.len());
    }

    /// Risk saturates at 100 no matter how many checks fire.
    #[test]
    fn test_risk_score_caps_at_100() {
        let mut policy = Policy::default_for_user("alice");
        policy.allow_list = vec!["Nobody".to_string()];
        policy.block_list = vec!["Evil".to_string()];
        let policy = policy
            .with_conditional_rule(
                "pile-on-1",
                Predicate::AmountAbove { threshold: 0 },
                RuleAction::Reject,
            )
            .unwrap()
            .with_conditional_rule("pile-on-2", Predicate::WeekdayIsWeekend, RuleAction::Reject)
            .unwrap();

        let intent = Intent::payment(
            5_000_000,
            "acct-evil",
            "Evil Holdings",
            None,
            SATURDAY_22H,
            0.95,
            "Invoice",
        )
        .unwrap();

        let decision = evaluator().evaluate(
            &intent,
            &policy,
            &SpendingContext::new(u64::MAX - 1, u64::MAX - 1),
            Utc::now(),
        );

        assert_eq!(decision.risk_score, 100);
        assert!(!decision.approved);
    }

    // ── Schedule intents ──────────────────────────────────────────────────────

    /// Schedule intents carry amount 0: spend checks trivially pass while
    /// the time window still applies.
    #[test]
    fn test_schedule_intent_gated_by_time_window_only() {
        let mut policy = Policy::default_for_user("alice");
        policy.block_list.clear();

        let in_hours = Intent::schedule(
            "Vendor sync",
            "Room 4",
            TUESDAY_10H,
            0.9,
            "Calendar invite",
        )
        .unwrap();
        let decision =
            evaluator().evaluate(&in_hours, &policy, &SpendingContext::default(), Utc::now());
        assert!(decision.approved, "violations: {:?}", decision.violations);

        let after_hours =
            Intent::schedule("Late sync", "Room 4", SATURDAY_22H, 0.9, "Calendar invite").unwrap();
        let decision = evaluator().evaluate(
            &after_hours,
            &policy,
            &SpendingContext::default(),
            Utc::now(),
        );
        assert!(!decision.approved);
    }
}
