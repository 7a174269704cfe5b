//! # fidelis-policy
//!
//! Policy construction and editing for the FIDELIS engine.
//!
//! ## Overview
//!
//! This crate owns the two ways a [`Policy`](fidelis_contracts::policy::Policy)
//! comes into existence:
//!
//! - programmatically, via the [`PolicyEdit`] extension trait — conservative
//!   defaults plus copy-on-write edit operations that increment the version;
//! - from a TOML document, via [`PolicyDoc`] — the user-editable surface.
//!
//! Both paths validate conditional-rule predicates against the closed
//! grammar **before** the policy is returned, so an invalid expression can
//! never reach evaluation.
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use fidelis_policy::{PolicyEdit, load_policy_file};
//! use fidelis_contracts::policy::{Policy, Predicate, RuleAction};
//!
//! let policy = Policy::default_for_user("alice")
//!     .with_conditional_rule(
//!         "large-amount-hold",
//!         Predicate::AmountAbove { threshold: 500_000 },
//!         RuleAction::RequireApproval,
//!     )?;
//! ```

pub mod doc;
pub mod edit;

pub use doc::{load_policy_file, load_policy_str, PolicyDoc};
pub use edit::{PolicyEdit, DEFAULT_BLOCK_LIST};

// ── Tests ─────────────────────────────────────────────────────────────────────
