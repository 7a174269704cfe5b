//! # fidelis-core
//!
//! The deterministic evaluation core of the FIDELIS engine.
//!
//! This crate provides:
//! - [`ManualEvaluator`] — the pure, in-process reference evaluator and the
//!   ground truth for correctness
//! - the [`traits::ProofBackend`] seam an external prover plugs into
//! - [`Orchestrator`] — the single evaluation entry point composing both
//!   paths with fail-closed semantics
//! - [`EngineConfig`] — the one configuration struct, built at process
//!   start and passed in; no ambient state
//!
//! ## Usage
//!
//! ```rust,ignore
//! use fidelis_core::{EngineConfig, Orchestrator};
//!
//! let orchestrator = Orchestrator::new(EngineConfig::default(), None);
//! let decision = orchestrator.evaluate(&intent, &policy, &spending);
//! if decision.executable() {
//!     // hand off to the payment broadcaster / calendar writer
//! }
//! ```

pub mod clock;
pub mod config;
pub mod evaluator;
pub mod orchestrator;
pub mod traits;

pub use config::EngineConfig;
pub use evaluator::ManualEvaluator;
pub use orchestrator::Orchestrator;
