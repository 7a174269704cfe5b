//! # fidelis-prover
//!
//! The proof-backend adapter: bridges an (intent, policy, spending) triple
//! to an external proof-generating process and back.
//!
//! ## Overview
//!
//! - [`encode`](encode::encode) maps the evaluation into the circuit's
//!   fixed-shape numeric input — 53-bit identifier hashes, a weekday
//!   bitmask, bounded rule slots with an explicit truncation report.
//! - [`invoke`](process::invoke) runs the prover binary under a hard
//!   deadline, validates its stdout against a JSON Schema, and maps every
//!   failure mode to a diagnostic cause.
//! - [`ExternalProver`] implements
//!   [`fidelis_core::traits::ProofBackend`], verifying the returned public
//!   signals before an artifact is ever trusted.
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use fidelis_core::{EngineConfig, Orchestrator};
//! use fidelis_prover::{ExternalProver, ProverConfig};
//!
//! let config = EngineConfig { proof_enabled: true, ..EngineConfig::default() };
//! let prover = ExternalProver::new(
//!     ProverConfig::new("/usr/local/bin/fidelis-circuit"),
//!     config.timezone_offset_minutes,
//! );
//! let orchestrator = Orchestrator::new(config, Some(Box::new(prover)));
//! ```

pub mod backend;
pub mod encode;
pub mod process;

pub use backend::ExternalProver;
pub use process::{ProverConfig, ProverResponse};
