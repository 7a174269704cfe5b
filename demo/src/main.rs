//! FIDELIS — Policy Evaluation Demo CLI
//!
//! Runs one or all of the reference scenarios end to end: an AI-extraction
//! fixture is converted into an intent, evaluated against the embedded demo
//! policy, and the composed decision is printed.
//!
//! Usage:
//!   cargo run -p demo -- run-all
//!   cargo run -p demo -- approved-payment
//!   cargo run -p demo -- degraded-proof
//!
//! Set RUST_LOG=debug for the engine's structured logs.

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use fidelis_contracts::{
    decision::{Decision, ProofTag},
    extraction::{ExtractedEmail, ExtractionType},
    intent::Intent,
    policy::Policy,
    spending::SpendingContext,
};
use fidelis_core::{EngineConfig, Orchestrator};
use fidelis_policy::load_policy_str;
use fidelis_prover::{ExternalProver, ProverConfig};

// ── Fixtures ──────────────────────────────────────────────────────────────────

/// Embedded demo policy (see demo/policies/default.toml).
const DEMO_POLICY: &str = include_str!("../policies/default.toml");

// 2024-01-02 (Tuesday) 10:00:00 UTC.
const TUESDAY_10H: i64 = 1_704_189_600;
// 2024-01-06 (Saturday) 22:00:00 UTC.
const SATURDAY_22H: i64 = 1_704_578_400;

// ── CLI definition ────────────────────────────────────────────────────────────

/// FIDELIS — policy compliance gating for email-derived payment intents.
#[derive(Parser)]
#[command(
    name = "demo",
    about = "FIDELIS policy evaluation demo",
    long_about = "Runs FIDELIS reference scenarios showing deterministic policy\n\
                  evaluation, approval holds, list supremacy, and graceful proof\n\
                  degradation."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run every scenario in sequence.
    RunAll,
    /// A compliant invoice: allowed vendor, business hours, under all caps.
    ApprovedPayment,
    /// The same invoice with the amount over the per-transaction cap.
    OverCap,
    /// A compliant invoice proposed for Saturday night.
    OffHours,
    /// A software purchase under its cap but held by the category rule.
    CategoryHold,
    /// A vendor matching the block list (and substring matching at work).
    BlockedVendor,
    /// A low-confidence extraction rejected by a conditional rule.
    LowConfidence,
    /// Proof generation enabled but the prover binary is missing: the
    /// decision degrades to manual, explicitly tagged.
    DegradedProof,
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_target(false)
        .compact()
        .init();

    let cli = Cli::parse();

    println!("FIDELIS — policy evaluation & proof engine demo");
    println!("================================================\n");

    let policy = match load_policy_str(DEMO_POLICY) {
        Ok(policy) => policy,
        Err(e) => {
            eprintln!("demo policy failed to load: {}", e);
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Command::RunAll => run_all(&policy),
        Command::ApprovedPayment => run_approved_payment(&policy),
        Command::OverCap => run_over_cap(&policy),
        Command::OffHours => run_off_hours(&policy),
        Command::CategoryHold => run_category_hold(&policy),
        Command::BlockedVendor => run_blocked_vendor(&policy),
        Command::LowConfidence => run_low_confidence(&policy),
        Command::DegradedProof => run_degraded_proof(&policy),
    };

    if let Err(e) = result {
        eprintln!("Demo error: {}", e);
        std::process::exit(1);
    }
}

fn run_all(policy: &Policy) -> Result<(), String> {
    run_approved_payment(policy)?;
    run_over_cap(policy)?;
    run_off_hours(policy)?;
    run_category_hold(policy)?;
    run_blocked_vendor(policy)?;
    run_low_confidence(policy)?;
    run_degraded_proof(policy)?;
    Ok(())
}

// ── Scenarios ─────────────────────────────────────────────────────────────────

/// Build an invoice extraction fixture as the AI collaborator would hand
/// it over.
fn invoice(
    amount: i64,
    vendor: &str,
    recipient: &str,
    due_date: i64,
    confidence: f64,
) -> ExtractedEmail {
    ExtractedEmail {
        extraction_type: ExtractionType::Invoice,
        confidence,
        amount: Some(amount),
        vendor: Some(vendor.to_string()),
        recipient: Some(recipient.to_string()),
        category: None,
        due_date: Some(due_date),
        title: None,
        start_time: None,
        end_time: None,
        location: None,
        source_text: format!("Invoice from {} for {}", vendor, amount),
    }
}

fn manual_orchestrator() -> Orchestrator {
    Orchestrator::new(EngineConfig::default(), None)
}

fn evaluate_and_report(
    title: &str,
    orchestrator: &Orchestrator,
    email: &ExtractedEmail,
    policy: &Policy,
    spending: &SpendingContext,
) -> Result<(), String> {
    let intent = Intent::from_extraction(email)
        .map_err(|e| e.to_string())?
        .ok_or_else(|| "extraction had no actionable content".to_string())?;

    let decision = orchestrator.evaluate(&intent, policy, spending);
    report(title, &intent, &decision);
    Ok(())
}

fn run_approved_payment(policy: &Policy) -> Result<(), String> {
    evaluate_and_report(
        "Approved payment (Acme Corp, Tuesday 10:00, 500.00)",
        &manual_orchestrator(),
        &invoice(50_000, "Acme Corp", "acct-acme-001", TUESDAY_10H, 0.95),
        policy,
        &SpendingContext::default(),
    )
}

fn run_over_cap(policy: &Policy) -> Result<(), String> {
    evaluate_and_report(
        "Amount over per-transaction cap (1500.00 > 1000.00)",
        &manual_orchestrator(),
        &invoice(150_000, "Acme Corp", "acct-acme-001", TUESDAY_10H, 0.95),
        policy,
        &SpendingContext::default(),
    )
}

fn run_off_hours(policy: &Policy) -> Result<(), String> {
    evaluate_and_report(
        "Outside business hours (Saturday 22:00)",
        &manual_orchestrator(),
        &invoice(50_000, "Acme Corp", "acct-acme-001", SATURDAY_22H, 0.95),
        policy,
        &SpendingContext::default(),
    )
}

fn run_category_hold(policy: &Policy) -> Result<(), String> {
    // CloudHost infers the "software" category, whose rule holds every
    // purchase for approval even under its amount cap.
    evaluate_and_report(
        "Category hold (software purchase under its cap)",
        &manual_orchestrator(),
        &invoice(80_000, "CloudHost", "acct-cloudhost", TUESDAY_10H, 0.95),
        policy,
        &SpendingContext::default(),
    )
}

fn run_blocked_vendor(policy: &Policy) -> Result<(), String> {
    evaluate_and_report(
        "Blocked vendor (substring match on the block list)",
        &manual_orchestrator(),
        &invoice(
            10_000,
            "Speedy Gift Card Outlet",
            "acct-unknown",
            TUESDAY_10H,
            0.95,
        ),
        policy,
        &SpendingContext::default(),
    )
}

fn run_low_confidence(policy: &Policy) -> Result<(), String> {
    evaluate_and_report(
        "Low-confidence extraction (conditional rule rejects)",
        &manual_orchestrator(),
        &invoice(50_000, "Acme Corp", "acct-acme-001", TUESDAY_10H, 0.4),
        policy,
        &SpendingContext::default(),
    )
}

fn run_degraded_proof(policy: &Policy) -> Result<(), String> {
    // Proof generation enabled, but the prover binary does not exist. The
    // decision must match the manual-only result and carry an explicit
    // degraded tag — never an error, never a silently weakened guarantee.
    let config = EngineConfig {
        proof_enabled: true,
        ..EngineConfig::default()
    };
    let prover = ExternalProver::new(
        ProverConfig::new("/nonexistent/fidelis-circuit"),
        config.timezone_offset_minutes,
    );
    let orchestrator = Orchestrator::new(config, Some(Box::new(prover)));

    evaluate_and_report(
        "Degraded proof (prover missing, manual decision stands)",
        &orchestrator,
        &invoice(50_000, "Acme Corp", "acct-acme-001", TUESDAY_10H, 0.95),
        policy,
        &SpendingContext::default(),
    )
}

// ── Reporting ─────────────────────────────────────────────────────────────────

fn report(title: &str, intent: &Intent, decision: &Decision) {
    println!("── {title}");
    println!(
        "   intent: {:?} amount={} vendor='{}' category='{}'",
        intent.kind, intent.amount, intent.vendor_or_title, intent.category
    );
    println!(
        "   approved: {}   requires approval: {}   risk: {}",
        decision.approved, decision.requires_manual_approval, decision.risk_score
    );
    if decision.violations.is_empty() {
        println!("   violations: none");
    } else {
        println!("   violations:");
        for violation in &decision.violations {
            println!("     - {:?}: {}", violation.kind, violation.message);
        }
    }
    if !decision.matched_rules.is_empty() {
        println!("   matched rules: {}", decision.matched_rules.join(", "));
    }
    match &decision.proof {
        ProofTag::None => println!("   proof: none (disabled)"),
        ProofTag::Manual { degraded_reason } => match degraded_reason {
            Some(reason) => println!("   proof: manual (degraded: {reason})"),
            None => println!("   proof: manual"),
        },
        ProofTag::Cryptographic { artifact } => println!(
            "   proof: cryptographic ({} public signals)",
            artifact.public_signals.len()
        ),
    }
    println!();
}
