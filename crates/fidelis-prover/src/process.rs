//! External prover process invocation.
//!
//! The proof backend is message-passing over a process boundary: the
//! request JSON goes to the child's stdin, the response JSON comes back on
//! stdout, and the exit code signals success. Nothing about the child is
//! trusted — its output is validated against a JSON Schema before a single
//! field is read, and every failure mode (missing binary, spawn error,
//! timeout, crash, garbage output) collapses into a diagnostic cause string
//! the caller maps to `ProofOutcome::Unavailable`. Partial or ambiguous
//! stdout is never interpreted.
//!
//! The timeout is enforced by polling `try_wait` against a deadline and
//! killing the child on expiry — the invocation is abandoned, never awaited
//! indefinitely.

use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, warn};

use crate::encode::CircuitInput;

/// How often the child is polled for exit while the deadline runs.
const POLL_INTERVAL: Duration = Duration::from_millis(25);

/// Cap on the stderr excerpt embedded in diagnostic causes.
const STDERR_EXCERPT: usize = 300;

/// Where and how to reach the external prover.
#[derive(Debug, Clone)]
pub struct ProverConfig {
    /// Path to the prover executable.
    pub binary: PathBuf,
}

impl ProverConfig {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }
}

/// The prover's structured response, accepted only after schema validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProverResponse {
    pub approved: bool,
    /// 0–100, enforced by the response schema.
    pub risk_score: u8,
    pub violation_count: u32,
    /// The opaque proof material. Absent means no usable artifact.
    #[serde(default)]
    pub proof: Option<String>,
    #[serde(default)]
    pub public_signals: Option<Vec<String>>,
}

/// The JSON Schema every prover response must satisfy before parsing.
fn response_schema() -> serde_json::Value {
    json!({
        "type": "object",
        "required": ["approved", "riskScore", "violationCount"],
        "properties": {
            "approved": { "type": "boolean" },
            "riskScore": { "type": "integer", "minimum": 0, "maximum": 100 },
            "violationCount": { "type": "integer", "minimum": 0 },
            "proof": { "type": "string" },
            "publicSignals": { "type": "array", "items": { "type": "string" } }
        }
    })
}

/// Validate and parse raw prover stdout.
///
/// Returns the diagnostic cause on any deviation from the response
/// contract; the caller treats that as `Unavailable`.
pub fn parse_response(stdout: &str) -> Result<ProverResponse, String> {
    let value: serde_json::Value = serde_json::from_str(stdout.trim())
        .map_err(|e| format!("prover stdout is not valid JSON: {}", e))?;

    let validator = jsonschema::validator_for(&response_schema())
        .map_err(|e| format!("prover response schema is malformed: {}", e))?;

    if let Some(error) = validator.iter_errors(&value).next() {
        return Err(format!(
            "prover response violates the contract at {}: {}",
            error.instance_path, error
        ));
    }

    serde_json::from_value(value).map_err(|e| format!("prover response failed to parse: {}", e))
}

/// Run the prover once: request on stdin, response on stdout, hard deadline.
///
/// `Err` carries the diagnostic cause — the caller maps it to
/// `ProofOutcome::Unavailable` and degrades. Responses are expected to be
/// small (one JSON object); a prover that streams megabytes before exiting
/// is outside the contract.
pub fn invoke(
    binary: &Path,
    input: &CircuitInput,
    timeout: Duration,
) -> Result<ProverResponse, String> {
    let request = serde_json::to_string(input)
        .map_err(|e| format!("failed to serialize circuit input: {}", e))?;

    debug!(binary = %binary.display(), timeout_ms = timeout.as_millis() as u64, "invoking prover");

    let mut child = Command::new(binary)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                format!("prover binary '{}' not found", binary.display())
            } else {
                format!("failed to spawn prover '{}': {}", binary.display(), e)
            }
        })?;

    // Hand over the request and close stdin so the child sees EOF.
    if let Some(mut stdin) = child.stdin.take() {
        if let Err(e) = stdin.write_all(request.as_bytes()) {
            let _ = child.kill();
            let _ = child.wait();
            return Err(format!("failed to write request to prover stdin: {}", e));
        }
    }

    // Poll for exit until the deadline; kill and abandon on expiry.
    let deadline = Instant::now() + timeout;
    let status = loop {
        match child.try_wait() {
            Ok(Some(status)) => break status,
            Ok(None) => {
                if Instant::now() >= deadline {
                    let _ = child.kill();
                    let _ = child.wait();
                    warn!(
                        binary = %binary.display(),
                        timeout_ms = timeout.as_millis() as u64,
                        "prover timed out; child killed"
                    );
                    return Err(format!(
                        "prover timed out after {} ms",
                        timeout.as_millis()
                    ));
                }
                std::thread::sleep(POLL_INTERVAL);
            }
            Err(e) => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(format!("failed to poll prover process: {}", e));
            }
        }
    };

    let mut stdout = String::new();
    if let Some(mut pipe) = child.stdout.take() {
        let _ = pipe.read_to_string(&mut stdout);
    }
    let mut stderr = String::new();
    if let Some(mut pipe) = child.stderr.take() {
        let _ = pipe.read_to_string(&mut stderr);
    }

    if !status.success() {
        let excerpt: String = stderr.chars().take(STDERR_EXCERPT).collect();
        return Err(format!(
            "prover exited with {}: {}",
            status,
            excerpt.trim()
        ));
    }

    parse_response(&stdout)
}

// ── Tests ────────────────────────────────────────────────────────────────────
