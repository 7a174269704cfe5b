//! The extraction-collaborator boundary.
//!
//! The AI extraction step lives outside this system; these types define the
//! shape it delivers and the single conversion point into the trusted
//! `Intent` model. Everything in `ExtractedEmail` is untrusted input — the
//! conversion validates eagerly and rejects rather than coercing.

use serde::{Deserialize, Serialize};

use crate::{
    error::{FidelisError, FidelisResult},
    intent::Intent,
};

/// What kind of actionable content the classifier found in the email.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExtractionType {
    Invoice,
    Schedule,
    Other,
}

/// Structured fields the extraction collaborator produced from one email.
///
/// Optional fields are genuinely optional on the wire; which ones are
/// required depends on `extraction_type` and is enforced by
/// [`Intent::from_extraction`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedEmail {
    #[serde(rename = "type")]
    pub extraction_type: ExtractionType,
    /// Classifier confidence in [0, 1].
    pub confidence: f64,
    /// Invoice amount, smallest currency unit. Signed on the wire because
    /// the extractor is untrusted; negatives are rejected at conversion.
    #[serde(default)]
    pub amount: Option<i64>,
    #[serde(default)]
    pub vendor: Option<String>,
    #[serde(default)]
    pub recipient: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    /// Invoice due date, Unix seconds — the proposed execution time.
    #[serde(default)]
    pub due_date: Option<i64>,
    #[serde(default)]
    pub title: Option<String>,
    /// Event start, Unix seconds — the proposed booking time.
    #[serde(default)]
    pub start_time: Option<i64>,
    #[serde(default)]
    pub end_time: Option<i64>,
    #[serde(default)]
    pub location: Option<String>,
    /// The raw email text the fields were extracted from; digested into the
    /// intent's provenance, never stored beyond that.
    pub source_text: String,
}

impl Intent {
    /// Convert an extraction result into a validated intent.
    ///
    /// Returns `Ok(None)` for `ExtractionType::Other` — emails with no
    /// actionable content are ignored, not errors. Invoice extractions
    /// require `amount` (non-negative), `vendor`, `recipient`, and
    /// `due_date`; schedule extractions require `title` and `start_time`.
    /// A missing or negative required field produces
    /// `FidelisError::Validation` naming the field.
    pub fn from_extraction(extracted: &ExtractedEmail) -> FidelisResult<Option<Intent>> {
        match extracted.extraction_type {
            ExtractionType::Other => Ok(None),

            ExtractionType::Invoice => {
                let raw_amount = extracted.amount.ok_or(FidelisError::Validation {
                    field: "amount",
                    reason: "invoice extraction missing amount".to_string(),
                })?;
                let amount = u64::try_from(raw_amount).map_err(|_| FidelisError::Validation {
                    field: "amount",
                    reason: format!("amount {} must not be negative", raw_amount),
                })?;
                let vendor = require_str(&extracted.vendor, "vendor")?;
                let recipient = require_str(&extracted.recipient, "recipient")?;
                let due_date = extracted.due_date.ok_or(FidelisError::Validation {
                    field: "due_date",
                    reason: "invoice extraction missing due date".to_string(),
                })?;

                Intent::payment(
                    amount,
                    recipient,
                    vendor,
                    extracted.category.as_deref(),
                    due_date,
                    extracted.confidence,
                    &extracted.source_text,
                )
                .map(Some)
            }

            ExtractionType::Schedule => {
                let title = require_str(&extracted.title, "title")?;
                let start_time = extracted.start_time.ok_or(FidelisError::Validation {
                    field: "start_time",
                    reason: "schedule extraction missing start time".to_string(),
                })?;
                // Organizer falls back to the location label; the recipient
                // slot is opaque and only used for list membership.
                let organizer = extracted
                    .location
                    .clone()
                    .filter(|l| !l.trim().is_empty())
                    .unwrap_or_else(|| title.clone());

                Intent::schedule(
                    title,
                    organizer,
                    start_time,
                    extracted.confidence,
                    &extracted.source_text,
                )
                .map(Some)
            }
        }
    }
}

fn require_str(value: &Option<String>, field: &'static str) -> FidelisResult<String> {
    match value {
        Some(s) if !s.trim().is_empty() => Ok(s.clone()),
        _ => Err(FidelisError::Validation {
            field,
            reason: format!("extraction missing required field '{}'", field),
        }),
    }
}
