//! # fidelis-contracts
//!
//! Shared types, schemas, and contracts for the FIDELIS policy engine.
//!
//! All crates in the workspace import from here. No business logic lives in
//! this crate — only data definitions, construction-time validation, and
//! error types.

pub mod decision;
pub mod error;
pub mod extraction;
pub mod intent;
pub mod policy;
pub mod spending;

#[cfg(test)]
mod tests {
    use super::*;
    use decision::{ProofArtifact, ProofTag, Violation, ViolationKind};
    use error::FidelisError;
    use extraction::{ExtractedEmail, ExtractionType};
    use intent::{infer_category, normalize_category, Intent, IntentKind, MAX_TIMESTAMP};
    use policy::Predicate;

    // ── Intent construction ──────────────────────────────────────────────────

    #[test]
    fn payment_intent_constructs_and_normalizes_category() {
        let intent = Intent::payment(
            50_000,
            "acct-123",
            "Acme Corp",
            Some("Software"),
            1_704_189_600,
            0.95,
            "Invoice #42 from Acme Corp",
        )
        .unwrap();

        assert_eq!(intent.kind, IntentKind::Payment);
        assert_eq!(intent.amount, 50_000);
        assert_eq!(intent.category, "software");
        // SHA-256 hex digest of the source text.
        assert_eq!(intent.provenance.source_digest.len(), 64);
    }

    #[test]
    fn schedule_intent_has_zero_amount() {
        let intent = Intent::schedule(
            "Quarterly review",
            "Conference Room B",
            1_704_189_600,
            0.8,
            "Meeting invite",
        )
        .unwrap();

        assert_eq!(intent.kind, IntentKind::Schedule);
        assert_eq!(intent.amount, 0);
        assert_eq!(intent.vendor_or_title, "Quarterly review");
    }

    #[test]
    fn intent_rejects_blank_recipient() {
        let err = Intent::payment(100, "  ", "Acme", None, 1_704_189_600, 0.9, "x").unwrap_err();
        match err {
            FidelisError::Validation { field, .. } => assert_eq!(field, "recipient"),
            other => panic!("expected Validation, got {:?}", other),
        }
    }

    #[test]
    fn intent_rejects_timestamp_before_epoch() {
        let err = Intent::payment(100, "acct", "Acme", None, -1, 0.9, "x").unwrap_err();
        match err {
            FidelisError::Validation { field, .. } => assert_eq!(field, "timestamp"),
            other => panic!("expected Validation, got {:?}", other),
        }
    }

    #[test]
    fn intent_rejects_timestamp_past_2100() {
        let err = Intent::payment(100, "acct", "Acme", None, MAX_TIMESTAMP, 0.9, "x").unwrap_err();
        match err {
            FidelisError::Validation { field, .. } => assert_eq!(field, "timestamp"),
            other => panic!("expected Validation, got {:?}", other),
        }
    }

    #[test]
    fn intent_rejects_confidence_out_of_range() {
        let err = Intent::payment(100, "acct", "Acme", None, 1_704_189_600, 1.5, "x").unwrap_err();
        match err {
            FidelisError::Validation { field, .. } => assert_eq!(field, "confidence"),
            other => panic!("expected Validation, got {:?}", other),
        }
    }

    #[test]
    fn unknown_category_defaults_to_other() {
        assert_eq!(normalize_category("gadgets"), "other");
        assert_eq!(normalize_category("  Utilities "), "utilities");
    }

    #[test]
    fn category_inference_from_vendor_keywords() {
        assert_eq!(infer_category("City Electric Supply"), "utilities");
        assert_eq!(infer_category("CloudHost Inc"), "software");
        assert_eq!(infer_category("Joe's Diner"), "other");
    }

    // ── Predicate grammar ────────────────────────────────────────────────────

    #[test]
    fn predicate_round_trips_through_json() {
        let original = Predicate::AmountAbove { threshold: 500_000 };
        let json = serde_json::to_string(&original).unwrap();
        assert!(json.contains("amount-above"), "tagged kebab-case: {json}");
        let decoded: Predicate = serde_json::from_str(&json).unwrap();
        assert_eq!(original, decoded);
    }

    #[test]
    fn unit_predicate_round_trips_through_json() {
        let original = Predicate::WeekdayIsWeekend;
        let json = serde_json::to_string(&original).unwrap();
        let decoded: Predicate = serde_json::from_str(&json).unwrap();
        assert_eq!(original, decoded);
    }

    #[test]
    fn predicate_validate_rejects_out_of_range_confidence() {
        let err = Predicate::ConfidenceBelow { threshold: 1.2 }
            .validate()
            .unwrap_err();
        assert!(matches!(err, FidelisError::InvalidExpression { .. }));
    }

    #[test]
    fn predicate_validate_rejects_out_of_range_hour() {
        let err = Predicate::HourAfter { hour: 24 }.validate().unwrap_err();
        assert!(matches!(err, FidelisError::InvalidExpression { .. }));
    }

    #[test]
    fn unrecognized_predicate_name_fails_deserialization() {
        // The grammar is closed: names outside the enum are unrepresentable.
        let result: Result<Predicate, _> =
            serde_json::from_str(r#"{"kind":"vendor-matches-regex","pattern":".*"}"#);
        assert!(result.is_err());
    }

    // ── Decision / proof tag serde ───────────────────────────────────────────

    #[test]
    fn proof_tag_manual_round_trips() {
        let original = ProofTag::Manual {
            degraded_reason: Some("prover timed out after 30s".to_string()),
        };
        let json = serde_json::to_string(&original).unwrap();
        let decoded: ProofTag = serde_json::from_str(&json).unwrap();
        assert_eq!(original, decoded);
    }

    #[test]
    fn proof_tag_cryptographic_round_trips() {
        let original = ProofTag::Cryptographic {
            artifact: ProofArtifact {
                proof: "b64proofdata".to_string(),
                public_signals: vec!["1".to_string(), "0".to_string()],
            },
        };
        let json = serde_json::to_string(&original).unwrap();
        let decoded: ProofTag = serde_json::from_str(&json).unwrap();
        assert_eq!(original, decoded);
    }

    #[test]
    fn violation_kind_serializes_kebab_case() {
        let v = Violation::new(
            ViolationKind::AmountExceedsTransactionLimit,
            "amount 150000 exceeds per-transaction limit 100000",
        );
        let json = serde_json::to_string(&v).unwrap();
        assert!(json.contains("amount-exceeds-transaction-limit"), "{json}");
    }

    // ── Extraction boundary ──────────────────────────────────────────────────

    fn invoice_email() -> ExtractedEmail {
        ExtractedEmail {
            extraction_type: ExtractionType::Invoice,
            confidence: 0.92,
            amount: Some(75_000),
            vendor: Some("Acme Corp".to_string()),
            recipient: Some("acct-123".to_string()),
            category: None,
            due_date: Some(1_704_189_600),
            title: None,
            start_time: None,
            end_time: None,
            location: None,
            source_text: "Please pay invoice #42".to_string(),
        }
    }

    #[test]
    fn invoice_extraction_becomes_payment_intent() {
        let intent = Intent::from_extraction(&invoice_email()).unwrap().unwrap();
        assert_eq!(intent.kind, IntentKind::Payment);
        assert_eq!(intent.amount, 75_000);
        assert_eq!(intent.recipient, "acct-123");
    }

    #[test]
    fn other_extraction_is_ignored() {
        let mut email = invoice_email();
        email.extraction_type = ExtractionType::Other;
        assert!(Intent::from_extraction(&email).unwrap().is_none());
    }

    #[test]
    fn negative_extracted_amount_is_rejected() {
        let mut email = invoice_email();
        email.amount = Some(-500);
        let err = Intent::from_extraction(&email).unwrap_err();
        match err {
            FidelisError::Validation { field, .. } => assert_eq!(field, "amount"),
            other => panic!("expected Validation, got {:?}", other),
        }
    }

    #[test]
    fn invoice_missing_due_date_is_rejected() {
        let mut email = invoice_email();
        email.due_date = None;
        let err = Intent::from_extraction(&email).unwrap_err();
        match err {
            FidelisError::Validation { field, .. } => assert_eq!(field, "due_date"),
            other => panic!("expected Validation, got {:?}", other),
        }
    }

    #[test]
    fn schedule_extraction_becomes_schedule_intent() {
        let email = ExtractedEmail {
            extraction_type: ExtractionType::Schedule,
            confidence: 0.85,
            amount: None,
            vendor: None,
            recipient: None,
            category: None,
            due_date: None,
            title: Some("Vendor sync".to_string()),
            start_time: Some(1_704_189_600),
            end_time: Some(1_704_193_200),
            location: Some("Room 4".to_string()),
            source_text: "Calendar invite".to_string(),
        };
        let intent = Intent::from_extraction(&email).unwrap().unwrap();
        assert_eq!(intent.kind, IntentKind::Schedule);
        assert_eq!(intent.recipient, "Room 4");
    }

    // ── Error display messages ───────────────────────────────────────────────

    #[test]
    fn error_validation_display() {
        let err = FidelisError::Validation {
            field: "amount",
            reason: "must not be negative".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("amount"));
        assert!(msg.contains("must not be negative"));
    }

    #[test]
    fn error_invalid_expression_display() {
        let err = FidelisError::InvalidExpression {
            reason: "hour-after hour 24 outside 0-23".to_string(),
        };
        assert!(err.to_string().contains("invalid conditional-rule expression"));
    }

    #[test]
    fn error_proof_verification_display() {
        let err = FidelisError::ProofVerificationFailed {
            reason: "public signal 0 mismatch".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("proof verification failed"));
        assert!(msg.contains("signal 0"));
    }
}
