//! Aggregate-spend context supplied by the external ledger.
//!
//! The core never tracks spending itself: the ledger collaborator owns the
//! aggregates and supplies a fresh snapshot per evaluation call. The core
//! only reads it, so no locking discipline exists inside this subsystem.

use serde::{Deserialize, Serialize};

/// Spend already committed in the current day and week windows, smallest
/// currency unit. Window boundaries are the ledger's concern.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpendingContext {
    pub spent_today: u64,
    pub spent_this_week: u64,
}

impl SpendingContext {
    pub fn new(spent_today: u64, spent_this_week: u64) -> Self {
        Self {
            spent_today,
            spent_this_week,
        }
    }
}
