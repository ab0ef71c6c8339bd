use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{AccountId, OperationType};

pub type JournalEntryId = Uuid;

/// Audit record of one balance mutation.
/// Entries are append-only: they are never updated or deleted once stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JournalEntry {
    pub id: JournalEntryId,
    /// Monotonically increasing insertion order, assigned by the repository
    pub sequence: i64,
    pub account_id: AccountId,
    /// Balance before the operation
    pub initial_amount: Decimal,
    /// Balance after the operation (rounded)
    pub final_amount: Decimal,
    pub operation_type: OperationType,
    pub operation_time: DateTime<Utc>,
}

impl JournalEntry {
    /// Create a new entry. Sequence number must be assigned by the repository.
    pub fn new(
        account_id: AccountId,
        initial_amount: Decimal,
        final_amount: Decimal,
        operation_type: OperationType,
        operation_time: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            sequence: 0,
            account_id,
            initial_amount,
            final_amount,
            operation_type,
            operation_time,
        }
    }
}
