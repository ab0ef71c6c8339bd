use std::fmt;

use rust_decimal::Decimal;

use super::{Account, AccountId, JournalEntry, format_amount, zero_amount};

/// A consistency problem between an account and its journal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntegrityIssue {
    /// An entry does not start where the previous one ended.
    BrokenChain {
        account_id: AccountId,
        sequence: i64,
        expected: Decimal,
        found: Decimal,
    },
    /// The stored balance differs from the last journaled amount.
    BalanceMismatch {
        account_id: AccountId,
        balance: Decimal,
        journaled: Decimal,
    },
}

impl fmt::Display for IntegrityIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IntegrityIssue::BrokenChain {
                account_id,
                sequence,
                expected,
                found,
            } => write!(
                f,
                "Account {}: journal entry #{} starts at {}, expected {}",
                account_id,
                sequence,
                format_amount(*found),
                format_amount(*expected)
            ),
            IntegrityIssue::BalanceMismatch {
                account_id,
                balance,
                journaled,
            } => write!(
                f,
                "Account {}: balance {} does not match journal {}",
                account_id,
                format_amount(*balance),
                format_amount(*journaled)
            ),
        }
    }
}

/// Result of a full ledger consistency check.
#[derive(Debug, Clone, Default)]
pub struct IntegrityReport {
    pub user_count: i64,
    pub account_count: i64,
    pub journal_count: i64,
    pub issues: Vec<IntegrityIssue>,
}

impl IntegrityReport {
    pub fn is_healthy(&self) -> bool {
        self.issues.is_empty()
    }
}

/// Replay an account's journal (in insertion order) and compare it with the stored balance.
/// Every account starts at zero, so an account without entries must still hold 0.00.
pub fn verify_account_journal(account: &Account, entries: &[JournalEntry]) -> Vec<IntegrityIssue> {
    let mut issues = Vec::new();
    let mut running = zero_amount();

    for entry in entries {
        if entry.initial_amount != running {
            issues.push(IntegrityIssue::BrokenChain {
                account_id: account.id,
                sequence: entry.sequence,
                expected: running,
                found: entry.initial_amount,
            });
        }
        running = entry.final_amount;
    }

    if account.balance != running {
        issues.push(IntegrityIssue::BalanceMismatch {
            account_id: account.id,
            balance: account.balance,
            journaled: running,
        });
    }

    issues
}
