use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{
    BalanceOutOfRange, JournalEntry, OperationType, RoundingRule, UserId, apply_to_balance,
    zero_amount,
};

pub type AccountId = Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    /// Owning user, fixed at creation
    pub owner_id: UserId,
    /// Always rounded to two decimal places
    pub balance: Decimal,
    /// Disabled (blocked) accounts reject balance mutations
    pub enabled: bool,
    pub created_at: DateTime<Utc>,
}

impl Account {
    /// A fresh account: zero balance, enabled.
    pub fn new(owner_id: UserId) -> Self {
        Self {
            id: Uuid::new_v4(),
            owner_id,
            balance: zero_amount(),
            enabled: true,
            created_at: Utc::now(),
        }
    }

    pub fn with_balance(mut self, balance: Decimal) -> Self {
        self.balance = balance;
        self
    }

    pub fn is_blocked(&self) -> bool {
        !self.enabled
    }

    /// Apply an operation to this account's balance and return the journal entry
    /// recording it. The caller is responsible for checking the enabled flag.
    /// The balance is left untouched when the result is out of range.
    pub fn apply(
        &mut self,
        operation: OperationType,
        amount: Decimal,
        rule: RoundingRule,
        at: DateTime<Utc>,
    ) -> Result<JournalEntry, BalanceOutOfRange> {
        let initial = self.balance;
        self.balance = apply_to_balance(initial, operation, amount, rule)?;
        Ok(JournalEntry::new(self.id, initial, self.balance, operation, at))
    }
}

/// Caller-facing projection of an account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountView {
    pub id: AccountId,
    pub owner_id: UserId,
    pub balance: Decimal,
    pub enabled: bool,
}

impl From<&Account> for AccountView {
    fn from(account: &Account) -> Self {
        Self {
            id: account.id,
            owner_id: account.owner_id,
            balance: account.balance,
            enabled: account.enabled,
        }
    }
}

impl From<Account> for AccountView {
    fn from(account: Account) -> Self {
        Self::from(&account)
    }
}
