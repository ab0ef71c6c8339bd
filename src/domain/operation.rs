use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{RoundingRule, has_amount_scale, round_amount};

/// Direction of a balance mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationType {
    /// Money paid into the account (balance increases)
    Credit,
    /// Money withdrawn from the account (balance decreases)
    Debit,
}

impl OperationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationType::Credit => "credit",
            OperationType::Debit => "debit",
        }
    }
}

impl fmt::Display for OperationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for OperationType {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "credit" | "deposit" => Ok(OperationType::Credit),
            "debit" | "withdrawal" => Ok(OperationType::Debit),
            other => Err(UnknownVariant::new("operation type", other)),
        }
    }
}

/// Requested state change for the enabled flag of an account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockingOperation {
    Block,
    Unblock,
}

impl BlockingOperation {
    pub fn as_str(&self) -> &'static str {
        match self {
            BlockingOperation::Block => "block",
            BlockingOperation::Unblock => "unblock",
        }
    }

    /// The value of the enabled flag after this operation.
    pub fn enabled(&self) -> bool {
        matches!(self, BlockingOperation::Unblock)
    }
}

impl fmt::Display for BlockingOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for BlockingOperation {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "block" => Ok(BlockingOperation::Block),
            "unblock" => Ok(BlockingOperation::Unblock),
            other => Err(UnknownVariant::new("blocking operation", other)),
        }
    }
}

/// Which operation amounts the ledger accepts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AmountPolicy {
    /// Only amounts >= 0 are accepted.
    #[default]
    NonNegative,
    /// Any amount is accepted; a debit of a negative amount credits the account.
    AllowNegative,
}

impl AmountPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            AmountPolicy::NonNegative => "non-negative",
            AmountPolicy::AllowNegative => "allow-negative",
        }
    }

    pub fn permits(&self, amount: Decimal) -> bool {
        match self {
            AmountPolicy::NonNegative => !amount.is_sign_negative() || amount.is_zero(),
            AmountPolicy::AllowNegative => true,
        }
    }
}

impl fmt::Display for AmountPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Compute the balance that results from applying an operation.
/// Debits subtract, credits add; the result is rounded to two decimals.
/// No floor is applied: a debit may take the balance below zero.
/// Fails when the result overflows or cannot be held with two fractional digits.
pub fn apply_to_balance(
    balance: Decimal,
    operation: OperationType,
    amount: Decimal,
    rule: RoundingRule,
) -> Result<Decimal, BalanceOutOfRange> {
    let raw = match operation {
        OperationType::Debit => balance.checked_sub(amount),
        OperationType::Credit => balance.checked_add(amount),
    }
    .ok_or(BalanceOutOfRange { balance, amount })?;

    let rounded = round_amount(raw, rule);
    if !has_amount_scale(rounded) {
        return Err(BalanceOutOfRange { balance, amount });
    }
    Ok(rounded)
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("applying {amount} to balance {balance} is out of range")]
pub struct BalanceOutOfRange {
    pub balance: Decimal,
    pub amount: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind}: '{value}'")]
pub struct UnknownVariant {
    kind: &'static str,
    value: String,
}

impl UnknownVariant {
    fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}
