use std::fmt;
use std::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Number of fractional digits every stored balance carries.
pub const AMOUNT_SCALE: u32 = 2;

/// Tie-break rule used when a balance is rounded to two decimal places.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RoundingRule {
    /// Ties go to the lower neighbour: 1.005 -> 1.00, -1.005 -> -1.01.
    /// Unlike `BigDecimal` HALF_DOWN, negative ties move away from zero.
    #[default]
    HalfDown,
    /// Ties go away from zero: 1.005 -> 1.01, -1.005 -> -1.01.
    HalfUp,
    /// Ties go to the even neighbour: 1.005 -> 1.00, 1.015 -> 1.02.
    HalfEven,
}

impl RoundingRule {
    pub fn as_str(&self) -> &'static str {
        match self {
            RoundingRule::HalfDown => "half-down",
            RoundingRule::HalfUp => "half-up",
            RoundingRule::HalfEven => "half-even",
        }
    }

    fn strategy_for(&self, value: Decimal) -> RoundingStrategy {
        match self {
            // Lower neighbour of a negative tie is the one further from zero.
            RoundingRule::HalfDown if value.is_sign_negative() => {
                RoundingStrategy::MidpointAwayFromZero
            }
            RoundingRule::HalfDown => RoundingStrategy::MidpointTowardZero,
            RoundingRule::HalfUp => RoundingStrategy::MidpointAwayFromZero,
            RoundingRule::HalfEven => RoundingStrategy::MidpointNearestEven,
        }
    }
}

impl fmt::Display for RoundingRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for RoundingRule {
    type Err = ParseAmountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "half-down" | "half_down" => Ok(RoundingRule::HalfDown),
            "half-up" | "half_up" => Ok(RoundingRule::HalfUp),
            "half-even" | "half_even" => Ok(RoundingRule::HalfEven),
            other => Err(ParseAmountError::UnknownRoundingRule(other.to_string())),
        }
    }
}

/// Round a value to two decimal places with the given rule.
/// The result carries a scale of two (`150` becomes `150.00`) unless the value is too
/// large to be represented with two fractional digits; see `has_amount_scale`.
pub fn round_amount(value: Decimal, rule: RoundingRule) -> Decimal {
    let mut rounded = value.round_dp_with_strategy(AMOUNT_SCALE, rule.strategy_for(value));
    rounded.rescale(AMOUNT_SCALE);
    if rounded.is_zero() {
        rounded.set_sign_positive(true);
    }
    rounded
}

/// True when `value` carries exactly two fractional digits.
pub fn has_amount_scale(value: Decimal) -> bool {
    value.scale() == AMOUNT_SCALE
}

/// The zero balance a new account starts with.
pub fn zero_amount() -> Decimal {
    Decimal::new(0, AMOUNT_SCALE)
}

/// Format an amount as a human-readable string with two decimals.
/// Example: 50 -> "50.00", -12.3 -> "-12.30"
pub fn format_amount(value: Decimal) -> String {
    let mut display = value;
    display.rescale(AMOUNT_SCALE);
    display.to_string()
}

/// Parse a plain decimal string into an exact amount.
/// Accepts "50", "50.00", "-12.345", ".5" and "5."; no rounding is applied here.
pub fn parse_amount(input: &str) -> Result<Decimal, ParseAmountError> {
    let input = input.trim();
    let (sign, digits) = match input.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", input.strip_prefix('+').unwrap_or(input)),
    };

    let mut seen_dot = false;
    let mut seen_digit = false;
    for ch in digits.chars() {
        match ch {
            '0'..='9' => seen_digit = true,
            '.' if !seen_dot => seen_dot = true,
            _ => return Err(ParseAmountError::InvalidFormat(input.to_string())),
        }
    }
    if !seen_digit {
        return Err(ParseAmountError::InvalidFormat(input.to_string()));
    }

    let mut normalized = String::with_capacity(digits.len() + 2);
    normalized.push_str(sign);
    if digits.starts_with('.') {
        normalized.push('0');
    }
    normalized.push_str(digits);
    if digits.ends_with('.') {
        normalized.push('0');
    }

    Decimal::from_str(&normalized).map_err(|_| ParseAmountError::OutOfRange(input.to_string()))
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseAmountError {
    #[error("invalid amount format: '{0}'")]
    InvalidFormat(String),

    #[error("amount out of range: '{0}'")]
    OutOfRange(String),

    #[error("unknown rounding rule: '{0}' (expected half-down, half-up or half-even)")]
    UnknownRoundingRule(String),
}
