use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::errors::PricingError;

pub const INCHES_PER_FOOT: Decimal = Decimal::from_parts(12, 0, 0, false, 0);

/// Length-based adder keyed by (family, material code).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LengthAdderRule {
    pub family: String,
    pub material_code: String,
    pub adder_type: AdderType,
    pub first_threshold: Decimal,
    pub adder_amount: Decimal,
}

impl LengthAdderRule {
    /// Adder owed at `length`; `Ok(None)` when the rule type is not recognised.
    pub fn adder_for(&self, length: Decimal) -> Result<Option<Decimal>, PricingError> {
        match self.adder_type {
            AdderType::PerInch => {
                per_inch_adder(length, self.first_threshold, self.adder_amount).map(Some)
            }
            AdderType::PerFoot => {
                per_foot_adder(length, self.first_threshold, self.adder_amount).map(Some)
            }
            AdderType::Unrecognized(_) => Ok(None),
        }
    }
}

/// Linear adder: every unit past the threshold costs `rate`.
pub fn per_inch_adder(
    length: Decimal,
    threshold: Decimal,
    rate: Decimal,
) -> Result<Decimal, PricingError> {
    if length <= threshold {
        return Ok(Decimal::ZERO);
    }
    length
        .checked_sub(threshold)
        .and_then(|excess| excess.checked_mul(rate))
        .ok_or(PricingError::ArithmeticOverflow { operation: "per-inch length adder" })
}

/// Banded adder: reaching the threshold buys one increment and every full or
/// partial foot beyond it buys another.
pub fn per_foot_adder(
    length: Decimal,
    threshold: Decimal,
    amount: Decimal,
) -> Result<Decimal, PricingError> {
    if length < threshold {
        return Ok(Decimal::ZERO);
    }
    length
        .checked_sub(threshold)
        .and_then(|excess| excess.checked_div(INCHES_PER_FOOT))
        .and_then(|feet| feet.ceil().checked_add(Decimal::ONE))
        .and_then(|increments| increments.checked_mul(amount))
        .ok_or(PricingError::ArithmeticOverflow { operation: "per-foot length adder" })
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum AdderType {
    PerInch,
    PerFoot,
    Unrecognized(String),
}

impl AdderType {
    pub fn as_str(&self) -> &str {
        match self {
            Self::PerInch => "per_inch",
            Self::PerFoot => "per_foot",
            Self::Unrecognized(value) => value,
        }
    }
}

impl From<&str> for AdderType {
    fn from(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "per_inch" => Self::PerInch,
            "per_foot" => Self::PerFoot,
            _ => Self::Unrecognized(value.to_string()),
        }
    }
}

impl From<String> for AdderType {
    fn from(value: String) -> Self {
        Self::from(value.as_str())
    }
}

impl From<AdderType> for String {
    fn from(value: AdderType) -> Self {
        value.as_str().to_string()
    }
}
