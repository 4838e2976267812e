use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

pub const MATERIAL_OPTION: &str = "Material";
pub const CONNECTION_OPTION: &str = "Connection";

/// A selectable option scoped to one or more product families.
///
/// The catalog holds at most one definition per (option name, family) pair.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OptionDefinition {
    pub name: String,
    #[serde(default)]
    pub category: String,
    pub product_families: Vec<String>,
    #[serde(default)]
    pub choices: Vec<String>,
    #[serde(default)]
    pub adders: BTreeMap<String, Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rules: Option<serde_json::Value>,
}

impl OptionDefinition {
    pub fn offers(&self, choice: &str) -> bool {
        self.choices.iter().any(|candidate| candidate == choice)
    }

    pub fn adder(&self, key: &str) -> Option<Decimal> {
        self.adders.get(key).copied()
    }
}

/// How an add-on option's catalog price scales with sensor length.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PriceModel {
    Fixed,
    PerInch,
    PerFoot,
    Unrecognized(String),
}

impl PriceModel {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Fixed => "fixed",
            Self::PerInch => "per_inch",
            Self::PerFoot => "per_foot",
            Self::Unrecognized(value) => value,
        }
    }
}

impl From<&str> for PriceModel {
    fn from(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "fixed" => Self::Fixed,
            "per_inch" => Self::PerInch,
            "per_foot" => Self::PerFoot,
            _ => Self::Unrecognized(value.to_string()),
        }
    }
}

impl From<String> for PriceModel {
    fn from(value: String) -> Self {
        Self::from(value.as_str())
    }
}

impl From<PriceModel> for String {
    fn from(value: PriceModel) -> Self {
        value.as_str().to_string()
    }
}
