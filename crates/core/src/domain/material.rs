use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MaterialDefinition {
    pub code: String,
    pub name: String,
    #[serde(default)]
    pub nonstandard_length_surcharge: Decimal,
    #[serde(default)]
    pub applies_nonstandard_surcharge: bool,
}
