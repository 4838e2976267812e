use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

pub const FLANGE: &str = "Flange";
pub const TRI_CLAMP: &str = "Tri-Clamp";

/// A process connection selection. Only flange and tri-clamp connections
/// carry a price; anything else is kept as `Other` and contributes nothing.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ConnectionSpec {
    Flange { rating: String, size: String },
    TriClamp { size: String },
    Other { connection_type: String },
}

impl ConnectionSpec {
    pub fn from_parts(connection_type: &str, rating: Option<&str>, size: Option<&str>) -> Self {
        let connection_type = connection_type.trim();
        let rating = rating.map(str::trim).filter(|value| !value.is_empty());
        let size = size.map(str::trim).filter(|value| !value.is_empty());

        match (connection_type, rating, size) {
            (kind, Some(rating), Some(size)) if kind.eq_ignore_ascii_case(FLANGE) => {
                Self::Flange { rating: rating.to_string(), size: size.to_string() }
            }
            (kind, _, Some(size)) if kind.eq_ignore_ascii_case(TRI_CLAMP) => {
                Self::TriClamp { size: size.to_string() }
            }
            (kind, _, _) => Self::Other { connection_type: kind.to_string() },
        }
    }

    /// Key into a family's `Connection` option adders (`Flange_150#_2`, `Tri-Clamp_1.5`).
    pub fn adder_key(&self) -> Option<String> {
        match self {
            Self::Flange { rating, size } => Some(format!("{FLANGE}_{rating}_{size}")),
            Self::TriClamp { size } => Some(format!("{TRI_CLAMP}_{size}")),
            Self::Other { .. } => None,
        }
    }

    pub fn is_priced(&self) -> bool {
        !matches!(self, Self::Other { .. })
    }
}

/// Row of the flat connection price table.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConnectionPriceEntry {
    pub connection_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<String>,
    pub size: String,
    pub price: Decimal,
}

impl ConnectionPriceEntry {
    pub fn spec(&self) -> ConnectionSpec {
        ConnectionSpec::from_parts(&self.connection_type, self.rating.as_deref(), Some(&self.size))
    }
}
