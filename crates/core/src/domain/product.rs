use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(pub String);

impl ProductId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ProductId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A catalog-priced variant of a product family.
///
/// The model number encodes the family as its leading token (see [`ModelFamily`]).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProductInstance {
    pub id: ProductId,
    pub model_number: String,
    pub base_price: Decimal,
    pub base_length: Decimal,
    pub default_material: String,
    pub voltage: String,
}

impl ProductInstance {
    pub fn family(&self) -> Option<ModelFamily> {
        ModelFamily::parse(&self.model_number)
    }
}

/// Family key derived from a model number: the leading alphanumeric token,
/// optionally followed by a `/` discriminator (`F1`, `F1/2`).
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ModelFamily {
    pub family: String,
    pub variant: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ParseState {
    Start,
    Family,
    Variant,
}

impl ModelFamily {
    /// Parses the family token of a model number.
    ///
    /// `Start` skips leading whitespace and enters `Family` on the first
    /// alphanumeric. `Family` accumulates alphanumerics and moves to `Variant`
    /// on `/`. `Variant` accumulates alphanumerics. Any other character ends
    /// the parse. Returns `None` when no family token is present.
    pub fn parse(model_number: &str) -> Option<Self> {
        let mut state = ParseState::Start;
        let mut family = String::new();
        let mut variant = String::new();

        for ch in model_number.chars() {
            state = match (state, ch) {
                (ParseState::Start, c) if c.is_whitespace() => ParseState::Start,
                (ParseState::Start, c) | (ParseState::Family, c) if c.is_ascii_alphanumeric() => {
                    family.push(c);
                    ParseState::Family
                }
                (ParseState::Family, '/') => ParseState::Variant,
                (ParseState::Variant, c) if c.is_ascii_alphanumeric() => {
                    variant.push(c);
                    ParseState::Variant
                }
                _ => break,
            };
        }

        if family.is_empty() {
            return None;
        }

        Some(Self { family, variant: (!variant.is_empty()).then_some(variant) })
    }

    pub fn key(&self) -> String {
        match &self.variant {
            Some(variant) => format!("{}/{}", self.family, variant),
            None => self.family.clone(),
        }
    }
}

impl std::fmt::Display for ModelFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.key())
    }
}
