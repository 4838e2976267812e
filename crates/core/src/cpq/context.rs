use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::catalog::CatalogLookup;
use crate::domain::{
    connection::{ConnectionSpec, TRI_CLAMP},
    material::MaterialDefinition,
    product::{ModelFamily, ProductId, ProductInstance},
};
use crate::errors::{CatalogEntity, PricingError};

pub const CONNECTION_TYPE_KEY: &str = "connection_type";
pub const FLANGE_RATING_KEY: &str = "flange_rating";
pub const FLANGE_SIZE_KEY: &str = "flange_size";
pub const TRI_CLAMP_SIZE_KEY: &str = "tri_clamp_size";

/// Raw option selections as collected from the caller. Keys the engine does
/// not recognise are carried but ignored.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OptionSpecs(pub BTreeMap<String, String>);

impl OptionSpecs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str).filter(|value| !value.trim().is_empty())
    }

    pub fn connection(&self) -> Option<ConnectionSpec> {
        let connection_type = self.get(CONNECTION_TYPE_KEY)?;
        let spec = if connection_type.trim().eq_ignore_ascii_case(TRI_CLAMP) {
            ConnectionSpec::from_parts(connection_type, None, self.get(TRI_CLAMP_SIZE_KEY))
        } else {
            ConnectionSpec::from_parts(
                connection_type,
                self.get(FLANGE_RATING_KEY),
                self.get(FLANGE_SIZE_KEY),
            )
        };
        Some(spec)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for OptionSpecs {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(key, value)| (key.into(), value.into())).collect())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PricingRequest {
    pub product_id: ProductId,
    #[serde(default)]
    pub length: Option<Decimal>,
    #[serde(default)]
    pub material: Option<String>,
    #[serde(default)]
    pub options: OptionSpecs,
}

impl PricingRequest {
    pub fn new(product_id: impl Into<String>) -> Self {
        Self {
            product_id: ProductId::new(product_id),
            length: None,
            material: None,
            options: OptionSpecs::default(),
        }
    }

    pub fn with_length(mut self, length: Decimal) -> Self {
        self.length = Some(length);
        self
    }

    pub fn with_material(mut self, material: impl Into<String>) -> Self {
        self.material = Some(material.into());
        self
    }

    pub fn with_options(mut self, options: OptionSpecs) -> Self {
        self.options = options;
        self
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingTraceStep {
    pub stage: String,
    pub detail: String,
    pub amount: Decimal,
}

/// Resolved inputs and running price of one pricing request.
///
/// Product, material and effective length are resolved once in [`PricingContext::build`]
/// and never re-resolved. `price` stays `None` until the base price is assigned.
#[derive(Clone, Debug, PartialEq)]
pub struct PricingContext {
    pub product: ProductInstance,
    pub material: MaterialDefinition,
    pub material_override: Option<String>,
    pub family: Option<ModelFamily>,
    pub length: Decimal,
    pub options: OptionSpecs,
    pub price: Option<Decimal>,
    pub trace: Vec<PricingTraceStep>,
}

impl PricingContext {
    pub fn build(
        catalog: &dyn CatalogLookup,
        request: &PricingRequest,
    ) -> Result<Self, PricingError> {
        let product = catalog.product(&request.product_id).ok_or_else(|| {
            PricingError::not_found(CatalogEntity::Product, request.product_id.as_str())
        })?;

        let length = request.length.unwrap_or(product.base_length);
        if length <= Decimal::ZERO {
            return Err(PricingError::InvalidLength { length });
        }
        let material_override =
            request.material.as_deref().map(str::trim).filter(|code| !code.is_empty());
        let material_code = material_override.unwrap_or(product.default_material.as_str());
        let material = catalog
            .material(material_code)
            .ok_or_else(|| PricingError::not_found(CatalogEntity::Material, material_code))?;

        Ok(Self {
            product: product.clone(),
            material: material.clone(),
            material_override: material_override.map(str::to_string),
            family: product.family(),
            length,
            options: request.options.clone(),
            price: None,
            trace: Vec::new(),
        })
    }

    pub fn family_key(&self) -> Option<String> {
        self.family.as_ref().map(ModelFamily::key)
    }

    pub fn price_or_zero(&self) -> Decimal {
        self.price.unwrap_or(Decimal::ZERO)
    }

    /// Replaces the running price.
    pub fn assign(mut self, stage: &str, detail: impl Into<String>, amount: Decimal) -> Self {
        self.price = Some(amount);
        self.trace.push(PricingTraceStep {
            stage: stage.to_string(),
            detail: detail.into(),
            amount,
        });
        self
    }

    /// Adds `amount` to the running price.
    pub fn add(
        mut self,
        stage: &'static str,
        detail: impl Into<String>,
        amount: Decimal,
    ) -> Result<Self, PricingError> {
        let price = self
            .price_or_zero()
            .checked_add(amount)
            .ok_or(PricingError::ArithmeticOverflow { operation: stage })?;
        self.price = Some(price);
        self.trace.push(PricingTraceStep {
            stage: stage.to_string(),
            detail: detail.into(),
            amount,
        });
        Ok(self)
    }
}
