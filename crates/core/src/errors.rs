use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CatalogEntity {
    Product,
    Material,
}

impl std::fmt::Display for CatalogEntity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Product => f.write_str("product"),
            Self::Material => f.write_str("material"),
        }
    }
}

/// Fatal outcomes of a single pricing calculation. Any of these aborts the
/// pipeline; no partial price is returned alongside them.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum PricingError {
    #[error("{entity} `{key}` was not found in the catalog")]
    NotFound { entity: CatalogEntity, key: String },
    #[error("material `{material}` is not available for product family `{family}`")]
    Availability { material: String, family: String },
    #[error(
        "length {length} exceeds the maximum of {limit} for material `{material}`. {guidance}"
    )]
    LengthLimitExceeded { material: String, length: Decimal, limit: Decimal, guidance: String },
    #[error("unsupported {rule} `{value}`")]
    UnsupportedRule { rule: &'static str, value: String },
    #[error("pricing pipeline finished without assigning a base price")]
    PriceNotAssigned,
    #[error("length {length} must be greater than zero")]
    InvalidLength { length: Decimal },
    #[error("{operation} overflowed the supported price range")]
    ArithmeticOverflow { operation: &'static str },
}

impl PricingError {
    pub fn not_found(entity: CatalogEntity, key: impl Into<String>) -> Self {
        Self::NotFound { entity, key: key.into() }
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ApplicationError {
    #[error(transparent)]
    Pricing(#[from] PricingError),
    #[error("catalog failure: {0}")]
    Catalog(String),
    #[error("configuration failure: {0}")]
    Configuration(String),
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum InterfaceError {
    #[error("bad request: {message}")]
    BadRequest { message: String, correlation_id: String },
    #[error("not found: {message}")]
    NotFound { message: String, correlation_id: String },
    #[error("service unavailable: {message}")]
    ServiceUnavailable { message: String, correlation_id: String },
    #[error("internal error: {message}")]
    Internal { message: String, correlation_id: String },
}

impl InterfaceError {
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::BadRequest { .. } => {
                "The selection could not be priced. Check the requested options and try again."
            }
            Self::NotFound { .. } => "The requested product or material is not in the catalog.",
            Self::ServiceUnavailable { .. } => {
                "The product catalog is unavailable. Please retry shortly."
            }
            Self::Internal { .. } => "An unexpected internal error occurred.",
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Self::BadRequest { message, .. }
            | Self::NotFound { message, .. }
            | Self::ServiceUnavailable { message, .. }
            | Self::Internal { message, .. } => message,
        }
    }

    pub fn correlation_id(&self) -> &str {
        match self {
            Self::BadRequest { correlation_id, .. }
            | Self::NotFound { correlation_id, .. }
            | Self::ServiceUnavailable { correlation_id, .. }
            | Self::Internal { correlation_id, .. } => correlation_id,
        }
    }
}

impl ApplicationError {
    pub fn into_interface(self, correlation_id: impl Into<String>) -> InterfaceError {
        let correlation_id = correlation_id.into();
        let mut mapped = InterfaceError::from(self);
        match &mut mapped {
            InterfaceError::BadRequest { correlation_id: id, .. }
            | InterfaceError::NotFound { correlation_id: id, .. }
            | InterfaceError::ServiceUnavailable { correlation_id: id, .. }
            | InterfaceError::Internal { correlation_id: id, .. } => *id = correlation_id,
        }
        mapped
    }
}

impl From<ApplicationError> for InterfaceError {
    fn from(value: ApplicationError) -> Self {
        let correlation_id = "unassigned".to_owned();
        match value {
            ApplicationError::Pricing(error @ PricingError::NotFound { .. }) => {
                Self::NotFound { message: error.to_string(), correlation_id }
            }
            ApplicationError::Pricing(
                error @ (PricingError::Availability { .. }
                | PricingError::LengthLimitExceeded { .. }
                | PricingError::InvalidLength { .. }
                | PricingError::ArithmeticOverflow { .. }),
            ) => Self::BadRequest { message: error.to_string(), correlation_id },
            ApplicationError::Pricing(
                error @ (PricingError::UnsupportedRule { .. } | PricingError::PriceNotAssigned),
            ) => Self::Internal { message: error.to_string(), correlation_id },
            ApplicationError::Catalog(message) => {
                Self::ServiceUnavailable { message, correlation_id }
            }
            ApplicationError::Configuration(message) => Self::Internal { message, correlation_id },
        }
    }
}
