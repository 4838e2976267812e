pub mod config;
pub mod cpq;
pub mod domain;
pub mod errors;

pub use cpq::{
    option_price, CatalogLookup, InMemoryCatalog, OptionSpecs, PricingCalculator, PricingEngine,
    PricingRequest, PricingResult,
};
pub use domain::connection::{ConnectionPriceEntry, ConnectionSpec};
pub use domain::material::MaterialDefinition;
pub use domain::option::{OptionDefinition, PriceModel};
pub use domain::product::{ModelFamily, ProductId, ProductInstance};
pub use domain::rules::{AdderType, LengthAdderRule};
pub use errors::{ApplicationError, InterfaceError, PricingError};
