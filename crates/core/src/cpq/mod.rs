pub mod catalog;
pub mod context;
pub mod option_price;
pub mod pricing;
pub mod strategies;

pub use catalog::{CatalogError, CatalogLookup, CatalogSnapshot, InMemoryCatalog};
pub use context::{OptionSpecs, PricingContext, PricingRequest, PricingTraceStep};
pub use option_price::{
    option_price, price_selected_options, OptionPriceBreakdown, OptionPriceLine, SelectedOption,
};
pub use pricing::{PricingCalculator, PricingEngine, PricingResult};
pub use strategies::{
    default_strategies, BasePriceStrategy, ConnectionOptionStrategy, ExtraLengthStrategy,
    MaterialAvailabilityStrategy, MaterialPremiumStrategy, NonStandardLengthSurchargeStrategy,
    PricingStrategy,
};
