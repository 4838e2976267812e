use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{
    catalog::CatalogLookup,
    context::{PricingContext, PricingRequest, PricingTraceStep},
    strategies::{default_strategies, PricingStrategy},
};
use crate::config::PricingConfig;
use crate::domain::product::ProductId;
use crate::errors::PricingError;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingResult {
    pub product_id: ProductId,
    pub material: String,
    pub length: Decimal,
    pub price: Decimal,
    pub trace: Vec<PricingTraceStep>,
}

pub trait PricingEngine: Send + Sync {
    fn price(&self, request: &PricingRequest) -> Result<PricingResult, PricingError>;
}

/// Runs an ordered strategy pipeline against one catalog.
pub struct PricingCalculator<C> {
    catalog: C,
    strategies: Vec<Box<dyn PricingStrategy>>,
}

impl<C: CatalogLookup> PricingCalculator<C> {
    pub fn new(catalog: C, config: &PricingConfig) -> Self {
        Self::with_strategies(catalog, default_strategies(config))
    }

    pub fn with_strategies(catalog: C, strategies: Vec<Box<dyn PricingStrategy>>) -> Self {
        Self { catalog, strategies }
    }

    pub fn catalog(&self) -> &C {
        &self.catalog
    }

    pub fn strategy_names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|strategy| strategy.name()).collect()
    }

    pub fn calculate(&self, request: &PricingRequest) -> Result<Decimal, PricingError> {
        self.calculate_with_trace(request).map(|result| result.price)
    }

    pub fn calculate_with_trace(
        &self,
        request: &PricingRequest,
    ) -> Result<PricingResult, PricingError> {
        self.run(request).map_err(|error| {
            warn!(
                event_name = "pricing.rejected",
                product_id = %request.product_id,
                error = %error,
                "pricing request rejected"
            );
            error
        })
    }

    fn run(&self, request: &PricingRequest) -> Result<PricingResult, PricingError> {
        let mut context = PricingContext::build(&self.catalog, request)?;

        for strategy in &self.strategies {
            context = strategy.apply(context, &self.catalog)?;
            debug!(
                event_name = "pricing.strategy.applied",
                strategy = strategy.name(),
                product_id = %request.product_id,
                price = ?context.price,
                "pricing strategy applied"
            );
        }

        let price = context.price.ok_or(PricingError::PriceNotAssigned)?;
        Ok(PricingResult {
            product_id: context.product.id,
            material: context.material.code,
            length: context.length,
            price,
            trace: context.trace,
        })
    }
}

impl<C: CatalogLookup> PricingEngine for PricingCalculator<C> {
    fn price(&self, request: &PricingRequest) -> Result<PricingResult, PricingError> {
        self.calculate_with_trace(request)
    }
}
