use std::collections::BTreeSet;

use tracing::{debug, warn};

use super::{catalog::CatalogLookup, context::PricingContext};
use crate::config::{CoatedLengthConfig, PricingConfig, RulePolicy};
use crate::domain::{
    option::{CONNECTION_OPTION, MATERIAL_OPTION},
    rules::AdderType,
};
use crate::errors::PricingError;

/// One business rule of the pricing pipeline. Takes the context by value and
/// returns it updated, or fails the whole calculation.
pub trait PricingStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    fn apply(
        &self,
        context: PricingContext,
        catalog: &dyn CatalogLookup,
    ) -> Result<PricingContext, PricingError>;
}

/// The six strategies in their required order.
pub fn default_strategies(config: &PricingConfig) -> Vec<Box<dyn PricingStrategy>> {
    vec![
        Box::new(MaterialAvailabilityStrategy) as Box<dyn PricingStrategy>,
        Box::new(BasePriceStrategy::new(
            config.derived_pricing_materials.iter().cloned(),
            config.stock_grade_material.clone(),
        )),
        Box::new(MaterialPremiumStrategy),
        Box::new(ExtraLengthStrategy::new(config.rule_policy)),
        Box::new(NonStandardLengthSurchargeStrategy::new(config.coated_length.clone())),
        Box::new(ConnectionOptionStrategy),
    ]
}

/// Rejects a material override that the product family does not offer.
/// Without an override the product's default material is always accepted.
#[derive(Clone, Copy, Debug, Default)]
pub struct MaterialAvailabilityStrategy;

impl PricingStrategy for MaterialAvailabilityStrategy {
    fn name(&self) -> &'static str {
        "material_availability"
    }

    fn apply(
        &self,
        context: PricingContext,
        catalog: &dyn CatalogLookup,
    ) -> Result<PricingContext, PricingError> {
        let Some(code) = context.material_override.as_deref() else {
            return Ok(context);
        };

        let family = context.family_key();
        let offered = family.as_deref().and_then(|key| catalog.option(MATERIAL_OPTION, key));
        if offered.is_some_and(|option| option.offers(code)) {
            return Ok(context);
        }

        let family = family.unwrap_or_else(|| context.product.model_number.clone());
        warn!(
            event_name = "pricing.material.unavailable",
            product_id = %context.product.id,
            material = code,
            family = %family,
            option_found = offered.is_some(),
            "material override is not offered for product family"
        );
        Err(PricingError::Availability { material: code.to_string(), family })
    }
}

/// Assigns the starting price. Derived-pricing materials take the base price of
/// the stock-grade variant with the same model number and voltage.
#[derive(Clone, Debug)]
pub struct BasePriceStrategy {
    derived_materials: BTreeSet<String>,
    stock_grade: String,
}

impl BasePriceStrategy {
    pub fn new(
        derived_materials: impl IntoIterator<Item = String>,
        stock_grade: impl Into<String>,
    ) -> Self {
        Self {
            derived_materials: derived_materials.into_iter().collect(),
            stock_grade: stock_grade.into(),
        }
    }
}

impl PricingStrategy for BasePriceStrategy {
    fn name(&self) -> &'static str {
        "base_price"
    }

    fn apply(
        &self,
        context: PricingContext,
        catalog: &dyn CatalogLookup,
    ) -> Result<PricingContext, PricingError> {
        let product = &context.product;

        if !self.derived_materials.contains(&context.material.code) {
            let detail = format!("base price of {}", product.id);
            let amount = product.base_price;
            return Ok(context.assign("base_price", detail, amount));
        }

        let variant = catalog.cross_material_variant(
            &product.model_number,
            &product.voltage,
            &self.stock_grade,
        );
        let (detail, amount) = match variant {
            Some(variant) => (
                format!(
                    "base price of stock-grade variant {} for material {}",
                    variant.id, context.material.code
                ),
                variant.base_price,
            ),
            None => {
                warn!(
                    event_name = "pricing.base_price.stock_variant_missing",
                    product_id = %product.id,
                    model_number = %product.model_number,
                    voltage = %product.voltage,
                    stock_grade = %self.stock_grade,
                    "stock-grade variant not found, using product base price"
                );
                let detail = format!("base price of {} (no stock-grade variant)", product.id);
                (detail, product.base_price)
            }
        };

        Ok(context.assign("base_price", detail, amount))
    }
}

/// Adds the family's `Material` option adder for the resolved material.
#[derive(Clone, Copy, Debug, Default)]
pub struct MaterialPremiumStrategy;

impl PricingStrategy for MaterialPremiumStrategy {
    fn name(&self) -> &'static str {
        "material_premium"
    }

    fn apply(
        &self,
        context: PricingContext,
        catalog: &dyn CatalogLookup,
    ) -> Result<PricingContext, PricingError> {
        let Some(family) = context.family_key() else {
            return Ok(context);
        };

        let premium = catalog
            .option(MATERIAL_OPTION, &family)
            .and_then(|option| option.adder(&context.material.code));
        let Some(amount) = premium else {
            debug!(
                event_name = "pricing.material_premium.none",
                family = %family,
                material = %context.material.code,
                "no material premium configured"
            );
            return Ok(context);
        };

        let detail = format!("material {} premium for family {family}", context.material.code);
        context.add("material_premium", detail, amount)
    }
}

/// Applies the (family, material) length adder rule, if any.
#[derive(Clone, Copy, Debug, Default)]
pub struct ExtraLengthStrategy {
    policy: RulePolicy,
}

impl ExtraLengthStrategy {
    pub fn new(policy: RulePolicy) -> Self {
        Self { policy }
    }
}

impl PricingStrategy for ExtraLengthStrategy {
    fn name(&self) -> &'static str {
        "extra_length"
    }

    fn apply(
        &self,
        context: PricingContext,
        catalog: &dyn CatalogLookup,
    ) -> Result<PricingContext, PricingError> {
        let Some(family) = context.family_key() else {
            return Ok(context);
        };
        let Some(rule) = catalog.length_adder_rule(&family, &context.material.code) else {
            return Ok(context);
        };

        let Some(amount) = rule.adder_for(context.length)? else {
            let value = rule.adder_type.as_str().to_string();
            if self.policy == RulePolicy::Strict {
                return Err(PricingError::UnsupportedRule { rule: "length adder type", value });
            }
            warn!(
                event_name = "pricing.extra_length.unrecognized_rule",
                family = %family,
                material = %context.material.code,
                adder_type = %value,
                "skipping length adder rule with unrecognized type"
            );
            return Ok(context);
        };

        if amount.is_zero() {
            return Ok(context);
        }

        let detail = match rule.adder_type {
            AdderType::PerFoot => format!(
                "{} per foot band from {} at length {}",
                rule.adder_amount, rule.first_threshold, context.length
            ),
            _ => format!(
                "{} per inch over {} at length {}",
                rule.adder_amount, rule.first_threshold, context.length
            ),
        };
        context.add("extra_length", detail, amount)
    }
}

/// Standard-length rule for the coated material. Other materials pass through.
#[derive(Clone, Debug)]
pub struct NonStandardLengthSurchargeStrategy {
    rule: CoatedLengthConfig,
}

impl NonStandardLengthSurchargeStrategy {
    pub fn new(rule: CoatedLengthConfig) -> Self {
        Self { rule }
    }
}

impl PricingStrategy for NonStandardLengthSurchargeStrategy {
    fn name(&self) -> &'static str {
        "nonstandard_length_surcharge"
    }

    fn apply(
        &self,
        context: PricingContext,
        _catalog: &dyn CatalogLookup,
    ) -> Result<PricingContext, PricingError> {
        if context.material.code != self.rule.material {
            return Ok(context);
        }

        if context.length > self.rule.max_length {
            return Err(PricingError::LengthLimitExceeded {
                material: context.material.code.clone(),
                length: context.length,
                limit: self.rule.max_length,
                guidance: format!(
                    "Use material `{}` for lengths over {}.",
                    self.rule.alternative_material, self.rule.max_length
                ),
            });
        }

        if self.rule.standard_lengths.contains(&context.length) {
            return Ok(context);
        }

        let detail = format!(
            "non-standard length {} for material {}",
            context.length, context.material.code
        );
        let surcharge = self.rule.surcharge;
        context.add("nonstandard_length_surcharge", detail, surcharge)
    }
}

/// Adds the family's `Connection` option adder for a flange or tri-clamp selection.
#[derive(Clone, Copy, Debug, Default)]
pub struct ConnectionOptionStrategy;

impl PricingStrategy for ConnectionOptionStrategy {
    fn name(&self) -> &'static str {
        "connection_option"
    }

    fn apply(
        &self,
        context: PricingContext,
        catalog: &dyn CatalogLookup,
    ) -> Result<PricingContext, PricingError> {
        let Some(connection) = context.options.connection() else {
            return Ok(context);
        };
        let Some(key) = connection.adder_key() else {
            debug!(
                event_name = "pricing.connection.unpriced_type",
                connection = ?connection,
                "connection type carries no adder"
            );
            return Ok(context);
        };
        let Some(family) = context.family_key() else {
            return Ok(context);
        };

        let adder =
            catalog.option(CONNECTION_OPTION, &family).and_then(|option| option.adder(&key));
        let Some(amount) = adder else {
            debug!(
                event_name = "pricing.connection.no_adder",
                family = %family,
                key = %key,
                "no connection adder configured"
            );
            return Ok(context);
        };

        context.add("connection_option", format!("connection {key}"), amount)
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::{
        default_strategies, BasePriceStrategy, ConnectionOptionStrategy, ExtraLengthStrategy,
        MaterialAvailabilityStrategy, MaterialPremiumStrategy, NonStandardLengthSurchargeStrategy,
        PricingStrategy,
    };
    use crate::config::{CoatedLengthConfig, PricingConfig, RulePolicy};
    use crate::cpq::catalog::{fixtures, InMemoryCatalog};
    use crate::cpq::context::{OptionSpecs, PricingContext, PricingRequest};
    use crate::errors::PricingError;

    fn dec(value: &str) -> Decimal {
        fixtures::dec(value)
    }

    fn context(catalog: &InMemoryCatalog, request: PricingRequest) -> PricingContext {
        PricingContext::build(catalog, &request).expect("context builds")
    }

    fn priced(catalog: &InMemoryCatalog, request: PricingRequest, price: &str) -> PricingContext {
        let context = context(catalog, request);
        context.assign("base_price", "test baseline", dec(price))
    }

    #[test]
    fn default_pipeline_order_is_fixed() {
        let names: Vec<_> =
            default_strategies(&PricingConfig::default()).iter().map(|s| s.name()).collect();
        assert_eq!(
            names,
            vec![
                "material_availability",
                "base_price",
                "material_premium",
                "extra_length",
                "nonstandard_length_surcharge",
                "connection_option",
            ]
        );
    }

    #[test]
    fn availability_passes_without_override() {
        let catalog = fixtures::catalog();
        // F3 has no Material option at all; the default material is still accepted.
        let context = context(&catalog, PricingRequest::new("F3-S-115"));
        let result = MaterialAvailabilityStrategy.apply(context.clone(), &catalog);
        assert_eq!(result, Ok(context));
    }

    #[test]
    fn availability_accepts_offered_override_without_pricing() {
        let catalog = fixtures::catalog();
        let context = context(&catalog, PricingRequest::new("F1-S-115").with_material("H"));

        let context = MaterialAvailabilityStrategy.apply(context, &catalog).expect("available");
        assert_eq!(context.price, None);
        assert!(context.trace.is_empty());
    }

    #[test]
    fn availability_rejects_override_missing_from_family_choices() {
        let catalog = fixtures::catalog();
        let context = context(&catalog, PricingRequest::new("F1/2-S-115").with_material("U"));
        assert_eq!(context.price, None);

        let error = MaterialAvailabilityStrategy.apply(context, &catalog).expect_err("rejected");
        assert_eq!(
            error,
            PricingError::Availability { material: "U".to_string(), family: "F1/2".to_string() }
        );
    }

    #[test]
    fn availability_rejects_override_when_family_has_no_material_option() {
        let catalog = fixtures::catalog();
        let context = context(&catalog, PricingRequest::new("F3-S-115").with_material("S"));

        let error = MaterialAvailabilityStrategy.apply(context, &catalog).expect_err("rejected");
        assert_eq!(
            error,
            PricingError::Availability { material: "S".to_string(), family: "F3".to_string() }
        );
    }

    #[test]
    fn base_price_resets_running_price() {
        let catalog = fixtures::catalog();
        let context = priced(&catalog, PricingRequest::new("F1-S-115"), "9999");

        let strategy = BasePriceStrategy::new(["U".to_string()], "S");
        let context = strategy.apply(context, &catalog).expect("priced");
        assert_eq!(context.price, Some(dec("500")));
    }

    #[test]
    fn derived_material_uses_stock_grade_variant_price() {
        let catalog = fixtures::catalog();
        let context = context(&catalog, PricingRequest::new("F1-U-24"));

        let strategy = BasePriceStrategy::new(["U".to_string(), "T".to_string()], "S");
        let context = strategy.apply(context, &catalog).expect("priced");
        assert_eq!(context.price, Some(dec("540")));
        assert!(context.trace[0].detail.contains("F1-S-24"));
    }

    #[test]
    fn derived_material_falls_back_to_own_price_without_stock_variant() {
        let catalog = fixtures::catalog();
        let context = context(&catalog, PricingRequest::new("F1-U-24"));

        let strategy = BasePriceStrategy::new(["U".to_string()], "Z");
        let context = strategy.apply(context, &catalog).expect("priced");
        assert_eq!(context.price, Some(Decimal::ZERO));
    }

    #[test]
    fn material_premium_adds_family_adder() {
        let catalog = fixtures::catalog();
        let context = priced(&catalog, PricingRequest::new("F1-S-115").with_material("H"), "500");

        let context = MaterialPremiumStrategy.apply(context, &catalog).expect("premium");
        assert_eq!(context.price, Some(dec("610")));
    }

    #[test]
    fn missing_material_premium_is_zero() {
        let catalog = fixtures::catalog();

        let context = priced(&catalog, PricingRequest::new("F1-S-115"), "500");
        let context = MaterialPremiumStrategy.apply(context, &catalog).expect("no adder");
        assert_eq!(context.price, Some(dec("500")));

        let context = priced(&catalog, PricingRequest::new("F3-S-115"), "410");
        let context = MaterialPremiumStrategy.apply(context, &catalog).expect("no option");
        assert_eq!(context.price, Some(dec("410")));
        assert_eq!(context.trace.len(), 1);
    }

    #[test]
    fn per_inch_length_adder_applies_past_threshold() {
        let catalog = fixtures::catalog();
        let strategy = ExtraLengthStrategy::new(RulePolicy::Lenient);

        let at_threshold = priced(&catalog, PricingRequest::new("F1-S-115"), "500");
        let at_threshold = strategy.apply(at_threshold, &catalog).expect("applied");
        assert_eq!(at_threshold.price, Some(dec("500")));

        let long = priced(&catalog, PricingRequest::new("F1-S-115").with_length(dec("24")), "500");
        let long = strategy.apply(long, &catalog).expect("applied");
        assert_eq!(long.price, Some(dec("552.5")));
    }

    #[test]
    fn per_foot_length_adder_is_banded() {
        let catalog = fixtures::catalog();
        let strategy = ExtraLengthStrategy::new(RulePolicy::Lenient);
        let price_at = |length: &str| {
            let request =
                PricingRequest::new("F1-S-115").with_material("H").with_length(dec(length));
            let context = priced(&catalog, request, "0");
            strategy.apply(context, &catalog).expect("applied").price_or_zero()
        };

        assert_eq!(price_at("12"), Decimal::ZERO);
        assert_eq!(price_at("24"), dec("40"));
        assert_eq!(price_at("24.5"), dec("80"));
        assert_eq!(price_at("36"), dec("80"));
        assert_eq!(price_at("48"), dec("120"));
    }

    #[test]
    fn unrecognised_length_rule_is_skipped_when_lenient() {
        let catalog = fixtures::catalog();
        let request = PricingRequest::new("F1/2-S-115").with_length(dec("40"));
        let context = priced(&catalog, request, "620");

        let context = ExtraLengthStrategy::new(RulePolicy::Lenient)
            .apply(context, &catalog)
            .expect("skipped");
        assert_eq!(context.price, Some(dec("620")));
    }

    #[test]
    fn unrecognised_length_rule_is_rejected_when_strict() {
        let catalog = fixtures::catalog();
        let request = PricingRequest::new("F1/2-S-115").with_length(dec("40"));
        let context = priced(&catalog, request, "620");

        let error = ExtraLengthStrategy::new(RulePolicy::Strict)
            .apply(context, &catalog)
            .expect_err("strict");
        assert_eq!(
            error,
            PricingError::UnsupportedRule {
                rule: "length adder type",
                value: "per_meter".to_string()
            }
        );
    }

    #[test]
    fn coated_standard_lengths_carry_no_surcharge() {
        let catalog = fixtures::catalog();
        let strategy = NonStandardLengthSurchargeStrategy::new(CoatedLengthConfig::default());

        for length in ["6", "10", "12", "18", "24", "36", "48", "60", "72", "84", "96"] {
            let request =
                PricingRequest::new("F1-S-115").with_material("H").with_length(dec(length));
            let context = priced(&catalog, request, "500");
            let context = strategy.apply(context, &catalog).expect("standard length");
            assert_eq!(context.price, Some(dec("500")), "length {length}");
        }
    }

    #[test]
    fn coated_nonstandard_length_pays_surcharge() {
        let catalog = fixtures::catalog();
        let strategy = NonStandardLengthSurchargeStrategy::new(CoatedLengthConfig::default());

        let request = PricingRequest::new("F1-S-115").with_material("H").with_length(dec("30"));
        let context =
            strategy.apply(priced(&catalog, request, "500"), &catalog).expect("surcharge");
        assert_eq!(context.price, Some(dec("650")));
    }

    #[test]
    fn coated_length_over_ceiling_is_rejected_with_guidance() {
        let catalog = fixtures::catalog();
        let strategy = NonStandardLengthSurchargeStrategy::new(CoatedLengthConfig::default());

        for length in ["96.5", "100", "120"] {
            let request =
                PricingRequest::new("F1-S-115").with_material("H").with_length(dec(length));
            let error =
                strategy.apply(priced(&catalog, request, "500"), &catalog).expect_err("limit");
            match error {
                PricingError::LengthLimitExceeded { material, limit, guidance, .. } => {
                    assert_eq!(material, "H");
                    assert_eq!(limit, dec("96"));
                    assert!(guidance.contains("`S`"));
                }
                other => panic!("unexpected error: {other}"),
            }
        }
    }

    #[test]
    fn other_materials_skip_coated_rule() {
        let catalog = fixtures::catalog();
        let strategy = NonStandardLengthSurchargeStrategy::new(CoatedLengthConfig::default());

        let request = PricingRequest::new("F1-S-115").with_length(dec("130"));
        let context = strategy.apply(priced(&catalog, request, "500"), &catalog).expect("no-op");
        assert_eq!(context.price, Some(dec("500")));
    }

    #[test]
    fn connection_adder_uses_flange_rating_and_size() {
        let catalog = fixtures::catalog();
        let options = OptionSpecs::new()
            .with("connection_type", "Flange")
            .with("flange_rating", "150#")
            .with("flange_size", "2");
        let request = PricingRequest::new("F1-S-115").with_options(options);
        let context = priced(&catalog, request, "500");

        let context = ConnectionOptionStrategy.apply(context, &catalog).expect("connection");
        assert_eq!(context.price, Some(dec("542")));
        let detail = context.trace.last().map(|step| step.detail.as_str());
        assert_eq!(detail, Some("connection Flange_150#_2"));
    }

    #[test]
    fn connection_adder_uses_tri_clamp_size() {
        let catalog = fixtures::catalog();
        let options =
            OptionSpecs::new().with("connection_type", "Tri-Clamp").with("tri_clamp_size", "1.5");
        let context =
            priced(&catalog, PricingRequest::new("F1/2-S-115").with_options(options), "620");

        let context = ConnectionOptionStrategy.apply(context, &catalog).expect("connection");
        assert_eq!(context.price, Some(dec("638")));
    }

    #[test]
    fn unpriced_or_unknown_connections_add_nothing() {
        let catalog = fixtures::catalog();
        let cases = [
            OptionSpecs::new(),
            OptionSpecs::new().with("connection_type", "NPT").with("flange_size", "2"),
            OptionSpecs::new()
                .with("connection_type", "Flange")
                .with("flange_rating", "300#")
                .with("flange_size", "2"),
        ];

        for options in cases {
            let context =
                priced(&catalog, PricingRequest::new("F1-S-115").with_options(options), "500");
            let context = ConnectionOptionStrategy.apply(context, &catalog).expect("no-op");
            assert_eq!(context.price, Some(dec("500")));
        }

        let options = OptionSpecs::new()
            .with("connection_type", "Flange")
            .with("flange_rating", "150#")
            .with("flange_size", "2");
        let request = PricingRequest::new("F3-S-115").with_options(options);
        let context = priced(&catalog, request, "410");
        let context = ConnectionOptionStrategy.apply(context, &catalog).expect("no option");
        assert_eq!(context.price, Some(dec("410")));
    }
}
