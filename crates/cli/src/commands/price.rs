use chrono::{DateTime, Utc};
use clap::Args;
use rust_decimal::Decimal;
use sensorquote_core::cpq::{
    price_selected_options, OptionPriceBreakdown, PricingTraceStep, SelectedOption,
};
use sensorquote_core::errors::PricingError;
use sensorquote_core::{
    OptionSpecs, PriceModel, PricingCalculator, PricingEngine, PricingRequest,
};
use serde::Serialize;
use tracing::info;

use super::{CommandResult, Invocation};

const COMMAND: &str = "price";

#[derive(Clone, Debug, Default, Args)]
pub struct PriceArgs {
    #[arg(long, help = "Catalog product instance id, e.g. F1-S-115")]
    pub product: String,
    #[arg(long, help = "Sensor length in inches (defaults to the product's base length)")]
    pub length: Option<Decimal>,
    #[arg(long, help = "Material code overriding the product default")]
    pub material: Option<String>,
    #[arg(
        long = "option",
        value_name = "KEY=VALUE",
        value_parser = parse_option_spec,
        help = "Selected option value, e.g. connection_type=Flange (repeatable)"
    )]
    pub options: Vec<(String, String)>,
    #[arg(
        long = "addon",
        value_name = "NAME=BASE[:MODEL]",
        value_parser = parse_addon,
        help = "Add-on priced at the effective length, e.g. heat_trace=1.50:per_inch (repeatable)"
    )]
    pub addons: Vec<SelectedOption>,
    #[arg(long, help = "Include per-stage price contributions in the payload")]
    pub trace: bool,
}

#[derive(Debug, Serialize)]
struct PricedSelection {
    product_id: String,
    material: String,
    length: Decimal,
    price: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    addons: Option<OptionPriceBreakdown>,
    total: Decimal,
    priced_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    trace: Option<Vec<PricingTraceStep>>,
}

pub fn run(args: &PriceArgs, invocation: &Invocation) -> CommandResult {
    let config = match invocation.load_config(COMMAND) {
        Ok(config) => config,
        Err(result) => return result,
    };
    let catalog = match invocation.load_catalog(COMMAND, &config) {
        Ok(catalog) => catalog,
        Err(result) => return result,
    };

    let engine = PricingCalculator::new(catalog, &config.pricing);
    let request = build_request(args);

    let selection = engine.price(&request).and_then(|result| {
        let addons = price_selected_options(&args.addons, Some(result.length))?;
        let total = result
            .price
            .checked_add(addons.total)
            .ok_or(PricingError::ArithmeticOverflow { operation: "selection total" })?;
        Ok(PricedSelection {
            product_id: result.product_id.to_string(),
            material: result.material,
            length: result.length,
            price: result.price,
            addons: (!addons.lines.is_empty()).then_some(addons),
            total,
            priced_at: Utc::now(),
            trace: args.trace.then_some(result.trace),
        })
    });

    match selection {
        Ok(selection) => {
            info!(
                event_name = "cli.price.completed",
                correlation_id = %invocation.correlation_id,
                product_id = %selection.product_id,
                material = %selection.material,
                total = %selection.total,
                "selection priced"
            );
            CommandResult::success_with_data(
                COMMAND,
                format!("{} priced at {}", selection.product_id, selection.total),
                &selection,
            )
        }
        Err(error) => invocation.reject(COMMAND, error),
    }
}

fn build_request(args: &PriceArgs) -> PricingRequest {
    let options: OptionSpecs = args.options.iter().cloned().collect();
    let mut request = PricingRequest::new(args.product.trim()).with_options(options);
    if let Some(length) = args.length {
        request = request.with_length(length);
    }
    if let Some(material) = &args.material {
        request = request.with_material(material.as_str());
    }
    request
}

pub fn parse_option_spec(raw: &str) -> Result<(String, String), String> {
    let (key, value) =
        raw.split_once('=').ok_or_else(|| format!("expected KEY=VALUE, got `{raw}`"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("option key is empty in `{raw}`"));
    }
    Ok((key.to_string(), value.trim().to_string()))
}

/// Parses `NAME=BASE[:MODEL]`; the model defaults to `fixed`.
pub fn parse_addon(raw: &str) -> Result<SelectedOption, String> {
    let (name, price) = parse_option_spec(raw)?;
    let (base, model) = match price.split_once(':') {
        Some((base, model)) => (base.trim(), PriceModel::from(model)),
        None => (price.as_str(), PriceModel::Fixed),
    };
    let base_price =
        base.parse::<Decimal>().map_err(|error| format!("invalid add-on price `{base}`: {error}"))?;
    Ok(SelectedOption { name, base_price, price_model: model })
}
