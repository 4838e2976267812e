use std::path::PathBuf;

use sensorquote_core::PricingCalculator;
use serde::Serialize;
use tracing::info;

use super::{CommandResult, Invocation};

const COMMAND: &str = "catalog-check";

#[derive(Debug, Serialize)]
struct CatalogSummary {
    path: PathBuf,
    products: usize,
    materials: usize,
    families: usize,
    pipeline: Vec<&'static str>,
}

pub fn run(invocation: &Invocation) -> CommandResult {
    let config = match invocation.load_config(COMMAND) {
        Ok(config) => config,
        Err(result) => return result,
    };
    let catalog = match invocation.load_catalog(COMMAND, &config) {
        Ok(catalog) => catalog,
        Err(result) => return result,
    };

    let engine = PricingCalculator::new(catalog, &config.pricing);
    let summary = CatalogSummary {
        path: config.catalog.path,
        products: engine.catalog().product_count(),
        materials: engine.catalog().material_count(),
        families: engine.catalog().family_count(),
        pipeline: engine.strategy_names(),
    };
    info!(
        event_name = "cli.catalog.validated",
        correlation_id = %invocation.correlation_id,
        products = summary.products,
        materials = summary.materials,
        "catalog validated"
    );
    CommandResult::success_with_data(
        COMMAND,
        format!(
            "catalog `{}` is valid: {} products, {} materials, {} option families",
            summary.path.display(),
            summary.products,
            summary.materials,
            summary.families
        ),
        &summary,
    )
}
