use clap::Args;
use rust_decimal::Decimal;
use sensorquote_core::{CatalogLookup, ConnectionSpec};
use serde::Serialize;
use tracing::debug;

use super::{CommandResult, Invocation};

const COMMAND: &str = "connection-price";

#[derive(Clone, Debug, Default, Args)]
pub struct ConnectionPriceArgs {
    #[arg(long = "type", help = "Connection type: Flange, Tri-Clamp, or any other label")]
    pub connection_type: String,
    #[arg(long, help = "Flange pressure rating, e.g. 150#")]
    pub rating: Option<String>,
    #[arg(long, help = "Connection size, e.g. 2 or 1.5")]
    pub size: Option<String>,
}

#[derive(Debug, Serialize)]
struct ConnectionQuote {
    connection: ConnectionSpec,
    listed: bool,
    price: Decimal,
}

/// Looks a connection up in the flat price table. Connections that are not
/// listed, or not priced at all, quote zero.
pub fn run(args: &ConnectionPriceArgs, invocation: &Invocation) -> CommandResult {
    let config = match invocation.load_config(COMMAND) {
        Ok(config) => config,
        Err(result) => return result,
    };
    let catalog = match invocation.load_catalog(COMMAND, &config) {
        Ok(catalog) => catalog,
        Err(result) => return result,
    };

    let connection = ConnectionSpec::from_parts(
        &args.connection_type,
        args.rating.as_deref(),
        args.size.as_deref(),
    );
    let listed_price = catalog.connection_price(&connection);
    if listed_price.is_none() {
        debug!(
            event_name = "cli.connection_price.unlisted",
            correlation_id = %invocation.correlation_id,
            connection = ?connection,
            "connection has no table price"
        );
    }

    let quote = ConnectionQuote {
        listed: listed_price.is_some(),
        price: listed_price.unwrap_or(Decimal::ZERO),
        connection,
    };
    let message = if quote.listed {
        format!("connection priced at {}", quote.price)
    } else if quote.connection.is_priced() {
        "connection is not listed in the price table".to_string()
    } else {
        format!("connection type `{}` carries no price", args.connection_type.trim())
    };
    CommandResult::success_with_data(COMMAND, message, &quote)
}
