use clap::Args;
use rust_decimal::Decimal;
use sensorquote_core::{option_price, PriceModel};
use serde::Serialize;

use super::{CommandResult, Invocation};

const COMMAND: &str = "option-price";

#[derive(Clone, Debug, Default, Args)]
pub struct OptionPriceArgs {
    #[arg(long, help = "Option base price")]
    pub base: Decimal,
    #[arg(long, default_value = "fixed", help = "Price model: fixed, per_inch or per_foot")]
    pub model: String,
    #[arg(long, help = "Sensor length in inches for length-scaled models")]
    pub length: Option<Decimal>,
}

#[derive(Debug, Serialize)]
struct OptionQuote {
    base_price: Decimal,
    price_model: PriceModel,
    length: Option<Decimal>,
    price: Decimal,
}

pub fn run(args: &OptionPriceArgs, invocation: &Invocation) -> CommandResult {
    let model = PriceModel::from(args.model.as_str());
    let price = match option_price(args.base, &model, args.length) {
        Ok(price) => price,
        Err(error) => return invocation.reject(COMMAND, error),
    };

    let quote =
        OptionQuote { base_price: args.base, price_model: model, length: args.length, price };
    CommandResult::success_with_data(
        COMMAND,
        format!("option priced at {} ({})", quote.price, quote.price_model.as_str()),
        &quote,
    )
}
