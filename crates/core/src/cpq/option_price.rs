use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::{option::PriceModel, rules::INCHES_PER_FOOT};
use crate::errors::PricingError;

/// Price contribution of one add-on option.
///
/// Length-scaled models without a length, and unrecognised models, fall back
/// to the fixed price.
pub fn option_price(
    base: Decimal,
    model: &PriceModel,
    length: Option<Decimal>,
) -> Result<Decimal, PricingError> {
    match (model, length) {
        (PriceModel::PerInch, Some(length)) => base
            .checked_mul(length)
            .ok_or(PricingError::ArithmeticOverflow { operation: "per-inch option price" }),
        (PriceModel::PerFoot, Some(length)) => length
            .checked_div(INCHES_PER_FOOT)
            .and_then(|feet| base.checked_mul(feet))
            .ok_or(PricingError::ArithmeticOverflow { operation: "per-foot option price" }),
        (PriceModel::Unrecognized(value), _) => {
            debug!(
                event_name = "pricing.option.unrecognized_model",
                price_model = %value,
                "pricing option with unrecognized model as fixed"
            );
            Ok(base)
        }
        _ => Ok(base),
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectedOption {
    pub name: String,
    pub base_price: Decimal,
    pub price_model: PriceModel,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionPriceLine {
    pub name: String,
    pub price_model: PriceModel,
    pub price: Decimal,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionPriceBreakdown {
    pub lines: Vec<OptionPriceLine>,
    pub total: Decimal,
}

/// Prices each selected add-on at `length` and totals them.
pub fn price_selected_options(
    options: &[SelectedOption],
    length: Option<Decimal>,
) -> Result<OptionPriceBreakdown, PricingError> {
    let mut breakdown = OptionPriceBreakdown::default();
    for option in options {
        let price = option_price(option.base_price, &option.price_model, length)?;
        breakdown.total = breakdown
            .total
            .checked_add(price)
            .ok_or(PricingError::ArithmeticOverflow { operation: "add-on option total" })?;
        breakdown.lines.push(OptionPriceLine {
            name: option.name.clone(),
            price_model: option.price_model.clone(),
            price,
        });
    }
    Ok(breakdown)
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::{option_price, price_selected_options, SelectedOption};
    use crate::domain::option::PriceModel;
    use crate::errors::PricingError;

    fn dec(value: &str) -> Decimal {
        value.parse().expect("decimal literal")
    }

    #[test]
    fn fixed_price_ignores_length() {
        for length in [None, Some(dec("0")), Some(dec("10")), Some(dec("97.25"))] {
            assert_eq!(option_price(dec("45.00"), &PriceModel::Fixed, length), Ok(dec("45.00")));
        }
    }

    #[test]
    fn per_inch_multiplies_by_length() {
        assert_eq!(option_price(dec("2.5"), &PriceModel::PerInch, Some(dec("18"))), Ok(dec("45")));
        assert_eq!(option_price(dec("2.5"), &PriceModel::PerInch, None), Ok(dec("2.5")));
    }

    #[test]
    fn per_foot_multiplies_by_length_in_feet() {
        assert_eq!(option_price(dec("12"), &PriceModel::PerFoot, Some(dec("30"))), Ok(dec("30")));
        assert_eq!(option_price(dec("8"), &PriceModel::PerFoot, Some(dec("24"))), Ok(dec("16")));
        assert_eq!(option_price(dec("8"), &PriceModel::PerFoot, None), Ok(dec("8")));
    }

    #[test]
    fn unknown_model_behaves_like_fixed() {
        let unknown = PriceModel::from("per_meter");
        for length in [None, Some(dec("24"))] {
            assert_eq!(
                option_price(dec("19.99"), &unknown, length),
                option_price(dec("19.99"), &PriceModel::Fixed, length)
            );
        }
    }

    #[test]
    fn length_scaled_price_past_decimal_range_is_an_error() {
        assert_eq!(
            option_price(Decimal::MAX, &PriceModel::PerInch, Some(dec("2"))),
            Err(PricingError::ArithmeticOverflow { operation: "per-inch option price" })
        );
        assert_eq!(
            option_price(Decimal::MAX, &PriceModel::PerFoot, Some(dec("48"))),
            Err(PricingError::ArithmeticOverflow { operation: "per-foot option price" })
        );
        assert_eq!(
            option_price(Decimal::MAX, &PriceModel::Fixed, Some(dec("48"))),
            Ok(Decimal::MAX)
        );
    }

    #[test]
    fn selected_options_are_summed_with_breakdown() {
        let options = vec![
            SelectedOption {
                name: "Explosion-proof housing".to_string(),
                base_price: dec("185"),
                price_model: PriceModel::Fixed,
            },
            SelectedOption {
                name: "Heat trace".to_string(),
                base_price: dec("1.50"),
                price_model: PriceModel::PerInch,
            },
            SelectedOption {
                name: "Armored cable".to_string(),
                base_price: dec("6"),
                price_model: PriceModel::PerFoot,
            },
        ];

        let breakdown = price_selected_options(&options, Some(dec("24"))).expect("priced");
        let prices: Vec<_> = breakdown.lines.iter().map(|line| line.price).collect();
        assert_eq!(prices, vec![dec("185"), dec("36"), dec("12")]);
        assert_eq!(breakdown.total, dec("233"));

        let without_length = price_selected_options(&options, None).expect("priced");
        assert_eq!(without_length.total, dec("192.50"));
    }

    #[test]
    fn selected_options_total_overflow_is_an_error() {
        let option = SelectedOption {
            name: "Calibration".to_string(),
            base_price: Decimal::MAX,
            price_model: PriceModel::Fixed,
        };

        let error = price_selected_options(&[option.clone(), option], None).expect_err("overflow");
        assert_eq!(error, PricingError::ArithmeticOverflow { operation: "add-on option total" });
    }
}
