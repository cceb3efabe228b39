//! Offline market commands using the storefront's own rate table.

use indecisive_wear_core::{Market, Price};

use super::CommandError;

/// Print every supported market.
#[allow(clippy::print_stdout)]
pub fn list() {
    for market in Market::all() {
        println!(
            "{:<4} {:<16} {:<3} {} ({})",
            market.id,
            market.name,
            market.country_code,
            market.currency.code(),
            market.locale.tag()
        );
    }
}

/// Format `amount` in `currency` as it would display in `market_id`.
///
/// # Errors
///
/// Returns an error for an unknown market, currency or malformed amount.
pub fn converted_text(amount: &str, currency: &str, market_id: &str) -> Result<String, CommandError> {
    let market =
        Market::find(market_id).ok_or_else(|| CommandError::UnknownMarket(market_id.to_string()))?;
    let price = Price::parse(amount, currency)
        .map_err(|e| CommandError::InvalidAmount(e.to_string()))?;
    let display = market.display_price(price);
    Ok(if display.approximate {
        format!("{} (approximate)", display.text)
    } else {
        display.text
    })
}

/// Print a converted price.
///
/// # Errors
///
/// Returns an error for an unknown market, currency or malformed amount.
#[allow(clippy::print_stdout)]
pub fn convert(amount: &str, currency: &str, market_id: &str) -> Result<(), CommandError> {
    println!("{}", converted_text(amount, currency, market_id)?);
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_same_currency_is_exact() {
        assert_eq!(converted_text("48", "USD", "us").unwrap(), "$48.00");
    }

    #[test]
    fn test_other_currency_is_approximate() {
        assert!(
            converted_text("48", "USD", "gb")
                .unwrap()
                .ends_with("(approximate)")
        );
    }

    #[test]
    fn test_rejects_bad_input() {
        assert!(matches!(
            converted_text("48", "USD", "mars"),
            Err(CommandError::UnknownMarket(_))
        ));
        assert!(matches!(
            converted_text("lots", "USD", "us"),
            Err(CommandError::InvalidAmount(_))
        ));
        assert!(matches!(
            converted_text("48", "XXX", "us"),
            Err(CommandError::InvalidAmount(_))
        ));
    }
}
