use rust_decimal::Decimal;

/// Monetary amount in the restaurant's currency
pub type Amount = Decimal;

/// Render an amount rounded half away from zero to two decimal places.
pub fn format_amount(amount: Amount) -> String {
    let rounded = amount.round_dp_with_strategy(2, rust_decimal::RoundingStrategy::MidpointAwayFromZero);
    format!("{:.2}", rounded)
}
