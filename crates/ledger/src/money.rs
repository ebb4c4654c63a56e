//! Pure conversions between integer cents, decimal amounts, and display
//! strings.
//!
//! The ledger stores **integer cents** only; decimals exist at the
//! presentation edge. All midpoint rounding here is half-away-from-zero,
//! matching how the converted amounts are shown to users.

use rust_decimal::{Decimal, RoundingStrategy, prelude::ToPrimitive};

/// Converts integer cents to a decimal amount with 2 fraction digits.
#[must_use]
pub fn cents_to_decimal(cents: u64) -> Decimal {
    (Decimal::from(cents) / Decimal::ONE_HUNDRED).round_dp(2)
}

/// Converts a decimal amount to integer cents, rounding half-away-from-zero.
///
/// The storage type is unsigned, so results below zero clamp to 0.
#[must_use]
pub fn decimal_to_cents(amount: Decimal) -> u64 {
    (amount * Decimal::ONE_HUNDRED)
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_u64()
        .unwrap_or(0)
}

/// Applies an exchange rate (target units per USD) to a cent amount.
///
/// `convert_cents(10_000, 1.2345)` is 123.45 in the target currency.
#[must_use]
pub fn convert_cents(cents: u64, exchange_rate: Decimal) -> Decimal {
    (exchange_rate * Decimal::from(cents) / Decimal::ONE_HUNDRED)
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Formats a decimal amount as a currency string with thousands grouping,
/// e.g. `$1,234.56`.
#[must_use]
pub fn decimal_to_currency_string(amount: Decimal) -> String {
    let rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    let sign = if rounded.is_sign_negative() { "-" } else { "" };
    let text = format!("{:.2}", rounded.abs());
    let (units, cents) = text.split_once('.').unwrap_or((text.as_str(), "00"));

    let mut grouped = String::with_capacity(units.len() + units.len() / 3);
    for (i, digit) in units.chars().enumerate() {
        if i > 0 && (units.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    format!("{sign}${grouped}.{cents}")
}

/// Formats integer cents as a currency string.
#[must_use]
pub fn cents_to_currency_string(cents: u64) -> String {
    decimal_to_currency_string(cents_to_decimal(cents))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn cents_decimal_round_trip() {
        for cents in [0u64, 1, 99, 100, 101, 12_345, 1_000_000] {
            assert_eq!(decimal_to_cents(cents_to_decimal(cents)), cents);
        }
    }

    #[test]
    fn decimal_to_cents_rounds_half_away_from_zero() {
        assert_eq!(decimal_to_cents(dec("10.005")), 1001);
        assert_eq!(decimal_to_cents(dec("10.004")), 1000);
        assert_eq!(decimal_to_cents(dec("0.995")), 100);
        assert_eq!(decimal_to_cents(dec("-1.00")), 0);
    }

    #[test]
    fn convert_applies_rate_and_rounds() {
        assert_eq!(convert_cents(10_000, dec("1.2345")), dec("123.45"));
        assert_eq!(convert_cents(199, dec("0.5")), dec("1.00"));
        assert_eq!(convert_cents(0, dec("7.1")), dec("0.00"));
    }

    #[test]
    fn currency_string_groups_thousands() {
        assert_eq!(cents_to_currency_string(0), "$0.00");
        assert_eq!(cents_to_currency_string(35), "$0.35");
        assert_eq!(cents_to_currency_string(123_456), "$1,234.56");
        assert_eq!(cents_to_currency_string(100_000_000), "$1,000,000.00");
        assert_eq!(decimal_to_currency_string(dec("-12.5")), "-$12.50");
    }
}
