//! Type-safe price representation using decimal arithmetic.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// A price with currency information.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Price {
    /// Amount in the currency's standard unit (e.g., pesos, not centavos).
    pub amount: Decimal,
    /// ISO 4217 currency code.
    pub currency_code: CurrencyCode,
}

impl Price {
    /// Create a new price.
    #[must_use]
    pub const fn new(amount: Decimal, currency_code: CurrencyCode) -> Self {
        Self {
            amount,
            currency_code,
        }
    }

    /// Create a price in Argentine pesos, the shop's currency.
    #[must_use]
    pub const fn ars(amount: Decimal) -> Self {
        Self::new(amount, CurrencyCode::ARS)
    }

    /// Format for display using the currency's locale conventions.
    ///
    /// ```
    /// use construmax_core::{CurrencyCode, Price};
    /// use rust_decimal::Decimal;
    ///
    /// assert_eq!(Price::ars(Decimal::new(25999, 0)).display(), "$ 25.999,00");
    /// assert_eq!(
    ///     Price::new(Decimal::new(123_456, 2), CurrencyCode::USD).display(),
    ///     "$1,234.56"
    /// );
    /// ```
    #[must_use]
    pub fn display(&self) -> String {
        let rounded = self
            .amount
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
        let mut magnitude = rounded.abs();
        magnitude.rescale(2);
        let text = magnitude.to_string();
        let (whole, fraction) = text.split_once('.').unwrap_or((text.as_str(), "00"));

        let (group_sep, decimal_sep) = self.currency_code.separators();
        let grouped = group_thousands(whole, group_sep);
        let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
            "-"
        } else {
            ""
        };

        format!(
            "{sign}{}{grouped}{decimal_sep}{fraction}",
            self.currency_code.prefix()
        )
    }
}

impl std::fmt::Display for Price {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.display())
    }
}

/// ISO 4217 currency codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CurrencyCode {
    #[default]
    ARS,
    USD,
}

impl CurrencyCode {
    /// Symbol prefix, including the separating space where the locale uses one.
    #[must_use]
    pub const fn prefix(self) -> &'static str {
        match self {
            Self::ARS => "$ ",
            Self::USD => "$",
        }
    }

    /// Three-letter code.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::ARS => "ARS",
            Self::USD => "USD",
        }
    }

    /// `(thousands, decimal)` separators.
    const fn separators(self) -> (char, char) {
        match self {
            // es-AR
            Self::ARS => ('.', ','),
            Self::USD => (',', '.'),
        }
    }
}

fn group_thousands(digits: &str, sep: char) -> String {
    let len = digits.len();
    let mut out = String::with_capacity(len + len / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push(sep);
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_ars_small_amount() {
        assert_eq!(Price::ars(Decimal::new(8999, 0)).display(), "$ 8.999,00");
        assert_eq!(Price::ars(Decimal::new(5, 1)).display(), "$ 0,50");
        assert_eq!(Price::ars(Decimal::ZERO).display(), "$ 0,00");
    }

    #[test]
    fn test_display_ars_millions() {
        assert_eq!(
            Price::ars(Decimal::new(123_456_789, 2)).display(),
            "$ 1.234.567,89"
        );
    }

    #[test]
    fn test_display_rounds_to_cents() {
        assert_eq!(Price::ars(Decimal::new(10_005, 3)).display(), "$ 10,01");
    }

    #[test]
    fn test_display_largest_amount() {
        assert_eq!(
            Price::ars(Decimal::MAX).display(),
            "$ 79.228.162.514.264.337.593.543.950.335,00"
        );
    }

    #[test]
    fn test_group_thousands() {
        assert_eq!(group_thousands("1", '.'), "1");
        assert_eq!(group_thousands("100", '.'), "100");
        assert_eq!(group_thousands("1000", '.'), "1.000");
        assert_eq!(group_thousands("100000", ','), "100,000");
    }
}
