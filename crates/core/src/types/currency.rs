//! Currency table and display formatting.
//!
//! A small static table covering the currencies the UI offers. Lookups fall
//! back to the first entry rather than failing, matching the forgiving
//! behavior callers expect when a stored code is unknown.

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

/// Display metadata for a currency.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Currency {
    /// ISO 4217 code (e.g., "USD").
    pub code: &'static str,
    pub symbol: &'static str,
    pub name: &'static str,
    pub decimal_places: u32,
}

/// Supported currencies, in display order. The first entry is the fallback.
pub const CURRENCIES: &[Currency] = &[
    Currency { code: "INR", symbol: "₹", name: "Indian Rupee", decimal_places: 2 },
    Currency { code: "USD", symbol: "$", name: "US Dollar", decimal_places: 2 },
    Currency { code: "CAD", symbol: "C$", name: "Canadian Dollar", decimal_places: 2 },
    Currency { code: "EUR", symbol: "€", name: "Euro", decimal_places: 2 },
    Currency { code: "GBP", symbol: "£", name: "British Pound", decimal_places: 2 },
    Currency { code: "JPY", symbol: "¥", name: "Japanese Yen", decimal_places: 0 },
    Currency { code: "AUD", symbol: "A$", name: "Australian Dollar", decimal_places: 2 },
    Currency { code: "CHF", symbol: "CHF", name: "Swiss Franc", decimal_places: 2 },
    Currency { code: "CNY", symbol: "¥", name: "Chinese Yuan", decimal_places: 2 },
    Currency { code: "BRL", symbol: "R$", name: "Brazilian Real", decimal_places: 2 },
];

/// Look up a currency by code, falling back to the first table entry.
#[must_use]
pub fn currency_by_code(code: &str) -> &'static Currency {
    CURRENCIES
        .iter()
        .find(|c| c.code == code)
        .unwrap_or(&CURRENCIES[0])
}

/// Format an amount with the currency's symbol, thousands grouping, and
/// fixed decimal places.
#[must_use]
pub fn format_amount(amount: Decimal, currency: &Currency) -> String {
    let negative = amount.is_sign_negative();
    let rounded = amount.abs().round_dp(currency.decimal_places);

    let formatted = if currency.decimal_places == 0 {
        group_thousands(&rounded.trunc().to_i128().unwrap_or(0).to_string())
    } else {
        let text = format!("{rounded:.prec$}", prec = currency.decimal_places as usize);
        match text.split_once('.') {
            Some((whole, frac)) => format!("{}.{frac}", group_thousands(whole)),
            None => group_thousands(&text),
        }
    };

    format!(
        "{}{}{formatted}",
        if negative { "-" } else { "" },
        currency.symbol
    )
}

fn group_thousands(digits: &str) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    let chars: Vec<char> = digits.chars().collect();
    for (i, c) in chars.iter().enumerate() {
        if i > 0 && (chars.len() - i).is_multiple_of(3) {
            out.push(',');
        }
        out.push(*c);
    }
    out
}
