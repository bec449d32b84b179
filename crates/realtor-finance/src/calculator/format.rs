//! Display helpers for reports. Engine outputs stay unrounded; only presentation rounds.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    Ars,
    Usd,
}

/// Round half away from zero to two decimals.
pub fn round_cents(amount: f64) -> f64 {
    let rounded = (amount * 100.0).round() / 100.0;
    if rounded == 0.0 {
        0.0
    } else {
        rounded
    }
}

/// `$ 1.234.567,89` for pesos, `US$ 1,234.56` for dollars.
pub fn format_money(amount: f64, currency: Currency) -> String {
    let (symbol, thousands, decimal) = match currency {
        Currency::Ars => ("$", '.', ','),
        Currency::Usd => ("US$", ',', '.'),
    };

    let rounded = round_cents(amount);
    let cents = (rounded.abs() * 100.0).round() as u64;
    let whole = group_thousands(cents / 100, thousands);
    let sign = if rounded < 0.0 { "-" } else { "" };

    format!("{sign}{symbol} {whole}{decimal}{:02}", cents % 100)
}

/// `21%`, `1,5%`: percentages as the front end shows them.
pub fn format_percent(rate: f64) -> String {
    let rounded = round_cents(rate);
    if rounded.fract() == 0.0 {
        format!("{rounded:.0}%")
    } else {
        let text = format!("{rounded:.2}");
        let trimmed = text.trim_end_matches('0');
        format!("{}%", trimmed.replace('.', ","))
    }
}

fn group_thousands(value: u64, separator: char) -> String {
    let digits = value.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (idx, ch) in digits.chars().enumerate() {
        if idx > 0 && (digits.len() - idx) % 3 == 0 {
            grouped.push(separator);
        }
        grouped.push(ch);
    }
    grouped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_pesos_with_local_separators() {
        assert_eq!(format_money(1_234_567.891, Currency::Ars), "$ 1.234.567,89");
        assert_eq!(format_money(30_000.0, Currency::Ars), "$ 30.000,00");
        assert_eq!(format_money(0.5, Currency::Ars), "$ 0,50");
    }

    #[test]
    fn formats_dollars() {
        assert_eq!(format_money(573.1435, Currency::Usd), "US$ 573.14");
        assert_eq!(format_money(-1_500.0, Currency::Usd), "-US$ 1,500.00");
    }

    #[test]
    fn negative_zero_renders_as_zero() {
        assert_eq!(format_money(-0.001, Currency::Ars), "$ 0,00");
        assert_eq!(round_cents(-0.004).to_string(), "0");
    }

    #[test]
    fn percentages_drop_trailing_zeros() {
        assert_eq!(format_percent(21.0), "21%");
        assert_eq!(format_percent(1.5), "1,5%");
        assert_eq!(format_percent(1.25), "1,25%");
    }
}
