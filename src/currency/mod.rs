//! Dual-currency (USD/ARS) conversion and formatting.
//!
//! Rates are always expressed as ARS per USD (the sell value of the current
//! exchange rate). Conversions never fail: an unusable rate is replaced by
//! [`FALLBACK_RATE`] and a warning is logged.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Rate substituted when the supplied one is zero, negative or not finite.
pub const FALLBACK_RATE: f64 = 1000.0;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    Ars,
    Usd,
}

impl Currency {
    pub fn code(&self) -> &'static str {
        match self {
            Currency::Ars => "ARS",
            Currency::Usd => "USD",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "ARS" | "PESOS" => Some(Currency::Ars),
            "USD" | "DOLARES" => Some(Currency::Usd),
            _ => None,
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// True iff `rate` is a finite, strictly positive number.
pub fn is_valid_exchange_rate(rate: f64) -> bool {
    rate.is_finite() && rate > 0.0
}

fn effective_rate(rate: f64) -> f64 {
    if is_valid_exchange_rate(rate) {
        rate
    } else {
        tracing::warn!(
            rate,
            fallback = FALLBACK_RATE,
            "invalid exchange rate, using fallback"
        );
        FALLBACK_RATE
    }
}

pub fn ars_to_usd(amount: f64, rate: f64) -> f64 {
    amount / effective_rate(rate)
}

pub fn usd_to_ars(amount: f64, rate: f64) -> f64 {
    amount * effective_rate(rate)
}

/// Converts between any two supported currencies.
pub fn convert(amount: f64, from: Currency, to: Currency, rate: f64) -> f64 {
    match (from, to) {
        (Currency::Usd, Currency::Ars) => usd_to_ars(amount, rate),
        (Currency::Ars, Currency::Usd) => ars_to_usd(amount, rate),
        _ => amount,
    }
}

/// Rounds half away from zero to two decimals.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Renders `$X.XX`.
pub fn format_usd(amount: f64) -> String {
    format!("${:.2}", amount)
}

/// Renders `$X.XX` or, when `show_ars` is set, `$X.XX (≈ $Y.YY)`.
pub fn format_dual(amount_usd: f64, rate: f64, show_ars: bool) -> String {
    let usd = format_usd(amount_usd);
    if !show_ars {
        return usd;
    }
    format!("{} (≈ {})", usd, format_usd(usd_to_ars(amount_usd, rate)))
}

/// Separator preferences for human-facing amounts.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LocaleConfig {
    pub language_tag: String,
    pub decimal_separator: char,
    pub grouping_separator: char,
}

impl LocaleConfig {
    pub fn es_ar() -> Self {
        Self {
            language_tag: "es-AR".into(),
            decimal_separator: ',',
            grouping_separator: '.',
        }
    }

    pub fn from_tag(tag: &str) -> Self {
        if tag.starts_with("es") {
            Self {
                language_tag: tag.to_string(),
                ..Self::es_ar()
            }
        } else {
            Self {
                language_tag: tag.to_string(),
                ..Self::default()
            }
        }
    }
}

impl Default for LocaleConfig {
    fn default() -> Self {
        Self {
            language_tag: "en-US".into(),
            decimal_separator: '.',
            grouping_separator: ',',
        }
    }
}

/// Formats `value` with two decimals using the locale's separators.
pub fn format_amount(locale: &LocaleConfig, value: f64) -> String {
    let body = format!("{:.2}", value.abs());
    let (int_part, frac_part) = body.split_once('.').unwrap_or((body.as_str(), "00"));
    let grouped = group_digits(int_part, locale.grouping_separator);
    let sign = if value < 0.0 && round2(value) != 0.0 {
        "-"
    } else {
        ""
    };
    format!(
        "{}{}{}{}",
        sign, grouped, locale.decimal_separator, frac_part
    )
}

/// Formats with the currency code prefix, e.g. `ARS 1.234,50`.
pub fn format_money(locale: &LocaleConfig, amount: f64, currency: Currency) -> String {
    format!("{} {}", currency.code(), format_amount(locale, amount))
}

fn group_digits(digits: &str, separator: char) -> String {
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (idx, ch) in digits.chars().enumerate() {
        if idx != 0 && (digits.len() - idx) % 3 == 0 {
            grouped.push(separator);
        }
        grouped.push(ch);
    }
    grouped
}
