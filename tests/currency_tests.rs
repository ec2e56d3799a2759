use caja_core::currency::{
    ars_to_usd, convert, format_amount, format_dual, format_money, is_valid_exchange_rate,
    round2, usd_to_ars, Currency, LocaleConfig, FALLBACK_RATE,
};
use proptest::prelude::*;

#[test]
fn invalid_rates_fall_back() {
    for rate in [0.0, -5.0, f64::NAN, f64::INFINITY] {
        assert!(!is_valid_exchange_rate(rate));
        assert_eq!(usd_to_ars(2.0, rate), 2.0 * FALLBACK_RATE);
        assert_eq!(ars_to_usd(5_000.0, rate), 5.0);
    }
}

#[test]
fn same_currency_is_identity() {
    assert_eq!(convert(12.5, Currency::Usd, Currency::Usd, 1200.0), 12.5);
    assert_eq!(convert(12.5, Currency::Ars, Currency::Ars, 0.0), 12.5);
}

#[test]
fn dual_format_shows_ars_equivalent() {
    assert_eq!(format_dual(10.0, 1250.0, false), "$10.00");
    assert_eq!(format_dual(10.0, 1250.0, true), "$10.00 (≈ $12500.00)");
}

#[test]
fn locale_formatting_groups_digits() {
    let locale = LocaleConfig::es_ar();
    assert_eq!(format_amount(&locale, 1_234_567.891), "1.234.567,89");
    assert_eq!(format_amount(&locale, -0.001), "0,00");
    assert_eq!(format_money(&locale, 1500.5, Currency::Ars), "ARS 1.500,50");
    assert_eq!(
        format_amount(&LocaleConfig::from_tag("en-US"), -1234.5),
        "-1,234.50"
    );
}

#[test]
fn currency_codes_parse_loosely() {
    assert_eq!(Currency::parse(" usd "), Some(Currency::Usd));
    assert_eq!(Currency::parse("pesos"), Some(Currency::Ars));
    assert_eq!(Currency::parse("eur"), None);
}

fn rate_strategy() -> impl Strategy<Value = f64> {
    1.0f64..10_000.0
}

fn amount_strategy() -> impl Strategy<Value = f64> {
    0.0f64..1_000_000.0
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Converting to ARS and back lands within a cent of the original USD amount.
    #[test]
    fn usd_ars_round_trip_within_a_cent(amount in amount_strategy(), rate in rate_strategy()) {
        let ars = round2(usd_to_ars(amount, rate));
        let back = ars_to_usd(ars, rate);
        prop_assert!((back - amount).abs() <= 0.01, "{amount} -> {ars} -> {back}");
    }

    /// Non-positive rates are never used as divisors.
    #[test]
    fn non_positive_rates_use_fallback(amount in amount_strategy(), rate in -1_000_000.0f64..=0.0) {
        prop_assert_eq!(ars_to_usd(amount, rate), amount / FALLBACK_RATE);
        prop_assert_eq!(usd_to_ars(amount, rate), amount * FALLBACK_RATE);
    }

    #[test]
    fn round2_is_idempotent(value in -1_000_000.0f64..1_000_000.0) {
        prop_assert_eq!(round2(round2(value)), round2(value));
    }
}
