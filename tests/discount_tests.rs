mod common;

use std::sync::Arc;

use caja_core::{
    discounts::{normalize_percentage, DiscountStore, PaymentMethod},
    storage::{StateStore, StorageKey},
};

#[test]
fn updates_survive_reload() {
    let (storage, _base) = common::json_storage();
    let shared: Arc<dyn StateStore> = storage.clone();

    let mut store = DiscountStore::load(shared.clone()).expect("load discounts");
    assert_eq!(
        store
            .update_from_input(PaymentMethod::DebitCard, "12,5")
            .unwrap(),
        12.5
    );

    let reloaded = DiscountStore::load(shared).expect("reload discounts");
    assert_eq!(reloaded.discount_for(PaymentMethod::DebitCard), 12.5);
    assert_eq!(reloaded.discount_for(PaymentMethod::Cash), 10.0);
}

#[test]
fn stored_values_are_renormalized_on_load() {
    let storage = common::memory_storage();
    storage
        .write_raw(
            StorageKey::Discounts,
            r#"{ "efectivo": 250.0, "transferencia": -3.0 }"#,
        )
        .unwrap();
    let store = DiscountStore::load(storage).unwrap();
    assert_eq!(store.discount_for(PaymentMethod::Cash), 100.0);
    assert_eq!(store.discount_for(PaymentMethod::Transfer), 0.0);
    assert_eq!(store.discount_for(PaymentMethod::GiftCard), 0.0);
}

#[test]
fn reset_restores_defaults() {
    let storage = common::memory_storage();
    let mut store = DiscountStore::load(storage.clone()).unwrap();
    store
        .update_method_discount(PaymentMethod::Cash, 33.333)
        .unwrap();
    assert_eq!(store.discount_for(PaymentMethod::Cash), 33.33);

    store.reset().unwrap();
    assert_eq!(store.discount_for(PaymentMethod::Cash), 10.0);
    let reloaded = DiscountStore::load(storage).unwrap();
    assert_eq!(reloaded.discount_for(PaymentMethod::Cash), 10.0);
}

#[test]
fn garbage_input_changes_nothing() {
    let storage = common::memory_storage();
    let mut store = DiscountStore::load(storage.clone()).unwrap();
    assert!(store
        .update_from_input(PaymentMethod::Transfer, "mucho")
        .is_err());
    assert_eq!(store.discount_for(PaymentMethod::Transfer), 5.0);
    assert!(storage.read_raw(StorageKey::Discounts).unwrap().is_none());
}

#[test]
fn apply_discounts_amounts() {
    let store = DiscountStore::load(common::memory_storage()).unwrap();
    assert_eq!(store.apply(PaymentMethod::Cash, 80.0), 72.0);
    assert_eq!(store.apply(PaymentMethod::CreditCard, 80.0), 80.0);
    assert!(normalize_percentage(f64::NAN).is_err());
}

mod properties {
    use caja_core::discounts::normalize_percentage;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        /// Any finite input lands in [0, 100] with at most two decimals.
        #[test]
        fn normalized_percentages_are_bounded(pct in -1_000.0f64..1_000.0) {
            let stored = normalize_percentage(pct).unwrap();
            prop_assert!((0.0..=100.0).contains(&stored));
            prop_assert_eq!(normalize_percentage(stored).unwrap(), stored);
        }
    }
}
