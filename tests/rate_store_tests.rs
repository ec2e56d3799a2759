mod common;

use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use caja_core::{
    errors::{CajaError, Result},
    rates::{
        ExchangeRate, ExchangeRateStore, LocalRateProvider, RateProvider, HISTORY_CAPACITY,
    },
    storage::StateStore,
};
use chrono::{DateTime, Utc};

/// Serves a fixed quote and counts fetches.
struct QuoteProvider {
    quote: f64,
    fetches: Arc<AtomicUsize>,
}

impl RateProvider for QuoteProvider {
    fn fetch_current(&self) -> Result<ExchangeRate> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        Ok(ExchangeRate {
            buy_value: self.quote - 20.0,
            sell_value: self.quote,
            date: Utc::now(),
            source: "blue".into(),
            is_manual: false,
        })
    }

    fn submit_manual(&self, value: f64, at: DateTime<Utc>) -> Result<ExchangeRate> {
        Ok(ExchangeRate::manual(value, at))
    }

    fn history(&self, _limit: usize) -> Result<Vec<ExchangeRate>> {
        Err(CajaError::Remote("history offline".into()))
    }
}

fn local_store(storage: Arc<dyn StateStore>) -> ExchangeRateStore {
    ExchangeRateStore::new(Box::new(LocalRateProvider), storage, common::fixed_clock())
}

#[test]
fn manual_rate_out_of_bounds_is_rejected_without_mutation() {
    let mut store = local_store(common::memory_storage());
    store.save_manual(1200.0).expect("valid manual rate");

    let err = store.save_manual(50.0).unwrap_err();
    assert!(matches!(err, CajaError::InvalidInput(_)));
    assert_eq!(store.current().sell_value, 1200.0);
    assert!(store.last_error().is_some());
    assert_eq!(store.history().len(), 1);

    assert!(store.save_manual(f64::NAN).is_err());
    assert!(store.save_manual(20_000.0).is_err());
    assert_eq!(store.current().sell_value, 1200.0);
}

#[test]
fn manual_rate_is_cached_across_stores() {
    let (storage, _base) = common::json_storage();
    let shared: Arc<dyn StateStore> = storage;
    {
        let mut store = local_store(shared.clone());
        let saved = store.save_manual(1315.5).unwrap();
        assert!(saved.is_manual);
        assert_eq!(saved.date, common::fixed_clock().0);
    }
    let store = local_store(shared);
    assert_eq!(store.current().sell_value, 1315.5);
    assert_eq!(store.history().len(), 1);
    assert!(!store.is_initialized());
}

#[test]
fn remote_quote_is_fetched_once_and_shared() {
    let fetches = Arc::new(AtomicUsize::new(0));
    let provider = QuoteProvider {
        quote: 1250.0,
        fetches: fetches.clone(),
    };
    let mut store = ExchangeRateStore::new(
        Box::new(provider),
        common::memory_storage(),
        common::fixed_clock(),
    );
    let handle = store.handle();
    assert_eq!(handle.sell_value(), 0.0);

    store.load_initial();
    store.load_initial();
    assert_eq!(fetches.load(Ordering::SeqCst), 1);
    assert_eq!(handle.sell_value(), 1250.0);
    assert_eq!(handle.current().buy_value, 1230.0);
}

#[test]
fn offline_provider_keeps_cached_rate_and_reports() {
    let storage = common::memory_storage();
    local_store(storage.clone()).save_manual(990.0).unwrap();

    let mut store = local_store(storage);
    let rate = store.load_initial();
    assert_eq!(rate.sell_value, 990.0);
    assert!(store.is_initialized());
    assert!(store
        .last_error()
        .is_some_and(|err| err.contains("could not load exchange rate")));
    store.clear_error();
    assert!(store.last_error().is_none());
}

#[test]
fn history_is_bounded_and_falls_back_to_local() {
    let mut store = local_store(common::memory_storage());
    for step in 0..(HISTORY_CAPACITY + 5) {
        store.save_manual(1000.0 + step as f64).unwrap();
    }
    assert_eq!(store.history().len(), HISTORY_CAPACITY);
    assert_eq!(
        store.history()[0].sell_value,
        1000.0 + (HISTORY_CAPACITY + 4) as f64
    );

    let recent = store.load_history(3);
    assert_eq!(recent.len(), 3);
    assert_eq!(recent[0].sell_value, store.current().sell_value);
}
