use std::sync::{Arc, PoisonError, RwLock};

use crate::{
    core::clock::Clock,
    currency::is_valid_exchange_rate,
    errors::{CajaError, Result},
    storage::{load_json, save_json, StateStore, StorageKey},
};

use super::{ExchangeRate, RateProvider, HISTORY_CAPACITY, MAX_MANUAL_RATE, MIN_MANUAL_RATE};

/// Cloneable read handle on the current rate. Every holder observes updates
/// made through the owning [`ExchangeRateStore`].
#[derive(Debug, Clone, Default)]
pub struct SharedRate(Arc<RwLock<ExchangeRate>>);

impl SharedRate {
    pub fn current(&self) -> ExchangeRate {
        self.0
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Sell value used for conversions.
    pub fn sell_value(&self) -> f64 {
        self.0
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .sell_value
    }

    fn replace(&self, rate: ExchangeRate) {
        *self.0.write().unwrap_or_else(PoisonError::into_inner) = rate;
    }
}

pub struct ExchangeRateStore {
    shared: SharedRate,
    history: Vec<ExchangeRate>,
    initialized: bool,
    last_error: Option<String>,
    provider: Box<dyn RateProvider>,
    storage: Arc<dyn StateStore>,
    clock: Arc<dyn Clock>,
}

impl ExchangeRateStore {
    /// Builds the store and hydrates it from the local cache. A corrupt cache is
    /// logged and ignored.
    pub fn new(
        provider: Box<dyn RateProvider>,
        storage: Arc<dyn StateStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let mut store = Self {
            shared: SharedRate::default(),
            history: Vec::new(),
            initialized: false,
            last_error: None,
            provider,
            storage,
            clock,
        };
        store.hydrate();
        store
    }

    fn hydrate(&mut self) {
        match load_json::<ExchangeRate>(self.storage.as_ref(), StorageKey::ExchangeRate) {
            Ok(Some(rate)) => self.shared.replace(rate),
            Ok(None) => {}
            Err(err) => tracing::warn!(error = %err, "ignoring unreadable exchange-rate cache"),
        }
        match load_json::<Vec<ExchangeRate>>(self.storage.as_ref(), StorageKey::RateHistory) {
            Ok(Some(mut history)) => {
                history.truncate(HISTORY_CAPACITY);
                self.history = history;
            }
            Ok(None) => {}
            Err(err) => tracing::warn!(error = %err, "ignoring unreadable rate history cache"),
        }
    }

    pub fn handle(&self) -> SharedRate {
        self.shared.clone()
    }

    pub fn current(&self) -> ExchangeRate {
        self.shared.current()
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn clear_error(&mut self) {
        self.last_error = None;
    }

    /// Local history, most recent first.
    pub fn history(&self) -> &[ExchangeRate] {
        &self.history
    }

    /// Fetches the remote rate once per store. Failures are recorded in
    /// [`last_error`](Self::last_error) and the previous state is kept.
    pub fn load_initial(&mut self) -> ExchangeRate {
        if self.initialized {
            return self.current();
        }
        match self.provider.fetch_current() {
            Ok(rate) if rate.is_usable() => {
                tracing::info!(sell = rate.sell_value, source = %rate.source, "exchange rate loaded");
                self.apply(rate);
                self.last_error = None;
            }
            Ok(rate) => {
                self.record_error(format!(
                    "remote service returned an unusable rate ({})",
                    rate.sell_value
                ));
            }
            Err(err) => {
                self.record_error(format!("could not load exchange rate: {err}"));
            }
        }
        self.initialized = true;
        self.current()
    }

    /// Overwrites the current rate and notifies every handle.
    pub fn update(&mut self, rate: ExchangeRate) -> Result<()> {
        if !rate.is_usable() || !rate.buy_value.is_finite() || rate.buy_value < 0.0 {
            return Err(CajaError::InvalidInput(format!(
                "exchange rate {} / {} is not valid",
                rate.buy_value, rate.sell_value
            )));
        }
        self.apply(rate);
        self.initialized = true;
        Ok(())
    }

    /// Validates and submits an operator-entered rate.
    pub fn save_manual(&mut self, value: f64) -> Result<ExchangeRate> {
        if !is_valid_exchange_rate(value) || !(MIN_MANUAL_RATE..=MAX_MANUAL_RATE).contains(&value)
        {
            let err = CajaError::InvalidInput(format!(
                "manual rate must be between {MIN_MANUAL_RATE} and {MAX_MANUAL_RATE}, got {value}"
            ));
            self.record_error(err.to_string());
            return Err(err);
        }
        match self.provider.submit_manual(value, self.clock.now()) {
            Ok(rate) => {
                tracing::info!(value, "manual exchange rate saved");
                self.apply(rate.clone());
                self.initialized = true;
                self.last_error = None;
                Ok(rate)
            }
            Err(err) => {
                self.record_error(format!("could not save manual rate: {err}"));
                Err(err)
            }
        }
    }

    /// Remote history when available, otherwise the local one.
    pub fn load_history(&mut self, limit: usize) -> Vec<ExchangeRate> {
        match self.provider.history(limit) {
            Ok(mut remote) => {
                remote.truncate(limit.min(HISTORY_CAPACITY));
                self.history = remote.clone();
                self.persist_history();
                remote
            }
            Err(err) => {
                tracing::warn!(error = %err, "remote rate history unavailable, using local copy");
                self.history.iter().take(limit).cloned().collect()
            }
        }
    }

    fn apply(&mut self, rate: ExchangeRate) {
        self.shared.replace(rate.clone());
        self.history.insert(0, rate);
        self.history.truncate(HISTORY_CAPACITY);
        if let Err(err) = save_json(
            self.storage.as_ref(),
            StorageKey::ExchangeRate,
            &self.shared.current(),
        ) {
            self.record_error(format!("could not cache exchange rate: {err}"));
        }
        self.persist_history();
    }

    fn persist_history(&mut self) {
        if let Err(err) = save_json(self.storage.as_ref(), StorageKey::RateHistory, &self.history)
        {
            self.record_error(format!("could not cache rate history: {err}"));
        }
    }

    fn record_error(&mut self, message: String) {
        tracing::error!(%message, "exchange rate store");
        self.last_error = Some(message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::clock::FixedClock;
    use crate::rates::LocalRateProvider;
    use crate::storage::MemoryStorage;
    use chrono::{TimeZone, Utc};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingProvider {
        calls: Arc<AtomicUsize>,
        value: f64,
    }

    impl RateProvider for CountingProvider {
        fn fetch_current(&self) -> Result<ExchangeRate> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let mut rate = ExchangeRate::manual(self.value, Utc::now());
            rate.source = "remote".into();
            rate.is_manual = false;
            Ok(rate)
        }

        fn submit_manual(&self, value: f64, at: chrono::DateTime<Utc>) -> Result<ExchangeRate> {
            Ok(ExchangeRate::manual(value, at))
        }

        fn history(&self, _limit: usize) -> Result<Vec<ExchangeRate>> {
            Err(CajaError::Remote("offline".into()))
        }
    }

    fn clock() -> Arc<dyn Clock> {
        Arc::new(FixedClock(Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap()))
    }

    #[test]
    fn load_initial_runs_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let provider = CountingProvider {
            calls: calls.clone(),
            value: 1150.0,
        };
        let mut store =
            ExchangeRateStore::new(Box::new(provider), Arc::new(MemoryStorage::new()), clock());
        assert_eq!(store.load_initial().sell_value, 1150.0);
        assert_eq!(store.load_initial().sell_value, 1150.0);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(store.is_initialized());
    }

    #[test]
    fn load_initial_failure_keeps_defaults() {
        let mut store = ExchangeRateStore::new(
            Box::new(LocalRateProvider),
            Arc::new(MemoryStorage::new()),
            clock(),
        );
        let rate = store.load_initial();
        assert_eq!(rate, ExchangeRate::default());
        assert!(store.last_error().is_some());
    }

    #[test]
    fn handles_observe_updates() {
        let mut store = ExchangeRateStore::new(
            Box::new(LocalRateProvider),
            Arc::new(MemoryStorage::new()),
            clock(),
        );
        let handle = store.handle();
        store.save_manual(1300.0).unwrap();
        assert_eq!(handle.sell_value(), 1300.0);
    }

    #[test]
    fn update_rejects_unusable_rate() {
        let mut store = ExchangeRateStore::new(
            Box::new(LocalRateProvider),
            Arc::new(MemoryStorage::new()),
            clock(),
        );
        let mut bad = ExchangeRate::manual(0.0, Utc::now());
        bad.sell_value = -1.0;
        assert!(store.update(bad).is_err());
        assert!(store.history().is_empty());
    }
}
