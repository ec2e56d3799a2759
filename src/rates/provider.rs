use chrono::{DateTime, Utc};

use crate::errors::{CajaError, Result};

use super::ExchangeRate;

/// Remote exchange-rate service.
pub trait RateProvider: Send + Sync {
    fn fetch_current(&self) -> Result<ExchangeRate>;
    fn submit_manual(&self, value: f64, at: DateTime<Utc>) -> Result<ExchangeRate>;
    fn history(&self, limit: usize) -> Result<Vec<ExchangeRate>>;
}

/// Offline provider: there is no remote quote, manual rates are accepted as-is.
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalRateProvider;

impl RateProvider for LocalRateProvider {
    fn fetch_current(&self) -> Result<ExchangeRate> {
        Err(CajaError::Remote("no remote rate service configured".into()))
    }

    fn submit_manual(&self, value: f64, at: DateTime<Utc>) -> Result<ExchangeRate> {
        Ok(ExchangeRate::manual(value, at))
    }

    fn history(&self, _limit: usize) -> Result<Vec<ExchangeRate>> {
        Err(CajaError::Remote("no remote rate service configured".into()))
    }
}
