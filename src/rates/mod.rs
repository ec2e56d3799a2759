//! Exchange-rate state: the current ARS/USD quote, its bounded history and the
//! provider seam used to reach the remote rate service.

pub mod provider;
pub mod store;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::currency::is_valid_exchange_rate;

pub use provider::{LocalRateProvider, RateProvider};
pub use store::{ExchangeRateStore, SharedRate};

/// Maximum number of rates kept in the local history.
pub const HISTORY_CAPACITY: usize = 50;
/// Lowest value accepted by [`ExchangeRateStore::save_manual`].
pub const MIN_MANUAL_RATE: f64 = 100.0;
/// Highest value accepted by [`ExchangeRateStore::save_manual`].
pub const MAX_MANUAL_RATE: f64 = 10_000.0;

/// ARS per USD quote. `sell_value` is the rate applied to conversions.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExchangeRate {
    pub buy_value: f64,
    pub sell_value: f64,
    pub date: DateTime<Utc>,
    pub source: String,
    pub is_manual: bool,
}

impl ExchangeRate {
    pub fn manual(value: f64, date: DateTime<Utc>) -> Self {
        Self {
            buy_value: value,
            sell_value: value,
            date,
            source: "manual".into(),
            is_manual: true,
        }
    }

    pub fn is_usable(&self) -> bool {
        is_valid_exchange_rate(self.sell_value)
    }
}

impl Default for ExchangeRate {
    fn default() -> Self {
        Self {
            buy_value: 0.0,
            sell_value: 0.0,
            date: DateTime::<Utc>::default(),
            source: "default".into(),
            is_manual: false,
        }
    }
}
