#![doc(test(attr(deny(warnings))))]

//! Caja Core keeps the dual-currency (USD/ARS) cash ledger of a salon:
//! comandas, the exchange rate, payment-method discounts, the validation
//! workflow, client and staff directories, the activity log and exports.

pub mod activity;
pub mod cli;
pub mod config;
pub mod core;
pub mod currency;
pub mod directory;
pub mod discounts;
pub mod errors;
pub mod export;
pub mod ledger;
pub mod rates;
pub mod storage;
pub mod utils;

use std::sync::Once;

static INIT_TRACING: Once = Once::new();

/// Initializes global tracing and emits a startup info log.
pub fn init() {
    INIT_TRACING.call_once(|| {
        utils::init_tracing();
        tracing::info!("Caja Core tracing initialized.");
    });
}
