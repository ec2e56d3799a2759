pub mod json_backend;
pub mod memory;

use serde::{de::DeserializeOwned, Serialize};

use crate::errors::Result;

/// Named documents persisted by the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageKey {
    Clients,
    Staff,
    Catalog,
    ExchangeRate,
    RateHistory,
    Discounts,
    ActivityLog,
    Ledger,
}

impl StorageKey {
    pub const ALL: [StorageKey; 8] = [
        StorageKey::Clients,
        StorageKey::Staff,
        StorageKey::Catalog,
        StorageKey::ExchangeRate,
        StorageKey::RateHistory,
        StorageKey::Discounts,
        StorageKey::ActivityLog,
        StorageKey::Ledger,
    ];

    pub fn file_stem(&self) -> &'static str {
        match self {
            StorageKey::Clients => "clientes",
            StorageKey::Staff => "trabajadores",
            StorageKey::Catalog => "catalogo",
            StorageKey::ExchangeRate => "tipo_cambio",
            StorageKey::RateHistory => "tipo_cambio_historial",
            StorageKey::Discounts => "descuentos",
            StorageKey::ActivityLog => "actividad",
            StorageKey::Ledger => "comandas",
        }
    }

    /// Accepts the file stem or its English name.
    pub fn parse(input: &str) -> Option<Self> {
        let lowered = input.trim().to_ascii_lowercase();
        let alias = match lowered.as_str() {
            "clients" => StorageKey::Clients,
            "staff" => StorageKey::Staff,
            "catalog" => StorageKey::Catalog,
            "rate" => StorageKey::ExchangeRate,
            "rate-history" => StorageKey::RateHistory,
            "discounts" => StorageKey::Discounts,
            "activity" => StorageKey::ActivityLog,
            "ledger" => StorageKey::Ledger,
            other => {
                return Self::ALL
                    .into_iter()
                    .find(|key| key.file_stem() == other)
            }
        };
        Some(alias)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_parse_from_stem_or_alias() {
        assert_eq!(StorageKey::parse("Comandas"), Some(StorageKey::Ledger));
        assert_eq!(StorageKey::parse("ledger"), Some(StorageKey::Ledger));
        assert_eq!(StorageKey::parse("tipo_cambio"), Some(StorageKey::ExchangeRate));
        assert_eq!(StorageKey::parse("facturas"), None);
    }
}

/// Key-value persistence for serialized application state.
///
/// Writes are last-write-wins; backends give no transactional guarantees
/// across keys.
pub trait StateStore: Send + Sync {
    fn read_raw(&self, key: StorageKey) -> Result<Option<String>>;
    fn write_raw(&self, key: StorageKey, data: &str) -> Result<()>;
    fn remove(&self, key: StorageKey) -> Result<()>;

    /// Snapshots the current document for `key`. Backends without backup
    /// support return `Ok(None)`.
    fn backup(&self, _key: StorageKey, _note: Option<&str>) -> Result<Option<String>> {
        Ok(None)
    }
}

pub fn load_json<T: DeserializeOwned>(store: &dyn StateStore, key: StorageKey) -> Result<Option<T>> {
    match store.read_raw(key)? {
        Some(data) => Ok(Some(serde_json::from_str(&data)?)),
        None => Ok(None),
    }
}

pub fn save_json<T: Serialize + ?Sized>(
    store: &dyn StateStore,
    key: StorageKey,
    value: &T,
) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    store.write_raw(key, &json)
}

pub use json_backend::JsonStorage;
pub use memory::MemoryStorage;
