//! Per payment-method discount percentages.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::{
    currency::round2,
    errors::{CajaError, Result},
    storage::{load_json, save_json, StateStore, StorageKey},
    utils::text::parse_decimal_input,
};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PaymentMethod {
    #[serde(rename = "efectivo")]
    Cash,
    #[serde(rename = "transferencia")]
    Transfer,
    #[serde(rename = "tarjeta_debito")]
    DebitCard,
    #[serde(rename = "tarjeta_credito")]
    CreditCard,
    #[serde(rename = "giftcard")]
    GiftCard,
}

impl PaymentMethod {
    pub const ALL: [PaymentMethod; 5] = [
        PaymentMethod::Cash,
        PaymentMethod::Transfer,
        PaymentMethod::DebitCard,
        PaymentMethod::CreditCard,
        PaymentMethod::GiftCard,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "efectivo",
            PaymentMethod::Transfer => "transferencia",
            PaymentMethod::DebitCard => "tarjeta_debito",
            PaymentMethod::CreditCard => "tarjeta_credito",
            PaymentMethod::GiftCard => "giftcard",
        }
    }

    pub fn default_discount(&self) -> f64 {
        match self {
            PaymentMethod::Cash => 10.0,
            PaymentMethod::Transfer => 5.0,
            _ => 0.0,
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        let needle = raw.trim().to_ascii_lowercase();
        match needle.as_str() {
            "cash" => return Some(PaymentMethod::Cash),
            "transfer" => return Some(PaymentMethod::Transfer),
            "debito" | "debit" => return Some(PaymentMethod::DebitCard),
            "credito" | "credit" => return Some(PaymentMethod::CreditCard),
            _ => {}
        }
        Self::ALL.into_iter().find(|method| method.key() == needle)
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Clamps to `[0, 100]` and rounds to two decimals.
pub fn normalize_percentage(pct: f64) -> Result<f64> {
    if !pct.is_finite() {
        return Err(CajaError::InvalidInput(format!(
            "discount percentage {pct} is not a number"
        )));
    }
    Ok(round2(pct.clamp(0.0, 100.0)))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscountTable(BTreeMap<PaymentMethod, f64>);

impl Default for DiscountTable {
    fn default() -> Self {
        Self(
            PaymentMethod::ALL
                .into_iter()
                .map(|method| (method, method.default_discount()))
                .collect(),
        )
    }
}

impl DiscountTable {
    pub fn get(&self, method: PaymentMethod) -> f64 {
        self.0.get(&method).copied().unwrap_or(0.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (PaymentMethod, f64)> + '_ {
        self.0.iter().map(|(method, pct)| (*method, *pct))
    }
}

/// Discount configuration, persisted under [`StorageKey::Discounts`].
pub struct DiscountStore {
    table: DiscountTable,
    storage: Arc<dyn StateStore>,
}

impl DiscountStore {
    /// Loads the persisted table; missing keys take their defaults and stored
    /// values are re-normalized.
    pub fn load(storage: Arc<dyn StateStore>) -> Result<Self> {
        let mut table = DiscountTable::default();
        if let Some(stored) =
            load_json::<BTreeMap<PaymentMethod, f64>>(storage.as_ref(), StorageKey::Discounts)?
        {
            for (method, pct) in stored {
                match normalize_percentage(pct) {
                    Ok(value) => {
                        table.0.insert(method, value);
                    }
                    Err(err) => tracing::warn!(method = %method, error = %err, "keeping default discount"),
                }
            }
        }
        Ok(Self { table, storage })
    }

    pub fn table(&self) -> &DiscountTable {
        &self.table
    }

    pub fn discount_for(&self, method: PaymentMethod) -> f64 {
        self.table.get(method)
    }

    /// Amount left after the method's discount.
    pub fn apply(&self, method: PaymentMethod, amount: f64) -> f64 {
        round2(amount * (1.0 - self.discount_for(method) / 100.0))
    }

    pub fn update_method_discount(&mut self, method: PaymentMethod, pct: f64) -> Result<f64> {
        let value = normalize_percentage(pct)?;
        let mut draft = self.table.clone();
        draft.0.insert(method, value);
        self.store(draft)?;
        tracing::info!(method = %method, pct = value, "discount updated");
        Ok(value)
    }

    /// Parses operator input such as `"12,5"` before updating.
    pub fn update_from_input(&mut self, method: PaymentMethod, raw: &str) -> Result<f64> {
        let pct = parse_decimal_input(raw)?;
        self.update_method_discount(method, pct)
    }

    pub fn reset(&mut self) -> Result<()> {
        self.store(DiscountTable::default())?;
        tracing::info!("discounts reset to defaults");
        Ok(())
    }

    fn store(&mut self, table: DiscountTable) -> Result<()> {
        save_json(self.storage.as_ref(), StorageKey::Discounts, &table)?;
        self.table = table;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;

    fn store() -> DiscountStore {
        DiscountStore::load(Arc::new(MemoryStorage::new())).expect("load discounts")
    }

    #[test]
    fn defaults_match_house_policy() {
        let store = store();
        assert_eq!(store.discount_for(PaymentMethod::Cash), 10.0);
        assert_eq!(store.discount_for(PaymentMethod::Transfer), 5.0);
        assert_eq!(store.discount_for(PaymentMethod::CreditCard), 0.0);
        assert_eq!(store.table().iter().count(), 5);
    }

    #[test]
    fn out_of_range_values_are_clamped() {
        let mut store = store();
        assert_eq!(
            store
                .update_method_discount(PaymentMethod::Cash, 150.0)
                .unwrap(),
            100.0
        );
        assert_eq!(
            store
                .update_method_discount(PaymentMethod::Transfer, -5.0)
                .unwrap(),
            0.0
        );
        assert_eq!(
            store
                .update_method_discount(PaymentMethod::GiftCard, 7.456)
                .unwrap(),
            7.46
        );
        assert!(store
            .update_method_discount(PaymentMethod::GiftCard, f64::NAN)
            .is_err());
        assert_eq!(store.discount_for(PaymentMethod::GiftCard), 7.46);
    }

    #[test]
    fn comma_input_is_accepted() {
        let mut store = store();
        let value = store
            .update_from_input(PaymentMethod::DebitCard, "12,5")
            .unwrap();
        assert_eq!(value, 12.5);
    }

    #[test]
    fn apply_discount_to_amount() {
        let store = store();
        assert_eq!(store.apply(PaymentMethod::Cash, 80.0), 72.0);
        assert_eq!(store.apply(PaymentMethod::CreditCard, 80.0), 80.0);
    }

    #[test]
    fn parses_method_aliases() {
        assert_eq!(PaymentMethod::parse("efectivo"), Some(PaymentMethod::Cash));
        assert_eq!(PaymentMethod::parse("CASH"), Some(PaymentMethod::Cash));
        assert_eq!(
            PaymentMethod::parse("tarjeta_credito"),
            Some(PaymentMethod::CreditCard)
        );
        assert_eq!(PaymentMethod::parse("cheque"), None);
    }
}
