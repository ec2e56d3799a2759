use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{
    validation::{is_plausible_email, is_plausible_tax_id},
    DirectoryEntry, FieldErrors,
};
use crate::{
    currency::{round2, Currency},
    errors::{CajaError, Result},
    storage::StorageKey,
};

/// Seña balances held on behalf of a client, one per currency.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct DepositBalances {
    pub ars: f64,
    pub usd: f64,
}

impl DepositBalances {
    pub fn get(&self, currency: Currency) -> f64 {
        match currency {
            Currency::Ars => self.ars,
            Currency::Usd => self.usd,
        }
    }

    fn slot(&mut self, currency: Currency) -> &mut f64 {
        match currency {
            Currency::Ars => &mut self.ars,
            Currency::Usd => &mut self.usd,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.ars <= 0.0 && self.usd <= 0.0
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Client {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tax_id: Option<String>,
    #[serde(default)]
    pub deposits: DepositBalances,
    #[serde(default = "default_active")]
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

fn default_active() -> bool {
    true
}

impl Client {
    pub fn new(name: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            phone: String::new(),
            email: String::new(),
            tax_id: None,
            deposits: DepositBalances::default(),
            active: true,
            created_at,
        }
    }

    pub fn with_contact(mut self, phone: impl Into<String>, email: impl Into<String>) -> Self {
        self.phone = phone.into();
        self.email = email.into();
        self
    }

    /// Adds to the seña balance for `currency`, returning the new balance.
    pub fn add_deposit(&mut self, currency: Currency, amount: f64) -> Result<f64> {
        if !amount.is_finite() || amount <= 0.0 {
            return Err(CajaError::InvalidInput(
                "deposit amount must be greater than zero".into(),
            ));
        }
        let slot = self.deposits.slot(currency);
        *slot = round2(*slot + amount);
        Ok(*slot)
    }

    /// Draws down the seña balance. Fails without touching the balance when
    /// it cannot cover `amount`.
    pub fn consume_deposit(&mut self, currency: Currency, amount: f64) -> Result<f64> {
        if !amount.is_finite() || amount <= 0.0 {
            return Err(CajaError::InvalidInput(
                "deposit amount must be greater than zero".into(),
            ));
        }
        let available = self.deposits.get(currency);
        if amount > available + f64::EPSILON {
            return Err(CajaError::InvalidInput(format!(
                "insufficient {} deposit: available {:.2}, requested {:.2}",
                currency, available, amount
            )));
        }
        let slot = self.deposits.slot(currency);
        *slot = round2((*slot - amount).max(0.0));
        Ok(*slot)
    }
}

impl DirectoryEntry for Client {
    const STORAGE_KEY: StorageKey = StorageKey::Clients;
    const LABEL: &'static str = "client";

    fn id(&self) -> Uuid {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn is_active(&self) -> bool {
        self.active
    }

    fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    fn validate(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();
        errors.require("name", &self.name, "El nombre");
        if !self.email.trim().is_empty() && !is_plausible_email(&self.email) {
            errors.add("email", "Email inválido");
        }
        if let Some(tax_id) = self.tax_id.as_deref() {
            if !is_plausible_tax_id(tax_id) {
                errors.add("tax_id", "CUIT inválido");
            }
        }
        if self.deposits.ars < 0.0 || self.deposits.usd < 0.0 {
            errors.add("deposits", "La seña no puede ser negativa");
        }
        errors
    }

    fn search_text(&self) -> String {
        format!("{} {} {}", self.name, self.phone, self.email)
    }
}
