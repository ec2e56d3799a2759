//! Upgrades comanda records written before validation tracking existed.
//!
//! Older records carry their business state under `estado`, may use the
//! retired `"completo"` tag, have no `validationState`, and sometimes lack
//! computed totals. [`migrate_validation_data`] normalizes all of that and is
//! idempotent: feeding its output back in changes nothing.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::comanda::{
    BusinessState, CashRegister, Comanda, ComandaKind, DepositApplication, LineItem, PartyRef,
    Payment, ValidationState,
};

/// Business-state tag as found on disk, including the retired spelling.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum StateTag {
    #[serde(rename = "pendiente")]
    Pending,
    #[serde(rename = "completado")]
    Completed,
    #[serde(rename = "completo")]
    LegacyComplete,
    #[serde(rename = "incompleto")]
    Incomplete,
}

impl StateTag {
    pub fn is_legacy(&self) -> bool {
        matches!(self, StateTag::LegacyComplete)
    }

    pub fn upgrade(self) -> BusinessState {
        match self {
            StateTag::Pending => BusinessState::Pending,
            StateTag::Completed | StateTag::LegacyComplete => BusinessState::Completed,
            StateTag::Incomplete => BusinessState::Incomplete,
        }
    }
}

impl From<BusinessState> for StateTag {
    fn from(state: BusinessState) -> Self {
        match state {
            BusinessState::Pending => StateTag::Pending,
            BusinessState::Completed => StateTag::Completed,
            BusinessState::Incomplete => StateTag::Incomplete,
        }
    }
}

/// Tolerant on-disk shape accepting both legacy and current records.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RawComanda {
    pub id: Uuid,
    #[serde(default)]
    pub number: String,
    pub date: DateTime<Utc>,
    #[serde(default)]
    pub business_unit: String,
    #[serde(default)]
    pub register: CashRegister,
    #[serde(default)]
    pub client: PartyRef,
    #[serde(default)]
    pub staff_member: PartyRef,
    #[serde(default)]
    pub line_items: Vec<LineItem>,
    #[serde(default)]
    pub deposit: Option<DepositApplication>,
    #[serde(default)]
    pub payments: Vec<Payment>,
    #[serde(default)]
    pub subtotal: Option<f64>,
    #[serde(default)]
    pub total_discounts: Option<f64>,
    #[serde(default)]
    pub total_deposit: Option<f64>,
    #[serde(default)]
    pub final_total: Option<f64>,
    #[serde(alias = "estado")]
    pub business_state: StateTag,
    #[serde(default, rename = "validationState")]
    pub validation: Option<ValidationState>,
    #[serde(default, alias = "tipo")]
    pub kind: ComandaKind,
    #[serde(default)]
    pub transferred_in: Option<Uuid>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl RawComanda {
    fn needs_upgrade(&self) -> bool {
        self.business_state.is_legacy()
            || self.validation.is_none()
            || self.subtotal.is_none()
            || self.total_discounts.is_none()
            || self.total_deposit.is_none()
            || self.final_total.is_none()
    }

    fn into_comanda(self) -> Comanda {
        let totals_missing = self.subtotal.is_none()
            || self.total_discounts.is_none()
            || self.total_deposit.is_none()
            || self.final_total.is_none();
        let mut comanda = Comanda {
            id: self.id,
            number: self.number,
            date: self.date,
            business_unit: self.business_unit,
            register: self.register,
            client: self.client,
            staff_member: self.staff_member,
            line_items: self.line_items,
            deposit: self.deposit,
            payments: self.payments,
            subtotal: self.subtotal.unwrap_or_default(),
            total_discounts: self.total_discounts.unwrap_or_default(),
            total_deposit: self.total_deposit.unwrap_or_default(),
            final_total: self.final_total.unwrap_or_default(),
            business_state: self.business_state.upgrade(),
            validation: self.validation.unwrap_or_default(),
            kind: self.kind,
            transferred_in: self.transferred_in,
            notes: self.notes,
        };
        if totals_missing {
            comanda.recalculate();
        }
        comanda
    }
}

impl From<Comanda> for RawComanda {
    fn from(comanda: Comanda) -> Self {
        Self {
            id: comanda.id,
            number: comanda.number,
            date: comanda.date,
            business_unit: comanda.business_unit,
            register: comanda.register,
            client: comanda.client,
            staff_member: comanda.staff_member,
            line_items: comanda.line_items,
            deposit: comanda.deposit,
            payments: comanda.payments,
            subtotal: Some(comanda.subtotal),
            total_discounts: Some(comanda.total_discounts),
            total_deposit: Some(comanda.total_deposit),
            final_total: Some(comanda.final_total),
            business_state: comanda.business_state.into(),
            validation: Some(comanda.validation),
            kind: comanda.kind,
            transferred_in: comanda.transferred_in,
            notes: comanda.notes,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MigrationReport {
    pub comandas: Vec<Comanda>,
    /// Records that had to be changed.
    pub upgraded: usize,
}

pub fn migrate_validation_data(records: Vec<RawComanda>) -> MigrationReport {
    let mut upgraded = 0;
    let comandas = records
        .into_iter()
        .map(|record| {
            if record.needs_upgrade() {
                upgraded += 1;
            }
            record.into_comanda()
        })
        .collect();
    if upgraded > 0 {
        tracing::info!(upgraded, "migrated legacy comanda records");
    }
    MigrationReport { comandas, upgraded }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn legacy_record() -> serde_json::Value {
        json!({
            "id": "6a1f3f0e-1c2b-4b6a-9d0e-3e4f5a6b7c8d",
            "number": "00012",
            "date": "2024-11-05T15:30:00Z",
            "businessUnit": "tratamientos",
            "client": { "name": "Ana" },
            "staffMember": { "name": "Sofía" },
            "lineItems": [{
                "kind": "servicio",
                "name": "Limpieza facial",
                "quantity": 1,
                "unitPrice": 35.0,
                "discountPct": 10.0
            }],
            "estado": "completo",
            "tipo": "ingreso"
        })
    }

    #[test]
    fn legacy_completo_becomes_completado() {
        let raw: RawComanda = serde_json::from_value(legacy_record()).expect("legacy record");
        let report = migrate_validation_data(vec![raw]);
        assert_eq!(report.upgraded, 1);
        let comanda = &report.comandas[0];
        assert_eq!(comanda.business_state, BusinessState::Completed);
        assert_eq!(comanda.validation, ValidationState::Unvalidated);
        assert_eq!(comanda.subtotal, 35.0);
        assert_eq!(comanda.final_total, 31.5);
    }

    #[test]
    fn migration_is_idempotent() {
        let raw: RawComanda = serde_json::from_value(legacy_record()).unwrap();
        let once = migrate_validation_data(vec![raw]);
        let again = migrate_validation_data(
            once.comandas
                .iter()
                .cloned()
                .map(RawComanda::from)
                .collect(),
        );
        assert_eq!(again.comandas, once.comandas);
        assert_eq!(again.upgraded, 0);
    }

    #[test]
    fn current_records_deserialize_unchanged() {
        let raw: RawComanda = serde_json::from_value(legacy_record()).unwrap();
        let migrated = migrate_validation_data(vec![raw]).comandas;
        let json = serde_json::to_value(&migrated[0]).unwrap();
        let reparsed: RawComanda = serde_json::from_value(json).unwrap();
        let report = migrate_validation_data(vec![reparsed]);
        assert_eq!(report.upgraded, 0);
        assert_eq!(report.comandas, migrated);
    }
}
