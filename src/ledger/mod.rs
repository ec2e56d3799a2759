//! The comanda ledger: records, validation workflow, range operations and
//! traspasos between Caja Chica and Caja Grande.

pub mod comanda;
pub mod migration;
pub mod summary;
pub mod traspaso;
pub mod workflow;

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    currency::{round2, usd_to_ars},
    errors::{CajaError, Result},
    storage::{load_json, save_json, StateStore, StorageKey},
};

pub use comanda::{
    BusinessState, CashRegister, Comanda, ComandaKind, DepositApplication, ItemKind, LineItem,
    PartyRef, Payment, ValidationState,
};
pub use migration::{migrate_validation_data, MigrationReport, RawComanda, StateTag};
pub use summary::{ComandaFilter, DateRange, RangeSummary};
pub use traspaso::Traspaso;
pub use workflow::{permissions, Permissions, Role, Session};

pub const CURRENT_SCHEMA_VERSION: u8 = 2;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Ledger {
    pub schema_version: u8,
    pub comandas: Vec<Comanda>,
    #[serde(default)]
    pub traspasos: Vec<Traspaso>,
    #[serde(default)]
    last_number: u64,
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new()
    }
}

impl Ledger {
    pub fn new() -> Self {
        Self {
            schema_version: CURRENT_SCHEMA_VERSION,
            comandas: Vec::new(),
            traspasos: Vec::new(),
            last_number: 0,
        }
    }

    pub fn from_comandas(comandas: Vec<Comanda>) -> Self {
        let mut ledger = Self::new();
        ledger.comandas = comandas;
        ledger.last_number = ledger.highest_number();
        ledger
    }

    fn highest_number(&self) -> u64 {
        self.comandas
            .iter()
            .filter_map(|c| c.number.parse::<u64>().ok())
            .max()
            .unwrap_or(0)
    }

    fn allocate_number(&mut self) -> Result<String> {
        let next = self
            .last_number
            .max(self.highest_number())
            .checked_add(1)
            .ok_or_else(|| CajaError::InvalidInput("comanda numbering is exhausted".into()))?;
        self.last_number = next;
        Ok(format!("{:05}", next))
    }

    /// Inserts a new comanda as pending and unvalidated, numbering it when the
    /// caller left the number empty.
    pub fn add(&mut self, mut comanda: Comanda) -> Result<Uuid> {
        if comanda.number.trim().is_empty() {
            comanda.number = self.allocate_number()?;
        }
        comanda.business_state = BusinessState::Pending;
        comanda.validation = ValidationState::Unvalidated;
        comanda.transferred_in = None;
        comanda.recalculate();
        let id = comanda.id;
        tracing::info!(%id, number = %comanda.number, "comanda created");
        self.comandas.push(comanda);
        Ok(id)
    }

    pub fn comanda(&self, id: Uuid) -> Option<&Comanda> {
        self.comandas.iter().find(|c| c.id == id)
    }

    pub fn find_by_number(&self, number: &str) -> Option<&Comanda> {
        let needle = number.trim();
        self.comandas.iter().find(|c| {
            c.number == needle
                || matches!(
                    (c.number.parse::<u64>(), needle.parse::<u64>()),
                    (Ok(a), Ok(b)) if a == b
                )
        })
    }

    fn position(&self, id: Uuid) -> Result<usize> {
        self.comandas
            .iter()
            .position(|c| c.id == id)
            .ok_or_else(|| CajaError::NotFound(format!("comanda {id}")))
    }

    /// Applies `mutator` to an unvalidated comanda. Identity, business state,
    /// validation and traspaso fields cannot be changed through this path.
    pub fn edit<F>(&mut self, id: Uuid, session: &Session, mutator: F) -> Result<()>
    where
        F: FnOnce(&mut Comanda),
    {
        let idx = self.position(id)?;
        let current = &self.comandas[idx];
        if !permissions(session.role, &current.validation).can_edit {
            return Err(CajaError::Immutable(current.number.clone()));
        }
        let mut draft = current.clone();
        mutator(&mut draft);
        draft.id = current.id;
        draft.validation = current.validation.clone();
        draft.transferred_in = current.transferred_in;
        draft.business_state = current.business_state;
        draft.recalculate();
        self.comandas[idx] = draft;
        Ok(())
    }

    pub fn set_business_state(
        &mut self,
        id: Uuid,
        session: &Session,
        next: BusinessState,
    ) -> Result<()> {
        let idx = self.position(id)?;
        let comanda = &mut self.comandas[idx];
        if !permissions(session.role, &comanda.validation).can_change_state {
            return Err(CajaError::Immutable(comanda.number.clone()));
        }
        if !comanda.business_state.can_transition_to(next) {
            return Err(CajaError::InvalidTransition {
                from: comanda.business_state.label().into(),
                to: next.label().into(),
            });
        }
        tracing::info!(number = %comanda.number, from = %comanda.business_state, to = %next, "business state changed");
        comanda.business_state = next;
        Ok(())
    }

    pub fn validate(&mut self, id: Uuid, session: &Session, at: DateTime<Utc>) -> Result<()> {
        let idx = self.position(id)?;
        let comanda = &mut self.comandas[idx];
        if comanda.is_validated() {
            return Err(CajaError::Immutable(comanda.number.clone()));
        }
        if !permissions(session.role, &comanda.validation).can_validate {
            return Err(CajaError::PermissionDenied(
                "only an admin may validate comandas".into(),
            ));
        }
        if comanda.business_state != BusinessState::Completed {
            return Err(CajaError::InvalidTransition {
                from: comanda.business_state.label().into(),
                to: "validado".into(),
            });
        }
        comanda.validation = ValidationState::Validated {
            by: session.actor.clone(),
            at,
        };
        tracing::info!(number = %comanda.number, by = %session.actor, "comanda validated");
        Ok(())
    }

    pub fn remove(&mut self, id: Uuid, session: &Session) -> Result<Comanda> {
        let idx = self.position(id)?;
        let comanda = &self.comandas[idx];
        if comanda.is_validated() {
            return Err(CajaError::Immutable(comanda.number.clone()));
        }
        if !permissions(session.role, &comanda.validation).can_delete {
            return Err(CajaError::PermissionDenied(
                "only an admin may delete comandas".into(),
            ));
        }
        let removed = self.comandas.remove(idx);
        tracing::info!(number = %removed.number, "comanda deleted");
        Ok(removed)
    }

    /// Admin-only return of a validated comanda to the unvalidated state. Not
    /// available once the comanda has been part of a traspaso.
    pub fn reverse_validation(&mut self, id: Uuid, session: &Session, reason: &str) -> Result<()> {
        let idx = self.position(id)?;
        let comanda = &mut self.comandas[idx];
        if !comanda.is_validated() {
            return Err(CajaError::InvalidTransition {
                from: comanda.validation.label().into(),
                to: "no_validado".into(),
            });
        }
        if !permissions(session.role, &comanda.validation).can_reverse {
            return Err(CajaError::PermissionDenied(
                "only an admin may reverse a validation".into(),
            ));
        }
        if reason.trim().is_empty() {
            return Err(CajaError::InvalidInput(
                "a reason is required to reverse a validation".into(),
            ));
        }
        if comanda.transferred_in.is_some() {
            return Err(CajaError::InvalidInput(format!(
                "comanda {} was already transferred",
                comanda.number
            )));
        }
        comanda.validation = ValidationState::Unvalidated;
        tracing::warn!(number = %comanda.number, by = %session.actor, reason, "validation reversed");
        Ok(())
    }

    /// Keeps the first record for every id; returns how many were dropped.
    pub fn deduplicate(&mut self) -> usize {
        let before = self.comandas.len();
        let mut seen = HashSet::new();
        self.comandas.retain(|c| seen.insert(c.id));
        let removed = before - self.comandas.len();
        if removed > 0 {
            tracing::warn!(removed, "duplicate comandas removed");
        }
        removed
    }

    pub fn filter(&self, filter: &ComandaFilter) -> Vec<&Comanda> {
        self.comandas.iter().filter(|c| filter.matches(c)).collect()
    }

    /// Validates every completed, unvalidated comanda dated inside `range`.
    pub fn validate_range(
        &mut self,
        range: DateRange,
        session: &Session,
        at: DateTime<Utc>,
    ) -> Result<Vec<Uuid>> {
        if !session.is_admin() {
            return Err(CajaError::PermissionDenied(
                "only an admin may validate comandas".into(),
            ));
        }
        let mut validated = Vec::new();
        for comanda in self.comandas.iter_mut().filter(|c| {
            c.business_state == BusinessState::Completed
                && !c.is_validated()
                && range.contains(c.date)
        }) {
            comanda.validation = ValidationState::Validated {
                by: session.actor.clone(),
                at,
            };
            validated.push(comanda.id);
        }
        tracing::info!(count = validated.len(), from = %range.from(), to = %range.to(), "range validated");
        Ok(validated)
    }

    pub fn summarize_range(&self, range: DateRange) -> RangeSummary {
        RangeSummary::collect(range, self.comandas.iter())
    }

    /// Moves validated, not yet transferred comandas of `from` inside `range`
    /// to `to`, recording the traspaso.
    pub fn transfer_validated(
        &mut self,
        from: CashRegister,
        to: CashRegister,
        range: DateRange,
        rate: f64,
        session: &Session,
        at: DateTime<Utc>,
    ) -> Result<Traspaso> {
        if !session.is_admin() {
            return Err(CajaError::PermissionDenied(
                "only an admin may transfer between registers".into(),
            ));
        }
        if from == to {
            return Err(CajaError::InvalidInput(
                "source and destination registers must differ".into(),
            ));
        }
        let traspaso_id = Uuid::new_v4();
        let mut ids = Vec::new();
        let mut total = 0.0;
        for comanda in self.comandas.iter_mut().filter(|c| {
            c.register == from
                && c.is_validated()
                && c.transferred_in.is_none()
                && range.contains(c.date)
        }) {
            comanda.register = to;
            comanda.transferred_in = Some(traspaso_id);
            total += comanda.signed_total();
            ids.push(comanda.id);
        }
        if ids.is_empty() {
            return Err(CajaError::NotFound(format!(
                "validated comandas in {from} between {} and {}",
                range.from(), range.to()
            )));
        }
        let total_usd = round2(total);
        let traspaso = Traspaso {
            id: traspaso_id,
            date: at,
            from,
            to,
            comanda_ids: ids,
            total_usd,
            total_ars: round2(usd_to_ars(total_usd, rate)),
            rate,
            actor: session.actor.clone(),
        };
        tracing::info!(
            count = traspaso.comanda_ids.len(),
            total_usd,
            %from,
            %to,
            "traspaso recorded"
        );
        self.traspasos.push(traspaso.clone());
        Ok(traspaso)
    }
}

/// Accepts the current document, older versioned documents, and the bare
/// array of comandas written before the ledger was versioned.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum LedgerDocument {
    Versioned {
        #[serde(default = "legacy_schema", rename = "schemaVersion")]
        schema_version: u8,
        comandas: Vec<RawComanda>,
        #[serde(default)]
        traspasos: Vec<Traspaso>,
        #[serde(default, rename = "lastNumber")]
        last_number: u64,
    },
    Bare(Vec<RawComanda>),
}

fn legacy_schema() -> u8 {
    1
}

/// Outcome of loading the persisted ledger.
#[derive(Debug, Clone)]
pub struct LoadReport {
    pub ledger: Ledger,
    pub migrated: usize,
    pub duplicates_removed: usize,
    pub from_schema: u8,
}

pub fn load_ledger(store: &dyn StateStore) -> Result<LoadReport> {
    let document: Option<LedgerDocument> = load_json(store, StorageKey::Ledger)?;
    let (schema, records, traspasos, last_number) = match document {
        None => {
            return Ok(LoadReport {
                ledger: Ledger::new(),
                migrated: 0,
                duplicates_removed: 0,
                from_schema: CURRENT_SCHEMA_VERSION,
            })
        }
        Some(LedgerDocument::Bare(records)) => (legacy_schema(), records, Vec::new(), 0),
        Some(LedgerDocument::Versioned {
            schema_version,
            comandas,
            traspasos,
            last_number,
        }) => (schema_version, comandas, traspasos, last_number),
    };
    if schema > CURRENT_SCHEMA_VERSION {
        return Err(CajaError::Storage(format!(
            "ledger schema v{schema} is newer than supported v{CURRENT_SCHEMA_VERSION}"
        )));
    }
    let report = migrate_validation_data(records);
    let mut ledger = Ledger::from_comandas(report.comandas);
    ledger.traspasos = traspasos;
    ledger.last_number = ledger.last_number.max(last_number);
    let duplicates_removed = ledger.deduplicate();
    Ok(LoadReport {
        ledger,
        migrated: report.upgraded,
        duplicates_removed,
        from_schema: schema,
    })
}

/// Snapshots the previous document (when the backend supports it) and writes
/// the ledger.
pub fn save_ledger(store: &dyn StateStore, ledger: &Ledger, note: Option<&str>) -> Result<()> {
    if let Err(err) = store.backup(StorageKey::Ledger, note) {
        tracing::warn!(error = %err, "ledger backup failed, saving anyway");
    }
    let mut snapshot = ledger.clone();
    snapshot.schema_version = CURRENT_SCHEMA_VERSION;
    save_json(store, StorageKey::Ledger, &snapshot)
}
