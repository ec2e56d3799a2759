//! Bounded audit trail of operator actions.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    errors::Result,
    storage::{load_json, save_json, StateStore, StorageKey},
};

pub const DEFAULT_ACTIVITY_CAPACITY: usize = 500;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ActivityAction {
    ComandaCreated,
    ComandaEdited,
    ComandaStateChanged,
    ComandaValidated,
    ComandaDeleted,
    ValidationReversed,
    RangeValidated,
    Traspaso,
    DepositApplied,
    RateUpdated,
    DiscountUpdated,
    Export,
}

impl ActivityAction {
    pub fn label(&self) -> &'static str {
        match self {
            ActivityAction::ComandaCreated => "Comanda creada",
            ActivityAction::ComandaEdited => "Comanda editada",
            ActivityAction::ComandaStateChanged => "Cambio de estado",
            ActivityAction::ComandaValidated => "Comanda validada",
            ActivityAction::ComandaDeleted => "Comanda eliminada",
            ActivityAction::ValidationReversed => "Validación revertida",
            ActivityAction::RangeValidated => "Validación por rango",
            ActivityAction::Traspaso => "Traspaso",
            ActivityAction::DepositApplied => "Seña aplicada",
            ActivityAction::RateUpdated => "Tipo de cambio actualizado",
            ActivityAction::DiscountUpdated => "Descuento actualizado",
            ActivityAction::Export => "Exportación",
        }
    }
}

impl fmt::Display for ActivityAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ActivityEntry {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub actor: String,
    pub action: ActivityAction,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
}

/// Newest-first log persisted under [`StorageKey::ActivityLog`]. Entries past
/// `capacity` are dropped from the tail.
pub struct ActivityLog {
    entries: Vec<ActivityEntry>,
    capacity: usize,
    storage: Arc<dyn StateStore>,
}

impl ActivityLog {
    pub fn load(storage: Arc<dyn StateStore>, capacity: usize) -> Result<Self> {
        let capacity = capacity.max(1);
        let mut entries: Vec<ActivityEntry> =
            load_json(storage.as_ref(), StorageKey::ActivityLog)?.unwrap_or_default();
        entries.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        entries.truncate(capacity);
        Ok(Self {
            entries,
            capacity,
            storage,
        })
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn record(
        &mut self,
        actor: &str,
        action: ActivityAction,
        description: impl Into<String>,
        reference: Option<String>,
        at: DateTime<Utc>,
    ) -> Result<ActivityEntry> {
        let entry = ActivityEntry {
            id: Uuid::new_v4(),
            timestamp: at,
            actor: actor.to_string(),
            action,
            description: description.into(),
            reference,
        };
        tracing::debug!(actor, action = ?action, "activity recorded");
        self.entries.insert(0, entry.clone());
        self.entries.truncate(self.capacity);
        self.persist()?;
        Ok(entry)
    }

    pub fn entries(&self) -> &[ActivityEntry] {
        &self.entries
    }

    pub fn recent(&self, limit: usize) -> &[ActivityEntry] {
        &self.entries[..limit.min(self.entries.len())]
    }

    /// Entries matching every provided criterion; actor matching is
    /// case-insensitive.
    pub fn filter(&self, action: Option<ActivityAction>, actor: Option<&str>) -> Vec<&ActivityEntry> {
        self.entries
            .iter()
            .filter(|entry| action.map_or(true, |wanted| entry.action == wanted))
            .filter(|entry| actor.map_or(true, |wanted| entry.actor.eq_ignore_ascii_case(wanted)))
            .collect()
    }

    fn persist(&self) -> Result<()> {
        save_json(self.storage.as_ref(), StorageKey::ActivityLog, &self.entries)
    }
}
