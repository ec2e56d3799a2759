//! Locally cached directories: clients, staff and the product/service catalog.

pub mod catalog;
pub mod clients;
pub mod pagination;
pub mod staff;
pub mod validation;

use std::sync::Arc;

use serde::{de::DeserializeOwned, Serialize};
use uuid::Uuid;

use crate::{
    errors::{CajaError, Result},
    storage::{load_json, save_json, StateStore, StorageKey},
    utils::text::search_key,
};

pub use catalog::CatalogItem;
pub use clients::{Client, DepositBalances};
pub use pagination::{Page, PageRequest};
pub use staff::StaffMember;
pub use validation::FieldErrors;

/// Entities kept in a [`Directory`].
pub trait DirectoryEntry: Clone + Serialize + DeserializeOwned {
    const STORAGE_KEY: StorageKey;
    const LABEL: &'static str;

    fn id(&self) -> Uuid;
    fn name(&self) -> &str;
    fn is_active(&self) -> bool;
    fn set_active(&mut self, active: bool);
    fn validate(&self) -> FieldErrors;

    /// Text matched by [`Directory::search`].
    fn search_text(&self) -> String {
        self.name().to_string()
    }
}

/// A persisted list of entries with soft-delete semantics. Every mutation is
/// written through to storage.
pub struct Directory<T: DirectoryEntry> {
    entries: Vec<T>,
    storage: Arc<dyn StateStore>,
}

impl<T: DirectoryEntry> Directory<T> {
    pub fn load(storage: Arc<dyn StateStore>) -> Result<Self> {
        let entries = load_json::<Vec<T>>(storage.as_ref(), T::STORAGE_KEY)?.unwrap_or_default();
        Ok(Self { entries, storage })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, id: Uuid) -> Option<&T> {
        self.entries.iter().find(|entry| entry.id() == id)
    }

    /// Exact name match, ignoring case and accents. Active entries win over
    /// inactive ones with the same name.
    pub fn find_by_name(&self, name: &str) -> Option<&T> {
        let key = search_key(name);
        let mut matches = self
            .entries
            .iter()
            .filter(|entry| search_key(entry.name()) == key);
        let first = matches.next()?;
        if first.is_active() {
            return Some(first);
        }
        matches.find(|entry| entry.is_active()).or(Some(first))
    }

    pub fn insert(&mut self, entry: T) -> Result<Uuid> {
        entry.validate().into_result()?;
        if self.get(entry.id()).is_some() {
            return Err(CajaError::InvalidInput(format!(
                "{} {} already exists",
                T::LABEL,
                entry.id()
            )));
        }
        let id = entry.id();
        let mut draft = self.entries.clone();
        draft.push(entry);
        self.store(draft)?;
        tracing::info!(label = T::LABEL, %id, "directory entry added");
        Ok(id)
    }

    /// Applies `mutator` to a copy and keeps it only if it still validates.
    pub fn update<F>(&mut self, id: Uuid, mutator: F) -> Result<()>
    where
        F: FnOnce(&mut T),
    {
        let idx = self.position(id)?;
        let mut draft = self.entries[idx].clone();
        mutator(&mut draft);
        if draft.id() != id {
            return Err(CajaError::InvalidInput("entry id cannot change".into()));
        }
        draft.validate().into_result()?;
        self.replace_at(idx, draft)
    }

    pub fn soft_delete(&mut self, id: Uuid) -> Result<()> {
        self.set_active(id, false)
    }

    pub fn restore(&mut self, id: Uuid) -> Result<()> {
        self.set_active(id, true)
    }

    /// Flips the active flag, returning the new value.
    pub fn toggle_active(&mut self, id: Uuid) -> Result<bool> {
        let idx = self.position(id)?;
        let next = !self.entries[idx].is_active();
        self.set_active(id, next)?;
        Ok(next)
    }

    fn set_active(&mut self, id: Uuid, active: bool) -> Result<()> {
        let idx = self.position(id)?;
        let mut draft = self.entries[idx].clone();
        draft.set_active(active);
        self.replace_at(idx, draft)?;
        tracing::info!(label = T::LABEL, %id, active, "directory entry toggled");
        Ok(())
    }

    /// Entries sorted by name, paginated.
    pub fn list(&self, request: PageRequest, include_inactive: bool) -> Page<T> {
        let mut visible: Vec<T> = self
            .entries
            .iter()
            .filter(|entry| include_inactive || entry.is_active())
            .cloned()
            .collect();
        visible.sort_by_key(|entry| search_key(entry.name()));
        Page::from_vec(visible, request)
    }

    /// Case- and accent-insensitive substring search over active entries.
    pub fn search(&self, query: &str) -> Vec<&T> {
        let needle = search_key(query);
        self.entries
            .iter()
            .filter(|entry| entry.is_active())
            .filter(|entry| needle.is_empty() || search_key(&entry.search_text()).contains(&needle))
            .collect()
    }

    /// Like [`Directory::update`] for mutations that can themselves fail.
    /// Nothing is stored unless the mutator succeeds.
    pub fn try_update<F, R>(&mut self, id: Uuid, mutator: F) -> Result<R>
    where
        F: FnOnce(&mut T) -> Result<R>,
    {
        let idx = self.position(id)?;
        let mut draft = self.entries[idx].clone();
        let outcome = mutator(&mut draft)?;
        draft.validate().into_result()?;
        self.replace_at(idx, draft)?;
        Ok(outcome)
    }

    fn replace_at(&mut self, idx: usize, entry: T) -> Result<()> {
        let mut draft = self.entries.clone();
        draft[idx] = entry;
        self.store(draft)
    }

    /// Saves `entries` and only then makes them current.
    fn store(&mut self, entries: Vec<T>) -> Result<()> {
        save_json(self.storage.as_ref(), T::STORAGE_KEY, &entries)?;
        self.entries = entries;
        Ok(())
    }

    fn position(&self, id: Uuid) -> Result<usize> {
        self.entries
            .iter()
            .position(|entry| entry.id() == id)
            .ok_or_else(|| CajaError::NotFound(format!("{} {}", T::LABEL, id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;

    fn storage() -> Arc<dyn StateStore> {
        Arc::new(MemoryStorage::new())
    }

    #[test]
    fn soft_deleted_entries_leave_default_listing() {
        let store = storage();
        let mut staff = Directory::<StaffMember>::load(store.clone()).unwrap();
        let ana = staff.insert(StaffMember::new("Ana", "Color")).unwrap();
        staff.insert(StaffMember::new("Bruno", "Corte")).unwrap();

        staff.soft_delete(ana).unwrap();
        assert_eq!(staff.list(PageRequest::default(), false).total, 1);
        assert_eq!(staff.list(PageRequest::default(), true).total, 2);

        staff.restore(ana).unwrap();
        let reloaded = Directory::<StaffMember>::load(store).unwrap();
        assert!(reloaded.get(ana).unwrap().active);
    }

    #[test]
    fn invalid_insert_is_rejected() {
        let mut staff = Directory::<StaffMember>::load(storage()).unwrap();
        let err = staff.insert(StaffMember::new("", "Color")).unwrap_err();
        assert_eq!(err.to_string(), "El nombre es obligatorio");
        assert!(staff.is_empty());
    }

    #[test]
    fn search_ignores_case_and_accents() {
        let mut staff = Directory::<StaffMember>::load(storage()).unwrap();
        staff.insert(StaffMember::new("Mónica", "Manicura")).unwrap();
        staff.insert(StaffMember::new("Julián", "Corte")).unwrap();
        let hits = staff.search("MONI");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].name, "Mónica");
        assert_eq!(staff.search("manic").len(), 1);
    }

    #[test]
    fn failed_try_update_keeps_entry() {
        let mut clients = Directory::<Client>::load(storage()).unwrap();
        let id = clients
            .insert(Client::new("Lucía", chrono::Utc::now()))
            .unwrap();
        let result = clients.try_update(id, |client| {
            client.consume_deposit(crate::currency::Currency::Ars, 100.0)
        });
        assert!(result.is_err());
        assert_eq!(clients.get(id).unwrap().deposits, DepositBalances::default());
    }
}
