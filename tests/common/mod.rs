#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc, Mutex,
};

use caja_core::{
    core::{services::ComandaService, FixedClock},
    errors::{CajaError, Result},
    ledger::{Role, Session},
    rates::SharedRate,
    storage::{JsonStorage, MemoryStorage, StateStore, StorageKey},
};
use chrono::{TimeZone, Utc};
use once_cell::sync::Lazy;
use tempfile::TempDir;

/// Holds TempDir guards so temporary folders live for the duration of the test run.
static TEST_DIRS: Lazy<Mutex<Vec<TempDir>>> = Lazy::new(|| Mutex::new(Vec::new()));

/// A fresh directory that outlives the calling test.
pub fn temp_base() -> PathBuf {
    let temp = TempDir::new().expect("create temp dir");
    let base = temp.path().to_path_buf();
    TEST_DIRS.lock().expect("lock temp dir registry").push(temp);
    base
}

/// JSON storage rooted in its own temporary directory.
pub fn json_storage() -> (Arc<JsonStorage>, PathBuf) {
    let base = temp_base();
    let storage =
        JsonStorage::new(Some(base.clone()), Some(3)).expect("create json storage backend");
    (Arc::new(storage), base)
}

pub fn memory_storage() -> Arc<dyn StateStore> {
    Arc::new(MemoryStorage::new())
}

/// 2025-03-14 12:00 UTC.
pub fn fixed_clock() -> Arc<FixedClock> {
    Arc::new(FixedClock(
        Utc.with_ymd_and_hms(2025, 3, 14, 12, 0, 0)
            .single()
            .expect("valid timestamp"),
    ))
}

pub fn admin() -> Session {
    Session::new("mery", Role::Admin)
}

pub fn cashier() -> Session {
    Session::new("caja", Role::Cashier)
}

/// Service over `storage` with the fixed clock and no exchange rate loaded.
pub fn service(storage: Arc<dyn StateStore>, session: Session) -> ComandaService {
    ComandaService::open(storage, 100, session, fixed_clock(), SharedRate::default())
        .expect("open comanda service")
}

/// In-memory store whose writes start failing once `fail_writes(true)` is set.
#[derive(Default)]
pub struct FailingStorage {
    inner: MemoryStorage,
    failing: AtomicBool,
}

impl FailingStorage {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn fail_writes(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

impl StateStore for FailingStorage {
    fn read_raw(&self, key: StorageKey) -> Result<Option<String>> {
        self.inner.read_raw(key)
    }

    fn write_raw(&self, key: StorageKey, data: &str) -> Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(CajaError::Storage(format!(
                "disk full writing {}",
                key.file_stem()
            )));
        }
        self.inner.write_raw(key, data)
    }

    fn remove(&self, key: StorageKey) -> Result<()> {
        self.inner.remove(key)
    }
}
