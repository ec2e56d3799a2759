use std::{
    fs,
    path::{Path, PathBuf},
};

use chrono::{DateTime, NaiveDateTime, Utc};

use crate::{
    errors::{CajaError, Result},
    utils::paths::{ensure_dir, write_atomic, PathResolver},
};

use super::{StateStore, StorageKey};

const DOCUMENT_EXTENSION: &str = "json";
const BACKUP_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S%3f";
const DEFAULT_RETENTION: usize = 5;

/// One JSON document per [`StorageKey`] under `<root>/data`, with timestamped
/// snapshots under `<root>/backups/<key>`.
#[derive(Debug, Clone)]
pub struct JsonStorage {
    root: PathBuf,
    data_dir: PathBuf,
    backups_dir: PathBuf,
    retention: usize,
}

impl JsonStorage {
    pub fn new(root: Option<PathBuf>, retention: Option<usize>) -> Result<Self> {
        let app_root = PathResolver::resolve_base(root);
        ensure_dir(&app_root)?;
        let data_dir = PathResolver::data_dir_in(&app_root);
        let backups_dir = PathResolver::backup_dir_in(&app_root);
        ensure_dir(&data_dir)?;
        ensure_dir(&backups_dir)?;
        Ok(Self {
            root: app_root,
            data_dir,
            backups_dir,
            retention: retention.unwrap_or(DEFAULT_RETENTION).max(1),
        })
    }

    pub fn base_dir(&self) -> &Path {
        &self.root
    }

    pub fn document_path(&self, key: StorageKey) -> PathBuf {
        self.data_dir
            .join(format!("{}.{}", key.file_stem(), DOCUMENT_EXTENSION))
    }

    fn backup_dir(&self, key: StorageKey) -> PathBuf {
        self.backups_dir.join(key.file_stem())
    }

    /// Backup file names for `key`, newest first.
    pub fn list_backups(&self, key: StorageKey) -> Result<Vec<String>> {
        let dir = self.backup_dir(key);
        if !dir.exists() {
            return Ok(Vec::new());
        }
        let mut entries = Vec::new();
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(DOCUMENT_EXTENSION) {
                continue;
            }
            if let Some(name) = path.file_name().and_then(|name| name.to_str()) {
                entries.push(name.to_string());
            }
        }
        entries.sort_by(|a, b| {
            parse_backup_timestamp(b)
                .cmp(&parse_backup_timestamp(a))
                .then_with(|| b.cmp(a))
        });
        Ok(entries)
    }

    /// Copies a backup over the live document and returns its contents.
    /// `backup_name` must be a bare file name as returned by
    /// [`JsonStorage::list_backups`].
    pub fn restore(&self, key: StorageKey, backup_name: &str) -> Result<String> {
        if !is_bare_file_name(backup_name) {
            return Err(CajaError::InvalidInput(format!(
                "invalid backup name `{}`",
                backup_name
            )));
        }
        let source = self.backup_dir(key).join(backup_name);
        if !source.exists() {
            return Err(CajaError::NotFound(format!("backup `{}`", backup_name)));
        }
        let data = fs::read_to_string(&source)?;
        write_atomic(&self.document_path(key), &data)?;
        tracing::info!(key = key.file_stem(), backup = backup_name, "restored backup");
        Ok(data)
    }

    fn prune_backups(&self, key: StorageKey) -> Result<()> {
        let backups = self.list_backups(key)?;
        for name in backups.iter().skip(self.retention) {
            let _ = fs::remove_file(self.backup_dir(key).join(name));
        }
        Ok(())
    }
}

impl StateStore for JsonStorage {
    fn read_raw(&self, key: StorageKey) -> Result<Option<String>> {
        let path = self.document_path(key);
        if !path.exists() {
            return Ok(None);
        }
        Ok(Some(fs::read_to_string(path)?))
    }

    fn write_raw(&self, key: StorageKey, data: &str) -> Result<()> {
        write_atomic(&self.document_path(key), data)?;
        Ok(())
    }

    fn remove(&self, key: StorageKey) -> Result<()> {
        let path = self.document_path(key);
        if path.exists() {
            fs::remove_file(path)?;
        }
        Ok(())
    }

    fn backup(&self, key: StorageKey, note: Option<&str>) -> Result<Option<String>> {
        let source = self.document_path(key);
        if !source.exists() {
            return Ok(None);
        }
        let dir = self.backup_dir(key);
        ensure_dir(&dir)?;
        let mut stem = Utc::now().format(BACKUP_TIMESTAMP_FORMAT).to_string();
        if let Some(label) = sanitize_note(note) {
            stem.push('_');
            stem.push_str(&label);
        }
        let name = format!("{}.{}", stem, DOCUMENT_EXTENSION);
        fs::copy(&source, dir.join(&name))?;
        self.prune_backups(key)?;
        Ok(Some(name))
    }
}

fn is_bare_file_name(name: &str) -> bool {
    !name.is_empty() && name != "." && name != ".." && !name.contains(['/', '\\'])
}

fn sanitize_note(note: Option<&str>) -> Option<String> {
    let raw = note?.trim();
    let mut sanitized = String::new();
    let mut last_dash = false;
    for ch in crate::utils::text::strip_accents(raw).chars() {
        if ch.is_ascii_alphanumeric() {
            sanitized.push(ch.to_ascii_lowercase());
            last_dash = false;
        } else if (ch.is_whitespace() || matches!(ch, '-' | '.' | '_'))
            && !sanitized.is_empty()
            && !last_dash
        {
            sanitized.push('-');
            last_dash = true;
        }
    }
    let trimmed = sanitized.trim_matches('-').to_string();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed)
    }
}

fn parse_backup_timestamp(name: &str) -> Option<DateTime<Utc>> {
    let mut parts = name.split('_');
    let date = parts.next()?;
    let time = parts.next()?.trim_end_matches(".json");
    if date.len() != 8 || time.len() != 9 {
        return None;
    }
    let raw = format!("{}{}", date, &time[..6]);
    NaiveDateTime::parse_from_str(&raw, "%Y%m%d%H%M%S")
        .ok()
        .map(|naive| DateTime::from_naive_utc_and_offset(naive, Utc))
}
