use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::{
    activity::DEFAULT_ACTIVITY_CAPACITY,
    currency::LocaleConfig,
    errors::{CajaError, Result},
    ledger::{CashRegister, Role},
    rates::HISTORY_CAPACITY,
    utils::paths::{ensure_dir, write_atomic, PathResolver},
};

/// Operator preferences persisted at `<home>/config/config.json`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub locale: String,
    /// Show the ARS equivalent next to USD amounts.
    pub show_ars: bool,
    pub operator: String,
    pub role: Role,
    pub default_register: CashRegister,
    pub history_limit: usize,
    pub activity_capacity: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backup_retention: Option<usize>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            locale: "es-AR".into(),
            show_ars: true,
            operator: "caja".into(),
            role: Role::Cashier,
            default_register: CashRegister::Petty,
            history_limit: HISTORY_CAPACITY,
            activity_capacity: DEFAULT_ACTIVITY_CAPACITY,
            backup_retention: None,
        }
    }
}

impl Config {
    pub fn locale_config(&self) -> LocaleConfig {
        LocaleConfig::from_tag(&self.locale)
    }

    /// Applies a `key=value` style setting by name.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let value = value.trim();
        match key {
            "locale" => self.locale = value.to_string(),
            "show_ars" => {
                self.show_ars = parse_bool(value)
                    .ok_or_else(|| CajaError::InvalidInput(format!("`{value}` is not a boolean")))?
            }
            "operator" => {
                if value.is_empty() {
                    return Err(CajaError::InvalidInput("operator cannot be empty".into()));
                }
                self.operator = value.to_string();
            }
            "role" => {
                self.role = Role::parse(value)
                    .ok_or_else(|| CajaError::InvalidInput(format!("unknown role `{value}`")))?
            }
            "default_register" => {
                self.default_register = CashRegister::parse(value)
                    .ok_or_else(|| CajaError::InvalidInput(format!("unknown register `{value}`")))?
            }
            "history_limit" => {
                self.history_limit = parse_positive(value)?.min(HISTORY_CAPACITY);
            }
            "activity_capacity" => self.activity_capacity = parse_positive(value)?,
            other => {
                return Err(CajaError::InvalidInput(format!(
                    "unknown configuration key `{other}`"
                )))
            }
        }
        Ok(())
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "yes" | "si" | "sí" | "on" | "1" => Some(true),
        "false" | "no" | "off" | "0" => Some(false),
        _ => None,
    }
}

fn parse_positive(value: &str) -> Result<usize> {
    match value.parse::<usize>() {
        Ok(parsed) if parsed > 0 => Ok(parsed),
        _ => Err(CajaError::InvalidInput(format!(
            "`{value}` must be a positive integer"
        ))),
    }
}

pub struct ConfigManager {
    base: PathBuf,
    path: PathBuf,
}

impl ConfigManager {
    pub fn new() -> Result<Self> {
        Self::from_base(PathResolver::base_dir())
    }

    pub fn with_base_dir(base: PathBuf) -> Result<Self> {
        Self::from_base(base)
    }

    fn from_base(base: PathBuf) -> Result<Self> {
        ensure_dir(&base)?;
        ensure_dir(&PathResolver::config_dir_in(&base))?;
        Ok(Self {
            path: PathResolver::config_file_in(&base),
            base,
        })
    }

    pub fn load(&self) -> Result<Config> {
        if self.path.exists() {
            let data = fs::read_to_string(&self.path)?;
            Ok(serde_json::from_str(&data)?)
        } else {
            Ok(Config::default())
        }
    }

    pub fn save(&self, config: &Config) -> Result<()> {
        let json = serde_json::to_string_pretty(config)?;
        write_atomic(&self.path, &json)?;
        tracing::debug!(path = %self.path.display(), "configuration saved");
        Ok(())
    }

    pub fn base_dir(&self) -> &Path {
        &self.base
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempdir().unwrap();
        let manager = ConfigManager::with_base_dir(dir.path().to_path_buf()).unwrap();
        assert_eq!(manager.load().unwrap(), Config::default());
    }

    #[test]
    fn save_then_load_roundtrips() {
        let dir = tempdir().unwrap();
        let manager = ConfigManager::with_base_dir(dir.path().to_path_buf()).unwrap();
        let mut config = Config::default();
        config.set("role", "admin").unwrap();
        config.set("show_ars", "no").unwrap();
        manager.save(&config).unwrap();

        assert!(manager.path().ends_with("config/config.json"));
        assert!(!manager.path().with_extension("json.tmp").exists());
        let loaded = manager.load().unwrap();
        assert_eq!(loaded.role, Role::Admin);
        assert!(!loaded.show_ars);
    }

    #[test]
    fn partial_documents_fill_defaults() {
        let dir = tempdir().unwrap();
        let manager = ConfigManager::with_base_dir(dir.path().to_path_buf()).unwrap();
        fs::write(manager.path(), r#"{ "operator": "mery" }"#).unwrap();
        let loaded = manager.load().unwrap();
        assert_eq!(loaded.operator, "mery");
        assert_eq!(loaded.history_limit, HISTORY_CAPACITY);
    }

    #[test]
    fn rejects_unknown_keys_and_bad_values() {
        let mut config = Config::default();
        assert!(config.set("theme", "dark").is_err());
        assert!(config.set("activity_capacity", "0").is_err());
        assert!(config.set("role", "gerente").is_err());
    }
}
