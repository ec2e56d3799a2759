use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{DirectoryEntry, FieldErrors};
use crate::storage::StorageKey;

/// A trabajador who can be assigned to comandas.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StaffMember {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub specialty: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

impl StaffMember {
    pub fn new(name: impl Into<String>, specialty: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            specialty: specialty.into(),
            phone: String::new(),
            active: true,
        }
    }
}

impl DirectoryEntry for StaffMember {
    const STORAGE_KEY: StorageKey = StorageKey::Staff;
    const LABEL: &'static str = "staff member";

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
        errors.require("specialty", &self.specialty, "La especialidad");
        errors
    }

    fn search_text(&self) -> String {
        format!("{} {}", self.name, self.specialty)
    }
}
