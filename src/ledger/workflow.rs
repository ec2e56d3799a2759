//! Who may do what to a comanda, given its validation state.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::comanda::ValidationState;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
pub enum Role {
    #[serde(rename = "admin")]
    Admin,
    #[default]
    #[serde(rename = "cajero")]
    Cashier,
}

impl Role {
    pub fn label(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Cashier => "cajero",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "admin" | "administrador" => Some(Role::Admin),
            "cajero" | "cashier" => Some(Role::Cashier),
            _ => None,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// The operator acting on the ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub actor: String,
    pub role: Role,
}

impl Session {
    pub fn new(actor: impl Into<String>, role: Role) -> Self {
        Self {
            actor: actor.into(),
            role,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Permissions {
    pub can_edit: bool,
    pub can_change_state: bool,
    pub can_delete: bool,
    pub can_validate: bool,
    pub can_reverse: bool,
}

/// Validated comandas are frozen for everyone; only an admin may reverse them.
pub fn permissions(role: Role, validation: &ValidationState) -> Permissions {
    let admin = role == Role::Admin;
    if validation.is_validated() {
        Permissions {
            can_reverse: admin,
            ..Permissions::default()
        }
    } else {
        Permissions {
            can_edit: true,
            can_change_state: true,
            can_delete: admin,
            can_validate: admin,
            can_reverse: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn validated() -> ValidationState {
        ValidationState::Validated {
            by: "admin".into(),
            at: Utc::now(),
        }
    }

    #[test]
    fn cashier_edits_but_cannot_validate_or_delete() {
        let perms = permissions(Role::Cashier, &ValidationState::Unvalidated);
        assert!(perms.can_edit && perms.can_change_state);
        assert!(!perms.can_delete && !perms.can_validate && !perms.can_reverse);
    }

    #[test]
    fn admin_has_full_control_before_validation() {
        let perms = permissions(Role::Admin, &ValidationState::Unvalidated);
        assert!(perms.can_edit && perms.can_delete && perms.can_validate);
        assert!(!perms.can_reverse);
    }

    #[test]
    fn validated_comandas_are_frozen() {
        for role in [Role::Admin, Role::Cashier] {
            let perms = permissions(role, &validated());
            assert!(!perms.can_edit && !perms.can_delete && !perms.can_validate);
            assert!(!perms.can_change_state);
        }
        assert!(permissions(Role::Admin, &validated()).can_reverse);
        assert!(!permissions(Role::Cashier, &validated()).can_reverse);
    }
}
