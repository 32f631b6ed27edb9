//! User accounts and the user directory capability
//!
//! The host's user manager is external; health checks only need to list
//! accounts and ask each one about a permission.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Permissions a user can hold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Permission {
    Admin,
    Status,
    Control,
    Files,
    Print,
    Settings,
    /// Anything this crate doesn't know about
    #[serde(other)]
    Other,
}

/// A user account as the directory reports it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserAccount {
    pub name: String,
    #[serde(default = "default_active")]
    pub active: bool,
    #[serde(default)]
    pub permissions: Vec<Permission>,
}

fn default_active() -> bool {
    true
}

impl UserAccount {
    pub fn new(name: impl Into<String>, active: bool, permissions: Vec<Permission>) -> Self {
        Self {
            name: name.into(),
            active,
            permissions,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn has_permission(&self, permission: Permission) -> bool {
        self.permissions.contains(&permission)
    }
}

/// Source of all known user accounts
pub trait UserDirectory {
    fn all_users(&self) -> Result<Vec<UserAccount>>;
}

impl UserDirectory for Vec<UserAccount> {
    fn all_users(&self) -> Result<Vec<UserAccount>> {
        Ok(self.clone())
    }
}

/// Users read from a JSON array on disk
#[derive(Debug, Clone)]
pub struct JsonUserDirectory {
    path: PathBuf,
}

impl JsonUserDirectory {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl UserDirectory for JsonUserDirectory {
    fn all_users(&self) -> Result<Vec<UserAccount>> {
        let contents = std::fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read users file {}", self.path.display()))?;
        serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse users file {}", self.path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_directory_reads_accounts() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("users.json");
        std::fs::write(
            &path,
            r#"[
                {"name": "admin", "permissions": ["ADMIN", "SETTINGS"]},
                {"name": "guest", "active": false, "permissions": ["STATUS", "WEBCAM"]}
            ]"#,
        )
        .unwrap();

        let users = JsonUserDirectory::new(&path).all_users().unwrap();

        assert_eq!(users.len(), 2);
        assert!(users[0].is_active());
        assert!(users[0].has_permission(Permission::Admin));
        assert!(!users[1].is_active());
        assert_eq!(
            users[1].permissions,
            vec![Permission::Status, Permission::Other]
        );
    }

    #[test]
    fn test_json_directory_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let directory = JsonUserDirectory::new(dir.path().join("nope.json"));

        let err = directory.all_users().unwrap_err();
        assert!(err.to_string().contains("Failed to read users file"));
    }
}
