//! Core types shared by the backends.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Properties of a systemd unit as reported by the service manager.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitStatus {
    /// Unit name (e.g., "nginx.service")
    pub name: String,
    /// Unit description
    pub description: String,
    /// Load state (e.g., "loaded", "not-found")
    pub load_state: String,
    /// Active state (e.g., "active", "inactive", "failed")
    pub active_state: String,
    /// Sub state (e.g., "running", "dead")
    pub sub_state: String,
    /// Unit file state (e.g., "enabled", "disabled", "static")
    pub unit_file_state: String,
    /// Path to the unit file
    pub fragment_path: String,
}

impl UnitStatus {
    /// Whether the unit is active (or becoming active).
    pub fn is_active(&self) -> bool {
        matches!(
            self.active_state.as_str(),
            "active" | "activating" | "reloading"
        )
    }

    /// Whether the unit is enabled to start at boot.
    pub fn is_enabled(&self) -> bool {
        matches!(
            self.unit_file_state.as_str(),
            "enabled" | "enabled-runtime" | "alias"
        )
    }
}

impl fmt::Display for UnitStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "UnitStatus")?;
        writeln!(f, "---------------")?;
        writeln!(f, "Name:          {}", self.name)?;
        writeln!(f, "Description:   {}", self.description)?;
        writeln!(f, "LoadState:     {}", self.load_state)?;
        writeln!(f, "ActiveState:   {}", self.active_state)?;
        writeln!(f, "SubState:      {}", self.sub_state)?;
        writeln!(f, "UnitFileState: {}", self.unit_file_state)?;
        writeln!(f, "Path:          {}", self.fragment_path)?;
        write!(f, "---------------")
    }
}

/// A local user account (one line of the passwd database).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Login name
    pub username: String,
    /// Numeric user id
    pub uid: u32,
    /// Primary group id
    pub gid: u32,
    /// GECOS field, usually the full name
    pub comment: String,
    /// Home directory
    pub home_dir: String,
    /// Login shell
    pub shell: String,
}

/// A local group (one line of the group database).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    /// Group name
    pub name: String,
    /// Numeric group id
    pub gid: u32,
    /// Supplementary members
    pub members: Vec<String>,
}

/// Attributes to set when creating or modifying an account.
///
/// `None` leaves the attribute to the system default (on create) or
/// unchanged (on modify).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccountSpec {
    /// Numeric user id
    pub uid: Option<u32>,
    /// Primary group id
    pub gid: Option<u32>,
    /// GECOS comment
    pub comment: Option<String>,
    /// Home directory
    pub home_dir: Option<String>,
}

impl AccountSpec {
    /// Whether no attribute is set.
    pub fn is_empty(&self) -> bool {
        self.uid.is_none() && self.gid.is_none() && self.comment.is_none() && self.home_dir.is_none()
    }

    /// Command-line flags shared by `useradd` and `usermod`.
    pub fn to_args(&self) -> Vec<String> {
        let mut args = Vec::new();
        if let Some(uid) = self.uid {
            args.push("-u".to_string());
            args.push(uid.to_string());
        }
        if let Some(gid) = self.gid {
            args.push("-g".to_string());
            args.push(gid.to_string());
        }
        if let Some(comment) = &self.comment {
            args.push("-c".to_string());
            args.push(comment.clone());
        }
        if let Some(home) = &self.home_dir {
            args.push("-d".to_string());
            args.push(home.clone());
        }
        args
    }
}
