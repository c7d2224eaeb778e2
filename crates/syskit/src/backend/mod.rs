//! Backend abstraction for system operations.
//!
//! Each trait is the capability set one resource kind needs: a way to
//! query live state and a way to mutate it. Implementations exist per
//! platform; tests substitute in-memory fakes.

pub mod accounts;
pub mod systemctl;
pub mod yum;

use crate::error::Result;
use crate::types::{Account, AccountSpec, Group, UnitStatus};
use std::fmt;

/// Package manager operations.
pub trait PackageManager: Send + Sync + fmt::Debug {
    /// Installed version of `name`, or `None` if not installed.
    fn installed_version(&self, name: &str) -> Result<Option<String>>;

    /// Install `name`.
    fn install(&self, name: &str) -> Result<()>;

    /// Remove `name`.
    fn remove(&self, name: &str) -> Result<()>;
}

/// Service manager operations.
pub trait UnitManager: Send + Sync + fmt::Debug {
    /// Status of `name`, or `None` if no such unit is known.
    fn status(&self, name: &str) -> Result<Option<UnitStatus>>;

    /// Start the unit.
    fn start(&self, name: &str) -> Result<()>;

    /// Stop the unit.
    fn stop(&self, name: &str) -> Result<()>;

    /// Enable the unit at boot.
    fn enable(&self, name: &str) -> Result<()>;

    /// Disable the unit at boot.
    fn disable(&self, name: &str) -> Result<()>;
}

/// Local account database operations.
pub trait AccountDatabase: Send + Sync + fmt::Debug {
    /// Look up an account by login name.
    fn user(&self, username: &str) -> Result<Option<Account>>;

    /// Look up an account by uid.
    fn user_by_uid(&self, uid: u32) -> Result<Option<Account>>;

    /// Look up a group by name.
    fn group(&self, name: &str) -> Result<Option<Group>>;

    /// Look up a group by gid.
    fn group_by_gid(&self, gid: u32) -> Result<Option<Group>>;

    /// Create an account.
    fn add_user(&self, username: &str, spec: &AccountSpec) -> Result<()>;

    /// Change attributes of an existing account.
    fn modify_user(&self, username: &str, spec: &AccountSpec) -> Result<()>;

    /// Delete an account.
    fn delete_user(&self, username: &str) -> Result<()>;
}

/// Get the default package manager (yum/rpm).
pub fn default_package_manager() -> yum::YumManager {
    yum::YumManager::default()
}

/// Get the default service manager (systemctl).
pub fn default_unit_manager() -> systemctl::Systemctl {
    systemctl::Systemctl::default()
}

/// Get the default account database (/etc/passwd, shadow-utils).
pub fn default_account_database() -> accounts::LocalAccounts {
    accounts::LocalAccounts::default()
}
