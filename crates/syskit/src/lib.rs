//! # syskit
//!
//! System backends for declarative resource management on Linux.
//!
//! This crate provides:
//! - [`PackageManager`] with an rpm/yum implementation
//! - [`UnitManager`] with a systemctl implementation
//! - [`AccountDatabase`] over the local passwd/group files and shadow-utils
//!
//! Every backend runs programs through a [`SysCaller`], so tests can
//! replace process execution with canned output.
//!
//! ## Example
//!
//! ```no_run
//! use syskit::backend::{PackageManager, default_package_manager};
//!
//! let yum = default_package_manager();
//! if yum.installed_version("nginx").expect("rpm query failed").is_none() {
//!     yum.install("nginx").expect("install failed");
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod backend;
pub mod error;
pub mod exec;
pub mod types;

pub use backend::{AccountDatabase, PackageManager, UnitManager};
pub use error::{Error, ErrorCategory, Result};
pub use exec::{ExecCaller, Output, SysCaller};
pub use types::{Account, AccountSpec, Group, UnitStatus};
