//! Built-in resource kinds
//!
//! Each kind pairs a preparer (raw manifest parameters) with a task bound
//! to a `syskit` backend:
//! - `rpm.package` - system packages via rpm/yum
//! - `user` - local accounts via passwd/shadow-utils
//! - `systemd.unit` - service units via systemctl

use anyhow::anyhow;
use convergence::{Error, Failure, Registry, Status, StatusLevel};

pub mod package;
pub mod unit;
pub mod user;

#[cfg(test)]
pub mod fakes;

pub use package::{Package, PackagePreparer};
pub use unit::{Unit, UnitPreparer};
pub use user::{User, UserPreparer};

/// Placeholder for a value that does not exist on the system.
pub const ABSENT: &str = "<absent>";

/// Build the registry of built-in kinds.
///
/// Called once at startup; the result is passed around by reference.
pub fn registry() -> convergence::Result<Registry> {
    Ok(Registry::builder()
        .register::<PackagePreparer, Package>(package::KIND)?
        .register::<UserPreparer, User>(user::KIND)?
        .register::<UnitPreparer, Unit>(unit::KIND)?
        .build())
}

/// Apply a planned change and confirm it by querying again.
///
/// Performs no mutation when `planned` has no changes, and refuses when the
/// plan says the change cannot be made. Success is decided by `recheck`,
/// never by the mutation's return alone.
pub(crate) fn apply_planned<M, C>(
    target: &str,
    planned: Status,
    mutate: M,
    recheck: C,
) -> Result<Status, Failure>
where
    M: FnOnce() -> syskit::Result<()>,
    C: FnOnce() -> convergence::Result<Status>,
{
    if !planned.has_changes() {
        return Ok(planned);
    }

    if planned.level >= StatusLevel::CantChange {
        let reason = planned.messages.join("; ");
        return Err(Failure::new(planned, Error::mutation(target, anyhow!(reason))));
    }

    if let Err(e) = mutate() {
        log::warn!("Changing {target} failed: {e}");
        return Err(Failure::new(planned, Error::mutation(target, e)));
    }

    match recheck() {
        Ok(after) if !after.has_changes() => Ok(planned),
        Ok(after) => {
            let remaining: Vec<&str> = after.changes().map(|(k, _)| k.as_str()).collect();
            Err(Failure::new(
                planned,
                Error::mutation(
                    target,
                    anyhow!("did not converge: {} still differ", remaining.join(", ")),
                ),
            ))
        }
        Err(e) => Err(Failure::new(planned, e)),
    }
}
