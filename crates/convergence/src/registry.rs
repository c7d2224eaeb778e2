//! Registry of resource kinds
//!
//! The registry maps a kind name such as `"rpm.package"` to the preparer
//! that decodes its parameters. It is built once at startup through
//! [`RegistryBuilder`] and is read-only afterwards, so it can be shared by
//! reference across threads without locking.

use crate::error::{Error, Result};
use crate::task::{Preparer, Task};
use serde::de::DeserializeOwned;
use serde::de::value::{Error as ValueError, MapDeserializer};
use std::collections::BTreeMap;
use std::fmt;

/// Raw parameters of one resource declaration.
pub type Params = BTreeMap<String, String>;

type Decoder = Box<dyn Fn(&Params) -> std::result::Result<Box<dyn Preparer>, ValueError> + Send + Sync>;

/// A registered resource kind.
pub struct Registration {
    kind: String,
    preparer_type: &'static str,
    task_type: &'static str,
    decode: Decoder,
}

impl Registration {
    /// The kind name.
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// Type name of the preparer.
    pub fn preparer_type(&self) -> &'static str {
        self.preparer_type
    }

    /// Type name of the task the preparer builds.
    pub fn task_type(&self) -> &'static str {
        self.task_type
    }

    /// Decode raw parameters into this kind's preparer.
    pub fn preparer(&self, params: &Params) -> Result<Box<dyn Preparer>> {
        (self.decode)(params).map_err(|e| Error::Decode {
            kind: self.kind.clone(),
            message: e.to_string(),
        })
    }
}

impl fmt::Debug for Registration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registration")
            .field("kind", &self.kind)
            .field("preparer_type", &self.preparer_type)
            .field("task_type", &self.task_type)
            .finish_non_exhaustive()
    }
}

/// Collects registrations during startup.
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    entries: BTreeMap<String, Registration>,
}

impl RegistryBuilder {
    /// Register kind `kind` with preparer `P` building tasks of type `T`.
    ///
    /// Registering the same kind twice is a configuration bug and returns
    /// [`Error::DuplicateRegistration`].
    pub fn register<P, T>(mut self, kind: &str) -> Result<Self>
    where
        P: Preparer + DeserializeOwned + 'static,
        T: Task + 'static,
    {
        if self.entries.contains_key(kind) {
            return Err(Error::DuplicateRegistration(kind.to_string()));
        }

        log::debug!("Registering resource kind {kind}");
        let decode: Decoder = Box::new(|params: &Params| {
            let pairs = params.iter().map(|(k, v)| (k.as_str(), v.as_str()));
            let preparer = P::deserialize(MapDeserializer::<_, ValueError>::new(pairs))?;
            Ok(Box::new(preparer) as Box<dyn Preparer>)
        });

        self.entries.insert(
            kind.to_string(),
            Registration {
                kind: kind.to_string(),
                preparer_type: std::any::type_name::<P>(),
                task_type: std::any::type_name::<T>(),
                decode,
            },
        );
        Ok(self)
    }

    /// Freeze the registry.
    pub fn build(self) -> Registry {
        Registry {
            entries: self.entries,
        }
    }
}

/// Read-only table of resource kinds.
#[derive(Debug)]
pub struct Registry {
    entries: BTreeMap<String, Registration>,
}

impl Registry {
    /// Start building a registry.
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    /// Find the registration for `kind`.
    pub fn lookup(&self, kind: &str) -> Result<&Registration> {
        self.entries
            .get(kind)
            .ok_or_else(|| Error::UnknownResourceKind(kind.to_string()))
    }

    /// Decode `params` into a preparer for `kind`.
    pub fn preparer(&self, kind: &str, params: &Params) -> Result<Box<dyn Preparer>> {
        self.lookup(kind)?.preparer(params)
    }

    /// Registered kinds in sorted order.
    pub fn kinds(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Number of registered kinds.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no kinds are registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
