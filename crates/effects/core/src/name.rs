//! Interned names for tags, attributes and extensions.
//!
//! Names are interned once per process and compared by id afterwards, so
//! `Tag` and `AttributeId` are `Copy` and hash as a single integer.

use std::collections::HashMap;
use std::fmt;
use std::sync::{OnceLock, PoisonError, RwLock};

#[derive(Default)]
struct Interner {
    ids: HashMap<&'static str, u32>,
    names: Vec<&'static str>,
}

fn interner() -> &'static RwLock<Interner> {
    static INTERNER: OnceLock<RwLock<Interner>> = OnceLock::new();
    INTERNER.get_or_init(Default::default)
}

/// Interned string identifier.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Name(u32);

impl Name {
    pub fn new(name: &str) -> Self {
        {
            let guard = interner().read().unwrap_or_else(PoisonError::into_inner);
            if let Some(&id) = guard.ids.get(name) {
                return Self(id);
            }
        }

        let mut guard = interner().write().unwrap_or_else(PoisonError::into_inner);
        if let Some(&id) = guard.ids.get(name) {
            return Self(id);
        }
        let leaked: &'static str = Box::leak(name.to_owned().into_boxed_str());
        let id = guard.names.len() as u32;
        guard.names.push(leaked);
        guard.ids.insert(leaked, id);
        Self(id)
    }

    pub fn as_str(self) -> &'static str {
        let guard = interner().read().unwrap_or_else(PoisonError::into_inner);
        guard.names.get(self.0 as usize).copied().unwrap_or("")
    }
}

impl fmt::Debug for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.as_str())
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for Name {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for Name {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for Name {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let name = <std::borrow::Cow<'de, str> as serde::Deserialize>::deserialize(deserializer)?;
        Ok(Self::new(&name))
    }
}

macro_rules! interned_id {
    ($(#[$meta:meta])* $ty:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        #[cfg_attr(feature = "serde", serde(transparent))]
        pub struct $ty(Name);

        impl $ty {
            pub fn new(name: &str) -> Self {
                Self(Name::new(name))
            }

            pub fn name(self) -> Name {
                self.0
            }

            pub fn as_str(self) -> &'static str {
                self.0.as_str()
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt::Display::fmt(&self.0, f)
            }
        }

        impl From<&str> for $ty {
            fn from(name: &str) -> Self {
                Self::new(name)
            }
        }
    };
}

interned_id!(
    /// Gameplay tag such as `Damage.Fire` or `Status.Stunned`.
    Tag
);

interned_id!(
    /// Numeric attribute on a target, e.g. `Health`.
    AttributeId
);

interned_id!(
    /// Key of a registered [`crate::ModifierExtension`].
    ExtensionId
);
