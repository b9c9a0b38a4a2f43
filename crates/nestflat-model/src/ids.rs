use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ModelError;

macro_rules! id_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(u64);

        impl $name {
            pub const fn new(value: u64) -> Self {
                Self(value)
            }

            pub const fn get(self) -> u64 {
                self.0
            }
        }

        impl From<u64> for $name {
            fn from(value: u64) -> Self {
                Self(value)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_type!(
    /// Stable identity of a persisted field definition.
    FieldId
);
id_type!(
    /// Stable identity of a persisted block type.
    BlockTypeId
);
id_type!(
    /// Stable identity of a stored content record (source block, flat block or sub-table row).
    RecordId
);
id_type!(
    /// Identity of the field layout attached to a block type.
    LayoutId
);
id_type!(FieldGroupId);
id_type!(
    /// Row identity inside the per-locale content table of a flat record.
    ContentRowId
);
id_type!(
    /// Identity of an element outside the migrated field (entries, assets, owners).
    ElementId
);

/// Identity of a schema entity that may not have been persisted yet.
///
/// Freshly built definitions carry a `Pending` marker that is unique within
/// one schema pass; the store replaces it with `Persisted` on save.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Identity<Id> {
    Pending(u32),
    Persisted(Id),
}

impl<Id: Copy> Identity<Id> {
    /// Returns the stable id when the entity has been persisted.
    pub fn persisted(&self) -> Option<Id> {
        match self {
            Identity::Pending(_) => None,
            Identity::Persisted(id) => Some(*id),
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, Identity::Pending(_))
    }
}

impl<Id: fmt::Display> fmt::Display for Identity<Id> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Identity::Pending(marker) => write!(f, "new{marker}"),
            Identity::Persisted(id) => write!(f, "{id}"),
        }
    }
}

/// Non-blank locale tag; surrounding whitespace is trimmed.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Locale(String);

impl Locale {
    pub fn new(value: impl Into<String>) -> Result<Self, ModelError> {
        let value = value.into();
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(ModelError::InvalidLocale(value));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Locale {
    type Error = ModelError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Locale::new(value)
    }
}

impl From<Locale> for String {
    fn from(locale: Locale) -> Self {
        locale.0
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
