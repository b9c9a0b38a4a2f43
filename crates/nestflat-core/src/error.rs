use nestflat_model::FieldId;
use thiserror::Error;

/// Errors reported by a storage collaborator.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{entity} rejected by store: {reason}")]
    Rejected { entity: String, reason: String },
    #[error("{entity} not found")]
    NotFound { entity: String },
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("store is closed for writes")]
    Closed,
}

impl StoreError {
    pub fn rejected(entity: impl Into<String>, reason: impl Into<String>) -> Self {
        StoreError::Rejected {
            entity: entity.into(),
            reason: reason.into(),
        }
    }

    pub fn not_found(entity: impl Into<String>) -> Self {
        StoreError::NotFound {
            entity: entity.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("field {field_id} not found")]
    DefinitionNotFound { field_id: FieldId },

    /// A write was rejected. Writes applied before it stay in place.
    #[error("unable to {action}: {source}")]
    Persistence {
        action: &'static str,
        #[source]
        source: StoreError,
    },

    #[error(transparent)]
    StoreUnavailable(#[from] StoreError),

    #[error("{what} has no persisted identity")]
    UnpersistedSchema { what: String },

    #[error("block type {handle:?} is not defined on the source field")]
    MissingBlockType { handle: String },
}

impl MigrationError {
    /// Adapter for `map_err` on store writes.
    pub fn persistence(action: &'static str) -> impl FnOnce(StoreError) -> MigrationError {
        move |source| MigrationError::Persistence { action, source }
    }

    pub fn unpersisted(what: impl Into<String>) -> Self {
        MigrationError::UnpersistedSchema { what: what.into() }
    }
}

pub type Result<T> = std::result::Result<T, MigrationError>;
