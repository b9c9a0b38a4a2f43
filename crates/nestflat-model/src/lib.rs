pub mod error;
pub mod field;
pub mod ids;
pub mod options;
pub mod path;
pub mod record;
pub mod report;

pub use error::{ModelError, Result};
pub use field::{
    BlockTypeDefinition, ChildBlocks, FieldDefinition, FieldType, LabelOverride, LayoutField,
    POSITION_SELECT, Settings, SubTableLayout,
};
pub use ids::{
    BlockTypeId, ContentRowId, ElementId, FieldGroupId, FieldId, Identity, LayoutId, Locale,
    RecordId,
};
pub use options::MigrationOptions;
pub use path::DedupKey;
pub use record::{
    Attributes, ContentRecord, ElementKind, FieldValue, FlatRecord, Relation, SubTableRow,
};
pub use report::{MigrationOutcome, MigrationReport, RemovedField};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dedup_key_extends_and_matches_by_segment() {
        let key = DedupKey::root(BlockTypeId::new(1))
            .child(BlockTypeId::new(2))
            .child(BlockTypeId::new(3));
        assert_eq!(key.to_string(), "1_2_3");
        assert_eq!(key.depth(), 2);
        assert!(key.starts_with(&[BlockTypeId::new(1), BlockTypeId::new(2)]));
        // "1_2" is a textual prefix of "1_23" but not a segment prefix.
        let other = DedupKey::root(BlockTypeId::new(1)).child(BlockTypeId::new(23));
        assert!(!other.starts_with(&[BlockTypeId::new(1), BlockTypeId::new(2)]));
    }

    #[test]
    fn pending_identity_displays_marker() {
        let pending: Identity<FieldId> = Identity::Pending(3);
        assert_eq!(pending.to_string(), "new3");
        assert!(pending.persisted().is_none());
        let stored = Identity::Persisted(FieldId::new(42));
        assert_eq!(stored.persisted(), Some(FieldId::new(42)));
    }
}
