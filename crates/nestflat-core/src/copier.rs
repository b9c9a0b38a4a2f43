//! Identity-stripped copies of leaf field definitions.

use nestflat_model::{FieldDefinition, Identity, POSITION_SELECT, Settings};
use serde_json::Value;

/// Copies leaf fields for a new schema and hands out pending identities.
///
/// Markers are unique for the lifetime of one copier, so a single copier is
/// shared by every definition built during one schema pass.
#[derive(Debug)]
pub struct FieldCopier {
    next_marker: u32,
}

impl Default for FieldCopier {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldCopier {
    pub fn new() -> Self {
        Self { next_marker: 1 }
    }

    /// Next unused pending identity.
    pub fn pending<Id>(&mut self) -> Identity<Id> {
        let marker = self.next_marker;
        self.next_marker += 1;
        Identity::Pending(marker)
    }

    /// Copies a leaf field into a new layout slot.
    ///
    /// Returns `None` for composite and hierarchical fields; those are
    /// replaced by generated sub-tables, never copied.
    pub fn copy(&mut self, field: &FieldDefinition, required: bool) -> Option<FieldDefinition> {
        if field.is_nesting() {
            return None;
        }
        let mut settings = field.settings.clone();
        if field.field_type.as_str() == POSITION_SELECT {
            key_options_by_value(&mut settings);
        }
        Some(FieldDefinition {
            id: self.pending(),
            handle: field.handle.clone(),
            name: field.name.clone(),
            instructions: field.instructions.clone(),
            field_type: field.field_type.clone(),
            required,
            translatable: field.translatable,
            group_id: None,
            settings,
            block_types: Vec::new(),
        })
    }
}

/// Position selectors store their options as a positional list; the copy
/// must carry them keyed by value (`{"left": "left", ...}`).
fn key_options_by_value(settings: &mut Settings) {
    let Some(Value::Array(options)) = settings.get("options") else {
        return;
    };
    let keyed = options
        .iter()
        .filter_map(|option| match option {
            Value::String(text) => Some((text.clone(), option.clone())),
            Value::Null => None,
            other => Some((other.to_string(), other.clone())),
        })
        .collect::<serde_json::Map<_, _>>();
    settings.insert("options".to_string(), Value::Object(keyed));
}

#[cfg(test)]
mod tests {
    use super::*;
    use nestflat_model::{FieldGroupId, FieldType};
    use serde_json::json;

    #[test]
    fn copy_strips_identity_and_group() {
        let mut copier = FieldCopier::new();
        let field = FieldDefinition::leaf(10, "title", "PlainText")
            .with_group(FieldGroupId::new(3))
            .with_translatable(true);
        let copy = copier.copy(&field, true).expect("leaf copy");
        assert_eq!(copy.id, Identity::Pending(1));
        assert_eq!(copy.group_id, None);
        assert!(copy.required);
        assert!(copy.translatable);
        assert_eq!(copy.handle, "title");

        let second = copier.copy(&field, false).expect("leaf copy");
        assert_eq!(second.id, Identity::Pending(2));
        assert!(!second.required);
    }

    #[test]
    fn position_select_options_are_keyed_by_value() {
        let mut copier = FieldCopier::new();
        let field = FieldDefinition::leaf(11, "align", POSITION_SELECT)
            .with_setting("options", json!(["left", "center", "right"]));
        let copy = copier.copy(&field, false).expect("leaf copy");
        assert_eq!(
            copy.settings.get("options"),
            Some(&json!({"left": "left", "center": "center", "right": "right"}))
        );
        // The source keeps its positional list.
        assert_eq!(field.settings.get("options"), Some(&json!(["left", "center", "right"])));
    }

    #[test]
    fn nesting_fields_are_not_copied() {
        let mut copier = FieldCopier::new();
        let field = FieldDefinition::new(
            Identity::Persisted(nestflat_model::FieldId::new(4)),
            "blocks",
            "Blocks",
            FieldType::Composite,
        );
        assert!(copier.copy(&field, false).is_none());
    }
}
