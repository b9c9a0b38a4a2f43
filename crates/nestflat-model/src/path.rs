use std::fmt;

use crate::ids::BlockTypeId;

/// Traversal path from a top-level block type down to a nested block type.
///
/// The first segment is the top-level block type, every further segment a
/// source block type traversed below it. The schema pass keys each generated
/// sub-table by the top-level type and the direct child it was reached
/// through; the content pass matches records against these keys segment by
/// segment.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DedupKey(Vec<BlockTypeId>);

impl DedupKey {
    pub fn root(top_level: BlockTypeId) -> Self {
        Self(vec![top_level])
    }

    #[must_use]
    pub fn child(&self, block_type: BlockTypeId) -> Self {
        let mut segments = self.0.clone();
        segments.push(block_type);
        Self(segments)
    }

    pub fn top_level(&self) -> BlockTypeId {
        // `root` is the only constructor, so the path is never empty.
        self.0[0]
    }

    /// Number of nested levels below the top-level block type.
    pub fn depth(&self) -> usize {
        self.0.len() - 1
    }

    pub fn starts_with(&self, prefix: &[BlockTypeId]) -> bool {
        self.0.starts_with(prefix)
    }
}

impl fmt::Display for DedupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (pos, segment) in self.0.iter().enumerate() {
            if pos > 0 {
                f.write_str("_")?;
            }
            write!(f, "{segment}")?;
        }
        Ok(())
    }
}
