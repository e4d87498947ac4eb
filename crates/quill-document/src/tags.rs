//! Transaction tags
//!
//! Tags are the only channel between a transaction's author and the update
//! listeners. A listener that owns some of the reserved tags can recognise
//! its own mutations without diffing snapshots.

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::BTreeSet;
use std::fmt;

/// A label attached to a transaction
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UpdateTag(Cow<'static, str>);

impl UpdateTag {
    /// Insertion of a ghost suggestion
    pub const SUGGEST: UpdateTag = UpdateTag(Cow::Borrowed("suggest"));
    /// Promotion of a ghost suggestion into real text
    pub const COMMIT: UpdateTag = UpdateTag(Cow::Borrowed("commit"));
    /// Removal of a ghost suggestion
    pub const CANCEL: UpdateTag = UpdateTag(Cow::Borrowed("cancel"));
    /// Undo/redo replay
    pub const HISTORIC: UpdateTag = UpdateTag(Cow::Borrowed("historic"));

    /// A custom tag
    pub fn new(name: impl Into<String>) -> Self {
        Self(Cow::Owned(name.into()))
    }

    /// Tag name
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UpdateTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Options for a single transaction
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransactionOptions {
    /// Tags attached to the transaction
    pub tags: BTreeSet<UpdateTag>,
}

impl TransactionOptions {
    /// An untagged transaction (a user edit)
    pub fn user_edit() -> Self {
        Self::default()
    }

    /// A transaction carrying one tag
    pub fn tagged(tag: UpdateTag) -> Self {
        let mut tags = BTreeSet::new();
        tags.insert(tag);
        Self { tags }
    }

    /// Add a tag
    pub fn with_tag(mut self, tag: UpdateTag) -> Self {
        self.tags.insert(tag);
        self
    }
}

/// What listeners receive after a transaction is applied
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateInfo {
    /// Tags the transaction carried
    pub tags: BTreeSet<UpdateTag>,
    /// Whether committed content (text or structure) changed
    pub content_changed: bool,
    /// Whether any ghost node was added or removed
    pub ghosts_changed: bool,
}

impl UpdateInfo {
    /// Whether the transaction carried `tag`
    pub fn has_tag(&self, tag: &UpdateTag) -> bool {
        self.tags.contains(tag)
    }

    /// True if the transaction carried none of `reserved`
    pub fn is_untagged_by(&self, reserved: &[UpdateTag]) -> bool {
        !reserved.iter().any(|tag| self.tags.contains(tag))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constant_and_owned_tags_compare_equal() {
        assert_eq!(UpdateTag::SUGGEST, UpdateTag::new("suggest"));
        assert_eq!(UpdateTag::COMMIT.as_str(), "commit");
    }

    #[test]
    fn test_untagged_by_reserved() {
        let info = UpdateInfo {
            tags: TransactionOptions::tagged(UpdateTag::CANCEL).tags,
            content_changed: false,
            ghosts_changed: true,
        };
        assert!(!info.is_untagged_by(&[UpdateTag::SUGGEST, UpdateTag::CANCEL]));
        assert!(info.is_untagged_by(&[UpdateTag::COMMIT]));
    }
}
