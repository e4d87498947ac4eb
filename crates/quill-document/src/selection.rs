//! Selection model: anchor and focus points inside text nodes

use serde::{Deserialize, Serialize};

use crate::node::NodeKey;

/// A caret position: a text node and a byte offset into its text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Point {
    /// Text node the point is in
    pub key: NodeKey,
    /// Byte offset into the node's text
    pub offset: usize,
}

impl Point {
    /// A point at `offset` in text node `key`
    pub fn new(key: NodeKey, offset: usize) -> Self {
        Self { key, offset }
    }
}

/// The document selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    /// Where the selection started
    pub anchor: Point,
    /// Where the selection ends (the caret)
    pub focus: Point,
}

impl Selection {
    /// A collapsed selection (a caret)
    pub fn caret(key: NodeKey, offset: usize) -> Self {
        let point = Point::new(key, offset);
        Self {
            anchor: point,
            focus: point,
        }
    }

    /// A selection from `anchor` to `focus`
    pub fn range(anchor: Point, focus: Point) -> Self {
        Self { anchor, focus }
    }

    /// Whether anchor and focus coincide
    pub fn is_collapsed(&self) -> bool {
        self.anchor == self.focus
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_caret_is_collapsed() {
        assert!(Selection::caret(NodeKey(1), 4).is_collapsed());
    }

    #[test]
    fn test_range_is_not_collapsed() {
        let selection = Selection::range(Point::new(NodeKey(1), 0), Point::new(NodeKey(1), 4));
        assert!(!selection.is_collapsed());
    }
}
