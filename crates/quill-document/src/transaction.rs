//! Scoped mutation of a private snapshot copy
//!
//! A [`Transaction`] is only reachable from inside
//! [`Document::apply_transaction`](crate::Document::apply_transaction). It
//! edits a clone of the current snapshot; the document publishes the clone
//! only if the mutator returns `Ok`.

use crate::error::{DocumentError, DocumentResult};
use crate::node::{InlineContent, InlineNode, NodeKey, NodeLocation, Paragraph, TextNode};
use crate::selection::{Point, Selection};
use crate::snapshot::DocumentSnapshot;

/// An inline node taken out of the tree, with the slot it occupied
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemovedNode {
    /// Paragraph the node belonged to
    pub paragraph: NodeKey,
    /// Index the node had among the paragraph's children
    pub index: usize,
    /// The node itself
    pub node: InlineNode,
}

/// Mutable view of a snapshot inside one transaction
pub struct Transaction<'a> {
    snapshot: &'a mut DocumentSnapshot,
    content_changed: bool,
    ghosts_changed: bool,
}

impl<'a> Transaction<'a> {
    pub(crate) fn new(snapshot: &'a mut DocumentSnapshot) -> Self {
        Self {
            snapshot,
            content_changed: false,
            ghosts_changed: false,
        }
    }

    pub(crate) fn changes(&self) -> (bool, bool) {
        (self.content_changed, self.ghosts_changed)
    }

    /// Read access to the snapshot being built
    pub fn snapshot(&self) -> &DocumentSnapshot {
        self.snapshot
    }

    /// Selection as it stands inside the transaction
    pub fn selection(&self) -> Option<Selection> {
        self.snapshot.selection
    }

    /// Replace the selection; both points must sit inside text nodes
    pub fn set_selection(&mut self, selection: Selection) -> DocumentResult<()> {
        self.check_point(selection.anchor)?;
        self.check_point(selection.focus)?;
        self.snapshot.selection = Some(selection);
        Ok(())
    }

    /// Collapse the selection to `offset` in text node `key`
    pub fn move_caret(&mut self, key: NodeKey, offset: usize) -> DocumentResult<()> {
        self.set_selection(Selection::caret(key, offset))
    }

    /// Put the caret at the end of the document's last text node
    pub fn select_end(&mut self) -> DocumentResult<()> {
        let last = self
            .snapshot
            .paragraphs
            .iter()
            .rev()
            .flat_map(|paragraph| paragraph.children.iter().rev())
            .find_map(InlineNode::as_text)
            .map(|node| (node.key, node.text.len()))
            .ok_or(DocumentError::NoSelection)?;
        self.move_caret(last.0, last.1)
    }

    /// Drop the selection
    pub fn clear_selection(&mut self) {
        self.snapshot.selection = None;
    }

    /// Type `text` at the selection, replacing a single-node range first
    pub fn insert_text(&mut self, text: &str) -> DocumentResult<()> {
        if text.is_empty() && self.snapshot.selection.map_or(false, |s| s.is_collapsed()) {
            return Ok(());
        }
        let caret = self.collapse_selection()?;
        let (paragraph, index) = self.inline_position(caret.key)?;
        let node = self.text_mut(paragraph, index, caret.key)?;
        node.text.insert_str(caret.offset, text);
        self.content_changed = true;
        self.snapshot.selection = Some(Selection::caret(caret.key, caret.offset + text.len()));
        Ok(())
    }

    /// Backspace: delete the char before the caret, falling back to the last
    /// char of an earlier text run, or merge the paragraph into the previous
    /// one when nothing precedes the caret
    pub fn delete_backward(&mut self) -> DocumentResult<()> {
        let selection = self.snapshot.selection.ok_or(DocumentError::NoSelection)?;
        if !selection.is_collapsed() {
            self.collapse_selection()?;
            return Ok(());
        }

        let caret = selection.anchor;
        self.check_point(caret)?;
        let (paragraph, index) = self.inline_position(caret.key)?;

        if caret.offset > 0 {
            return self.delete_char_before(paragraph, index, caret);
        }

        // Caret at the start of a run: the char to delete lives in an
        // earlier run of the same paragraph, if any has text
        let previous = self.snapshot.paragraphs[paragraph].children[..index]
            .iter()
            .rposition(|child| !child.text_content().is_empty());
        match previous {
            Some(prev) => {
                let end = match &self.snapshot.paragraphs[paragraph].children[prev] {
                    InlineNode::Text(node) => Point::new(node.key, node.text.len()),
                    InlineNode::Ghost(ghost) => return Err(DocumentError::NotATextNode(ghost.key)),
                };
                self.delete_char_before(paragraph, prev, end)
            }
            None if paragraph > 0 => {
                let removed = self.snapshot.paragraphs.remove(paragraph);
                self.snapshot.paragraphs[paragraph - 1]
                    .children
                    .extend(removed.children);
                self.content_changed = true;
                Ok(())
            }
            None => Ok(()),
        }
    }

    fn delete_char_before(
        &mut self,
        paragraph: usize,
        index: usize,
        point: Point,
    ) -> DocumentResult<()> {
        let node = self.text_mut(paragraph, index, point.key)?;
        let width = node.text[..point.offset]
            .chars()
            .next_back()
            .map(char::len_utf8)
            .unwrap_or(0);
        let start = point.offset - width;
        node.text.replace_range(start..point.offset, "");
        self.content_changed = true;
        self.snapshot.selection = Some(Selection::caret(point.key, start));
        Ok(())
    }

    /// Enter: split the paragraph at the caret and move the caret to the
    /// start of the new paragraph. Returns the new paragraph's key.
    pub fn split_paragraph(&mut self) -> DocumentResult<NodeKey> {
        let caret = self.collapse_selection()?;
        let (paragraph, index) = self.inline_position(caret.key)?;

        let tail_text = {
            let node = self.text_mut(paragraph, index, caret.key)?;
            node.text.split_off(caret.offset)
        };
        let tail_siblings: Vec<InlineNode> = self.snapshot.paragraphs[paragraph]
            .children
            .drain(index + 1..)
            .collect();

        let paragraph_key = self.snapshot.allocate_key();
        let text_key = self.snapshot.allocate_key();
        let mut children = vec![InlineNode::Text(TextNode {
            key: text_key,
            text: tail_text,
        })];
        children.extend(tail_siblings);

        self.snapshot.paragraphs.insert(
            paragraph + 1,
            Paragraph {
                key: paragraph_key,
                children,
            },
        );
        self.snapshot.selection = Some(Selection::caret(text_key, 0));
        self.content_changed = true;
        Ok(paragraph_key)
    }

    /// Insert a new inline node directly after inline node `after`
    pub fn insert_inline_after(
        &mut self,
        after: NodeKey,
        content: InlineContent,
    ) -> DocumentResult<NodeKey> {
        let (paragraph, index) = self.inline_position(after)?;
        let key = self.snapshot.allocate_key();
        let node = content.into_node(key);
        self.mark(&node);
        self.snapshot.paragraphs[paragraph]
            .children
            .insert(index + 1, node);
        Ok(key)
    }

    /// Remove an inline node. A selection pointing into a removed text node
    /// is moved to the nearest remaining text node of the same paragraph.
    pub fn remove_node(&mut self, key: NodeKey) -> DocumentResult<RemovedNode> {
        let (paragraph, index) = self.inline_position(key)?;
        let node = self.snapshot.paragraphs[paragraph].children.remove(index);
        self.mark(&node);

        if node.as_text().is_some() {
            self.repair_paragraph(paragraph, index);
            if self.selection_touches(key) {
                let caret = self.nearest_caret(paragraph, index);
                self.snapshot.selection = Some(caret);
            }
        }

        Ok(RemovedNode {
            paragraph: self.snapshot.paragraphs[paragraph].key,
            index,
            node,
        })
    }

    /// Append text to the end of a text node
    pub fn append_text(&mut self, key: NodeKey, text: &str) -> DocumentResult<()> {
        let (paragraph, index) = self.inline_position(key)?;
        let node = self.text_mut(paragraph, index, key)?;
        node.text.push_str(text);
        self.content_changed = true;
        Ok(())
    }

    /// Insert committed text at the boundary before child `index` of
    /// `paragraph` and put the caret after it.
    ///
    /// The text joins the preceding text run when there is one; otherwise a
    /// new text node is created at that index.
    pub fn insert_text_in_paragraph(
        &mut self,
        paragraph: NodeKey,
        index: usize,
        text: &str,
    ) -> DocumentResult<Point> {
        let p = match self.snapshot.locate(paragraph) {
            Some(NodeLocation::Paragraph { index }) => index,
            Some(NodeLocation::Inline { .. }) => {
                return Err(DocumentError::NotAParagraph(paragraph))
            }
            None => return Err(DocumentError::NodeNotFound(paragraph)),
        };
        let children = &mut self.snapshot.paragraphs[p].children;
        let index = index.min(children.len());
        let preceding_text = index
            .checked_sub(1)
            .filter(|prev| children[*prev].as_text().is_some());

        let point = match preceding_text {
            Some(prev) => match &mut children[prev] {
                InlineNode::Text(node) => {
                    node.text.push_str(text);
                    Point::new(node.key, node.text.len())
                }
                InlineNode::Ghost(ghost) => return Err(DocumentError::NotATextNode(ghost.key)),
            },
            None => {
                let key = self.snapshot.allocate_key();
                self.snapshot.paragraphs[p].children.insert(
                    index,
                    InlineNode::Text(TextNode {
                        key,
                        text: text.to_string(),
                    }),
                );
                Point::new(key, text.len())
            }
        };

        self.content_changed = true;
        self.snapshot.selection = Some(Selection::caret(point.key, point.offset));
        Ok(point)
    }

    fn mark(&mut self, node: &InlineNode) {
        if node.is_ghost() {
            self.ghosts_changed = true;
        } else {
            self.content_changed = true;
        }
    }

    fn inline_position(&self, key: NodeKey) -> DocumentResult<(usize, usize)> {
        match self.snapshot.locate(key) {
            Some(NodeLocation::Inline { paragraph, index }) => Ok((paragraph, index)),
            Some(NodeLocation::Paragraph { .. }) => Err(DocumentError::NotAnInlineNode(key)),
            None => Err(DocumentError::NodeNotFound(key)),
        }
    }

    fn text_mut(
        &mut self,
        paragraph: usize,
        index: usize,
        key: NodeKey,
    ) -> DocumentResult<&mut TextNode> {
        match &mut self.snapshot.paragraphs[paragraph].children[index] {
            InlineNode::Text(node) => Ok(node),
            InlineNode::Ghost(_) => Err(DocumentError::NotATextNode(key)),
        }
    }

    fn check_point(&self, point: Point) -> DocumentResult<()> {
        let node = self
            .snapshot
            .text_node(point.key)
            .ok_or_else(|| match self.snapshot.locate(point.key) {
                Some(_) => DocumentError::NotATextNode(point.key),
                None => DocumentError::NodeNotFound(point.key),
            })?;
        if point.offset > node.text.len() || !node.text.is_char_boundary(point.offset) {
            return Err(DocumentError::invalid_offset(
                point.key,
                point.offset,
                node.text.len(),
            ));
        }
        Ok(())
    }

    /// Delete a range confined to one text node and return the caret
    fn collapse_selection(&mut self) -> DocumentResult<Point> {
        let selection = self.snapshot.selection.ok_or(DocumentError::NoSelection)?;
        self.check_point(selection.anchor)?;
        if selection.is_collapsed() {
            return Ok(selection.anchor);
        }
        if selection.anchor.key != selection.focus.key {
            return Err(DocumentError::UnsupportedRange);
        }
        self.check_point(selection.focus)?;

        let start = selection.anchor.offset.min(selection.focus.offset);
        let end = selection.anchor.offset.max(selection.focus.offset);
        let key = selection.anchor.key;
        let (paragraph, index) = self.inline_position(key)?;
        let node = self.text_mut(paragraph, index, key)?;
        node.text.replace_range(start..end, "");
        self.content_changed = true;

        let caret = Point::new(key, start);
        self.snapshot.selection = Some(Selection::caret(key, start));
        Ok(caret)
    }

    fn selection_touches(&self, key: NodeKey) -> bool {
        self.snapshot
            .selection
            .map(|s| s.anchor.key == key || s.focus.key == key)
            .unwrap_or(false)
    }

    /// Every paragraph keeps at least one text node so the caret has a home
    fn repair_paragraph(&mut self, paragraph: usize, index: usize) {
        let has_text = self.snapshot.paragraphs[paragraph]
            .children
            .iter()
            .any(|child| child.as_text().is_some());
        if !has_text {
            let key = self.snapshot.allocate_key();
            let children = &mut self.snapshot.paragraphs[paragraph].children;
            let at = index.min(children.len());
            children.insert(
                at,
                InlineNode::Text(TextNode {
                    key,
                    text: String::new(),
                }),
            );
        }
    }

    fn nearest_caret(&self, paragraph: usize, index: usize) -> Selection {
        let children = &self.snapshot.paragraphs[paragraph].children;
        let before = children[..index.min(children.len())]
            .iter()
            .rev()
            .find_map(InlineNode::as_text)
            .map(|node| Selection::caret(node.key, node.text.len()));
        let after = || {
            children[index.min(children.len())..]
                .iter()
                .find_map(InlineNode::as_text)
                .map(|node| Selection::caret(node.key, 0))
        };
        // repair_paragraph guarantees at least one text node
        before
            .or_else(after)
            .unwrap_or_else(|| Selection::caret(children[0].key(), 0))
    }
}
