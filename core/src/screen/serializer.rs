//! UI tree serialization
//!
//! Compresses a [`UiNode`] tree into the compact tagged text the prompt
//! carries, assigning monotonically increasing integer ids to every
//! emitted node and recording the id → handle mapping in a
//! [`NodeRegistry`]. Ids are meaningless outside the snapshot that
//! created them; the registry is cleared at the start of every pass.

use std::collections::HashMap;

use crate::screen::{NodeHandle, UiNode};

/// What the registry remembers about one emitted node: enough to act on
/// it later without touching the serialized text again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegistryEntry {
    pub handle: NodeHandle,
    /// Immediate tree parent, used for the click-fallback retry.
    pub parent: Option<NodeHandle>,
    pub scrollable: bool,
}

/// Session-scoped id → node-handle mapping, rebuilt on every snapshot.
/// A lookup miss means the target vanished with the previous snapshot,
/// never that something went wrong.
#[derive(Debug, Default)]
pub struct NodeRegistry {
    entries: HashMap<i64, RegistryEntry>,
}

impl NodeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn put(&mut self, id: i64, entry: RegistryEntry) {
        self.entries.insert(id, entry);
    }

    pub fn get(&self, id: i64) -> Option<&RegistryEntry> {
        self.entries.get(&id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Depth-first pruning serializer.
pub struct TreeSerializer;

impl TreeSerializer {
    /// Serialize `root`, clearing and repopulating `registry` so its
    /// contents are valid exactly for the returned text.
    ///
    /// A node is emitted iff it is visible and (clickable, editable,
    /// scrollable, or carries text/description). Anything else is
    /// transparent: traversed for children but rendered as nothing and
    /// assigned no id. Invisible nodes drop their whole subtree.
    pub fn serialize(root: &UiNode, registry: &mut NodeRegistry) -> String {
        registry.clear();
        let mut out = String::new();
        let mut next_id: i64 = 1;
        walk(root, None, 0, &mut next_id, &mut out, registry);
        out
    }
}

fn walk(
    node: &UiNode,
    parent: Option<NodeHandle>,
    depth: usize,
    next_id: &mut i64,
    out: &mut String,
    registry: &mut NodeRegistry,
) {
    if !node.visible {
        return;
    }

    let interactive = node.clickable || node.editable || node.scrollable;
    let emitted = interactive || !node.text.is_empty() || !node.desc.is_empty();

    if emitted {
        let id = *next_id;
        *next_id += 1;
        registry.put(
            id,
            RegistryEntry {
                handle: node.handle,
                parent,
                scrollable: node.scrollable,
            },
        );

        for _ in 0..depth {
            out.push_str("  ");
        }
        out.push('<');
        out.push_str(tag_for(node));
        out.push_str(&format!(" id={}", id));
        if !node.text.is_empty() {
            out.push_str(&format!(" text=\"{}\"", escape(&node.text)));
        }
        if !node.desc.is_empty() {
            out.push_str(&format!(" desc=\"{}\"", escape(&node.desc)));
        }
        out.push_str(">\n");
    }

    let child_depth = if emitted { depth + 1 } else { depth };
    for child in &node.children {
        walk(child, Some(node.handle), child_depth, next_id, out, registry);
    }
}

/// Tag priority when a node qualifies for more than one: editable wins
/// over clickable, clickable over scrollable, scrollable over plain text.
fn tag_for(node: &UiNode) -> &'static str {
    if node.editable {
        "input"
    } else if node.clickable {
        "button"
    } else if node.scrollable {
        "scroller"
    } else {
        "p"
    }
}

/// Quotes and newlines would corrupt the one-line-per-node format.
fn escape(text: &str) -> String {
    text.replace(['\n', '\r'], " ").replace('"', "'")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::screen::UiNode;

    fn sample_tree() -> UiNode {
        UiNode::new(100).with_children(vec![
            UiNode::new(101)
                .scrollable()
                .with_desc("Feed")
                .with_children(vec![
                    UiNode::new(102).clickable().with_text("Search"),
                    UiNode::new(103).editable().with_desc("Query field"),
                    UiNode::new(104).with_text("Results will appear here"),
                ]),
            UiNode::new(105).invisible().with_children(vec![
                UiNode::new(106).clickable().with_text("Hidden button"),
            ]),
        ])
    }

    #[test]
    fn serialization_is_deterministic() {
        let tree = sample_tree();
        let mut registry = NodeRegistry::new();
        let first = TreeSerializer::serialize(&tree, &mut registry);
        let second = TreeSerializer::serialize(&tree, &mut registry);
        assert_eq!(first, second);
    }

    #[test]
    fn emits_only_visible_useful_nodes() {
        let tree = sample_tree();
        let mut registry = NodeRegistry::new();
        let text = TreeSerializer::serialize(&tree, &mut registry);

        // The bare container root is transparent: no tag, no id.
        assert_eq!(registry.len(), 4);
        assert!(text.starts_with("<scroller id=1"));
        assert!(text.contains("<button id=2 text=\"Search\""));
        assert!(text.contains("<input id=3 desc=\"Query field\""));
        assert!(text.contains("<p id=4 text=\"Results will appear here\""));

        // The invisible subtree is gone entirely.
        assert!(!text.contains("Hidden button"));
    }

    #[test]
    fn tag_priority_editable_over_clickable_over_scrollable() {
        let mut node = UiNode::new(1).with_text("x");
        node.editable = true;
        node.clickable = true;
        node.scrollable = true;
        assert_eq!(tag_for(&node), "input");

        node.editable = false;
        assert_eq!(tag_for(&node), "button");

        node.clickable = false;
        assert_eq!(tag_for(&node), "scroller");

        node.scrollable = false;
        assert_eq!(tag_for(&node), "p");
    }

    #[test]
    fn registry_maps_ids_to_handles_and_parents() {
        let tree = sample_tree();
        let mut registry = NodeRegistry::new();
        TreeSerializer::serialize(&tree, &mut registry);

        let scroller = registry.get(1).unwrap();
        assert_eq!(scroller.handle, 101);
        assert_eq!(scroller.parent, Some(100));
        assert!(scroller.scrollable);

        let button = registry.get(2).unwrap();
        assert_eq!(button.handle, 102);
        assert_eq!(button.parent, Some(101));
        assert!(!button.scrollable);
    }

    #[test]
    fn registry_is_rebuilt_per_snapshot() {
        let mut registry = NodeRegistry::new();
        let big = sample_tree();
        TreeSerializer::serialize(&big, &mut registry);
        assert_eq!(registry.len(), 4);

        let small = UiNode::new(7).clickable().with_text("Ok");
        TreeSerializer::serialize(&small, &mut registry);
        assert_eq!(registry.len(), 1);
        // Old ids are gone; id 1 now points at the new tree's node.
        assert_eq!(registry.get(1).unwrap().handle, 7);
        assert!(registry.get(2).is_none());
    }

    #[test]
    fn single_clickable_button_scenario() {
        let tree = UiNode::new(42).clickable().with_text("Search");
        let mut registry = NodeRegistry::new();
        let text = TreeSerializer::serialize(&tree, &mut registry);

        assert_eq!(text, "<button id=1 text=\"Search\">\n");
        assert_eq!(registry.get(1).unwrap().handle, 42);
    }

    #[test]
    fn transparent_containers_do_not_consume_ids() {
        // Three stacked bare containers around one button: the button
        // must still get id 1.
        let tree = UiNode::new(1).with_children(vec![UiNode::new(2).with_children(vec![
            UiNode::new(3).with_children(vec![UiNode::new(4).clickable().with_text("Go")]),
        ])]);
        let mut registry = NodeRegistry::new();
        let text = TreeSerializer::serialize(&tree, &mut registry);
        assert_eq!(text, "<button id=1 text=\"Go\">\n");
        assert_eq!(registry.get(1).unwrap().parent, Some(3));
    }

    #[test]
    fn escapes_quotes_and_newlines() {
        let tree = UiNode::new(1).clickable().with_text("line one\nsays \"hi\"");
        let mut registry = NodeRegistry::new();
        let text = TreeSerializer::serialize(&tree, &mut registry);
        assert_eq!(text, "<button id=1 text=\"line one says 'hi'\">\n");
    }
}
