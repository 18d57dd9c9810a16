//! Minimal tree-sitter YAML navigation for registry documents
//!
//! Helm repository indexes and GitHub action manifests are YAML. Only
//! mappings, sequences and scalars are needed, so values are read straight
//! off the syntax tree instead of being deserialized.
//!
//! ```text
//! stream
//!   document
//!     block_node
//!       block_mapping
//!         block_mapping_pair      <- key: flow_node, value: block_node | flow_node
//!           block_sequence
//!             block_sequence_item <- "- ..."
//! ```

use tracing::warn;
use tree_sitter::{Node, Tree};

use crate::version::error::RegistryError;

/// Wrapper nodes skipped on the way to the mapping, sequence or scalar they hold
const WRAPPERS: [&str; 5] = [
    "stream",
    "document",
    "block_node",
    "flow_node",
    "block_sequence_item",
];

pub(crate) fn parse(content: &str) -> Result<Tree, RegistryError> {
    let mut parser = tree_sitter::Parser::new();
    let language = tree_sitter_yaml::LANGUAGE;
    parser.set_language(&language.into()).map_err(|e| {
        warn!("Failed to set YAML language for tree-sitter: {}", e);
        RegistryError::InvalidResponse(e.to_string())
    })?;

    parser.parse(content, None).ok_or_else(|| {
        warn!("Failed to parse YAML content");
        RegistryError::InvalidResponse("Failed to parse YAML".to_string())
    })
}

/// Descend through wrapper nodes, skipping anchors, tags and comments
pub(crate) fn inner(node: Node<'_>) -> Node<'_> {
    let mut current = node;
    while WRAPPERS.contains(&current.kind()) {
        let mut cursor = current.walk();
        let next = current
            .named_children(&mut cursor)
            .find(|child| !matches!(child.kind(), "comment" | "anchor" | "tag"));
        match next {
            Some(child) => current = child,
            None => break,
        }
    }
    current
}

/// Pair nodes of a block or flow mapping; empty for anything else
pub(crate) fn pair_nodes(node: Node<'_>) -> Vec<Node<'_>> {
    let mapping = inner(node);
    if !matches!(mapping.kind(), "block_mapping" | "flow_mapping") {
        return Vec::new();
    }

    let mut cursor = mapping.walk();
    mapping
        .named_children(&mut cursor)
        .filter(|pair| matches!(pair.kind(), "block_mapping_pair" | "flow_pair"))
        .collect()
}

/// Key/value pairs of a block or flow mapping; empty for anything else
pub(crate) fn mapping_pairs<'t>(node: Node<'t>, content: &str) -> Vec<(String, Node<'t>)> {
    pair_nodes(node)
        .into_iter()
        .filter_map(|pair| {
            let key = pair.child_by_field_name("key")?;
            let value = pair.child_by_field_name("value")?;
            Some((scalar_text(key, content), value))
        })
        .collect()
}

/// Value node of `key` in a mapping
pub(crate) fn get<'t>(node: Node<'t>, key: &str, content: &str) -> Option<Node<'t>> {
    mapping_pairs(node, content)
        .into_iter()
        .find_map(|(k, value)| (k == key).then_some(value))
}

/// Items of a block or flow sequence; empty for anything else
pub(crate) fn sequence_items(node: Node<'_>) -> Vec<Node<'_>> {
    let sequence = inner(node);
    if !matches!(sequence.kind(), "block_sequence" | "flow_sequence") {
        return Vec::new();
    }

    let mut cursor = sequence.walk();
    sequence
        .named_children(&mut cursor)
        .filter(|item| item.kind() != "comment")
        .collect()
}

/// Text content of a scalar node, removing quotes if present
pub(crate) fn scalar_text(node: Node<'_>, content: &str) -> String {
    let text = &content[node.byte_range()];
    text.trim()
        .trim_start_matches('"')
        .trim_end_matches('"')
        .trim_start_matches('\'')
        .trim_end_matches('\'')
        .to_string()
}

/// Source text of a node exactly as written
pub(crate) fn source<'c>(node: Node<'_>, content: &'c str) -> &'c str {
    &content[node.byte_range()]
}
