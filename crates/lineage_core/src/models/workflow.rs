//! Typed workflow document embedded in generated clips.
//!
//! The document is a mapping of node id to node. Each node carries a
//! `class_type` discriminator and an `inputs` mapping. Only the node types
//! the matcher cares about are named; everything else is kept as
//! [`NodeKind::Other`] and never inspected.

use std::collections::BTreeMap;
use std::path::Path;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Discriminator of a workflow node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum NodeKind {
    /// Loads a still image from disk (the seed frame).
    LoadImage,
    /// Text prompt encoder.
    ClipTextEncode,
    /// Plain prompt node.
    Prompt,
    /// Any other node type, kept verbatim.
    Other(String),
}

impl From<String> for NodeKind {
    fn from(value: String) -> Self {
        match value.as_str() {
            "LoadImage" => NodeKind::LoadImage,
            "CLIPTextEncode" => NodeKind::ClipTextEncode,
            "Prompt" => NodeKind::Prompt,
            _ => NodeKind::Other(value),
        }
    }
}

impl From<NodeKind> for String {
    fn from(kind: NodeKind) -> Self {
        match kind {
            NodeKind::LoadImage => "LoadImage".to_string(),
            NodeKind::ClipTextEncode => "CLIPTextEncode".to_string(),
            NodeKind::Prompt => "Prompt".to_string(),
            NodeKind::Other(name) => name,
        }
    }
}

/// A single node of a workflow document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowNode {
    /// Node type.
    pub class_type: NodeKind,
    /// Node inputs (literal values or links to other nodes).
    #[serde(default)]
    pub inputs: Map<String, Value>,
    /// Remaining node fields (`_meta` etc.), round-tripped untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl WorkflowNode {
    /// Create a node with the given type and inputs.
    pub fn new(class_type: NodeKind, inputs: Map<String, Value>) -> Self {
        Self {
            class_type,
            inputs,
            extra: Map::new(),
        }
    }

    /// Get a string input by name.
    pub fn input_str(&self, name: &str) -> Option<&str> {
        self.inputs.get(name).and_then(|v| v.as_str())
    }
}

/// Workflow document: node id -> node, iterated in node-id order.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Workflow {
    nodes: BTreeMap<String, WorkflowNode>,
}

impl Workflow {
    /// All nodes, ordered by node id.
    pub fn nodes(&self) -> impl Iterator<Item = (&str, &WorkflowNode)> {
        self.nodes.iter().map(|(id, node)| (id.as_str(), node))
    }

    /// Look up a node by id.
    pub fn node(&self, id: &str) -> Option<&WorkflowNode> {
        self.nodes.get(id)
    }

    /// Number of nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Check if the document has no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Find the frame image this workflow was seeded from.
    ///
    /// Returns the basename of the first `LoadImage` input whose file name
    /// matches `frame_pattern`.
    pub fn seed_image(&self, frame_pattern: &Regex) -> Option<String> {
        self.nodes().find_map(|(_, node)| {
            if node.class_type != NodeKind::LoadImage {
                return None;
            }
            let image = node.input_str("image")?;
            let name = Path::new(image).file_name()?.to_str()?;
            frame_pattern.is_match(name).then(|| name.to_string())
        })
    }

    /// Text of the first prompt node, trimmed.
    pub fn prompt_text(&self) -> Option<String> {
        self.nodes().find_map(|(_, node)| match node.class_type {
            NodeKind::ClipTextEncode | NodeKind::Prompt => node
                .input_str("text")
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(str::to_string),
            _ => None,
        })
    }
}
