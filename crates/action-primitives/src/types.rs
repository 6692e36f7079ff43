//! Core data types exchanged with the page driver

use std::collections::BTreeMap;
use std::fmt;

use retrace_core_types::ElementMetadata;
use serde::{Deserialize, Serialize};

/// Opaque reference to a live element owned by the page driver.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ElementHandle {
    /// Driver-assigned identifier
    pub id: String,
}

impl ElementHandle {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

impl fmt::Display for ElementHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id)
    }
}

/// Scroll behavior (smooth vs instant)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScrollBehavior {
    /// Smooth animated scroll
    Smooth,

    /// Instant jump to position
    Instant,
}

impl Default for ScrollBehavior {
    fn default() -> Self {
        ScrollBehavior::Smooth
    }
}

/// Primitive whose side effects the driver is asked to let settle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActionKind {
    Click,
    Hover,
    Navigate,
}

/// One node on the path from an element up to the document root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeStep {
    /// Lower-case tag name
    pub tag: String,
    #[serde(default)]
    pub id: Option<String>,
    /// 1-based position among siblings sharing the tag
    pub same_tag_index: u32,
    /// Number of siblings (including this node) sharing the tag
    pub same_tag_count: u32,
}

impl NodeStep {
    pub fn new(tag: impl Into<String>, same_tag_index: u32, same_tag_count: u32) -> Self {
        Self {
            tag: tag.into(),
            id: None,
            same_tag_index,
            same_tag_count,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Only child of its tag among its siblings
    pub fn single(tag: impl Into<String>) -> Self {
        Self::new(tag, 1, 1)
    }
}

/// Everything the page reports about a live element in one round trip.
///
/// `lineage[0]` is the element itself and the last entry is the document
/// root.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementSnapshot {
    pub tag: String,
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
    #[serde(default)]
    pub classes: Vec<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub lineage: Vec<NodeStep>,
    #[serde(default)]
    pub accessibility: ElementMetadata,
}

impl ElementSnapshot {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into().to_ascii_lowercase(),
            ..Self::default()
        }
    }

    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    pub fn with_classes<I, S>(mut self, classes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.classes = classes.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn with_lineage(mut self, lineage: Vec<NodeStep>) -> Self {
        self.lineage = lineage;
        self
    }

    pub fn with_accessibility(mut self, metadata: ElementMetadata) -> Self {
        self.accessibility = metadata;
        self
    }

    /// Attribute value, ignoring blank values.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .get(name)
            .map(String::as_str)
            .filter(|v| !v.trim().is_empty())
    }
}

/// Downloaded image payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedImage {
    pub bytes: Vec<u8>,
    pub mime: String,
}
