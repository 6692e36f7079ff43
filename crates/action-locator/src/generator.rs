//! Selector strategy generation at recording time
//!
//! A live element is described once by the page ([`ElementSnapshot`]) and
//! every candidate locator is derived from that snapshot without further
//! round trips.

use action_primitives::{ElementHandle, ElementSnapshot, NodeStep, PageDriver};
use retrace_core_types::{SelectorSet, SelectorStrategy, StrategyKind};
use tracing::debug;

use crate::errors::LocatorError;
use crate::escape::{css_escape_ident, css_string, is_plain_ident, xpath_literal};

/// Attributes checked, in order, for a test id
pub const TEST_ID_ATTRIBUTES: [&str; 3] = ["data-testid", "data-test", "data-cy"];

/// Maximum class names folded into the class strategy
pub const MAX_CLASSES: usize = 3;

/// Text locators are only emitted for labels shorter than this (in chars)
pub const MAX_TEXT_CHARS: usize = 50;

#[derive(Debug, Clone, Copy, Default)]
pub struct SelectorStrategyGenerator;

impl SelectorStrategyGenerator {
    pub fn new() -> Self {
        Self
    }

    /// Describe `element` through the page and derive its selector set.
    pub async fn capture(
        &self,
        page: &dyn PageDriver,
        element: &ElementHandle,
    ) -> Result<SelectorSet, LocatorError> {
        let snapshot = page
            .describe_element(element)
            .await
            .map_err(LocatorError::DescribeFailed)?;
        let set = self.generate(&snapshot);
        debug!(
            element = %element,
            strategies = set.strategies.len(),
            best = %set.best_selector,
            "captured selector set"
        );
        Ok(set)
    }

    /// Derive every applicable strategy from a snapshot. Never fails; absent
    /// attributes simply produce fewer strategies.
    pub fn generate(&self, snapshot: &ElementSnapshot) -> SelectorSet {
        let tag = snapshot.tag.to_ascii_lowercase();
        let mut strategies = Vec::with_capacity(11);

        if let Some(id) = snapshot.attr("id") {
            let selector = if is_plain_ident(id) {
                format!("#{}", id)
            } else {
                format!("#{}", css_escape_ident(id))
            };
            strategies.push(SelectorStrategy::new(StrategyKind::Id, selector, 1));
        }

        if let Some((attr, value)) = TEST_ID_ATTRIBUTES
            .iter()
            .find_map(|attr| snapshot.attr(attr).map(|v| (*attr, v)))
        {
            strategies.push(SelectorStrategy::new(
                StrategyKind::Testid,
                attribute_selector(attr, value),
                2,
            ));
        }

        let aria_label = snapshot.attr("aria-label");
        if let Some(label) = aria_label {
            strategies.push(SelectorStrategy::new(
                StrategyKind::AriaLabel,
                attribute_selector("aria-label", label),
                3,
            ));
        }

        if let Some(name) = snapshot.attr("name") {
            strategies.push(SelectorStrategy::new(
                StrategyKind::Name,
                attribute_selector("name", name),
                4,
            ));
        }

        if let (Some(role), Some(label)) = (snapshot.attr("role"), aria_label) {
            strategies.push(SelectorStrategy::new(
                StrategyKind::RoleName,
                format!(
                    "{}{}",
                    attribute_selector("role", role),
                    attribute_selector("aria-label", label)
                ),
                5,
            ));
        }

        let classes: Vec<&str> = snapshot
            .classes
            .iter()
            .map(|c| c.trim())
            .filter(|c| !c.is_empty())
            .take(MAX_CLASSES)
            .collect();
        if !classes.is_empty() {
            let mut selector = tag.clone();
            for class in classes {
                selector.push('.');
                selector.push_str(&css_escape_ident(class));
            }
            strategies.push(SelectorStrategy::new(StrategyKind::Class, selector, 6));
        }

        if tag == "input" {
            if let Some(input_type) = snapshot.attr("type") {
                strategies.push(SelectorStrategy::new(
                    StrategyKind::InputType,
                    format!("input{}", attribute_selector("type", input_type)),
                    7,
                ));
            }
        }

        if let Some(placeholder) = snapshot.attr("placeholder") {
            strategies.push(SelectorStrategy::new(
                StrategyKind::Placeholder,
                attribute_selector("placeholder", placeholder),
                8,
            ));
        }

        if tag == "button" || tag == "a" {
            if let Some(text) = snapshot.text.as_deref().map(normalize_space) {
                if !text.is_empty() && text.chars().count() < MAX_TEXT_CHARS {
                    strategies.push(SelectorStrategy::new(
                        StrategyKind::Text,
                        format!("//{}[normalize-space(.)={}]", tag, xpath_literal(&text)),
                        9,
                    ));
                }
            }
        }

        let lineage = effective_lineage(snapshot);
        strategies.push(SelectorStrategy::new(
            StrategyKind::Xpath,
            absolute_xpath(&lineage),
            10,
        ));
        strategies.push(SelectorStrategy::new(
            StrategyKind::CssPath,
            css_path(&lineage),
            11,
        ));

        SelectorSet::from_strategies(strategies, snapshot.accessibility.clone())
    }
}

fn attribute_selector(attr: &str, value: &str) -> String {
    format!("[{}={}]", attr, css_string(value))
}

fn normalize_space(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Snapshot lineage with the element's own id filled in; a missing lineage
/// degrades to the element alone.
fn effective_lineage(snapshot: &ElementSnapshot) -> Vec<NodeStep> {
    let mut lineage = if snapshot.lineage.is_empty() {
        vec![NodeStep::single(snapshot.tag.to_ascii_lowercase())]
    } else {
        snapshot.lineage.clone()
    };
    if let Some(own) = lineage.first_mut() {
        if own.id.as_deref().map_or(true, |id| id.trim().is_empty()) {
            own.id = snapshot.attr("id").map(str::to_string);
        }
    }
    lineage
}

/// `tag[n]` from the root down, restarting at the nearest node with an id.
fn absolute_xpath(lineage: &[NodeStep]) -> String {
    let mut segments = Vec::new();
    let mut anchor = None;
    for node in lineage {
        if let Some(id) = node.id.as_deref().filter(|id| !id.trim().is_empty()) {
            anchor = Some(format!("//*[@id={}]", xpath_literal(id)));
            break;
        }
        segments.push(format!(
            "{}[{}]",
            node.tag.to_ascii_lowercase(),
            node.same_tag_index.max(1)
        ));
    }
    segments.reverse();
    match anchor {
        Some(anchor) if segments.is_empty() => anchor,
        Some(anchor) => format!("{}/{}", anchor, segments.join("/")),
        None => format!("/{}", segments.join("/")),
    }
}

/// Structural CSS path joined with ` > `, restarting at the nearest ancestor
/// with an id. `:nth-of-type` is only added where same-tag siblings exist.
fn css_path(lineage: &[NodeStep]) -> String {
    let mut segments = Vec::new();
    for (depth, node) in lineage.iter().enumerate() {
        if depth > 0 {
            if let Some(id) = node.id.as_deref().filter(|id| !id.trim().is_empty()) {
                segments.push(format!("#{}", css_escape_ident(id)));
                break;
            }
        }
        let tag = node.tag.to_ascii_lowercase();
        if node.same_tag_count > 1 {
            segments.push(format!("{}:nth-of-type({})", tag, node.same_tag_index.max(1)));
        } else {
            segments.push(tag);
        }
    }
    segments.reverse();
    segments.join(" > ")
}
