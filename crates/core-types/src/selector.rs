//! Selector strategies captured at recording time

use std::fmt;

use serde::{Deserialize, Serialize};

/// Locator technique behind a [`SelectorStrategy`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StrategyKind {
    Id,
    Testid,
    AriaLabel,
    Name,
    RoleName,
    Class,
    InputType,
    Placeholder,
    Text,
    Xpath,
    CssPath,
}

impl StrategyKind {
    /// Get strategy name as string
    pub fn name(&self) -> &'static str {
        match self {
            StrategyKind::Id => "id",
            StrategyKind::Testid => "testid",
            StrategyKind::AriaLabel => "aria-label",
            StrategyKind::Name => "name",
            StrategyKind::RoleName => "role-name",
            StrategyKind::Class => "class",
            StrategyKind::InputType => "input-type",
            StrategyKind::Placeholder => "placeholder",
            StrategyKind::Text => "text",
            StrategyKind::Xpath => "xpath",
            StrategyKind::CssPath => "css-path",
        }
    }

    /// Whether the value is an XPath expression rather than a CSS selector
    pub fn is_xpath(&self) -> bool {
        matches!(self, StrategyKind::Xpath | StrategyKind::Text)
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One way of finding an element again. Lower priority means higher confidence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectorStrategy {
    #[serde(rename = "type")]
    pub kind: StrategyKind,
    pub value: String,
    pub priority: u32,
}

impl SelectorStrategy {
    pub fn new(kind: StrategyKind, value: impl Into<String>, priority: u32) -> Self {
        Self {
            kind,
            value: value.into(),
            priority,
        }
    }
}

/// Accessibility description of the recorded element, kept for diagnostics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementMetadata {
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
}

/// Redundant, priority-ordered locators for a single element.
///
/// `strategies` is always sorted ascending by priority and `best_selector`
/// mirrors the first strategy's value (empty when there are none). Build
/// through [`SelectorSet::from_strategies`] to keep that invariant.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectorSet {
    pub best_selector: String,
    pub strategies: Vec<SelectorStrategy>,
    #[serde(default)]
    pub element_metadata: ElementMetadata,
}

impl SelectorSet {
    pub fn from_strategies(
        mut strategies: Vec<SelectorStrategy>,
        element_metadata: ElementMetadata,
    ) -> Self {
        strategies.sort_by_key(|s| s.priority);
        let best_selector = strategies
            .first()
            .map(|s| s.value.clone())
            .unwrap_or_default();
        Self {
            best_selector,
            strategies,
            element_metadata,
        }
    }

    /// Single hand-written CSS selector, used when a step is entered manually.
    pub fn from_css(selector: impl Into<String>) -> Self {
        Self::from_strategies(
            vec![SelectorStrategy::new(StrategyKind::CssPath, selector, 1)],
            ElementMetadata::default(),
        )
    }

    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }
}
