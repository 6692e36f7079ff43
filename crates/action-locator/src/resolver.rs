//! Element resolver with fallback chain orchestration

use std::sync::Arc;

use action_primitives::{DriverError, ElementHandle, PageDriver};
use async_trait::async_trait;
use retrace_core_types::{SelectorSet, SelectorStrategy};
use tracing::{debug, info};

use crate::{errors::LocatorError, types::ResolutionResult};

/// Element resolver trait
#[async_trait]
pub trait ElementResolver: Send + Sync {
    /// Walk `strategies` by ascending priority and return the first hit
    async fn resolve(
        &self,
        strategies: &[SelectorStrategy],
    ) -> Result<ResolutionResult, LocatorError>;

    /// Resolve a recorded selector set
    async fn resolve_set(&self, set: &SelectorSet) -> Result<ResolutionResult, LocatorError> {
        self.resolve(&set.strategies).await
    }
}

/// Resolves against a live page; `xpath` and `text` strategies are evaluated
/// as XPath, everything else as CSS.
pub struct DefaultElementResolver {
    page: Arc<dyn PageDriver>,
}

impl DefaultElementResolver {
    pub fn new(page: Arc<dyn PageDriver>) -> Self {
        Self { page }
    }

    async fn try_strategy(
        &self,
        strategy: &SelectorStrategy,
    ) -> Result<Option<ElementHandle>, DriverError> {
        if strategy.kind.is_xpath() {
            self.page.query_xpath(&strategy.value).await
        } else {
            self.page.query_selector(&strategy.value).await
        }
    }
}

#[async_trait]
impl ElementResolver for DefaultElementResolver {
    async fn resolve(
        &self,
        strategies: &[SelectorStrategy],
    ) -> Result<ResolutionResult, LocatorError> {
        if strategies.is_empty() {
            return Err(LocatorError::ElementNotFound(
                "no selector strategies recorded".to_string(),
            ));
        }

        let mut ordered: Vec<&SelectorStrategy> = strategies.iter().collect();
        ordered.sort_by_key(|s| s.priority);

        for (index, strategy) in ordered.iter().enumerate() {
            debug!(
                kind = strategy.kind.name(),
                priority = strategy.priority,
                selector = %strategy.value,
                "trying strategy"
            );

            match self.try_strategy(strategy).await {
                Ok(Some(element)) => {
                    info!(
                        kind = strategy.kind.name(),
                        selector = %strategy.value,
                        element = %element,
                        "resolved element"
                    );
                    return Ok(ResolutionResult::new(
                        element,
                        (*strategy).clone(),
                        index + 1,
                    ));
                }
                Ok(None) => {
                    debug!(kind = strategy.kind.name(), "strategy matched nothing");
                }
                Err(err) => {
                    debug!(kind = strategy.kind.name(), error = %err, "strategy failed");
                }
            }
        }

        Err(LocatorError::ElementNotFound(format!(
            "all {} strategies exhausted",
            ordered.len()
        )))
    }
}
