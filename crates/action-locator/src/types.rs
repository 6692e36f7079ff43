//! Core types for locator system

use action_primitives::ElementHandle;
use retrace_core_types::SelectorStrategy;

/// Element found by the resolver together with the strategy that found it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolutionResult {
    /// Live element handle
    pub element: ElementHandle,

    /// Strategy that resolved
    pub strategy: SelectorStrategy,

    /// Strategies tried, including the winning one
    pub attempts: usize,
}

impl ResolutionResult {
    pub fn new(element: ElementHandle, strategy: SelectorStrategy, attempts: usize) -> Self {
        Self {
            element,
            strategy,
            attempts,
        }
    }
}
