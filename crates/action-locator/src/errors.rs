//! Error types for locator system

use action_primitives::DriverError;
use thiserror::Error;

/// Locator error enumeration
#[derive(Debug, Error, Clone)]
pub enum LocatorError {
    /// Element not found with any strategy
    #[error("Element not found: {0}")]
    ElementNotFound(String),

    /// The page could not describe the element being recorded
    #[error("Cannot describe element: {0}")]
    DescribeFailed(#[source] DriverError),
}
