//! Element location for workflow recording and replay
//!
//! - [`SelectorStrategyGenerator`] derives up to eleven redundant locators
//!   for a live element when a step is recorded
//! - [`ElementResolver`] walks those locators by priority at replay time and
//!   returns the first one that still matches

mod escape;
pub mod errors;
pub mod generator;
pub mod resolver;
pub mod types;

pub use errors::*;
pub use escape::{css_escape_ident, css_string, xpath_literal};
pub use generator::*;
pub use resolver::*;
pub use types::*;
