//! Action primitives - the page-facing edge of the replay engine
//!
//! This crate defines what the engine needs from the outside world:
//! - [`PageDriver`]: query, pointer, keyboard, navigation and upload primitives
//! - [`FileStore`]: persistence for screenshots and staged uploads
//! - [`ImageFetcher`]: image download for upload steps
//!
//! It also ships a local file store, an HTTP fetcher and [`ScriptedPage`],
//! a deterministic driver for rehearsals and tests.

mod driver;
pub mod errors;
mod fetch;
mod files;
mod scripted;
pub mod types;

pub use driver::*;
pub use errors::*;
pub use fetch::*;
pub use files::*;
pub use scripted::*;
pub use types::*;
