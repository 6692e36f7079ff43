pub mod app;
pub mod commands;
pub mod config;
pub mod context;
pub mod dispatch;
pub mod env;
pub mod rehearse;
pub mod runtime;
pub mod step;
pub mod timing;
pub mod vars;
pub mod workflow;

pub use app::run;
pub use context::CliContext;
pub use env::CliArgs;
