//! namecheck CLI library: configuration, rendering and the interactive session

pub mod repl;
pub mod system_config;
pub mod util;

pub use repl::{Outcome, ParseError, ReplCommand, Session};
pub use system_config::SystemConfig;
