//! Subcommand implementations.
//!
//! Each command owns its CLI args and execution logic.

mod latest;
mod tail;
mod watch;

pub use latest::Latest;
pub use tail::Tail;
pub use watch::Watch;
