//! CLI command implementations for kiln.
//!
//! Each module corresponds to a subcommand (`kiln <command>`).

pub mod generate;
pub mod list;
pub mod validate;
pub mod verify;
