//! CLI subcommand implementations.

pub mod logs;
pub mod platforms;
pub mod sync;
