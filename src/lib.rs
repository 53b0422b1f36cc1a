// Library target holds the registry, parser and dispatch engine; the
// `cypress` binary in main.rs is the only supported entry point.

pub mod binary;
pub mod cli;
pub mod config;
pub mod descriptions;
pub mod dispatch;
pub mod error;
pub mod logging;
pub mod options;
