//! CLI library for testing purposes

pub mod args;
pub mod bios;
pub mod config;
pub mod logging;
pub mod uqi;

pub use config::{UnitoolConfig, UqiConfig, load_config};
pub use uqi::{UqiCommandOptions, resolve_options, run_uqi_command};
