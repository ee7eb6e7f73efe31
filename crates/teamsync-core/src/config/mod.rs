//! Configuration for teamsync runs
//!
//! Values come from two layers:
//! - `teamsync.toml` (defaults to `<config dir>/teamsync/teamsync.toml`)
//! - command-line overrides, which win over the file
//!
//! The client secret is only accepted as an override.

pub mod parser;
pub mod schema;
pub mod store;

pub use parser::{parse_teamsync_toml, parse_teamsync_toml_str, to_toml};
pub use schema::{ConfigOverrides, EndpointsConfig, RunSettings, TeamsyncConfig};
pub use store::ConfigStore;

/// Environment variable read by the CLI for the client secret.
pub const CLIENT_SECRET_ENV: &str = "TEAMSYNC_CLIENT_SECRET";

/// File name of the config file.
pub const CONFIG_FILE_NAME: &str = "teamsync.toml";
