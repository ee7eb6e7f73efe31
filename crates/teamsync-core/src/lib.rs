//! Teamsync Core Library
//!
//! Installs an application on a set of Microsoft Teams teams, once per team,
//! skipping teams that already have it. Teams are processed concurrently and
//! failures are reported per team without stopping the batch.

pub mod config;
pub mod error;
pub mod install;
pub mod teams;
pub mod types;

/// Re-exports of commonly used types
pub mod prelude {
    // Configuration
    pub use crate::config::{ConfigOverrides, ConfigStore, RunSettings, TeamsyncConfig};

    // Errors
    pub use crate::error::{ApiError, InstallationError};

    // Install workflow
    pub use crate::install::{
        FanOutCoordinator, IdempotentInstaller, InstallErrorStream, TeamStatus,
    };

    // Collaborators
    pub use crate::teams::{
        ClientCredentials, GraphClient, GraphEndpoints, InstallationCommand, InstallationQuery,
        TeamsApi,
    };

    // Identifiers
    pub use crate::types::{AppId, InstallOutcome, InstallStage, TeamId};
}
