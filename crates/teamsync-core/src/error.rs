//! Error types for the install workflow.

use thiserror::Error;

use crate::types::{AppId, InstallStage, TeamId};

/// Failure reported by a teams collaborator (query or command call).
#[derive(Error, Debug)]
pub enum ApiError {
    /// Connection, TLS or body read failure
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success status from the remote service
    #[error("Service returned {status}: {message}")]
    Status { status: u16, message: String },

    /// Response body did not match the expected shape
    #[error("Failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),

    /// Token acquisition failed
    #[error("Authentication error: {0}")]
    Auth(String),

    /// Transport failure not tied to a specific HTTP client
    #[error("Transport error: {0}")]
    Transport(String),
}

/// A failed install attempt for one team.
///
/// Every variant names the team so callers draining a batch stream can tell
/// which installation it belongs to.
#[derive(Error, Debug)]
pub enum InstallationError {
    /// Installed apps could not be listed; no install was attempted
    #[error("Failed to list installed apps for team {team}: {source}")]
    Query {
        team: TeamId,
        #[source]
        source: ApiError,
    },

    /// The install request was rejected or could not be delivered
    #[error("Failed to install app {app} on team {team}: {source}")]
    Command {
        team: TeamId,
        app: AppId,
        #[source]
        source: ApiError,
    },

    /// The unit of work for this team panicked or was cancelled by the runtime
    #[error("Install on team {team} aborted: {reason}")]
    Aborted { team: TeamId, reason: String },
}

impl InstallationError {
    pub fn team(&self) -> &TeamId {
        match self {
            InstallationError::Query { team, .. }
            | InstallationError::Command { team, .. }
            | InstallationError::Aborted { team, .. } => team,
        }
    }

    pub fn stage(&self) -> InstallStage {
        match self {
            InstallationError::Query { .. } => InstallStage::Query,
            InstallationError::Command { .. } => InstallStage::Command,
            InstallationError::Aborted { .. } => InstallStage::Aborted,
        }
    }
}
