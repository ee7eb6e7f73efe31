//! Teams collaborator layer
//!
//! The install workflow only needs two capabilities from the remote service:
//! - listing the apps installed on a team
//! - installing an app on a team
//!
//! Both are expressed as traits so the workflow can run against the
//! Microsoft Graph client or an in-memory double.

pub mod auth;
pub mod graph;
pub mod schema;

use std::collections::HashSet;

use async_trait::async_trait;

use crate::error::ApiError;
use crate::types::{AppId, TeamId};

pub use auth::{ClientCredentials, TokenProvider};
pub use graph::{GraphClient, GraphEndpoints};

/// Read side: what is installed on a team right now.
#[async_trait]
pub trait InstallationQuery: Send + Sync {
    /// List the catalog IDs of apps installed on `team`, as of this call.
    ///
    /// Results are never cached; an error must not be read as "not installed".
    async fn list_installed_apps(&self, team: &TeamId) -> Result<HashSet<AppId>, ApiError>;
}

/// Write side: request an install.
#[async_trait]
pub trait InstallationCommand: Send + Sync {
    /// Install `app` on `team`.
    ///
    /// Not required to be idempotent: installing an app that is already
    /// present may fail.
    async fn install_app(&self, team: &TeamId, app: &AppId) -> Result<(), ApiError>;
}

/// Combined collaborator used by the install workflow.
pub trait TeamsApi: InstallationQuery + InstallationCommand {}

impl<T: InstallationQuery + InstallationCommand> TeamsApi for T {}
