//! Install an app on a single team unless it is already there.

use std::sync::Arc;

use crate::error::InstallationError;
use crate::teams::TeamsApi;
use crate::types::{AppId, InstallOutcome, TeamId};

/// Check-then-act installer for one team.
///
/// The check and the install are two separate remote calls, so another actor
/// can install the same app in between. That window is not closed here.
pub struct IdempotentInstaller<A: ?Sized> {
    api: Arc<A>,
}

impl<A: ?Sized> Clone for IdempotentInstaller<A> {
    fn clone(&self) -> Self {
        Self {
            api: Arc::clone(&self.api),
        }
    }
}

impl<A: TeamsApi + ?Sized> IdempotentInstaller<A> {
    pub fn new(api: Arc<A>) -> Self {
        Self { api }
    }

    pub fn api(&self) -> &Arc<A> {
        &self.api
    }

    /// Whether `app` is currently installed on `team`.
    pub async fn is_installed(
        &self,
        team: &TeamId,
        app: &AppId,
    ) -> Result<bool, InstallationError> {
        let installed = self
            .api
            .list_installed_apps(team)
            .await
            .map_err(|source| InstallationError::Query {
                team: team.clone(),
                source,
            })?;
        Ok(installed.contains(app))
    }

    /// Install `app` on `team` only if the team does not already have it.
    ///
    /// A failed query is returned as-is and no install is attempted.
    pub async fn install_if_absent(
        &self,
        team: &TeamId,
        app: &AppId,
    ) -> Result<InstallOutcome, InstallationError> {
        tracing::debug!(%team, %app, "Checking installed apps");
        if self.is_installed(team, app).await? {
            tracing::debug!(%team, %app, "App already installed");
            return Ok(InstallOutcome::AlreadyInstalled);
        }

        tracing::debug!(%team, %app, "Installing app");
        self.api
            .install_app(team, app)
            .await
            .map_err(|source| InstallationError::Command {
                team: team.clone(),
                app: app.clone(),
                source,
            })?;

        tracing::info!(%team, %app, "Installed app");
        Ok(InstallOutcome::Installed)
    }
}
