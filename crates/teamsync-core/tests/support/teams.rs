//! In-memory teams collaborator for workflow tests.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use teamsync_core::error::ApiError;
use teamsync_core::teams::{InstallationCommand, InstallationQuery};
use teamsync_core::types::{AppId, TeamId};

/// Fake service holding per-team installed apps.
///
/// Like the real service, installing an app that is already present fails
/// with a conflict.
#[derive(Default)]
pub struct MockTeamsApi {
    installed: Mutex<HashMap<TeamId, HashSet<AppId>>>,
    failing_queries: HashSet<TeamId>,
    failing_installs: HashSet<TeamId>,
    panicking_queries: HashSet<TeamId>,
    query_delay: Option<Duration>,
    query_calls: Mutex<Vec<TeamId>>,
    install_calls: Mutex<Vec<(TeamId, AppId)>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl MockTeamsApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_installed(self, team: &str, apps: &[&str]) -> Self {
        self.installed
            .lock()
            .unwrap()
            .entry(TeamId::from(team))
            .or_default()
            .extend(apps.iter().map(|app| AppId::from(*app)));
        self
    }

    pub fn with_failing_query(mut self, team: &str) -> Self {
        self.failing_queries.insert(TeamId::from(team));
        self
    }

    pub fn with_failing_install(mut self, team: &str) -> Self {
        self.failing_installs.insert(TeamId::from(team));
        self
    }

    pub fn with_panicking_query(mut self, team: &str) -> Self {
        self.panicking_queries.insert(TeamId::from(team));
        self
    }

    /// Hold every query open for `delay` after reading state.
    pub fn with_query_delay(mut self, delay: Duration) -> Self {
        self.query_delay = Some(delay);
        self
    }

    pub fn has_app(&self, team: &str, app: &str) -> bool {
        self.installed
            .lock()
            .unwrap()
            .get(&TeamId::from(team))
            .is_some_and(|apps| apps.contains(&AppId::from(app)))
    }

    pub fn query_count(&self, team: &str) -> usize {
        let team = TeamId::from(team);
        self.query_calls
            .lock()
            .unwrap()
            .iter()
            .filter(|t| **t == team)
            .count()
    }

    pub fn install_count(&self, team: &str) -> usize {
        let team = TeamId::from(team);
        self.install_calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(t, _)| *t == team)
            .count()
    }

    pub fn total_installs(&self) -> usize {
        self.install_calls.lock().unwrap().len()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl InstallationQuery for MockTeamsApi {
    async fn list_installed_apps(&self, team: &TeamId) -> Result<HashSet<AppId>, ApiError> {
        self.query_calls.lock().unwrap().push(team.clone());
        if self.panicking_queries.contains(team) {
            panic!("query for {} blew up", team);
        }

        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);

        let snapshot = if self.failing_queries.contains(team) {
            Err(ApiError::Transport(format!("connection reset while querying {}", team)))
        } else {
            Ok(self
                .installed
                .lock()
                .unwrap()
                .get(team)
                .cloned()
                .unwrap_or_default())
        };

        if let Some(delay) = self.query_delay {
            tokio::time::sleep(delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        snapshot
    }
}

#[async_trait]
impl InstallationCommand for MockTeamsApi {
    async fn install_app(&self, team: &TeamId, app: &AppId) -> Result<(), ApiError> {
        self.install_calls
            .lock()
            .unwrap()
            .push((team.clone(), app.clone()));

        if self.failing_installs.contains(team) {
            return Err(ApiError::Status {
                status: 403,
                message: "Forbidden: app not allowed for this team".to_string(),
            });
        }

        let mut installed = self.installed.lock().unwrap();
        let apps = installed.entry(team.clone()).or_default();
        if !apps.insert(app.clone()) {
            return Err(ApiError::Status {
                status: 409,
                message: "Conflict: app is already installed".to_string(),
            });
        }
        Ok(())
    }
}
