//! Concurrent install across many teams with per-team error delivery.

use std::collections::{BTreeMap, HashSet};
use std::future::Future;
use std::sync::Arc;

use tokio::sync::{OwnedSemaphorePermit, Semaphore, mpsc};
use tokio::task::JoinSet;

use super::installer::IdempotentInstaller;
use crate::error::InstallationError;
use crate::teams::TeamsApi;
use crate::types::{AppId, TeamId};

const LOST_UNIT_REASON: &str = "task panicked or was cancelled before reporting a result";

/// Errors from one batch, in completion order.
///
/// The stream ends (`next` returns `None`) only after every team in the batch
/// has finished. Dropping it early does not stop the batch.
#[derive(Debug)]
pub struct InstallErrorStream {
    receiver: mpsc::UnboundedReceiver<InstallationError>,
}

impl InstallErrorStream {
    /// Wait for the next failed team, or `None` once the batch is done.
    pub async fn next(&mut self) -> Option<InstallationError> {
        self.receiver.recv().await
    }

    /// Drain the stream until the batch completes.
    pub async fn collect(mut self) -> Vec<InstallationError> {
        let mut errors = Vec::new();
        while let Some(err) = self.next().await {
            errors.push(err);
        }
        errors
    }
}

/// Read-only installation state of one team.
#[derive(Debug)]
pub struct TeamStatus {
    pub team: TeamId,
    /// `Ok(true)` when the app is present
    pub installed: Result<bool, InstallationError>,
}

/// Applies [`IdempotentInstaller`] to every team concurrently.
pub struct FanOutCoordinator<A: ?Sized> {
    installer: IdempotentInstaller<A>,
    max_concurrency: Option<usize>,
}

impl<A: TeamsApi + ?Sized + 'static> FanOutCoordinator<A> {
    /// One task per team, with no limit on how many run at once.
    pub fn new(api: Arc<A>) -> Self {
        Self {
            installer: IdempotentInstaller::new(api),
            max_concurrency: None,
        }
    }

    /// Cap the number of teams processed at the same time.
    pub fn with_max_concurrency(mut self, limit: usize) -> Self {
        self.max_concurrency = Some(limit.max(1));
        self
    }

    pub fn max_concurrency(&self) -> Option<usize> {
        self.max_concurrency
    }

    pub fn installer(&self) -> &IdempotentInstaller<A> {
        &self.installer
    }

    /// Start installing `app` on every team and return the error stream.
    ///
    /// Must be called from inside a Tokio runtime. Repeated team IDs are
    /// processed once. The batch cannot be cancelled once started.
    pub fn install_across_teams(
        &self,
        teams: Vec<TeamId>,
        app: AppId,
    ) -> InstallErrorStream {
        let (sender, receiver) = mpsc::unbounded_channel();
        let teams = dedupe(teams);
        tracing::info!(teams = teams.len(), %app, "Starting install batch");

        let installer = self.installer.clone();
        let units = UnitSet::spawn_all(teams, self.gate(), move |team| {
            let installer = installer.clone();
            let app = app.clone();
            async move { installer.install_if_absent(&team, &app).await }
        });

        tokio::spawn(async move {
            let mut failed = 0usize;
            let mut deliver = |err: InstallationError| {
                failed += 1;
                tracing::debug!(team = %err.team(), stage = %err.stage(), "Team install failed");
                if let Err(mpsc::error::SendError(err)) = sender.send(err) {
                    tracing::warn!(
                        team = %err.team(),
                        error = %err,
                        "Error stream dropped by caller"
                    );
                }
            };

            let total = units.len();
            let lost = units
                .join_all(|_, _, result| {
                    if let Err(err) = result {
                        deliver(err);
                    }
                })
                .await;
            for (_, team) in lost {
                deliver(InstallationError::Aborted {
                    team,
                    reason: LOST_UNIT_REASON.to_string(),
                });
            }

            tracing::info!(teams = total, failed, "Install batch complete");
            // `sender` drops here, closing the stream after every unit joined.
        });

        InstallErrorStream { receiver }
    }

    /// Query every team concurrently and report whether `app` is installed.
    ///
    /// Never issues install commands. Results follow the input order.
    pub async fn installation_status(
        &self,
        teams: Vec<TeamId>,
        app: &AppId,
    ) -> Vec<TeamStatus> {
        let installer = self.installer.clone();
        let app = app.clone();
        let units = UnitSet::spawn_all(dedupe(teams), self.gate(), move |team| {
            let installer = installer.clone();
            let app = app.clone();
            async move { installer.is_installed(&team, &app).await }
        });

        let mut statuses = Vec::with_capacity(units.len());
        let lost = units
            .join_all(|index, team, installed| {
                statuses.push((index, TeamStatus { team, installed }));
            })
            .await;
        for (index, team) in lost {
            let installed = Err(InstallationError::Aborted {
                team: team.clone(),
                reason: LOST_UNIT_REASON.to_string(),
            });
            statuses.push((index, TeamStatus { team, installed }));
        }

        statuses.sort_by_key(|(index, _)| *index);
        statuses.into_iter().map(|(_, status)| status).collect()
    }

    fn gate(&self) -> Option<Arc<Semaphore>> {
        self.max_concurrency.map(|limit| Arc::new(Semaphore::new(limit)))
    }
}

/// One spawned task per team, tracked until joined.
struct UnitSet<T> {
    tasks: JoinSet<(usize, T)>,
    pending: BTreeMap<usize, TeamId>,
}

impl<T: Send + 'static> UnitSet<T> {
    fn spawn_all<F, Fut>(teams: Vec<TeamId>, gate: Option<Arc<Semaphore>>, work: F) -> Self
    where
        F: Fn(TeamId) -> Fut,
        Fut: Future<Output = T> + Send + 'static,
    {
        let mut tasks = JoinSet::new();
        let mut pending = BTreeMap::new();
        for (index, team) in teams.into_iter().enumerate() {
            pending.insert(index, team.clone());
            let unit = work(team);
            let gate = gate.clone();
            tasks.spawn(async move {
                let _permit = acquire(gate).await;
                (index, unit.await)
            });
        }
        Self { tasks, pending }
    }

    fn len(&self) -> usize {
        self.pending.len()
    }

    /// Join every task, handing each result to `on_finished`.
    ///
    /// Returns the teams whose task never produced a result.
    async fn join_all<F>(mut self, mut on_finished: F) -> Vec<(usize, TeamId)>
    where
        F: FnMut(usize, TeamId, T),
    {
        while let Some(joined) = self.tasks.join_next().await {
            match joined {
                Ok((index, output)) => {
                    if let Some(team) = self.pending.remove(&index) {
                        on_finished(index, team, output);
                    }
                }
                Err(err) => tracing::error!(error = %err, "Team task did not complete"),
            }
        }
        self.pending.into_iter().collect()
    }
}

async fn acquire(gate: Option<Arc<Semaphore>>) -> Option<OwnedSemaphorePermit> {
    match gate {
        // The semaphore is never closed, so acquisition only fails if that changes.
        Some(gate) => gate.acquire_owned().await.ok(),
        None => None,
    }
}

fn dedupe(teams: Vec<TeamId>) -> Vec<TeamId> {
    let mut seen = HashSet::with_capacity(teams.len());
    let mut unique = Vec::with_capacity(teams.len());
    for team in teams {
        if seen.insert(team.clone()) {
            unique.push(team);
        } else {
            tracing::debug!(%team, "Skipping repeated team");
        }
    }
    unique
}
