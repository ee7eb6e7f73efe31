//! Microsoft Graph implementation of the teams collaborator.

use std::collections::HashSet;

use async_trait::async_trait;
use url::Url;

use super::auth::{ClientCredentials, TokenProvider};
use super::schema::{GraphErrorEnvelope, InstallAppRequest, InstalledAppsPage};
use super::{InstallationCommand, InstallationQuery};
use crate::error::ApiError;
use crate::types::{AppId, TeamId};

pub const DEFAULT_GRAPH_URL: &str = "https://graph.microsoft.com/v1.0";
pub const DEFAULT_AUTHORITY_URL: &str = "https://login.microsoftonline.com";

const USER_AGENT: &str = concat!("teamsync/", env!("CARGO_PKG_VERSION"));

/// Base URLs for the Graph API and the token authority.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphEndpoints {
    pub graph: Url,
    pub authority: Url,
}

impl Default for GraphEndpoints {
    fn default() -> Self {
        Self {
            graph: Url::parse(DEFAULT_GRAPH_URL).expect("default graph URL is valid"),
            authority: Url::parse(DEFAULT_AUTHORITY_URL).expect("default authority URL is valid"),
        }
    }
}

/// Authenticated Graph client for team app installations.
#[derive(Debug)]
pub struct GraphClient {
    http: reqwest::Client,
    endpoints: GraphEndpoints,
    tokens: TokenProvider,
}

impl GraphClient {
    pub fn new(
        endpoints: GraphEndpoints,
        credentials: ClientCredentials,
    ) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder().user_agent(USER_AGENT).build()?;
        let tokens = TokenProvider::new(http.clone(), &endpoints.authority, credentials)?;
        Ok(Self {
            http,
            endpoints,
            tokens,
        })
    }

    pub fn endpoints(&self) -> &GraphEndpoints {
        &self.endpoints
    }

    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(ApiError::Status {
            status: status.as_u16(),
            message: graph_error_message(&body),
        })
    }
}

#[async_trait]
impl InstallationQuery for GraphClient {
    async fn list_installed_apps(&self, team: &TeamId) -> Result<HashSet<AppId>, ApiError> {
        let url = installed_apps_url(&self.endpoints.graph, team, true)?;
        let token = self.tokens.bearer().await?;

        let response = self.http.get(url).bearer_auth(token).send().await?;
        let response = Self::check_status(response).await?;
        let body = response.text().await?;
        decode_installed_apps(&body)
    }
}

#[async_trait]
impl InstallationCommand for GraphClient {
    async fn install_app(&self, team: &TeamId, app: &AppId) -> Result<(), ApiError> {
        let url = installed_apps_url(&self.endpoints.graph, team, false)?;
        let body = InstallAppRequest {
            teams_app_bind: catalog_app_bind(&self.endpoints.graph, app)?,
        };
        let token = self.tokens.bearer().await?;

        let response = self
            .http
            .post(url)
            .bearer_auth(token)
            .json(&body)
            .send()
            .await?;
        Self::check_status(response).await?;
        Ok(())
    }
}

/// `{graph}/teams/{team}/installedApps`, optionally expanding app definitions.
fn installed_apps_url(graph: &Url, team: &TeamId, expand: bool) -> Result<Url, ApiError> {
    let mut url = join_segments(graph, &["teams", team.as_str(), "installedApps"])?;
    if expand {
        url.set_query(Some("$expand=teamsAppDefinition"));
    }
    Ok(url)
}

/// OData bind reference to an app in the tenant catalog.
fn catalog_app_bind(graph: &Url, app: &AppId) -> Result<String, ApiError> {
    Ok(join_segments(graph, &["appCatalogs", "teamsApps", app.as_str()])?.to_string())
}

fn join_segments(base: &Url, segments: &[&str]) -> Result<Url, ApiError> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|_| ApiError::Transport(format!("Cannot use {} as a base URL", base)))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

fn decode_installed_apps(body: &str) -> Result<HashSet<AppId>, ApiError> {
    let page: InstalledAppsPage = serde_json::from_str(body)?;
    Ok(page
        .value
        .into_iter()
        .filter_map(|installation| installation.teams_app_definition)
        .filter_map(|definition| definition.teams_app_id)
        .map(AppId::from)
        .collect())
}

fn graph_error_message(body: &str) -> String {
    match serde_json::from_str::<GraphErrorEnvelope>(body) {
        Ok(envelope) => match (envelope.error.code, envelope.error.message) {
            (Some(code), Some(message)) => format!("{}: {}", code, message),
            (Some(code), None) => code,
            (None, Some(message)) => message,
            (None, None) => "unknown error".to_string(),
        },
        Err(_) if body.trim().is_empty() => "empty response body".to_string(),
        Err(_) => body.trim().chars().take(200).collect(),
    }
}
