//! Configuration schema for teamsync.toml

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use url::Url;

use super::CLIENT_SECRET_ENV;
use crate::teams::{ClientCredentials, GraphEndpoints};
use crate::types::{AppId, TeamId};

/// Root configuration structure for teamsync.toml
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct TeamsyncConfig {
    /// Directory (tenant) ID used for token requests
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tenant_id: Option<String>,

    /// Application (client) ID of the app registration
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,

    /// Catalog ID of the app to install
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_id: Option<String>,

    /// Team IDs to reconcile
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub teams: Vec<String>,

    /// Maximum teams processed at once (unbounded when unset)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_concurrency: Option<usize>,

    #[serde(default, skip_serializing_if = "EndpointsConfig::is_empty")]
    pub endpoints: EndpointsConfig,

    /// Only present so a secret written to the file can be rejected; never serialized
    #[serde(default, skip_serializing)]
    pub client_secret: Option<toml::Value>,
}

/// Overrides for the Graph and token authority base URLs
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct EndpointsConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub graph: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authority: Option<String>,
}

impl EndpointsConfig {
    fn is_empty(&self) -> bool {
        self.graph.is_none() && self.authority.is_none()
    }

    /// Resolve to concrete URLs, falling back to the public cloud defaults.
    pub fn resolve(&self) -> anyhow::Result<GraphEndpoints> {
        let mut endpoints = GraphEndpoints::default();
        if let Some(graph) = &self.graph {
            endpoints.graph = parse_endpoint("endpoints.graph", graph)?;
        }
        if let Some(authority) = &self.authority {
            endpoints.authority = parse_endpoint("endpoints.authority", authority)?;
        }
        Ok(endpoints)
    }
}

impl TeamsyncConfig {
    /// Validate the configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.client_secret.is_some() {
            anyhow::bail!(
                "client_secret must not be stored in teamsync.toml; pass --secret or set {}",
                CLIENT_SECRET_ENV
            );
        }
        if self.max_concurrency == Some(0) {
            anyhow::bail!("max_concurrency must be at least 1");
        }
        for (field, value) in [
            ("tenant_id", &self.tenant_id),
            ("client_id", &self.client_id),
            ("app_id", &self.app_id),
        ] {
            if let Some(value) = value
                && value.trim().is_empty()
            {
                anyhow::bail!("{} must not be empty", field);
            }
        }
        if let Some(pos) = self.teams.iter().position(|team| team.trim().is_empty()) {
            anyhow::bail!("teams[{}] must not be empty", pos);
        }
        self.endpoints.resolve()?;
        Ok(())
    }

    /// Combine file values with command-line overrides into run settings.
    pub fn resolve(&self, overrides: ConfigOverrides) -> anyhow::Result<RunSettings> {
        let tenant_id = require(
            "tenant ID (--tenant)",
            overrides.tenant_id,
            self.tenant_id.as_deref(),
        )?;
        let client_id = require(
            "client ID (--client)",
            overrides.client_id,
            self.client_id.as_deref(),
        )?;
        let client_secret = overrides
            .client_secret
            .filter(|secret| !secret.trim().is_empty())
            .ok_or_else(|| {
                anyhow::anyhow!(
                    "Missing client secret: pass --secret or set {}",
                    CLIENT_SECRET_ENV
                )
            })?;
        let app = AppId::parse(require(
            "app ID (--app)",
            overrides.app_id,
            self.app_id.as_deref(),
        )?)?;

        let raw_teams = if overrides.teams.is_empty() {
            self.teams.clone()
        } else {
            overrides.teams
        };
        if raw_teams.is_empty() {
            anyhow::bail!("No teams given: pass --team or set `teams` in the config file");
        }
        // Repeated IDs collapse to their first occurrence
        let mut seen = HashSet::new();
        let mut teams = Vec::with_capacity(raw_teams.len());
        for raw in raw_teams {
            let team = TeamId::parse(raw)?;
            if seen.insert(team.clone()) {
                teams.push(team);
            }
        }

        let max_concurrency = overrides.max_concurrency.or(self.max_concurrency);
        if max_concurrency == Some(0) {
            anyhow::bail!("max concurrency must be at least 1");
        }

        Ok(RunSettings {
            credentials: ClientCredentials {
                tenant_id,
                client_id,
                client_secret,
            },
            app,
            teams,
            max_concurrency,
            endpoints: self.endpoints.resolve()?,
        })
    }
}

/// Values supplied on the command line
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub tenant_id: Option<String>,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub app_id: Option<String>,
    /// Replaces the file's team list when non-empty
    pub teams: Vec<String>,
    pub max_concurrency: Option<usize>,
}

/// Fully resolved inputs for one batch run
#[derive(Debug, Clone)]
pub struct RunSettings {
    pub credentials: ClientCredentials,
    pub app: AppId,
    pub teams: Vec<TeamId>,
    pub max_concurrency: Option<usize>,
    pub endpoints: GraphEndpoints,
}

fn require(
    what: &str,
    preferred: Option<String>,
    fallback: Option<&str>,
) -> anyhow::Result<String> {
    preferred
        .as_deref()
        .or(fallback)
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .ok_or_else(|| anyhow::anyhow!("Missing {}", what))
}

fn parse_endpoint(field: &str, raw: &str) -> anyhow::Result<Url> {
    let url = Url::parse(raw).map_err(|e| anyhow::anyhow!("Invalid {} '{}': {}", field, raw, e))?;
    if !matches!(url.scheme(), "http" | "https") {
        anyhow::bail!("Invalid {} '{}': must be an http(s) URL", field, raw);
    }
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn overrides_with_secret() -> ConfigOverrides {
        ConfigOverrides {
            client_secret: Some("s3cret".to_string()),
            ..Default::default()
        }
    }

    fn file_config() -> TeamsyncConfig {
        TeamsyncConfig {
            tenant_id: Some("contoso".to_string()),
            client_id: Some("client-1".to_string()),
            app_id: Some("app42".to_string()),
            teams: vec!["t1".to_string(), "t2".to_string()],
            ..Default::default()
        }
    }

    #[test]
    fn resolve_uses_file_values() {
        let settings = file_config().resolve(overrides_with_secret()).unwrap();
        assert_eq!(settings.credentials.tenant_id, "contoso");
        assert_eq!(settings.app.as_str(), "app42");
        assert_eq!(settings.teams.len(), 2);
        assert_eq!(settings.max_concurrency, None);
        assert_eq!(settings.endpoints, GraphEndpoints::default());
    }

    #[test]
    fn resolve_overrides_win_and_replace_teams() {
        let overrides = ConfigOverrides {
            app_id: Some("other".to_string()),
            teams: vec!["t9".to_string()],
            max_concurrency: Some(3),
            ..overrides_with_secret()
        };
        let settings = file_config().resolve(overrides).unwrap();
        assert_eq!(settings.app.as_str(), "other");
        assert_eq!(settings.teams, vec![TeamId::from("t9")]);
        assert_eq!(settings.max_concurrency, Some(3));
    }

    #[test]
    fn resolve_collapses_repeated_teams() {
        let overrides = ConfigOverrides {
            teams: vec![
                "t1".to_string(),
                "t2".to_string(),
                " t1 ".to_string(),
                "t1".to_string(),
            ],
            ..overrides_with_secret()
        };
        let settings = file_config().resolve(overrides).unwrap();
        assert_eq!(settings.teams, vec![TeamId::from("t1"), TeamId::from("t2")]);
    }

    #[test]
    fn resolve_prefers_override_over_file_value() {
        assert_eq!(
            require("tenant", Some(" cli ".to_string()), Some("file")).unwrap(),
            "cli"
        );
        assert_eq!(require("tenant", None, Some("file")).unwrap(), "file");
        assert!(require("tenant", None, None).is_err());
    }

    #[test]
    fn resolve_requires_secret() {
        let err = file_config()
            .resolve(ConfigOverrides::default())
            .unwrap_err()
            .to_string();
        assert!(err.contains(CLIENT_SECRET_ENV), "{}", err);
    }

    #[test]
    fn resolve_requires_teams() {
        let config = TeamsyncConfig {
            teams: Vec::new(),
            ..file_config()
        };
        assert!(config.resolve(overrides_with_secret()).is_err());
    }

    #[test]
    fn validate_rejects_bad_endpoint() {
        let config = TeamsyncConfig {
            endpoints: EndpointsConfig {
                graph: Some("ftp://graph.example".to_string()),
                authority: None,
            },
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_concurrency() {
        let config = TeamsyncConfig {
            max_concurrency: Some(0),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
