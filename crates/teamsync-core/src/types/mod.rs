//! Shared identifier and outcome types used across the install workflow.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque identifier of a collaboration-platform team.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TeamId(String);

/// Opaque catalog identifier of an installable application.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AppId(String);

macro_rules! opaque_id {
    ($ty:ident, $what:literal) => {
        impl $ty {
            /// Build an identifier, rejecting empty or whitespace-only input.
            pub fn parse(raw: impl Into<String>) -> anyhow::Result<Self> {
                let raw = raw.into();
                let trimmed = raw.trim();
                if trimmed.is_empty() {
                    anyhow::bail!(concat!($what, " ID must not be empty"));
                }
                Ok(Self(trimmed.to_string()))
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.pad(&self.0)
            }
        }

        impl AsRef<str> for $ty {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl From<&str> for $ty {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl From<String> for $ty {
            fn from(value: String) -> Self {
                Self(value)
            }
        }
    };
}

opaque_id!(TeamId, "Team");
opaque_id!(AppId, "App");

/// Successful result of an idempotent install on one team.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InstallOutcome {
    /// The app was already present; nothing was changed.
    AlreadyInstalled,
    /// The install command was issued and accepted.
    Installed,
}

/// Which collaborator call a per-team failure came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InstallStage {
    Query,
    Command,
    Aborted,
}

impl fmt::Display for InstallStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            InstallStage::Query => "query",
            InstallStage::Command => "command",
            InstallStage::Aborted => "aborted",
        };
        f.write_str(label)
    }
}
