//! Wire shapes for the Microsoft Graph endpoints used by the client.

use serde::{Deserialize, Serialize};

/// `GET /teams/{id}/installedApps` collection response.
#[derive(Debug, Clone, Deserialize)]
pub struct InstalledAppsPage {
    #[serde(default)]
    pub value: Vec<TeamsAppInstallation>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamsAppInstallation {
    /// Only present when the request expands `teamsAppDefinition`
    #[serde(default)]
    pub teams_app_definition: Option<TeamsAppDefinition>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamsAppDefinition {
    #[serde(default)]
    pub teams_app_id: Option<String>,
}

/// `POST /teams/{id}/installedApps` request body.
#[derive(Debug, Clone, Serialize)]
pub struct InstallAppRequest {
    #[serde(rename = "teamsApp@odata.bind")]
    pub teams_app_bind: String,
}

/// Graph error envelope: `{"error": {"code": "...", "message": "..."}}`.
#[derive(Debug, Clone, Deserialize)]
pub struct GraphErrorEnvelope {
    pub error: GraphErrorBody,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GraphErrorBody {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// OAuth2 token endpoint response.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    /// Lifetime in seconds
    #[serde(default)]
    pub expires_in: Option<i64>,
}

/// OAuth2 token endpoint error response.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenErrorResponse {
    pub error: String,
    #[serde(default)]
    pub error_description: Option<String>,
}
