//! Rent-manager API client
//!
//! Minimal client for the property-management backend: the property roster
//! used for address verification, and service-issue creation for filed
//! tickets. Authenticates with a static API token header.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::error;

const API_TOKEN_HEADER: &str = "X-RM12Api-ApiToken";

/// Rent-manager credentials and endpoint
#[derive(Debug, Clone)]
pub struct RentManagerConfig {
    pub api_key: String,
    pub base_url: String,
}

impl RentManagerConfig {
    pub fn from_env() -> Option<Self> {
        let api_key = std::env::var("RENT_MANAGER_API_KEY").ok()?;
        let base_url = std::env::var("RENT_MANAGER_BASE_URL")
            .unwrap_or_else(|_| "https://grinb-api.rentmanager.com".to_string())
            .trim_end_matches('/')
            .to_string();
        Some(Self { api_key, base_url })
    }
}

/// One property in the roster
#[derive(Debug, Clone, Deserialize)]
pub struct Property {
    #[serde(rename = "Name", default)]
    pub name: String,
    #[serde(rename = "Address")]
    pub address: String,
}

/// Payload for a new service issue
#[derive(Debug, Clone, Serialize)]
pub struct NewServiceIssue {
    pub description: String,
    pub category: String,
    pub priority: String,
    pub unit: String,
    pub caller_number: String,
    /// Our caller-facing ticket number, recorded for reconciliation
    pub local_reference: String,
}

#[derive(Debug, thiserror::Error)]
pub enum RentManagerError {
    #[error("rent-manager API returned status {0}")]
    Status(u16),

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
}

pub struct RentManagerClient {
    config: RentManagerConfig,
    client: reqwest::Client,
}

impl RentManagerClient {
    pub fn new(config: RentManagerConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    /// All properties, for address matching.
    pub async fn get_all_properties(&self) -> Result<Vec<Property>, RentManagerError> {
        let url = format!("{}/properties", self.config.base_url);
        let response = self
            .client
            .get(&url)
            .header(API_TOKEN_HEADER, &self.config.api_key)
            .send()
            .await?;

        if !response.status().is_success() {
            error!("Rent-manager property fetch failed: {}", response.status());
            return Err(RentManagerError::Status(response.status().as_u16()));
        }

        Ok(response.json::<Vec<Property>>().await?)
    }

    /// File a service issue. Returns the backend issue id, or `None` when the
    /// backend answered without one (matching its 404-as-absent convention).
    pub async fn create_service_issue(
        &self,
        issue: &NewServiceIssue,
    ) -> Result<Option<String>, RentManagerError> {
        let url = format!("{}/service-issues", self.config.base_url);
        let payload = serde_json::json!({
            "description": issue.description,
            "category": issue.category,
            "priority": issue.priority,
            "status": "open",
            "unit": issue.unit,
            "source": "voice_assistant",
            "created_by": "Voice Assistant",
            "contact_phone": issue.caller_number,
            "reference": issue.local_reference,
        });

        let response = self
            .client
            .post(&url)
            .header(API_TOKEN_HEADER, &self.config.api_key)
            .json(&payload)
            .send()
            .await?;

        match response.status().as_u16() {
            200 | 201 => {
                let body: Value = response.json().await?;
                Ok(body
                    .get("issue_id")
                    .and_then(Value::as_str)
                    .map(str::to_string))
            }
            404 => Ok(None),
            status => {
                error!("Rent-manager issue creation failed: {}", status);
                Err(RentManagerError::Status(status))
            }
        }
    }
}
