//! API client for the profile and transactions services.
//!
//! Both services wrap their payload in a status envelope. A reachable service
//! reporting a non-success status is an `ApiError::Service`; anything that
//! prevents reading an envelope at all is an `ApiError::Transport`.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::Config;
use crate::models::{TransactionRecord, UserProfile};

use super::ApiError;

/// Envelope status value that marks success.
const STATUS_SUCCESS: &str = "success";

/// The two remote calls the session manager depends on.
#[async_trait]
pub trait DashboardApi: Send + Sync {
    async fn fetch_profile(&self, user_id: &str) -> Result<UserProfile, ApiError>;

    async fn fetch_transactions(&self, user_id: &str) -> Result<Vec<TransactionRecord>, ApiError>;
}

#[derive(Debug, Deserialize)]
struct ProfileEnvelope {
    status: Option<String>,
    #[serde(default)]
    data: Value,
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TransactionsEnvelope {
    transactions: Option<TransactionsBody>,
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TransactionsBody {
    status: Option<String>,
    data: Option<TransactionsData>,
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TransactionsData {
    packages: Option<Vec<TransactionRecord>>,
}

/// HTTP client for the dashboard services.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    profile_url: String,
    transactions_url: String,
}

impl ApiClient {
    pub fn new(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            profile_url: config.profile_url.clone(),
            transactions_url: config.transactions_url.clone(),
        })
    }

    /// GET `url?user_id=...` and return the body text of a 2xx response.
    async fn get_text(&self, url: &str, user_id: &str) -> Result<String, ApiError> {
        let response = self
            .client
            .get(url)
            .query(&[("user_id", user_id)])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(url = url, status = status.as_u16(), "Request returned error status");
            return Err(ApiError::from_status(status, &body));
        }

        Ok(response.text().await?)
    }
}

#[async_trait]
impl DashboardApi for ApiClient {
    async fn fetch_profile(&self, user_id: &str) -> Result<UserProfile, ApiError> {
        debug!(user_id = user_id, "Fetching profile");
        let body = self.get_text(&self.profile_url, user_id).await?;
        parse_profile(user_id, &body)
    }

    async fn fetch_transactions(&self, user_id: &str) -> Result<Vec<TransactionRecord>, ApiError> {
        debug!(user_id = user_id, "Fetching transactions");
        let body = self.get_text(&self.transactions_url, user_id).await?;
        parse_transactions(&body)
    }
}

fn parse_profile(user_id: &str, body: &str) -> Result<UserProfile, ApiError> {
    let envelope: ProfileEnvelope = serde_json::from_str(body).map_err(|e| {
        warn!(error = %e, "Failed to parse profile response");
        ApiError::Transport(None)
    })?;

    if envelope.status.as_deref() == Some(STATUS_SUCCESS) {
        Ok(UserProfile::from_value(user_id, envelope.data))
    } else {
        Err(ApiError::Service(envelope.message))
    }
}

fn parse_transactions(body: &str) -> Result<Vec<TransactionRecord>, ApiError> {
    let envelope: TransactionsEnvelope = serde_json::from_str(body).map_err(|e| {
        warn!(error = %e, "Failed to parse transactions response");
        ApiError::Transport(None)
    })?;

    let Some(transactions) = envelope.transactions else {
        warn!("Transactions response has no transactions envelope");
        return Err(ApiError::Transport(None));
    };

    if transactions.status.as_deref() == Some(STATUS_SUCCESS) {
        Ok(transactions
            .data
            .and_then(|d| d.packages)
            .unwrap_or_default())
    } else {
        // The top-level message is the one the service means for the user
        Err(ApiError::Service(envelope.message.or(transactions.message)))
    }
}
