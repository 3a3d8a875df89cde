use crate::core::models::{AccountStatusSnapshot, SubscriptionStatus};
use async_trait::async_trait;
use chrono::Utc;
use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;

/// Everything that can go wrong during a status probe. The poller
/// collapses all of these into a single "unavailable this tick"
/// path; the variants exist for logs and for `status`.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("server returned {status}")]
    Status { status: StatusCode },

    #[error("malformed account payload: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("account is not linked to a company")]
    NoCompany,
}

/// Read-only probe of the account's subscription state. Trait seam
/// so the activation flow can be driven by scripted responses in
/// tests.
#[async_trait]
pub trait StatusFetcher: Send + Sync {
    async fn fetch_status(&self) -> Result<AccountStatusSnapshot, FetchError>;
}

#[derive(Debug, Deserialize)]
struct UserPayload {
    #[serde(default)]
    companies: Vec<CompanyMembership>,
}

#[derive(Debug, Deserialize)]
struct CompanyMembership {
    company: CompanyPayload,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CompanyPayload {
    id: String,
    name: String,
    subscription_status: SubscriptionStatus,
    #[serde(default)]
    logo_file_id: Option<String>,
}

pub struct HttpStatusFetcher {
    client: reqwest::Client,
    base_url: String,
    user_id: String,
    access_token: String,
}

impl HttpStatusFetcher {
    pub fn new(base_url: &str, user_id: &str, access_token: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.to_string(),
            user_id: user_id.to_string(),
            access_token: access_token.to_string(),
        }
    }

    fn parse_payload(&self, body: &str) -> Result<AccountStatusSnapshot, FetchError> {
        let payload: UserPayload = serde_json::from_str(body)?;

        let membership = payload.companies.into_iter().next().ok_or(FetchError::NoCompany)?;
        let company = membership.company;

        Ok(AccountStatusSnapshot {
            logo_url: company
                .logo_file_id
                .map(|id| format!("{}/files/{}", self.base_url, id)),
            company_id: company.id,
            company_name: company.name,
            subscription_status: company.subscription_status,
            fetched_at: Utc::now(),
        })
    }
}

#[async_trait]
impl StatusFetcher for HttpStatusFetcher {
    async fn fetch_status(&self) -> Result<AccountStatusSnapshot, FetchError> {
        let url = format!("{}/users/{}", self.base_url, self.user_id);

        let response = self
            .client
            .get(&url)
            .header("Authorization", format!("Bearer {}", self.access_token))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(FetchError::Status {
                status: response.status(),
            });
        }

        let body = response.text().await?;
        self.parse_payload(&body)
    }
}
