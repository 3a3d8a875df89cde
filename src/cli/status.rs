use crate::api::{HttpStatusFetcher, StatusFetcher};
use crate::core::models::{AccountStatusSnapshot, SubscriptionStatus};
use crate::core::session::SessionStore;
use crate::core::settings::Settings;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Serialize)]
struct StatusOutput {
    subscription_status: SubscriptionStatus,
    company_id: String,
    company_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    logo_url: Option<String>,
    /// What the locally cached session still believes.
    cached_status: SubscriptionStatus,
    #[serde(with = "chrono::serde::ts_seconds")]
    fetched_at: DateTime<Utc>,
}

pub async fn run(json: bool) -> Result<()> {
    let settings = Settings::load()?;
    settings.validate()?;

    let store = SessionStore::load(Settings::session_path()?)?;
    let session = store
        .current()
        .context("No session found. Log in via the PocketBiz app first.")?;

    let fetcher = HttpStatusFetcher::new(
        &settings.api.base_url,
        &session.user_id,
        &session.access_token,
    );

    let snapshot = fetcher
        .fetch_status()
        .await
        .context("Failed to fetch account status")?;

    let output = StatusOutput {
        subscription_status: snapshot.subscription_status,
        company_id: snapshot.company_id.clone(),
        company_name: snapshot.company_name.clone(),
        logo_url: snapshot.logo_url.clone(),
        cached_status: session.subscription_status,
        fetched_at: snapshot.fetched_at,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        print_text_output(&snapshot, session.subscription_status);
    }

    Ok(())
}

fn print_text_output(snapshot: &AccountStatusSnapshot, cached: SubscriptionStatus) {
    println!("{}", snapshot.company_name);
    println!("  Plan:    {}", snapshot.subscription_status.label());
    println!("  Company: {}", snapshot.company_id);

    if cached != snapshot.subscription_status {
        println!(
            "  Note:    cached session still says {}; run `pocketbiz-watch watch` to sync",
            cached.label()
        );
    }
}
