use crate::api::{HttpStatusFetcher, StatusFetcher};
use crate::core::notifications;
use crate::core::session::{SessionStore, SessionSync, SessionWatcher};
use crate::core::settings::Settings;
use crate::flow::poller::{ActivationPoller, PollEvent};
use crate::ui;
use anyhow::Result;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};

/// Runs the activation wait end to end: wires the session store, the
/// status fetcher, and the poller together, then renders poll events
/// until a terminal one arrives or the user tears the flow down.
pub async fn run(open_dashboard: bool) -> Result<()> {
    let settings = Settings::load()?;
    settings.validate()?;

    let session_path = Settings::session_path()?;
    let store = Arc::new(SessionStore::load(session_path.clone())?);

    let Some(session) = store.current() else {
        anyhow::bail!(
            "No session found at {}. Log in via the PocketBiz app first.",
            session_path.display()
        );
    };

    let fetcher: Arc<dyn StatusFetcher> = Arc::new(HttpStatusFetcher::new(
        &settings.api.base_url,
        &session.user_id,
        &session.access_token,
    ));

    let (_session_watcher, mut session_change_rx) = SessionWatcher::start(&session_path)?;

    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<PollEvent>();
    let (cancel_tx, cancel_rx) = watch::channel(false);

    let poller = ActivationPoller::new(
        fetcher,
        Arc::clone(&store) as Arc<dyn SessionSync>,
        event_tx,
        cancel_rx,
    );
    let poller_handle = tokio::spawn(poller.run());

    println!("{}", ui::waiting_banner());

    loop {
        tokio::select! {
            maybe_event = event_rx.recv() => {
                let Some(event) = maybe_event else { break };
                match event {
                    PollEvent::AlreadyActive => {
                        let company = store.current().and_then(|s| s.company_name);
                        println!("{}", ui::already_active_line(company.as_deref()));
                        break;
                    }
                    PollEvent::Attempt { attempt, max_attempts } => {
                        println!("{}", ui::progress_line(attempt, max_attempts));
                    }
                    PollEvent::Confirmed { snapshot, synced } => {
                        println!("{}", ui::confirmed_line(&snapshot.company_name));
                        if !synced {
                            println!("{}", ui::sync_warning_line());
                        }
                        if settings.notifications.enabled {
                            if let Err(e) =
                                notifications::send_activation_notification(&snapshot.company_name)
                            {
                                tracing::warn!(error = %e, "Failed to send notification");
                            }
                        }
                        if open_dashboard {
                            let url = &settings.api.dashboard_url;
                            tracing::info!(url = %url, "Opening reports dashboard");
                            if let Err(e) = open::that(url) {
                                tracing::error!(error = %e, "Failed to open browser");
                            }
                        }
                        break;
                    }
                    PollEvent::TimedOut { attempts } => {
                        println!("{}", ui::timeout_line(attempts));
                        if settings.notifications.enabled {
                            if let Err(e) = notifications::send_timeout_notification(attempts) {
                                tracing::warn!(error = %e, "Failed to send notification");
                            }
                        }
                        break;
                    }
                }
            }
            Some(()) = session_change_rx.recv() => {
                match store.reload() {
                    Ok(Some(_)) => {
                        tracing::info!("Session reloaded after external change");
                    }
                    Ok(None) => {
                        tracing::warn!("Session removed while polling, stopping");
                        let _ = cancel_tx.send(true);
                        println!("{}", ui::cancelled_line());
                        break;
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "Failed to reload session");
                    }
                }
            }
            _ = tokio::signal::ctrl_c() => {
                let _ = cancel_tx.send(true);
                println!("{}", ui::cancelled_line());
                break;
            }
        }
    }

    // Give the poller a chance to observe cancellation and clear its
    // pending timer before we drop the runtime.
    let _ = poller_handle.await;
    Ok(())
}
