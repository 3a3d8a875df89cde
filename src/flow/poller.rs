use crate::api::{FetchError, StatusFetcher};
use crate::core::models::{AccountStatusSnapshot, SessionPatch};
use crate::core::poll::{PollPhase, PollState, MAX_ATTEMPTS};
use crate::core::session::SessionSync;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};

/// Progress reports consumed by the confirmation view.
#[derive(Debug)]
pub enum PollEvent {
    /// The cached session was already premium; no polls were issued.
    AlreadyActive,
    Attempt {
        attempt: u32,
        max_attempts: u32,
    },
    Confirmed {
        snapshot: AccountStatusSnapshot,
        /// False when the session write-back failed; the backend is
        /// still the source of truth.
        synced: bool,
    },
    TimedOut {
        attempts: u32,
    },
}

/// Drives the activation wait after a checkout redirect: fetches the
/// account status on a fixed schedule until it flips to premium or
/// the attempt cap is hit, then writes the session back exactly once.
///
/// Ticks are strictly sequential; the next fetch is only scheduled
/// after the previous one resolved.
pub struct ActivationPoller {
    fetcher: Arc<dyn StatusFetcher>,
    session: Arc<dyn SessionSync>,
    events: mpsc::UnboundedSender<PollEvent>,
    cancel: watch::Receiver<bool>,
    state: PollState,
}

impl ActivationPoller {
    pub fn new(
        fetcher: Arc<dyn StatusFetcher>,
        session: Arc<dyn SessionSync>,
        events: mpsc::UnboundedSender<PollEvent>,
        cancel: watch::Receiver<bool>,
    ) -> Self {
        Self {
            fetcher,
            session,
            events,
            cancel,
            state: PollState::new(),
        }
    }

    pub async fn run(mut self) {
        if self.session.is_premium() {
            tracing::info!("Session already premium, skipping activation poll");
            let _ = self.events.send(PollEvent::AlreadyActive);
            return;
        }

        if !self.state.begin() {
            return;
        }

        loop {
            let delay = self.state.next_delay();
            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                _ = cancelled(&mut self.cancel) => {
                    tracing::debug!("Activation poll cancelled while waiting");
                    return;
                }
            }

            let probe = tokio::select! {
                result = self.fetcher.fetch_status() => result,
                _ = cancelled(&mut self.cancel) => {
                    // The in-flight request may still resolve on its
                    // own; its result is discarded.
                    tracing::debug!("Activation poll cancelled mid-fetch");
                    return;
                }
            };

            if self.handle_probe(probe).await {
                return;
            }
        }
    }

    /// Feeds one probe result to the state machine. Returns true when
    /// a terminal phase was reached.
    async fn handle_probe(
        &mut self,
        probe: Result<AccountStatusSnapshot, FetchError>,
    ) -> bool {
        match probe {
            Ok(snapshot) if snapshot.is_premium() => {
                if !self.state.try_confirm() {
                    return true;
                }

                let patch = SessionPatch::from_snapshot(&snapshot);
                let synced = match self.session.apply(patch).await {
                    Ok(()) => true,
                    Err(e) => {
                        tracing::warn!(error = %e, "Failed to write activated session");
                        false
                    }
                };

                tracing::info!(
                    company = %snapshot.company_name,
                    attempts = self.state.attempts(),
                    synced,
                    "Premium activation confirmed"
                );
                let _ = self.events.send(PollEvent::Confirmed { snapshot, synced });
                true
            }
            other => {
                // Fetch failures and still-free responses share one
                // retry path; activation is eventually consistent.
                if let Err(e) = &other {
                    tracing::debug!(error = %e, "Status unavailable this tick");
                }

                self.state.record_negative();
                if self.state.phase() == PollPhase::TimedOut {
                    tracing::warn!(
                        attempts = self.state.attempts(),
                        "Gave up waiting for premium activation"
                    );
                    let _ = self.events.send(PollEvent::TimedOut {
                        attempts: self.state.attempts(),
                    });
                } else {
                    let _ = self.events.send(PollEvent::Attempt {
                        attempt: self.state.attempts(),
                        max_attempts: MAX_ATTEMPTS,
                    });
                }
                self.state.is_terminal()
            }
        }
    }
}

async fn cancelled(rx: &mut watch::Receiver<bool>) {
    loop {
        if *rx.borrow() {
            return;
        }
        // A dropped sender means the owner tore down; stop as well.
        if rx.changed().await.is_err() {
            return;
        }
    }
}
