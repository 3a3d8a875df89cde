//! Terminal rendering for the activation wait. Pure string
//! formatting; the flow loop owns the actual printing.

pub fn waiting_banner() -> String {
    "Waiting for premium activation to be confirmed...".to_string()
}

/// One progress line per completed attempt, as a bar plus a ratio.
pub fn progress_line(attempt: u32, max_attempts: u32) -> String {
    let filled = attempt.min(max_attempts) as usize;
    let remaining = max_attempts.saturating_sub(attempt) as usize;

    format!(
        "[{}{}] {}/{} checking subscription status",
        "#".repeat(filled),
        ".".repeat(remaining),
        attempt,
        max_attempts
    )
}

pub fn confirmed_line(company_name: &str) -> String {
    format!(
        "Premium activated for {}. Reports and AI insights are unlocked.",
        company_name
    )
}

pub fn already_active_line(company_name: Option<&str>) -> String {
    match company_name {
        Some(name) => format!("Premium is already active for {}.", name),
        None => "Premium is already active on this account.".to_string(),
    }
}

pub fn sync_warning_line() -> String {
    "Activation confirmed, but the local session could not be updated. \
     Re-open the PocketBiz app to refresh it."
        .to_string()
}

pub fn timeout_line(attempts: u32) -> String {
    format!(
        "Checked {} times without confirmation. Your payment may still be \
         processing; run `pocketbiz-watch status` in a minute to check again.",
        attempts
    )
}

pub fn cancelled_line() -> String {
    "Stopped waiting for activation.".to_string()
}
