use anyhow::Result;
use notify_rust::Notification;

pub fn send_activation_notification(company_name: &str) -> Result<()> {
    Notification::new()
        .summary("Premium activated")
        .body(&format!(
            "{} is now on the Premium plan. Reports and AI insights are unlocked.",
            company_name
        ))
        .appname("pocketbiz-watch")
        .timeout(notify_rust::Timeout::Milliseconds(5000))
        .show()?;

    tracing::info!(company = company_name, "Sent activation notification");

    Ok(())
}

pub fn send_timeout_notification(attempts: u32) -> Result<()> {
    Notification::new()
        .summary("Still waiting for activation")
        .body(
            "Your payment may still be processing. \
             Re-open the PocketBiz app or run `pocketbiz-watch status` to check again.",
        )
        .appname("pocketbiz-watch")
        .timeout(notify_rust::Timeout::Milliseconds(5000))
        .show()?;

    tracing::info!(attempts, "Sent activation timeout notification");

    Ok(())
}
