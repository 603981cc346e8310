use notify_rust::Notification;
use tracing::warn;

/// Fire-and-forget desktop notification. Failures are logged, never
/// propagated; a broken notification daemon must not break the countdown.
pub fn send(summary: &str, body: &str) {
    if let Err(e) = Notification::new()
        .summary(summary)
        .body(body)
        .appname("sdtimer")
        .icon("alarm-clock")
        .show()
    {
        warn!(error = %e, "desktop notification failed");
    }
}
