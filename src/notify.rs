use crate::machine::Outcome;

#[cfg(feature = "desktop-notify")]
pub fn send_desktop(outcome: Outcome, summary: Option<&str>) {
    use notify_rust::{Notification, Urgency};

    let (title, icon, urgency) = match outcome {
        Outcome::Succeeded => ("Provisioning complete", "dialog-information", Urgency::Normal),
        Outcome::Failed => ("Provisioning failed", "dialog-error", Urgency::Critical),
        Outcome::Neutral => ("Provisioning ended", "dialog-information", Urgency::Normal),
    };

    let _ = Notification::new()
        .summary(title)
        .body(summary.unwrap_or("Pipeline finished"))
        .icon(icon)
        .urgency(urgency)
        .show();
}

#[cfg(not(feature = "desktop-notify"))]
pub fn send_desktop(_outcome: Outcome, _summary: Option<&str>) {}
