//! Host notification collaborators

/// Fire-and-forget side effects surfaced to the host UI.
///
/// The coordinator calls these on classified failures; nothing is returned
/// and nothing blocks on them.
pub trait HostNotifier: Send + Sync {
    /// Ask the host to show a sign-in prompt
    fn show_login_prompt(&self);
    /// Ask the host to show a quota-alert banner
    fn show_quota_alert(&self, message: &str);
    /// Ask the host to show a transient notification
    fn show_toast(&self, message: &str);
}

/// Notifier that drops every notification (headless use)
#[derive(Debug, Clone, Copy, Default)]
pub struct NullNotifier;

impl HostNotifier for NullNotifier {
    fn show_login_prompt(&self) {}
    fn show_quota_alert(&self, _message: &str) {}
    fn show_toast(&self, _message: &str) {}
}
