//! User-facing side effects the pipeline needs but does not render.

use async_trait::async_trait;

/// Wording of the re-authentication confirmation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReauthPrompt {
    pub title: String,
    pub message: String,
    pub confirm_label: String,
    pub cancel_label: String,
}

impl Default for ReauthPrompt {
    fn default() -> Self {
        Self {
            title: "Notice".to_string(),
            message: "Your session has expired, please log in again".to_string(),
            confirm_label: "Log in again".to_string(),
            cancel_label: "Cancel".to_string(),
        }
    }
}

/// The front end, as seen by the request pipeline.
#[async_trait]
pub trait Interaction: Send + Sync {
    /// Transient error notification.
    fn notify_error(&self, message: &str);

    /// Ask whether to discard the session and log in again.
    async fn confirm_reauthentication(&self, prompt: &ReauthPrompt) -> bool;

    /// Full reload to `location`, dropping all in-memory view state.
    fn reload_to(&self, location: &str);
}

/// No user on the other end: notifications are logged and re-authentication
/// is never confirmed.
#[derive(Debug, Default, Clone, Copy)]
pub struct HeadlessInteraction;

#[async_trait]
impl Interaction for HeadlessInteraction {
    fn notify_error(&self, message: &str) {
        tracing::warn!("{message}");
    }

    async fn confirm_reauthentication(&self, prompt: &ReauthPrompt) -> bool {
        tracing::info!(prompt = %prompt.message, "re-authentication requested; no user to confirm");
        false
    }

    fn reload_to(&self, location: &str) {
        tracing::info!(%location, "reload requested");
    }
}
