//! Delivery channel interface.

use async_trait::async_trait;

use crate::decision::Decision;
use crate::error::NotifyError;

/// Delivers decisions to the user.
///
/// Formatting and transport belong to the implementation.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Interrupting delivery for TEXT and CALL decisions, with action buttons.
    async fn notify(&self, decision: &Decision) -> Result<(), NotifyError>;

    /// Non-interrupting delivery for NONE decisions, carrying the reasoning.
    async fn notify_silently(&self, decision: &Decision) -> Result<(), NotifyError>;

    /// Unformatted message, used for error notices.
    async fn notify_plain_text(&self, text: &str) -> Result<(), NotifyError>;
}
