//! Notification port.
//!
//! The engine depends on this trait abstractly; the SMTP implementation
//! lives in `signoff-events`. Delivery is best-effort: implementations
//! return errors so the engine can log them, but a failure never affects
//! the already-committed transition.

use async_trait::async_trait;
use signoff_db::models::document::Document;
use signoff_db::models::organization::User;

/// Outbound email notifications for workflow outcomes.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// The document completed its workflow and was approved.
    async fn send_approval_email(&self, document: &Document) -> Result<(), String>;

    /// The document was rejected; `reason` carries the approver's comment.
    async fn send_rejection_email(
        &self,
        document: &Document,
        reason: Option<&str>,
        rejected_by: &User,
    ) -> Result<(), String>;
}

/// No-op notifier for tests and deployments without SMTP configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullNotifier;

#[async_trait]
impl Notifier for NullNotifier {
    async fn send_approval_email(&self, _document: &Document) -> Result<(), String> {
        Ok(())
    }

    async fn send_rejection_email(
        &self,
        _document: &Document,
        _reason: Option<&str>,
        _rejected_by: &User,
    ) -> Result<(), String> {
        Ok(())
    }
}
