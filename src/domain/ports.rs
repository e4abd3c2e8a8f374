use crate::domain::model::{ContentFilter, Draft, NewDraft, Notification, NotificationKind};
use crate::utils::error::Result;
use async_trait::async_trait;

/// Operations of the Typefully REST API used by the CLI.
#[async_trait]
pub trait TypefullyApi: Send + Sync {
    async fn create_draft(&self, draft: &NewDraft) -> Result<Draft>;

    async fn recently_scheduled(&self, filter: Option<ContentFilter>) -> Result<Vec<Draft>>;

    async fn recently_published(&self, filter: Option<ContentFilter>) -> Result<Vec<Draft>>;

    async fn notifications(&self, kind: Option<NotificationKind>) -> Result<Vec<Notification>>;

    /// Marks every notification of `kind` (all kinds when `None`) as read.
    async fn mark_notifications_read(
        &self,
        kind: Option<NotificationKind>,
        username: Option<&str>,
    ) -> Result<()>;
}
