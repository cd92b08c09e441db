//! Port for messages and attachments.
use async_trait::async_trait;

use crate::domain::{ConversationSummary, Message, NewMessage, StoredAttachment};

use super::PersistenceError;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MessagingRepository: Send + Sync {
    async fn last_message(&self, conversation_id: &str)
    -> Result<Option<Message>, PersistenceError>;

    /// Insert the message and its attachments in one transaction.
    async fn insert(&self, message: &NewMessage) -> Result<Message, PersistenceError>;

    /// Oldest first.
    async fn list_messages(&self, conversation_id: &str) -> Result<Vec<Message>, PersistenceError>;

    async fn list_conversations(
        &self,
        user_id: i32,
    ) -> Result<Vec<ConversationSummary>, PersistenceError>;

    async fn find_attachment(&self, id: i32) -> Result<Option<StoredAttachment>, PersistenceError>;

    /// Account of the primary responsable of the ticket created from a demande.
    async fn demande_responsable_user(
        &self,
        demande_id: i32,
    ) -> Result<Option<i32>, PersistenceError>;
}
