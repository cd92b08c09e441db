//! Driving port for conversations and messages.
use async_trait::async_trait;

use crate::domain::{
    Caller, ConversationCreated, ConversationInput, ConversationSummary, Error, Message,
    SendMessageInput, StoredAttachment,
};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Messaging: Send + Sync {
    async fn create_conversation(
        &self,
        caller: &Caller,
        input: ConversationInput,
    ) -> Result<ConversationCreated, Error>;

    async fn list_conversations(&self, caller: &Caller)
    -> Result<Vec<ConversationSummary>, Error>;

    async fn list_messages(&self, caller: &Caller, conversation_id: &str)
    -> Result<Vec<Message>, Error>;

    async fn send_message(
        &self,
        caller: &Caller,
        conversation_id: &str,
        input: SendMessageInput,
    ) -> Result<Message, Error>;

    async fn get_attachment(&self, caller: &Caller, id: i32) -> Result<StoredAttachment, Error>;
}
