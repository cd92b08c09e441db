//! Messages exchanged between users and their attachments.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{FileInput, FileUpload};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct Message {
    pub id: i32,
    pub conversation_id: String,
    pub sender_id: i32,
    pub receiver_id: i32,
    pub contenu: Option<String>,
    pub ticket_id: Option<i32>,
    pub demande_id: Option<i32>,
    pub client_id: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub attachments: Vec<AttachmentMeta>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct AttachmentMeta {
    pub id: i32,
    pub message_id: i32,
    pub file_name: String,
    pub mime_type: String,
    pub size: i32,
}

/// Attachment bytes with the participants allowed to read them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredAttachment {
    pub meta: AttachmentMeta,
    pub data: Vec<u8>,
    pub sender_id: i32,
    pub receiver_id: i32,
}

/// Body of `POST /api/conversations/new`.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct ConversationInput {
    #[serde(alias = "recipient_email")]
    pub email: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct ConversationCreated {
    pub conversation_id: String,
    pub recipient_id: i32,
    pub recipient_email: String,
}

/// Latest message of a conversation the caller takes part in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct ConversationSummary {
    pub conversation_id: String,
    pub last_message: Message,
}

/// Body of `POST /api/conversations/{id}/messages`.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct SendMessageInput {
    pub receiver_id: Option<i32>,
    #[serde(alias = "content", alias = "body")]
    pub contenu: Option<String>,
    #[serde(default)]
    pub attachments: Vec<FileInput>,
}

/// Records a conversation is about, derived from its identifier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MessageContext {
    pub ticket_id: Option<i32>,
    pub demande_id: Option<i32>,
    pub client_id: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMessage {
    pub conversation_id: String,
    pub sender_id: i32,
    pub receiver_id: i32,
    pub contenu: Option<String>,
    pub context: MessageContext,
    pub attachments: Vec<FileUpload>,
}
