//! Message and attachment rows.

use chrono::{DateTime, Utc};
use diesel::prelude::*;

use crate::domain::{AttachmentMeta, Message, StoredAttachment};
use crate::outbound::persistence::schema::{message, message_attachment};

#[derive(Debug, Clone, Queryable, Selectable, QueryableByName)]
#[diesel(table_name = message)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct MessageRow {
    pub id: i32,
    pub conversation_id: String,
    pub sender_id: i32,
    pub receiver_id: i32,
    pub contenu: Option<String>,
    pub ticket_id: Option<i32>,
    pub demande_id: Option<i32>,
    pub client_id: Option<i32>,
    pub created_at: DateTime<Utc>,
}

impl MessageRow {
    pub(crate) fn into_message(self, attachments: Vec<AttachmentMeta>) -> Message {
        Message {
            id: self.id,
            conversation_id: self.conversation_id,
            sender_id: self.sender_id,
            receiver_id: self.receiver_id,
            contenu: self.contenu,
            ticket_id: self.ticket_id,
            demande_id: self.demande_id,
            client_id: self.client_id,
            created_at: self.created_at,
            attachments,
        }
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = message)]
pub(crate) struct NewMessageRow<'a> {
    pub conversation_id: &'a str,
    pub sender_id: i32,
    pub receiver_id: i32,
    pub contenu: Option<&'a str>,
    pub ticket_id: Option<i32>,
    pub demande_id: Option<i32>,
    pub client_id: Option<i32>,
}

impl<'a> From<&'a crate::domain::NewMessage> for NewMessageRow<'a> {
    fn from(new: &'a crate::domain::NewMessage) -> Self {
        Self {
            conversation_id: &new.conversation_id,
            sender_id: new.sender_id,
            receiver_id: new.receiver_id,
            contenu: new.contenu.as_deref(),
            ticket_id: new.context.ticket_id,
            demande_id: new.context.demande_id,
            client_id: new.context.client_id,
        }
    }
}

/// Attachment metadata without the payload.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = message_attachment)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct AttachmentMetaRow {
    pub id: i32,
    pub message_id: i32,
    pub file_name: String,
    pub mime_type: String,
    pub size: i32,
}

impl From<AttachmentMetaRow> for AttachmentMeta {
    fn from(row: AttachmentMetaRow) -> Self {
        Self {
            id: row.id,
            message_id: row.message_id,
            file_name: row.file_name,
            mime_type: row.mime_type,
            size: row.size,
        }
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = message_attachment)]
pub(crate) struct NewAttachmentRow<'a> {
    pub message_id: i32,
    pub file_name: &'a str,
    pub mime_type: &'a str,
    pub size: i32,
    pub data: &'a [u8],
}

/// Attachment metadata, payload, sender and receiver of its message.
pub(crate) type StoredAttachmentRow = (AttachmentMetaRow, Vec<u8>, i32, i32);

impl From<StoredAttachmentRow> for StoredAttachment {
    fn from((meta, data, sender_id, receiver_id): StoredAttachmentRow) -> Self {
        Self {
            meta: meta.into(),
            data,
            sender_id,
            receiver_id,
        }
    }
}
