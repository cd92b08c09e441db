//! PostgreSQL-backed `MessagingRepository`.

use std::collections::HashMap;

use async_trait::async_trait;
use diesel::prelude::*;
use diesel::sql_types::{Int4, Nullable};
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, AsyncPgConnection, RunQueryDsl};

use crate::domain::ports::{MessagingRepository, PersistenceError};
use crate::domain::{AttachmentMeta, ConversationSummary, Message, NewMessage, StoredAttachment};

use super::diesel_helpers::{map_diesel_error, map_pool_error};
use super::models::{
    AttachmentMetaRow, MessageRow, NewAttachmentRow, NewMessageRow, StoredAttachmentRow,
};
use super::pool::DbPool;
use super::schema::{message, message_attachment};

const LATEST_PER_CONVERSATION_SQL: &str = "\
    SELECT * FROM ( \
        SELECT DISTINCT ON (m.conversation_id) m.* FROM message m \
        WHERE m.sender_id = $1 OR m.receiver_id = $1 \
        ORDER BY m.conversation_id, m.created_at DESC, m.id DESC \
    ) latest \
    ORDER BY latest.created_at DESC, latest.id DESC";

const DEMANDE_RESPONSABLE_SQL: &str = "\
    SELECT a.user_id FROM demande_client d \
    JOIN ticket t ON t.id = d.ticket_id OR t.demande_id = d.id \
    JOIN agent a ON a.matricule = t.responsable \
    WHERE d.id = $1 AND a.user_id IS NOT NULL \
    ORDER BY t.id ASC \
    LIMIT 1";

#[derive(QueryableByName)]
struct UserIdRow {
    #[diesel(sql_type = Nullable<Int4>)]
    user_id: Option<i32>,
}

/// Messages and their attachments.
#[derive(Clone)]
pub struct DieselMessagingRepository {
    pool: DbPool,
}

impl DieselMessagingRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

/// Attachment metadata for the given messages, keyed by message id.
async fn attachments_for(
    conn: &mut AsyncPgConnection,
    message_ids: Vec<i32>,
) -> QueryResult<HashMap<i32, Vec<AttachmentMeta>>> {
    let rows: Vec<AttachmentMetaRow> = message_attachment::table
        .filter(message_attachment::message_id.eq_any(message_ids))
        .select(AttachmentMetaRow::as_select())
        .order_by(message_attachment::id.asc())
        .load(conn)
        .await?;
    let mut grouped: HashMap<i32, Vec<AttachmentMeta>> = HashMap::new();
    for row in rows {
        grouped
            .entry(row.message_id)
            .or_default()
            .push(AttachmentMeta::from(row));
    }
    Ok(grouped)
}

async fn with_attachments(
    conn: &mut AsyncPgConnection,
    rows: Vec<MessageRow>,
) -> QueryResult<Vec<Message>> {
    let ids = rows.iter().map(|row| row.id).collect();
    let mut attachments = attachments_for(conn, ids).await?;
    Ok(rows
        .into_iter()
        .map(|row| {
            let files = attachments.remove(&row.id).unwrap_or_default();
            row.into_message(files)
        })
        .collect())
}

#[async_trait]
impl MessagingRepository for DieselMessagingRepository {
    async fn last_message(
        &self,
        conversation_id: &str,
    ) -> Result<Option<Message>, PersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<MessageRow> = message::table
            .filter(message::conversation_id.eq(conversation_id))
            .select(MessageRow::as_select())
            .order_by((message::created_at.desc(), message::id.desc()))
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        let Some(row) = row else {
            return Ok(None);
        };
        let messages = with_attachments(&mut conn, vec![row])
            .await
            .map_err(map_diesel_error)?;
        Ok(messages.into_iter().next())
    }

    async fn insert(&self, new_message: &NewMessage) -> Result<Message, PersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let (row, attachments) = conn
            .transaction(|conn| {
                async move {
                    let row: MessageRow = diesel::insert_into(message::table)
                        .values(NewMessageRow::from(new_message))
                        .returning(MessageRow::as_returning())
                        .get_result(conn)
                        .await?;
                    let files: Vec<NewAttachmentRow<'_>> = new_message
                        .attachments
                        .iter()
                        .map(|upload| NewAttachmentRow {
                            message_id: row.id,
                            file_name: &upload.name,
                            mime_type: &upload.mime,
                            size: upload.size(),
                            data: &upload.data,
                        })
                        .collect();
                    let attachments: Vec<AttachmentMetaRow> = if files.is_empty() {
                        Vec::new()
                    } else {
                        diesel::insert_into(message_attachment::table)
                            .values(&files)
                            .returning(AttachmentMetaRow::as_returning())
                            .get_results(conn)
                            .await?
                    };
                    Ok((row, attachments))
                }
                .scope_boxed()
            })
            .await
            .map_err(map_diesel_error)?;
        Ok(row.into_message(attachments.into_iter().map(AttachmentMeta::from).collect()))
    }

    async fn list_messages(&self, conversation_id: &str) -> Result<Vec<Message>, PersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<MessageRow> = message::table
            .filter(message::conversation_id.eq(conversation_id))
            .select(MessageRow::as_select())
            .order_by((message::created_at.asc(), message::id.asc()))
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        with_attachments(&mut conn, rows)
            .await
            .map_err(map_diesel_error)
    }

    async fn list_conversations(
        &self,
        user_id: i32,
    ) -> Result<Vec<ConversationSummary>, PersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<MessageRow> = diesel::sql_query(LATEST_PER_CONVERSATION_SQL)
            .bind::<Int4, _>(user_id)
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        let messages = with_attachments(&mut conn, rows)
            .await
            .map_err(map_diesel_error)?;
        Ok(messages
            .into_iter()
            .map(|last_message| ConversationSummary {
                conversation_id: last_message.conversation_id.clone(),
                last_message,
            })
            .collect())
    }

    async fn find_attachment(&self, id: i32) -> Result<Option<StoredAttachment>, PersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<StoredAttachmentRow> = message_attachment::table
            .inner_join(message::table)
            .filter(message_attachment::id.eq(id))
            .select((
                AttachmentMetaRow::as_select(),
                message_attachment::data,
                message::sender_id,
                message::receiver_id,
            ))
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        Ok(row.map(StoredAttachment::from))
    }

    async fn demande_responsable_user(
        &self,
        demande_id: i32,
    ) -> Result<Option<i32>, PersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<UserIdRow> = diesel::sql_query(DEMANDE_RESPONSABLE_SQL)
            .bind::<Int4, _>(demande_id)
            .get_result(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        Ok(row.and_then(|row| row.user_id))
    }
}
