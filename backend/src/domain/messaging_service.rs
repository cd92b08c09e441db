//! Direct and record-scoped conversations between users.

use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::ports::{
    AccountRepository, ClientRepository, Messaging, MessagingRepository, PersistenceError,
    TicketRepository,
};
use crate::domain::validation::{optional_text, required_text};
use crate::domain::{
    Caller, ConversationCreated, ConversationInput, ConversationScope, ConversationSummary, Error,
    Message, MessageContext, NewMessage, SendMessageInput, StoredAttachment, best_effort,
    decode_files, direct_conversation_id,
};

/// Collaborators of [`MessagingService`].
#[derive(Clone)]
pub struct MessagingServiceDeps {
    pub messages: Arc<dyn MessagingRepository>,
    pub accounts: Arc<dyn AccountRepository>,
    pub tickets: Arc<dyn TicketRepository>,
    pub clients: Arc<dyn ClientRepository>,
}

/// Implements [`Messaging`].
#[derive(Clone)]
pub struct MessagingService {
    deps: MessagingServiceDeps,
}

impl MessagingService {
    pub fn new(deps: MessagingServiceDeps) -> Self {
        Self { deps }
    }

    /// Receiver of a message, tried in order: explicit id, direct
    /// conversation key, last message on the conversation, then the
    /// responsable of the ticket raised from a demande.
    async fn resolve_receiver(
        &self,
        sender: i32,
        conversation_id: &str,
        scope: ConversationScope,
        explicit: Option<i32>,
    ) -> Result<Option<i32>, Error> {
        if let Some(receiver) = explicit.or_else(|| scope.counterpart(sender)) {
            return Ok(Some(receiver));
        }
        if let Some(last) = self.deps.messages.last_message(conversation_id).await? {
            let other = if last.sender_id == sender {
                last.receiver_id
            } else {
                last.sender_id
            };
            return Ok(Some(other));
        }
        match scope {
            ConversationScope::Demande(demande_id) => Ok(self
                .deps
                .messages
                .demande_responsable_user(demande_id)
                .await?),
            _ => Ok(None),
        }
    }

    async fn context_for(&self, scope: ConversationScope) -> Result<MessageContext, PersistenceError> {
        match scope {
            ConversationScope::Ticket(ticket_id) => {
                let Some(ticket) = self.deps.tickets.find(ticket_id).await? else {
                    return Ok(MessageContext::default());
                };
                let demande = match ticket.demande_id {
                    Some(demande_id) => self.deps.clients.find_demande(demande_id).await?,
                    None => None,
                };
                let client_id = match (&demande, ticket.site_id) {
                    (Some(demande), _) => Some(demande.client_id),
                    (None, Some(site_id)) => self
                        .deps
                        .clients
                        .find_site(site_id)
                        .await?
                        .map(|site| site.client_id),
                    (None, None) => None,
                };
                Ok(MessageContext {
                    ticket_id: Some(ticket_id),
                    demande_id: ticket.demande_id,
                    client_id,
                })
            }
            ConversationScope::Demande(demande_id) => {
                let demande = self.deps.clients.find_demande(demande_id).await?;
                Ok(MessageContext {
                    ticket_id: demande.as_ref().and_then(|d| d.ticket_id),
                    demande_id: demande.as_ref().map(|d| d.id),
                    client_id: demande.as_ref().map(|d| d.client_id),
                })
            }
            ConversationScope::Client(client_id) => Ok(MessageContext {
                client_id: Some(client_id),
                ..MessageContext::default()
            }),
            ConversationScope::Direct { .. } | ConversationScope::Other => {
                Ok(MessageContext::default())
            }
        }
    }
}

#[async_trait]
impl Messaging for MessagingService {
    async fn create_conversation(
        &self,
        caller: &Caller,
        input: ConversationInput,
    ) -> Result<ConversationCreated, Error> {
        let email = required_text("email", input.email)?;
        let recipient = self
            .deps
            .accounts
            .find_by_email(&email)
            .await?
            .ok_or_else(|| Error::invalid_request(format!("no user with email {email}")))?;
        if recipient.id == caller.user_id {
            return Err(Error::invalid_request(
                "cannot open a conversation with yourself",
            ));
        }
        Ok(ConversationCreated {
            conversation_id: direct_conversation_id(caller.user_id, recipient.id),
            recipient_id: recipient.id,
            recipient_email: recipient.email,
        })
    }

    async fn list_conversations(&self, caller: &Caller) -> Result<Vec<ConversationSummary>, Error> {
        Ok(self
            .deps
            .messages
            .list_conversations(caller.user_id)
            .await?)
    }

    async fn list_messages(
        &self,
        caller: &Caller,
        conversation_id: &str,
    ) -> Result<Vec<Message>, Error> {
        let scope = ConversationScope::parse(conversation_id);
        if !caller.is_admin()
            && matches!(scope, ConversationScope::Direct { .. })
            && !scope.involves(caller.user_id)
        {
            return Err(Error::forbidden("not a participant of this conversation"));
        }
        let messages = self.deps.messages.list_messages(conversation_id).await?;
        let participates = scope.involves(caller.user_id)
            || messages
                .iter()
                .any(|m| m.sender_id == caller.user_id || m.receiver_id == caller.user_id);
        if caller.is_admin() || participates || messages.is_empty() {
            Ok(messages)
        } else {
            Err(Error::forbidden("not a participant of this conversation"))
        }
    }

    async fn send_message(
        &self,
        caller: &Caller,
        conversation_id: &str,
        input: SendMessageInput,
    ) -> Result<Message, Error> {
        let conversation_id = required_text("conversation_id", Some(conversation_id.to_owned()))?;
        let sender = caller.user_id;
        let scope = ConversationScope::parse(&conversation_id);
        if matches!(scope, ConversationScope::Direct { .. }) && !scope.involves(sender) {
            return Err(Error::forbidden("not a participant of this conversation"));
        }
        let contenu = optional_text(input.contenu);
        let attachments = decode_files(input.attachments)?;
        if contenu.is_none() && attachments.is_empty() {
            return Err(Error::invalid_request(
                "a message needs text or at least one attachment",
            ));
        }

        let receiver_id = self
            .resolve_receiver(sender, &conversation_id, scope, input.receiver_id)
            .await?
            .ok_or_else(|| Error::invalid_request("could not determine the message receiver"))?;
        if receiver_id == sender {
            return Err(Error::invalid_request("cannot send a message to yourself"));
        }

        let context = best_effort("message context", self.context_for(scope))
            .await
            .unwrap_or_default();
        let message = NewMessage {
            conversation_id,
            sender_id: sender,
            receiver_id,
            contenu,
            context,
            attachments,
        };
        Ok(self.deps.messages.insert(&message).await?)
    }

    async fn get_attachment(&self, caller: &Caller, id: i32) -> Result<StoredAttachment, Error> {
        let attachment = self
            .deps
            .messages
            .find_attachment(id)
            .await?
            .ok_or_else(|| Error::not_found(format!("attachment {id} not found")))?;
        let participant =
            attachment.sender_id == caller.user_id || attachment.receiver_id == caller.user_id;
        if participant || caller.is_admin() {
            Ok(attachment)
        } else {
            Err(Error::forbidden("not a participant of this conversation"))
        }
    }
}

#[cfg(test)]
#[path = "messaging_service_tests.rs"]
mod tests;
