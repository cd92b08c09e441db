//! Conversation and message endpoints.
//!
//! ```text
//! POST /api/conversations/new {"email":"agent@example.com"}
//! POST /api/conversations/user3-user7/messages {"contenu":"Bonjour","attachments":[]}
//! GET /api/messages/attachments/{id}
//! ```

use actix_web::http::header::{self, ContentDisposition, DispositionParam, DispositionType};
use actix_web::{HttpResponse, get, post, web};

use crate::domain::{
    ConversationCreated, ConversationInput, ConversationSummary, Error, Message,
    SendMessageInput,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;

/// Open (or reuse) the direct conversation with the user owning `email`.
#[utoipa::path(
    post,
    path = "/api/conversations/new",
    request_body = ConversationInput,
    responses(
        (status = 200, description = "Conversation key", body = ConversationCreated),
        (status = 400, description = "Unknown recipient or self", body = Error),
        (status = 401, description = "No session", body = Error)
    ),
    tags = ["messaging"],
    operation_id = "createConversation"
)]
#[post("/conversations/new")]
pub async fn create_conversation(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<ConversationInput>,
) -> ApiResult<web::Json<ConversationCreated>> {
    let caller = session.require_caller()?;
    Ok(web::Json(
        state
            .messaging
            .create_conversation(&caller, payload.into_inner())
            .await?,
    ))
}

#[utoipa::path(
    get,
    path = "/api/conversations",
    responses((status = 200, description = "Latest message per conversation", body = [ConversationSummary])),
    tags = ["messaging"],
    operation_id = "listConversations"
)]
#[get("/conversations")]
pub async fn list_conversations(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<Vec<ConversationSummary>>> {
    let caller = session.require_caller()?;
    Ok(web::Json(
        state.messaging.list_conversations(&caller).await?,
    ))
}

#[utoipa::path(
    get,
    path = "/api/conversations/{conversation_id}/messages",
    params(("conversation_id" = String, Path, description = "Conversation key")),
    responses(
        (status = 200, description = "Messages, oldest first", body = [Message]),
        (status = 403, description = "Not a participant", body = Error)
    ),
    tags = ["messaging"],
    operation_id = "listMessages"
)]
#[get("/conversations/{conversation_id}/messages")]
pub async fn list_messages(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<web::Json<Vec<Message>>> {
    let caller = session.require_caller()?;
    Ok(web::Json(
        state.messaging.list_messages(&caller, &path).await?,
    ))
}

/// Send a message; attachments travel as base64 in the body.
#[utoipa::path(
    post,
    path = "/api/conversations/{conversation_id}/messages",
    params(("conversation_id" = String, Path, description = "Conversation key")),
    request_body = SendMessageInput,
    responses(
        (status = 201, description = "Message stored", body = Message),
        (status = 400, description = "No receiver, empty message or bad attachment", body = Error),
        (status = 403, description = "Not a participant of the direct conversation", body = Error)
    ),
    tags = ["messaging"],
    operation_id = "sendMessage"
)]
#[post("/conversations/{conversation_id}/messages")]
pub async fn send_message(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
    payload: web::Json<SendMessageInput>,
) -> ApiResult<HttpResponse> {
    let caller = session.require_caller()?;
    let message = state
        .messaging
        .send_message(&caller, &path, payload.into_inner())
        .await?;
    Ok(HttpResponse::Created().json(message))
}

/// Raw attachment bytes served with their stored mime type.
#[utoipa::path(
    get,
    path = "/api/messages/attachments/{id}",
    params(("id" = i32, Path, description = "Attachment id")),
    responses(
        (status = 200, description = "Attachment bytes", content_type = "application/octet-stream"),
        (status = 403, description = "Not a participant", body = Error),
        (status = 404, description = "Unknown attachment", body = Error)
    ),
    tags = ["messaging"],
    operation_id = "getAttachment"
)]
#[get("/messages/attachments/{id}")]
pub async fn get_attachment(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<i32>,
) -> ApiResult<HttpResponse> {
    let caller = session.require_caller()?;
    let attachment = state
        .messaging
        .get_attachment(&caller, path.into_inner())
        .await?;
    let content_type = match attachment.meta.mime_type.trim() {
        "" => "application/octet-stream".to_owned(),
        mime => mime.to_owned(),
    };
    let disposition = ContentDisposition {
        disposition: DispositionType::Inline,
        parameters: vec![DispositionParam::Filename(attachment.meta.file_name.clone())],
    };
    Ok(HttpResponse::Ok()
        .insert_header((header::CONTENT_TYPE, content_type))
        .insert_header(disposition)
        .body(attachment.data))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{AttachmentMeta, StoredAttachment};
    use crate::inbound::http::test_utils::{TestMocks, agent, session_cookie, test_app};
    use actix_web::http::StatusCode;
    use actix_web::test as actix_test;

    #[actix_web::test]
    async fn conversation_endpoints_need_a_session() {
        let app = test_app!(TestMocks::default()).await;
        let res = actix_test::call_service(
            &app,
            actix_test::TestRequest::get().uri("/api/conversations").to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn send_message_forwards_the_conversation_key() {
        let mut mocks = TestMocks::default();
        mocks
            .messaging
            .expect_send_message()
            .withf(|caller, conversation_id, input| {
                caller.user_id == 2
                    && conversation_id == "user2-user7"
                    && input.contenu.as_deref() == Some("Bonjour")
            })
            .returning(|_, _, _| Err(Error::invalid_request("receiver could not be resolved")));
        let app = test_app!(mocks).await;
        let cookie = session_cookie(&app, &agent()).await;
        let res = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri("/api/conversations/user2-user7/messages")
                .cookie(cookie)
                .set_json(serde_json::json!({"contenu": "Bonjour"}))
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn attachment_is_served_with_its_mime_type() {
        let mut mocks = TestMocks::default();
        mocks.messaging.expect_get_attachment().returning(|_, id| {
            Ok(StoredAttachment {
                meta: AttachmentMeta {
                    id,
                    message_id: 1,
                    file_name: "plan.pdf".to_owned(),
                    mime_type: "application/pdf".to_owned(),
                    size: 3,
                },
                data: vec![1, 2, 3],
                sender_id: 2,
                receiver_id: 7,
            })
        });
        let app = test_app!(mocks).await;
        let cookie = session_cookie(&app, &agent()).await;
        let res = actix_test::call_service(
            &app,
            actix_test::TestRequest::get()
                .uri("/api/messages/attachments/5")
                .cookie(cookie)
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(
            res.headers()
                .get(header::CONTENT_TYPE)
                .and_then(|value| value.to_str().ok()),
            Some("application/pdf")
        );
        let body = actix_test::read_body(res).await;
        assert_eq!(body.as_ref(), &[1, 2, 3]);
    }
}
