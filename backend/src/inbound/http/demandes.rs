//! Client demande endpoints.
//!
//! ```text
//! POST /api/demandes_client {"titre":"Fuite toit","description":"Eau au plafond"}
//! PATCH /api/demandes_client/{id}/status {"status":"rejetée","commentaire":"Hors garantie"}
//! DELETE /api/demandes_client/{id} {"justification":"doublon"}
//! POST /api/demandes_client/{id}/convert
//! ```

use actix_web::{HttpResponse, delete, get, patch, post, put, web};

use crate::domain::{
    ConversionResult, DeletedDemande, Demande, DemandeInput, DemandeQuery, DemandeStatusInput,
    Error, JustificationInput,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;

/// Demandes visible to the caller; soft-deleted rows only on `status=Supprimee`.
#[utoipa::path(
    get,
    path = "/api/demandes_client",
    params(DemandeQuery),
    responses(
        (status = 200, description = "Demandes", body = [Demande]),
        (status = 400, description = "Unknown status filter", body = Error),
        (status = 401, description = "No session", body = Error)
    ),
    tags = ["demandes"],
    operation_id = "listDemandes"
)]
#[get("/demandes_client")]
pub async fn list_demandes(
    state: web::Data<HttpState>,
    session: SessionContext,
    query: web::Query<DemandeQuery>,
) -> ApiResult<web::Json<Vec<Demande>>> {
    let caller = session.require_caller()?;
    let demandes = state
        .clients
        .list_demandes(&caller, query.into_inner())
        .await?;
    Ok(web::Json(demandes))
}

#[utoipa::path(
    post,
    path = "/api/demandes_client",
    request_body = DemandeInput,
    responses(
        (status = 201, description = "Demande created", body = Demande),
        (status = 400, description = "Missing titre or description", body = Error),
        (status = 403, description = "Client or site not accessible", body = Error)
    ),
    tags = ["demandes"],
    operation_id = "createDemande"
)]
#[post("/demandes_client")]
pub async fn create_demande(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<DemandeInput>,
) -> ApiResult<HttpResponse> {
    let caller = session.require_caller()?;
    let demande = state
        .clients
        .create_demande(&caller, payload.into_inner())
        .await?;
    Ok(HttpResponse::Created().json(demande))
}

/// Soft-deleted demandes with the audit trail of their deletion.
#[utoipa::path(
    get,
    path = "/api/demandes_client/deleted",
    responses(
        (status = 200, description = "Deleted demandes", body = [DeletedDemande]),
        (status = 403, description = "Administrator required", body = Error)
    ),
    tags = ["demandes"],
    operation_id = "listDeletedDemandes"
)]
#[get("/demandes_client/deleted")]
pub async fn list_deleted_demandes(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<Vec<DeletedDemande>>> {
    session.require_admin()?;
    Ok(web::Json(state.clients.list_deleted_demandes().await?))
}

#[utoipa::path(
    get,
    path = "/api/demandes_client/{id}",
    params(("id" = i32, Path, description = "Demande id")),
    responses(
        (status = 200, description = "Demande", body = Demande),
        (status = 403, description = "Not the caller's demande", body = Error),
        (status = 404, description = "Unknown demande", body = Error)
    ),
    tags = ["demandes"],
    operation_id = "getDemande"
)]
#[get("/demandes_client/{id}")]
pub async fn get_demande(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<i32>,
) -> ApiResult<web::Json<Demande>> {
    let caller = session.require_caller()?;
    Ok(web::Json(
        state.clients.get_demande(&caller, path.into_inner()).await?,
    ))
}

#[utoipa::path(
    put,
    path = "/api/demandes_client/{id}",
    params(("id" = i32, Path, description = "Demande id")),
    request_body = DemandeInput,
    responses(
        (status = 200, description = "Updated demande", body = Demande),
        (status = 403, description = "Not the caller's demande", body = Error),
        (status = 409, description = "Already converted or deleted", body = Error)
    ),
    tags = ["demandes"],
    operation_id = "updateDemande"
)]
#[put("/demandes_client/{id}")]
pub async fn update_demande(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<i32>,
    payload: web::Json<DemandeInput>,
) -> ApiResult<web::Json<Demande>> {
    let caller = session.require_caller()?;
    let demande = state
        .clients
        .update_demande(&caller, path.into_inner(), payload.into_inner())
        .await?;
    Ok(web::Json(demande))
}

/// Soft delete; the justification may travel in the body.
#[utoipa::path(
    delete,
    path = "/api/demandes_client/{id}",
    params(("id" = i32, Path, description = "Demande id")),
    request_body = JustificationInput,
    responses(
        (status = 204, description = "Demande marked Supprimee"),
        (status = 400, description = "Justification missing", body = Error),
        (status = 404, description = "Unknown demande", body = Error),
        (status = 409, description = "Already converted", body = Error)
    ),
    tags = ["demandes"],
    operation_id = "deleteDemande"
)]
#[delete("/demandes_client/{id}")]
pub async fn delete_demande(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<i32>,
    payload: Option<web::Json<JustificationInput>>,
) -> ApiResult<HttpResponse> {
    let caller = session.require_caller()?;
    let input = payload.map(web::Json::into_inner).unwrap_or_default();
    state
        .clients
        .delete_demande(&caller, path.into_inner(), input)
        .await?;
    Ok(HttpResponse::NoContent().finish())
}

/// Move a demande to one of its canonical states; synonyms are accepted.
#[utoipa::path(
    patch,
    path = "/api/demandes_client/{id}/status",
    params(("id" = i32, Path, description = "Demande id")),
    request_body = DemandeStatusInput,
    responses(
        (status = 200, description = "Updated demande", body = Demande),
        (status = 400, description = "Unknown status", body = Error),
        (status = 403, description = "Administrator required", body = Error)
    ),
    tags = ["demandes"],
    operation_id = "updateDemandeStatus"
)]
#[patch("/demandes_client/{id}/status")]
pub async fn update_demande_status(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<i32>,
    payload: web::Json<DemandeStatusInput>,
) -> ApiResult<web::Json<Demande>> {
    let caller = session.require_admin()?;
    let demande = state
        .clients
        .update_demande_status(&caller, path.into_inner(), payload.into_inner())
        .await?;
    Ok(web::Json(demande))
}

#[utoipa::path(
    post,
    path = "/api/demandes_client/{id}/restore",
    params(("id" = i32, Path, description = "Demande id")),
    responses(
        (status = 200, description = "Restored demande", body = Demande),
        (status = 403, description = "Administrator required", body = Error),
        (status = 409, description = "Demande is not deleted", body = Error)
    ),
    tags = ["demandes"],
    operation_id = "restoreDemande"
)]
#[post("/demandes_client/{id}/restore")]
pub async fn restore_demande(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<i32>,
) -> ApiResult<web::Json<Demande>> {
    let caller = session.require_admin()?;
    Ok(web::Json(
        state
            .clients
            .restore_demande(&caller, path.into_inner())
            .await?,
    ))
}

/// Convert a demande into a ticket owned by the calling agent.
#[utoipa::path(
    post,
    path = "/api/demandes_client/{id}/convert",
    params(("id" = i32, Path, description = "Demande id")),
    responses(
        (status = 201, description = "Ticket created", body = ConversionResult),
        (status = 403, description = "Administrator required", body = Error),
        (status = 404, description = "Unknown demande", body = Error),
        (status = 409, description = "Already converted", body = Error)
    ),
    tags = ["demandes"],
    operation_id = "convertDemande"
)]
#[post("/demandes_client/{id}/convert")]
pub async fn convert_demande(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<i32>,
) -> ApiResult<HttpResponse> {
    let caller = session.require_admin()?;
    let result = state
        .clients
        .convert_to_ticket(&caller, path.into_inner())
        .await?;
    Ok(HttpResponse::Created().json(result))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{DemandeStatus, ErrorCode};
    use crate::inbound::http::test_utils::{
        TestMocks, admin, client_user, session_cookie, test_app,
    };
    use actix_web::http::StatusCode;
    use actix_web::test as actix_test;
    use chrono::{TimeZone, Utc};
    use rstest::rstest;
    use serde_json::{Value, json};

    fn demande(status: DemandeStatus, commentaire: Option<&str>) -> Demande {
        let at = Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).single().expect("valid date");
        Demande {
            id: 11,
            client_id: 5,
            site_id: None,
            titre: "Fuite toit".to_owned(),
            description: "Eau au plafond".to_owned(),
            status,
            commentaire: commentaire.map(str::to_owned),
            ticket_id: None,
            created_at: at,
            updated_at: at,
        }
    }

    #[actix_web::test]
    async fn client_creates_then_admin_rejects_then_delete_needs_justification() {
        let mut mocks = TestMocks::default();
        mocks
            .clients
            .expect_create_demande()
            .withf(|caller, input| {
                caller.user_id == client_user().user_id
                    && input.titre.as_deref() == Some("Fuite toit")
            })
            .returning(|_, _| Ok(demande(DemandeStatus::EnAttente, None)));
        mocks
            .clients
            .expect_update_demande_status()
            .withf(|_, id, input| {
                *id == 11
                    && input.status.as_deref() == Some("rejetée")
                    && input.commentaire.as_deref() == Some("Hors garantie")
            })
            .returning(|_, _, _| Ok(demande(DemandeStatus::Rejetee, Some("Hors garantie"))));
        mocks
            .clients
            .expect_delete_demande()
            .withf(|_, _, input| input.justification.is_none())
            .returning(|_, _, _| Err(Error::invalid_request("justification is required")));
        let app = test_app!(mocks).await;

        let client_cookie = session_cookie(&app, &client_user()).await;
        let created = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri("/api/demandes_client")
                .cookie(client_cookie.clone())
                .set_json(json!({"titre": "Fuite toit", "description": "Eau au plafond"}))
                .to_request(),
        )
        .await;
        assert_eq!(created.status(), StatusCode::CREATED);
        let body: Value = actix_test::read_body_json(created).await;
        assert_eq!(body["client_id"], 5);
        assert_eq!(body["status"], "En_attente");

        let admin_cookie = session_cookie(&app, &admin()).await;
        let rejected = actix_test::call_service(
            &app,
            actix_test::TestRequest::patch()
                .uri("/api/demandes_client/11/status")
                .cookie(admin_cookie)
                .set_json(json!({"status": "rejetée", "commentaire": "Hors garantie"}))
                .to_request(),
        )
        .await;
        assert_eq!(rejected.status(), StatusCode::OK);
        let body: Value = actix_test::read_body_json(rejected).await;
        assert_eq!(body["status"], "Rejetee");

        let deleted = actix_test::call_service(
            &app,
            actix_test::TestRequest::delete()
                .uri("/api/demandes_client/11")
                .cookie(client_cookie)
                .to_request(),
        )
        .await;
        assert_eq!(deleted.status(), StatusCode::BAD_REQUEST);
    }

    #[rstest]
    #[case("/api/demandes_client/3/restore")]
    #[case("/api/demandes_client/3/convert")]
    #[actix_web::test]
    async fn admin_only_actions_reject_clients(#[case] uri: &str) {
        let app = test_app!(TestMocks::default()).await;
        let cookie = session_cookie(&app, &client_user()).await;
        let res = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri(uri)
                .cookie(cookie)
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::FORBIDDEN);
    }

    #[actix_web::test]
    async fn deleted_listing_is_not_captured_by_id_route() {
        let mut mocks = TestMocks::default();
        mocks
            .clients
            .expect_list_deleted_demandes()
            .times(1)
            .returning(|| Ok(Vec::new()));
        let app = test_app!(mocks).await;
        let cookie = session_cookie(&app, &admin()).await;
        let res = actix_test::call_service(
            &app,
            actix_test::TestRequest::get()
                .uri("/api/demandes_client/deleted")
                .cookie(cookie)
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::OK);
    }

    #[actix_web::test]
    async fn second_conversion_is_a_conflict() {
        let mut mocks = TestMocks::default();
        mocks
            .clients
            .expect_convert_to_ticket()
            .returning(|_, _| Err(Error::conflict("demande already converted")));
        let app = test_app!(mocks).await;
        let cookie = session_cookie(&app, &admin()).await;
        let res = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri("/api/demandes_client/11/convert")
                .cookie(cookie)
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::CONFLICT);
        let body: Error = actix_test::read_body_json(res).await;
        assert_eq!(body.code(), ErrorCode::Conflict);
    }
}
