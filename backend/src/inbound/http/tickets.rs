//! Ticket endpoints.
//!
//! Reads need a session; mutations need an administrator, except taking a
//! ticket (agents) and rating it (the client's user).

use actix_web::{HttpResponse, delete, get, post, route, web};
use serde_json::json;

use crate::domain::{
    AgentAssignment, AgentAssignmentInput, Assignment, Error, JustificationInput, Responsable,
    ResponsableChange, ResponsableInput, Satisfaction, SatisfactionInput, TakeOutcome, Ticket,
    TicketFilter, TicketInput, TicketPatch, TicketRelations,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;

#[utoipa::path(
    get,
    path = "/api/tickets",
    params(TicketFilter),
    responses(
        (status = 200, description = "Tickets, newest first", body = [Ticket]),
        (status = 401, description = "No session", body = Error)
    ),
    tags = ["tickets"],
    operation_id = "listTickets"
)]
#[get("/tickets")]
pub async fn list_tickets(
    state: web::Data<HttpState>,
    session: SessionContext,
    query: web::Query<TicketFilter>,
) -> ApiResult<web::Json<Vec<Ticket>>> {
    session.require_caller()?;
    Ok(web::Json(state.tickets.list_tickets(query.into_inner()).await?))
}

#[utoipa::path(
    post,
    path = "/api/tickets",
    request_body = TicketInput,
    responses(
        (status = 201, description = "Ticket created", body = Ticket),
        (status = 400, description = "doe_id/affaire_id missing or invalid data", body = Error),
        (status = 403, description = "Administrator required", body = Error)
    ),
    tags = ["tickets"],
    operation_id = "createTicket"
)]
#[post("/tickets")]
pub async fn create_ticket(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<TicketInput>,
) -> ApiResult<HttpResponse> {
    let caller = session.require_admin()?;
    let ticket = state
        .tickets
        .create_ticket(&caller, payload.into_inner())
        .await?;
    Ok(HttpResponse::Created().json(ticket))
}

#[utoipa::path(
    get,
    path = "/api/tickets/{id}",
    params(("id" = i32, Path, description = "Ticket id")),
    responses(
        (status = 200, description = "Ticket", body = Ticket),
        (status = 404, description = "Unknown ticket", body = Error)
    ),
    tags = ["tickets"],
    operation_id = "getTicket"
)]
#[get("/tickets/{id}")]
pub async fn get_ticket(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<i32>,
) -> ApiResult<web::Json<Ticket>> {
    session.require_caller()?;
    Ok(web::Json(state.tickets.get_ticket(path.into_inner()).await?))
}

/// Partial update; a responsable change is appended to the history.
#[utoipa::path(
    method(put, patch),
    path = "/api/tickets/{id}",
    params(("id" = i32, Path, description = "Ticket id")),
    request_body = TicketPatch,
    responses(
        (status = 200, description = "Updated ticket", body = Ticket),
        (status = 400, description = "Empty patch or invalid data", body = Error),
        (status = 404, description = "Unknown ticket", body = Error)
    ),
    tags = ["tickets"],
    operation_id = "updateTicket"
)]
#[route("/tickets/{id}", method = "PUT", method = "PATCH")]
pub async fn update_ticket(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<i32>,
    payload: web::Json<TicketPatch>,
) -> ApiResult<web::Json<Ticket>> {
    let caller = session.require_admin()?;
    let ticket = state
        .tickets
        .update_ticket(&caller, path.into_inner(), payload.into_inner())
        .await?;
    Ok(web::Json(ticket))
}

#[utoipa::path(
    delete,
    path = "/api/tickets/{id}",
    params(("id" = i32, Path, description = "Ticket id")),
    request_body = JustificationInput,
    responses(
        (status = 204, description = "Ticket deleted"),
        (status = 400, description = "Justification missing", body = Error),
        (status = 404, description = "Unknown ticket", body = Error)
    ),
    tags = ["tickets"],
    operation_id = "deleteTicket"
)]
#[delete("/tickets/{id}")]
pub async fn delete_ticket(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<i32>,
    payload: Option<web::Json<JustificationInput>>,
) -> ApiResult<HttpResponse> {
    let caller = session.require_admin()?;
    let input = payload.map(web::Json::into_inner).unwrap_or_default();
    state
        .tickets
        .delete_ticket(&caller, path.into_inner(), input)
        .await?;
    Ok(HttpResponse::NoContent().finish())
}

#[utoipa::path(
    get,
    path = "/api/tickets/{id}/relations",
    params(("id" = i32, Path, description = "Ticket id")),
    responses(
        (status = 200, description = "Ticket with its related records", body = TicketRelations),
        (status = 404, description = "Unknown ticket", body = Error)
    ),
    tags = ["tickets"],
    operation_id = "ticketRelations"
)]
#[get("/tickets/{id}/relations")]
pub async fn ticket_relations(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<i32>,
) -> ApiResult<web::Json<TicketRelations>> {
    session.require_caller()?;
    Ok(web::Json(
        state.tickets.ticket_relations(path.into_inner()).await?,
    ))
}

/// Take a ticket: primary when unassigned (200), secondary otherwise (201).
#[utoipa::path(
    post,
    path = "/api/tickets/{id}/take",
    params(("id" = i32, Path, description = "Ticket id")),
    responses(
        (status = 200, description = "Caller became primary responsable", body = TakeOutcome),
        (status = 201, description = "Caller added as secondary responsable", body = TakeOutcome),
        (status = 400, description = "No matricule for the caller", body = Error),
        (status = 404, description = "Unknown ticket", body = Error),
        (status = 409, description = "Ticket closed", body = Error)
    ),
    tags = ["tickets"],
    operation_id = "takeTicket"
)]
#[post("/tickets/{id}/take")]
pub async fn take_ticket(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<i32>,
) -> ApiResult<HttpResponse> {
    let caller = session.require_caller()?;
    let outcome = state.tickets.take_ticket(&caller, path.into_inner()).await?;
    let mut response = match outcome.assignment {
        Assignment::Primary => HttpResponse::Ok(),
        Assignment::Secondary => HttpResponse::Created(),
    };
    Ok(response.json(outcome))
}

#[utoipa::path(
    get,
    path = "/api/tickets/{id}/satisfaction",
    params(("id" = i32, Path, description = "Ticket id")),
    responses((status = 200, description = "Satisfaction or null", body = Option<Satisfaction>)),
    tags = ["tickets"],
    operation_id = "getTicketSatisfaction"
)]
#[get("/tickets/{id}/satisfaction")]
pub async fn get_satisfaction(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<i32>,
) -> ApiResult<web::Json<Option<Satisfaction>>> {
    session.require_caller()?;
    Ok(web::Json(
        state.tickets.get_satisfaction(path.into_inner()).await?,
    ))
}

/// Rate a ticket from 1 to 5; only the client's own user may.
#[utoipa::path(
    post,
    path = "/api/tickets/{id}/satisfaction",
    params(("id" = i32, Path, description = "Ticket id")),
    request_body = SatisfactionInput,
    responses(
        (status = 200, description = "Stored satisfaction", body = Satisfaction),
        (status = 400, description = "Rating outside 1-5", body = Error),
        (status = 403, description = "Not the ticket's client", body = Error)
    ),
    tags = ["tickets"],
    operation_id = "saveTicketSatisfaction"
)]
#[post("/tickets/{id}/satisfaction")]
pub async fn save_satisfaction(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<i32>,
    payload: web::Json<SatisfactionInput>,
) -> ApiResult<web::Json<Satisfaction>> {
    let caller = session.require_caller()?;
    let satisfaction = state
        .tickets
        .save_satisfaction(&caller, path.into_inner(), payload.into_inner())
        .await?;
    Ok(web::Json(satisfaction))
}

#[utoipa::path(
    get,
    path = "/api/tickets/{id}/agents",
    params(("id" = i32, Path, description = "Ticket id")),
    responses((status = 200, description = "Assigned agents", body = [AgentAssignment])),
    tags = ["tickets"],
    operation_id = "listTicketAgents"
)]
#[get("/tickets/{id}/agents")]
pub async fn list_agents(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<i32>,
) -> ApiResult<web::Json<Vec<AgentAssignment>>> {
    session.require_caller()?;
    Ok(web::Json(state.tickets.list_agents(path.into_inner()).await?))
}

#[utoipa::path(
    post,
    path = "/api/tickets/{id}/agents",
    params(("id" = i32, Path, description = "Ticket id")),
    request_body = AgentAssignmentInput,
    responses(
        (status = 201, description = "Agent assigned", body = AgentAssignment),
        (status = 404, description = "Unknown ticket or agent", body = Error)
    ),
    tags = ["tickets"],
    operation_id = "addTicketAgent"
)]
#[post("/tickets/{id}/agents")]
pub async fn add_agent(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<i32>,
    payload: web::Json<AgentAssignmentInput>,
) -> ApiResult<HttpResponse> {
    session.require_admin()?;
    let assignment = state
        .tickets
        .add_agent(path.into_inner(), payload.into_inner())
        .await?;
    Ok(HttpResponse::Created().json(assignment))
}

#[utoipa::path(
    delete,
    path = "/api/tickets/{id}/agents/{matricule}",
    params(
        ("id" = i32, Path, description = "Ticket id"),
        ("matricule" = String, Path, description = "Agent matricule")
    ),
    responses((status = 200, description = "Agent removed; body is {\"ok\":true}")),
    tags = ["tickets"],
    operation_id = "removeTicketAgent"
)]
#[delete("/tickets/{id}/agents/{matricule}")]
pub async fn remove_agent(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<(i32, String)>,
) -> ApiResult<HttpResponse> {
    session.require_admin()?;
    let (id, matricule) = path.into_inner();
    state.tickets.remove_agent(id, &matricule).await?;
    Ok(HttpResponse::Ok().json(json!({ "ok": true })))
}

#[utoipa::path(
    get,
    path = "/api/tickets/{id}/responsables",
    params(("id" = i32, Path, description = "Ticket id")),
    responses((status = 200, description = "Responsables", body = [Responsable])),
    tags = ["tickets"],
    operation_id = "listTicketResponsables"
)]
#[get("/tickets/{id}/responsables")]
pub async fn list_responsables(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<i32>,
) -> ApiResult<web::Json<Vec<Responsable>>> {
    session.require_caller()?;
    Ok(web::Json(
        state.tickets.list_responsables(path.into_inner()).await?,
    ))
}

/// Add a responsable; the target agent must hold the chef function.
#[utoipa::path(
    post,
    path = "/api/tickets/{id}/responsables",
    params(("id" = i32, Path, description = "Ticket id")),
    request_body = ResponsableInput,
    responses(
        (status = 201, description = "Responsable added", body = Responsable),
        (status = 403, description = "Target is not a chef", body = Error),
        (status = 404, description = "Unknown ticket or agent", body = Error)
    ),
    tags = ["tickets"],
    operation_id = "addTicketResponsable"
)]
#[post("/tickets/{id}/responsables")]
pub async fn add_responsable(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<i32>,
    payload: web::Json<ResponsableInput>,
) -> ApiResult<HttpResponse> {
    session.require_admin()?;
    let responsable = state
        .tickets
        .add_responsable(path.into_inner(), payload.into_inner())
        .await?;
    Ok(HttpResponse::Created().json(responsable))
}

#[utoipa::path(
    delete,
    path = "/api/tickets/{id}/responsables/{matricule}",
    params(
        ("id" = i32, Path, description = "Ticket id"),
        ("matricule" = String, Path, description = "Agent matricule")
    ),
    responses(
        (status = 204, description = "Responsable removed"),
        (status = 404, description = "Not a responsable of this ticket", body = Error)
    ),
    tags = ["tickets"],
    operation_id = "removeTicketResponsable"
)]
#[delete("/tickets/{id}/responsables/{matricule}")]
pub async fn remove_responsable(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<(i32, String)>,
) -> ApiResult<HttpResponse> {
    session.require_admin()?;
    let (id, matricule) = path.into_inner();
    state.tickets.remove_responsable(id, &matricule).await?;
    Ok(HttpResponse::NoContent().finish())
}

#[utoipa::path(
    get,
    path = "/api/tickets/{id}/history",
    params(("id" = i32, Path, description = "Ticket id")),
    responses((status = 200, description = "Responsable changes, newest first", body = [ResponsableChange])),
    tags = ["tickets"],
    operation_id = "ticketHistory"
)]
#[get("/tickets/{id}/history")]
pub async fn responsable_history(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<i32>,
) -> ApiResult<web::Json<Vec<ResponsableChange>>> {
    session.require_caller()?;
    Ok(web::Json(
        state.tickets.responsable_history(path.into_inner()).await?,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::TicketEtat;
    use crate::inbound::http::test_utils::{
        TestMocks, admin, agent, client_user, session_cookie, test_app,
    };
    use actix_web::http::StatusCode;
    use actix_web::test as actix_test;
    use chrono::{TimeZone, Utc};
    use rstest::rstest;
    use serde_json::Value;

    fn ticket(responsable: Option<&str>) -> Ticket {
        Ticket {
            id: 7,
            titre: "Fuite toit".to_owned(),
            description: None,
            etat: TicketEtat::PasCommence,
            doe_id: Some(1),
            affaire_id: Some(2),
            site_id: None,
            demande_id: Some(11),
            responsable: responsable.map(str::to_owned),
            date_debut: None,
            date_fin: None,
            created_at: Utc
                .with_ymd_and_hms(2024, 3, 1, 9, 0, 0)
                .single()
                .expect("valid date"),
        }
    }

    #[rstest]
    #[case(Assignment::Primary, StatusCode::OK, "primary")]
    #[case(Assignment::Secondary, StatusCode::CREATED, "secondary")]
    #[actix_web::test]
    async fn take_status_follows_assignment(
        #[case] assignment: Assignment,
        #[case] expected: StatusCode,
        #[case] label: &str,
    ) {
        let mut mocks = TestMocks::default();
        mocks
            .tickets
            .expect_take_ticket()
            .withf(|caller, id| caller.matricule.as_deref() == Some("M042") && *id == 7)
            .returning(move |_, _| {
                Ok(TakeOutcome {
                    assignment,
                    ticket: ticket(Some("M042")),
                    responsable: None,
                })
            });
        let app = test_app!(mocks).await;
        let cookie = session_cookie(&app, &agent()).await;
        let res = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri("/api/tickets/7/take")
                .cookie(cookie)
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), expected);
        let body: Value = actix_test::read_body_json(res).await;
        assert_eq!(body["assignment"], label);
    }

    #[actix_web::test]
    async fn remove_agent_answers_ok_flag() {
        let mut mocks = TestMocks::default();
        mocks
            .tickets
            .expect_remove_agent()
            .withf(|id, matricule| *id == 7 && matricule == "M042")
            .returning(|_, _| Ok(()));
        let app = test_app!(mocks).await;
        let cookie = session_cookie(&app, &admin()).await;
        let res = actix_test::call_service(
            &app,
            actix_test::TestRequest::delete()
                .uri("/api/tickets/7/agents/M042")
                .cookie(cookie)
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::OK);
        let body: Value = actix_test::read_body_json(res).await;
        assert_eq!(body, serde_json::json!({"ok": true}));
    }

    #[rstest]
    #[case("PUT")]
    #[case("PATCH")]
    #[actix_web::test]
    async fn update_accepts_put_and_patch(#[case] method: &str) {
        let mut mocks = TestMocks::default();
        mocks
            .tickets
            .expect_update_ticket()
            .withf(|_, id, patch| *id == 7 && patch.responsable.as_deref() == Some("M042"))
            .returning(|_, _, _| Ok(ticket(Some("M042"))));
        let app = test_app!(mocks).await;
        let cookie = session_cookie(&app, &admin()).await;
        let method = actix_web::http::Method::from_bytes(method.as_bytes()).expect("method");
        let res = actix_test::call_service(
            &app,
            actix_test::TestRequest::default()
                .method(method)
                .uri("/api/tickets/7")
                .cookie(cookie)
                .set_json(serde_json::json!({"responsable": "M042"}))
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::OK);
    }

    #[actix_web::test]
    async fn clients_cannot_create_tickets() {
        let app = test_app!(TestMocks::default()).await;
        let cookie = session_cookie(&app, &client_user()).await;
        let res = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri("/api/tickets")
                .cookie(cookie)
                .set_json(serde_json::json!({"titre": "x", "doe_id": 1, "affaire_id": 2}))
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::FORBIDDEN);
    }

    #[actix_web::test]
    async fn list_forwards_query_filters() {
        let mut mocks = TestMocks::default();
        mocks
            .tickets
            .expect_list_tickets()
            .withf(|filter| filter.site_id == Some(3) && filter.responsable.as_deref() == Some("M042"))
            .returning(|_| Ok(vec![ticket(Some("M042"))]));
        let app = test_app!(mocks).await;
        let cookie = session_cookie(&app, &agent()).await;
        let res = actix_test::call_service(
            &app,
            actix_test::TestRequest::get()
                .uri("/api/tickets?site_id=3&responsable=M042")
                .cookie(cookie)
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::OK);
    }

    #[actix_web::test]
    async fn satisfaction_from_another_client_is_forbidden() {
        let mut mocks = TestMocks::default();
        mocks
            .tickets
            .expect_save_satisfaction()
            .returning(|_, _, _| Err(Error::forbidden("ticket belongs to another client")));
        let app = test_app!(mocks).await;
        let cookie = session_cookie(&app, &client_user()).await;
        let res = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri("/api/tickets/7/satisfaction")
                .cookie(cookie)
                .set_json(serde_json::json!({"rating": 4}))
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::FORBIDDEN);
    }
}
