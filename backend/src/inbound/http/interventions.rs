//! Intervention endpoints, calendar feed and intervention reports.

use actix_web::{HttpResponse, delete, get, patch, post, put, route, web};

use crate::domain::{
    CalendarEntry, CalendarQuery, Error, Intervention, InterventionEvent, InterventionFilter,
    InterventionInput, InterventionRelations, MaterielUsage, Rendu, RenduInput,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;

#[utoipa::path(
    get,
    path = "/api/interventions",
    params(InterventionFilter),
    responses((status = 200, description = "Interventions", body = [Intervention])),
    tags = ["interventions"],
    operation_id = "listInterventions"
)]
#[get("/interventions")]
pub async fn list_interventions(
    state: web::Data<HttpState>,
    session: SessionContext,
    query: web::Query<InterventionFilter>,
) -> ApiResult<web::Json<Vec<Intervention>>> {
    session.require_caller()?;
    Ok(web::Json(
        state
            .interventions
            .list_interventions(query.into_inner())
            .await?,
    ))
}

/// Calendar feed: `{id, title, start, end, extendedProps}` per intervention.
#[utoipa::path(
    get,
    path = "/api/interventions/calendar",
    params(CalendarQuery),
    responses((status = 200, description = "Calendar entries", body = [CalendarEntry])),
    tags = ["interventions"],
    operation_id = "interventionCalendar"
)]
#[get("/interventions/calendar")]
pub async fn calendar(
    state: web::Data<HttpState>,
    session: SessionContext,
    query: web::Query<CalendarQuery>,
) -> ApiResult<web::Json<Vec<CalendarEntry>>> {
    session.require_caller()?;
    Ok(web::Json(
        state.interventions.calendar(query.into_inner()).await?,
    ))
}

#[utoipa::path(
    post,
    path = "/api/interventions",
    request_body = InterventionInput,
    responses(
        (status = 201, description = "Intervention created", body = Intervention),
        (status = 400, description = "ticket_id or titre missing", body = Error),
        (status = 404, description = "Unknown ticket", body = Error)
    ),
    tags = ["interventions"],
    operation_id = "createIntervention"
)]
#[post("/interventions")]
pub async fn create_intervention(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<InterventionInput>,
) -> ApiResult<HttpResponse> {
    session.require_admin()?;
    let intervention = state
        .interventions
        .create_intervention(payload.into_inner())
        .await?;
    Ok(HttpResponse::Created().json(intervention))
}

#[utoipa::path(
    get,
    path = "/api/interventions/{id}",
    params(("id" = i32, Path, description = "Intervention id")),
    responses(
        (status = 200, description = "Intervention", body = Intervention),
        (status = 404, description = "Unknown intervention", body = Error)
    ),
    tags = ["interventions"],
    operation_id = "getIntervention"
)]
#[get("/interventions/{id}")]
pub async fn get_intervention(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<i32>,
) -> ApiResult<web::Json<Intervention>> {
    session.require_caller()?;
    Ok(web::Json(
        state
            .interventions
            .get_intervention(path.into_inner())
            .await?,
    ))
}

/// Full replacement: absent fields are cleared.
#[utoipa::path(
    put,
    path = "/api/interventions/{id}",
    params(("id" = i32, Path, description = "Intervention id")),
    request_body = InterventionInput,
    responses(
        (status = 200, description = "Replaced intervention", body = Intervention),
        (status = 404, description = "Unknown intervention or ticket", body = Error)
    ),
    tags = ["interventions"],
    operation_id = "replaceIntervention"
)]
#[put("/interventions/{id}")]
pub async fn replace_intervention(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<i32>,
    payload: web::Json<InterventionInput>,
) -> ApiResult<web::Json<Intervention>> {
    session.require_admin()?;
    Ok(web::Json(
        state
            .interventions
            .replace_intervention(path.into_inner(), payload.into_inner())
            .await?,
    ))
}

#[utoipa::path(
    patch,
    path = "/api/interventions/{id}",
    params(("id" = i32, Path, description = "Intervention id")),
    request_body = InterventionInput,
    responses(
        (status = 200, description = "Patched intervention", body = Intervention),
        (status = 404, description = "Unknown intervention or ticket", body = Error)
    ),
    tags = ["interventions"],
    operation_id = "patchIntervention"
)]
#[patch("/interventions/{id}")]
pub async fn patch_intervention(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<i32>,
    payload: web::Json<InterventionInput>,
) -> ApiResult<web::Json<Intervention>> {
    session.require_admin()?;
    Ok(web::Json(
        state
            .interventions
            .patch_intervention(path.into_inner(), payload.into_inner())
            .await?,
    ))
}

#[utoipa::path(
    delete,
    path = "/api/interventions/{id}",
    params(("id" = i32, Path, description = "Intervention id")),
    responses(
        (status = 204, description = "Intervention deleted"),
        (status = 404, description = "Unknown intervention", body = Error)
    ),
    tags = ["interventions"],
    operation_id = "deleteIntervention"
)]
#[delete("/interventions/{id}")]
pub async fn delete_intervention(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<i32>,
) -> ApiResult<HttpResponse> {
    session.require_admin()?;
    state
        .interventions
        .delete_intervention(path.into_inner())
        .await?;
    Ok(HttpResponse::NoContent().finish())
}

#[utoipa::path(
    get,
    path = "/api/interventions/{id}/events",
    params(("id" = i32, Path, description = "Intervention id")),
    responses((status = 200, description = "Per-agent events", body = [InterventionEvent])),
    tags = ["interventions"],
    operation_id = "interventionEvents"
)]
#[get("/interventions/{id}/events")]
pub async fn events(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<i32>,
) -> ApiResult<web::Json<Vec<InterventionEvent>>> {
    session.require_caller()?;
    Ok(web::Json(
        state.interventions.events(path.into_inner()).await?,
    ))
}

/// Equipment of the intervention merged from direct and requested sources.
#[utoipa::path(
    get,
    path = "/api/interventions/{id}/materiels",
    params(("id" = i32, Path, description = "Intervention id")),
    responses((status = 200, description = "Equipment", body = [MaterielUsage])),
    tags = ["interventions"],
    operation_id = "interventionMateriels"
)]
#[get("/interventions/{id}/materiels")]
pub async fn materiels(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<i32>,
) -> ApiResult<web::Json<Vec<MaterielUsage>>> {
    session.require_caller()?;
    Ok(web::Json(
        state.interventions.materiels(path.into_inner()).await?,
    ))
}

#[utoipa::path(
    get,
    path = "/api/interventions/{id}/relations",
    params(("id" = i32, Path, description = "Intervention id")),
    responses(
        (status = 200, description = "Intervention with its context", body = InterventionRelations),
        (status = 404, description = "Unknown intervention", body = Error)
    ),
    tags = ["interventions"],
    operation_id = "interventionRelations"
)]
#[get("/interventions/{id}/relations")]
pub async fn intervention_relations(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<i32>,
) -> ApiResult<web::Json<InterventionRelations>> {
    session.require_caller()?;
    Ok(web::Json(
        state
            .interventions
            .intervention_relations(path.into_inner())
            .await?,
    ))
}

#[utoipa::path(
    get,
    path = "/api/interventions/{id}/rendus",
    params(("id" = i32, Path, description = "Intervention id")),
    responses((status = 200, description = "Reports", body = [Rendu])),
    tags = ["interventions"],
    operation_id = "listInterventionRendus"
)]
#[get("/interventions/{id}/rendus")]
pub async fn list_rendus(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<i32>,
) -> ApiResult<web::Json<Vec<Rendu>>> {
    session.require_caller()?;
    Ok(web::Json(
        state.interventions.list_rendus(path.into_inner()).await?,
    ))
}

#[utoipa::path(
    post,
    path = "/api/interventions/{id}/rendus",
    params(("id" = i32, Path, description = "Intervention id")),
    request_body = RenduInput,
    responses(
        (status = 201, description = "Report created", body = Rendu),
        (status = 400, description = "Title missing or image not base64", body = Error)
    ),
    tags = ["interventions"],
    operation_id = "createInterventionRendu"
)]
#[post("/interventions/{id}/rendus")]
pub async fn create_rendu(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<i32>,
    payload: web::Json<RenduInput>,
) -> ApiResult<HttpResponse> {
    session.require_caller()?;
    let rendu = state
        .interventions
        .create_rendu(path.into_inner(), payload.into_inner())
        .await?;
    Ok(HttpResponse::Created().json(rendu))
}

#[utoipa::path(
    get,
    path = "/api/interventions/{id}/rendus/{rendu_id}",
    params(
        ("id" = i32, Path, description = "Intervention id"),
        ("rendu_id" = i32, Path, description = "Report id")
    ),
    responses(
        (status = 200, description = "Report", body = Rendu),
        (status = 404, description = "Report not found on this intervention", body = Error)
    ),
    tags = ["interventions"],
    operation_id = "getInterventionRendu"
)]
#[get("/interventions/{id}/rendus/{rendu_id}")]
pub async fn get_rendu(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<(i32, i32)>,
) -> ApiResult<web::Json<Rendu>> {
    session.require_caller()?;
    let (id, rendu_id) = path.into_inner();
    Ok(web::Json(state.interventions.get_rendu(id, rendu_id).await?))
}

#[utoipa::path(
    method(put, patch),
    path = "/api/interventions/{id}/rendus/{rendu_id}",
    params(
        ("id" = i32, Path, description = "Intervention id"),
        ("rendu_id" = i32, Path, description = "Report id")
    ),
    request_body = RenduInput,
    responses(
        (status = 200, description = "Updated report", body = Rendu),
        (status = 404, description = "Report not found on this intervention", body = Error)
    ),
    tags = ["interventions"],
    operation_id = "updateInterventionRendu"
)]
#[route("/interventions/{id}/rendus/{rendu_id}", method = "PUT", method = "PATCH")]
pub async fn update_rendu(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<(i32, i32)>,
    payload: web::Json<RenduInput>,
) -> ApiResult<web::Json<Rendu>> {
    session.require_caller()?;
    let (id, rendu_id) = path.into_inner();
    Ok(web::Json(
        state
            .interventions
            .update_rendu(id, rendu_id, payload.into_inner())
            .await?,
    ))
}

#[utoipa::path(
    delete,
    path = "/api/interventions/{id}/rendus/{rendu_id}",
    params(
        ("id" = i32, Path, description = "Intervention id"),
        ("rendu_id" = i32, Path, description = "Report id")
    ),
    responses(
        (status = 204, description = "Report and its images deleted"),
        (status = 404, description = "Report not found on this intervention", body = Error)
    ),
    tags = ["interventions"],
    operation_id = "deleteInterventionRendu"
)]
#[delete("/interventions/{id}/rendus/{rendu_id}")]
pub async fn delete_rendu(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<(i32, i32)>,
) -> ApiResult<HttpResponse> {
    session.require_admin()?;
    let (id, rendu_id) = path.into_inner();
    state.interventions.delete_rendu(id, rendu_id).await?;
    Ok(HttpResponse::NoContent().finish())
}
