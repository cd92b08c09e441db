//! Work order (travaux) endpoints and their child collections.

use actix_web::{HttpResponse, delete, get, post, route, web};
use serde_json::json;

use crate::domain::{
    AgentAssignment, AgentAssignmentInput, Error, Rendu, RenduInput, Responsable,
    ResponsableInput, Satisfaction, SatisfactionInput, Tache, TacheInput, Travaux, TravauxFilter,
    TravauxInput, TravauxMateriel, TravauxMaterielInput, TravauxRelations,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;

#[utoipa::path(
    get,
    path = "/api/travaux",
    params(TravauxFilter),
    responses((status = 200, description = "Work orders", body = [Travaux])),
    tags = ["travaux"],
    operation_id = "listTravaux"
)]
#[get("/travaux")]
pub async fn list_travaux(
    state: web::Data<HttpState>,
    session: SessionContext,
    query: web::Query<TravauxFilter>,
) -> ApiResult<web::Json<Vec<Travaux>>> {
    session.require_caller()?;
    Ok(web::Json(state.travaux.list_travaux(query.into_inner()).await?))
}

/// Create a work order; a demande is linked automatically when the site has a client.
#[utoipa::path(
    post,
    path = "/api/travaux",
    request_body = TravauxInput,
    responses(
        (status = 201, description = "Work order created", body = Travaux),
        (status = 400, description = "Title missing", body = Error)
    ),
    tags = ["travaux"],
    operation_id = "createTravaux"
)]
#[post("/travaux")]
pub async fn create_travaux(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<TravauxInput>,
) -> ApiResult<HttpResponse> {
    let caller = session.require_admin()?;
    let travaux = state
        .travaux
        .create_travaux(&caller, payload.into_inner())
        .await?;
    Ok(HttpResponse::Created().json(travaux))
}

#[utoipa::path(
    get,
    path = "/api/travaux/{id}",
    params(("id" = i32, Path, description = "Travaux id")),
    responses(
        (status = 200, description = "Work order", body = Travaux),
        (status = 404, description = "Unknown work order", body = Error)
    ),
    tags = ["travaux"],
    operation_id = "getTravaux"
)]
#[get("/travaux/{id}")]
pub async fn get_travaux(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<i32>,
) -> ApiResult<web::Json<Travaux>> {
    session.require_caller()?;
    Ok(web::Json(state.travaux.get_travaux(path.into_inner()).await?))
}

#[utoipa::path(
    method(put, patch),
    path = "/api/travaux/{id}",
    params(("id" = i32, Path, description = "Travaux id")),
    request_body = TravauxInput,
    responses(
        (status = 200, description = "Updated work order", body = Travaux),
        (status = 404, description = "Unknown work order", body = Error)
    ),
    tags = ["travaux"],
    operation_id = "updateTravaux"
)]
#[route("/travaux/{id}", method = "PUT", method = "PATCH")]
pub async fn update_travaux(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<i32>,
    payload: web::Json<TravauxInput>,
) -> ApiResult<web::Json<Travaux>> {
    let caller = session.require_admin()?;
    let travaux = state
        .travaux
        .update_travaux(&caller, path.into_inner(), payload.into_inner())
        .await?;
    Ok(web::Json(travaux))
}

#[utoipa::path(
    delete,
    path = "/api/travaux/{id}",
    params(("id" = i32, Path, description = "Travaux id")),
    responses(
        (status = 204, description = "Work order deleted"),
        (status = 404, description = "Unknown work order", body = Error)
    ),
    tags = ["travaux"],
    operation_id = "deleteTravaux"
)]
#[delete("/travaux/{id}")]
pub async fn delete_travaux(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<i32>,
) -> ApiResult<HttpResponse> {
    let caller = session.require_admin()?;
    state
        .travaux
        .delete_travaux(&caller, path.into_inner())
        .await?;
    Ok(HttpResponse::NoContent().finish())
}

#[utoipa::path(
    get,
    path = "/api/travaux/{id}/relations",
    params(("id" = i32, Path, description = "Travaux id")),
    responses(
        (status = 200, description = "Work order with its children", body = TravauxRelations),
        (status = 404, description = "Unknown work order", body = Error)
    ),
    tags = ["travaux"],
    operation_id = "travauxRelations"
)]
#[get("/travaux/{id}/relations")]
pub async fn travaux_relations(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<i32>,
) -> ApiResult<web::Json<TravauxRelations>> {
    session.require_caller()?;
    Ok(web::Json(
        state.travaux.travaux_relations(path.into_inner()).await?,
    ))
}

#[utoipa::path(
    get,
    path = "/api/travaux/{id}/taches",
    params(("id" = i32, Path, description = "Travaux id")),
    responses((status = 200, description = "Tasks", body = [Tache])),
    tags = ["travaux"],
    operation_id = "listTaches"
)]
#[get("/travaux/{id}/taches")]
pub async fn list_taches(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<i32>,
) -> ApiResult<web::Json<Vec<Tache>>> {
    session.require_caller()?;
    Ok(web::Json(state.travaux.list_taches(path.into_inner()).await?))
}

#[utoipa::path(
    post,
    path = "/api/travaux/{id}/taches",
    params(("id" = i32, Path, description = "Travaux id")),
    request_body = TacheInput,
    responses(
        (status = 201, description = "Task created", body = Tache),
        (status = 400, description = "Title missing", body = Error)
    ),
    tags = ["travaux"],
    operation_id = "createTache"
)]
#[post("/travaux/{id}/taches")]
pub async fn create_tache(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<i32>,
    payload: web::Json<TacheInput>,
) -> ApiResult<HttpResponse> {
    session.require_admin()?;
    let tache = state
        .travaux
        .create_tache(path.into_inner(), payload.into_inner())
        .await?;
    Ok(HttpResponse::Created().json(tache))
}

#[utoipa::path(
    method(put, patch),
    path = "/api/travaux/{id}/taches/{tache_id}",
    params(
        ("id" = i32, Path, description = "Travaux id"),
        ("tache_id" = i32, Path, description = "Task id")
    ),
    request_body = TacheInput,
    responses(
        (status = 200, description = "Updated task", body = Tache),
        (status = 404, description = "Task not found on this work order", body = Error)
    ),
    tags = ["travaux"],
    operation_id = "updateTache"
)]
#[route("/travaux/{id}/taches/{tache_id}", method = "PUT", method = "PATCH")]
pub async fn update_tache(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<(i32, i32)>,
    payload: web::Json<TacheInput>,
) -> ApiResult<web::Json<Tache>> {
    session.require_admin()?;
    let (id, tache_id) = path.into_inner();
    Ok(web::Json(
        state
            .travaux
            .update_tache(id, tache_id, payload.into_inner())
            .await?,
    ))
}

#[utoipa::path(
    delete,
    path = "/api/travaux/{id}/taches/{tache_id}",
    params(
        ("id" = i32, Path, description = "Travaux id"),
        ("tache_id" = i32, Path, description = "Task id")
    ),
    responses(
        (status = 204, description = "Task deleted"),
        (status = 404, description = "Task not found on this work order", body = Error)
    ),
    tags = ["travaux"],
    operation_id = "deleteTache"
)]
#[delete("/travaux/{id}/taches/{tache_id}")]
pub async fn delete_tache(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<(i32, i32)>,
) -> ApiResult<HttpResponse> {
    session.require_admin()?;
    let (id, tache_id) = path.into_inner();
    state.travaux.delete_tache(id, tache_id).await?;
    Ok(HttpResponse::NoContent().finish())
}

#[utoipa::path(
    get,
    path = "/api/travaux/{id}/materiels",
    params(("id" = i32, Path, description = "Travaux id")),
    responses((status = 200, description = "Equipment links", body = [TravauxMateriel])),
    tags = ["travaux"],
    operation_id = "listTravauxMateriels"
)]
#[get("/travaux/{id}/materiels")]
pub async fn list_materiels(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<i32>,
) -> ApiResult<web::Json<Vec<TravauxMateriel>>> {
    session.require_caller()?;
    Ok(web::Json(
        state.travaux.list_materiels(path.into_inner()).await?,
    ))
}

#[utoipa::path(
    post,
    path = "/api/travaux/{id}/materiels",
    params(("id" = i32, Path, description = "Travaux id")),
    request_body = TravauxMaterielInput,
    responses(
        (status = 201, description = "Equipment linked", body = TravauxMateriel),
        (status = 400, description = "Quantity not positive", body = Error)
    ),
    tags = ["travaux"],
    operation_id = "addTravauxMateriel"
)]
#[post("/travaux/{id}/materiels")]
pub async fn add_materiel(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<i32>,
    payload: web::Json<TravauxMaterielInput>,
) -> ApiResult<HttpResponse> {
    session.require_admin()?;
    let link = state
        .travaux
        .add_materiel(path.into_inner(), payload.into_inner())
        .await?;
    Ok(HttpResponse::Created().json(link))
}

#[utoipa::path(
    method(put, patch),
    path = "/api/travaux/{id}/materiels/{link_id}",
    params(
        ("id" = i32, Path, description = "Travaux id"),
        ("link_id" = i32, Path, description = "Equipment link id")
    ),
    request_body = TravauxMaterielInput,
    responses(
        (status = 200, description = "Updated link", body = TravauxMateriel),
        (status = 404, description = "Link not found on this work order", body = Error)
    ),
    tags = ["travaux"],
    operation_id = "updateTravauxMateriel"
)]
#[route("/travaux/{id}/materiels/{link_id}", method = "PUT", method = "PATCH")]
pub async fn update_materiel(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<(i32, i32)>,
    payload: web::Json<TravauxMaterielInput>,
) -> ApiResult<web::Json<TravauxMateriel>> {
    session.require_admin()?;
    let (id, link_id) = path.into_inner();
    Ok(web::Json(
        state
            .travaux
            .update_materiel(id, link_id, payload.into_inner())
            .await?,
    ))
}

#[utoipa::path(
    delete,
    path = "/api/travaux/{id}/materiels/{link_id}",
    params(
        ("id" = i32, Path, description = "Travaux id"),
        ("link_id" = i32, Path, description = "Equipment link id")
    ),
    responses(
        (status = 204, description = "Link deleted"),
        (status = 404, description = "Link not found on this work order", body = Error)
    ),
    tags = ["travaux"],
    operation_id = "deleteTravauxMateriel"
)]
#[delete("/travaux/{id}/materiels/{link_id}")]
pub async fn delete_materiel(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<(i32, i32)>,
) -> ApiResult<HttpResponse> {
    session.require_admin()?;
    let (id, link_id) = path.into_inner();
    state.travaux.delete_materiel(id, link_id).await?;
    Ok(HttpResponse::NoContent().finish())
}

#[utoipa::path(
    get,
    path = "/api/travaux/{id}/agents",
    params(("id" = i32, Path, description = "Travaux id")),
    responses((status = 200, description = "Assigned agents", body = [AgentAssignment])),
    tags = ["travaux"],
    operation_id = "listTravauxAgents"
)]
#[get("/travaux/{id}/agents")]
pub async fn list_agents(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<i32>,
) -> ApiResult<web::Json<Vec<AgentAssignment>>> {
    session.require_caller()?;
    Ok(web::Json(state.travaux.list_agents(path.into_inner()).await?))
}

#[utoipa::path(
    post,
    path = "/api/travaux/{id}/agents",
    params(("id" = i32, Path, description = "Travaux id")),
    request_body = AgentAssignmentInput,
    responses(
        (status = 201, description = "Agent assigned", body = AgentAssignment),
        (status = 404, description = "Unknown work order or agent", body = Error)
    ),
    tags = ["travaux"],
    operation_id = "addTravauxAgent"
)]
#[post("/travaux/{id}/agents")]
pub async fn add_agent(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<i32>,
    payload: web::Json<AgentAssignmentInput>,
) -> ApiResult<HttpResponse> {
    session.require_admin()?;
    let assignment = state
        .travaux
        .add_agent(path.into_inner(), payload.into_inner())
        .await?;
    Ok(HttpResponse::Created().json(assignment))
}

#[utoipa::path(
    delete,
    path = "/api/travaux/{id}/agents/{matricule}",
    params(
        ("id" = i32, Path, description = "Travaux id"),
        ("matricule" = String, Path, description = "Agent matricule")
    ),
    responses((status = 200, description = "Agent removed; body is {\"ok\":true}")),
    tags = ["travaux"],
    operation_id = "removeTravauxAgent"
)]
#[delete("/travaux/{id}/agents/{matricule}")]
pub async fn remove_agent(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<(i32, String)>,
) -> ApiResult<HttpResponse> {
    session.require_admin()?;
    let (id, matricule) = path.into_inner();
    state.travaux.remove_agent(id, &matricule).await?;
    Ok(HttpResponse::Ok().json(json!({ "ok": true })))
}

#[utoipa::path(
    get,
    path = "/api/travaux/{id}/responsables",
    params(("id" = i32, Path, description = "Travaux id")),
    responses((status = 200, description = "Responsables", body = [Responsable])),
    tags = ["travaux"],
    operation_id = "listTravauxResponsables"
)]
#[get("/travaux/{id}/responsables")]
pub async fn list_responsables(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<i32>,
) -> ApiResult<web::Json<Vec<Responsable>>> {
    session.require_caller()?;
    Ok(web::Json(
        state.travaux.list_responsables(path.into_inner()).await?,
    ))
}

#[utoipa::path(
    post,
    path = "/api/travaux/{id}/responsables",
    params(("id" = i32, Path, description = "Travaux id")),
    request_body = ResponsableInput,
    responses(
        (status = 201, description = "Responsable added", body = Responsable),
        (status = 403, description = "Target is not a chef", body = Error)
    ),
    tags = ["travaux"],
    operation_id = "addTravauxResponsable"
)]
#[post("/travaux/{id}/responsables")]
pub async fn add_responsable(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<i32>,
    payload: web::Json<ResponsableInput>,
) -> ApiResult<HttpResponse> {
    session.require_admin()?;
    let responsable = state
        .travaux
        .add_responsable(path.into_inner(), payload.into_inner())
        .await?;
    Ok(HttpResponse::Created().json(responsable))
}

#[utoipa::path(
    delete,
    path = "/api/travaux/{id}/responsables/{matricule}",
    params(
        ("id" = i32, Path, description = "Travaux id"),
        ("matricule" = String, Path, description = "Agent matricule")
    ),
    responses(
        (status = 204, description = "Responsable removed"),
        (status = 404, description = "Not a responsable of this work order", body = Error)
    ),
    tags = ["travaux"],
    operation_id = "removeTravauxResponsable"
)]
#[delete("/travaux/{id}/responsables/{matricule}")]
pub async fn remove_responsable(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<(i32, String)>,
) -> ApiResult<HttpResponse> {
    session.require_admin()?;
    let (id, matricule) = path.into_inner();
    state.travaux.remove_responsable(id, &matricule).await?;
    Ok(HttpResponse::NoContent().finish())
}

#[utoipa::path(
    get,
    path = "/api/travaux/{id}/rendus",
    params(("id" = i32, Path, description = "Travaux id")),
    responses((status = 200, description = "Reports", body = [Rendu])),
    tags = ["travaux"],
    operation_id = "listTravauxRendus"
)]
#[get("/travaux/{id}/rendus")]
pub async fn list_rendus(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<i32>,
) -> ApiResult<web::Json<Vec<Rendu>>> {
    session.require_caller()?;
    Ok(web::Json(state.travaux.list_rendus(path.into_inner()).await?))
}

/// Create a report; images travel as base64 in the JSON body.
#[utoipa::path(
    post,
    path = "/api/travaux/{id}/rendus",
    params(("id" = i32, Path, description = "Travaux id")),
    request_body = RenduInput,
    responses(
        (status = 201, description = "Report created", body = Rendu),
        (status = 400, description = "Title missing or image not base64", body = Error)
    ),
    tags = ["travaux"],
    operation_id = "createTravauxRendu"
)]
#[post("/travaux/{id}/rendus")]
pub async fn create_rendu(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<i32>,
    payload: web::Json<RenduInput>,
) -> ApiResult<HttpResponse> {
    session.require_caller()?;
    let rendu = state
        .travaux
        .create_rendu(path.into_inner(), payload.into_inner())
        .await?;
    Ok(HttpResponse::Created().json(rendu))
}

#[utoipa::path(
    get,
    path = "/api/travaux/{id}/rendus/{rendu_id}",
    params(
        ("id" = i32, Path, description = "Travaux id"),
        ("rendu_id" = i32, Path, description = "Report id")
    ),
    responses(
        (status = 200, description = "Report", body = Rendu),
        (status = 404, description = "Report not found on this work order", body = Error)
    ),
    tags = ["travaux"],
    operation_id = "getTravauxRendu"
)]
#[get("/travaux/{id}/rendus/{rendu_id}")]
pub async fn get_rendu(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<(i32, i32)>,
) -> ApiResult<web::Json<Rendu>> {
    session.require_caller()?;
    let (id, rendu_id) = path.into_inner();
    Ok(web::Json(state.travaux.get_rendu(id, rendu_id).await?))
}

#[utoipa::path(
    method(put, patch),
    path = "/api/travaux/{id}/rendus/{rendu_id}",
    params(
        ("id" = i32, Path, description = "Travaux id"),
        ("rendu_id" = i32, Path, description = "Report id")
    ),
    request_body = RenduInput,
    responses(
        (status = 200, description = "Updated report", body = Rendu),
        (status = 404, description = "Report not found on this work order", body = Error)
    ),
    tags = ["travaux"],
    operation_id = "updateTravauxRendu"
)]
#[route("/travaux/{id}/rendus/{rendu_id}", method = "PUT", method = "PATCH")]
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
            .travaux
            .update_rendu(id, rendu_id, payload.into_inner())
            .await?,
    ))
}

#[utoipa::path(
    delete,
    path = "/api/travaux/{id}/rendus/{rendu_id}",
    params(
        ("id" = i32, Path, description = "Travaux id"),
        ("rendu_id" = i32, Path, description = "Report id")
    ),
    responses(
        (status = 204, description = "Report and its images deleted"),
        (status = 404, description = "Report not found on this work order", body = Error)
    ),
    tags = ["travaux"],
    operation_id = "deleteTravauxRendu"
)]
#[delete("/travaux/{id}/rendus/{rendu_id}")]
pub async fn delete_rendu(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<(i32, i32)>,
) -> ApiResult<HttpResponse> {
    session.require_admin()?;
    let (id, rendu_id) = path.into_inner();
    state.travaux.delete_rendu(id, rendu_id).await?;
    Ok(HttpResponse::NoContent().finish())
}

#[utoipa::path(
    get,
    path = "/api/travaux/{id}/satisfaction",
    params(("id" = i32, Path, description = "Travaux id")),
    responses((status = 200, description = "Satisfaction or null", body = Option<Satisfaction>)),
    tags = ["travaux"],
    operation_id = "getTravauxSatisfaction"
)]
#[get("/travaux/{id}/satisfaction")]
pub async fn get_satisfaction(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<i32>,
) -> ApiResult<web::Json<Option<Satisfaction>>> {
    session.require_caller()?;
    Ok(web::Json(
        state.travaux.get_satisfaction(path.into_inner()).await?,
    ))
}

/// Rate a work order; the caller must be a user of the linked ticket's client.
#[utoipa::path(
    post,
    path = "/api/travaux/{id}/satisfaction",
    params(("id" = i32, Path, description = "Travaux id")),
    request_body = SatisfactionInput,
    responses(
        (status = 200, description = "Stored satisfaction", body = Satisfaction),
        (status = 400, description = "Rating outside 1-5", body = Error),
        (status = 403, description = "Not the work order's client", body = Error)
    ),
    tags = ["travaux"],
    operation_id = "saveTravauxSatisfaction"
)]
#[post("/travaux/{id}/satisfaction")]
pub async fn save_satisfaction(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<i32>,
    payload: web::Json<SatisfactionInput>,
) -> ApiResult<web::Json<Satisfaction>> {
    let caller = session.require_caller()?;
    Ok(web::Json(
        state
            .travaux
            .save_satisfaction(&caller, path.into_inner(), payload.into_inner())
            .await?,
    ))
}
