//! Client account and site endpoints.
//!
//! ```text
//! POST /api/clients/register {"email":"x@y.fr","password":"..","nom_societe":"ACME"}
//! GET /api/client/sites
//! GET /api/client/sites/{id}/relations
//! ```

use actix_web::{HttpResponse, delete, get, post, put, web};

use crate::domain::{Client, Error, RegisterClientRequest, Site, SiteInput, SiteRelations};
use crate::inbound::http::ApiResult;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;

/// Create a client together with its login account.
#[utoipa::path(
    post,
    path = "/api/clients/register",
    request_body = RegisterClientRequest,
    responses(
        (status = 201, description = "Client created", body = Client),
        (status = 400, description = "Missing field", body = Error),
        (status = 403, description = "Administrator required", body = Error),
        (status = 409, description = "E-mail already used", body = Error)
    ),
    tags = ["clients"],
    operation_id = "registerClient"
)]
#[post("/clients/register")]
pub async fn register_client(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<RegisterClientRequest>,
) -> ApiResult<HttpResponse> {
    session.require_admin()?;
    let client = state.clients.register_client(payload.into_inner()).await?;
    Ok(HttpResponse::Created().json(client))
}

#[utoipa::path(
    get,
    path = "/api/clients",
    responses(
        (status = 200, description = "Every client", body = [Client]),
        (status = 403, description = "Administrator required", body = Error)
    ),
    tags = ["clients"],
    operation_id = "listClients"
)]
#[get("/clients")]
pub async fn list_clients(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<Vec<Client>>> {
    session.require_admin()?;
    Ok(web::Json(state.clients.list_clients().await?))
}

/// Sites of the caller's clients; every site for administrators.
#[utoipa::path(
    get,
    path = "/api/client/sites",
    responses(
        (status = 200, description = "Accessible sites", body = [Site]),
        (status = 401, description = "No session", body = Error)
    ),
    tags = ["sites"],
    operation_id = "listSites"
)]
#[get("/client/sites")]
pub async fn list_sites(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<Vec<Site>>> {
    let caller = session.require_caller()?;
    Ok(web::Json(state.clients.list_sites(&caller).await?))
}

#[utoipa::path(
    post,
    path = "/api/client/sites",
    request_body = SiteInput,
    responses(
        (status = 201, description = "Site created", body = Site),
        (status = 400, description = "Name missing", body = Error),
        (status = 403, description = "No accessible client", body = Error)
    ),
    tags = ["sites"],
    operation_id = "createSite"
)]
#[post("/client/sites")]
pub async fn create_site(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<SiteInput>,
) -> ApiResult<HttpResponse> {
    let caller = session.require_caller()?;
    let site = state
        .clients
        .create_site(&caller, payload.into_inner())
        .await?;
    Ok(HttpResponse::Created().json(site))
}

#[utoipa::path(
    get,
    path = "/api/client/sites/{id}",
    params(("id" = i32, Path, description = "Site id")),
    responses(
        (status = 200, description = "Site", body = Site),
        (status = 403, description = "Not one of the caller's sites", body = Error),
        (status = 404, description = "Unknown site", body = Error)
    ),
    tags = ["sites"],
    operation_id = "getSite"
)]
#[get("/client/sites/{id}")]
pub async fn get_site(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<i32>,
) -> ApiResult<web::Json<Site>> {
    let caller = session.require_caller()?;
    Ok(web::Json(
        state.clients.get_site(&caller, path.into_inner()).await?,
    ))
}

#[utoipa::path(
    put,
    path = "/api/client/sites/{id}",
    params(("id" = i32, Path, description = "Site id")),
    request_body = SiteInput,
    responses(
        (status = 200, description = "Updated site", body = Site),
        (status = 403, description = "Not one of the caller's sites", body = Error),
        (status = 404, description = "Unknown site", body = Error)
    ),
    tags = ["sites"],
    operation_id = "updateSite"
)]
#[put("/client/sites/{id}")]
pub async fn update_site(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<i32>,
    payload: web::Json<SiteInput>,
) -> ApiResult<web::Json<Site>> {
    let caller = session.require_caller()?;
    let site = state
        .clients
        .update_site(&caller, path.into_inner(), payload.into_inner())
        .await?;
    Ok(web::Json(site))
}

#[utoipa::path(
    delete,
    path = "/api/client/sites/{id}",
    params(("id" = i32, Path, description = "Site id")),
    responses(
        (status = 204, description = "Site deleted"),
        (status = 403, description = "Not one of the caller's sites", body = Error),
        (status = 404, description = "Unknown site", body = Error)
    ),
    tags = ["sites"],
    operation_id = "deleteSite"
)]
#[delete("/client/sites/{id}")]
pub async fn delete_site(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<i32>,
) -> ApiResult<HttpResponse> {
    let caller = session.require_caller()?;
    state.clients.delete_site(&caller, path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// A site with its client, demandes, tickets and work orders.
#[utoipa::path(
    get,
    path = "/api/client/sites/{id}/relations",
    params(("id" = i32, Path, description = "Site id")),
    responses(
        (status = 200, description = "Site relations", body = SiteRelations),
        (status = 403, description = "Not one of the caller's sites", body = Error),
        (status = 404, description = "Unknown site", body = Error)
    ),
    tags = ["sites"],
    operation_id = "siteRelations"
)]
#[get("/client/sites/{id}/relations")]
pub async fn site_relations(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<i32>,
) -> ApiResult<web::Json<SiteRelations>> {
    let caller = session.require_caller()?;
    Ok(web::Json(
        state
            .clients
            .site_relations(&caller, path.into_inner())
            .await?,
    ))
}
