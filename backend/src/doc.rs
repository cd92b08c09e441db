//! OpenAPI documentation configuration.
//!
//! [`ApiDoc`] collects every REST handler plus the error envelope. Request
//! and response bodies referenced by the handlers are registered
//! transitively. The document backs Swagger UI in debug builds and is
//! exported by `cargo run --bin openapi-dump`.

use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::domain::{Caller, Error, ErrorCode};

/// Enrich the generated document with the session cookie security scheme.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);

        components.add_security_scheme(
            "SessionCookie",
            SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::with_description(
                "session",
                "Session cookie issued by POST /api/login.",
            ))),
        );
    }
}

/// OpenAPI document for the REST API.
#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "Fieldops backend API",
        description = "Client requests, tickets, work orders, interventions and messaging for field-service operations."
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    security(("SessionCookie" = [])),
    paths(
        crate::inbound::http::auth::login,
        crate::inbound::http::auth::logout,
        crate::inbound::http::auth::me,
        crate::inbound::http::clients::register_client,
        crate::inbound::http::clients::list_clients,
        crate::inbound::http::clients::list_sites,
        crate::inbound::http::clients::create_site,
        crate::inbound::http::clients::get_site,
        crate::inbound::http::clients::update_site,
        crate::inbound::http::clients::delete_site,
        crate::inbound::http::clients::site_relations,
        crate::inbound::http::demandes::list_demandes,
        crate::inbound::http::demandes::create_demande,
        crate::inbound::http::demandes::list_deleted_demandes,
        crate::inbound::http::demandes::get_demande,
        crate::inbound::http::demandes::update_demande,
        crate::inbound::http::demandes::delete_demande,
        crate::inbound::http::demandes::update_demande_status,
        crate::inbound::http::demandes::restore_demande,
        crate::inbound::http::demandes::convert_demande,
        crate::inbound::http::tickets::list_tickets,
        crate::inbound::http::tickets::create_ticket,
        crate::inbound::http::tickets::get_ticket,
        crate::inbound::http::tickets::update_ticket,
        crate::inbound::http::tickets::delete_ticket,
        crate::inbound::http::tickets::ticket_relations,
        crate::inbound::http::tickets::take_ticket,
        crate::inbound::http::tickets::get_satisfaction,
        crate::inbound::http::tickets::save_satisfaction,
        crate::inbound::http::tickets::list_agents,
        crate::inbound::http::tickets::add_agent,
        crate::inbound::http::tickets::remove_agent,
        crate::inbound::http::tickets::list_responsables,
        crate::inbound::http::tickets::add_responsable,
        crate::inbound::http::tickets::remove_responsable,
        crate::inbound::http::tickets::responsable_history,
        crate::inbound::http::travaux::list_travaux,
        crate::inbound::http::travaux::create_travaux,
        crate::inbound::http::travaux::get_travaux,
        crate::inbound::http::travaux::update_travaux,
        crate::inbound::http::travaux::delete_travaux,
        crate::inbound::http::travaux::travaux_relations,
        crate::inbound::http::travaux::list_taches,
        crate::inbound::http::travaux::create_tache,
        crate::inbound::http::travaux::update_tache,
        crate::inbound::http::travaux::delete_tache,
        crate::inbound::http::travaux::list_materiels,
        crate::inbound::http::travaux::add_materiel,
        crate::inbound::http::travaux::update_materiel,
        crate::inbound::http::travaux::delete_materiel,
        crate::inbound::http::travaux::list_agents,
        crate::inbound::http::travaux::add_agent,
        crate::inbound::http::travaux::remove_agent,
        crate::inbound::http::travaux::list_responsables,
        crate::inbound::http::travaux::add_responsable,
        crate::inbound::http::travaux::remove_responsable,
        crate::inbound::http::travaux::list_rendus,
        crate::inbound::http::travaux::create_rendu,
        crate::inbound::http::travaux::get_rendu,
        crate::inbound::http::travaux::update_rendu,
        crate::inbound::http::travaux::delete_rendu,
        crate::inbound::http::travaux::get_satisfaction,
        crate::inbound::http::travaux::save_satisfaction,
        crate::inbound::http::interventions::list_interventions,
        crate::inbound::http::interventions::calendar,
        crate::inbound::http::interventions::create_intervention,
        crate::inbound::http::interventions::get_intervention,
        crate::inbound::http::interventions::replace_intervention,
        crate::inbound::http::interventions::patch_intervention,
        crate::inbound::http::interventions::delete_intervention,
        crate::inbound::http::interventions::events,
        crate::inbound::http::interventions::materiels,
        crate::inbound::http::interventions::intervention_relations,
        crate::inbound::http::interventions::list_rendus,
        crate::inbound::http::interventions::create_rendu,
        crate::inbound::http::interventions::get_rendu,
        crate::inbound::http::interventions::update_rendu,
        crate::inbound::http::interventions::delete_rendu,
        crate::inbound::http::messaging::create_conversation,
        crate::inbound::http::messaging::list_conversations,
        crate::inbound::http::messaging::list_messages,
        crate::inbound::http::messaging::send_message,
        crate::inbound::http::messaging::get_attachment,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(Error, ErrorCode, Caller)),
    tags(
        (name = "session", description = "Login, logout and current caller"),
        (name = "clients", description = "Client accounts"),
        (name = "sites", description = "Client sites"),
        (name = "demandes", description = "Client requests and their conversion to tickets"),
        (name = "tickets", description = "Tickets, assignments and satisfaction"),
        (name = "travaux", description = "Work orders, tasks, materials and reports"),
        (name = "interventions", description = "Scheduled interventions and calendar"),
        (name = "messaging", description = "Conversations and attachments"),
        (name = "health", description = "Endpoints for health checks")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    //! Tests verifying the generated document.

    use super::*;
    use rstest::rstest;
    use utoipa::openapi::RefOr;
    use utoipa::openapi::schema::Schema;

    fn assert_object_schema_has_field(schema: &RefOr<Schema>, field: &str) {
        match schema {
            RefOr::T(Schema::Object(obj)) => {
                assert!(
                    obj.properties.contains_key(field),
                    "schema should have field '{field}'"
                );
            }
            _ => panic!("expected Object schema"),
        }
    }

    #[test]
    fn error_schema_uses_the_wire_field_names() {
        let doc = ApiDoc::openapi();
        let schemas = &doc.components.as_ref().expect("components").schemas;
        let error_schema = schemas.get("Error").expect("Error schema");

        assert_object_schema_has_field(error_schema, "code");
        assert_object_schema_has_field(error_schema, "error");
        assert_object_schema_has_field(error_schema, "traceId");
    }

    #[rstest]
    #[case("/api/login")]
    #[case("/api/demandes_client/{id}/convert")]
    #[case("/api/tickets/{id}/take")]
    #[case("/api/travaux/{id}/rendus/{rendu_id}")]
    #[case("/api/interventions/calendar")]
    #[case("/api/messages/attachments/{id}")]
    #[case("/health/ready")]
    fn document_lists_path(#[case] path: &str) {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key(path), "missing {path}");
    }
}
