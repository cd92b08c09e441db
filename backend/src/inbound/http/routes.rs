//! Route table for the REST surface.
//!
//! Literal segments (`/demandes_client/deleted`, `/interventions/calendar`)
//! are registered before their `{id}` siblings; actix matches in
//! registration order.

use actix_web::web;

use super::{auth, clients, demandes, interventions, messaging, tickets, travaux};

/// Mount every `/api` handler onto `cfg`.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .configure(auth_routes)
            .configure(client_routes)
            .configure(demande_routes)
            .configure(ticket_routes)
            .configure(travaux_routes)
            .configure(intervention_routes)
            .configure(messaging_routes),
    );
}

fn auth_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(auth::login)
        .service(auth::logout)
        .service(auth::me);
}

fn client_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(clients::register_client)
        .service(clients::list_clients)
        .service(clients::list_sites)
        .service(clients::create_site)
        .service(clients::get_site)
        .service(clients::update_site)
        .service(clients::delete_site)
        .service(clients::site_relations);
}

fn demande_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(demandes::list_demandes)
        .service(demandes::create_demande)
        .service(demandes::list_deleted_demandes)
        .service(demandes::get_demande)
        .service(demandes::update_demande)
        .service(demandes::delete_demande)
        .service(demandes::update_demande_status)
        .service(demandes::restore_demande)
        .service(demandes::convert_demande);
}

fn ticket_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(tickets::list_tickets)
        .service(tickets::create_ticket)
        .service(tickets::get_ticket)
        .service(tickets::update_ticket)
        .service(tickets::delete_ticket)
        .service(tickets::ticket_relations)
        .service(tickets::take_ticket)
        .service(tickets::get_satisfaction)
        .service(tickets::save_satisfaction)
        .service(tickets::list_agents)
        .service(tickets::add_agent)
        .service(tickets::remove_agent)
        .service(tickets::list_responsables)
        .service(tickets::add_responsable)
        .service(tickets::remove_responsable)
        .service(tickets::responsable_history);
}

fn travaux_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(travaux::list_travaux)
        .service(travaux::create_travaux)
        .service(travaux::get_travaux)
        .service(travaux::update_travaux)
        .service(travaux::delete_travaux)
        .service(travaux::travaux_relations)
        .service(travaux::list_taches)
        .service(travaux::create_tache)
        .service(travaux::update_tache)
        .service(travaux::delete_tache)
        .service(travaux::list_materiels)
        .service(travaux::add_materiel)
        .service(travaux::update_materiel)
        .service(travaux::delete_materiel)
        .service(travaux::list_agents)
        .service(travaux::add_agent)
        .service(travaux::remove_agent)
        .service(travaux::list_responsables)
        .service(travaux::add_responsable)
        .service(travaux::remove_responsable)
        .service(travaux::list_rendus)
        .service(travaux::create_rendu)
        .service(travaux::get_rendu)
        .service(travaux::update_rendu)
        .service(travaux::delete_rendu)
        .service(travaux::get_satisfaction)
        .service(travaux::save_satisfaction);
}

fn intervention_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(interventions::list_interventions)
        .service(interventions::calendar)
        .service(interventions::create_intervention)
        .service(interventions::get_intervention)
        .service(interventions::replace_intervention)
        .service(interventions::patch_intervention)
        .service(interventions::delete_intervention)
        .service(interventions::events)
        .service(interventions::materiels)
        .service(interventions::intervention_relations)
        .service(interventions::list_rendus)
        .service(interventions::create_rendu)
        .service(interventions::get_rendu)
        .service(interventions::update_rendu)
        .service(interventions::delete_rendu);
}

fn messaging_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(messaging::create_conversation)
        .service(messaging::list_conversations)
        .service(messaging::list_messages)
        .service(messaging::send_message)
        .service(messaging::get_attachment);
}
