//! Tests for the ticket lifecycle service.

use std::sync::Arc;

use chrono::{TimeZone, Utc};
use mockall::predicate::eq;
use rstest::rstest;
use serde_json::json;

use super::*;
use crate::domain::ports::{
    MockAgentDirectory, MockAuditLog, MockChefAssertion, MockClientRepository,
    MockInterventionRepository, MockReferenceRepository, MockTicketRepository, PersistenceError,
};
use crate::domain::{Agent, Doe, ErrorCode, ROLE_ADMIN, ROLE_AGENT, TicketUpdate};

#[derive(Default)]
struct Mocks {
    tickets: MockTicketRepository,
    clients: MockClientRepository,
    interventions: MockInterventionRepository,
    references: MockReferenceRepository,
    agents: MockAgentDirectory,
    chef: MockChefAssertion,
    audit: MockAuditLog,
}

impl Mocks {
    fn into_service(self) -> TicketService {
        TicketService::new(TicketServiceDeps {
            tickets: Arc::new(self.tickets),
            clients: Arc::new(self.clients),
            interventions: Arc::new(self.interventions),
            references: Arc::new(self.references),
            agents: Arc::new(self.agents),
            chef: Arc::new(self.chef),
            audit: Arc::new(self.audit),
        })
    }

    fn with_ticket(mut self, ticket: Ticket) -> Self {
        self.tickets
            .expect_find()
            .with(eq(ticket.id))
            .returning(move |_| Ok(Some(ticket.clone())));
        self
    }

    fn tolerate_audit(mut self) -> Self {
        self.audit.expect_record().returning(|_| Ok(()));
        self
    }
}

fn ticket(id: i32, etat: TicketEtat, responsable: Option<&str>) -> Ticket {
    Ticket {
        id,
        titre: "Fuite toit".into(),
        description: None,
        etat,
        doe_id: Some(8),
        affaire_id: Some(2),
        site_id: Some(3),
        demande_id: None,
        responsable: responsable.map(str::to_owned),
        date_debut: None,
        date_fin: None,
        created_at: Utc
            .with_ymd_and_hms(2026, 1, 6, 8, 0, 0)
            .single()
            .expect("valid date"),
    }
}

fn agent_caller(matricule: &str) -> Caller {
    Caller::new(20, "agent@example.com", vec![ROLE_AGENT.to_owned()]).with_matricule(matricule)
}

fn admin_caller() -> Caller {
    Caller::new(1, "admin@example.com", vec![ROLE_ADMIN.to_owned()])
}

fn responsable(ticket_id: i32, matricule: &str, role: ResponsableRole) -> Responsable {
    Responsable {
        id: 1,
        parent_id: ticket_id,
        matricule: matricule.into(),
        role,
        created_at: Utc::now(),
    }
}

#[tokio::test]
async fn take_unassigned_ticket_makes_caller_primary() {
    let mut mocks = Mocks::default()
        .with_ticket(ticket(4, TicketEtat::PasCommence, None))
        .tolerate_audit();
    mocks
        .tickets
        .expect_claim_primary()
        .with(eq(4), eq("A1"))
        .times(1)
        .return_once(|id, matricule| {
            Ok(Some(ticket(id, TicketEtat::PasCommence, Some(matricule))))
        });
    mocks
        .tickets
        .expect_record_responsable_change()
        .withf(|change| {
            change.ticket_id == 4
                && change.old_matricule.is_none()
                && change.new_matricule.as_deref() == Some("A1")
                && change.changed_by.as_deref() == Some("agent@example.com")
        })
        .times(1)
        .return_once(|_| Ok(()));
    mocks.tickets.expect_add_responsable().times(0);

    let outcome = mocks
        .into_service()
        .take_ticket(&agent_caller("A1"), 4)
        .await
        .expect("taken");
    assert_eq!(outcome.assignment, Assignment::Primary);
    assert_eq!(outcome.ticket.responsable.as_deref(), Some("A1"));
}

#[tokio::test]
async fn take_assigned_ticket_adds_secondary_without_history() {
    let mut mocks = Mocks::default()
        .with_ticket(ticket(4, TicketEtat::EnCours, Some("A1")))
        .tolerate_audit();
    mocks.tickets.expect_claim_primary().times(0);
    mocks.tickets.expect_record_responsable_change().times(0);
    mocks
        .tickets
        .expect_add_responsable()
        .with(eq(4), eq("B2"), eq(ResponsableRole::Secondaire))
        .times(1)
        .return_once(|id, matricule, role| Ok(responsable(id, matricule, role)));

    let outcome = mocks
        .into_service()
        .take_ticket(&agent_caller("B2"), 4)
        .await
        .expect("taken");
    assert_eq!(outcome.assignment, Assignment::Secondary);
    assert_eq!(
        outcome.responsable.map(|r| r.role),
        Some(ResponsableRole::Secondaire)
    );
}

#[tokio::test]
async fn losing_the_primary_race_falls_back_to_secondary() {
    let mut mocks = Mocks::default()
        .with_ticket(ticket(4, TicketEtat::PasCommence, None))
        .tolerate_audit();
    mocks
        .tickets
        .expect_claim_primary()
        .return_once(|_, _| Ok(None));
    mocks.tickets.expect_record_responsable_change().times(0);
    mocks
        .tickets
        .expect_add_responsable()
        .return_once(|id, matricule, role| Ok(responsable(id, matricule, role)));

    let outcome = mocks
        .into_service()
        .take_ticket(&agent_caller("B2"), 4)
        .await
        .expect("taken");
    assert_eq!(outcome.assignment, Assignment::Secondary);
}

#[tokio::test]
async fn take_closed_ticket_conflicts() {
    let mocks = Mocks::default().with_ticket(ticket(4, TicketEtat::Termine, None));
    let error = mocks
        .into_service()
        .take_ticket(&agent_caller("A1"), 4)
        .await
        .expect_err("closed");
    assert_eq!(error.code(), ErrorCode::Conflict);
}

#[tokio::test]
async fn take_without_agent_identity_is_rejected() {
    let mut mocks = Mocks::default();
    mocks.agents.expect_find_by_email().returning(|_| Ok(None));
    mocks.tickets.expect_find().times(0);
    let error = mocks
        .into_service()
        .take_ticket(&admin_caller(), 4)
        .await
        .expect_err("no matricule");
    assert_eq!(error.code(), ErrorCode::InvalidRequest);
}

#[tokio::test]
async fn take_without_email_is_rejected_even_with_a_matricule() {
    let mut mocks = Mocks::default();
    mocks.agents.expect_find_by_email().times(0);
    mocks.tickets.expect_find().times(0);
    mocks.tickets.expect_claim_primary().times(0);
    let caller = Caller::new(20, "  ", vec![ROLE_AGENT.to_owned()]).with_matricule("A1");

    let error = mocks
        .into_service()
        .take_ticket(&caller, 4)
        .await
        .expect_err("no e-mail");
    assert_eq!(error.code(), ErrorCode::InvalidRequest);
}

#[tokio::test]
async fn take_resolves_matricule_from_email() {
    let mut mocks = Mocks::default()
        .with_ticket(ticket(4, TicketEtat::PasCommence, Some("C3")))
        .tolerate_audit();
    mocks
        .agents
        .expect_find_by_email()
        .with(eq("admin@example.com"))
        .return_once(|_| {
            Ok(Some(Agent {
                matricule: "C3".into(),
                nom: "Petit".into(),
                prenom: None,
                email: Some("admin@example.com".into()),
                user_id: Some(1),
                admin: true,
            }))
        });
    mocks.tickets.expect_claim_primary().times(0);
    mocks.tickets.expect_add_responsable().times(0);

    let outcome = mocks
        .into_service()
        .take_ticket(&admin_caller(), 4)
        .await
        .expect("already primary");
    assert_eq!(outcome.assignment, Assignment::Primary);
}

#[rstest]
#[case(TicketInput { titre: Some("Fuite".into()), affaire_id: Some(2), ..TicketInput::default() })]
#[case(TicketInput { titre: Some("Fuite".into()), doe_id: Some(8), ..TicketInput::default() })]
#[case(TicketInput { doe_id: Some(8), affaire_id: Some(2), ..TicketInput::default() })]
#[tokio::test]
async fn create_requires_title_doe_and_affaire(#[case] input: TicketInput) {
    let mut mocks = Mocks::default();
    mocks.tickets.expect_create().times(0);
    let error = mocks
        .into_service()
        .create_ticket(&admin_caller(), input)
        .await
        .expect_err("invalid");
    assert_eq!(error.code(), ErrorCode::InvalidRequest);
}

#[tokio::test]
async fn create_derives_site_from_doe() {
    let mut mocks = Mocks::default().tolerate_audit();
    mocks.references.expect_find_doe().with(eq(8)).return_once(|id| {
        Ok(Some(Doe {
            id,
            titre: "DOE".into(),
            site_id: Some(3),
            affaire_id: Some(2),
        }))
    });
    mocks
        .tickets
        .expect_create()
        .withf(|new| new.site_id == Some(3) && new.etat == TicketEtat::PasCommence)
        .return_once(|_| Ok(ticket(9, TicketEtat::PasCommence, None)));
    let input = TicketInput {
        titre: Some("Fuite".into()),
        doe_id: Some(8),
        affaire_id: Some(2),
        ..TicketInput::default()
    };
    let created = mocks
        .into_service()
        .create_ticket(&admin_caller(), input)
        .await
        .expect("created");
    assert_eq!(created.id, 9);
}

#[tokio::test]
async fn create_surfaces_constraint_violation_as_invalid_data() {
    let mut mocks = Mocks::default();
    mocks.references.expect_find_doe().returning(|_| Ok(None));
    mocks
        .tickets
        .expect_create()
        .return_once(|_| Err(PersistenceError::constraint("ticket_doe_id_fkey")));
    let input = TicketInput {
        titre: Some("Fuite".into()),
        doe_id: Some(999),
        affaire_id: Some(2),
        ..TicketInput::default()
    };
    let error = mocks
        .into_service()
        .create_ticket(&admin_caller(), input)
        .await
        .expect_err("constraint");
    assert_eq!(error.code(), ErrorCode::InvalidRequest);
    assert_eq!(error.message(), "invalid data");
}

#[tokio::test]
async fn update_records_responsable_change() {
    let mut mocks = Mocks::default().tolerate_audit();
    mocks.tickets.expect_update().return_once(|id, patch| {
        Ok(Some(TicketUpdate {
            previous: ticket(id, TicketEtat::EnCours, Some("A1")),
            current: ticket(id, TicketEtat::EnCours, patch.responsable.as_deref()),
        }))
    });
    mocks
        .tickets
        .expect_record_responsable_change()
        .withf(|change| {
            change.old_matricule.as_deref() == Some("A1")
                && change.new_matricule.as_deref() == Some("B2")
        })
        .times(1)
        .return_once(|_| Ok(()));
    let patch = TicketPatch {
        responsable: Some("B2".into()),
        ..TicketPatch::default()
    };
    let updated = mocks
        .into_service()
        .update_ticket(&admin_caller(), 4, patch)
        .await
        .expect("updated");
    assert_eq!(updated.responsable.as_deref(), Some("B2"));
}

#[tokio::test]
async fn empty_update_is_rejected() {
    let error = Mocks::default()
        .into_service()
        .update_ticket(&admin_caller(), 4, TicketPatch::default())
        .await
        .expect_err("empty");
    assert_eq!(error.code(), ErrorCode::InvalidRequest);
}

#[tokio::test]
async fn delete_fails_when_audit_fails() {
    let mut mocks = Mocks::default().with_ticket(ticket(4, TicketEtat::EnCours, None));
    mocks
        .audit
        .expect_record()
        .return_once(|_| Err(PersistenceError::connection("pool exhausted")));
    mocks.tickets.expect_delete().times(0);
    let input = JustificationInput {
        justification: Some("doublon".into()),
    };
    let error = mocks
        .into_service()
        .delete_ticket(&admin_caller(), 4, input)
        .await
        .expect_err("audit required");
    assert_eq!(error.code(), ErrorCode::ServiceUnavailable);
}

#[tokio::test]
async fn delete_requires_justification() {
    let error = Mocks::default()
        .into_service()
        .delete_ticket(&admin_caller(), 4, JustificationInput::default())
        .await
        .expect_err("invalid");
    assert_eq!(error.code(), ErrorCode::InvalidRequest);
}

#[tokio::test]
async fn satisfaction_requires_ticket_client() {
    let mut mocks = Mocks::default().with_ticket(ticket(4, TicketEtat::Termine, None));
    mocks
        .tickets
        .expect_is_client_user()
        .with(eq(4), eq(1))
        .return_once(|_, _| Ok(false));
    mocks.tickets.expect_upsert_satisfaction().times(0);
    let input = SatisfactionInput {
        rating: Some(json!(4)),
        commentaire: None,
    };
    let error = mocks
        .into_service()
        .save_satisfaction(&admin_caller(), 4, input)
        .await
        .expect_err("forbidden");
    assert_eq!(error.code(), ErrorCode::Forbidden);
}

#[rstest]
#[case(json!(0))]
#[case(json!(6))]
#[case(json!("excellent"))]
#[tokio::test]
async fn satisfaction_rating_out_of_range_is_rejected(#[case] rating: serde_json::Value) {
    let mut mocks = Mocks::default();
    mocks.tickets.expect_upsert_satisfaction().times(0);
    let input = SatisfactionInput {
        rating: Some(rating),
        commentaire: None,
    };
    let error = mocks
        .into_service()
        .save_satisfaction(&admin_caller(), 4, input)
        .await
        .expect_err("invalid");
    assert_eq!(error.code(), ErrorCode::InvalidRequest);
}

#[tokio::test]
async fn satisfaction_upserts_for_client() {
    let client = Caller::new(50, "client@example.com", Vec::new());
    let mut mocks = Mocks::default().with_ticket(ticket(4, TicketEtat::Termine, None));
    mocks
        .tickets
        .expect_is_client_user()
        .return_once(|_, _| Ok(true));
    mocks
        .tickets
        .expect_upsert_satisfaction()
        .with(eq(4), eq(5_i16), eq(Some("parfait".to_owned())))
        .return_once(|_, rating, commentaire| {
            Ok(Satisfaction {
                rating,
                commentaire,
                updated_at: Utc::now(),
            })
        });
    let input = SatisfactionInput {
        rating: Some(json!("5")),
        commentaire: Some("parfait".into()),
    };
    let saved = mocks
        .into_service()
        .save_satisfaction(&client, 4, input)
        .await
        .expect("saved");
    assert_eq!(saved.rating, 5);
}

#[tokio::test]
async fn add_agent_requires_known_agent() {
    let mut mocks = Mocks::default().with_ticket(ticket(4, TicketEtat::EnCours, None));
    mocks
        .agents
        .expect_find_by_matricule()
        .return_once(|_| Ok(None));
    mocks.tickets.expect_add_agent().times(0);
    let input = AgentAssignmentInput {
        matricule: Some("Z9".into()),
        ..AgentAssignmentInput::default()
    };
    let error = mocks
        .into_service()
        .add_agent(4, input)
        .await
        .expect_err("unknown agent");
    assert_eq!(error.code(), ErrorCode::NotFound);
}

#[tokio::test]
async fn add_responsable_requires_chef() {
    let mut mocks = Mocks::default().with_ticket(ticket(4, TicketEtat::EnCours, None));
    mocks
        .chef
        .expect_assert_chef()
        .return_once(|_| Err(Error::forbidden("not a chef")));
    mocks.tickets.expect_add_responsable().times(0);
    let input = ResponsableInput {
        matricule: Some("B2".into()),
        role: None,
    };
    let error = mocks
        .into_service()
        .add_responsable(4, input)
        .await
        .expect_err("forbidden");
    assert_eq!(error.code(), ErrorCode::Forbidden);
}

#[tokio::test]
async fn remove_missing_agent_is_not_found() {
    let mut mocks = Mocks::default();
    mocks
        .tickets
        .expect_remove_agent()
        .return_once(|_, _| Ok(false));
    let error = mocks
        .into_service()
        .remove_agent(4, "A1")
        .await
        .expect_err("missing");
    assert_eq!(error.code(), ErrorCode::NotFound);
}
