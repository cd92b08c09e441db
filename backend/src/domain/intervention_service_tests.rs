//! Tests for the intervention scheduling service.

use std::sync::Arc;

use chrono::{TimeZone, Utc};
use mockall::predicate::eq;

use super::*;
use crate::domain::ports::{
    MockClientRepository, MockInterventionEventSync, MockInterventionRepository,
    MockRenduRepository, MockTicketRepository, PersistenceError,
};
use crate::domain::{ErrorCode, MaterielSource, TicketEtat};

#[derive(Default)]
struct Mocks {
    interventions: MockInterventionRepository,
    events: MockInterventionEventSync,
    tickets: MockTicketRepository,
    clients: MockClientRepository,
    rendus: MockRenduRepository,
}

impl Mocks {
    fn into_service(self) -> InterventionService {
        InterventionService::new(InterventionServiceDeps {
            interventions: Arc::new(self.interventions),
            events: Arc::new(self.events),
            tickets: Arc::new(self.tickets),
            clients: Arc::new(self.clients),
            rendus: RenduBook::new(Arc::new(self.rendus)),
        })
    }
}

fn at() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 2, 8, 0, 0)
        .single()
        .expect("valid date")
}

fn ticket(id: i32) -> Ticket {
    Ticket {
        id,
        titre: "Fuite toit".into(),
        description: None,
        etat: TicketEtat::EnCours,
        doe_id: Some(8),
        affaire_id: Some(2),
        site_id: Some(3),
        demande_id: Some(10),
        responsable: Some("A1".into()),
        date_debut: None,
        date_fin: None,
        created_at: at(),
    }
}

fn intervention_from(id: i32, new: &NewIntervention) -> Intervention {
    Intervention {
        id,
        ticket_id: new.ticket_id,
        site_id: new.site_id,
        demande_id: new.demande_id,
        titre: new.titre.clone(),
        description: new.description.clone(),
        status: new.status,
        date_debut: new.date_debut,
        date_fin: new.date_fin,
        metier: new.metier.clone(),
        ticket_agent_id: new.ticket_agent_id,
        created_at: at(),
    }
}

fn intervention(id: i32, ticket_id: i32) -> Intervention {
    intervention_from(
        id,
        &NewIntervention {
            ticket_id,
            site_id: Some(3),
            demande_id: None,
            titre: "Diagnostic".into(),
            description: None,
            status: InterventionStatus::EnAttente,
            date_debut: Some(at()),
            date_fin: None,
            metier: None,
            ticket_agent_id: None,
        },
    )
}

fn usage(materiel_id: i32, quantite: i32, source: MaterielSource) -> MaterielUsage {
    MaterielUsage {
        materiel_id,
        nom: format!("materiel {materiel_id}"),
        reference: None,
        quantite,
        source,
    }
}

#[tokio::test]
async fn create_inherits_ticket_context_and_syncs_events() {
    let mut mocks = Mocks::default();
    mocks
        .tickets
        .expect_find()
        .with(eq(4))
        .return_once(|id| Ok(Some(ticket(id))));
    mocks
        .interventions
        .expect_create()
        .withf(|new| {
            new.site_id == Some(3)
                && new.demande_id == Some(10)
                && new.status == InterventionStatus::EnAttente
        })
        .return_once(|new| Ok(intervention_from(30, new)));
    mocks
        .events
        .expect_sync()
        .withf(|intervention| intervention.id == 30)
        .times(1)
        .return_once(|_| Ok(2));
    let input = InterventionInput {
        ticket_id: Some(4),
        titre: Some("Diagnostic".into()),
        ..InterventionInput::default()
    };

    let created = mocks
        .into_service()
        .create_intervention(input)
        .await
        .expect("created");
    assert_eq!(created.id, 30);
}

#[tokio::test]
async fn create_requires_existing_ticket() {
    let mut mocks = Mocks::default();
    mocks.tickets.expect_find().return_once(|_| Ok(None));
    mocks.interventions.expect_create().times(0);
    let input = InterventionInput {
        ticket_id: Some(404),
        titre: Some("Diagnostic".into()),
        ..InterventionInput::default()
    };
    let error = mocks
        .into_service()
        .create_intervention(input)
        .await
        .expect_err("missing ticket");
    assert_eq!(error.code(), ErrorCode::NotFound);
}

#[tokio::test]
async fn create_requires_ticket_id() {
    let error = Mocks::default()
        .into_service()
        .create_intervention(InterventionInput {
            titre: Some("Diagnostic".into()),
            ..InterventionInput::default()
        })
        .await
        .expect_err("invalid");
    assert_eq!(error.code(), ErrorCode::InvalidRequest);
}

#[tokio::test]
async fn sync_failure_does_not_fail_patch() {
    let mut mocks = Mocks::default();
    mocks
        .interventions
        .expect_patch()
        .return_once(|id, _| {
            let mut patched = intervention(id, 4);
            patched.status = InterventionStatus::EnCours;
            Ok(Some(patched))
        });
    mocks
        .events
        .expect_sync()
        .return_once(|_| Err(PersistenceError::query("event table locked")));
    let input = InterventionInput {
        status: Some(InterventionStatus::EnCours),
        ..InterventionInput::default()
    };
    let patched = mocks
        .into_service()
        .patch_intervention(30, input)
        .await
        .expect("patched");
    assert_eq!(patched.status, InterventionStatus::EnCours);
}

#[tokio::test]
async fn delete_does_not_sync() {
    let mut mocks = Mocks::default();
    mocks.interventions.expect_delete().return_once(|_| Ok(true));
    mocks.events.expect_sync().times(0);
    mocks
        .into_service()
        .delete_intervention(30)
        .await
        .expect("deleted");
}

#[tokio::test]
async fn materiels_merge_direct_first() {
    let mut mocks = Mocks::default();
    mocks
        .interventions
        .expect_find()
        .return_once(|id| Ok(Some(intervention(id, 4))));
    mocks
        .interventions
        .expect_direct_materiels()
        .return_once(|_| Ok(vec![usage(1, 2, MaterielSource::Direct)]));
    mocks
        .interventions
        .expect_requested_materiels()
        .with(eq(30), eq(4))
        .return_once(|_, _| {
            Ok(vec![
                usage(1, 9, MaterielSource::Demande),
                usage(2, 1, MaterielSource::Demande),
            ])
        });

    let merged = mocks
        .into_service()
        .materiels(30)
        .await
        .expect("merged");
    assert_eq!(merged.len(), 2);
    assert_eq!(merged.first().map(|m| (m.quantite, m.source)), Some((2, MaterielSource::Direct)));
}

#[tokio::test]
async fn calendar_passes_agent_filter() {
    let mut mocks = Mocks::default();
    mocks
        .interventions
        .expect_calendar()
        .with(eq(Some(vec!["A1".to_owned(), "B2".to_owned()])))
        .return_once(|_| Ok(Vec::new()));
    let query = CalendarQuery {
        agents: Some("A1, B2,".into()),
    };
    let entries = mocks
        .into_service()
        .calendar(query)
        .await
        .expect("calendar");
    assert!(entries.is_empty());
}
