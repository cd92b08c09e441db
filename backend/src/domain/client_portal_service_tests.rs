//! Tests for the client portal service.

use std::sync::Arc;

use chrono::{TimeZone, Utc};
use mockall::predicate::eq;
use rstest::rstest;

use super::*;
use crate::domain::ports::{
    MockAgentDirectory, MockAuditLog, MockClientRepository, MockPasswordHasher,
    MockReferenceRepository, MockTicketRepository, MockTravauxRepository, PersistenceError,
};
use crate::domain::{Doe, ErrorCode, ROLE_ADMIN, Ticket};

#[derive(Default)]
struct Mocks {
    clients: MockClientRepository,
    tickets: MockTicketRepository,
    travaux: MockTravauxRepository,
    references: MockReferenceRepository,
    agents: MockAgentDirectory,
    audit: MockAuditLog,
    hasher: MockPasswordHasher,
}

impl Mocks {
    fn into_service(self) -> ClientPortalService {
        ClientPortalService::new(ClientPortalDeps {
            clients: Arc::new(self.clients),
            tickets: Arc::new(self.tickets),
            travaux: Arc::new(self.travaux),
            references: Arc::new(self.references),
            agents: Arc::new(self.agents),
            audit: Arc::new(self.audit),
            hasher: Arc::new(self.hasher),
        })
    }

    fn accessible(mut self, ids: Vec<i32>) -> Self {
        self.clients
            .expect_accessible_client_ids()
            .returning(move |_, _| Ok(ids.clone()));
        self
    }

    fn with_demande(mut self, demande: Demande) -> Self {
        self.clients
            .expect_find_demande()
            .with(eq(demande.id))
            .returning(move |_| Ok(Some(demande.clone())));
        self
    }

    fn tolerate_audit(mut self) -> Self {
        self.audit.expect_record().returning(|_| Ok(()));
        self
    }
}

fn client_caller() -> Caller {
    Caller::new(50, "client5@example.com", vec![ROLE_CLIENT.to_owned()])
}

fn admin_caller() -> Caller {
    Caller::new(1, "admin@example.com", vec![ROLE_ADMIN.to_owned()])
}

fn demande(id: i32, status: DemandeStatus, ticket_id: Option<i32>) -> Demande {
    let at = Utc
        .with_ymd_and_hms(2026, 1, 5, 9, 0, 0)
        .single()
        .expect("valid date");
    Demande {
        id,
        client_id: 5,
        site_id: Some(3),
        titre: "Fuite toit".into(),
        description: "Eau au plafond".into(),
        status,
        commentaire: None,
        ticket_id,
        created_at: at,
        updated_at: at,
    }
}

fn site(id: i32, client_id: i32) -> Site {
    Site {
        id,
        client_id,
        nom: "Entrepôt nord".into(),
        commentaire: None,
    }
}

fn ticket_for(demande: &Demande, id: i32) -> Ticket {
    Ticket {
        id,
        titre: demande.titre.clone(),
        description: Some(demande.description.clone()),
        etat: TicketEtat::PasCommence,
        doe_id: Some(8),
        affaire_id: Some(2),
        site_id: demande.site_id,
        demande_id: Some(demande.id),
        responsable: Some("A12".into()),
        date_debut: None,
        date_fin: None,
        created_at: demande.created_at,
    }
}

#[tokio::test]
async fn register_rejects_missing_password() {
    let service = Mocks::default().into_service();
    let request = RegisterClientRequest {
        email: Some("new@example.com".into()),
        nom_societe: Some("ACME".into()),
        ..RegisterClientRequest::default()
    };
    let error = service.register_client(request).await.expect_err("invalid");
    assert_eq!(error.code(), ErrorCode::InvalidRequest);
}

#[tokio::test]
async fn register_maps_taken_email_to_conflict() {
    let mut mocks = Mocks::default();
    mocks
        .hasher
        .expect_hash()
        .returning(|_| Ok("$argon2id$hash".into()));
    mocks
        .clients
        .expect_register_client()
        .withf(|account| {
            account.roles == vec![ROLE_CLIENT.to_owned()] && account.password_hash != "secret"
        })
        .return_once(|_| Ok(RegistrationOutcome::EmailTaken));
    let request = RegisterClientRequest {
        email: Some("taken@example.com".into()),
        password: Some("secret".into()),
        nom_societe: Some("ACME".into()),
        ..RegisterClientRequest::default()
    };

    let error = mocks
        .into_service()
        .register_client(request)
        .await
        .expect_err("conflict");
    assert_eq!(error.code(), ErrorCode::Conflict);
}

#[tokio::test]
async fn list_sites_is_empty_without_client() {
    let mut mocks = Mocks::default().accessible(Vec::new());
    mocks.clients.expect_list_sites().times(0);
    let sites = mocks
        .into_service()
        .list_sites(&client_caller())
        .await
        .expect("listed");
    assert!(sites.is_empty());
}

#[rstest]
#[case(Vec::new(), ErrorCode::Forbidden)]
#[case(vec![6], ErrorCode::Forbidden)]
#[tokio::test]
async fn get_site_enforces_ownership(#[case] accessible: Vec<i32>, #[case] expected: ErrorCode) {
    let mut mocks = Mocks::default().accessible(accessible);
    mocks
        .clients
        .expect_find_site()
        .returning(|id| Ok(Some(site(id, 5))));
    let error = mocks
        .into_service()
        .get_site(&client_caller(), 3)
        .await
        .expect_err("denied");
    assert_eq!(error.code(), expected);
}

#[tokio::test]
async fn admin_site_creation_requires_client_id() {
    let service = Mocks::default().into_service();
    let input = SiteInput {
        nom: Some("Dépôt".into()),
        ..SiteInput::default()
    };
    let error = service
        .create_site(&admin_caller(), input)
        .await
        .expect_err("invalid");
    assert_eq!(error.code(), ErrorCode::InvalidRequest);
}

#[tokio::test]
async fn client_creates_pending_demande_for_own_client() {
    let mut mocks = Mocks::default().accessible(vec![5]);
    mocks
        .clients
        .expect_create_demande()
        .withf(|new| {
            new.client_id == 5 && new.status == DemandeStatus::EnAttente && new.site_id.is_none()
        })
        .return_once(|new| {
            let mut created = demande(10, new.status, None);
            created.site_id = None;
            Ok(created)
        });
    let input = DemandeInput {
        titre: Some("Fuite toit".into()),
        description: Some("Eau au plafond".into()),
        ..DemandeInput::default()
    };

    let created = mocks
        .into_service()
        .create_demande(&client_caller(), input)
        .await
        .expect("created");
    assert_eq!(created.status, DemandeStatus::EnAttente);
    assert_eq!(created.client_id, 5);
}

#[tokio::test]
async fn demande_on_foreign_site_is_forbidden() {
    let mut mocks = Mocks::default().accessible(vec![5]);
    mocks
        .clients
        .expect_find_site()
        .returning(|id| Ok(Some(site(id, 9))));
    mocks.clients.expect_create_demande().times(0);
    let input = DemandeInput {
        site_id: Some(3),
        titre: Some("Fuite".into()),
        description: Some("Toit".into()),
        ..DemandeInput::default()
    };
    let error = mocks
        .into_service()
        .create_demande(&client_caller(), input)
        .await
        .expect_err("forbidden");
    assert_eq!(error.code(), ErrorCode::Forbidden);
}

#[tokio::test]
async fn demande_requires_title_and_description() {
    let service = Mocks::default().into_service();
    let input = DemandeInput {
        titre: Some("Fuite".into()),
        ..DemandeInput::default()
    };
    let error = service
        .create_demande(&client_caller(), input)
        .await
        .expect_err("invalid");
    assert_eq!(error.code(), ErrorCode::InvalidRequest);
}

#[rstest]
#[case::client(client_caller())]
#[case::admin(admin_caller())]
#[tokio::test]
async fn converted_demande_is_immutable(#[case] caller: Caller) {
    let mut mocks = Mocks::default()
        .accessible(vec![5])
        .with_demande(demande(10, DemandeStatus::EnCours, Some(77)));
    mocks.clients.expect_update_demande().times(0);
    let input = DemandeInput {
        titre: Some("Nouveau titre".into()),
        ..DemandeInput::default()
    };
    let error = mocks
        .into_service()
        .update_demande(&caller, 10, input)
        .await
        .expect_err("conflict");
    assert_eq!(error.code(), ErrorCode::Conflict);
}

#[tokio::test]
async fn status_synonym_with_reason_is_normalised() {
    let mut mocks = Mocks::default()
        .with_demande(demande(10, DemandeStatus::EnAttente, None))
        .tolerate_audit();
    mocks
        .clients
        .expect_set_demande_status()
        .with(
            eq(10),
            eq(DemandeStatus::Rejetee),
            eq(Some("hors contrat".to_owned())),
        )
        .return_once(|_, status, commentaire| {
            let mut updated = demande(10, status, None);
            updated.commentaire = commentaire;
            Ok(Some(updated))
        });
    let input = DemandeStatusInput {
        status: Some("rejetée".into()),
        commentaire: Some("hors contrat".into()),
    };

    let updated = mocks
        .into_service()
        .update_demande_status(&admin_caller(), 10, input)
        .await
        .expect("updated");
    assert_eq!(updated.status, DemandeStatus::Rejetee);
    assert_eq!(updated.commentaire.as_deref(), Some("hors contrat"));
}

#[tokio::test]
async fn status_comment_dropped_when_not_a_rejection() {
    let mut mocks = Mocks::default()
        .with_demande(demande(10, DemandeStatus::EnAttente, None))
        .tolerate_audit();
    mocks
        .clients
        .expect_set_demande_status()
        .with(eq(10), eq(DemandeStatus::EnCours), eq(None))
        .return_once(|_, status, _| Ok(Some(demande(10, status, None))));
    let input = DemandeStatusInput {
        status: Some("in progress".into()),
        commentaire: Some("ignored".into()),
    };
    let updated = mocks
        .into_service()
        .update_demande_status(&admin_caller(), 10, input)
        .await
        .expect("updated");
    assert_eq!(updated.status, DemandeStatus::EnCours);
}

#[tokio::test]
async fn unknown_status_is_rejected() {
    let service = Mocks::default().into_service();
    let input = DemandeStatusInput {
        status: Some("peut-être".into()),
        commentaire: None,
    };
    let error = service
        .update_demande_status(&admin_caller(), 10, input)
        .await
        .expect_err("invalid");
    assert_eq!(error.code(), ErrorCode::InvalidRequest);
    assert!(error.details().is_some());
}

#[tokio::test]
async fn audit_failure_does_not_fail_status_change() {
    let mut mocks = Mocks::default().with_demande(demande(10, DemandeStatus::EnAttente, None));
    mocks.audit.expect_record().returning(|_| {
        Err(PersistenceError::query("audit table missing"))
    });
    mocks
        .clients
        .expect_set_demande_status()
        .return_once(|_, status, _| Ok(Some(demande(10, status, None))));
    let input = DemandeStatusInput {
        status: Some("traitée".into()),
        commentaire: None,
    };
    let updated = mocks
        .into_service()
        .update_demande_status(&admin_caller(), 10, input)
        .await
        .expect("audit is best effort");
    assert_eq!(updated.status, DemandeStatus::Traitee);
}

#[tokio::test]
async fn delete_requires_justification() {
    let mut mocks = Mocks::default();
    mocks.clients.expect_soft_delete_demande().times(0);
    let error = mocks
        .into_service()
        .delete_demande(&admin_caller(), 10, JustificationInput::default())
        .await
        .expect_err("invalid");
    assert_eq!(error.code(), ErrorCode::InvalidRequest);
}

#[tokio::test]
async fn delete_of_converted_demande_conflicts() {
    let mut mocks = Mocks::default().with_demande(demande(10, DemandeStatus::EnCours, Some(77)));
    mocks
        .clients
        .expect_soft_delete_demande()
        .withf(|_, justification, audit| {
            justification == "doublon"
                && audit.action == AuditAction::Delete
                && audit.actor_email.as_deref() == Some("admin@example.com")
        })
        .return_once(|_, _, _| Ok(SoftDeleteOutcome::Converted { ticket_id: 77 }));
    let input = JustificationInput {
        justification: Some(" doublon ".into()),
    };
    let error = mocks
        .into_service()
        .delete_demande(&admin_caller(), 10, input)
        .await
        .expect_err("conflict");
    assert_eq!(error.code(), ErrorCode::Conflict);
    assert_eq!(
        error.details().and_then(|d| d["ticket_id"].as_i64()),
        Some(77)
    );
}

#[tokio::test]
async fn restore_requires_deleted_status() {
    let mut mocks = Mocks::default().with_demande(demande(10, DemandeStatus::EnAttente, None));
    mocks.clients.expect_restore_demande().times(0);
    let error = mocks
        .into_service()
        .restore_demande(&admin_caller(), 10)
        .await
        .expect_err("conflict");
    assert_eq!(error.code(), ErrorCode::Conflict);
}

#[tokio::test]
async fn restore_moves_demande_back_in_progress_and_clears_justification() {
    let mut deleted = demande(10, DemandeStatus::Supprimee, None);
    deleted.commentaire = Some("doublon".into());
    let mut mocks = Mocks::default().with_demande(deleted).tolerate_audit();
    mocks.clients.expect_set_demande_status().times(0);
    mocks
        .clients
        .expect_restore_demande()
        .with(eq(10))
        .times(1)
        .return_once(|id| Ok(Some(demande(id, DemandeStatus::EnCours, None))));
    let restored = mocks
        .into_service()
        .restore_demande(&admin_caller(), 10)
        .await
        .expect("restored");
    assert_eq!(restored.status, DemandeStatus::EnCours);
    assert_eq!(restored.commentaire, None);
}

#[tokio::test]
async fn restore_racing_another_restore_conflicts() {
    let mut mocks = Mocks::default().with_demande(demande(10, DemandeStatus::Supprimee, None));
    mocks
        .clients
        .expect_restore_demande()
        .return_once(|_| Ok(None));
    let error = mocks
        .into_service()
        .restore_demande(&admin_caller(), 10)
        .await
        .expect_err("already restored");
    assert_eq!(error.code(), ErrorCode::Conflict);
}

#[tokio::test]
async fn conversion_builds_ticket_from_demande_and_doe() {
    let source = demande(10, DemandeStatus::EnAttente, None);
    let mut mocks = Mocks::default().with_demande(source.clone()).tolerate_audit();
    mocks.references.expect_find_doe_for_site().with(eq(3)).return_once(|_| {
        Ok(Some(Doe {
            id: 8,
            titre: "DOE entrepôt".into(),
            site_id: Some(3),
            affaire_id: Some(2),
        }))
    });
    mocks
        .clients
        .expect_convert_demande()
        .withf(|id, ticket| {
            *id == 10
                && ticket.titre == "Fuite toit"
                && ticket.etat == TicketEtat::PasCommence
                && ticket.doe_id == Some(8)
                && ticket.affaire_id == Some(2)
                && ticket.demande_id == Some(10)
                && ticket.responsable.as_deref() == Some("A12")
        })
        .return_once(move |_, _| {
            let mut converted = source.clone();
            converted.status = DemandeStatus::EnCours;
            converted.ticket_id = Some(77);
            let ticket = ticket_for(&source, 77);
            Ok(ConversionOutcome::Converted(ConversionResult {
                demande: converted,
                ticket,
            }))
        });
    let caller = admin_caller().with_matricule("A12");

    let result = mocks
        .into_service()
        .convert_to_ticket(&caller, 10)
        .await
        .expect("converted");
    assert_eq!(result.demande.ticket_id, Some(77));
    assert_eq!(result.demande.status, DemandeStatus::EnCours);
    assert_eq!(result.ticket.id, 77);
}

#[tokio::test]
async fn second_conversion_conflicts() {
    let mut mocks = Mocks::default().with_demande(demande(10, DemandeStatus::EnCours, Some(77)));
    mocks.clients.expect_convert_demande().times(0);
    let error = mocks
        .into_service()
        .convert_to_ticket(&admin_caller(), 10)
        .await
        .expect_err("conflict");
    assert_eq!(error.code(), ErrorCode::Conflict);
}

#[tokio::test]
async fn conversion_race_reports_existing_ticket() {
    let mut mocks = Mocks::default().with_demande(demande(10, DemandeStatus::EnAttente, None));
    mocks.agents.expect_find_by_email().returning(|_| Ok(None));
    mocks
        .references
        .expect_find_doe_for_site()
        .returning(|_| Ok(None));
    mocks
        .clients
        .expect_convert_demande()
        .return_once(|_, _| Ok(ConversionOutcome::AlreadyConverted { ticket_id: 78 }));
    let error = mocks
        .into_service()
        .convert_to_ticket(&admin_caller(), 10)
        .await
        .expect_err("conflict");
    assert_eq!(error.code(), ErrorCode::Conflict);
}

#[tokio::test]
async fn client_lists_only_accessible_demandes() {
    let mut mocks = Mocks::default().accessible(vec![5, 6]);
    mocks
        .clients
        .expect_list_demandes()
        .withf(|filter| {
            filter.client_ids == Some(vec![5, 6]) && filter.status == Some(DemandeStatus::Rejetee)
        })
        .return_once(|_| Ok(Vec::new()));
    let query = DemandeQuery {
        status: Some("Rejetee".into()),
        ..DemandeQuery::default()
    };
    let listed = mocks
        .into_service()
        .list_demandes(&client_caller(), query)
        .await
        .expect("listed");
    assert!(listed.is_empty());
}
