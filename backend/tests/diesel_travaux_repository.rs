//! Integration tests for demande links in `DieselTravauxRepository`.
//!
//! Relations read demandes through `demande_travaux` only, so every way of
//! attaching a demande to a work order must write that link row.

use fieldops::domain::ports::{ClientRepository, TravauxRepository};
use fieldops::domain::{
    DemandeStatus, NewDemande, NewTravaux, TravauxEtat, TravauxInput, TravauxPriorite,
};
use fieldops::outbound::persistence::{DieselClientRepository, DieselTravauxRepository};
use rstest::{fixture, rstest};

mod support;

use support::seed::{count, insert_client};
use support::{TestDatabase, handle_cluster_setup_failure, setup_database};

const TEST_DB: &str = "diesel_travaux_repo_test";

struct TestContext {
    db: TestDatabase,
    repository: DieselTravauxRepository,
    demande_id: i32,
}

impl TestContext {
    fn create_travaux(&self, demande_id: Option<i32>) -> i32 {
        let travaux = NewTravaux {
            titre: "Réfection façade".into(),
            description: None,
            etat: TravauxEtat::AFaire,
            priorite: TravauxPriorite::Normale,
            date_debut: None,
            date_fin: None,
            date_echeance: None,
            doe_id: None,
            affaire_id: None,
            site_id: None,
            demande_id,
            ticket_id: None,
        };
        self.db
            .runtime
            .block_on(self.repository.create(&travaux))
            .expect("create travaux")
            .id
    }

    fn linked_ids(&self, travaux_id: i32) -> Vec<i32> {
        self.db
            .runtime
            .block_on(self.repository.linked_demandes(travaux_id))
            .expect("linked demandes")
            .into_iter()
            .map(|demande| demande.id)
            .collect()
    }
}

fn setup_context() -> Result<TestContext, String> {
    let db = setup_database(TEST_DB)?;
    let mut client = db.client();
    let client_id = insert_client(&mut client, "Syndic Nord");
    let demande = db
        .runtime
        .block_on(
            DieselClientRepository::new(db.pool.clone()).create_demande(&NewDemande {
                client_id,
                site_id: None,
                titre: "Façade abîmée".into(),
                description: "Enduit qui se décolle".into(),
                status: DemandeStatus::EnAttente,
            }),
        )
        .map_err(|err| err.to_string())?;
    let repository = DieselTravauxRepository::new(db.pool.clone());
    Ok(TestContext {
        db,
        repository,
        demande_id: demande.id,
    })
}

#[fixture]
fn repo_context() -> Option<TestContext> {
    match setup_context() {
        Ok(ctx) => Some(ctx),
        Err(reason) => handle_cluster_setup_failure(reason),
    }
}

#[rstest]
fn create_with_a_demande_links_it(repo_context: Option<TestContext>) {
    let Some(context) = repo_context else {
        eprintln!("SKIP-TEST-CLUSTER: create_with_a_demande_links_it skipped");
        return;
    };
    let travaux_id = context.create_travaux(Some(context.demande_id));

    assert_eq!(context.linked_ids(travaux_id), vec![context.demande_id]);
}

#[rstest]
fn create_without_a_demande_links_nothing(repo_context: Option<TestContext>) {
    let Some(context) = repo_context else {
        eprintln!("SKIP-TEST-CLUSTER: create_without_a_demande_links_nothing skipped");
        return;
    };
    let travaux_id = context.create_travaux(None);

    assert!(context.linked_ids(travaux_id).is_empty());
}

#[rstest]
fn update_with_a_demande_links_it_once(repo_context: Option<TestContext>) {
    let Some(context) = repo_context else {
        eprintln!("SKIP-TEST-CLUSTER: update_with_a_demande_links_it_once skipped");
        return;
    };
    let travaux_id = context.create_travaux(None);
    let patch = TravauxInput {
        demande_id: Some(context.demande_id),
        ..TravauxInput::default()
    };

    for _ in 0..2 {
        let updated = context
            .db
            .runtime
            .block_on(context.repository.update(travaux_id, &patch))
            .expect("update travaux")
            .expect("travaux exists");
        assert_eq!(updated.demande_id, Some(context.demande_id));
    }

    assert_eq!(context.linked_ids(travaux_id), vec![context.demande_id]);
    let mut client = context.db.client();
    assert_eq!(
        count(
            &mut client,
            "SELECT count(*) FROM demande_travaux WHERE travaux_id = $1",
            travaux_id
        ),
        1
    );
}

#[rstest]
fn update_of_a_missing_travaux_writes_no_link(repo_context: Option<TestContext>) {
    let Some(context) = repo_context else {
        eprintln!("SKIP-TEST-CLUSTER: update_of_a_missing_travaux_writes_no_link skipped");
        return;
    };
    let patch = TravauxInput {
        demande_id: Some(context.demande_id),
        ..TravauxInput::default()
    };

    let updated = context
        .db
        .runtime
        .block_on(context.repository.update(9_999, &patch))
        .expect("update travaux");

    assert!(updated.is_none());
    let mut client = context.db.client();
    assert_eq!(
        count(
            &mut client,
            "SELECT count(*) FROM demande_travaux WHERE demande_id = $1",
            context.demande_id
        ),
        0
    );
}
