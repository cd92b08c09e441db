//! Integration tests for `DieselTicketRepository` against embedded PostgreSQL.
//!
//! These cover the statements whose behaviour depends on the database: the
//! conditional primary claim and the satisfaction upsert.

use fieldops::domain::ports::TicketRepository;
use fieldops::domain::{NewTicket, TicketEtat};
use fieldops::outbound::persistence::DieselTicketRepository;
use rstest::{fixture, rstest};

mod support;

use support::seed::{count, insert_agent};
use support::{TestDatabase, handle_cluster_setup_failure, setup_database};

const TEST_DB: &str = "diesel_ticket_repo_test";

struct TestContext {
    db: TestDatabase,
    repository: DieselTicketRepository,
}

impl TestContext {
    fn new_ticket(&self, titre: &str) -> i32 {
        let ticket = NewTicket {
            titre: titre.into(),
            description: None,
            etat: TicketEtat::PasCommence,
            doe_id: None,
            affaire_id: None,
            site_id: None,
            demande_id: None,
            responsable: None,
            date_debut: None,
            date_fin: None,
        };
        self.db
            .runtime
            .block_on(self.repository.create(&ticket))
            .expect("create ticket")
            .id
    }
}

fn setup_context() -> Result<TestContext, String> {
    let db = setup_database(TEST_DB)?;
    let mut client = db.client();
    insert_agent(&mut client, "A001");
    insert_agent(&mut client, "B002");
    let repository = DieselTicketRepository::new(db.pool.clone());
    Ok(TestContext { db, repository })
}

#[fixture]
fn repo_context() -> Option<TestContext> {
    match setup_context() {
        Ok(ctx) => Some(ctx),
        Err(reason) => handle_cluster_setup_failure(reason),
    }
}

#[rstest]
fn claim_primary_only_succeeds_while_unassigned(repo_context: Option<TestContext>) {
    let Some(context) = repo_context else {
        eprintln!("SKIP-TEST-CLUSTER: claim_primary_only_succeeds_while_unassigned skipped");
        return;
    };
    let id = context.new_ticket("Fuite toit");
    let repository = &context.repository;

    let first = context
        .db
        .runtime
        .block_on(repository.claim_primary(id, "A001"))
        .expect("first claim");
    let second = context
        .db
        .runtime
        .block_on(repository.claim_primary(id, "B002"))
        .expect("second claim");

    assert_eq!(
        first.and_then(|ticket| ticket.responsable).as_deref(),
        Some("A001")
    );
    assert!(second.is_none());
    let stored = context
        .db
        .runtime
        .block_on(repository.find(id))
        .expect("find ticket")
        .expect("ticket exists");
    assert_eq!(stored.responsable.as_deref(), Some("A001"));
}

#[rstest]
fn concurrent_claims_have_a_single_winner(repo_context: Option<TestContext>) {
    let Some(context) = repo_context else {
        eprintln!("SKIP-TEST-CLUSTER: concurrent_claims_have_a_single_winner skipped");
        return;
    };
    let id = context.new_ticket("Panne chaudière");
    let repository = &context.repository;

    let (left, right) = context.db.runtime.block_on(async {
        tokio::join!(
            repository.claim_primary(id, "A001"),
            repository.claim_primary(id, "B002")
        )
    });
    let winners: Vec<String> = [left.expect("left claim"), right.expect("right claim")]
        .into_iter()
        .flatten()
        .filter_map(|ticket| ticket.responsable)
        .collect();

    assert_eq!(winners.len(), 1);
    let stored = context
        .db
        .runtime
        .block_on(repository.find(id))
        .expect("find ticket")
        .expect("ticket exists");
    assert_eq!(stored.responsable.as_ref(), winners.first());
}

#[rstest]
fn claim_on_missing_ticket_returns_none(repo_context: Option<TestContext>) {
    let Some(context) = repo_context else {
        eprintln!("SKIP-TEST-CLUSTER: claim_on_missing_ticket_returns_none skipped");
        return;
    };
    let claimed = context
        .db
        .runtime
        .block_on(context.repository.claim_primary(9_999, "A001"))
        .expect("claim");
    assert!(claimed.is_none());
}

#[rstest]
fn satisfaction_upsert_keeps_a_single_row(repo_context: Option<TestContext>) {
    let Some(context) = repo_context else {
        eprintln!("SKIP-TEST-CLUSTER: satisfaction_upsert_keeps_a_single_row skipped");
        return;
    };
    let id = context.new_ticket("Serrure bloquée");
    let repository = &context.repository;

    context
        .db
        .runtime
        .block_on(repository.upsert_satisfaction(id, 2, Some("Intervention lente".into())))
        .expect("first rating");
    let updated = context
        .db
        .runtime
        .block_on(repository.upsert_satisfaction(id, 5, None))
        .expect("second rating");

    assert_eq!(updated.rating, 5);
    assert_eq!(updated.commentaire, None);
    let stored = context
        .db
        .runtime
        .block_on(repository.find_satisfaction(id))
        .expect("find satisfaction")
        .expect("satisfaction exists");
    assert_eq!(stored.rating, 5);
    let mut client = context.db.client();
    assert_eq!(
        count(
            &mut client,
            "SELECT count(*) FROM ticket_satisfaction WHERE ticket_id = $1",
            id
        ),
        1
    );
}
