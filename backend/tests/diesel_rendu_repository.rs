//! Integration tests for `DieselRenduRepository` against embedded PostgreSQL.
//!
//! A rendu owns image rows through a link table plus document register rows;
//! deletion must remove all of them together and respect the owner.

use fieldops::domain::ports::RenduRepository;
use fieldops::domain::{FileUpload, NewRendu, Rendu, RenduOwner};
use fieldops::outbound::persistence::DieselRenduRepository;
use rstest::{fixture, rstest};

mod support;

use support::seed::{count, insert_travaux};
use support::{TestDatabase, handle_cluster_setup_failure, setup_database};

const TEST_DB: &str = "diesel_rendu_repo_test";

struct TestContext {
    db: TestDatabase,
    repository: DieselRenduRepository,
    travaux_id: i32,
    other_travaux_id: i32,
}

#[derive(Debug, PartialEq, Eq)]
struct StoredFiles {
    links: i64,
    documents: i64,
    images: i64,
}

impl TestContext {
    fn create_rendu(&self) -> Rendu {
        let rendu = NewRendu {
            titre: "Pose du compteur".into(),
            description: Some("Compteur remplacé".into()),
            images: vec![photo("avant.jpg"), photo("apres.jpg")],
        };
        self.db
            .runtime
            .block_on(
                self.repository
                    .create(RenduOwner::Travaux(self.travaux_id), &rendu),
            )
            .expect("create rendu")
    }

    fn stored_files(&self, rendu_id: i32) -> StoredFiles {
        let mut client = self.db.client();
        StoredFiles {
            links: count(
                &mut client,
                "SELECT count(*) FROM rendu_travaux_image WHERE rendu_id = $1",
                rendu_id,
            ),
            documents: count(
                &mut client,
                "SELECT count(*) FROM document_repertoire WHERE rendu_travaux_id = $1",
                rendu_id,
            ),
            images: count(
                &mut client,
                "SELECT count(*) FROM image WHERE id > $1",
                0,
            ),
        }
    }
}

fn photo(name: &str) -> FileUpload {
    FileUpload {
        name: name.into(),
        mime: "image/jpeg".into(),
        data: vec![0xFF, 0xD8, 0xFF, 0xE0],
    }
}

fn setup_context() -> Result<TestContext, String> {
    let db = setup_database(TEST_DB)?;
    let mut client = db.client();
    let travaux_id = insert_travaux(&mut client, "Rénovation chaufferie");
    let other_travaux_id = insert_travaux(&mut client, "Peinture hall");
    let repository = DieselRenduRepository::new(db.pool.clone());
    Ok(TestContext {
        db,
        repository,
        travaux_id,
        other_travaux_id,
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
fn create_stores_images_links_and_documents(repo_context: Option<TestContext>) {
    let Some(context) = repo_context else {
        eprintln!("SKIP-TEST-CLUSTER: create_stores_images_links_and_documents skipped");
        return;
    };
    let rendu = context.create_rendu();

    assert_eq!(rendu.owner_id, context.travaux_id);
    assert_eq!(rendu.images.len(), 2);
    assert_eq!(
        context.stored_files(rendu.id),
        StoredFiles {
            links: 2,
            documents: 2,
            images: 2,
        }
    );
}

#[rstest]
fn delete_removes_images_links_and_documents(repo_context: Option<TestContext>) {
    let Some(context) = repo_context else {
        eprintln!("SKIP-TEST-CLUSTER: delete_removes_images_links_and_documents skipped");
        return;
    };
    let rendu = context.create_rendu();
    let owner = RenduOwner::Travaux(context.travaux_id);

    let removed = context
        .db
        .runtime
        .block_on(context.repository.delete(owner, rendu.id))
        .expect("delete rendu");
    let found = context
        .db
        .runtime
        .block_on(context.repository.find(owner, rendu.id))
        .expect("find rendu");

    assert!(removed);
    assert!(found.is_none());
    assert_eq!(
        context.stored_files(rendu.id),
        StoredFiles {
            links: 0,
            documents: 0,
            images: 0,
        }
    );
}

#[rstest]
fn delete_under_another_owner_leaves_everything(repo_context: Option<TestContext>) {
    let Some(context) = repo_context else {
        eprintln!("SKIP-TEST-CLUSTER: delete_under_another_owner_leaves_everything skipped");
        return;
    };
    let rendu = context.create_rendu();

    let removed = context
        .db
        .runtime
        .block_on(
            context
                .repository
                .delete(RenduOwner::Travaux(context.other_travaux_id), rendu.id),
        )
        .expect("delete rendu");

    assert!(!removed);
    assert_eq!(
        context.stored_files(rendu.id),
        StoredFiles {
            links: 2,
            documents: 2,
            images: 2,
        }
    );
}
