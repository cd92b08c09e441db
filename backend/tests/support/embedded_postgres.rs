//! Database provisioning on top of an embedded cluster.
//!
//! Reset goes through a plain `postgres` client because `DROP DATABASE`
//! cannot run inside the transactions Diesel opens. The schema comes from the
//! same embedded migrations the server applies at start-up.

use diesel::Connection;
use diesel::pg::PgConnection;
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use fieldops::domain::ports::PersistenceError;
use fieldops::outbound::persistence::{DbPool, PoolConfig};
use pg_embedded_setup_unpriv::TestCluster;
use postgres::{Client, NoTls};
use tokio::runtime::Runtime;

use super::format_postgres_error;
use super::pg_embed::test_cluster;

const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// A migrated database with a connection pool and a runtime to drive it.
pub struct TestDatabase {
    pub pool: DbPool,
    pub runtime: Runtime,
    pub url: String,
    _cluster: TestCluster,
}

impl TestDatabase {
    /// Synchronous client for seeding rows and inspecting side tables.
    pub fn client(&self) -> Client {
        Client::connect(&self.url, NoTls)
            .unwrap_or_else(|err| panic!("connect seed client: {}", format_postgres_error(&err)))
    }
}

/// Drop and recreate `name` on the cluster.
pub fn reset_database(cluster: &TestCluster, name: &str) -> Result<(), PersistenceError> {
    let admin_url = cluster.connection().database_url("postgres").to_string();
    let mut client = Client::connect(&admin_url, NoTls)
        .map_err(|err| PersistenceError::connection(format_postgres_error(&err)))?;
    let quoted = name.replace('"', "\"\"");
    for statement in [
        format!(r#"DROP DATABASE IF EXISTS "{quoted}""#),
        format!(r#"CREATE DATABASE "{quoted}""#),
    ] {
        client
            .batch_execute(&statement)
            .map_err(|err| PersistenceError::query(format_postgres_error(&err)))?;
    }
    Ok(())
}

/// Apply every pending migration.
pub fn migrate_schema(url: &str) -> Result<(), PersistenceError> {
    let mut conn = PgConnection::establish(url)
        .map_err(|err| PersistenceError::connection(format!("{err:?}")))?;
    conn.run_pending_migrations(MIGRATIONS)
        .map_err(|err| PersistenceError::query(format!("migration: {err:?}")))?;
    Ok(())
}

/// Start a cluster, recreate `name`, migrate it and open a small pool.
pub fn setup_database(name: &str) -> Result<TestDatabase, String> {
    let runtime = Runtime::new().map_err(|err| err.to_string())?;
    let cluster = test_cluster()?;
    reset_database(&cluster, name).map_err(|err| err.to_string())?;
    let url = cluster.connection().database_url(name).to_string();
    migrate_schema(&url).map_err(|err| err.to_string())?;

    let config = PoolConfig::new(url.clone())
        .with_max_size(4)
        .with_min_idle(Some(1));
    let pool = runtime
        .block_on(DbPool::new(config))
        .map_err(|err| err.to_string())?;

    Ok(TestDatabase {
        pool,
        runtime,
        url,
        _cluster: cluster,
    })
}
