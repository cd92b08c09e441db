//! Raw SQL seeding for rows no repository under test creates.

use postgres::Client;

use super::format_postgres_error;

pub fn insert_client(client: &mut Client, nom_societe: &str) -> i32 {
    client
        .query_one(
            "INSERT INTO client (nom_societe) VALUES ($1) RETURNING id",
            &[&nom_societe],
        )
        .unwrap_or_else(|err| panic!("seed client: {}", format_postgres_error(&err)))
        .get(0)
}

pub fn insert_agent(client: &mut Client, matricule: &str) {
    client
        .execute(
            "INSERT INTO agent (matricule, nom) VALUES ($1, $2)",
            &[&matricule, &format!("Agent {matricule}")],
        )
        .unwrap_or_else(|err| panic!("seed agent: {}", format_postgres_error(&err)));
}

pub fn insert_travaux(client: &mut Client, titre: &str) -> i32 {
    client
        .query_one(
            "INSERT INTO travaux (titre) VALUES ($1) RETURNING id",
            &[&titre],
        )
        .unwrap_or_else(|err| panic!("seed travaux: {}", format_postgres_error(&err)))
        .get(0)
}

/// Run a `SELECT count(*) ... WHERE <column> = $1` style query.
pub fn count(client: &mut Client, sql: &str, id: i32) -> i64 {
    client
        .query_one(sql, &[&id])
        .unwrap_or_else(|err| panic!("count rows: {}", format_postgres_error(&err)))
        .get(0)
}
