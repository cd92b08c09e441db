//! PostgreSQL-backed `ClientRepository`.
//!
//! Deletion and conversion lock the demande row with `SELECT ... FOR UPDATE`
//! so concurrent requests observe each other's writes.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::dsl::exists;
use diesel::prelude::*;
use diesel::sql_types::{Int4, Jsonb, Nullable, Text, Timestamptz, Varchar};
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, AsyncPgConnection, RunQueryDsl};
use serde_json::Value;

use crate::domain::ports::{ClientRepository, PersistenceError};
use crate::domain::{
    AuditEntry, Client, ConversionOutcome, ConversionResult, DeletedDemande, Demande,
    DemandeFilter, DemandePatch, DemandeStatus, NewClientAccount, NewDemande, NewSite, NewTicket,
    RegistrationOutcome, ResponsableRole, Site, SitePatch, SoftDeleteOutcome, Ticket,
};
use crate::query_optional;

use super::diesel_audit_log::append_audit;
use super::diesel_helpers::{convert_rows, lower, map_diesel_error, map_pool_error};
use super::models::{
    ClientRow, DemandeRow, DemandeStatusUpdate, DemandeUpdate, NewClientRow, NewDemandeRow,
    NewSiteRow, NewUserRow, SiteRow, SiteUpdate, TicketRow,
};
use super::pool::DbPool;
use super::schema::{client, demande_client, site, ticket, ticket_agent, ticket_responsable, users};

const ACCESSIBLE_CLIENTS_SQL: &str = "\
    SELECT c.id FROM client c \
    WHERE c.user_id = $1 OR lower(c.representant_email) = lower($2) \
    UNION \
    SELECT cr.client_id AS id FROM client_representant cr WHERE cr.user_id = $1 \
    ORDER BY id";

const DELETED_DEMANDES_SQL: &str = "\
    SELECT d.*, a.actor_email AS deleted_by, a.created_at AS deleted_at, a.details \
    FROM demande_client d \
    LEFT JOIN LATERAL ( \
        SELECT l.actor_email, l.created_at, l.details FROM audit_log l \
        WHERE l.entity_type = 'demande_client' \
          AND l.action = 'DELETE' \
          AND l.entity_id = d.id::text \
        ORDER BY l.created_at DESC \
        LIMIT 1 \
    ) a ON TRUE \
    WHERE d.status = $1 \
    ORDER BY d.updated_at DESC";

#[derive(QueryableByName)]
struct ClientIdRow {
    #[diesel(sql_type = Int4)]
    id: i32,
}

#[derive(QueryableByName)]
struct DeletedDemandeRow {
    #[diesel(embed)]
    demande: DemandeRow,
    #[diesel(sql_type = Nullable<Varchar>)]
    deleted_by: Option<String>,
    #[diesel(sql_type = Nullable<Timestamptz>)]
    deleted_at: Option<DateTime<Utc>>,
    #[diesel(sql_type = Nullable<Jsonb>)]
    details: Option<Value>,
}

/// Row-level outcome of the soft-delete transaction.
enum LockedDelete {
    Deleted(DemandeRow),
    NotFound,
    Converted(i32),
    AlreadyDeleted,
}

/// Row-level outcome of the conversion transaction.
enum LockedConversion {
    Converted(DemandeRow, TicketRow),
    NotFound,
    AlreadyConverted(i32),
    Deleted,
}

/// Clients, sites and demandes.
#[derive(Clone)]
pub struct DieselClientRepository {
    pool: DbPool,
}

impl DieselClientRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

async fn lock_demande(
    conn: &mut AsyncPgConnection,
    id: i32,
) -> QueryResult<Option<DemandeRow>> {
    demande_client::table
        .find(id)
        .select(DemandeRow::as_select())
        .for_update()
        .first(conn)
        .await
        .optional()
}

#[async_trait]
impl ClientRepository for DieselClientRepository {
    async fn register_client(
        &self,
        account: &NewClientAccount,
    ) -> Result<RegistrationOutcome, PersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let lowered = account.email.to_lowercase();
        let result = conn
            .transaction(|conn| {
                async move {
                    let taken: bool = diesel::select(exists(
                        users::table.filter(lower(users::email).eq(&lowered)),
                    ))
                    .get_result(conn)
                    .await?;
                    if taken {
                        return Ok(None);
                    }
                    let user_id: i32 = diesel::insert_into(users::table)
                        .values(NewUserRow {
                            email: &account.email,
                            password_hash: &account.password_hash,
                            roles: &account.roles,
                        })
                        .returning(users::id)
                        .get_result(conn)
                        .await?;
                    let row: ClientRow = diesel::insert_into(client::table)
                        .values(NewClientRow {
                            nom_societe: &account.nom_societe,
                            representant_nom: account.representant_nom.as_deref(),
                            representant_email: Some(&account.email),
                            representant_tel: account.representant_tel.as_deref(),
                            adresse_id: account.adresse_id,
                            commentaire: account.commentaire.as_deref(),
                            user_id: Some(user_id),
                        })
                        .returning(ClientRow::as_returning())
                        .get_result(conn)
                        .await?;
                    Ok(Some(row))
                }
                .scope_boxed()
            })
            .await
            .map_err(map_diesel_error);

        match result {
            Ok(Some(row)) => Ok(RegistrationOutcome::Registered(Client::from(row))),
            Ok(None) | Err(PersistenceError::Duplicate { .. }) => {
                Ok(RegistrationOutcome::EmailTaken)
            }
            Err(err) => Err(err),
        }
    }

    async fn list_clients(&self) -> Result<Vec<Client>, PersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<ClientRow> = client::table
            .select(ClientRow::as_select())
            .order_by(client::nom_societe.asc())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(rows.into_iter().map(Client::from).collect())
    }

    async fn find_client(&self, id: i32) -> Result<Option<Client>, PersistenceError> {
        query_optional!(self, client::table, client::id.eq(id), ClientRow, |row| Ok(
            Client::from(row)
        ))
    }

    async fn accessible_client_ids(
        &self,
        user_id: i32,
        email: &str,
    ) -> Result<Vec<i32>, PersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<ClientIdRow> = diesel::sql_query(ACCESSIBLE_CLIENTS_SQL)
            .bind::<Int4, _>(user_id)
            .bind::<Text, _>(email.trim())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(rows.into_iter().map(|row| row.id).collect())
    }

    async fn list_sites(
        &self,
        client_ids: Option<Vec<i32>>,
    ) -> Result<Vec<Site>, PersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let mut query = site::table.select(SiteRow::as_select()).into_boxed();
        if let Some(ids) = client_ids {
            query = query.filter(site::client_id.eq_any(ids));
        }
        let rows: Vec<SiteRow> = query
            .order_by(site::nom.asc())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(rows.into_iter().map(Site::from).collect())
    }

    async fn find_site(&self, id: i32) -> Result<Option<Site>, PersistenceError> {
        query_optional!(self, site::table, site::id.eq(id), SiteRow, |row| Ok(Site::from(row)))
    }

    async fn create_site(&self, new_site: &NewSite) -> Result<Site, PersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: SiteRow = diesel::insert_into(site::table)
            .values(NewSiteRow {
                client_id: new_site.client_id,
                nom: &new_site.nom,
                commentaire: new_site.commentaire.as_deref(),
            })
            .returning(SiteRow::as_returning())
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(Site::from(row))
    }

    async fn update_site(
        &self,
        id: i32,
        patch: &SitePatch,
    ) -> Result<Option<Site>, PersistenceError> {
        if patch.nom.is_none() && patch.commentaire.is_none() {
            return self.find_site(id).await;
        }
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<SiteRow> = diesel::update(site::table.find(id))
            .set(SiteUpdate {
                nom: patch.nom.as_deref(),
                commentaire: patch.commentaire.as_deref(),
            })
            .returning(SiteRow::as_returning())
            .get_result(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        Ok(row.map(Site::from))
    }

    async fn delete_site(&self, id: i32) -> Result<bool, PersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let deleted = diesel::delete(site::table.find(id))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(deleted > 0)
    }

    async fn list_demandes(&self, filter: &DemandeFilter) -> Result<Vec<Demande>, PersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let mut query = demande_client::table
            .select(DemandeRow::as_select())
            .into_boxed();
        if let Some(ids) = &filter.client_ids {
            query = query.filter(demande_client::client_id.eq_any(ids.clone()));
        }
        query = match filter.status {
            Some(status) => query.filter(demande_client::status.eq(status.as_str())),
            None => query.filter(demande_client::status.ne(DemandeStatus::Supprimee.as_str())),
        };
        if let Some(client_id) = filter.client_id {
            query = query.filter(demande_client::client_id.eq(client_id));
        }
        if let Some(site_id) = filter.site_id {
            query = query.filter(demande_client::site_id.eq(site_id));
        }
        let rows: Vec<DemandeRow> = query
            .order_by(demande_client::created_at.desc())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        convert_rows(rows)
    }

    async fn find_demande(&self, id: i32) -> Result<Option<Demande>, PersistenceError> {
        query_optional!(
            self,
            demande_client::table,
            demande_client::id.eq(id),
            DemandeRow,
            Demande::try_from
        )
    }

    async fn create_demande(&self, demande: &NewDemande) -> Result<Demande, PersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: DemandeRow = diesel::insert_into(demande_client::table)
            .values(NewDemandeRow {
                client_id: demande.client_id,
                site_id: demande.site_id,
                titre: &demande.titre,
                description: &demande.description,
                status: demande.status.as_str(),
            })
            .returning(DemandeRow::as_returning())
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Demande::try_from(row)
    }

    async fn update_demande(
        &self,
        id: i32,
        patch: &DemandePatch,
    ) -> Result<Option<Demande>, PersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<DemandeRow> = diesel::update(
            demande_client::table
                .filter(demande_client::id.eq(id))
                .filter(demande_client::ticket_id.is_null())
                .filter(demande_client::status.ne(DemandeStatus::Supprimee.as_str())),
        )
        .set(DemandeUpdate {
            site_id: patch.site_id,
            titre: patch.titre.as_deref(),
            description: patch.description.as_deref(),
            updated_at: Utc::now(),
        })
        .returning(DemandeRow::as_returning())
        .get_result(&mut conn)
        .await
        .optional()
        .map_err(map_diesel_error)?;
        row.map(Demande::try_from).transpose()
    }

    async fn set_demande_status(
        &self,
        id: i32,
        status: DemandeStatus,
        commentaire: Option<String>,
    ) -> Result<Option<Demande>, PersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<DemandeRow> = diesel::update(demande_client::table.find(id))
            .set(DemandeStatusUpdate {
                status: status.as_str(),
                commentaire: commentaire.as_deref(),
                updated_at: Utc::now(),
            })
            .returning(DemandeRow::as_returning())
            .get_result(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        row.map(Demande::try_from).transpose()
    }

    async fn soft_delete_demande(
        &self,
        id: i32,
        justification: &str,
        audit: &AuditEntry,
    ) -> Result<SoftDeleteOutcome, PersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let locked = conn
            .transaction(|conn| {
                async move {
                    let Some(row) = lock_demande(conn, id).await? else {
                        return Ok(LockedDelete::NotFound);
                    };
                    if let Some(ticket_id) = row.ticket_id {
                        return Ok(LockedDelete::Converted(ticket_id));
                    }
                    if row.status == DemandeStatus::Supprimee.as_str() {
                        return Ok(LockedDelete::AlreadyDeleted);
                    }
                    append_audit(conn, audit).await?;
                    let updated: DemandeRow = diesel::update(demande_client::table.find(id))
                        .set(DemandeStatusUpdate {
                            status: DemandeStatus::Supprimee.as_str(),
                            commentaire: Some(justification),
                            updated_at: Utc::now(),
                        })
                        .returning(DemandeRow::as_returning())
                        .get_result(conn)
                        .await?;
                    Ok(LockedDelete::Deleted(updated))
                }
                .scope_boxed()
            })
            .await
            .map_err(map_diesel_error)?;

        Ok(match locked {
            LockedDelete::Deleted(row) => SoftDeleteOutcome::Deleted(Demande::try_from(row)?),
            LockedDelete::NotFound => SoftDeleteOutcome::NotFound,
            LockedDelete::Converted(ticket_id) => SoftDeleteOutcome::Converted { ticket_id },
            LockedDelete::AlreadyDeleted => SoftDeleteOutcome::AlreadyDeleted,
        })
    }

    async fn restore_demande(&self, id: i32) -> Result<Option<Demande>, PersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<DemandeRow> = diesel::update(
            demande_client::table
                .find(id)
                .filter(demande_client::status.eq(DemandeStatus::Supprimee.as_str())),
        )
        .set((
            demande_client::status.eq(DemandeStatus::EnCours.as_str()),
            demande_client::commentaire.eq(None::<String>),
            demande_client::updated_at.eq(Utc::now()),
        ))
        .returning(DemandeRow::as_returning())
        .get_result(&mut conn)
        .await
        .optional()
        .map_err(map_diesel_error)?;
        row.map(Demande::try_from).transpose()
    }

    async fn list_deleted_demandes(&self) -> Result<Vec<DeletedDemande>, PersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<DeletedDemandeRow> = diesel::sql_query(DELETED_DEMANDES_SQL)
            .bind::<Text, _>(DemandeStatus::Supprimee.as_str())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        rows.into_iter()
            .map(|row| {
                let demande = Demande::try_from(row.demande)?;
                Ok(DeletedDemande::from_audit(
                    demande,
                    row.deleted_by,
                    row.deleted_at,
                    row.details.as_ref(),
                ))
            })
            .collect()
    }

    async fn convert_demande(
        &self,
        id: i32,
        new_ticket: &NewTicket,
    ) -> Result<ConversionOutcome, PersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let locked = conn
            .transaction(|conn| {
                async move {
                    let Some(row) = lock_demande(conn, id).await? else {
                        return Ok(LockedConversion::NotFound);
                    };
                    if let Some(ticket_id) = row.ticket_id {
                        return Ok(LockedConversion::AlreadyConverted(ticket_id));
                    }
                    if row.status == DemandeStatus::Supprimee.as_str() {
                        return Ok(LockedConversion::Deleted);
                    }
                    let ticket_row: TicketRow = diesel::insert_into(ticket::table)
                        .values(super::models::NewTicketRow::from(new_ticket))
                        .returning(TicketRow::as_returning())
                        .get_result(conn)
                        .await?;
                    if let Some(matricule) = new_ticket.responsable.as_deref() {
                        diesel::insert_into(ticket_responsable::table)
                            .values((
                                ticket_responsable::ticket_id.eq(ticket_row.id),
                                ticket_responsable::matricule.eq(matricule),
                                ticket_responsable::role.eq(ResponsableRole::Primaire.as_str()),
                            ))
                            .on_conflict((ticket_responsable::ticket_id, ticket_responsable::matricule))
                            .do_update()
                            .set(ticket_responsable::role.eq(ResponsableRole::Primaire.as_str()))
                            .execute(conn)
                            .await?;
                        diesel::insert_into(ticket_agent::table)
                            .values((
                                ticket_agent::ticket_id.eq(ticket_row.id),
                                ticket_agent::matricule.eq(matricule),
                            ))
                            .on_conflict((ticket_agent::ticket_id, ticket_agent::matricule))
                            .do_nothing()
                            .execute(conn)
                            .await?;
                    }
                    let demande_row: DemandeRow = diesel::update(demande_client::table.find(id))
                        .set((
                            demande_client::ticket_id.eq(ticket_row.id),
                            demande_client::status.eq(DemandeStatus::Traitee.as_str()),
                            demande_client::updated_at.eq(Utc::now()),
                        ))
                        .returning(DemandeRow::as_returning())
                        .get_result(conn)
                        .await?;
                    Ok(LockedConversion::Converted(demande_row, ticket_row))
                }
                .scope_boxed()
            })
            .await
            .map_err(map_diesel_error)?;

        Ok(match locked {
            LockedConversion::Converted(demande_row, ticket_row) => {
                ConversionOutcome::Converted(ConversionResult {
                    demande: Demande::try_from(demande_row)?,
                    ticket: Ticket::try_from(ticket_row)?,
                })
            }
            LockedConversion::NotFound => ConversionOutcome::NotFound,
            LockedConversion::AlreadyConverted(ticket_id) => {
                ConversionOutcome::AlreadyConverted { ticket_id }
            }
            LockedConversion::Deleted => ConversionOutcome::Deleted,
        })
    }
}
