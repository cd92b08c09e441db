//! PostgreSQL-backed `TicketRepository`.

use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use diesel::sql_types::Int4;
use diesel::upsert::excluded;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, RunQueryDsl};

use crate::domain::ports::{PersistenceError, TicketRepository};
use crate::domain::{
    AgentAssignment, DocumentMeta, ImageMeta, NewAgentAssignment, NewResponsableChange,
    NewTicket, Responsable, ResponsableChange, ResponsableRole, Satisfaction, Ticket,
    TicketFilter, TicketPatch, TicketUpdate,
};
use crate::query_optional;

use super::diesel_helpers::{AllowedRow, convert_rows, map_diesel_error, map_pool_error};
use super::models::{
    AgentAssignmentRow, DocumentRow, ImageMetaRow, NewResponsableChangeRow, NewTicketRow,
    ResponsableChangeRow, ResponsableRow, SatisfactionRow, TicketRow, TicketUpdateRow,
};
use super::pool::DbPool;
use super::schema::{
    document_repertoire, image, ticket, ticket_agent, ticket_image, ticket_responsable,
    ticket_responsable_history, ticket_satisfaction,
};

const CLIENT_USER_SQL: &str = "\
    SELECT EXISTS ( \
        SELECT 1 FROM ticket t \
        LEFT JOIN demande_client d ON d.id = t.demande_id \
        LEFT JOIN site s ON s.id = t.site_id \
        JOIN client c ON c.id = COALESCE(d.client_id, s.client_id) \
        WHERE t.id = $1 AND c.user_id = $2 \
    ) AS allowed";

/// Tickets, their responsables, agents and satisfaction.
#[derive(Clone)]
pub struct DieselTicketRepository {
    pool: DbPool,
}

impl DieselTicketRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

macro_rules! responsable_columns {
    () => {
        (
            ticket_responsable::id,
            ticket_responsable::ticket_id,
            ticket_responsable::matricule,
            ticket_responsable::role,
            ticket_responsable::created_at,
        )
    };
}

macro_rules! agent_columns {
    () => {
        (
            ticket_agent::id,
            ticket_agent::ticket_id,
            ticket_agent::matricule,
            ticket_agent::date_debut,
            ticket_agent::date_fin,
        )
    };
}

#[async_trait]
impl TicketRepository for DieselTicketRepository {
    async fn list(&self, filter: &TicketFilter) -> Result<Vec<Ticket>, PersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let mut query = ticket::table.select(TicketRow::as_select()).into_boxed();
        if let Some(etat) = filter.etat {
            query = query.filter(ticket::etat.eq(etat.as_str()));
        }
        if let Some(site_id) = filter.site_id {
            query = query.filter(ticket::site_id.eq(site_id));
        }
        if let Some(affaire_id) = filter.affaire_id {
            query = query.filter(ticket::affaire_id.eq(affaire_id));
        }
        if let Some(doe_id) = filter.doe_id {
            query = query.filter(ticket::doe_id.eq(doe_id));
        }
        if let Some(responsable) = filter.responsable.as_deref() {
            query = query.filter(ticket::responsable.eq(responsable));
        }
        if let Some(demande_id) = filter.demande_id {
            query = query.filter(ticket::demande_id.eq(demande_id));
        }
        let rows: Vec<TicketRow> = query
            .order_by((ticket::created_at.desc(), ticket::id.desc()))
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        convert_rows(rows)
    }

    async fn find(&self, id: i32) -> Result<Option<Ticket>, PersistenceError> {
        query_optional!(self, ticket::table, ticket::id.eq(id), TicketRow, Ticket::try_from)
    }

    async fn create(&self, new_ticket: &NewTicket) -> Result<Ticket, PersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: TicketRow = diesel::insert_into(ticket::table)
            .values(NewTicketRow::from(new_ticket))
            .returning(TicketRow::as_returning())
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ticket::try_from(row)
    }

    async fn update(
        &self,
        id: i32,
        patch: &TicketPatch,
    ) -> Result<Option<TicketUpdate>, PersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows = conn
            .transaction(|conn| {
                async move {
                    let previous: Option<TicketRow> = ticket::table
                        .find(id)
                        .select(TicketRow::as_select())
                        .for_update()
                        .first(conn)
                        .await
                        .optional()?;
                    let Some(previous) = previous else {
                        return Ok(None);
                    };
                    if patch.is_empty() {
                        let current = previous.clone();
                        return Ok(Some((previous, current)));
                    }
                    let current: TicketRow = diesel::update(ticket::table.find(id))
                        .set(TicketUpdateRow::from(patch))
                        .returning(TicketRow::as_returning())
                        .get_result(conn)
                        .await?;
                    Ok(Some((previous, current)))
                }
                .scope_boxed()
            })
            .await
            .map_err(map_diesel_error)?;

        rows.map(|(previous, current)| {
            Ok(TicketUpdate {
                previous: Ticket::try_from(previous)?,
                current: Ticket::try_from(current)?,
            })
        })
        .transpose()
    }

    async fn delete(&self, id: i32) -> Result<bool, PersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let deleted = diesel::delete(ticket::table.find(id))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(deleted > 0)
    }

    async fn claim_primary(
        &self,
        id: i32,
        matricule: &str,
    ) -> Result<Option<Ticket>, PersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<TicketRow> = diesel::update(
            ticket::table
                .filter(ticket::id.eq(id))
                .filter(ticket::responsable.is_null()),
        )
        .set(ticket::responsable.eq(matricule))
        .returning(TicketRow::as_returning())
        .get_result(&mut conn)
        .await
        .optional()
        .map_err(map_diesel_error)?;
        row.map(Ticket::try_from).transpose()
    }

    async fn record_responsable_change(
        &self,
        change: &NewResponsableChange,
    ) -> Result<(), PersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::insert_into(ticket_responsable_history::table)
            .values(NewResponsableChangeRow {
                ticket_id: change.ticket_id,
                old_matricule: change.old_matricule.as_deref(),
                new_matricule: change.new_matricule.as_deref(),
                changed_by: change.changed_by.as_deref(),
            })
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_diesel_error)
    }

    async fn responsable_history(
        &self,
        id: i32,
    ) -> Result<Vec<ResponsableChange>, PersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<ResponsableChangeRow> = ticket_responsable_history::table
            .filter(ticket_responsable_history::ticket_id.eq(id))
            .select(ResponsableChangeRow::as_select())
            .order_by((
                ticket_responsable_history::changed_at.desc(),
                ticket_responsable_history::id.desc(),
            ))
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(rows.into_iter().map(ResponsableChange::from).collect())
    }

    async fn list_responsables(&self, id: i32) -> Result<Vec<Responsable>, PersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<ResponsableRow> = ticket_responsable::table
            .filter(ticket_responsable::ticket_id.eq(id))
            .select(responsable_columns!())
            .order_by(ticket_responsable::created_at.asc())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        convert_rows(rows)
    }

    async fn add_responsable(
        &self,
        id: i32,
        matricule: &str,
        role: ResponsableRole,
    ) -> Result<Responsable, PersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: ResponsableRow = diesel::insert_into(ticket_responsable::table)
            .values((
                ticket_responsable::ticket_id.eq(id),
                ticket_responsable::matricule.eq(matricule),
                ticket_responsable::role.eq(role.as_str()),
            ))
            .on_conflict((ticket_responsable::ticket_id, ticket_responsable::matricule))
            .do_update()
            .set(ticket_responsable::role.eq(excluded(ticket_responsable::role)))
            .returning(responsable_columns!())
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Responsable::try_from(row)
    }

    async fn remove_responsable(
        &self,
        id: i32,
        matricule: &str,
    ) -> Result<bool, PersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let deleted = diesel::delete(
            ticket_responsable::table
                .filter(ticket_responsable::ticket_id.eq(id))
                .filter(ticket_responsable::matricule.eq(matricule)),
        )
        .execute(&mut conn)
        .await
        .map_err(map_diesel_error)?;
        Ok(deleted > 0)
    }

    async fn list_agents(&self, id: i32) -> Result<Vec<AgentAssignment>, PersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<AgentAssignmentRow> = ticket_agent::table
            .filter(ticket_agent::ticket_id.eq(id))
            .select(agent_columns!())
            .order_by(ticket_agent::id.asc())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(rows.into_iter().map(AgentAssignment::from).collect())
    }

    async fn add_agent(
        &self,
        assignment: &NewAgentAssignment,
    ) -> Result<AgentAssignment, PersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: AgentAssignmentRow = diesel::insert_into(ticket_agent::table)
            .values((
                ticket_agent::ticket_id.eq(assignment.parent_id),
                ticket_agent::matricule.eq(&assignment.matricule),
                ticket_agent::date_debut.eq(assignment.date_debut),
                ticket_agent::date_fin.eq(assignment.date_fin),
            ))
            .on_conflict((ticket_agent::ticket_id, ticket_agent::matricule))
            .do_update()
            .set((
                ticket_agent::date_debut.eq(excluded(ticket_agent::date_debut)),
                ticket_agent::date_fin.eq(excluded(ticket_agent::date_fin)),
            ))
            .returning(agent_columns!())
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(AgentAssignment::from(row))
    }

    async fn remove_agent(&self, id: i32, matricule: &str) -> Result<bool, PersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let deleted = diesel::delete(
            ticket_agent::table
                .filter(ticket_agent::ticket_id.eq(id))
                .filter(ticket_agent::matricule.eq(matricule)),
        )
        .execute(&mut conn)
        .await
        .map_err(map_diesel_error)?;
        Ok(deleted > 0)
    }

    async fn find_satisfaction(&self, id: i32) -> Result<Option<Satisfaction>, PersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<SatisfactionRow> = ticket_satisfaction::table
            .filter(ticket_satisfaction::ticket_id.eq(id))
            .select((
                ticket_satisfaction::rating,
                ticket_satisfaction::commentaire,
                ticket_satisfaction::updated_at,
            ))
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        Ok(row.map(Satisfaction::from))
    }

    async fn upsert_satisfaction(
        &self,
        id: i32,
        rating: i16,
        commentaire: Option<String>,
    ) -> Result<Satisfaction, PersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let now = Utc::now();
        let row: SatisfactionRow = diesel::insert_into(ticket_satisfaction::table)
            .values((
                ticket_satisfaction::ticket_id.eq(id),
                ticket_satisfaction::rating.eq(rating),
                ticket_satisfaction::commentaire.eq(commentaire.as_deref()),
                ticket_satisfaction::updated_at.eq(now),
            ))
            .on_conflict(ticket_satisfaction::ticket_id)
            .do_update()
            .set((
                ticket_satisfaction::rating.eq(excluded(ticket_satisfaction::rating)),
                ticket_satisfaction::commentaire.eq(excluded(ticket_satisfaction::commentaire)),
                ticket_satisfaction::updated_at.eq(now),
            ))
            .returning((
                ticket_satisfaction::rating,
                ticket_satisfaction::commentaire,
                ticket_satisfaction::updated_at,
            ))
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(Satisfaction::from(row))
    }

    async fn is_client_user(&self, id: i32, user_id: i32) -> Result<bool, PersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: AllowedRow = diesel::sql_query(CLIENT_USER_SQL)
            .bind::<Int4, _>(id)
            .bind::<Int4, _>(user_id)
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(row.allowed)
    }

    async fn documents(&self, id: i32) -> Result<Vec<DocumentMeta>, PersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<DocumentRow> = document_repertoire::table
            .filter(document_repertoire::ticket_id.eq(id))
            .select(DocumentRow::as_select())
            .order_by(document_repertoire::created_at.asc())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(rows.into_iter().map(DocumentMeta::from).collect())
    }

    async fn images(&self, id: i32) -> Result<Vec<ImageMeta>, PersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<ImageMetaRow> = ticket_image::table
            .inner_join(image::table)
            .filter(ticket_image::ticket_id.eq(id))
            .select(ImageMetaRow::as_select())
            .order_by(image::id.asc())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(rows.into_iter().map(ImageMeta::from).collect())
    }
}
