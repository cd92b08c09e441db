//! PostgreSQL-backed `InterventionRepository` and `InterventionEventSync`.

use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use diesel::sql_types::{Array, Nullable, Text};
use diesel::upsert::excluded;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, RunQueryDsl};

use crate::domain::ports::{InterventionEventSync, InterventionRepository, PersistenceError};
use crate::domain::{
    CalendarEntry, Intervention, InterventionEvent, InterventionEventStatus, InterventionFilter,
    InterventionInput, MaterielSource, MaterielUsage, NewIntervention,
};
use crate::query_optional;

use super::diesel_helpers::{convert_rows, map_diesel_error, map_pool_error};
use super::models::{
    CalendarRow, InterventionEventRow, InterventionRow, InterventionUpdate, MaterielUsageRow,
    NewInterventionEventRow, NewInterventionRow,
};
use super::pool::DbPool;
use super::schema::{
    demande_materiel, gestion_demande_materiel, intervention, intervention_event,
    intervention_materiel, materiel, ticket, ticket_agent,
};

const CALENDAR_SQL: &str = "\
    SELECT i.id, i.titre, i.date_debut, i.date_fin, i.status, \
           t.id AS ticket_id, t.titre AS ticket_titre, \
           a.matricule AS agent_matricule, a.nom AS agent_nom, \
           s.id AS site_id, s.nom AS site_nom \
    FROM intervention i \
    JOIN ticket t ON t.id = i.ticket_id \
    LEFT JOIN agent a ON a.matricule = t.responsable \
    LEFT JOIN site s ON s.id = COALESCE(i.site_id, t.site_id) \
    WHERE $1::text[] IS NULL OR t.responsable = ANY($1) \
    ORDER BY i.date_debut ASC NULLS LAST, i.id ASC";

/// Interventions, their equipment and calendar projection.
#[derive(Clone)]
pub struct DieselInterventionRepository {
    pool: DbPool,
}

impl DieselInterventionRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl InterventionRepository for DieselInterventionRepository {
    async fn list(
        &self,
        filter: &InterventionFilter,
    ) -> Result<Vec<Intervention>, PersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let mut query = intervention::table
            .select(InterventionRow::as_select())
            .into_boxed();
        if let Some(ticket_id) = filter.ticket_id {
            query = query.filter(intervention::ticket_id.eq(ticket_id));
        }
        if let Some(status) = filter.status {
            query = query.filter(intervention::status.eq(status.as_str()));
        }
        if let Some(site_id) = filter.site_id {
            query = query.filter(intervention::site_id.eq(site_id));
        }
        let rows: Vec<InterventionRow> = query
            .order_by((intervention::date_debut.desc().nulls_last(), intervention::id.desc()))
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        convert_rows(rows)
    }

    async fn find(&self, id: i32) -> Result<Option<Intervention>, PersistenceError> {
        query_optional!(
            self,
            intervention::table,
            intervention::id.eq(id),
            InterventionRow,
            Intervention::try_from
        )
    }

    async fn create(
        &self,
        new_intervention: &NewIntervention,
    ) -> Result<Intervention, PersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: InterventionRow = diesel::insert_into(intervention::table)
            .values(NewInterventionRow::from(new_intervention))
            .returning(InterventionRow::as_returning())
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Intervention::try_from(row)
    }

    async fn replace(
        &self,
        id: i32,
        replacement: &NewIntervention,
    ) -> Result<Option<Intervention>, PersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<InterventionRow> = diesel::update(intervention::table.find(id))
            .set(NewInterventionRow::from(replacement))
            .returning(InterventionRow::as_returning())
            .get_result(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        row.map(Intervention::try_from).transpose()
    }

    async fn patch(
        &self,
        id: i32,
        patch: &InterventionInput,
    ) -> Result<Option<Intervention>, PersistenceError> {
        if patch == &InterventionInput::default() {
            return self.find(id).await;
        }
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<InterventionRow> = diesel::update(intervention::table.find(id))
            .set(InterventionUpdate::from(patch))
            .returning(InterventionRow::as_returning())
            .get_result(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        row.map(Intervention::try_from).transpose()
    }

    async fn delete(&self, id: i32) -> Result<bool, PersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let deleted = diesel::delete(intervention::table.find(id))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(deleted > 0)
    }

    async fn calendar(
        &self,
        matricules: Option<Vec<String>>,
    ) -> Result<Vec<CalendarEntry>, PersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<CalendarRow> = diesel::sql_query(CALENDAR_SQL)
            .bind::<Nullable<Array<Text>>, _>(matricules)
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(rows.into_iter().map(CalendarEntry::from).collect())
    }

    async fn events(&self, id: i32) -> Result<Vec<InterventionEvent>, PersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<InterventionEventRow> = intervention_event::table
            .filter(intervention_event::intervention_id.eq(id))
            .select(InterventionEventRow::as_select())
            .order_by(intervention_event::agent_matricule.asc())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        convert_rows(rows)
    }

    async fn direct_materiels(&self, id: i32) -> Result<Vec<MaterielUsage>, PersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<MaterielUsageRow> = intervention_materiel::table
            .inner_join(materiel::table)
            .filter(intervention_materiel::intervention_id.eq(id))
            .select((
                materiel::id,
                materiel::nom,
                materiel::reference,
                intervention_materiel::quantite,
            ))
            .order_by(intervention_materiel::id.asc())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(rows
            .into_iter()
            .map(|row| row.into_usage(MaterielSource::Direct))
            .collect())
    }

    async fn requested_materiels(
        &self,
        id: i32,
        ticket_id: i32,
    ) -> Result<Vec<MaterielUsage>, PersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<MaterielUsageRow> = gestion_demande_materiel::table
            .inner_join(materiel::table)
            .inner_join(demande_materiel::table)
            .filter(
                demande_materiel::intervention_id
                    .eq(id)
                    .or(demande_materiel::ticket_id.eq(ticket_id)),
            )
            .select((
                materiel::id,
                materiel::nom,
                materiel::reference,
                gestion_demande_materiel::quantite,
            ))
            .order_by(gestion_demande_materiel::id.asc())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(rows
            .into_iter()
            .map(|row| row.into_usage(MaterielSource::Demande))
            .collect())
    }
}

/// Rewrites `intervention_event` rows from the parent ticket's agents.
#[derive(Clone)]
pub struct DieselInterventionEventSync {
    pool: DbPool,
}

impl DieselInterventionEventSync {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl InterventionEventSync for DieselInterventionEventSync {
    async fn sync(&self, target: &Intervention) -> Result<usize, PersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let status = InterventionEventStatus::from_intervention_text(target.status.as_str());
        conn.transaction(|conn| {
            async move {
                let mut matricules: Vec<String> = ticket_agent::table
                    .filter(ticket_agent::ticket_id.eq(target.ticket_id))
                    .select(ticket_agent::matricule)
                    .order_by(ticket_agent::id.asc())
                    .load(conn)
                    .await?;
                if matricules.is_empty() {
                    let responsable: Option<Option<String>> = ticket::table
                        .find(target.ticket_id)
                        .select(ticket::responsable)
                        .first(conn)
                        .await
                        .optional()?;
                    matricules.extend(responsable.flatten());
                }
                if matricules.is_empty() {
                    return Ok(0);
                }
                let now = Utc::now();
                let rows: Vec<NewInterventionEventRow<'_>> = matricules
                    .iter()
                    .map(|matricule| NewInterventionEventRow {
                        intervention_id: target.id,
                        agent_matricule: matricule,
                        titre: &target.titre,
                        status: status.as_str(),
                        date_debut: target.date_debut,
                        date_fin: target.date_fin,
                        updated_at: now,
                    })
                    .collect();
                diesel::insert_into(intervention_event::table)
                    .values(&rows)
                    .on_conflict((
                        intervention_event::intervention_id,
                        intervention_event::agent_matricule,
                    ))
                    .do_update()
                    .set((
                        intervention_event::titre.eq(excluded(intervention_event::titre)),
                        intervention_event::status.eq(excluded(intervention_event::status)),
                        intervention_event::date_debut.eq(excluded(intervention_event::date_debut)),
                        intervention_event::date_fin.eq(excluded(intervention_event::date_fin)),
                        intervention_event::updated_at.eq(excluded(intervention_event::updated_at)),
                    ))
                    .execute(conn)
                    .await
            }
            .scope_boxed()
        })
        .await
        .map_err(map_diesel_error)
    }
}
