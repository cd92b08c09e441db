//! PostgreSQL-backed `TravauxRepository`.

use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use diesel::sql_types::Int4;
use diesel::upsert::excluded;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, AsyncPgConnection, RunQueryDsl};

use crate::domain::ports::{PersistenceError, TravauxRepository};
use crate::domain::{
    AgentAssignment, Demande, NewAgentAssignment, NewDemande, NewTache, NewTravaux,
    NewTravauxMateriel, Responsable, ResponsableRole, Satisfaction, Tache, TacheInput, Travaux,
    TravauxFilter, TravauxInput, TravauxMateriel, TravauxMaterielPatch,
};
use crate::query_optional;

use super::diesel_helpers::{AllowedRow, convert_rows, map_diesel_error, map_pool_error};
use super::models::{
    AgentAssignmentRow, DemandeRow, NewDemandeRow, NewTacheRow, NewTravauxMaterielRow,
    NewTravauxRow, ResponsableRow, SatisfactionRow, TacheRow, TacheUpdate, TravauxMaterielRow,
    TravauxMaterielUpdate, TravauxRow, TravauxUpdate,
};
use super::pool::DbPool;
use super::schema::{
    demande_client, demande_travaux, travaux, travaux_agent, travaux_materiel,
    travaux_responsable, travaux_satisfaction, travaux_tache,
};

/// Authorization walks `travaux.ticket_id` to the ticket, then to its client.
const CLIENT_USER_SQL: &str = "\
    SELECT EXISTS ( \
        SELECT 1 FROM travaux w \
        JOIN ticket t ON t.id = w.ticket_id \
        LEFT JOIN demande_client d ON d.id = t.demande_id \
        LEFT JOIN site s ON s.id = t.site_id \
        JOIN client c ON c.id = COALESCE(d.client_id, s.client_id) \
        WHERE w.id = $1 AND c.user_id = $2 \
    ) AS allowed";

/// Work orders and their children.
#[derive(Clone)]
pub struct DieselTravauxRepository {
    pool: DbPool,
}

impl DieselTravauxRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

macro_rules! responsable_columns {
    () => {
        (
            travaux_responsable::id,
            travaux_responsable::travaux_id,
            travaux_responsable::matricule,
            travaux_responsable::role,
            travaux_responsable::created_at,
        )
    };
}

macro_rules! agent_columns {
    () => {
        (
            travaux_agent::id,
            travaux_agent::travaux_id,
            travaux_agent::matricule,
            travaux_agent::date_debut,
            travaux_agent::date_fin,
        )
    };
}

macro_rules! satisfaction_columns {
    () => {
        (
            travaux_satisfaction::rating,
            travaux_satisfaction::commentaire,
            travaux_satisfaction::updated_at,
        )
    };
}

/// Record the many-to-many link; an existing link is left as is.
async fn link_demande(
    conn: &mut AsyncPgConnection,
    demande_id: i32,
    travaux_id: i32,
) -> QueryResult<()> {
    diesel::insert_into(demande_travaux::table)
        .values((
            demande_travaux::demande_id.eq(demande_id),
            demande_travaux::travaux_id.eq(travaux_id),
        ))
        .on_conflict_do_nothing()
        .execute(conn)
        .await?;
    Ok(())
}

#[async_trait]
impl TravauxRepository for DieselTravauxRepository {
    async fn list(&self, filter: &TravauxFilter) -> Result<Vec<Travaux>, PersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let mut query = travaux::table.select(TravauxRow::as_select()).into_boxed();
        if let Some(etat) = filter.etat {
            query = query.filter(travaux::etat.eq(etat.as_str()));
        }
        if let Some(priorite) = filter.priorite {
            query = query.filter(travaux::priorite.eq(priorite.as_str()));
        }
        if let Some(site_id) = filter.site_id {
            query = query.filter(travaux::site_id.eq(site_id));
        }
        if let Some(affaire_id) = filter.affaire_id {
            query = query.filter(travaux::affaire_id.eq(affaire_id));
        }
        if let Some(demande_id) = filter.demande_id {
            query = query.filter(travaux::demande_id.eq(demande_id));
        }
        let rows: Vec<TravauxRow> = query
            .order_by((travaux::created_at.desc(), travaux::id.desc()))
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        convert_rows(rows)
    }

    async fn find(&self, id: i32) -> Result<Option<Travaux>, PersistenceError> {
        query_optional!(self, travaux::table, travaux::id.eq(id), TravauxRow, Travaux::try_from)
    }

    async fn create(&self, new_travaux: &NewTravaux) -> Result<Travaux, PersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = conn
            .transaction(|conn| {
                async move {
                    let row: TravauxRow = diesel::insert_into(travaux::table)
                        .values(NewTravauxRow::from(new_travaux))
                        .returning(TravauxRow::as_returning())
                        .get_result(conn)
                        .await?;
                    if let Some(demande_id) = row.demande_id {
                        link_demande(conn, demande_id, row.id).await?;
                    }
                    Ok(row)
                }
                .scope_boxed()
            })
            .await
            .map_err(map_diesel_error)?;
        Travaux::try_from(row)
    }

    async fn update(
        &self,
        id: i32,
        patch: &TravauxInput,
    ) -> Result<Option<Travaux>, PersistenceError> {
        if patch == &TravauxInput::default() {
            return self.find(id).await;
        }
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = conn
            .transaction(|conn| {
                async move {
                    let row: Option<TravauxRow> = diesel::update(travaux::table.find(id))
                        .set(TravauxUpdate::from(patch))
                        .returning(TravauxRow::as_returning())
                        .get_result(conn)
                        .await
                        .optional()?;
                    if let (Some(_), Some(demande_id)) = (&row, patch.demande_id) {
                        link_demande(conn, demande_id, id).await?;
                    }
                    Ok(row)
                }
                .scope_boxed()
            })
            .await
            .map_err(map_diesel_error)?;
        row.map(Travaux::try_from).transpose()
    }

    async fn delete(&self, id: i32) -> Result<bool, PersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let deleted = diesel::delete(travaux::table.find(id))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(deleted > 0)
    }

    async fn link_new_demande(
        &self,
        travaux_id: i32,
        demande: &NewDemande,
    ) -> Result<Demande, PersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = conn
            .transaction(|conn| {
                async move {
                    let row: DemandeRow = diesel::insert_into(demande_client::table)
                        .values(NewDemandeRow {
                            client_id: demande.client_id,
                            site_id: demande.site_id,
                            titre: &demande.titre,
                            description: &demande.description,
                            status: demande.status.as_str(),
                        })
                        .returning(DemandeRow::as_returning())
                        .get_result(conn)
                        .await?;
                    link_demande(conn, row.id, travaux_id).await?;
                    diesel::update(travaux::table.find(travaux_id))
                        .set(travaux::demande_id.eq(row.id))
                        .execute(conn)
                        .await?;
                    Ok(row)
                }
                .scope_boxed()
            })
            .await
            .map_err(map_diesel_error)?;
        Demande::try_from(row)
    }

    async fn linked_demandes(&self, travaux_id: i32) -> Result<Vec<Demande>, PersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<DemandeRow> = demande_travaux::table
            .inner_join(demande_client::table)
            .filter(demande_travaux::travaux_id.eq(travaux_id))
            .select(DemandeRow::as_select())
            .order_by(demande_client::created_at.asc())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        convert_rows(rows)
    }

    async fn list_taches(&self, travaux_id: i32) -> Result<Vec<Tache>, PersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<TacheRow> = travaux_tache::table
            .filter(travaux_tache::travaux_id.eq(travaux_id))
            .select(TacheRow::as_select())
            .order_by(travaux_tache::id.asc())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        convert_rows(rows)
    }

    async fn create_tache(&self, tache: &NewTache) -> Result<Tache, PersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: TacheRow = diesel::insert_into(travaux_tache::table)
            .values(NewTacheRow::from(tache))
            .returning(TacheRow::as_returning())
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Tache::try_from(row)
    }

    async fn update_tache(
        &self,
        travaux_id: i32,
        tache_id: i32,
        patch: &TacheInput,
    ) -> Result<Option<Tache>, PersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let scoped = travaux_tache::table
            .filter(travaux_tache::id.eq(tache_id))
            .filter(travaux_tache::travaux_id.eq(travaux_id));
        let row: Option<TacheRow> = if patch == &TacheInput::default() {
            scoped
                .select(TacheRow::as_select())
                .first(&mut conn)
                .await
                .optional()
                .map_err(map_diesel_error)?
        } else {
            diesel::update(scoped)
                .set(TacheUpdate::from(patch))
                .returning(TacheRow::as_returning())
                .get_result(&mut conn)
                .await
                .optional()
                .map_err(map_diesel_error)?
        };
        row.map(Tache::try_from).transpose()
    }

    async fn delete_tache(
        &self,
        travaux_id: i32,
        tache_id: i32,
    ) -> Result<bool, PersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let deleted = diesel::delete(
            travaux_tache::table
                .filter(travaux_tache::id.eq(tache_id))
                .filter(travaux_tache::travaux_id.eq(travaux_id)),
        )
        .execute(&mut conn)
        .await
        .map_err(map_diesel_error)?;
        Ok(deleted > 0)
    }

    async fn list_materiels(
        &self,
        travaux_id: i32,
    ) -> Result<Vec<TravauxMateriel>, PersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<TravauxMaterielRow> = travaux_materiel::table
            .filter(travaux_materiel::travaux_id.eq(travaux_id))
            .select(TravauxMaterielRow::as_select())
            .order_by(travaux_materiel::id.asc())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(rows.into_iter().map(TravauxMateriel::from).collect())
    }

    async fn add_materiel(
        &self,
        link: &NewTravauxMateriel,
    ) -> Result<TravauxMateriel, PersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: TravauxMaterielRow = diesel::insert_into(travaux_materiel::table)
            .values(NewTravauxMaterielRow::from(link))
            .returning(TravauxMaterielRow::as_returning())
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(TravauxMateriel::from(row))
    }

    async fn update_materiel(
        &self,
        travaux_id: i32,
        link_id: i32,
        patch: &TravauxMaterielPatch,
    ) -> Result<Option<TravauxMateriel>, PersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let scoped = travaux_materiel::table
            .filter(travaux_materiel::id.eq(link_id))
            .filter(travaux_materiel::travaux_id.eq(travaux_id));
        let row: Option<TravauxMaterielRow> = if patch == &TravauxMaterielPatch::default() {
            scoped
                .select(TravauxMaterielRow::as_select())
                .first(&mut conn)
                .await
                .optional()
                .map_err(map_diesel_error)?
        } else {
            diesel::update(scoped)
                .set(TravauxMaterielUpdate::from(patch))
                .returning(TravauxMaterielRow::as_returning())
                .get_result(&mut conn)
                .await
                .optional()
                .map_err(map_diesel_error)?
        };
        Ok(row.map(TravauxMateriel::from))
    }

    async fn delete_materiel(
        &self,
        travaux_id: i32,
        link_id: i32,
    ) -> Result<bool, PersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let deleted = diesel::delete(
            travaux_materiel::table
                .filter(travaux_materiel::id.eq(link_id))
                .filter(travaux_materiel::travaux_id.eq(travaux_id)),
        )
        .execute(&mut conn)
        .await
        .map_err(map_diesel_error)?;
        Ok(deleted > 0)
    }

    async fn list_agents(
        &self,
        travaux_id: i32,
    ) -> Result<Vec<AgentAssignment>, PersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<AgentAssignmentRow> = travaux_agent::table
            .filter(travaux_agent::travaux_id.eq(travaux_id))
            .select(agent_columns!())
            .order_by(travaux_agent::id.asc())
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
        let row: AgentAssignmentRow = diesel::insert_into(travaux_agent::table)
            .values((
                travaux_agent::travaux_id.eq(assignment.parent_id),
                travaux_agent::matricule.eq(&assignment.matricule),
                travaux_agent::date_debut.eq(assignment.date_debut),
                travaux_agent::date_fin.eq(assignment.date_fin),
            ))
            .on_conflict((travaux_agent::travaux_id, travaux_agent::matricule))
            .do_update()
            .set((
                travaux_agent::date_debut.eq(excluded(travaux_agent::date_debut)),
                travaux_agent::date_fin.eq(excluded(travaux_agent::date_fin)),
            ))
            .returning(agent_columns!())
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(AgentAssignment::from(row))
    }

    async fn remove_agent(
        &self,
        travaux_id: i32,
        matricule: &str,
    ) -> Result<bool, PersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let deleted = diesel::delete(
            travaux_agent::table
                .filter(travaux_agent::travaux_id.eq(travaux_id))
                .filter(travaux_agent::matricule.eq(matricule)),
        )
        .execute(&mut conn)
        .await
        .map_err(map_diesel_error)?;
        Ok(deleted > 0)
    }

    async fn list_responsables(
        &self,
        travaux_id: i32,
    ) -> Result<Vec<Responsable>, PersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<ResponsableRow> = travaux_responsable::table
            .filter(travaux_responsable::travaux_id.eq(travaux_id))
            .select(responsable_columns!())
            .order_by(travaux_responsable::created_at.asc())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        convert_rows(rows)
    }

    async fn add_responsable(
        &self,
        travaux_id: i32,
        matricule: &str,
        role: ResponsableRole,
    ) -> Result<Responsable, PersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: ResponsableRow = diesel::insert_into(travaux_responsable::table)
            .values((
                travaux_responsable::travaux_id.eq(travaux_id),
                travaux_responsable::matricule.eq(matricule),
                travaux_responsable::role.eq(role.as_str()),
            ))
            .on_conflict((travaux_responsable::travaux_id, travaux_responsable::matricule))
            .do_update()
            .set(travaux_responsable::role.eq(excluded(travaux_responsable::role)))
            .returning(responsable_columns!())
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Responsable::try_from(row)
    }

    async fn remove_responsable(
        &self,
        travaux_id: i32,
        matricule: &str,
    ) -> Result<bool, PersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let deleted = diesel::delete(
            travaux_responsable::table
                .filter(travaux_responsable::travaux_id.eq(travaux_id))
                .filter(travaux_responsable::matricule.eq(matricule)),
        )
        .execute(&mut conn)
        .await
        .map_err(map_diesel_error)?;
        Ok(deleted > 0)
    }

    async fn find_satisfaction(
        &self,
        travaux_id: i32,
    ) -> Result<Option<Satisfaction>, PersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<SatisfactionRow> = travaux_satisfaction::table
            .filter(travaux_satisfaction::travaux_id.eq(travaux_id))
            .select(satisfaction_columns!())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        Ok(row.map(Satisfaction::from))
    }

    async fn upsert_satisfaction(
        &self,
        travaux_id: i32,
        rating: i16,
        commentaire: Option<String>,
    ) -> Result<Satisfaction, PersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let now = Utc::now();
        let row: SatisfactionRow = diesel::insert_into(travaux_satisfaction::table)
            .values((
                travaux_satisfaction::travaux_id.eq(travaux_id),
                travaux_satisfaction::rating.eq(rating),
                travaux_satisfaction::commentaire.eq(commentaire.as_deref()),
                travaux_satisfaction::updated_at.eq(now),
            ))
            .on_conflict(travaux_satisfaction::travaux_id)
            .do_update()
            .set((
                travaux_satisfaction::rating.eq(excluded(travaux_satisfaction::rating)),
                travaux_satisfaction::commentaire.eq(excluded(travaux_satisfaction::commentaire)),
                travaux_satisfaction::updated_at.eq(now),
            ))
            .returning(satisfaction_columns!())
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(Satisfaction::from(row))
    }

    async fn is_client_user(
        &self,
        travaux_id: i32,
        user_id: i32,
    ) -> Result<bool, PersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: AllowedRow = diesel::sql_query(CLIENT_USER_SQL)
            .bind::<Int4, _>(travaux_id)
            .bind::<Int4, _>(user_id)
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(row.allowed)
    }
}
