//! Internal Diesel row structs for database operations.
//!
//! These types are implementation details of the persistence layer and must
//! never be exposed to the domain. Conversions into domain types parse the
//! text status columns and may therefore fail.

use chrono::{DateTime, Utc};
use diesel::prelude::*;

use crate::domain::ports::PersistenceError;
use crate::domain::{Affaire, Agent, Client, Demande, Doe, Site, UserAccount};

use super::diesel_helpers::parse_text;
use super::schema::{
    affaire, agent, audit_log, client, demande_client, doe, site, users,
};

/// Accounts as read for authentication.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct UserRow {
    pub id: i32,
    pub email: String,
    pub password_hash: String,
    pub roles: Vec<String>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = users)]
pub(crate) struct NewUserRow<'a> {
    pub email: &'a str,
    pub password_hash: &'a str,
    pub roles: &'a [String],
}

impl From<UserRow> for UserAccount {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.id,
            email: row.email,
            password_hash: row.password_hash,
            roles: row.roles,
        }
    }
}

// ---------------------------------------------------------------------------
// Clients and sites
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = client)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct ClientRow {
    pub id: i32,
    pub nom_societe: String,
    pub representant_nom: Option<String>,
    pub representant_email: Option<String>,
    pub representant_tel: Option<String>,
    pub adresse_id: Option<i32>,
    pub commentaire: Option<String>,
    pub user_id: Option<i32>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = client)]
pub(crate) struct NewClientRow<'a> {
    pub nom_societe: &'a str,
    pub representant_nom: Option<&'a str>,
    pub representant_email: Option<&'a str>,
    pub representant_tel: Option<&'a str>,
    pub adresse_id: Option<i32>,
    pub commentaire: Option<&'a str>,
    pub user_id: Option<i32>,
}

impl From<ClientRow> for Client {
    fn from(row: ClientRow) -> Self {
        Self {
            id: row.id,
            nom_societe: row.nom_societe,
            representant_nom: row.representant_nom,
            representant_email: row.representant_email,
            representant_tel: row.representant_tel,
            adresse_id: row.adresse_id,
            commentaire: row.commentaire,
            user_id: row.user_id,
        }
    }
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = site)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct SiteRow {
    pub id: i32,
    pub client_id: i32,
    pub nom: String,
    pub commentaire: Option<String>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = site)]
pub(crate) struct NewSiteRow<'a> {
    pub client_id: i32,
    pub nom: &'a str,
    pub commentaire: Option<&'a str>,
}

/// Site changes; absent fields are skipped.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = site)]
pub(crate) struct SiteUpdate<'a> {
    pub nom: Option<&'a str>,
    pub commentaire: Option<&'a str>,
}

impl From<SiteRow> for Site {
    fn from(row: SiteRow) -> Self {
        Self {
            id: row.id,
            client_id: row.client_id,
            nom: row.nom,
            commentaire: row.commentaire,
        }
    }
}

// ---------------------------------------------------------------------------
// Demandes
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable, QueryableByName)]
#[diesel(table_name = demande_client)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct DemandeRow {
    pub id: i32,
    pub client_id: i32,
    pub site_id: Option<i32>,
    pub titre: String,
    pub description: String,
    pub status: String,
    pub commentaire: Option<String>,
    pub ticket_id: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = demande_client)]
pub(crate) struct NewDemandeRow<'a> {
    pub client_id: i32,
    pub site_id: Option<i32>,
    pub titre: &'a str,
    pub description: &'a str,
    pub status: &'a str,
}

/// Editable demande fields; `updated_at` is always stamped.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = demande_client)]
pub(crate) struct DemandeUpdate<'a> {
    pub site_id: Option<i32>,
    pub titre: Option<&'a str>,
    pub description: Option<&'a str>,
    pub updated_at: DateTime<Utc>,
}

/// Status change; the comment is only written when present.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = demande_client)]
pub(crate) struct DemandeStatusUpdate<'a> {
    pub status: &'a str,
    pub commentaire: Option<&'a str>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<DemandeRow> for Demande {
    type Error = PersistenceError;

    fn try_from(row: DemandeRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            client_id: row.client_id,
            site_id: row.site_id,
            titre: row.titre,
            description: row.description,
            status: parse_text(&row.status)?,
            commentaire: row.commentaire,
            ticket_id: row.ticket_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

// ---------------------------------------------------------------------------
// Reference data
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = doe)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct DoeRow {
    pub id: i32,
    pub titre: String,
    pub site_id: Option<i32>,
    pub affaire_id: Option<i32>,
}

impl From<DoeRow> for Doe {
    fn from(row: DoeRow) -> Self {
        Self {
            id: row.id,
            titre: row.titre,
            site_id: row.site_id,
            affaire_id: row.affaire_id,
        }
    }
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = affaire)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct AffaireRow {
    pub id: i32,
    pub nom: String,
}

impl From<AffaireRow> for Affaire {
    fn from(row: AffaireRow) -> Self {
        Self {
            id: row.id,
            nom: row.nom,
        }
    }
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = agent)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct AgentRow {
    pub matricule: String,
    pub nom: String,
    pub prenom: Option<String>,
    pub email: Option<String>,
    pub user_id: Option<i32>,
    pub admin: bool,
}

impl From<AgentRow> for Agent {
    fn from(row: AgentRow) -> Self {
        Self {
            matricule: row.matricule,
            nom: row.nom,
            prenom: row.prenom,
            email: row.email,
            user_id: row.user_id,
            admin: row.admin,
        }
    }
}

// ---------------------------------------------------------------------------
// Audit
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = audit_log)]
pub(crate) struct NewAuditRow<'a> {
    pub entity_type: &'a str,
    pub entity_id: &'a str,
    pub action: &'a str,
    pub actor_email: Option<&'a str>,
    pub details: &'a serde_json::Value,
}

impl<'a> From<&'a crate::domain::AuditEntry> for NewAuditRow<'a> {
    fn from(entry: &'a crate::domain::AuditEntry) -> Self {
        Self {
            entity_type: &entry.entity_type,
            entity_id: &entry.entity_id,
            action: entry.action.as_str(),
            actor_email: entry.actor_email.as_deref(),
            details: &entry.details,
        }
    }
}

mod file_rows;
mod intervention_rows;
mod message_rows;
mod ticket_rows;
mod travaux_rows;

pub(crate) use file_rows::{
    DocumentRow, ImageMetaRow, NewDocumentRow, NewImageRow, RenduRow,
};
pub(crate) use intervention_rows::{
    CalendarRow, InterventionEventRow, InterventionRow, InterventionUpdate, MaterielUsageRow,
    NewInterventionEventRow, NewInterventionRow,
};
pub(crate) use message_rows::{
    AttachmentMetaRow, MessageRow, NewAttachmentRow, NewMessageRow, StoredAttachmentRow,
};
pub(crate) use ticket_rows::{
    AgentAssignmentRow, NewResponsableChangeRow, NewTicketRow, ResponsableChangeRow,
    ResponsableRow, SatisfactionRow, TicketRow, TicketUpdateRow,
};
pub(crate) use travaux_rows::{
    NewTacheRow, NewTravauxMaterielRow, NewTravauxRow, TacheRow, TacheUpdate, TravauxMaterielRow,
    TravauxMaterielUpdate, TravauxRow, TravauxUpdate,
};
