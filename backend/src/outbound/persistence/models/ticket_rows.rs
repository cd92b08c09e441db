//! Ticket rows and the assignment tables shared with work orders.

use chrono::{DateTime, Utc};
use diesel::prelude::*;

use crate::domain::ports::PersistenceError;
use crate::domain::{
    AgentAssignment, ResponsableChange, Responsable, Satisfaction, Ticket,
};
use crate::outbound::persistence::diesel_helpers::parse_text;
use crate::outbound::persistence::schema::{
    ticket, ticket_responsable_history,
};

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = ticket)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct TicketRow {
    pub id: i32,
    pub titre: String,
    pub description: Option<String>,
    pub etat: String,
    pub doe_id: Option<i32>,
    pub affaire_id: Option<i32>,
    pub site_id: Option<i32>,
    pub demande_id: Option<i32>,
    pub responsable: Option<String>,
    pub date_debut: Option<DateTime<Utc>>,
    pub date_fin: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = ticket)]
pub(crate) struct NewTicketRow<'a> {
    pub titre: &'a str,
    pub description: Option<&'a str>,
    pub etat: &'a str,
    pub doe_id: Option<i32>,
    pub affaire_id: Option<i32>,
    pub site_id: Option<i32>,
    pub demande_id: Option<i32>,
    pub responsable: Option<&'a str>,
    pub date_debut: Option<DateTime<Utc>>,
    pub date_fin: Option<DateTime<Utc>>,
}

impl<'a> From<&'a crate::domain::NewTicket> for NewTicketRow<'a> {
    fn from(new: &'a crate::domain::NewTicket) -> Self {
        Self {
            titre: &new.titre,
            description: new.description.as_deref(),
            etat: new.etat.as_str(),
            doe_id: new.doe_id,
            affaire_id: new.affaire_id,
            site_id: new.site_id,
            demande_id: new.demande_id,
            responsable: new.responsable.as_deref(),
            date_debut: new.date_debut,
            date_fin: new.date_fin,
        }
    }
}

/// Partial ticket update; `None` fields are left untouched.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = ticket)]
pub(crate) struct TicketUpdateRow<'a> {
    pub titre: Option<&'a str>,
    pub description: Option<&'a str>,
    pub etat: Option<&'a str>,
    pub doe_id: Option<i32>,
    pub affaire_id: Option<i32>,
    pub site_id: Option<i32>,
    pub responsable: Option<&'a str>,
    pub date_debut: Option<DateTime<Utc>>,
    pub date_fin: Option<DateTime<Utc>>,
}

impl<'a> From<&'a crate::domain::TicketPatch> for TicketUpdateRow<'a> {
    fn from(patch: &'a crate::domain::TicketPatch) -> Self {
        Self {
            titre: patch.titre.as_deref(),
            description: patch.description.as_deref(),
            etat: patch.etat.map(|etat| etat.as_str()),
            doe_id: patch.doe_id,
            affaire_id: patch.affaire_id,
            site_id: patch.site_id,
            responsable: patch.responsable.as_deref(),
            date_debut: patch.date_debut,
            date_fin: patch.date_fin,
        }
    }
}

impl TryFrom<TicketRow> for Ticket {
    type Error = PersistenceError;

    fn try_from(row: TicketRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            titre: row.titre,
            description: row.description,
            etat: parse_text(&row.etat)?,
            doe_id: row.doe_id,
            affaire_id: row.affaire_id,
            site_id: row.site_id,
            demande_id: row.demande_id,
            responsable: row.responsable,
            date_debut: row.date_debut,
            date_fin: row.date_fin,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = ticket_responsable_history)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct ResponsableChangeRow {
    pub id: i32,
    pub ticket_id: i32,
    pub old_matricule: Option<String>,
    pub new_matricule: Option<String>,
    pub changed_by: Option<String>,
    pub changed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = ticket_responsable_history)]
pub(crate) struct NewResponsableChangeRow<'a> {
    pub ticket_id: i32,
    pub old_matricule: Option<&'a str>,
    pub new_matricule: Option<&'a str>,
    pub changed_by: Option<&'a str>,
}

impl From<ResponsableChangeRow> for ResponsableChange {
    fn from(row: ResponsableChangeRow) -> Self {
        Self {
            id: row.id,
            ticket_id: row.ticket_id,
            old_matricule: row.old_matricule,
            new_matricule: row.new_matricule,
            changed_by: row.changed_by,
            changed_at: row.changed_at,
        }
    }
}

/// Responsable association read from `ticket_responsable` or
/// `travaux_responsable`; `parent_id` is the ticket or work order id.
#[derive(Debug, Clone, Queryable)]
pub(crate) struct ResponsableRow {
    pub id: i32,
    pub parent_id: i32,
    pub matricule: String,
    pub role: String,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<ResponsableRow> for Responsable {
    type Error = PersistenceError;

    fn try_from(row: ResponsableRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            parent_id: row.parent_id,
            matricule: row.matricule,
            role: parse_text(&row.role)?,
            created_at: row.created_at,
        })
    }
}

/// Agent assignment read from `ticket_agent` or `travaux_agent`.
#[derive(Debug, Clone, Queryable)]
pub(crate) struct AgentAssignmentRow {
    pub id: i32,
    pub parent_id: i32,
    pub matricule: String,
    pub date_debut: Option<DateTime<Utc>>,
    pub date_fin: Option<DateTime<Utc>>,
}

impl From<AgentAssignmentRow> for AgentAssignment {
    fn from(row: AgentAssignmentRow) -> Self {
        Self {
            id: row.id,
            parent_id: row.parent_id,
            matricule: row.matricule,
            date_debut: row.date_debut,
            date_fin: row.date_fin,
        }
    }
}

/// Satisfaction read from either satisfaction table.
#[derive(Debug, Clone, Queryable)]
pub(crate) struct SatisfactionRow {
    pub rating: i16,
    pub commentaire: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl From<SatisfactionRow> for Satisfaction {
    fn from(row: SatisfactionRow) -> Self {
        Self {
            rating: row.rating,
            commentaire: row.commentaire,
            updated_at: row.updated_at,
        }
    }
}
