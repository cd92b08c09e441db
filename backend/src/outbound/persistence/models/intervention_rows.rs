//! Intervention, event, equipment and calendar rows.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel::sql_types::{Int4, Nullable, Text, Timestamptz};

use crate::domain::ports::PersistenceError;
use crate::domain::{
    CalendarEntry, CalendarProps, Intervention, InterventionEvent, InterventionInput,
    MaterielSource, MaterielUsage, NewIntervention,
};
use crate::outbound::persistence::diesel_helpers::parse_text;
use crate::outbound::persistence::schema::{intervention, intervention_event};

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = intervention)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct InterventionRow {
    pub id: i32,
    pub ticket_id: i32,
    pub site_id: Option<i32>,
    pub demande_id: Option<i32>,
    pub titre: String,
    pub description: Option<String>,
    pub status: String,
    pub date_debut: Option<DateTime<Utc>>,
    pub date_fin: Option<DateTime<Utc>>,
    pub metier: Option<String>,
    pub ticket_agent_id: Option<i32>,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<InterventionRow> for Intervention {
    type Error = PersistenceError;

    fn try_from(row: InterventionRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            ticket_id: row.ticket_id,
            site_id: row.site_id,
            demande_id: row.demande_id,
            titre: row.titre,
            description: row.description,
            status: parse_text(&row.status)?,
            date_debut: row.date_debut,
            date_fin: row.date_fin,
            metier: row.metier,
            ticket_agent_id: row.ticket_agent_id,
            created_at: row.created_at,
        })
    }
}

/// Full intervention values, for inserts and replacement.
///
/// Replacement writes `NULL` into absent optional columns, hence
/// `treat_none_as_null`.
#[derive(Debug, Clone, Insertable, AsChangeset)]
#[diesel(table_name = intervention)]
#[diesel(treat_none_as_null = true)]
pub(crate) struct NewInterventionRow<'a> {
    pub ticket_id: i32,
    pub site_id: Option<i32>,
    pub demande_id: Option<i32>,
    pub titre: &'a str,
    pub description: Option<&'a str>,
    pub status: &'a str,
    pub date_debut: Option<DateTime<Utc>>,
    pub date_fin: Option<DateTime<Utc>>,
    pub metier: Option<&'a str>,
    pub ticket_agent_id: Option<i32>,
}

impl<'a> From<&'a NewIntervention> for NewInterventionRow<'a> {
    fn from(new: &'a NewIntervention) -> Self {
        Self {
            ticket_id: new.ticket_id,
            site_id: new.site_id,
            demande_id: new.demande_id,
            titre: &new.titre,
            description: new.description.as_deref(),
            status: new.status.as_str(),
            date_debut: new.date_debut,
            date_fin: new.date_fin,
            metier: new.metier.as_deref(),
            ticket_agent_id: new.ticket_agent_id,
        }
    }
}

/// Partial update; `None` fields are left untouched.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = intervention)]
pub(crate) struct InterventionUpdate<'a> {
    pub ticket_id: Option<i32>,
    pub site_id: Option<i32>,
    pub demande_id: Option<i32>,
    pub titre: Option<&'a str>,
    pub description: Option<&'a str>,
    pub status: Option<&'a str>,
    pub date_debut: Option<DateTime<Utc>>,
    pub date_fin: Option<DateTime<Utc>>,
    pub metier: Option<&'a str>,
    pub ticket_agent_id: Option<i32>,
}

impl<'a> From<&'a InterventionInput> for InterventionUpdate<'a> {
    fn from(patch: &'a InterventionInput) -> Self {
        Self {
            ticket_id: patch.ticket_id,
            site_id: patch.site_id,
            demande_id: patch.demande_id,
            titre: patch.titre.as_deref(),
            description: patch.description.as_deref(),
            status: patch.status.map(|status| status.as_str()),
            date_debut: patch.date_debut,
            date_fin: patch.date_fin,
            metier: patch.metier.as_deref(),
            ticket_agent_id: patch.ticket_agent_id,
        }
    }
}

// ---------------------------------------------------------------------------
// Calendar events
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = intervention_event)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct InterventionEventRow {
    pub id: i32,
    pub intervention_id: i32,
    pub agent_matricule: String,
    pub titre: String,
    pub status: String,
    pub date_debut: Option<DateTime<Utc>>,
    pub date_fin: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<InterventionEventRow> for InterventionEvent {
    type Error = PersistenceError;

    fn try_from(row: InterventionEventRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            intervention_id: row.intervention_id,
            agent_matricule: row.agent_matricule,
            titre: row.titre,
            status: parse_text(&row.status)?,
            date_debut: row.date_debut,
            date_fin: row.date_fin,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = intervention_event)]
pub(crate) struct NewInterventionEventRow<'a> {
    pub intervention_id: i32,
    pub agent_matricule: &'a str,
    pub titre: &'a str,
    pub status: &'a str,
    pub date_debut: Option<DateTime<Utc>>,
    pub date_fin: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

/// `(materiel_id, nom, reference, quantite)` from either equipment source.
#[derive(Debug, Clone, Queryable)]
pub(crate) struct MaterielUsageRow {
    pub materiel_id: i32,
    pub nom: String,
    pub reference: Option<String>,
    pub quantite: i32,
}

impl MaterielUsageRow {
    pub(crate) fn into_usage(self, source: MaterielSource) -> MaterielUsage {
        MaterielUsage {
            materiel_id: self.materiel_id,
            nom: self.nom,
            reference: self.reference,
            quantite: self.quantite,
            source,
        }
    }
}

/// Calendar projection joined with ticket, responsable agent and site.
#[derive(Debug, Clone, QueryableByName)]
pub(crate) struct CalendarRow {
    #[diesel(sql_type = Int4)]
    pub id: i32,
    #[diesel(sql_type = Text)]
    pub titre: String,
    #[diesel(sql_type = Nullable<Timestamptz>)]
    pub date_debut: Option<DateTime<Utc>>,
    #[diesel(sql_type = Nullable<Timestamptz>)]
    pub date_fin: Option<DateTime<Utc>>,
    #[diesel(sql_type = Text)]
    pub status: String,
    #[diesel(sql_type = Int4)]
    pub ticket_id: i32,
    #[diesel(sql_type = Text)]
    pub ticket_titre: String,
    #[diesel(sql_type = Nullable<Text>)]
    pub agent_matricule: Option<String>,
    #[diesel(sql_type = Nullable<Text>)]
    pub agent_nom: Option<String>,
    #[diesel(sql_type = Nullable<Int4>)]
    pub site_id: Option<i32>,
    #[diesel(sql_type = Nullable<Text>)]
    pub site_nom: Option<String>,
}

impl From<CalendarRow> for CalendarEntry {
    fn from(row: CalendarRow) -> Self {
        Self {
            id: row.id,
            title: row.titre,
            start: row.date_debut,
            end: row.date_fin,
            extended_props: CalendarProps {
                ticket_id: row.ticket_id,
                ticket_titre: row.ticket_titre,
                status: row.status,
                agent_matricule: row.agent_matricule,
                agent_nom: row.agent_nom,
                site_id: row.site_id,
                site_nom: row.site_nom,
            },
        }
    }
}
