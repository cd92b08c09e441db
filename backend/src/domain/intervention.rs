//! Interventions, their calendar projection and equipment.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::domain::{
    InterventionEventStatus, InterventionStatus, MaterielUsage, Rendu, Site, Ticket,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct Intervention {
    pub id: i32,
    pub ticket_id: i32,
    pub site_id: Option<i32>,
    pub demande_id: Option<i32>,
    pub titre: String,
    pub description: Option<String>,
    pub status: InterventionStatus,
    pub date_debut: Option<DateTime<Utc>>,
    pub date_fin: Option<DateTime<Utc>>,
    pub metier: Option<String>,
    pub ticket_agent_id: Option<i32>,
    pub created_at: DateTime<Utc>,
}

/// Body for intervention creation, full replacement and patching.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, ToSchema)]
pub struct InterventionInput {
    pub ticket_id: Option<i32>,
    pub site_id: Option<i32>,
    pub demande_id: Option<i32>,
    pub titre: Option<String>,
    pub description: Option<String>,
    pub status: Option<InterventionStatus>,
    pub date_debut: Option<DateTime<Utc>>,
    pub date_fin: Option<DateTime<Utc>>,
    pub metier: Option<String>,
    pub ticket_agent_id: Option<i32>,
}

/// Complete intervention row, used for inserts and full replacement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewIntervention {
    pub ticket_id: i32,
    pub site_id: Option<i32>,
    pub demande_id: Option<i32>,
    pub titre: String,
    pub description: Option<String>,
    pub status: InterventionStatus,
    pub date_debut: Option<DateTime<Utc>>,
    pub date_fin: Option<DateTime<Utc>>,
    pub metier: Option<String>,
    pub ticket_agent_id: Option<i32>,
}

/// Query filters for intervention listings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct InterventionFilter {
    pub ticket_id: Option<i32>,
    #[param(value_type = Option<String>)]
    pub status: Option<InterventionStatus>,
    pub site_id: Option<i32>,
}

/// Per-agent projection of an intervention.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct InterventionEvent {
    pub id: i32,
    pub intervention_id: i32,
    pub agent_matricule: String,
    pub titre: String,
    pub status: InterventionEventStatus,
    pub date_debut: Option<DateTime<Utc>>,
    pub date_fin: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

/// Query of `GET /api/interventions/calendar`.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CalendarQuery {
    /// Comma-separated agent matricules.
    pub agents: Option<String>,
}

impl CalendarQuery {
    /// Matricules to keep, or `None` for every agent.
    pub fn matricules(&self) -> Option<Vec<String>> {
        let matricules: Vec<String> = self
            .agents
            .as_deref()?
            .split(',')
            .map(str::trim)
            .filter(|matricule| !matricule.is_empty())
            .map(str::to_owned)
            .collect();
        (!matricules.is_empty()).then_some(matricules)
    }
}

/// Calendar record in the shape expected by the dashboard calendar widget.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CalendarEntry {
    pub id: i32,
    pub title: String,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    pub extended_props: CalendarProps,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CalendarProps {
    pub ticket_id: i32,
    pub ticket_titre: String,
    pub status: String,
    pub agent_matricule: Option<String>,
    pub agent_nom: Option<String>,
    pub site_id: Option<i32>,
    pub site_nom: Option<String>,
}

/// One intervention with its context.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct InterventionRelations {
    pub intervention: Intervention,
    pub ticket: Option<Ticket>,
    pub site: Option<Site>,
    pub events: Vec<InterventionEvent>,
    pub materiels: Vec<MaterielUsage>,
    pub rendus: Vec<Rendu>,
}
