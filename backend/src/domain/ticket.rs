//! Tickets and the responsibility bookkeeping around them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::domain::{
    Affaire, AgentAssignment, Demande, DocumentMeta, Doe, ImageMeta, Intervention, Responsable,
    Satisfaction, Site, TicketEtat,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct Ticket {
    pub id: i32,
    pub titre: String,
    pub description: Option<String>,
    pub etat: TicketEtat,
    pub doe_id: Option<i32>,
    pub affaire_id: Option<i32>,
    pub site_id: Option<i32>,
    pub demande_id: Option<i32>,
    /// Matricule of the primary agent.
    pub responsable: Option<String>,
    pub date_debut: Option<DateTime<Utc>>,
    pub date_fin: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Body of `POST /api/tickets`.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct TicketInput {
    pub titre: Option<String>,
    pub description: Option<String>,
    pub etat: Option<TicketEtat>,
    pub doe_id: Option<i32>,
    pub affaire_id: Option<i32>,
    pub site_id: Option<i32>,
    pub demande_id: Option<i32>,
    pub responsable: Option<String>,
    pub date_debut: Option<DateTime<Utc>>,
    pub date_fin: Option<DateTime<Utc>>,
}

/// Ticket row to insert, from creation or demande conversion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTicket {
    pub titre: String,
    pub description: Option<String>,
    pub etat: TicketEtat,
    pub doe_id: Option<i32>,
    pub affaire_id: Option<i32>,
    pub site_id: Option<i32>,
    pub demande_id: Option<i32>,
    pub responsable: Option<String>,
    pub date_debut: Option<DateTime<Utc>>,
    pub date_fin: Option<DateTime<Utc>>,
}

/// Partial ticket update; absent fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, ToSchema)]
pub struct TicketPatch {
    pub titre: Option<String>,
    pub description: Option<String>,
    pub etat: Option<TicketEtat>,
    pub doe_id: Option<i32>,
    pub affaire_id: Option<i32>,
    pub site_id: Option<i32>,
    pub responsable: Option<String>,
    pub date_debut: Option<DateTime<Utc>>,
    pub date_fin: Option<DateTime<Utc>>,
}

impl TicketPatch {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

/// Ticket state before and after an update transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TicketUpdate {
    pub previous: Ticket,
    pub current: Ticket,
}

impl TicketUpdate {
    pub fn responsable_changed(&self) -> bool {
        self.previous.responsable != self.current.responsable
    }
}

/// Query filters for ticket listings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct TicketFilter {
    #[param(value_type = Option<String>)]
    pub etat: Option<TicketEtat>,
    pub site_id: Option<i32>,
    pub affaire_id: Option<i32>,
    pub doe_id: Option<i32>,
    pub responsable: Option<String>,
    pub demande_id: Option<i32>,
}

/// Append-only record of a primary responsable change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct ResponsableChange {
    pub id: i32,
    pub ticket_id: i32,
    pub old_matricule: Option<String>,
    pub new_matricule: Option<String>,
    pub changed_by: Option<String>,
    pub changed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewResponsableChange {
    pub ticket_id: i32,
    pub old_matricule: Option<String>,
    pub new_matricule: Option<String>,
    pub changed_by: Option<String>,
}

/// How a caller ended up attached to a ticket they took.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Assignment {
    Primary,
    Secondary,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct TakeOutcome {
    pub assignment: Assignment,
    pub ticket: Ticket,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub responsable: Option<Responsable>,
}

/// One ticket with everything hanging off it.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TicketRelations {
    pub ticket: Ticket,
    pub doe: Option<Doe>,
    pub affaire: Option<Affaire>,
    pub site: Option<Site>,
    pub demande: Option<Demande>,
    pub interventions: Vec<Intervention>,
    pub documents: Vec<DocumentMeta>,
    pub images: Vec<ImageMeta>,
    pub responsables: Vec<Responsable>,
    pub agents: Vec<AgentAssignment>,
    pub satisfaction: Option<Satisfaction>,
}
