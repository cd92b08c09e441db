//! Work orders ("travaux") and their tasks, equipment and staffing.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::domain::{
    Affaire, AgentAssignment, Demande, Doe, Rendu, Responsable, Satisfaction, Site,
    TravauxEtat, TravauxPriorite,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct Travaux {
    pub id: i32,
    pub titre: String,
    pub description: Option<String>,
    pub etat: TravauxEtat,
    pub priorite: TravauxPriorite,
    pub date_debut: Option<DateTime<Utc>>,
    pub date_fin: Option<DateTime<Utc>>,
    pub date_echeance: Option<DateTime<Utc>>,
    pub doe_id: Option<i32>,
    pub affaire_id: Option<i32>,
    pub site_id: Option<i32>,
    pub demande_id: Option<i32>,
    pub ticket_id: Option<i32>,
    pub created_at: DateTime<Utc>,
}

/// Body for work order creation and patching.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, ToSchema)]
pub struct TravauxInput {
    pub titre: Option<String>,
    pub description: Option<String>,
    pub etat: Option<TravauxEtat>,
    pub priorite: Option<TravauxPriorite>,
    pub date_debut: Option<DateTime<Utc>>,
    pub date_fin: Option<DateTime<Utc>>,
    pub date_echeance: Option<DateTime<Utc>>,
    pub doe_id: Option<i32>,
    pub affaire_id: Option<i32>,
    pub site_id: Option<i32>,
    pub demande_id: Option<i32>,
    pub ticket_id: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTravaux {
    pub titre: String,
    pub description: Option<String>,
    pub etat: TravauxEtat,
    pub priorite: TravauxPriorite,
    pub date_debut: Option<DateTime<Utc>>,
    pub date_fin: Option<DateTime<Utc>>,
    pub date_echeance: Option<DateTime<Utc>>,
    pub doe_id: Option<i32>,
    pub affaire_id: Option<i32>,
    pub site_id: Option<i32>,
    pub demande_id: Option<i32>,
    pub ticket_id: Option<i32>,
}

/// Query filters for work order listings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct TravauxFilter {
    #[param(value_type = Option<String>)]
    pub etat: Option<TravauxEtat>,
    #[param(value_type = Option<String>)]
    pub priorite: Option<TravauxPriorite>,
    pub site_id: Option<i32>,
    pub affaire_id: Option<i32>,
    pub demande_id: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct Tache {
    pub id: i32,
    pub travaux_id: i32,
    pub titre: String,
    pub description: Option<String>,
    pub etat: TravauxEtat,
    pub date_echeance: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Body for task creation and patching.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, ToSchema)]
pub struct TacheInput {
    pub titre: Option<String>,
    pub description: Option<String>,
    pub etat: Option<TravauxEtat>,
    pub date_echeance: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTache {
    pub travaux_id: i32,
    pub titre: String,
    pub description: Option<String>,
    pub etat: TravauxEtat,
    pub date_echeance: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct TravauxMateriel {
    pub id: i32,
    pub travaux_id: i32,
    pub materiel_id: i32,
    pub quantite: i32,
    pub commentaire: Option<String>,
}

/// Body for equipment links.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, ToSchema)]
pub struct TravauxMaterielInput {
    pub materiel_id: Option<i32>,
    pub quantite: Option<i32>,
    pub commentaire: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTravauxMateriel {
    pub travaux_id: i32,
    pub materiel_id: i32,
    pub quantite: i32,
    pub commentaire: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TravauxMaterielPatch {
    pub quantite: Option<i32>,
    pub commentaire: Option<String>,
}

/// One work order with everything hanging off it.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TravauxRelations {
    pub travaux: Travaux,
    pub doe: Option<Doe>,
    pub affaire: Option<Affaire>,
    pub site: Option<Site>,
    pub demandes: Vec<Demande>,
    pub taches: Vec<Tache>,
    pub materiels: Vec<TravauxMateriel>,
    pub agents: Vec<AgentAssignment>,
    pub responsables: Vec<Responsable>,
    pub rendus: Vec<Rendu>,
    pub satisfaction: Option<Satisfaction>,
}
