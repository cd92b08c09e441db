//! Reference data shared by tickets and work orders.

use serde::Serialize;
use utoipa::ToSchema;

/// Dossier des ouvrages exécutés: the as-built file tying a site to an affaire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct Doe {
    pub id: i32,
    pub titre: String,
    pub site_id: Option<i32>,
    pub affaire_id: Option<i32>,
}

/// Commercial contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct Affaire {
    pub id: i32,
    pub nom: String,
}

/// Field agent, keyed by matricule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct Agent {
    pub matricule: String,
    pub nom: String,
    pub prenom: Option<String>,
    pub email: Option<String>,
    pub user_id: Option<i32>,
    pub admin: bool,
}

/// Equipment usage attached to an intervention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum MaterielSource {
    /// Linked directly through `intervention_materiel`.
    Direct,
    /// Requested through a `demande_materiel`.
    Demande,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct MaterielUsage {
    pub materiel_id: i32,
    pub nom: String,
    pub reference: Option<String>,
    pub quantite: i32,
    pub source: MaterielSource,
}

/// Merge direct and requested equipment, one entry per materiel.
///
/// Direct links win over requested ones; otherwise the first row seen wins.
pub fn merge_materiels(
    direct: Vec<MaterielUsage>,
    requested: Vec<MaterielUsage>,
) -> Vec<MaterielUsage> {
    let mut merged: Vec<MaterielUsage> = Vec::with_capacity(direct.len() + requested.len());
    for usage in direct.into_iter().chain(requested) {
        if merged.iter().all(|seen| seen.materiel_id != usage.materiel_id) {
            merged.push(usage);
        }
    }
    merged
}
