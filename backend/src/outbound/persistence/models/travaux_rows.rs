//! Work order rows and their tasks and equipment links.

use chrono::{DateTime, Utc};
use diesel::prelude::*;

use crate::domain::ports::PersistenceError;
use crate::domain::{
    NewTache, NewTravaux, NewTravauxMateriel, Tache, TacheInput, Travaux, TravauxInput,
    TravauxMateriel, TravauxMaterielPatch,
};
use crate::outbound::persistence::diesel_helpers::parse_text;
use crate::outbound::persistence::schema::{travaux, travaux_materiel, travaux_tache};

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = travaux)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct TravauxRow {
    pub id: i32,
    pub titre: String,
    pub description: Option<String>,
    pub etat: String,
    pub priorite: String,
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

impl TryFrom<TravauxRow> for Travaux {
    type Error = PersistenceError;

    fn try_from(row: TravauxRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            titre: row.titre,
            description: row.description,
            etat: parse_text(&row.etat)?,
            priorite: parse_text(&row.priorite)?,
            date_debut: row.date_debut,
            date_fin: row.date_fin,
            date_echeance: row.date_echeance,
            doe_id: row.doe_id,
            affaire_id: row.affaire_id,
            site_id: row.site_id,
            demande_id: row.demande_id,
            ticket_id: row.ticket_id,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = travaux)]
pub(crate) struct NewTravauxRow<'a> {
    pub titre: &'a str,
    pub description: Option<&'a str>,
    pub etat: &'a str,
    pub priorite: &'a str,
    pub date_debut: Option<DateTime<Utc>>,
    pub date_fin: Option<DateTime<Utc>>,
    pub date_echeance: Option<DateTime<Utc>>,
    pub doe_id: Option<i32>,
    pub affaire_id: Option<i32>,
    pub site_id: Option<i32>,
    pub demande_id: Option<i32>,
    pub ticket_id: Option<i32>,
}

impl<'a> From<&'a NewTravaux> for NewTravauxRow<'a> {
    fn from(new: &'a NewTravaux) -> Self {
        Self {
            titre: &new.titre,
            description: new.description.as_deref(),
            etat: new.etat.as_str(),
            priorite: new.priorite.as_str(),
            date_debut: new.date_debut,
            date_fin: new.date_fin,
            date_echeance: new.date_echeance,
            doe_id: new.doe_id,
            affaire_id: new.affaire_id,
            site_id: new.site_id,
            demande_id: new.demande_id,
            ticket_id: new.ticket_id,
        }
    }
}

#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = travaux)]
pub(crate) struct TravauxUpdate<'a> {
    pub titre: Option<&'a str>,
    pub description: Option<&'a str>,
    pub etat: Option<&'a str>,
    pub priorite: Option<&'a str>,
    pub date_debut: Option<DateTime<Utc>>,
    pub date_fin: Option<DateTime<Utc>>,
    pub date_echeance: Option<DateTime<Utc>>,
    pub doe_id: Option<i32>,
    pub affaire_id: Option<i32>,
    pub site_id: Option<i32>,
    pub demande_id: Option<i32>,
    pub ticket_id: Option<i32>,
}

impl<'a> From<&'a TravauxInput> for TravauxUpdate<'a> {
    fn from(patch: &'a TravauxInput) -> Self {
        Self {
            titre: patch.titre.as_deref(),
            description: patch.description.as_deref(),
            etat: patch.etat.map(|etat| etat.as_str()),
            priorite: patch.priorite.map(|priorite| priorite.as_str()),
            date_debut: patch.date_debut,
            date_fin: patch.date_fin,
            date_echeance: patch.date_echeance,
            doe_id: patch.doe_id,
            affaire_id: patch.affaire_id,
            site_id: patch.site_id,
            demande_id: patch.demande_id,
            ticket_id: patch.ticket_id,
        }
    }
}

// ---------------------------------------------------------------------------
// Tasks
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = travaux_tache)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct TacheRow {
    pub id: i32,
    pub travaux_id: i32,
    pub titre: String,
    pub description: Option<String>,
    pub etat: String,
    pub date_echeance: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<TacheRow> for Tache {
    type Error = PersistenceError;

    fn try_from(row: TacheRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            travaux_id: row.travaux_id,
            titre: row.titre,
            description: row.description,
            etat: parse_text(&row.etat)?,
            date_echeance: row.date_echeance,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = travaux_tache)]
pub(crate) struct NewTacheRow<'a> {
    pub travaux_id: i32,
    pub titre: &'a str,
    pub description: Option<&'a str>,
    pub etat: &'a str,
    pub date_echeance: Option<DateTime<Utc>>,
}

impl<'a> From<&'a NewTache> for NewTacheRow<'a> {
    fn from(new: &'a NewTache) -> Self {
        Self {
            travaux_id: new.travaux_id,
            titre: &new.titre,
            description: new.description.as_deref(),
            etat: new.etat.as_str(),
            date_echeance: new.date_echeance,
        }
    }
}

#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = travaux_tache)]
pub(crate) struct TacheUpdate<'a> {
    pub titre: Option<&'a str>,
    pub description: Option<&'a str>,
    pub etat: Option<&'a str>,
    pub date_echeance: Option<DateTime<Utc>>,
}

impl<'a> From<&'a TacheInput> for TacheUpdate<'a> {
    fn from(patch: &'a TacheInput) -> Self {
        Self {
            titre: patch.titre.as_deref(),
            description: patch.description.as_deref(),
            etat: patch.etat.map(|etat| etat.as_str()),
            date_echeance: patch.date_echeance,
        }
    }
}

// ---------------------------------------------------------------------------
// Equipment links
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = travaux_materiel)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct TravauxMaterielRow {
    pub id: i32,
    pub travaux_id: i32,
    pub materiel_id: i32,
    pub quantite: i32,
    pub commentaire: Option<String>,
}

impl From<TravauxMaterielRow> for TravauxMateriel {
    fn from(row: TravauxMaterielRow) -> Self {
        Self {
            id: row.id,
            travaux_id: row.travaux_id,
            materiel_id: row.materiel_id,
            quantite: row.quantite,
            commentaire: row.commentaire,
        }
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = travaux_materiel)]
pub(crate) struct NewTravauxMaterielRow<'a> {
    pub travaux_id: i32,
    pub materiel_id: i32,
    pub quantite: i32,
    pub commentaire: Option<&'a str>,
}

impl<'a> From<&'a NewTravauxMateriel> for NewTravauxMaterielRow<'a> {
    fn from(new: &'a NewTravauxMateriel) -> Self {
        Self {
            travaux_id: new.travaux_id,
            materiel_id: new.materiel_id,
            quantite: new.quantite,
            commentaire: new.commentaire.as_deref(),
        }
    }
}

#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = travaux_materiel)]
pub(crate) struct TravauxMaterielUpdate<'a> {
    pub quantite: Option<i32>,
    pub commentaire: Option<&'a str>,
}

impl<'a> From<&'a TravauxMaterielPatch> for TravauxMaterielUpdate<'a> {
    fn from(patch: &'a TravauxMaterielPatch) -> Self {
        Self {
            quantite: patch.quantite,
            commentaire: patch.commentaire.as_deref(),
        }
    }
}
