//! Clients, their sites and the demandes they submit.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::{IntoParams, ToSchema};

use crate::domain::{DemandeStatus, Ticket, Travaux};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct Client {
    pub id: i32,
    pub nom_societe: String,
    pub representant_nom: Option<String>,
    pub representant_email: Option<String>,
    pub representant_tel: Option<String>,
    pub adresse_id: Option<i32>,
    pub commentaire: Option<String>,
    pub user_id: Option<i32>,
}

/// Body of `POST /api/clients/register`.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct RegisterClientRequest {
    pub email: Option<String>,
    pub password: Option<String>,
    #[serde(alias = "nom")]
    pub nom_societe: Option<String>,
    pub representant_nom: Option<String>,
    pub representant_tel: Option<String>,
    pub adresse_id: Option<i32>,
    pub commentaire: Option<String>,
}

/// Validated registration written in one transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewClientAccount {
    pub email: String,
    pub password_hash: String,
    pub roles: Vec<String>,
    pub nom_societe: String,
    pub representant_nom: Option<String>,
    pub representant_tel: Option<String>,
    pub adresse_id: Option<i32>,
    pub commentaire: Option<String>,
}

/// Result of the registration transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistrationOutcome {
    Registered(Client),
    EmailTaken,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct Site {
    pub id: i32,
    pub client_id: i32,
    pub nom: String,
    pub commentaire: Option<String>,
}

/// Body for site creation and update.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct SiteInput {
    /// Only honoured for administrators.
    pub client_id: Option<i32>,
    pub nom: Option<String>,
    pub commentaire: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSite {
    pub client_id: i32,
    pub nom: String,
    pub commentaire: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SitePatch {
    pub nom: Option<String>,
    pub commentaire: Option<String>,
}

/// Everything attached to one site.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SiteRelations {
    pub site: Site,
    pub client: Option<Client>,
    pub demandes: Vec<Demande>,
    pub tickets: Vec<Ticket>,
    pub travaux: Vec<Travaux>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct Demande {
    pub id: i32,
    pub client_id: i32,
    pub site_id: Option<i32>,
    pub titre: String,
    pub description: String,
    pub status: DemandeStatus,
    /// Rejection reason or deletion justification.
    pub commentaire: Option<String>,
    pub ticket_id: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Body for demande creation and update.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct DemandeInput {
    /// Only honoured for administrators.
    pub client_id: Option<i32>,
    pub site_id: Option<i32>,
    pub titre: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewDemande {
    pub client_id: i32,
    pub site_id: Option<i32>,
    pub titre: String,
    pub description: String,
    pub status: DemandeStatus,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DemandePatch {
    pub site_id: Option<i32>,
    pub titre: Option<String>,
    pub description: Option<String>,
}

/// Body of `PATCH /api/demandes_client/{id}/status`.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct DemandeStatusInput {
    #[schema(example = "rejetée")]
    pub status: Option<String>,
    #[serde(alias = "comment")]
    pub commentaire: Option<String>,
}

/// Body carrying a deletion justification.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct JustificationInput {
    pub justification: Option<String>,
}

/// Query filters for demande listings.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct DemandeQuery {
    pub status: Option<String>,
    pub client_id: Option<i32>,
    pub site_id: Option<i32>,
}

/// Resolved listing filter handed to the repository.
///
/// `client_ids` of `None` means every client.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DemandeFilter {
    pub client_ids: Option<Vec<i32>>,
    pub status: Option<DemandeStatus>,
    pub client_id: Option<i32>,
    pub site_id: Option<i32>,
}

/// Soft-deleted demande with the audit context of its deletion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct DeletedDemande {
    #[serde(flatten)]
    pub demande: Demande,
    pub justification: Option<String>,
    pub deleted_by: Option<String>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl DeletedDemande {
    /// Combine a demande row with its latest deletion audit entry.
    ///
    /// The comment column wins; the audit `details.justification` is used
    /// when the column is empty.
    pub fn from_audit(
        demande: Demande,
        deleted_by: Option<String>,
        deleted_at: Option<DateTime<Utc>>,
        details: Option<&Value>,
    ) -> Self {
        let justification = demande
            .commentaire
            .clone()
            .filter(|text| !text.trim().is_empty())
            .or_else(|| {
                details
                    .and_then(|details| details.get("justification"))
                    .and_then(Value::as_str)
                    .map(str::to_owned)
            });
        Self {
            demande,
            justification,
            deleted_by,
            deleted_at,
        }
    }
}

/// Result of the locked soft-delete transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SoftDeleteOutcome {
    Deleted(Demande),
    NotFound,
    Converted { ticket_id: i32 },
    AlreadyDeleted,
}

/// Result of the locked conversion transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConversionOutcome {
    Converted(ConversionResult),
    NotFound,
    AlreadyConverted { ticket_id: i32 },
    Deleted,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct ConversionResult {
    pub demande: Demande,
    pub ticket: Ticket,
}
