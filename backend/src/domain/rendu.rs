//! Field reports ("rendus") and the stored images behind them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{FileInput, FileUpload};

/// Record a rendu belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenduOwner {
    Intervention(i32),
    Travaux(i32),
}

impl RenduOwner {
    pub fn id(self) -> i32 {
        match self {
            Self::Intervention(id) | Self::Travaux(id) => id,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Intervention(_) => "intervention",
            Self::Travaux(_) => "travaux",
        }
    }
}

/// Image metadata; bytes are never serialised in listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct ImageMeta {
    pub id: i32,
    pub nom: String,
    pub type_mime: String,
    pub taille: i32,
    pub created_at: DateTime<Utc>,
}

/// Entry of the document register.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct DocumentMeta {
    pub id: i32,
    pub nom_fichier: String,
    pub type_mime: String,
    pub taille: i32,
    pub image_id: Option<i32>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct Rendu {
    pub id: i32,
    /// Intervention or work order id.
    pub owner_id: i32,
    pub titre: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub images: Vec<ImageMeta>,
}

/// Body for rendu creation and patching.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct RenduInput {
    pub titre: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub images: Vec<FileInput>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRendu {
    pub titre: String,
    pub description: Option<String>,
    pub images: Vec<FileUpload>,
}

/// Patch; `images` are appended to the existing ones.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenduPatch {
    pub titre: Option<String>,
    pub description: Option<String>,
    pub images: Vec<FileUpload>,
}
