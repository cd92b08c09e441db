//! Stored images, the document register and rendus.

use chrono::{DateTime, Utc};
use diesel::prelude::*;

use crate::domain::{DocumentMeta, ImageMeta, Rendu};
use crate::outbound::persistence::schema::{document_repertoire, image};

/// Image metadata without the payload.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = image)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct ImageMetaRow {
    pub id: i32,
    pub nom: String,
    pub type_mime: String,
    pub taille: i32,
    pub created_at: DateTime<Utc>,
}

impl From<ImageMetaRow> for ImageMeta {
    fn from(row: ImageMetaRow) -> Self {
        Self {
            id: row.id,
            nom: row.nom,
            type_mime: row.type_mime,
            taille: row.taille,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = image)]
pub(crate) struct NewImageRow<'a> {
    pub nom: &'a str,
    pub type_mime: &'a str,
    pub taille: i32,
    pub data: &'a [u8],
}

impl<'a> From<&'a crate::domain::FileUpload> for NewImageRow<'a> {
    fn from(upload: &'a crate::domain::FileUpload) -> Self {
        Self {
            nom: &upload.name,
            type_mime: &upload.mime,
            taille: upload.size(),
            data: &upload.data,
        }
    }
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = document_repertoire)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct DocumentRow {
    pub id: i32,
    pub nom_fichier: String,
    pub type_mime: String,
    pub taille: i32,
    pub image_id: Option<i32>,
    pub created_at: DateTime<Utc>,
}

impl From<DocumentRow> for DocumentMeta {
    fn from(row: DocumentRow) -> Self {
        Self {
            id: row.id,
            nom_fichier: row.nom_fichier,
            type_mime: row.type_mime,
            taille: row.taille,
            image_id: row.image_id,
            created_at: row.created_at,
        }
    }
}

/// Register entry for an image attached to a rendu.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = document_repertoire)]
pub(crate) struct NewDocumentRow<'a> {
    pub nom_fichier: &'a str,
    pub type_mime: &'a str,
    pub taille: i32,
    pub image_id: Option<i32>,
    pub rendu_intervention_id: Option<i32>,
    pub rendu_travaux_id: Option<i32>,
}

/// `(id, owner_id, titre, description, created_at)` from either rendu table.
#[derive(Debug, Clone, Queryable)]
pub(crate) struct RenduRow {
    pub id: i32,
    pub owner_id: i32,
    pub titre: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl RenduRow {
    pub(crate) fn into_rendu(self, images: Vec<ImageMeta>) -> Rendu {
        Rendu {
            id: self.id,
            owner_id: self.owner_id,
            titre: self.titre,
            description: self.description,
            created_at: self.created_at,
            images,
        }
    }
}
