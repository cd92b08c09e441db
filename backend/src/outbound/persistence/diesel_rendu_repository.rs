//! PostgreSQL-backed `RenduRepository` for intervention and work order
//! reports.
//!
//! Both owners share the `image` and `document_repertoire` tables; only the
//! rendu table and its image link table differ.

use std::collections::HashMap;

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, AsyncPgConnection, RunQueryDsl};

use crate::domain::ports::{PersistenceError, RenduRepository};
use crate::domain::{FileUpload, ImageMeta, NewRendu, Rendu, RenduOwner, RenduPatch};

use super::diesel_helpers::{map_diesel_error, map_pool_error};
use super::models::{ImageMetaRow, NewDocumentRow, NewImageRow, RenduRow};
use super::pool::DbPool;
use super::schema::{
    document_repertoire, image, rendu_intervention, rendu_intervention_image, rendu_travaux,
    rendu_travaux_image,
};

/// Reports with their images.
#[derive(Clone)]
pub struct DieselRenduRepository {
    pool: DbPool,
}

impl DieselRenduRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

macro_rules! rendu_columns {
    ($table:ident, $owner:ident) => {
        (
            $table::id,
            $table::$owner,
            $table::titre,
            $table::description,
            $table::created_at,
        )
    };
}

async fn insert_rendu(
    conn: &mut AsyncPgConnection,
    owner: RenduOwner,
    rendu: &NewRendu,
) -> QueryResult<RenduRow> {
    match owner {
        RenduOwner::Intervention(owner_id) => {
            diesel::insert_into(rendu_intervention::table)
                .values((
                    rendu_intervention::intervention_id.eq(owner_id),
                    rendu_intervention::titre.eq(&rendu.titre),
                    rendu_intervention::description.eq(rendu.description.as_deref()),
                ))
                .returning(rendu_columns!(rendu_intervention, intervention_id))
                .get_result(conn)
                .await
        }
        RenduOwner::Travaux(owner_id) => {
            diesel::insert_into(rendu_travaux::table)
                .values((
                    rendu_travaux::travaux_id.eq(owner_id),
                    rendu_travaux::titre.eq(&rendu.titre),
                    rendu_travaux::description.eq(rendu.description.as_deref()),
                ))
                .returning(rendu_columns!(rendu_travaux, travaux_id))
                .get_result(conn)
                .await
        }
    }
}

async fn load_rendus(
    conn: &mut AsyncPgConnection,
    owner: RenduOwner,
    rendu_id: Option<i32>,
) -> QueryResult<Vec<RenduRow>> {
    match owner {
        RenduOwner::Intervention(owner_id) => {
            let mut query = rendu_intervention::table
                .filter(rendu_intervention::intervention_id.eq(owner_id))
                .select(rendu_columns!(rendu_intervention, intervention_id))
                .into_boxed();
            if let Some(id) = rendu_id {
                query = query.filter(rendu_intervention::id.eq(id));
            }
            query
                .order_by(rendu_intervention::created_at.desc())
                .load(conn)
                .await
        }
        RenduOwner::Travaux(owner_id) => {
            let mut query = rendu_travaux::table
                .filter(rendu_travaux::travaux_id.eq(owner_id))
                .select(rendu_columns!(rendu_travaux, travaux_id))
                .into_boxed();
            if let Some(id) = rendu_id {
                query = query.filter(rendu_travaux::id.eq(id));
            }
            query
                .order_by(rendu_travaux::created_at.desc())
                .load(conn)
                .await
        }
    }
}

/// Image metadata keyed by rendu id.
async fn load_images(
    conn: &mut AsyncPgConnection,
    owner: RenduOwner,
    rendu_ids: Vec<i32>,
) -> QueryResult<Vec<(i32, ImageMetaRow)>> {
    match owner {
        RenduOwner::Intervention(_) => {
            rendu_intervention_image::table
                .inner_join(image::table)
                .filter(rendu_intervention_image::rendu_id.eq_any(rendu_ids))
                .select((rendu_intervention_image::rendu_id, ImageMetaRow::as_select()))
                .order_by(image::id.asc())
                .load(conn)
                .await
        }
        RenduOwner::Travaux(_) => {
            rendu_travaux_image::table
                .inner_join(image::table)
                .filter(rendu_travaux_image::rendu_id.eq_any(rendu_ids))
                .select((rendu_travaux_image::rendu_id, ImageMetaRow::as_select()))
                .order_by(image::id.asc())
                .load(conn)
                .await
        }
    }
}

/// Store each upload, link it to the rendu and register it as a document.
async fn attach_images(
    conn: &mut AsyncPgConnection,
    owner: RenduOwner,
    rendu_id: i32,
    uploads: &[FileUpload],
) -> QueryResult<()> {
    for upload in uploads {
        let image_id: i32 = diesel::insert_into(image::table)
            .values(NewImageRow::from(upload))
            .returning(image::id)
            .get_result(conn)
            .await?;
        let (rendu_intervention_id, rendu_travaux_id) = match owner {
            RenduOwner::Intervention(_) => {
                diesel::insert_into(rendu_intervention_image::table)
                    .values((
                        rendu_intervention_image::rendu_id.eq(rendu_id),
                        rendu_intervention_image::image_id.eq(image_id),
                    ))
                    .execute(conn)
                    .await?;
                (Some(rendu_id), None)
            }
            RenduOwner::Travaux(_) => {
                diesel::insert_into(rendu_travaux_image::table)
                    .values((
                        rendu_travaux_image::rendu_id.eq(rendu_id),
                        rendu_travaux_image::image_id.eq(image_id),
                    ))
                    .execute(conn)
                    .await?;
                (None, Some(rendu_id))
            }
        };
        diesel::insert_into(document_repertoire::table)
            .values(NewDocumentRow {
                nom_fichier: &upload.name,
                type_mime: &upload.mime,
                taille: upload.size(),
                image_id: Some(image_id),
                rendu_intervention_id,
                rendu_travaux_id,
            })
            .execute(conn)
            .await?;
    }
    Ok(())
}

async fn update_text(
    conn: &mut AsyncPgConnection,
    owner: RenduOwner,
    rendu_id: i32,
    patch: &RenduPatch,
) -> QueryResult<()> {
    if patch.titre.is_none() && patch.description.is_none() {
        return Ok(());
    }
    match owner {
        RenduOwner::Intervention(_) => {
            diesel::update(rendu_intervention::table.find(rendu_id))
                .set((
                    patch.titre.as_deref().map(|titre| rendu_intervention::titre.eq(titre)),
                    patch
                        .description
                        .as_deref()
                        .map(|text| rendu_intervention::description.eq(text)),
                ))
                .execute(conn)
                .await?;
        }
        RenduOwner::Travaux(_) => {
            diesel::update(rendu_travaux::table.find(rendu_id))
                .set((
                    patch.titre.as_deref().map(|titre| rendu_travaux::titre.eq(titre)),
                    patch
                        .description
                        .as_deref()
                        .map(|text| rendu_travaux::description.eq(text)),
                ))
                .execute(conn)
                .await?;
        }
    }
    Ok(())
}

/// Delete the rendu, its register entries and its images.
async fn remove_rendu(
    conn: &mut AsyncPgConnection,
    owner: RenduOwner,
    rendu_id: i32,
) -> QueryResult<bool> {
    let image_ids: Vec<i32> = match owner {
        RenduOwner::Intervention(_) => {
            diesel::delete(document_repertoire::table)
                .filter(document_repertoire::rendu_intervention_id.eq(rendu_id))
                .execute(conn)
                .await?;
            diesel::delete(rendu_intervention_image::table)
                .filter(rendu_intervention_image::rendu_id.eq(rendu_id))
                .returning(rendu_intervention_image::image_id)
                .get_results(conn)
                .await?
        }
        RenduOwner::Travaux(_) => {
            diesel::delete(document_repertoire::table)
                .filter(document_repertoire::rendu_travaux_id.eq(rendu_id))
                .execute(conn)
                .await?;
            diesel::delete(rendu_travaux_image::table)
                .filter(rendu_travaux_image::rendu_id.eq(rendu_id))
                .returning(rendu_travaux_image::image_id)
                .get_results(conn)
                .await?
        }
    };
    let deleted = match owner {
        RenduOwner::Intervention(_) => {
            diesel::delete(rendu_intervention::table.find(rendu_id))
                .execute(conn)
                .await?
        }
        RenduOwner::Travaux(_) => {
            diesel::delete(rendu_travaux::table.find(rendu_id))
                .execute(conn)
                .await?
        }
    };
    if !image_ids.is_empty() {
        diesel::delete(image::table)
            .filter(image::id.eq_any(image_ids))
            .execute(conn)
            .await?;
    }
    Ok(deleted > 0)
}

fn assemble(rows: Vec<RenduRow>, images: Vec<(i32, ImageMetaRow)>) -> Vec<Rendu> {
    let mut by_rendu: HashMap<i32, Vec<ImageMeta>> = HashMap::new();
    for (rendu_id, meta) in images {
        by_rendu.entry(rendu_id).or_default().push(meta.into());
    }
    rows.into_iter()
        .map(|row| {
            let images = by_rendu.remove(&row.id).unwrap_or_default();
            row.into_rendu(images)
        })
        .collect()
}

#[async_trait]
impl RenduRepository for DieselRenduRepository {
    async fn create(&self, owner: RenduOwner, rendu: &NewRendu) -> Result<Rendu, PersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let (row, images) = conn
            .transaction(|conn| {
                async move {
                    let row = insert_rendu(conn, owner, rendu).await?;
                    attach_images(conn, owner, row.id, &rendu.images).await?;
                    let images = load_images(conn, owner, vec![row.id]).await?;
                    Ok((row, images))
                }
                .scope_boxed()
            })
            .await
            .map_err(map_diesel_error)?;
        let images = images.into_iter().map(|(_, meta)| meta.into()).collect();
        Ok(row.into_rendu(images))
    }

    async fn list(&self, owner: RenduOwner) -> Result<Vec<Rendu>, PersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows = load_rendus(&mut conn, owner, None)
            .await
            .map_err(map_diesel_error)?;
        let ids = rows.iter().map(|row| row.id).collect();
        let images = load_images(&mut conn, owner, ids)
            .await
            .map_err(map_diesel_error)?;
        Ok(assemble(rows, images))
    }

    async fn find(
        &self,
        owner: RenduOwner,
        rendu_id: i32,
    ) -> Result<Option<Rendu>, PersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows = load_rendus(&mut conn, owner, Some(rendu_id))
            .await
            .map_err(map_diesel_error)?;
        if rows.is_empty() {
            return Ok(None);
        }
        let images = load_images(&mut conn, owner, vec![rendu_id])
            .await
            .map_err(map_diesel_error)?;
        Ok(assemble(rows, images).into_iter().next())
    }

    async fn update(
        &self,
        owner: RenduOwner,
        rendu_id: i32,
        patch: &RenduPatch,
    ) -> Result<Option<Rendu>, PersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let loaded = conn
            .transaction(|conn| {
                async move {
                    if load_rendus(conn, owner, Some(rendu_id)).await?.is_empty() {
                        return Ok(None);
                    }
                    update_text(conn, owner, rendu_id, patch).await?;
                    attach_images(conn, owner, rendu_id, &patch.images).await?;
                    let rows = load_rendus(conn, owner, Some(rendu_id)).await?;
                    let images = load_images(conn, owner, vec![rendu_id]).await?;
                    Ok(Some((rows, images)))
                }
                .scope_boxed()
            })
            .await
            .map_err(map_diesel_error)?;
        Ok(loaded.and_then(|(rows, images)| assemble(rows, images).into_iter().next()))
    }

    async fn delete(&self, owner: RenduOwner, rendu_id: i32) -> Result<bool, PersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        conn.transaction(|conn| {
            async move {
                if load_rendus(conn, owner, Some(rendu_id)).await?.is_empty() {
                    return Ok(false);
                }
                remove_rendu(conn, owner, rendu_id).await
            }
            .scope_boxed()
        })
        .await
        .map_err(map_diesel_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use rstest::rstest;

    fn rendu_row(id: i32) -> RenduRow {
        RenduRow {
            id,
            owner_id: 7,
            titre: format!("Rendu {id}"),
            description: None,
            created_at: Utc
                .with_ymd_and_hms(2026, 3, 2, 10, 0, 0)
                .single()
                .expect("valid date"),
        }
    }

    fn image_row(id: i32) -> ImageMetaRow {
        ImageMetaRow {
            id,
            nom: format!("photo-{id}.jpg"),
            type_mime: "image/jpeg".into(),
            taille: 128,
            created_at: Utc
                .with_ymd_and_hms(2026, 3, 2, 10, 5, 0)
                .single()
                .expect("valid date"),
        }
    }

    #[rstest]
    fn images_are_grouped_under_their_rendu() {
        let rendus = assemble(
            vec![rendu_row(1), rendu_row(2)],
            vec![(2, image_row(10)), (1, image_row(11)), (2, image_row(12))],
        );
        let ids: Vec<Vec<i32>> = rendus
            .iter()
            .map(|rendu| rendu.images.iter().map(|meta| meta.id).collect())
            .collect();
        assert_eq!(ids, vec![vec![11], vec![10, 12]]);
    }

    #[rstest]
    fn rendus_without_images_keep_an_empty_list() {
        let rendus = assemble(vec![rendu_row(3)], Vec::new());
        assert_eq!(rendus.len(), 1);
        assert!(rendus.iter().all(|rendu| rendu.images.is_empty()));
    }
}
