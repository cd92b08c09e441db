//! Report handling shared by interventions and work orders.

use std::sync::Arc;

use crate::domain::ports::RenduRepository;
use crate::domain::validation::{optional_text, required_text};
use crate::domain::{Error, NewRendu, Rendu, RenduInput, RenduOwner, RenduPatch, decode_files};

/// Validates rendu payloads and forwards them to the repository.
///
/// Callers check that the owner exists first.
#[derive(Clone)]
pub struct RenduBook {
    rendus: Arc<dyn RenduRepository>,
}

impl RenduBook {
    pub fn new(rendus: Arc<dyn RenduRepository>) -> Self {
        Self { rendus }
    }

    pub async fn list(&self, owner: RenduOwner) -> Result<Vec<Rendu>, Error> {
        Ok(self.rendus.list(owner).await?)
    }

    pub async fn get(&self, owner: RenduOwner, rendu_id: i32) -> Result<Rendu, Error> {
        self.rendus
            .find(owner, rendu_id)
            .await?
            .ok_or_else(|| not_found(owner, rendu_id))
    }

    pub async fn create(&self, owner: RenduOwner, input: RenduInput) -> Result<Rendu, Error> {
        let rendu = NewRendu {
            titre: required_text("titre", input.titre)?,
            description: optional_text(input.description),
            images: decode_files(input.images)?,
        };
        Ok(self.rendus.create(owner, &rendu).await?)
    }

    pub async fn update(
        &self,
        owner: RenduOwner,
        rendu_id: i32,
        input: RenduInput,
    ) -> Result<Rendu, Error> {
        let patch = RenduPatch {
            titre: optional_text(input.titre),
            description: optional_text(input.description),
            images: decode_files(input.images)?,
        };
        self.rendus
            .update(owner, rendu_id, &patch)
            .await?
            .ok_or_else(|| not_found(owner, rendu_id))
    }

    pub async fn delete(&self, owner: RenduOwner, rendu_id: i32) -> Result<(), Error> {
        if self.rendus.delete(owner, rendu_id).await? {
            Ok(())
        } else {
            Err(not_found(owner, rendu_id))
        }
    }
}

fn not_found(owner: RenduOwner, rendu_id: i32) -> Error {
    Error::not_found(format!(
        "rendu {rendu_id} not found for {} {}",
        owner.label(),
        owner.id()
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ErrorCode;
    use crate::domain::FileInput;
    use crate::domain::ports::MockRenduRepository;
    use chrono::Utc;

    fn rendu(owner_id: i32) -> Rendu {
        Rendu {
            id: 3,
            owner_id,
            titre: "Pose".into(),
            description: None,
            created_at: Utc::now(),
            images: Vec::new(),
        }
    }

    #[tokio::test]
    async fn create_decodes_images_before_persisting() {
        let mut repo = MockRenduRepository::new();
        repo.expect_create()
            .withf(|owner, rendu| {
                *owner == RenduOwner::Travaux(8)
                    && rendu.images.len() == 1
                    && rendu.images[0].data == b"hello"
            })
            .times(1)
            .return_once(|_, _| Ok(rendu(8)));
        let book = RenduBook::new(Arc::new(repo));
        let input = RenduInput {
            titre: Some("Pose".into()),
            description: None,
            images: vec![FileInput {
                name: Some("a.png".into()),
                mime: Some("image/png".into()),
                data: Some("aGVsbG8=".into()),
            }],
        };
        let created = book
            .create(RenduOwner::Travaux(8), input)
            .await
            .expect("created");
        assert_eq!(created.owner_id, 8);
    }

    #[tokio::test]
    async fn create_requires_title() {
        let mut repo = MockRenduRepository::new();
        repo.expect_create().times(0);
        let book = RenduBook::new(Arc::new(repo));
        let err = book
            .create(RenduOwner::Intervention(1), RenduInput::default())
            .await
            .expect_err("missing title");
        assert_eq!(err.code(), ErrorCode::InvalidRequest);
    }

    #[tokio::test]
    async fn delete_reports_missing_rendu() {
        let mut repo = MockRenduRepository::new();
        repo.expect_delete().return_once(|_, _| Ok(false));
        let book = RenduBook::new(Arc::new(repo));
        let err = book
            .delete(RenduOwner::Intervention(1), 99)
            .await
            .expect_err("missing");
        assert_eq!(err.code(), ErrorCode::NotFound);
    }
}
