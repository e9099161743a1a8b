//! Image business logic - Receipt photos taken with the camera.
//!
//! Like documents, images are private to the user who uploaded them.

use crate::{
    core::validation::FieldErrors,
    entities::{Image, image},
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, Set, prelude::*};
use serde::Deserialize;
use tracing::info;

/// Raw image request body.
#[derive(Debug, Default, Deserialize)]
pub struct ImagePayload {
    pub title: Option<String>,
    pub image_url: Option<String>,
}

/// Validated image fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageInput {
    pub title: String,
    pub image_url: String,
}

impl ImagePayload {
    /// Checks the title and URL.
    pub fn validate(self) -> Result<ImageInput> {
        let mut errors = FieldErrors::new();
        let title = errors.text("title", self.title);
        // Hosting providers hand back bare paths as well as URLs, so any text is accepted
        let image_url = errors.text("image_url", self.image_url);

        match (title, image_url) {
            (Some(title), Some(image_url)) if errors.is_empty() => {
                Ok(ImageInput { title, image_url })
            }
            _ => Err(errors.into()),
        }
    }
}

/// Lists the user's images, ordered by id.
pub async fn list_images(db: &DatabaseConnection, user_id: i64) -> Result<Vec<image::Model>> {
    Image::find()
        .filter(image::Column::UserId.eq(user_id))
        .order_by_asc(image::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Finds one of the user's images, returning None if it is missing or not theirs.
pub async fn find_image(
    db: &DatabaseConnection,
    user_id: i64,
    image_id: i64,
) -> Result<Option<image::Model>> {
    Image::find_by_id(image_id)
        .filter(image::Column::UserId.eq(user_id))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Retrieves one of the user's images.
///
/// # Errors
/// Returns `Error::NotFound` if the image does not exist or belongs to someone else.
pub async fn get_image(db: &DatabaseConnection, user_id: i64, image_id: i64) -> Result<image::Model> {
    find_image(db, user_id, image_id)
        .await?
        .ok_or(Error::not_found("image", image_id))
}

/// Stores a new image owned by `user_id`.
pub async fn create_image(
    db: &DatabaseConnection,
    user_id: i64,
    input: ImageInput,
) -> Result<image::Model> {
    let now = chrono::Utc::now();
    let image = image::ActiveModel {
        title: Set(input.title),
        user_id: Set(user_id),
        image_url: Set(input.image_url),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };
    let created = image.insert(db).await?;
    info!("Created image {} for user {}", created.id, user_id);
    Ok(created)
}

/// Replaces the title and URL of one of the user's images.
pub async fn replace_image(
    db: &DatabaseConnection,
    user_id: i64,
    image_id: i64,
    input: ImageInput,
) -> Result<image::Model> {
    let mut image: image::ActiveModel = get_image(db, user_id, image_id).await?.into();
    image.title = Set(input.title);
    image.image_url = Set(input.image_url);
    image.updated_at = Set(chrono::Utc::now());
    image.update(db).await.map_err(Into::into)
}

/// Deletes one of the user's images. Receipts captured from it are deleted too.
pub async fn delete_image(db: &DatabaseConnection, user_id: i64, image_id: i64) -> Result<()> {
    get_image(db, user_id, image_id).await?;
    Image::delete_by_id(image_id).exec(db).await?;
    info!("Deleted image {}", image_id);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::*;

    #[test]
    fn test_payload_rejects_blank_title() {
        let payload = ImagePayload {
            title: Some("  ".to_string()),
            image_url: Some("receipts/abc.jpg".to_string()),
        };
        assert!(matches!(payload.validate(), Err(Error::Validation { .. })));
    }

    #[tokio::test]
    async fn test_image_lifecycle() -> Result<()> {
        let (db, owner) = setup_with_user().await?;
        let created = create_image(
            &db,
            owner.id,
            ImageInput {
                title: "Lunch receipt".to_string(),
                image_url: "https://img.example.com/lunch.jpg".to_string(),
            },
        )
        .await?;
        assert_eq!(get_image(&db, owner.id, created.id).await?, created);

        let replaced = replace_image(
            &db,
            owner.id,
            created.id,
            ImageInput {
                title: "Dinner receipt".to_string(),
                image_url: "https://img.example.com/dinner.jpg".to_string(),
            },
        )
        .await?;
        assert_eq!(replaced.title, "Dinner receipt");
        assert_eq!(list_images(&db, owner.id).await?, vec![replaced]);

        delete_image(&db, owner.id, created.id).await?;
        assert!(matches!(
            get_image(&db, owner.id, created.id).await,
            Err(Error::NotFound { .. })
        ));
        assert!(matches!(
            delete_image(&db, owner.id, created.id).await,
            Err(Error::NotFound { .. })
        ));
        Ok(())
    }

    #[tokio::test]
    async fn test_images_are_private() -> Result<()> {
        let (db, owner) = setup_with_user().await?;
        let stranger = create_test_user(&db, "stranger").await?;
        let created = create_test_image(&db, owner.id).await?;

        assert!(find_image(&db, stranger.id, created.id).await?.is_none());
        assert!(list_images(&db, stranger.id).await?.is_empty());
        Ok(())
    }
}
