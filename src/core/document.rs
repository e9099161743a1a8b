//! Document business logic - Uploaded files a user keeps alongside receipts.
//!
//! Documents are private: every function takes the id of the requesting user and only
//! ever sees that user's documents. Someone else's document is reported as not found.

use crate::{
    core::validation::FieldErrors,
    entities::{Document, DocumentType, document},
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, Set, prelude::*};
use serde::Deserialize;
use tracing::info;

/// Raw document request body.
#[derive(Debug, Default, Deserialize)]
pub struct DocumentPayload {
    pub title: Option<String>,
    pub document_url: Option<String>,
    #[serde(rename = "type")]
    pub document_type: Option<String>,
}

/// Validated document fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentInput {
    pub title: String,
    pub document_url: String,
    pub document_type: DocumentType,
}

impl DocumentPayload {
    /// Checks every field and parses `document_type`.
    pub fn validate(self) -> Result<DocumentInput> {
        let mut errors = FieldErrors::new();
        let title = errors.text("title", self.title);
        let document_url = errors.url("document_url", self.document_url);
        let document_type = errors.choice("type", self.document_type);

        match (title, document_url, document_type) {
            (Some(title), Some(document_url), Some(document_type)) if errors.is_empty() => {
                Ok(DocumentInput {
                    title,
                    document_url,
                    document_type,
                })
            }
            _ => Err(errors.into()),
        }
    }
}

/// Lists the user's documents, ordered by id.
pub async fn list_documents(db: &DatabaseConnection, user_id: i64) -> Result<Vec<document::Model>> {
    Document::find()
        .filter(document::Column::UserId.eq(user_id))
        .order_by_asc(document::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Finds one of the user's documents, returning None if it is missing or not theirs.
pub async fn find_document(
    db: &DatabaseConnection,
    user_id: i64,
    document_id: i64,
) -> Result<Option<document::Model>> {
    Document::find_by_id(document_id)
        .filter(document::Column::UserId.eq(user_id))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Retrieves one of the user's documents.
///
/// # Errors
/// Returns `Error::NotFound` if the document does not exist or belongs to someone else.
pub async fn get_document(
    db: &DatabaseConnection,
    user_id: i64,
    document_id: i64,
) -> Result<document::Model> {
    find_document(db, user_id, document_id)
        .await?
        .ok_or(Error::not_found("document", document_id))
}

/// Stores a new document owned by `user_id`.
pub async fn create_document(
    db: &DatabaseConnection,
    user_id: i64,
    input: DocumentInput,
) -> Result<document::Model> {
    let now = chrono::Utc::now();
    let document = document::ActiveModel {
        title: Set(input.title),
        document_url: Set(input.document_url),
        user_id: Set(user_id),
        document_type: Set(input.document_type),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };
    let created = document.insert(db).await?;
    info!("Created document {} for user {}", created.id, user_id);
    Ok(created)
}

/// Replaces every editable field of one of the user's documents.
pub async fn replace_document(
    db: &DatabaseConnection,
    user_id: i64,
    document_id: i64,
    input: DocumentInput,
) -> Result<document::Model> {
    let mut document: document::ActiveModel =
        get_document(db, user_id, document_id).await?.into();
    document.title = Set(input.title);
    document.document_url = Set(input.document_url);
    document.document_type = Set(input.document_type);
    document.updated_at = Set(chrono::Utc::now());
    document.update(db).await.map_err(Into::into)
}

/// Deletes one of the user's documents, along with receipts extracted from it.
pub async fn delete_document(db: &DatabaseConnection, user_id: i64, document_id: i64) -> Result<()> {
    get_document(db, user_id, document_id).await?;
    Document::delete_by_id(document_id).exec(db).await?;
    info!("Deleted document {}", document_id);
    Ok(())
}
