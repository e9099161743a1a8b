use crate::{
    api::{
        AppState,
        extract::{AuthUser, Payload},
    },
    core::document::{self, DocumentPayload},
    entities::DocumentModel,
    errors::Result,
};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

/// `GET /document/`: the caller's documents.
pub async fn list(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Json<Vec<DocumentModel>>> {
    Ok(Json(document::list_documents(&state.db, user.id).await?))
}

/// `POST /document/`: creates a document owned by the caller.
pub async fn create(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Payload(payload): Payload<DocumentPayload>,
) -> Result<(StatusCode, Json<DocumentModel>)> {
    let created = document::create_document(&state.db, user.id, payload.validate()?).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// `GET /document/:id/`: one of the caller's documents.
pub async fn retrieve(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<DocumentModel>> {
    Ok(Json(document::get_document(&state.db, user.id, id).await?))
}

/// `PUT /document/:id/`: replaces every writable field.
pub async fn replace(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<i64>,
    Payload(payload): Payload<DocumentPayload>,
) -> Result<Json<DocumentModel>> {
    let input = payload.validate()?;
    Ok(Json(document::replace_document(&state.db, user.id, id, input).await?))
}

/// `DELETE /document/:id/`
pub async fn destroy(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<i64>,
) -> Result<StatusCode> {
    document::delete_document(&state.db, user.id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
