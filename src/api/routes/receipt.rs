use crate::{
    api::{
        AppState,
        extract::{AuthUser, Payload},
    },
    core::receipt::{self, ReceiptPayload, ReceiptView},
    errors::Result,
};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

/// `GET /receipt/`: the caller's receipts.
pub async fn list(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Json<Vec<ReceiptView>>> {
    Ok(Json(receipt::list_receipts(&state.db, user.id).await?))
}

/// `POST /receipt/`: creates a receipt owned by the caller.
pub async fn create(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Payload(payload): Payload<ReceiptPayload>,
) -> Result<(StatusCode, Json<ReceiptView>)> {
    let created = receipt::create_receipt(&state.db, user.id, payload.validate()?).await?;
    let view = receipt::view_receipt(&state.db, created).await?;
    Ok((StatusCode::CREATED, Json(view)))
}

/// `GET /receipt/:id/`: one of the caller's receipts.
pub async fn retrieve(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<ReceiptView>> {
    let found = receipt::get_receipt(&state.db, user.id, id).await?;
    Ok(Json(receipt::view_receipt(&state.db, found).await?))
}

/// `PUT /receipt/:id/`: replaces every writable field.
pub async fn replace(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<i64>,
    Payload(payload): Payload<ReceiptPayload>,
) -> Result<Json<ReceiptView>> {
    let input = payload.validate()?;
    let replaced = receipt::replace_receipt(&state.db, user.id, id, input).await?;
    Ok(Json(receipt::view_receipt(&state.db, replaced).await?))
}

/// `DELETE /receipt/:id/`
pub async fn destroy(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<i64>,
) -> Result<StatusCode> {
    receipt::delete_receipt(&state.db, user.id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
