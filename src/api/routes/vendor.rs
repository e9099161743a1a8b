use crate::{
    api::{
        AppState,
        extract::{AuthUser, Payload},
    },
    core::vendor::{self, VendorPayload},
    entities::VendorModel,
    errors::Result,
};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

/// `GET /vendor/`: every vendor. Vendors are shared between users.
pub async fn list(
    State(state): State<AppState>,
    AuthUser(_user): AuthUser,
) -> Result<Json<Vec<VendorModel>>> {
    Ok(Json(vendor::list_vendors(&state.db).await?))
}

/// `POST /vendor/`
pub async fn create(
    State(state): State<AppState>,
    AuthUser(_user): AuthUser,
    Payload(payload): Payload<VendorPayload>,
) -> Result<(StatusCode, Json<VendorModel>)> {
    let created = vendor::create_vendor(&state.db, payload.validate()?).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// `GET /vendor/:id/`
pub async fn retrieve(
    State(state): State<AppState>,
    AuthUser(_user): AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<VendorModel>> {
    Ok(Json(vendor::get_vendor(&state.db, id).await?))
}

/// `PUT /vendor/:id/`: replaces every field.
pub async fn replace(
    State(state): State<AppState>,
    AuthUser(_user): AuthUser,
    Path(id): Path<i64>,
    Payload(payload): Payload<VendorPayload>,
) -> Result<Json<VendorModel>> {
    let input = payload.validate()?;
    Ok(Json(vendor::replace_vendor(&state.db, id, input).await?))
}

/// `DELETE /vendor/:id/`: receipts keep existing without the vendor.
pub async fn destroy(
    State(state): State<AppState>,
    AuthUser(_user): AuthUser,
    Path(id): Path<i64>,
) -> Result<StatusCode> {
    vendor::delete_vendor(&state.db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
