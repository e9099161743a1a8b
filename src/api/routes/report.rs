use crate::{
    api::{
        AppState,
        extract::{AuthUser, Payload},
    },
    core::report::{self, GeneratePayload, ReportPayload},
    entities::ReportModel,
    errors::Result,
};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

/// `GET /report/`: the caller's reports.
pub async fn list(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Json<Vec<ReportModel>>> {
    Ok(Json(report::list_reports(&state.db, user.id).await?))
}

/// `POST /report/`: creates a report owned by the caller.
pub async fn create(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Payload(payload): Payload<ReportPayload>,
) -> Result<(StatusCode, Json<ReportModel>)> {
    let created = report::create_report(&state.db, user.id, payload.validate()?).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// Computes and stores a report for the period around the given date.
pub async fn generate(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Payload(payload): Payload<GeneratePayload>,
) -> Result<(StatusCode, Json<ReportModel>)> {
    let generated = report::generate_report(&state.db, user.id, payload.validate()?).await?;
    Ok((StatusCode::CREATED, Json(generated)))
}

/// `GET /report/:id/`: one of the caller's reports.
pub async fn retrieve(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<ReportModel>> {
    Ok(Json(report::get_report(&state.db, user.id, id).await?))
}

/// `PUT /report/:id/`: replaces every writable field.
pub async fn replace(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<i64>,
    Payload(payload): Payload<ReportPayload>,
) -> Result<Json<ReportModel>> {
    let input = payload.validate()?;
    Ok(Json(report::replace_report(&state.db, user.id, id, input).await?))
}

/// `DELETE /report/:id/`
pub async fn destroy(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<i64>,
) -> Result<StatusCode> {
    report::delete_report(&state.db, user.id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
