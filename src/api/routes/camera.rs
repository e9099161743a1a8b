//! Image endpoints, plus parsing of text read off a receipt photo.

use crate::{
    api::{
        AppState,
        extract::{AuthUser, Payload},
    },
    core::{
        image::{self, ImagePayload},
        receipt_text::{ParsedReceipt, ReceiptTextPayload, parse_receipt_text},
    },
    entities::ImageModel,
    errors::Result,
};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

/// `GET /camera/`: the caller's images.
pub async fn list(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Json<Vec<ImageModel>>> {
    Ok(Json(image::list_images(&state.db, user.id).await?))
}

/// `POST /camera/`: creates a image owned by the caller.
pub async fn create(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Payload(payload): Payload<ImagePayload>,
) -> Result<(StatusCode, Json<ImageModel>)> {
    let created = image::create_image(&state.db, user.id, payload.validate()?).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// `GET /camera/:id/`: one of the caller's images.
pub async fn retrieve(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<ImageModel>> {
    Ok(Json(image::get_image(&state.db, user.id, id).await?))
}

/// `PUT /camera/:id/`: replaces every writable field.
pub async fn replace(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<i64>,
    Payload(payload): Payload<ImagePayload>,
) -> Result<Json<ImageModel>> {
    let input = payload.validate()?;
    Ok(Json(image::replace_image(&state.db, user.id, id, input).await?))
}

/// `DELETE /camera/:id/`
pub async fn destroy(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<i64>,
) -> Result<StatusCode> {
    image::delete_image(&state.db, user.id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Structures OCR text; stores nothing.
pub async fn process_receipt(
    AuthUser(_user): AuthUser,
    Payload(payload): Payload<ReceiptTextPayload>,
) -> Result<Json<ParsedReceipt>> {
    let text = payload.validate()?;
    Ok(Json(parse_receipt_text(&text)))
}

#[cfg(test)]
mod tests {
    use crate::api::routes::testing::TestApp;
    use axum::http::{Method, StatusCode};
    use serde_json::json;

    #[tokio::test]
    async fn test_image_delete_then_get_is_not_found() {
        let app = TestApp::new().await;
        let token = app.token_for("jane").await;

        let (status, created) = app
            .json(
                Method::POST,
                "/api/v1/camera/",
                Some(&token),
                Some(json!({ "title": "Lunch", "image_url": "https://img.example.com/1.jpg" })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["title"], "Lunch");

        let uri = format!("/api/v1/camera/{}/", created["id"]);
        let (status, body) = app.request(Method::DELETE, &uri, Some(&token), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        assert!(body.is_empty());

        let (status, _) = app.request(Method::GET, &uri, Some(&token), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_process_receipt_text() {
        let app = TestApp::new().await;
        let token = app.token_for("jane").await;

        let (status, body) = app
            .json(
                Method::POST,
                "/api/v1/camera/process_receipt/",
                Some(&token),
                Some(json!({ "text": "CORNER STORE\n2 x Soda  40.00\nTOTAL 40.00" })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["store_info"]["name"], "CORNER STORE");
        assert_eq!(body["items"][0]["description"], "Soda");
        assert_eq!(body["items"][0]["quantity"], 2);
        assert_eq!(body["totals"]["total"], "40.00");
    }
}
