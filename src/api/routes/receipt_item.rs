use crate::{
    api::{
        AppState,
        extract::{AuthUser, Payload},
    },
    core::receipt_item::{self, ReceiptItemPayload, ReceiptItemView},
    errors::Result,
};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

/// `GET /receipt-item/`: the caller's receipt items.
pub async fn list(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Json<Vec<ReceiptItemView>>> {
    Ok(Json(receipt_item::list_items(&state.db, user.id).await?))
}

/// `POST /receipt-item/`: adds an item to one of the caller's receipts.
pub async fn create(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Payload(payload): Payload<ReceiptItemPayload>,
) -> Result<(StatusCode, Json<ReceiptItemView>)> {
    let created = receipt_item::create_item(&state.db, user.id, payload.validate()?).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// `GET /receipt-item/:id/`: one of the caller's receipt items.
pub async fn retrieve(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<ReceiptItemView>> {
    Ok(Json(receipt_item::get_item(&state.db, user.id, id).await?))
}

/// `PUT /receipt-item/:id/`: replaces every writable field.
pub async fn replace(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<i64>,
    Payload(payload): Payload<ReceiptItemPayload>,
) -> Result<Json<ReceiptItemView>> {
    let input = payload.validate()?;
    Ok(Json(receipt_item::replace_item(&state.db, user.id, id, input).await?))
}

/// `DELETE /receipt-item/:id/`
pub async fn destroy(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<i64>,
) -> Result<StatusCode> {
    receipt_item::delete_item(&state.db, user.id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use crate::{
        api::routes::testing::TestApp,
        core::account,
        test_utils::{create_test_image, create_test_receipt},
    };
    use axum::http::{Method, StatusCode};
    use rust_decimal::Decimal;
    use serde_json::json;

    #[tokio::test]
    async fn test_item_nests_receipt_and_computes_subtotal() {
        let app = TestApp::new().await;
        let token = app.token_for("jane").await;
        let jane = account::user_for_token(&app.db, &token).await.unwrap();
        let image = create_test_image(&app.db, jane.id).await.unwrap();
        let receipt = create_test_receipt(&app.db, jane.id, image.id, None)
            .await
            .unwrap();

        let (status, created) = app
            .json(
                Method::POST,
                "/api/v1/receipt-item/",
                Some(&token),
                Some(json!({
                    "title": "Stapler",
                    "quantity": 2,
                    "price": "4.50",
                    "receipt": receipt.id,
                    "deductable_amount": "9.00"
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        let subtotal: Decimal = created["subtotal_expenditure"].as_str().unwrap().parse().unwrap();
        assert_eq!(subtotal, Decimal::new(9, 0));
        assert_eq!(created["receipt"]["id"], receipt.id);
        assert_eq!(created["receipt"]["image"], image.id);

        let uri = format!("/api/v1/receipt-item/{}/", created["id"]);
        let (status, _) = app.request(Method::DELETE, &uri, Some(&token), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (status, _) = app.request(Method::GET, &uri, Some(&token), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_mismatched_subtotal_is_rejected() {
        let app = TestApp::new().await;
        let token = app.token_for("jane").await;

        let (status, body) = app
            .json(
                Method::POST,
                "/api/v1/receipt-item/",
                Some(&token),
                Some(json!({
                    "title": "Stapler",
                    "quantity": 2,
                    "price": "4.50",
                    "subtotal_expenditure": "10.00",
                    "receipt": 1,
                    "deductable_amount": "9.00"
                })),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["subtotal_expenditure"].is_array());
    }
}
