//! Route table for `/api/v1`.
//!
//! Every resource follows the same shape: `/<resource>/` lists (GET) and creates (POST),
//! `/<resource>/:id/` retrieves (GET), replaces (PUT) and deletes (DELETE).

pub mod account;
pub mod camera;
/// Chatbot endpoints
pub mod chatbot;
/// Document endpoints
pub mod document;
/// Receipt endpoints
pub mod receipt;
/// Receipt item endpoints
pub mod receipt_item;
/// Report endpoints
pub mod report;
/// Vendor endpoints
pub mod vendor;

use super::AppState;
use axum::{
    Json, Router,
    routing::{get, post},
};
use serde_json::{Value, json};

/// Liveness check; needs no authentication.
pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// Every versioned route, to be nested under `/api/v1`.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/report/", get(report::list).post(report::create))
        .route("/report/generate/", post(report::generate))
        .route(
            "/report/:id/",
            get(report::retrieve)
                .put(report::replace)
                .delete(report::destroy),
        )
        .route("/document/", get(document::list).post(document::create))
        .route(
            "/document/:id/",
            get(document::retrieve)
                .put(document::replace)
                .delete(document::destroy),
        )
        .route("/receipt/", get(receipt::list).post(receipt::create))
        .route(
            "/receipt/:id/",
            get(receipt::retrieve)
                .put(receipt::replace)
                .delete(receipt::destroy),
        )
        .route("/vendor/", get(vendor::list).post(vendor::create))
        .route(
            "/vendor/:id/",
            get(vendor::retrieve)
                .put(vendor::replace)
                .delete(vendor::destroy),
        )
        .route(
            "/receipt-item/",
            get(receipt_item::list).post(receipt_item::create),
        )
        .route(
            "/receipt-item/:id/",
            get(receipt_item::retrieve)
                .put(receipt_item::replace)
                .delete(receipt_item::destroy),
        )
        .route("/camera/", get(camera::list).post(camera::create))
        .route("/camera/process_receipt/", post(camera::process_receipt))
        .route(
            "/camera/:id/",
            get(camera::retrieve)
                .put(camera::replace)
                .delete(camera::destroy),
        )
        .route("/account/sso/google/", post(account::google_sso))
        .route("/account/authenticate/", post(account::authenticate))
        .route("/account/registration/", post(account::register))
        .route("/account/user/", get(account::list))
        .route(
            "/account/user/:id/",
            get(account::retrieve)
                .put(account::replace)
                .delete(account::destroy),
        )
        .route("/chatbot/chat/", post(chatbot::ask))
        .route("/chatbot/chat/history/", get(chatbot::history))
}

#[cfg(test)]
pub(crate) mod testing {
    //! Helpers for driving the router in handler tests.
    #![allow(clippy::unwrap_used)]

    use crate::{
        api::{AppState, router},
        config::AppConfig,
        core::{
            account,
            chatbot::Corpus,
            identity::{GoogleIdentity, IdentityVerifier, VerifyFuture},
        },
        errors::Error,
        test_utils::{create_test_user, setup_test_db},
    };
    use axum::{
        Router,
        body::{Body, to_bytes},
        http::{Method, Request, StatusCode, header},
    };
    use sea_orm::DatabaseConnection;
    use serde_json::Value;
    use std::sync::Arc;
    use tower::ServiceExt;

    /// Accepts exactly one token, `"valid-google-token"`.
    pub struct StubVerifier;

    impl IdentityVerifier for StubVerifier {
        fn verify<'a>(&'a self, id_token: &'a str) -> VerifyFuture<'a> {
            Box::pin(async move {
                if id_token == "valid-google-token" {
                    Ok(GoogleIdentity {
                        sub: "google-sub-1".to_string(),
                        email: "jane.google@example.com".to_string(),
                        email_verified: true,
                        name: "Jane Google".to_string(),
                        given_name: "Jane".to_string(),
                        family_name: "Google".to_string(),
                        picture: "https://example.com/jane.png".to_string(),
                    })
                } else {
                    Err(Error::unauthorized("Invalid Token ID"))
                }
            })
        }
    }

    pub const CORPUS: &str = "\
Q: What is a tax deduction?
A: An amount subtracted from taxable income.
";

    pub struct TestApp {
        pub db: DatabaseConnection,
        pub app: Router,
    }

    impl TestApp {
        pub async fn new() -> Self {
            let db = setup_test_db().await.unwrap();
            let state = AppState::new(
                db.clone(),
                AppConfig::default(),
                Corpus::parse(CORPUS),
                Arc::new(StubVerifier),
            );
            Self {
                db,
                app: router(state),
            }
        }

        /// Registers `username` and returns a bearer token for them.
        pub async fn token_for(&self, username: &str) -> String {
            let user = create_test_user(&self.db, username).await.unwrap();
            account::issue_token(&self.db, user.id).await.unwrap()
        }

        pub async fn request(
            &self,
            method: Method,
            uri: &str,
            token: Option<&str>,
            body: Option<Value>,
        ) -> (StatusCode, Vec<u8>) {
            let mut builder = Request::builder().method(method).uri(uri);
            if let Some(token) = token {
                builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
            }
            let request = match body {
                Some(json) => builder
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(json.to_string()))
                    .unwrap(),
                None => builder.body(Body::empty()).unwrap(),
            };

            let response = self.app.clone().oneshot(request).await.unwrap();
            let status = response.status();
            let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
            (status, bytes.to_vec())
        }

        /// Like [`TestApp::request`], but parses the body as JSON.
        pub async fn json(
            &self,
            method: Method,
            uri: &str,
            token: Option<&str>,
            body: Option<Value>,
        ) -> (StatusCode, Value) {
            let (status, bytes) = self.request(method, uri, token, body).await;
            let value = if bytes.is_empty() {
                Value::Null
            } else {
                serde_json::from_slice(&bytes).unwrap()
            };
            (status, value)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::TestApp;
    use axum::http::{Method, StatusCode};
    use serde_json::json;

    #[tokio::test]
    async fn test_health_is_public() {
        let app = TestApp::new().await;
        let (status, body) = app.json(Method::GET, "/api/health", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "status": "ok" }));
    }

    #[tokio::test]
    async fn test_protected_routes_require_token() {
        let app = TestApp::new().await;
        for uri in [
            "/api/v1/report/",
            "/api/v1/document/",
            "/api/v1/receipt/",
            "/api/v1/vendor/",
            "/api/v1/receipt-item/",
            "/api/v1/camera/",
            "/api/v1/account/user/",
            "/api/v1/chatbot/chat/history/",
        ] {
            let (status, _) = app.json(Method::GET, uri, None, None).await;
            assert_eq!(status, StatusCode::UNAUTHORIZED, "{uri}");
        }

        let (status, body) = app
            .json(Method::GET, "/api/v1/vendor/", Some("bogus"), None)
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body, json!({ "error": "Invalid token" }));
    }

    #[tokio::test]
    async fn test_malformed_json_is_non_field_error() {
        let app = TestApp::new().await;
        let token = app.token_for("jane").await;
        let (status, body) = app
            .json(
                Method::POST,
                "/api/v1/vendor/",
                Some(&token),
                Some(json!({ "name": 42 })),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["non_field_errors"].is_array());
    }
}
