//! Registration, sign-in and the account resource.
//!
//! Sign-in, Google sign-in and registration are the only public endpoints.

use crate::{
    api::{
        AppState,
        extract::{AuthUser, Payload},
    },
    core::account::{
        self, AccountPayload, CredentialsPayload, GoogleSsoPayload, RegistrationPayload,
    },
    entities::UserModel,
    errors::Result,
};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::Serialize;
use serde_json::{Value, json};
use tracing::info;

/// Body returned by both sign-in endpoints.
#[derive(Debug, Serialize)]
pub struct SignedIn {
    /// Value for the `Authorization: Token <token>` header
    pub token: String,
    /// The signed-in account
    pub user: UserModel,
}

async fn signed_in(state: &AppState, user: UserModel) -> Result<Json<SignedIn>> {
    let token = account::issue_token(&state.db, user.id).await?;
    Ok(Json(SignedIn { token, user }))
}

/// `POST /account/sso/google/`: signs in with a Google ID token, creating the account on first use.
pub async fn google_sso(
    State(state): State<AppState>,
    Payload(payload): Payload<GoogleSsoPayload>,
) -> Result<Json<SignedIn>> {
    let id_token = payload.validate()?;
    let identity = state.verifier.verify(&id_token).await?;
    let user = account::sign_in_with_google(&state.db, identity).await?;
    info!("Google sign-in for user {}", user.id);
    signed_in(&state, user).await
}

/// `POST /account/authenticate/`: username and password sign-in.
pub async fn authenticate(
    State(state): State<AppState>,
    Payload(payload): Payload<CredentialsPayload>,
) -> Result<Json<SignedIn>> {
    let (username, password) = payload.validate()?;
    let user = account::authenticate(&state.db, &username, &password).await?;
    signed_in(&state, user).await
}

/// `POST /account/registration/`
pub async fn register(
    State(state): State<AppState>,
    Payload(payload): Payload<RegistrationPayload>,
) -> Result<(StatusCode, Json<Value>)> {
    let created = account::register(&state.db, payload.validate()?).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "username": created.username })),
    ))
}

/// `GET /account/user/`: every account.
pub async fn list(
    State(state): State<AppState>,
    AuthUser(_user): AuthUser,
) -> Result<Json<Vec<UserModel>>> {
    Ok(Json(account::list_users(&state.db).await?))
}

/// `GET /account/user/:id/`
pub async fn retrieve(
    State(state): State<AppState>,
    AuthUser(_user): AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<UserModel>> {
    Ok(Json(account::get_user(&state.db, id).await?))
}

/// `PUT /account/user/:id/`: only the account holder may update it.
pub async fn replace(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<i64>,
    Payload(payload): Payload<AccountPayload>,
) -> Result<Json<UserModel>> {
    let update = payload.validate()?;
    Ok(Json(account::replace_user(&state.db, user.id, id, update).await?))
}

/// `DELETE /account/user/:id/`: only the account holder may delete it.
pub async fn destroy(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<i64>,
) -> Result<StatusCode> {
    account::delete_user(&state.db, user.id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use crate::{api::routes::testing::TestApp, test_utils::TEST_PASSWORD};
    use axum::http::{Method, StatusCode};
    use serde_json::{Value, json};

    fn registration(username: &str, email: &str) -> Value {
        json!({
            "username": username,
            "first_name": "Jane",
            "last_name": "Doe",
            "email": email,
            "password": "s3cret-pass"
        })
    }

    #[tokio::test]
    async fn test_register_then_sign_in() {
        let app = TestApp::new().await;

        let (status, body) = app
            .json(
                Method::POST,
                "/api/v1/account/registration/",
                None,
                Some(registration("jane", "jane@example.com")),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body, json!({ "username": "jane" }));

        let (status, body) = app
            .json(
                Method::POST,
                "/api/v1/account/authenticate/",
                None,
                Some(json!({ "username": "jane", "password": "s3cret-pass" })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["user"]["username"], "jane");
        assert!(body["user"].get("password").is_none());

        let token = body["token"].as_str().unwrap_or_default().to_string();
        let (status, _) = app
            .json(Method::GET, "/api/v1/account/user/", Some(&token), None)
            .await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_duplicate_registration_conflicts() {
        let app = TestApp::new().await;
        let uri = "/api/v1/account/registration/";

        let (status, _) = app
            .json(Method::POST, uri, None, Some(registration("jane", "jane@example.com")))
            .await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, body) = app
            .json(Method::POST, uri, None, Some(registration("jane2", "jane@example.com")))
            .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body, json!({ "error": "User already exists" }));
    }

    #[tokio::test]
    async fn test_wrong_password_is_unauthorized() {
        let app = TestApp::new().await;
        app.token_for("jane").await;

        let (status, body) = app
            .json(
                Method::POST,
                "/api/v1/account/authenticate/",
                None,
                Some(json!({ "username": "jane", "password": "not-the-password" })),
            )
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(body["error"].is_string());

        let (status, _) = app
            .json(
                Method::POST,
                "/api/v1/account/authenticate/",
                None,
                Some(json!({ "username": "jane", "password": TEST_PASSWORD })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_google_sign_in_creates_then_reuses_account() {
        let app = TestApp::new().await;
        let uri = "/api/v1/account/sso/google/";

        let (status, first) = app
            .json(Method::POST, uri, None, Some(json!({ "id_token": "valid-google-token" })))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(first["user"]["email"], "jane.google@example.com");
        assert_eq!(first["user"]["sso_provider"], "google");

        let (status, second) = app
            .json(Method::POST, uri, None, Some(json!({ "id_token": "valid-google-token" })))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(second["user"]["id"], first["user"]["id"]);
        assert_eq!(second["token"], first["token"]);
    }

    #[tokio::test]
    async fn test_invalid_google_token_is_unauthorized() {
        let app = TestApp::new().await;
        let (status, _) = app
            .json(
                Method::POST,
                "/api/v1/account/sso/google/",
                None,
                Some(json!({ "id_token": "forged" })),
            )
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_cannot_replace_or_delete_other_account() {
        let app = TestApp::new().await;
        let jane = app.token_for("jane").await;
        app.token_for("john").await;
        let (_, users) = app
            .json(Method::GET, "/api/v1/account/user/", Some(&jane), None)
            .await;
        assert_eq!(users[1]["username"], "john");
        let john_id = users[1]["id"].clone();

        let uri = format!("/api/v1/account/user/{john_id}/");
        let (status, _) = app
            .json(
                Method::PUT,
                &uri,
                Some(&jane),
                Some(json!({
                    "username": "hijacked",
                    "first_name": "J",
                    "last_name": "D",
                    "email": "hijacked@example.com"
                })),
            )
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, _) = app.request(Method::DELETE, &uri, Some(&jane), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, body) = app.json(Method::GET, &uri, Some(&jane), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["username"], "john");
    }
}
