use super::AppState;
use crate::{core::account, entities::user, errors::Error};
use axum::{
    async_trait,
    extract::{FromRequest, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts},
};

/// The signed-in user, resolved from an `Authorization: Bearer <token>` header.
///
/// The older `Token <token>` scheme is accepted too.
#[derive(Debug, Clone)]
pub struct AuthUser(pub user::Model);

/// JSON request body whose rejections become validation errors.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(Error))]
pub struct Payload<T>(pub T);

fn token_from_header(value: &str) -> Option<&str> {
    let (scheme, token) = value.trim().split_once(' ')?;
    let token = token.trim();
    let known = scheme.eq_ignore_ascii_case("bearer") || scheme.eq_ignore_ascii_case("token");
    (known && !token.is_empty()).then_some(token)
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .ok_or_else(|| Error::unauthorized("Authentication credentials were not provided."))?;
        let token = header
            .to_str()
            .ok()
            .and_then(token_from_header)
            .ok_or_else(|| Error::unauthorized("Invalid token header."))?;

        account::user_for_token(&state.db, token).await.map(AuthUser)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_from_header() {
        assert_eq!(token_from_header("Bearer abc123"), Some("abc123"));
        assert_eq!(token_from_header("Token abc123"), Some("abc123"));
        assert_eq!(token_from_header("bearer  abc123 "), Some("abc123"));
        assert_eq!(token_from_header("Basic dXNlcjpwdw=="), None);
        assert_eq!(token_from_header("Bearer"), None);
        assert_eq!(token_from_header("Bearer   "), None);
    }
}
