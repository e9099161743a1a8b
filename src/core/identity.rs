//! Google ID-token verification.
//!
//! The service never checks token signatures itself. It hands the token to Google's
//! token-info endpoint and trusts the claims that come back, after making sure the
//! token was issued by Google for our OAuth client.

use crate::{
    config::settings::AuthConfig,
    errors::{Error, Result},
};
use serde::{Deserialize, Deserializer};
use std::{future::Future, pin::Pin, time::Duration};
use tracing::{debug, warn};

/// Issuers Google uses in the `iss` claim.
const GOOGLE_ISSUERS: [&str; 2] = ["accounts.google.com", "https://accounts.google.com"];

/// Claims about a Google account taken from a verified ID token.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GoogleIdentity {
    /// Stable Google account id
    pub sub: String,
    /// Primary account email
    pub email: String,
    /// Google has confirmed the holder owns `email`
    #[serde(default, deserialize_with = "flag")]
    pub email_verified: bool,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub given_name: String,
    #[serde(default)]
    pub family_name: String,
    #[serde(default)]
    pub picture: String,
}

// Token-info sends booleans as strings ("true"); ID-token claims send real booleans.
fn flag<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<bool, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Text(String),
    }

    Ok(match Flag::deserialize(deserializer)? {
        Flag::Bool(value) => value,
        Flag::Text(text) => text.eq_ignore_ascii_case("true"),
    })
}

/// Future returned by [`IdentityVerifier::verify`].
pub type VerifyFuture<'a> = Pin<Box<dyn Future<Output = Result<GoogleIdentity>> + Send + 'a>>;

/// Turns an opaque ID token into the identity it vouches for.
pub trait IdentityVerifier: Send + Sync {
    /// Resolves to the token's identity, or `Error::Unauthorized` if the token is not valid.
    fn verify<'a>(&'a self, id_token: &'a str) -> VerifyFuture<'a>;
}

#[derive(Debug, Deserialize)]
struct TokenInfo {
    #[serde(flatten)]
    identity: GoogleIdentity,
    #[serde(default)]
    aud: String,
    #[serde(default)]
    iss: String,
}

/// Verifies tokens against Google's token-info endpoint.
#[derive(Debug, Clone)]
pub struct GoogleTokenVerifier {
    client: reqwest::Client,
    token_info_url: String,
    client_id: String,
}

impl GoogleTokenVerifier {
    /// Builds a verifier from the `[auth]` configuration.
    pub fn new(config: &AuthConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .user_agent(concat!("deduction-buddy/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            token_info_url: config.token_info_url.clone(),
            client_id: config.google_client_id.clone(),
        })
    }

    async fn fetch(&self, id_token: &str) -> Result<GoogleIdentity> {
        let response = self
            .client
            .get(&self.token_info_url)
            .query(&[("id_token", id_token)])
            .send()
            .await?;

        if !response.status().is_success() {
            debug!("Token info endpoint rejected token: {}", response.status());
            return Err(Error::unauthorized("Invalid Token ID"));
        }

        let info: TokenInfo = response.json().await?;
        check_claims(&info, &self.client_id)?;
        Ok(info.identity)
    }
}

impl IdentityVerifier for GoogleTokenVerifier {
    fn verify<'a>(&'a self, id_token: &'a str) -> VerifyFuture<'a> {
        Box::pin(self.fetch(id_token))
    }
}

fn check_claims(info: &TokenInfo, client_id: &str) -> Result<()> {
    if !GOOGLE_ISSUERS.contains(&info.iss.as_str()) {
        warn!("Rejected ID token from unexpected issuer {:?}", info.iss);
        return Err(Error::unauthorized("Invalid Token ID"));
    }
    if !client_id.is_empty() && info.aud != client_id {
        warn!("Rejected ID token issued for another client");
        return Err(Error::unauthorized("Invalid Token ID"));
    }
    if info.identity.sub.is_empty() || info.identity.email.is_empty() {
        return Err(Error::unauthorized("Invalid Token ID"));
    }
    if !info.identity.email_verified {
        warn!("Rejected ID token with unverified email");
        return Err(Error::unauthorized("Google account email is not verified"));
    }
    Ok(())
}
