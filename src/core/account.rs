//! Account business logic - Registration, login, bearer tokens and account management.
//!
//! Users sign in either with a username and password or with a Google ID token. Both
//! paths end in [`issue_token`], which hands out the user's opaque bearer token. Every
//! other request carries that token and is resolved back to its user through
//! [`user_for_token`].

use crate::{
    core::{
        identity::GoogleIdentity,
        password::{hash_password, verify_password},
        validation::FieldErrors,
    },
    entities::{AuthToken, User, auth_token, user},
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, Set, SqlErr, prelude::*};
use serde::Deserialize;
use tracing::{info, instrument, warn};
use uuid::Uuid;

/// Provider name stored on accounts created through Google sign-in.
pub const GOOGLE_PROVIDER: &str = "google";

const BAD_CREDENTIALS: &str = "Failed Authentication: Incorrect Credentials";

/// Raw registration request body.
#[derive(Debug, Default, Deserialize)]
pub struct RegistrationPayload {
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Validated registration data.
#[derive(Debug, Clone)]
pub struct Registration {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
}

impl RegistrationPayload {
    /// Checks that every field is present and well formed.
    pub fn validate(self) -> Result<Registration> {
        let mut errors = FieldErrors::new();
        let username = errors.text("username", self.username);
        let first_name = errors.text("first_name", self.first_name);
        let last_name = errors.text("last_name", self.last_name);
        let email = errors.email("email", self.email);
        let password = password_field(&mut errors, self.password);

        match (username, first_name, last_name, email, password) {
            (Some(username), Some(first_name), Some(last_name), Some(email), Some(password))
                if errors.is_empty() =>
            {
                Ok(Registration {
                    username,
                    first_name,
                    last_name,
                    email,
                    password,
                })
            }
            _ => Err(errors.into()),
        }
    }
}

/// Raw login request body.
#[derive(Debug, Default, Deserialize)]
pub struct CredentialsPayload {
    pub username: Option<String>,
    pub password: Option<String>,
}

impl CredentialsPayload {
    /// Returns `(username, password)` once both are present.
    pub fn validate(self) -> Result<(String, String)> {
        let mut errors = FieldErrors::new();
        let username = errors.text("username", self.username);
        let password = password_field(&mut errors, self.password);
        match (username, password) {
            (Some(username), Some(password)) if errors.is_empty() => Ok((username, password)),
            _ => Err(errors.into()),
        }
    }
}

/// Google sign-in request body.
#[derive(Debug, Default, Deserialize)]
pub struct GoogleSsoPayload {
    pub id_token: Option<String>,
}

impl GoogleSsoPayload {
    /// Returns the ID token once it is present.
    pub fn validate(self) -> Result<String> {
        let mut errors = FieldErrors::new();
        match errors.required("id_token", self.id_token) {
            Some(token) if !token.trim().is_empty() => Ok(token.trim().to_string()),
            Some(_) => {
                errors.add("id_token", crate::core::validation::BLANK);
                Err(errors.into())
            }
            None => Err(errors.into()),
        }
    }
}

/// Raw account update body; `password` and `profile_picture` may be left out.
#[derive(Debug, Default, Deserialize)]
pub struct AccountPayload {
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub profile_picture: Option<String>,
}

/// Validated account update.
#[derive(Debug, Clone)]
pub struct AccountUpdate {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: Option<String>,
    pub profile_picture: String,
}

impl AccountPayload {
    /// Checks the profile fields; `password` and `profile_picture` may be left out.
    pub fn validate(self) -> Result<AccountUpdate> {
        let mut errors = FieldErrors::new();
        let username = errors.text("username", self.username);
        let first_name = errors.text("first_name", self.first_name);
        let last_name = errors.text("last_name", self.last_name);
        let email = errors.email("email", self.email);
        let password = match self.password {
            Some(raw) => password_field(&mut errors, Some(raw)),
            None => None,
        };

        match (username, first_name, last_name, email) {
            (Some(username), Some(first_name), Some(last_name), Some(email))
                if errors.is_empty() =>
            {
                Ok(AccountUpdate {
                    username,
                    first_name,
                    last_name,
                    email,
                    password,
                    profile_picture: self.profile_picture.unwrap_or_default(),
                })
            }
            _ => Err(errors.into()),
        }
    }
}

// Passwords are kept verbatim: surrounding whitespace is significant.
fn password_field(errors: &mut FieldErrors, value: Option<String>) -> Option<String> {
    let value = errors.required("password", value)?;
    if value.is_empty() {
        errors.add("password", crate::core::validation::BLANK);
        return None;
    }
    Some(value)
}

// Check-then-insert can still race; a unique index violation means the same conflict.
fn conflict_on_unique(err: DbErr, message: &str) -> Error {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => Error::Conflict {
            message: message.to_string(),
        },
        _ => err.into(),
    }
}

async fn find_by_username(db: &DatabaseConnection, username: &str) -> Result<Option<user::Model>> {
    User::find()
        .filter(user::Column::Username.eq(username))
        .one(db)
        .await
        .map_err(Into::into)
}

async fn find_by_email(db: &DatabaseConnection, email: &str) -> Result<Option<user::Model>> {
    User::find()
        .filter(user::Column::Email.eq(email))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Creates a password account.
///
/// # Errors
/// Returns `Error::Conflict` if the email or username is already in use.
#[instrument(skip(db, registration), fields(username = %registration.username))]
pub async fn register(db: &DatabaseConnection, registration: Registration) -> Result<user::Model> {
    if find_by_email(db, &registration.email).await?.is_some() {
        return Err(Error::Conflict {
            message: "User already exists".to_string(),
        });
    }
    if find_by_username(db, &registration.username).await?.is_some() {
        return Err(Error::Conflict {
            message: "Username already taken".to_string(),
        });
    }

    let account = user::ActiveModel {
        username: Set(registration.username),
        first_name: Set(registration.first_name),
        last_name: Set(registration.last_name),
        email: Set(registration.email),
        password: Set(Some(hash_password(&registration.password))),
        profile_picture: Set(String::new()),
        sso_provider: Set(String::new()),
        provider_sub: Set(None),
        is_admin: Set(false),
        date_joined: Set(chrono::Utc::now()),
        ..Default::default()
    };
    let created = account
        .insert(db)
        .await
        .map_err(|e| conflict_on_unique(e, "User already exists"))?;
    info!("User {} successfully created", created.username);
    Ok(created)
}

/// Checks a username and password.
///
/// # Errors
/// Returns `Error::Unauthorized` for an unknown user, a wrong password, or an
/// SSO-only account that has no password.
#[instrument(skip(db, password))]
pub async fn authenticate(
    db: &DatabaseConnection,
    username: &str,
    password: &str,
) -> Result<user::Model> {
    let account = find_by_username(db, username)
        .await?
        .ok_or_else(|| Error::unauthorized(BAD_CREDENTIALS))?;

    match account.password.as_deref() {
        Some(hash) if verify_password(password, hash) => {
            info!("{} successfully authenticated", account.username);
            Ok(account)
        }
        _ => Err(Error::unauthorized(BAD_CREDENTIALS)),
    }
}

/// Finds or creates the account behind a verified Google identity.
///
/// Lookup goes by Google subject first. An existing password account with the same
/// email gets linked to the Google account instead of duplicated.
#[instrument(skip(db, identity), fields(sub = %identity.sub))]
pub async fn sign_in_with_google(
    db: &DatabaseConnection,
    identity: GoogleIdentity,
) -> Result<user::Model> {
    if let Some(existing) = User::find()
        .filter(user::Column::ProviderSub.eq(identity.sub.as_str()))
        .one(db)
        .await?
    {
        info!("User {} already exists", existing.username);
        return Ok(existing);
    }

    if let Some(existing) = find_by_email(db, &identity.email).await? {
        if !identity.email_verified {
            warn!("Refusing to link unverified Google email to user {}", existing.id);
            return Err(Error::Conflict {
                message: "User already exists".to_string(),
            });
        }
        info!("Linking Google account to existing user {}", existing.username);
        let mut linked: user::ActiveModel = existing.into();
        linked.sso_provider = Set(GOOGLE_PROVIDER.to_string());
        linked.provider_sub = Set(Some(identity.sub));
        return linked
            .update(db)
            .await
            .map_err(|e| conflict_on_unique(e, "User already exists"));
    }

    let preferred = if identity.name.trim().is_empty() {
        identity.email.clone()
    } else {
        identity.name.trim().to_string()
    };
    let username = if find_by_username(db, &preferred).await?.is_some() {
        identity.email.clone()
    } else {
        preferred
    };

    let account = user::ActiveModel {
        username: Set(username),
        first_name: Set(identity.given_name),
        last_name: Set(identity.family_name),
        email: Set(identity.email),
        password: Set(None),
        profile_picture: Set(identity.picture),
        sso_provider: Set(GOOGLE_PROVIDER.to_string()),
        provider_sub: Set(Some(identity.sub)),
        is_admin: Set(false),
        date_joined: Set(chrono::Utc::now()),
        ..Default::default()
    };
    let created = account
        .insert(db)
        .await
        .map_err(|e| conflict_on_unique(e, "User already exists"))?;
    info!("Google user {} successfully created", created.username);
    Ok(created)
}

fn generate_token_key() -> String {
    format!("{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple())
}

/// Returns the user's bearer token, creating it on first use.
pub async fn issue_token(db: &DatabaseConnection, user_id: i64) -> Result<String> {
    if let Some(existing) = AuthToken::find()
        .filter(auth_token::Column::UserId.eq(user_id))
        .one(db)
        .await?
    {
        return Ok(existing.key);
    }

    let token = auth_token::ActiveModel {
        key: Set(generate_token_key()),
        user_id: Set(user_id),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    };
    match token.insert(db).await {
        Ok(created) => Ok(created.key),
        // Another sign-in created the user's token first
        Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
            AuthToken::find()
                .filter(auth_token::Column::UserId.eq(user_id))
                .one(db)
                .await?
                .map(|existing| existing.key)
                .ok_or_else(|| Error::Conflict {
                    message: "Token could not be issued".to_string(),
                })
        }
        Err(e) => Err(e.into()),
    }
}

/// Resolves a bearer token to its user.
///
/// # Errors
/// Returns `Error::Unauthorized` if no user holds this token.
pub async fn user_for_token(db: &DatabaseConnection, key: &str) -> Result<user::Model> {
    AuthToken::find()
        .filter(auth_token::Column::Key.eq(key))
        .find_also_related(User)
        .one(db)
        .await?
        .and_then(|(_, account)| account)
        .ok_or_else(|| Error::unauthorized("Invalid token"))
}

/// Lists every account, ordered by id.
pub async fn list_users(db: &DatabaseConnection) -> Result<Vec<user::Model>> {
    User::find()
        .order_by_asc(user::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Retrieves one account.
pub async fn get_user(db: &DatabaseConnection, user_id: i64) -> Result<user::Model> {
    User::find_by_id(user_id)
        .one(db)
        .await?
        .ok_or(Error::not_found("user", user_id))
}

fn ensure_self(acting_user_id: i64, user_id: i64) -> Result<()> {
    if acting_user_id == user_id {
        Ok(())
    } else {
        Err(Error::Forbidden {
            message: "You can only modify your own account".to_string(),
        })
    }
}

/// Replaces the caller's own profile fields, rehashing the password if one is given.
///
/// # Errors
/// Returns an error if:
/// - The account does not exist
/// - `acting_user_id` is someone else
/// - The new username or email belongs to another account
pub async fn replace_user(
    db: &DatabaseConnection,
    acting_user_id: i64,
    user_id: i64,
    update: AccountUpdate,
) -> Result<user::Model> {
    let existing = get_user(db, user_id).await?;
    ensure_self(acting_user_id, user_id)?;

    if find_by_username(db, &update.username)
        .await?
        .is_some_and(|other| other.id != user_id)
    {
        return Err(Error::Conflict {
            message: "Username already taken".to_string(),
        });
    }
    if find_by_email(db, &update.email)
        .await?
        .is_some_and(|other| other.id != user_id)
    {
        return Err(Error::Conflict {
            message: "Email already in use".to_string(),
        });
    }

    let mut account: user::ActiveModel = existing.into();
    account.username = Set(update.username);
    account.first_name = Set(update.first_name);
    account.last_name = Set(update.last_name);
    account.email = Set(update.email);
    account.profile_picture = Set(update.profile_picture);
    if let Some(raw) = update.password {
        account.password = Set(Some(hash_password(&raw)));
    }
    account
        .update(db)
        .await
        .map_err(|e| conflict_on_unique(e, "Username or email already in use"))
}

/// Deletes the caller's own account and, through cascading keys, everything it owns.
pub async fn delete_user(db: &DatabaseConnection, acting_user_id: i64, user_id: i64) -> Result<()> {
    get_user(db, user_id).await?;
    ensure_self(acting_user_id, user_id)?;
    User::delete_by_id(user_id).exec(db).await?;
    info!("Deleted user {}", user_id);
    Ok(())
}
