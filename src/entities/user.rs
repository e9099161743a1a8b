//! User entity - Represents an account that owns documents, images, receipts and reports.
//!
//! Accounts are created either through registration (username + password) or on first
//! Google sign-in, in which case `sso_provider` and `provider_sub` identify the Google
//! account and `password` stays empty.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// User database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    /// Unique identifier for the user
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Login name, unique across all accounts
    #[sea_orm(unique)]
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    /// Email address, unique across all accounts
    #[sea_orm(unique)]
    pub email: String,
    /// Salted password hash; `None` for accounts that only sign in through SSO
    #[serde(skip_serializing)]
    pub password: Option<String>,
    /// Avatar URL, empty when unknown
    pub profile_picture: String,
    /// `"google"` for SSO accounts, empty otherwise
    pub sso_provider: String,
    /// Subject identifier issued by the SSO provider
    pub provider_sub: Option<String>,
    pub is_admin: bool,
    /// When the account was created
    pub date_joined: DateTimeUtc,
}

/// Defines relationships between User and the records it owns
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::auth_token::Entity")]
    AuthTokens,
    #[sea_orm(has_many = "super::document::Entity")]
    Documents,
    #[sea_orm(has_many = "super::image::Entity")]
    Images,
    #[sea_orm(has_many = "super::receipt::Entity")]
    Receipts,
    #[sea_orm(has_many = "super::report::Entity")]
    Reports,
    #[sea_orm(has_many = "super::chat::Entity")]
    Chats,
}

impl Related<super::auth_token::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AuthTokens.def()
    }
}

impl Related<super::document::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Documents.def()
    }
}

impl Related<super::image::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Images.def()
    }
}

impl Related<super::receipt::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Receipts.def()
    }
}

impl Related<super::report::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Reports.def()
    }
}

impl Related<super::chat::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Chats.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
