//! Auth token entity - The opaque bearer token issued to a user at login.
//!
//! Each user holds at most one token; it is created on first login and handed out
//! again on later logins.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Auth token database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "auth_tokens")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    /// The bearer token value
    #[sea_orm(unique)]
    pub key: String,
    /// Owner of the token
    #[sea_orm(unique)]
    pub user_id: i64,
    pub created_at: DateTimeUtc,
}

/// Defines relationships between AuthToken and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    User,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
