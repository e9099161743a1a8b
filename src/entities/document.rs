//! Document entity - An uploaded file (receipt scan, invoice, ...) stored elsewhere.
//!
//! Only the URL of the file is kept; receipts may point at the document they came from.

use super::sea_orm_active_enums::DocumentType;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Document database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "documents")]
pub struct Model {
    /// Unique identifier for the document
    #[sea_orm(primary_key)]
    pub id: i64,
    pub title: String,
    /// Where the file itself lives
    pub document_url: String,
    /// Owner of the document
    #[serde(rename = "user")]
    pub user_id: i64,
    /// `RECEIPT`, `INVOICE` or `OTHER`
    #[sea_orm(column_name = "type")]
    #[serde(rename = "type")]
    pub document_type: DocumentType,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

/// Defines relationships between Document and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each document belongs to one user
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    User,
    /// Receipts extracted from this document
    #[sea_orm(has_many = "super::receipt::Entity")]
    Receipts,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::receipt::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Receipts.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
