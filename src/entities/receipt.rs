//! Receipt entity - A purchase recorded by a user.
//!
//! Every receipt points at the photo it was captured from and may point at a vendor and
//! a source document. Line items live in [`super::receipt_item`]; the receipt's own
//! `total_expenditure` is entered independently of them.

use super::sea_orm_active_enums::ReceiptCategory;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Receipt database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "receipts")]
pub struct Model {
    /// Unique identifier for the receipt
    #[sea_orm(primary_key)]
    pub id: i64,
    pub title: String,
    /// Owner of the receipt
    #[serde(rename = "user")]
    pub user_id: i64,
    pub category: ReceiptCategory,
    /// Photo of the paper receipt
    #[serde(rename = "image")]
    pub image_id: i64,
    /// Amount paid, as printed on the receipt
    #[sea_orm(column_type = "Decimal(Some((10, 2)))")]
    pub total_expenditure: Decimal,
    /// Free-form payment method (e.g., "Cash", "Credit Card")
    pub payment_method: String,
    #[serde(rename = "vendor")]
    pub vendor_id: Option<i64>,
    #[sea_orm(column_type = "Decimal(Some((10, 2)))")]
    pub discount: Decimal,
    #[sea_orm(column_type = "Decimal(Some((10, 2)))")]
    pub value_added_tax: Decimal,
    #[serde(rename = "document")]
    pub document_id: Option<i64>,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

/// Defines relationships between Receipt and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    User,
    #[sea_orm(
        belongs_to = "super::image::Entity",
        from = "Column::ImageId",
        to = "super::image::Column::Id",
        on_delete = "Cascade"
    )]
    Image,
    #[sea_orm(
        belongs_to = "super::vendor::Entity",
        from = "Column::VendorId",
        to = "super::vendor::Column::Id",
        on_delete = "SetNull"
    )]
    Vendor,
    #[sea_orm(
        belongs_to = "super::document::Entity",
        from = "Column::DocumentId",
        to = "super::document::Column::Id",
        on_delete = "Cascade"
    )]
    Document,
    /// One receipt has many line items
    #[sea_orm(has_many = "super::receipt_item::Entity")]
    ReceiptItems,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::image::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Image.def()
    }
}

impl Related<super::vendor::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Vendor.def()
    }
}

impl Related<super::document::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Document.def()
    }
}

impl Related<super::receipt_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ReceiptItems.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
