//! Receipt item entity - One line of a receipt.
//!
//! `deductable_amount` is the part of the line that counts towards tax deductions and is
//! what report generation sums up.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Receipt item database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "receipt_items")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub title: String,
    pub quantity: i64,
    /// Unit price
    #[sea_orm(column_type = "Decimal(Some((10, 2)))")]
    pub price: Decimal,
    /// Always `quantity * price`
    #[sea_orm(column_type = "Decimal(Some((10, 2)))")]
    pub subtotal_expenditure: Decimal,
    /// Receipt this line belongs to
    #[serde(rename = "receipt")]
    pub receipt_id: i64,
    #[sea_orm(column_type = "Decimal(Some((10, 2)))")]
    pub deductable_amount: Decimal,
    pub date_created: DateTimeUtc,
    pub date_updated: DateTimeUtc,
}

/// Defines relationships between ReceiptItem and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each line belongs to one receipt and goes away with it
    #[sea_orm(
        belongs_to = "super::receipt::Entity",
        from = "Column::ReceiptId",
        to = "super::receipt::Column::Id",
        on_delete = "Cascade"
    )]
    Receipt,
}

impl Related<super::receipt::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Receipt.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
