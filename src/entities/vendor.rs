//! Vendor entity - A merchant receipts are issued by.
//!
//! Vendors form a shared catalogue: any signed-in user can list and reference them.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Vendor database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "vendors")]
pub struct Model {
    /// Unique identifier for the vendor
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Trading name (e.g., "Acme Hardware")
    pub name: String,
    pub address: String,
    pub email: String,
    pub contact_number: String,
    /// Kind of establishment (e.g., "Retail", "Restaurant")
    pub establishment: String,
    pub date_created: DateTimeUtc,
    pub date_updated: DateTimeUtc,
}

/// Defines relationships between Vendor and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One vendor issues many receipts
    #[sea_orm(has_many = "super::receipt::Entity")]
    Receipts,
}

impl Related<super::receipt::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Receipts.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
