//! Report entity - Expenditure and deduction totals over a date range.
//!
//! Reports are either entered by hand or produced by
//! [`crate::core::report::generate_report`], which fills in the totals from receipts.

use super::sea_orm_active_enums::ReportCategory;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Report database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "reports")]
pub struct Model {
    /// Unique identifier for the report
    #[sea_orm(primary_key)]
    pub id: i64,
    pub title: String,
    /// `DAILY`, `WEEKLY`, `MONTHLY` or `YEARLY`
    pub category: ReportCategory,
    /// First day covered, inclusive
    pub start_date: Date,
    /// Last day covered, inclusive
    pub end_date: Date,
    #[sea_orm(column_type = "Decimal(Some((10, 2)))")]
    pub grand_total_expenditure: Decimal,
    #[sea_orm(column_type = "Decimal(Some((10, 2)))")]
    pub total_tax_deductions: Decimal,
    /// Owner of the report
    #[serde(rename = "user")]
    pub user_id: i64,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

/// Defines relationships between Report and other entities
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
