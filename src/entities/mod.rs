//! Entity module - Contains all SeaORM entity definitions for the database.
//! These entities represent the database tables and their relationships.
//! Each entity has a Model struct for data and an Entity struct for operations.

pub mod auth_token;
pub mod chat;
pub mod document;
pub mod image;
pub mod receipt;
pub mod receipt_item;
pub mod report;
pub mod sea_orm_active_enums;
pub mod user;
pub mod vendor;

// Re-export specific types to avoid conflicts
pub use auth_token::{Column as AuthTokenColumn, Entity as AuthToken, Model as AuthTokenModel};
pub use chat::{Column as ChatColumn, Entity as Chat, Model as ChatModel};
pub use document::{Column as DocumentColumn, Entity as Document, Model as DocumentModel};
pub use image::{Column as ImageColumn, Entity as Image, Model as ImageModel};
pub use receipt::{Column as ReceiptColumn, Entity as Receipt, Model as ReceiptModel};
pub use receipt_item::{
    Column as ReceiptItemColumn, Entity as ReceiptItem, Model as ReceiptItemModel,
};
pub use report::{Column as ReportColumn, Entity as Report, Model as ReportModel};
pub use sea_orm_active_enums::{DocumentType, ReceiptCategory, ReportCategory};
pub use user::{Column as UserColumn, Entity as User, Model as UserModel};
pub use vendor::{Column as VendorColumn, Entity as Vendor, Model as VendorModel};
