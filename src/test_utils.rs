//! Shared test utilities for `DeductionBuddy`.
//!
//! This module provides common helper functions for setting up test databases
//! and creating test records with sensible defaults.

use crate::{
    core::{
        account::{self, Registration},
        document::{self, DocumentInput},
        image::{self, ImageInput},
        receipt::{self, ReceiptInput},
        receipt_item::{self, ReceiptItemInput},
        vendor::{self, VendorInput},
    },
    entities::{self, DocumentType, ReceiptCategory},
    errors::Result,
};
use rust_decimal::Decimal;
use sea_orm::{DatabaseConnection, EntityTrait};
use tracing_subscriber::EnvFilter;

/// Password given to every account made by [`create_test_user`].
pub const TEST_PASSWORD: &str = "password123";

/// Routes log output through the test harness; safe to call from every test.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")),
        )
        .with_test_writer()
        .try_init();
}

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    init_test_tracing();
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// Registers a password account.
///
/// # Defaults
/// * `email`: `"<username>@example.com"`
/// * `password`: [`TEST_PASSWORD`]
pub async fn create_test_user(db: &DatabaseConnection, username: &str) -> Result<entities::user::Model> {
    account::register(
        db,
        Registration {
            username: username.to_string(),
            first_name: "Test".to_string(),
            last_name: "User".to_string(),
            email: format!("{username}@example.com"),
            password: TEST_PASSWORD.to_string(),
        },
    )
    .await
}

/// Sets up a test database with one registered user.
/// Returns (db, user) for common test scenarios.
pub async fn setup_with_user() -> Result<(DatabaseConnection, entities::user::Model)> {
    let db = setup_test_db().await?;
    let user = create_test_user(&db, "owner").await?;
    Ok((db, user))
}

/// Creates an image owned by `user_id`.
pub async fn create_test_image(db: &DatabaseConnection, user_id: i64) -> Result<entities::image::Model> {
    image::create_image(
        db,
        user_id,
        ImageInput {
            title: "Test image".to_string(),
            image_url: "https://img.example.com/receipt.jpg".to_string(),
        },
    )
    .await
}

/// Creates a vendor in the shared catalogue.
pub async fn create_test_vendor(db: &DatabaseConnection, name: &str) -> Result<entities::vendor::Model> {
    vendor::create_vendor(
        db,
        VendorInput {
            name: name.to_string(),
            address: "1 Test Road".to_string(),
            email: "vendor@example.com".to_string(),
            contact_number: "555-0100".to_string(),
            establishment: "Retail".to_string(),
        },
    )
    .await
}

/// Creates an invoice document owned by `user_id`.
pub async fn create_test_document(
    db: &DatabaseConnection,
    user_id: i64,
) -> Result<entities::document::Model> {
    document::create_document(
        db,
        user_id,
        DocumentInput {
            title: "Test document".to_string(),
            document_url: "https://files.example.com/test.pdf".to_string(),
            document_type: DocumentType::Invoice,
        },
    )
    .await
}

/// Creates a receipt owned by `user_id`.
///
/// # Defaults
/// * `category`: FOOD
/// * `total_expenditure`: 12.5
/// * `discount`: 0, `value_added_tax`: 1.5
/// * `document`: None
pub async fn create_test_receipt(
    db: &DatabaseConnection,
    user_id: i64,
    image_id: i64,
    vendor_id: Option<i64>,
) -> Result<entities::receipt::Model> {
    receipt::create_receipt(
        db,
        user_id,
        ReceiptInput {
            title: "Test receipt".to_string(),
            category: ReceiptCategory::Food,
            image_id,
            total_expenditure: Decimal::new(125, 1),
            payment_method: "Cash".to_string(),
            vendor_id,
            discount: Decimal::ZERO,
            value_added_tax: Decimal::new(15, 1),
            document_id: None,
        },
    )
    .await
}

/// Adds a line to a receipt: 3 × 1.25, all of it (3.75) deductible.
pub async fn create_test_item(
    db: &DatabaseConnection,
    receipt_id: i64,
) -> Result<entities::receipt_item::Model> {
    let owner = entities::Receipt::find_by_id(receipt_id)
        .one(db)
        .await?
        .map(|receipt| receipt.user_id)
        .unwrap_or_default();
    let view = receipt_item::create_item(
        db,
        owner,
        ReceiptItemInput {
            title: "Test item".to_string(),
            quantity: 3,
            price: Decimal::new(125, 2),
            subtotal_expenditure: Decimal::new(375, 2),
            receipt_id,
            deductable_amount: Decimal::new(375, 2),
        },
    )
    .await?;
    receipt_item::find_item(db, owner, view.id)
        .await?
        .map(|(item, _)| item)
        .ok_or(crate::errors::Error::not_found("receipt item", view.id))
}
