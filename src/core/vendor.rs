//! Vendor business logic - The shared catalogue of merchants.
//!
//! Unlike the other resources, vendors have no owner. Every signed-in user sees the same
//! list and may reference any vendor from their receipts.

use crate::{
    core::validation::FieldErrors,
    entities::{Vendor, vendor},
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, Set, prelude::*};
use serde::Deserialize;
use tracing::info;

/// Raw vendor request body.
#[derive(Debug, Default, Deserialize)]
pub struct VendorPayload {
    pub name: Option<String>,
    pub address: Option<String>,
    pub email: Option<String>,
    pub contact_number: Option<String>,
    pub establishment: Option<String>,
}

/// Validated vendor fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VendorInput {
    pub name: String,
    pub address: String,
    pub email: String,
    pub contact_number: String,
    pub establishment: String,
}

impl VendorPayload {
    /// Checks every field; `email` must look like an address.
    pub fn validate(self) -> Result<VendorInput> {
        let mut errors = FieldErrors::new();
        let name = errors.text("name", self.name);
        let address = errors.text("address", self.address);
        let email = errors.email("email", self.email);
        let contact_number = errors.text("contact_number", self.contact_number);
        let establishment = errors.text("establishment", self.establishment);

        match (name, address, email, contact_number, establishment) {
            (
                Some(name),
                Some(address),
                Some(email),
                Some(contact_number),
                Some(establishment),
            ) if errors.is_empty() => Ok(VendorInput {
                name,
                address,
                email,
                contact_number,
                establishment,
            }),
            _ => Err(errors.into()),
        }
    }
}

/// Lists every vendor, ordered by id.
pub async fn list_vendors(db: &DatabaseConnection) -> Result<Vec<vendor::Model>> {
    Vendor::find()
        .order_by_asc(vendor::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Finds a vendor by id.
pub async fn find_vendor(db: &DatabaseConnection, vendor_id: i64) -> Result<Option<vendor::Model>> {
    Vendor::find_by_id(vendor_id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Retrieves a vendor by id.
///
/// # Errors
/// Returns `Error::NotFound` if no vendor has that id.
pub async fn get_vendor(db: &DatabaseConnection, vendor_id: i64) -> Result<vendor::Model> {
    find_vendor(db, vendor_id)
        .await?
        .ok_or(Error::not_found("vendor", vendor_id))
}

/// Stores a new vendor.
pub async fn create_vendor(db: &DatabaseConnection, input: VendorInput) -> Result<vendor::Model> {
    let now = chrono::Utc::now();
    let vendor = vendor::ActiveModel {
        name: Set(input.name),
        address: Set(input.address),
        email: Set(input.email),
        contact_number: Set(input.contact_number),
        establishment: Set(input.establishment),
        date_created: Set(now),
        date_updated: Set(now),
        ..Default::default()
    };
    let created = vendor.insert(db).await?;
    info!("Created vendor '{}' with ID {}", created.name, created.id);
    Ok(created)
}

/// Replaces every field of a vendor.
pub async fn replace_vendor(
    db: &DatabaseConnection,
    vendor_id: i64,
    input: VendorInput,
) -> Result<vendor::Model> {
    let mut vendor: vendor::ActiveModel = get_vendor(db, vendor_id).await?.into();
    vendor.name = Set(input.name);
    vendor.address = Set(input.address);
    vendor.email = Set(input.email);
    vendor.contact_number = Set(input.contact_number);
    vendor.establishment = Set(input.establishment);
    vendor.date_updated = Set(chrono::Utc::now());
    vendor.update(db).await.map_err(Into::into)
}

/// Deletes a vendor. Receipts that referenced it are kept with their vendor cleared.
pub async fn delete_vendor(db: &DatabaseConnection, vendor_id: i64) -> Result<()> {
    get_vendor(db, vendor_id).await?;
    Vendor::delete_by_id(vendor_id).exec(db).await?;
    info!("Deleted vendor {}", vendor_id);
    Ok(())
}
