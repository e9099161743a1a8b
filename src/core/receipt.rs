//! Receipt business logic - Purchases recorded by a user.
//!
//! Receipts are written with plain ids for their image, vendor and document, and read back
//! as [`ReceiptView`], which nests those records together with the receipt's line items.

use crate::{
    core::{
        document::find_document,
        image::find_image,
        validation::{FieldErrors, missing_reference},
        vendor::find_vendor,
    },
    entities::{
        Document, Image, Receipt, ReceiptCategory, ReceiptItem, Vendor, document, image, receipt,
        receipt_item, vendor,
    },
    errors::{Error, Result},
};
use sea_orm::{LoaderTrait, QueryOrder, Set, prelude::*};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

/// Raw receipt request body.
#[derive(Debug, Default, Deserialize)]
pub struct ReceiptPayload {
    pub title: Option<String>,
    pub category: Option<String>,
    pub image: Option<i64>,
    pub total_expenditure: Option<Decimal>,
    pub payment_method: Option<String>,
    pub vendor: Option<i64>,
    pub discount: Option<Decimal>,
    pub value_added_tax: Option<Decimal>,
    pub document: Option<i64>,
}

/// Validated receipt fields. References are checked when the input is stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceiptInput {
    pub title: String,
    pub category: ReceiptCategory,
    pub image_id: i64,
    pub total_expenditure: Decimal,
    pub payment_method: String,
    pub vendor_id: Option<i64>,
    pub discount: Decimal,
    pub value_added_tax: Decimal,
    pub document_id: Option<i64>,
}

impl ReceiptPayload {
    /// Checks every field; amounts must fit the money columns.
    pub fn validate(self) -> Result<ReceiptInput> {
        let mut errors = FieldErrors::new();
        let title = errors.text("title", self.title);
        let category = errors.choice("category", self.category);
        let image_id = errors.required("image", self.image);
        let total_expenditure = errors.money("total_expenditure", self.total_expenditure);
        let payment_method = errors.text("payment_method", self.payment_method);
        let discount = errors.money("discount", self.discount);
        let value_added_tax = errors.money("value_added_tax", self.value_added_tax);

        match (
            title,
            category,
            image_id,
            total_expenditure,
            payment_method,
            discount,
            value_added_tax,
        ) {
            (
                Some(title),
                Some(category),
                Some(image_id),
                Some(total_expenditure),
                Some(payment_method),
                Some(discount),
                Some(value_added_tax),
            ) if errors.is_empty() => Ok(ReceiptInput {
                title,
                category,
                image_id,
                total_expenditure,
                payment_method,
                vendor_id: self.vendor,
                discount,
                value_added_tax,
                document_id: self.document,
            }),
            _ => Err(errors.into()),
        }
    }
}

/// A receipt as returned to clients, with its references expanded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReceiptView {
    pub id: i64,
    pub title: String,
    pub user: i64,
    pub category: ReceiptCategory,
    pub image: image::Model,
    pub total_expenditure: Decimal,
    pub payment_method: String,
    pub vendor: Option<vendor::Model>,
    pub discount: Decimal,
    pub value_added_tax: Decimal,
    pub document: Option<document::Model>,
    pub items: Vec<receipt_item::Model>,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

impl ReceiptView {
    fn assemble(
        receipt: receipt::Model,
        image: image::Model,
        vendor: Option<vendor::Model>,
        document: Option<document::Model>,
        mut items: Vec<receipt_item::Model>,
    ) -> Self {
        items.sort_by_key(|item| item.id);
        Self {
            id: receipt.id,
            title: receipt.title,
            user: receipt.user_id,
            category: receipt.category,
            image,
            total_expenditure: receipt.total_expenditure,
            payment_method: receipt.payment_method,
            vendor,
            discount: receipt.discount,
            value_added_tax: receipt.value_added_tax,
            document,
            items,
            created_at: receipt.created_at,
            updated_at: receipt.updated_at,
        }
    }
}

/// Expands a batch of receipts, loading each kind of related record in one query.
async fn expand(db: &DatabaseConnection, receipts: Vec<receipt::Model>) -> Result<Vec<ReceiptView>> {
    let images = receipts.load_one(Image, db).await?;
    let vendors = receipts.load_one(Vendor, db).await?;
    let documents = receipts.load_one(Document, db).await?;
    let items = receipts.load_many(ReceiptItem, db).await?;

    receipts
        .into_iter()
        .zip(images)
        .zip(vendors)
        .zip(documents)
        .zip(items)
        .map(|((((receipt, image), vendor), document), items)| {
            let image = image.ok_or(Error::not_found("image", receipt.image_id))?;
            Ok(ReceiptView::assemble(receipt, image, vendor, document, items))
        })
        .collect()
}

/// Checks that every id in `input` names a record the user may reference.
async fn check_references(db: &DatabaseConnection, user_id: i64, input: &ReceiptInput) -> Result<()> {
    let mut errors = FieldErrors::new();
    if find_image(db, user_id, input.image_id).await?.is_none() {
        errors.add("image", missing_reference(input.image_id));
    }
    if let Some(vendor_id) = input.vendor_id {
        if find_vendor(db, vendor_id).await?.is_none() {
            errors.add("vendor", missing_reference(vendor_id));
        }
    }
    if let Some(document_id) = input.document_id {
        if find_document(db, user_id, document_id).await?.is_none() {
            errors.add("document", missing_reference(document_id));
        }
    }
    errors.finish()
}

/// Lists the user's receipts, ordered by id, with references expanded.
pub async fn list_receipts(db: &DatabaseConnection, user_id: i64) -> Result<Vec<ReceiptView>> {
    let receipts = Receipt::find()
        .filter(receipt::Column::UserId.eq(user_id))
        .order_by_asc(receipt::Column::Id)
        .all(db)
        .await?;
    expand(db, receipts).await
}

/// Finds one of the user's receipts, returning None if it is missing or not theirs.
pub async fn find_receipt(
    db: &DatabaseConnection,
    user_id: i64,
    receipt_id: i64,
) -> Result<Option<receipt::Model>> {
    Receipt::find_by_id(receipt_id)
        .filter(receipt::Column::UserId.eq(user_id))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Retrieves one of the user's receipts with its relations expanded.
pub async fn get_receipt(
    db: &DatabaseConnection,
    user_id: i64,
    receipt_id: i64,
) -> Result<receipt::Model> {
    find_receipt(db, user_id, receipt_id)
        .await?
        .ok_or(Error::not_found("receipt", receipt_id))
}

/// Expands a single receipt for display.
pub async fn view_receipt(db: &DatabaseConnection, receipt: receipt::Model) -> Result<ReceiptView> {
    let receipt_id = receipt.id;
    expand(db, vec![receipt])
        .await?
        .pop()
        .ok_or(Error::not_found("receipt", receipt_id))
}

/// Stores a new receipt owned by `user_id`.
///
/// # Errors
/// Returns `Error::Validation` if the image or document is not the user's, or the vendor
/// does not exist.
#[instrument(skip(db, input), fields(title = %input.title))]
pub async fn create_receipt(
    db: &DatabaseConnection,
    user_id: i64,
    input: ReceiptInput,
) -> Result<receipt::Model> {
    check_references(db, user_id, &input).await?;

    let now = chrono::Utc::now();
    let receipt = receipt::ActiveModel {
        title: Set(input.title),
        user_id: Set(user_id),
        category: Set(input.category),
        image_id: Set(input.image_id),
        total_expenditure: Set(input.total_expenditure),
        payment_method: Set(input.payment_method),
        vendor_id: Set(input.vendor_id),
        discount: Set(input.discount),
        value_added_tax: Set(input.value_added_tax),
        document_id: Set(input.document_id),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };
    let created = receipt.insert(db).await?;
    info!("Created receipt {} for user {}", created.id, user_id);
    Ok(created)
}

/// Replaces every editable field of one of the user's receipts. Its items are untouched.
#[instrument(skip(db, input))]
pub async fn replace_receipt(
    db: &DatabaseConnection,
    user_id: i64,
    receipt_id: i64,
    input: ReceiptInput,
) -> Result<receipt::Model> {
    let existing = get_receipt(db, user_id, receipt_id).await?;
    check_references(db, user_id, &input).await?;

    let mut receipt: receipt::ActiveModel = existing.into();
    receipt.title = Set(input.title);
    receipt.category = Set(input.category);
    receipt.image_id = Set(input.image_id);
    receipt.total_expenditure = Set(input.total_expenditure);
    receipt.payment_method = Set(input.payment_method);
    receipt.vendor_id = Set(input.vendor_id);
    receipt.discount = Set(input.discount);
    receipt.value_added_tax = Set(input.value_added_tax);
    receipt.document_id = Set(input.document_id);
    receipt.updated_at = Set(chrono::Utc::now());
    receipt.update(db).await.map_err(Into::into)
}

/// Deletes one of the user's receipts together with its items.
pub async fn delete_receipt(db: &DatabaseConnection, user_id: i64, receipt_id: i64) -> Result<()> {
    get_receipt(db, user_id, receipt_id).await?;
    Receipt::delete_by_id(receipt_id).exec(db).await?;
    info!("Deleted receipt {}", receipt_id);
    Ok(())
}
