//! Receipt item business logic - The individual lines of a receipt.
//!
//! Items have no owner of their own. A user sees an item exactly when they own the
//! receipt it belongs to.

use crate::{
    core::{
        receipt::find_receipt,
        validation::{FieldErrors, missing_reference},
    },
    entities::{Receipt, ReceiptItem, receipt, receipt_item},
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, Set, prelude::*};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Raw receipt item request body.
#[derive(Debug, Default, Deserialize)]
pub struct ReceiptItemPayload {
    pub title: Option<String>,
    pub quantity: Option<i64>,
    pub price: Option<Decimal>,
    /// Optional; computed from quantity and price when left out
    pub subtotal_expenditure: Option<Decimal>,
    pub receipt: Option<i64>,
    pub deductable_amount: Option<Decimal>,
}

/// Validated receipt item fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceiptItemInput {
    pub title: String,
    pub quantity: i64,
    pub price: Decimal,
    pub subtotal_expenditure: Decimal,
    pub receipt_id: i64,
    pub deductable_amount: Decimal,
}

impl ReceiptItemPayload {
    /// Checks every field; a given subtotal must equal quantity times price.
    pub fn validate(self) -> Result<ReceiptItemInput> {
        let mut errors = FieldErrors::new();
        let title = errors.text("title", self.title);
        let quantity = errors.non_negative("quantity", self.quantity);
        let price = errors.money("price", self.price);
        let given_subtotal = errors.optional_money("subtotal_expenditure", self.subtotal_expenditure);
        let receipt_id = errors.required("receipt", self.receipt);
        let deductable_amount = errors.money("deductable_amount", self.deductable_amount);

        let subtotal = match (quantity, price) {
            (Some(quantity), Some(price)) => {
                let expected = Decimal::from(quantity) * price;
                match given_subtotal {
                    Some(given) if given != expected => {
                        errors.add(
                            "subtotal_expenditure",
                            format!("Must equal quantity times price ({expected})."),
                        );
                        None
                    }
                    // Computed subtotals still have to fit the column
                    _ => errors.money("subtotal_expenditure", Some(expected)),
                }
            }
            _ => None,
        };

        match (title, quantity, price, subtotal, receipt_id, deductable_amount) {
            (
                Some(title),
                Some(quantity),
                Some(price),
                Some(subtotal_expenditure),
                Some(receipt_id),
                Some(deductable_amount),
            ) if errors.is_empty() => Ok(ReceiptItemInput {
                title,
                quantity,
                price,
                subtotal_expenditure,
                receipt_id,
                deductable_amount,
            }),
            _ => Err(errors.into()),
        }
    }
}

/// A receipt item as returned to clients, with its receipt expanded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReceiptItemView {
    pub id: i64,
    pub title: String,
    pub quantity: i64,
    pub price: Decimal,
    pub subtotal_expenditure: Decimal,
    pub receipt: receipt::Model,
    pub deductable_amount: Decimal,
    pub date_created: DateTimeUtc,
    pub date_updated: DateTimeUtc,
}

impl ReceiptItemView {
    /// Pairs an item with the receipt it belongs to.
    #[must_use]
    pub fn new(item: receipt_item::Model, receipt: receipt::Model) -> Self {
        Self {
            id: item.id,
            title: item.title,
            quantity: item.quantity,
            price: item.price,
            subtotal_expenditure: item.subtotal_expenditure,
            receipt,
            deductable_amount: item.deductable_amount,
            date_created: item.date_created,
            date_updated: item.date_updated,
        }
    }
}

async fn check_receipt(db: &DatabaseConnection, user_id: i64, receipt_id: i64) -> Result<receipt::Model> {
    match find_receipt(db, user_id, receipt_id).await? {
        Some(receipt) => Ok(receipt),
        None => Err(Error::invalid("receipt", missing_reference(receipt_id))),
    }
}

/// Lists the items of every receipt the user owns, ordered by id.
pub async fn list_items(db: &DatabaseConnection, user_id: i64) -> Result<Vec<ReceiptItemView>> {
    let rows = ReceiptItem::find()
        .find_also_related(Receipt)
        .filter(receipt::Column::UserId.eq(user_id))
        .order_by_asc(receipt_item::Column::Id)
        .all(db)
        .await?;

    Ok(rows
        .into_iter()
        .filter_map(|(item, receipt)| receipt.map(|receipt| ReceiptItemView::new(item, receipt)))
        .collect())
}

/// Finds an item on one of the user's receipts, along with that receipt.
pub async fn find_item(
    db: &DatabaseConnection,
    user_id: i64,
    item_id: i64,
) -> Result<Option<(receipt_item::Model, receipt::Model)>> {
    let row = ReceiptItem::find_by_id(item_id)
        .find_also_related(Receipt)
        .filter(receipt::Column::UserId.eq(user_id))
        .one(db)
        .await?;
    Ok(row.and_then(|(item, receipt)| receipt.map(|receipt| (item, receipt))))
}

/// Retrieves an item on one of the user's receipts.
///
/// # Errors
/// Returns `Error::NotFound` if the item does not exist or its receipt belongs to someone else.
pub async fn get_item(db: &DatabaseConnection, user_id: i64, item_id: i64) -> Result<ReceiptItemView> {
    find_item(db, user_id, item_id)
        .await?
        .map(|(item, receipt)| ReceiptItemView::new(item, receipt))
        .ok_or(Error::not_found("receipt item", item_id))
}

/// Adds a line to one of the user's receipts.
pub async fn create_item(
    db: &DatabaseConnection,
    user_id: i64,
    input: ReceiptItemInput,
) -> Result<ReceiptItemView> {
    let receipt = check_receipt(db, user_id, input.receipt_id).await?;

    let now = chrono::Utc::now();
    let item = receipt_item::ActiveModel {
        title: Set(input.title),
        quantity: Set(input.quantity),
        price: Set(input.price),
        subtotal_expenditure: Set(input.subtotal_expenditure),
        receipt_id: Set(receipt.id),
        deductable_amount: Set(input.deductable_amount),
        date_created: Set(now),
        date_updated: Set(now),
        ..Default::default()
    };
    let created = item.insert(db).await?;
    info!("Added item {} to receipt {}", created.id, receipt.id);
    Ok(ReceiptItemView::new(created, receipt))
}

/// Replaces every editable field of an item. The item may be moved to another of the
/// user's receipts.
pub async fn replace_item(
    db: &DatabaseConnection,
    user_id: i64,
    item_id: i64,
    input: ReceiptItemInput,
) -> Result<ReceiptItemView> {
    let (existing, _) = find_item(db, user_id, item_id)
        .await?
        .ok_or(Error::not_found("receipt item", item_id))?;
    let receipt = check_receipt(db, user_id, input.receipt_id).await?;

    let mut item: receipt_item::ActiveModel = existing.into();
    item.title = Set(input.title);
    item.quantity = Set(input.quantity);
    item.price = Set(input.price);
    item.subtotal_expenditure = Set(input.subtotal_expenditure);
    item.receipt_id = Set(receipt.id);
    item.deductable_amount = Set(input.deductable_amount);
    item.date_updated = Set(chrono::Utc::now());
    let updated = item.update(db).await?;
    Ok(ReceiptItemView::new(updated, receipt))
}

/// Deletes an item from one of the user's receipts.
pub async fn delete_item(db: &DatabaseConnection, user_id: i64, item_id: i64) -> Result<()> {
    get_item(db, user_id, item_id).await?;
    ReceiptItem::delete_by_id(item_id).exec(db).await?;
    info!("Deleted receipt item {}", item_id);
    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::*;

    fn payload(receipt_id: i64) -> ReceiptItemPayload {
        ReceiptItemPayload {
            title: Some("Printer paper".to_string()),
            quantity: Some(3),
            price: Some(Decimal::new(125, 2)),
            subtotal_expenditure: None,
            receipt: Some(receipt_id),
            deductable_amount: Some(Decimal::new(375, 2)),
        }
    }

    #[test]
    fn test_subtotal_is_computed_when_omitted() {
        let input = payload(1).validate().unwrap();
        assert_eq!(input.subtotal_expenditure, Decimal::new(375, 2));
    }

    #[test]
    fn test_subtotal_must_match_quantity_times_price() {
        let ok = ReceiptItemPayload {
            subtotal_expenditure: Some(Decimal::new(375, 2)),
            ..payload(1)
        };
        assert!(ok.validate().is_ok());

        let wrong = ReceiptItemPayload {
            subtotal_expenditure: Some(Decimal::new(4, 0)),
            ..payload(1)
        };
        let Err(Error::Validation { errors }) = wrong.validate() else {
            panic!("expected validation error");
        };
        assert!(errors.contains("subtotal_expenditure"));
    }

    #[test]
    fn test_negative_quantity_is_rejected() {
        let negative = ReceiptItemPayload {
            quantity: Some(-1),
            ..payload(1)
        };
        let Err(Error::Validation { errors }) = negative.validate() else {
            panic!("expected validation error");
        };
        assert!(errors.contains("quantity"));
        // No subtotal complaint without a usable quantity
        assert!(!errors.contains("subtotal_expenditure"));
    }

    #[tokio::test]
    async fn test_item_lifecycle() -> Result<()> {
        let (db, owner) = setup_with_user().await?;
        let image = create_test_image(&db, owner.id).await?;
        let receipt = create_test_receipt(&db, owner.id, image.id, None).await?;

        let created = create_item(&db, owner.id, payload(receipt.id).validate()?).await?;
        assert_eq!(created.receipt, receipt);
        assert_eq!(created.quantity, 3);
        assert_eq!(get_item(&db, owner.id, created.id).await?, created);

        let replaced = replace_item(
            &db,
            owner.id,
            created.id,
            ReceiptItemPayload {
                quantity: Some(4),
                deductable_amount: Some(Decimal::new(5, 0)),
                ..payload(receipt.id)
            }
            .validate()?,
        )
        .await?;
        assert_eq!(replaced.subtotal_expenditure, Decimal::new(5, 0));
        assert_eq!(list_items(&db, owner.id).await?, vec![replaced]);

        delete_item(&db, owner.id, created.id).await?;
        assert!(matches!(
            get_item(&db, owner.id, created.id).await,
            Err(Error::NotFound { .. })
        ));
        Ok(())
    }

    #[tokio::test]
    async fn test_items_follow_receipt_ownership() -> Result<()> {
        let (db, owner) = setup_with_user().await?;
        let stranger = create_test_user(&db, "stranger").await?;
        let image = create_test_image(&db, owner.id).await?;
        let receipt = create_test_receipt(&db, owner.id, image.id, None).await?;
        let item = create_test_item(&db, receipt.id).await?;

        assert!(list_items(&db, stranger.id).await?.is_empty());
        assert!(find_item(&db, stranger.id, item.id).await?.is_none());

        let Err(Error::Validation { errors }) =
            create_item(&db, stranger.id, payload(receipt.id).validate()?).await
        else {
            panic!("expected validation error");
        };
        assert_eq!(
            errors.get("receipt").unwrap(),
            [missing_reference(receipt.id)]
        );
        Ok(())
    }
}
