//! Report business logic.
//!
//! Reports can be written by hand through the usual CRUD functions, or produced by
//! [`generate_report`], which totals the user's receipts over the daily, weekly, monthly or
//! yearly period around a date. All functions are framework-agnostic and return
//! entity models that the api layer serializes directly.

use crate::{
    core::validation::FieldErrors,
    entities::{Receipt, ReceiptItem, Report, ReportCategory, receipt, report},
    errors::{Error, Result},
};
use chrono::{DateTime, Datelike, Days, Months, NaiveDate, NaiveTime, Utc};
use sea_orm::{LoaderTrait, QueryOrder, Set, prelude::*};
use serde::Deserialize;
use tracing::{debug, info, instrument};

const DATE_FORMAT: &str = "%Y-%m-%d";
const DATE_FORMAT_ERROR: &str =
    "Date has wrong format. Use one of these formats instead: YYYY-MM-DD.";

/// Raw report request body.
#[derive(Debug, Default, Deserialize)]
pub struct ReportPayload {
    pub title: Option<String>,
    pub category: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub grand_total_expenditure: Option<Decimal>,
    pub total_tax_deductions: Option<Decimal>,
}

/// Validated report fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportInput {
    pub title: String,
    pub category: ReportCategory,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub grand_total_expenditure: Decimal,
    pub total_tax_deductions: Decimal,
}

/// Request body for [`generate_report`].
#[derive(Debug, Default, Deserialize)]
pub struct GeneratePayload {
    pub category: Option<String>,
    /// Any day inside the period to report on
    pub date: Option<String>,
    pub title: Option<String>,
}

/// Validated generation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerateInput {
    pub category: ReportCategory,
    pub date: NaiveDate,
    pub title: Option<String>,
}

fn parse_date(errors: &mut FieldErrors, field: &str, value: Option<String>) -> Option<NaiveDate> {
    let value = errors.required(field, value)?;
    match NaiveDate::parse_from_str(value.trim(), DATE_FORMAT) {
        Ok(date) => Some(date),
        Err(_) => {
            errors.add(field, DATE_FORMAT_ERROR);
            None
        }
    }
}

impl ReportPayload {
    /// Checks every field and parses both dates.
    pub fn validate(self) -> Result<ReportInput> {
        let mut errors = FieldErrors::new();
        let title = errors.text("title", self.title);
        let category = errors.choice("category", self.category);
        let start_date = parse_date(&mut errors, "start_date", self.start_date);
        let end_date = parse_date(&mut errors, "end_date", self.end_date);
        let grand_total_expenditure =
            errors.money("grand_total_expenditure", self.grand_total_expenditure);
        let total_tax_deductions = errors.money("total_tax_deductions", self.total_tax_deductions);

        if let (Some(start), Some(end)) = (start_date, end_date) {
            if start > end {
                errors.add("end_date", "End date must not be before start date.");
            }
        }

        match (
            title,
            category,
            start_date,
            end_date,
            grand_total_expenditure,
            total_tax_deductions,
        ) {
            (
                Some(title),
                Some(category),
                Some(start_date),
                Some(end_date),
                Some(grand_total_expenditure),
                Some(total_tax_deductions),
            ) if errors.is_empty() => Ok(ReportInput {
                title,
                category,
                start_date,
                end_date,
                grand_total_expenditure,
                total_tax_deductions,
            }),
            _ => Err(errors.into()),
        }
    }
}

impl GeneratePayload {
    /// Parses the category and anchor date.
    pub fn validate(self) -> Result<GenerateInput> {
        let mut errors = FieldErrors::new();
        let category = errors.choice("category", self.category);
        let date = parse_date(&mut errors, "date", self.date);
        // Title is optional, but must be usable when given
        let title = match self.title {
            Some(title) => errors.text("title", Some(title)),
            None => None,
        };

        match (category, date) {
            (Some(category), Some(date)) if errors.is_empty() => Ok(GenerateInput {
                category,
                date,
                title,
            }),
            _ => Err(errors.into()),
        }
    }
}

/// Lists the user's reports, ordered by id.
pub async fn list_reports(db: &DatabaseConnection, user_id: i64) -> Result<Vec<report::Model>> {
    Report::find()
        .filter(report::Column::UserId.eq(user_id))
        .order_by_asc(report::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Finds one of the user's reports, returning None if it is missing or not theirs.
pub async fn find_report(
    db: &DatabaseConnection,
    user_id: i64,
    report_id: i64,
) -> Result<Option<report::Model>> {
    Report::find_by_id(report_id)
        .filter(report::Column::UserId.eq(user_id))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Retrieves one of the user's reports.
///
/// # Errors
/// Returns `Error::NotFound` if the report does not exist or belongs to someone else.
pub async fn get_report(db: &DatabaseConnection, user_id: i64, report_id: i64) -> Result<report::Model> {
    find_report(db, user_id, report_id)
        .await?
        .ok_or(Error::not_found("report", report_id))
}

/// Stores a new report owned by `user_id`.
pub async fn create_report(
    db: &DatabaseConnection,
    user_id: i64,
    input: ReportInput,
) -> Result<report::Model> {
    let now = chrono::Utc::now();
    let report = report::ActiveModel {
        title: Set(input.title),
        category: Set(input.category),
        start_date: Set(input.start_date),
        end_date: Set(input.end_date),
        grand_total_expenditure: Set(input.grand_total_expenditure),
        total_tax_deductions: Set(input.total_tax_deductions),
        user_id: Set(user_id),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };
    let created = report.insert(db).await?;
    info!("Created report '{}' for user {}", created.title, user_id);
    Ok(created)
}

/// Replaces every editable field of one of the user's reports.
pub async fn replace_report(
    db: &DatabaseConnection,
    user_id: i64,
    report_id: i64,
    input: ReportInput,
) -> Result<report::Model> {
    let mut report: report::ActiveModel = get_report(db, user_id, report_id).await?.into();
    report.title = Set(input.title);
    report.category = Set(input.category);
    report.start_date = Set(input.start_date);
    report.end_date = Set(input.end_date);
    report.grand_total_expenditure = Set(input.grand_total_expenditure);
    report.total_tax_deductions = Set(input.total_tax_deductions);
    report.updated_at = Set(chrono::Utc::now());
    report.update(db).await.map_err(Into::into)
}

/// Deletes one of the user's reports.
pub async fn delete_report(db: &DatabaseConnection, user_id: i64, report_id: i64) -> Result<()> {
    get_report(db, user_id, report_id).await?;
    Report::delete_by_id(report_id).exec(db).await?;
    info!("Deleted report {}", report_id);
    Ok(())
}

/// First and last day, inclusive, of the `category` period containing `date`.
///
/// Weeks run Monday to Sunday.
pub fn period_bounds(category: ReportCategory, date: NaiveDate) -> Result<(NaiveDate, NaiveDate)> {
    let bounds = match category {
        ReportCategory::Daily => Some((date, date)),
        ReportCategory::Weekly => {
            let offset = u64::from(date.weekday().num_days_from_monday());
            date.checked_sub_days(Days::new(offset))
                .and_then(|start| Some((start, start.checked_add_days(Days::new(6))?)))
        }
        ReportCategory::Monthly => date.with_day(1).and_then(|start| {
            let end = start.checked_add_months(Months::new(1))?.pred_opt()?;
            Some((start, end))
        }),
        ReportCategory::Yearly => NaiveDate::from_ymd_opt(date.year(), 1, 1)
            .zip(NaiveDate::from_ymd_opt(date.year(), 12, 31)),
    };
    bounds.ok_or_else(|| Error::invalid("date", "Date is out of the supported range."))
}

/// Half-open UTC range `[start 00:00, end + 1 day 00:00)` covering both period days.
fn period_instants(start: NaiveDate, end: NaiveDate) -> Result<(DateTime<Utc>, DateTime<Utc>)> {
    let after_end = end
        .checked_add_days(Days::new(1))
        .ok_or_else(|| Error::invalid("date", "Date is out of the supported range."))?;
    Ok((
        start.and_time(NaiveTime::MIN).and_utc(),
        after_end.and_time(NaiveTime::MIN).and_utc(),
    ))
}

fn category_label(category: ReportCategory) -> &'static str {
    match category {
        ReportCategory::Daily => "Daily",
        ReportCategory::Weekly => "Weekly",
        ReportCategory::Monthly => "Monthly",
        ReportCategory::Yearly => "Yearly",
    }
}

/// Totals the user's receipts over the period containing `input.date` and stores the
/// result as a new report.
///
/// A receipt belongs to the period its creation date falls in. The grand total sums the
/// receipts' `total_expenditure`; the tax deductions sum their items' `deductable_amount`.
#[instrument(skip(db))]
pub async fn generate_report(
    db: &DatabaseConnection,
    user_id: i64,
    input: GenerateInput,
) -> Result<report::Model> {
    let (start, end) = period_bounds(input.category, input.date)?;
    let (from, until) = period_instants(start, end)?;

    let receipts: Vec<receipt::Model> = Receipt::find()
        .filter(receipt::Column::UserId.eq(user_id))
        .filter(receipt::Column::CreatedAt.gte(from))
        .filter(receipt::Column::CreatedAt.lt(until))
        .order_by_asc(receipt::Column::Id)
        .all(db)
        .await?;
    let items = receipts.load_many(ReceiptItem, db).await?;

    let grand_total_expenditure: Decimal = receipts.iter().map(|r| r.total_expenditure).sum();
    let total_tax_deductions: Decimal = items
        .iter()
        .flatten()
        .map(|item| item.deductable_amount)
        .sum();
    debug!(
        "{} receipts between {} and {}: total {}, deductions {}",
        receipts.len(),
        start,
        end,
        grand_total_expenditure,
        total_tax_deductions
    );

    let title = input.title.unwrap_or_else(|| {
        format!(
            "{} report {} to {}",
            category_label(input.category),
            start,
            end
        )
    });
    create_report(
        db,
        user_id,
        ReportInput {
            title,
            category: input.category,
            start_date: start,
            end_date: end,
            grand_total_expenditure,
            total_tax_deductions,
        },
    )
    .await
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::*;
    use chrono::TimeZone;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn payload() -> ReportPayload {
        ReportPayload {
            title: Some("Q1".to_string()),
            category: Some("MONTHLY".to_string()),
            start_date: Some("2024-01-01".to_string()),
            end_date: Some("2024-01-31".to_string()),
            grand_total_expenditure: Some(Decimal::new(100, 0)),
            total_tax_deductions: Some(Decimal::new(125, 1)),
        }
    }

    #[test]
    fn test_period_bounds() {
        // 2024-03-14 is a Thursday
        let date = day(2024, 3, 14);
        assert_eq!(
            period_bounds(ReportCategory::Daily, date).unwrap(),
            (date, date)
        );
        assert_eq!(
            period_bounds(ReportCategory::Weekly, date).unwrap(),
            (day(2024, 3, 11), day(2024, 3, 17))
        );
        assert_eq!(
            period_bounds(ReportCategory::Monthly, date).unwrap(),
            (day(2024, 3, 1), day(2024, 3, 31))
        );
        assert_eq!(
            period_bounds(ReportCategory::Monthly, day(2024, 2, 10)).unwrap(),
            (day(2024, 2, 1), day(2024, 2, 29))
        );
        assert_eq!(
            period_bounds(ReportCategory::Yearly, date).unwrap(),
            (day(2024, 1, 1), day(2024, 12, 31))
        );
    }

    #[test]
    fn test_payload_rejects_bad_dates() {
        let bad = ReportPayload {
            start_date: Some("01/02/2024".to_string()),
            end_date: Some("2023-12-31".to_string()),
            ..payload()
        };
        let Err(Error::Validation { errors }) = bad.validate() else {
            panic!("expected validation error");
        };
        assert_eq!(
            errors.get("start_date").unwrap(),
            [DATE_FORMAT_ERROR.to_string()]
        );

        let reversed = ReportPayload {
            start_date: Some("2024-02-01".to_string()),
            ..payload()
        };
        let Err(Error::Validation { errors }) = reversed.validate() else {
            panic!("expected validation error");
        };
        assert!(errors.contains("end_date"));
    }

    #[tokio::test]
    async fn test_report_crud() -> Result<()> {
        let (db, owner) = setup_with_user().await?;
        let created = create_report(&db, owner.id, payload().validate()?).await?;
        assert_eq!(created.category, ReportCategory::Monthly);
        assert_eq!(created.start_date, day(2024, 1, 1));
        assert_eq!(get_report(&db, owner.id, created.id).await?, created);

        let replaced = replace_report(
            &db,
            owner.id,
            created.id,
            ReportPayload {
                category: Some("YEARLY".to_string()),
                end_date: Some("2024-12-31".to_string()),
                ..payload()
            }
            .validate()?,
        )
        .await?;
        assert_eq!(replaced.category, ReportCategory::Yearly);
        assert_eq!(list_reports(&db, owner.id).await?, vec![replaced]);

        delete_report(&db, owner.id, created.id).await?;
        assert!(matches!(
            get_report(&db, owner.id, created.id).await,
            Err(Error::NotFound { .. })
        ));
        Ok(())
    }

    #[tokio::test]
    async fn test_missing_report_is_not_found() -> Result<()> {
        let (db, owner) = setup_with_user().await?;
        assert!(matches!(
            get_report(&db, owner.id, 999).await,
            Err(Error::NotFound {
                resource: "report",
                id: 999
            })
        ));
        Ok(())
    }

    #[tokio::test]
    async fn test_generate_sums_callers_receipts_in_period() -> Result<()> {
        let (db, owner) = setup_with_user().await?;
        let stranger = create_test_user(&db, "stranger").await?;
        let image = create_test_image(&db, owner.id).await?;
        let other_image = create_test_image(&db, stranger.id).await?;

        // In period: total 12.5 with one item deducting 3.75
        let in_period = create_test_receipt(&db, owner.id, image.id, None).await?;
        create_test_item(&db, in_period.id).await?;

        // Same user, previous year
        let old = create_test_receipt(&db, owner.id, image.id, None).await?;
        let mut old: receipt::ActiveModel = old.into();
        old.created_at = Set(Utc.with_ymd_and_hms(2001, 6, 1, 12, 0, 0).unwrap());
        old.update(&db).await?;

        // Someone else's receipt, same period
        let foreign = create_test_receipt(&db, stranger.id, other_image.id, None).await?;
        create_test_item(&db, foreign.id).await?;

        let today = in_period.created_at.date_naive();
        let report = generate_report(
            &db,
            owner.id,
            GenerateInput {
                category: ReportCategory::Monthly,
                date: today,
                title: None,
            },
        )
        .await?;

        let (start, end) = period_bounds(ReportCategory::Monthly, today)?;
        assert_eq!(report.user_id, owner.id);
        assert_eq!(report.start_date, start);
        assert_eq!(report.end_date, end);
        assert_eq!(report.grand_total_expenditure, Decimal::new(125, 1));
        assert_eq!(report.total_tax_deductions, Decimal::new(375, 2));
        assert_eq!(report.title, format!("Monthly report {start} to {end}"));
        Ok(())
    }

    #[tokio::test]
    async fn test_generate_includes_whole_last_day_only() -> Result<()> {
        let (db, owner) = setup_with_user().await?;
        let image = create_test_image(&db, owner.id).await?;
        let stamps = [
            Utc.with_ymd_and_hms(2024, 2, 29, 23, 59, 59).unwrap(),
            Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2024, 3, 31, 23, 59, 59).unwrap(),
            Utc.with_ymd_and_hms(2024, 4, 1, 0, 0, 0).unwrap(),
        ];
        for stamp in stamps {
            let created = create_test_receipt(&db, owner.id, image.id, None).await?;
            let mut created: receipt::ActiveModel = created.into();
            created.created_at = Set(stamp);
            created.update(&db).await?;
        }

        let report = generate_report(
            &db,
            owner.id,
            GenerateInput {
                category: ReportCategory::Monthly,
                date: day(2024, 3, 15),
                title: None,
            },
        )
        .await?;
        assert_eq!(report.start_date, day(2024, 3, 1));
        assert_eq!(report.end_date, day(2024, 3, 31));
        assert_eq!(report.grand_total_expenditure, Decimal::new(250, 1));
        Ok(())
    }

    #[tokio::test]
    async fn test_generate_empty_period_is_zero() -> Result<()> {
        let (db, owner) = setup_with_user().await?;
        let report = generate_report(
            &db,
            owner.id,
            GeneratePayload {
                category: Some("DAILY".to_string()),
                date: Some("1999-12-31".to_string()),
                title: Some("New year's eve".to_string()),
            }
            .validate()?,
        )
        .await?;
        assert_eq!(report.title, "New year's eve");
        assert!(report.grand_total_expenditure.is_zero());
        assert!(report.total_tax_deductions.is_zero());
        Ok(())
    }
}
