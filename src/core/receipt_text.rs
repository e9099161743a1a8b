//! Receipt text parsing - Turns OCR output of a Philippine-style receipt into structured data.
//!
//! Parsing is best effort: every part of [`ParsedReceipt`] is optional and simply left
//! empty when the text does not contain it. Nothing here touches the database.

use crate::{
    core::validation::{BLANK, FieldErrors},
    errors::Result,
};
use chrono::{NaiveDate, NaiveTime};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::debug;

type Pattern = Lazy<Option<Regex>>;

static STORE_NAME_RE: Pattern = Lazy::new(|| Regex::new(r"^[A-Z][A-Za-z0-9 \t&.,]+$").ok());
static BRANCH_RE: Pattern =
    Lazy::new(|| Regex::new(r"(?m)(?:Branch|BRANCH)[: \t]*([A-Za-z0-9 \t.,]+)$").ok());
static TIN_RE: Pattern = Lazy::new(|| {
    Regex::new(r"(?:TIN|TAX\s+ID)[:\s]*(\d{3}[-\s]?\d{3}[-\s]?\d{3}[-\s]?\d{3,5})").ok()
});
static DATE_RES: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"\b(\d{2}/\d{2}/\d{2,4})\b",
        r"\b(\d{2}-\d{2}-\d{2,4})\b",
        r"\b(\d{1,2}\s+(?:Jan|Feb|Mar|Apr|May|Jun|Jul|Aug|Sep|Oct|Nov|Dec)[a-z]*\s+\d{2,4})\b",
    ]
    .iter()
    .filter_map(|pattern| Regex::new(pattern).ok())
    .collect()
});
static TIME_RE: Pattern =
    Lazy::new(|| Regex::new(r"\b(\d{1,2}:\d{2}(?::\d{2})?(?:\s*[AaPp][Mm])?)").ok());
static VAT_RE: Pattern = Lazy::new(|| {
    Regex::new(r"(?:\bVAT|V\.A\.T\.)[:\s]*(?:Sales|Amount)?[:\s]*([\d,]+\.\d{2})").ok()
});
// `\b` keeps SUBTOTAL from counting as a total
static TOTAL_RE: Pattern =
    Lazy::new(|| Regex::new(r"\b(?:TOTAL|AMOUNT\s+DUE)[:\s]*([\d,]+\.\d{2})").ok());
static BIR_RE: Pattern = Lazy::new(|| {
    Regex::new(r"(?:BIR\s+Accred(?:itation)?(?:\s+No\.?)?|PTU\s+No\.?)[:\s]*([A-Za-z0-9-]+)").ok()
});
static SERIAL_RE: Pattern =
    Lazy::new(|| Regex::new(r"(?:Serial|Machine)\s+No\.?[:\s]*([A-Za-z0-9-]+)").ok());
static ITEM_RE: Pattern = Lazy::new(|| {
    Regex::new(r"^((?:\d+[ \t]*[@xX][ \t]*)?[A-Za-z0-9 \t&.,-]+?)[ \t]+([\d,]+\.\d{2})$").ok()
});
static QUANTITY_RE: Pattern = Lazy::new(|| Regex::new(r"^(\d+)[ \t]*[@xX][ \t]*(.+)$").ok());

static SECTION_RES: Lazy<Vec<(Section, Regex)>> = Lazy::new(|| {
    [
        (Section::Items, r"(?i)^(?:ITEMS|PURCHASED\s+ITEMS|SALE)"),
        (Section::Subtotal, r"(?i)^(?:SUBTOTAL|SUB\s*TOTAL)"),
        (Section::Tax, r"(?i)^(?:VAT|TAX)"),
        (Section::Total, r"(?i)^(?:TOTAL|GRAND\s+TOTAL)"),
    ]
    .into_iter()
    .filter_map(|(section, pattern)| Regex::new(pattern).ok().map(|re| (section, re)))
    .collect()
});

// Two-digit years go first: `%Y` would read "24" as the year 24.
const DATE_FORMATS: &[&str] = &[
    "%d/%m/%y", "%d/%m/%Y", "%m/%d/%y", "%m/%d/%Y", "%d-%m-%y", "%d-%m-%Y", "%d %b %y",
    "%d %B %y", "%d %b %Y", "%d %B %Y",
];
const TIME_FORMATS: &[&str] = &["%H:%M", "%H:%M:%S", "%I:%M %p", "%I:%M:%S %p"];

/// Characters OCR tends to read in place of digits.
fn digit_for(c: char) -> Option<char> {
    match c {
        'O' => Some('0'),
        'l' | 'I' => Some('1'),
        'S' => Some('5'),
        'B' => Some('8'),
        _ => None,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Items,
    Subtotal,
    Tax,
    Total,
}

/// Request body for the receipt text endpoint.
#[derive(Debug, Default, Deserialize)]
pub struct ReceiptTextPayload {
    pub text: Option<String>,
}

impl ReceiptTextPayload {
    /// Returns the OCR text once it is present.
    pub fn validate(self) -> Result<String> {
        let mut errors = FieldErrors::new();
        match errors.required("text", self.text) {
            Some(text) if !text.trim().is_empty() => Ok(text),
            Some(_) => {
                errors.add("text", BLANK);
                Err(errors.into())
            }
            None => Err(errors.into()),
        }
    }
}

/// Header lines naming the store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StoreInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
    /// Tax identification number, digits only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tin: Option<String>,
}

/// When the purchase happened.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TransactionInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time: Option<NaiveTime>,
}

/// One purchased line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParsedItem {
    pub description: String,
    pub quantity: i64,
    pub price: Decimal,
}

/// Amounts from the summary lines.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Totals {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vat: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<Decimal>,
    /// `total - vat`, when both are known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtotal: Option<Decimal>,
}

/// Registration details printed on the receipt.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReceiptMetadata {
    /// BIR accreditation or PTU number
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bir_accreditation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub serial_number: Option<String>,
}

/// Everything recognised in a receipt's text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ParsedReceipt {
    pub store_info: StoreInfo,
    pub transaction_info: TransactionInfo,
    pub items: Vec<ParsedItem>,
    pub totals: Totals,
    pub metadata: ReceiptMetadata,
}

fn captures<'t>(pattern: &Pattern, text: &'t str) -> Option<Captures<'t>> {
    pattern.as_ref()?.captures(text)
}

fn group(pattern: &Pattern, text: &str) -> Option<String> {
    captures(pattern, text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
}

fn parse_amount(raw: &str) -> Option<Decimal> {
    Decimal::from_str(&raw.replace(',', "")).ok()
}

/// Fixes letters OCR put where digits belong: inside a number, at the end of one, or
/// leading one at the start of a line.
fn fix_digits(line: &str) -> String {
    let chars: Vec<char> = line.chars().collect();
    let mut fixed = String::with_capacity(line.len());
    let mut previous: Option<char> = None;

    for (i, &c) in chars.iter().enumerate() {
        let next = chars.get(i + 1).copied();
        let continues_number = next.is_some_and(|n| {
            n.is_ascii_digit() || n == '.' || n == ',' || digit_for(n).is_some()
        });
        let after_digit = previous.is_some_and(|p| p.is_ascii_digit());

        let replaced = match digit_for(c) {
            Some(digit) if after_digit && (next.is_none() || continues_number) => digit,
            Some(digit) if i == 0 && next.is_some_and(|n| n.is_ascii_digit()) => digit,
            _ => c,
        };
        fixed.push(replaced);
        previous = Some(replaced);
    }
    fixed
}

/// Trims every line, drops blank ones and repairs OCR digit confusions.
fn clean(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(fix_digits)
        .collect()
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(&raw, format).ok())
}

fn parse_time(raw: &str) -> Option<NaiveTime> {
    let raw = raw.to_uppercase();
    TIME_FORMATS
        .iter()
        .find_map(|format| NaiveTime::parse_from_str(&raw, format).ok())
}

fn section_of(line: &str) -> Option<Section> {
    SECTION_RES
        .iter()
        .find(|(_, re)| re.is_match(line))
        .map(|(section, _)| *section)
}

fn parse_item(line: &str) -> Option<ParsedItem> {
    let caps = captures(&ITEM_RE, line)?;
    let description = caps.get(1)?.as_str().trim();
    let price = parse_amount(caps.get(2)?.as_str())?;

    let (quantity, description) = match captures(&QUANTITY_RE, description) {
        Some(q) => (
            q.get(1)?.as_str().parse().ok()?,
            q.get(2)?.as_str().trim().to_string(),
        ),
        None => (1, description.to_string()),
    };
    Some(ParsedItem {
        description,
        quantity,
        price,
    })
}

/// Priced lines outside the header sections. Everything after a TOTAL header is ignored.
fn extract_items(lines: &[String]) -> Vec<ParsedItem> {
    let mut items = Vec::new();
    let mut section = None;

    for line in lines {
        if let Some(header) = section_of(line) {
            section = Some(header);
            continue;
        }
        if section == Some(Section::Total) {
            continue;
        }
        if let Some(item) = parse_item(line) {
            items.push(item);
        }
    }
    items
}

/// Parses OCR text of a receipt.
#[must_use]
pub fn parse_receipt_text(text: &str) -> ParsedReceipt {
    let lines = clean(text);
    let joined = lines.join("\n");

    let store_info = StoreInfo {
        name: lines
            .iter()
            .find(|line| STORE_NAME_RE.as_ref().is_some_and(|re| re.is_match(line)))
            .cloned(),
        branch: group(&BRANCH_RE, &joined),
        tin: group(&TIN_RE, &joined)
            .map(|tin| tin.chars().filter(char::is_ascii_digit).collect()),
    };

    // Only the first date-looking match counts, even when it turns out not to be a date
    let date = DATE_RES
        .iter()
        .find_map(|re| re.captures(&joined))
        .and_then(|caps| caps.get(1).and_then(|m| parse_date(m.as_str())));
    let transaction_info = TransactionInfo {
        date,
        time: group(&TIME_RE, &joined).and_then(|raw| parse_time(&raw)),
    };

    let vat = group(&VAT_RE, &joined).and_then(|raw| parse_amount(&raw));
    let total = group(&TOTAL_RE, &joined).and_then(|raw| parse_amount(&raw));
    let totals = Totals {
        vat,
        total,
        subtotal: total.zip(vat).map(|(total, vat)| total - vat),
    };

    let metadata = ReceiptMetadata {
        bir_accreditation: group(&BIR_RE, &joined),
        serial_number: group(&SERIAL_RE, &joined),
    };

    let items = extract_items(&lines);
    debug!("Parsed receipt text into {} items", items.len());

    ParsedReceipt {
        store_info,
        transaction_info,
        items,
        totals,
        metadata,
    }
}
