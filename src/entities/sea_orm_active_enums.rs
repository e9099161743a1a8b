//! Enumerated columns shared by several entities.
//!
//! Values are stored and serialized as their upper-case names, e.g. `"MONTHLY"`.

use crate::core::validation::UnknownChoice;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// Period a report covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReportCategory {
    #[sea_orm(string_value = "DAILY")]
    Daily,
    #[sea_orm(string_value = "WEEKLY")]
    Weekly,
    #[sea_orm(string_value = "MONTHLY")]
    Monthly,
    #[sea_orm(string_value = "YEARLY")]
    Yearly,
}

/// Kind of uploaded document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DocumentType {
    #[sea_orm(string_value = "RECEIPT")]
    Receipt,
    #[sea_orm(string_value = "INVOICE")]
    Invoice,
    #[sea_orm(string_value = "OTHER")]
    Other,
}

/// Spending category of a receipt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReceiptCategory {
    #[sea_orm(string_value = "UTILITIES")]
    Utilities,
    #[sea_orm(string_value = "FOOD")]
    Food,
    #[sea_orm(string_value = "TRANSPORTATION")]
    Transportation,
    #[sea_orm(string_value = "ENTERTAINMENT")]
    Entertainment,
    #[sea_orm(string_value = "OTHER")]
    Other,
}

impl ReportCategory {
    /// Stored and wire form.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Daily => "DAILY",
            Self::Weekly => "WEEKLY",
            Self::Monthly => "MONTHLY",
            Self::Yearly => "YEARLY",
        }
    }
}

impl DocumentType {
    /// Stored and wire form.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Receipt => "RECEIPT",
            Self::Invoice => "INVOICE",
            Self::Other => "OTHER",
        }
    }
}

impl ReceiptCategory {
    /// Stored and wire form.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Utilities => "UTILITIES",
            Self::Food => "FOOD",
            Self::Transportation => "TRANSPORTATION",
            Self::Entertainment => "ENTERTAINMENT",
            Self::Other => "OTHER",
        }
    }
}

// Choices are matched case-sensitively against the stored names.
macro_rules! choice_impls {
    ($($ty:ty),+ $(,)?) => {$(
        impl FromStr for $ty {
            type Err = UnknownChoice;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                <$ty as sea_orm::Iterable>::iter()
                    .find(|variant| variant.as_str() == s)
                    .ok_or_else(|| UnknownChoice(s.to_string()))
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    )+};
}

choice_impls!(ReportCategory, DocumentType, ReceiptCategory);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_choices() {
        assert_eq!("WEEKLY".parse::<ReportCategory>(), Ok(ReportCategory::Weekly));
        assert_eq!("INVOICE".parse::<DocumentType>(), Ok(DocumentType::Invoice));
        assert_eq!(
            "UTILITIES".parse::<ReceiptCategory>(),
            Ok(ReceiptCategory::Utilities)
        );
    }

    #[test]
    fn test_parse_rejects_unknown_and_lowercase() {
        assert!("FORTNIGHTLY".parse::<ReportCategory>().is_err());
        assert!("food".parse::<ReceiptCategory>().is_err());
        assert!("".parse::<DocumentType>().is_err());
    }

    #[test]
    fn test_serde_uses_upper_case_names() {
        let json = serde_json::to_string(&ReceiptCategory::Transportation).unwrap_or_default();
        assert_eq!(json, "\"TRANSPORTATION\"");
        assert_eq!(ReportCategory::Yearly.to_string(), "YEARLY");
    }
}
