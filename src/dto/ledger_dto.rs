use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::dto::common_dto::Pagination;
use crate::models::ledger::{DateRange, LedgerEntry, LedgerEntryType, PaymentMethod};

// Request para crear un lançamento
#[derive(Debug, Deserialize, Validate)]
pub struct CreateLedgerEntryRequest {
    #[serde(alias = "type")]
    pub entry_type: LedgerEntryType,

    #[validate(custom = "crate::utils::validation::validate_positive_decimal")]
    pub amount: Decimal,

    #[validate(length(min = 2, max = 255))]
    pub description: String,

    pub category: Option<String>,
    pub date: NaiveDate,
    pub work_order_id: Option<Uuid>,

    #[serde(default)]
    pub is_paid: bool,

    pub payment_method: Option<PaymentMethod>,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateLedgerEntryRequest {
    #[serde(alias = "type")]
    pub entry_type: Option<LedgerEntryType>,

    #[validate(custom = "crate::utils::validation::validate_positive_decimal")]
    pub amount: Option<Decimal>,

    #[validate(length(min = 2, max = 255))]
    pub description: Option<String>,

    pub category: Option<String>,
    pub date: Option<NaiveDate>,
    pub work_order_id: Option<Uuid>,
    pub is_paid: Option<bool>,
    pub payment_method: Option<PaymentMethod>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ListLedgerQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    #[serde(alias = "type")]
    pub entry_type: Option<LedgerEntryType>,
    pub category: Option<String>,
    pub is_paid: Option<bool>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl ListLedgerQuery {
    pub fn into_parts(self, default_limit: i64) -> (LedgerFilter, Pagination) {
        (
            LedgerFilter {
                entry_type: self.entry_type,
                category: self.category,
                is_paid: self.is_paid,
                range: DateRange::new(self.start_date, self.end_date),
            },
            Pagination::new(self.page, self.limit, default_limit),
        )
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct SummaryQuery {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl SummaryQuery {
    pub fn range(&self) -> DateRange {
        DateRange::new(self.start_date, self.end_date)
    }
}

#[derive(Debug, Clone, Default)]
pub struct LedgerFilter {
    pub entry_type: Option<LedgerEntryType>,
    pub category: Option<String>,
    pub is_paid: Option<bool>,
    pub range: DateRange,
}

impl LedgerFilter {
    pub fn for_range(range: DateRange) -> Self {
        Self {
            range,
            ..Self::default()
        }
    }

    pub fn matches(&self, entry: &LedgerEntry) -> bool {
        self.entry_type.map_or(true, |t| entry.entry_type == t)
            && self
                .category
                .as_deref()
                .map_or(true, |c| entry.category.as_deref() == Some(c))
            && self.is_paid.map_or(true, |paid| entry.is_paid == paid)
            && self.range.contains(entry.date)
    }
}
