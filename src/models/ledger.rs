//! Modelo del libro financiero (lançamentos)
//!
//! `amount` siempre se guarda positivo; la dirección la da `entry_type`.
//! El saldo se deriva al agregar, nunca se persiste.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use std::collections::BTreeMap;
use uuid::Uuid;

pub const UNCATEGORIZED: &str = "uncategorized";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[sqlx(type_name = "ledger_entry_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum LedgerEntryType {
    Income,
    Expense,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq)]
#[sqlx(type_name = "payment_method", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    Card,
    Pix,
    Check,
    Transfer,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct LedgerEntry {
    pub id: Uuid,
    pub entry_type: LedgerEntryType,
    pub amount: Decimal,
    pub description: String,
    pub category: Option<String>,
    pub date: NaiveDate,
    pub work_order_id: Option<Uuid>,
    pub is_paid: bool,
    pub payment_method: Option<PaymentMethod>,
    pub created_by_id: Uuid,
    pub created_at: DateTime<Utc>,
}

impl LedgerEntry {
    /// +amount para receitas, -amount para despesas
    pub fn signed_amount(&self) -> Decimal {
        match self.entry_type {
            LedgerEntryType::Income => self.amount,
            LedgerEntryType::Expense => -self.amount,
        }
    }

    pub fn category_bucket(&self) -> &str {
        self.category
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .unwrap_or(UNCATEGORIZED)
    }
}

/// Rango de fechas inclusivo en ambos extremos
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateRange {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl DateRange {
    pub fn new(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start.map_or(true, |s| date >= s) && self.end.map_or(true, |e| date <= e)
    }

    pub fn is_inverted(&self) -> bool {
        matches!((self.start, self.end), (Some(s), Some(e)) if s > e)
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CategoryTotal {
    pub entry_type: LedgerEntryType,
    pub category: String,
    pub amount: Decimal,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct LedgerSummary {
    pub total_income: Decimal,
    pub total_expense: Decimal,
    pub balance: Decimal,
    pub by_category: Vec<CategoryTotal>,
}

impl LedgerSummary {
    /// Agrupa por (tipo, categoría). Recalculado en cada consulta.
    pub fn from_entries<'a>(entries: impl IntoIterator<Item = &'a LedgerEntry>) -> Self {
        let mut total_income = Decimal::ZERO;
        let mut total_expense = Decimal::ZERO;
        let mut groups: BTreeMap<(LedgerEntryType, String), Decimal> = BTreeMap::new();

        for entry in entries {
            match entry.entry_type {
                LedgerEntryType::Income => total_income += entry.amount,
                LedgerEntryType::Expense => total_expense += entry.amount,
            }
            *groups
                .entry((entry.entry_type, entry.category_bucket().to_string()))
                .or_insert(Decimal::ZERO) += entry.amount;
        }

        let by_category = groups
            .into_iter()
            .map(|((entry_type, category), amount)| CategoryTotal {
                entry_type,
                category,
                amount,
            })
            .collect();

        Self {
            total_income,
            total_expense,
            balance: total_income - total_expense,
            by_category,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn entry(entry_type: LedgerEntryType, amount: Decimal, category: Option<&str>) -> LedgerEntry {
        LedgerEntry {
            id: Uuid::new_v4(),
            entry_type,
            amount,
            description: "Lançamento".to_string(),
            category: category.map(str::to_string),
            date: NaiveDate::from_ymd_opt(2024, 3, 10).unwrap(),
            work_order_id: None,
            is_paid: true,
            payment_method: None,
            created_by_id: Uuid::new_v4(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_summary_totals_and_balance() {
        let entries = vec![
            entry(LedgerEntryType::Income, dec!(100), Some("Serviços")),
            entry(LedgerEntryType::Expense, dec!(40), Some("Peças")),
            entry(LedgerEntryType::Income, dec!(25), None),
        ];
        let summary = LedgerSummary::from_entries(&entries);
        assert_eq!(summary.total_income, dec!(125));
        assert_eq!(summary.total_expense, dec!(40));
        assert_eq!(summary.balance, dec!(85));
        assert_eq!(summary.by_category.len(), 3);
        assert!(summary
            .by_category
            .iter()
            .any(|c| c.category == UNCATEGORIZED && c.amount == dec!(25)));
    }

    #[test]
    fn test_same_category_is_grouped_per_type() {
        let entries = vec![
            entry(LedgerEntryType::Income, dec!(10), Some("Geral")),
            entry(LedgerEntryType::Income, dec!(15), Some("Geral")),
            entry(LedgerEntryType::Expense, dec!(5), Some("Geral")),
            entry(LedgerEntryType::Expense, dec!(1), Some("  ")),
        ];
        let summary = LedgerSummary::from_entries(&entries);
        assert_eq!(
            summary.by_category,
            vec![
                CategoryTotal { entry_type: LedgerEntryType::Income, category: "Geral".into(), amount: dec!(25) },
                CategoryTotal { entry_type: LedgerEntryType::Expense, category: "Geral".into(), amount: dec!(5) },
                CategoryTotal { entry_type: LedgerEntryType::Expense, category: UNCATEGORIZED.into(), amount: dec!(1) },
            ]
        );
    }

    #[test]
    fn test_signed_amount() {
        assert_eq!(entry(LedgerEntryType::Expense, dec!(40), None).signed_amount(), dec!(-40));
        assert_eq!(entry(LedgerEntryType::Income, dec!(40), None).signed_amount(), dec!(40));
    }

    #[test]
    fn test_date_range_is_inclusive() {
        let d = |day| NaiveDate::from_ymd_opt(2024, 3, day).unwrap();
        let range = DateRange::new(Some(d(1)), Some(d(10)));
        assert!(range.contains(d(1)));
        assert!(range.contains(d(10)));
        assert!(!range.contains(d(11)));
        assert!(DateRange::default().contains(d(20)));
        assert!(DateRange::new(Some(d(10)), Some(d(1))).is_inverted());
    }
}
