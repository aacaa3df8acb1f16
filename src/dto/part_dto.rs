use rust_decimal::Decimal;
use serde::Deserialize;
use validator::Validate;

use crate::dto::common_dto::{matches_search, search_term, Pagination};
use crate::models::part::{Part, StockMovementType};

// Request para registrar una pieza
#[derive(Debug, Deserialize, Validate)]
pub struct CreatePartRequest {
    #[validate(length(min = 2, max = 50))]
    pub code: String,

    #[validate(length(min = 2, max = 255))]
    pub name: String,

    pub description: Option<String>,
    pub brand: Option<String>,
    pub category: Option<String>,

    #[validate(custom = "crate::utils::validation::validate_positive_decimal")]
    pub price: Decimal,

    #[validate(custom = "crate::utils::validation::validate_positive_decimal")]
    pub cost: Option<Decimal>,

    #[validate(range(min = 0))]
    pub stock: Option<i32>,

    #[validate(range(min = 0))]
    pub min_stock: Option<i32>,

    #[validate(range(min = 0))]
    pub max_stock: Option<i32>,

    pub location: Option<String>,
}

// El stock no se edita aquí: solo vía movimientos
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdatePartRequest {
    #[validate(length(min = 2, max = 50))]
    pub code: Option<String>,

    #[validate(length(min = 2, max = 255))]
    pub name: Option<String>,

    pub description: Option<String>,
    pub brand: Option<String>,
    pub category: Option<String>,

    #[validate(custom = "crate::utils::validation::validate_positive_decimal")]
    pub price: Option<Decimal>,

    #[validate(custom = "crate::utils::validation::validate_positive_decimal")]
    pub cost: Option<Decimal>,

    #[validate(range(min = 0))]
    pub min_stock: Option<i32>,

    #[validate(range(min = 0))]
    pub max_stock: Option<i32>,

    pub location: Option<String>,
    pub is_active: Option<bool>,
}

// Request para ajustar stock
#[derive(Debug, Deserialize, Validate)]
pub struct AdjustStockRequest {
    #[serde(rename = "type")]
    pub movement_type: StockMovementType,

    pub quantity: i32,

    #[validate(custom = "crate::utils::validation::validate_positive_decimal")]
    pub unit_price: Option<Decimal>,

    pub reason: Option<String>,
    pub reference: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ListPartsQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub search: Option<String>,
    pub category: Option<String>,
    pub is_active: Option<bool>,
    pub low_stock: Option<bool>,
}

impl ListPartsQuery {
    pub fn into_parts(self, default_limit: i64) -> (PartFilter, Pagination) {
        (
            PartFilter {
                search: self.search,
                category: self.category,
                is_active: self.is_active,
                low_stock: self.low_stock.unwrap_or(false),
            },
            Pagination::new(self.page, self.limit, default_limit),
        )
    }
}

#[derive(Debug, Clone, Default)]
pub struct PartFilter {
    pub search: Option<String>,
    pub category: Option<String>,
    pub is_active: Option<bool>,
    pub low_stock: bool,
}

impl PartFilter {
    /// Búsqueda en name, code
    pub fn matches(&self, part: &Part) -> bool {
        let fields = [Some(part.name.as_str()), Some(part.code.as_str())];
        matches_search(&fields, search_term(&self.search))
            && self
                .category
                .as_deref()
                .map_or(true, |c| part.category.as_deref() == Some(c))
            && self.is_active.map_or(true, |active| part.is_active == active)
            && (!self.low_stock || part.is_low_stock())
    }
}
