use rust_decimal::Decimal;
use serde::Deserialize;
use validator::Validate;

use crate::dto::common_dto::{matches_search, search_term, Pagination};
use crate::models::catalog_service::CatalogService;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateCatalogServiceRequest {
    #[validate(length(min = 2, max = 255))]
    pub name: String,

    pub description: Option<String>,
    pub category: Option<String>,

    #[validate(custom = "crate::utils::validation::validate_positive_decimal")]
    pub price: Decimal,

    #[validate(range(min = 1))]
    pub estimated_minutes: Option<i32>,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateCatalogServiceRequest {
    #[validate(length(min = 2, max = 255))]
    pub name: Option<String>,

    pub description: Option<String>,
    pub category: Option<String>,

    #[validate(custom = "crate::utils::validation::validate_positive_decimal")]
    pub price: Option<Decimal>,

    #[validate(range(min = 1))]
    pub estimated_minutes: Option<i32>,

    pub is_active: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ListCatalogServicesQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub search: Option<String>,
    pub category: Option<String>,
    pub is_active: Option<bool>,
}

impl ListCatalogServicesQuery {
    pub fn into_parts(self, default_limit: i64) -> (CatalogServiceFilter, Pagination) {
        (
            CatalogServiceFilter {
                search: self.search,
                category: self.category,
                is_active: self.is_active,
            },
            Pagination::new(self.page, self.limit, default_limit),
        )
    }
}

#[derive(Debug, Clone, Default)]
pub struct CatalogServiceFilter {
    pub search: Option<String>,
    pub category: Option<String>,
    pub is_active: Option<bool>,
}

impl CatalogServiceFilter {
    pub fn matches(&self, service: &CatalogService) -> bool {
        matches_search(&[Some(service.name.as_str())], search_term(&self.search))
            && self
                .category
                .as_deref()
                .map_or(true, |c| service.category.as_deref() == Some(c))
            && self.is_active.map_or(true, |active| service.is_active == active)
    }
}
