use serde::Serialize;

pub const MAX_PAGE_SIZE: i64 = 100;

// Response genérica
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub message: Option<String>,
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            message: None,
            data: Some(data),
        }
    }

    pub fn success_with_message(data: T, message: String) -> Self {
        Self {
            success: true,
            message: Some(message),
            data: Some(data),
        }
    }
}

impl ApiResponse<()> {
    pub fn message(message: String) -> Self {
        Self {
            success: true,
            message: Some(message),
            data: None,
        }
    }
}

// Paginación ya normalizada: page >= 1, 1 <= limit <= MAX_PAGE_SIZE
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: i64,
    pub limit: i64,
}

impl Pagination {
    pub fn new(page: Option<i64>, limit: Option<i64>, default_limit: i64) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            limit: limit.unwrap_or(default_limit).clamp(1, MAX_PAGE_SIZE),
        }
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1) * self.limit
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self::new(None, None, 20)
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct PageInfo {
    pub page: i64,
    pub limit: i64,
    pub total: i64,
    pub total_pages: i64,
}

impl PageInfo {
    pub fn new(pagination: Pagination, total: i64) -> Self {
        Self {
            page: pagination.page,
            limit: pagination.limit,
            total,
            // ceil(total / limit)
            total_pages: (total + pagination.limit - 1) / pagination.limit,
        }
    }
}

// Página de resultados + conteo total
#[derive(Debug, Serialize)]
pub struct Paginated<T> {
    pub data: Vec<T>,
    pub pagination: PageInfo,
}

impl<T> Paginated<T> {
    pub fn new(data: Vec<T>, pagination: Pagination, total: i64) -> Self {
        Self {
            data,
            pagination: PageInfo::new(pagination, total),
        }
    }
}

/// Búsqueda case-insensitive por substring sobre varios campos (OR)
pub fn matches_search(fields: &[Option<&str>], search: Option<&str>) -> bool {
    let needle = match search.map(str::trim).filter(|s| !s.is_empty()) {
        Some(s) => s.to_lowercase(),
        None => return true,
    };
    fields
        .iter()
        .flatten()
        .any(|field| field.to_lowercase().contains(&needle))
}

/// Patrón ILIKE con los comodines del usuario escapados
pub fn like_pattern(search: &str) -> String {
    let escaped = search
        .trim()
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

/// Texto de búsqueda útil, o None si está vacío
pub fn search_term(search: &Option<String>) -> Option<&str> {
    search.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matches_search_is_case_insensitive_or() {
        let fields = [Some("João da Silva"), None, Some("joao@oficina.com")];
        assert!(matches_search(&fields, Some("SILVA")));
        assert!(matches_search(&fields, Some("oficina")));
        assert!(!matches_search(&fields, Some("pereira")));
        assert!(matches_search(&fields, None));
        assert!(matches_search(&fields, Some("  ")));
    }

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("abc"), "%abc%");
        assert_eq!(like_pattern("10%_"), "%10\\%\\_%");
    }

    #[test]
    fn test_pagination_defaults_and_clamping() {
        let p = Pagination::new(None, None, 20);
        assert_eq!((p.page, p.limit, p.offset()), (1, 20, 0));

        let p = Pagination::new(Some(0), Some(1000), 20);
        assert_eq!((p.page, p.limit), (1, MAX_PAGE_SIZE));

        let p = Pagination::new(Some(3), Some(10), 20);
        assert_eq!(p.offset(), 20);
    }

    #[test]
    fn test_total_pages_is_ceiling() {
        let p = Pagination::new(Some(1), Some(10), 20);
        assert_eq!(PageInfo::new(p, 0).total_pages, 0);
        assert_eq!(PageInfo::new(p, 10).total_pages, 1);
        assert_eq!(PageInfo::new(p, 11).total_pages, 2);
    }
}
