//! Shared query-parameter types for the API layer.

use serde::Deserialize;

/// Default page size
pub const DEFAULT_PER_PAGE: i64 = 20;

/// Largest accepted page size
pub const MAX_PER_PAGE: i64 = 100;

/// Pagination query parameters
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct PageParams {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

impl PageParams {
    /// Resolve to a (page, per_page) pair with defaults and the size cap
    pub fn resolve(&self) -> (i64, i64) {
        let page = self.page.unwrap_or(1).max(1);
        let per_page = self
            .per_page
            .unwrap_or(DEFAULT_PER_PAGE)
            .clamp(1, MAX_PER_PAGE);
        (page, per_page)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        assert_eq!(PageParams::default().resolve(), (1, 20));
    }

    #[test]
    fn test_per_page_capped() {
        let params = PageParams {
            page: Some(2),
            per_page: Some(500),
        };
        assert_eq!(params.resolve(), (2, 100));
    }

    #[test]
    fn test_nonpositive_values_clamped() {
        let params = PageParams {
            page: Some(0),
            per_page: Some(-5),
        };
        assert_eq!(params.resolve(), (1, 1));
    }
}
