use serde::Deserialize;
use utoipa::ToSchema;

use crate::models::Category;

pub const DEFAULT_PAGE_SIZE: i64 = 10;
pub const MAX_PAGE_SIZE: i64 = 100;

/// Raw query values; anything non-numeric or non-positive falls back to the default.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct Pagination {
    pub page: Option<String>,
    #[serde(rename = "pageSize")]
    pub page_size: Option<String>,
}

impl Pagination {
    pub fn normalize(&self) -> (i64, i64, i64) {
        let page = parse_positive(self.page.as_deref()).unwrap_or(1);
        let per_page = parse_positive(self.page_size.as_deref())
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .min(MAX_PAGE_SIZE);
        let offset = (page - 1).saturating_mul(per_page);
        (page, per_page, offset)
    }
}

fn parse_positive(raw: Option<&str>) -> Option<i64> {
    raw?.trim().parse::<i64>().ok().filter(|value| *value > 0)
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct ListingQuery {
    #[serde(flatten)]
    pub pagination: Pagination,
    pub category: Option<Category>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct SearchQuery {
    #[serde(flatten)]
    pub pagination: Pagination,
    pub q: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pagination(page: Option<&str>, page_size: Option<&str>) -> Pagination {
        Pagination {
            page: page.map(String::from),
            page_size: page_size.map(String::from),
        }
    }

    #[test]
    fn defaults_to_first_page_of_ten() {
        assert_eq!(pagination(None, None).normalize(), (1, 10, 0));
    }

    #[test]
    fn non_numeric_values_silently_default() {
        assert_eq!(pagination(Some("abc"), Some("ten")).normalize(), (1, 10, 0));
        assert_eq!(pagination(Some("-2"), Some("0")).normalize(), (1, 10, 0));
    }

    #[test]
    fn numeric_values_are_used() {
        assert_eq!(pagination(Some("3"), Some("5")).normalize(), (3, 5, 10));
        assert_eq!(pagination(Some("1"), Some("1000")).normalize(), (1, MAX_PAGE_SIZE, 0));
    }
}
