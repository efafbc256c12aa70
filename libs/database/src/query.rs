//! Pagination and text-search helpers shared by the list queries.

use sea_orm::sea_query::{Expr, ExprTrait, Func};
use sea_orm::{ColumnTrait, Condition, QuerySelect};

/// Page size used when the caller omits `limit` or sends a non-positive one.
pub const DEFAULT_PAGE_SIZE: u64 = 20;

/// Upper bound on `limit`.
pub const MAX_PAGE_SIZE: u64 = 100;

/// Normalised limit/offset pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub limit: u64,
    pub offset: u64,
}

impl Page {
    /// `limit <= 0` (or absent) becomes [`DEFAULT_PAGE_SIZE`], larger values are
    /// capped at [`MAX_PAGE_SIZE`], negative offsets become 0.
    pub fn new(limit: Option<i64>, offset: Option<i64>) -> Self {
        let limit = match limit {
            Some(l) if l > 0 => Ord::min(l as u64, MAX_PAGE_SIZE),
            _ => DEFAULT_PAGE_SIZE,
        };
        let offset = offset.filter(|o| *o > 0).map_or(0, |o| o as u64);

        Self { limit, offset }
    }

    pub fn apply<Q: QuerySelect>(self, query: Q) -> Q {
        query.limit(self.limit).offset(self.offset)
    }

    /// Slice an already-ordered in-memory collection the same way SQL would.
    pub fn slice<T>(self, items: Vec<T>) -> Vec<T> {
        items
            .into_iter()
            .skip(self.offset as usize)
            .take(self.limit as usize)
            .collect()
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::new(None, None)
    }
}

/// `LIKE` pattern matching `needle` anywhere, lowercased, with wildcards escaped.
pub fn contains_pattern(needle: &str) -> String {
    let mut pattern = String::with_capacity(needle.len() + 2);
    pattern.push('%');
    for c in needle.to_lowercase().chars() {
        if matches!(c, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

/// Case-insensitive substring match: `LOWER(col) LIKE '%needle%'`.
pub fn contains_ci<C: ColumnTrait>(column: C, needle: &str) -> Condition {
    let lowered = Expr::expr(Func::lower(Expr::col((column.entity_name(), column))));
    Condition::all().add(lowered.like(contains_pattern(needle)))
}

/// In-memory counterpart of [`contains_ci`].
pub fn matches_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_defaults() {
        assert_eq!(
            Page::new(None, None),
            Page {
                limit: DEFAULT_PAGE_SIZE,
                offset: 0
            }
        );
        assert_eq!(Page::new(Some(0), None).limit, DEFAULT_PAGE_SIZE);
        assert_eq!(Page::new(Some(-5), None).limit, DEFAULT_PAGE_SIZE);
    }

    #[test]
    fn test_page_caps_limit_and_clamps_offset() {
        let page = Page::new(Some(10_000), Some(-3));
        assert_eq!(page.limit, MAX_PAGE_SIZE);
        assert_eq!(page.offset, 0);

        let page = Page::new(Some(5), Some(15));
        assert_eq!(page, Page { limit: 5, offset: 15 });
    }

    #[test]
    fn test_page_limit_boundary() {
        assert_eq!(Page::new(Some(100), None).limit, 100);
        assert_eq!(Page::new(Some(101), None).limit, MAX_PAGE_SIZE);
        assert_eq!(Page::new(Some(1), None).limit, 1);
    }

    #[test]
    fn test_page_slice() {
        let page = Page::new(Some(2), Some(1));
        assert_eq!(page.slice(vec![1, 2, 3, 4]), vec![2, 3]);
        assert!(Page::new(Some(2), Some(10)).slice(vec![1, 2]).is_empty());
    }

    #[test]
    fn test_contains_pattern_escapes_wildcards() {
        assert_eq!(contains_pattern("Drill"), "%drill%");
        assert_eq!(contains_pattern("50%_off"), "%50\\%\\_off%");
        assert_eq!(contains_pattern("a\\b"), "%a\\\\b%");
    }

    #[test]
    fn test_matches_ci() {
        assert!(matches_ci("Cordless Drill", "drill"));
        assert!(matches_ci("Berlin, Mitte", "MITTE"));
        assert!(!matches_ci("Ladder", "drill"));
    }
}
