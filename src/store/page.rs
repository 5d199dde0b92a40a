use serde::Serialize;

use crate::error::{CoreError, CoreResult};

/// One page of a timestamp-ordered scan, with enough bookkeeping for a
/// caller to render next/previous links.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub page: i64,
    pub per_page: i64,
    pub has_next: bool,
    pub has_prev: bool,
}

impl<T> Page<T> {
    /// Slices `sorted` (already in final order) down to the 1-based `page`.
    /// Non-positive `page` or `per_page` is a caller contract violation and
    /// is rejected, never clamped. A page past the end is not an error; it
    /// is an empty page with `has_next` false.
    pub fn build(sorted: Vec<T>, page: i64, per_page: i64) -> CoreResult<Page<T>> {
        if page < 1 {
            return Err(CoreError::InvalidArgument(format!(
                "page must be >= 1, got {page}"
            )));
        }
        if per_page < 1 {
            return Err(CoreError::InvalidArgument(format!(
                "per_page must be >= 1, got {per_page}"
            )));
        }

        let total = sorted.len() as i64;
        let offset = (page - 1).saturating_mul(per_page);
        let items: Vec<T> = sorted
            .into_iter()
            .skip(offset as usize)
            .take(per_page as usize)
            .collect();

        Ok(Page {
            has_next: page.saturating_mul(per_page) < total,
            has_prev: page > 1,
            items,
            total,
            page,
            per_page,
        })
    }

    pub fn next_page(&self) -> Option<i64> {
        self.has_next.then(|| self.page + 1)
    }

    pub fn prev_page(&self) -> Option<i64> {
        self.has_prev.then(|| self.page - 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slices_and_reports_neighbours() {
        let page = Page::build((1..=7).collect::<Vec<i32>>(), 2, 3).unwrap();
        assert_eq!(page.items, vec![4, 5, 6]);
        assert_eq!(page.total, 7);
        assert!(page.has_next);
        assert!(page.has_prev);
        assert_eq!(page.next_page(), Some(3));
        assert_eq!(page.prev_page(), Some(1));
    }

    #[test]
    fn first_and_last_pages_have_no_dangling_links() {
        let first = Page::build((1..=7).collect::<Vec<i32>>(), 1, 3).unwrap();
        assert!(!first.has_prev);
        assert!(first.has_next);

        let last = Page::build((1..=7).collect::<Vec<i32>>(), 3, 3).unwrap();
        assert_eq!(last.items, vec![7]);
        assert!(last.has_next == false);
        assert!(last.has_prev);
    }

    #[test]
    fn page_past_the_end_is_empty_not_an_error() {
        let page = Page::build(vec![1, 2], 5, 10).unwrap();
        assert!(page.items.is_empty());
        assert_eq!(page.total, 2);
        assert!(!page.has_next);
        assert!(page.has_prev);
    }

    #[test]
    fn rejects_non_positive_page_and_per_page() {
        assert!(matches!(
            Page::build(vec![1], 0, 10),
            Err(CoreError::InvalidArgument(_))
        ));
        assert!(matches!(
            Page::build(vec![1], 1, 0),
            Err(CoreError::InvalidArgument(_))
        ));
        assert!(matches!(
            Page::build(vec![1], -3, -1),
            Err(CoreError::InvalidArgument(_))
        ));
    }
}
