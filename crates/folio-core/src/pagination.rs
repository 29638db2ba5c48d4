//! Page arithmetic shared by every feed.
//!
//! Requested page numbers never fail: garbage or a missing value means the
//! first page, numbers past either end clamp to the nearest valid page.

use serde::Serialize;

/// Splits `count` items into pages of `per_page`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Paginator {
    count: u64,
    per_page: u64,
}

impl Paginator {
    pub fn new(count: u64, per_page: u64) -> Self {
        Self {
            count,
            per_page: per_page.max(1),
        }
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn per_page(&self) -> u64 {
        self.per_page
    }

    /// An empty collection still has one (empty) page.
    pub fn num_pages(&self) -> u64 {
        if self.count == 0 {
            1
        } else {
            self.count.div_ceil(self.per_page)
        }
    }

    /// Resolve a raw `page` parameter to a valid 1-based page number.
    pub fn page_number(&self, raw: Option<&str>) -> u64 {
        let Some(raw) = raw.map(str::trim) else {
            return 1;
        };
        match raw.parse::<i64>() {
            Ok(requested) if requested < 1 => 1,
            Ok(requested) => (requested as u64).min(self.num_pages()),
            // Integers too wide for i64 still clamp toward the end they point at.
            Err(_) if is_integer(raw) => {
                if raw.starts_with('-') {
                    1
                } else {
                    self.num_pages()
                }
            }
            Err(_) => 1,
        }
    }

    /// Index of the first item on `number`.
    pub fn offset(&self, number: u64) -> u64 {
        (number.max(1) - 1) * self.per_page
    }

    /// Wrap the items already fetched for `number`.
    pub fn page<T>(&self, number: u64, items: Vec<T>) -> Page<T> {
        Page {
            items,
            number,
            num_pages: self.num_pages(),
            count: self.count,
            per_page: self.per_page,
        }
    }
}

fn is_integer(raw: &str) -> bool {
    let digits = raw.strip_prefix(['+', '-']).unwrap_or(raw);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

/// One page of results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub number: u64,
    pub num_pages: u64,
    pub count: u64,
    pub per_page: u64,
}

impl<T> Page<T> {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn has_next(&self) -> bool {
        self.number < self.num_pages
    }

    pub fn has_previous(&self) -> bool {
        self.number > 1
    }

    pub fn next_page_number(&self) -> Option<u64> {
        self.has_next().then(|| self.number + 1)
    }

    pub fn previous_page_number(&self) -> Option<u64> {
        self.has_previous().then(|| self.number - 1)
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            number: self.number,
            num_pages: self.num_pages,
            count: self.count,
            per_page: self.per_page,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_num_pages() {
        assert_eq!(Paginator::new(0, 10).num_pages(), 1);
        assert_eq!(Paginator::new(10, 10).num_pages(), 1);
        assert_eq!(Paginator::new(13, 10).num_pages(), 2);
        assert_eq!(Paginator::new(21, 10).num_pages(), 3);
    }

    #[test]
    fn test_page_number_clamps() {
        let paginator = Paginator::new(13, 10);

        assert_eq!(paginator.page_number(None), 1);
        assert_eq!(paginator.page_number(Some("2")), 2);
        assert_eq!(paginator.page_number(Some(" 2 ")), 2);
        assert_eq!(paginator.page_number(Some("99")), 2);
        assert_eq!(paginator.page_number(Some("0")), 1);
        assert_eq!(paginator.page_number(Some("-4")), 1);
        assert_eq!(paginator.page_number(Some("last")), 1);
        assert_eq!(paginator.page_number(Some("")), 1);
        assert_eq!(paginator.page_number(Some("99999999999999999999")), 2);
        assert_eq!(paginator.page_number(Some("-99999999999999999999")), 1);
        assert_eq!(paginator.page_number(Some("9999999999999999999x")), 1);
    }

    #[test]
    fn test_offsets() {
        let paginator = Paginator::new(13, 10);
        assert_eq!(paginator.offset(1), 0);
        assert_eq!(paginator.offset(2), 10);
    }

    #[test]
    fn test_zero_page_size_is_treated_as_one() {
        let paginator = Paginator::new(3, 0);
        assert_eq!(paginator.per_page(), 1);
        assert_eq!(paginator.num_pages(), 3);
    }

    #[test]
    fn test_page_navigation() {
        let paginator = Paginator::new(13, 10);

        let first = paginator.page(1, (0..10).collect::<Vec<_>>());
        assert!(first.has_next());
        assert!(!first.has_previous());
        assert_eq!(first.next_page_number(), Some(2));

        let second = paginator.page(2, (10..13).collect::<Vec<_>>());
        assert_eq!(second.len(), 3);
        assert!(!second.has_next());
        assert_eq!(second.previous_page_number(), Some(1));
        assert_eq!(second.map(|n| n * 2).items, vec![20, 22, 24]);
    }
}
