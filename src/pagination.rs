//! Page-number pagination for list endpoints.
//!
//! Pages are 1-based. `?page=last` selects the final page, and an empty
//! collection still has one (empty) first page.

use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Invalid page.")]
pub struct InvalidPage;

/// A validated page position within a collection of `count` items.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub number: u64,
    pub size: u64,
    pub count: u64,
}

impl PageWindow {
    /// Resolves the raw `page` query value against the collection size.
    pub fn resolve(raw: Option<&str>, size: u64, count: u64) -> Result<Self, InvalidPage> {
        let size = size.max(1);
        let last = count.div_ceil(size).max(1);
        let number = match raw.map(str::trim) {
            None | Some("") => 1,
            Some("last") => last,
            Some(value) => value.parse::<u64>().map_err(|_| InvalidPage)?,
        };
        if number == 0 || number > last {
            return Err(InvalidPage);
        }
        Ok(Self { number, size, count })
    }

    pub fn offset(&self) -> u64 {
        (self.number - 1) * self.size
    }

    pub fn limit(&self) -> u64 {
        self.size
    }

    fn last(&self) -> u64 {
        self.count.div_ceil(self.size).max(1)
    }

    pub fn has_next(&self) -> bool {
        self.number < self.last()
    }

    pub fn has_previous(&self) -> bool {
        self.number > 1
    }
}

/// Paginated response envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page<T> {
    pub count: u64,
    pub next: Option<String>,
    pub previous: Option<String>,
    pub results: Vec<T>,
}

impl<T> Page<T> {
    /// Wraps one page of `results`, linking neighbours relative to `base`
    /// (e.g. `/todos/`). Page 1 is linked without a query string.
    pub fn new(results: Vec<T>, window: PageWindow, base: &str) -> Self {
        let link = |number: u64| match number {
            1 => base.to_owned(),
            n => format!("{base}?page={n}"),
        };
        Self {
            count: window.count,
            next: window.has_next().then(|| link(window.number + 1)),
            previous: window.has_previous().then(|| link(window.number - 1)),
            results,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(None, 0, 1)]
    #[case(None, 25, 1)]
    #[case(Some("2"), 25, 2)]
    #[case(Some("3"), 25, 3)]
    #[case(Some("last"), 25, 3)]
    #[case(Some("last"), 0, 1)]
    #[case(Some("1"), 0, 1)]
    fn resolves_valid_pages(#[case] raw: Option<&str>, #[case] count: u64, #[case] number: u64) {
        let window = PageWindow::resolve(raw, 10, count).unwrap();
        assert_eq!(window.number, number);
        assert_eq!(window.offset(), (number - 1) * 10);
    }

    #[rstest]
    #[case(Some("0"))]
    #[case(Some("-1"))]
    #[case(Some("abc"))]
    #[case(Some("4"))]
    fn rejects_invalid_pages(#[case] raw: Option<&str>) {
        assert_eq!(PageWindow::resolve(raw, 10, 25), Err(InvalidPage));
    }

    #[test]
    fn links_neighbouring_pages() {
        let first = Page::new(vec![1], PageWindow::resolve(None, 10, 25).unwrap(), "/todos/");
        assert_eq!(first.previous, None);
        assert_eq!(first.next.as_deref(), Some("/todos/?page=2"));

        let middle = Page::new(vec![1], PageWindow::resolve(Some("2"), 10, 25).unwrap(), "/todos/");
        assert_eq!(middle.previous.as_deref(), Some("/todos/"));
        assert_eq!(middle.next.as_deref(), Some("/todos/?page=3"));

        let last = Page::new(vec![1], PageWindow::resolve(Some("3"), 10, 25).unwrap(), "/todos/");
        assert_eq!(last.previous.as_deref(), Some("/todos/?page=2"));
        assert_eq!(last.next, None);
        assert_eq!(last.count, 25);
    }

    #[test]
    fn exact_multiple_has_no_trailing_page() {
        let window = PageWindow::resolve(Some("2"), 10, 20).unwrap();
        assert!(!window.has_next());
        assert_eq!(PageWindow::resolve(Some("3"), 10, 20), Err(InvalidPage));
    }
}
