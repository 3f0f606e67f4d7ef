//! Page-based pagination over query chains.
//!
//! Pages are 1-indexed. A page is fetched with one extra row so the presence of a
//! following page is known without a separate count query.

use serde::{Deserialize, Serialize};

/// A single page of results.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Page<T> {
    /// The items contained in this page.
    pub items: Vec<T>,
    /// The number of this page.
    pub page: usize,
    /// The next page number (if more items exist).
    pub next_page: Option<usize>,
    /// The previous page number (if this is not the first page).
    pub previous_page: Option<usize>,
}

impl<T> Page<T> {
    /// Builds a page from a fetch of up to `per_page + 1` items.
    ///
    /// The extra item, when present, is dropped and only signals a next page.
    pub fn from_overfetch(mut items: Vec<T>, params: &PaginationParams) -> Self {
        let has_next = items.len() > params.per_page();
        items.truncate(params.per_page());

        Self::new(items, params, has_next)
    }

    /// Builds a page from items already cut to size.
    pub fn new(items: Vec<T>, params: &PaginationParams, has_next: bool) -> Self {
        Self {
            items,
            page: params.page(),
            next_page: has_next
                .then(|| params.page().checked_add(1))
                .flatten(),
            previous_page: (params.page() > 1).then(|| params.page() - 1),
        }
    }

    /// Maps the items of this page, keeping the navigation metadata.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            page: self.page,
            next_page: self.next_page,
            previous_page: self.previous_page,
        }
    }
}

/// Which page to fetch and how many items per page.
///
/// ```ignore
/// let params = PaginationParams::new(3, 20);
/// assert_eq!(params.offset(), 40);
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaginationParams {
    page: usize,
    per_page: usize,
}

impl PaginationParams {
    /// Creates pagination parameters. A page of 0 is treated as page 1.
    pub fn new(page: usize, per_page: usize) -> Self {
        Self { page: page.max(1), per_page }
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn per_page(&self) -> usize {
        self.per_page
    }

    /// Number of items to skip to reach this page.
    pub fn offset(&self) -> usize {
        (self.page - 1).saturating_mul(self.per_page)
    }
}

impl Default for PaginationParams {
    fn default() -> Self {
        Self { page: 1, per_page: 10 }
    }
}
