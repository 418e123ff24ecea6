//! Paginated list envelope.
//!
//! List endpoints wrap their results in `{count, next, previous, results}`.
//! `count` is the total number of matching records (not the page size);
//! `next`/`previous` are relative links carrying the page parameters.

use serde::{Deserialize, Serialize};

/// Default page size when the client sends none.
pub const DEFAULT_PAGE_SIZE: usize = 20;

/// Hard ceiling on `page_size`; larger requests are clamped, not rejected.
pub const MAX_PAGE_SIZE: usize = 100;

/// Page parameters accepted by list endpoints.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct PageParams {
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

impl PageParams {
    /// 1-based page number; page 0 is treated as page 1.
    pub fn page(&self) -> usize {
        self.page.map(|p| p.max(1) as usize).unwrap_or(1)
    }

    /// Effective page size with default and ceiling applied.
    pub fn page_size(&self) -> usize {
        self.page_size
            .map(|s| (s as usize).clamp(1, MAX_PAGE_SIZE))
            .unwrap_or(DEFAULT_PAGE_SIZE)
    }
}

/// The list envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Paginated<T> {
    pub count: usize,
    pub next: Option<String>,
    pub previous: Option<String>,
    pub results: Vec<T>,
}

/// Slices `items` to the requested page and builds the envelope.
///
/// `base_path` is the request path the links are built against; a page past
/// the end yields an empty `results` with the true `count`.
pub fn paginate<T>(base_path: &str, params: PageParams, items: Vec<T>) -> Paginated<T> {
    let count = items.len();
    let page = params.page();
    let page_size = params.page_size();

    let start = (page - 1).saturating_mul(page_size);
    let results: Vec<T> = items
        .into_iter()
        .skip(start)
        .take(page_size)
        .collect();

    let last_page = count.div_ceil(page_size).max(1);
    let link = |p: usize| format!("{}?page={}&page_size={}", base_path, p, page_size);

    Paginated {
        count,
        next: (page < last_page).then(|| link(page + 1)),
        previous: (page > 1 && count > 0).then(|| link(page - 1)),
        results,
    }
}
