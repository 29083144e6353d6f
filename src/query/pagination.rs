// Cursor pagination
//
// The cursor is the store key of the last record returned. A page starts
// strictly after it, so records written between calls never shift a page.

use serde::{Deserialize, Serialize};

/// Page size used when a request asks for none
pub const DEFAULT_PAGE_LIMIT: u32 = 100;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    /// Resume after this key (exclusive)
    pub key: Option<Vec<u8>>,
    /// Maximum records per page; 0 means the default
    pub limit: u32,
}

impl PageRequest {
    pub fn new(limit: u32) -> Self {
        Self { key: None, limit }
    }

    /// Continue from the `next_key` of a previous response
    pub fn after(key: Vec<u8>, limit: u32) -> Self {
        Self {
            key: Some(key),
            limit,
        }
    }

    pub fn effective_limit(&self) -> usize {
        if self.limit == 0 {
            DEFAULT_PAGE_LIMIT as usize
        } else {
            self.limit as usize
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageResponse {
    /// Cursor for the next page, `None` on the last page
    pub next_key: Option<Vec<u8>>,
    /// Number of records matching the query across all pages
    pub total: u64,
}

/// Cut one page out of `items`, which must be in ascending key order
pub fn paginate<T>(items: Vec<(Vec<u8>, T)>, page: Option<&PageRequest>) -> (Vec<T>, PageResponse) {
    let default = PageRequest::default();
    let page = page.unwrap_or(&default);
    let limit = page.effective_limit();
    let total = items.len() as u64;

    let mut remaining = items
        .into_iter()
        .skip_while(|(key, _)| matches!(&page.key, Some(cursor) if key <= cursor))
        .peekable();

    let mut records = Vec::new();
    let mut last_key = None;
    while records.len() < limit {
        match remaining.next() {
            Some((key, record)) => {
                records.push(record);
                last_key = Some(key);
            }
            None => break,
        }
    }

    let next_key = if remaining.peek().is_some() { last_key } else { None };
    (records, PageResponse { next_key, total })
}
