//! Request/response shapes for paginated fetches.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Arguments passed to the fetch function for one page.
///
/// Pages are 1-based; `offset` is derived for backends that paginate by
/// row offset instead of page number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    pub page: u32,
    pub page_size: u32,
    pub offset: u64,
}

impl PageRequest {
    /// Build the request for a page.
    pub fn new(page: u32, page_size: u32) -> Self {
        let page = page.max(1);
        Self {
            page,
            page_size,
            offset: u64::from(page - 1) * u64::from(page_size),
        }
    }

    /// Serialize into fetch-function arguments.
    pub fn to_args(self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

/// One page of results as reported by the backend.
///
/// `total_count` and `has_more` are optional because not every backend
/// reports them; the paginator falls back accordingly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageResponse<T> {
    pub items: Vec<T>,
    #[serde(default)]
    pub total_count: Option<u64>,
    #[serde(default)]
    pub has_more: Option<bool>,
}

impl<T> PageResponse<T> {
    /// A page carrying only items.
    pub fn of(items: Vec<T>) -> Self {
        Self {
            items,
            total_count: None,
            has_more: None,
        }
    }

    /// Attach the backend-reported total row count.
    pub fn with_total(mut self, total: u64) -> Self {
        self.total_count = Some(total);
        self
    }

    /// Attach the backend's explicit has-more flag.
    pub fn with_has_more(mut self, has_more: bool) -> Self {
        self.has_more = Some(has_more);
        self
    }
}

/// Accumulated pagination state.
#[derive(Debug)]
pub struct PageState<T> {
    /// All items loaded so far, in page order.
    pub items: Vec<T>,
    /// Last page loaded (1-based).
    pub current_page: u32,
    /// Whether another page is believed to exist.
    pub has_more: bool,
    /// Backend-reported total, 0 until a response carries one.
    pub total_count: u64,
}

impl<T> Default for PageState<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            current_page: 1,
            has_more: true,
            total_count: 0,
        }
    }
}

impl<T: Clone> Clone for PageState<T> {
    fn clone(&self) -> Self {
        Self {
            items: self.items.clone(),
            current_page: self.current_page,
            has_more: self.has_more,
            total_count: self.total_count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_request_offsets() {
        assert_eq!(PageRequest::new(1, 20).offset, 0);
        assert_eq!(PageRequest::new(2, 20).offset, 20);
        assert_eq!(PageRequest::new(5, 25).offset, 100);
    }

    #[test]
    fn test_page_request_clamps_to_first_page() {
        let request = PageRequest::new(0, 20);
        assert_eq!(request.page, 1);
        assert_eq!(request.offset, 0);
    }

    #[test]
    fn test_page_request_args_are_deterministic() {
        let a = PageRequest::new(3, 10).to_args();
        let b = PageRequest::new(3, 10).to_args();
        assert_eq!(a.to_string(), b.to_string());
    }

    #[test]
    fn test_page_response_deserializes_without_optional_fields() {
        let response: PageResponse<u32> = serde_json::from_str(r#"{"items":[1,2,3]}"#).unwrap();
        assert_eq!(response.items, vec![1, 2, 3]);
        assert!(response.total_count.is_none());
        assert!(response.has_more.is_none());
    }

    #[test]
    fn test_page_state_default() {
        let state: PageState<u32> = PageState::default();
        assert!(state.items.is_empty());
        assert_eq!(state.current_page, 1);
        assert!(state.has_more);
        assert_eq!(state.total_count, 0);
    }
}
