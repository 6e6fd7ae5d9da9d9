//! Paginated fetching with speculative prefetch.

mod paginator;
mod types;

pub use paginator::{Paginator, PaginatorOptions, DEFAULT_PAGE_SIZE, DEFAULT_PREFETCH_DELAY};
pub use types::{PageRequest, PageResponse, PageState};
