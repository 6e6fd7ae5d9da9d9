//! Page accumulation and speculative prefetch.
//!
//! [`Paginator`] drives a [`FetchOperation`] page by page, accumulating
//! items and deciding whether more pages exist. After each successful
//! load it optionally warms the cache with the *next* page in the
//! background: the prefetch bypasses the operation's visible state, writes
//! only to the cache, and swallows every failure, so from the caller's
//! perspective it has no side effects beyond a warmer cache.

use crate::cache::{GetOptions, SetOptions, TieredCache, Ttl};
use crate::fetch::{FetchError, FetchFn, FetchOperation, FetchOptions, API_TAG};
use crate::page::types::{PageRequest, PageResponse, PageState};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Default page size.
pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// Default delay before a speculative prefetch fires.
pub const DEFAULT_PREFETCH_DELAY: Duration = Duration::from_millis(100);

/// Options recognized by [`Paginator`].
#[derive(Debug, Clone)]
pub struct PaginatorOptions {
    /// Items requested per page.
    pub page_size: u32,
    /// Whether to speculatively warm the cache with the next page.
    pub prefetch: bool,
    /// Delay before the speculative prefetch fires.
    pub prefetch_delay: Duration,
}

impl Default for PaginatorOptions {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            prefetch: true,
            prefetch_delay: DEFAULT_PREFETCH_DELAY,
        }
    }
}

impl PaginatorOptions {
    /// Set the page size.
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    /// Disable speculative prefetch.
    pub fn without_prefetch(mut self) -> Self {
        self.prefetch = false;
        self
    }

    /// Set the prefetch delay.
    pub fn with_prefetch_delay(mut self, delay: Duration) -> Self {
        self.prefetch_delay = delay;
        self
    }
}

/// Accumulating, prefetching wrapper over a paged fetch operation.
pub struct Paginator<T> {
    operation: Arc<FetchOperation<PageResponse<T>>>,
    fetch: FetchFn<PageResponse<T>>,
    cache: Arc<TieredCache>,
    page_size: u32,
    prefetch: bool,
    prefetch_delay: Duration,
    cache_ttl: Option<Duration>,
    state: Mutex<PageState<T>>,
    disposal: CancellationToken,
}

impl<T> Paginator<T>
where
    T: Clone + Serialize + DeserializeOwned + Send + Sync + 'static,
{
    /// Create a paginator over the given fetch function.
    ///
    /// `fetch_options` configures the inner operation (cache, retries,
    /// callbacks); `options` configures pagination itself.
    pub fn new<F>(
        name: impl Into<String>,
        cache: Arc<TieredCache>,
        fetch: F,
        fetch_options: FetchOptions<PageResponse<T>>,
        options: PaginatorOptions,
    ) -> Self
    where
        F: Fn(
                serde_json::Value,
                CancellationToken,
            ) -> futures::future::BoxFuture<'static, Result<PageResponse<T>, FetchError>>
            + Send
            + Sync
            + 'static,
    {
        let fetch: FetchFn<PageResponse<T>> = Arc::new(fetch);
        let cache_ttl = fetch_options.cache_ttl;
        let operation = Arc::new(FetchOperation::from_shared(
            name,
            Arc::clone(&cache),
            Arc::clone(&fetch),
            fetch_options,
        ));

        Self {
            operation,
            fetch,
            cache,
            page_size: options.page_size,
            prefetch: options.prefetch,
            prefetch_delay: options.prefetch_delay,
            cache_ttl,
            state: Mutex::new(PageState::default()),
            disposal: CancellationToken::new(),
        }
    }

    /// The inner fetch operation, for observing loading/error state.
    pub fn operation(&self) -> &Arc<FetchOperation<PageResponse<T>>> {
        &self.operation
    }

    /// Snapshot of the accumulated pagination state.
    pub fn state(&self) -> PageState<T> {
        self.state.lock().unwrap().clone()
    }

    /// Whether a page load is currently in flight.
    pub fn loading(&self) -> bool {
        self.operation.snapshot().loading
    }

    /// Load one page.
    ///
    /// Page 1 replaces the accumulated items; later pages append. On
    /// success, `total_count` and `has_more` are updated from the
    /// response and a speculative prefetch of the next page may fire.
    pub async fn load_page(&self, page: u32) -> Result<(), FetchError> {
        let request = PageRequest::new(page, self.page_size);
        let response = self.operation.execute(request.to_args()).await?;

        let has_more = resolve_has_more(&response, request.page, self.page_size);
        {
            let mut state = self.state.lock().unwrap();
            if request.page == 1 {
                state.items = response.items.clone();
            } else {
                state.items.extend(response.items.iter().cloned());
            }
            state.current_page = request.page;
            if let Some(total) = response.total_count {
                state.total_count = total;
            }
            state.has_more = has_more;
        }

        if self.prefetch && has_more {
            self.spawn_prefetch(request.page + 1);
        }
        Ok(())
    }

    /// Load the next page, if one is believed to exist.
    ///
    /// No-op returning `Ok(false)` while a load is in flight or when
    /// `has_more` is false.
    pub async fn load_more(&self) -> Result<bool, FetchError> {
        if self.loading() {
            return Ok(false);
        }
        let next = {
            let state = self.state.lock().unwrap();
            if !state.has_more {
                return Ok(false);
            }
            state.current_page + 1
        };

        self.load_page(next).await?;
        Ok(true)
    }

    /// Discard accumulated items and reload from page 1.
    pub async fn reset(&self) -> Result<(), FetchError> {
        {
            let mut state = self.state.lock().unwrap();
            *state = PageState::default();
        }
        self.load_page(1).await
    }

    /// Fire-and-forget cache warming for `page`.
    ///
    /// Runs after a short delay, only if the page is not already cached.
    /// Writes exclusively to the cache and never to the visible state;
    /// errors are swallowed.
    fn spawn_prefetch(&self, page: u32) {
        let request = PageRequest::new(page, self.page_size);
        let args = request.to_args();
        let key = self.operation.cache_key(&args);

        let cache = Arc::clone(&self.cache);
        let fetch = Arc::clone(&self.fetch);
        let token = self.disposal.child_token();
        let delay = self.prefetch_delay;
        let ttl = match self.cache_ttl {
            Some(duration) => Ttl::After(duration),
            None => Ttl::Default,
        };
        let tags = [API_TAG.to_string(), self.operation.name().to_string()];

        tokio::spawn(async move {
            tokio::select! {
                biased;
                _ = token.cancelled() => return,
                _ = tokio::time::sleep(delay) => {}
            }

            // Peek without refreshing recency: warming must not perturb
            // LRU ranking of entries the user actually read.
            let lookup = GetOptions::default().skip_touch();
            if cache.get(&key, lookup).await.is_some() {
                return;
            }

            match fetch(args, token).await {
                Ok(response) => {
                    if let Ok(value) = serde_json::to_value(&response) {
                        let options = SetOptions::default().with_ttl(ttl).with_tags(tags);
                        cache.set(&key, value, options).await;
                        debug!(page, "prefetched next page into cache");
                    }
                }
                Err(error) => {
                    debug!(page, error = %error, "prefetch failed");
                }
            }
        });
    }
}

impl<T> Drop for Paginator<T> {
    fn drop(&mut self) {
        self.disposal.cancel();
    }
}

/// Decide whether more pages exist.
///
/// The backend's explicit flag wins; a reported total count is next; the
/// page-full heuristic is strictly a fallback. The heuristic misreports a
/// final page that is exactly full, which the following `load_more`
/// corrects by returning an empty page.
fn resolve_has_more<T>(response: &PageResponse<T>, page: u32, page_size: u32) -> bool {
    if let Some(flag) = response.has_more {
        return flag;
    }
    if let Some(total) = response.total_count {
        return u64::from(page) * u64::from(page_size) < total;
    }
    response.items.len() as u64 == u64::from(page_size)
}
