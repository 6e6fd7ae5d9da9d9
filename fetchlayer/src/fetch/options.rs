//! Configuration for fetch operations.

use crate::fetch::error::FetchError;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Called with the result after a successful fetch.
pub type SuccessCallback<T> = Arc<dyn Fn(&T) + Send + Sync>;

/// Called with the terminal error after retries are exhausted.
pub type ErrorCallback = Arc<dyn Fn(&FetchError) + Send + Sync>;

/// Retry attempts after the initial failure.
pub const DEFAULT_RETRIES: u32 = 2;

/// Base retry delay; the actual delay is this times the attempt number.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(500);

/// Options recognized by [`FetchOperation`](crate::fetch::FetchOperation).
///
/// Defaults: caching on with the store's default TTL, an auto-derived
/// cache key, no debounce, two retries with 500 ms linear backoff, no
/// callbacks, no immediate execution.
pub struct FetchOptions<T> {
    /// Execute once as soon as dependencies are bound.
    pub immediate: bool,
    /// Consult and populate the tiered cache.
    pub cache: bool,
    /// Explicit cache key; derived from operation name + args when absent.
    pub cache_key: Option<String>,
    /// TTL for cached results; store default when absent.
    pub cache_ttl: Option<Duration>,
    /// Delay each `execute`, superseded calls cancelling the wait.
    pub debounce: Option<Duration>,
    /// Retry attempts after the initial failure.
    pub retries: u32,
    /// Base delay between attempts (multiplied by the attempt number).
    pub retry_delay: Duration,
    /// Invoked on success with the fetched value.
    pub on_success: Option<SuccessCallback<T>>,
    /// Invoked with the terminal error once retries are exhausted.
    pub on_error: Option<ErrorCallback>,
}

impl<T> Default for FetchOptions<T> {
    fn default() -> Self {
        Self {
            immediate: false,
            cache: true,
            cache_key: None,
            cache_ttl: None,
            debounce: None,
            retries: DEFAULT_RETRIES,
            retry_delay: DEFAULT_RETRY_DELAY,
            on_success: None,
            on_error: None,
        }
    }
}

impl<T> Clone for FetchOptions<T> {
    fn clone(&self) -> Self {
        Self {
            immediate: self.immediate,
            cache: self.cache,
            cache_key: self.cache_key.clone(),
            cache_ttl: self.cache_ttl,
            debounce: self.debounce,
            retries: self.retries,
            retry_delay: self.retry_delay,
            on_success: self.on_success.clone(),
            on_error: self.on_error.clone(),
        }
    }
}

impl<T> fmt::Debug for FetchOptions<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FetchOptions")
            .field("immediate", &self.immediate)
            .field("cache", &self.cache)
            .field("cache_key", &self.cache_key)
            .field("cache_ttl", &self.cache_ttl)
            .field("debounce", &self.debounce)
            .field("retries", &self.retries)
            .field("retry_delay", &self.retry_delay)
            .field("on_success", &self.on_success.is_some())
            .field("on_error", &self.on_error.is_some())
            .finish()
    }
}

impl<T> FetchOptions<T> {
    /// Execute once as soon as dependencies are bound.
    pub fn immediate(mut self) -> Self {
        self.immediate = true;
        self
    }

    /// Bypass the cache entirely.
    pub fn without_cache(mut self) -> Self {
        self.cache = false;
        self
    }

    /// Use an explicit cache key instead of the derived one.
    pub fn with_cache_key(mut self, key: impl Into<String>) -> Self {
        self.cache_key = Some(key.into());
        self
    }

    /// TTL for cached results.
    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = Some(ttl);
        self
    }

    /// Debounce `execute` calls by this much.
    pub fn with_debounce(mut self, delay: Duration) -> Self {
        self.debounce = Some(delay);
        self
    }

    /// Retry attempts after the initial failure.
    pub fn with_retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }

    /// Base delay between retry attempts.
    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    /// Invoke the callback with each successfully fetched value.
    pub fn on_success(mut self, callback: impl Fn(&T) + Send + Sync + 'static) -> Self {
        self.on_success = Some(Arc::new(callback));
        self
    }

    /// Invoke the callback with the terminal error.
    pub fn on_error(mut self, callback: impl Fn(&FetchError) + Send + Sync + 'static) -> Self {
        self.on_error = Some(Arc::new(callback));
        self
    }
}
