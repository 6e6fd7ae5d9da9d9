//! Fetch operation orchestration.
//!
//! [`FetchOperation`] wraps an asynchronous fetch function with cache
//! lookup, in-flight cancellation, linear-backoff retry and lifecycle
//! callbacks. Each operation instance allows at most one authoritative
//! request at a time: a new `execute` cancels the previous token, and a
//! request whose token has been cancelled can no longer mutate state,
//! even if its future resolves later.
//!
//! Consumers observe the operation through [`snapshot`] or a `watch`
//! subscription; the state mirrors what a UI needs to render: data,
//! loading flag, terminal error, and the time of the last fetch.
//!
//! [`snapshot`]: FetchOperation::snapshot

use crate::cache::{GetOptions, SetOptions, Tier, TieredCache, Ttl};
use crate::fetch::error::FetchError;
use crate::fetch::options::FetchOptions;
use chrono::{DateTime, Utc};
use futures::future::BoxFuture;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, Mutex};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Tag attached to every cached fetch result, alongside the operation name.
pub const API_TAG: &str = "api";

/// Observable state of a fetch operation.
#[derive(Debug)]
pub struct FetchState<T> {
    /// Most recent successfully fetched (or cache-served) value.
    pub data: Option<T>,
    /// True from the start of a live fetch until the whole
    /// execute-plus-retries chain settles. Cache hits never set it.
    pub loading: bool,
    /// Terminal error of the last failed chain, cleared on each execute.
    pub error: Option<FetchError>,
    /// When data was last updated, from cache or network.
    pub last_fetch: Option<DateTime<Utc>>,
}

impl<T> Default for FetchState<T> {
    fn default() -> Self {
        Self {
            data: None,
            loading: false,
            error: None,
            last_fetch: None,
        }
    }
}

impl<T: Clone> Clone for FetchState<T> {
    fn clone(&self) -> Self {
        Self {
            data: self.data.clone(),
            loading: self.loading,
            error: self.error.clone(),
            last_fetch: self.last_fetch,
        }
    }
}

/// Shared fetch function: receives the call arguments and a cancellation
/// token to honor cooperatively.
pub type FetchFn<T> =
    Arc<dyn Fn(Value, CancellationToken) -> BoxFuture<'static, Result<T, FetchError>> + Send + Sync>;

/// Wraps one logical fetch operation with caching, cancellation and retry.
pub struct FetchOperation<T> {
    name: String,
    fetch: FetchFn<T>,
    options: FetchOptions<T>,
    cache: Arc<TieredCache>,
    state: watch::Sender<FetchState<T>>,
    current: Mutex<CancellationToken>,
    disposal: CancellationToken,
}

impl<T> FetchOperation<T>
where
    T: Clone + Serialize + DeserializeOwned + Send + Sync + 'static,
{
    /// Create an operation wrapping the given fetch function.
    ///
    /// `name` identifies the operation: it prefixes derived cache keys and
    /// becomes the invalidation tag for everything the operation caches.
    pub fn new<F>(
        name: impl Into<String>,
        cache: Arc<TieredCache>,
        fetch: F,
        options: FetchOptions<T>,
    ) -> Self
    where
        F: Fn(Value, CancellationToken) -> BoxFuture<'static, Result<T, FetchError>>
            + Send
            + Sync
            + 'static,
    {
        Self::from_shared(name, cache, Arc::new(fetch), options)
    }

    /// Create an operation from an already-shared fetch function.
    pub fn from_shared(
        name: impl Into<String>,
        cache: Arc<TieredCache>,
        fetch: FetchFn<T>,
        options: FetchOptions<T>,
    ) -> Self {
        let (state, _) = watch::channel(FetchState::default());
        let disposal = CancellationToken::new();
        let current = Mutex::new(disposal.child_token());

        Self {
            name: name.into(),
            fetch,
            options,
            cache,
            state,
            current,
            disposal,
        }
    }

    /// Operation name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current state snapshot.
    pub fn snapshot(&self) -> FetchState<T> {
        self.state.borrow().clone()
    }

    /// Subscribe to state changes.
    pub fn subscribe(&self) -> watch::Receiver<FetchState<T>> {
        self.state.subscribe()
    }

    /// Cache key for a given argument value: the explicit key when
    /// configured, otherwise operation name plus a hash of the serialized
    /// arguments.
    pub fn cache_key(&self, args: &Value) -> String {
        if let Some(key) = &self.options.cache_key {
            return key.clone();
        }

        let mut hasher = DefaultHasher::new();
        args.to_string().hash(&mut hasher);
        format!("{}:{:016x}", self.name, hasher.finish())
    }

    /// Run the operation.
    ///
    /// Supersedes any in-flight request for this instance, consults the
    /// cache, and otherwise fetches with retry. Returns
    /// `Err(FetchError::Cancelled)` without touching state when a newer
    /// `execute` takes over mid-flight.
    pub async fn execute(&self, args: Value) -> Result<T, FetchError> {
        let token = self.replace_token();

        if let Some(delay) = self.options.debounce {
            tokio::select! {
                biased;
                _ = token.cancelled() => return Err(FetchError::Cancelled),
                _ = tokio::time::sleep(delay) => {}
            }
        }

        let key = self.cache_key(&args);

        if self.options.cache {
            if let Some(cached) = self.cache.get(&key, GetOptions::default()).await {
                match serde_json::from_value::<T>(cached) {
                    Ok(data) => {
                        self.update_state(&token, |state| {
                            state.data = Some(data.clone());
                            state.error = None;
                            state.last_fetch = Some(Utc::now());
                        });
                        return Ok(data);
                    }
                    Err(e) => {
                        // Shape drift between releases: fail open to a
                        // live fetch rather than surface a cache error.
                        debug!(key = %key, error = %e, "cached value did not deserialize, refetching");
                    }
                }
            }
        }

        self.update_state(&token, |state| {
            state.loading = true;
            state.error = None;
        });

        let result = self.run_attempts(&key, &args, &token).await;

        // Loading clears only once the whole chain settles, not per attempt.
        self.update_state(&token, |state| state.loading = false);
        result
    }

    /// Invalidate the derived cache key for these arguments, then execute.
    ///
    /// Guarantees a live fetch for the caller.
    pub async fn refetch(&self, args: Value) -> Result<T, FetchError> {
        let key = self.cache_key(&args);
        self.cache.delete(&key, Tier::Memory).await;
        self.execute(args).await
    }

    /// Purge every cache entry carrying this operation's tag, without
    /// fetching. Returns the number of entries removed.
    pub async fn invalidate_cache(&self) -> usize {
        self.cache.invalidate_by_tags(&[self.name.as_str()]).await
    }

    /// Spawn a task that re-executes whenever the dependency value
    /// changes, and once at bind time when `immediate` is set.
    ///
    /// The task stops when the operation is dropped or the sender side of
    /// the channel goes away.
    pub fn bind_dependencies(self: &Arc<Self>, mut deps: watch::Receiver<Value>) {
        let operation = Arc::clone(self);
        let disposal = self.disposal.clone();

        tokio::spawn(async move {
            if operation.options.immediate {
                let args = deps.borrow_and_update().clone();
                let _ = operation.execute(args).await;
            }

            loop {
                tokio::select! {
                    biased;
                    _ = disposal.cancelled() => break,
                    changed = deps.changed() => {
                        if changed.is_err() {
                            break;
                        }
                        let args = deps.borrow_and_update().clone();
                        let _ = operation.execute(args).await;
                    }
                }
            }
        });
    }

    async fn run_attempts(
        &self,
        key: &str,
        args: &Value,
        token: &CancellationToken,
    ) -> Result<T, FetchError> {
        let max_retries = self.options.retries;
        let mut attempt: u32 = 0;

        loop {
            let outcome = tokio::select! {
                biased;
                _ = token.cancelled() => return Err(FetchError::Cancelled),
                outcome = (self.fetch)(args.clone(), token.clone()) => outcome,
            };

            // A newer execute owns the state now; this result is stale
            // regardless of whether it succeeded.
            if token.is_cancelled() {
                return Err(FetchError::Cancelled);
            }

            match outcome {
                Ok(data) => {
                    if self.options.cache {
                        self.store_result(key, &data).await;
                    }
                    self.update_state(token, |state| {
                        state.data = Some(data.clone());
                        state.error = None;
                        state.last_fetch = Some(Utc::now());
                    });
                    if let Some(callback) = &self.options.on_success {
                        callback(&data);
                    }
                    return Ok(data);
                }
                Err(error) if error.is_cancelled() => return Err(FetchError::Cancelled),
                Err(error) => {
                    if attempt < max_retries {
                        attempt += 1;
                        let delay = self.options.retry_delay * attempt;
                        debug!(
                            operation = %self.name,
                            attempt,
                            max_retries,
                            delay_ms = delay.as_millis() as u64,
                            error = %error,
                            "fetch failed, retrying"
                        );
                        tokio::select! {
                            biased;
                            _ = token.cancelled() => return Err(FetchError::Cancelled),
                            _ = tokio::time::sleep(delay) => {}
                        }
                        continue;
                    }

                    warn!(operation = %self.name, error = %error, "fetch failed, retries exhausted");
                    self.update_state(token, |state| state.error = Some(error.clone()));
                    if let Some(callback) = &self.options.on_error {
                        callback(&error);
                    }
                    return Err(error);
                }
            }
        }
    }

    async fn store_result(&self, key: &str, data: &T) {
        match serde_json::to_value(data) {
            Ok(value) => {
                let ttl = match self.options.cache_ttl {
                    Some(duration) => Ttl::After(duration),
                    None => Ttl::Default,
                };
                let options = SetOptions::default()
                    .with_ttl(ttl)
                    .with_tags([API_TAG.to_string(), self.name.clone()]);
                self.cache.set(key, value, options).await;
            }
            Err(e) => {
                debug!(operation = %self.name, error = %e, "result not serializable, skipping cache store");
            }
        }
    }

    /// Cancel the previous in-flight token and install a fresh one.
    fn replace_token(&self) -> CancellationToken {
        let mut current = self.current.lock().unwrap();
        current.cancel();
        *current = self.disposal.child_token();
        current.clone()
    }

    /// Mutate state only while the given token is still the current one.
    fn update_state<F>(&self, token: &CancellationToken, mutate: F)
    where
        F: FnOnce(&mut FetchState<T>),
    {
        if token.is_cancelled() {
            return;
        }
        self.state.send_modify(mutate);
    }
}

impl<T> Drop for FetchOperation<T> {
    fn drop(&mut self) {
        // Tear-down must stop in-flight work so nothing mutates state
        // after disposal.
        self.disposal.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CacheConfig;
    use serde_json::json;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;
    use tempfile::TempDir;

    fn test_cache() -> (Arc<TieredCache>, TempDir) {
        let temp = TempDir::new().unwrap();
        let config = CacheConfig::default().with_persist_dir(temp.path().to_path_buf());
        (Arc::new(TieredCache::new(config)), temp)
    }

    /// Fetch function that counts invocations and echoes `args["result"]`
    /// after `args["delay"]` milliseconds.
    fn echo_fetch(
        calls: Arc<AtomicU32>,
    ) -> impl Fn(Value, CancellationToken) -> BoxFuture<'static, Result<String, FetchError>> {
        move |args, _token| {
            calls.fetch_add(1, Ordering::SeqCst);
            Box::pin(async move {
                let delay = args["delay"].as_u64().unwrap_or(0);
                if delay > 0 {
                    tokio::time::sleep(Duration::from_millis(delay)).await;
                }
                Ok(args["result"].as_str().unwrap_or("").to_string())
            })
        }
    }

    fn failing_fetch(
        calls: Arc<AtomicU32>,
    ) -> impl Fn(Value, CancellationToken) -> BoxFuture<'static, Result<String, FetchError>> {
        move |_args, _token| {
            calls.fetch_add(1, Ordering::SeqCst);
            Box::pin(async move { Err(FetchError::backend("always fails")) })
        }
    }

    #[tokio::test]
    async fn test_execute_fetches_and_updates_state() {
        let (cache, _temp) = test_cache();
        let calls = Arc::new(AtomicU32::new(0));
        let operation = FetchOperation::new(
            "echo",
            cache,
            echo_fetch(Arc::clone(&calls)),
            FetchOptions::default(),
        );

        let result = operation.execute(json!({"result": "hello"})).await.unwrap();

        assert_eq!(result, "hello");
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        let state = operation.snapshot();
        assert_eq!(state.data.as_deref(), Some("hello"));
        assert!(!state.loading);
        assert!(state.error.is_none());
        assert!(state.last_fetch.is_some());
    }

    #[tokio::test]
    async fn test_cache_hit_skips_fetch() {
        let (cache, _temp) = test_cache();
        let calls = Arc::new(AtomicU32::new(0));
        let operation = FetchOperation::new(
            "echo",
            cache,
            echo_fetch(Arc::clone(&calls)),
            FetchOptions::default(),
        );

        let args = json!({"result": "cached"});
        operation.execute(args.clone()).await.unwrap();
        let again = operation.execute(args).await.unwrap();

        assert_eq!(again, "cached");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(!operation.snapshot().loading);
    }

    #[tokio::test]
    async fn test_distinct_args_get_distinct_cache_keys() {
        let (cache, _temp) = test_cache();
        let calls = Arc::new(AtomicU32::new(0));
        let operation = FetchOperation::new(
            "echo",
            cache,
            echo_fetch(Arc::clone(&calls)),
            FetchOptions::default(),
        );

        operation.execute(json!({"result": "a"})).await.unwrap();
        operation.execute(json!({"result": "b"})).await.unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_cache_disabled_always_fetches() {
        let (cache, _temp) = test_cache();
        let calls = Arc::new(AtomicU32::new(0));
        let operation = FetchOperation::new(
            "echo",
            cache,
            echo_fetch(Arc::clone(&calls)),
            FetchOptions::default().without_cache(),
        );

        let args = json!({"result": "x"});
        operation.execute(args.clone()).await.unwrap();
        operation.execute(args).await.unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_newer_execute_supersedes_older() {
        let (cache, _temp) = test_cache();
        let calls = Arc::new(AtomicU32::new(0));
        let operation = Arc::new(FetchOperation::new(
            "echo",
            cache,
            echo_fetch(Arc::clone(&calls)),
            FetchOptions::default().without_cache(),
        ));

        // Slow first request, fast second one.
        let slow = {
            let operation = Arc::clone(&operation);
            tokio::spawn(async move {
                operation
                    .execute(json!({"result": "first", "delay": 150}))
                    .await
            })
        };
        tokio::time::sleep(Duration::from_millis(30)).await;

        let fast = operation.execute(json!({"result": "second"})).await.unwrap();
        assert_eq!(fast, "second");

        // The superseded call reports cancellation, and even after its
        // sleep would have elapsed, state still shows the second result.
        let stale = slow.await.unwrap();
        assert_eq!(stale, Err(FetchError::Cancelled));

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(operation.snapshot().data.as_deref(), Some("second"));
        assert!(operation.snapshot().error.is_none());
    }

    #[tokio::test]
    async fn test_retry_exhaustion_invokes_fetch_exactly_n_plus_one_times() {
        let (cache, _temp) = test_cache();
        let calls = Arc::new(AtomicU32::new(0));
        let operation = FetchOperation::new(
            "failing",
            cache,
            failing_fetch(Arc::clone(&calls)),
            FetchOptions::default()
                .with_retries(2)
                .with_retry_delay(Duration::from_millis(5)),
        );

        let result = operation.execute(Value::Null).await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 3); // 1 initial + 2 retries

        let state = operation.snapshot();
        assert!(state.error.is_some());
        assert!(!state.loading);
        assert!(state.data.is_none());
    }

    #[tokio::test]
    async fn test_no_retries_surfaces_error_immediately() {
        let (cache, _temp) = test_cache();
        let calls = Arc::new(AtomicU32::new(0));
        let operation = FetchOperation::new(
            "failing",
            cache,
            failing_fetch(Arc::clone(&calls)),
            FetchOptions::default().with_retries(0),
        );

        let result = operation.execute(Value::Null).await;

        assert_eq!(result, Err(FetchError::backend("always fails")));
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        let state = operation.snapshot();
        assert!(!state.loading);
        assert!(state.data.is_none());
        assert_eq!(state.error, Some(FetchError::backend("always fails")));
    }

    #[tokio::test]
    async fn test_success_after_transient_failures() {
        let (cache, _temp) = test_cache();
        let calls = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&calls);
        let operation = FetchOperation::new(
            "flaky",
            cache,
            move |_args, _token| {
                let attempt = counter.fetch_add(1, Ordering::SeqCst);
                Box::pin(async move {
                    if attempt < 2 {
                        Err(FetchError::backend("transient"))
                    } else {
                        Ok("recovered".to_string())
                    }
                }) as BoxFuture<'static, Result<String, FetchError>>
            },
            FetchOptions::default()
                .with_retries(3)
                .with_retry_delay(Duration::from_millis(5)),
        );

        let result = operation.execute(Value::Null).await.unwrap();

        assert_eq!(result, "recovered");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        // Transient failures never reached the error state.
        assert!(operation.snapshot().error.is_none());
    }

    #[tokio::test]
    async fn test_callbacks() {
        let (cache, _temp) = test_cache();
        let successes = Arc::new(AtomicU32::new(0));
        let errors = Arc::new(AtomicU32::new(0));

        let success_count = Arc::clone(&successes);
        let error_count = Arc::clone(&errors);
        let calls = Arc::new(AtomicU32::new(0));
        let operation = FetchOperation::new(
            "echo",
            cache,
            echo_fetch(calls),
            FetchOptions::default()
                .on_success(move |_: &String| {
                    success_count.fetch_add(1, Ordering::SeqCst);
                })
                .on_error(move |_| {
                    error_count.fetch_add(1, Ordering::SeqCst);
                }),
        );

        operation.execute(json!({"result": "ok"})).await.unwrap();
        assert_eq!(successes.load(Ordering::SeqCst), 1);
        assert_eq!(errors.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_on_error_fires_only_on_terminal_failure() {
        let (cache, _temp) = test_cache();
        let errors = Arc::new(AtomicU32::new(0));
        let error_count = Arc::clone(&errors);
        let calls = Arc::new(AtomicU32::new(0));
        let operation = FetchOperation::new(
            "failing",
            cache,
            failing_fetch(calls),
            FetchOptions::default()
                .with_retries(2)
                .with_retry_delay(Duration::from_millis(5))
                .on_error(move |_| {
                    error_count.fetch_add(1, Ordering::SeqCst);
                }),
        );

        let _ = operation.execute(Value::Null).await;

        // Two transient failures, one terminal: a single callback.
        assert_eq!(errors.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_refetch_bypasses_cache() {
        let (cache, _temp) = test_cache();
        let calls = Arc::new(AtomicU32::new(0));
        let operation = FetchOperation::new(
            "echo",
            cache,
            echo_fetch(Arc::clone(&calls)),
            FetchOptions::default(),
        );

        let args = json!({"result": "v"});
        operation.execute(args.clone()).await.unwrap();
        operation.refetch(args).await.unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_invalidate_cache_purges_operation_tag() {
        let (cache, _temp) = test_cache();
        let calls = Arc::new(AtomicU32::new(0));
        let operation = FetchOperation::new(
            "echo",
            Arc::clone(&cache),
            echo_fetch(Arc::clone(&calls)),
            FetchOptions::default(),
        );

        let args = json!({"result": "v"});
        operation.execute(args.clone()).await.unwrap();

        let removed = operation.invalidate_cache().await;
        assert_eq!(removed, 1);

        // Next execute goes back to the network.
        operation.execute(args).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_debounce_coalesces_rapid_calls() {
        let (cache, _temp) = test_cache();
        let calls = Arc::new(AtomicU32::new(0));
        let operation = Arc::new(FetchOperation::new(
            "echo",
            cache,
            echo_fetch(Arc::clone(&calls)),
            FetchOptions::default()
                .without_cache()
                .with_debounce(Duration::from_millis(40)),
        ));

        let first = {
            let operation = Arc::clone(&operation);
            tokio::spawn(async move { operation.execute(json!({"result": "a"})).await })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;

        let second = operation.execute(json!({"result": "b"})).await.unwrap();

        assert_eq!(second, "b");
        assert_eq!(first.await.unwrap(), Err(FetchError::Cancelled));
        // The superseded call never reached the fetch function.
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_explicit_cache_key() {
        let (cache, _temp) = test_cache();
        let calls = Arc::new(AtomicU32::new(0));
        let operation = FetchOperation::new(
            "echo",
            Arc::clone(&cache),
            echo_fetch(Arc::clone(&calls)),
            FetchOptions::default().with_cache_key("fixed"),
        );

        // Different args, same explicit key: second call is a hit.
        operation.execute(json!({"result": "a"})).await.unwrap();
        let second = operation.execute(json!({"result": "b"})).await.unwrap();

        assert_eq!(second, "a");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_derived_cache_key_is_stable() {
        let (cache, _temp) = test_cache();
        let operation: FetchOperation<String> = FetchOperation::new(
            "echo",
            cache,
            |_args, _token| Box::pin(async { Ok(String::new()) }),
            FetchOptions::default(),
        );

        let args = json!({"page": 1, "page_size": 20});
        assert_eq!(operation.cache_key(&args), operation.cache_key(&args));
        assert_ne!(
            operation.cache_key(&args),
            operation.cache_key(&json!({"page": 2, "page_size": 20}))
        );
    }

    #[tokio::test]
    async fn test_bind_dependencies_executes_on_change() {
        let (cache, _temp) = test_cache();
        let calls = Arc::new(AtomicU32::new(0));
        let operation = Arc::new(FetchOperation::new(
            "echo",
            cache,
            echo_fetch(Arc::clone(&calls)),
            FetchOptions::default().without_cache().immediate(),
        ));

        let (tx, rx) = watch::channel(json!({"result": "initial"}));
        operation.bind_dependencies(rx);
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        tx.send(json!({"result": "changed"})).unwrap();
        tokio::time::sleep(Duration::from_millis(30)).await;

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(operation.snapshot().data.as_deref(), Some("changed"));
    }

    #[tokio::test]
    async fn test_cached_value_of_wrong_shape_falls_back_to_fetch() {
        let (cache, _temp) = test_cache();
        let calls = Arc::new(AtomicU32::new(0));
        let operation: FetchOperation<u32> = FetchOperation::new(
            "typed",
            Arc::clone(&cache),
            {
                let calls = Arc::clone(&calls);
                move |_args, _token| {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Box::pin(async { Ok(42u32) })
                }
            },
            FetchOptions::default(),
        );

        // Poison the derived key with a value that is not a u32.
        let key = operation.cache_key(&Value::Null);
        cache
            .set(&key, json!("not a number"), SetOptions::default())
            .await;

        let value = operation.execute(Value::Null).await.unwrap();
        assert_eq!(value, 42);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
