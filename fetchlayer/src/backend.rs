//! External backend collaborator seam.
//!
//! The cache/fetch core treats the remote managed database as an opaque
//! collaborator behind this trait: rows in, rows out, plus auth-state
//! change notification. The core neither defines nor versions the wire
//! protocol - adapters implement [`Backend`] over whatever client their
//! application uses.
//!
//! [`MockBackend`] is an in-memory implementation for tests and demos,
//! with scriptable failures and call counting.

use futures::future::BoxFuture;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::Mutex;
use thiserror::Error;
use tokio::sync::watch;

/// Failure reported by the backend collaborator.
#[derive(Debug, Error)]
pub enum BackendError {
    /// A read query failed.
    #[error("query failed: {0}")]
    Query(String),

    /// A mutation (insert/update/delete) failed.
    #[error("mutation failed: {0}")]
    Mutation(String),

    /// The backend could not be reached.
    #[error("backend unavailable: {0}")]
    Unavailable(String),
}

/// Authentication state reported by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthState {
    SignedOut,
    SignedIn,
}

/// Opaque remote-backend collaborator.
///
/// Object-safe: methods return boxed futures so the core can hold an
/// `Arc<dyn Backend>` injected at construction.
pub trait Backend: Send + Sync {
    /// Fetch rows from `table` matching `filters` (an object of
    /// field/value equality constraints; `null` matches everything).
    fn query(&self, table: &str, filters: Value) -> BoxFuture<'_, Result<Value, BackendError>>;

    /// Insert a row, returning the stored payload.
    fn insert(&self, table: &str, payload: Value) -> BoxFuture<'_, Result<Value, BackendError>>;

    /// Update the row whose `id` matches the payload's, returning the
    /// stored payload.
    fn update(&self, table: &str, payload: Value) -> BoxFuture<'_, Result<Value, BackendError>>;

    /// Delete rows matching `filters`, returning the number removed.
    fn delete(&self, table: &str, filters: Value) -> BoxFuture<'_, Result<Value, BackendError>>;

    /// Subscribe to authentication-state changes.
    fn auth_state(&self) -> watch::Receiver<AuthState>;
}

/// In-memory backend for tests and demos.
pub struct MockBackend {
    tables: Mutex<HashMap<String, Vec<Value>>>,
    fail_remaining: AtomicU32,
    calls: AtomicU64,
    auth: watch::Sender<AuthState>,
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MockBackend {
    /// Create an empty backend, signed out.
    pub fn new() -> Self {
        let (auth, _) = watch::channel(AuthState::SignedOut);
        Self {
            tables: Mutex::new(HashMap::new()),
            fail_remaining: AtomicU32::new(0),
            calls: AtomicU64::new(0),
            auth,
        }
    }

    /// Seed a table with rows.
    pub fn with_table(self, name: impl Into<String>, rows: Vec<Value>) -> Self {
        self.tables.lock().unwrap().insert(name.into(), rows);
        self
    }

    /// Make the next `n` operations fail with `Unavailable`.
    pub fn fail_times(&self, n: u32) {
        self.fail_remaining.store(n, Ordering::SeqCst);
    }

    /// Total operations attempted, including scripted failures.
    pub fn call_count(&self) -> u64 {
        self.calls.load(Ordering::SeqCst)
    }

    /// Change the reported auth state.
    pub fn set_auth(&self, state: AuthState) {
        self.auth.send_replace(state);
    }

    fn check_available(&self) -> Result<(), BackendError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let remaining = self.fail_remaining.load(Ordering::SeqCst);
        if remaining > 0 {
            self.fail_remaining.store(remaining - 1, Ordering::SeqCst);
            return Err(BackendError::Unavailable("scripted failure".into()));
        }
        Ok(())
    }
}

fn row_matches(row: &Value, filters: &Value) -> bool {
    match filters.as_object() {
        Some(filters) => filters.iter().all(|(field, expected)| {
            row.get(field).map(|actual| actual == expected).unwrap_or(false)
        }),
        None => true,
    }
}

impl Backend for MockBackend {
    fn query(&self, table: &str, filters: Value) -> BoxFuture<'_, Result<Value, BackendError>> {
        let table = table.to_string();
        Box::pin(async move {
            self.check_available()?;
            let tables = self.tables.lock().unwrap();
            let rows = tables
                .get(&table)
                .ok_or_else(|| BackendError::Query(format!("no such table: {table}")))?;

            let matched: Vec<Value> = rows
                .iter()
                .filter(|row| row_matches(row, &filters))
                .cloned()
                .collect();
            Ok(Value::Array(matched))
        })
    }

    fn insert(&self, table: &str, payload: Value) -> BoxFuture<'_, Result<Value, BackendError>> {
        let table = table.to_string();
        Box::pin(async move {
            self.check_available()?;
            let mut tables = self.tables.lock().unwrap();
            tables.entry(table).or_default().push(payload.clone());
            Ok(payload)
        })
    }

    fn update(&self, table: &str, payload: Value) -> BoxFuture<'_, Result<Value, BackendError>> {
        let table = table.to_string();
        Box::pin(async move {
            self.check_available()?;
            let id = payload
                .get("id")
                .cloned()
                .ok_or_else(|| BackendError::Mutation("update payload missing id".into()))?;

            let mut tables = self.tables.lock().unwrap();
            let rows = tables
                .get_mut(&table)
                .ok_or_else(|| BackendError::Mutation(format!("no such table: {table}")))?;

            let row = rows
                .iter_mut()
                .find(|row| row.get("id") == Some(&id))
                .ok_or_else(|| BackendError::Mutation(format!("no row with id {id}")))?;
            *row = payload.clone();
            Ok(payload)
        })
    }

    fn delete(&self, table: &str, filters: Value) -> BoxFuture<'_, Result<Value, BackendError>> {
        let table = table.to_string();
        Box::pin(async move {
            self.check_available()?;
            let mut tables = self.tables.lock().unwrap();
            let rows = tables
                .get_mut(&table)
                .ok_or_else(|| BackendError::Mutation(format!("no such table: {table}")))?;

            let before = rows.len();
            rows.retain(|row| !row_matches(row, &filters));
            Ok(Value::from((before - rows.len()) as u64))
        })
    }

    fn auth_state(&self) -> watch::Receiver<AuthState> {
        self.auth.subscribe()
    }
}
