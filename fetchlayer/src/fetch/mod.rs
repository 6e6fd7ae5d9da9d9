//! Fetch orchestration: cache-aware, cancellable, retrying operations.

mod error;
mod operation;
mod options;

pub use error::FetchError;
pub use operation::{FetchFn, FetchOperation, FetchState, API_TAG};
pub use options::{
    ErrorCallback, FetchOptions, SuccessCallback, DEFAULT_RETRIES, DEFAULT_RETRY_DELAY,
};
