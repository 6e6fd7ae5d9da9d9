//! Background expiry sweep daemon.
//!
//! The sweeper periodically removes expired entries from all tiers so that
//! memory is reclaimed even for keys nobody reads again. It is independent
//! of the lazy per-get expiry check; both use the same predicate, so
//! whichever path reaches an expired key first removes it.
//!
//! # Example
//!
//! ```ignore
//! use fetchlayer::cache::{SweeperDaemon, TieredCache};
//!
//! let daemon = SweeperDaemon::new(Arc::clone(&cache));
//! tokio::spawn(daemon.run(shutdown_token));
//! ```

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::cache::store::TieredCache;

/// Outcome of one sweep pass.
#[derive(Debug, Default, Clone, Copy)]
pub struct SweepOutcome {
    /// Entries examined.
    pub examined: u64,
    /// Entries removed as expired.
    pub expired: u64,
}

/// Background daemon that periodically sweeps expired cache entries.
pub struct SweeperDaemon {
    cache: Arc<TieredCache>,
    interval: Duration,
}

impl SweeperDaemon {
    /// Create a sweeper over the given store.
    ///
    /// The interval comes from the store's configuration.
    pub fn new(cache: Arc<TieredCache>) -> Self {
        let interval = cache.config().sweep_interval;
        Self { cache, interval }
    }

    /// Override the sweep interval.
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Current sweep interval.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Run the sweeper until shutdown is signalled.
    pub async fn run(self, shutdown: CancellationToken) {
        info!(
            interval_secs = self.interval.as_secs(),
            "cache sweeper starting"
        );

        let mut interval = tokio::time::interval(self.interval);
        // Skip the immediate first tick.
        interval.tick().await;

        loop {
            tokio::select! {
                biased;

                _ = shutdown.cancelled() => {
                    info!("cache sweeper shutting down");
                    break;
                }

                _ = interval.tick() => {
                    let outcome = self.cache.sweep().await;
                    if outcome.expired > 0 {
                        debug!(
                            examined = outcome.examined,
                            expired = outcome.expired,
                            "sweep removed expired entries"
                        );
                    }
                }
            }
        }
    }
}
