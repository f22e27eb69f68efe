//! Shared pipeline state: the atomically published reading and the dashboard
//! counters.

use std::sync::Arc;
use std::time::Instant;

use arc_swap::ArcSwap;
use tokio::sync::watch;

use crate::types::{LinkState, Reading};

// ============================================================================
// Reading Store
// ============================================================================

/// Holds the latest published [`Reading`].
///
/// Writers publish a complete new value; readers either take a lock-free
/// snapshot (`get()`) or subscribe to the push channel (`subscribe()`).
/// Because the whole reading swaps at once, a reader can never observe a mix
/// of old and new fields.
pub struct ReadingStore {
    current: ArcSwap<Reading>,
    notify: watch::Sender<Reading>,
}

impl ReadingStore {
    pub fn new() -> Self {
        let (notify, _) = watch::channel(Reading::ZERO);
        Self {
            current: ArcSwap::from_pointee(Reading::ZERO),
            notify,
        }
    }

    /// Atomically replace the current reading and notify push subscribers.
    pub fn publish(&self, reading: Reading) {
        self.current.store(Arc::new(reading));
        self.notify.send_replace(reading);
    }

    /// Snapshot of the most recently published reading.
    ///
    /// Safe to call concurrently with `publish()`; repeated calls without an
    /// intervening publish return the identical value.
    pub fn get(&self) -> Reading {
        **self.current.load()
    }

    /// Push hook for transports that prefer notification over polling.
    pub fn subscribe(&self) -> watch::Receiver<Reading> {
        self.notify.subscribe()
    }
}

impl Default for ReadingStore {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Application State
// ============================================================================

/// Dashboard-facing counters and status, updated by the processing loop.
///
/// Wrapped in `Arc<RwLock<>>` for access from API handlers. The hot-path
/// reading itself lives in [`ReadingStore`], not here.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Current sensor link state
    pub link: LinkState,

    /// Process start (for uptime)
    pub started_at: Instant,

    /// Valid samples processed since startup
    pub samples_processed: u64,

    /// Samples discarded as absent/invalid (non-positive period)
    pub samples_discarded: u64,

    /// Torque/power candidates rejected by the outlier filter
    pub outliers_rejected: u64,

    /// Live→Stalled transitions observed
    pub stalls: u64,

    /// Wall-clock time of the last valid sample
    pub last_sample_at: Option<chrono::DateTime<chrono::Utc>>,

    /// Human-readable name of the active sample source
    pub source_name: String,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            link: LinkState::Stalled,
            started_at: Instant::now(),
            samples_processed: 0,
            samples_discarded: 0,
            outliers_rejected: 0,
            stalls: 0,
            last_sample_at: None,
            source_name: String::new(),
        }
    }
}

impl AppState {
    /// Get uptime in seconds
    pub fn uptime_secs(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_starts_at_zero() {
        let store = ReadingStore::new();
        assert_eq!(store.get(), Reading::ZERO);
    }

    #[test]
    fn test_publish_and_get_snapshot() {
        let store = ReadingStore::new();
        let r = Reading {
            rpm: 3000.0,
            speed_kmh: 34.0,
            torque_nm: 0.4,
            power_w: 125.0,
        };
        store.publish(r);
        assert_eq!(store.get(), r);
        // Idempotent reads without a new publish.
        assert_eq!(store.get(), store.get());
    }

    #[tokio::test]
    async fn test_subscribe_sees_publish() {
        let store = ReadingStore::new();
        let mut rx = store.subscribe();
        let r = Reading {
            rpm: 100.0,
            speed_kmh: 1.1,
            torque_nm: 0.0,
            power_w: 0.0,
        };
        store.publish(r);
        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow_and_update(), r);
    }

    #[test]
    fn test_publish_without_subscribers_is_fine() {
        let store = ReadingStore::new();
        store.publish(Reading::ZERO);
        store.publish(Reading {
            rpm: 1.0,
            speed_kmh: 0.0,
            torque_nm: 0.0,
            power_w: 0.0,
        });
        assert_eq!(store.get().rpm, 1.0);
    }

    #[test]
    fn test_app_state_default() {
        let state = AppState::default();
        assert_eq!(state.link, LinkState::Stalled);
        assert_eq!(state.samples_processed, 0);
        assert!(state.last_sample_at.is_none());
    }
}
