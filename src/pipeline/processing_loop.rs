//! Unified sample processing loop shared across all input modes.
//!
//! One loop body serves stdin, replay, and synthetic ingestion: `select!`
//! over shutdown, the stall watchdog tick, and the next source event. The
//! watchdog leg runs on a fixed interval regardless of sample arrival — the
//! absence of samples is itself the signal it watches for.

use std::sync::Arc;
use std::time::Instant;

use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::config::defaults::WATCHDOG_TICK_MS;
use crate::types::RawSample;

use super::source::{SampleEvent, SampleSource};
use super::{AppState, PipelineController};

/// Final counters returned when the loop exits.
#[derive(Debug, Clone, Copy, Default)]
pub struct PipelineStats {
    pub samples_processed: u64,
    pub samples_discarded: u64,
    pub outliers_rejected: u64,
    pub stalls: u64,
}

/// Owns all state needed for the ingestion loop.
///
/// Built with [`new()`](ProcessingLoop::new), then consumed by
/// [`run()`](ProcessingLoop::run).
pub struct ProcessingLoop {
    controller: PipelineController,
    app_state: Arc<RwLock<AppState>>,
    cancel_token: CancellationToken,
    /// Monotonic epoch mapping wall time to pipeline seconds.
    epoch: Instant,
}

impl ProcessingLoop {
    pub fn new(
        controller: PipelineController,
        app_state: Arc<RwLock<AppState>>,
        cancel_token: CancellationToken,
    ) -> Self {
        Self {
            controller,
            app_state,
            cancel_token,
            epoch: Instant::now(),
        }
    }

    /// Run the processing loop until the source is exhausted or cancellation.
    ///
    /// Returns final pipeline statistics.
    pub async fn run<S: SampleSource>(mut self, source: &mut S) -> PipelineStats {
        info!("Processing sensor frames from {}...", source.source_name());

        {
            let mut state = self.app_state.write().await;
            state.source_name = source.source_name().to_string();
        }

        let mut watchdog =
            tokio::time::interval(tokio::time::Duration::from_millis(WATCHDOG_TICK_MS));
        watchdog.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                // Shutdown wins over a ready source so cancellation is prompt
                // even when frames are arriving back-to-back.
                biased;

                _ = self.cancel_token.cancelled() => {
                    info!("[SampleProcessor] Shutdown signal received");
                    break;
                }
                _ = watchdog.tick() => {
                    let now_s = self.epoch.elapsed().as_secs_f64();
                    if self.controller.tick(now_s) {
                        self.sync_app_state().await;
                    }
                }
                result = source.next_event() => {
                    match result {
                        Ok(SampleEvent::Frame(frame)) => {
                            let sample = RawSample {
                                time_s: self.epoch.elapsed().as_secs_f64(),
                                period_us: frame.period_us.map(|p| p as f64),
                            };
                            let published = self.controller.ingest(sample);
                            self.sync_app_state().await;
                            if published.is_some() {
                                let mut state = self.app_state.write().await;
                                state.last_sample_at = Some(chrono::Utc::now());
                            }
                        }
                        Ok(SampleEvent::Eof) => {
                            info!(
                                "[SampleProcessor] Source reached end ({} samples processed)",
                                self.controller.stats().samples_processed
                            );
                            break;
                        }
                        Err(e) => {
                            warn!("[SampleProcessor] Source error: {}", e);
                            break;
                        }
                    }
                }
            }
        }

        let stats = self.final_stats();
        info!("");
        info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
        info!("  FINAL STATISTICS");
        info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
        info!("   Samples Processed:  {}", stats.samples_processed);
        info!("   Samples Discarded:  {}", stats.samples_discarded);
        info!("   Outliers Rejected:  {}", stats.outliers_rejected);
        info!("   Stalls Observed:    {}", stats.stalls);
        info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

        stats
    }

    /// Mirror the controller's counters and link state into the shared
    /// dashboard state.
    async fn sync_app_state(&self) {
        let stats = self.controller.stats();
        let link = self.controller.link_state();
        let mut state = self.app_state.write().await;
        state.link = link;
        state.samples_processed = stats.samples_processed;
        state.samples_discarded = stats.samples_discarded;
        state.outliers_rejected = stats.outliers_rejected;
        state.stalls = stats.stalls;
    }

    fn final_stats(&self) -> PipelineStats {
        let stats = self.controller.stats();
        PipelineStats {
            samples_processed: stats.samples_processed,
            samples_discarded: stats.samples_discarded,
            outliers_rejected: stats.outliers_rejected,
            stalls: stats.stalls,
        }
    }
}
