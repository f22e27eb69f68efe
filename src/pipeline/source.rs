//! Sample source abstraction for sensor ingestion.
//!
//! Provides a unified trait for reading revolution-timing frames from
//! different sources: stdin (live sensor piped in), recorded capture files
//! (replay), and a synthetic run-profile generator.

use anyhow::Result;
use async_trait::async_trait;

use crate::acquisition::{parse_line, SensorFrame};
use crate::config::defaults::REPLAY_MAX_DELAY_S;
use crate::sim::SyntheticSensor;

/// Events produced by a sample source.
pub enum SampleEvent {
    /// A parsed sensor frame.
    Frame(SensorFrame),
    /// Source reached end of data (EOF for stdin/replay; synthetic never ends).
    Eof,
}

/// Trait abstracting where sensor frames come from.
///
/// Implementations handle format parsing and pacing internally. The
/// processing loop calls [`next_event`](SampleSource::next_event) in a
/// `select!` with cancellation and the watchdog tick; arrival timestamps are
/// stamped by the loop, not the source.
#[async_trait]
pub trait SampleSource: Send + 'static {
    /// Read the next frame from the source.
    ///
    /// Returns `SampleEvent::Eof` when no more data is available.
    async fn next_event(&mut self) -> Result<SampleEvent>;

    /// Human-readable name for logging (e.g. "stdin", "replay", "synthetic").
    fn source_name(&self) -> &str;
}

// ============================================================================
// Stdin Source (live sensor piped in, one CSV line per frame)
// ============================================================================

/// Reads sensor CSV lines from stdin.
///
/// Used with a serial bridge:
/// `socat /dev/ttyACM0,b9600 - | rollerdyno --stdin`
pub struct StdinSource {
    reader: tokio::io::BufReader<tokio::io::Stdin>,
    line_buffer: String,
}

impl StdinSource {
    pub fn new() -> Self {
        Self {
            reader: tokio::io::BufReader::new(tokio::io::stdin()),
            line_buffer: String::with_capacity(256),
        }
    }
}

impl Default for StdinSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SampleSource for StdinSource {
    async fn next_event(&mut self) -> Result<SampleEvent> {
        use tokio::io::AsyncBufReadExt;
        loop {
            self.line_buffer.clear();
            let bytes = self.reader.read_line(&mut self.line_buffer).await?;
            if bytes == 0 {
                return Ok(SampleEvent::Eof);
            }
            let line = self.line_buffer.trim();
            if line.is_empty() {
                continue;
            }
            match parse_line(line) {
                Some(frame) => return Ok(SampleEvent::Frame(frame)),
                None => {
                    tracing::debug!("[StdinSource] skipping malformed line");
                    // Keep reading — serial noise is routine.
                }
            }
        }
    }

    fn source_name(&self) -> &str {
        "stdin"
    }
}

// ============================================================================
// Replay Source (recorded capture file)
// ============================================================================

/// Replays pre-loaded sensor frames, paced by the recorded sensor timestamps
/// scaled by a speed multiplier.
pub struct ReplaySource {
    frames: std::vec::IntoIter<SensorFrame>,
    /// Speed multiplier: 1.0 = realtime, 0.0 = no delay.
    speed: f64,
    last_ts_us: Option<u64>,
}

impl ReplaySource {
    pub fn new(frames: Vec<SensorFrame>, speed: f64) -> Self {
        Self {
            frames: frames.into_iter(),
            speed,
            last_ts_us: None,
        }
    }
}

#[async_trait]
impl SampleSource for ReplaySource {
    async fn next_event(&mut self) -> Result<SampleEvent> {
        let Some(frame) = self.frames.next() else {
            return Ok(SampleEvent::Eof);
        };

        // Pace by the recorded inter-frame gap; clamp so a sensor clock jump
        // in the capture cannot hang the replay.
        if self.speed > 0.0 {
            if let Some(last) = self.last_ts_us {
                let gap_s = frame.ts_us.saturating_sub(last) as f64 / 1e6 / self.speed;
                let gap_s = gap_s.min(REPLAY_MAX_DELAY_S);
                if gap_s > 0.0 {
                    tokio::time::sleep(tokio::time::Duration::from_secs_f64(gap_s)).await;
                }
            }
        }
        self.last_ts_us = Some(frame.ts_us);
        Ok(SampleEvent::Frame(frame))
    }

    fn source_name(&self) -> &str {
        "replay"
    }
}

// ============================================================================
// Synthetic Source (generated run profile)
// ============================================================================

/// Emits frames from the synthetic run profile at the bench data rate.
/// Never reaches EOF — the profile cycles indefinitely.
pub struct SyntheticSource {
    sensor: SyntheticSensor,
    interval: tokio::time::Interval,
}

impl SyntheticSource {
    pub fn new() -> Self {
        let period = tokio::time::Duration::from_millis(
            crate::config::defaults::SYNTHETIC_FRAME_INTERVAL_MS,
        );
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        Self {
            sensor: SyntheticSensor::from_entropy(),
            interval,
        }
    }
}

impl Default for SyntheticSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SampleSource for SyntheticSource {
    async fn next_event(&mut self) -> Result<SampleEvent> {
        self.interval.tick().await;
        Ok(SampleEvent::Frame(self.sensor.next_frame()))
    }

    fn source_name(&self) -> &str {
        "synthetic"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_replay_yields_frames_then_eof() {
        let frames = vec![
            SensorFrame {
                ts_us: 0,
                period_us: Some(20_000),
            },
            SensorFrame {
                ts_us: 50_000,
                period_us: None,
            },
        ];
        let mut source = ReplaySource::new(frames, 0.0);

        match source.next_event().await.unwrap() {
            SampleEvent::Frame(f) => assert_eq!(f.period_us, Some(20_000)),
            SampleEvent::Eof => panic!("expected frame"),
        }
        match source.next_event().await.unwrap() {
            SampleEvent::Frame(f) => assert_eq!(f.period_us, None),
            SampleEvent::Eof => panic!("expected frame"),
        }
        assert!(matches!(
            source.next_event().await.unwrap(),
            SampleEvent::Eof
        ));
    }

    #[tokio::test]
    async fn test_replay_speed_zero_does_not_sleep() {
        // 10 frames spanning 10 sensor-seconds must drain instantly at speed 0.
        let frames: Vec<SensorFrame> = (0..10)
            .map(|i| SensorFrame {
                ts_us: i * 1_000_000,
                period_us: Some(20_000),
            })
            .collect();
        let mut source = ReplaySource::new(frames, 0.0);
        let start = std::time::Instant::now();
        let mut count = 0;
        while let SampleEvent::Frame(_) = source.next_event().await.unwrap() {
            count += 1;
        }
        assert_eq!(count, 10);
        assert!(start.elapsed().as_millis() < 500);
    }

    #[tokio::test]
    async fn test_synthetic_source_produces_frames() {
        let mut source = SyntheticSource::new();
        for _ in 0..3 {
            match source.next_event().await.unwrap() {
                SampleEvent::Frame(_) => {}
                SampleEvent::Eof => panic!("synthetic source must not end"),
            }
        }
    }
}
