//! CSV line parsing for the revolution sensor.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use thiserror::Error;
use tracing::{debug, info};

/// Errors from loading a recorded sensor capture.
#[derive(Debug, Error)]
pub enum AcquisitionError {
    #[error("failed to open capture file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("capture file {0} contains no parseable frames")]
    Empty(String),
}

/// One parsed sensor line.
///
/// `ts_us` is the sensor's own microsecond clock at print time (used to pace
/// replays). `period_us` is the revolution period, or `None` when the sensor
/// reported a non-positive value (standstill / no revolution yet).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SensorFrame {
    pub ts_us: u64,
    pub period_us: Option<u64>,
}

/// Parse one sensor CSV line.
///
/// Returns `None` for lines that are structurally malformed (fewer than three
/// fields, unparseable numbers) — those are dropped entirely. A parseable
/// line with a non-positive period yields a frame with `period_us: None`,
/// which downstream treats as "no revolution this cycle".
pub fn parse_line(line: &str) -> Option<SensorFrame> {
    let fields: Vec<&str> = line.trim().split(',').collect();
    if fields.len() < 3 {
        return None;
    }
    let ts_us = fields[0].trim().parse::<u64>().ok()?;
    let period = fields[2].trim().parse::<i64>().ok()?;
    Some(SensorFrame {
        ts_us,
        period_us: u64::try_from(period).ok().filter(|&p| p > 0),
    })
}

/// Load all parseable frames from a recorded capture file.
///
/// Malformed lines are skipped with a debug log, matching the live reader's
/// tolerance. Errors only on I/O failure or a file with no usable frames.
pub fn load_frames(path: &Path) -> Result<Vec<SensorFrame>, AcquisitionError> {
    let file = File::open(path).map_err(|source| AcquisitionError::Io {
        path: path.display().to_string(),
        source,
    })?;

    let reader = BufReader::new(file);
    let mut frames = Vec::new();
    let mut skipped = 0usize;

    for (line_num, line_result) in reader.lines().enumerate() {
        let Ok(line) = line_result else {
            skipped += 1;
            continue;
        };
        if line.trim().is_empty() {
            continue;
        }
        match parse_line(&line) {
            Some(frame) => frames.push(frame),
            None => {
                skipped += 1;
                debug!(line = line_num + 1, "skipping malformed sensor line");
            }
        }
    }

    if frames.is_empty() {
        return Err(AcquisitionError::Empty(path.display().to_string()));
    }

    info!(
        count = frames.len(),
        skipped,
        path = %path.display(),
        "Loaded sensor capture"
    );
    Ok(frames)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_valid_line() {
        let frame = parse_line("1500000,1480000,20000,7,junk").unwrap();
        assert_eq!(frame.ts_us, 1_500_000);
        assert_eq!(frame.period_us, Some(20_000));
    }

    #[test]
    fn test_parse_tolerates_whitespace() {
        let frame = parse_line(" 1500000, 1480000, 20000 ").unwrap();
        assert_eq!(frame.period_us, Some(20_000));
    }

    #[test]
    fn test_parse_zero_period_is_absent() {
        let frame = parse_line("1500000,0,0").unwrap();
        assert_eq!(frame.period_us, None);
    }

    #[test]
    fn test_parse_negative_period_is_absent() {
        let frame = parse_line("1500000,0,-42").unwrap();
        assert_eq!(frame.period_us, None);
    }

    #[test]
    fn test_parse_rejects_short_and_malformed() {
        assert_eq!(parse_line("1500000,1480000"), None);
        assert_eq!(parse_line("abc,def,ghi"), None);
        assert_eq!(parse_line("1500000,x,not_a_number"), None);
        assert_eq!(parse_line(""), None);
    }

    #[test]
    fn test_load_frames_skips_junk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "1000000,990000,20000").unwrap();
        writeln!(file, "garbage line").unwrap();
        writeln!(file).unwrap();
        writeln!(file, "1050000,1040000,0").unwrap();
        writeln!(file, "1100000,1090000,19500").unwrap();
        file.flush().unwrap();

        let frames = load_frames(file.path()).unwrap();
        assert_eq!(frames.len(), 3);
        assert_eq!(frames[0].period_us, Some(20_000));
        assert_eq!(frames[1].period_us, None);
        assert_eq!(frames[2].period_us, Some(19_500));
    }

    #[test]
    fn test_load_frames_empty_file_errors() {
        let file = tempfile::NamedTempFile::new().unwrap();
        assert!(matches!(
            load_frames(file.path()),
            Err(AcquisitionError::Empty(_))
        ));
    }
}
