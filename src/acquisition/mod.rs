//! Sensor wire-format acquisition.
//!
//! The Hall-sensor board prints one CSV line per sampling cycle:
//!
//! ```text
//! ts_now_us, ts_last_rev_us, rev_period_us, ...
//! ```
//!
//! Only fields 0 and 2 are meaningful; trailing fields may be junk. A zero or
//! negative `rev_period_us` means no revolution was observed.

mod line_parser;

pub use line_parser::{load_frames, parse_line, AcquisitionError, SensorFrame};
