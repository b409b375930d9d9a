//! GPS time synchronization
//!
//! The meters carry GPS-derived time in their data records; on an
//! interval, a timestamp is extracted and pushed into the system clock so
//! a Pi without an RTC keeps usable time.

use async_trait::async_trait;
use atgmlogger_events::{AppEvent, EventEmitter, EventSender, LoggerEvent};
use chrono::NaiveDateTime;
use tracing::{debug, warn};

use crate::dispatcher::Handler;

/// Seconds between the UNIX epoch (1970-01-01) and the GPS epoch
/// (1980-01-06), ignoring leap seconds
const GPS_EPOCH_DELTA: i64 = 315_964_800;

/// Seconds per GPS week
const SECONDS_PER_WEEK: i64 = 604_800;

/// Convert GPS week + seconds-of-week to a UNIX timestamp
#[must_use]
pub fn convert_gps_time(week: i64, seconds: f64) -> i64 {
    #[allow(clippy::cast_possible_truncation)]
    let whole_seconds = seconds as i64;
    GPS_EPOCH_DELTA + week * SECONDS_PER_WEEK + whole_seconds
}

/// Extract a UNIX timestamp from a raw data line
///
/// Airborne (AT1A) records have 13 comma-separated fields with GPS week and
/// seconds in the last two; marine (AT1M) records have 19 fields with a
/// `YYYYMMDDHHmmss` date in the last. Week 0 means the meter has no GPS
/// lock yet and is rejected.
#[must_use]
pub fn timestamp_from_data(line: &str) -> Option<i64> {
    let fields: Vec<&str> = line.split(',').collect();
    match fields.len() {
        13 => {
            let week: i64 = fields[11].trim().parse().ok()?;
            let seconds: f64 = fields[12].trim().parse().ok()?;
            if week == 0 {
                return None;
            }
            Some(convert_gps_time(week, seconds))
        }
        19 => NaiveDateTime::parse_from_str(fields[18].trim(), "%Y%m%d%H%M%S")
            .ok()
            .map(|dt| dt.and_utc().timestamp()),
        _ => None,
    }
}

/// Handler that periodically sets the system clock from the data stream
pub struct TimeSync {
    interval: u64,
    tick: u64,
    events: Option<EventSender>,
}

impl TimeSync {
    #[must_use]
    pub fn new(interval: u64) -> Self {
        Self {
            interval: interval.max(1),
            tick: 0,
            events: None,
        }
    }

    /// Attach an event channel for progress reporting
    #[must_use]
    pub fn with_events(mut self, events: EventSender) -> Self {
        self.events = Some(events);
        self
    }
}

#[async_trait]
impl Handler for TimeSync {
    fn name(&self) -> &'static str {
        "timesync"
    }

    async fn handle(&mut self, line: &str) {
        self.tick += 1;
        if self.tick % self.interval != 0 {
            return;
        }

        let Some(timestamp) = timestamp_from_data(line) else {
            debug!("timestamp could not be extracted from data line");
            return;
        };

        match atgmlogger_platform::set_system_time(timestamp).await {
            Ok(()) => {
                debug!(timestamp, "system time set from data stream");
                self.emit(AppEvent::Logger(LoggerEvent::TimeSynced { timestamp }));
            }
            Err(e) => warn!("failed to set system time: {e}"),
        }
    }
}

impl EventEmitter for TimeSync {
    fn event_sender(&self) -> Option<&EventSender> {
        self.events.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gps_week_conversion_matches_known_epoch_offset() {
        assert_eq!(convert_gps_time(0, 0.0), 315_964_800);
        assert_eq!(convert_gps_time(1959, 345_600.0), 1_501_113_600);
    }

    #[test]
    fn airborne_record_carries_week_and_seconds() {
        let line = "$AT1A,1,2,3,4,5,6,7,8,9,10,1959,345600.0";
        assert_eq!(line.split(',').count(), 13);
        assert_eq!(timestamp_from_data(line), Some(1_501_113_600));
    }

    #[test]
    fn unlocked_gps_week_zero_is_rejected() {
        let line = "$AT1A,1,2,3,4,5,6,7,8,9,10,0,345600.0";
        assert_eq!(timestamp_from_data(line), None);
    }

    #[test]
    fn marine_record_carries_packed_date() {
        let mut fields = vec!["x"; 18];
        fields.push("20171117202136");
        let line = fields.join(",");
        assert_eq!(timestamp_from_data(&line), Some(1_510_950_096));
    }

    #[test]
    fn malformed_lines_yield_nothing() {
        assert_eq!(timestamp_from_data(""), None);
        assert_eq!(timestamp_from_data("a,b,c"), None);
        let mut fields = vec!["x"; 18];
        fields.push("not-a-date");
        assert_eq!(timestamp_from_data(&fields.join(",")), None);
    }
}
