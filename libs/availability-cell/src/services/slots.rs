use std::collections::HashSet;
use std::fmt;

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};

use shared_config::AppConfig;
use shared_models::AvailabilityWindow;

const TIME_FORMAT: &str = "%H:%M";
const MINUTES_PER_DAY: i64 = 24 * 60;

/// A bookable `[start, end)` sub-interval of an availability window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Slot {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl Slot {
    pub fn label(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-{}",
            self.start.format(TIME_FORMAT),
            self.end.format(TIME_FORMAT)
        )
    }
}

/// Splits availability windows into fixed-length slots.
///
/// Every operation is pure: the same window always yields the same slots,
/// and malformed input yields no slots rather than an error.
#[derive(Debug, Clone, Copy)]
pub struct SlotAllocator {
    duration_minutes: i64,
}

impl SlotAllocator {
    pub fn new(duration_minutes: i64) -> Self {
        Self { duration_minutes }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(config.slot_duration_minutes)
    }

    pub fn duration_minutes(&self) -> i64 {
        self.duration_minutes
    }

    /// Parses `HH:MM-HH:MM`. Requires exactly one `-`.
    pub fn parse_window(raw: &str) -> Option<(NaiveTime, NaiveTime)> {
        let mut parts = raw.split('-');
        let (start, end) = match (parts.next(), parts.next(), parts.next()) {
            (Some(start), Some(end), None) => (start, end),
            _ => return None,
        };

        let start = NaiveTime::parse_from_str(start.trim(), TIME_FORMAT).ok()?;
        let end = NaiveTime::parse_from_str(end.trim(), TIME_FORMAT).ok()?;
        Some((start, end))
    }

    /// Contiguous slots covering `[start, end)`; a trailing remainder shorter
    /// than one slot is dropped.
    pub fn slots_between(&self, start: NaiveTime, end: NaiveTime) -> Vec<Slot> {
        if self.duration_minutes <= 0 || self.duration_minutes > MINUTES_PER_DAY {
            return Vec::new();
        }
        let step = Duration::minutes(self.duration_minutes);

        let mut slots = Vec::new();
        let mut cursor = start;
        loop {
            let (next, wrapped) = cursor.overflowing_add_signed(step);
            if wrapped != 0 || next > end {
                break;
            }
            slots.push(Slot {
                start: cursor,
                end: next,
            });
            cursor = next;
        }
        slots
    }

    pub fn generate(&self, raw: &str) -> Vec<Slot> {
        match Self::parse_window(raw) {
            Some((start, end)) => self.slots_between(start, end),
            None => Vec::new(),
        }
    }

    pub fn labels(&self, raw: &str) -> Vec<String> {
        self.generate(raw).iter().map(Slot::label).collect()
    }

    pub fn window_labels(&self, window: &AvailabilityWindow) -> Vec<String> {
        self.slots_between(window.start_time, window.end_time)
            .iter()
            .map(Slot::label)
            .collect()
    }

    /// True when `label` is one of the window's generated slots.
    pub fn contains(&self, window: &AvailabilityWindow, label: &str) -> bool {
        self.window_labels(window).iter().any(|slot| slot == label)
    }

    /// True when the slot `label` on `date` starts before `now`. Slot times are
    /// read as UTC. Unparsable labels never count as started.
    pub fn has_started(label: &str, date: NaiveDate, now: DateTime<Utc>) -> bool {
        Self::parse_window(label)
            .map(|(start, _)| date.and_time(start).and_utc() < now)
            .unwrap_or(false)
    }

    /// Window slots minus the labels already taken, in order.
    pub fn available(&self, window: &AvailabilityWindow, taken: &HashSet<String>) -> Vec<String> {
        self.window_labels(window)
            .into_iter()
            .filter(|label| !taken.contains(label))
            .collect()
    }
}
