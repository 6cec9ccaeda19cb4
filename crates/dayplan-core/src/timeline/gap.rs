//! Free time detection between busy intervals.
//!
//! Finds the spans of a window not covered by event occurrences or
//! previously placed tasks.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::interval::{Interval, IntervalSet};

/// A free span inside a work window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeGap {
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

impl TimeGap {
    /// Create a new time gap, or `None` for a zero-length span
    pub fn new(start_time: DateTime<Utc>, end_time: DateTime<Utc>) -> Option<Self> {
        if end_time <= start_time {
            return None;
        }
        Some(Self {
            start_time,
            end_time,
        })
    }

    pub fn duration(&self) -> Duration {
        self.end_time - self.start_time
    }

    /// Check if this gap can fit work of the given length
    pub fn can_fit(&self, length: Duration) -> bool {
        self.duration() >= length
    }

    /// Earliest interval of `length` in this gap that ends by `deadline`.
    pub fn fit_before(&self, length: Duration, deadline: DateTime<Utc>) -> Option<Interval> {
        let end = self.start_time.checked_add_signed(length)?;
        (self.can_fit(length) && end <= deadline).then(|| Interval::new(self.start_time, end))
    }
}

/// Detector for finding free spans in a window
pub struct TimeGapDetector {
    min_gap: Duration,
}

impl TimeGapDetector {
    /// Reports every non-empty gap.
    pub fn new() -> Self {
        Self {
            min_gap: Duration::zero(),
        }
    }

    /// Ignore gaps shorter than `min_gap`, e.g. the length of the work being placed
    pub fn with_min_gap(mut self, min_gap: Duration) -> Self {
        self.min_gap = min_gap;
        self
    }

    /// Find gaps in `[window_start, window_end)` not covered by `busy`.
    ///
    /// Returned gaps are sorted by start time.
    pub fn find_gaps(
        &self,
        busy: &IntervalSet,
        window_start: DateTime<Utc>,
        window_end: DateTime<Utc>,
    ) -> Vec<TimeGap> {
        let mut gaps = Vec::new();
        if window_end <= window_start {
            return gaps;
        }

        let mut cursor = window_start;
        for interval in busy.intervals() {
            if interval.end <= cursor {
                continue;
            }
            if interval.start >= window_end {
                break;
            }
            if interval.start > cursor {
                self.push_gap(&mut gaps, cursor, interval.start);
            }
            cursor = cursor.max(interval.end.min(window_end));
        }

        if cursor < window_end {
            self.push_gap(&mut gaps, cursor, window_end);
        }

        gaps
    }

    fn push_gap(&self, gaps: &mut Vec<TimeGap>, start: DateTime<Utc>, end: DateTime<Utc>) {
        if let Some(gap) = TimeGap::new(start, end) {
            if gap.duration() >= self.min_gap {
                gaps.push(gap);
            }
        }
    }
}

impl Default for TimeGapDetector {
    fn default() -> Self {
        Self::new()
    }
}
