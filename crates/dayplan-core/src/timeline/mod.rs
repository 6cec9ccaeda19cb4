//! Time arithmetic for plan generation.
//!
//! This module provides:
//! - Half-open intervals and merged busy-interval sets
//! - Free time detection inside work windows
//! - Task ranking by deadline, priority and creation order

mod gap;
mod interval;
mod priority;

pub use gap::{TimeGap, TimeGapDetector};
pub use interval::{Interval, IntervalSet};
pub use priority::{compare_tasks, rank, RankedTask, Ranking};
