//! Task ranking.
//!
//! Tasks are attempted in this order:
//! - earliest deadline first
//! - higher explicit priority breaks deadline ties
//! - creation time, then id, break the remaining ties
//!
//! The final key makes the order independent of how the input was arranged.

use std::cmp::Ordering;

use chrono::{DateTime, Duration, Utc};

use crate::schedule::Task;

/// A task that still needs work, with its derived scheduling facts.
#[derive(Debug, Clone, PartialEq)]
pub struct RankedTask<'a> {
    pub task: &'a Task,
    pub remaining: Duration,
    /// Deadline already passed at ranking time. Such tasks are still attempted.
    pub overdue: bool,
}

/// Result of ranking one snapshot's tasks.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Ranking<'a> {
    /// Tasks to place, in attempt order.
    pub pending: Vec<RankedTask<'a>>,
    /// Tasks with no remaining effort, in the same order.
    pub completed: Vec<&'a Task>,
}

/// Attempt order for two tasks.
pub fn compare_tasks(a: &Task, b: &Task) -> Ordering {
    a.deadline
        .cmp(&b.deadline)
        .then_with(|| b.priority.cmp(&a.priority))
        .then_with(|| a.created_at.cmp(&b.created_at))
        .then_with(|| a.id.cmp(&b.id))
}

/// Order tasks for placement and split off those with nothing left to do.
pub fn rank(tasks: &[Task], now: DateTime<Utc>) -> Ranking<'_> {
    let mut ordered: Vec<&Task> = tasks.iter().collect();
    ordered.sort_by(|a, b| compare_tasks(a, b));

    let mut ranking = Ranking::default();
    for task in ordered {
        if task.is_satisfied() {
            ranking.completed.push(task);
        } else {
            ranking.pending.push(RankedTask {
                task,
                remaining: task.remaining_effort(),
                overdue: task.deadline < now,
            });
        }
    }

    tracing::debug!(
        pending = ranking.pending.len(),
        completed = ranking.completed.len(),
        overdue = ranking.pending.iter().filter(|r| r.overdue).count(),
        "ranked tasks"
    );

    ranking
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn day(d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, d, 17, 0, 0).unwrap()
    }

    fn make_task(id: &str, deadline_day: u32, priority: u8, completion: u8) -> Task {
        Task {
            id: id.to_string(),
            name: format!("Task {id}"),
            deadline: day(deadline_day),
            expected_minutes: 60,
            completion_level: completion,
            priority,
            created_at: day(1),
        }
    }

    fn ids(ranking: &Ranking<'_>) -> Vec<String> {
        ranking.pending.iter().map(|r| r.task.id.clone()).collect()
    }

    #[test]
    fn deadline_dominates_priority() {
        let tasks = vec![
            make_task("late-high", 12, 100, 0),
            make_task("soon-low", 11, 10, 0),
        ];
        let ranking = rank(&tasks, day(10));
        assert_eq!(ids(&ranking), vec!["soon-low", "late-high"]);
    }

    #[test]
    fn priority_breaks_deadline_ties() {
        let tasks = vec![
            make_task("p50", 11, 50, 0),
            make_task("p90", 11, 90, 0),
        ];
        assert_eq!(ids(&rank(&tasks, day(10))), vec!["p90", "p50"]);
    }

    #[test]
    fn creation_order_then_id_break_full_ties() {
        let mut older = make_task("b", 11, 50, 0);
        older.created_at = day(1) - Duration::hours(1);
        let tasks = vec![make_task("c", 11, 50, 0), make_task("a", 11, 50, 0), older];
        assert_eq!(ids(&rank(&tasks, day(10))), vec!["b", "a", "c"]);
    }

    #[test]
    fn completed_tasks_are_split_off() {
        let tasks = vec![make_task("done", 11, 90, 100), make_task("open", 12, 50, 50)];
        let ranking = rank(&tasks, day(10));
        assert_eq!(ids(&ranking), vec!["open"]);
        assert_eq!(ranking.pending[0].remaining, Duration::minutes(30));
        assert_eq!(ranking.completed.len(), 1);
        assert_eq!(ranking.completed[0].id, "done");
    }

    #[test]
    fn overdue_is_flagged_not_dropped() {
        let tasks = vec![make_task("past", 9, 50, 0)];
        let ranking = rank(&tasks, day(10));
        assert_eq!(ranking.pending.len(), 1);
        assert!(ranking.pending[0].overdue);
    }
}
