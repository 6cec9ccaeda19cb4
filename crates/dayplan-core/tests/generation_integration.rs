//! Integration tests for plan generation.

use chrono::{DateTime, Duration, Offset, TimeZone, Utc};
use dayplan_core::schedule::COMPLETED_SUFFIX;
use dayplan_core::scheduler::work_segments;
use dayplan_core::timeline::rank;
use dayplan_core::{
    GeneratorConfig, Interval, Limits, PlanItemKind, RecurringEvent, RepeatRule, ScheduleError, ScheduleGenerator,
    ScheduleSnapshot, Task, WorkWindow,
};
use proptest::prelude::*;

/// Monday 2025-03-10 00:00 UTC
fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 10, 0, 0, 0).unwrap()
}

fn at(day: u32, hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, day, hour, minute, 0).unwrap()
}

fn daily_event(id: &str, start_hour: u32, end_hour: u32) -> RecurringEvent {
    RecurringEvent {
        id: id.into(),
        name: format!("Event {id}"),
        start: at(1, start_hour, 0),
        end: at(1, end_hour, 0),
        repeat: RepeatRule::Daily,
    }
}

fn task(id: &str, deadline: DateTime<Utc>, minutes: i64, completion: u8, priority: u8) -> Task {
    Task {
        id: id.into(),
        name: format!("Task {id}"),
        deadline,
        expected_minutes: minutes,
        completion_level: completion,
        priority,
        created_at: at(1, 0, 0),
    }
}

#[test]
fn daily_event_and_one_task_place_around_each_other() {
    let snapshot = ScheduleSnapshot {
        events: vec![daily_event("standup", 9, 10)],
        tasks: vec![task("report", at(11, 17, 0), 120, 0, 90)],
    };

    let plan = ScheduleGenerator::new().generate(&snapshot, now()).unwrap();

    let placed: Vec<_> = plan.items.iter().filter(|i| i.kind == PlanItemKind::Task).collect();
    assert_eq!(placed.len(), 1);
    let report = placed[0];
    assert!(report.end <= at(11, 17, 0));
    assert_eq!(report.duration(), Duration::minutes(120));

    let events: Vec<_> = plan.items.iter().filter(|i| i.kind == PlanItemKind::Event).collect();
    assert_eq!(events.len(), 7);
    for event in events {
        assert_eq!(event.duration(), Duration::hours(1));
        assert!(!event.overlaps(report), "task overlaps {event:?}");
    }
}

#[test]
fn fully_booked_work_windows_are_infeasible() {
    let snapshot = ScheduleSnapshot {
        events: vec![daily_event("all-day", 8, 22)],
        tasks: vec![task("short", at(16, 23, 0), 60, 0, 50)],
    };

    let err = ScheduleGenerator::new().generate(&snapshot, now()).unwrap_err();
    assert!(matches!(err, ScheduleError::Infeasible { ref task_id, .. } if task_id == "short"));
}

#[test]
fn completed_task_becomes_zero_length_marker() {
    let snapshot = ScheduleSnapshot {
        events: vec![],
        tasks: vec![task("done", at(12, 17, 0), 90, 100, 50)],
    };

    let plan = ScheduleGenerator::new().generate(&snapshot, now()).unwrap();

    assert_eq!(plan.items.len(), 1);
    let marker = &plan.items[0];
    assert_eq!(marker.kind, PlanItemKind::Task);
    assert_eq!(marker.name, format!("Task done{COMPLETED_SUFFIX}"));
    assert_eq!(marker.duration(), Duration::zero());
}

#[test]
fn higher_priority_is_placed_first_on_equal_deadlines() {
    let snapshot = ScheduleSnapshot {
        events: vec![],
        tasks: vec![
            task("low", at(12, 17, 0), 60, 0, 50),
            task("high", at(12, 17, 0), 60, 0, 90),
        ],
    };

    let plan = ScheduleGenerator::new().generate(&snapshot, now()).unwrap();
    let start_of = |id: &str| {
        plan.items
            .iter()
            .find(|i| i.source_id == id)
            .map(|i| i.start)
            .unwrap()
    };
    assert!(start_of("high") <= start_of("low"));
    assert_eq!(start_of("high"), at(10, 8, 0));
    assert_eq!(start_of("low"), at(10, 9, 0));
}

#[test]
fn weekly_events_respect_local_offset() {
    // Mon/Wed 09:00-10:00 at UTC-05:00
    let est = chrono::FixedOffset::west_opt(5 * 3600).unwrap();
    let snapshot = ScheduleSnapshot {
        events: vec![RecurringEvent {
            id: "gym".into(),
            name: "Gym".into(),
            start: at(3, 14, 0),
            end: at(3, 15, 0),
            repeat: RepeatRule::Weekly { days: vec![1, 3] },
        }],
        tasks: vec![],
    };
    let generator = ScheduleGenerator::with_config(GeneratorConfig {
        utc_offset: est,
        ..GeneratorConfig::default()
    });

    let plan = generator.generate(&snapshot, now()).unwrap();
    let starts: Vec<_> = plan.items.iter().map(|i| i.start).collect();
    assert_eq!(starts, vec![at(10, 14, 0), at(12, 14, 0)]);
}

#[test]
fn limits_trip_before_search() {
    let snapshot = ScheduleSnapshot {
        events: (0..3).map(|i| daily_event(&format!("e{i}"), 9, 10)).collect(),
        tasks: vec![],
    };
    let generator = ScheduleGenerator::with_config(GeneratorConfig {
        limits: Limits {
            max_events: 2,
            ..Limits::default()
        },
        ..GeneratorConfig::default()
    });

    let err = generator.generate(&snapshot, now()).unwrap_err();
    assert!(matches!(err, ScheduleError::ComplexityLimitExceeded { actual: 3, limit: 2, .. }));
}

#[test]
fn malformed_task_is_rejected_before_placement() {
    let snapshot = ScheduleSnapshot {
        events: vec![],
        tasks: vec![task("zero", at(12, 17, 0), 0, 0, 50)],
    };
    let err = ScheduleGenerator::new().generate(&snapshot, now()).unwrap_err();
    assert_eq!(
        err.to_string(),
        "Invalid schedule input: Expected completion time must be positive."
    );
}

// === Properties ===

/// Distinct one-hour single events inside the work window of the first week.
fn events_strategy() -> impl Strategy<Value = Vec<RecurringEvent>> {
    prop::collection::btree_set((0i64..7, 8i64..21), 0..12).prop_map(|slots| {
        slots
            .into_iter()
            .enumerate()
            .map(|(i, (day, hour))| {
                let start = now() + Duration::days(day) + Duration::hours(hour);
                RecurringEvent {
                    id: format!("e{i}"),
                    name: format!("Event {i}"),
                    start,
                    end: start + Duration::hours(1),
                    repeat: RepeatRule::None,
                }
            })
            .collect()
    })
}

fn tasks_strategy() -> impl Strategy<Value = Vec<Task>> {
    prop::collection::vec((1i64..=7 * 24, 15i64..=240, 0u8..=100, 0u8..=100), 0..8).prop_map(|specs| {
        specs
            .into_iter()
            .enumerate()
            .map(|(i, (deadline_hours, minutes, completion, priority))| Task {
                id: format!("t{i}"),
                name: format!("Task {i}"),
                deadline: now() + Duration::hours(deadline_hours),
                expected_minutes: minutes,
                completion_level: completion,
                priority,
                created_at: now() - Duration::minutes(i as i64 % 3),
            })
            .collect()
    })
}

fn snapshot_strategy() -> impl Strategy<Value = ScheduleSnapshot> {
    (events_strategy(), tasks_strategy()).prop_map(|(events, tasks)| ScheduleSnapshot { events, tasks })
}

proptest! {
    #[test]
    fn successful_plans_satisfy_invariants(snapshot in snapshot_strategy()) {
        let generator = ScheduleGenerator::new();
        match generator.generate(&snapshot, now()) {
            Ok(plan) => {
                let segments = work_segments(
                    Interval::new(plan.horizon_start, plan.horizon_end),
                    WorkWindow::default(),
                    Utc.fix(),
                );

                // No two items share time.
                for (i, a) in plan.items.iter().enumerate() {
                    for b in &plan.items[i + 1..] {
                        prop_assert!(!a.overlaps(b), "{a:?} overlaps {b:?}");
                    }
                }

                for t in &snapshot.tasks {
                    let items: Vec<_> = plan.items.iter().filter(|i| i.source_id == t.id).collect();
                    prop_assert_eq!(items.len(), 1);
                    let item = items[0];
                    if t.is_satisfied() {
                        prop_assert!(item.name.ends_with(COMPLETED_SUFFIX));
                        prop_assert_eq!(item.duration(), Duration::zero());
                    } else {
                        prop_assert_eq!(item.duration(), t.remaining_effort());
                        prop_assert!(item.end <= t.deadline.min(plan.horizon_end));
                        prop_assert!(item.start >= plan.horizon_start);
                        prop_assert!(
                            segments.iter().any(|s| s.start <= item.start && item.end <= s.end),
                            "{item:?} is not inside a single work-window segment"
                        );
                    }
                }
            }
            Err(err) => {
                prop_assert!(matches!(err, ScheduleError::Infeasible { .. }), "unexpected {err:?}");
            }
        }
    }

    #[test]
    fn generation_is_deterministic(snapshot in snapshot_strategy()) {
        let generator = ScheduleGenerator::new();
        let first = generator.generate(&snapshot, now());
        let second = generator.generate(&snapshot, now());
        match (first, second) {
            (Ok(a), Ok(b)) => {
                prop_assert_eq!(serde_json::to_string(&a).unwrap(), serde_json::to_string(&b).unwrap());
            }
            (Err(a), Err(b)) => prop_assert_eq!(a, b),
            (a, b) => prop_assert!(false, "diverged: {a:?} vs {b:?}"),
        }
    }

    #[test]
    fn ranking_ignores_input_order(
        (tasks, shuffled) in tasks_strategy().prop_flat_map(|tasks| {
            let shuffled = Just(tasks.clone()).prop_shuffle();
            (Just(tasks), shuffled)
        })
    ) {
        let ids = |tasks: &[Task]| {
            let ranking = rank(tasks, now());
            let pending: Vec<String> = ranking.pending.iter().map(|r| r.task.id.clone()).collect();
            let completed: Vec<String> = ranking.completed.iter().map(|t| t.id.clone()).collect();
            (pending, completed)
        };
        prop_assert_eq!(ids(&tasks), ids(&shuffled));
    }
}
