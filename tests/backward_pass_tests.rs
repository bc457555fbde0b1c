use chrono::{Duration, NaiveDate};
use risk_schedule::{
    Activity, Constraint, ConstraintKind, PredecessorLink, Project, ProjectMetadata, WorkCalendar,
};

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

fn day(n: i64) -> NaiveDate {
    d(2025, 1, 6) + Duration::days(n)
}

fn continuous_project() -> Project {
    let start = day(0);
    let metadata = ProjectMetadata {
        project_start_date: start,
        status_date: start,
        ..ProjectMetadata::default()
    };
    let mut project = Project::with_metadata(metadata);
    project.upsert_calendar(WorkCalendar::continuous(1, "Continuous").as_default());
    project
}

/// 1 -> {2, 3} -> 4 with durations 2, 3, 1, 2. Activity 3 has slack.
fn diamond() -> Project {
    let mut project = continuous_project();
    project.upsert_activity(Activity::new(1, "T1", 2));
    project.upsert_activity(
        Activity::new(2, "T2", 3).with_predecessor(PredecessorLink::finish_to_start(1)),
    );
    project.upsert_activity(
        Activity::new(3, "T3", 1).with_predecessor(PredecessorLink::finish_to_start(1)),
    );
    project.upsert_activity(
        Activity::new(4, "T4", 2)
            .with_predecessor(PredecessorLink::finish_to_start(2))
            .with_predecessor(PredecessorLink::finish_to_start(3)),
    );
    project
}

#[test]
fn backward_pass_sets_late_dates_and_floats() {
    let mut project = diamond();
    project.schedule().unwrap();

    let a4 = project.find_activity(4).unwrap();
    assert_eq!(a4.late_start, Some(day(5)));
    assert_eq!(a4.late_finish, Some(day(7)));
    assert_eq!(a4.total_float_days, Some(0));
    assert_eq!(a4.is_critical, Some(true));

    let a2 = project.find_activity(2).unwrap();
    assert_eq!(a2.late_start, Some(day(2)));
    assert_eq!(a2.late_finish, Some(day(5)));
    assert_eq!(a2.is_critical, Some(true));

    let a3 = project.find_activity(3).unwrap();
    assert_eq!(a3.late_start, Some(day(4)));
    assert_eq!(a3.total_float_days, Some(2));
    assert_eq!(a3.is_critical, Some(false));

    let a1 = project.find_activity(1).unwrap();
    assert_eq!(a1.total_float_days, Some(0));
    assert_eq!(a1.is_critical, Some(true));
}

#[test]
fn total_float_equals_late_start_minus_early_start() {
    let mut project = diamond();
    project.schedule().unwrap();

    for activity in project.activities() {
        let early_start = activity.early_start.unwrap();
        let late_start = activity.late_start.unwrap();
        // Continuous calendar: work days == calendar days
        assert_eq!(
            activity.total_float_days.unwrap(),
            (late_start - early_start).num_days()
        );
    }
}

#[test]
fn target_finish_date_extends_every_float() {
    let mut project = diamond();
    let mut metadata = project.metadata().clone();
    metadata.target_finish_date = Some(day(9));
    project.set_metadata(metadata);

    let summary = project.schedule().unwrap();

    assert_eq!(project.find_activity(4).unwrap().total_float_days, Some(2));
    assert_eq!(project.find_activity(3).unwrap().total_float_days, Some(4));
    assert_eq!(summary.critical_count, 0);
}

#[test]
fn start_no_later_than_can_drive_float_negative() {
    let mut project = continuous_project();
    project.upsert_activity(Activity::new(1, "A", 5));
    project.upsert_activity(
        Activity::new(2, "B", 3)
            .with_predecessor(PredecessorLink::finish_to_start(1))
            .with_constraint(Constraint::new(ConstraintKind::StartNoLaterThan, day(2))),
    );

    project.schedule().unwrap();

    let b = project.find_activity(2).unwrap();
    assert_eq!(b.late_start, Some(day(2)));
    assert_eq!(b.total_float_days, Some(-3));
    assert_eq!(b.is_critical, Some(true));
}

#[test]
fn finish_no_later_than_clamps_the_late_finish() {
    let mut project = continuous_project();
    project.upsert_activity(Activity::new(1, "A", 5));
    project.upsert_activity(
        Activity::new(2, "B", 3)
            .with_predecessor(PredecessorLink::finish_to_start(1))
            .with_constraint(Constraint::new(ConstraintKind::FinishNoLaterThan, day(6))),
    );

    project.schedule().unwrap();

    let b = project.find_activity(2).unwrap();
    assert_eq!(b.late_finish, Some(day(6)));
    assert_eq!(b.total_float_days, Some(-2));
}

#[test]
fn critical_chain_late_dates_match_early_dates() {
    let mut project = continuous_project();
    project.upsert_activity(Activity::new(1, "A", 4));
    project.upsert_activity(
        Activity::new(2, "B", 6).with_predecessor(PredecessorLink::finish_to_start(1)),
    );

    project.schedule().unwrap();

    for activity in project.activities() {
        assert_eq!(activity.early_start, activity.late_start);
        assert_eq!(activity.early_finish, activity.late_finish);
    }
}

#[test]
fn cycle_returns_circular_dependency_and_no_partial_dates() {
    let mut project = continuous_project();
    project.upsert_activity(
        Activity::new(1, "A", 2).with_predecessor(PredecessorLink::finish_to_start(2)),
    );
    project.upsert_activity(
        Activity::new(2, "B", 2).with_predecessor(PredecessorLink::finish_to_start(1)),
    );

    let err = project.schedule().unwrap_err();
    assert!(matches!(
        err,
        risk_schedule::ScheduleError::CircularDependency { .. }
    ));
    // No plausible-looking dates left behind
    for activity in project.activities() {
        assert!(activity.early_start.is_none());
        assert!(activity.late_finish.is_none());
    }
}
