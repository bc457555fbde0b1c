use chrono::{Duration, NaiveDate};
use risk_schedule::{
    Activity, CheckKind, Constraint, ConstraintKind, PredecessorLink, Project, ProjectMetadata,
    RelationKind, Severity, ThresholdConfig, WorkCalendar, run_checks,
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

fn config() -> ThresholdConfig {
    ThresholdConfig {
        long_lag_days: 10,
        large_margin_days: 1,
        long_duration_days: 20,
    }
}

fn kinds_for(findings: &[risk_schedule::Finding], activity_id: i32) -> Vec<CheckKind> {
    findings
        .iter()
        .filter(|finding| finding.activity_id == activity_id)
        .map(|finding| finding.kind)
        .collect()
}

#[test]
fn open_end_and_no_predecessor_are_flagged() {
    let mut project = continuous_project();
    project.upsert_activity(Activity::new(1, "Lonely", 3));
    project.schedule().unwrap();

    let findings = run_checks(&project, &config()).unwrap();
    let kinds = kinds_for(&findings, 1);
    assert!(kinds.contains(&CheckKind::OpenEnd));
    assert!(kinds.contains(&CheckKind::NoPredecessor));
}

#[test]
fn completed_activities_are_not_open_ends() {
    let mut project = continuous_project();
    let mut metadata = project.metadata().clone();
    metadata.status_date = day(5);
    project.set_metadata(metadata);

    let mut done = Activity::new(1, "Done", 3);
    done.percent_complete = 1.0;
    done.actual_start = Some(day(0));
    done.actual_finish = Some(day(3));
    project.upsert_activity(done);
    project.schedule().unwrap();

    let findings = run_checks(&project, &config()).unwrap();
    assert!(kinds_for(&findings, 1).is_empty());
}

#[test]
fn early_dates_behind_the_status_date_are_invalid() {
    let mut project = continuous_project();
    let mut metadata = project.metadata().clone();
    metadata.status_date = day(2);
    project.set_metadata(metadata);
    project.upsert_activity(Activity::new(1, "Late to start", 3));
    project.schedule().unwrap();

    let findings = run_checks(&project, &config()).unwrap();
    let invalid: Vec<_> = findings
        .iter()
        .filter(|finding| finding.kind == CheckKind::InvalidDates)
        .collect();
    assert_eq!(invalid.len(), 1);
    assert_eq!(invalid[0].severity, Severity::Error);
}

#[test]
fn non_standard_relation_and_negative_lag_are_separate_findings() {
    let mut project = continuous_project();
    project.upsert_activity(Activity::new(1, "A", 5));
    project.upsert_activity(Activity::new(2, "B", 3).with_predecessor(PredecessorLink::new(
        1,
        RelationKind::StartToStart,
        -2,
    )));
    project.schedule().unwrap();

    let findings = run_checks(&project, &config()).unwrap();
    let kinds = kinds_for(&findings, 2);
    let non_standard = kinds
        .iter()
        .position(|&kind| kind == CheckKind::NonStandardRelation)
        .unwrap();
    let negative = kinds
        .iter()
        .position(|&kind| kind == CheckKind::NegativeLag)
        .unwrap();
    assert!(non_standard < negative);
}

#[test]
fn negative_lag_scenario_moves_successor_and_is_flagged() {
    let mut project = continuous_project();
    project.upsert_activity(Activity::new(1, "A", 5));
    project.upsert_activity(Activity::new(2, "B", 3).with_predecessor(PredecessorLink::new(
        1,
        RelationKind::FinishToStart,
        -2,
    )));
    project.schedule().unwrap();

    assert_eq!(project.find_activity(2).unwrap().early_start, Some(day(3)));
    let findings = run_checks(&project, &config()).unwrap();
    assert!(kinds_for(&findings, 2).contains(&CheckKind::NegativeLag));
}

#[test]
fn long_lag_threshold_is_inclusive() {
    let mut project = continuous_project();
    project.upsert_activity(Activity::new(1, "A", 5));
    project.upsert_activity(Activity::new(2, "B", 3).with_predecessor(PredecessorLink::new(
        1,
        RelationKind::FinishToStart,
        10,
    )));
    project.upsert_activity(Activity::new(3, "C", 3).with_predecessor(PredecessorLink::new(
        1,
        RelationKind::FinishToStart,
        9,
    )));
    project.schedule().unwrap();

    let findings = run_checks(&project, &config()).unwrap();
    assert!(kinds_for(&findings, 2).contains(&CheckKind::LongLag));
    assert!(!kinds_for(&findings, 3).contains(&CheckKind::LongLag));
}

#[test]
fn long_duration_threshold_is_exclusive() {
    let mut project = continuous_project();
    project.upsert_activity(Activity::new(1, "Long", 40));
    project.upsert_activity(Activity::new(2, "Short", 15));
    project.schedule().unwrap();

    let findings = run_checks(&project, &config()).unwrap();
    assert!(kinds_for(&findings, 1).contains(&CheckKind::LongDuration));
    assert!(!kinds_for(&findings, 2).contains(&CheckKind::LongDuration));
}

#[test]
fn large_margin_flags_high_float() {
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
    project.schedule().unwrap();

    // T3 carries float 2 against a threshold of 1
    let findings = run_checks(&project, &config()).unwrap();
    assert!(kinds_for(&findings, 3).contains(&CheckKind::LargeMargin));
    assert!(!kinds_for(&findings, 2).contains(&CheckKind::LargeMargin));
}

#[test]
fn constraint_families_are_classified() {
    let mut project = continuous_project();
    project.upsert_activity(
        Activity::new(1, "Pinned", 3)
            .with_constraint(Constraint::new(ConstraintKind::MustStartOn, day(2))),
    );
    project.upsert_activity(
        Activity::new(2, "Capped", 3)
            .with_constraint(Constraint::new(ConstraintKind::FinishNoLaterThan, day(9))),
    );
    project.upsert_activity(
        Activity::new(3, "Floored", 3)
            .with_constraint(Constraint::new(ConstraintKind::StartNoEarlierThan, day(1))),
    );
    project.schedule().unwrap();

    let findings = run_checks(&project, &config()).unwrap();
    assert!(kinds_for(&findings, 1).contains(&CheckKind::MandatoryConstraint));
    assert!(kinds_for(&findings, 2).contains(&CheckKind::MandatoryConstraint));
    assert!(kinds_for(&findings, 3).contains(&CheckKind::FlexibleConstraint));
    assert!(!kinds_for(&findings, 3).contains(&CheckKind::MandatoryConstraint));
}

#[test]
fn manual_override_violating_logic_is_broken() {
    let mut project = continuous_project();
    project.upsert_activity(Activity::new(1, "A", 5));
    let mut pinned =
        Activity::new(2, "B", 3).with_predecessor(PredecessorLink::finish_to_start(1));
    pinned.is_manual = true;
    pinned.manual_start = Some(day(1));
    project.upsert_activity(pinned);
    project.schedule().unwrap();

    let findings = run_checks(&project, &config()).unwrap();
    let broken: Vec<_> = findings
        .iter()
        .filter(|finding| finding.kind == CheckKind::BrokenLogic)
        .collect();
    assert_eq!(broken.len(), 1);
    assert_eq!(broken[0].activity_id, 2);
    assert_eq!(broken[0].severity, Severity::Error);
}

#[test]
fn satisfied_logic_is_not_broken() {
    let mut project = continuous_project();
    project.upsert_activity(Activity::new(1, "A", 5));
    project.upsert_activity(
        Activity::new(2, "B", 3).with_predecessor(PredecessorLink::finish_to_start(1)),
    );
    project.schedule().unwrap();

    let findings = run_checks(&project, &config()).unwrap();
    assert!(
        findings
            .iter()
            .all(|finding| finding.kind != CheckKind::BrokenLogic)
    );
}

#[test]
fn progress_bookkeeping_rules() {
    let mut project = continuous_project();
    let mut metadata = project.metadata().clone();
    metadata.status_date = day(1);
    project.set_metadata(metadata);

    // Actual start recorded after the status date
    let mut eager = Activity::new(1, "Eager", 3);
    eager.percent_complete = 0.2;
    eager.actual_start = Some(day(4));
    project.upsert_activity(eager);

    // Progress without an actual start
    let mut ghost = Activity::new(2, "Ghost", 3);
    ghost.percent_complete = 0.5;
    project.upsert_activity(ghost);

    project.schedule().unwrap();
    let findings = run_checks(&project, &config()).unwrap();
    assert!(kinds_for(&findings, 1).contains(&CheckKind::ProgressPastStatusDate));
    assert!(kinds_for(&findings, 2).contains(&CheckKind::MissingActualStart));
    assert!(!kinds_for(&findings, 1).contains(&CheckKind::MissingActualStart));
}

#[test]
fn findings_are_ordered_by_topology_then_kind() {
    let mut project = continuous_project();
    project.upsert_activity(Activity::new(2, "Downstream", 40).with_predecessor(
        PredecessorLink::new(1, RelationKind::StartToStart, -1),
    ));
    project.upsert_activity(Activity::new(1, "Upstream", 3));
    project.schedule().unwrap();

    let findings = run_checks(&project, &config()).unwrap();

    // Upstream findings come first despite insertion order
    let first_of = |id: i32| findings.iter().position(|f| f.activity_id == id).unwrap();
    assert!(first_of(1) < first_of(2));

    // Within one activity, kinds follow the declared check order
    let kinds = kinds_for(&findings, 2);
    let mut sorted = kinds.clone();
    sorted.sort();
    assert_eq!(kinds, sorted);

    // Deterministic across runs
    let again = run_checks(&project, &config()).unwrap();
    assert_eq!(findings, again);
}
