use chrono::NaiveDate;
use risk_schedule::{
    Activity, Constraint, ConstraintKind, PredecessorLink, Project, ProjectMetadata, RelationKind,
    WorkCalendar, export_activities_to_csv, import_activities_from_csv, load_project_from_json,
    save_project_to_json,
};

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

fn sample_project() -> Project {
    let start = d(2025, 1, 6);
    let metadata = ProjectMetadata {
        project_name: "Plant refit".to_string(),
        project_description: "Outage window".to_string(),
        project_start_date: start,
        status_date: start,
        target_finish_date: None,
    };
    let mut project = Project::with_metadata(metadata);
    project.upsert_activity(Activity::new(1, "Demolition", 5));
    project.upsert_activity(
        Activity::new(2, "Rebuild", 8)
            .with_predecessor(PredecessorLink::new(1, RelationKind::FinishToStart, 2))
            .with_constraint(Constraint::new(
                ConstraintKind::StartNoEarlierThan,
                d(2025, 1, 20),
            )),
    );
    project.upsert_activity(
        Activity::milestone(3, "Handover")
            .with_predecessor(PredecessorLink::finish_to_start(2)),
    );
    project
}

#[test]
fn json_round_trip_preserves_the_project() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("project.json");

    let mut project = sample_project();
    project.schedule().unwrap();
    save_project_to_json(&project, &path).unwrap();

    let loaded = load_project_from_json(&path).unwrap();
    assert_eq!(loaded, project);
}

#[test]
fn json_load_rejects_invalid_data() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.json");

    let mut project = sample_project();
    // Dangling link makes the snapshot invalid
    project.upsert_activity(
        Activity::new(4, "Orphan", 1).with_predecessor(PredecessorLink::finish_to_start(99)),
    );
    std::fs::write(
        &path,
        serde_json::json!({
            "metadata": project.metadata(),
            "calendars": project.calendars(),
            "activities": project.activities(),
        })
        .to_string(),
    )
    .unwrap();

    assert!(load_project_from_json(&path).is_err());
}

#[test]
fn csv_round_trip_preserves_structure() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("activities.csv");

    let mut project = sample_project();
    project.schedule().unwrap();
    export_activities_to_csv(&project, &path).unwrap();

    let imported = import_activities_from_csv(
        &path,
        project.metadata().clone(),
        project.calendars().to_vec(),
    )
    .unwrap();

    assert_eq!(imported.activities().len(), project.activities().len());
    let rebuilt = imported.find_activity(2).unwrap();
    assert_eq!(rebuilt.duration_days, 8);
    assert_eq!(
        rebuilt.predecessors,
        vec![PredecessorLink::new(1, RelationKind::FinishToStart, 2)]
    );
    assert_eq!(
        rebuilt.constraint,
        Some(Constraint::new(
            ConstraintKind::StartNoEarlierThan,
            d(2025, 1, 20)
        ))
    );
    // Computed columns are scheduler-owned and ignored on import
    assert!(rebuilt.early_start.is_none());
}

#[cfg(feature = "sqlite")]
mod sqlite {
    use super::*;
    use risk_schedule::{ProjectStore, SqliteProjectStore};

    #[test]
    fn sqlite_store_round_trips_the_project() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("project.db");

        let mut project = sample_project();
        project.schedule().unwrap();

        let store = SqliteProjectStore::new(&path).unwrap();
        store.save_project(&project).unwrap();

        let loaded = store.load_project().unwrap().expect("project stored");
        assert_eq!(loaded, project);
    }

    #[test]
    fn empty_store_loads_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.db");
        let store = SqliteProjectStore::new(&path).unwrap();
        assert!(store.load_project().unwrap().is_none());
    }

    #[test]
    fn save_overwrites_previous_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("project.db");
        let store = SqliteProjectStore::new(&path).unwrap();

        let mut project = sample_project();
        store.save_project(&project).unwrap();

        project.remove_activity(3);
        store.save_project(&project).unwrap();

        let loaded = store.load_project().unwrap().expect("project stored");
        assert_eq!(loaded.activities().len(), 2);
        assert!(loaded.find_activity(3).is_none());
    }
}
