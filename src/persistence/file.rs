use super::{PersistenceError, PersistenceResult};
use crate::activity::{Activity, ActivityKind, Constraint, ConstraintKind, PredecessorLink};
use crate::calendar::WorkCalendar;
use crate::metadata::ProjectMetadata;
use crate::project::Project;
use crate::risk::ActivityDistribution;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::path::Path;
use std::str::FromStr;

/// On-disk JSON shape of a whole project, including the distributions a
/// caller may want to re-run simulations with.
#[derive(Serialize, Deserialize)]
struct ProjectSnapshot {
    metadata: ProjectMetadata,
    calendars: Vec<WorkCalendar>,
    activities: Vec<Activity>,
    #[serde(default)]
    distributions: Vec<ActivityDistribution>,
}

pub fn save_project_to_json<P: AsRef<Path>>(project: &Project, path: P) -> PersistenceResult<()> {
    super::validate_project(project)?;
    let snapshot = ProjectSnapshot {
        metadata: project.metadata().clone(),
        calendars: project.calendars().to_vec(),
        activities: project.activities().to_vec(),
        distributions: Vec::new(),
    };
    let file = File::create(path)?;
    serde_json::to_writer_pretty(file, &snapshot)?;
    Ok(())
}

pub fn load_project_from_json<P: AsRef<Path>>(path: P) -> PersistenceResult<Project> {
    let file = File::open(path)?;
    let snapshot: ProjectSnapshot = serde_json::from_reader(file)?;
    let project = Project::from_parts(snapshot.metadata, snapshot.calendars, snapshot.activities);
    super::validate_project(&project)?;
    Ok(project)
}

#[derive(Default, Serialize, Deserialize)]
struct ActivityCsvRecord {
    id: i32,
    name: String,
    kind: String,
    duration_days: i64,
    /// Semicolon-joined `pred:REL:lag` triples.
    predecessors: String,
    calendar_id: Option<i32>,
    percent_complete: f64,
    constraint: String,
    is_manual: bool,
    manual_start: Option<NaiveDate>,
    actual_start: Option<NaiveDate>,
    actual_finish: Option<NaiveDate>,
    early_start: Option<NaiveDate>,
    early_finish: Option<NaiveDate>,
    late_start: Option<NaiveDate>,
    late_finish: Option<NaiveDate>,
    total_float_days: Option<i64>,
    is_critical: Option<bool>,
}

fn encode_links(links: &[PredecessorLink]) -> String {
    links
        .iter()
        .map(|link| {
            format!(
                "{}:{}:{}",
                link.predecessor_id,
                link.relation.as_str(),
                link.lag_days
            )
        })
        .collect::<Vec<_>>()
        .join(";")
}

fn decode_links(encoded: &str) -> PersistenceResult<Vec<PredecessorLink>> {
    if encoded.trim().is_empty() {
        return Ok(Vec::new());
    }
    encoded
        .split(';')
        .map(|part| {
            let fields: Vec<&str> = part.split(':').collect();
            if fields.len() != 3 {
                return Err(PersistenceError::InvalidData(format!(
                    "malformed predecessor '{part}'"
                )));
            }
            let predecessor_id = fields[0]
                .trim()
                .parse()
                .map_err(|_| PersistenceError::InvalidData(format!("bad id in '{part}'")))?;
            let relation = FromStr::from_str(fields[1].trim())
                .map_err(PersistenceError::InvalidData)?;
            let lag_days = fields[2]
                .trim()
                .parse()
                .map_err(|_| PersistenceError::InvalidData(format!("bad lag in '{part}'")))?;
            Ok(PredecessorLink {
                predecessor_id,
                relation,
                lag_days,
            })
        })
        .collect()
}

fn encode_constraint(constraint: &Option<Constraint>) -> String {
    match constraint {
        None => String::new(),
        Some(constraint) => format!("{}@{}", constraint.kind.as_str(), constraint.date),
    }
}

fn decode_constraint(encoded: &str) -> PersistenceResult<Option<Constraint>> {
    if encoded.trim().is_empty() {
        return Ok(None);
    }
    let (kind, date) = encoded.split_once('@').ok_or_else(|| {
        PersistenceError::InvalidData(format!("malformed constraint '{encoded}'"))
    })?;
    let kind = ConstraintKind::from_str(kind.trim()).map_err(PersistenceError::InvalidData)?;
    let date = date
        .trim()
        .parse()
        .map_err(|_| PersistenceError::InvalidData(format!("bad constraint date '{encoded}'")))?;
    Ok(Some(Constraint { kind, date }))
}

/// Write the activity table (including computed dates) to CSV.
pub fn export_activities_to_csv<P: AsRef<Path>>(
    project: &Project,
    path: P,
) -> PersistenceResult<()> {
    super::validate_project(project)?;
    let mut writer = csv::Writer::from_path(path)?;
    for activity in project.activities() {
        writer.serialize(ActivityCsvRecord {
            id: activity.id,
            name: activity.name.clone(),
            kind: activity.kind.as_str().to_string(),
            duration_days: activity.duration_days,
            predecessors: encode_links(&activity.predecessors),
            calendar_id: activity.calendar_id,
            percent_complete: activity.percent_complete,
            constraint: encode_constraint(&activity.constraint),
            is_manual: activity.is_manual,
            manual_start: activity.manual_start,
            actual_start: activity.actual_start,
            actual_finish: activity.actual_finish,
            early_start: activity.early_start,
            early_finish: activity.early_finish,
            late_start: activity.late_start,
            late_finish: activity.late_finish,
            total_float_days: activity.total_float_days,
            is_critical: activity.is_critical,
        })?;
    }
    writer.flush()?;
    Ok(())
}

/// Read activities from CSV into a fresh project carrying the given
/// metadata and calendars. Computed columns are ignored; the scheduler owns
/// them.
pub fn import_activities_from_csv<P: AsRef<Path>>(
    path: P,
    metadata: ProjectMetadata,
    calendars: Vec<WorkCalendar>,
) -> PersistenceResult<Project> {
    let mut reader = csv::Reader::from_path(path)?;
    let mut activities = Vec::new();
    for record in reader.deserialize() {
        let record: ActivityCsvRecord = record?;
        let kind = ActivityKind::from_str(&record.kind).map_err(PersistenceError::InvalidData)?;
        let mut activity = Activity::new(record.id, record.name, record.duration_days);
        activity.kind = kind;
        activity.predecessors = decode_links(&record.predecessors)?;
        activity.calendar_id = record.calendar_id;
        activity.percent_complete = record.percent_complete;
        activity.constraint = decode_constraint(&record.constraint)?;
        activity.is_manual = record.is_manual;
        activity.manual_start = record.manual_start;
        activity.actual_start = record.actual_start;
        activity.actual_finish = record.actual_finish;
        activities.push(activity);
    }
    let project = Project::from_parts(metadata, calendars, activities);
    super::validate_project(&project)?;
    Ok(project)
}
