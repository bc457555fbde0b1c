use crate::activity::{Activity, RelationKind};
use crate::calculations::{CalendarSet, ScheduleError};
use crate::graph::NetworkDag;
use crate::project::Project;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Findings tolerate this much drift before a dependency counts as violated;
/// matches the mixed-calendar rounding the scheduler itself absorbs.
const BROKEN_LOGIC_TOLERANCE_DAYS: i64 = 1;

/// The closed set of schedule-quality checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckKind {
    OpenEnd,
    NoPredecessor,
    InvalidDates,
    NonStandardRelation,
    NegativeLag,
    LongLag,
    LongDuration,
    LargeMargin,
    MandatoryConstraint,
    FlexibleConstraint,
    BrokenLogic,
    ProgressPastStatusDate,
    MissingActualStart,
}

impl CheckKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CheckKind::OpenEnd => "open_end",
            CheckKind::NoPredecessor => "no_predecessor",
            CheckKind::InvalidDates => "invalid_dates",
            CheckKind::NonStandardRelation => "non_standard_relation",
            CheckKind::NegativeLag => "negative_lag",
            CheckKind::LongLag => "long_lag",
            CheckKind::LongDuration => "long_duration",
            CheckKind::LargeMargin => "large_margin",
            CheckKind::MandatoryConstraint => "mandatory_constraint",
            CheckKind::FlexibleConstraint => "flexible_constraint",
            CheckKind::BrokenLogic => "broken_logic",
            CheckKind::ProgressPastStatusDate => "progress_past_status_date",
            CheckKind::MissingActualStart => "missing_actual_start",
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            CheckKind::InvalidDates | CheckKind::BrokenLogic => Severity::Error,
            CheckKind::OpenEnd
            | CheckKind::NoPredecessor
            | CheckKind::NegativeLag
            | CheckKind::MandatoryConstraint
            | CheckKind::ProgressPastStatusDate
            | CheckKind::MissingActualStart => Severity::Warning,
            CheckKind::NonStandardRelation
            | CheckKind::LongLag
            | CheckKind::LongDuration
            | CheckKind::LargeMargin
            | CheckKind::FlexibleConstraint => Severity::Info,
        }
    }
}

impl FromStr for CheckKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "open_end" => Ok(CheckKind::OpenEnd),
            "no_predecessor" => Ok(CheckKind::NoPredecessor),
            "invalid_dates" => Ok(CheckKind::InvalidDates),
            "non_standard_relation" => Ok(CheckKind::NonStandardRelation),
            "negative_lag" => Ok(CheckKind::NegativeLag),
            "long_lag" => Ok(CheckKind::LongLag),
            "long_duration" => Ok(CheckKind::LongDuration),
            "large_margin" => Ok(CheckKind::LargeMargin),
            "mandatory_constraint" => Ok(CheckKind::MandatoryConstraint),
            "flexible_constraint" => Ok(CheckKind::FlexibleConstraint),
            "broken_logic" => Ok(CheckKind::BrokenLogic),
            "progress_past_status_date" => Ok(CheckKind::ProgressPastStatusDate),
            "missing_actual_start" => Ok(CheckKind::MissingActualStart),
            other => Err(format!("unknown check kind '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Error,
    Warning,
    Info,
}

/// One diagnostic. Findings are data, never errors; a run recomputes the
/// full list every time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    pub activity_id: i32,
    pub kind: CheckKind,
    pub severity: Severity,
    pub message: String,
}

impl Finding {
    fn new(activity: &Activity, kind: CheckKind, message: String) -> Self {
        Self {
            activity_id: activity.id,
            kind,
            severity: kind.severity(),
            message,
        }
    }
}

/// User-supplied thresholds. No defaulting logic lives in the core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThresholdConfig {
    pub long_lag_days: i64,
    pub large_margin_days: i64,
    pub long_duration_days: i64,
}

/// Run every check over every activity of a scheduled network. Findings come
/// back ordered by topological position, then by check kind.
pub fn run_checks(
    project: &Project,
    config: &ThresholdConfig,
) -> Result<Vec<Finding>, ScheduleError> {
    let activities = project.activities();
    let dag = NetworkDag::build(activities)?;
    let calendars = CalendarSet::new(project.calendars())?;
    let status_date = project.metadata().status_date;

    let mut findings = Vec::new();
    for &idx in dag.topo_order() {
        let activity = &activities[idx];
        let node = dag
            .node_of(activity.id)
            .expect("activity indexed during dag build");

        // 1. Open-ended network.
        if dag.successor_count(node) == 0 && !activity.is_complete() {
            findings.push(Finding::new(
                activity,
                CheckKind::OpenEnd,
                format!("activity {} has no successor", activity.id),
            ));
        }

        // 2. No predecessor.
        if activity.predecessors.is_empty() && !activity.is_complete() {
            findings.push(Finding::new(
                activity,
                CheckKind::NoPredecessor,
                format!("activity {} has no predecessor", activity.id),
            ));
        }

        // 3. Early dates behind the status date.
        if !activity.is_complete() {
            let stale = activity
                .early_start
                .filter(|date| *date < status_date)
                .map(|date| ("early start", date))
                .or_else(|| {
                    activity
                        .early_finish
                        .filter(|date| *date < status_date)
                        .map(|date| ("early finish", date))
                });
            if let Some((field, date)) = stale {
                findings.push(Finding::new(
                    activity,
                    CheckKind::InvalidDates,
                    format!("{field} {date} precedes status date {status_date}"),
                ));
            }
        }

        // 4. Non-standard relation.
        for link in &activity.predecessors {
            if link.relation != RelationKind::FinishToStart {
                findings.push(Finding::new(
                    activity,
                    CheckKind::NonStandardRelation,
                    format!(
                        "{} relation to predecessor {}",
                        link.relation.as_str(),
                        link.predecessor_id
                    ),
                ));
            }
        }

        // 5. Negative lag.
        for link in &activity.predecessors {
            if link.lag_days < 0 {
                findings.push(Finding::new(
                    activity,
                    CheckKind::NegativeLag,
                    format!(
                        "lag {} on link to predecessor {}",
                        link.lag_days, link.predecessor_id
                    ),
                ));
            }
        }

        // 6. Long lag.
        for link in &activity.predecessors {
            if link.lag_days >= config.long_lag_days {
                findings.push(Finding::new(
                    activity,
                    CheckKind::LongLag,
                    format!(
                        "lag {} on link to predecessor {} reaches threshold {}",
                        link.lag_days, link.predecessor_id, config.long_lag_days
                    ),
                ));
            }
        }

        // 7. Long duration.
        if activity.duration_days > config.long_duration_days {
            findings.push(Finding::new(
                activity,
                CheckKind::LongDuration,
                format!(
                    "duration {} exceeds threshold {}",
                    activity.duration_days, config.long_duration_days
                ),
            ));
        }

        // 8. Large margin.
        if let Some(total_float) = activity.total_float_days {
            if total_float > config.large_margin_days {
                findings.push(Finding::new(
                    activity,
                    CheckKind::LargeMargin,
                    format!(
                        "total float {} exceeds threshold {}",
                        total_float, config.large_margin_days
                    ),
                ));
            }
        }

        // 9/10. Constraint presence.
        if let Some(constraint) = activity.constraint {
            if constraint.kind.is_mandatory() {
                findings.push(Finding::new(
                    activity,
                    CheckKind::MandatoryConstraint,
                    format!("{} constraint on {}", constraint.kind.as_str(), constraint.date),
                ));
            }
            if constraint.kind.is_flexible() {
                findings.push(Finding::new(
                    activity,
                    CheckKind::FlexibleConstraint,
                    format!("{} constraint on {}", constraint.kind.as_str(), constraint.date),
                ));
            }
        }

        // 11. Broken logic: the computed early date contradicts a
        // predecessor link by more than the rounding tolerance. Reachable
        // only under manual-scheduling overrides.
        if let Some(broken) = broken_logic_finding(activity, activities, &calendars)? {
            findings.push(broken);
        }

        // 12. Progress recorded past the status date.
        if let Some(actual_start) = activity.actual_start {
            if actual_start > status_date {
                findings.push(Finding::new(
                    activity,
                    CheckKind::ProgressPastStatusDate,
                    format!("actual start {actual_start} is after status date {status_date}"),
                ));
            }
        }

        // 13. Progress without a recorded actual start.
        if activity.percent_complete > 0.0 && activity.actual_start.is_none() {
            findings.push(Finding::new(
                activity,
                CheckKind::MissingActualStart,
                format!(
                    "percent complete {:.0}% but no actual start recorded",
                    activity.percent_complete * 100.0
                ),
            ));
        }
    }

    Ok(findings)
}

fn broken_logic_finding(
    activity: &Activity,
    activities: &[Activity],
    calendars: &CalendarSet<'_>,
) -> Result<Option<Finding>, ScheduleError> {
    // Activities with recorded actuals legitimately sit wherever the field
    // put them; only scheduling overrides count as broken logic.
    if activity.actual_start.is_some() {
        return Ok(None);
    }
    let (Some(early_start), Some(early_finish)) = (activity.early_start, activity.early_finish)
    else {
        return Ok(None);
    };
    let calendar = calendars.for_activity(activity)?;

    for link in &activity.predecessors {
        let Some(predecessor) = activities
            .iter()
            .find(|candidate| candidate.id == link.predecessor_id)
        else {
            continue;
        };
        let (Some(pred_start), Some(pred_finish)) =
            (predecessor.early_start, predecessor.early_finish)
        else {
            continue;
        };

        // Same candidate arithmetic as the forward pass.
        let (actual, required) = match link.relation {
            RelationKind::FinishToStart => (
                early_start,
                calendar.add_work_days(pred_finish, link.lag_days)?,
            ),
            RelationKind::StartToStart => (
                early_start,
                calendar.add_work_days(pred_start, link.lag_days)?,
            ),
            RelationKind::FinishToFinish => (
                early_finish,
                calendar.add_work_days(pred_finish, link.lag_days)?,
            ),
            RelationKind::StartToFinish => (
                early_finish,
                calendar.add_work_days(pred_start, link.lag_days)?,
            ),
        };

        if calendar.work_days_between(actual, required) > BROKEN_LOGIC_TOLERANCE_DAYS {
            return Ok(Some(Finding::new(
                activity,
                CheckKind::BrokenLogic,
                format!(
                    "{} link to predecessor {} requires {} but schedule shows {}",
                    link.relation.as_str(),
                    link.predecessor_id,
                    required,
                    actual
                ),
            )));
        }
    }
    Ok(None)
}
