use crate::activity::Activity;
use crate::calendar::{CalendarError, WorkCalendar};
use chrono::NaiveDate;
use std::collections::HashMap;
use std::fmt;

pub mod backward_pass;
pub mod forward_pass;

pub use backward_pass::BackwardPass;
pub use forward_pass::ForwardPass;

/// Scheduler-fatal failures. None of these produce partial output: a failed
/// schedule call leaves no plausible-looking dates behind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScheduleError {
    /// The predecessor graph contains a cycle; `activity_id` lies on it.
    CircularDependency { activity_id: i32 },
    /// A link references an activity id that does not exist in the network.
    DanglingPredecessor {
        activity_id: i32,
        predecessor_id: i32,
    },
    InvalidCalendar(CalendarError),
    /// An activity references a calendar id the project does not define.
    UnknownCalendar {
        activity_id: i32,
        calendar_id: i32,
    },
    /// No calendar in the project carries the default flag.
    NoDefaultCalendar,
}

impl fmt::Display for ScheduleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScheduleError::CircularDependency { activity_id } => {
                write!(f, "circular dependency through activity {activity_id}")
            }
            ScheduleError::DanglingPredecessor {
                activity_id,
                predecessor_id,
            } => write!(
                f,
                "activity {activity_id} links to unknown predecessor {predecessor_id}"
            ),
            ScheduleError::InvalidCalendar(err) => write!(f, "invalid calendar: {err}"),
            ScheduleError::UnknownCalendar {
                activity_id,
                calendar_id,
            } => write!(
                f,
                "activity {activity_id} references unknown calendar {calendar_id}"
            ),
            ScheduleError::NoDefaultCalendar => {
                write!(f, "project defines no default calendar")
            }
        }
    }
}

impl std::error::Error for ScheduleError {}

impl From<CalendarError> for ScheduleError {
    fn from(value: CalendarError) -> Self {
        ScheduleError::InvalidCalendar(value)
    }
}

/// Resolves activities to their calendars for the duration of one run.
pub struct CalendarSet<'a> {
    by_id: HashMap<i32, &'a WorkCalendar>,
    default: &'a WorkCalendar,
}

impl<'a> CalendarSet<'a> {
    pub fn new(calendars: &'a [WorkCalendar]) -> Result<Self, ScheduleError> {
        for calendar in calendars {
            calendar.validate()?;
        }
        let default = calendars
            .iter()
            .find(|calendar| calendar.is_default)
            .ok_or(ScheduleError::NoDefaultCalendar)?;
        let by_id = calendars
            .iter()
            .map(|calendar| (calendar.id, calendar))
            .collect();
        Ok(Self { by_id, default })
    }

    pub fn for_activity(&self, activity: &Activity) -> Result<&'a WorkCalendar, ScheduleError> {
        match activity.calendar_id {
            None => Ok(self.default),
            Some(calendar_id) => {
                self.by_id
                    .get(&calendar_id)
                    .copied()
                    .ok_or(ScheduleError::UnknownCalendar {
                        activity_id: activity.id,
                        calendar_id,
                    })
            }
        }
    }

    pub fn default_calendar(&self) -> &'a WorkCalendar {
        self.default
    }
}

/// One activity's scheduler-owned dates for a single run, keyed by arena
/// index alongside the activity slice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ComputedDates {
    pub early_start: NaiveDate,
    pub early_finish: NaiveDate,
    pub late_start: NaiveDate,
    pub late_finish: NaiveDate,
    pub total_float_days: i64,
    pub is_critical: bool,
}

/// Critical-flag tolerance: exact on a single-calendar network, one day when
/// mixed calendars share the network (absorbs rounding across calendars on
/// one path).
pub fn float_tolerance_days(
    activities: &[Activity],
    calendars: &CalendarSet<'_>,
) -> Result<i64, ScheduleError> {
    let mut seen: Option<i32> = None;
    for activity in activities {
        let calendar = calendars.for_activity(activity)?;
        match seen {
            None => seen = Some(calendar.id),
            Some(id) if id != calendar.id => return Ok(1),
            Some(_) => {}
        }
    }
    Ok(0)
}

/// Run both passes over a prepared network and fold in float and critical
/// flags. `durations` holds the duration to schedule with per arena index;
/// the risk engine substitutes sampled values here without touching the
/// activities themselves.
pub fn compute_schedule(
    activities: &[Activity],
    dag: &crate::graph::NetworkDag,
    calendars: &CalendarSet<'_>,
    metadata: &crate::metadata::ProjectMetadata,
    durations: &[i64],
) -> Result<Vec<ComputedDates>, ScheduleError> {
    let early = ForwardPass::new(activities, dag, calendars, metadata, durations).execute()?;
    let late = BackwardPass::new(activities, dag, calendars, metadata, durations, &early)
        .execute()?;
    let tolerance = float_tolerance_days(activities, calendars)?;

    let mut computed = Vec::with_capacity(activities.len());
    for (idx, activity) in activities.iter().enumerate() {
        let calendar = calendars.for_activity(activity)?;
        let (early_start, early_finish) = early[idx];
        let (late_start, late_finish) = late[idx];
        let total_float_days = calendar.work_days_between(early_start, late_start);
        computed.push(ComputedDates {
            early_start,
            early_finish,
            late_start,
            late_finish,
            total_float_days,
            is_critical: total_float_days <= tolerance,
        });
    }
    Ok(computed)
}
