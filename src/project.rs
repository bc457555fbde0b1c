use crate::activity::Activity;
use crate::calculations::{self, CalendarSet, ScheduleError};
use crate::calendar::WorkCalendar;
use crate::graph::NetworkDag;
use crate::metadata::ProjectMetadata;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Headline numbers from one scheduling run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleSummary {
    pub activity_count: usize,
    pub critical_count: usize,
    pub project_finish: Option<NaiveDate>,
}

impl ScheduleSummary {
    pub fn to_cli_summary(&self) -> String {
        match self.project_finish {
            Some(finish) => format!(
                "{} activities, {} critical, finish {}",
                self.activity_count, self.critical_count, finish
            ),
            None => format!("{} activities, none scheduled", self.activity_count),
        }
    }
}

/// The activity network plus its calendars and metadata. The core takes an
/// explicit snapshot of everything it needs per call; there is no module or
/// global state anywhere.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    metadata: ProjectMetadata,
    calendars: Vec<WorkCalendar>,
    activities: Vec<Activity>,
}

impl Project {
    /// Empty project on a standard five-day default calendar.
    pub fn new() -> Self {
        Self::with_metadata(ProjectMetadata::default())
    }

    pub fn with_metadata(metadata: ProjectMetadata) -> Self {
        Self {
            metadata,
            calendars: vec![WorkCalendar::standard(1, "Standard").as_default()],
            activities: Vec::new(),
        }
    }

    pub fn from_parts(
        metadata: ProjectMetadata,
        calendars: Vec<WorkCalendar>,
        activities: Vec<Activity>,
    ) -> Self {
        Self {
            metadata,
            calendars,
            activities,
        }
    }

    pub fn metadata(&self) -> &ProjectMetadata {
        &self.metadata
    }

    pub fn set_metadata(&mut self, metadata: ProjectMetadata) {
        self.metadata = metadata;
    }

    pub fn calendars(&self) -> &[WorkCalendar] {
        &self.calendars
    }

    /// Insert or replace a calendar by id. Setting a new default clears the
    /// flag on every other calendar.
    pub fn upsert_calendar(&mut self, calendar: WorkCalendar) {
        if calendar.is_default {
            for existing in &mut self.calendars {
                existing.is_default = false;
            }
        }
        match self
            .calendars
            .iter_mut()
            .find(|existing| existing.id == calendar.id)
        {
            Some(existing) => *existing = calendar,
            None => self.calendars.push(calendar),
        }
    }

    pub fn activities(&self) -> &[Activity] {
        &self.activities
    }

    pub fn find_activity(&self, id: i32) -> Option<&Activity> {
        self.activities.iter().find(|activity| activity.id == id)
    }

    pub fn find_activity_mut(&mut self, id: i32) -> Option<&mut Activity> {
        self.activities
            .iter_mut()
            .find(|activity| activity.id == id)
    }

    /// Insert or replace an activity by id.
    pub fn upsert_activity(&mut self, activity: Activity) {
        match self
            .activities
            .iter_mut()
            .find(|existing| existing.id == activity.id)
        {
            Some(existing) => *existing = activity,
            None => self.activities.push(activity),
        }
    }

    pub fn remove_activity(&mut self, id: i32) -> bool {
        let before = self.activities.len();
        self.activities.retain(|activity| activity.id != id);
        self.activities.len() != before
    }

    /// Run the CPM scheduler over the current network, overwriting every
    /// scheduler-owned field. Fatal errors leave the computed fields cleared
    /// rather than half-written.
    pub fn schedule(&mut self) -> Result<ScheduleSummary, ScheduleError> {
        for activity in &mut self.activities {
            activity.reset_computed();
        }

        let dag = NetworkDag::build(&self.activities)?;
        let calendars = CalendarSet::new(&self.calendars)?;
        let durations: Vec<i64> = self
            .activities
            .iter()
            .map(|activity| activity.duration_days)
            .collect();
        let computed = calculations::compute_schedule(
            &self.activities,
            &dag,
            &calendars,
            &self.metadata,
            &durations,
        )?;

        let mut critical_count = 0;
        let mut project_finish: Option<NaiveDate> = None;
        for (activity, dates) in self.activities.iter_mut().zip(&computed) {
            activity.early_start = Some(dates.early_start);
            activity.early_finish = Some(dates.early_finish);
            activity.late_start = Some(dates.late_start);
            activity.late_finish = Some(dates.late_finish);
            activity.total_float_days = Some(dates.total_float_days);
            activity.is_critical = Some(dates.is_critical);
            if dates.is_critical {
                critical_count += 1;
            }
            project_finish = Some(match project_finish {
                Some(finish) => finish.max(dates.early_finish),
                None => dates.early_finish,
            });
        }

        Ok(ScheduleSummary {
            activity_count: self.activities.len(),
            critical_count,
            project_finish,
        })
    }
}

impl Default for Project {
    fn default() -> Self {
        Self::new()
    }
}

/// Compute a schedule for the given project. The scheduled network is the
/// project itself after a successful call.
pub fn schedule(project: &mut Project) -> Result<ScheduleSummary, ScheduleError> {
    project.schedule()
}
