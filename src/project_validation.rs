use crate::activity::{Activity, ActivityKind};
use crate::project::Project;
use std::collections::HashSet;
use std::fmt;

#[derive(Debug, Clone)]
pub struct ProjectValidationError {
    message: String,
}

impl ProjectValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for ProjectValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ProjectValidationError {}

pub fn validate_activity(activity: &Activity) -> Result<(), ProjectValidationError> {
    if activity.duration_days < 0 {
        return Err(ProjectValidationError::new(format!(
            "activity {} has negative duration {}",
            activity.id, activity.duration_days
        )));
    }

    if activity.kind == ActivityKind::Milestone && activity.duration_days != 0 {
        return Err(ProjectValidationError::new(format!(
            "milestone {} must have duration 0 (got {})",
            activity.id, activity.duration_days
        )));
    }

    if !activity.percent_complete.is_finite()
        || activity.percent_complete < 0.0
        || activity.percent_complete > 1.0
    {
        return Err(ProjectValidationError::new(format!(
            "activity {} has invalid percent_complete {} (must be between 0 and 1)",
            activity.id, activity.percent_complete
        )));
    }

    if let Some(remaining) = activity.remaining_duration_days {
        if remaining < 0 {
            return Err(ProjectValidationError::new(format!(
                "activity {} has negative remaining duration {}",
                activity.id, remaining
            )));
        }
        if remaining > activity.duration_days {
            return Err(ProjectValidationError::new(format!(
                "activity {} remaining duration {} exceeds duration {}",
                activity.id, remaining, activity.duration_days
            )));
        }
    }

    let mut seen_predecessors = HashSet::with_capacity(activity.predecessors.len());
    for link in &activity.predecessors {
        if link.predecessor_id == activity.id {
            return Err(ProjectValidationError::new(format!(
                "activity {} lists itself as a predecessor",
                activity.id
            )));
        }
        if !seen_predecessors.insert((link.predecessor_id, link.relation)) {
            return Err(ProjectValidationError::new(format!(
                "activity {} has duplicate {} link to predecessor {}",
                activity.id,
                link.relation.as_str(),
                link.predecessor_id
            )));
        }
    }

    Ok(())
}

pub fn validate_project(project: &Project) -> Result<(), ProjectValidationError> {
    let mut activity_ids = HashSet::with_capacity(project.activities().len());
    for activity in project.activities() {
        if !activity_ids.insert(activity.id) {
            return Err(ProjectValidationError::new(format!(
                "duplicate activity id {}",
                activity.id
            )));
        }
        validate_activity(activity)?;
    }

    for activity in project.activities() {
        for link in &activity.predecessors {
            if !activity_ids.contains(&link.predecessor_id) {
                return Err(ProjectValidationError::new(format!(
                    "activity {} links to unknown predecessor {}",
                    activity.id, link.predecessor_id
                )));
            }
        }
    }

    let mut calendar_ids = HashSet::with_capacity(project.calendars().len());
    let mut default_count = 0;
    for calendar in project.calendars() {
        if !calendar_ids.insert(calendar.id) {
            return Err(ProjectValidationError::new(format!(
                "duplicate calendar id {}",
                calendar.id
            )));
        }
        if calendar.is_default {
            default_count += 1;
        }
        calendar
            .validate()
            .map_err(|err| ProjectValidationError::new(err.to_string()))?;
    }
    if default_count != 1 {
        return Err(ProjectValidationError::new(format!(
            "project must have exactly one default calendar (got {default_count})"
        )));
    }

    for activity in project.activities() {
        if let Some(calendar_id) = activity.calendar_id {
            if !calendar_ids.contains(&calendar_id) {
                return Err(ProjectValidationError::new(format!(
                    "activity {} references unknown calendar {}",
                    activity.id, calendar_id
                )));
            }
        }
    }

    Ok(())
}
