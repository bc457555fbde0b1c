use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// What kind of schedulable unit an activity is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    #[default]
    Task,
    Milestone,
    Summary,
}

impl ActivityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityKind::Task => "task",
            ActivityKind::Milestone => "milestone",
            ActivityKind::Summary => "summary",
        }
    }
}

impl FromStr for ActivityKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "task" => Ok(ActivityKind::Task),
            "milestone" => Ok(ActivityKind::Milestone),
            "summary" => Ok(ActivityKind::Summary),
            other => Err(format!("unknown activity kind '{other}'")),
        }
    }
}

/// Relation kind of a predecessor link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RelationKind {
    #[default]
    FinishToStart,
    StartToStart,
    FinishToFinish,
    StartToFinish,
}

impl RelationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RelationKind::FinishToStart => "FS",
            RelationKind::StartToStart => "SS",
            RelationKind::FinishToFinish => "FF",
            RelationKind::StartToFinish => "SF",
        }
    }
}

impl FromStr for RelationKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "FS" => Ok(RelationKind::FinishToStart),
            "SS" => Ok(RelationKind::StartToStart),
            "FF" => Ok(RelationKind::FinishToFinish),
            "SF" => Ok(RelationKind::StartToFinish),
            other => Err(format!("unknown relation kind '{other}'")),
        }
    }
}

/// Edge in the activity network. Lag is a signed work-day offset evaluated
/// under the successor's calendar; negative lag is permitted and flagged by
/// the checker rather than rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredecessorLink {
    pub predecessor_id: i32,
    #[serde(default)]
    pub relation: RelationKind,
    #[serde(default)]
    pub lag_days: i64,
}

impl PredecessorLink {
    pub fn finish_to_start(predecessor_id: i32) -> Self {
        Self {
            predecessor_id,
            relation: RelationKind::FinishToStart,
            lag_days: 0,
        }
    }

    pub fn new(predecessor_id: i32, relation: RelationKind, lag_days: i64) -> Self {
        Self {
            predecessor_id,
            relation,
            lag_days,
        }
    }
}

/// Date constraint kinds, in P6 style. Absence of a constraint means "none".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConstraintKind {
    StartNoEarlierThan,
    StartNoLaterThan,
    MustStartOn,
    MustFinishOn,
    FinishNoEarlierThan,
    FinishNoLaterThan,
}

impl ConstraintKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConstraintKind::StartNoEarlierThan => "start_no_earlier_than",
            ConstraintKind::StartNoLaterThan => "start_no_later_than",
            ConstraintKind::MustStartOn => "must_start_on",
            ConstraintKind::MustFinishOn => "must_finish_on",
            ConstraintKind::FinishNoEarlierThan => "finish_no_earlier_than",
            ConstraintKind::FinishNoLaterThan => "finish_no_later_than",
        }
    }

    /// Mandatory constraints pin or cap dates; the checker flags them.
    pub fn is_mandatory(&self) -> bool {
        matches!(
            self,
            ConstraintKind::MustStartOn
                | ConstraintKind::MustFinishOn
                | ConstraintKind::StartNoLaterThan
                | ConstraintKind::FinishNoLaterThan
        )
    }

    pub fn is_flexible(&self) -> bool {
        matches!(
            self,
            ConstraintKind::StartNoEarlierThan | ConstraintKind::FinishNoEarlierThan
        )
    }
}

impl FromStr for ConstraintKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "start_no_earlier_than" => Ok(ConstraintKind::StartNoEarlierThan),
            "start_no_later_than" => Ok(ConstraintKind::StartNoLaterThan),
            "must_start_on" => Ok(ConstraintKind::MustStartOn),
            "must_finish_on" => Ok(ConstraintKind::MustFinishOn),
            "finish_no_earlier_than" => Ok(ConstraintKind::FinishNoEarlierThan),
            "finish_no_later_than" => Ok(ConstraintKind::FinishNoLaterThan),
            other => Err(format!("unknown constraint kind '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Constraint {
    pub kind: ConstraintKind,
    pub date: NaiveDate,
}

impl Constraint {
    pub fn new(kind: ConstraintKind, date: NaiveDate) -> Self {
        Self { kind, date }
    }
}

/// A schedulable unit. Early/late dates, total float and the critical flag
/// are owned exclusively by the scheduler and overwritten on every run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    pub id: i32,
    pub name: String,
    #[serde(default)]
    pub kind: ActivityKind,
    pub duration_days: i64,
    #[serde(default)]
    pub remaining_duration_days: Option<i64>,
    #[serde(default)]
    pub calendar_id: Option<i32>,
    /// 0.0 to 1.0.
    #[serde(default)]
    pub percent_complete: f64,
    #[serde(default)]
    pub predecessors: Vec<PredecessorLink>,
    #[serde(default)]
    pub constraint: Option<Constraint>,
    /// When true the scheduler keeps the pinned start instead of deriving it
    /// from predecessors.
    #[serde(default)]
    pub is_manual: bool,
    #[serde(default)]
    pub manual_start: Option<NaiveDate>,
    #[serde(default)]
    pub outline_level: u32,
    #[serde(default)]
    pub actual_start: Option<NaiveDate>,
    #[serde(default)]
    pub actual_finish: Option<NaiveDate>,

    // Computed by the scheduler.
    #[serde(default)]
    pub early_start: Option<NaiveDate>,
    #[serde(default)]
    pub early_finish: Option<NaiveDate>,
    #[serde(default)]
    pub late_start: Option<NaiveDate>,
    #[serde(default)]
    pub late_finish: Option<NaiveDate>,
    #[serde(default)]
    pub total_float_days: Option<i64>,
    #[serde(default)]
    pub is_critical: Option<bool>,
}

impl Activity {
    pub fn new(id: i32, name: impl Into<String>, duration_days: i64) -> Self {
        Self {
            id,
            name: name.into(),
            kind: ActivityKind::Task,
            duration_days,
            remaining_duration_days: None,
            calendar_id: None,
            percent_complete: 0.0,
            predecessors: Vec::new(),
            constraint: None,
            is_manual: false,
            manual_start: None,
            outline_level: 0,
            actual_start: None,
            actual_finish: None,
            early_start: None,
            early_finish: None,
            late_start: None,
            late_finish: None,
            total_float_days: None,
            is_critical: None,
        }
    }

    pub fn milestone(id: i32, name: impl Into<String>) -> Self {
        let mut activity = Self::new(id, name, 0);
        activity.kind = ActivityKind::Milestone;
        activity
    }

    pub fn with_predecessor(mut self, link: PredecessorLink) -> Self {
        self.predecessors.push(link);
        self
    }

    pub fn with_constraint(mut self, constraint: Constraint) -> Self {
        self.constraint = Some(constraint);
        self
    }

    pub fn with_calendar(mut self, calendar_id: i32) -> Self {
        self.calendar_id = Some(calendar_id);
        self
    }

    pub fn is_complete(&self) -> bool {
        self.percent_complete >= 1.0
    }

    /// Work days the scheduler still has to place. Falls back to the full
    /// duration when no remaining value is recorded.
    pub fn effective_remaining_days(&self) -> i64 {
        if self.percent_complete > 0.0 {
            self.remaining_duration_days.unwrap_or(self.duration_days)
        } else {
            self.duration_days
        }
    }

    /// Clear every scheduler-owned field before a run.
    pub fn reset_computed(&mut self) {
        self.early_start = None;
        self.early_finish = None;
        self.late_start = None;
        self.late_finish = None;
        self.total_float_days = None;
        self.is_critical = None;
    }
}
