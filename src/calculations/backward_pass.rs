use super::{CalendarSet, ScheduleError};
use crate::activity::{Activity, ActivityKind, ConstraintKind, RelationKind};
use crate::graph::NetworkDag;
use crate::metadata::ProjectMetadata;
use chrono::NaiveDate;

/// Backward pass: latest start and finish per activity, in reverse
/// topological order, seeded from the latest early finish across terminal
/// activities (or the project's target finish when one is set).
pub struct BackwardPass<'a> {
    activities: &'a [Activity],
    dag: &'a NetworkDag,
    calendars: &'a CalendarSet<'a>,
    metadata: &'a ProjectMetadata,
    durations: &'a [i64],
    early: &'a [(NaiveDate, NaiveDate)],
}

impl<'a> BackwardPass<'a> {
    pub fn new(
        activities: &'a [Activity],
        dag: &'a NetworkDag,
        calendars: &'a CalendarSet<'a>,
        metadata: &'a ProjectMetadata,
        durations: &'a [i64],
        early: &'a [(NaiveDate, NaiveDate)],
    ) -> Self {
        Self {
            activities,
            dag,
            calendars,
            metadata,
            durations,
            early,
        }
    }

    /// Project finish: the latest early finish anywhere in the network. This
    /// equals the terminal maximum on FS/FF networks; start-side relations
    /// can leave a non-terminal activity finishing last.
    fn seed(&self) -> NaiveDate {
        if let Some(target) = self.metadata.target_finish_date {
            return target;
        }
        self.early
            .iter()
            .map(|&(_, early_finish)| early_finish)
            .max()
            .unwrap_or(self.metadata.project_start_date)
    }

    pub fn execute(&self) -> Result<Vec<(NaiveDate, NaiveDate)>, ScheduleError> {
        let mut dates: Vec<Option<(NaiveDate, NaiveDate)>> = vec![None; self.activities.len()];
        let seed = self.seed();

        for &idx in self.dag.topo_order().iter().rev() {
            let activity = &self.activities[idx];
            let calendar = self.calendars.for_activity(activity)?;
            let duration = self.durations[idx];
            let is_milestone = activity.kind == ActivityKind::Milestone;
            let node = self
                .dag
                .node_of(activity.id)
                .expect("activity indexed during dag build");

            // Successor bounds: FS and FF bound this activity's finish,
            // SS and SF bound its start. Lags unwind under the successor's
            // calendar, mirroring the forward pass.
            let mut finish_bound: Option<NaiveDate> = None;
            let mut start_bound: Option<NaiveDate> = None;
            for (succ_idx, link) in self.dag.successors_of(node) {
                let successor = &self.activities[succ_idx];
                let succ_calendar = self.calendars.for_activity(successor)?;
                let (succ_ls, succ_lf) =
                    dates[succ_idx].expect("successor visited before predecessor");
                match link.relation {
                    RelationKind::FinishToStart => {
                        let bound = succ_calendar.add_work_days(succ_ls, -link.lag_days)?;
                        finish_bound = Some(finish_bound.map_or(bound, |b| b.min(bound)));
                    }
                    RelationKind::FinishToFinish => {
                        let bound = succ_calendar.add_work_days(succ_lf, -link.lag_days)?;
                        finish_bound = Some(finish_bound.map_or(bound, |b| b.min(bound)));
                    }
                    RelationKind::StartToStart => {
                        let bound = succ_calendar.add_work_days(succ_ls, -link.lag_days)?;
                        start_bound = Some(start_bound.map_or(bound, |b| b.min(bound)));
                    }
                    RelationKind::StartToFinish => {
                        let bound = succ_calendar.add_work_days(succ_lf, -link.lag_days)?;
                        start_bound = Some(start_bound.map_or(bound, |b| b.min(bound)));
                    }
                }
            }

            let mut late_finish = finish_bound.unwrap_or(seed);
            if let Some(start) = start_bound {
                let implied = if is_milestone {
                    start
                } else {
                    calendar.add_work_days(start, duration)?
                };
                if implied < late_finish {
                    late_finish = implied;
                }
            }

            // Late-side constraints clamp downward only; must-dates override.
            if let Some(constraint) = activity.constraint {
                match constraint.kind {
                    ConstraintKind::FinishNoLaterThan => {
                        if constraint.date < late_finish {
                            late_finish = constraint.date;
                        }
                    }
                    ConstraintKind::MustFinishOn => late_finish = constraint.date,
                    _ => {}
                }
            }

            let mut late_start = if is_milestone {
                late_finish
            } else {
                calendar.add_work_days(late_finish, -duration)?
            };

            if let Some(constraint) = activity.constraint {
                match constraint.kind {
                    ConstraintKind::StartNoLaterThan => {
                        if constraint.date < late_start {
                            late_start = constraint.date;
                            late_finish = if is_milestone {
                                late_start
                            } else {
                                calendar.add_work_days(late_start, duration)?
                            };
                        }
                    }
                    ConstraintKind::MustStartOn => {
                        late_start = constraint.date;
                        late_finish = if is_milestone {
                            late_start
                        } else {
                            calendar.add_work_days(late_start, duration)?
                        };
                    }
                    _ => {}
                }
            }

            dates[idx] = Some((late_start, late_finish));
        }

        Ok(dates
            .into_iter()
            .map(|entry| entry.expect("every activity visited in reverse topo order"))
            .collect())
    }
}
