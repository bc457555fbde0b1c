use super::{CalendarSet, ScheduleError};
use crate::activity::{Activity, ActivityKind, ConstraintKind, RelationKind};
use crate::graph::NetworkDag;
use crate::metadata::ProjectMetadata;
use chrono::NaiveDate;
use petgraph::Direction;
use petgraph::visit::EdgeRef;

/// Forward pass: earliest start and finish per activity, in topological
/// order. Early dates are work-day boundaries: an activity's finish is the
/// boundary its successor may start on.
pub struct ForwardPass<'a> {
    activities: &'a [Activity],
    dag: &'a NetworkDag,
    calendars: &'a CalendarSet<'a>,
    metadata: &'a ProjectMetadata,
    durations: &'a [i64],
}

impl<'a> ForwardPass<'a> {
    pub fn new(
        activities: &'a [Activity],
        dag: &'a NetworkDag,
        calendars: &'a CalendarSet<'a>,
        metadata: &'a ProjectMetadata,
        durations: &'a [i64],
    ) -> Self {
        Self {
            activities,
            dag,
            calendars,
            metadata,
            durations,
        }
    }

    pub fn execute(&self) -> Result<Vec<(NaiveDate, NaiveDate)>, ScheduleError> {
        let mut dates: Vec<Option<(NaiveDate, NaiveDate)>> = vec![None; self.activities.len()];

        for &idx in self.dag.topo_order() {
            let activity = &self.activities[idx];
            let calendar = self.calendars.for_activity(activity)?;
            let duration = self.durations[idx];
            let is_milestone = activity.kind == ActivityKind::Milestone;

            // Completed work keeps its recorded dates and is never repositioned.
            if activity.is_complete() {
                if let (Some(start), Some(finish)) = (activity.actual_start, activity.actual_finish)
                {
                    if finish <= self.metadata.status_date {
                        dates[idx] = Some((start, finish));
                        continue;
                    }
                }
            }

            // Manual scheduling pins the start; only the finish is derived.
            if activity.is_manual {
                let start = activity
                    .manual_start
                    .unwrap_or(self.metadata.project_start_date);
                let finish = if is_milestone {
                    start
                } else {
                    calendar.add_work_days(start, duration)?
                };
                dates[idx] = Some((start, finish));
                continue;
            }

            // Raw forward date: latest predecessor-implied start, floored at
            // the project start.
            let mut early_start = calendar.roll_forward(self.metadata.project_start_date)?;
            let node = self
                .dag
                .node_of(activity.id)
                .expect("activity indexed during dag build");
            for edge in self.dag.graph.edges_directed(node, Direction::Incoming) {
                let pred_idx = self.dag.graph[edge.source()];
                let link = edge.weight();
                let (pred_start, pred_finish) =
                    dates[pred_idx].expect("predecessor visited before successor");
                let candidate = match link.relation {
                    RelationKind::FinishToStart => {
                        calendar.add_work_days(pred_finish, link.lag_days)?
                    }
                    RelationKind::StartToStart => {
                        calendar.add_work_days(pred_start, link.lag_days)?
                    }
                    RelationKind::FinishToFinish => {
                        let finish_bound = calendar.add_work_days(pred_finish, link.lag_days)?;
                        calendar.add_work_days(finish_bound, -duration)?
                    }
                    RelationKind::StartToFinish => {
                        let finish_bound = calendar.add_work_days(pred_start, link.lag_days)?;
                        calendar.add_work_days(finish_bound, -duration)?
                    }
                };
                if candidate > early_start {
                    early_start = candidate;
                }
            }

            // Started activities hold their actual start; the remaining work
            // is placed from the status date.
            if let Some(start) = activity.actual_start {
                if !activity.is_complete() {
                    let resume = calendar
                        .roll_forward(self.metadata.status_date)?
                        .max(start);
                    let finish = if is_milestone {
                        start
                    } else {
                        calendar.add_work_days(resume, activity.effective_remaining_days())?
                    };
                    dates[idx] = Some((start, finish));
                    continue;
                }
            }

            // Constraint application, once per activity: must-dates override
            // outright, no-earlier-than dates clamp later only.
            if let Some(constraint) = activity.constraint {
                match constraint.kind {
                    ConstraintKind::MustStartOn => early_start = constraint.date,
                    ConstraintKind::StartNoEarlierThan => {
                        let floor = calendar.roll_forward(constraint.date)?;
                        if floor > early_start {
                            early_start = floor;
                        }
                    }
                    _ => {}
                }
            }

            let mut early_finish = if is_milestone {
                early_start
            } else {
                calendar.add_work_days(early_start, duration)?
            };

            if let Some(constraint) = activity.constraint {
                match constraint.kind {
                    ConstraintKind::MustFinishOn => {
                        early_finish = constraint.date;
                        early_start = if is_milestone {
                            early_finish
                        } else {
                            calendar.add_work_days(early_finish, -duration)?
                        };
                    }
                    ConstraintKind::FinishNoEarlierThan => {
                        let floor = calendar.roll_forward(constraint.date)?;
                        if floor > early_finish {
                            early_finish = floor;
                        }
                    }
                    _ => {}
                }
            }

            dates[idx] = Some((early_start, early_finish));
        }

        Ok(dates
            .into_iter()
            .map(|entry| entry.expect("every activity visited in topo order"))
            .collect())
    }
}
