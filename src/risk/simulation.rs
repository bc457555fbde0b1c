use super::{ActivityDistribution, CancellationToken, SimulationError};
use crate::calculations::{self, CalendarSet};
use crate::graph::NetworkDag;
use crate::project::Project;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Iterations between cancellation checks. Workers never observe the token
/// mid-iteration, so a cancelled run always returns a whole prefix.
const ITERATION_CHUNK: usize = 64;

/// Aggregate output of one Monte Carlo run. Immutable once returned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationResult {
    pub iterations_requested: u32,
    pub iterations_completed: u32,
    pub cancelled: bool,
    /// Percentage of iterations each activity sat on the critical path.
    pub criticality_index: BTreeMap<i32, f64>,
    /// Spearman rank correlation between each activity's sampled duration
    /// and the total project duration. Exactly 0 for constant samples.
    pub sensitivity_index: BTreeMap<i32, f64>,
    /// Snapshot of the distributions the run used.
    pub distributions: Vec<ActivityDistribution>,
    /// Sorted calendar-day spans from project start to project finish, one
    /// per completed iteration.
    pub total_duration_days: Vec<i64>,
}

impl SimulationResult {
    /// Nearest-rank percentile over the empirical total-duration
    /// distribution. `p` is in percent, e.g. 80.0 for P80.
    pub fn percentile(&self, p: f64) -> Option<i64> {
        if self.total_duration_days.is_empty() || !(0.0..=100.0).contains(&p) {
            return None;
        }
        let n = self.total_duration_days.len();
        let rank = ((p / 100.0 * n as f64).ceil() as usize).clamp(1, n);
        Some(self.total_duration_days[rank - 1])
    }
}

struct IterationOutcome {
    total_days: i64,
    critical: Vec<bool>,
}

/// Run the Monte Carlo engine: N reschedules with durations drawn from the
/// given distributions, aggregated into criticality and sensitivity indices
/// plus the empirical completion distribution.
///
/// All draws come from a single ChaCha stream seeded once, consumed serially
/// in (iteration, activity-order) order before any rescheduling starts;
/// identical inputs and seed reproduce the result bit for bit regardless of
/// worker scheduling.
pub fn simulate(
    project: &Project,
    distributions: &[ActivityDistribution],
    iterations: u32,
    seed: u64,
    cancel: &CancellationToken,
) -> Result<SimulationResult, SimulationError> {
    if iterations == 0 {
        return Err(SimulationError::NoIterations);
    }

    let activities = project.activities();
    let metadata = project.metadata();

    let index_by_id: HashMap<i32, usize> = activities
        .iter()
        .enumerate()
        .map(|(idx, activity)| (activity.id, idx))
        .collect();

    // Reject bad inputs before the first iteration.
    let mut dist_by_index: Vec<Option<&ActivityDistribution>> = vec![None; activities.len()];
    for entry in distributions {
        let Some(&idx) = index_by_id.get(&entry.activity_id) else {
            return Err(SimulationError::UnknownActivity {
                activity_id: entry.activity_id,
            });
        };
        entry.distribution.validate().map_err(|reason| {
            SimulationError::InvalidDistributionParameters {
                activity_id: entry.activity_id,
                reason,
            }
        })?;
        if !entry.distribution.is_none() {
            dist_by_index[idx] = Some(entry);
        }
    }

    let dag = NetworkDag::build(activities)?;
    let calendars = CalendarSet::new(project.calendars())?;
    let base_durations: Vec<i64> = activities
        .iter()
        .map(|activity| activity.duration_days)
        .collect();

    // Arena indices that actually vary, in activity order. This is the
    // documented draw order of the stream.
    let sampled_indices: Vec<usize> = (0..activities.len())
        .filter(|&idx| dist_by_index[idx].is_some())
        .collect();

    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let sample_rows: Vec<Vec<f64>> = (0..iterations as usize)
        .map(|_| {
            sampled_indices
                .iter()
                .map(|&idx| {
                    dist_by_index[idx]
                        .expect("sampled index has a distribution")
                        .distribution
                        .sample(&mut rng)
                })
                .collect()
        })
        .collect();

    // Reschedule per iteration, in parallel inside sequential chunks with a
    // cancellation check between chunks. Per-worker outcomes merge by plain
    // reduction; no shared mutable state.
    let mut outcomes: Vec<IterationOutcome> = Vec::with_capacity(iterations as usize);
    let mut cancelled = false;
    for chunk in sample_rows.chunks(ITERATION_CHUNK) {
        if cancel.is_cancelled() {
            cancelled = true;
            break;
        }
        let chunk_outcomes: Vec<Result<IterationOutcome, SimulationError>> = chunk
            .par_iter()
            .map(|row| {
                let mut durations = base_durations.clone();
                for (pos, &idx) in sampled_indices.iter().enumerate() {
                    durations[idx] = row[pos].round().max(0.0) as i64;
                }
                let computed = calculations::compute_schedule(
                    activities,
                    &dag,
                    &calendars,
                    metadata,
                    &durations,
                )?;
                let finish = computed
                    .iter()
                    .map(|dates| dates.early_finish)
                    .max()
                    .unwrap_or(metadata.project_start_date);
                Ok(IterationOutcome {
                    total_days: (finish - metadata.project_start_date).num_days(),
                    critical: computed.iter().map(|dates| dates.is_critical).collect(),
                })
            })
            .collect();
        for outcome in chunk_outcomes {
            outcomes.push(outcome?);
        }
    }

    let completed = outcomes.len();

    let mut critical_counts = vec![0u32; activities.len()];
    for outcome in &outcomes {
        for (idx, flag) in outcome.critical.iter().enumerate() {
            if *flag {
                critical_counts[idx] += 1;
            }
        }
    }

    let mut criticality_index = BTreeMap::new();
    let mut sensitivity_index = BTreeMap::new();
    let totals: Vec<f64> = outcomes
        .iter()
        .map(|outcome| outcome.total_days as f64)
        .collect();
    for (idx, activity) in activities.iter().enumerate() {
        let criticality = if completed == 0 {
            0.0
        } else {
            (critical_counts[idx] as f64 / completed as f64 * 100.0).round()
        };
        criticality_index.insert(activity.id, criticality);

        let sensitivity = match sampled_indices.iter().position(|&s| s == idx) {
            Some(pos) if completed > 1 => {
                let series: Vec<f64> = outcomes
                    .iter()
                    .enumerate()
                    .map(|(iter_idx, _)| sample_rows[iter_idx][pos])
                    .collect();
                spearman(&series, &totals)
            }
            _ => 0.0,
        };
        sensitivity_index.insert(activity.id, sensitivity);
    }

    let mut total_duration_days: Vec<i64> =
        outcomes.iter().map(|outcome| outcome.total_days).collect();
    total_duration_days.sort_unstable();

    Ok(SimulationResult {
        iterations_requested: iterations,
        iterations_completed: completed as u32,
        cancelled,
        criticality_index,
        sensitivity_index,
        distributions: distributions.to_vec(),
        total_duration_days,
    })
}

/// Spearman rank correlation: rank both series with average ties, then take
/// the Pearson coefficient of the ranks. Constant series correlate to 0, not
/// NaN.
pub fn spearman(a: &[f64], b: &[f64]) -> f64 {
    if a.len() != b.len() || a.len() < 2 {
        return 0.0;
    }
    pearson(&ranks(a), &ranks(b))
}

fn ranks(values: &[f64]) -> Vec<f64> {
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&i, &j| values[i].total_cmp(&values[j]));

    let mut ranks = vec![0.0; values.len()];
    let mut pos = 0;
    while pos < order.len() {
        let mut end = pos + 1;
        while end < order.len() && values[order[end]] == values[order[pos]] {
            end += 1;
        }
        // Average rank across the tie run; ranks are 1-based.
        let rank = (pos + 1 + end) as f64 / 2.0;
        for &idx in &order[pos..end] {
            ranks[idx] = rank;
        }
        pos = end;
    }
    ranks
}

fn pearson(a: &[f64], b: &[f64]) -> f64 {
    let n = a.len() as f64;
    let mean_a = a.iter().sum::<f64>() / n;
    let mean_b = b.iter().sum::<f64>() / n;
    let mut covariance = 0.0;
    let mut var_a = 0.0;
    let mut var_b = 0.0;
    for (&x, &y) in a.iter().zip(b) {
        let dx = x - mean_a;
        let dy = y - mean_b;
        covariance += dx * dy;
        var_a += dx * dx;
        var_b += dy * dy;
    }
    if var_a == 0.0 || var_b == 0.0 {
        return 0.0;
    }
    covariance / (var_a.sqrt() * var_b.sqrt())
}
