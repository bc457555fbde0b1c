use crate::calculations::ScheduleError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

pub mod distribution;
pub mod simulation;

pub use distribution::DurationDistribution;
pub use simulation::{SimulationResult, simulate};

/// Simulation-fatal failures. Distribution parameters are rejected before the
/// first iteration; sampling correctness cannot be guaranteed otherwise.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SimulationError {
    InvalidDistributionParameters { activity_id: i32, reason: String },
    UnknownActivity { activity_id: i32 },
    NoIterations,
    Schedule(ScheduleError),
}

impl fmt::Display for SimulationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimulationError::InvalidDistributionParameters {
                activity_id,
                reason,
            } => write!(
                f,
                "invalid distribution parameters for activity {activity_id}: {reason}"
            ),
            SimulationError::UnknownActivity { activity_id } => {
                write!(f, "distribution references unknown activity {activity_id}")
            }
            SimulationError::NoIterations => write!(f, "iteration count must be at least 1"),
            SimulationError::Schedule(err) => write!(f, "scheduling failed: {err}"),
        }
    }
}

impl std::error::Error for SimulationError {}

impl From<ScheduleError> for SimulationError {
    fn from(value: ScheduleError) -> Self {
        SimulationError::Schedule(value)
    }
}

/// Duration distribution assigned to one activity for a simulation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityDistribution {
    pub activity_id: i32,
    pub distribution: DurationDistribution,
}

impl ActivityDistribution {
    pub fn new(activity_id: i32, distribution: DurationDistribution) -> Self {
        Self {
            activity_id,
            distribution,
        }
    }
}

/// Cooperative cancellation for a running simulation, checked between
/// iteration chunks, never mid-iteration. A cancelled run returns the
/// completed prefix of iterations, clearly labeled.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    flag: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}
