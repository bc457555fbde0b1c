pub mod activity;
pub mod calculations;
pub mod calendar;
pub mod checks;
pub mod graph;
#[cfg(feature = "http_api")]
pub mod http_api;
pub mod metadata;
pub mod persistence;
pub mod project;
pub(crate) mod project_validation;
pub mod report;
pub mod risk;

pub use activity::{
    Activity, ActivityKind, Constraint, ConstraintKind, PredecessorLink, RelationKind,
};
pub use calculations::{ComputedDates, ScheduleError};
pub use calendar::{CalendarError, WorkCalendar};
pub use checks::{CheckKind, Finding, Severity, ThresholdConfig, run_checks};
pub use metadata::ProjectMetadata;
#[cfg(feature = "sqlite")]
pub use persistence::sqlite::SqliteProjectStore;
pub use persistence::{
    PersistenceError, ProjectStore, export_activities_to_csv, import_activities_from_csv,
    load_project_from_json, save_project_to_json,
};
pub use project::{Project, ScheduleSummary, schedule};
pub use report::{render_df_as_text_table, schedule_dataframe, simulation_dataframe};
pub use risk::{
    ActivityDistribution, CancellationToken, DurationDistribution, SimulationError,
    SimulationResult, simulate,
};
