use super::{PersistenceResult, ProjectStore};
use crate::activity::Activity;
use crate::calendar::WorkCalendar;
use crate::metadata::ProjectMetadata;
use crate::project::Project;
use rusqlite::{Connection, OptionalExtension, params};
use std::sync::Mutex;

/// Single-project store: one metadata row, one JSON row per calendar and per
/// activity. The payloads stay opaque JSON so the schema never chases the
/// data model.
pub struct SqliteProjectStore {
    connection: Mutex<Connection>,
}

impl SqliteProjectStore {
    pub fn new<P: AsRef<std::path::Path>>(path: P) -> PersistenceResult<Self> {
        let connection = Connection::open(path)?;
        Self::initialize_schema(&connection)?;
        Ok(Self {
            connection: Mutex::new(connection),
        })
    }

    fn initialize_schema(connection: &Connection) -> PersistenceResult<()> {
        let ddl = r#"
            PRAGMA foreign_keys = ON;
            CREATE TABLE IF NOT EXISTS project_metadata (
                id INTEGER PRIMARY KEY CHECK (id = 1),
                metadata_json TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS calendars (
                id INTEGER PRIMARY KEY,
                calendar_json TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS activities (
                id INTEGER PRIMARY KEY,
                activity_json TEXT NOT NULL
            );
        "#;
        connection.execute_batch(ddl)?;
        Ok(())
    }

    fn save_metadata(
        &self,
        tx: &rusqlite::Transaction,
        metadata: &ProjectMetadata,
    ) -> PersistenceResult<()> {
        let json = serde_json::to_string(metadata)?;
        tx.execute("DELETE FROM project_metadata", [])?;
        tx.execute(
            "INSERT INTO project_metadata (id, metadata_json) VALUES (1, ?1)",
            params![json],
        )?;
        Ok(())
    }

    fn save_calendars(
        &self,
        tx: &rusqlite::Transaction,
        project: &Project,
    ) -> PersistenceResult<()> {
        tx.execute("DELETE FROM calendars", [])?;
        let mut stmt = tx.prepare("INSERT INTO calendars (id, calendar_json) VALUES (?1, ?2)")?;
        for calendar in project.calendars() {
            let json = serde_json::to_string(calendar)?;
            stmt.execute(params![calendar.id, json])?;
        }
        Ok(())
    }

    fn save_activities(
        &self,
        tx: &rusqlite::Transaction,
        project: &Project,
    ) -> PersistenceResult<()> {
        tx.execute("DELETE FROM activities", [])?;
        let mut stmt = tx.prepare("INSERT INTO activities (id, activity_json) VALUES (?1, ?2)")?;
        for activity in project.activities() {
            let json = serde_json::to_string(activity)?;
            stmt.execute(params![activity.id, json])?;
        }
        Ok(())
    }
}

impl ProjectStore for SqliteProjectStore {
    fn save_project(&self, project: &Project) -> PersistenceResult<()> {
        super::validate_project(project)?;
        let mut conn = self.connection.lock().expect("sqlite mutex poisoned");
        let tx = conn.transaction()?;
        self.save_metadata(&tx, project.metadata())?;
        self.save_calendars(&tx, project)?;
        self.save_activities(&tx, project)?;
        tx.commit()?;
        Ok(())
    }

    fn load_project(&self) -> PersistenceResult<Option<Project>> {
        let conn = self.connection.lock().expect("sqlite mutex poisoned");

        let mut stmt = conn.prepare("SELECT metadata_json FROM project_metadata WHERE id = 1")?;
        let metadata_json_opt: Option<String> = stmt.query_row([], |row| row.get(0)).optional()?;

        let Some(metadata_json) = metadata_json_opt else {
            return Ok(None);
        };
        let metadata: ProjectMetadata = serde_json::from_str(&metadata_json)?;

        let mut stmt = conn.prepare("SELECT calendar_json FROM calendars ORDER BY id ASC")?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
        let mut calendars: Vec<WorkCalendar> = Vec::new();
        for json in rows {
            calendars.push(serde_json::from_str(&json?)?);
        }

        let mut stmt = conn.prepare("SELECT activity_json FROM activities ORDER BY id ASC")?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
        let mut activities: Vec<Activity> = Vec::new();
        for json in rows {
            activities.push(serde_json::from_str(&json?)?);
        }

        let project = Project::from_parts(metadata, calendars, activities);
        super::validate_project(&project)?;
        Ok(Some(project))
    }
}
