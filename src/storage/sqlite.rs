//! `SQLite` storage implementation.

use crate::error::{IssueError, Result};
use crate::model::{Issue, IssueView, NewIssue, TextField};
use crate::storage::schema::{CURRENT_SCHEMA_VERSION, apply_schema, schema_version};
use crate::storage::{
    Clause, DeleteOutcome, DeleteSelector, FieldSet, Predicate, Projection, RecordStore, Selector,
    TimestampCriterion, UpdateOutcome, UpdateTargetPolicy,
};
use crate::util::time::parse_stored_timestamp;
use crate::util::{IdGenerator, IssueId, Timestamp};
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, ValueRef};
use rusqlite::{Connection, OptionalExtension, ToSql, Transaction};
use std::fmt::Write as _;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info, warn};

const ISSUE_COLUMNS: &str = "id, project, issue_title, issue_text, created_by, assigned_to, \
                             status_text, open, created_on, updated_on";

impl ToSql for IssueId {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.to_string()))
    }
}

impl FromSql for IssueId {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let text = value.as_str()?;
        Self::parse(text).map_err(|err| FromSqlError::Other(Box::new(err)))
    }
}

impl ToSql for Timestamp {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.to_string()))
    }
}

impl FromSql for Timestamp {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value.as_str().map(parse_stored_timestamp)
    }
}

/// SQLite-based record store.
#[derive(Debug)]
pub struct SqliteStorage {
    conn: Connection,
    ids: IdGenerator,
}

impl SqliteStorage {
    /// Open a new connection to the database at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be established or schema application fails.
    pub fn open(path: &Path) -> Result<Self> {
        Self::open_with_timeout(path, None)
    }

    /// Open a new connection with an optional busy timeout (ms).
    ///
    /// # Errors
    ///
    /// Returns `DatabaseUnavailable` if the file cannot be opened, or an
    /// error if schema application fails.
    pub fn open_with_timeout(path: &Path, lock_timeout_ms: Option<u64>) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|err| IssueError::DatabaseUnavailable {
                path: path.to_path_buf(),
                reason: err.to_string(),
            })?;
        }
        let conn = Connection::open(path).map_err(|err| IssueError::DatabaseUnavailable {
            path: path.to_path_buf(),
            reason: err.to_string(),
        })?;
        if let Some(timeout) = lock_timeout_ms {
            conn.busy_timeout(Duration::from_millis(timeout))?;
        }
        apply_schema(&conn)?;
        if let Some(version) = schema_version(&conn)?.filter(|v| *v > CURRENT_SCHEMA_VERSION) {
            return Err(IssueError::DatabaseUnavailable {
                path: path.to_path_buf(),
                reason: format!(
                    "schema version {version} is newer than supported version {CURRENT_SCHEMA_VERSION}"
                ),
            });
        }
        debug!(path = %path.display(), ?lock_timeout_ms, "Opened issue database");
        Ok(Self {
            conn,
            ids: IdGenerator::default(),
        })
    }

    /// Open an in-memory database for testing.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be established.
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        apply_schema(&conn)?;
        Ok(Self {
            conn,
            ids: IdGenerator::default(),
        })
    }

    /// Replace the identifier generator, for deterministic ids.
    #[must_use]
    pub fn with_id_generator(mut self, ids: IdGenerator) -> Self {
        self.ids = ids;
        self
    }

    /// Run `f` inside an IMMEDIATE transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if `f` fails or the transaction cannot commit.
    /// The transaction is rolled back on error.
    pub fn mutate<F, R>(&mut self, op: &str, f: F) -> Result<R>
    where
        F: FnOnce(&Transaction, &mut IdGenerator) -> Result<R>,
    {
        let tx = self
            .conn
            .transaction_with_behavior(rusqlite::TransactionBehavior::Immediate)?;
        let result = f(&tx, &mut self.ids)?;
        tx.commit()?;
        debug!(op, "Committed mutation");
        Ok(result)
    }

    /// Fetch a single record by id, in any project.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn get_issue(&self, id: &IssueId) -> Result<Option<Issue>> {
        let sql = format!("SELECT {ISSUE_COLUMNS} FROM issues WHERE id = ?");
        let issue = self
            .conn
            .query_row(&sql, [id], issue_from_row)
            .optional()?;
        Ok(issue)
    }

    /// Number of records in a project.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn count_issues(&self, project: &str) -> Result<usize> {
        count_in_project(&self.conn, project)
    }
}

impl RecordStore for SqliteStorage {
    fn insert(&mut self, issue: NewIssue) -> Result<Issue> {
        self.mutate("insert", |tx, ids| {
            let id = ids.generate(
                &issue.project,
                &issue.issue_title,
                issue.created_on.as_datetime(),
                |candidate| id_exists(tx, candidate).unwrap_or(false),
            );
            let sql = format!(
                "INSERT INTO issues ({ISSUE_COLUMNS}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"
            );
            tx.execute(
                &sql,
                rusqlite::params![
                    id,
                    issue.project,
                    issue.issue_title,
                    issue.issue_text,
                    issue.created_by,
                    issue.assigned_to,
                    issue.status_text,
                    issue.open,
                    issue.created_on,
                    issue.updated_on,
                ],
            )?;
            info!(%id, project = %issue.project, "Created issue");
            Ok(issue.with_id(id))
        })
    }

    fn find(&self, predicate: &Predicate, projection: &Projection) -> Result<Vec<IssueView>> {
        if predicate.matches_nothing() {
            debug!(project = %predicate.project, "Predicate cannot match; skipping query");
            return Ok(Vec::new());
        }

        let mut sql = format!("SELECT {ISSUE_COLUMNS} FROM issues WHERE project = ?");
        let mut params: Vec<Box<dyn ToSql>> = vec![Box::new(predicate.project.clone())];

        for clause in &predicate.clauses {
            match clause {
                Clause::Id(id) => {
                    sql.push_str(" AND id = ?");
                    params.push(Box::new(*id));
                }
                Clause::Text { field, value } => {
                    let _ = write!(sql, " AND {} = ?", field.as_str());
                    params.push(Box::new(value.clone()));
                }
                Clause::Timestamp { field, criterion } => match criterion {
                    TimestampCriterion::At(at) => {
                        let _ = write!(sql, " AND {} = ?", field.as_str());
                        params.push(Box::new(*at));
                    }
                    TimestampCriterion::Invalid(_) => sql.push_str(" AND 0"),
                },
                Clause::Open(open) => {
                    sql.push_str(" AND open = ?");
                    params.push(Box::new(*open));
                }
            }
        }
        sql.push_str(" ORDER BY seq");
        debug!(%sql, params = params.len(), "Running find");

        let mut stmt = self.conn.prepare(&sql)?;
        let param_refs: Vec<&dyn ToSql> = params.iter().map(AsRef::as_ref).collect();
        let issues = stmt
            .query_map(param_refs.as_slice(), issue_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(issues
            .into_iter()
            .map(|issue| issue.into_view(projection.include_project))
            .collect())
    }

    fn update_one(&mut self, selector: &Selector, changes: &FieldSet) -> Result<UpdateOutcome> {
        self.mutate("update_one", |tx, _| {
            let Some(target) = resolve_target(tx, selector)? else {
                debug!(project = %selector.project, id = ?selector.id, "Update matched no record");
                return Ok(UpdateOutcome::no_match());
            };

            let mut sql = String::from("UPDATE issues SET updated_on = MAX(created_on, ?)");
            let mut params: Vec<Box<dyn ToSql>> = vec![Box::new(changes.updated_on)];
            for field in TextField::ALL {
                if let Some(value) = changes.text(field) {
                    let _ = write!(sql, ", {} = ?", field.as_str());
                    params.push(Box::new(value.clone()));
                }
            }
            if let Some(open) = changes.open {
                sql.push_str(", open = ?");
                params.push(Box::new(open));
            }
            sql.push_str(" WHERE id = ? AND project = ?");
            params.push(Box::new(target));
            params.push(Box::new(selector.project.clone()));

            let param_refs: Vec<&dyn ToSql> = params.iter().map(AsRef::as_ref).collect();
            let matched = tx.execute(&sql, param_refs.as_slice())?;
            info!(
                id = %target,
                project = %selector.project,
                fields = ?changes.changed_fields(),
                "Updated issue"
            );
            Ok(UpdateOutcome {
                matched,
                target: Some(target),
            })
        })
    }

    fn delete_one(&mut self, selector: &DeleteSelector) -> Result<DeleteOutcome> {
        self.mutate("delete_one", |tx, _| {
            let deleted = tx.execute(
                "DELETE FROM issues WHERE id = ? AND project = ?",
                rusqlite::params![selector.id, selector.project],
            )?;
            if deleted > 0 {
                info!(id = %selector.id, project = %selector.project, "Deleted issue");
            }
            Ok(DeleteOutcome { deleted })
        })
    }
}

/// Pick the record an update applies to.
fn resolve_target(conn: &Connection, selector: &Selector) -> Result<Option<IssueId>> {
    if let Some(id) = selector.id {
        let found = conn
            .query_row(
                "SELECT id FROM issues WHERE id = ? AND project = ?",
                rusqlite::params![id, selector.project],
                |row| row.get::<_, IssueId>(0),
            )
            .optional()?;
        return Ok(found);
    }

    if selector.policy == UpdateTargetPolicy::RejectAmbiguous {
        let candidates = count_in_project(conn, &selector.project)?;
        if candidates > 1 {
            return Err(IssueError::AmbiguousTarget {
                project: selector.project.clone(),
                candidates,
            });
        }
    }

    let first = conn
        .query_row(
            "SELECT id FROM issues WHERE project = ? ORDER BY seq LIMIT 1",
            [&selector.project],
            |row| row.get::<_, IssueId>(0),
        )
        .optional()?;
    if let Some(id) = first {
        warn!(
            project = %selector.project,
            %id,
            "Update without _id applied to the oldest record of the project"
        );
    }
    Ok(first)
}

fn count_in_project(conn: &Connection, project: &str) -> Result<usize> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM issues WHERE project = ?",
        [project],
        |row| row.get(0),
    )?;
    Ok(usize::try_from(count).unwrap_or(0))
}

fn id_exists(conn: &Connection, id: &IssueId) -> Result<bool> {
    let exists = conn
        .prepare_cached("SELECT 1 FROM issues WHERE id = ?")?
        .exists([id])?;
    Ok(exists)
}

fn issue_from_row(row: &rusqlite::Row) -> rusqlite::Result<Issue> {
    Ok(Issue {
        id: row.get(0)?,
        project: row.get(1)?,
        issue_title: row.get(2)?,
        issue_text: row.get(3)?,
        created_by: row.get(4)?,
        assigned_to: row.get(5)?,
        status_text: row.get(6)?,
        open: row.get(7)?,
        created_on: row.get(8)?,
        updated_on: row.get(9)?,
    })
}
