//! Embedded migration runner and the additive column guard.
//!
//! Migrations run sequentially on startup, tracked by the
//! `_ironlog_migrations` table. A migration is a list of steps; each step is
//! either raw SQL written with `IF NOT EXISTS` clauses, or a column guard
//! that adds a column only when the table does not already have it.
//!
//! SQLite has no `ALTER TABLE ... ADD COLUMN IF NOT EXISTS`, so the guard
//! consults `pragma_table_info` first. Together this means a fresh database
//! and a database created before a given revision (tables present, tracking
//! rows missing, or a column added by hand) converge to the same schema.

use rusqlite::{params, Connection};
use thiserror::Error;

/// One unit of schema change.
enum Step {
    /// Raw SQL. Must be safe to re-run (`CREATE ... IF NOT EXISTS`).
    Sql(&'static str),
    /// Add `column` to `table` unless it already exists.
    AddColumn {
        table: &'static str,
        column: &'static str,
        definition: &'static str,
    },
}

/// A single embedded migration.
struct Migration {
    name: &'static str,
    steps: &'static [Step],
}

/// All migrations in order. New migrations are appended here.
const MIGRATIONS: &[Migration] = &[
    Migration {
        name: "000_init",
        steps: &[Step::Sql(include_str!("migrations/000_init.sql"))],
    },
    Migration {
        name: "001_workout_intensity",
        steps: &[Step::AddColumn {
            table: "workouts",
            column: "intensity",
            definition: "VARCHAR(20)",
        }],
    },
    Migration {
        name: "002_set_records",
        steps: &[
            Step::AddColumn {
                table: "workout_sets",
                column: "set_label",
                definition: "VARCHAR(20)",
            },
            Step::AddColumn {
                table: "workout_sets",
                column: "is_pr",
                definition: "INTEGER NOT NULL DEFAULT 0",
            },
            Step::AddColumn {
                table: "workout_sets",
                column: "pr_type",
                definition: "VARCHAR(20)",
            },
        ],
    },
    Migration {
        // SQLite rejects non-constant defaults on ADD COLUMN; inserts set it.
        name: "003_set_created_at",
        steps: &[Step::AddColumn {
            table: "workout_sets",
            column: "created_at",
            definition: "TEXT",
        }],
    },
    Migration {
        name: "004_indexes",
        steps: &[Step::Sql(include_str!("migrations/004_indexes.sql"))],
    },
    Migration {
        name: "005_set_tempo_rest",
        steps: &[
            Step::AddColumn {
                table: "workout_sets",
                column: "time_under_tension_seconds",
                definition: "INTEGER",
            },
            Step::AddColumn {
                table: "workout_sets",
                column: "rest_seconds_after",
                definition: "INTEGER",
            },
        ],
    },
];

/// Errors that can occur during migration execution.
#[derive(Debug, Error)]
pub enum MigrationError {
    /// A SQL statement within a migration failed.
    #[error("migration '{name}' failed: {source}")]
    ExecutionFailed {
        /// The name of the migration that failed.
        name: String,
        /// The underlying SQLite error.
        source: rusqlite::Error,
    },

    /// Failed to query migration state.
    #[error("failed to check migration state: {0}")]
    StateQuery(rusqlite::Error),
}

/// Returns whether `table` has a column named `column` (case-insensitive,
/// as SQLite identifiers are).
pub fn column_exists(conn: &Connection, table: &str, column: &str) -> rusqlite::Result<bool> {
    conn.query_row(
        "SELECT COUNT(*) > 0 FROM pragma_table_info(?1) WHERE lower(name) = lower(?2)",
        params![table, column],
        |row| row.get(0),
    )
}

/// Adds `column` with the given SQL `definition` to `table` if it is missing.
///
/// Returns `true` when the column was added and `false` when it was already
/// present. Applying the guard any number of times leaves the same schema.
/// `table`, `column` and `definition` are spliced into DDL and must come from
/// trusted, static input.
///
/// # Errors
///
/// Returns the SQLite error if the table does not exist or the `ALTER TABLE`
/// is rejected.
pub fn ensure_column(
    conn: &Connection,
    table: &str,
    column: &str,
    definition: &str,
) -> rusqlite::Result<bool> {
    if column_exists(conn, table, column)? {
        tracing::debug!(table, column, "column already present, skipping");
        return Ok(false);
    }

    tracing::info!(table, column, definition, "adding column");
    conn.execute_batch(&format!(
        "ALTER TABLE \"{table}\" ADD COLUMN \"{column}\" {definition};"
    ))?;
    Ok(true)
}

/// Runs all pending migrations against the given connection.
///
/// Migrations that have already been applied (tracked in
/// `_ironlog_migrations`) are skipped. New migrations are applied in order,
/// each inside its own transaction together with its tracking row.
///
/// # Errors
///
/// Returns `MigrationError` if any migration fails to execute or if the
/// migration tracking table cannot be queried.
pub fn run_migrations(conn: &Connection) -> Result<usize, MigrationError> {
    run_migrations_from_list(conn, MIGRATIONS)
}

fn apply_step(conn: &Connection, step: &Step) -> rusqlite::Result<()> {
    match step {
        Step::Sql(sql) => conn.execute_batch(sql),
        Step::AddColumn {
            table,
            column,
            definition,
        } => ensure_column(conn, table, column, definition).map(|_| ()),
    }
}

fn run_migrations_from_list(
    conn: &Connection,
    migrations: &[Migration],
) -> Result<usize, MigrationError> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS _ironlog_migrations (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );",
    )
    .map_err(|e| MigrationError::ExecutionFailed {
        name: "_ironlog_migrations_bootstrap".to_string(),
        source: e,
    })?;

    let mut applied = 0;

    for migration in migrations {
        let already_applied: bool = conn
            .query_row(
                "SELECT COUNT(*) > 0 FROM _ironlog_migrations WHERE name = ?1",
                [migration.name],
                |row| row.get(0),
            )
            .map_err(MigrationError::StateQuery)?;

        if already_applied {
            tracing::debug!(
                migration = migration.name,
                "migration already applied, skipping"
            );
            continue;
        }

        tracing::info!(migration = migration.name, "applying migration");

        let failed = |e| MigrationError::ExecutionFailed {
            name: migration.name.to_string(),
            source: e,
        };

        let tx = conn.unchecked_transaction().map_err(failed)?;

        for step in migration.steps {
            apply_step(&tx, step).map_err(failed)?;
        }

        tx.execute(
            "INSERT INTO _ironlog_migrations (name) VALUES (?1)",
            [migration.name],
        )
        .map_err(failed)?;

        tx.commit().map_err(failed)?;

        applied += 1;
    }

    Ok(applied)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    /// Structural fingerprint: every object name plus, for tables, each
    /// column's name, declared type, nullability and default.
    fn schema_of(conn: &Connection) -> Vec<String> {
        let mut stmt = conn
            .prepare(
                "SELECT type, name FROM sqlite_master
                 WHERE name NOT LIKE 'sqlite_%'
                 ORDER BY name",
            )
            .unwrap();
        let objects: Vec<(String, String)> = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))
            .unwrap()
            .map(|r| r.unwrap())
            .collect();

        let mut fingerprint = Vec::new();
        for (kind, name) in objects {
            fingerprint.push(format!("{kind} {name}"));
            if kind != "table" {
                continue;
            }
            let mut cols = conn
                .prepare(
                    "SELECT name, type, \"notnull\", dflt_value FROM pragma_table_info(?1) ORDER BY cid",
                )
                .unwrap();
            let rows = cols
                .query_map([&name], |row| {
                    Ok(format!(
                        "  {} {} notnull={} default={:?}",
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, i64>(2)?,
                        row.get::<_, Option<String>>(3)?
                    ))
                })
                .unwrap();
            for row in rows {
                fingerprint.push(row.unwrap());
            }
        }
        fingerprint
    }

    #[test]
    fn run_migrations_on_fresh_db() {
        let conn = Connection::open_in_memory().expect("should open in-memory db");
        let applied = run_migrations(&conn).expect("migrations should succeed");
        assert_eq!(applied, MIGRATIONS.len());

        let count: usize = conn
            .query_row("SELECT COUNT(*) FROM _ironlog_migrations", [], |row| {
                row.get(0)
            })
            .expect("should query migration count");
        assert_eq!(count, MIGRATIONS.len());

        assert!(column_exists(&conn, "workouts", "intensity").unwrap());
        assert!(column_exists(&conn, "workout_sets", "is_pr").unwrap());
        assert!(column_exists(&conn, "workout_sets", "created_at").unwrap());
    }

    #[test]
    fn run_migrations_idempotent() {
        let conn = Connection::open_in_memory().expect("should open in-memory db");

        let first = run_migrations(&conn).expect("first run should succeed");
        assert_eq!(first, MIGRATIONS.len());
        let before = schema_of(&conn);

        let second = run_migrations(&conn).expect("second run should succeed");
        assert_eq!(second, 0, "no new migrations to apply");
        assert_eq!(schema_of(&conn), before);
    }

    #[test]
    fn ensure_column_twice_is_a_no_op() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE workouts (id INTEGER PRIMARY KEY);")
            .unwrap();

        assert!(ensure_column(&conn, "workouts", "intensity", "VARCHAR(20)").unwrap());
        let after_first = schema_of(&conn);

        assert!(!ensure_column(&conn, "workouts", "intensity", "VARCHAR(20)").unwrap());
        assert_eq!(schema_of(&conn), after_first);

        let columns: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM pragma_table_info('workouts') WHERE name = 'intensity'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(columns, 1, "no duplicate column");
    }

    #[test]
    fn ensure_column_matches_case_insensitively() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE workouts (id INTEGER PRIMARY KEY, Intensity TEXT);")
            .unwrap();
        assert!(!ensure_column(&conn, "workouts", "intensity", "VARCHAR(20)").unwrap());
    }

    #[test]
    fn ensure_column_on_missing_table_fails() {
        let conn = Connection::open_in_memory().unwrap();
        assert!(ensure_column(&conn, "nope", "intensity", "VARCHAR(20)").is_err());
    }

    #[test]
    fn pre_existing_column_without_tracking_row_converges() {
        let conn = Connection::open_in_memory().unwrap();
        // Simulates a database patched by hand before the tracking table existed.
        conn.execute_batch(include_str!("migrations/000_init.sql"))
            .unwrap();
        conn.execute_batch("ALTER TABLE workouts ADD COLUMN intensity VARCHAR(20);")
            .unwrap();

        let applied = run_migrations(&conn).expect("migrations should converge");
        assert_eq!(applied, MIGRATIONS.len());

        let fresh = Connection::open_in_memory().unwrap();
        run_migrations(&fresh).unwrap();
        assert_eq!(schema_of(&conn), schema_of(&fresh));
    }

    #[test]
    fn migration_side_effects_rollback_when_tracking_insert_fails() {
        let conn = Connection::open_in_memory().expect("should open in-memory db");
        let migrations = [Migration {
            name: "001_tracking_insert_conflict",
            steps: &[Step::Sql(
                "
                CREATE TABLE rollback_marker (id INTEGER PRIMARY KEY);
                INSERT INTO _ironlog_migrations (name) VALUES ('001_tracking_insert_conflict');
            ",
            )],
        }];

        let err = run_migrations_from_list(&conn, &migrations)
            .expect_err("tracking insert conflict should fail migration");

        match err {
            MigrationError::ExecutionFailed { name, .. } => {
                assert_eq!(name, "001_tracking_insert_conflict")
            }
            other => panic!("unexpected error type: {other:?}"),
        }

        let exists: bool = conn
            .query_row(
                "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = 'rollback_marker')",
                [],
                |row| row.get(0),
            )
            .expect("should query sqlite_master");

        assert!(
            !exists,
            "schema side effects should be rolled back when tracking insert fails"
        );
    }

    #[test]
    fn failed_guard_rolls_back_earlier_steps() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE scratch (id INTEGER PRIMARY KEY);")
            .unwrap();
        let migrations = [Migration {
            name: "001_half_applied",
            steps: &[
                Step::AddColumn {
                    table: "scratch",
                    column: "label",
                    definition: "TEXT",
                },
                Step::AddColumn {
                    table: "missing_table",
                    column: "label",
                    definition: "TEXT",
                },
            ],
        }];

        assert!(run_migrations_from_list(&conn, &migrations).is_err());
        assert!(!column_exists(&conn, "scratch", "label").unwrap());
    }
}
