//! Database layer for the Ironlog service.
//!
//! Provides SQLite connection pooling (via `r2d2`), WAL-mode initialization,
//! embedded migrations, and the additive column guard used to evolve the
//! schema. Every table Ironlog touches is created through the migrations in
//! this crate.
//!
//! # Design decisions
//!
//! - **SQLite with WAL mode**: one file, no external database process.
//!   WAL allows concurrent readers with a single writer.
//! - **`r2d2` connection pool**: bounded connection reuse; a connection is
//!   checked out per request and returned when the guard drops.
//! - **Additive, guarded migrations**: schema changes only ever add tables,
//!   columns, or indexes, and every step can be re-run against a database
//!   that already has it.

mod migrations;
mod pool;

pub use migrations::{column_exists, ensure_column, run_migrations, MigrationError};
pub use pool::{create_pool, ping, DbPool, DbRuntimeSettings, PoolError};
