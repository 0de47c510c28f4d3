//! Single-statement partial updates.
//!
//! Only the columns a patch actually names are written, in one `UPDATE`, so
//! there is no read-modify-write window for the untouched columns.

use rusqlite::types::ToSql;
use rusqlite::Connection;

pub(crate) struct Assignments {
    columns: Vec<&'static str>,
    values: Vec<Box<dyn ToSql>>,
}

impl Assignments {
    pub(crate) fn new() -> Self {
        Self {
            columns: Vec::new(),
            values: Vec::new(),
        }
    }

    pub(crate) fn set<T: ToSql + 'static>(&mut self, column: &'static str, value: T) {
        self.columns.push(column);
        self.values.push(Box::new(value));
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Runs `UPDATE table SET ... WHERE key1 = ? AND ...` and returns the
    /// number of rows changed.
    pub(crate) fn apply(
        self,
        conn: &Connection,
        table: &str,
        keys: &[(&str, i64)],
    ) -> rusqlite::Result<usize> {
        let mut idx = 1usize;
        let mut set_parts = Vec::with_capacity(self.columns.len());
        for column in &self.columns {
            set_parts.push(format!("{column} = ?{idx}"));
            idx += 1;
        }

        let mut values = self.values;
        let mut where_parts = Vec::with_capacity(keys.len());
        for (column, value) in keys {
            where_parts.push(format!("{column} = ?{idx}"));
            values.push(Box::new(*value));
            idx += 1;
        }

        let sql = format!(
            "UPDATE {table} SET {} WHERE {}",
            set_parts.join(", "),
            where_parts.join(" AND ")
        );
        let params: Vec<&dyn ToSql> = values.iter().map(|v| v.as_ref()).collect();
        conn.execute(&sql, params.as_slice())
    }
}
