//! In-memory SQLite table store.
//!
//! RULE: Only store/ talks to the database.
//! The dataset is inserted once by `load_dataset`; every other method
//! is a read. Filters become WHERE clauses; an empty selection adds no
//! clause at all.

use rusqlite::{types::Value, Connection};

use crate::{dataset::Dataset, error::DashResult};

mod basic;
mod regulator;

pub struct DashStore {
    conn: Connection,
}

impl DashStore {
    /// Open a private in-memory database.
    pub fn in_memory() -> DashResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn })
    }

    /// Apply all schema migrations in order.
    pub fn migrate(&self) -> DashResult<()> {
        self.conn
            .execute_batch(include_str!("../../migrations/001_dataset.sql"))?;
        Ok(())
    }

    /// Open, migrate and fill in one step.
    pub fn with_dataset(dataset: &Dataset) -> DashResult<Self> {
        let mut store = Self::in_memory()?;
        store.migrate()?;
        store.load_dataset(dataset)?;
        Ok(store)
    }

    /// Insert every table in a single transaction. Any bad row rolls
    /// back the whole load.
    pub fn load_dataset(&mut self, dataset: &Dataset) -> DashResult<()> {
        let tx = self.conn.transaction()?;
        basic::insert_all(&tx, &dataset.basic)?;
        regulator::insert_all(&tx, &dataset.regulator)?;
        tx.commit()?;
        log::debug!("store: loaded dataset seed={}", dataset.seed);
        Ok(())
    }

    /// Row count of a table (for tests and summaries).
    pub fn row_count(&self, table: &str) -> DashResult<i64> {
        let allowed = [
            "mine",
            "mine_financials",
            "stakeholder",
            "stakeholder_txn",
            "site",
            "site_area",
            "financial_record",
            "official",
            "txn",
            "connection",
        ];
        if !allowed.contains(&table) {
            return Err(crate::error::DashError::InvalidInput(format!(
                "unknown table '{table}'"
            )));
        }
        let count: i64 = self
            .conn
            .query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get(0))?;
        Ok(count)
    }
}

/// Incrementally built WHERE clause with positional parameters.
#[derive(Default)]
struct WhereClause {
    clauses: Vec<String>,
    params: Vec<Value>,
}

impl WhereClause {
    /// `column IN (...)`; skipped entirely when `values` is empty.
    fn in_list<I>(&mut self, column: &str, values: I)
    where
        I: IntoIterator<Item = Value>,
    {
        let values: Vec<Value> = values.into_iter().collect();
        if values.is_empty() {
            return;
        }
        let placeholders = vec!["?"; values.len()].join(", ");
        self.clauses.push(format!("{column} IN ({placeholders})"));
        self.params.extend(values);
    }

    fn push(&mut self, clause: &str, params: impl IntoIterator<Item = Value>) {
        self.clauses.push(clause.to_string());
        self.params.extend(params);
    }

    fn sql(&self) -> String {
        if self.clauses.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", self.clauses.join(" AND "))
        }
    }
}

/// Map a stored enum label back to its type.
fn parse_column<T>(index: usize, raw: String, parse: fn(&str) -> Option<T>) -> rusqlite::Result<T> {
    parse(&raw).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            index,
            rusqlite::types::Type::Text,
            format!("unknown value '{raw}'").into(),
        )
    })
}

fn text(s: &str) -> Value {
    Value::Text(s.to_string())
}
