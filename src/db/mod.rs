mod schema;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension};
use rust_decimal::Decimal;
use std::path::Path;
use std::str::FromStr;

use crate::categorize::normalize;
use crate::models::*;
use crate::state::AppState;

const SELECTED_MONTH_KEY: &str = "selected_month";

pub(crate) struct Database {
    conn: Connection,
}

impl Database {
    pub(crate) fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database: {}", path.display()))?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")
            .context("Failed to set database pragmas")?;
        let mut db = Self { conn };
        db.migrate().context("Database migration failed")?;
        db.seed_default_budgets()?;
        Ok(db)
    }

    #[cfg(test)]
    pub(crate) fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        let mut db = Self { conn };
        db.migrate()?;
        db.seed_default_budgets()?;
        Ok(db)
    }

    fn migrate(&mut self) -> Result<()> {
        let has_version_table: bool = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version')",
            [],
            |row| row.get(0),
        )?;

        if !has_version_table {
            self.conn.execute_batch(schema::SCHEMA_V1)?;
            self.conn.execute(
                "INSERT INTO schema_version (version) VALUES (?1)",
                params![schema::CURRENT_VERSION],
            )?;
            return Ok(());
        }

        let current: i32 = self
            .conn
            .query_row("SELECT version FROM schema_version LIMIT 1", [], |row| {
                row.get(0)
            })
            .unwrap_or(0);

        for &(from_version, sql) in schema::MIGRATIONS {
            if current <= from_version {
                self.conn.execute_batch(sql)?;
            }
        }

        if current < schema::CURRENT_VERSION {
            self.conn.execute(
                "UPDATE schema_version SET version = ?1",
                params![schema::CURRENT_VERSION],
            )?;
        }

        Ok(())
    }

    fn seed_default_budgets(&mut self) -> Result<()> {
        let tx = self.conn.transaction()?;
        for category in Category::all() {
            tx.execute(
                "INSERT OR IGNORE INTO budgets (category, limit_amount) VALUES (?1, ?2)",
                params![category.key(), category.default_budget().to_string()],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    // ── State ─────────────────────────────────────────────────

    /// Write the whole state in one transaction. Transactions keep their order.
    pub(crate) fn save_state(&mut self, state: &AppState) -> Result<()> {
        let tx = self.conn.transaction()?;
        tx.execute("DELETE FROM transactions", [])?;
        for (seq, txn) in state.transactions.all().iter().enumerate() {
            tx.execute(
                "INSERT INTO transactions (id, seq, item, amount, kind, category, entry_date, month)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    txn.id,
                    seq as i64,
                    txn.item,
                    txn.amount.to_string(),
                    txn.kind.as_str(),
                    txn.category.key(),
                    txn.entry_date.format("%Y-%m-%d").to_string(),
                    txn.month.to_string(),
                ],
            )?;
        }
        for (category, limit) in state.budgets.iter() {
            tx.execute(
                "INSERT INTO budgets (category, limit_amount) VALUES (?1, ?2)
                 ON CONFLICT(category) DO UPDATE SET limit_amount = excluded.limit_amount",
                params![category.key(), limit.to_string()],
            )?;
        }
        tx.execute(
            "INSERT INTO settings (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![SELECTED_MONTH_KEY, state.selected_month.to_string()],
        )?;
        tx.commit()?;
        tracing::debug!(transactions = state.transactions.len(), "State saved");
        Ok(())
    }

    /// Read back a saved state, or `None` when nothing was ever saved.
    /// Rows that no longer parse are skipped with a warning.
    pub(crate) fn load_state(&self) -> Result<Option<AppState>> {
        let selected: Option<String> = self
            .conn
            .query_row(
                "SELECT value FROM settings WHERE key = ?1",
                params![SELECTED_MONTH_KEY],
                |row| row.get(0),
            )
            .optional()?;
        let Some(selected) = selected else {
            return Ok(None);
        };
        let selected_month = MonthKey::parse(&selected).unwrap_or_else(MonthKey::current);

        let mut state = AppState::new(selected_month);
        state.transactions = TransactionStore::from_vec(self.load_transactions()?);

        let mut stmt = self
            .conn
            .prepare("SELECT category, limit_amount FROM budgets")?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;
        for (key, amount) in rows.collect::<std::result::Result<Vec<_>, _>>()? {
            match Category::parse(&key) {
                Some(category) => {
                    state
                        .budgets
                        .set(category, Decimal::from_str(&amount).unwrap_or_default());
                }
                None => tracing::warn!(category = %key, "Skipping budget for unknown category"),
            }
        }

        Ok(Some(state))
    }

    fn load_transactions(&self) -> Result<Vec<Transaction>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, item, amount, category, entry_date FROM transactions ORDER BY seq",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, String>(4)?,
            ))
        })?;

        let mut txns = Vec::new();
        for (id, item, amount, category, date) in rows.collect::<std::result::Result<Vec<_>, _>>()? {
            let parsed = Category::parse(&category).zip(NaiveDate::parse_from_str(&date, "%Y-%m-%d").ok());
            let restored = parsed.and_then(|(category, date)| {
                Transaction::restore(
                    id.clone(),
                    item,
                    Decimal::from_str(&amount).unwrap_or_default(),
                    category,
                    date,
                )
                .ok()
            });
            match restored {
                Some(txn) => txns.push(txn),
                None => tracing::warn!(id = %id, "Skipping unreadable stored transaction"),
            }
        }
        Ok(txns)
    }

    // ── Learned categories ────────────────────────────────────

    pub(crate) fn learn_category(&self, item: &str, category: Category) -> Result<()> {
        let key = normalize(item);
        if key.is_empty() {
            return Ok(());
        }
        self.conn.execute(
            "INSERT INTO learned_categories (item, category, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(item) DO UPDATE SET category = excluded.category, updated_at = excluded.updated_at",
            params![key, category.key(), chrono::Local::now().to_rfc3339()],
        )?;
        Ok(())
    }

    pub(crate) fn learned_categories(&self) -> Result<Vec<(String, Category)>> {
        let mut stmt = self
            .conn
            .prepare("SELECT item, category FROM learned_categories ORDER BY item")?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;
        Ok(rows
            .collect::<std::result::Result<Vec<_>, _>>()?
            .into_iter()
            .filter_map(|(item, key)| Category::parse(&key).map(|c| (item, c)))
            .collect())
    }
}
