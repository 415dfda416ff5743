use std::collections::HashSet;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use rusqlite::{Connection, OptionalExtension, params, params_from_iter};
use tracing::debug;

use crate::league::{EntityKind, League};
use crate::rows::Row;
use crate::schema::{TableSpec, all_tables};

/// The persisted SQLite store: one teams, players and results table per
/// league. Writes are `INSERT OR REPLACE` keyed on the natural key, so
/// re-importing a batch converges on the same rows.
pub struct Store {
    conn: Connection,
    path: Option<PathBuf>,
}

impl Store {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create store directory {}", parent.display()))?;
        }
        let conn =
            Connection::open(path).with_context(|| format!("open sqlite db {}", path.display()))?;
        init_schema(&conn)?;
        Ok(Self {
            conn,
            path: Some(path.to_path_buf()),
        })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("open in-memory sqlite db")?;
        init_schema(&conn)?;
        Ok(Self { conn, path: None })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Writes `rows` into the (league, kind) table inside one transaction and
    /// returns how many were written. Any failing row rolls the batch back.
    pub fn upsert<R: Row>(&mut self, league: League, kind: EntityKind, rows: &[R]) -> Result<usize> {
        if rows.is_empty() {
            return Ok(0);
        }
        let spec = TableSpec::for_slice(league, kind);
        let sql = spec.upsert_sql();
        let tx = self.conn.transaction().context("begin upsert transaction")?;
        {
            let mut stmt = tx
                .prepare_cached(&sql)
                .with_context(|| format!("prepare upsert into {}", spec.name))?;
            for row in rows {
                let values = spec.columns.iter().map(|col| row.column(col));
                stmt.execute(params_from_iter(values)).with_context(|| {
                    format!(
                        "upsert {} {:?} into {}",
                        spec.key,
                        row.natural_key(),
                        spec.name
                    )
                })?;
            }
        }
        tx.commit().context("commit upsert transaction")?;
        debug!(table = %spec.name, rows = rows.len(), "upserted");
        Ok(rows.len())
    }

    pub fn team_ids(&self, league: League) -> Result<HashSet<String>> {
        let spec = TableSpec::for_slice(league, EntityKind::Teams);
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT team_id FROM {}", spec.name))
            .context("prepare team id query")?;
        let rows = stmt
            .query_map([], |row| row.get::<_, String>(0))
            .context("query team ids")?;
        let mut out = HashSet::new();
        for row in rows {
            out.insert(row.context("decode team id")?);
        }
        Ok(out)
    }

    pub fn count(&self, league: League, kind: EntityKind) -> Result<usize> {
        let spec = TableSpec::for_slice(league, kind);
        let n = self
            .conn
            .query_row(&format!("SELECT COUNT(*) FROM {}", spec.name), [], |row| {
                row.get::<_, i64>(0)
            })
            .with_context(|| format!("count rows in {}", spec.name))?;
        Ok(usize::try_from(n).unwrap_or(0))
    }

    pub fn player_ids_for_team(&self, league: League, team_id: &str) -> Result<Vec<String>> {
        let spec = TableSpec::for_slice(league, EntityKind::Players);
        let mut stmt = self
            .conn
            .prepare(&format!(
                "SELECT player_id FROM {} WHERE team_id = ?1 ORDER BY player_id",
                spec.name
            ))
            .context("prepare roster query")?;
        let rows = stmt
            .query_map(params![team_id], |row| row.get::<_, String>(0))
            .context("query roster")?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row.context("decode player id")?);
        }
        Ok(out)
    }

    /// One stored column of the row keyed by `key`. Outer `None` means no
    /// such row.
    pub fn text_column(
        &self,
        league: League,
        kind: EntityKind,
        key: &str,
        column: &str,
    ) -> Result<Option<Option<String>>> {
        let spec = TableSpec::for_slice(league, kind);
        if !spec.columns.iter().any(|col| *col == column) {
            bail!("{} has no column {column}", spec.name);
        }
        self.conn
            .query_row(
                &format!("SELECT {column} FROM {} WHERE {} = ?1", spec.name, spec.key),
                params![key],
                |row| row.get::<_, Option<String>>(0),
            )
            .optional()
            .with_context(|| format!("read {column} from {}", spec.name))
    }

    pub fn distinct_values(&self, league: League, kind: EntityKind, column: &str) -> Result<Vec<String>> {
        let spec = TableSpec::for_slice(league, kind);
        if !spec.columns.iter().any(|col| *col == column) {
            bail!("{} has no column {column}", spec.name);
        }
        let mut stmt = self
            .conn
            .prepare(&format!(
                "SELECT DISTINCT {column} FROM {} WHERE {column} IS NOT NULL ORDER BY {column}",
                spec.name
            ))
            .context("prepare distinct query")?;
        let rows = stmt
            .query_map([], |row| row.get::<_, String>(0))
            .context("query distinct values")?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row.context("decode distinct value")?);
        }
        Ok(out)
    }

    /// Closes the connection so the file on disk is complete before it is
    /// copied anywhere.
    pub fn close(self) -> Result<()> {
        self.conn
            .close()
            .map_err(|(_, err)| err)
            .context("close sqlite db")
    }
}

fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")
        .context("enable foreign keys")?;
    for spec in all_tables() {
        conn.execute_batch(&spec.create_sql())
            .with_context(|| format!("create table {}", spec.name))?;
    }
    Ok(())
}
