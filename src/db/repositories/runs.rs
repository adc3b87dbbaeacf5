use anyhow::{Context, Result};
use rusqlite::{params, OptionalExtension, Row};

use crate::db::{
    helpers::{parse_datetime, parse_optional_range, parse_unit, to_i64, to_u64},
    models::CompletedRun,
    Database,
};
use crate::gate::SpeedRange;

const RUN_COLUMNS: &str = "id, title, created_at, start_range, finish_range, elapsed_ms,
     optional_start_range, optional_finish_range, optional_elapsed_ms, unit";

fn row_to_run(row: &Row) -> Result<CompletedRun> {
    let created_at: String = row.get("created_at")?;
    let elapsed_ms: i64 = row.get("elapsed_ms")?;
    let optional_elapsed_ms: Option<i64> = row.get("optional_elapsed_ms")?;
    let unit: String = row.get("unit")?;

    Ok(CompletedRun {
        id: row.get("id")?,
        title: row.get("title")?,
        created_at: parse_datetime(&created_at, "created_at")?,
        primary_range: SpeedRange::new(row.get("start_range")?, row.get("finish_range")?)
            .context("failed to parse primary range")?,
        secondary_range: parse_optional_range(
            row.get("optional_start_range")?,
            row.get("optional_finish_range")?,
            "optional range",
        )?,
        elapsed_primary_ms: to_u64(elapsed_ms, "elapsed_ms")?,
        elapsed_secondary_ms: optional_elapsed_ms
            .map(|ms| to_u64(ms, "optional_elapsed_ms"))
            .transpose()?,
        unit: parse_unit(&unit)?,
    })
}

impl Database {
    pub async fn insert_run(&self, run: &CompletedRun) -> Result<()> {
        let record = run.clone();
        self.execute(move |conn| {
            conn.execute(
                "INSERT INTO runs (id, title, created_at, start_range, finish_range, elapsed_ms,
                                   optional_start_range, optional_finish_range, optional_elapsed_ms, unit)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                params![
                    record.id,
                    record.title,
                    record.created_at.to_rfc3339(),
                    record.primary_range.start(),
                    record.primary_range.finish(),
                    to_i64(record.elapsed_primary_ms)?,
                    record.secondary_range.map(|range| range.start()),
                    record.secondary_range.map(|range| range.finish()),
                    record.elapsed_secondary_ms.map(to_i64).transpose()?,
                    record.unit.as_str(),
                ],
            )
            .with_context(|| format!("failed to insert run {}", record.id))?;
            Ok(())
        })
        .await
    }

    pub async fn get_run(&self, run_id: &str) -> Result<Option<CompletedRun>> {
        let run_id = run_id.to_string();
        self.execute(move |conn| {
            let mut stmt = conn.prepare(&format!("SELECT {RUN_COLUMNS} FROM runs WHERE id = ?1"))?;
            let raw = stmt
                .query_row(params![run_id], |row| Ok(row_to_run(row)))
                .optional()?;
            raw.transpose()
        })
        .await
    }

    /// Newest first.
    pub async fn list_runs(&self) -> Result<Vec<CompletedRun>> {
        self.execute(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {RUN_COLUMNS} FROM runs ORDER BY created_at DESC, rowid DESC"
            ))?;

            let mut rows = stmt.query([])?;
            let mut runs = Vec::new();
            while let Some(row) = rows.next()? {
                runs.push(row_to_run(row)?);
            }

            Ok(runs)
        })
        .await
    }

    /// Returns whether a run was removed.
    pub async fn delete_run(&self, run_id: &str) -> Result<bool> {
        let run_id = run_id.to_string();
        self.execute(move |conn| {
            let removed = conn
                .execute("DELETE FROM runs WHERE id = ?1", params![run_id])
                .context("failed to delete run")?;
            Ok(removed > 0)
        })
        .await
    }
}
