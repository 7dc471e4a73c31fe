use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow},
    Pool, Row, Sqlite,
};
use std::{fs, path::Path, str::FromStr};
use tracing::debug;

use shared::domain::{Medicine, MedicineId};

/// Access to the on-device medicine table. Everything that reads or writes
/// cached medicines goes through this trait.
#[async_trait]
pub trait MedicineStore: Send + Sync {
    /// Inserts every record, replacing any stored record with the same id.
    /// The batch is applied atomically.
    async fn upsert_all(&self, records: &[Medicine]) -> Result<()>;
    async fn get_all(&self) -> Result<Vec<Medicine>>;
    async fn get_by_id(&self, id: &MedicineId) -> Result<Option<Medicine>>;
}

#[derive(Clone)]
pub struct Storage {
    pool: Pool<Sqlite>,
}

impl Storage {
    pub async fn new(database_url: &str) -> Result<Self> {
        create_database_dir(database_url)?;

        let connect_options = SqliteConnectOptions::from_str(database_url)
            .with_context(|| format!("invalid sqlite url '{database_url}'"))?
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(connect_options)
            .await
            .with_context(|| format!("failed to open sqlite database '{database_url}'"))?;
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .context("failed to run storage migrations")?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    pub async fn health_check(&self) -> Result<()> {
        let _: i64 = sqlx::query_scalar("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .context("sqlite ping failed")?;
        Ok(())
    }

    pub async fn count_medicines(&self) -> Result<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM arlibmedicines")
            .fetch_one(&self.pool)
            .await?;
        Ok(u64::try_from(count).unwrap_or_default())
    }
}

#[async_trait]
impl MedicineStore for Storage {
    async fn upsert_all(&self, records: &[Medicine]) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        for record in records {
            sqlx::query(
                "INSERT INTO arlibmedicines (id, name, dose, strength, description)
                 VALUES (?, ?, ?, ?, ?)
                 ON CONFLICT(id) DO UPDATE SET
                    name = excluded.name,
                    dose = excluded.dose,
                    strength = excluded.strength,
                    description = excluded.description",
            )
            .bind(record.id.as_str())
            .bind(record.name.as_deref())
            .bind(record.dose.as_deref())
            .bind(record.strength.as_deref())
            .bind(record.description.as_deref())
            .execute(&mut *tx)
            .await
            .with_context(|| format!("failed to upsert medicine id={}", record.id))?;
        }
        tx.commit().await.context("failed to commit medicine batch")?;
        debug!(records = records.len(), "medicine batch upserted");
        Ok(())
    }

    async fn get_all(&self) -> Result<Vec<Medicine>> {
        let rows = sqlx::query(
            "SELECT id, name, dose, strength, description FROM arlibmedicines ORDER BY id ASC",
        )
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(medicine_from_row).collect()
    }

    async fn get_by_id(&self, id: &MedicineId) -> Result<Option<Medicine>> {
        let row = sqlx::query(
            "SELECT id, name, dose, strength, description FROM arlibmedicines WHERE id = ?",
        )
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(medicine_from_row).transpose()
    }
}

fn medicine_from_row(row: &SqliteRow) -> Result<Medicine> {
    let raw_id: String = row.try_get("id")?;
    let id = MedicineId::new(raw_id).context("stored medicine has an empty id")?;
    Ok(Medicine {
        id,
        name: row.try_get("name")?,
        dose: row.try_get("dose")?,
        strength: row.try_get("strength")?,
        description: row.try_get("description")?,
    })
}

/// File backing a `sqlite:` URL. In-memory and non-sqlite URLs have none.
fn database_file(database_url: &str) -> Option<&Path> {
    let rest = database_url
        .strip_prefix("sqlite://")
        .or_else(|| database_url.strip_prefix("sqlite:"))?;
    let path = rest.split('?').next().unwrap_or_default();
    if path.is_empty() || path == ":memory:" {
        return None;
    }
    Some(Path::new(path))
}

fn create_database_dir(database_url: &str) -> Result<()> {
    let Some(dir) = database_file(database_url).and_then(Path::parent) else {
        return Ok(());
    };
    fs::create_dir_all(dir).with_context(|| {
        format!(
            "failed to create directory '{}' for database '{database_url}'",
            dir.display()
        )
    })
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
