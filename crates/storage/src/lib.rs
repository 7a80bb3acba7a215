use anyhow::{bail, Context, Result};
use shared::{
    domain::{weight_from_column, Gender, Pet, PetFields, PetId, PetRow, Projection, Selection},
    uri::PetUri,
};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow},
    Pool, Row, Sqlite,
};
use std::{
    fs,
    path::{Path, PathBuf},
    str::FromStr,
};
use tokio::sync::broadcast;
use tracing::{debug, info};

const CHANGE_CHANNEL_CAPACITY: usize = 64;
const MEMORY_URL: &str = "sqlite::memory:";

/// What a successful write did to the `pets` table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Inserted,
    Updated,
    Deleted,
}

/// Published after every write that touched at least one row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PetChange {
    pub uri: PetUri,
    pub kind: ChangeKind,
}

#[derive(Clone)]
pub struct PetStore {
    pool: Pool<Sqlite>,
    changes: broadcast::Sender<PetChange>,
}

impl PetStore {
    pub async fn new(database_url: &str) -> Result<Self> {
        ensure_sqlite_parent_dir_exists(database_url)?;

        let connect_options = SqliteConnectOptions::from_str(database_url)
            .with_context(|| format!("invalid sqlite database url '{database_url}'"))?
            .create_if_missing(true);

        // Every connection to `sqlite::memory:` opens its own empty database, so
        // the pool is pinned to one connection that is never recycled.
        let pool_options = if is_memory_url(database_url) {
            SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(5)
        };

        let pool = pool_options
            .connect_with(connect_options)
            .await
            .with_context(|| format!("failed to open sqlite database '{database_url}'"))?;
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .context("failed to run pet store migrations")?;

        info!(%database_url, "pet store ready");
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Ok(Self { pool, changes })
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

    /// Receives a [`PetChange`] for each write made through this store or its clones.
    pub fn subscribe(&self) -> broadcast::Receiver<PetChange> {
        self.changes.subscribe()
    }

    pub async fn insert(&self, fields: &PetFields) -> Result<PetId> {
        let rec = sqlx::query(
            "INSERT INTO pets (name, breed, gender, weight) VALUES (?, ?, ?, ?) RETURNING _id",
        )
        .bind(fields.name.as_str())
        .bind(fields.breed.as_str())
        .bind(fields.gender.code())
        .bind(fields.weight_column())
        .fetch_one(&self.pool)
        .await
        .context("failed to insert pet")?;

        let id = PetId(rec.try_get::<i64, _>(0)?);
        debug!(pet_id = id.0, "inserted pet");
        self.notify(PetUri::Item(id), ChangeKind::Inserted);
        Ok(id)
    }

    pub async fn update(&self, id: PetId, fields: &PetFields) -> Result<u64> {
        let updated = sqlx::query(
            "UPDATE pets SET name = ?, breed = ?, gender = ?, weight = ? WHERE _id = ?",
        )
        .bind(fields.name.as_str())
        .bind(fields.breed.as_str())
        .bind(fields.gender.code())
        .bind(fields.weight_column())
        .bind(id.0)
        .execute(&self.pool)
        .await
        .with_context(|| format!("failed to update pet {id}"))?
        .rows_affected();

        debug!(pet_id = id.0, updated, "updated pet");
        if updated > 0 {
            self.notify(PetUri::Item(id), ChangeKind::Updated);
        }
        Ok(updated)
    }

    pub async fn delete(&self, selection: Selection) -> Result<u64> {
        let deleted = match selection {
            Selection::All => sqlx::query("DELETE FROM pets").execute(&self.pool).await,
            Selection::Id(id) => {
                sqlx::query("DELETE FROM pets WHERE _id = ?")
                    .bind(id.0)
                    .execute(&self.pool)
                    .await
            }
        }
        .context("failed to delete pets")?
        .rows_affected();

        debug!(?selection, deleted, "deleted pets");
        if deleted > 0 {
            self.notify(PetUri::from(selection), ChangeKind::Deleted);
        }
        Ok(deleted)
    }

    /// Rows matching `selection`, ordered by id ascending.
    pub async fn query(&self, selection: Selection, projection: Projection) -> Result<Vec<PetRow>> {
        let columns = match projection {
            Projection::Full => "_id, name, breed, gender, weight",
            Projection::Summary => "_id, name, breed",
        };

        let sql = match selection {
            Selection::All => format!("SELECT {columns} FROM pets ORDER BY _id ASC"),
            Selection::Id(_) => format!("SELECT {columns} FROM pets WHERE _id = ? ORDER BY _id ASC"),
        };

        let mut query = sqlx::query(&sql);
        if let Selection::Id(id) = selection {
            query = query.bind(id.0);
        }
        let rows = query
            .fetch_all(&self.pool)
            .await
            .context("failed to query pets")?;

        rows.iter()
            .map(|row| decode_row(row, projection))
            .collect()
    }

    /// Rows addressed by `uri`; the collection uri reads every pet.
    pub async fn query_uri(&self, uri: PetUri, projection: Projection) -> Result<Vec<PetRow>> {
        self.query(uri.into(), projection).await
    }

    /// Loads one pet by id. More than one matching row is treated as corruption.
    pub async fn get(&self, id: PetId) -> Result<Option<Pet>> {
        let mut rows = self.query(Selection::Id(id), Projection::Full).await?;
        if rows.len() > 1 {
            bail!("expected at most one pet with id {id}, found {}", rows.len());
        }
        Ok(rows.pop().and_then(PetRow::into_pet))
    }

    pub async fn count(&self) -> Result<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM pets")
            .fetch_one(&self.pool)
            .await
            .context("failed to count pets")?;
        Ok(u64::try_from(count).unwrap_or_default())
    }

    fn notify(&self, uri: PetUri, kind: ChangeKind) {
        // No subscribers is not an error.
        let _ = self.changes.send(PetChange { uri, kind });
    }
}

fn decode_row(row: &SqliteRow, projection: Projection) -> Result<PetRow> {
    let id = PetId(row.try_get::<i64, _>("_id")?);
    let name = row.try_get::<Option<String>, _>("name")?.unwrap_or_default();
    let breed = row.try_get::<Option<String>, _>("breed")?.unwrap_or_default();

    let (gender, weight) = match projection {
        Projection::Summary => (None, None),
        Projection::Full => {
            let gender = Gender::from_code(row.try_get::<i64, _>("gender")?)
                .with_context(|| format!("pet {id} has an invalid gender"))?;
            let weight = weight_from_column(row.try_get::<i64, _>("weight")?)
                .with_context(|| format!("pet {id} has an invalid weight"))?;
            (Some(gender), Some(weight))
        }
    };

    Ok(PetRow {
        id,
        name,
        breed,
        gender,
        weight,
    })
}

fn is_memory_url(database_url: &str) -> bool {
    database_url.starts_with(MEMORY_URL) || database_url.contains("mode=memory")
}

fn ensure_sqlite_parent_dir_exists(database_url: &str) -> Result<()> {
    let Some(path) = sqlite_path(database_url) else {
        return Ok(());
    };

    let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) else {
        return Ok(());
    };

    fs::create_dir_all(parent).with_context(|| {
        format!(
            "failed to create parent directory '{}' for database url '{database_url}'",
            parent.display()
        )
    })?;

    Ok(())
}

fn sqlite_path(database_url: &str) -> Option<PathBuf> {
    if is_memory_url(database_url) || !database_url.starts_with("sqlite:") {
        return None;
    }

    let path = database_url
        .trim_start_matches("sqlite://")
        .trim_start_matches("sqlite:")
        .split('?')
        .next()
        .unwrap_or_default();

    if path.is_empty() {
        return None;
    }

    Some(Path::new(path).to_path_buf())
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
