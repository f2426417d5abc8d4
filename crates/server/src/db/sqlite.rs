use async_trait::async_trait;
use log::info;
use serde::Deserialize;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow},
    Row,
};
use std::{path::Path, str::FromStr, time::Duration};

use super::{PropertyQuery, PropertyRecord, PropertyStore, StoreError};

const SELECT_PAGE: &str = "SELECT id, name, city, state, country, lat, lng, is_active
     FROM properties
     WHERE (?1 IS NULL
            OR instr(name, ?1) > 0
            OR instr(city, ?1) > 0
            OR instr(state, ?1) > 0)
     ORDER BY id ASC
     LIMIT ?2 OFFSET ?3";

/// A listing to insert, as found in seed files
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProperty {
    pub name: String,
    pub city: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    #[serde(default = "super::default_active")]
    pub is_active: bool,
}

pub struct Database {
    pool: SqlitePool,
}

impl Database {
    pub async fn new(path: &Path) -> Result<Self, StoreError> {
        let db_path = path.join("properties.sqlite");

        let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", db_path.display()))?
            .create_if_missing(true)
            .pragma("journal_mode", "WAL")
            .pragma("synchronous", "NORMAL")
            .pragma("busy_timeout", "5000")
            .pragma("temp_store", "MEMORY");

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(30))
            .connect_with(options)
            .await?;

        let db = Self { pool };
        db.run_migrations().await?;
        info!("SQLite database initialized at: {}", db_path.display());

        Ok(db)
    }

    /// Private in-memory database. A single connection that never idles out keeps the
    /// data alive for as long as the pool exists.
    pub async fn in_memory() -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?;
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        let db = Self { pool };
        db.run_migrations().await?;
        Ok(db)
    }

    async fn run_migrations(&self) -> Result<(), StoreError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    /// Check database connectivity
    pub async fn health_check(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").fetch_one(&self.pool).await?;
        Ok(())
    }

    pub async fn count(&self) -> Result<i64, StoreError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM properties")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Insert listings in one transaction, returning their assigned ids in order
    pub async fn insert_properties(
        &self,
        properties: &[NewProperty],
    ) -> Result<Vec<i64>, StoreError> {
        let mut tx = self.pool.begin().await?;
        let mut ids = Vec::with_capacity(properties.len());

        for property in properties {
            let result = sqlx::query(
                "INSERT INTO properties (name, city, state, country, lat, lng, is_active)
                 VALUES (?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(property.name.as_str())
            .bind(property.city.as_deref())
            .bind(property.state.as_deref())
            .bind(property.country.as_deref())
            .bind(property.lat)
            .bind(property.lng)
            .bind(property.is_active)
            .execute(&mut *tx)
            .await?;
            ids.push(result.last_insert_rowid());
        }

        tx.commit().await?;
        Ok(ids)
    }

    /// Load listings from a JSON array file, only when the table is still empty.
    /// Returns how many rows were inserted.
    pub async fn seed_from_file(&self, seed_file: &Path) -> Result<usize, StoreError> {
        if self.count().await? > 0 {
            info!("property table already populated, skipping seed");
            return Ok(0);
        }

        let content = tokio::fs::read_to_string(seed_file)
            .await
            .map_err(|e| StoreError::Seed(format!("{}: {}", seed_file.display(), e)))?;
        let properties: Vec<NewProperty> = serde_json::from_str(&content)
            .map_err(|e| StoreError::Seed(format!("{}: {}", seed_file.display(), e)))?;

        let ids = self.insert_properties(&properties).await?;
        info!(
            "seeded {} properties from {}",
            ids.len(),
            seed_file.display()
        );
        Ok(ids.len())
    }

    fn row_to_property(row: &SqliteRow) -> Result<PropertyRecord, StoreError> {
        Ok(PropertyRecord {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            city: row.try_get("city")?,
            state: row.try_get("state")?,
            country: row.try_get("country")?,
            lat: row.try_get("lat")?,
            lng: row.try_get("lng")?,
            is_active: row.try_get("is_active")?,
        })
    }
}

#[async_trait]
impl PropertyStore for Database {
    async fn find(&self, query: &PropertyQuery) -> Result<Vec<PropertyRecord>, StoreError> {
        let rows = sqlx::query(SELECT_PAGE)
            .bind(query.search.as_deref())
            .bind(query.take)
            .bind(query.skip)
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(Self::row_to_property).collect()
    }
}
