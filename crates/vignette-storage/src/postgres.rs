//! Postgres-backed asset store.
//!
//! Collection creation relies on the unique constraint on `collections.name`, so
//! concurrent first previews from separate processes still end up with one row.

use crate::keys::generate_storage_key;
use crate::traits::{AssetStore, StorageError, StorageResult};
use crate::StorageBackend;
use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Postgres, Row};
use std::time::Duration;
use uuid::Uuid;
use vignette_core::{AssetRef, CollectionRef};

const MAX_CONNECTIONS: u32 = 5;
const CONNECTION_TIMEOUT_SECS: u64 = 30;

/// Asset store writing collections and assets to Postgres
#[derive(Clone)]
pub struct PgAssetStore {
    pool: PgPool,
}

impl PgAssetStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect to `database_url` and apply pending migrations.
    pub async fn connect(database_url: &str) -> StorageResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(MAX_CONNECTIONS)
            .acquire_timeout(Duration::from_secs(CONNECTION_TIMEOUT_SECS))
            .connect(database_url)
            .await
            .map_err(|e| StorageError::ConfigError(format!("Failed to connect to database: {}", e)))?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| StorageError::ConfigError(format!("Failed to run migrations: {}", e)))?;

        Ok(Self::new(pool))
    }
}

#[async_trait]
impl AssetStore for PgAssetStore {
    #[tracing::instrument(skip(self), fields(db.table = "collections", db.operation = "upsert"))]
    async fn get_or_create_collection(&self, name: &str) -> StorageResult<CollectionRef> {
        if name.trim().is_empty() {
            return Err(StorageError::CollectionFailed(
                "Collection name must not be empty".to_string(),
            ));
        }

        let candidate = CollectionRef::named(name);

        // The no-op update makes RETURNING yield the existing row on conflict.
        let row = sqlx::query::<Postgres>(
            r#"
            INSERT INTO collections (id, name)
            VALUES ($1, $2)
            ON CONFLICT (name) DO UPDATE SET name = EXCLUDED.name
            RETURNING id, name
            "#,
        )
        .bind(candidate.id)
        .bind(name)
        .fetch_one(&self.pool)
        .await?;

        Ok(CollectionRef {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
        })
    }

    #[tracing::instrument(skip(self, data, collection), fields(db.table = "assets", db.operation = "insert", collection = %collection.name))]
    async fn create_asset(
        &self,
        data: Bytes,
        filename: &str,
        collection: &CollectionRef,
    ) -> StorageResult<AssetRef> {
        let id = Uuid::new_v4();
        let key = generate_storage_key(collection.id, id, filename);
        let size_bytes = data.len() as i64;

        let row = sqlx::query::<Postgres>(
            r#"
            INSERT INTO assets (id, collection_id, filename, storage_key, size_bytes, data)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING created_at
            "#,
        )
        .bind(id)
        .bind(collection.id)
        .bind(filename)
        .bind(&key)
        .bind(size_bytes)
        .bind(data.as_ref())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db) if db.is_foreign_key_violation() => {
                StorageError::CollectionFailed(format!("Unknown collection: {}", collection.name))
            }
            other => StorageError::Database(other),
        })?;

        let created_at: DateTime<Utc> = row.try_get("created_at")?;

        Ok(AssetRef {
            id,
            collection_id: collection.id,
            filename: filename.to_string(),
            storage_key: key,
            size_bytes: size_bytes as u64,
            created_at,
        })
    }

    #[tracing::instrument(skip(self, asset), fields(db.table = "assets", db.operation = "select", db.record_id = %asset.id))]
    async fn read_asset(&self, asset: &AssetRef) -> StorageResult<Bytes> {
        let data = sqlx::query_scalar::<Postgres, Vec<u8>>("SELECT data FROM assets WHERE id = $1")
            .bind(asset.id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StorageError::NotFound(asset.storage_key.clone()))?;

        Ok(Bytes::from(data))
    }

    async fn collections(&self) -> StorageResult<Vec<CollectionRef>> {
        let rows = sqlx::query::<Postgres>("SELECT id, name FROM collections ORDER BY name ASC")
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter()
            .map(|row| -> StorageResult<CollectionRef> {
                Ok(CollectionRef {
                    id: row.try_get("id")?,
                    name: row.try_get("name")?,
                })
            })
            .collect()
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Postgres
    }
}
