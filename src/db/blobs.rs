//! Blob metadata queries. The bytes themselves live on disk.

use crate::{Error, Result};
use chrono::Utc;
use serde::Serialize;
use sqlx::FromRow;

use super::DbPool;

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct BlobRecord {
    pub path: String,
    pub owner_id: String,
    pub content_type: String,
    pub size_bytes: i64,
    pub created_at: String,
}

#[derive(Debug, Clone)]
pub struct CreateBlob {
    pub path: String,
    pub owner_id: String,
    pub content_type: String,
    pub size_bytes: i64,
}

pub async fn insert_blob(pool: &DbPool, input: CreateBlob) -> Result<BlobRecord> {
    sqlx::query_as::<_, BlobRecord>(
        r#"
        INSERT INTO blobs (path, owner_id, content_type, size_bytes, created_at)
        VALUES (?, ?, ?, ?, ?)
        ON CONFLICT(path) DO UPDATE SET
            content_type = excluded.content_type,
            size_bytes = excluded.size_bytes,
            created_at = excluded.created_at
        RETURNING *
        "#,
    )
    .bind(&input.path)
    .bind(&input.owner_id)
    .bind(&input.content_type)
    .bind(input.size_bytes)
    .bind(Utc::now().to_rfc3339())
    .fetch_one(pool)
    .await
    .map_err(Error::Database)
}

pub async fn get_blob(pool: &DbPool, path: &str) -> Result<Option<BlobRecord>> {
    sqlx::query_as::<_, BlobRecord>("SELECT * FROM blobs WHERE path = ?")
        .bind(path)
        .fetch_optional(pool)
        .await
        .map_err(Error::Database)
}
