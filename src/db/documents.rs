//! User document queries.
//!
//! Each user owns one JSON document. Every write bumps its revision so
//! subscribers can tell snapshots apart.

use crate::models::UserDocument;
use crate::{Error, Result};
use chrono::Utc;
use sqlx::{FromRow, SqliteConnection};
use tracing::warn;

use super::DbPool;

#[derive(Debug, Clone, FromRow)]
struct DocumentRow {
    body: String,
    revision: i64,
}

/// A decoded document together with its revision.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentSnapshot {
    pub revision: i64,
    pub document: UserDocument,
}

impl TryFrom<DocumentRow> for DocumentSnapshot {
    type Error = Error;

    fn try_from(row: DocumentRow) -> Result<Self> {
        Ok(Self {
            revision: row.revision,
            document: serde_json::from_str(&row.body)?,
        })
    }
}

pub async fn get_document(pool: &DbPool, user_id: &str) -> Result<Option<DocumentSnapshot>> {
    sqlx::query_as::<_, DocumentRow>(
        "SELECT body, revision FROM user_documents WHERE user_id = ?",
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await?
    .map(DocumentSnapshot::try_from)
    .transpose()
}

/// Replace the whole document, creating it if absent.
pub async fn put_document(
    pool: &DbPool,
    user_id: &str,
    document: &UserDocument,
) -> Result<DocumentSnapshot> {
    let body = serde_json::to_string(document)?;
    let (revision,): (i64,) = sqlx::query_as(
        r#"
        INSERT INTO user_documents (user_id, body, revision, updated_at)
        VALUES (?, ?, 1, ?)
        ON CONFLICT(user_id) DO UPDATE SET
            body = excluded.body,
            revision = user_documents.revision + 1,
            updated_at = excluded.updated_at
        RETURNING revision
        "#,
    )
    .bind(user_id)
    .bind(&body)
    .bind(Utc::now().to_rfc3339())
    .fetch_one(pool)
    .await?;

    Ok(DocumentSnapshot {
        revision,
        document: document.clone(),
    })
}

/// Read-modify-write inside one `BEGIN IMMEDIATE` transaction.
///
/// The write lock is taken before the read, so concurrent writers queue on
/// the busy timeout instead of failing on a stale snapshot. A missing
/// document starts from the default (empty profile, empty collections). If
/// `change` fails nothing is written.
///
/// Runs on its own task: a dropped caller cannot hand a connection with an
/// open transaction back to the pool.
pub async fn modify_document<F>(pool: &DbPool, user_id: &str, change: F) -> Result<DocumentSnapshot>
where
    F: FnOnce(&mut UserDocument) -> Result<()> + Send + 'static,
{
    tokio::spawn(modify_immediate(pool.clone(), user_id.to_string(), change))
        .await
        .map_err(|e| Error::Internal(format!("Document write task failed: {}", e)))?
}

async fn modify_immediate<F>(pool: DbPool, user_id: String, change: F) -> Result<DocumentSnapshot>
where
    F: FnOnce(&mut UserDocument) -> Result<()>,
{
    let mut conn = pool.acquire().await?;
    sqlx::query("BEGIN IMMEDIATE").execute(&mut *conn).await?;

    match write_locked(&mut conn, &user_id, change).await {
        Ok(snapshot) => {
            sqlx::query("COMMIT").execute(&mut *conn).await?;
            Ok(snapshot)
        }
        Err(e) => {
            if let Err(rollback) = sqlx::query("ROLLBACK").execute(&mut *conn).await {
                warn!(user_id = %user_id, error = %rollback, "Rollback failed");
            }
            Err(e)
        }
    }
}

async fn write_locked<F>(
    conn: &mut SqliteConnection,
    user_id: &str,
    change: F,
) -> Result<DocumentSnapshot>
where
    F: FnOnce(&mut UserDocument) -> Result<()>,
{
    let current = sqlx::query_as::<_, DocumentRow>(
        "SELECT body, revision FROM user_documents WHERE user_id = ?",
    )
    .bind(user_id)
    .fetch_optional(&mut *conn)
    .await?
    .map(DocumentSnapshot::try_from)
    .transpose()?;

    let (mut document, revision) = match current {
        Some(snapshot) => (snapshot.document, snapshot.revision + 1),
        None => (UserDocument::default(), 1),
    };

    change(&mut document)?;

    let body = serde_json::to_string(&document)?;
    sqlx::query(
        r#"
        INSERT INTO user_documents (user_id, body, revision, updated_at)
        VALUES (?, ?, ?, ?)
        ON CONFLICT(user_id) DO UPDATE SET
            body = excluded.body,
            revision = excluded.revision,
            updated_at = excluded.updated_at
        "#,
    )
    .bind(user_id)
    .bind(&body)
    .bind(revision)
    .bind(Utc::now().to_rfc3339())
    .execute(&mut *conn)
    .await?;

    Ok(DocumentSnapshot { revision, document })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_account, init_pool, initialize_schema, CreateAccount};
    use crate::models::{Category, ContentItem, Hackathon, Project};

    async fn setup() -> DbPool {
        let pool = init_pool(":memory:").await.unwrap();
        initialize_schema(&pool).await.unwrap();
        create_account(
            &pool,
            CreateAccount {
                id: "u1".to_string(),
                email: "ada@example.com".to_string(),
                password_hash: "hash".to_string(),
            },
        )
        .await
        .unwrap();
        pool
    }

    #[tokio::test]
    async fn test_missing_document_is_none() {
        let pool = setup().await;
        assert!(get_document(&pool, "u1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_modify_creates_then_bumps_revision() {
        let pool = setup().await;

        let first = modify_document(&pool, "u1", |doc| {
            doc.append(
                Category::WebProject,
                ContentItem::Project(Project {
                    title: "One".into(),
                    ..Default::default()
                }),
            )
        })
        .await
        .unwrap();
        assert_eq!(first.revision, 1);

        let second = modify_document(&pool, "u1", |doc| {
            doc.profile.bio = "Engineer".into();
            Ok(())
        })
        .await
        .unwrap();
        assert_eq!(second.revision, 2);

        let stored = get_document(&pool, "u1").await.unwrap().unwrap();
        assert_eq!(stored.revision, 2);
        assert_eq!(stored.document.web_projects.len(), 1);
        assert_eq!(stored.document.profile.bio, "Engineer");
    }

    #[tokio::test]
    async fn test_failed_change_writes_nothing() {
        let pool = setup().await;
        let result = modify_document(&pool, "u1", |_| {
            Err(Error::Validation("nope".to_string()))
        })
        .await;
        assert!(result.is_err());
        assert!(get_document(&pool, "u1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_put_replaces_document() {
        let pool = setup().await;
        let mut doc = UserDocument::default();
        doc.profile.full_name = "Ada".into();
        assert_eq!(put_document(&pool, "u1", &doc).await.unwrap().revision, 1);
        assert_eq!(put_document(&pool, "u1", &doc).await.unwrap().revision, 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_appends_on_file_database_all_land() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("folio.db");
        let pool = init_pool(path.to_str().unwrap()).await.unwrap();
        initialize_schema(&pool).await.unwrap();
        create_account(
            &pool,
            CreateAccount {
                id: "u1".to_string(),
                email: "ada@example.com".to_string(),
                password_hash: "hash".to_string(),
            },
        )
        .await
        .unwrap();

        let writers: Vec<_> = (0..20)
            .map(|i| {
                let pool = pool.clone();
                tokio::spawn(async move {
                    modify_document(&pool, "u1", move |doc| {
                        doc.append(
                            Category::Hackathon,
                            ContentItem::Hackathon(Hackathon {
                                title: format!("Hack {}", i),
                                ..Default::default()
                            }),
                        )
                    })
                    .await
                })
            })
            .collect();

        for writer in writers {
            writer.await.unwrap().unwrap();
        }

        let stored = get_document(&pool, "u1").await.unwrap().unwrap();
        assert_eq!(stored.document.count(Category::Hackathon), 20);
        assert_eq!(stored.revision, 20);
    }
}
