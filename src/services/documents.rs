//! Document store: per-user documents with change subscriptions.
//!
//! Writes are committed to SQLite first and then broadcast. Subscribers
//! receive only changes to the document they subscribed to.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::broadcast;
use tracing::{debug, warn};

use crate::db::{self, DbPool, DocumentSnapshot};
use crate::models::{Category, ContentItem, ProfileField, UserDocument};
use crate::Result;

/// Channel capacity for document change broadcasting.
const CHANNEL_CAPACITY: usize = 256;

/// A committed change to one user's document.
#[derive(Debug, Clone)]
pub struct DocumentChange {
    pub user_id: String,
    pub revision: i64,
    pub document: Arc<UserDocument>,
}

/// Stream of changes to a single user's document.
pub struct DocumentSubscription {
    user_id: String,
    rx: broadcast::Receiver<DocumentChange>,
}

impl DocumentSubscription {
    pub fn new(user_id: &str, rx: broadcast::Receiver<DocumentChange>) -> Self {
        Self {
            user_id: user_id.to_string(),
            rx,
        }
    }

    /// Next change for this document. `None` when the store is gone.
    ///
    /// A subscriber that fell behind skips to the newest changes; every
    /// change carries the full document so nothing is lost by skipping.
    pub async fn next(&mut self) -> Option<DocumentChange> {
        loop {
            match self.rx.recv().await {
                Ok(change) if change.user_id == self.user_id => return Some(change),
                Ok(_) => continue,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(user_id = %self.user_id, skipped, "Document subscriber lagged");
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}

/// Document store seam.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Current document and revision, or `None` if the user has none yet.
    async fn read(&self, user_id: &str) -> Result<Option<DocumentSnapshot>>;

    /// Subscribe to future changes. Callers read once after subscribing to
    /// obtain the starting snapshot.
    fn subscribe(&self, user_id: &str) -> DocumentSubscription;

    /// Create or replace the whole document.
    async fn write(&self, user_id: &str, document: &UserDocument) -> Result<DocumentSnapshot>;

    /// Append one item to the collection of `category`, creating the
    /// collection and the document if absent.
    async fn append(
        &self,
        user_id: &str,
        category: Category,
        item: ContentItem,
    ) -> Result<DocumentSnapshot>;

    /// Update the named profile fields, leaving everything else intact.
    async fn update_fields(
        &self,
        user_id: &str,
        updates: Vec<(ProfileField, String)>,
    ) -> Result<DocumentSnapshot>;
}

/// SQLite-backed document store.
#[derive(Clone)]
pub struct SqliteDocumentStore {
    db: DbPool,
    sender: broadcast::Sender<DocumentChange>,
}

impl SqliteDocumentStore {
    pub fn new(db: DbPool) -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { db, sender }
    }

    fn publish(&self, user_id: &str, snapshot: &DocumentSnapshot) {
        debug!(user_id, revision = snapshot.revision, "Document changed");
        // No subscribers is fine
        let _ = self.sender.send(DocumentChange {
            user_id: user_id.to_string(),
            revision: snapshot.revision,
            document: Arc::new(snapshot.document.clone()),
        });
    }
}

#[async_trait]
impl DocumentStore for SqliteDocumentStore {
    async fn read(&self, user_id: &str) -> Result<Option<DocumentSnapshot>> {
        db::get_document(&self.db, user_id).await
    }

    fn subscribe(&self, user_id: &str) -> DocumentSubscription {
        DocumentSubscription::new(user_id, self.sender.subscribe())
    }

    async fn write(&self, user_id: &str, document: &UserDocument) -> Result<DocumentSnapshot> {
        let snapshot = db::put_document(&self.db, user_id, document).await?;
        self.publish(user_id, &snapshot);
        Ok(snapshot)
    }

    async fn append(
        &self,
        user_id: &str,
        category: Category,
        item: ContentItem,
    ) -> Result<DocumentSnapshot> {
        let snapshot = db::modify_document(&self.db, user_id, move |doc| doc.append(category, item)).await?;
        self.publish(user_id, &snapshot);
        Ok(snapshot)
    }

    async fn update_fields(
        &self,
        user_id: &str,
        updates: Vec<(ProfileField, String)>,
    ) -> Result<DocumentSnapshot> {
        let snapshot = db::modify_document(&self.db, user_id, move |doc| {
            doc.apply(updates);
            Ok(())
        })
        .await?;
        self.publish(user_id, &snapshot);
        Ok(snapshot)
    }
}
