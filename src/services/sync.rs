//! View-state synchronizer.
//!
//! Bridges identity changes and document changes into a `{data, loading,
//! error}` view state. A mounted view:
//!
//! - listens for identity changes on its [`SessionContext`]
//! - reads the signed-in user's document (once, or once and then follows
//!   changes) and maps it through a [`Projection`]
//! - clears its data when the identity goes away
//! - stops all listening when unmounted, and discards the results of reads
//!   that were still in flight
//!
//! All writes go through a [`ViewCell`], which drops results belonging to a
//! superseded identity, a torn-down view, or an older document revision.

use std::sync::{Arc, Mutex};

use serde::Serialize;
use tokio::sync::watch;
use tokio::task::AbortHandle;
use tracing::{debug, error};

use super::documents::DocumentStore;
use super::identity::SessionContext;
use crate::models::{Identity, UserDocument};
use crate::Result;

/// View state exposed to presentational components.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewState<T> {
    pub data: T,
    pub loading: bool,
    pub error: bool,
    pub signed_in: bool,
}

impl<T: Default> ViewState<T> {
    pub fn loading() -> Self {
        Self {
            data: T::default(),
            loading: true,
            error: false,
            signed_in: true,
        }
    }

    pub fn signed_out() -> Self {
        Self {
            data: T::default(),
            loading: false,
            error: false,
            signed_in: false,
        }
    }

    pub fn failed() -> Self {
        Self {
            data: T::default(),
            loading: false,
            error: true,
            signed_in: true,
        }
    }

    pub fn ready(data: T) -> Self {
        Self {
            data,
            loading: false,
            error: false,
            signed_in: true,
        }
    }
}

/// Maps a (possibly missing) user document into typed view data.
///
/// A missing document projects to the default value.
pub trait Projection: Send + Sync + 'static {
    type Output: Clone + Default + Send + Sync + 'static;

    fn project(&self, document: Option<&UserDocument>) -> Self::Output;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadMode {
    /// Read the document once per identity.
    Once,
    /// Read once, then follow every change to the document.
    Continuous,
}

/// Read a user's document once and project it, outside any view lifecycle.
pub async fn snapshot<P: Projection>(
    documents: &dyn DocumentStore,
    user_id: &str,
    projection: &P,
) -> Result<P::Output> {
    let stored = documents.read(user_id).await?;
    Ok(projection.project(stored.as_ref().map(|s| &s.document)))
}

/// Mounts views of one projection.
pub struct Synchronizer<P> {
    documents: Arc<dyn DocumentStore>,
    projection: Arc<P>,
    mode: ReadMode,
}

impl<P: Projection> Synchronizer<P> {
    pub fn new(documents: Arc<dyn DocumentStore>, projection: P, mode: ReadMode) -> Self {
        Self {
            documents,
            projection: Arc::new(projection),
            mode,
        }
    }

    /// Mount a view for the given session.
    ///
    /// Must be called inside a Tokio runtime.
    pub fn mount(&self, session: SessionContext) -> Mounted<P::Output> {
        let initial = match session.current() {
            Some(_) => ViewState::loading(),
            None => ViewState::signed_out(),
        };
        let (tx, rx) = watch::channel(initial);
        let cell = Arc::new(ViewCell::new(tx));

        let reader = Reader {
            documents: self.documents.clone(),
            projection: self.projection.clone(),
            mode: self.mode,
            cell: cell.clone(),
        };

        if let Some(identity) = session.current() {
            reader.start(identity);
        }

        let listener = tokio::spawn(async move {
            let mut session = session;
            while let Some(identity) = session.changed().await {
                match identity {
                    Some(identity) => reader.start(identity),
                    None => reader.cell.sign_out(),
                }
            }
        });

        Mounted {
            cell,
            rx,
            listener: listener.abort_handle(),
        }
    }
}

/// A mounted view. Dropping it unmounts.
pub struct Mounted<T> {
    cell: Arc<ViewCell<T>>,
    rx: watch::Receiver<ViewState<T>>,
    listener: AbortHandle,
}

impl<T: Clone> Mounted<T> {
    pub fn state(&self) -> ViewState<T> {
        self.rx.borrow().clone()
    }

    /// Receiver of every state this view publishes.
    pub fn subscribe(&self) -> watch::Receiver<ViewState<T>> {
        self.rx.clone()
    }

    /// Wait until the view is no longer loading.
    pub async fn settled(&mut self) -> ViewState<T> {
        if let Ok(state) = self.rx.wait_for(|state| !state.loading).await {
            return state.clone();
        }
        self.rx.borrow().clone()
    }

    /// Wait for the next published state.
    pub async fn changed(&mut self) -> Option<ViewState<T>> {
        self.rx.changed().await.ok()?;
        Some(self.rx.borrow_and_update().clone())
    }

    pub fn unmount(self) {}
}

impl<T> Drop for Mounted<T> {
    fn drop(&mut self) {
        self.cell.close();
        self.listener.abort();
    }
}

/// Starts reads for one mounted view.
struct Reader<P: Projection> {
    documents: Arc<dyn DocumentStore>,
    projection: Arc<P>,
    mode: ReadMode,
    cell: Arc<ViewCell<P::Output>>,
}

impl<P: Projection> Reader<P> {
    fn start(&self, identity: Identity) {
        let Some(generation) = self.cell.begin() else {
            return;
        };

        let documents = self.documents.clone();
        let projection = self.projection.clone();
        let cell = self.cell.clone();
        let continuous = self.mode == ReadMode::Continuous;
        let user_id = identity.user_id;

        // Not tied to the view: an in-flight read runs to completion and
        // its result is discarded by the cell if the view is gone.
        tokio::spawn(async move {
            let subscription = continuous.then(|| documents.subscribe(&user_id));

            let stored = match documents.read(&user_id).await {
                Ok(stored) => stored,
                Err(e) => {
                    error!(user_id = %user_id, error = %e, "Document read failed");
                    cell.fail(generation);
                    return;
                }
            };

            let revision = stored.as_ref().map(|s| s.revision).unwrap_or(0);
            let data = projection.project(stored.as_ref().map(|s| &s.document));
            if !cell.publish(generation, revision, ViewState::ready(data)) {
                debug!(user_id = %user_id, "Discarded read for inactive view");
                return;
            }

            let Some(mut subscription) = subscription else {
                return;
            };
            let follow_cell = cell.clone();
            let follow = tokio::spawn(async move {
                while let Some(change) = subscription.next().await {
                    let data = projection.project(Some(&change.document));
                    if !follow_cell.publish(generation, change.revision, ViewState::ready(data)) {
                        break;
                    }
                }
            });
            cell.set_follow(generation, follow.abort_handle());
        });
    }
}

/// Guarded state of one mounted view.
struct ViewCell<T> {
    tx: watch::Sender<ViewState<T>>,
    inner: Mutex<CellInner>,
}

struct CellInner {
    live: bool,
    generation: u64,
    revision: Option<i64>,
    follow: Option<AbortHandle>,
}

impl<T: Default> ViewCell<T> {
    fn new(tx: watch::Sender<ViewState<T>>) -> Self {
        Self {
            tx,
            inner: Mutex::new(CellInner {
                live: true,
                generation: 0,
                revision: None,
                follow: None,
            }),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, CellInner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Start a new read generation. `None` once the view is closed.
    fn begin(&self) -> Option<u64> {
        let mut inner = self.lock();
        if !inner.live {
            return None;
        }
        inner.generation += 1;
        inner.revision = None;
        if let Some(follow) = inner.follow.take() {
            follow.abort();
        }
        self.tx.send_replace(ViewState::loading());
        Some(inner.generation)
    }

    fn sign_out(&self) {
        let mut inner = self.lock();
        if !inner.live {
            return;
        }
        inner.generation += 1;
        inner.revision = None;
        if let Some(follow) = inner.follow.take() {
            follow.abort();
        }
        self.tx.send_replace(ViewState::signed_out());
    }

    /// Publish a state for `generation` at document `revision`.
    ///
    /// Returns false when the generation is no longer current, in which case
    /// nothing is written. Older revisions are skipped but keep the
    /// generation current.
    fn publish(&self, generation: u64, revision: i64, state: ViewState<T>) -> bool {
        let mut inner = self.lock();
        if !inner.live || inner.generation != generation {
            return false;
        }
        if inner.revision.is_some_and(|seen| revision <= seen) {
            return true;
        }
        inner.revision = Some(revision);
        self.tx.send_replace(state);
        true
    }

    fn fail(&self, generation: u64) {
        let inner = self.lock();
        if inner.live && inner.generation == generation {
            self.tx.send_replace(ViewState::failed());
        }
    }

    fn set_follow(&self, generation: u64, follow: AbortHandle) {
        let mut inner = self.lock();
        if inner.live && inner.generation == generation {
            inner.follow = Some(follow);
        } else {
            follow.abort();
        }
    }
}

impl<T> ViewCell<T> {
    fn close(&self) {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.live = false;
        if let Some(follow) = inner.follow.take() {
            follow.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::DocumentSnapshot;
    use crate::models::{Category, ContentItem, ProfileField};
    use crate::services::documents::{DocumentChange, DocumentSubscription};
    use async_trait::async_trait;
    use std::time::Duration;
    use tokio::sync::{broadcast, Notify};

    /// Projection of the full name only.
    struct NameProjection;

    impl Projection for NameProjection {
        type Output = String;

        fn project(&self, document: Option<&UserDocument>) -> String {
            document
                .map(|d| d.profile.full_name.clone())
                .unwrap_or_default()
        }
    }

    /// In-memory store whose reads wait for a gate to open.
    struct GatedStore {
        gate: Notify,
        gated: bool,
        fail: bool,
        document: Mutex<Option<DocumentSnapshot>>,
        sender: broadcast::Sender<DocumentChange>,
    }

    impl GatedStore {
        fn new(gated: bool) -> Arc<Self> {
            let (sender, _) = broadcast::channel(16);
            Arc::new(Self {
                gate: Notify::new(),
                gated,
                fail: false,
                document: Mutex::new(None),
                sender,
            })
        }

        fn failing() -> Arc<Self> {
            let (sender, _) = broadcast::channel(16);
            Arc::new(Self {
                gate: Notify::new(),
                gated: false,
                fail: true,
                document: Mutex::new(None),
                sender,
            })
        }

        fn set_name(&self, user_id: &str, name: &str) {
            let mut slot = self.document.lock().unwrap();
            let revision = slot.as_ref().map(|s| s.revision).unwrap_or(0) + 1;
            let mut document = UserDocument::default();
            document.profile.full_name = name.to_string();
            *slot = Some(DocumentSnapshot {
                revision,
                document: document.clone(),
            });
            let _ = self.sender.send(DocumentChange {
                user_id: user_id.to_string(),
                revision,
                document: Arc::new(document),
            });
        }
    }

    #[async_trait]
    impl DocumentStore for GatedStore {
        async fn read(&self, _user_id: &str) -> Result<Option<DocumentSnapshot>> {
            if self.gated {
                self.gate.notified().await;
            }
            if self.fail {
                return Err(crate::Error::Storage("unreachable".to_string()));
            }
            Ok(self.document.lock().unwrap().clone())
        }

        fn subscribe(&self, user_id: &str) -> DocumentSubscription {
            DocumentSubscription::new(user_id, self.sender.subscribe())
        }

        async fn write(&self, _: &str, _: &UserDocument) -> Result<DocumentSnapshot> {
            unimplemented!()
        }

        async fn append(&self, _: &str, _: Category, _: ContentItem) -> Result<DocumentSnapshot> {
            unimplemented!()
        }

        async fn update_fields(
            &self,
            _: &str,
            _: Vec<(ProfileField, String)>,
        ) -> Result<DocumentSnapshot> {
            unimplemented!()
        }
    }

    fn ada() -> Identity {
        Identity {
            user_id: "u1".to_string(),
            email: "ada@example.com".to_string(),
        }
    }

    #[tokio::test]
    async fn test_signed_out_view_is_not_loading() {
        let store = GatedStore::new(false);
        let sync = Synchronizer::new(store, NameProjection, ReadMode::Once);
        let view = sync.mount(SessionContext::signed_out());
        let state = view.state();
        assert!(!state.loading);
        assert!(!state.signed_in);
        assert_eq!(state.data, "");
    }

    #[tokio::test]
    async fn test_once_read_settles_with_projection() {
        let store = GatedStore::new(false);
        store.set_name("u1", "Ada");
        let sync = Synchronizer::new(store, NameProjection, ReadMode::Once);

        let mut view = sync.mount(SessionContext::fixed(ada()));
        let state = view.settled().await;
        assert_eq!(state, ViewState::ready("Ada".to_string()));
    }

    #[tokio::test]
    async fn test_missing_document_projects_default() {
        let store = GatedStore::new(false);
        let sync = Synchronizer::new(store, NameProjection, ReadMode::Once);
        let mut view = sync.mount(SessionContext::fixed(ada()));
        assert_eq!(view.settled().await, ViewState::ready(String::new()));
    }

    #[tokio::test]
    async fn test_read_failure_sets_error_flag() {
        let store = GatedStore::failing();
        let sync = Synchronizer::new(store, NameProjection, ReadMode::Once);
        let mut view = sync.mount(SessionContext::fixed(ada()));
        let state = view.settled().await;
        assert!(state.error);
        assert!(!state.loading);
    }

    #[tokio::test]
    async fn test_unmount_discards_pending_read() {
        let store = GatedStore::new(true);
        store.set_name("u1", "Ada");
        let sync = Synchronizer::new(store.clone(), NameProjection, ReadMode::Once);

        let view = sync.mount(SessionContext::fixed(ada()));
        let mut observer = view.subscribe();
        assert!(observer.borrow_and_update().loading);

        tokio::task::yield_now().await;
        view.unmount();
        store.gate.notify_one();
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert!(!observer.has_changed().unwrap_or(false));
        assert!(observer.borrow().loading);
    }

    #[tokio::test]
    async fn test_sign_out_clears_data() {
        let store = GatedStore::new(false);
        store.set_name("u1", "Ada");
        let sync = Synchronizer::new(store, NameProjection, ReadMode::Once);

        let (tx, rx) = watch::channel(Some(ada()));
        let mut view = sync.mount(SessionContext::new(rx));
        assert_eq!(view.settled().await.data, "Ada");

        tx.send_replace(None);
        let state = view.changed().await.unwrap();
        assert_eq!(state, ViewState::signed_out());
    }

    #[tokio::test]
    async fn test_continuous_follows_changes() {
        let store = GatedStore::new(false);
        store.set_name("u1", "Ada");
        let sync = Synchronizer::new(store.clone(), NameProjection, ReadMode::Continuous);

        let mut view = sync.mount(SessionContext::fixed(ada()));
        assert_eq!(view.settled().await.data, "Ada");

        // Let the follow task register before changing the document
        tokio::time::sleep(Duration::from_millis(20)).await;
        store.set_name("u1", "Ada Lovelace");
        let state = view.changed().await.unwrap();
        assert_eq!(state.data, "Ada Lovelace");
    }

    #[test]
    fn test_stale_revision_is_skipped() {
        let (tx, rx) = watch::channel(ViewState::<String>::loading());
        let cell = ViewCell::new(tx);
        let generation = cell.begin().unwrap();

        assert!(cell.publish(generation, 3, ViewState::ready("new".into())));
        assert!(cell.publish(generation, 2, ViewState::ready("old".into())));
        assert_eq!(rx.borrow().data, "new");

        let next = cell.begin().unwrap();
        assert!(!cell.publish(generation, 4, ViewState::ready("stale".into())));
        assert!(rx.borrow().loading);

        cell.close();
        assert!(!cell.publish(next, 5, ViewState::ready("late".into())));
        assert!(cell.begin().is_none());
    }
}
