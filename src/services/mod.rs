//! Service layer for Folio.
//!
//! Contains the remote data gateway and the logic built on it:
//! - Identity (accounts, sessions, identity-change notifications)
//! - Documents (per-user documents with change subscriptions)
//! - Blobs (uploaded images)
//! - Sync (view-state synchronizer)
//! - Forms (section forms) and Registration (sign-up form)

mod blobs;
mod documents;
mod forms;
mod identity;
mod password;
mod registration;
pub mod sync;

pub use blobs::{BlobHandle, BlobPath, BlobStorage, LocalBlobStorage, Upload};
pub use documents::{DocumentChange, DocumentStore, DocumentSubscription, SqliteDocumentStore};
pub use forms::{
    error_notice, FormState, Notice, NoticeKind, Section, SectionForms, Submission, Submitted,
};
pub use identity::{hash_token, AccountService, IdentityProvider, SessionContext, SignedIn};
pub use password::{hash_password, verify_password};
pub use registration::{Registration, RegistrationService};
pub use sync::{Mounted, Projection, ReadMode, Synchronizer, ViewState};
