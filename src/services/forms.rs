//! Section forms: one form per upload section.
//!
//! A submission is checked for a signed-in identity before anything else,
//! validated as a typed record, optionally carries an image that is stored
//! and linked into the record, and is then appended to the section's
//! collection (or, for the profile, written as field updates).

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::{Serialize, Serializer};
use tracing::{info, warn};

use super::blobs::{BlobPath, BlobStorage, Upload};
use super::documents::DocumentStore;
use super::identity::SessionContext;
use crate::models::{now, Category, ContentItem, FormFields, ProfileInput};
use crate::{Error, ErrorKind, Result};

/// Blob prefix for profile photos uploaded from the profile form.
const PROFILE_PHOTO_PREFIX: &str = "photos";

/// Upload dashboard section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Section {
    Profile,
    Content(Category),
}

impl Section {
    pub const ALL: [Section; 6] = [
        Section::Profile,
        Section::Content(Category::WebProject),
        Section::Content(Category::AiProject),
        Section::Content(Category::AndroidProject),
        Section::Content(Category::Hackathon),
        Section::Content(Category::Position),
    ];

    pub fn slug(self) -> &'static str {
        match self {
            Self::Profile => "profile",
            Self::Content(category) => category.slug(),
        }
    }

    pub fn from_slug(slug: &str) -> Option<Self> {
        if slug == "profile" {
            return Some(Self::Profile);
        }
        Category::from_slug(slug).map(Self::Content)
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Profile => "Profile",
            Self::Content(category) => category.label(),
        }
    }

    pub fn success_message(self) -> String {
        match self {
            Self::Profile => "Profile information saved successfully!".to_string(),
            Self::Content(category) => format!("{} uploaded successfully!", category.noun()),
        }
    }

    pub fn failure_message(self) -> String {
        match self {
            Self::Profile => "Failed to save profile information".to_string(),
            Self::Content(category) => {
                format!("Failed to upload {}", category.noun().to_lowercase())
            }
        }
    }
}

impl Serialize for Section {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.slug())
    }
}

/// One form submission.
#[derive(Debug, Clone)]
pub struct Submission {
    pub section: Section,
    pub fields: FormFields,
    pub image: Option<Upload>,
}

/// A committed submission.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Submitted {
    pub section: Section,
    pub revision: i64,
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeKind {
    Success,
    Error,
}

/// Transient message shown after a submit; it auto-dismisses.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
    pub issued_at: DateTime<Utc>,
    pub dismiss_after_ms: u64,
}

impl Notice {
    pub fn expires_at(&self) -> DateTime<Utc> {
        self.issued_at + Duration::milliseconds(self.dismiss_after_ms as i64)
    }

    pub fn is_visible_at(&self, at: DateTime<Utc>) -> bool {
        at < self.expires_at()
    }
}

/// Client-visible state of one section form.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormState {
    pub section: Section,
    pub fields: FormFields,
    pub notice: Option<Notice>,
}

impl FormState {
    pub fn new(section: Section) -> Self {
        Self {
            section,
            fields: FormFields::new(),
            notice: None,
        }
    }

    /// Form state after a submit: reset with a success notice, or the
    /// submitted fields kept with an error notice.
    pub fn settle(
        section: Section,
        fields: FormFields,
        outcome: &Result<Submitted>,
        dismiss_after_ms: u64,
    ) -> Self {
        let (kind, message, fields) = match outcome {
            Ok(_) => (NoticeKind::Success, section.success_message(), FormFields::new()),
            Err(e) => (NoticeKind::Error, error_notice(section, e), fields),
        };
        Self {
            section,
            fields,
            notice: Some(Notice {
                kind,
                message,
                issued_at: now(),
                dismiss_after_ms,
            }),
        }
    }
}

/// Message for a failed submit. Auth and validation errors speak for
/// themselves; data-access failures get the section's failure message.
pub fn error_notice(section: Section, error: &Error) -> String {
    match error.kind() {
        ErrorKind::Auth | ErrorKind::Validation => error.user_message(),
        ErrorKind::DataAccess => section.failure_message(),
    }
}

/// Submits section forms through the document and blob gateways.
#[derive(Clone)]
pub struct SectionForms {
    documents: Arc<dyn DocumentStore>,
    blobs: Arc<dyn BlobStorage>,
    notice_ttl_ms: u64,
}

impl SectionForms {
    pub fn new(
        documents: Arc<dyn DocumentStore>,
        blobs: Arc<dyn BlobStorage>,
        notice_ttl_ms: u64,
    ) -> Self {
        Self {
            documents,
            blobs,
            notice_ttl_ms,
        }
    }

    pub fn notice_ttl_ms(&self) -> u64 {
        self.notice_ttl_ms
    }

    /// Submit and settle the form state in one step.
    pub async fn handle(
        &self,
        session: &SessionContext,
        submission: Submission,
    ) -> (FormState, Result<Submitted>) {
        let section = submission.section;
        let fields = submission.fields.clone();
        let outcome = self.submit(session, submission).await;
        let state = FormState::settle(section, fields, &outcome, self.notice_ttl_ms);
        (state, outcome)
    }

    pub async fn submit(&self, session: &SessionContext, submission: Submission) -> Result<Submitted> {
        let identity = session.require()?;
        let user_id = identity.user_id.as_str();

        match submission.section {
            Section::Content(category) => {
                let mut item = ContentItem::from_fields(category, &submission.fields);
                item.validate()?;

                let prefix = format!("images/{}", category.slug());
                let image_url = self
                    .store_image(user_id, &prefix, submission.image.as_ref())
                    .await?;
                if let Some(url) = &image_url {
                    item.set_image_url(url.clone());
                }
                item.stamp(now());

                let snapshot = self
                    .documents
                    .append(user_id, category, item)
                    .await
                    .inspect_err(|e| warn_orphan(user_id, image_url.as_deref(), e))?;

                info!(user_id, category = category.slug(), revision = snapshot.revision, "Item appended");

                Ok(Submitted {
                    section: submission.section,
                    revision: snapshot.revision,
                    image_url,
                })
            }
            Section::Profile => {
                let input = ProfileInput::from_fields(&submission.fields);
                input.validate()?;

                let image_url = self
                    .store_image(user_id, PROFILE_PHOTO_PREFIX, submission.image.as_ref())
                    .await?;

                let snapshot = self
                    .documents
                    .update_fields(user_id, input.into_updates(image_url.clone()))
                    .await
                    .inspect_err(|e| warn_orphan(user_id, image_url.as_deref(), e))?;

                info!(user_id, revision = snapshot.revision, "Profile updated");

                Ok(Submitted {
                    section: Section::Profile,
                    revision: snapshot.revision,
                    image_url,
                })
            }
        }
    }

    /// Upload an optional image and resolve its public URL.
    async fn store_image(
        &self,
        user_id: &str,
        prefix: &str,
        image: Option<&Upload>,
    ) -> Result<Option<String>> {
        let Some(image) = image else {
            return Ok(None);
        };
        image.validate(self.blobs.max_upload_size())?;

        let path = BlobPath::for_upload(prefix, user_id, &image.filename);
        let handle = self.blobs.upload(user_id, &path, image).await?;
        let url = self.blobs.resolve_url(&handle).await?;
        Ok(Some(url))
    }
}

fn warn_orphan(user_id: &str, image_url: Option<&str>, error: &Error) {
    if let Some(url) = image_url {
        warn!(user_id, url, error = %error, "Record write failed; uploaded image is orphaned");
    }
}
