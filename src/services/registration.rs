//! Sign-up form: account creation followed by the initial user document.

use std::sync::Arc;

use tracing::{error, info};

use super::blobs::{BlobPath, BlobStorage, Upload};
use super::documents::DocumentStore;
use super::identity::{IdentityProvider, SignedIn};
use crate::models::{
    field, now, FormFields, ProfileField, SocialLinks, UserDocument, UserProfile,
};
use crate::{Error, Result};

const REGISTRATION_PHOTO_PREFIX: &str = "profile_photos";

/// Sign-up form input.
#[derive(Debug, Clone)]
pub struct Registration {
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    pub full_name: String,
    pub bio: String,
    pub linkedin: String,
    pub github: String,
    pub photo: Option<Upload>,
}

impl Registration {
    /// Passwords are taken verbatim; everything else is trimmed.
    pub fn from_fields(fields: &FormFields, photo: Option<Upload>) -> Self {
        let raw = |name: &str| fields.get(name).cloned().unwrap_or_default();
        Self {
            email: field(fields, &["email"]),
            password: raw("password"),
            confirm_password: raw("confirmPassword"),
            full_name: field(fields, &["fullName", "name"]),
            bio: field(fields, &["bio"]),
            linkedin: field(fields, &["linkedin"]),
            github: field(fields, &["github"]),
            photo,
        }
    }
}

#[derive(Clone)]
pub struct RegistrationService {
    identity: Arc<dyn IdentityProvider>,
    documents: Arc<dyn DocumentStore>,
    blobs: Arc<dyn BlobStorage>,
}

impl RegistrationService {
    pub fn new(
        identity: Arc<dyn IdentityProvider>,
        documents: Arc<dyn DocumentStore>,
        blobs: Arc<dyn BlobStorage>,
    ) -> Self {
        Self {
            identity,
            documents,
            blobs,
        }
    }

    /// Create the account, store the optional photo, then write the full
    /// user document.
    ///
    /// Failures after account creation leave the account in place; the
    /// user can sign in and complete the profile from the upload dashboard.
    pub async fn register(&self, registration: Registration) -> Result<SignedIn> {
        if registration.password != registration.confirm_password {
            return Err(Error::PasswordMismatch);
        }
        ProfileField::Linkedin.check(&registration.linkedin)?;
        ProfileField::Github.check(&registration.github)?;
        if let Some(photo) = &registration.photo {
            photo.validate(self.blobs.max_upload_size())?;
        }

        let signed_in = self
            .identity
            .register(&registration.email, &registration.password)
            .await?;
        let user_id = signed_in.identity.user_id.as_str();

        let photo_url = match &registration.photo {
            Some(photo) => Some(self.store_photo(user_id, photo).await.map_err(|e| {
                error!(user_id, error = %e, "Profile photo upload failed");
                Error::ProfilePhotoUpload
            })?),
            None => None,
        };

        let document = UserDocument::new(UserProfile {
            full_name: registration.full_name,
            email: signed_in.identity.email.clone(),
            bio: registration.bio,
            college_name: String::new(),
            photo_url: photo_url.unwrap_or_default(),
            links: SocialLinks {
                linkedin: registration.linkedin,
                github: registration.github,
            },
            created_at: Some(now()),
        });

        self.documents
            .write(user_id, &document)
            .await
            .map_err(|e| {
                error!(user_id, error = %e, "Initial profile write failed");
                Error::ProfileSave
            })?;

        info!(user_id, "Registration complete");
        Ok(signed_in)
    }

    async fn store_photo(&self, user_id: &str, photo: &Upload) -> Result<String> {
        let path = BlobPath::fixed(REGISTRATION_PHOTO_PREFIX, user_id);
        let handle = self.blobs.upload(user_id, &path, photo).await?;
        self.blobs.resolve_url(&handle).await
    }
}
