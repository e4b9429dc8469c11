//! Per-user document: profile fields plus the content collections.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::content::check_link;
use super::{field, Category, ContentItem, FormFields, Hackathon, Position, Project};
use crate::{Error, Result};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SocialLinks {
    pub linkedin: String,
    pub github: String,
}

/// Profile section of the user document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct UserProfile {
    #[serde(alias = "name")]
    pub full_name: String,
    pub email: String,
    pub bio: String,
    pub college_name: String,
    #[serde(rename = "photoURL")]
    pub photo_url: String,
    pub links: SocialLinks,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

/// A profile field that can be updated on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProfileField {
    #[serde(rename = "fullName")]
    FullName,
    #[serde(rename = "bio")]
    Bio,
    #[serde(rename = "collegeName")]
    CollegeName,
    #[serde(rename = "photoURL")]
    PhotoUrl,
    #[serde(rename = "linkedin")]
    Linkedin,
    #[serde(rename = "github")]
    Github,
}

impl ProfileField {
    pub fn name(self) -> &'static str {
        match self {
            Self::FullName => "fullName",
            Self::Bio => "bio",
            Self::CollegeName => "collegeName",
            Self::PhotoUrl => "photoURL",
            Self::Linkedin => "linkedin",
            Self::Github => "github",
        }
    }

    pub const ALL: [ProfileField; 6] = [
        Self::FullName,
        Self::Bio,
        Self::CollegeName,
        Self::PhotoUrl,
        Self::Linkedin,
        Self::Github,
    ];

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.name() == name)
    }

    /// Check a value for a single-field update. Required fields cannot be
    /// blanked; links must be absolute http(s) URLs when present.
    pub fn check(self, value: &str) -> Result<()> {
        match self {
            Self::FullName if value.trim().is_empty() => {
                Err(Error::Validation("Full name is required".to_string()))
            }
            Self::Bio if value.trim().is_empty() => {
                Err(Error::Validation("Bio is required".to_string()))
            }
            Self::CollegeName if value.trim().is_empty() => {
                Err(Error::Validation("College name is required".to_string()))
            }
            Self::PhotoUrl => check_link(value, "Photo URL"),
            Self::Linkedin => check_link(value, "LinkedIn link"),
            Self::Github => check_link(value, "GitHub link"),
            _ => Ok(()),
        }
    }

    /// Write `value` into the matching field of `profile`.
    pub fn apply(self, profile: &mut UserProfile, value: String) {
        match self {
            Self::FullName => profile.full_name = value,
            Self::Bio => profile.bio = value,
            Self::CollegeName => profile.college_name = value,
            Self::PhotoUrl => profile.photo_url = value,
            Self::Linkedin => profile.links.linkedin = value,
            Self::Github => profile.links.github = value,
        }
    }
}

/// Profile form input. Photo handling happens separately.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfileInput {
    pub full_name: String,
    pub bio: String,
    pub college_name: String,
    pub linkedin: String,
    pub github: String,
}

impl ProfileInput {
    pub fn from_fields(fields: &FormFields) -> Self {
        Self {
            full_name: field(fields, &["fullName", "name"]),
            bio: field(fields, &["bio"]),
            college_name: field(fields, &["collegeName"]),
            linkedin: field(fields, &["linkedin"]),
            github: field(fields, &["github"]),
        }
    }

    pub fn validate(&self) -> Result<()> {
        for (value, label) in [
            (&self.full_name, "Full name"),
            (&self.bio, "Bio"),
            (&self.college_name, "College name"),
        ] {
            if value.trim().is_empty() {
                return Err(Error::Validation(format!("{} is required", label)));
            }
        }
        check_link(&self.linkedin, "LinkedIn link")?;
        check_link(&self.github, "GitHub link")
    }

    /// Field updates to apply, with the uploaded photo URL if any.
    pub fn into_updates(self, photo_url: Option<String>) -> Vec<(ProfileField, String)> {
        let mut updates = vec![
            (ProfileField::FullName, self.full_name),
            (ProfileField::Bio, self.bio),
            (ProfileField::CollegeName, self.college_name),
            (ProfileField::Linkedin, self.linkedin),
            (ProfileField::Github, self.github),
        ];
        if let Some(url) = photo_url {
            updates.push((ProfileField::PhotoUrl, url));
        }
        updates
    }
}

/// The single document each user owns.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserDocument {
    #[serde(flatten)]
    pub profile: UserProfile,
    #[serde(rename = "web project", default)]
    pub web_projects: Vec<Project>,
    #[serde(rename = "ai/ml project", default)]
    pub ai_projects: Vec<Project>,
    #[serde(rename = "android project", default)]
    pub android_projects: Vec<Project>,
    #[serde(rename = "hackathon", default)]
    pub hackathons: Vec<Hackathon>,
    #[serde(rename = "position of responsibility", default)]
    pub positions: Vec<Position>,
}

impl UserDocument {
    pub fn new(profile: UserProfile) -> Self {
        Self {
            profile,
            ..Default::default()
        }
    }

    /// Append `item` to the collection of `category`, creating it if absent.
    pub fn append(&mut self, category: Category, item: ContentItem) -> Result<()> {
        match (category, item) {
            (Category::WebProject, ContentItem::Project(p)) => self.web_projects.push(p),
            (Category::AiProject, ContentItem::Project(p)) => self.ai_projects.push(p),
            (Category::AndroidProject, ContentItem::Project(p)) => self.android_projects.push(p),
            (Category::Hackathon, ContentItem::Hackathon(h)) => self.hackathons.push(h),
            (Category::Position, ContentItem::Position(p)) => self.positions.push(p),
            (category, _) => {
                return Err(Error::InvalidInput(format!(
                    "item does not belong in '{}'",
                    category.collection_key()
                )))
            }
        }
        Ok(())
    }

    pub fn apply(&mut self, updates: Vec<(ProfileField, String)>) {
        for (field, value) in updates {
            field.apply(&mut self.profile, value);
        }
    }

    /// Items of one collection, in insertion order.
    pub fn items(&self, category: Category) -> Vec<ContentItem> {
        match category {
            Category::WebProject => projects(&self.web_projects),
            Category::AiProject => projects(&self.ai_projects),
            Category::AndroidProject => projects(&self.android_projects),
            Category::Hackathon => self
                .hackathons
                .iter()
                .cloned()
                .map(ContentItem::Hackathon)
                .collect(),
            Category::Position => self
                .positions
                .iter()
                .cloned()
                .map(ContentItem::Position)
                .collect(),
        }
    }

    pub fn count(&self, category: Category) -> usize {
        match category {
            Category::WebProject => self.web_projects.len(),
            Category::AiProject => self.ai_projects.len(),
            Category::AndroidProject => self.android_projects.len(),
            Category::Hackathon => self.hackathons.len(),
            Category::Position => self.positions.len(),
        }
    }
}

fn projects(list: &[Project]) -> Vec<ContentItem> {
    list.iter().cloned().map(ContentItem::Project).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_field_checks() {
        assert_eq!(ProfileField::from_name("photoURL"), Some(ProfileField::PhotoUrl));
        assert_eq!(ProfileField::from_name("email"), None);

        assert!(ProfileField::Bio.check("  ").is_err());
        assert!(ProfileField::Bio.check("Builder").is_ok());
        assert!(ProfileField::Github.check("").is_ok());
        assert!(ProfileField::Github.check("github.com/ada").is_err());
        assert!(ProfileField::Linkedin
            .check("https://linkedin.com/in/ada")
            .is_ok());
    }

    #[test]
    fn test_document_uses_collection_keys() {
        let mut doc = UserDocument::new(UserProfile {
            full_name: "Ada".into(),
            photo_url: "http://x/p.png".into(),
            ..Default::default()
        });
        doc.append(
            Category::WebProject,
            ContentItem::Project(Project {
                title: "Portfolio Site".into(),
                ..Default::default()
            }),
        )
        .unwrap();

        let value = serde_json::to_value(&doc).unwrap();
        assert_eq!(value["fullName"], "Ada");
        assert_eq!(value["photoURL"], "http://x/p.png");
        assert_eq!(value["web project"][0]["title"], "Portfolio Site");
        assert_eq!(value["position of responsibility"], serde_json::json!([]));
    }

    #[test]
    fn test_missing_collections_default_to_empty() {
        let doc: UserDocument = serde_json::from_str(r#"{"name": "Ada"}"#).unwrap();
        assert_eq!(doc.profile.full_name, "Ada");
        for category in Category::ALL {
            assert_eq!(doc.count(category), 0);
        }
    }

    #[test]
    fn test_append_rejects_mismatched_kind() {
        let mut doc = UserDocument::default();
        let err = doc
            .append(Category::Hackathon, ContentItem::Project(Project::default()))
            .unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
        assert_eq!(doc.count(Category::Hackathon), 0);
    }

    #[test]
    fn test_profile_input_requires_fields() {
        let mut fields = FormFields::new();
        fields.insert("fullName".into(), "Ada".into());
        fields.insert("bio".into(), "  ".into());
        let err = ProfileInput::from_fields(&fields).validate().unwrap_err();
        assert_eq!(err.to_string(), "Bio is required");
    }

    #[test]
    fn test_apply_updates_only_named_fields() {
        let mut doc = UserDocument::new(UserProfile {
            full_name: "Ada".into(),
            bio: "Engineer".into(),
            ..Default::default()
        });
        doc.apply(vec![(ProfileField::Github, "https://github.com/ada".into())]);
        assert_eq!(doc.profile.full_name, "Ada");
        assert_eq!(doc.profile.links.github, "https://github.com/ada");
    }
}
