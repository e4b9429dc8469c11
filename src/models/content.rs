//! Content records: projects, hackathons and positions of responsibility.
//!
//! Each record kind is stored in a per-user collection keyed by its
//! [`Category`]. Every field defaults when absent so partially written
//! records still deserialize.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use url::Url;

use super::{field, FormFields};
use crate::{Error, Result};

/// Content category. Determines the collection an item is appended to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    WebProject,
    AiProject,
    AndroidProject,
    Hackathon,
    Position,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::WebProject,
        Category::AiProject,
        Category::AndroidProject,
        Category::Hackathon,
        Category::Position,
    ];

    /// Key of the collection inside the user document.
    pub fn collection_key(self) -> &'static str {
        match self {
            Self::WebProject => "web project",
            Self::AiProject => "ai/ml project",
            Self::AndroidProject => "android project",
            Self::Hackathon => "hackathon",
            Self::Position => "position of responsibility",
        }
    }

    /// Label shown in the upload dashboard.
    pub fn label(self) -> &'static str {
        match self {
            Self::WebProject => "Web Project",
            Self::AiProject => "AI/ML Project",
            Self::AndroidProject => "Android Project",
            Self::Hackathon => "Hackathon",
            Self::Position => "Position of Responsibility",
        }
    }

    /// URL-safe identifier, also used as the blob path prefix.
    pub fn slug(self) -> &'static str {
        match self {
            Self::WebProject => "web-project",
            Self::AiProject => "ai-project",
            Self::AndroidProject => "android-project",
            Self::Hackathon => "hackathon",
            Self::Position => "position",
        }
    }

    pub fn from_slug(slug: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.slug() == slug)
    }

    /// Singular noun used in notices ("Project uploaded successfully!").
    pub fn noun(self) -> &'static str {
        match self {
            Self::WebProject | Self::AiProject | Self::AndroidProject => "Project",
            Self::Hackathon => "Hackathon",
            Self::Position => "Position",
        }
    }
}

/// A web, AI/ML or Android project.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Project {
    pub title: String,
    pub description: String,
    pub technologies: String,
    pub image_url: String,
    pub deploy_link: String,
    #[serde(alias = "codeLink")]
    pub github_link: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uploaded_at: Option<DateTime<Utc>>,
}

impl Project {
    pub fn from_fields(fields: &FormFields) -> Self {
        Self {
            title: field(fields, &["title"]),
            description: field(fields, &["description"]),
            technologies: field(fields, &["technologies"]),
            image_url: String::new(),
            deploy_link: field(fields, &["deployLink"]),
            github_link: field(fields, &["githubLink", "codeLink"]),
            uploaded_at: None,
        }
    }

    pub fn validate(&self) -> Result<()> {
        require(&self.title, "Title")?;
        require(&self.description, "Description")?;
        check_link(&self.deploy_link, "Deployment link")?;
        check_link(&self.github_link, "GitHub link")
    }
}

/// A hackathon entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Hackathon {
    #[serde(alias = "name")]
    pub title: String,
    pub organization: String,
    pub description: String,
    pub technologies: String,
    pub achievements: String,
    pub image_url: String,
    pub deploy_link: String,
    #[serde(alias = "codeLink")]
    pub github_link: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uploaded_at: Option<DateTime<Utc>>,
}

impl Hackathon {
    pub fn from_fields(fields: &FormFields) -> Self {
        Self {
            title: field(fields, &["title", "name"]),
            organization: field(fields, &["organization"]),
            description: field(fields, &["description"]),
            technologies: field(fields, &["technologies"]),
            achievements: field(fields, &["achievements"]),
            image_url: String::new(),
            deploy_link: field(fields, &["deployLink"]),
            github_link: field(fields, &["githubLink", "codeLink"]),
            uploaded_at: None,
        }
    }

    pub fn validate(&self) -> Result<()> {
        require(&self.title, "Name")?;
        require(&self.description, "Description")?;
        check_link(&self.deploy_link, "Deployment link")?;
        check_link(&self.github_link, "Code link")
    }
}

/// A position of responsibility.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Position {
    pub title: String,
    pub role: String,
    pub organization: String,
    #[serde(alias = "work")]
    pub description: String,
    /// `YYYY-MM-DD`
    pub start_date: String,
    /// `YYYY-MM-DD`, empty while the position is ongoing
    pub end_date: String,
    pub achievements: String,
    pub technologies: String,
    pub image_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uploaded_at: Option<DateTime<Utc>>,
}

impl Position {
    pub fn from_fields(fields: &FormFields) -> Self {
        Self {
            title: field(fields, &["title"]),
            role: field(fields, &["role"]),
            organization: field(fields, &["organization"]),
            description: field(fields, &["description", "work"]),
            start_date: field(fields, &["startDate"]),
            end_date: field(fields, &["endDate"]),
            achievements: field(fields, &["achievements"]),
            technologies: field(fields, &["technologies"]),
            image_url: String::new(),
            uploaded_at: None,
        }
    }

    pub fn validate(&self) -> Result<()> {
        require(&self.title, "Position title")?;
        require(&self.organization, "Organization")?;
        require(&self.description, "Work description")?;
        require(&self.start_date, "Start date")?;

        let start = parse_date(&self.start_date, "Start date")?;
        if !self.end_date.trim().is_empty() {
            let end = parse_date(&self.end_date, "End date")?;
            if end < start {
                return Err(Error::Validation(
                    "End date cannot be before start date".to_string(),
                ));
            }
        }
        Ok(())
    }

    /// Start date as "January 5, 2024"; unparseable dates are returned as-is.
    pub fn formatted_start_date(&self) -> String {
        format_date(&self.start_date)
    }

    pub fn formatted_end_date(&self) -> String {
        format_date(&self.end_date)
    }
}

/// One item of any content collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ContentItem {
    Project(Project),
    Hackathon(Hackathon),
    Position(Position),
}

impl ContentItem {
    /// Build the typed record for `category` from raw form fields.
    pub fn from_fields(category: Category, fields: &FormFields) -> Self {
        match category {
            Category::WebProject | Category::AiProject | Category::AndroidProject => {
                Self::Project(Project::from_fields(fields))
            }
            Category::Hackathon => Self::Hackathon(Hackathon::from_fields(fields)),
            Category::Position => Self::Position(Position::from_fields(fields)),
        }
    }

    pub fn validate(&self) -> Result<()> {
        match self {
            Self::Project(p) => p.validate(),
            Self::Hackathon(h) => h.validate(),
            Self::Position(p) => p.validate(),
        }
    }

    pub fn title(&self) -> &str {
        match self {
            Self::Project(p) => &p.title,
            Self::Hackathon(h) => &h.title,
            Self::Position(p) => &p.title,
        }
    }

    pub fn image_url(&self) -> &str {
        match self {
            Self::Project(p) => &p.image_url,
            Self::Hackathon(h) => &h.image_url,
            Self::Position(p) => &p.image_url,
        }
    }

    pub fn set_image_url(&mut self, url: String) {
        match self {
            Self::Project(p) => p.image_url = url,
            Self::Hackathon(h) => h.image_url = url,
            Self::Position(p) => p.image_url = url,
        }
    }

    pub fn stamp(&mut self, at: DateTime<Utc>) {
        match self {
            Self::Project(p) => p.uploaded_at = Some(at),
            Self::Hackathon(h) => h.uploaded_at = Some(at),
            Self::Position(p) => p.uploaded_at = Some(at),
        }
    }
}

fn require(value: &str, label: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::Validation(format!("{} is required", label)));
    }
    Ok(())
}

/// Empty links are allowed; anything else must be an absolute http(s) URL.
pub(crate) fn check_link(value: &str, label: &str) -> Result<()> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(());
    }
    match Url::parse(value) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => Ok(()),
        _ => Err(Error::Validation(format!(
            "{} must be a valid http(s) URL",
            label
        ))),
    }
}

fn parse_date(value: &str, label: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|_| Error::Validation(format!("{} must be a date (YYYY-MM-DD)", label)))
}

fn format_date(value: &str) -> String {
    match NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d") {
        Ok(date) => date.format("%B %-d, %Y").to_string(),
        Err(_) => value.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn fields(pairs: &[(&str, &str)]) -> FormFields {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_category_slug_roundtrip() {
        for category in Category::ALL {
            assert_eq!(Category::from_slug(category.slug()), Some(category));
        }
        assert_eq!(Category::from_slug("blog"), None);
    }

    #[test]
    fn test_project_from_fields_accepts_code_link_alias() {
        let project = Project::from_fields(&fields(&[
            ("title", " Portfolio Site "),
            ("description", "Personal site"),
            ("codeLink", "https://github.com/x/y"),
        ]));
        assert_eq!(project.title, "Portfolio Site");
        assert_eq!(project.github_link, "https://github.com/x/y");
        assert!(project.validate().is_ok());
    }

    #[rstest]
    #[case(&[("description", "d")], "Title is required")]
    #[case(&[("title", "t")], "Description is required")]
    #[case(&[("title", "t"), ("description", "d"), ("deployLink", "ftp://x")], "Deployment link must be a valid http(s) URL")]
    fn test_project_validation(#[case] input: &[(&str, &str)], #[case] message: &str) {
        let err = Project::from_fields(&fields(input)).validate().unwrap_err();
        assert_eq!(err.to_string(), message);
    }

    #[test]
    fn test_position_date_order() {
        let mut position = Position {
            title: "Lead".into(),
            organization: "Club".into(),
            description: "Ran events".into(),
            start_date: "2024-03-01".into(),
            end_date: "2024-01-01".into(),
            ..Default::default()
        };
        assert!(position.validate().is_err());

        position.end_date = String::new();
        assert!(position.validate().is_ok());
    }

    #[test]
    fn test_position_formats_dates() {
        let position = Position {
            start_date: "2024-01-05".into(),
            end_date: "not a date".into(),
            ..Default::default()
        };
        assert_eq!(position.formatted_start_date(), "January 5, 2024");
        assert_eq!(position.formatted_end_date(), "not a date");
    }

    #[test]
    fn test_legacy_keys_deserialize() {
        let hackathon: Hackathon =
            serde_json::from_str(r#"{"name": "HackX", "codeLink": "https://g.dev"}"#).unwrap();
        assert_eq!(hackathon.title, "HackX");
        assert_eq!(hackathon.github_link, "https://g.dev");
        assert_eq!(hackathon.description, "");

        let position: Position = serde_json::from_str(r#"{"work": "Organised"}"#).unwrap();
        assert_eq!(position.description, "Organised");
    }
}
