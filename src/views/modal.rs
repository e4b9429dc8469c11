//! Detail modal for one collection item.
//!
//! Opening never touches the list it was opened from. Dismissing is
//! rendering the section again without an open item.

use serde::Serialize;

use crate::models::{ContentItem, Hackathon, Position, Project};
use crate::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Link {
    pub label: &'static str,
    pub href: String,
}

fn link(label: &'static str, href: &str) -> Option<Link> {
    let href = href.trim();
    (!href.is_empty()).then(|| Link {
        label,
        href: href.to_string(),
    })
}

fn non_blank(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

/// What the modal shows for an item.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ItemDetail {
    #[serde(rename_all = "camelCase")]
    Project {
        title: String,
        description: String,
        technologies: Option<String>,
        /// Deployed site, shown embedded when present
        embed_url: Option<String>,
        image_url: Option<String>,
        links: Vec<Link>,
    },
    #[serde(rename_all = "camelCase")]
    Hackathon {
        title: String,
        organization: Option<String>,
        description: String,
        technologies: Option<String>,
        achievements: Option<String>,
        embed_url: Option<String>,
        image_url: Option<String>,
        links: Vec<Link>,
    },
    #[serde(rename_all = "camelCase")]
    Position {
        title: String,
        role: Option<String>,
        organization: String,
        start_date: String,
        end_date: Option<String>,
        description: String,
        achievements: Option<String>,
        technologies: Option<String>,
        image_url: Option<String>,
    },
}

impl ItemDetail {
    pub fn from_item(item: &ContentItem) -> Self {
        match item {
            ContentItem::Project(p) => Self::project(p),
            ContentItem::Hackathon(h) => Self::hackathon(h),
            ContentItem::Position(p) => Self::position(p),
        }
    }

    fn project(p: &Project) -> Self {
        Self::Project {
            title: p.title.clone(),
            description: p.description.clone(),
            technologies: non_blank(&p.technologies),
            embed_url: non_blank(&p.deploy_link),
            image_url: non_blank(&p.image_url),
            links: [link("Live Demo", &p.deploy_link), link("View Code", &p.github_link)]
                .into_iter()
                .flatten()
                .collect(),
        }
    }

    fn hackathon(h: &Hackathon) -> Self {
        Self::Hackathon {
            title: h.title.clone(),
            organization: non_blank(&h.organization),
            description: h.description.clone(),
            technologies: non_blank(&h.technologies),
            achievements: non_blank(&h.achievements),
            embed_url: non_blank(&h.deploy_link),
            image_url: non_blank(&h.image_url),
            links: [link("Live Demo", &h.deploy_link), link("View Code", &h.github_link)]
                .into_iter()
                .flatten()
                .collect(),
        }
    }

    fn position(p: &Position) -> Self {
        Self::Position {
            title: p.title.clone(),
            role: non_blank(&p.role),
            organization: p.organization.clone(),
            start_date: p.formatted_start_date(),
            end_date: non_blank(&p.end_date).map(|_| p.formatted_end_date()),
            description: p.description.clone(),
            achievements: non_blank(&p.achievements),
            technologies: non_blank(&p.technologies),
            image_url: non_blank(&p.image_url),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum DetailModal {
    #[default]
    Closed,
    Open {
        index: usize,
        detail: ItemDetail,
    },
}

impl DetailModal {
    /// Open the modal for `items[index]`.
    pub fn open(items: &[ContentItem], index: usize) -> Result<Self> {
        let item = items
            .get(index)
            .ok_or_else(|| Error::NotFound(format!("Item {}", index)))?;
        Ok(Self::Open {
            index,
            detail: ItemDetail::from_item(item),
        })
    }
}
