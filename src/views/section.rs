//! Remote-collection sections: projects, hackathons and positions.
//!
//! Each section reads one or more collections of the user document, and
//! renders exactly one branch: loading, empty (with a call to action) or
//! populated (a carousel of cards).

use serde::Serialize;

use super::carousel::Carousel;
use super::modal::DetailModal;
use crate::models::{Category, ContentItem, UserDocument};
use crate::services::{Projection, ViewState};
use crate::Result;

/// An item together with the collection it came from.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionEntry {
    pub category: Category,
    pub item: ContentItem,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Media {
    /// Live site rendered in a frame
    Embed { url: String },
    Image { url: String },
}

/// One carousel slide.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Card {
    /// Position in the section's item list, used to open the detail modal
    pub index: usize,
    pub category: Category,
    pub title: String,
    pub subtitle: String,
    pub media: Option<Media>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CallToAction {
    pub title: &'static str,
    pub message: &'static str,
    pub label: &'static str,
    pub href: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Heading {
    pub mini_title: &'static str,
    pub title: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "branch", rename_all = "camelCase")]
pub enum RenderBranch {
    Loading,
    #[serde(rename_all = "camelCase")]
    Empty {
        call_to_action: CallToAction,
    },
    Populated {
        carousel: Carousel<Card>,
    },
}

/// Rendered section, ready to serialize.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionView {
    pub key: &'static str,
    pub heading: Heading,
    #[serde(flatten)]
    pub branch: RenderBranch,
    /// The read failed; the branch falls back to empty
    pub error: bool,
    pub modal: DetailModal,
}

/// Generic fetch-and-render section.
#[derive(Clone, Copy)]
pub struct RemoteCollection {
    pub key: &'static str,
    pub categories: &'static [Category],
    pub heading: Heading,
    pub empty: CallToAction,
    pub render: fn(usize, &CollectionEntry) -> Card,
}

const PROJECT_CATEGORIES: &[Category] = &[
    Category::WebProject,
    Category::AiProject,
    Category::AndroidProject,
];

impl RemoteCollection {
    pub fn projects() -> Self {
        Self {
            key: "projects",
            categories: PROJECT_CATEGORIES,
            heading: Heading {
                mini_title: "Projects",
                title: "My Recent Work",
            },
            empty: CallToAction {
                title: "No Projects Yet",
                message: "Start showcasing your work by adding your first project!",
                label: "Add Project",
                href: "/upload",
            },
            render: render_with_embed,
        }
    }

    pub fn hackathons() -> Self {
        Self {
            key: "hackathons",
            categories: &[Category::Hackathon],
            heading: Heading {
                mini_title: "Hackathons",
                title: "My Hackathon Achievements",
            },
            empty: CallToAction {
                title: "No Hackathons Yet",
                message: "Showcase your hackathon achievements and wins!",
                label: "Add Hackathon",
                href: "/upload",
            },
            render: render_with_image,
        }
    }

    pub fn positions() -> Self {
        Self {
            key: "positions",
            categories: &[Category::Position],
            heading: Heading {
                mini_title: "Positions",
                title: "Positions of Responsibility",
            },
            empty: CallToAction {
                title: "No Positions Added Yet",
                message: "Highlight your leadership roles and responsibilities!",
                label: "Add Position",
                href: "/upload",
            },
            render: render_with_image,
        }
    }

    pub fn all() -> [Self; 3] {
        [Self::projects(), Self::hackathons(), Self::positions()]
    }

    pub fn by_key(key: &str) -> Option<Self> {
        Self::all().into_iter().find(|c| c.key == key)
    }

    /// Entries of this section's collections, in category order.
    pub fn collect(&self, document: Option<&UserDocument>) -> Vec<CollectionEntry> {
        let Some(document) = document else {
            return Vec::new();
        };
        self.categories
            .iter()
            .flat_map(|&category| {
                document
                    .items(category)
                    .into_iter()
                    .map(move |item| CollectionEntry { category, item })
            })
            .collect()
    }

    /// Render the section. `slide` positions the carousel and `open`, when
    /// set, opens the detail modal for that entry.
    pub fn render(
        &self,
        state: &ViewState<Vec<CollectionEntry>>,
        slide: usize,
        open: Option<usize>,
    ) -> Result<SectionView> {
        let branch = if state.loading {
            RenderBranch::Loading
        } else if state.data.is_empty() {
            RenderBranch::Empty {
                call_to_action: self.empty,
            }
        } else {
            let cards = state
                .data
                .iter()
                .enumerate()
                .map(|(index, entry)| (self.render)(index, entry))
                .collect();
            let mut carousel = Carousel::new(cards);
            carousel.go_to(slide);
            RenderBranch::Populated { carousel }
        };

        let modal = match open {
            Some(index) if !state.loading => {
                let items: Vec<ContentItem> =
                    state.data.iter().map(|e| e.item.clone()).collect();
                DetailModal::open(&items, index)?
            }
            _ => DetailModal::Closed,
        };

        Ok(SectionView {
            key: self.key,
            heading: self.heading,
            branch,
            error: state.error,
            modal,
        })
    }
}

impl Projection for RemoteCollection {
    type Output = Vec<CollectionEntry>;

    fn project(&self, document: Option<&UserDocument>) -> Self::Output {
        self.collect(document)
    }
}

fn subtitle(item: &ContentItem) -> String {
    match item {
        ContentItem::Project(p) => p.technologies.clone(),
        ContentItem::Hackathon(h) => h.organization.clone(),
        ContentItem::Position(p) => p.role.clone(),
    }
}

fn image(item: &ContentItem) -> Option<Media> {
    let url = item.image_url().trim();
    (!url.is_empty()).then(|| Media::Image {
        url: url.to_string(),
    })
}

/// Projects embed the deployed site when there is one.
fn render_with_embed(index: usize, entry: &CollectionEntry) -> Card {
    let embed = match &entry.item {
        ContentItem::Project(p) if !p.deploy_link.trim().is_empty() => Some(Media::Embed {
            url: p.deploy_link.trim().to_string(),
        }),
        _ => None,
    };
    Card {
        index,
        category: entry.category,
        title: entry.item.title().to_string(),
        subtitle: subtitle(&entry.item),
        media: embed.or_else(|| image(&entry.item)),
    }
}

fn render_with_image(index: usize, entry: &CollectionEntry) -> Card {
    Card {
        index,
        category: entry.category,
        title: entry.item.title().to_string(),
        subtitle: subtitle(&entry.item),
        media: image(&entry.item),
    }
}
