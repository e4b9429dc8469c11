//! Composite views: the home portfolio page and the "About me" profile.

use serde::Serialize;

use super::hero::{Hero, HeroProjection, HeroView};
use super::section::{CollectionEntry, RemoteCollection, SectionView};
use crate::models::{Category, UserDocument, UserProfile};
use crate::services::{Projection, ViewState};
use crate::Result;

/// Everything the home page shows, projected from one document read.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PortfolioData {
    pub hero: Hero,
    pub projects: Vec<CollectionEntry>,
    pub hackathons: Vec<CollectionEntry>,
    pub positions: Vec<CollectionEntry>,
}

pub struct PortfolioProjection;

impl Projection for PortfolioProjection {
    type Output = PortfolioData;

    fn project(&self, document: Option<&UserDocument>) -> PortfolioData {
        PortfolioData {
            hero: HeroProjection.project(document),
            projects: RemoteCollection::projects().collect(document),
            hackathons: RemoteCollection::hackathons().collect(document),
            positions: RemoteCollection::positions().collect(document),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioView {
    pub signed_in: bool,
    pub error: bool,
    pub hero: HeroView,
    pub sections: Vec<SectionView>,
}

impl PortfolioView {
    pub fn render(state: &ViewState<PortfolioData>) -> Result<Self> {
        let hero = HeroView::from_state(&ViewState {
            data: state.data.hero.clone(),
            loading: state.loading,
            error: state.error,
            signed_in: state.signed_in,
        });

        let sections = [
            (RemoteCollection::projects(), &state.data.projects),
            (RemoteCollection::hackathons(), &state.data.hackathons),
            (RemoteCollection::positions(), &state.data.positions),
        ]
        .into_iter()
        .map(|(collection, entries)| {
            collection.render(
                &ViewState {
                    data: entries.clone(),
                    loading: state.loading,
                    error: state.error,
                    signed_in: state.signed_in,
                },
                0,
                None,
            )
        })
        .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            signed_in: state.signed_in,
            error: state.error,
            hero,
            sections,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryCount {
    pub category: Category,
    pub label: &'static str,
    pub count: usize,
}

/// "About me": the full profile plus how much has been uploaded.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileDetail {
    pub profile: UserProfile,
    pub counts: Vec<CategoryCount>,
}

/// Projects to `None` when the user has no document yet.
pub struct ProfileProjection;

impl Projection for ProfileProjection {
    type Output = Option<ProfileDetail>;

    fn project(&self, document: Option<&UserDocument>) -> Option<ProfileDetail> {
        let document = document?;
        Some(ProfileDetail {
            profile: document.profile.clone(),
            counts: Category::ALL
                .into_iter()
                .map(|category| CategoryCount {
                    category,
                    label: category.label(),
                    count: document.count(category),
                })
                .collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ContentItem, Position};

    #[test]
    fn test_loading_portfolio_renders_loading_everywhere() {
        let view = PortfolioView::render(&ViewState::loading()).unwrap();
        assert_eq!(view.hero, HeroView::Loading);
        for section in &view.sections {
            let value = serde_json::to_value(section).unwrap();
            assert_eq!(value["branch"], "loading");
        }
    }

    #[test]
    fn test_portfolio_branches_per_section() {
        let mut doc = UserDocument::default();
        doc.append(
            Category::Position,
            ContentItem::Position(Position {
                title: "Lead".into(),
                ..Default::default()
            }),
        )
        .unwrap();

        let data = PortfolioProjection.project(Some(&doc));
        let view = PortfolioView::render(&ViewState::ready(data)).unwrap();
        let branches: Vec<_> = view
            .sections
            .iter()
            .map(|s| serde_json::to_value(s).unwrap()["branch"].clone())
            .collect();
        assert_eq!(branches, vec!["empty", "empty", "populated"]);
    }

    #[test]
    fn test_profile_detail_counts() {
        assert!(ProfileProjection.project(None).is_none());

        let doc = UserDocument::default();
        let detail = ProfileProjection.project(Some(&doc)).unwrap();
        assert_eq!(detail.counts.len(), 5);
        assert!(detail.counts.iter().all(|c| c.count == 0));
    }
}
