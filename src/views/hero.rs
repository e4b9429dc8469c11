//! Hero section: name, bio, social links and photo.

use serde::Serialize;

use crate::models::{UserDocument, UserProfile};
use crate::services::{Projection, ViewState};

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Hero {
    pub full_name: String,
    pub bio: String,
    pub linkedin: String,
    pub github: String,
    pub photo_url: String,
}

impl Hero {
    pub fn from_profile(profile: &UserProfile) -> Self {
        Self {
            full_name: profile.full_name.clone(),
            bio: profile.bio.clone(),
            linkedin: profile.links.linkedin.clone(),
            github: profile.links.github.clone(),
            photo_url: profile.photo_url.clone(),
        }
    }
}

pub struct HeroProjection;

impl Projection for HeroProjection {
    type Output = Hero;

    fn project(&self, document: Option<&UserDocument>) -> Hero {
        document
            .map(|d| Hero::from_profile(&d.profile))
            .unwrap_or_default()
    }
}

/// Skeleton while loading; otherwise the (possibly blank) hero.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "branch", rename_all = "camelCase")]
pub enum HeroView {
    Loading,
    Populated(Hero),
}

impl HeroView {
    pub fn from_state(state: &ViewState<Hero>) -> Self {
        if state.loading {
            Self::Loading
        } else {
            Self::Populated(state.data.clone())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SocialLinks;

    #[test]
    fn test_hero_from_document() {
        let doc = UserDocument::new(UserProfile {
            full_name: "Ada".into(),
            bio: "Engineer".into(),
            links: SocialLinks {
                linkedin: "https://linkedin.com/in/ada".into(),
                github: String::new(),
            },
            ..Default::default()
        });
        let hero = HeroProjection.project(Some(&doc));
        assert_eq!(hero.full_name, "Ada");
        assert_eq!(hero.linkedin, "https://linkedin.com/in/ada");
        assert_eq!(hero.github, "");
    }

    #[test]
    fn test_hero_branches() {
        assert_eq!(HeroView::from_state(&ViewState::loading()), HeroView::Loading);
        assert_eq!(
            HeroView::from_state(&ViewState::signed_out()),
            HeroView::Populated(Hero::default())
        );
    }
}
