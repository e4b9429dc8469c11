//! Persistent chrome: routes, header navigation and the upload dashboard.

use serde::Serialize;

use crate::models::Identity;
use crate::services::{FormState, Section};

/// Navigable pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Route {
    Home,
    Upload,
    About,
    Login,
    Register,
}

impl Route {
    pub fn path(self) -> &'static str {
        match self {
            Self::Home => "/",
            Self::Upload => "/upload",
            Self::About => "/about",
            Self::Login => "/login",
            Self::Register => "/register",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Home => "Home",
            Self::Upload => "Upload",
            Self::About => "About me",
            Self::Login => "Login",
            Self::Register => "Register",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NavLink {
    pub label: &'static str,
    pub href: &'static str,
}

impl From<Route> for NavLink {
    fn from(route: Route) -> Self {
        Self {
            label: route.label(),
            href: route.path(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum AccountMenu {
    SignedIn { email: String, logout: NavLink },
    SignedOut { login: NavLink, register: NavLink },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Header {
    pub brand: NavLink,
    pub nav: Vec<NavLink>,
    pub account: AccountMenu,
}

impl Header {
    pub fn for_identity(identity: Option<&Identity>) -> Self {
        let account = match identity {
            Some(identity) => AccountMenu::SignedIn {
                email: identity.email.clone(),
                logout: NavLink {
                    label: "Logout",
                    href: "/api/auth/logout",
                },
            },
            None => AccountMenu::SignedOut {
                login: Route::Login.into(),
                register: Route::Register.into(),
            },
        };

        Self {
            brand: Route::Home.into(),
            nav: [Route::Home, Route::Upload, Route::About]
                .into_iter()
                .map(NavLink::from)
                .collect(),
            account,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SectionTab {
    pub section: Section,
    pub label: &'static str,
    pub selected: bool,
}

/// Upload page: section selector plus the selected section's form.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UploadDashboard {
    pub tabs: Vec<SectionTab>,
    pub selected: Section,
    pub form: FormState,
}

impl UploadDashboard {
    /// Select a section by slug. Missing or unknown slugs select Profile.
    pub fn select(requested: Option<&str>) -> Self {
        let selected = requested
            .and_then(Section::from_slug)
            .unwrap_or(Section::Profile);
        Self::with_form(FormState::new(selected))
    }

    /// Dashboard showing a settled form (after a submit).
    pub fn with_form(form: FormState) -> Self {
        let selected = form.section;
        Self {
            tabs: Section::ALL
                .into_iter()
                .map(|section| SectionTab {
                    section,
                    label: section.label(),
                    selected: section == selected,
                })
                .collect(),
            selected,
            form,
        }
    }
}
