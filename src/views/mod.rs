//! Presentational view models.
//!
//! Serializable descriptions of what each page shows. A thin browser client
//! turns them into markup.

mod carousel;
mod hero;
mod layout;
mod modal;
mod portfolio;
mod section;

pub use carousel::{Carousel, CarouselConfig};
pub use hero::{Hero, HeroProjection, HeroView};
pub use layout::{AccountMenu, Header, NavLink, Route, SectionTab, UploadDashboard};
pub use modal::{DetailModal, ItemDetail, Link};
pub use portfolio::{
    CategoryCount, PortfolioData, PortfolioProjection, PortfolioView, ProfileDetail,
    ProfileProjection,
};
pub use section::{
    CallToAction, Card, CollectionEntry, Heading, Media, RemoteCollection, RenderBranch,
    SectionView,
};
