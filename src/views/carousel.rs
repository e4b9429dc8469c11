//! Carousel of cards: one slide at a time, no wrap-around, no autoplay.

use serde::Serialize;

/// Slider settings shared by every section carousel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CarouselConfig {
    pub dots: bool,
    pub arrows: bool,
    pub infinite: bool,
    pub autoplay: bool,
    pub slides_to_show: usize,
    pub slides_to_scroll: usize,
    pub initial_slide: usize,
}

impl Default for CarouselConfig {
    fn default() -> Self {
        Self {
            dots: true,
            arrows: false,
            infinite: false,
            autoplay: false,
            slides_to_show: 1,
            slides_to_scroll: 1,
            initial_slide: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Carousel<T> {
    pub config: CarouselConfig,
    pub slides: Vec<T>,
    pub current: usize,
}

impl<T> Carousel<T> {
    pub fn new(slides: Vec<T>) -> Self {
        Self::with_config(slides, CarouselConfig::default())
    }

    pub fn with_config(slides: Vec<T>, config: CarouselConfig) -> Self {
        let mut carousel = Self {
            config,
            slides,
            current: 0,
        };
        carousel.go_to(config.initial_slide);
        carousel
    }

    fn last_index(&self) -> usize {
        self.slides.len().saturating_sub(1)
    }

    /// Jump to a slide, clamped to the valid range.
    pub fn go_to(&mut self, index: usize) {
        self.current = index.min(self.last_index());
    }
}
