//! Popup contents for a favorite.

use std::borrow::Cow;

use maud::{html, Markup, Render};

use super::{maps_link, Favorite, Platform};
use crate::geo::LatLng;

/// Title used for favorites without a name
pub const UNNAMED: &str = "Unnamed place";

pub const STAR: char = '★';

/// Rating as shown: missing, zero and NaN ratings are hidden, the rest land in 1..=5
pub fn display_rating(rating: Option<f64>) -> Option<f64> {
    rating
        .filter(|r| *r != 0.0 && !r.is_nan())
        .map(|r| r.clamp(1.0, 5.0))
}

/// Replace control characters so user text cannot drive the terminal
pub fn terminal_safe(text: &str) -> Cow<'_, str> {
    if text.chars().any(char::is_control) {
        Cow::Owned(
            text.chars()
                .map(|c| if c.is_control() { ' ' } else { c })
                .collect(),
        )
    } else {
        Cow::Borrowed(text)
    }
}

/// Everything a popup shows, already formatted
#[derive(Clone, Debug, PartialEq)]
pub struct PopupContent {
    pub title: String,
    /// `★ 4/5`
    pub rating: Option<String>,
    /// Tags with their `#` prefix
    pub tags: Vec<String>,
    pub notes: Option<String>,
    pub link: String,
}

impl PopupContent {
    pub fn new(favorite: &Favorite, position: LatLng, platform: Platform) -> Self {
        let title = favorite.name.clone().unwrap_or_else(|| UNNAMED.to_string());
        let link = maps_link(platform, position, &title);
        Self {
            rating: display_rating(favorite.rating).map(|r| format!("{STAR} {r}/5")),
            tags: favorite.tags.iter().map(|tag| format!("#{tag}")).collect(),
            notes: favorite.notes.clone(),
            title,
            link,
        }
    }

    pub fn to_html(&self) -> String {
        self.render().into_string()
    }
}

impl Render for PopupContent {
    fn render(&self) -> Markup {
        html! {
            div class="favorite-popup" {
                h3 class="favorite-title" { (self.title) }
                @if let Some(rating) = &self.rating {
                    div class="favorite-rating" { (rating) }
                }
                @if !self.tags.is_empty() {
                    div class="favorite-tags" {
                        @for tag in &self.tags {
                            span class="favorite-tag" { (tag) }
                            " "
                        }
                    }
                }
                @if let Some(notes) = &self.notes {
                    p class="favorite-notes" { (notes) }
                }
                a class="favorite-maps-link" href=(self.link) target="_blank" rel="noopener" { "Open in Maps" }
            }
        }
    }
}
