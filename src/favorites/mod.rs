mod deeplink;
mod loader;
mod popup;

pub use deeplink::{client_user_agent, maps_link, Platform};
pub use loader::{load, Source};
pub use popup::{display_rating, terminal_safe, PopupContent, STAR, UNNAMED};

use std::str::FromStr;

use geojson::{Geometry, JsonObject, Value};
use serde_json::Value as JsonValue;
use tracing::debug;

use crate::error::LoadError;
use crate::geo::LatLng;

/// One favorite place
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Favorite {
    /// `None` when the feature has no usable point geometry
    pub position: Option<LatLng>,
    pub name: Option<String>,
    /// Raw rating, clamped only when displayed
    pub rating: Option<f64>,
    pub tags: Vec<String>,
    pub notes: Option<String>,
}

impl Favorite {
    /// Build a favorite from one raw `features` entry. A geometry that is
    /// missing, malformed or not a point leaves the favorite without position.
    pub fn from_json(feature: &JsonObject) -> Self {
        let position = match feature.get("geometry") {
            Some(JsonValue::Object(geometry)) => match Geometry::try_from(geometry.clone()) {
                Ok(geometry) => point_position(&geometry.value),
                Err(error) => {
                    debug!("skipping malformed geometry: {error}");
                    None
                }
            },
            _ => None,
        };
        let props = match feature.get("properties") {
            Some(JsonValue::Object(props)) => Some(props),
            _ => None,
        };

        Self {
            position,
            name: props.and_then(|p| text_property(p, "name")),
            rating: props.and_then(|p| p.get("rating")).and_then(number),
            tags: props.map(tags).unwrap_or_default(),
            notes: props.and_then(|p| text_property(p, "notes")),
        }
    }
}

/// The full ordered set of favorites, in source order
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FavoriteCollection {
    pub favorites: Vec<Favorite>,
}

impl FavoriteCollection {
    /// Parse a FeatureCollection one feature at a time, so a single bad
    /// feature cannot take the rest down with it
    pub fn from_json(value: JsonValue) -> Result<Self, LoadError> {
        let JsonValue::Object(mut collection) = value else {
            return Err(LoadError::NotACollection("non-object value"));
        };
        match collection.get("type").and_then(JsonValue::as_str) {
            Some("FeatureCollection") => {}
            Some("Feature") => return Err(LoadError::NotACollection("Feature")),
            Some(_) => return Err(LoadError::NotACollection("Geometry")),
            None => return Err(geojson::Error::ExpectedProperty("type".to_string()).into()),
        }
        let Some(JsonValue::Array(features)) = collection.remove("features") else {
            return Err(geojson::Error::ExpectedProperty("features".to_string()).into());
        };

        let favorites: Vec<Favorite> = features
            .iter()
            .map(|feature| match feature {
                JsonValue::Object(feature) => Favorite::from_json(feature),
                _ => Favorite::default(),
            })
            .collect();
        let skipped = favorites.iter().filter(|f| f.position.is_none()).count();
        if skipped > 0 {
            debug!(skipped, "features without point geometry");
        }
        Ok(Self { favorites })
    }

    pub fn len(&self) -> usize {
        self.favorites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.favorites.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Favorite> {
        self.favorites.get(index)
    }

    /// Favorites that can be placed on the map, with their index
    pub fn points(&self) -> impl Iterator<Item = (usize, LatLng)> + '_ {
        self.favorites
            .iter()
            .enumerate()
            .filter_map(|(idx, favorite)| favorite.position.map(|position| (idx, position)))
    }
}

impl FromStr for FavoriteCollection {
    type Err = LoadError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value: JsonValue = serde_json::from_str(s).map_err(geojson::Error::from)?;
        Self::from_json(value)
    }
}

/// GeoJSON points are `[lng, lat, ...]`; any finite pair is placed as is
fn point_position(value: &Value) -> Option<LatLng> {
    match value {
        Value::Point(coords) if coords.len() >= 2 && coords[0].is_finite() && coords[1].is_finite() => {
            Some(LatLng::new(coords[1], coords[0]))
        }
        _ => None,
    }
}

/// Non-empty string property
fn text_property(props: &JsonObject, key: &str) -> Option<String> {
    props
        .get(key)
        .and_then(|v| v.as_str())
        .filter(|s| !s.trim().is_empty())
        .map(str::to_string)
}

/// Numbers and numeric strings
fn number(value: &JsonValue) -> Option<f64> {
    match value {
        JsonValue::Number(n) => n.as_f64(),
        JsonValue::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn tags(props: &JsonObject) -> Vec<String> {
    let Some(JsonValue::Array(items)) = props.get("tags") else {
        return Vec::new();
    };
    items
        .iter()
        .filter_map(|item| match item {
            JsonValue::String(s) => Some(s.trim().to_string()),
            JsonValue::Number(n) => Some(n.to_string()),
            _ => None,
        })
        .filter(|tag| !tag.is_empty())
        .collect()
}
