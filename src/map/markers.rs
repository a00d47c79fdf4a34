use std::rc::Rc;

use ratatui::style::Color;
use tracing::debug;

use crate::favorites::FavoriteCollection;
use crate::geo::LatLng;
use crate::map::projection::Viewport;

/// Glyph and color a marker is drawn with
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MarkerIcon {
    pub glyph: char,
    pub color: Color,
}

impl MarkerIcon {
    pub fn favorite() -> Self {
        Self {
            glyph: '♥',
            color: Color::LightRed,
        }
    }

    pub fn here() -> Self {
        Self {
            glyph: '◉',
            color: Color::LightBlue,
        }
    }
}

/// A favorite placed on the map
#[derive(Clone, Debug)]
pub struct Marker {
    pub position: LatLng,
    /// Index into the rendered collection
    pub feature: usize,
    pub icon: Rc<MarkerIcon>,
}

/// Character cell showing `position`, if on screen
pub fn cell(viewport: &Viewport, position: LatLng) -> Option<(u16, u16)> {
    let (px, py) = viewport.project(position);
    viewport
        .is_visible(px, py)
        .then(|| ((px / 2) as u16, (py / 4) as u16))
}

impl Marker {
    /// Character cell the marker occupies, if on screen
    pub fn cell(&self, viewport: &Viewport) -> Option<(u16, u16)> {
        cell(viewport, self.position)
    }
}

/// All favorite markers, redrawn wholesale
#[derive(Default)]
pub struct MarkerLayer {
    markers: Vec<Marker>,
    icon: Option<Rc<MarkerIcon>>,
}

impl MarkerLayer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop every marker, then add one per favorite with a point position.
    /// Returns the marker count.
    pub fn render(&mut self, collection: &FavoriteCollection) -> usize {
        self.markers.clear();
        let icon = Rc::clone(self.icon.get_or_insert_with(|| Rc::new(MarkerIcon::favorite())));

        self.markers.extend(collection.points().map(|(feature, position)| Marker {
            position,
            feature,
            icon: Rc::clone(&icon),
        }));

        debug!(
            markers = self.markers.len(),
            skipped = collection.len() - self.markers.len(),
            "rendered markers"
        );
        self.markers.len()
    }

    pub fn markers(&self) -> &[Marker] {
        &self.markers
    }

    pub fn len(&self) -> usize {
        self.markers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }

    /// Marker nearest to a character cell, at most one cell away
    pub fn hit_test(&self, viewport: &Viewport, col: u16, row: u16) -> Option<&Marker> {
        self.markers
            .iter()
            .filter_map(|marker| {
                let (mc, mr) = marker.cell(viewport)?;
                let (dx, dy) = (mc.abs_diff(col), mr.abs_diff(row));
                (dx <= 1 && dy <= 1).then_some((dx + dy, marker))
            })
            .min_by_key(|(distance, _)| *distance)
            .map(|(_, marker)| marker)
    }
}
