use tracing::{debug, warn};

use crate::favorites::{FavoriteCollection, Platform, PopupContent};
use crate::geo::LatLng;
use crate::locate::{LocateControl, LocateOptions, LocationEvent, LocationOverlay, Locator};
use crate::map::{BaseMap, MarkerLayer, Viewport};

/// Initial view and client details
#[derive(Clone, Debug)]
pub struct MapConfig {
    pub center: LatLng,
    pub zoom: f64,
    pub platform: Platform,
}

/// The single popup slot
#[derive(Clone, Debug)]
pub struct Popup {
    pub feature: usize,
    pub anchor: LatLng,
    pub content: PopupContent,
    pub visible: bool,
}

/// Application state
pub struct App {
    pub viewport: Viewport,
    pub base_map: BaseMap,
    pub favorites: FavoriteCollection,
    pub markers: MarkerLayer,
    /// Created on first open, then reused
    popup: Option<Popup>,
    /// Present only when locating is enabled
    locate_control: Option<LocateControl>,
    locator: Option<Box<dyn Locator>>,
    pub locate_options: LocateOptions,
    pub location: LocationOverlay,
    pub platform: Platform,
    home: (LatLng, f64),
    pub should_quit: bool,
    /// Last mouse position for drag tracking
    pub last_mouse: Option<(u16, u16)>,
    dragged: bool,
    /// Marker index for keyboard cycling
    selected: Option<usize>,
    /// One-shot message for the status bar
    pub status: Option<String>,
}

impl App {
    pub fn new(config: &MapConfig, base_map: BaseMap, width: usize, height: usize) -> Self {
        let (pixel_width, pixel_height) = map_pixels(width, height);

        Self {
            viewport: Viewport::new(config.center, config.zoom, pixel_width, pixel_height),
            base_map,
            favorites: FavoriteCollection::default(),
            markers: MarkerLayer::new(),
            popup: None,
            locate_control: None,
            locator: None,
            locate_options: LocateOptions::default(),
            location: LocationOverlay::new(),
            platform: config.platform,
            home: (config.center, config.zoom),
            should_quit: false,
            last_mouse: None,
            dragged: false,
            selected: None,
            status: None,
        }
    }

    /// Update viewport size when terminal resizes
    pub fn resize(&mut self, width: usize, height: usize) {
        let (pixel_width, pixel_height) = map_pixels(width, height);
        self.viewport.width = pixel_width;
        self.viewport.height = pixel_height;
    }

    /// Replace the rendered favorites, clearing every previous marker
    pub fn set_favorites(&mut self, favorites: FavoriteCollection) -> usize {
        self.favorites = favorites;
        self.selected = None;
        self.close_popup();
        self.markers.render(&self.favorites)
    }

    /// Add the locate button backed by `locator`
    pub fn enable_locate(&mut self, locator: Box<dyn Locator>, options: LocateOptions) {
        self.locate_control.get_or_insert_with(LocateControl::new);
        self.locator = Some(locator);
        self.locate_options = options;
    }

    pub fn locate_control(&self) -> Option<&LocateControl> {
        self.locate_control.as_ref()
    }

    /// Width of the map area in character cells
    pub fn inner_width(&self) -> u16 {
        (self.viewport.width / 2) as u16
    }

    pub fn inner_height(&self) -> u16 {
        (self.viewport.height / 4) as u16
    }

    pub fn pan(&mut self, dx: i32, dy: i32) {
        self.viewport.pan(dx, dy);
    }

    pub fn zoom_in(&mut self) {
        self.viewport.zoom_in();
    }

    pub fn zoom_out(&mut self) {
        self.viewport.zoom_out();
    }

    /// Zoom in towards a screen position (terminal column/row)
    pub fn zoom_in_at(&mut self, col: u16, row: u16) {
        let (px, py) = screen_to_pixels(col, row);
        self.viewport.zoom_in_at(px, py);
    }

    /// Zoom out from a screen position (terminal column/row)
    pub fn zoom_out_at(&mut self, col: u16, row: u16) {
        let (px, py) = screen_to_pixels(col, row);
        self.viewport.zoom_out_at(px, py);
    }

    /// Back to the configured center and zoom
    pub fn reset_view(&mut self) {
        let (center, zoom) = self.home;
        self.viewport.center_on(center);
        self.viewport.set_zoom(zoom);
    }

    pub fn quit(&mut self) {
        self.should_quit = true;
    }

    /// Close the popup if one is showing, quit otherwise
    pub fn escape(&mut self) {
        if self.visible_popup().is_some() {
            self.close_popup();
        } else {
            self.quit();
        }
    }

    pub fn mouse_down(&mut self, col: u16, row: u16) {
        self.last_mouse = Some((col, row));
        self.dragged = false;
    }

    /// Pan with the pointer; one cell is 2x4 braille pixels
    pub fn handle_drag(&mut self, col: u16, row: u16) {
        if let Some((last_col, last_row)) = self.last_mouse {
            let dx = last_col as i32 - col as i32;
            let dy = last_row as i32 - row as i32;
            if dx != 0 || dy != 0 {
                self.dragged = true;
                self.pan(dx * 2, dy * 4);
            }
        }
        self.last_mouse = Some((col, row));
    }

    /// A release without movement is a click
    pub fn mouse_up(&mut self, col: u16, row: u16) {
        let was_drag = self.dragged;
        self.last_mouse = None;
        self.dragged = false;
        if !was_drag {
            self.click(col, row);
        }
    }

    /// Click at a terminal position
    pub fn click(&mut self, col: u16, row: u16) {
        let Some((col, row)) = self.screen_to_cell(col, row) else {
            return;
        };

        let inner_width = self.inner_width();
        if self
            .locate_control
            .as_ref()
            .is_some_and(|control| control.contains(inner_width, col, row))
        {
            self.request_location();
            return;
        }

        match self.markers.hit_test(&self.viewport, col, row).map(|m| m.feature) {
            Some(feature) => {
                self.selected = self.markers.markers().iter().position(|m| m.feature == feature);
                self.open_popup(feature);
            }
            None => self.close_popup(),
        }
    }

    /// Inner map cell under a terminal position (the map has a 1-cell border)
    fn screen_to_cell(&self, col: u16, row: u16) -> Option<(u16, u16)> {
        let (col, row) = (col.checked_sub(1)?, row.checked_sub(1)?);
        (col < self.inner_width() && row < self.inner_height()).then_some((col, row))
    }

    /// Show the popup for `feature`; false when it has no position
    pub fn open_popup(&mut self, feature: usize) -> bool {
        let Some(favorite) = self.favorites.get(feature) else {
            return false;
        };
        let Some(anchor) = favorite.position else {
            return false;
        };
        let content = PopupContent::new(favorite, anchor, self.platform);
        debug!(feature, title = %content.title, "open popup");

        match &mut self.popup {
            Some(popup) => {
                popup.feature = feature;
                popup.anchor = anchor;
                popup.content = content;
                popup.visible = true;
            }
            None => {
                self.popup = Some(Popup {
                    feature,
                    anchor,
                    content,
                    visible: true,
                })
            }
        }
        true
    }

    pub fn close_popup(&mut self) {
        if let Some(popup) = &mut self.popup {
            popup.visible = false;
        }
    }

    pub fn visible_popup(&self) -> Option<&Popup> {
        self.popup.as_ref().filter(|popup| popup.visible)
    }

    /// Open the next marker's popup, bringing it into view if needed
    pub fn select_next(&mut self) {
        self.select_by(1);
    }

    pub fn select_prev(&mut self) {
        self.select_by(-1);
    }

    fn select_by(&mut self, step: isize) {
        let count = self.markers.len();
        if count == 0 {
            return;
        }
        let next = match self.selected {
            Some(current) => (current as isize + step).rem_euclid(count as isize) as usize,
            None if step < 0 => count - 1,
            None => 0,
        };
        self.selected = Some(next);

        let marker = &self.markers.markers()[next];
        let (feature, position) = (marker.feature, marker.position);
        if marker.cell(&self.viewport).is_none() {
            self.viewport.center_on(position);
        }
        self.open_popup(feature);
    }

    /// Ask the locator for a fix and apply it
    pub fn request_location(&mut self) {
        let result = match self.locator.as_mut() {
            Some(locator) => locator.locate(),
            None => return,
        };
        match result {
            Ok(event) => self.on_location_found(event),
            Err(error) => {
                warn!("{error}");
                self.status = Some(error.to_string());
            }
        }
    }

    /// Update the you-are-here overlay in place and follow it
    pub fn on_location_found(&mut self, event: LocationEvent) {
        self.location.update(event);
        if self.locate_options.set_view {
            self.viewport
                .fit_radius(event.position, event.accuracy_m, self.locate_options.max_zoom);
        }
    }

    pub fn clear_status(&mut self) {
        self.status = None;
    }

    /// Get current zoom level as a string
    pub fn zoom_level(&self) -> String {
        format!("{:.1}x", self.viewport.zoom)
    }

    /// Get current center coordinates as a string
    pub fn center_coords(&self) -> String {
        let LatLng { lat, lng } = self.viewport.center;
        format!(
            "{:.4}°{}, {:.4}°{}",
            lat.abs(),
            if lat >= 0.0 { "N" } else { "S" },
            lng.abs(),
            if lng >= 0.0 { "E" } else { "W" }
        )
    }
}

/// Braille pixels of the map area: the frame takes 2 columns and 2 rows,
/// the status bar one more row
fn map_pixels(width: usize, height: usize) -> (usize, usize) {
    (width.saturating_sub(2) * 2, height.saturating_sub(3) * 4)
}

fn screen_to_pixels(col: u16, row: u16) -> (i32, i32) {
    ((col.saturating_sub(1) as i32) * 2, (row.saturating_sub(1) as i32) * 4)
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use super::*;
    use crate::error::LocateError;
    use crate::favorites::Favorite;
    use crate::locate::FixedLocator;

    const CENTER: LatLng = LatLng::new(52.3676, 4.9041);

    fn app() -> App {
        let config = MapConfig {
            center: CENTER,
            zoom: 2000.0,
            platform: Platform::Other,
        };
        App::new(&config, BaseMap::new(), 82, 43)
    }

    fn favorite(name: &str, position: Option<LatLng>) -> Favorite {
        Favorite {
            position,
            name: Some(name.to_string()),
            rating: Some(4.0),
            ..Favorite::default()
        }
    }

    fn sample() -> FavoriteCollection {
        FavoriteCollection {
            favorites: vec![
                favorite("center", Some(CENTER)),
                favorite("nowhere", None),
                favorite("north", Some(LatLng::new(52.40, 4.9041))),
            ],
        }
    }

    /// Terminal position of a marker (inner cell + border)
    fn screen_pos(app: &App, feature: usize) -> (u16, u16) {
        let marker = app.markers.markers().iter().find(|m| m.feature == feature).unwrap();
        let (col, row) = marker.cell(&app.viewport).unwrap();
        (col + 1, row + 1)
    }

    #[test]
    fn test_set_favorites_skips_unplaceable() {
        let mut app = app();
        assert_eq!(app.set_favorites(sample()), 2);
        assert_eq!(app.inner_width(), 80);
        assert_eq!(app.inner_height(), 40);
    }

    #[test]
    fn test_click_marker_opens_popup() {
        let mut app = app();
        app.set_favorites(sample());

        let (col, row) = screen_pos(&app, 0);
        app.mouse_down(col, row);
        app.mouse_up(col, row);

        let popup = app.visible_popup().unwrap();
        assert_eq!(popup.feature, 0);
        assert_eq!(popup.anchor, CENTER);
        assert_eq!(popup.content.title, "center");
        assert_eq!(popup.content.rating.as_deref(), Some("★ 4/5"));
    }

    #[test]
    fn test_click_elsewhere_closes_popup() {
        let mut app = app();
        app.set_favorites(sample());
        assert!(app.open_popup(0));

        app.click(2, 40);
        assert!(app.visible_popup().is_none());
        // The slot itself survives for reuse
        assert!(app.popup.is_some());
    }

    #[test]
    fn test_drag_is_not_a_click() {
        let mut app = app();
        app.set_favorites(sample());
        let (col, row) = screen_pos(&app, 0);

        app.mouse_down(col, row);
        app.handle_drag(col + 3, row);
        app.mouse_up(col + 3, row);
        assert!(app.visible_popup().is_none());
        assert!(app.viewport.center.lng < CENTER.lng);
    }

    #[test]
    fn test_open_popup_without_position() {
        let mut app = app();
        app.set_favorites(sample());
        assert!(!app.open_popup(1));
        assert!(!app.open_popup(99));
        assert!(app.visible_popup().is_none());
    }

    #[test]
    fn test_popup_slot_is_reused() {
        let mut app = app();
        app.set_favorites(sample());

        app.open_popup(0);
        app.close_popup();
        app.open_popup(2);
        let popup = app.visible_popup().unwrap();
        assert_eq!(popup.feature, 2);
        assert_eq!(popup.content.title, "north");
    }

    #[test]
    fn test_rerender_clears_markers_and_popup() {
        let mut app = app();
        app.set_favorites(sample());
        app.open_popup(0);

        let replacement = FavoriteCollection {
            favorites: vec![favorite("only", Some(LatLng::new(52.0, 5.0)))],
        };
        assert_eq!(app.set_favorites(replacement), 1);
        assert_eq!(app.markers.len(), 1);
        assert!(app.visible_popup().is_none());
    }

    #[test]
    fn test_select_cycles_markers() {
        let mut app = app();
        app.set_favorites(sample());

        app.select_next();
        assert_eq!(app.visible_popup().unwrap().feature, 0);
        app.select_next();
        assert_eq!(app.visible_popup().unwrap().feature, 2);
        app.select_next();
        assert_eq!(app.visible_popup().unwrap().feature, 0);
        app.select_prev();
        assert_eq!(app.visible_popup().unwrap().feature, 2);
    }

    #[test]
    fn test_escape_closes_popup_before_quitting() {
        let mut app = app();
        app.set_favorites(sample());
        app.open_popup(0);

        app.escape();
        assert!(!app.should_quit);
        app.escape();
        assert!(app.should_quit);
    }

    /// Reports a different fix on every call
    struct Walking {
        calls: Rc<Cell<u32>>,
    }

    impl Locator for Walking {
        fn locate(&mut self) -> Result<LocationEvent, LocateError> {
            let n = self.calls.get();
            self.calls.set(n + 1);
            Ok(LocationEvent {
                position: LatLng::new(52.0 + n as f64 * 0.5, 4.9),
                accuracy_m: 100.0,
            })
        }
    }

    #[test]
    fn test_locate_twice_updates_in_place() {
        let mut app = app();
        let calls = Rc::new(Cell::new(0));
        app.enable_locate(Box::new(Walking { calls: Rc::clone(&calls) }), LocateOptions::default());

        app.request_location();
        let icon = Rc::clone(&app.location.marker().unwrap().icon);
        app.request_location();

        assert_eq!(calls.get(), 2);
        let marker = app.location.marker().unwrap();
        assert_eq!(marker.position, LatLng::new(52.5, 4.9));
        assert!(Rc::ptr_eq(&icon, &marker.icon));
        assert_eq!(app.location.circle().unwrap().center, LatLng::new(52.5, 4.9));
        assert_eq!(app.viewport.center, LatLng::new(52.5, 4.9));
    }

    #[test]
    fn test_locate_caps_zoom() {
        let mut app = app();
        let options = LocateOptions {
            set_view: true,
            max_zoom: 5_000.0,
        };
        app.enable_locate(Box::new(FixedLocator::new(CENTER, 1.0)), options);

        app.request_location();
        assert_eq!(app.viewport.zoom, 5_000.0);
    }

    #[test]
    fn test_locate_without_follow_keeps_view() {
        let mut app = app();
        let options = LocateOptions {
            set_view: false,
            ..LocateOptions::default()
        };
        let here = LatLng::new(52.1, 5.1);
        app.enable_locate(Box::new(FixedLocator::new(here, 50.0)), options);

        app.request_location();
        assert_eq!(app.location.marker().unwrap().position, here);
        assert_eq!(app.viewport.center, CENTER);
        assert_eq!(app.viewport.zoom, 2000.0);
    }

    #[test]
    fn test_click_locate_button() {
        let mut app = app();
        let here = LatLng::new(52.1, 5.1);
        app.enable_locate(Box::new(FixedLocator::new(here, 50.0)), LocateOptions::default());

        // Top-right inner cell, plus the border
        app.click(app.inner_width(), 1);
        assert_eq!(app.location.marker().unwrap().position, here);
    }

    #[test]
    fn test_locate_failure_sets_status() {
        struct Denied;
        impl Locator for Denied {
            fn locate(&mut self) -> Result<LocationEvent, LocateError> {
                Err(LocateError::Unavailable("denied".to_string()))
            }
        }

        let mut app = app();
        app.enable_locate(Box::new(Denied), LocateOptions::default());
        app.request_location();

        assert!(app.location.marker().is_none());
        assert_eq!(app.status.as_deref(), Some("location unavailable: denied"));
        assert_eq!(app.viewport.center, CENTER);
    }

    #[test]
    fn test_no_locate_without_control() {
        let mut app = app();
        assert!(app.locate_control().is_none());
        app.click(app.inner_width(), 1);
        assert!(app.location.marker().is_none());
    }
}
