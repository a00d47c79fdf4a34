use std::f64::consts::PI;

use crate::geo::{meters_to_lng_degrees, LatLng};

/// Widest view: the whole world across the canvas
pub const MIN_ZOOM: f64 = 0.5;
/// Street level: a few meters per braille pixel
pub const MAX_ZOOM: f64 = 200_000.0;
/// Web Mercator cut-off latitude
const MAX_LAT: f64 = 85.0511;

/// Viewport representing the visible map area and zoom level
#[derive(Clone, Debug)]
pub struct Viewport {
    pub center: LatLng,
    /// Canvas widths per world width (1.0 = whole world visible)
    pub zoom: f64,
    /// Canvas pixel width
    pub width: usize,
    /// Canvas pixel height
    pub height: usize,
}

/// Normalized Web Mercator coordinates in [0, 1]
#[inline(always)]
fn mercator(position: LatLng) -> (f64, f64) {
    let x = (position.lng + 180.0) / 360.0;
    let lat_rad = position.lat.clamp(-MAX_LAT, MAX_LAT).to_radians();
    let y = (1.0 - (lat_rad.tan() + 1.0 / lat_rad.cos()).ln() / PI) / 2.0;
    (x, y)
}

impl Viewport {
    pub fn new(center: LatLng, zoom: f64, width: usize, height: usize) -> Self {
        Self {
            center,
            zoom: zoom.clamp(MIN_ZOOM, MAX_ZOOM),
            width,
            height,
        }
    }

    /// Pan the viewport by pixel delta
    pub fn pan(&mut self, dx: i32, dy: i32) {
        let (cx, cy) = mercator(self.center);
        let scale = self.scale();
        let (lng, lat) = Self::inverse(cx + dx as f64 / scale, cy + dy as f64 / scale);

        self.center = LatLng::new(lat.clamp(-85.0, 85.0), wrap_lng(lng));
    }

    pub fn center_on(&mut self, position: LatLng) {
        self.center = position;
    }

    pub fn zoom_in(&mut self) {
        self.set_zoom(self.zoom * 1.5);
    }

    pub fn zoom_out(&mut self) {
        self.set_zoom(self.zoom / 1.5);
    }

    pub fn set_zoom(&mut self, zoom: f64) {
        self.zoom = zoom.clamp(MIN_ZOOM, MAX_ZOOM);
    }

    /// Zoom in towards a specific pixel location
    pub fn zoom_in_at(&mut self, px: i32, py: i32) {
        self.zoom_at(px, py, 1.5);
    }

    /// Zoom out from a specific pixel location
    pub fn zoom_out_at(&mut self, px: i32, py: i32) {
        self.zoom_at(px, py, 1.0 / 1.5);
    }

    /// Zoom by factor keeping the point under (px, py) in place
    fn zoom_at(&mut self, px: i32, py: i32, factor: f64) {
        let anchor = self.unproject(px, py);
        self.set_zoom(self.zoom * factor);

        let (new_px, new_py) = self.project(anchor);
        self.pan(new_px - px, new_py - py);
    }

    /// Center on `center` and zoom so a circle of `radius_m` fills about half
    /// of the shorter canvas side, never beyond `max_zoom`
    pub fn fit_radius(&mut self, center: LatLng, radius_m: f64, max_zoom: f64) {
        self.center = center;
        let radius_deg = meters_to_lng_degrees(radius_m.max(1.0), center.lat);
        let target_px = self.width.min(self.height).max(1) as f64 / 4.0;
        let zoom = target_px * 360.0 / (self.width.max(1) as f64 * radius_deg);
        self.set_zoom(zoom.min(max_zoom));
    }

    /// Pixels per unit of normalized Mercator
    #[inline(always)]
    fn scale(&self) -> f64 {
        self.zoom * self.width as f64
    }

    fn inverse(x: f64, y: f64) -> (f64, f64) {
        let lng = x * 360.0 - 180.0;
        let lat = (PI * (1.0 - 2.0 * y)).sinh().atan().to_degrees();
        (lng, lat)
    }

    /// Unproject pixel coordinates back to a geographic position
    pub fn unproject(&self, px: i32, py: i32) -> LatLng {
        let (cx, cy) = mercator(self.center);
        let scale = self.scale();
        let x = (px as f64 - self.width as f64 / 2.0) / scale + cx;
        let y = (py as f64 - self.height as f64 / 2.0) / scale + cy;
        let (lng, lat) = Self::inverse(x, y);
        LatLng::new(lat, lng)
    }

    /// Project a geographic position to pixel coordinates
    pub fn project(&self, position: LatLng) -> (i32, i32) {
        let (x, y) = mercator(position);
        let (cx, cy) = mercator(self.center);
        let scale = self.scale();

        let px = ((x - cx) * scale + self.width as f64 / 2.0).floor();
        let py = ((y - cy) * scale + self.height as f64 / 2.0).floor();

        (saturate(px), saturate(py))
    }

    /// Project a distance in meters at `position` to pixels
    pub fn meters_to_pixels(&self, position: LatLng, meters: f64) -> f64 {
        meters_to_lng_degrees(meters, position.lat) / 360.0 * self.scale()
    }

    /// Check if a projected point is visible in the viewport
    pub fn is_visible(&self, px: i32, py: i32) -> bool {
        px >= 0 && px < self.width as i32 && py >= 0 && py < self.height as i32
    }

    /// Check if a line segment might be visible (rough bounding box check)
    pub fn line_might_be_visible(&self, p1: (i32, i32), p2: (i32, i32)) -> bool {
        let max_x = p1.0.max(p2.0);
        let min_x = p1.0.min(p2.0);
        let max_y = p1.1.max(p2.1);
        let min_y = p1.1.min(p2.1);

        max_x >= 0 && min_x < self.width as i32 && max_y >= 0 && min_y < self.height as i32
    }
}

/// Deep zoom puts far-away points well outside i32
#[inline(always)]
fn saturate(v: f64) -> i32 {
    v.clamp(i32::MIN as f64 / 2.0, i32::MAX as f64 / 2.0) as i32
}

fn wrap_lng(lng: f64) -> f64 {
    (lng + 180.0).rem_euclid(360.0) - 180.0
}
