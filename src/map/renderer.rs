use crate::braille::BrailleCanvas;
use crate::geo::LatLng;
use crate::map::geometry::draw_line;
use crate::map::projection::Viewport;

/// A geographic line (sequence of lon/lat coordinates)
pub type LineString = Vec<(f64, f64)>;

/// Level of detail for base map data
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Lod {
    Low,    // 110m - world view
    Medium, // 50m - continental
    High,   // 10m - regional and closer
}

impl Lod {
    /// Select LOD based on zoom level
    pub fn from_zoom(zoom: f64) -> Self {
        if zoom < 2.0 {
            Lod::Low
        } else if zoom < 8.0 {
            Lod::Medium
        } else {
            Lod::High
        }
    }
}

/// Base layers drawn for one frame
pub struct BaseLayers {
    pub coastlines: BrailleCanvas,
    pub borders: BrailleCanvas,
}

/// The base map: multi-resolution coastlines and country borders
pub struct BaseMap {
    coastlines_low: Vec<LineString>,
    coastlines_medium: Vec<LineString>,
    coastlines_high: Vec<LineString>,
    borders_medium: Vec<LineString>,
    borders_high: Vec<LineString>,
    /// Credit line for the loaded data
    pub attribution: String,
    pub show_borders: bool,
}

impl BaseMap {
    pub fn new() -> Self {
        Self {
            coastlines_low: Vec::new(),
            coastlines_medium: Vec::new(),
            coastlines_high: Vec::new(),
            borders_medium: Vec::new(),
            borders_high: Vec::new(),
            attribution: String::new(),
            show_borders: true,
        }
    }

    /// Best available coastlines at or below `lod`
    fn coastlines(&self, lod: Lod) -> &[LineString] {
        let candidates = match lod {
            Lod::High => [&self.coastlines_high, &self.coastlines_medium, &self.coastlines_low],
            Lod::Medium => [&self.coastlines_medium, &self.coastlines_low, &self.coastlines_low],
            Lod::Low => [&self.coastlines_low; 3],
        };
        candidates
            .into_iter()
            .find(|lines| !lines.is_empty())
            .map(|lines| lines.as_slice())
            .unwrap_or_default()
    }

    fn borders(&self, lod: Lod) -> &[LineString] {
        if lod == Lod::High && !self.borders_high.is_empty() {
            &self.borders_high
        } else {
            &self.borders_medium
        }
    }

    /// Render every base layer for a `width` x `height` character area
    pub fn render(&self, width: usize, height: usize, viewport: &Viewport) -> BaseLayers {
        let lod = Lod::from_zoom(viewport.zoom);

        let mut coastlines = BrailleCanvas::new(width, height);
        for line in self.coastlines(lod) {
            draw_linestring(&mut coastlines, line, viewport);
        }

        let mut borders = BrailleCanvas::new(width, height);
        if self.show_borders {
            for line in self.borders(lod) {
                draw_linestring(&mut borders, line, viewport);
            }
        }

        BaseLayers { coastlines, borders }
    }

    pub fn add_coastline(&mut self, line: LineString, lod: Lod) {
        match lod {
            Lod::Low => self.coastlines_low.push(line),
            Lod::Medium => self.coastlines_medium.push(line),
            Lod::High => self.coastlines_high.push(line),
        }
    }

    pub fn add_border(&mut self, line: LineString, lod: Lod) {
        match lod {
            Lod::High => self.borders_high.push(line),
            Lod::Low | Lod::Medium => self.borders_medium.push(line),
        }
    }

    /// Check if any coastline data is loaded
    pub fn has_data(&self) -> bool {
        !self.coastlines_low.is_empty()
            || !self.coastlines_medium.is_empty()
            || !self.coastlines_high.is_empty()
    }

    pub fn toggle_borders(&mut self) {
        self.show_borders = !self.show_borders;
    }
}

impl Default for BaseMap {
    fn default() -> Self {
        Self::new()
    }
}

/// Draw a linestring, skipping segments that cannot touch the viewport
fn draw_linestring(canvas: &mut BrailleCanvas, line: &LineString, viewport: &Viewport) {
    let mut prev: Option<(i32, i32)> = None;

    for &(lon, lat) in line {
        let point = viewport.project(LatLng::new(lat, lon));

        if let Some(prev) = prev {
            // Antimeridian jumps span the whole canvas
            let wraps = (point.0 - prev.0).unsigned_abs() as usize > viewport.width.max(1) * 4 / 5
                && viewport.zoom < 2.0;
            if !wraps && viewport.line_might_be_visible(prev, point) {
                if let Some((a, b)) = clip_segment(prev, point, viewport) {
                    draw_line(canvas, a.0, a.1, b.0, b.1);
                }
            }
        }

        prev = Some(point);
    }
}

/// Liang-Barsky clip against the canvas plus a small margin, so Bresenham
/// never walks millions of off-screen pixels at deep zoom
fn clip_segment(a: (i32, i32), b: (i32, i32), viewport: &Viewport) -> Option<((i32, i32), (i32, i32))> {
    const MARGIN: f64 = 2.0;
    let (x_min, y_min) = (-MARGIN, -MARGIN);
    let x_max = viewport.width as f64 + MARGIN;
    let y_max = viewport.height as f64 + MARGIN;

    let (x0, y0) = (a.0 as f64, a.1 as f64);
    let (dx, dy) = (b.0 as f64 - x0, b.1 as f64 - y0);
    let (mut t0, mut t1) = (0.0_f64, 1.0_f64);

    for (p, q) in [(-dx, x0 - x_min), (dx, x_max - x0), (-dy, y0 - y_min), (dy, y_max - y0)] {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
            continue;
        }
        let r = q / p;
        if p < 0.0 {
            if r > t1 {
                return None;
            }
            t0 = t0.max(r);
        } else {
            if r < t0 {
                return None;
            }
            t1 = t1.min(r);
        }
    }

    let at = |t: f64| ((x0 + t * dx).round() as i32, (y0 + t * dy).round() as i32);
    Some((at(t0), at(t1)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lod_from_zoom() {
        assert_eq!(Lod::from_zoom(1.0), Lod::Low);
        assert_eq!(Lod::from_zoom(4.0), Lod::Medium);
        assert_eq!(Lod::from_zoom(2000.0), Lod::High);
    }

    #[test]
    fn test_coastlines_fall_back_to_lower_lod() {
        let mut base = BaseMap::new();
        base.add_coastline(vec![(0.0, 0.0), (1.0, 1.0)], Lod::Low);
        assert_eq!(base.coastlines(Lod::High).len(), 1);
        assert!(base.has_data());
    }

    #[test]
    fn test_render_draws_visible_line() {
        let mut base = BaseMap::new();
        base.add_coastline(vec![(-10.0, 0.0), (10.0, 0.0)], Lod::Low);
        let viewport = Viewport::new(LatLng::new(0.0, 0.0), 1.0, 40, 40);

        let layers = base.render(20, 10, &viewport);
        assert!(!layers.coastlines.is_empty());
        assert!(layers.borders.is_empty());
    }

    #[test]
    fn test_deep_zoom_segment_is_clipped() {
        let mut base = BaseMap::new();
        base.add_coastline(vec![(-30.0, 52.37), (30.0, 52.37)], Lod::High);
        let viewport = Viewport::new(LatLng::new(52.37, 4.9), 100_000.0, 80, 40);

        let layers = base.render(40, 10, &viewport);
        assert!(!layers.coastlines.is_empty());
    }
}
