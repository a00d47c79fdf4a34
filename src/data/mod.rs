use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use geojson::{GeoJson, Geometry, Value};
use tracing::{debug, warn};

use crate::map::{BaseMap, LineString, Lod};

pub const NATURAL_EARTH_ATTRIBUTION: &str = "Made with Natural Earth";
pub const FALLBACK_ATTRIBUTION: &str = "Built-in outline";

/// Base layer files looked up in the data directory, coarse to fine
const COASTLINE_FILES: [(&str, Lod); 3] = [
    ("ne_110m_coastline.json", Lod::Low),
    ("ne_50m_coastline.json", Lod::Medium),
    ("ne_10m_coastline.json", Lod::High),
];

const BORDER_FILES: [(&str, Lod); 2] = [
    ("ne_50m_borders.json", Lod::Medium),
    ("ne_10m_borders.json", Lod::High),
];

/// Build the base map from Natural Earth GeoJSON in `data_dir`, falling back
/// to a coarse built-in outline when nothing usable is found
pub fn load_base_map(data_dir: &Path) -> BaseMap {
    let mut base = BaseMap::new();

    for (filename, lod) in COASTLINE_FILES {
        load_layer(data_dir, filename, |line| base.add_coastline(line, lod));
    }
    for (filename, lod) in BORDER_FILES {
        load_layer(data_dir, filename, |line| base.add_border(line, lod));
    }

    if base.has_data() {
        base.attribution = NATURAL_EARTH_ATTRIBUTION.to_string();
    } else {
        debug!(data_dir = %data_dir.display(), "no base map data, using built-in outline");
        add_fallback_outline(&mut base);
        base.attribution = FALLBACK_ATTRIBUTION.to_string();
    }
    base
}

/// Missing files are fine, broken ones are logged and skipped
fn load_layer(data_dir: &Path, filename: &str, add_line: impl FnMut(LineString)) {
    let path = data_dir.join(filename);
    if !path.exists() {
        return;
    }
    if let Err(error) = read_lines(&path, add_line) {
        warn!("failed to load {filename}: {error:#}");
    }
}

fn read_lines(path: &Path, mut add_line: impl FnMut(LineString)) -> Result<()> {
    let content = fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    let geojson: GeoJson = content.parse().context("invalid GeoJSON")?;
    process_geojson_lines(&geojson, &mut add_line);
    Ok(())
}

/// Extract every line and polygon ring exterior
fn process_geojson_lines<F>(geojson: &GeoJson, add_line: &mut F)
where
    F: FnMut(LineString),
{
    match geojson {
        GeoJson::FeatureCollection(fc) => {
            for geometry in fc.features.iter().filter_map(|f| f.geometry.as_ref()) {
                process_geometry_lines(geometry, add_line);
            }
        }
        GeoJson::Feature(f) => {
            if let Some(geometry) = &f.geometry {
                process_geometry_lines(geometry, add_line);
            }
        }
        GeoJson::Geometry(geometry) => process_geometry_lines(geometry, add_line),
    }
}

fn process_geometry_lines<F>(geometry: &Geometry, add_line: &mut F)
where
    F: FnMut(LineString),
{
    match &geometry.value {
        Value::LineString(coords) => add_line(to_line(coords)),
        Value::MultiLineString(lines) => lines.iter().for_each(|coords| add_line(to_line(coords))),
        Value::Polygon(rings) => {
            if let Some(exterior) = rings.first() {
                add_line(to_line(exterior));
            }
        }
        Value::MultiPolygon(polygons) => {
            for exterior in polygons.iter().filter_map(|rings| rings.first()) {
                add_line(to_line(exterior));
            }
        }
        Value::GeometryCollection(geometries) => {
            for g in geometries {
                process_geometry_lines(g, add_line);
            }
        }
        _ => {}
    }
}

fn to_line(coords: &[Vec<f64>]) -> LineString {
    coords.iter().filter(|c| c.len() >= 2).map(|c| (c[0], c[1])).collect()
}

/// Very rough outline of the North Sea coasts, enough to orient by
fn add_fallback_outline(base: &mut BaseMap) {
    // Low Countries, Germany and Denmark
    base.add_coastline(
        vec![
            (1.6, 50.0), (2.5, 51.1), (3.4, 51.4), (4.0, 51.9), (4.5, 52.4),
            (4.7, 52.9), (5.0, 53.3), (6.0, 53.45), (7.1, 53.55), (8.0, 53.6),
            (8.6, 53.9), (8.9, 54.4), (8.6, 55.0), (8.1, 55.6), (8.2, 56.6),
            (8.6, 57.1), (10.0, 57.6), (10.5, 57.5),
        ],
        Lod::Low,
    );
    // Great Britain, east coast
    base.add_coastline(
        vec![
            (1.4, 51.2), (1.8, 52.5), (1.6, 52.9), (0.3, 53.5), (-0.2, 54.1),
            (-1.2, 54.6), (-1.6, 55.6), (-2.1, 56.2), (-1.8, 57.5), (-3.0, 58.6),
        ],
        Lod::Low,
    );
    // Norway, south coast
    base.add_coastline(
        vec![(5.0, 60.5), (5.3, 59.2), (6.1, 58.2), (7.0, 58.0), (8.2, 58.2), (9.6, 59.0), (10.6, 59.3)],
        Lod::Low,
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_dir_uses_fallback() {
        let base = load_base_map(Path::new("no/such/dir"));
        assert!(base.has_data());
        assert_eq!(base.attribution, FALLBACK_ATTRIBUTION);
    }

    #[test]
    fn test_process_lines() {
        let geojson: GeoJson = r#"{
            "type": "FeatureCollection",
            "features": [
                { "type": "Feature", "properties": {},
                  "geometry": { "type": "MultiLineString", "coordinates": [[[0, 0], [1, 1]], [[2, 2], [3, 3]]] } },
                { "type": "Feature", "properties": {},
                  "geometry": { "type": "Polygon", "coordinates": [[[0, 0], [1, 0], [1, 1], [0, 0]], [[0.2, 0.2], [0.3, 0.3], [0.2, 0.2]]] } },
                { "type": "Feature", "properties": {},
                  "geometry": { "type": "Point", "coordinates": [5, 5] } }
            ]
        }"#
        .parse()
        .unwrap();

        let mut lines = Vec::new();
        process_geojson_lines(&geojson, &mut |line: LineString| lines.push(line));
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[2].len(), 4);
    }
}
