mod geometry;
mod markers;
mod projection;
mod renderer;

pub use geometry::{draw_line, draw_ring};
pub use markers::{cell, Marker, MarkerIcon, MarkerLayer};
pub use projection::{Viewport, MAX_ZOOM, MIN_ZOOM};
pub use renderer::{BaseLayers, BaseMap, LineString, Lod};
