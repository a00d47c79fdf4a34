use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Meters spanned by one degree of latitude (and of longitude at the equator)
pub const METERS_PER_DEGREE: f64 = 111_320.0;

/// A geographic position in degrees
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Both components are finite and inside the WGS84 range
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }
}

impl fmt::Display for LatLng {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.lat, self.lng)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseLatLngError {
    #[error("expected `lat,lng`")]
    Format,

    #[error("`{0}` is not a number")]
    Number(String),

    #[error("coordinates out of range")]
    Range,
}

impl FromStr for LatLng {
    type Err = ParseLatLngError;

    /// Parse the `lat,lng` form used on the command line
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (lat, lng) = s.split_once(',').ok_or(ParseLatLngError::Format)?;
        let parse = |part: &str| {
            let part = part.trim();
            part.parse::<f64>()
                .map_err(|_| ParseLatLngError::Number(part.to_string()))
        };
        let position = Self::new(parse(lat)?, parse(lng)?);
        if position.is_valid() {
            Ok(position)
        } else {
            Err(ParseLatLngError::Range)
        }
    }
}

/// Convert an east-west distance in meters to degrees of longitude at `lat`
#[inline(always)]
pub fn meters_to_lng_degrees(meters: f64, lat: f64) -> f64 {
    let cos_lat = lat.to_radians().cos().max(0.01);
    meters / (METERS_PER_DEGREE * cos_lat)
}
