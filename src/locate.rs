//! "Locate me": location sources, the map button and the you-are-here overlay.

use std::rc::Rc;

use reqwest::blocking::Client;
use serde::Deserialize;
use tracing::{debug, info, instrument};
use url::Url;

use crate::error::LocateError;
use crate::geo::LatLng;
use crate::map::MarkerIcon;

/// City-level accuracy assumed for IP geolocation, in meters
pub const IP_ACCURACY_M: f64 = 25_000.0;

/// One position fix
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LocationEvent {
    pub position: LatLng,
    /// Radius of the 95% confidence circle in meters
    pub accuracy_m: f64,
}

/// Anything that can answer "where am I"
pub trait Locator {
    fn locate(&mut self) -> Result<LocationEvent, LocateError>;
}

/// Always reports the configured position
pub struct FixedLocator {
    event: LocationEvent,
}

impl FixedLocator {
    pub fn new(position: LatLng, accuracy_m: f64) -> Self {
        Self {
            event: LocationEvent {
                position,
                accuracy_m,
            },
        }
    }
}

impl Locator for FixedLocator {
    fn locate(&mut self) -> Result<LocationEvent, LocateError> {
        Ok(self.event)
    }
}

/// Looks the public IP up against an ip-api compatible endpoint
pub struct IpLocator {
    client: Client,
    endpoint: Url,
}

#[derive(Deserialize)]
struct IpLookup {
    status: Option<String>,
    message: Option<String>,
    lat: Option<f64>,
    lon: Option<f64>,
}

impl IpLocator {
    pub fn new(client: Client, endpoint: Url) -> Self {
        Self { client, endpoint }
    }
}

impl Locator for IpLocator {
    #[instrument(skip_all, fields(endpoint = %self.endpoint))]
    fn locate(&mut self) -> Result<LocationEvent, LocateError> {
        let response = self.client.get(self.endpoint.clone()).send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(LocateError::Status(status));
        }

        let lookup: IpLookup = serde_json::from_str(&response.text()?)
            .map_err(|error| LocateError::Unavailable(error.to_string()))?;
        if lookup.status.as_deref().is_some_and(|s| s != "success") {
            return Err(LocateError::Unavailable(
                lookup.message.unwrap_or_else(|| "lookup failed".to_string()),
            ));
        }
        match (lookup.lat, lookup.lon) {
            (Some(lat), Some(lng)) if LatLng::new(lat, lng).is_valid() => {
                debug!(lat, lng, "resolved IP location");
                Ok(LocationEvent {
                    position: LatLng::new(lat, lng),
                    accuracy_m: IP_ACCURACY_M,
                })
            }
            _ => Err(LocateError::Unavailable("no coordinates in response".to_string())),
        }
    }
}

/// How the map reacts to a fix
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LocateOptions {
    /// Recenter on each fix
    pub set_view: bool,
    /// Never zoom in beyond this when recentering
    pub max_zoom: f64,
}

impl Default for LocateOptions {
    fn default() -> Self {
        Self {
            set_view: true,
            max_zoom: 20_000.0,
        }
    }
}

/// The locate button, anchored to the top-right corner of the map
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LocateControl {
    pub label: &'static str,
}

impl LocateControl {
    pub fn new() -> Self {
        Self { label: " ◎ locate " }
    }

    pub fn width(&self) -> u16 {
        self.label.chars().count() as u16
    }

    /// First column of the button inside a map `inner_width` cells wide
    pub fn column(&self, inner_width: u16) -> u16 {
        inner_width.saturating_sub(self.width())
    }

    pub fn contains(&self, inner_width: u16, col: u16, row: u16) -> bool {
        row == 0 && col >= self.column(inner_width) && col < inner_width
    }
}

impl Default for LocateControl {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone, Debug)]
pub struct HereMarker {
    pub position: LatLng,
    pub icon: Rc<MarkerIcon>,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AccuracyCircle {
    pub center: LatLng,
    pub radius_m: f64,
}

/// The you-are-here marker and its accuracy circle
#[derive(Default)]
pub struct LocationOverlay {
    icon: Option<Rc<MarkerIcon>>,
    marker: Option<HereMarker>,
    circle: Option<AccuracyCircle>,
}

impl LocationOverlay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Move the marker and circle to `event`, creating them on the first fix
    pub fn update(&mut self, event: LocationEvent) {
        match &mut self.marker {
            Some(marker) => marker.position = event.position,
            None => {
                let icon = Rc::clone(self.icon.get_or_insert_with(|| Rc::new(MarkerIcon::here())));
                self.marker = Some(HereMarker {
                    position: event.position,
                    icon,
                });
            }
        }

        match &mut self.circle {
            Some(circle) => {
                circle.center = event.position;
                circle.radius_m = event.accuracy_m;
            }
            None => {
                self.circle = Some(AccuracyCircle {
                    center: event.position,
                    radius_m: event.accuracy_m,
                })
            }
        }

        info!(
            lat = event.position.lat,
            lng = event.position.lng,
            accuracy_m = event.accuracy_m,
            "location found"
        );
    }

    pub fn marker(&self) -> Option<&HereMarker> {
        self.marker.as_ref()
    }

    pub fn circle(&self) -> Option<&AccuracyCircle> {
        self.circle.as_ref()
    }
}
