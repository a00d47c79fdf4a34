//! Links into the platform's native maps application.

use url::form_urlencoded;

use crate::geo::LatLng;

/// Which maps application a link should open
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Platform {
    Android,
    Apple,
    Other,
}

impl Platform {
    pub fn from_user_agent(user_agent: &str) -> Self {
        const APPLE_MARKERS: [&str; 5] = ["iphone", "ipad", "ipod", "macintosh", "mac os x"];

        let user_agent = user_agent.to_ascii_lowercase();
        if user_agent.contains("android") {
            Self::Android
        } else if APPLE_MARKERS.iter().any(|marker| user_agent.contains(marker)) {
            Self::Apple
        } else {
            Self::Other
        }
    }
}

/// Browser-style user agent describing the host we run on
pub fn client_user_agent() -> String {
    let system = match std::env::consts::OS {
        "android" => "Linux; Android",
        "ios" => "iPhone; CPU iPhone OS like Mac OS X",
        "macos" => "Macintosh; Intel Mac OS X",
        "windows" => "Windows NT 10.0",
        _ => "X11; Linux",
    };
    format!("Mozilla/5.0 ({system}) favmap/{}", env!("CARGO_PKG_VERSION"))
}

/// Deep link that opens `position` labelled `label`
pub fn maps_link(platform: Platform, position: LatLng, label: &str) -> String {
    let LatLng { lat, lng } = position;
    let label: String = form_urlencoded::byte_serialize(label.as_bytes()).collect();
    match platform {
        Platform::Android => format!("geo:{lat},{lng}?q={lat},{lng}({label})"),
        Platform::Apple => format!("https://maps.apple.com/?ll={lat},{lng}&q={label}"),
        Platform::Other => format!("https://www.google.com/maps/search/?api=1&query={lat},{lng}"),
    }
}
