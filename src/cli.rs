use std::path::PathBuf;

use clap::{Parser, Subcommand};
use url::Url;

use crate::favorites::Source;
use crate::geo::LatLng;

#[derive(Parser)]
#[command(author, version, about, long_about = None, propagate_version = true)]
pub struct Cli {
    /// Feature collection to show: an `http(s)` URL or a local file.
    #[clap(long, env = "FAVMAP_SOURCE", default_value = "data/favorites.geojson")]
    pub source: Source,

    /// Initial map center as `lat,lng`.
    #[clap(long, env = "FAVMAP_CENTER", default_value = "52.3676,4.9041", allow_hyphen_values = true)]
    pub center: LatLng,

    /// Initial zoom, in canvas widths per world width.
    #[clap(long, env = "FAVMAP_ZOOM", default_value = "2000")]
    pub zoom: f64,

    /// Directory with the Natural Earth base layers.
    #[clap(long, env = "FAVMAP_DATA_DIR", default_value = "data")]
    pub data_dir: PathBuf,

    /// Client identification used to pick the maps deep link flavor.
    #[clap(long, env = "FAVMAP_USER_AGENT")]
    pub user_agent: Option<String>,

    /// Hide the locate button.
    #[clap(long)]
    pub no_locate: bool,

    /// Fixed position reported by the locate button, as `lat,lng`.
    #[clap(long, env = "FAVMAP_HERE", allow_hyphen_values = true)]
    pub here: Option<LatLng>,

    /// Accuracy of `--here` in meters.
    #[clap(long, default_value = "50")]
    pub here_accuracy: f64,

    /// IP geolocation endpoint used when `--here` is absent.
    #[clap(long, env = "FAVMAP_GEOIP_URL", default_value = "http://ip-api.com/json")]
    pub geoip_url: Url,

    /// Keep the view where it is when a location fix arrives.
    #[clap(long)]
    pub no_follow: bool,

    /// Never zoom in beyond this when following a location fix.
    #[clap(long, default_value = "20000")]
    pub locate_max_zoom: f64,

    /// Write logs here while the map is open.
    #[clap(long, env = "FAVMAP_LOG_FILE")]
    pub log_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Print the popup HTML of one favorite.
    Popup {
        /// Feature index in the collection.
        index: usize,
    },
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["favmap"]).unwrap();
        assert_eq!(cli.source, Source::Local(PathBuf::from("data/favorites.geojson")));
        assert_eq!(cli.center, LatLng::new(52.3676, 4.9041));
        assert_eq!(cli.here_accuracy, 50.0);
        assert!(cli.here.is_none());
        assert!(!cli.no_follow);
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_negative_coordinates_and_subcommand() {
        let cli = Cli::try_parse_from([
            "favmap",
            "--here",
            "-33.8688,151.2093",
            "--no-follow",
            "--source",
            "https://example.com/favorites.geojson",
            "popup",
            "3",
        ])
        .unwrap();
        assert_eq!(cli.here, Some(LatLng::new(-33.8688, 151.2093)));
        assert!(cli.no_follow);
        assert!(matches!(cli.source, Source::Remote(_)));
        assert!(matches!(cli.command, Some(Command::Popup { index: 3 })));
    }
}
