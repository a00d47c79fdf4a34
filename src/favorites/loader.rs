use std::convert::Infallible;
use std::fmt;
use std::fs;
use std::path::PathBuf;
use std::str::FromStr;

use reqwest::blocking::Client;
use reqwest::header;
use tracing::{info, instrument};
use url::Url;

use super::FavoriteCollection;
use crate::error::LoadError;

/// Where the feature collection comes from
#[derive(Clone, Debug, PartialEq)]
pub enum Source {
    Remote(Url),
    Local(PathBuf),
}

impl FromStr for Source {
    type Err = Infallible;

    /// `http(s)://` URLs are fetched, anything else is a file path
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match Url::parse(s) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => Ok(Self::Remote(url)),
            _ => Ok(Self::Local(PathBuf::from(s))),
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Remote(url) => write!(f, "{url}"),
            Self::Local(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Load the whole collection in one request. No retry.
#[instrument(skip_all, fields(source = %source))]
pub fn load(client: &Client, source: &Source) -> Result<FavoriteCollection, LoadError> {
    let body = match source {
        Source::Remote(url) => fetch(client, url)?,
        Source::Local(path) => fs::read_to_string(path).map_err(|source| LoadError::Io {
            path: path.clone(),
            source,
        })?,
    };
    let collection: FavoriteCollection = body.parse()?;
    info!(features = collection.len(), "loaded favorites");
    Ok(collection)
}

fn fetch(client: &Client, url: &Url) -> Result<String, LoadError> {
    let http_error = |source| LoadError::Http {
        url: url.to_string(),
        source,
    };
    let response = client
        .get(url.clone())
        .header(header::CACHE_CONTROL, "no-cache")
        .header(header::PRAGMA, "no-cache")
        .send()
        .map_err(http_error)?;

    let status = response.status();
    if !status.is_success() {
        return Err(LoadError::Status {
            url: url.to_string(),
            status,
        });
    }
    response.text().map_err(http_error)
}

#[cfg(test)]
mod tests {
    use std::io::{BufRead, BufReader, Write};
    use std::net::TcpListener;
    use std::sync::mpsc;
    use std::thread;

    use super::*;
    use crate::client::build_client;
    use crate::favorites::tests::SAMPLE;

    /// Serve a single canned response and hand back the request head
    fn serve_once(status_line: &'static str, body: &'static str) -> (Url, mpsc::Receiver<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let url = Url::parse(&format!("http://{}/favorites.geojson", listener.local_addr().unwrap())).unwrap();
        let (tx, rx) = mpsc::channel();

        thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            let mut reader = BufReader::new(stream.try_clone().unwrap());
            let mut head = String::new();
            loop {
                let mut line = String::new();
                if reader.read_line(&mut line).unwrap() == 0 || line == "\r\n" {
                    break;
                }
                head.push_str(&line);
            }
            let mut stream = stream;
            write!(
                stream,
                "{status_line}\r\nContent-Type: application/geo+json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            )
            .unwrap();
            let _ = tx.send(head);
        });

        (url, rx)
    }

    #[test]
    fn test_source_from_str() {
        assert!(matches!(
            "https://example.com/f.geojson".parse::<Source>(),
            Ok(Source::Remote(_))
        ));
        assert_eq!(
            "data/favorites.geojson".parse::<Source>().unwrap(),
            Source::Local(PathBuf::from("data/favorites.geojson"))
        );
        // Windows drive letters parse as a URL scheme
        assert!(matches!("C:/favorites.geojson".parse::<Source>(), Ok(Source::Local(_))));
    }

    #[test]
    fn test_load_remote() {
        let (url, rx) = serve_once("HTTP/1.1 200 OK", SAMPLE);
        let client = build_client().unwrap();

        let collection = load(&client, &Source::Remote(url)).unwrap();
        assert_eq!(collection, SAMPLE.parse::<FavoriteCollection>().unwrap());

        let head = rx.recv().unwrap().to_ascii_lowercase();
        assert!(head.starts_with("get /favorites.geojson"));
        assert!(head.contains("cache-control: no-cache"));
    }

    #[test]
    fn test_load_remote_error_status() {
        let (url, _rx) = serve_once("HTTP/1.1 503 Service Unavailable", "");
        let client = build_client().unwrap();

        match load(&client, &Source::Remote(url)) {
            Err(LoadError::Status { status, .. }) => assert_eq!(status.as_u16(), 503),
            other => panic!("expected a status error, got {other:?}"),
        }
    }

    #[test]
    fn test_load_local() {
        let client = build_client().unwrap();
        let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("data/favorites.geojson");
        let collection = load(&client, &Source::Local(path)).unwrap();
        assert_eq!(collection, SAMPLE.parse::<FavoriteCollection>().unwrap());

        let missing = Source::Local(PathBuf::from("does/not/exist.geojson"));
        assert!(matches!(load(&client, &missing), Err(LoadError::Io { .. })));
    }
}
