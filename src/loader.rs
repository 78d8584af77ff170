//! Schema loader: turns a source reference into a raw JSON value.
//!
//! No recursion and no type logic lives here. A string is a URL when its raw
//! text has a scheme followed by `//` and a non-empty authority; every other
//! string is a local file path. There is no scheme allow-list.
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use indexmap::IndexMap;
use once_cell::sync::OnceCell;
use serde_json::Value;
use tracing::info;
use url::Url;

use crate::error::LoaderError;
use crate::path_de;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

// ------------------------------- Sources --------------------------------- //

/// What a top-level compile call starts from.
#[derive(Debug, Clone)]
pub enum SchemaSource {
    Inline(Value),
    Location(Location),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Location {
    Url(Url),
    Path(PathBuf),
}

impl Location {
    pub fn parse(href: &str) -> Self {
        if !has_authority(href) {
            return Location::Path(PathBuf::from(href));
        }
        match Url::parse(href) {
            Ok(url) if url.host_str().is_some_and(|host| !host.is_empty()) => Location::Url(url),
            _ => Location::Path(PathBuf::from(href)),
        }
    }

    /// Resolve `reference` relative to the document at `base`.
    pub fn resolve(reference: &str, base: Option<&Location>) -> Self {
        let direct = Location::parse(reference);
        if matches!(direct, Location::Url(_)) {
            return direct;
        }
        match base {
            Some(Location::Url(base)) => match base.join(reference) {
                Ok(url) => Location::Url(url),
                Err(_) => direct,
            },
            Some(Location::Path(base)) => {
                let path = Path::new(reference);
                if path.is_absolute() {
                    return direct;
                }
                match base.parent() {
                    Some(dir) => Location::Path(dir.join(path)),
                    None => direct,
                }
            }
            None => direct,
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Location::Url(url) => write!(f, "{url}"),
            Location::Path(path) => write!(f, "{}", path.display()),
        }
    }
}

/// `<scheme>://<authority>` with a non-empty authority, checked on the text
/// itself. `Url::parse` would invent a host for `http:example.com`.
fn has_authority(href: &str) -> bool {
    let Some((scheme, rest)) = href.split_once("://") else {
        return false;
    };
    let scheme_ok = scheme.starts_with(|c: char| c.is_ascii_alphabetic())
        && scheme.chars().all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));
    let authority = rest.split(['/', '?', '#']).next().unwrap_or_default();
    scheme_ok && !authority.is_empty()
}

impl From<Value> for SchemaSource {
    fn from(value: Value) -> Self {
        SchemaSource::Inline(value)
    }
}

impl From<&str> for SchemaSource {
    fn from(href: &str) -> Self {
        SchemaSource::Location(Location::parse(href))
    }
}

impl From<String> for SchemaSource {
    fn from(href: String) -> Self {
        SchemaSource::from(href.as_str())
    }
}

impl From<PathBuf> for SchemaSource {
    fn from(path: PathBuf) -> Self {
        SchemaSource::Location(Location::Path(path))
    }
}

impl From<&Path> for SchemaSource {
    fn from(path: &Path) -> Self {
        SchemaSource::Location(Location::Path(path.to_path_buf()))
    }
}

impl From<Location> for SchemaSource {
    fn from(location: Location) -> Self {
        SchemaSource::Location(location)
    }
}

// ------------------------------- Loaders --------------------------------- //

/// The seam between the compiler and the outside world.
pub trait SchemaLoader {
    fn load(&self, location: &Location) -> Result<Value, LoaderError>;
}

impl<L: SchemaLoader + ?Sized> SchemaLoader for &L {
    fn load(&self, location: &Location) -> Result<Value, LoaderError> {
        (**self).load(location)
    }
}

/// Reads local files and fetches URLs over blocking HTTP.
#[derive(Debug)]
pub struct DefaultLoader {
    timeout: Duration,
    client: OnceCell<reqwest::blocking::Client>,
}

impl Default for DefaultLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl DefaultLoader {
    pub fn new() -> Self {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    /// Only network fetches are bounded; file reads are not.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self { timeout, client: OnceCell::new() }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn fetch(&self, url: &Url) -> Result<Value, LoaderError> {
        let http_error = |source| LoaderError::Http { url: url.to_string(), source };
        let client = self
            .client
            .get_or_try_init(|| reqwest::blocking::Client::builder().timeout(self.timeout).build())
            .map_err(http_error)?;
        let response = client.get(url.clone()).send().map_err(http_error)?;
        let status = response.status();
        if !status.is_success() {
            return Err(LoaderError::Status { url: url.to_string(), status: status.as_u16() });
        }
        let body = response.text().map_err(http_error)?;
        path_de::from_str_with_path(&body)
            .map_err(|source| LoaderError::Parse { location: url.to_string(), source })
    }

    fn read(&self, path: &Path) -> Result<Value, LoaderError> {
        let bytes = std::fs::read(path)
            .map_err(|source| LoaderError::Io { path: path.to_path_buf(), source })?;
        path_de::from_slice_with_path(&bytes)
            .map_err(|source| LoaderError::Parse { location: path.display().to_string(), source })
    }
}

impl SchemaLoader for DefaultLoader {
    fn load(&self, location: &Location) -> Result<Value, LoaderError> {
        info!(%location, "loading schema document");
        match location {
            Location::Url(url) => self.fetch(url),
            Location::Path(path) => self.read(path),
        }
    }
}

/// Serves pre-loaded documents keyed by location; useful for offline bundles.
#[derive(Debug, Clone, Default)]
pub struct StaticLoader {
    documents: IndexMap<String, Value>,
}

impl StaticLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, location: &str, document: Value) -> Self {
        self.insert(location, document);
        self
    }

    pub fn insert(&mut self, location: &str, document: Value) {
        self.documents.insert(Location::parse(location).to_string(), document);
    }
}

impl SchemaLoader for StaticLoader {
    fn load(&self, location: &Location) -> Result<Value, LoaderError> {
        let key = location.to_string();
        self.documents.get(&key).cloned().ok_or_else(|| LoaderError::Io {
            path: PathBuf::from(key),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "no such bundled document"),
        })
    }
}
