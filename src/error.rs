use std::path::PathBuf;
use thiserror::Error;

use crate::path_de::PathError;

/// Failure to turn a schema source into a raw JSON value.
#[derive(Debug, Error)]
pub enum LoaderError {
    #[error("failed to read schema file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to fetch schema from {url}: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("fetching schema from {url} returned HTTP {status}")]
    Status { url: String, status: u16 },
    #[error("invalid JSON in {location}: {source}")]
    Parse {
        location: String,
        #[source]
        source: PathError,
    },
}

/// Every way a compile call can fail. No partial result is ever returned.
///
/// `at` is `<document>#<json pointer>` for the node that failed; the document
/// part is empty for inline schemas.
#[derive(Debug, Error)]
pub enum CompileError {
    #[error("unresolved reference `{reference}` at {at}")]
    UnresolvedReference { reference: String, at: String },
    #[error("cyclic reference `{reference}` at {at}")]
    CyclicReference { reference: String, at: String },
    #[error("unsupported schema at {at}: {reason}")]
    UnsupportedSchema { at: String, reason: String },
    #[error("unsupported type/format pair ({ty}, {format}) at {at}")]
    UnsupportedFormat { ty: String, format: String, at: String },
    #[error("`{keyword}` is not implemented (at {at})")]
    NotImplemented { keyword: &'static str, at: String },
    #[error("missing field `{field}` at {at}")]
    MissingField { field: &'static str, at: String },
    #[error("conflicting field `{field}` in allOf at {at}: {reason}")]
    FieldConflict { field: String, at: String, reason: String },
    #[error(transparent)]
    Loader(#[from] LoaderError),
}

pub type Result<T, E = CompileError> = std::result::Result<T, E>;
