use serde::de::DeserializeOwned;
use thiserror::Error;

/// A deserialization failure with the JSON path where it happened.
#[derive(Debug, Error)]
#[error("at JSON path {path} → {message}")]
pub struct PathError {
    pub path: String,
    pub message: String,
}

/// Deserialize with JSON-path context in error messages.
pub fn from_str_with_path<T: DeserializeOwned>(src: &str) -> Result<T, PathError> {
    let mut de = serde_json::Deserializer::from_str(src);
    let value = serde_path_to_error::deserialize::<_, T>(&mut de).map_err(into_path_error)?;
    // reject trailing garbage the same way `serde_json::from_str` does
    de.end().map_err(|err| PathError { path: ".".into(), message: err.to_string() })?;
    Ok(value)
}

pub fn from_slice_with_path<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, PathError> {
    let mut de = serde_json::Deserializer::from_slice(bytes);
    let value = serde_path_to_error::deserialize::<_, T>(&mut de).map_err(into_path_error)?;
    de.end().map_err(|err| PathError { path: ".".into(), message: err.to_string() })?;
    Ok(value)
}

fn into_path_error(err: serde_path_to_error::Error<serde_json::Error>) -> PathError {
    let path = err.path().to_string();
    PathError { path, message: err.into_inner().to_string() }
}
