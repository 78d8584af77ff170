//! Compile JSON Schema documents into a self-contained, typed model.
//!
//! ```no_run
//! use json_model::{compile, Registry};
//! use serde_json::json;
//!
//! let ty = compile(json!({"properties": {"n": {"type": "number"}}}), &Registry::new())?;
//! assert!(ty.as_record().is_some());
//! # Ok::<(), json_model::CompileError>(())
//! ```
pub mod cli;
pub mod codegen;
pub mod compiler;
pub mod emit;
pub mod error;
pub mod ir;
pub mod loader;
pub mod path_de;
pub mod registry;

pub use compiler::{compile, Compiler};
pub use error::{CompileError, LoaderError};
pub use ir::{Constraints, Field, FieldDefault, Leaf, Record, Ty};
pub use loader::{DefaultLoader, Location, SchemaLoader, SchemaSource, StaticLoader};
pub use registry::Registry;
