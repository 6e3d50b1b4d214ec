//! Asset resolution and per-load plumbing: manifest lookup, include-based
//! URL remapping and the load handle passed to the external loader.

mod locator;
mod manager;
mod remap;

pub use locator::{
    resolve, resolve_descriptor, LoadSpec, ResolveError, ENVIRONMENT_CATEGORY, ENVIRONMENT_FORMAT,
    MODEL_CATEGORY, MODEL_FORMAT, TEXTURE_FORMAT,
};
pub use manager::LoadManager;
pub use remap::{AuxiliaryManifest, IncludeEntry, RemapDiagnostic, RemapOutcome, UrlRemapper};
