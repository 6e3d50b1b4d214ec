//! Havenkit - core of a browser for a remote 3D asset library.
//!
//! Resolves catalog file manifests into loadable URLs, remaps the relative
//! references inside glTF packages, tracks per-asset load progress, composes
//! PBR texture sets onto scene surfaces and runs pointer hover/selection.
//! Fetching, decoding and drawing belong to the host application.

pub mod app;
pub mod assets;
pub mod catalog;
pub mod config;
pub mod progress;
pub mod render;
pub mod scene;
pub mod texture;

pub use app::{PointerSample, Session, SessionError, Viewport};
pub use assets::{resolve, LoadManager, LoadSpec, UrlRemapper};
pub use catalog::{AssetDescriptor, AssetKind, FileManifest};
pub use config::KitConfig;
pub use progress::{LoadToken, ProgressTracker, SharedProgress};
