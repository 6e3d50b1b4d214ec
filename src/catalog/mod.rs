//! Catalog-side data model.
//!
//! The HTTP client against the remote catalog lives outside this crate. What
//! the core consumes from it is modelled here: asset kinds and their wire
//! numbering, gallery listing entries, the nested file manifest returned by
//! `/files/{id}`, and the [`CatalogService`] seam a client implements.

mod endpoint;

pub use endpoint::{CatalogEndpoint, CatalogRequest};

use serde_json::{Map, Value};
use std::collections::BTreeMap;

pub const DEFAULT_BASE_URL: &str = "https://api.polyhaven.com";

/// Which scene role an asset fills.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum AssetKind {
    Environment,
    TextureSet,
    Model,
}

impl AssetKind {
    pub const ALL: [AssetKind; 3] = [Self::Environment, Self::TextureSet, Self::Model];

    /// Gallery `type` field: 0 = hdri, 1 = texture, 2 = model.
    pub fn from_type_num(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Environment),
            1 => Some(Self::TextureSet),
            2 => Some(Self::Model),
            _ => None,
        }
    }

    pub fn type_num(self) -> u8 {
        match self {
            Self::Environment => 0,
            Self::TextureSet => 1,
            Self::Model => 2,
        }
    }

    /// Slug used by the catalog's `type` query parameter.
    pub fn catalog_type(self) -> &'static str {
        match self {
            Self::Environment => "hdris",
            Self::TextureSet => "textures",
            Self::Model => "models",
        }
    }

    pub fn from_catalog_type(slug: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.catalog_type() == slug)
    }
}

/// One downloadable file as listed by the catalog.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct FileInfo {
    pub url: String,
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub md5: String,
}

impl FileInfo {
    /// Lenient read from an arbitrary JSON node. Only `url` is required.
    fn from_value(value: &Value) -> Option<Self> {
        let object = value.as_object()?;
        let url = object.get("url")?.as_str()?.to_string();
        let size = object.get("size").and_then(Value::as_u64).unwrap_or(0);
        let md5 = object
            .get("md5")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        Some(Self { url, size, md5 })
    }
}

/// Nested file listing: category -> resolution tier -> format -> file.
///
/// The manifest is kept as raw JSON because its shape varies per asset kind.
/// Every accessor returns `None` for a missing or mis-shaped path instead of
/// failing the whole lookup.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct FileManifest(Map<String, Value>);

impl FileManifest {
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Object(map) => Self(map),
            other => {
                log::warn!(
                    "file manifest is not a JSON object ({}); treating as empty",
                    kind_of(&other)
                );
                Self::default()
            }
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        let value: Value = serde_json::from_str(json)?;
        Ok(Self::from_value(value))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn has_category(&self, category: &str) -> bool {
        self.0.contains_key(category)
    }

    fn node(&self, category: &str, tier: &str, format: &str) -> Option<&Value> {
        self.0.get(category)?.get(tier)?.get(format)
    }

    /// `manifest[category][tier][format]` as a file entry.
    pub fn file(&self, category: &str, tier: &str, format: &str) -> Option<FileInfo> {
        self.node(category, tier, format).and_then(FileInfo::from_value)
    }

    /// `manifest[category][tier][format].include`, in document order.
    ///
    /// Entries without a string `url` are skipped.
    pub fn includes(&self, category: &str, tier: &str, format: &str) -> Vec<(String, FileInfo)> {
        let Some(include) = self
            .node(category, tier, format)
            .and_then(|node| node.get("include"))
            .and_then(Value::as_object)
        else {
            return Vec::new();
        };
        include
            .iter()
            .filter_map(|(key, value)| {
                let file = FileInfo::from_value(value);
                if file.is_none() {
                    log::warn!("include entry '{}' has no url; skipped", key);
                }
                file.map(|file| (key.clone(), file))
            })
            .collect()
    }

    /// Resolution tiers available under a category.
    pub fn tiers(&self, category: &str) -> Vec<&str> {
        self.0
            .get(category)
            .and_then(Value::as_object)
            .map(|tiers| tiers.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// One gallery entry from `/assets`.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct AssetSummary {
    pub name: String,
    #[serde(default)]
    pub thumbnail_url: String,
    #[serde(rename = "type")]
    pub type_num: u8,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl AssetSummary {
    pub fn kind(&self) -> Option<AssetKind> {
        AssetKind::from_type_num(self.type_num)
    }

    /// Display attributes handed to the descriptor.
    pub fn metadata(&self) -> BTreeMap<String, String> {
        let mut metadata = BTreeMap::new();
        metadata.insert("name".to_string(), self.name.clone());
        if !self.thumbnail_url.is_empty() {
            metadata.insert("thumbnail_url".to_string(), self.thumbnail_url.clone());
        }
        if !self.categories.is_empty() {
            metadata.insert("categories".to_string(), self.categories.join(","));
        }
        if !self.tags.is_empty() {
            metadata.insert("tags".to_string(), self.tags.join(","));
        }
        metadata
    }
}

/// Gallery listing keyed by asset id, as returned by `/assets`.
pub type AssetListing = BTreeMap<String, AssetSummary>;

/// Case-insensitive name search over a listing. An empty query keeps everything.
pub fn search<'a>(listing: &'a AssetListing, query: &str) -> Vec<(&'a str, &'a AssetSummary)> {
    let needle = query.trim().to_lowercase();
    listing
        .iter()
        .filter(|(_, summary)| needle.is_empty() || summary.name.to_lowercase().contains(&needle))
        .map(|(id, summary)| (id.as_str(), summary))
        .collect()
}

/// Immutable identity of one selected catalog entry together with its files.
#[derive(Debug, Clone, PartialEq)]
pub struct AssetDescriptor {
    pub id: String,
    pub kind: AssetKind,
    pub metadata: BTreeMap<String, String>,
    pub files: FileManifest,
}

impl AssetDescriptor {
    pub fn new(id: impl Into<String>, kind: AssetKind, files: FileManifest) -> Self {
        Self {
            id: id.into(),
            kind,
            metadata: BTreeMap::new(),
            files,
        }
    }

    /// Build from a gallery entry once its file listing has been fetched.
    pub fn from_summary(
        id: &str,
        summary: &AssetSummary,
        files: FileManifest,
    ) -> Result<Self, CatalogError> {
        let kind = summary.kind().ok_or(CatalogError::UnknownType {
            id: id.to_string(),
            type_num: summary.type_num,
        })?;
        Ok(Self {
            id: id.to_string(),
            kind,
            metadata: summary.metadata(),
            files,
        })
    }

    pub fn name(&self) -> &str {
        self.metadata.get("name").map(String::as_str).unwrap_or(&self.id)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("catalog request {endpoint} failed: {message}")]
    Request { endpoint: String, message: String },
    #[error("failed to parse catalog response: {0}")]
    Json(#[from] serde_json::Error),
    #[error("asset '{id}' has unknown type {type_num}")]
    UnknownType { id: String, type_num: u8 },
}

/// The catalog client as seen by the core.
pub trait CatalogService {
    /// `/files/{id}`.
    fn get_files(&self, asset_id: &str) -> Result<FileManifest, CatalogError>;

    /// `/assets?type=...`.
    fn get_assets(&self, kind: Option<AssetKind>) -> Result<AssetListing, CatalogError>;

    /// Fetch files for a gallery entry and wrap them in a descriptor.
    fn describe(&self, id: &str, summary: &AssetSummary) -> Result<AssetDescriptor, CatalogError> {
        let files = self.get_files(id)?;
        AssetDescriptor::from_summary(id, summary, files)
    }
}
