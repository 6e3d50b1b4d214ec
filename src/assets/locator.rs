//! Descriptor -> concrete resource set.
//!
//! Pure lookups over the file manifest, one typed accessor per asset kind.

use super::remap::AuxiliaryManifest;
use crate::catalog::{AssetDescriptor, AssetKind, FileManifest};
use crate::texture::TextureMap;

pub const ENVIRONMENT_CATEGORY: &str = "hdri";
pub const ENVIRONMENT_FORMAT: &str = "hdr";
pub const MODEL_CATEGORY: &str = "gltf";
pub const MODEL_FORMAT: &str = "gltf";
pub const TEXTURE_FORMAT: &str = "png";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolveError {
    #[error("no {kind:?} resource at {category}/{tier}/{format}")]
    ResourceNotFound {
        kind: AssetKind,
        category: String,
        tier: String,
        format: String,
    },
}

/// Everything a loader needs for one asset at one tier.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct LoadSpec {
    pub kind: AssetKind,
    pub tier: String,
    pub primary_url: Option<String>,
    pub auxiliary: AuxiliaryManifest,
    /// Texture sets only: resolved map urls in [`TextureMap::ALL`] order.
    pub texture_maps: Vec<(TextureMap, String)>,
}

impl LoadSpec {
    fn empty(kind: AssetKind, tier: &str) -> Self {
        Self {
            kind,
            tier: tier.to_string(),
            primary_url: None,
            auxiliary: AuxiliaryManifest::new(),
            texture_maps: Vec::new(),
        }
    }

    pub fn texture_url(&self, map: TextureMap) -> Option<&str> {
        self.texture_maps
            .iter()
            .find(|(candidate, _)| *candidate == map)
            .map(|(_, url)| url.as_str())
    }

    /// Every url the loader will fetch up front.
    pub fn urls(&self) -> Vec<&str> {
        match self.kind {
            AssetKind::TextureSet => self
                .texture_maps
                .iter()
                .map(|(_, url)| url.as_str())
                .collect(),
            _ => self.primary_url.iter().map(String::as_str).collect(),
        }
    }

    /// Whether anything at this tier can be rendered.
    ///
    /// Fails with `ResourceNotFound`; retrying another tier is the caller's
    /// decision.
    pub fn require_renderable(&self) -> Result<(), ResolveError> {
        let renderable = match self.kind {
            AssetKind::TextureSet => !self.texture_maps.is_empty(),
            _ => self.primary_url.is_some(),
        };
        if renderable {
            return Ok(());
        }
        let (category, format) = match self.kind {
            AssetKind::Environment => (ENVIRONMENT_CATEGORY, ENVIRONMENT_FORMAT),
            AssetKind::Model => (MODEL_CATEGORY, MODEL_FORMAT),
            AssetKind::TextureSet => ("*", TEXTURE_FORMAT),
        };
        Err(ResolveError::ResourceNotFound {
            kind: self.kind,
            category: category.to_string(),
            tier: self.tier.clone(),
            format: format.to_string(),
        })
    }
}

pub fn resolve(manifest: &FileManifest, kind: AssetKind, tier: &str) -> LoadSpec {
    match kind {
        AssetKind::Environment => resolve_environment(manifest, tier),
        AssetKind::Model => resolve_model(manifest, tier),
        AssetKind::TextureSet => resolve_texture_set(manifest, tier),
    }
}

pub fn resolve_descriptor(descriptor: &AssetDescriptor, tier: &str) -> LoadSpec {
    resolve(&descriptor.files, descriptor.kind, tier)
}

fn resolve_environment(manifest: &FileManifest, tier: &str) -> LoadSpec {
    let mut spec = LoadSpec::empty(AssetKind::Environment, tier);
    spec.primary_url = manifest
        .file(ENVIRONMENT_CATEGORY, tier, ENVIRONMENT_FORMAT)
        .map(|file| file.url);
    spec
}

fn resolve_model(manifest: &FileManifest, tier: &str) -> LoadSpec {
    let mut spec = LoadSpec::empty(AssetKind::Model, tier);
    spec.primary_url = manifest
        .file(MODEL_CATEGORY, tier, MODEL_FORMAT)
        .map(|file| file.url);
    spec.auxiliary =
        AuxiliaryManifest::from_includes(manifest.includes(MODEL_CATEGORY, tier, MODEL_FORMAT));
    spec
}

fn resolve_texture_set(manifest: &FileManifest, tier: &str) -> LoadSpec {
    let mut spec = LoadSpec::empty(AssetKind::TextureSet, tier);
    spec.texture_maps = TextureMap::ALL
        .into_iter()
        .filter_map(|map| {
            map.manifest_keys()
                .iter()
                .find_map(|key| manifest.file(key, tier, TEXTURE_FORMAT))
                .map(|file| (map, file.url))
        })
        .collect();
    spec.primary_url = spec.texture_url(TextureMap::Diffuse).map(str::to_string);
    spec
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn manifest(value: serde_json::Value) -> FileManifest {
        FileManifest::from_value(value)
    }

    #[test]
    fn environment_resolves_hdr_url() {
        let files = manifest(json!({
            "hdri": {
                "1k": { "hdr": { "url": "sky_1k.hdr", "size": 1, "md5": "a" } },
                "4k": { "exr": { "url": "sky_4k.exr", "size": 1, "md5": "b" } }
            }
        }));
        let spec = resolve(&files, AssetKind::Environment, "1k");
        assert_eq!(spec.primary_url.as_deref(), Some("sky_1k.hdr"));
        assert!(spec.require_renderable().is_ok());
        assert!(spec.auxiliary.is_empty());
    }

    #[test]
    fn missing_tier_is_absent_without_fallback() {
        let files = manifest(json!({
            "hdri": { "4k": { "exr": { "url": "sky_4k.exr" } } }
        }));
        let spec = resolve(&files, AssetKind::Environment, "4k");
        assert_eq!(spec.primary_url, None);
        assert_eq!(
            spec.require_renderable(),
            Err(ResolveError::ResourceNotFound {
                kind: AssetKind::Environment,
                category: "hdri".to_string(),
                tier: "4k".to_string(),
                format: "hdr".to_string(),
            })
        );
        let other_tier = resolve(&files, AssetKind::Environment, "1k");
        assert_eq!(other_tier.primary_url, None);
    }

    #[test]
    fn model_resolves_url_and_includes() {
        let files = manifest(json!({
            "gltf": { "1k": { "gltf": {
                "url": "m.gltf",
                "include": { "tex.png": { "url": "CDN/tex.png" } }
            } } }
        }));
        let spec = resolve(&files, AssetKind::Model, "1k");
        assert_eq!(spec.primary_url.as_deref(), Some("m.gltf"));
        assert_eq!(spec.auxiliary.len(), 1);
        assert_eq!(spec.auxiliary.get("tex.png"), Some("CDN/tex.png"));
        assert_eq!(spec.urls(), vec!["m.gltf"]);
    }

    #[test]
    fn texture_set_skips_missing_maps() {
        let files = manifest(json!({
            "Diffuse": { "1k": { "png": { "url": "d.png" }, "jpg": { "url": "d.jpg" } } },
            "nor_gl": { "1k": { "png": { "url": "n.png" } } },
            "Rough": { "2k": { "png": { "url": "r2k.png" } } },
            "AO": { "1k": { "exr": { "url": "ao.exr" } } }
        }));
        let spec = resolve(&files, AssetKind::TextureSet, "1k");
        assert_eq!(
            spec.texture_maps,
            vec![
                (TextureMap::Diffuse, "d.png".to_string()),
                (TextureMap::NorGL, "n.png".to_string()),
            ]
        );
        assert_eq!(spec.primary_url.as_deref(), Some("d.png"));
        assert!(spec.require_renderable().is_ok());

        let empty = resolve(&files, AssetKind::TextureSet, "8k");
        assert!(empty.texture_maps.is_empty());
        assert!(empty.require_renderable().is_err());
    }

    #[test]
    fn resolve_is_deterministic() {
        let files = manifest(json!({
            "gltf": { "1k": { "gltf": {
                "url": "m.gltf",
                "include": { "b.png": { "url": "B" }, "a.png": { "url": "A" } }
            } } }
        }));
        let first = resolve(&files, AssetKind::Model, "1k");
        let second = resolve(&files, AssetKind::Model, "1k");
        assert_eq!(first, second);
    }

    #[test]
    fn wrong_kind_finds_nothing() {
        let files = manifest(json!({
            "hdri": { "1k": { "hdr": { "url": "sky.hdr" } } }
        }));
        let spec = resolve(&files, AssetKind::Model, "1k");
        assert!(spec.primary_url.is_none());
        assert!(spec.auxiliary.is_empty());
    }
}
