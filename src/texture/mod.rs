//! PBR texture sets: map types, the session texture cache and the composer
//! that binds a resolved set onto scene surfaces.

use crate::scene::SurfaceMaterial;
use std::collections::{BTreeMap, HashMap};

/// Opaque texture identity handed to the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureHandle(u64);

impl TextureHandle {
    pub fn raw(self) -> u64 {
        self.0
    }
}

/// Map types a catalog texture set may provide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize)]
pub enum TextureMap {
    Diffuse,
    /// Packed ambient occlusion / roughness / metalness.
    Arm,
    /// OpenGL-convention normal map.
    NorGL,
    Displacement,
    AO,
    Rough,
}

impl TextureMap {
    pub const ALL: [TextureMap; 6] = [
        Self::Diffuse,
        Self::Arm,
        Self::NorGL,
        Self::Displacement,
        Self::AO,
        Self::Rough,
    ];

    /// Manifest category keys for this map, in lookup priority.
    pub fn manifest_keys(self) -> &'static [&'static str] {
        match self {
            Self::Diffuse => &["Diffuse", "diffuse"],
            Self::Arm => &["arm", "Arm"],
            Self::NorGL => &["nor_gl", "NorGL", "Normal"],
            Self::Displacement => &["Displacement", "displacement"],
            Self::AO => &["AO", "ao"],
            Self::Rough => &["Rough", "rough"],
        }
    }
}

/// Session-scoped url -> texture registry. Repeated selections of the same
/// resource resolve to the same handle. Nothing is persisted.
#[derive(Debug, Default)]
pub struct TextureCache {
    by_url: HashMap<String, TextureHandle>,
    next: u64,
}

impl TextureCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle for `url`, allocating one on first sight.
    pub fn resolve(&mut self, url: &str) -> TextureHandle {
        if let Some(handle) = self.by_url.get(url) {
            return *handle;
        }
        self.next += 1;
        let handle = TextureHandle(self.next);
        self.by_url.insert(url.to_string(), handle);
        handle
    }

    pub fn get(&self, url: &str) -> Option<TextureHandle> {
        self.by_url.get(url).copied()
    }

    pub fn len(&self) -> usize {
        self.by_url.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_url.is_empty()
    }

    pub fn clear(&mut self) {
        self.by_url.clear();
    }
}

/// Resolved textures of one texture-set instance. `None` marks a map the set
/// declares but which did not resolve.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TextureChannelMap {
    channels: BTreeMap<TextureMap, Option<TextureHandle>>,
}

impl TextureChannelMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Looks each url up in `cache`. Maps whose texture has not been loaded
    /// yet stay unresolved.
    pub fn from_urls<'a>(
        urls: impl IntoIterator<Item = (TextureMap, &'a str)>,
        cache: &TextureCache,
    ) -> Self {
        let channels = urls
            .into_iter()
            .map(|(map, url)| (map, cache.get(url)))
            .collect();
        Self { channels }
    }

    pub fn with(mut self, map: TextureMap, texture: Option<TextureHandle>) -> Self {
        self.channels.insert(map, texture);
        self
    }

    pub fn get(&self, map: TextureMap) -> Option<TextureHandle> {
        self.channels.get(&map).copied().flatten()
    }

    pub fn resolved_count(&self) -> usize {
        self.channels.values().filter(|texture| texture.is_some()).count()
    }
}

/// Binds resolved maps onto every surface: color <- Diffuse, normal <- NorGL,
/// roughness <- Rough, metalness <- Arm, occlusion <- AO.
///
/// Unresolved maps leave the slot as it was. Displacement is never bound.
/// Returns how many surfaces were touched.
pub fn compose<'a>(
    channels: &TextureChannelMap,
    surfaces: impl IntoIterator<Item = &'a mut SurfaceMaterial>,
) -> usize {
    let assignments = [
        (TextureMap::Diffuse, channels.get(TextureMap::Diffuse)),
        (TextureMap::NorGL, channels.get(TextureMap::NorGL)),
        (TextureMap::Rough, channels.get(TextureMap::Rough)),
        (TextureMap::Arm, channels.get(TextureMap::Arm)),
        (TextureMap::AO, channels.get(TextureMap::AO)),
    ];
    let mut touched = 0;
    for surface in surfaces {
        for (map, texture) in assignments {
            let Some(texture) = texture else {
                continue;
            };
            let slot = match map {
                TextureMap::Diffuse => &mut surface.color_map,
                TextureMap::NorGL => &mut surface.normal_map,
                TextureMap::Rough => &mut surface.roughness_map,
                TextureMap::Arm => &mut surface.metalness_map,
                TextureMap::AO => &mut surface.occlusion_map,
                TextureMap::Displacement => continue,
            };
            *slot = Some(texture);
        }
        surface.needs_update = true;
        touched += 1;
    }
    touched
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_set(cache: &mut TextureCache) -> TextureChannelMap {
        TextureChannelMap::new()
            .with(TextureMap::Diffuse, Some(cache.resolve("diff.png")))
            .with(TextureMap::NorGL, Some(cache.resolve("nor.png")))
            .with(TextureMap::Rough, Some(cache.resolve("rough.png")))
            .with(TextureMap::Arm, Some(cache.resolve("arm.png")))
            .with(TextureMap::AO, Some(cache.resolve("ao.png")))
            .with(TextureMap::Displacement, Some(cache.resolve("disp.png")))
    }

    #[test]
    fn cache_reuses_handles() {
        let mut cache = TextureCache::new();
        let a = cache.resolve("a.png");
        let b = cache.resolve("b.png");
        assert_ne!(a, b);
        assert_eq!(cache.resolve("a.png"), a);
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get("c.png"), None);
    }

    #[test]
    fn compose_assigns_each_channel() {
        let mut cache = TextureCache::new();
        let set = full_set(&mut cache);
        let mut surface = SurfaceMaterial::named("body");
        assert_eq!(compose(&set, [&mut surface]), 1);
        assert_eq!(surface.color_map, cache.get("diff.png"));
        assert_eq!(surface.normal_map, cache.get("nor.png"));
        assert_eq!(surface.roughness_map, cache.get("rough.png"));
        assert_eq!(surface.metalness_map, cache.get("arm.png"));
        assert_eq!(surface.occlusion_map, cache.get("ao.png"));
        assert_eq!(surface.displacement_map, None);
        assert!(surface.needs_update);
    }

    #[test]
    fn unresolved_channels_keep_prior_value() {
        let mut cache = TextureCache::new();
        let old_normal = cache.resolve("old_normal.png");
        let mut surface = SurfaceMaterial {
            normal_map: Some(old_normal),
            ..SurfaceMaterial::default()
        };
        let set = TextureChannelMap::new()
            .with(TextureMap::Diffuse, Some(cache.resolve("diff.png")))
            .with(TextureMap::NorGL, None);
        compose(&set, [&mut surface]);
        assert_eq!(surface.normal_map, Some(old_normal));
        assert_eq!(surface.color_map, cache.get("diff.png"));
    }

    #[test]
    fn compose_is_idempotent() {
        let mut cache = TextureCache::new();
        let set = full_set(&mut cache);
        let mut once = SurfaceMaterial::named("a");
        let mut twice = SurfaceMaterial::named("a");
        compose(&set, [&mut once]);
        compose(&set, [&mut twice]);
        compose(&set, [&mut twice]);
        assert_eq!(once, twice);
    }

    #[test]
    fn compose_covers_every_sub_surface() {
        let mut cache = TextureCache::new();
        let set = full_set(&mut cache);
        let mut surfaces = vec![SurfaceMaterial::named("a"), SurfaceMaterial::named("b")];
        assert_eq!(compose(&set, surfaces.iter_mut()), 2);
        assert!(surfaces.iter().all(|s| s.color_map.is_some() && s.needs_update));
    }

    #[test]
    fn channel_map_from_urls_uses_cache() {
        let mut cache = TextureCache::new();
        let diffuse = cache.resolve("d.png");
        let map = TextureChannelMap::from_urls(
            [(TextureMap::Diffuse, "d.png"), (TextureMap::Rough, "r.png")],
            &cache,
        );
        assert_eq!(map.get(TextureMap::Diffuse), Some(diffuse));
        assert_eq!(map.get(TextureMap::Rough), None);
        assert_eq!(map.resolved_count(), 1);
    }
}
