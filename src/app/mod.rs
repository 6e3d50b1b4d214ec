//! Scene session: ties catalog selection, loading, scene composition and
//! picking together for one viewer session.
//!
//! The session never fetches anything itself. `select` resolves a descriptor
//! and hands back a [`LoadManager`]; the external loader drives that manager
//! and finally calls one of the `complete_*` methods (or `fail_load`). Each
//! role (environment, model, texture set) has one pending slot; a newer
//! selection for a role makes older completions for that role no-ops.

mod input;

pub use input::{PointerSample, Viewport};

use crate::assets::{resolve_descriptor, LoadManager, LoadSpec, ResolveError};
use crate::catalog::{AssetDescriptor, AssetKind};
use crate::config::KitConfig;
use crate::progress::{
    LoadProgressEntry, LoadToken, ProgressIndicator, ProgressTracker, SharedProgress,
};
use crate::render::{CameraController, CursorStyle, PickController, PickEvent, PickPhase};
use crate::scene::{Aabb, EnvironmentMap, ObjectId, SceneGraph, SceneObject};
use crate::texture::{compose, TextureCache, TextureChannelMap, TextureHandle};
use glam::Vec3;
use std::collections::HashMap;

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Resolve(#[from] ResolveError),
    #[error("load of '{0}' was superseded")]
    Superseded(String),
    #[error("load of '{id}' is a {actual:?}, expected {expected:?}")]
    WrongKind {
        id: String,
        expected: AssetKind,
        actual: AssetKind,
    },
    #[error("no object selected")]
    NoSelection,
    #[error("no texture set loaded")]
    NoTextureSet,
}

/// An asset currently shown in the scene.
#[derive(Debug, Clone)]
pub struct ActiveAsset {
    pub descriptor: AssetDescriptor,
    pub spec: LoadSpec,
}

#[derive(Debug, Clone)]
pub struct ActiveTextureSet {
    pub asset: ActiveAsset,
    pub channels: TextureChannelMap,
}

#[derive(Debug)]
struct PendingLoad {
    descriptor: AssetDescriptor,
    token: LoadToken,
}

pub struct Session {
    config: KitConfig,
    progress: SharedProgress,
    scene: SceneGraph,
    picker: PickController,
    camera: CameraController,
    viewport: Viewport,
    textures: TextureCache,
    pending: HashMap<AssetKind, PendingLoad>,
    environment: Option<ActiveAsset>,
    model: Option<ActiveAsset>,
    model_objects: Vec<ObjectId>,
    texture_set: Option<ActiveTextureSet>,
}

impl Session {
    pub fn new(config: KitConfig, viewport: Viewport) -> Self {
        let yaw = -std::f32::consts::FRAC_PI_2;
        let camera = CameraController::new(Vec3::new(0.0, 0.0, 5.0), yaw, 0.0)
            .with_lens(config.camera_fov_y_deg, viewport.aspect());
        Self {
            picker: PickController::new(config.hover_scale),
            config,
            progress: ProgressTracker::shared(),
            scene: SceneGraph::new(),
            camera,
            viewport,
            textures: TextureCache::new(),
            pending: HashMap::new(),
            environment: None,
            model: None,
            model_objects: Vec::new(),
            texture_set: None,
        }
    }

    pub fn config(&self) -> &KitConfig {
        &self.config
    }

    pub fn scene(&self) -> &SceneGraph {
        &self.scene
    }

    pub fn scene_mut(&mut self) -> &mut SceneGraph {
        &mut self.scene
    }

    pub fn camera(&self) -> &CameraController {
        &self.camera
    }

    pub fn textures(&self) -> &TextureCache {
        &self.textures
    }

    /// Shared tracker, for UI code that wants to subscribe.
    pub fn progress(&self) -> SharedProgress {
        SharedProgress::clone(&self.progress)
    }

    pub fn progress_of(&self, asset_id: &str) -> Option<LoadProgressEntry> {
        self.progress.borrow().read(asset_id).cloned()
    }

    pub fn indicator(&self, asset_id: &str) -> ProgressIndicator {
        self.progress.borrow().indicator(asset_id)
    }

    pub fn environment(&self) -> Option<&ActiveAsset> {
        self.environment.as_ref()
    }

    pub fn model(&self) -> Option<&ActiveAsset> {
        self.model.as_ref()
    }

    pub fn model_objects(&self) -> &[ObjectId] {
        &self.model_objects
    }

    pub fn texture_set(&self) -> Option<&ActiveTextureSet> {
        self.texture_set.as_ref()
    }

    /// Resolves `descriptor` at the configured tier and starts tracking its load.
    ///
    /// A missing resource is reported, not fatal; the caller may retry with
    /// another tier through [`Session::select_at`].
    pub fn select(&mut self, descriptor: AssetDescriptor) -> Result<LoadManager, SessionError> {
        let tier = self.config.resolution_tier.clone();
        self.select_at(descriptor, &tier)
    }

    pub fn select_at(
        &mut self,
        descriptor: AssetDescriptor,
        tier: &str,
    ) -> Result<LoadManager, SessionError> {
        let spec = resolve_descriptor(&descriptor, tier);
        if let Err(err) = spec.require_renderable() {
            log::warn!("Cannot load '{}': {}", descriptor.id, err);
            return Err(err.into());
        }
        let manager = LoadManager::start(&self.progress, &descriptor.id, spec);
        let kind = descriptor.kind;
        let previous = self.pending.insert(
            kind,
            PendingLoad {
                descriptor,
                token: manager.token().clone(),
            },
        );
        if let Some(previous) = previous {
            log::info!("Pending {:?} load '{}' replaced", kind, previous.descriptor.id);
        }
        Ok(manager)
    }

    /// Loader callback: the HDR behind `manager` is decoded and ready.
    pub fn complete_environment(
        &mut self,
        manager: &LoadManager,
    ) -> Result<TextureHandle, SessionError> {
        let pending = self.finish_pending(manager, AssetKind::Environment)?;
        let spec = manager.spec().clone();
        let url = spec.primary_url.clone().unwrap_or_default();
        let texture = self.textures.resolve(&url);
        self.scene.set_environment(EnvironmentMap {
            asset_id: pending.descriptor.id.clone(),
            url,
            texture,
        });
        log::info!("Environment set to '{}'", pending.descriptor.name());
        self.environment = Some(ActiveAsset {
            descriptor: pending.descriptor,
            spec,
        });
        Ok(texture)
    }

    /// Loader callback: the glTF behind `manager` produced `objects`.
    ///
    /// Replaces the previous model wholesale, which also resets picking.
    pub fn complete_model(
        &mut self,
        manager: &LoadManager,
        objects: Vec<SceneObject>,
    ) -> Result<Vec<ObjectId>, SessionError> {
        let pending = self.finish_pending(manager, AssetKind::Model)?;

        self.picker.reset(&mut self.scene);
        for id in self.model_objects.drain(..) {
            self.scene.remove(id);
        }

        let mut bounds: Option<Aabb> = None;
        let ids: Vec<ObjectId> = objects
            .into_iter()
            .map(|mut object| {
                object.source_asset = Some(pending.descriptor.id.clone());
                let world = object.world_bounds();
                bounds = Some(match bounds {
                    Some(acc) => Aabb {
                        min: acc.min.min(world.min),
                        max: acc.max.max(world.max),
                    },
                    None => world,
                });
                self.scene.insert(object)
            })
            .collect();
        if let Some(bounds) = bounds {
            self.camera.frame_bounds(&bounds);
        }

        log::info!(
            "Model '{}' loaded with {} objects",
            pending.descriptor.name(),
            ids.len()
        );
        self.model_objects = ids.clone();
        self.model = Some(ActiveAsset {
            descriptor: pending.descriptor,
            spec: manager.spec().clone(),
        });
        Ok(ids)
    }

    /// Loader callback: one texture fetched for `manager` is decoded.
    ///
    /// Stale managers still register the texture; it is a valid resource
    /// even if its load lost the race.
    pub fn texture_loaded(&mut self, manager: &LoadManager, url: &str) -> TextureHandle {
        let handle = self.textures.resolve(url);
        log::debug!("Texture {} for '{}' -> {:?}", url, manager.asset_id(), handle);
        handle
    }

    /// Loader callback: all maps of the texture set behind `manager` are done.
    ///
    /// Maps never reported through [`Session::texture_loaded`] (and not cached
    /// from an earlier load) stay unresolved. The set is applied to the
    /// current selection, if any. Returns how many maps resolved.
    pub fn complete_texture_set(&mut self, manager: &LoadManager) -> Result<usize, SessionError> {
        let pending = self.finish_pending(manager, AssetKind::TextureSet)?;
        let spec = manager.spec().clone();
        let channels = TextureChannelMap::from_urls(
            spec.texture_maps.iter().map(|(map, url)| (*map, url.as_str())),
            &self.textures,
        );
        let resolved = channels.resolved_count();
        log::info!(
            "Texture set '{}' ready ({}/{} maps)",
            pending.descriptor.name(),
            resolved,
            spec.texture_maps.len()
        );
        self.texture_set = Some(ActiveTextureSet {
            asset: ActiveAsset {
                descriptor: pending.descriptor,
                spec,
            },
            channels,
        });
        if self.picker.selected(&self.scene).is_some() {
            self.texture_selected()?;
        }
        Ok(resolved)
    }

    /// Loader callback: a transfer for `manager` failed. The scene is left as
    /// it was; the error is only visible through the progress API.
    pub fn fail_load(&mut self, manager: &LoadManager, url: &str, message: &str) {
        manager.on_error(url, message);
        let kind = manager.spec().kind;
        let owns_slot = self
            .pending
            .get(&kind)
            .is_some_and(|pending| pending.token == *manager.token());
        if owns_slot {
            self.pending.remove(&kind);
        }
    }

    /// "Texture this": composes the active texture set onto the selection.
    pub fn texture_selected(&mut self) -> Result<usize, SessionError> {
        let set = self.texture_set.as_ref().ok_or(SessionError::NoTextureSet)?;
        let id = self
            .picker
            .selected(&self.scene)
            .ok_or(SessionError::NoSelection)?;
        let object = self.scene.get_mut(id).ok_or(SessionError::NoSelection)?;
        let touched = compose(&set.channels, object.surfaces.iter_mut());
        log::info!(
            "Applied '{}' to '{}' ({} surfaces)",
            set.asset.descriptor.name(),
            object.name,
            touched
        );
        Ok(touched)
    }

    pub fn resize(&mut self, viewport: Viewport) {
        self.viewport = viewport;
        self.camera.aspect = viewport.aspect();
    }

    pub fn pointer_moved(&mut self, sample: PointerSample) -> PickPhase {
        match self.viewport.to_ndc(sample) {
            Some(ndc) => self.picker.sample(&mut self.scene, &self.camera, ndc),
            None => self
                .picker
                .apply(&mut self.scene, PickEvent::PointerMoved { hit: None }),
        }
    }

    pub fn pointer_down(&mut self) -> Option<ObjectId> {
        self.picker.activate(&mut self.scene)
    }

    pub fn pick_phase(&self) -> PickPhase {
        self.picker.phase()
    }

    pub fn selected(&self) -> Option<ObjectId> {
        self.picker.selected(&self.scene)
    }

    pub fn cursor(&self) -> CursorStyle {
        self.picker.cursor()
    }

    /// Tears the scene down: hover restored, selection and objects dropped,
    /// pending loads forgotten.
    pub fn clear(&mut self) {
        self.picker.reset(&mut self.scene);
        self.scene.clear();
        self.scene.clear_environment();
        self.pending.clear();
        self.model_objects.clear();
        self.environment = None;
        self.model = None;
        self.texture_set = None;
        self.textures.clear();
    }

    /// Marks the load behind `manager` complete and claims its role slot.
    ///
    /// A completion for the wrong role is rejected before the tracker is
    /// touched, so the load keeps reporting progress.
    fn finish_pending(
        &mut self,
        manager: &LoadManager,
        kind: AssetKind,
    ) -> Result<PendingLoad, SessionError> {
        let actual = manager.spec().kind;
        if actual != kind {
            return Err(SessionError::WrongKind {
                id: manager.asset_id().to_string(),
                expected: kind,
                actual,
            });
        }
        manager.on_complete();
        let superseded = || SessionError::Superseded(manager.asset_id().to_string());
        let pending = self.pending.remove(&kind).ok_or_else(superseded)?;
        if pending.token != *manager.token() || !manager.is_current() {
            log::debug!("Ignoring completion of superseded load '{}'", manager.asset_id());
            self.pending.insert(kind, pending);
            return Err(superseded());
        }
        Ok(pending)
    }
}
