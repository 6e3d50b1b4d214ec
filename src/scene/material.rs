use crate::texture::TextureHandle;

/// PBR texture slots of one surface.
///
/// Scalar factors stay with the renderer; the core only swaps map bindings.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SurfaceMaterial {
    pub name: String,
    pub color_map: Option<TextureHandle>,
    pub normal_map: Option<TextureHandle>,
    pub roughness_map: Option<TextureHandle>,
    pub metalness_map: Option<TextureHandle>,
    pub occlusion_map: Option<TextureHandle>,
    pub displacement_map: Option<TextureHandle>,
    /// Set when bindings changed and the GPU copy must be refreshed.
    pub needs_update: bool,
}

impl SurfaceMaterial {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Called by the renderer after uploading.
    pub fn mark_uploaded(&mut self) {
        self.needs_update = false;
    }
}
