//! Pointer picking and selection.
//!
//! Every pointer sample is cast as a ray against the pickable scene objects.
//! Hover and selection live in a small [`PickState`] updated by a pure
//! transition function; [`PickController`] applies the side effects (hover
//! emphasis, scale restore, cursor) to the scene.
//!
//! ## Phases
//!
//! `Idle` when nothing is under the pointer, `Hovering(o)` when `o` is under
//! the pointer, `Selected(o)` when `o` is under the pointer and is also the
//! current selection. The selection itself outlives the hover: moving off a
//! selected object returns to `Idle` but keeps it as the texturing target.

use super::camera::CameraController;
use crate::scene::{ObjectId, SceneGraph};
use glam::{Vec2, Vec3};

pub const DEFAULT_HOVER_SCALE: f32 = 1.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CursorStyle {
    #[default]
    Default,
    Pointer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PickPhase {
    Idle,
    Hovering(ObjectId),
    Selected(ObjectId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PickEvent {
    /// Result of the ray cast for one pointer sample.
    PointerMoved { hit: Option<ObjectId> },
    /// Pointer-down / activate.
    Activate,
    /// Scene object set replaced wholesale.
    Reset,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PickState {
    pub hovered: Option<ObjectId>,
    pub selected: Option<ObjectId>,
}

impl PickState {
    pub fn phase(&self) -> PickPhase {
        match self.hovered {
            None => PickPhase::Idle,
            Some(id) if self.selected == Some(id) => PickPhase::Selected(id),
            Some(id) => PickPhase::Hovering(id),
        }
    }

    pub fn next(self, event: PickEvent) -> PickState {
        match event {
            PickEvent::PointerMoved { hit } => PickState {
                hovered: hit,
                ..self
            },
            PickEvent::Activate => match self.hovered {
                Some(id) => PickState {
                    selected: Some(id),
                    ..self
                },
                None => self,
            },
            PickEvent::Reset => PickState::default(),
        }
    }
}

#[derive(Debug)]
pub struct PickController {
    state: PickState,
    /// Scale of the hovered object before emphasis.
    saved_scale: Option<(ObjectId, Vec3)>,
    hover_scale: f32,
    cursor: CursorStyle,
}

impl Default for PickController {
    fn default() -> Self {
        Self::new(DEFAULT_HOVER_SCALE)
    }
}

impl PickController {
    pub fn new(hover_scale: f32) -> Self {
        Self {
            state: PickState::default(),
            saved_scale: None,
            hover_scale,
            cursor: CursorStyle::Default,
        }
    }

    pub fn state(&self) -> PickState {
        self.state
    }

    pub fn phase(&self) -> PickPhase {
        self.state.phase()
    }

    pub fn hovered(&self) -> Option<ObjectId> {
        self.state.hovered
    }

    /// Current selection, if it is still alive in `scene`.
    pub fn selected(&self, scene: &SceneGraph) -> Option<ObjectId> {
        self.state.selected.filter(|id| scene.contains(*id))
    }

    pub fn cursor(&self) -> CursorStyle {
        self.cursor
    }

    pub fn hover_scale(&self) -> f32 {
        self.hover_scale
    }

    /// Ray-casts one pointer sample given in normalized device coordinates.
    pub fn sample(
        &mut self,
        scene: &mut SceneGraph,
        camera: &CameraController,
        ndc: Vec2,
    ) -> PickPhase {
        let ray = camera.viewport_ray(ndc);
        let hit = scene.raycast(&ray).map(|hit| hit.object);
        self.apply(scene, PickEvent::PointerMoved { hit })
    }

    /// Selects the hovered object, if any. Materials are left alone.
    pub fn activate(&mut self, scene: &mut SceneGraph) -> Option<ObjectId> {
        let previous = self.state.selected;
        self.apply(scene, PickEvent::Activate);
        if self.state.selected != previous {
            if let Some(id) = self.state.selected {
                let name = scene.get(id).map(|object| object.name.as_str()).unwrap_or("?");
                log::info!("Selected '{}'", name);
            }
        }
        self.selected(scene)
    }

    /// Restores any hover emphasis and forgets hover and selection.
    pub fn reset(&mut self, scene: &mut SceneGraph) {
        self.apply(scene, PickEvent::Reset);
    }

    pub fn apply(&mut self, scene: &mut SceneGraph, event: PickEvent) -> PickPhase {
        let next = self.state.next(event);
        if next.hovered != self.state.hovered {
            self.end_hover(scene);
            if let Some(id) = next.hovered {
                self.begin_hover(scene, id);
            }
        }
        self.state = next;
        self.cursor = if self.state.hovered.is_some() {
            CursorStyle::Pointer
        } else {
            CursorStyle::Default
        };
        self.state.phase()
    }

    fn begin_hover(&mut self, scene: &mut SceneGraph, id: ObjectId) {
        let Some(object) = scene.get_mut(id) else {
            return;
        };
        self.saved_scale = Some((id, object.transform.scale));
        object.transform.scale *= self.hover_scale;
    }

    fn end_hover(&mut self, scene: &mut SceneGraph) {
        let Some((id, scale)) = self.saved_scale.take() else {
            return;
        };
        // The object may already be gone; nothing to restore then.
        if let Some(object) = scene.get_mut(id) {
            object.transform.scale = scale;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{Aabb, SceneObject, Transform};

    fn camera() -> CameraController {
        CameraController::new(Vec3::new(0.0, 0.0, 10.0), -std::f32::consts::FRAC_PI_2, 0.0)
            .with_lens(60.0, 1.0)
    }

    fn box_at(name: &str, x: f32, scale: f32) -> SceneObject {
        let bounds = Aabb::from_center_extent(Vec3::ZERO, Vec3::splat(0.5));
        let mut object = SceneObject::new(name, bounds);
        object.transform = Transform {
            translation: Vec3::new(x, 0.0, 0.0),
            scale: Vec3::splat(scale),
        };
        object
    }

    /// NDC x that points at world x on the z = 0 plane for `camera()`.
    fn ndc_for_x(x: f32) -> Vec2 {
        let half = (30.0f32).to_radians().tan();
        Vec2::new(x / 10.0 / half, 0.0)
    }

    #[test]
    fn empty_scene_stays_idle() {
        let mut scene = SceneGraph::new();
        let mut picker = PickController::default();
        assert_eq!(picker.sample(&mut scene, &camera(), Vec2::ZERO), PickPhase::Idle);
        assert_eq!(picker.cursor(), CursorStyle::Default);
    }

    #[test]
    fn hover_scales_and_restores_exactly() {
        let mut scene = SceneGraph::new();
        let id = scene.insert(box_at("rock", 0.0, 0.7));
        let mut picker = PickController::new(1.25);

        assert_eq!(picker.sample(&mut scene, &camera(), Vec2::new(0.9, 0.9)), PickPhase::Idle);
        assert_eq!(picker.sample(&mut scene, &camera(), Vec2::ZERO), PickPhase::Hovering(id));
        assert_eq!(scene.get(id).unwrap().transform.scale, Vec3::splat(0.7) * 1.25);
        assert_eq!(picker.cursor(), CursorStyle::Pointer);

        // Repeated samples over the same object do not compound.
        picker.sample(&mut scene, &camera(), Vec2::ZERO);
        assert_eq!(scene.get(id).unwrap().transform.scale, Vec3::splat(0.7) * 1.25);

        assert_eq!(picker.sample(&mut scene, &camera(), Vec2::new(0.9, 0.9)), PickPhase::Idle);
        assert_eq!(scene.get(id).unwrap().transform.scale, Vec3::splat(0.7));
        assert_eq!(picker.cursor(), CursorStyle::Default);
    }

    #[test]
    fn moving_between_objects_restores_the_previous_one() {
        let mut scene = SceneGraph::new();
        let left = scene.insert(box_at("left", -2.0, 1.0));
        let right = scene.insert(box_at("right", 2.0, 1.0));
        let mut picker = PickController::default();

        assert_eq!(
            picker.sample(&mut scene, &camera(), ndc_for_x(-2.0)),
            PickPhase::Hovering(left)
        );
        assert_eq!(
            picker.sample(&mut scene, &camera(), ndc_for_x(2.0)),
            PickPhase::Hovering(right)
        );
        assert_eq!(scene.get(left).unwrap().transform.scale, Vec3::ONE);
        assert_eq!(
            scene.get(right).unwrap().transform.scale,
            Vec3::splat(DEFAULT_HOVER_SCALE)
        );
    }

    #[test]
    fn activate_selects_hovered_object_only() {
        let mut scene = SceneGraph::new();
        let left = scene.insert(box_at("left", -2.0, 1.0));
        let right = scene.insert(box_at("right", 2.0, 1.0));
        let mut picker = PickController::default();

        assert_eq!(picker.activate(&mut scene), None);

        picker.sample(&mut scene, &camera(), ndc_for_x(-2.0));
        assert_eq!(picker.activate(&mut scene), Some(left));
        assert_eq!(picker.phase(), PickPhase::Selected(left));

        picker.sample(&mut scene, &camera(), Vec2::new(0.0, 0.9));
        assert_eq!(picker.phase(), PickPhase::Idle);
        assert_eq!(picker.activate(&mut scene), Some(left));

        picker.sample(&mut scene, &camera(), ndc_for_x(2.0));
        assert_eq!(picker.phase(), PickPhase::Hovering(right));
        assert_eq!(picker.activate(&mut scene), Some(right));
    }

    #[test]
    fn reset_restores_scale_and_clears_selection() {
        let mut scene = SceneGraph::new();
        let id = scene.insert(box_at("rock", 0.0, 1.0));
        let mut picker = PickController::default();
        picker.sample(&mut scene, &camera(), Vec2::ZERO);
        picker.activate(&mut scene);
        picker.reset(&mut scene);
        assert_eq!(picker.state(), PickState::default());
        assert_eq!(scene.get(id).unwrap().transform.scale, Vec3::ONE);
        assert_eq!(picker.cursor(), CursorStyle::Default);
    }

    #[test]
    fn removed_objects_are_not_reported_selected() {
        let mut scene = SceneGraph::new();
        let id = scene.insert(box_at("rock", 0.0, 1.0));
        let mut picker = PickController::default();
        picker.sample(&mut scene, &camera(), Vec2::ZERO);
        picker.activate(&mut scene);
        scene.remove(id);
        assert_eq!(picker.selected(&scene), None);
        assert_eq!(picker.sample(&mut scene, &camera(), Vec2::ZERO), PickPhase::Idle);
    }

    #[test]
    fn transition_is_pure() {
        let state = PickState::default();
        let mut scene = SceneGraph::new();
        let id = scene.insert(box_at("rock", 0.0, 1.0));
        let hovered = state.next(PickEvent::PointerMoved { hit: Some(id) });
        assert_eq!(hovered.phase(), PickPhase::Hovering(id));
        assert_eq!(state.phase(), PickPhase::Idle);
        let selected = hovered.next(PickEvent::Activate);
        assert_eq!(selected.phase(), PickPhase::Selected(id));
        assert_eq!(selected.next(PickEvent::Reset), PickState::default());
    }
}
