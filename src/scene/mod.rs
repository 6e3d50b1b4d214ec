//! Live scene model the core operates on.
//!
//! The scene owns every object. Everything else refers to objects through
//! [`ObjectId`], a generational index: once an object is removed, or the
//! scene is rebuilt, old ids stop resolving instead of aliasing a new object.

mod material;

pub use material::SurfaceMaterial;

use crate::texture::TextureHandle;
use glam::Vec3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjectId {
    index: u32,
    generation: u32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub translation: Vec3,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            translation: Vec3::ZERO,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    pub fn from_translation(translation: Vec3) -> Self {
        Self {
            translation,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
}

/// Axis-aligned bounds in object-local space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub fn from_center_extent(center: Vec3, half_extent: Vec3) -> Self {
        Self {
            min: center - half_extent,
            max: center + half_extent,
        }
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Bounds after applying scale then translation.
    pub fn transformed(&self, transform: &Transform) -> Self {
        let a = self.min * transform.scale + transform.translation;
        let b = self.max * transform.scale + transform.translation;
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    /// Slab test. Returns the entry distance along the ray, or 0 when the
    /// origin is inside the box.
    pub fn intersect_ray(&self, ray: &Ray) -> Option<f32> {
        let mut t_min = 0.0f32;
        let mut t_max = f32::INFINITY;
        for axis in 0..3 {
            let origin = ray.origin[axis];
            let direction = ray.direction[axis];
            let (lo, hi) = (self.min[axis], self.max[axis]);
            if direction.abs() < 1e-8 {
                if origin < lo || origin > hi {
                    return None;
                }
                continue;
            }
            let inv = 1.0 / direction;
            let mut t0 = (lo - origin) * inv;
            let mut t1 = (hi - origin) * inv;
            if t0 > t1 {
                std::mem::swap(&mut t0, &mut t1);
            }
            t_min = t_min.max(t0);
            t_max = t_max.min(t1);
            if t_min > t_max {
                return None;
            }
        }
        Some(t_min)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SceneObject {
    pub name: String,
    pub transform: Transform,
    pub bounds: Aabb,
    /// Sub-surfaces sharing one logical material assignment.
    pub surfaces: Vec<SurfaceMaterial>,
    pub pickable: bool,
    /// Catalog id of the asset this object came from.
    pub source_asset: Option<String>,
}

impl SceneObject {
    pub fn new(name: impl Into<String>, bounds: Aabb) -> Self {
        Self {
            name: name.into(),
            transform: Transform::default(),
            bounds,
            surfaces: vec![SurfaceMaterial::default()],
            pickable: true,
            source_asset: None,
        }
    }

    pub fn world_bounds(&self) -> Aabb {
        self.bounds.transformed(&self.transform)
    }
}

/// Image-based lighting currently applied to the scene.
#[derive(Debug, Clone, PartialEq)]
pub struct EnvironmentMap {
    pub asset_id: String,
    pub url: String,
    pub texture: TextureHandle,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    pub object: ObjectId,
    pub distance: f32,
}

#[derive(Debug)]
struct Slot {
    generation: u32,
    object: Option<SceneObject>,
}

#[derive(Debug, Default)]
pub struct SceneGraph {
    slots: Vec<Slot>,
    free: Vec<u32>,
    environment: Option<EnvironmentMap>,
}

impl SceneGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, object: SceneObject) -> ObjectId {
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.object = Some(object);
            return ObjectId {
                index,
                generation: slot.generation,
            };
        }
        let index = self.slots.len() as u32;
        self.slots.push(Slot {
            generation: 0,
            object: Some(object),
        });
        ObjectId {
            index,
            generation: 0,
        }
    }

    pub fn remove(&mut self, id: ObjectId) -> Option<SceneObject> {
        let slot = self.slots.get_mut(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        let object = slot.object.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.index);
        Some(object)
    }

    pub fn get(&self, id: ObjectId) -> Option<&SceneObject> {
        self.slots
            .get(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.object.as_ref())
    }

    pub fn get_mut(&mut self, id: ObjectId) -> Option<&mut SceneObject> {
        self.slots
            .get_mut(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.object.as_mut())
    }

    pub fn contains(&self, id: ObjectId) -> bool {
        self.get(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.slots.iter().filter(|slot| slot.object.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = (ObjectId, &SceneObject)> {
        self.slots.iter().enumerate().filter_map(|(index, slot)| {
            slot.object.as_ref().map(|object| {
                (
                    ObjectId {
                        index: index as u32,
                        generation: slot.generation,
                    },
                    object,
                )
            })
        })
    }

    /// Removes every object that came from `asset_id`.
    pub fn remove_asset(&mut self, asset_id: &str) -> usize {
        let ids: Vec<ObjectId> = self
            .iter()
            .filter(|(_, object)| object.source_asset.as_deref() == Some(asset_id))
            .map(|(id, _)| id)
            .collect();
        ids.into_iter().filter(|id| self.remove(*id).is_some()).count()
    }

    /// Removes every object that came from a catalog asset.
    pub fn remove_all_assets(&mut self) -> usize {
        let ids: Vec<ObjectId> = self
            .iter()
            .filter(|(_, object)| object.source_asset.is_some())
            .map(|(id, _)| id)
            .collect();
        ids.into_iter().filter(|id| self.remove(*id).is_some()).count()
    }

    pub fn clear(&mut self) {
        let ids: Vec<ObjectId> = self.iter().map(|(id, _)| id).collect();
        for id in ids {
            self.remove(id);
        }
    }

    pub fn environment(&self) -> Option<&EnvironmentMap> {
        self.environment.as_ref()
    }

    pub fn set_environment(&mut self, environment: EnvironmentMap) -> Option<EnvironmentMap> {
        self.environment.replace(environment)
    }

    pub fn clear_environment(&mut self) -> Option<EnvironmentMap> {
        self.environment.take()
    }

    /// Nearest pickable object hit by `ray`. Ties go to the lower slot.
    pub fn raycast(&self, ray: &Ray) -> Option<RayHit> {
        self.iter()
            .filter(|(_, object)| object.pickable)
            .filter_map(|(id, object)| {
                object
                    .world_bounds()
                    .intersect_ray(ray)
                    .map(|distance| RayHit {
                        object: id,
                        distance,
                    })
            })
            .fold(None, |nearest: Option<RayHit>, hit| match nearest {
                Some(best) if best.distance <= hit.distance => Some(best),
                _ => Some(hit),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_box(name: &str, at: Vec3) -> SceneObject {
        let bounds = Aabb::from_center_extent(Vec3::ZERO, Vec3::splat(0.5));
        let mut object = SceneObject::new(name, bounds);
        object.transform = Transform::from_translation(at);
        object
    }

    fn forward_ray() -> Ray {
        Ray {
            origin: Vec3::new(0.0, 0.0, 10.0),
            direction: Vec3::new(0.0, 0.0, -1.0),
        }
    }

    #[test]
    fn removed_ids_do_not_alias_new_objects() {
        let mut scene = SceneGraph::new();
        let first = scene.insert(unit_box("a", Vec3::ZERO));
        assert!(scene.remove(first).is_some());
        let second = scene.insert(unit_box("b", Vec3::ZERO));
        assert_ne!(first, second);
        assert!(scene.get(first).is_none());
        assert_eq!(scene.get(second).map(|o| o.name.as_str()), Some("b"));
        assert!(scene.remove(first).is_none());
    }

    #[test]
    fn raycast_returns_nearest_pickable() {
        let mut scene = SceneGraph::new();
        let far = scene.insert(unit_box("far", Vec3::new(0.0, 0.0, -5.0)));
        let near = scene.insert(unit_box("near", Vec3::new(0.0, 0.0, 2.0)));
        let hit = scene.raycast(&forward_ray()).unwrap();
        assert_eq!(hit.object, near);
        assert!((hit.distance - 7.5).abs() < 1e-5);

        scene.get_mut(near).unwrap().pickable = false;
        assert_eq!(scene.raycast(&forward_ray()).unwrap().object, far);
    }

    #[test]
    fn raycast_on_empty_scene_misses() {
        let scene = SceneGraph::new();
        assert!(scene.raycast(&forward_ray()).is_none());
    }

    #[test]
    fn ray_pointing_away_misses() {
        let bounds = Aabb::from_center_extent(Vec3::ZERO, Vec3::ONE);
        let ray = Ray {
            origin: Vec3::new(0.0, 0.0, 5.0),
            direction: Vec3::new(0.0, 0.0, 1.0),
        };
        assert!(bounds.intersect_ray(&ray).is_none());
        let parallel = Ray {
            origin: Vec3::new(3.0, 0.0, 5.0),
            direction: Vec3::new(0.0, 0.0, -1.0),
        };
        assert!(bounds.intersect_ray(&parallel).is_none());
    }

    #[test]
    fn scale_grows_world_bounds() {
        let mut object = unit_box("a", Vec3::new(1.0, 0.0, 0.0));
        object.transform.scale = Vec3::splat(2.0);
        let world = object.world_bounds();
        assert_eq!(world.min, Vec3::new(0.0, -1.0, -1.0));
        assert_eq!(world.max, Vec3::new(2.0, 1.0, 1.0));
    }

    #[test]
    fn remove_asset_only_drops_that_asset() {
        let mut scene = SceneGraph::new();
        let mut rock = unit_box("rock", Vec3::ZERO);
        rock.source_asset = Some("rock".to_string());
        let mut tree = unit_box("tree", Vec3::ZERO);
        tree.source_asset = Some("tree".to_string());
        scene.insert(rock.clone());
        scene.insert(rock);
        let tree_id = scene.insert(tree);
        scene.insert(unit_box("floor", Vec3::ZERO));
        assert_eq!(scene.remove_asset("rock"), 2);
        assert!(scene.contains(tree_id));
        assert_eq!(scene.remove_all_assets(), 1);
        assert_eq!(scene.len(), 1);
        scene.clear();
        assert!(scene.is_empty());
    }
}
