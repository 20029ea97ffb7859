//! Host-side view of the entities a gizmo manipulates.
//!
//! The gizmo never owns entities. The host lends it a [`SceneObjects`]
//! implementation and the list of controlled ids for the duration of each
//! `update` call.

use std::collections::HashMap;

use glam::{Quat, Vec3};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntityId(Uuid);

impl EntityId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for EntityId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Layer index in `0..32`; masks are `u32` bit sets over these indices.
pub type Layer = u8;

/// World-space position and orientation of an entity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    pub position: Vec3,
    pub rotation: Quat,
}

impl Pose {
    pub const IDENTITY: Pose = Pose {
        position: Vec3::ZERO,
        rotation: Quat::IDENTITY,
    };

    pub fn new(position: Vec3, rotation: Quat) -> Self {
        Self { position, rotation }
    }

    /// Rotates the orientation by `rotation` and the position about `pivot`.
    pub fn rotated_about(self, pivot: Vec3, rotation: Quat) -> Self {
        Self {
            position: pivot + rotation * (self.position - pivot),
            rotation: (rotation * self.rotation).normalize(),
        }
    }

    /// Rotates the orientation in place, leaving the position untouched.
    pub fn rotated_in_place(self, rotation: Quat) -> Self {
        Self {
            position: self.position,
            rotation: (rotation * self.rotation).normalize(),
        }
    }

    pub fn approx_eq(&self, other: &Pose, tolerance: f32) -> bool {
        self.position.abs_diff_eq(other.position, tolerance)
            && self.rotation.abs_diff_eq(other.rotation, tolerance)
    }
}

impl Default for Pose {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Entities the gizmo can read and transform.
pub trait SceneObjects {
    /// Current pose, or None if the id is unknown to the host.
    fn pose(&self, id: EntityId) -> Option<Pose>;

    fn set_pose(&mut self, id: EntityId, pose: Pose);

    fn layer(&self, id: EntityId) -> Layer;

    /// True when some ancestor of `id` is also in `controlled`; such objects
    /// move with their ancestor and must not be transformed twice.
    fn has_controlled_ancestor(&self, id: EntityId, controlled: &[EntityId]) -> bool;
}

/// Controlled objects with no controlled ancestor, in list order.
pub fn top_level_objects(scene: &dyn SceneObjects, controlled: &[EntityId]) -> Vec<EntityId> {
    controlled
        .iter()
        .copied()
        .filter(|id| !scene.has_controlled_ancestor(*id, controlled))
        .collect()
}

#[derive(Debug, Clone)]
struct SceneEntity {
    pose: Pose,
    layer: Layer,
    parent: Option<EntityId>,
}

/// Flat entity store holding world poses, used by headless hosts and tests.
#[derive(Debug, Clone, Default)]
pub struct InMemoryScene {
    entities: HashMap<EntityId, SceneEntity>,
}

impl InMemoryScene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spawn(&mut self, pose: Pose) -> EntityId {
        self.spawn_with(pose, 0, None)
    }

    pub fn spawn_with(&mut self, pose: Pose, layer: Layer, parent: Option<EntityId>) -> EntityId {
        let id = EntityId::new();
        self.entities.insert(
            id,
            SceneEntity {
                pose,
                layer,
                parent,
            },
        );
        id
    }

    pub fn set_layer(&mut self, id: EntityId, layer: Layer) {
        if let Some(entity) = self.entities.get_mut(&id) {
            entity.layer = layer;
        }
    }

    pub fn parent(&self, id: EntityId) -> Option<EntityId> {
        self.entities.get(&id).and_then(|entity| entity.parent)
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

impl SceneObjects for InMemoryScene {
    fn pose(&self, id: EntityId) -> Option<Pose> {
        self.entities.get(&id).map(|entity| entity.pose)
    }

    fn set_pose(&mut self, id: EntityId, pose: Pose) {
        if let Some(entity) = self.entities.get_mut(&id) {
            entity.pose = pose;
        }
    }

    fn layer(&self, id: EntityId) -> Layer {
        self.entities.get(&id).map_or(0, |entity| entity.layer)
    }

    fn has_controlled_ancestor(&self, id: EntityId, controlled: &[EntityId]) -> bool {
        let mut current = self.parent(id);
        // At most one step per entity, so parent cycles terminate.
        let mut remaining = self.entities.len();
        while let Some(ancestor) = current {
            if remaining == 0 {
                break;
            }
            if controlled.contains(&ancestor) {
                return true;
            }
            current = self.parent(ancestor);
            remaining -= 1;
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rotated_about_moves_position_around_pivot() {
        let pose = Pose::new(Vec3::new(2.0, 0.0, 0.0), Quat::IDENTITY);
        let rotation = Quat::from_rotation_z(std::f32::consts::FRAC_PI_2);
        let rotated = pose.rotated_about(Vec3::new(1.0, 0.0, 0.0), rotation);
        assert!(rotated.position.abs_diff_eq(Vec3::new(1.0, 1.0, 0.0), 1e-5));
        assert!(rotated.rotation.abs_diff_eq(rotation, 1e-5));

        let in_place = pose.rotated_in_place(rotation);
        assert_eq!(in_place.position, pose.position);
    }

    #[test]
    fn children_of_controlled_parents_are_not_top_level() {
        let mut scene = InMemoryScene::new();
        let parent = scene.spawn(Pose::IDENTITY);
        let child = scene.spawn_with(Pose::IDENTITY, 0, Some(parent));
        let grandchild = scene.spawn_with(Pose::IDENTITY, 0, Some(child));
        let loner = scene.spawn(Pose::IDENTITY);

        let controlled = [grandchild, parent, loner];
        assert_eq!(top_level_objects(&scene, &controlled), vec![parent, loner]);

        let only_child = [child];
        assert_eq!(top_level_objects(&scene, &only_child), vec![child]);
    }

    #[test]
    fn unknown_ids_are_ignored() {
        let mut scene = InMemoryScene::new();
        let stranger = EntityId::new();
        scene.set_pose(stranger, Pose::IDENTITY);
        assert!(scene.pose(stranger).is_none());
        assert_eq!(scene.layer(stranger), 0);
        assert!(scene.is_empty());
    }
}
