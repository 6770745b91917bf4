use log::trace;

use crate::{
    registry::{ObjectRegistry, RegistryEntry},
    scene::SceneGraph,
    types::Ray,
};

/// Turns a pointer ray into the interactive entity (and body) it points at.
///
/// One instance per use: the grab ray is unbounded, while e.g. a teleport probe would run its
/// own instance with a finite range against a different target set.
#[derive(Clone, Copy, Debug)]
pub struct IntersectionResolver {
    /// Hits farther than this along the ray are ignored (meters).
    pub max_distance: f32,
}

impl Default for IntersectionResolver {
    fn default() -> Self {
        Self {
            max_distance: f32::MAX,
        }
    }
}

impl IntersectionResolver {
    pub fn with_range(max_distance: f32) -> Self {
        Self { max_distance }
    }

    /// Nearest entity among `candidates` hit by `ray`.
    ///
    /// The hit may land on any render sub-node of a candidate; the registry maps it back to
    /// the owning entity and its body whatever the nesting depth. A hit on a node the registry
    /// does not know resolves to `None`, exactly like a miss.
    pub fn resolve<S, B>(
        &self,
        scene: &S,
        registry: &ObjectRegistry<S::Node, B>,
        ray: &Ray,
        candidates: &[S::Node],
    ) -> Option<RegistryEntry<S::Node, B>>
    where
        S: SceneGraph,
        B: Copy,
    {
        let hit = scene.cast_ray(ray, candidates, self.max_distance)?;

        let Some(entry) = registry.entry(hit.node) else {
            trace!("resolver: hit {:?} has no registered body", hit.node);
            return None;
        };

        // The registry already knows the owner; confirm it by walking up from the hit so a
        // sub-node that was moved out of its entity is not attributed to it.
        let mut cursor = Some(hit.node);
        while let Some(node) = cursor {
            if node == entry.entity {
                return candidates.contains(&node).then_some(entry);
            }
            cursor = scene.parent(node);
        }

        trace!(
            "resolver: hit {:?} is no longer below its entity {:?}",
            hit.node, entry.entity
        );
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        rapier::ShapeDef,
        scene::{NodeId, SceneTree},
        types::{Transform, Vec3},
    };

    struct Fixture {
        scene: SceneTree,
        registry: ObjectRegistry<NodeId, u32>,
        near: NodeId,
        near_grandchild: NodeId,
        far: NodeId,
    }

    /// Two props on the -Z axis. The near one only has geometry two levels down.
    fn fixture() -> Fixture {
        let mut scene = SceneTree::new();
        let root = scene.root();
        let cube = ShapeDef::from_extent(Vec3::new(1.0, 1.0, 1.0));

        let near = scene
            .spawn(root, "near", Transform::from_translation(Vec3::new(0.0, 0.0, -3.0)))
            .unwrap();
        let group = scene.spawn(near, "near/group", Transform::identity()).unwrap();
        let near_grandchild = scene
            .spawn_with_shape(group, "near/group/mesh", Transform::identity(), cube.clone())
            .unwrap();
        let far = scene
            .spawn_with_shape(
                root,
                "far",
                Transform::from_translation(Vec3::new(0.0, 0.0, -8.0)),
                cube,
            )
            .unwrap();

        let mut registry = ObjectRegistry::new();
        registry.register(&scene, near, 1).unwrap();
        registry.register(&scene, far, 2).unwrap();

        Fixture {
            scene,
            registry,
            near,
            near_grandchild,
            far,
        }
    }

    fn forward() -> Ray {
        Ray::new(Vec3::zeros(), Vec3::new(0.0, 0.0, -1.0)).unwrap()
    }

    #[test]
    fn resolves_deeply_nested_hit_to_its_entity() {
        let f = fixture();
        let hit = IntersectionResolver::default()
            .resolve(&f.scene, &f.registry, &forward(), &[f.near, f.far])
            .unwrap();

        assert_eq!(hit.entity, f.near);
        assert_eq!(hit.body, 1);
        assert_eq!(f.scene.parent(f.scene.parent(f.near_grandchild).unwrap()), Some(f.near));
    }

    #[test]
    fn nearest_candidate_wins() {
        let f = fixture();
        let resolver = IntersectionResolver::default();

        let hit = resolver
            .resolve(&f.scene, &f.registry, &forward(), &[f.far, f.near])
            .unwrap();
        assert_eq!(hit.entity, f.near);

        let hit = resolver
            .resolve(&f.scene, &f.registry, &forward(), &[f.far])
            .unwrap();
        assert_eq!(hit.entity, f.far);
    }

    #[test]
    fn miss_and_out_of_range_resolve_to_none() {
        let f = fixture();
        let up = Ray::new(Vec3::zeros(), Vec3::new(0.0, 1.0, 0.0)).unwrap();
        assert!(
            IntersectionResolver::default()
                .resolve(&f.scene, &f.registry, &up, &[f.near, f.far])
                .is_none()
        );
        assert!(
            IntersectionResolver::with_range(1.0)
                .resolve(&f.scene, &f.registry, &forward(), &[f.near, f.far])
                .is_none()
        );
    }

    #[test]
    fn unregistered_geometry_resolves_to_none() {
        let mut f = fixture();
        let root = f.scene.root();
        let stray = f
            .scene
            .spawn_with_shape(
                root,
                "stray",
                Transform::from_translation(Vec3::new(0.0, 0.0, -1.0)),
                ShapeDef::Sphere { radius: 0.2 },
            )
            .unwrap();

        assert!(
            IntersectionResolver::default()
                .resolve(&f.scene, &f.registry, &forward(), &[stray, f.near])
                .is_none()
        );
    }
}
