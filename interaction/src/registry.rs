use std::{collections::HashMap, fmt::Debug, hash::Hash};

use crate::{error::RegistryError, scene::SceneGraph};

/// One lookup entry: the physics body and the top-level entity a node belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RegistryEntry<N, B> {
    pub entity: N,
    pub body: B,
}

/// Maps every node of an interactive entity (the entity itself and each render sub-node)
/// to the entity's physics body and to the entity node itself.
///
/// Built once per entity when it enters the scene and read-only afterwards. Entities are
/// reset, never destroyed, so there is no removal.
#[derive(Debug)]
pub struct ObjectRegistry<N, B> {
    entries: HashMap<N, RegistryEntry<N, B>>,
}

impl<N, B> Default for ObjectRegistry<N, B> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }
}

impl<N, B> ObjectRegistry<N, B>
where
    N: Copy + Eq + Hash + Debug,
    B: Copy,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `entity` and its current sub-node tree against `body`.
    ///
    /// Call once the entity's sub-nodes are final: nodes added later are not known to the
    /// registry. Nothing is inserted if any node is already registered.
    pub fn register<S>(&mut self, scene: &S, entity: N, body: B) -> Result<(), RegistryError<N>>
    where
        S: SceneGraph<Node = N>,
    {
        if !scene.contains(entity) {
            return Err(RegistryError::UnknownNode(entity));
        }

        let mut nodes = scene.descendants(entity);
        nodes.insert(0, entity);

        if let Some(&taken) = nodes.iter().find(|n| self.entries.contains_key(*n)) {
            return Err(RegistryError::AlreadyRegistered(taken));
        }

        let entry = RegistryEntry { entity, body };
        self.entries.extend(nodes.into_iter().map(|n| (n, entry)));
        Ok(())
    }

    /// Body owning `node`, for the entity node or any of its registered sub-nodes.
    #[inline]
    pub fn lookup(&self, node: N) -> Option<B> {
        self.entries.get(&node).map(|e| e.body)
    }

    /// Entity and body owning `node`.
    #[inline]
    pub fn entry(&self, node: N) -> Option<RegistryEntry<N, B>> {
        self.entries.get(&node).copied()
    }

    /// True if `node` is a registered top-level entity (not merely one of its sub-nodes).
    pub fn is_entity(&self, node: N) -> bool {
        self.entries.get(&node).is_some_and(|e| e.entity == node)
    }

    /// Number of registered node identities (entities plus sub-nodes).
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        scene::{NodeId, SceneTree},
        types::Transform,
    };

    #[test]
    fn every_sub_node_maps_to_the_entity_body() {
        let mut scene = SceneTree::new();
        let root = scene.root();
        let chair = scene.spawn(root, "chair", Transform::identity()).unwrap();
        let seat = scene.spawn(chair, "seat", Transform::identity()).unwrap();
        let leg = scene.spawn(seat, "leg", Transform::identity()).unwrap();

        let mut registry = ObjectRegistry::new();
        registry.register(&scene, chair, 7u32).unwrap();

        for node in [chair, seat, leg] {
            assert_eq!(registry.lookup(node), Some(7));
            assert_eq!(registry.entry(node).unwrap().entity, chair);
        }
        assert!(registry.is_entity(chair));
        assert!(!registry.is_entity(leg));
        assert_eq!(registry.lookup(root), None);
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn double_registration_is_rejected_without_side_effects() {
        let mut scene = SceneTree::new();
        let root = scene.root();
        let table = scene.spawn(root, "table", Transform::identity()).unwrap();
        let top = scene.spawn(table, "top", Transform::identity()).unwrap();

        let mut registry = ObjectRegistry::new();
        registry.register(&scene, top, 1u32).unwrap();

        assert_eq!(
            registry.register(&scene, table, 2),
            Err(RegistryError::AlreadyRegistered(top))
        );
        assert_eq!(registry.lookup(table), None);
        assert_eq!(registry.lookup(top), Some(1));
    }

    #[test]
    fn unknown_entity_is_rejected() {
        let scene = SceneTree::new();
        let mut registry = ObjectRegistry::new();
        assert_eq!(
            registry.register(&scene, NodeId(42), 1u32),
            Err(RegistryError::UnknownNode(NodeId(42)))
        );
        assert!(registry.is_empty());
    }
}
