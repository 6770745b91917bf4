/*!
Render scene graph seam and an arena-backed implementation.

The interaction core needs a hierarchical transform tree that can:
- report and set world transforms,
- re-parent a node while keeping its world transform (attach to / detach from a hand),
- walk ancestors and descendants,
- ray-cast against the pick shapes of a set of subtrees.

[`SceneGraph`] is that contract. [`SceneTree`] implements it with a flat `Vec` of nodes and
parent/children indices; hosts mirror its world transforms onto whatever actually renders.
*/

use std::{fmt::Debug, hash::Hash};

use rapier3d::parry::{query::RayCast, shape::SharedShape};

use crate::{
    error::SceneError,
    rapier::ShapeDef,
    types::{Ray, Transform},
};

/// Nearest pick-shape hit returned by [`SceneGraph::cast_ray`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RayHit<N> {
    /// The node whose pick shape was hit (may be a sub-node of a target).
    pub node: N,
    /// Distance along the (unit) ray direction.
    pub toi: f32,
}

pub trait SceneGraph {
    /// Stable node identity.
    type Node: Copy + Eq + Hash + Debug;

    /// The top-level scene node everything else hangs from.
    fn root(&self) -> Self::Node;

    fn contains(&self, node: Self::Node) -> bool;

    fn parent(&self, node: Self::Node) -> Option<Self::Node>;

    /// All nodes strictly below `node`, depth-first, children in insertion order.
    fn descendants(&self, node: Self::Node) -> Vec<Self::Node>;

    fn world_transform(&self, node: Self::Node) -> Option<Transform>;

    /// Move `node` so that its world transform equals `world`, keeping its parent.
    fn set_world_transform(
        &mut self,
        node: Self::Node,
        world: Transform,
    ) -> Result<(), SceneError<Self::Node>>;

    /// Make `node` a child of `new_parent` without changing its world transform.
    fn reparent_preserving_world(
        &mut self,
        node: Self::Node,
        new_parent: Self::Node,
    ) -> Result<(), SceneError<Self::Node>>;

    /// Cast `ray` against every pick shape in the subtrees rooted at `targets` and return the
    /// nearest hit within `max_toi`.
    ///
    /// Ties between equally distant hits are broken by traversal order (targets in order, each
    /// subtree depth-first). That order is an implementation detail, not a guarantee.
    fn cast_ray(&self, ray: &Ray, targets: &[Self::Node], max_toi: f32)
    -> Option<RayHit<Self::Node>>;
}

/// Index of a node inside a [`SceneTree`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

impl NodeId {
    #[inline]
    fn index(self) -> usize {
        self.0 as usize
    }
}

struct PickShape {
    def: ShapeDef,
    shape: SharedShape,
}

struct Node {
    name: String,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    local: Transform,
    pick: Option<PickShape>,
}

/// Arena scene graph. Nodes are never removed, so a [`NodeId`] stays valid for the tree's lifetime.
pub struct SceneTree {
    nodes: Vec<Node>,
}

impl Default for SceneTree {
    fn default() -> Self {
        Self::new()
    }
}

impl SceneTree {
    /// A tree holding only the root node, at the identity transform.
    pub fn new() -> Self {
        Self {
            nodes: vec![Node {
                name: "root".to_string(),
                parent: None,
                children: Vec::new(),
                local: Transform::identity(),
                pick: None,
            }],
        }
    }

    /// Add a node under `parent` with the given local transform.
    pub fn spawn(
        &mut self,
        parent: NodeId,
        name: impl Into<String>,
        local: Transform,
    ) -> Result<NodeId, SceneError<NodeId>> {
        self.insert(parent, name.into(), local, None)
    }

    /// Add a node that can be hit by [`SceneGraph::cast_ray`].
    pub fn spawn_with_shape(
        &mut self,
        parent: NodeId,
        name: impl Into<String>,
        local: Transform,
        shape: ShapeDef,
    ) -> Result<NodeId, SceneError<NodeId>> {
        let pick = PickShape {
            shape: shape.shared_shape(),
            def: shape,
        };
        self.insert(parent, name.into(), local, Some(pick))
    }

    fn insert(
        &mut self,
        parent: NodeId,
        name: String,
        local: Transform,
        pick: Option<PickShape>,
    ) -> Result<NodeId, SceneError<NodeId>> {
        if !self.contains(parent) {
            return Err(SceneError::UnknownNode(parent));
        }
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Node {
            name,
            parent: Some(parent),
            children: Vec::new(),
            local,
            pick,
        });
        self.nodes[parent.index()].children.push(id);
        Ok(id)
    }

    fn node(&self, id: NodeId) -> Result<&Node, SceneError<NodeId>> {
        self.nodes.get(id.index()).ok_or(SceneError::UnknownNode(id))
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut Node, SceneError<NodeId>> {
        self.nodes
            .get_mut(id.index())
            .ok_or(SceneError::UnknownNode(id))
    }

    pub fn name(&self, id: NodeId) -> Option<&str> {
        self.nodes.get(id.index()).map(|n| n.name.as_str())
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.nodes
            .get(id.index())
            .map(|n| n.children.as_slice())
            .unwrap_or(&[])
    }

    pub fn local_transform(&self, id: NodeId) -> Option<Transform> {
        self.nodes.get(id.index()).map(|n| n.local)
    }

    pub fn set_local_transform(
        &mut self,
        id: NodeId,
        local: Transform,
    ) -> Result<(), SceneError<NodeId>> {
        self.node_mut(id)?.local = local;
        Ok(())
    }

    pub fn pick_shape(&self, id: NodeId) -> Option<&ShapeDef> {
        self.nodes
            .get(id.index())
            .and_then(|n| n.pick.as_ref())
            .map(|p| &p.def)
    }

    /// True if `node` is `ancestor` or lies somewhere below it.
    pub fn is_within(&self, node: NodeId, ancestor: NodeId) -> bool {
        let mut cursor = Some(node);
        while let Some(id) = cursor {
            if id == ancestor {
                return true;
            }
            cursor = self.parent(id);
        }
        false
    }

    /// Iterate every node in the tree with its world transform (root included).
    pub fn iter_world(&self) -> impl Iterator<Item = (NodeId, Transform)> + '_ {
        (0..self.nodes.len() as u32)
            .map(NodeId)
            .filter_map(|id| self.world_transform(id).map(|t| (id, t)))
    }

    fn collect_descendants(&self, id: NodeId, out: &mut Vec<NodeId>) {
        for &child in self.children(id) {
            out.push(child);
            self.collect_descendants(child, out);
        }
    }

    fn cast_subtree(
        &self,
        ray: &Ray,
        id: NodeId,
        max_toi: f32,
        best: &mut Option<RayHit<NodeId>>,
    ) {
        let Some(node) = self.nodes.get(id.index()) else {
            return;
        };

        if let Some(pick) = &node.pick {
            if let Some(world) = self.world_transform(id) {
                let offset = Transform::from_translation(pick.def.local_offset());
                let iso = world.compose(&offset).to_body_pose();
                let limit = best.map_or(max_toi, |b| b.toi);
                let parry_ray = rapier3d::parry::query::Ray::new(ray.origin.into(), ray.dir);
                if let Some(toi) = pick.shape.cast_ray(&iso, &parry_ray, limit, true) {
                    // Strictly nearer only: equal distances keep the earlier node.
                    if best.is_none_or(|b| toi < b.toi) {
                        *best = Some(RayHit { node: id, toi });
                    }
                }
            }
        }

        for &child in &node.children {
            self.cast_subtree(ray, child, max_toi, best);
        }
    }
}

impl SceneGraph for SceneTree {
    type Node = NodeId;

    fn root(&self) -> NodeId {
        NodeId(0)
    }

    fn contains(&self, node: NodeId) -> bool {
        node.index() < self.nodes.len()
    }

    fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes.get(node.index()).and_then(|n| n.parent)
    }

    fn descendants(&self, node: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        self.collect_descendants(node, &mut out);
        out
    }

    fn world_transform(&self, node: NodeId) -> Option<Transform> {
        let mut current = self.nodes.get(node.index())?;
        let mut world = current.local;
        while let Some(parent) = current.parent {
            current = self.nodes.get(parent.index())?;
            world = current.local.compose(&world);
        }
        Some(world)
    }

    fn set_world_transform(
        &mut self,
        node: NodeId,
        world: Transform,
    ) -> Result<(), SceneError<NodeId>> {
        let parent_world = match self.node(node)?.parent {
            Some(parent) => self
                .world_transform(parent)
                .ok_or(SceneError::UnknownNode(parent))?,
            None => Transform::identity(),
        };
        self.node_mut(node)?.local = parent_world.inverse().compose(&world);
        Ok(())
    }

    fn reparent_preserving_world(
        &mut self,
        node: NodeId,
        new_parent: NodeId,
    ) -> Result<(), SceneError<NodeId>> {
        if node == self.root() {
            return Err(SceneError::RootIsFixed(node));
        }
        let world = self
            .world_transform(node)
            .ok_or(SceneError::UnknownNode(node))?;
        if !self.contains(new_parent) {
            return Err(SceneError::UnknownNode(new_parent));
        }
        if self.is_within(new_parent, node) {
            return Err(SceneError::Cycle {
                child: node,
                parent: new_parent,
            });
        }

        let old_parent = self.node(node)?.parent;
        if let Some(old_parent) = old_parent {
            self.node_mut(old_parent)?.children.retain(|&c| c != node);
        }
        self.node_mut(new_parent)?.children.push(node);
        self.node_mut(node)?.parent = Some(new_parent);

        self.set_world_transform(node, world)
    }

    fn cast_ray(&self, ray: &Ray, targets: &[NodeId], max_toi: f32) -> Option<RayHit<NodeId>> {
        let mut best = None;
        for &target in targets {
            self.cast_subtree(ray, target, max_toi, &mut best);
        }
        best
    }
}
