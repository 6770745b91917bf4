use std::fmt::Debug;

use thiserror::Error;

/// Structural errors raised by a [`SceneGraph`](crate::scene::SceneGraph) implementation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SceneError<N: Debug> {
    #[error("scene node {0:?} does not exist")]
    UnknownNode(N),

    #[error("cannot parent {child:?} under {parent:?}: it is the node itself or one of its descendants")]
    Cycle { child: N, parent: N },

    #[error("the scene root {0:?} cannot be re-parented")]
    RootIsFixed(N),
}

/// Errors raised while building the object registry.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistryError<N: Debug> {
    /// Each entity is registered exactly once, and no sub-node may belong to two entities.
    #[error("node {0:?} is already registered")]
    AlreadyRegistered(N),

    #[error("node {0:?} is not part of the scene")]
    UnknownNode(N),
}
