pub mod constants;
pub mod error;
pub mod grab;
pub mod physics;
pub mod rapier;
pub mod registry;
pub mod resolver;
pub mod scene;
pub mod session;
pub mod sync;
pub mod types;
pub mod velocity;

#[cfg(test)]
pub(crate) mod test_support;

pub use constants::{FIXED_TIMESTEP, GRAB_RANGE, MAX_SUBSTEPS};
pub use error::{RegistryError, SceneError};
pub use grab::{GrabEvent, GrabOutcome, IgnoreReason};
pub use physics::{BodyMode, PhysicsWorld, RapierPhysics};
pub use rapier::{BodyDef, ShapeDef, WorldStaticDef, collider_from_shape};
pub use registry::{ObjectRegistry, RegistryEntry};
pub use resolver::IntersectionResolver;
pub use scene::{NodeId, RayHit, SceneGraph, SceneTree};
pub use session::{ControllerId, GrabRecord, InteractiveEntity, SceneSession, SessionConfig};
pub use sync::{FixedStepper, FrameReport, FrameSynchronizer};
pub use types::{Iso, Quat, Ray, Transform, Vec3};
pub use velocity::VelocityTracker;
