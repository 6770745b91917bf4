//! Per-frame synchronization between controllers, physics bodies and visual nodes.
//!
//! Each rendered frame runs, in order:
//! 1. physics steps (fixed timestep, bounded catch-up),
//! 2. held bodies: sample the controller velocity, then copy the controller pose into the
//!    kinematic body,
//! 3. free bodies: copy the simulated body pose into the visual node.
//!
//! A released body keeps its last shown pose until a frame has stepped physics, so it gets at
//! least one simulation step before its body pose is shown.

use std::collections::HashSet;

use log::trace;

use crate::{
    constants::STEP_EPSILON,
    physics::{BodyMode, PhysicsWorld},
    scene::SceneGraph,
    session::{SceneSession, SessionConfig},
    types::Transform,
};

/// Splits variable frame times into fixed physics steps.
#[derive(Clone, Copy, Debug)]
pub struct FixedStepper {
    step: f32,
    max_substeps: u32,
    accumulator: f32,
}

impl FixedStepper {
    pub fn new(step: f32, max_substeps: u32) -> Self {
        Self {
            step,
            max_substeps: max_substeps.max(1),
            accumulator: 0.0,
        }
    }

    #[inline]
    pub fn step(&self) -> f32 {
        self.step
    }

    /// Bank `frame_dt` and return how many fixed steps to run now.
    ///
    /// At most `max_substeps` are returned; any time beyond that is dropped instead of
    /// snowballing into ever longer frames.
    pub fn advance(&mut self, frame_dt: f32) -> u32 {
        let usable = |t: f32| t.is_finite() && t > 0.0;
        if !usable(frame_dt) || !usable(self.step) {
            return 0;
        }
        self.accumulator += frame_dt;

        let mut steps = 0;
        while self.accumulator + STEP_EPSILON >= self.step && steps < self.max_substeps {
            self.accumulator -= self.step;
            steps += 1;
        }

        if self.accumulator >= self.step {
            trace!(
                "stepper: dropping {:.4}s after {steps} substeps",
                self.accumulator
            );
            self.accumulator = 0.0;
        }
        self.accumulator = self.accumulator.max(0.0);
        steps
    }
}

/// What one [`FrameSynchronizer::run`] did.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameReport {
    pub substeps: u32,
    /// Kinematic bodies moved to their controller.
    pub held: usize,
    /// Visual nodes moved to their body.
    pub synced: usize,
    /// Released bodies whose visuals wait for a physics step.
    pub deferred: usize,
}

/// Drives one session frame by frame.
#[derive(Clone, Copy, Debug)]
pub struct FrameSynchronizer {
    stepper: FixedStepper,
}

impl FrameSynchronizer {
    pub fn new(config: &SessionConfig) -> Self {
        Self {
            stepper: FixedStepper::new(config.fixed_timestep, config.max_substeps),
        }
    }

    pub fn run<S, P>(&mut self, session: &mut SceneSession<S, P>, frame_dt: f32) -> FrameReport
    where
        S: SceneGraph,
        P: PhysicsWorld,
    {
        let mut report = FrameReport {
            substeps: self.stepper.advance(frame_dt),
            ..FrameReport::default()
        };
        for _ in 0..report.substeps {
            session.physics.step(self.stepper.step());
        }
        if report.substeps > 0 {
            session.pending_step.clear();
        }

        // Held: controller -> tracker -> kinematic body.
        let mut held = HashSet::with_capacity(session.grabs.len());
        for (controller, record) in session.grabs.iter_mut() {
            held.insert(record.body);

            let Some(pose) = session
                .controllers
                .get(controller)
                .and_then(|node| session.scene.world_transform(*node))
            else {
                continue;
            };

            record.tracker.sample(pose.translation, frame_dt);

            if session.physics.mode(record.body) == Some(BodyMode::Kinematic) {
                session.physics.set_pose(record.body, pose.to_body_pose());
                report.held += 1;
            }
        }

        // Free: simulated body -> visual node.
        for entity in &session.entities {
            if held.contains(&entity.body) {
                continue;
            }
            if session.physics.mode(entity.body) == Some(BodyMode::Kinematic) {
                continue;
            }
            if session.pending_step.contains(&entity.body) {
                report.deferred += 1;
                continue;
            }
            let Some(pose) = session.physics.pose(entity.body) else {
                continue;
            };
            if session
                .scene
                .set_world_transform(entity.node, Transform::from_body_pose(&pose))
                .is_ok()
            {
                report.synced += 1;
            }
        }

        report
    }
}
