//! Host capability contracts.
//!
//! Gameplay code never owns the physics body, the world or the spawner.
//! The host hands them in per call through [`ShipContext`], so every
//! request (force, spawn, trace) stays a request against a host-owned
//! resource.

use serde::{Deserialize, Serialize};

use crate::{
    ecs::EntityId,
    math::{Rotator, Vec3},
};

bitflags::bitflags! {
    /// Object types a line trace may hit.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ObjectChannels: u32 {
        const WORLD_STATIC = 1 << 0;
        const WORLD_DYNAMIC = 1 << 1;
        const PAWN = 1 << 2;
        const PROJECTILE = 1 << 3;
    }
}

/// World transform of an actor.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Transform {
    pub location: Vec3,
    pub rotation: Rotator,
}

impl Transform {
    pub fn new(location: Vec3, rotation: Rotator) -> Self {
        Self { location, rotation }
    }

    pub fn forward(&self) -> Vec3 {
        self.rotation.forward()
    }

    pub fn right(&self) -> Vec3 {
        self.rotation.right()
    }

    pub fn up(&self) -> Vec3 {
        self.rotation.up()
    }
}

/// A simulated rigid body owned by the host.
pub trait PhysicsBody {
    /// Adds a continuous force for the current step.
    fn add_force(&mut self, force: Vec3);
    /// Requests movement along `direction`, scaled by `scale`; consumed by
    /// the host's movement component on its next integration.
    fn add_movement_input(&mut self, direction: Vec3, scale: f32);
    fn set_angular_damping(&mut self, damping: f32);
    fn set_linear_damping(&mut self, damping: f32);
    /// Rotates the body about its local up axis.
    fn add_relative_yaw(&mut self, degrees: f32);
    fn mass(&self) -> f32;
    fn transform(&self) -> Transform;
}

/// Read-only queries against world geometry.
pub trait WorldQuery {
    /// Returns true if the segment `start..end` hits anything in `channels`.
    fn line_trace(&self, start: Vec3, end: Vec3, channels: ObjectChannels) -> bool;
}

/// Kinds of actor gameplay code may ask the host to spawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActorClass {
    Projectile,
    EnemyShip,
}

/// Handle to a host-spawned actor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ActorHandle(pub EntityId);

/// Actor spawning.
pub trait ActorFactory {
    /// Returns `None` if the host refused the spawn.
    fn spawn(&mut self, class: ActorClass, location: Vec3, rotation: Rotator)
        -> Option<ActorHandle>;
}

/// Navigation requests for AI-driven pawns.
pub trait AiController {
    /// Starts moving toward `target`, stopping within `acceptance_radius`.
    fn move_to_actor(&mut self, target: ActorHandle, acceptance_radius: f32);
}

/// Borrowed host resources for one callback.
pub struct ShipContext<'a> {
    pub body: &'a mut dyn PhysicsBody,
    pub world: &'a dyn WorldQuery,
    pub spawner: &'a mut dyn ActorFactory,
}

/// No-op world: nothing is ever hit.
#[derive(Default)]
pub struct NullWorld;

impl WorldQuery for NullWorld {
    fn line_trace(&self, _start: Vec3, _end: Vec3, _channels: ObjectChannels) -> bool {
        false
    }
}

/// Factory that refuses every spawn.
#[derive(Default)]
pub struct NullFactory;

impl ActorFactory for NullFactory {
    fn spawn(&mut self, _class: ActorClass, _location: Vec3, _rotation: Rotator) -> Option<ActorHandle> {
        None
    }
}
