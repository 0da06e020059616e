//! Host-side simulation pieces.
//!
//! A small stand-in for a real physics engine: point-mass
//! bodies with linear damping, a floating movement component, gravity and a
//! single static ground plane.

use racer_shared::{
    ecs::{ComponentStore, Entities, EntityId, Lifespan, Velocity},
    host::{ActorClass, ActorFactory, ActorHandle, ObjectChannels, PhysicsBody, Transform, WorldQuery},
    math::{Rotator, Vec3},
};
use tracing::debug;

pub const GRAVITY: Vec3 = Vec3::new(0.0, 0.0, -980.0);
pub const PLAYER_MASS: f32 = 100.0;
pub const ENEMY_MASS: f32 = 100.0;
pub const PROJECTILE_SPEED: f32 = 3000.0;
/// Seconds a projectile lives before the host removes it.
pub const PROJECTILE_LIFESPAN: f32 = 3.0;

/// Movement component limits.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MovementParams {
    pub max_speed: f32,
    pub acceleration: f32,
}

impl Default for MovementParams {
    fn default() -> Self {
        Self {
            max_speed: 5000.0,
            acceleration: 4000.0,
        }
    }
}

/// Point-mass rigid body with a floating movement component.
#[derive(Debug, Clone)]
pub struct SimBody {
    transform: Transform,
    velocity: Vec3,
    mass: f32,
    angular_damping: f32,
    linear_damping: f32,
    movement: MovementParams,
    pending_force: Vec3,
    pending_input: Vec3,
}

impl SimBody {
    pub fn new(transform: Transform, mass: f32, movement: MovementParams) -> Self {
        Self {
            transform,
            velocity: Vec3::ZERO,
            mass,
            angular_damping: 0.0,
            linear_damping: 0.0,
            movement,
            pending_force: Vec3::ZERO,
            pending_input: Vec3::ZERO,
        }
    }

    pub fn velocity(&self) -> Vec3 {
        self.velocity
    }

    pub fn angular_damping(&self) -> f32 {
        self.angular_damping
    }

    pub fn linear_damping(&self) -> f32 {
        self.linear_damping
    }

    pub fn set_transform(&mut self, transform: Transform) {
        self.transform = transform;
        self.velocity = Vec3::ZERO;
    }

    /// Drops all velocity and any movement input queued this frame.
    pub fn halt(&mut self) {
        self.velocity = Vec3::ZERO;
        self.pending_input = Vec3::ZERO;
    }

    /// Force accumulated since the last integration.
    pub fn pending_force(&self) -> Vec3 {
        self.pending_force
    }

    /// Applies accumulated force and movement input over `dt`, then clears them.
    pub fn integrate(&mut self, dt: f32, ground_height: f32) {
        let input = self.pending_input.clamp_len(1.0);
        let accel = self.pending_force * (1.0 / self.mass) + GRAVITY;

        let mut velocity = self.velocity + input * (self.movement.acceleration * dt) + accel * dt;
        velocity = velocity * (1.0 / (1.0 + self.linear_damping * dt));
        velocity = velocity.clamp_len(self.movement.max_speed);

        let mut location = self.transform.location + velocity * dt;
        if location.z < ground_height {
            location.z = ground_height;
            velocity.z = velocity.z.max(0.0);
        }

        self.transform.location = location;
        self.velocity = velocity;
        self.pending_force = Vec3::ZERO;
        self.pending_input = Vec3::ZERO;
    }
}

impl PhysicsBody for SimBody {
    fn add_force(&mut self, force: Vec3) {
        self.pending_force += force;
    }

    fn add_movement_input(&mut self, direction: Vec3, scale: f32) {
        self.pending_input += direction * scale;
    }

    fn set_angular_damping(&mut self, damping: f32) {
        self.angular_damping = damping;
    }

    fn set_linear_damping(&mut self, damping: f32) {
        self.linear_damping = damping;
    }

    fn add_relative_yaw(&mut self, degrees: f32) {
        self.transform.rotation.add_yaw(degrees);
    }

    fn mass(&self) -> f32 {
        self.mass
    }

    fn transform(&self) -> Transform {
        self.transform
    }
}

/// Infinite static ground plane.
#[derive(Debug, Clone, Copy)]
pub struct FlatGround {
    pub height: f32,
}

impl WorldQuery for FlatGround {
    fn line_trace(&self, start: Vec3, end: Vec3, channels: ObjectChannels) -> bool {
        channels.contains(ObjectChannels::WORLD_STATIC)
            && (start.z - self.height) * (end.z - self.height) <= 0.0
    }
}

/// Spawned actors and their components.
#[derive(Debug, Default)]
pub struct ActorWorld {
    pub entities: Entities,
    pub classes: ComponentStore<ActorClass>,
    pub transforms: ComponentStore<Transform>,
    pub velocities: ComponentStore<Velocity>,
    pub lifespans: ComponentStore<Lifespan>,
}

impl ActorWorld {
    /// Allocates an id for an actor whose state lives outside this world,
    /// such as the player ship.
    pub fn reserve(&mut self) -> ActorHandle {
        ActorHandle(self.entities.spawn())
    }

    pub fn count(&self, class: ActorClass) -> usize {
        self.classes.iter().filter(|(_, c)| **c == class).count()
    }

    pub fn transform(&self, entity: EntityId) -> Option<Transform> {
        self.transforms.get(entity).copied()
    }

    /// Overwrites the stored transform of an actor the host moves itself.
    pub fn sync_transform(&mut self, entity: EntityId, transform: Transform) {
        if let Some(t) = self.transforms.get_mut(entity) {
            *t = transform;
        }
    }

    pub fn despawn(&mut self, entity: EntityId) {
        self.entities.despawn(entity);
        self.classes.remove(entity);
        self.transforms.remove(entity);
        self.velocities.remove(entity);
        self.lifespans.remove(entity);
    }

    /// Moves projectiles and removes expired ones.
    pub fn advance_projectiles(&mut self, dt: f32) {
        for (id, velocity) in self.velocities.iter() {
            if let Some(t) = self.transforms.get_mut(id) {
                t.location += velocity.0 * dt;
            }
        }

        let mut expired = Vec::new();
        for (id, life) in self.lifespans.iter_mut() {
            life.0 -= dt;
            if life.0 <= 0.0 {
                expired.push(*id);
            }
        }
        for id in expired {
            debug!(entity = ?id, "projectile expired");
            self.despawn(id);
        }
    }
}

impl ActorFactory for ActorWorld {
    fn spawn(&mut self, class: ActorClass, location: Vec3, rotation: Rotator) -> Option<ActorHandle> {
        let id = self.entities.spawn();
        self.classes.insert(id, class);
        self.transforms.insert(id, Transform::new(location, rotation));
        if class == ActorClass::Projectile {
            self.velocities.insert(id, Velocity(rotation.forward() * PROJECTILE_SPEED));
            self.lifespans.insert(id, Lifespan(PROJECTILE_LIFESPAN));
        }
        debug!(entity = ?id, ?class, ?location, "spawned actor");
        Some(ActorHandle(id))
    }
}
