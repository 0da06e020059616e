//! Enemy ship.
//!
//! Idles until the player enters its sensing sphere, then chases. The chase
//! is either handed to the host's AI controller as a single move request, or
//! flown directly as per-tick floating movement input.

use racer_shared::{
    config::EnemyTuning,
    host::{ActorHandle, AiController, PhysicsBody},
    math::Vec3,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EnemyControlScheme {
    AiChase,
    Floating,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EnemyMode {
    Idle,
    Chasing { target: ActorHandle },
}

/// Result of one floating pursuit step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pursuit {
    Holding,
    Steering,
    /// Reached the acceptance radius this frame. The chase is over.
    Arrived,
}

#[derive(Debug, Clone)]
pub struct EnemyShip {
    tuning: EnemyTuning,
    scheme: EnemyControlScheme,
    mode: EnemyMode,
    player_inside: bool,
}

impl EnemyShip {
    pub fn new(tuning: EnemyTuning) -> Self {
        let scheme = if tuning.floating {
            EnemyControlScheme::Floating
        } else {
            EnemyControlScheme::AiChase
        };
        Self {
            tuning,
            scheme,
            mode: EnemyMode::Idle,
            player_inside: false,
        }
    }

    pub fn scheme(&self) -> EnemyControlScheme {
        self.scheme
    }

    pub fn mode(&self) -> EnemyMode {
        self.mode
    }

    /// Feeds the player's position into the sensing sphere. Only the frame
    /// the player enters the sphere counts as an overlap.
    pub fn sense_player(
        &mut self,
        own_location: Vec3,
        player: ActorHandle,
        player_location: Vec3,
        ai: &mut dyn AiController,
    ) {
        let inside = own_location.distance(player_location) <= self.tuning.sensing_radius;
        if inside && !self.player_inside {
            self.on_overlap(player, true, ai);
        }
        self.player_inside = inside;
    }

    /// Something began overlapping the sensing sphere. Non-player actors are ignored.
    pub fn on_overlap(&mut self, other: ActorHandle, is_player: bool, ai: &mut dyn AiController) {
        if !is_player {
            return;
        }
        self.mode = EnemyMode::Chasing { target: other };
        if self.scheme == EnemyControlScheme::AiChase {
            ai.move_to_actor(other, self.tuning.acceptance_radius);
        }
        info!(target = ?other, scheme = ?self.scheme, "enemy moving");
    }

    /// The AI controller finished its move. The enemy idles until the player
    /// enters the sphere again.
    pub fn on_move_completed(&mut self) {
        if let EnemyMode::Chasing { target } = self.mode {
            debug!(?target, "enemy reached target");
        }
        self.mode = EnemyMode::Idle;
    }

    /// Per-frame pursuit. Only the floating scheme steers here.
    pub fn tick(&mut self, body: &mut dyn PhysicsBody, target_location: Option<Vec3>) -> Pursuit {
        let (EnemyControlScheme::Floating, EnemyMode::Chasing { .. }, Some(target)) =
            (self.scheme, self.mode, target_location)
        else {
            return Pursuit::Holding;
        };
        let to_target = (target - body.transform().location).flattened();
        if to_target.len() <= self.tuning.acceptance_radius {
            self.on_move_completed();
            return Pursuit::Arrived;
        }
        body.add_movement_input(to_target.normalize_or_zero(), 1.0);
        Pursuit::Steering
    }
}
