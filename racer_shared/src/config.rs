//! Configuration system.
//!
//! Loads game configuration from JSON strings/files. Every field has a
//! default, so a partial file only overrides what it names.

use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::math::Vec3;

/// What the refill timer does once it crosses its threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefillPolicy {
    /// Timer keeps running; fuel refills on every tick after the first crossing.
    #[default]
    Continuous,
    /// Timer resets on each crossing; fuel refills once per threshold interval.
    Metered,
}

/// How drive and brake combine when both are held.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DriveBrakeArbitration {
    /// Both impulses are applied.
    #[default]
    Additive,
    /// Brake suppresses the drive impulse.
    BrakeWins,
}

/// Player ship tunables. Read-only once the ship is constructed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ShipTuning {
    /// Movement input scale while driving; braking uses half of it, negated.
    pub drive_speed: f32,
    /// Boost acceleration; the applied force is this times the body mass.
    pub boost_power: f32,
    pub angular_damping: f32,
    pub linear_damping: f32,
    pub max_fuel: f32,
    /// Fuel burned per tick while boosting.
    pub boost_drain_per_tick: f32,
    /// Refill timer advance per tick while not boosting.
    pub refill_timer_step: f32,
    pub refill_threshold: f32,
    /// Fuel regained per refilling tick.
    pub refill_fuel_step: f32,
    pub refill_policy: RefillPolicy,
    pub drive_brake: DriveBrakeArbitration,
    pub start_ammo: u32,
    /// Ground probe length, straight down from the ship.
    pub hover_probe_length: f32,
    /// Upward hover acceleration; the applied force is this times the mass.
    pub hover_force: f32,
    /// Distance ahead of the ship where projectiles appear.
    pub muzzle_offset: f32,
    /// Turn smoothing speed, per second.
    pub turn_interp_speed: f32,
    /// Yaw applied per turn input at full turn rate, in degrees.
    pub turn_step_degrees: f32,
}

impl Default for ShipTuning {
    fn default() -> Self {
        Self {
            drive_speed: 1.0,
            boost_power: 2000.0,
            angular_damping: 5.0,
            linear_damping: 3.0,
            max_fuel: 5.0,
            boost_drain_per_tick: 0.05,
            refill_timer_step: 0.01,
            refill_threshold: 1.0,
            refill_fuel_step: 0.01,
            refill_policy: RefillPolicy::Continuous,
            drive_brake: DriveBrakeArbitration::Additive,
            start_ammo: 10,
            hover_probe_length: 100.0,
            hover_force: 800.0,
            muzzle_offset: 400.0,
            turn_interp_speed: 1.0,
            turn_step_degrees: 3.0,
        }
    }
}

/// Enemy ship tunables.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EnemyTuning {
    pub sensing_radius: f32,
    pub acceptance_radius: f32,
    pub max_acceleration: f32,
    pub max_speed: f32,
    /// `true` selects floating pursuit, `false` hands the chase to the AI controller.
    pub floating: bool,
}

impl Default for EnemyTuning {
    fn default() -> Self {
        Self {
            sensing_radius: 650.0,
            acceptance_radius: 100.0,
            max_acceleration: 2000.0,
            max_speed: 5000.0,
            floating: false,
        }
    }
}

/// Root configuration for a race session.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Fixed simulation tick rate.
    pub tick_hz: u32,
    pub player_name: String,
    pub ship: ShipTuning,
    pub enemy: EnemyTuning,
    /// Whole seconds counted down before the player may act. Zero starts immediately.
    pub countdown_seconds: u32,
    /// Height of the static ground plane.
    pub ground_height: f32,
    /// Where the player ship starts.
    pub player_start: Vec3,
    pub enemy_spawns: Vec<Vec3>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            tick_hz: 60,
            player_name: "Player".to_string(),
            ship: ShipTuning::default(),
            enemy: EnemyTuning::default(),
            countdown_seconds: 3,
            ground_height: 0.0,
            player_start: Vec3::new(0.0, 0.0, 50.0),
            enemy_spawns: Vec::new(),
        }
    }
}

impl GameConfig {
    /// Parses config from JSON.
    pub fn from_json_str(s: &str) -> serde_json::Result<Self> {
        serde_json::from_str(s)
    }

    /// Reads and parses a JSON config file.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read config {}", path.display()))?;
        Self::from_json_str(&text).with_context(|| format!("parse config {}", path.display()))
    }

    /// Simulation step length in seconds.
    pub fn tick_dt(&self) -> f32 {
        1.0 / self.tick_hz.max(1) as f32
    }
}
