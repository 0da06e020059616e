//! `racer_host`
//!
//! Headless host for the racer gameplay crates:
//! - Fixed timestep simulation loop
//! - Point-mass physics, static ground plane, projectile actors
//! - Start countdown gating player control
//! - Developer console driving input, saves and status

pub mod host;
pub mod sim;

pub use host::GameHost;
