//! `racer_ship`
//!
//! Ship gameplay:
//! - Player control loop (drive, brake, boost fuel, hover probe, turning, firing)
//! - Input bindings and events
//! - Enemy ship pursuit
//! - Race start countdown

pub mod countdown;
pub mod enemy;
pub mod input;
pub mod ship;

pub use countdown::{Countdown, CountdownEvent};
pub use enemy::EnemyShip;
pub use input::{Action, InputEvent, InputState};
pub use ship::{ShipControl, ShipState};
