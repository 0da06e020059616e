//! `racer_shared`
//!
//! Libraries shared by the ship gameplay code and the host.
//!
//! Design goals:
//! - Deterministic where practical.
//! - Gameplay code talks to the host only through the traits in [`host`].
//! - No `unsafe`.

pub mod config;
pub mod console;
pub mod ecs;
pub mod event;
pub mod host;
pub mod math;
pub mod report;
pub mod save;

pub mod prelude {
    //! Commonly used exports.

    pub use crate::config::*;
    pub use crate::ecs::*;
    pub use crate::event::*;
    pub use crate::host::*;
    pub use crate::math::*;
}
