//! Race start countdown.
//!
//! Counts whole seconds down to zero, lighting one start light per elapsed
//! second, then reports [`CountdownEvent::Finished`]. The host keeps the
//! player frozen until that event.

use tracing::{debug, info};

/// What a countdown step produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountdownEvent {
    /// A second elapsed; `remaining` seconds are left.
    Advanced { remaining: u32 },
    Finished,
}

#[derive(Debug, Clone)]
pub struct Countdown {
    remaining: u32,
    elapsed: f32,
    lights: Vec<bool>,
    finished: bool,
}

impl Countdown {
    /// A zero-second countdown is finished from the start.
    pub fn new(seconds: u32) -> Self {
        Self {
            remaining: seconds,
            elapsed: 0.0,
            lights: vec![false; seconds as usize],
            finished: seconds == 0,
        }
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Start lights, lit left to right.
    pub fn lights(&self) -> &[bool] {
        &self.lights
    }

    pub fn display_text(&self) -> String {
        if self.finished {
            "GO!".to_string()
        } else {
            self.remaining.to_string()
        }
    }

    /// Advances by `dt` seconds. When several seconds elapse in one call the
    /// latest event wins.
    pub fn tick(&mut self, dt: f32) -> Option<CountdownEvent> {
        if self.finished {
            return None;
        }
        self.elapsed += dt;
        let mut event = None;
        while self.elapsed >= 1.0 && !self.finished {
            self.elapsed -= 1.0;
            event = Some(self.advance());
        }
        event
    }

    fn advance(&mut self) -> CountdownEvent {
        let lit = self.lights.len() - self.remaining as usize;
        if let Some(light) = self.lights.get_mut(lit) {
            *light = true;
        }
        self.remaining -= 1;
        if self.remaining == 0 {
            self.finished = true;
            info!("countdown finished");
            CountdownEvent::Finished
        } else {
            debug!(remaining = self.remaining, "countdown");
            CountdownEvent::Advanced {
                remaining: self.remaining,
            }
        }
    }
}
