//! Save-game records.

use std::path::Path;

use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    host::Transform,
    math::{Rotator, Vec3},
};

/// Where the player was when the game was saved.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PlayerStats {
    pub location: Vec3,
    pub rotation: Rotator,
}

impl From<Transform> for PlayerStats {
    fn from(t: Transform) -> Self {
        Self {
            location: t.location,
            rotation: t.rotation,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveGame {
    pub player_name: String,
    pub player_index: u32,
    pub stats: PlayerStats,
    pub saved_at: DateTime<Utc>,
}

impl SaveGame {
    pub fn new(player_name: &str, player_index: u32, stats: PlayerStats) -> Self {
        Self {
            player_name: player_name.to_string(),
            player_index,
            stats,
            saved_at: Utc::now(),
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(s: &str) -> serde_json::Result<Self> {
        serde_json::from_str(s)
    }

    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        let json = self.to_json().context("serialize save game")?;
        std::fs::write(path, json).with_context(|| format!("write save {}", path.display()))
    }

    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read save {}", path.display()))?;
        Self::from_json(&text).with_context(|| format!("parse save {}", path.display()))
    }
}
