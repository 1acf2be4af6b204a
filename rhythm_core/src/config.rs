use std::{fs, path::Path, time::Duration};

use anyhow::Context;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::chart::LaneMode;
use crate::gameplay::game_loop::LoopSettings;
use crate::gameplay::judge::HitSelection;
use crate::gameplay::state::Difficulty;
use crate::gameplay::zones::{ScoreTable, ZoneLayout};

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    #[error("zone band {index} has non-positive height {height}")]
    BandHeight { index: usize, height: f64 },
    #[error("early and late zone bands must mirror each other")]
    AsymmetricZones,
    #[error("zone stack [{start}, {end}] extends past the arena end {end_y}")]
    ZonesPastArena { start: f64, end: f64, end_y: f64 },
    #[error("spawn_y {spawn_y} must be above the zone stack start {start}")]
    SpawnInsideZones { spawn_y: f64, start: f64 },
    #[error("max_frame_delta_s must be positive, got {0}")]
    FrameDelta(f64),
    #[error("frame_interval_ms must be at least 1")]
    FrameInterval,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub lane_mode: LaneMode,
    pub difficulty: Difficulty,
    pub zones: ZoneLayout,
    pub scores: ScoreTable,
    #[serde(flatten)]
    pub loop_settings: LoopSettings,
    pub hit_selection: HitSelection,
    /// Frame period of the real-time scheduler.
    pub frame_interval_ms: u64,
}

impl Default for GameConfig {
    fn default() -> Self {
        let zones = ZoneLayout::default();
        Self {
            lane_mode: LaneMode::Four,
            difficulty: Difficulty::Normal,
            zones,
            scores: ScoreTable::default(),
            loop_settings: LoopSettings {
                end_y: zones.end(),
                ..LoopSettings::default()
            },
            hit_selection: HitSelection::FirstMatch,
            frame_interval_ms: 16,
        }
    }
}

impl GameConfig {
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read config: {}", path.display()))?;
        let config = Self::from_json_str(&text)
            .with_context(|| format!("invalid config: {}", path.display()))?;
        Ok(config)
    }

    pub fn from_json_str(json: &str) -> anyhow::Result<Self> {
        let config: Self = serde_json::from_str(json).context("failed to parse config json")?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (index, &height) in self.zones.heights.iter().enumerate() {
            if !(height > 0.0) {
                return Err(ConfigError::BandHeight { index, height });
            }
        }
        if !self.zones.is_symmetric() {
            return Err(ConfigError::AsymmetricZones);
        }
        if self.zones.end() > self.loop_settings.end_y {
            return Err(ConfigError::ZonesPastArena {
                start: self.zones.start,
                end: self.zones.end(),
                end_y: self.loop_settings.end_y,
            });
        }
        if self.loop_settings.spawn_y >= self.zones.start {
            return Err(ConfigError::SpawnInsideZones {
                spawn_y: self.loop_settings.spawn_y,
                start: self.zones.start,
            });
        }
        if !(self.loop_settings.max_frame_delta_s > 0.0) {
            return Err(ConfigError::FrameDelta(self.loop_settings.max_frame_delta_s));
        }
        if self.frame_interval_ms == 0 {
            return Err(ConfigError::FrameInterval);
        }
        Ok(())
    }

    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.frame_interval_ms)
    }
}
