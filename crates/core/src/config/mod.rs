use std::{path::Path, path::PathBuf, time::Duration};

use serde::{Deserialize, Serialize};

use crate::{interactions::ClueKind, KeepsakeError, Result};

/// Top-level configuration structure for the application.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub unlock: UnlockConfig,
    pub storage: StorageConfig,
    pub assets: AssetConfig,
    pub song: SongConfig,
    pub puzzle: PuzzleConfig,
    pub reveal: RevealConfig,
    pub animation: AnimationBackend,
    pub clues: Vec<ClueConfig>,
}

impl AppConfig {
    /// Reads a JSON configuration file. Missing fields take their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        let config: Self = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.puzzle.size < 2 {
            return Err(KeepsakeError::InvalidPuzzleSize(self.puzzle.size));
        }
        if self.song.frame_interval_ms == 0 {
            return Err(KeepsakeError::InvalidConfig(
                "song.frame_interval_ms must be positive".into(),
            ));
        }
        if self.song.slide_interval_ms == 0 {
            return Err(KeepsakeError::InvalidConfig(
                "song.slide_interval_ms must be positive".into(),
            ));
        }
        if self.reveal.overlay_arm_ms > self.reveal.total_ms {
            return Err(KeepsakeError::InvalidConfig(
                "reveal.overlay_arm_ms must not exceed reveal.total_ms".into(),
            ));
        }
        Ok(())
    }

    /// The clue list, falling back to the built-in trio when none is configured.
    pub fn clue_list(&self) -> Vec<ClueConfig> {
        if self.clues.is_empty() {
            ClueConfig::defaults()
        } else {
            self.clues.clone()
        }
    }
}

/// Phrases that unlock the gate scenes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UnlockConfig {
    pub password: String,
    pub final_answer: String,
    pub hint: String,
}

impl Default for UnlockConfig {
    fn default() -> Self {
        Self {
            password: "snowflake".to_string(),
            final_answer: "rose moon spark".to_string(),
            hint: "Think cozy, quiet, and winter.".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub directory: PathBuf,
    pub key: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from(".keepsake"),
            key: "vday_progress_v1".to_string(),
        }
    }
}

/// Where scenes look for their media and data files.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetConfig {
    pub root: PathBuf,
    pub media_map: String,
    pub lyrics: String,
    pub photos: String,
    pub song_audio: String,
    pub intro_video: String,
}

impl Default for AssetConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            media_map: "data/supabase-media-map.json".to_string(),
            lyrics: "data/lyrics.lrc".to_string(),
            photos: "data/photos.json".to_string(),
            song_audio: "assets/song.mp3".to_string(),
            intro_video: "assets/intro.mp4".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SongConfig {
    /// Playback position (seconds) at which the song scene ends.
    pub end_time_secs: f64,
    /// Length of the simulated track; the clock stops here.
    pub track_duration_secs: f64,
    pub slide_interval_ms: u64,
    pub frame_interval_ms: u64,
    pub line_fade_ms: u64,
    /// Whether the simulated player may start without a user gesture.
    pub autoplay: bool,
}

impl SongConfig {
    pub fn slide_interval(&self) -> Duration {
        Duration::from_millis(self.slide_interval_ms)
    }

    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.frame_interval_ms)
    }

    pub fn line_fade(&self) -> Duration {
        Duration::from_millis(self.line_fade_ms)
    }
}

impl Default for SongConfig {
    fn default() -> Self {
        Self {
            end_time_secs: 174.0,
            track_duration_secs: 180.0,
            slide_interval_ms: 5_200,
            frame_interval_ms: 16,
            line_fade_ms: 700,
            autoplay: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PuzzleConfig {
    pub size: usize,
}

impl Default for PuzzleConfig {
    fn default() -> Self {
        Self { size: 3 }
    }
}

/// Timings of the reveal sequence, all in milliseconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RevealConfig {
    pub total_ms: u64,
    pub lead_ms: u64,
    pub min_erase_interval_ms: u64,
    pub erase_clear_ms: u64,
    pub overlay_arm_ms: u64,
    pub overlay_columns: usize,
    pub settle_ms: u64,
}

impl RevealConfig {
    pub fn total(&self) -> Duration {
        Duration::from_millis(self.total_ms)
    }

    pub fn overlay_arm(&self) -> Duration {
        Duration::from_millis(self.overlay_arm_ms)
    }

    pub fn erase_clear(&self) -> Duration {
        Duration::from_millis(self.erase_clear_ms)
    }

    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }

    /// Gap between two erosion steps for a queue of `queue_len` units.
    pub fn erase_interval(&self, queue_len: usize) -> Duration {
        let budget = self.total_ms.saturating_sub(self.lead_ms);
        let per_unit = budget / queue_len.max(1) as u64;
        Duration::from_millis(per_unit.max(self.min_erase_interval_ms))
    }
}

impl Default for RevealConfig {
    fn default() -> Self {
        Self {
            total_ms: 15_000,
            lead_ms: 1_200,
            min_erase_interval_ms: 55,
            erase_clear_ms: 260,
            overlay_arm_ms: 13_000,
            overlay_columns: 30,
            settle_ms: 250,
        }
    }
}

/// Which animation capability scenes receive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnimationBackend {
    #[default]
    Tween,
    Instant,
}

/// A clue revealed by one of the final scene's interactions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClueConfig {
    pub id: String,
    pub kind: ClueKind,
    pub title: String,
    pub content: String,
}

impl ClueConfig {
    pub fn defaults() -> Vec<Self> {
        vec![
            Self {
                id: "rose".into(),
                kind: ClueKind::Flip,
                title: "First word".into(),
                content: "Red, with thorns, and always on time.".into(),
            },
            Self {
                id: "moon".into(),
                kind: ClueKind::Pocket,
                title: "Second word".into(),
                content: "It watched over our first walk home.".into(),
            },
            Self {
                id: "spark".into(),
                kind: ClueKind::Tear,
                title: "Third word".into(),
                content: "What you started nine years ago.".into(),
            },
        ]
    }
}
