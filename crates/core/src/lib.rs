//! Core library for the Keepsake experience.
//!
//! A visitor walks through a fixed sequence of scenes: a password gate, an
//! intro clip, a greeting card, a karaoke song over a photo slideshow, an
//! envelope, a long reveal page with a photo puzzle and a scripted finale, a
//! final gate with hidden clues, and the gift. Progress survives reloads.
//!
//! Everything runs on one thread. The host owns the clock and drives the
//! [`SceneRouter`] with explicit `tick(now)` calls and user input; scenes
//! write into a [`RenderGraph`] that the host draws however it likes.

pub mod animation;
pub mod assets;
pub mod config;
pub mod error;
pub mod interactions;
pub mod lyrics;
pub mod progress;
pub mod puzzle;
pub mod render;
pub mod reveal;
pub mod rng;
pub mod router;
pub mod scene;
pub mod scenes;
pub mod scheduler;
pub mod slideshow;
pub mod timeline;

pub use animation::{make_animator, Animator, InstantAnimator, TweenAnimator};
pub use assets::{AssetSource, DirectoryAssets, IdentityResolver, MediaMap, MediaResolver};
pub use config::{AnimationBackend, AppConfig};
pub use error::{KeepsakeError, Result};
pub use lyrics::{LyricSync, SyncUpdate};
pub use progress::{FileStorage, MemoryStorage, ProgressRecord, ProgressStore, StorageBackend};
pub use puzzle::{Puzzle, TapOutcome};
pub use render::RenderGraph;
pub use reveal::{RevealEvent, RevealSequencer};
pub use rng::{DeterministicRng, RngFactory, StdDeterministicRng};
pub use router::{SceneRegistry, SceneRouter};
pub use scene::{Scene, SceneContext, SceneEnv, SceneId, SceneInput};
pub use scheduler::{Latch, Scheduler, TimerId};
pub use slideshow::MediaRotator;
pub use timeline::{PlaybackClock, PlaybackSource, Timeline};
