use std::{fmt, rc::Rc, str::FromStr, time::Duration};

use serde::{Deserialize, Serialize};

use crate::{
    animation::{make_animator, Animator},
    assets::{AssetSource, MediaResolver},
    config::AppConfig,
    progress::{ProgressRecord, ProgressStore},
    render::RenderGraph,
    rng::{DeterministicRng, RngFactory},
    timeline::{PlaybackClock, PlaybackSource},
    KeepsakeError,
};

/// Every screen of the experience, in narrative order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SceneId {
    #[default]
    Password,
    Intro,
    CardOpen,
    Song,
    Envelope,
    Reveal,
    Final,
    Gift,
}

impl SceneId {
    pub const ALL: [SceneId; 8] = [
        SceneId::Password,
        SceneId::Intro,
        SceneId::CardOpen,
        SceneId::Song,
        SceneId::Envelope,
        SceneId::Reveal,
        SceneId::Final,
        SceneId::Gift,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SceneId::Password => "password",
            SceneId::Intro => "intro",
            SceneId::CardOpen => "cardopen",
            SceneId::Song => "song",
            SceneId::Envelope => "envelope",
            SceneId::Reveal => "reveal",
            SceneId::Final => "final",
            SceneId::Gift => "gift",
        }
    }

    /// Unknown identifiers map to the default scene.
    pub fn parse_or_default(raw: &str) -> Self {
        raw.parse().unwrap_or_default()
    }

    /// Whether page scrolling is locked while this scene is mounted. The
    /// reveal scene is a long scrolling page; everything else is full-screen.
    pub fn scroll_locked(self) -> bool {
        !matches!(self, SceneId::Reveal)
    }

    /// The scene the experience ends on.
    pub fn is_terminal(self) -> bool {
        matches!(self, SceneId::Gift)
    }
}

impl FromStr for SceneId {
    type Err = KeepsakeError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let wanted = raw.trim();
        SceneId::ALL
            .into_iter()
            .find(|id| id.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| KeepsakeError::UnknownScene(wanted.to_string()))
    }
}

impl fmt::Display for SceneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// User input routed to the mounted scene.
#[derive(Debug, Clone, PartialEq)]
pub enum SceneInput {
    Submit(String),
    Hint,
    /// A tap on the scene's primary surface (cover, envelope, audio overlay).
    Tap,
    TapTile(usize),
    TapClue(String),
    DragClue { id: String, progress: f32 },
    ReleaseClue(String),
    Continue,
    /// The scene's media element reported it played to the end.
    MediaEnded,
}

impl FromStr for SceneInput {
    type Err = KeepsakeError;

    /// Parses the script syntax used by the command line player, e.g.
    /// `submit snowflake`, `tile 4`, `drag spark 0.8`.
    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let raw = raw.trim();
        let (verb, rest) = raw.split_once(char::is_whitespace).unwrap_or((raw, ""));
        let rest = rest.trim();
        let bad = || KeepsakeError::msg(format!("cannot parse input `{raw}`"));

        let input = match verb.to_ascii_lowercase().as_str() {
            "submit" => SceneInput::Submit(rest.to_string()),
            "hint" => SceneInput::Hint,
            "tap" => SceneInput::Tap,
            "tile" => SceneInput::TapTile(rest.parse().map_err(|_| bad())?),
            "clue" if !rest.is_empty() => SceneInput::TapClue(rest.to_string()),
            "drag" => {
                let (id, progress) = rest.split_once(char::is_whitespace).ok_or_else(bad)?;
                SceneInput::DragClue {
                    id: id.to_string(),
                    progress: progress.trim().parse().map_err(|_| bad())?,
                }
            }
            "release" if !rest.is_empty() => SceneInput::ReleaseClue(rest.to_string()),
            "continue" => SceneInput::Continue,
            "ended" => SceneInput::MediaEnded,
            _ => return Err(bad()),
        };
        Ok(input)
    }
}

type PlaybackFactory = Box<dyn Fn(&AppConfig) -> Box<dyn PlaybackSource>>;

/// Collaborators injected into every scene. Built once at startup.
pub struct SceneEnv {
    pub config: Rc<AppConfig>,
    pub assets: Rc<dyn AssetSource>,
    pub resolver: Rc<dyn MediaResolver>,
    rng: RngFactory,
    playback: PlaybackFactory,
}

impl SceneEnv {
    pub fn new(
        config: AppConfig,
        assets: Rc<dyn AssetSource>,
        resolver: Rc<dyn MediaResolver>,
    ) -> Self {
        Self {
            config: Rc::new(config),
            assets,
            resolver,
            rng: RngFactory::new(None),
            playback: Box::new(|config: &AppConfig| {
                Box::new(PlaybackClock::new(
                    config.song.track_duration_secs,
                    config.song.autoplay,
                )) as Box<dyn PlaybackSource>
            }),
        }
    }

    /// Derives every generator from `seed` so runs replay identically.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = RngFactory::new(Some(seed));
        self
    }

    /// Replaces the simulated player.
    pub fn with_playback<F>(mut self, factory: F) -> Self
    where
        F: Fn(&AppConfig) -> Box<dyn PlaybackSource> + 'static,
    {
        self.playback = Box::new(factory);
        self
    }

    pub fn animator(&self) -> Box<dyn Animator> {
        make_animator(self.config.animation)
    }

    pub fn rng(&self) -> Box<dyn DeterministicRng> {
        self.rng.make()
    }

    pub fn playback(&self) -> Box<dyn PlaybackSource> {
        (self.playback)(&self.config)
    }

    pub fn resolve(&self, path: &str) -> String {
        self.resolver.resolve(path)
    }
}

impl fmt::Debug for SceneEnv {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SceneEnv")
            .field("config", &self.config)
            .field("rng", &self.rng)
            .finish()
    }
}

/// What a scene may touch while handling a callback.
pub struct SceneContext<'a> {
    now: Duration,
    pub env: &'a SceneEnv,
    pub view: &'a mut RenderGraph,
    progress: &'a mut ProgressStore,
    next: Option<SceneId>,
}

impl<'a> SceneContext<'a> {
    pub fn new(
        now: Duration,
        env: &'a SceneEnv,
        view: &'a mut RenderGraph,
        progress: &'a mut ProgressStore,
    ) -> Self {
        Self {
            now,
            env,
            view,
            progress,
            next: None,
        }
    }

    pub fn now(&self) -> Duration {
        self.now
    }

    pub fn config(&self) -> &AppConfig {
        &self.env.config
    }

    /// Requests a transition, applied by the router once the current callback
    /// returns. The last request in a callback wins.
    pub fn go_to(&mut self, scene: SceneId) {
        self.next = Some(scene);
    }

    pub fn requested(&self) -> Option<SceneId> {
        self.next
    }

    pub(crate) fn take_request(&mut self) -> Option<SceneId> {
        self.next.take()
    }

    pub fn record_attempt(&mut self) {
        self.progress.record_attempt();
    }

    pub fn mark_clue_found(&mut self, id: &str) {
        self.progress.mark_clue_found(id);
    }

    pub fn progress(&self) -> ProgressRecord {
        self.progress.snapshot()
    }
}

/// A mountable screen.
///
/// The router calls [`Scene::unmount`] exactly once per mounted instance;
/// implementations must cancel every timer they own there.
pub trait Scene {
    fn id(&self) -> SceneId;

    fn mount(&mut self, ctx: &mut SceneContext<'_>);

    /// Called on every host frame while mounted.
    fn tick(&mut self, _ctx: &mut SceneContext<'_>) {}

    fn handle(&mut self, _input: &SceneInput, _ctx: &mut SceneContext<'_>) {}

    fn unmount(&mut self);
}
