//! Scene state machine.
//!
//! The router owns the mounted scene, the render graph and the progress
//! store. Scenes ask for transitions through their context; the router
//! applies them once the scene callback has returned, so a scene is never
//! unmounted from inside its own callback.

use std::{collections::HashMap, time::Duration};

use crate::{
    progress::ProgressStore,
    render::RenderGraph,
    reveal::RevealSequencer,
    scene::{Scene, SceneContext, SceneEnv, SceneId, SceneInput},
    scenes::{
        CardOpenScene, EnvelopeScene, FinalScene, GiftScene, IntroScene, PasswordScene,
        RevealScene, SongScene,
    },
};

/// Upper bound on transitions chained from a single callback.
const MAX_CHAINED_TRANSITIONS: usize = 16;

pub type SceneFactory = Box<dyn Fn(&SceneEnv) -> Box<dyn Scene>>;

/// Builds scenes by id.
#[derive(Default)]
pub struct SceneRegistry {
    factories: HashMap<SceneId, SceneFactory>,
}

impl SceneRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every scene of the experience.
    pub fn standard() -> Self {
        let mut registry = Self::new();
        registry.register(SceneId::Password, |env| {
            Box::new(PasswordScene::new(env.rng()))
        });
        registry.register(SceneId::Intro, |_| Box::new(IntroScene::new()));
        registry.register(SceneId::CardOpen, |env| {
            Box::new(CardOpenScene::new(env.animator()))
        });
        registry.register(SceneId::Song, |env| {
            Box::new(SongScene::new(env.animator(), env.playback()))
        });
        registry.register(SceneId::Envelope, |_| Box::new(EnvelopeScene::new()));
        registry.register(SceneId::Reveal, |env| {
            let sequencer = RevealSequencer::new(env.config.reveal.clone(), env.rng());
            Box::new(RevealScene::new(env.rng(), sequencer))
        });
        registry.register(SceneId::Final, |env| {
            Box::new(FinalScene::new(env.animator()))
        });
        registry.register(SceneId::Gift, |_| Box::new(GiftScene::new()));
        registry
    }

    pub fn register<F>(&mut self, id: SceneId, factory: F)
    where
        F: Fn(&SceneEnv) -> Box<dyn Scene> + 'static,
    {
        self.factories.insert(id, Box::new(factory));
    }

    pub fn contains(&self, id: SceneId) -> bool {
        self.factories.contains_key(&id)
    }

    /// Builds `id`, falling back to the default scene when it is unknown.
    pub fn build(&self, id: SceneId, env: &SceneEnv) -> Option<(SceneId, Box<dyn Scene>)> {
        if let Some(factory) = self.factories.get(&id) {
            return Some((id, factory(env)));
        }
        let fallback = SceneId::default();
        tracing::warn!(scene = %id, %fallback, "no factory for scene; using the default");
        self.factories
            .get(&fallback)
            .map(|factory| (fallback, factory(env)))
    }
}

impl std::fmt::Debug for SceneRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut ids: Vec<&str> = self.factories.keys().map(|id| id.as_str()).collect();
        ids.sort_unstable();
        f.debug_struct("SceneRegistry").field("scenes", &ids).finish()
    }
}

pub struct SceneRouter {
    env: SceneEnv,
    registry: SceneRegistry,
    progress: ProgressStore,
    view: RenderGraph,
    mounted: Option<Box<dyn Scene>>,
    current: SceneId,
    now: Duration,
}

impl SceneRouter {
    pub fn new(env: SceneEnv, registry: SceneRegistry, progress: ProgressStore) -> Self {
        let current = progress.scene();
        Self {
            env,
            registry,
            progress,
            view: RenderGraph::new(),
            mounted: None,
            current,
            now: Duration::ZERO,
        }
    }

    /// Mounts the persisted scene (or the default one on a first visit).
    pub fn start(&mut self, now: Duration) {
        self.now = now;
        let initial = self.progress.scene();
        tracing::info!(scene = %initial, "starting experience");
        self.transition(initial);
    }

    /// Moves to `scene` immediately.
    pub fn go_to(&mut self, scene: SceneId) {
        self.transition(scene);
    }

    /// Clears progress and returns to the first gate.
    pub fn reset(&mut self) {
        self.progress.reset();
        self.transition(SceneId::default());
    }

    /// Advances the mounted scene to `now`.
    pub fn tick(&mut self, now: Duration) {
        self.now = self.now.max(now);
        let request = self.with_scene(|scene, ctx| scene.tick(ctx));
        self.follow(request);
    }

    pub fn dispatch(&mut self, input: SceneInput) {
        tracing::debug!(scene = %self.current, ?input, "input");
        let request = self.with_scene(|scene, ctx| scene.handle(&input, ctx));
        self.follow(request);
    }

    /// Tears down the mounted scene. Safe to call repeatedly.
    pub fn unmount_current(&mut self) {
        if let Some(mut scene) = self.mounted.take() {
            scene.unmount();
            tracing::debug!(scene = %scene.id(), "unmounted");
        }
    }

    pub fn current(&self) -> SceneId {
        self.current
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted.is_some()
    }

    pub fn is_finished(&self) -> bool {
        self.mounted.is_some() && self.current.is_terminal()
    }

    pub fn view(&self) -> &RenderGraph {
        &self.view
    }

    pub fn progress(&self) -> &ProgressStore {
        &self.progress
    }

    pub fn env(&self) -> &SceneEnv {
        &self.env
    }

    pub fn scroll_locked(&self) -> bool {
        self.view.scroll_locked()
    }

    pub fn now(&self) -> Duration {
        self.now
    }

    fn with_scene<F>(&mut self, f: F) -> Option<SceneId>
    where
        F: FnOnce(&mut dyn Scene, &mut SceneContext<'_>),
    {
        let scene = self.mounted.as_mut()?;
        let mut ctx = SceneContext::new(self.now, &self.env, &mut self.view, &mut self.progress);
        f(scene.as_mut(), &mut ctx);
        ctx.take_request()
    }

    fn follow(&mut self, mut request: Option<SceneId>) {
        let mut hops = 0;
        while let Some(target) = request {
            if hops == MAX_CHAINED_TRANSITIONS {
                tracing::warn!(scene = %target, "too many chained transitions; stopping");
                return;
            }
            hops += 1;
            request = self.mount(target);
        }
    }

    fn transition(&mut self, target: SceneId) {
        let request = self.mount(target);
        self.follow(request);
    }

    /// Unmount, persist, reset the view, mount. Returns whatever the new
    /// scene requested while mounting.
    fn mount(&mut self, target: SceneId) -> Option<SceneId> {
        let from = self.current;
        self.unmount_current();

        let Some((id, scene)) = self.registry.build(target, &self.env) else {
            tracing::warn!(scene = %target, "no scene could be built");
            return None;
        };
        self.progress.set_scene(id);
        self.view.clear();
        self.view.set_scroll_locked(id.scroll_locked());
        self.current = id;
        self.mounted = Some(scene);
        tracing::info!(%from, to = %id, "scene transition");

        self.with_scene(|scene, ctx| scene.mount(ctx))
    }
}

impl Drop for SceneRouter {
    fn drop(&mut self) {
        self.unmount_current();
    }
}

impl std::fmt::Debug for SceneRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SceneRouter")
            .field("current", &self.current)
            .field("mounted", &self.mounted.is_some())
            .field("now", &self.now)
            .field("progress", &self.progress)
            .finish()
    }
}
