//! The screens of the experience, in the order a visitor meets them.
//!
//! Scenes write into the [`RenderGraph`](crate::render::RenderGraph) through
//! their context and own every timer they arm; each one tears its timers
//! down in `unmount`.

mod card;
mod envelope;
mod final_gate;
mod gift;
mod intro;
mod password;
mod reveal;
mod song;

pub use card::CardOpenScene;
pub use envelope::EnvelopeScene;
pub use final_gate::FinalScene;
pub use gift::GiftScene;
pub use intro::IntroScene;
pub use password::PasswordScene;
pub use reveal::RevealScene;
pub use song::SongScene;

use crate::render::RenderGraph;

/// Gate answers compare trimmed and case-insensitively.
pub fn answer_matches(input: &str, expected: &str) -> bool {
    input.trim().to_lowercase() == expected.trim().to_lowercase()
}

/// Restarts the shake animation on `panel`.
fn shake(view: &mut RenderGraph, panel: &str) {
    let shakes = view.prop(panel, "shakes").unwrap_or(0.0);
    view.set_prop(panel, "shakes", shakes + 1.0);
    view.set_class(panel, "shake", true);
}

/// Removes every node under `prefix`.
fn clear_prefixed(view: &mut RenderGraph, prefix: &str) {
    let stale: Vec<String> = view
        .targets_with_prefix(prefix)
        .map(str::to_string)
        .collect();
    for target in stale {
        view.remove(&target);
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::{rc::Rc, time::Duration};

    use crate::{
        assets::{IdentityResolver, MemoryAssets},
        config::{AnimationBackend, AppConfig},
        progress::{MemoryStorage, ProgressStore},
        render::RenderGraph,
        scene::{SceneContext, SceneEnv, SceneId},
    };

    /// Everything a scene needs, without a router.
    pub struct Harness {
        pub env: SceneEnv,
        pub view: RenderGraph,
        pub progress: ProgressStore,
        pub storage: MemoryStorage,
    }

    impl Harness {
        pub fn new(assets: MemoryAssets) -> Self {
            let config = AppConfig {
                animation: AnimationBackend::Instant,
                ..AppConfig::default()
            };
            Self::with_config(config, assets)
        }

        pub fn with_config(config: AppConfig, assets: MemoryAssets) -> Self {
            let storage = MemoryStorage::new();
            Self {
                env: SceneEnv::new(config, Rc::new(assets), Rc::new(IdentityResolver))
                    .with_seed(7),
                view: RenderGraph::new(),
                progress: ProgressStore::open(Box::new(storage.clone()), "test"),
                storage,
            }
        }

        /// Runs `f` with a fresh context and returns the transition it asked for.
        pub fn run(
            &mut self,
            now: Duration,
            f: impl FnOnce(&mut SceneContext<'_>),
        ) -> Option<SceneId> {
            let mut ctx = SceneContext::new(now, &self.env, &mut self.view, &mut self.progress);
            f(&mut ctx);
            ctx.requested()
        }
    }
}
