use std::time::Duration;

use crate::{
    rng::DeterministicRng,
    scene::{Scene, SceneContext, SceneId, SceneInput},
    scheduler::Scheduler,
};

use super::{answer_matches, shake};

pub const WRONG_PASSWORD: &str = "That is not quite right.";
pub const SNOWFLAKES_PER_HINT: usize = 24;

const PANEL: &str = "password-panel";
const ERROR: &str = "password-error";

/// Entry gate. The right phrase leads to the intro; hints make it snow.
pub struct PasswordScene {
    rng: Box<dyn DeterministicRng>,
    melt: Scheduler<usize>,
    next_flake: usize,
}

impl PasswordScene {
    pub fn new(rng: Box<dyn DeterministicRng>) -> Self {
        Self {
            rng,
            melt: Scheduler::new(),
            next_flake: 0,
        }
    }

    fn submit(&mut self, value: &str, ctx: &mut SceneContext<'_>) {
        if answer_matches(value, &ctx.config().unlock.password) {
            ctx.go_to(SceneId::Intro);
            return;
        }
        ctx.record_attempt();
        ctx.view.set_text(ERROR, WRONG_PASSWORD);
        shake(ctx.view, PANEL);
        tracing::debug!(attempts = ctx.progress().attempts, "wrong password");
    }

    fn snow(&mut self, ctx: &mut SceneContext<'_>) {
        let now = ctx.now();
        for _ in 0..SNOWFLAKES_PER_HINT {
            let id = self.next_flake;
            self.next_flake += 1;

            let left = self.rng.next_range(0.0, 100.0);
            let delay = self.rng.next_range(0.0, 0.8);
            let duration = self.rng.next_range(2.8, 5.0);
            let opacity = self.rng.next_range(0.5, 1.0);

            let target = format!("snowflake-{id}");
            ctx.view.set_text(&target, "❄");
            ctx.view.set_prop(&target, "left_vw", left as f32);
            ctx.view.set_prop(&target, "delay_s", delay as f32);
            ctx.view.set_prop(&target, "duration_s", duration as f32);
            ctx.view.set_prop(&target, "opacity", opacity as f32);
            self.melt
                .schedule_after(now, Duration::from_secs_f64(delay + duration), id);
        }
        let hint = ctx.config().unlock.hint.clone();
        ctx.view.set_text(ERROR, hint);
    }
}

impl Scene for PasswordScene {
    fn id(&self) -> SceneId {
        SceneId::Password
    }

    fn mount(&mut self, ctx: &mut SceneContext<'_>) {
        ctx.view.set_text("password-title", "Welcome, love");
        ctx.view.set_text("password-prompt", "Enter the password to begin.");
        ctx.view.set_text(ERROR, "");
        ctx.view.set_class(PANEL, "panel", true);
    }

    fn tick(&mut self, ctx: &mut SceneContext<'_>) {
        for fired in self.melt.poll(ctx.now()) {
            ctx.view.remove(&format!("snowflake-{}", fired.event));
        }
    }

    fn handle(&mut self, input: &SceneInput, ctx: &mut SceneContext<'_>) {
        match input {
            SceneInput::Submit(value) => self.submit(value, ctx),
            SceneInput::Hint => self.snow(ctx),
            _ => {}
        }
    }

    fn unmount(&mut self) {
        self.melt.cancel_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        assets::MemoryAssets, rng::StdDeterministicRng, scenes::testing::Harness,
    };

    fn scene() -> PasswordScene {
        PasswordScene::new(Box::new(StdDeterministicRng::seeded(3)))
    }

    #[test]
    fn right_phrase_opens_the_intro() {
        let mut harness = Harness::new(MemoryAssets::new());
        let mut gate = scene();
        harness.run(Duration::ZERO, |ctx| gate.mount(ctx));

        let next = harness.run(Duration::ZERO, |ctx| {
            gate.handle(&SceneInput::Submit(" SNOWFLAKE ".into()), ctx)
        });
        assert_eq!(next, Some(SceneId::Intro));
        assert_eq!(harness.progress.snapshot().attempts, 0);
    }

    #[test]
    fn wrong_phrase_counts_and_shakes() {
        let mut harness = Harness::new(MemoryAssets::new());
        let mut gate = scene();
        harness.run(Duration::ZERO, |ctx| gate.mount(ctx));

        for _ in 0..2 {
            let next = harness.run(Duration::ZERO, |ctx| {
                gate.handle(&SceneInput::Submit("sunshine".into()), ctx)
            });
            assert_eq!(next, None);
        }
        assert_eq!(harness.progress.snapshot().attempts, 2);
        assert_eq!(harness.view.text(ERROR), Some(WRONG_PASSWORD));
        assert!(harness.view.has_class(PANEL, "shake"));
    }

    #[test]
    fn hint_snows_and_the_flakes_melt() {
        let mut harness = Harness::new(MemoryAssets::new());
        let mut gate = scene();
        harness.run(Duration::ZERO, |ctx| gate.mount(ctx));
        harness.run(Duration::ZERO, |ctx| gate.handle(&SceneInput::Hint, ctx));

        assert_eq!(
            harness.view.targets_with_prefix("snowflake-").count(),
            SNOWFLAKES_PER_HINT
        );
        assert_eq!(
            harness.view.text(ERROR),
            Some("Think cozy, quiet, and winter.")
        );
        for target in harness.view.targets_with_prefix("snowflake-") {
            let opacity = harness.view.prop(target, "opacity").unwrap();
            assert!((0.5..=1.0).contains(&opacity));
        }

        harness.run(Duration::from_secs(6), |ctx| gate.tick(ctx));
        assert_eq!(harness.view.targets_with_prefix("snowflake-").count(), 0);
    }
}
