use std::time::Duration;

use crate::{
    animation::{Animator, Ease, Tween},
    scene::{Scene, SceneContext, SceneId, SceneInput},
    scheduler::{Latch, Scheduler},
};

const COVER: &str = "card-cover";
const LETTER: &str = "card-letter";
const BEGIN: &str = "card-begin";

const OPEN_DURATION: Duration = Duration::from_millis(1_600);

const LETTER_PARAGRAPHS: [&str; 4] = [
    "My love,",
    "This Valentine's Day I wanted to give you something a little different. \
     Not just a gift but an experience made just for you. I put this together \
     with you in my heart because you deserve something thoughtful personal and \
     a little magical.",
    "Thank you for being my favorite person my comfort and my chaos all at once. \
     I'm so lucky I get to love you.",
    "Happy Valentine's Day\nYours always",
];

/// Greeting card: tap the cover to swing it open, then begin.
pub struct CardOpenScene {
    animator: Box<dyn Animator>,
    timers: Scheduler<()>,
    opened: Latch,
    inside_shown: bool,
}

impl CardOpenScene {
    pub fn new(animator: Box<dyn Animator>) -> Self {
        Self {
            animator,
            timers: Scheduler::new(),
            opened: Latch::new(),
            inside_shown: false,
        }
    }

    fn open(&mut self, ctx: &mut SceneContext<'_>) {
        if !self.opened.fire() {
            return;
        }
        let now = ctx.now();
        let done = self.animator.play(
            now,
            Tween::new(COVER, "rotate_y", 0.0, -160.0, OPEN_DURATION).ease(Ease::PowerInOut(2)),
        );
        self.animator.apply(now, ctx.view);
        if done <= now {
            self.show_inside(ctx);
        } else {
            self.timers.schedule_at(done, ());
        }
    }

    fn show_inside(&mut self, ctx: &mut SceneContext<'_>) {
        self.inside_shown = true;
        ctx.view.set_class(LETTER, "show", true);
        ctx.view.set_hidden(BEGIN, false);
    }
}

impl Scene for CardOpenScene {
    fn id(&self) -> SceneId {
        SceneId::CardOpen
    }

    fn mount(&mut self, ctx: &mut SceneContext<'_>) {
        ctx.view.set_text("card-front", "Tap to open");
        for (index, paragraph) in LETTER_PARAGRAPHS.iter().enumerate() {
            ctx.view.set_text(&format!("{LETTER}-{index}"), *paragraph);
        }
        ctx.view.set_class(LETTER, "show", false);
        ctx.view.set_text(BEGIN, "Begin");
        ctx.view.set_hidden(BEGIN, true);
    }

    fn tick(&mut self, ctx: &mut SceneContext<'_>) {
        let now = ctx.now();
        self.animator.apply(now, ctx.view);
        if !self.timers.poll(now).is_empty() {
            self.show_inside(ctx);
        }
    }

    fn handle(&mut self, input: &SceneInput, ctx: &mut SceneContext<'_>) {
        match input {
            SceneInput::Tap => self.open(ctx),
            SceneInput::Continue if self.inside_shown => ctx.go_to(SceneId::Song),
            SceneInput::Continue => tracing::debug!("card not open yet; ignoring begin"),
            _ => {}
        }
    }

    fn unmount(&mut self) {
        self.timers.cancel_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        animation::{InstantAnimator, TweenAnimator},
        assets::MemoryAssets,
        scenes::testing::Harness,
    };

    #[test]
    fn cover_swings_open_before_the_inside_shows() {
        let mut harness = Harness::new(MemoryAssets::new());
        let mut card = CardOpenScene::new(Box::new(TweenAnimator::new()));
        harness.run(Duration::ZERO, |ctx| card.mount(ctx));
        assert!(harness.view.is_hidden(BEGIN));

        let t0 = Duration::from_secs(1);
        harness.run(t0, |ctx| card.handle(&SceneInput::Tap, ctx));
        harness.run(t0 + Duration::from_millis(800), |ctx| card.tick(ctx));
        assert!(!harness.view.has_class(LETTER, "show"));
        let early = harness.run(t0 + Duration::from_millis(900), |ctx| {
            card.handle(&SceneInput::Continue, ctx)
        });
        assert_eq!(early, None);

        harness.run(t0 + OPEN_DURATION, |ctx| card.tick(ctx));
        assert!(harness.view.has_class(LETTER, "show"));
        assert!(!harness.view.is_hidden(BEGIN));
        assert_eq!(harness.view.prop(COVER, "rotate_y"), Some(-160.0));

        let next = harness.run(t0 + OPEN_DURATION, |ctx| {
            card.handle(&SceneInput::Continue, ctx)
        });
        assert_eq!(next, Some(SceneId::Song));
    }

    #[test]
    fn instant_backend_opens_synchronously() {
        let mut harness = Harness::new(MemoryAssets::new());
        let mut card = CardOpenScene::new(Box::new(InstantAnimator::new()));
        harness.run(Duration::ZERO, |ctx| card.mount(ctx));
        harness.run(Duration::ZERO, |ctx| card.handle(&SceneInput::Tap, ctx));
        assert!(harness.view.has_class(LETTER, "show"));
        assert_eq!(harness.view.prop(COVER, "rotate_y"), Some(-160.0));
    }

    #[test]
    fn unmount_drops_the_pending_reveal() {
        let mut harness = Harness::new(MemoryAssets::new());
        let mut card = CardOpenScene::new(Box::new(TweenAnimator::new()));
        harness.run(Duration::ZERO, |ctx| card.mount(ctx));
        harness.run(Duration::ZERO, |ctx| card.handle(&SceneInput::Tap, ctx));
        card.unmount();
        card.unmount();
        harness.run(Duration::from_secs(5), |ctx| card.tick(ctx));
        assert!(!harness.view.has_class(LETTER, "show"));
    }
}
