use crate::scene::{Scene, SceneContext, SceneId, SceneInput};

const VIDEO: &str = "intro-video";

/// Full-screen intro clip. Moves on when the clip reports its end.
#[derive(Debug, Default)]
pub struct IntroScene {
    playing: bool,
}

impl IntroScene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }
}

impl Scene for IntroScene {
    fn id(&self) -> SceneId {
        SceneId::Intro
    }

    fn mount(&mut self, ctx: &mut SceneContext<'_>) {
        let url = ctx.env.resolve(&ctx.config().assets.intro_video);
        ctx.view.set_media(VIDEO, Some(url));
        // Muted so autoplay is never refused.
        ctx.view.set_class(VIDEO, "muted", true);
        ctx.view.set_class(VIDEO, "playing", true);
        self.playing = true;
    }

    fn handle(&mut self, input: &SceneInput, ctx: &mut SceneContext<'_>) {
        if *input == SceneInput::MediaEnded && self.playing {
            ctx.go_to(SceneId::CardOpen);
        }
    }

    fn unmount(&mut self) {
        self.playing = false;
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::{assets::MemoryAssets, scenes::testing::Harness};

    #[test]
    fn clip_end_opens_the_card() {
        let mut harness = Harness::new(MemoryAssets::new());
        let mut intro = IntroScene::new();
        harness.run(Duration::ZERO, |ctx| intro.mount(ctx));
        assert_eq!(
            harness.view.node(VIDEO).and_then(|n| n.media.as_deref()),
            Some("assets/intro.mp4")
        );

        let tapped = harness.run(Duration::ZERO, |ctx| intro.handle(&SceneInput::Tap, ctx));
        assert_eq!(tapped, None);
        let ended = harness.run(Duration::ZERO, |ctx| {
            intro.handle(&SceneInput::MediaEnded, ctx)
        });
        assert_eq!(ended, Some(SceneId::CardOpen));
    }

    #[test]
    fn unmounted_clip_ignores_late_events() {
        let mut harness = Harness::new(MemoryAssets::new());
        let mut intro = IntroScene::new();
        harness.run(Duration::ZERO, |ctx| intro.mount(ctx));
        intro.unmount();
        intro.unmount();
        let ended = harness.run(Duration::ZERO, |ctx| {
            intro.handle(&SceneInput::MediaEnded, ctx)
        });
        assert_eq!(ended, None);
    }
}
