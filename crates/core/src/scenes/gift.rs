use crate::scene::{Scene, SceneContext, SceneId};

/// Where the experience ends. Nothing leads out of here.
#[derive(Debug, Default)]
pub struct GiftScene;

impl GiftScene {
    pub fn new() -> Self {
        Self
    }
}

impl Scene for GiftScene {
    fn id(&self) -> SceneId {
        SceneId::Gift
    }

    fn mount(&mut self, ctx: &mut SceneContext<'_>) {
        ctx.view.set_text("gift-title", "For You");
        ctx.view.set_text(
            "gift-thanks",
            "Thank you for every laugh, every adventure, every quiet moment.",
        );
        ctx.view.set_text("gift-lead", "Your gift is waiting:");
        ctx.view.set_text(
            "gift-location",
            "Inside the top drawer of the nightstand, wrapped in a ribbon.",
        );
    }

    fn unmount(&mut self) {}
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::{assets::MemoryAssets, scene::SceneInput, scenes::testing::Harness};

    #[test]
    fn gift_never_moves_on() {
        let mut harness = Harness::new(MemoryAssets::new());
        let mut gift = GiftScene::new();
        harness.run(Duration::ZERO, |ctx| gift.mount(ctx));
        assert_eq!(harness.view.text("gift-title"), Some("For You"));

        for input in [
            SceneInput::Tap,
            SceneInput::Continue,
            SceneInput::MediaEnded,
            SceneInput::Submit("rose moon spark".into()),
        ] {
            let next = harness.run(Duration::ZERO, |ctx| gift.handle(&input, ctx));
            assert_eq!(next, None);
        }
        assert_eq!(harness.run(Duration::from_secs(60), |ctx| gift.tick(ctx)), None);
    }
}
