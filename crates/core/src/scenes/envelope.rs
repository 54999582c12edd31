use crate::{
    scene::{Scene, SceneContext, SceneId, SceneInput},
    scheduler::Latch,
};

const ENVELOPE: &str = "envelope";
const CONTINUE: &str = "envelope-continue";

#[derive(Debug, Default)]
pub struct EnvelopeScene {
    opened: Latch,
}

impl EnvelopeScene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_open(&self) -> bool {
        self.opened.has_fired()
    }
}

impl Scene for EnvelopeScene {
    fn id(&self) -> SceneId {
        SceneId::Envelope
    }

    fn mount(&mut self, ctx: &mut SceneContext<'_>) {
        ctx.view.set_text("envelope-title", "Click to open");
        ctx.view.set_class(ENVELOPE, "close", true);
        ctx.view.set_text("envelope-letter-0", "Just a little note to say…");
        ctx.view
            .set_text("envelope-letter-1", "You are my favorite person.");
        ctx.view.set_text(CONTINUE, "Continue");
        ctx.view.set_hidden(CONTINUE, true);
    }

    fn handle(&mut self, input: &SceneInput, ctx: &mut SceneContext<'_>) {
        match input {
            SceneInput::Tap => {
                if self.opened.fire() {
                    ctx.view.set_class(ENVELOPE, "close", false);
                    ctx.view.set_class(ENVELOPE, "open", true);
                    ctx.view.set_hidden(CONTINUE, false);
                }
            }
            SceneInput::Continue if self.is_open() => ctx.go_to(SceneId::Reveal),
            _ => {}
        }
    }

    fn unmount(&mut self) {}
}
