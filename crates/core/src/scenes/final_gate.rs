use std::time::Duration;

use crate::{
    animation::{Animator, Tween},
    interactions::{ClueInteraction, ClueKind},
    render::RenderGraph,
    scene::{Scene, SceneContext, SceneId, SceneInput},
};

use super::{answer_matches, shake};

pub const WRONG_ANSWER: &str = "Try again, sweetheart.";

const PANEL: &str = "final-panel";
const ERROR: &str = "final-error";

/// Last gate. Clues found here spell out the answer.
pub struct FinalScene {
    animator: Box<dyn Animator>,
    clues: Vec<ClueInteraction>,
    last_tick: Duration,
}

impl FinalScene {
    pub fn new(animator: Box<dyn Animator>) -> Self {
        Self {
            animator,
            clues: Vec::new(),
            last_tick: Duration::ZERO,
        }
    }

    pub fn clues(&self) -> &[ClueInteraction] {
        &self.clues
    }

    fn submit(&mut self, value: &str, ctx: &mut SceneContext<'_>) {
        if answer_matches(value, &ctx.config().unlock.final_answer) {
            ctx.go_to(SceneId::Gift);
            return;
        }
        ctx.record_attempt();
        ctx.view.set_text(ERROR, WRONG_ANSWER);
        shake(ctx.view, PANEL);
    }

    fn drag(&mut self, id: &str, progress: f32, ctx: &mut SceneContext<'_>) {
        let now = ctx.now();
        let Some(index) = self.clues.iter().position(|clue| clue.id() == id) else {
            return;
        };
        let clue = &mut self.clues[index];
        clue.drag_start();
        let found = clue.drag_to(progress, now, self.animator.as_mut());
        let handle = format!("{}-handle", clue.target());
        let held = clue.progress();
        self.animator
            .play(now, Tween::new(handle, "progress", held, held, Duration::ZERO));
        if let Some(found) = found {
            reveal_clue(ctx.view, &self.clues[index]);
            ctx.mark_clue_found(&found);
        }
    }

    fn release(&mut self, id: &str, ctx: &mut SceneContext<'_>) {
        let now = ctx.now();
        let Some(clue) = self.clues.iter_mut().find(|clue| clue.id() == id) else {
            return;
        };
        clue.drag_end();
        if clue.is_revealed() {
            return;
        }
        let handle = format!("{}-handle", clue.target());
        let from = clue.progress();
        self.animator.play(
            now,
            Tween::new(handle, "progress", from, 0.0, Duration::from_millis(250)),
        );
    }
}

impl Scene for FinalScene {
    fn id(&self) -> SceneId {
        SceneId::Final
    }

    fn mount(&mut self, ctx: &mut SceneContext<'_>) {
        ctx.view.set_text("final-title", "Final Answer");
        ctx.view
            .set_text("final-prompt", "Use your clues to unlock the last surprise.");
        ctx.view.set_text(ERROR, "");

        let found = ctx.progress();
        self.clues = ctx
            .config()
            .clue_list()
            .into_iter()
            .map(|clue| {
                if found.has_clue(&clue.id) {
                    ClueInteraction::restored(clue)
                } else {
                    ClueInteraction::new(clue)
                }
            })
            .collect();

        for clue in &self.clues {
            let target = clue.target();
            ctx.view.set_text(&target, clue.clue().title.as_str());
            ctx.view.set_class(&target, kind_class(clue.kind()), true);
            ctx.view
                .set_text(&format!("{target}-content"), clue.clue().content.as_str());
            if clue.is_revealed() {
                reveal_clue(ctx.view, clue);
            } else {
                ctx.view.set_hidden(&format!("{target}-content"), true);
            }
        }
        self.last_tick = ctx.now();
    }

    fn tick(&mut self, ctx: &mut SceneContext<'_>) {
        self.last_tick = ctx.now();
        self.animator.apply(ctx.now(), ctx.view);
    }

    fn handle(&mut self, input: &SceneInput, ctx: &mut SceneContext<'_>) {
        let now = ctx.now();
        self.last_tick = now;
        match input {
            SceneInput::Submit(value) => self.submit(value, ctx),
            SceneInput::TapClue(id) => {
                let animator = self.animator.as_mut();
                let Some(clue) = self.clues.iter_mut().find(|clue| clue.id() == id) else {
                    return;
                };
                if let Some(found) = clue.tap(now, animator) {
                    reveal_clue(ctx.view, clue);
                    ctx.mark_clue_found(&found);
                }
            }
            SceneInput::DragClue { id, progress } => self.drag(id, *progress, ctx),
            SceneInput::ReleaseClue(id) => self.release(id, ctx),
            _ => {}
        }
        self.animator.apply(now, ctx.view);
    }

    fn unmount(&mut self) {
        self.animator.cancel_all(self.last_tick);
        for clue in &mut self.clues {
            clue.drag_end();
        }
    }
}

fn kind_class(kind: ClueKind) -> &'static str {
    match kind {
        ClueKind::Flip => "flip",
        ClueKind::Pocket => "pocket",
        ClueKind::Tear => "tear",
    }
}

fn reveal_clue(view: &mut RenderGraph, clue: &ClueInteraction) {
    let target = clue.target();
    view.set_class(&target, "revealed", true);
    view.set_hidden(&format!("{target}-content"), false);
}
