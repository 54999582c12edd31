//! One-shot clue reveals: a card to flip, a pocket to open, a strip to tear.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{
    animation::{Animator, Ease, Tween},
    config::ClueConfig,
    scheduler::Latch,
};

/// How far (0..=1) the tear strip must be dragged before it gives way.
pub const TEAR_THRESHOLD: f32 = 0.7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClueKind {
    Flip,
    Pocket,
    Tear,
}

#[derive(Debug, Clone)]
pub struct ClueInteraction {
    clue: ClueConfig,
    revealed: Latch,
    dragging: bool,
    progress: f32,
}

impl ClueInteraction {
    pub fn new(clue: ClueConfig) -> Self {
        Self {
            clue,
            revealed: Latch::new(),
            dragging: false,
            progress: 0.0,
        }
    }

    /// An interaction whose clue was found in an earlier session. It never
    /// reports completion again.
    pub fn restored(clue: ClueConfig) -> Self {
        let mut interaction = Self::new(clue);
        interaction.revealed.fire();
        interaction.progress = 1.0;
        interaction
    }

    pub fn id(&self) -> &str {
        &self.clue.id
    }

    pub fn clue(&self) -> &ClueConfig {
        &self.clue
    }

    pub fn kind(&self) -> ClueKind {
        self.clue.kind
    }

    pub fn is_revealed(&self) -> bool {
        self.revealed.has_fired()
    }

    /// View target prefix for this interaction's elements.
    pub fn target(&self) -> String {
        format!("clue-{}", self.clue.id)
    }

    /// Drag progress of a tear strip in `[0, 1]`.
    pub fn progress(&self) -> f32 {
        self.progress
    }

    /// Flips or opens. Tear strips ignore taps. Returns the clue id the first
    /// time the clue is revealed.
    pub fn tap(&mut self, now: Duration, animator: &mut dyn Animator) -> Option<String> {
        match self.clue.kind {
            ClueKind::Flip | ClueKind::Pocket => self.complete(now, animator),
            ClueKind::Tear => None,
        }
    }

    pub fn drag_start(&mut self) {
        if self.clue.kind == ClueKind::Tear && !self.is_revealed() {
            self.dragging = true;
        }
    }

    /// Moves the tear handle to `progress` (clamped to `[0, 1]`).
    pub fn drag_to(
        &mut self,
        progress: f32,
        now: Duration,
        animator: &mut dyn Animator,
    ) -> Option<String> {
        if !self.dragging || self.is_revealed() {
            return None;
        }
        self.progress = progress.clamp(0.0, 1.0);
        if self.progress >= TEAR_THRESHOLD {
            self.dragging = false;
            return self.complete(now, animator);
        }
        None
    }

    pub fn drag_end(&mut self) {
        self.dragging = false;
    }

    fn complete(&mut self, now: Duration, animator: &mut dyn Animator) -> Option<String> {
        if !self.revealed.fire() {
            return None;
        }
        let target = self.target();
        let ms = Duration::from_millis;
        match self.clue.kind {
            ClueKind::Flip => {
                animator.play(
                    now,
                    Tween::new(format!("{target}-inner"), "rotate_y", 0.0, 180.0, ms(800)),
                );
            }
            ClueKind::Pocket => {
                animator.play(
                    now,
                    Tween::new(format!("{target}-flap"), "rotate_x", 0.0, -160.0, ms(800)),
                );
                animator.play(
                    now,
                    Tween::new(format!("{target}-content"), "opacity", 0.0, 1.0, ms(600))
                        .delay(ms(200)),
                );
            }
            ClueKind::Tear => {
                animator.play(
                    now,
                    Tween::new(format!("{target}-cover"), "opacity", 1.0, 0.0, ms(800))
                        .ease(Ease::PowerOut(2)),
                );
                animator.play(
                    now,
                    Tween::new(format!("{target}-cover"), "x", 0.0, 80.0, ms(800)),
                );
            }
        }
        tracing::debug!(clue = %self.clue.id, "clue revealed");
        Some(self.clue.id.clone())
    }
}
