use crate::{
    assets::load_photo_list,
    puzzle::{pick_image, Puzzle, TapOutcome},
    render::RenderGraph,
    reveal::{ErodableUnit, RevealEvent, RevealPlan, RevealSequencer},
    rng::DeterministicRng,
    scene::{Scene, SceneContext, SceneId, SceneInput},
};

const PAGE: &str = "reveal";
const BOARD: &str = "puzzle";
const STATUS: &str = "puzzle-status";
const OVERLAY: &str = "overlay";
const DIVIDERS: [&str; 2] = ["divider-1", "divider-2"];

const UNSOLVED: &str = "Tap two pieces to swap and rebuild the photo.";
const SOLVED: &str = "Puzzle solved.";

const NOTE: &str = "Chucky said it best friends til the end. But we are so much more. \
                    You possess my soul more than any doll ever could. \
                    Happy Valentine's Day to my partner in crime.";

const POEM: &str = "You whip up a cake with such flair,\n\
                    With flour all over your hair.\n\
                    You're good at it all,\n\
                    Whatever the call,\n\
                    Nothing else can even compare.";

const NOTES: [&str; 3] = [
    "Happy Valentine's Day to the only person I'd share my fries with",
    "You are the red velvet to my cupcake and the blood splatter to my crime scene. \
     I love you, Snowflake",
    "Nine years down. Forever to go. Let's make this year the best sequel yet",
];

/// The long scrolling page: notes, dividers, the photo puzzle and the finale
/// that follows solving it.
pub struct RevealScene {
    rng: Box<dyn DeterministicRng>,
    sequencer: RevealSequencer,
    puzzle: Option<Puzzle>,
    puzzle_url: Option<String>,
    units: Vec<ErodableUnit>,
}

impl RevealScene {
    pub fn new(rng: Box<dyn DeterministicRng>, sequencer: RevealSequencer) -> Self {
        Self {
            rng,
            sequencer,
            puzzle: None,
            puzzle_url: None,
            units: Vec::new(),
        }
    }

    pub fn puzzle(&self) -> Option<&Puzzle> {
        self.puzzle.as_ref()
    }

    pub fn units(&self) -> &[ErodableUnit] {
        &self.units
    }

    fn write_text(&mut self, view: &mut RenderGraph) {
        self.units.clear();
        self.push_paragraph(view, "note-word", NOTE);
        for line in POEM.lines() {
            self.push_paragraph(view, "poem-word", line);
            if let Some(last) = self.units.last() {
                view.set_class(&word_target(last.id), "line-end", true);
            }
        }
        for (index, note) in NOTES.iter().enumerate() {
            let side = if index % 2 == 0 { "right" } else { "left" };
            view.set_class(&format!("notes-note-{index}"), side, true);
            self.push_paragraph(view, "notes-word", note);
        }
    }

    fn push_paragraph(&mut self, view: &mut RenderGraph, class: &str, text: &str) {
        let words: Vec<&str> = text.split_whitespace().collect();
        for (index, word) in words.iter().enumerate() {
            let text = if index + 1 < words.len() {
                format!("{word} ")
            } else {
                word.to_string()
            };
            let id = self.units.len();
            let target = word_target(id);
            view.set_text(&target, text.as_str());
            view.set_class(&target, class, true);
            self.units.push(ErodableUnit { id, text });
        }
    }

    fn place_images(&mut self, ctx: &mut SceneContext<'_>) {
        let env = ctx.env;
        let photos = load_photo_list(env.assets.as_ref(), &env.config.assets.photos);

        let mut used: Vec<String> = Vec::new();
        for divider in DIVIDERS {
            let exclude: Vec<&str> = used.iter().map(String::as_str).collect();
            match pick_image(&photos, &exclude, self.rng.as_mut()) {
                Some(src) => {
                    ctx.view.set_media(divider, Some(env.resolve(&src)));
                    used.push(src);
                }
                None => ctx.view.set_hidden(divider, true),
            }
        }

        let exclude: Vec<&str> = used.iter().map(String::as_str).collect();
        let Some(src) = pick_image(&photos, &exclude, self.rng.as_mut()) else {
            tracing::debug!("no image for the puzzle; hiding it");
            ctx.view.set_hidden(BOARD, true);
            ctx.view.set_text(STATUS, "");
            return;
        };
        match Puzzle::generate(env.config.puzzle.size, self.rng.as_mut()) {
            Ok(puzzle) => {
                self.puzzle = Some(puzzle);
                self.puzzle_url = Some(env.resolve(&src));
                self.render_board(ctx.view);
            }
            Err(err) => {
                tracing::warn!(%err, "puzzle unavailable");
                ctx.view.set_hidden(BOARD, true);
                ctx.view.set_text(STATUS, "");
            }
        }
    }

    fn render_board(&self, view: &mut RenderGraph) {
        let Some(puzzle) = self.puzzle.as_ref() else {
            return;
        };
        for position in 0..puzzle.tile_count() {
            let Some(tile) = puzzle.tile_at(position) else {
                continue;
            };
            let (col, row) = puzzle.tile_grid_position(tile);
            let target = tile_target(position);
            view.set_media(&target, self.puzzle_url.clone());
            view.set_prop(&target, "tile", tile as f32);
            view.set_prop(&target, "col", col as f32);
            view.set_prop(&target, "row", row as f32);
            view.set_prop(&target, "size", puzzle.size() as f32);
            view.set_class(&target, "selected", puzzle.selected() == Some(position));
        }
        let solved = puzzle.is_solved();
        view.set_class(BOARD, "solved", solved);
        view.set_text(STATUS, if solved { SOLVED } else { UNSOLVED });
    }

    fn tap_tile(&mut self, position: usize, ctx: &mut SceneContext<'_>) {
        let Some(puzzle) = self.puzzle.as_mut() else {
            return;
        };
        let outcome = puzzle.tap(position);
        if outcome == TapOutcome::Ignored {
            return;
        }
        self.render_board(ctx.view);
        if let TapOutcome::Swapped {
            just_solved: true, ..
        } = outcome
        {
            self.start_sequence(ctx);
        }
    }

    fn start_sequence(&mut self, ctx: &mut SceneContext<'_>) {
        let tiles = self.puzzle.as_ref().map_or(0, Puzzle::tile_count);
        let Some(plan) = self.sequencer.start(ctx.now(), self.units.clone(), tiles) else {
            return;
        };
        render_plan(ctx.view, &plan);
    }
}

impl Scene for RevealScene {
    fn id(&self) -> SceneId {
        SceneId::Reveal
    }

    fn mount(&mut self, ctx: &mut SceneContext<'_>) {
        ctx.view.set_class(PAGE, "reveal", true);
        ctx.view.set_hidden(OVERLAY, true);
        self.write_text(ctx.view);
        self.place_images(ctx);
    }

    fn tick(&mut self, ctx: &mut SceneContext<'_>) {
        for event in self.sequencer.advance(ctx.now()) {
            match event {
                RevealEvent::Eroding(id) => ctx.view.set_class(&word_target(id), "eroding", true),
                RevealEvent::Cleared(id) => ctx.view.set_text(&word_target(id), ""),
                RevealEvent::OverlayFall => {
                    ctx.view.set_hidden(OVERLAY, false);
                    ctx.view.set_class(OVERLAY, "falling", true);
                }
                RevealEvent::Finale => ctx.go_to(SceneId::Final),
            }
        }
    }

    fn handle(&mut self, input: &SceneInput, ctx: &mut SceneContext<'_>) {
        match input {
            SceneInput::TapTile(position) => self.tap_tile(*position, ctx),
            // Without a puzzle there is nothing to solve; let the visitor move on.
            SceneInput::Continue if self.puzzle.is_none() => self.start_sequence(ctx),
            _ => {}
        }
    }

    fn unmount(&mut self) {
        self.sequencer.cancel();
    }
}

fn word_target(id: usize) -> String {
    format!("word-{id}")
}

fn tile_target(position: usize) -> String {
    format!("tile-{position}")
}

fn render_plan(view: &mut RenderGraph, plan: &RevealPlan) {
    view.set_class(PAGE, "eerie", true);
    // The board is solved, so every tile sits at its own position.
    for scatter in &plan.scatter {
        let target = tile_target(scatter.tile);
        view.set_class(&target, "disintegrate", true);
        view.set_prop(&target, "dx_px", scatter.dx_px);
        view.set_prop(&target, "dy_px", scatter.dy_px);
        view.set_prop(&target, "rotate_deg", scatter.rotation_deg);
    }
    for (index, column) in plan.columns.iter().enumerate() {
        let target = format!("overlay-col-{index}");
        view.set_prop(&target, "delay_s", column.delay as f32);
        view.set_prop(&target, "duration_s", column.duration as f32);
        view.set_prop(&target, "width_vmax", column.width_vmax as f32);
    }
}
