//! Tile-swap photo puzzle.
//!
//! The board holds `size * size` tiles. `order[position]` is the tile shown
//! at that position; the board is solved when every position holds its own
//! tile.

use crate::{
    assets::is_image,
    rng::{shuffle, DeterministicRng},
    scheduler::Latch,
    KeepsakeError, Result,
};

/// Result of tapping a tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TapOutcome {
    Selected(usize),
    Deselected(usize),
    Swapped {
        first: usize,
        second: usize,
        solved: bool,
        /// `true` only for the swap that first solved this board.
        just_solved: bool,
    },
    /// Tap outside the board.
    Ignored,
}

#[derive(Debug, Clone)]
pub struct Puzzle {
    size: usize,
    order: Vec<usize>,
    selected: Option<usize>,
    solved_latch: Latch,
}

impl Puzzle {
    /// Builds a scrambled board. The scramble is a uniform permutation,
    /// nudged off the identity by swapping the first two tiles when needed.
    pub fn generate(size: usize, rng: &mut dyn DeterministicRng) -> Result<Self> {
        if size < 2 {
            return Err(KeepsakeError::InvalidPuzzleSize(size));
        }
        let mut order: Vec<usize> = (0..size * size).collect();
        shuffle(&mut order, rng);
        if is_identity(&order) {
            order.swap(0, 1);
        }
        Ok(Self {
            size,
            order,
            selected: None,
            solved_latch: Latch::new(),
        })
    }

    /// Board with an explicit arrangement. `order` must be a permutation of
    /// `0..size*size`.
    pub fn from_order(size: usize, order: Vec<usize>) -> Result<Self> {
        if size < 2 {
            return Err(KeepsakeError::InvalidPuzzleSize(size));
        }
        let mut seen = vec![false; size * size];
        let valid = order.len() == size * size
            && order
                .iter()
                .all(|&tile| tile < seen.len() && !std::mem::replace(&mut seen[tile], true));
        if !valid {
            return Err(KeepsakeError::msg(format!(
                "puzzle order is not a permutation of 0..{}",
                size * size
            )));
        }
        Ok(Self {
            size,
            order,
            selected: None,
            solved_latch: Latch::new(),
        })
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn tile_count(&self) -> usize {
        self.order.len()
    }

    pub fn order(&self) -> &[usize] {
        &self.order
    }

    pub fn tile_at(&self, position: usize) -> Option<usize> {
        self.order.get(position).copied()
    }

    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    pub fn is_solved(&self) -> bool {
        is_identity(&self.order)
    }

    /// Whether the solved event has already been reported.
    pub fn solved_reported(&self) -> bool {
        self.solved_latch.has_fired()
    }

    /// `(column, row)` of `tile`'s slice of the source image.
    pub fn tile_grid_position(&self, tile: usize) -> (usize, usize) {
        (tile % self.size, tile / self.size)
    }

    pub fn tap(&mut self, position: usize) -> TapOutcome {
        if position >= self.order.len() {
            return TapOutcome::Ignored;
        }

        match self.selected {
            None => {
                self.selected = Some(position);
                TapOutcome::Selected(position)
            }
            Some(current) if current == position => {
                self.selected = None;
                TapOutcome::Deselected(position)
            }
            Some(current) => {
                self.order.swap(current, position);
                self.selected = None;
                let solved = self.is_solved();
                let just_solved = solved && self.solved_latch.fire();
                if just_solved {
                    tracing::info!(size = self.size, "puzzle solved");
                }
                TapOutcome::Swapped {
                    first: current,
                    second: position,
                    solved,
                    just_solved,
                }
            }
        }
    }
}

fn is_identity(order: &[usize]) -> bool {
    order.iter().enumerate().all(|(position, &tile)| position == tile)
}

/// Picks a random still image from `pool`, avoiding `exclude` when any other
/// image is available. `None` when the pool holds no images.
pub fn pick_image(
    pool: &[String],
    exclude: &[&str],
    rng: &mut dyn DeterministicRng,
) -> Option<String> {
    let candidates: Vec<&String> = pool.iter().filter(|src| is_image(src)).collect();
    if candidates.is_empty() {
        return None;
    }
    let fresh: Vec<&String> = candidates
        .iter()
        .copied()
        .filter(|src| !exclude.contains(&src.as_str()))
        .collect();
    let choices = if fresh.is_empty() { candidates } else { fresh };
    Some(choices[rng.next_index(choices.len())].clone())
}
