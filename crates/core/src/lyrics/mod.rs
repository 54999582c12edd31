//! Drives line and word highlighting from a polled playback position.

use crate::{
    scheduler::Latch,
    timeline::{LyricEntry, Timeline},
};

/// What changed on one poll.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SyncUpdate {
    /// Set when the displayed line changed to this index.
    pub line_changed: Option<usize>,
    /// Set when the active word of the displayed line changed. The inner
    /// value is `None` when no word is active.
    pub word_changed: Option<Option<usize>>,
    /// Set exactly once, on the poll that reached the end of the track.
    pub finished: bool,
}

impl SyncUpdate {
    pub fn is_empty(&self) -> bool {
        self.line_changed.is_none() && self.word_changed.is_none() && !self.finished
    }
}

#[derive(Debug, Clone)]
pub struct LyricSync {
    timeline: Timeline,
    end_time: f64,
    line: Option<usize>,
    word: Option<usize>,
    finished: Latch,
    stopped: bool,
}

impl LyricSync {
    /// `end_time` is the playback position (seconds) that ends the track.
    pub fn new(timeline: Timeline, end_time: f64) -> Self {
        Self {
            timeline,
            end_time,
            line: None,
            word: None,
            finished: Latch::new(),
            stopped: false,
        }
    }

    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    /// Index of the line currently displayed.
    pub fn current_line(&self) -> Option<usize> {
        self.line
    }

    pub fn current_entry(&self) -> Option<&LyricEntry> {
        self.line.and_then(|index| self.timeline.get(index))
    }

    pub fn active_word(&self) -> Option<usize> {
        self.word
    }

    pub fn is_finished(&self) -> bool {
        self.finished.has_fired()
    }

    /// Whether further polls can still change anything.
    pub fn is_running(&self) -> bool {
        !self.stopped
    }

    /// Samples the clock once. A line change always reports the new line's
    /// active word when it has one, since the rendered spans were rebuilt.
    ///
    /// The end boundary fires `finished` even when the timeline is empty.
    pub fn poll(&mut self, clock: f64) -> SyncUpdate {
        let mut update = SyncUpdate::default();
        if self.stopped {
            return update;
        }

        if clock >= self.end_time {
            update.finished = self.finish();
            return update;
        }

        let index = self.timeline.index_at(clock);
        if index != self.line {
            self.line = index;
            self.word = None;
            update.line_changed = index;
            if index.is_some() {
                tracing::debug!(line = ?index, clock, "lyric line changed");
            }
        }

        let word = self
            .current_entry()
            .and_then(|entry| entry.word_index_at(clock));
        if word != self.word {
            self.word = word;
            update.word_changed = Some(word);
        }

        update
    }

    /// The player reported end of media before the boundary was reached.
    /// Returns whether this call fired the finished event.
    pub fn notify_ended(&mut self) -> bool {
        if self.stopped {
            return false;
        }
        self.finish()
    }

    /// Stops polling without firing anything. Idempotent.
    pub fn stop(&mut self) {
        self.stopped = true;
    }

    fn finish(&mut self) -> bool {
        self.stopped = true;
        let fired = self.finished.fire();
        if fired {
            tracing::info!("lyric track finished");
        }
        fired
    }
}
