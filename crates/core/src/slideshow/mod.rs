//! Double-buffered background slideshow on its own interval timer.

use std::{rc::Rc, time::Duration};

use crate::{
    assets::{is_video, MediaResolver},
    rng::{shuffle, DeterministicRng},
    scheduler::{Scheduler, TimerId},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Buffer {
    A,
    B,
}

impl Buffer {
    pub fn other(self) -> Self {
        match self {
            Buffer::A => Buffer::B,
            Buffer::B => Buffer::A,
        }
    }

    fn slot(self) -> usize {
        match self {
            Buffer::A => 0,
            Buffer::B => 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Image,
    /// Muted, inline, restarted from zero whenever shown.
    Video,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slide {
    pub source: String,
    pub url: String,
    pub kind: MediaKind,
}

/// One rotation step: `slide` was rendered into `buffer`, which is now active.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rotation {
    pub buffer: Buffer,
    pub slide: Slide,
}

pub struct MediaRotator {
    pool: Vec<String>,
    interval: Duration,
    playlist: Vec<String>,
    cursor: usize,
    active: Buffer,
    buffers: [Option<Slide>; 2],
    timers: Scheduler<()>,
    rotation: Option<TimerId>,
    rng: Box<dyn DeterministicRng>,
    resolver: Rc<dyn MediaResolver>,
}

impl MediaRotator {
    pub fn new(
        pool: Vec<String>,
        interval: Duration,
        rng: Box<dyn DeterministicRng>,
        resolver: Rc<dyn MediaResolver>,
    ) -> Self {
        Self {
            pool,
            interval,
            playlist: Vec::new(),
            cursor: 0,
            active: Buffer::A,
            buffers: [None, None],
            timers: Scheduler::new(),
            rotation: None,
            rng,
            resolver,
        }
    }

    /// Shuffles the pool and shows the first item in buffer A. An empty pool
    /// leaves both buffers empty and arms no timer.
    pub fn start(&mut self, now: Duration) -> Option<Rotation> {
        self.stop();

        let mut playlist: Vec<String> = Vec::with_capacity(self.pool.len());
        for item in &self.pool {
            if !playlist.contains(item) {
                playlist.push(item.clone());
            }
        }
        if playlist.is_empty() {
            tracing::debug!("slideshow pool is empty; nothing to rotate");
            return None;
        }
        shuffle(&mut playlist, self.rng.as_mut());
        self.playlist = playlist;

        self.active = Buffer::A;
        let slide = self.slide_for(0);
        self.buffers[Buffer::A.slot()] = Some(slide.clone());
        self.cursor = 1;
        self.rotation = Some(self.timers.schedule_every(now, self.interval, ()));
        tracing::debug!(items = self.playlist.len(), "slideshow started");

        Some(Rotation {
            buffer: Buffer::A,
            slide,
        })
    }

    /// Applies every rotation due by `now`.
    pub fn advance(&mut self, now: Duration) -> Vec<Rotation> {
        let mut rotations = Vec::new();
        while self.timers.pop_due(now).is_some() {
            rotations.push(self.rotate());
        }
        rotations
    }

    fn rotate(&mut self) -> Rotation {
        let slide = self.slide_for(self.cursor % self.playlist.len());
        let hidden = self.active.other();
        // Replacing the hidden buffer's slide clears what it showed before.
        self.buffers[hidden.slot()] = Some(slide.clone());
        self.active = hidden;
        self.cursor += 1;
        Rotation {
            buffer: hidden,
            slide,
        }
    }

    /// Cancels the interval and clears both buffers. Idempotent.
    pub fn stop(&mut self) {
        if let Some(id) = self.rotation.take() {
            self.timers.cancel(id);
        }
        self.timers.cancel_all();
        self.buffers = [None, None];
    }

    pub fn is_running(&self) -> bool {
        self.rotation.is_some()
    }

    pub fn active_buffer(&self) -> Buffer {
        self.active
    }

    pub fn buffer(&self, buffer: Buffer) -> Option<&Slide> {
        self.buffers[buffer.slot()].as_ref()
    }

    /// Slide in the active buffer.
    pub fn current(&self) -> Option<&Slide> {
        self.buffer(self.active)
    }

    pub fn playlist(&self) -> &[String] {
        &self.playlist
    }

    fn slide_for(&self, index: usize) -> Slide {
        let source = self.playlist[index].clone();
        Slide {
            url: self.resolver.resolve(&source),
            kind: if is_video(&source) {
                MediaKind::Video
            } else {
                MediaKind::Image
            },
            source,
        }
    }
}

impl std::fmt::Debug for MediaRotator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MediaRotator")
            .field("playlist", &self.playlist)
            .field("cursor", &self.cursor)
            .field("active", &self.active)
            .field("running", &self.rotation.is_some())
            .finish()
    }
}
