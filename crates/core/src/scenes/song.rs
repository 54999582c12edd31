use std::time::Duration;

use crate::{
    animation::{Animator, Tween},
    assets::load_photo_list,
    lyrics::{LyricSync, SyncUpdate},
    render::RenderGraph,
    scene::{Scene, SceneContext, SceneId, SceneInput},
    scheduler::Scheduler,
    slideshow::{Buffer, MediaKind, MediaRotator, Rotation},
    timeline::{LyricEntry, PlaybackSource, Timeline},
};

use super::clear_prefixed;

const AUDIO: &str = "song-audio";
const CURRENT_LINE: &str = "lyrics-current";
const WORD_PREFIX: &str = "lyric-word-";
const OVERLAY: &str = "audio-overlay";

/// Karaoke lyrics over a rotating photo background.
pub struct SongScene {
    animator: Box<dyn Animator>,
    playback: Box<dyn PlaybackSource>,
    rotator: Option<MediaRotator>,
    sync: Option<LyricSync>,
    frames: Scheduler<()>,
    last_tick: Option<Duration>,
    awaiting_gesture: bool,
}

impl SongScene {
    pub fn new(animator: Box<dyn Animator>, playback: Box<dyn PlaybackSource>) -> Self {
        Self {
            animator,
            playback,
            rotator: None,
            sync: None,
            frames: Scheduler::new(),
            last_tick: None,
            awaiting_gesture: false,
        }
    }

    /// Whether playback was refused and the scene is waiting for a tap.
    pub fn is_awaiting_gesture(&self) -> bool {
        self.awaiting_gesture
    }

    pub fn lyrics(&self) -> Option<&LyricSync> {
        self.sync.as_ref()
    }

    fn start_playback(&mut self, user_gesture: bool, view: &mut RenderGraph) {
        if self.playback.play(user_gesture) {
            self.awaiting_gesture = false;
            view.set_hidden(OVERLAY, true);
            return;
        }
        if !self.awaiting_gesture {
            tracing::info!("playback refused; waiting for a tap");
        }
        self.awaiting_gesture = true;
        view.set_text(OVERLAY, "Tap to start music");
        view.set_hidden(OVERLAY, false);
    }

    fn sample(&mut self, ctx: &mut SceneContext<'_>) {
        let Some(sync) = self.sync.as_mut() else {
            return;
        };
        let update = if self.playback.has_ended() {
            SyncUpdate {
                finished: sync.notify_ended(),
                ..SyncUpdate::default()
            }
        } else {
            sync.poll(self.playback.current_time())
        };

        if update.line_changed.is_some() {
            if let Some(entry) = sync.current_entry() {
                render_line(ctx.view, entry);
                let fade = ctx.config().song.line_fade();
                self.animator
                    .play(ctx.now(), Tween::new(CURRENT_LINE, "opacity", 0.0, 1.0, fade));
            }
        }
        if let Some(word) = update.word_changed {
            let count = sync.current_entry().map_or(0, |entry| entry.words.len());
            for index in 0..count {
                let target = format!("{WORD_PREFIX}{index}");
                ctx.view.set_class(&target, "active", word == Some(index));
            }
        }
        if update.finished {
            ctx.go_to(SceneId::Envelope);
        }
    }
}

impl Scene for SongScene {
    fn id(&self) -> SceneId {
        SceneId::Song
    }

    fn mount(&mut self, ctx: &mut SceneContext<'_>) {
        let env = ctx.env;
        let now = ctx.now();
        let song = &env.config.song;
        let paths = &env.config.assets;

        let timeline = match env.assets.read_text(&paths.lyrics) {
            Some(text) => Timeline::parse(&text),
            None => {
                tracing::warn!(path = %paths.lyrics, "lyrics unavailable; song plays without them");
                Timeline::default()
            }
        };
        tracing::debug!(lines = timeline.len(), "lyrics loaded");
        self.sync = Some(LyricSync::new(timeline, song.end_time_secs));

        let photos = load_photo_list(env.assets.as_ref(), &paths.photos);
        let mut rotator = MediaRotator::new(
            photos,
            song.slide_interval(),
            env.rng(),
            env.resolver.clone(),
        );
        if let Some(first) = rotator.start(now) {
            render_rotation(ctx.view, &first);
        }
        self.rotator = Some(rotator);

        ctx.view.set_media(AUDIO, Some(env.resolve(&paths.song_audio)));
        ctx.view.set_text(CURRENT_LINE, "");
        ctx.view.set_hidden(OVERLAY, true);
        self.start_playback(false, ctx.view);

        self.frames.schedule_every(now, song.frame_interval(), ());
        self.last_tick = Some(now);
    }

    fn tick(&mut self, ctx: &mut SceneContext<'_>) {
        let now = ctx.now();
        if let Some(last) = self.last_tick.replace(now) {
            self.playback.advance(now.saturating_sub(last));
        }
        if let Some(rotator) = self.rotator.as_mut() {
            for rotation in rotator.advance(now) {
                render_rotation(ctx.view, &rotation);
            }
        }
        // Several missed frames collapse into one sample of the clock.
        if !self.frames.poll(now).is_empty() {
            self.sample(ctx);
        }
        self.animator.apply(now, ctx.view);
    }

    fn handle(&mut self, input: &SceneInput, ctx: &mut SceneContext<'_>) {
        match input {
            SceneInput::Tap if self.awaiting_gesture => self.start_playback(true, ctx.view),
            SceneInput::MediaEnded => {
                let fired = self.sync.as_mut().is_some_and(LyricSync::notify_ended);
                if fired {
                    ctx.go_to(SceneId::Envelope);
                }
            }
            _ => {}
        }
    }

    fn unmount(&mut self) {
        self.frames.cancel_all();
        if let Some(rotator) = self.rotator.as_mut() {
            rotator.stop();
        }
        if let Some(sync) = self.sync.as_mut() {
            sync.stop();
        }
        self.playback.pause();
        if let Some(last) = self.last_tick.take() {
            self.animator.cancel_all(last);
        }
    }
}

fn render_line(view: &mut RenderGraph, entry: &LyricEntry) {
    clear_prefixed(view, WORD_PREFIX);
    view.set_text(CURRENT_LINE, entry.line.as_str());
    for (index, word) in entry.words.iter().enumerate() {
        view.set_text(&format!("{WORD_PREFIX}{index}"), word.text.as_str());
    }
}

fn slide_target(buffer: Buffer) -> &'static str {
    match buffer {
        Buffer::A => "slide-a",
        Buffer::B => "slide-b",
    }
}

fn render_rotation(view: &mut RenderGraph, rotation: &Rotation) {
    let shown = slide_target(rotation.buffer);
    let hidden = slide_target(rotation.buffer.other());
    view.set_media(shown, Some(rotation.slide.url.clone()));
    view.set_class(shown, "video", rotation.slide.kind == MediaKind::Video);
    view.set_class(shown, "active", true);
    view.set_class(hidden, "active", false);
}
