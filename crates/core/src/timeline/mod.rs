//! Timestamped lyric timelines and the playback clock they are read against.
//!
//! The text format carries one lyric line per record:
//!
//! ```text
//! [ti: Title]
//! [00:12.30]Plain line
//! [00:15.00][01:02.50]Chorus sung twice
//! [00:20.00]<00:20.00>Word <00:20.40>by <00:20.80>word
//! ```
//!
//! Square-bracket markers stamp the whole line; angle-bracket markers split
//! it into individually timed words.

use std::time::Duration;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static LINE_MARKER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\[(\d{2}):(\d{2})(?:\.(\d{2,3}))?\]").expect("line marker pattern is valid")
});
static INLINE_MARKER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"<(\d{2}):(\d{2})\.(\d{2,3})>").expect("inline marker pattern is valid")
});
static METADATA_MARKER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\[(ti|ar|al|length):").expect("metadata pattern is valid")
});

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WordEntry {
    pub time: f64,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LyricEntry {
    pub time: f64,
    pub line: String,
    pub words: Vec<WordEntry>,
}

impl LyricEntry {
    /// Index of the word whose window `[word.time, next.time)` holds `clock`.
    pub fn word_index_at(&self, clock: f64) -> Option<usize> {
        let count = self.words.partition_point(|word| word.time <= clock);
        count.checked_sub(1)
    }
}

/// Ordered, immutable list of lyric entries.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Timeline {
    entries: Vec<LyricEntry>,
}

impl Timeline {
    pub fn parse(text: &str) -> Self {
        Self {
            entries: parse_timeline(text),
        }
    }

    pub fn entries(&self) -> &[LyricEntry] {
        &self.entries
    }

    pub fn get(&self, index: usize) -> Option<&LyricEntry> {
        self.entries.get(index)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Index `i` with `entries[i].time <= clock < entries[i + 1].time`; the
    /// last entry has no upper bound. `None` before the first entry.
    pub fn index_at(&self, clock: f64) -> Option<usize> {
        let count = self.entries.partition_point(|entry| entry.time <= clock);
        count.checked_sub(1)
    }

    pub fn entry_at(&self, clock: f64) -> Option<&LyricEntry> {
        self.index_at(clock).and_then(|index| self.entries.get(index))
    }
}

impl From<Vec<LyricEntry>> for Timeline {
    fn from(mut entries: Vec<LyricEntry>) -> Self {
        entries.sort_by(|a, b| a.time.total_cmp(&b.time));
        Self { entries }
    }
}

/// Parses timestamp-annotated lyric text. Lines that carry no usable
/// timestamp are skipped; the parse itself never fails.
pub fn parse_timeline(text: &str) -> Vec<LyricEntry> {
    let mut entries = Vec::new();
    for (number, line) in text.lines().enumerate() {
        match parse_line(line) {
            Some(mut parsed) => entries.append(&mut parsed),
            None => {
                if !line.trim().is_empty() {
                    tracing::trace!(line = number + 1, "skipping untimed lyric line");
                }
            }
        }
    }

    // Vec::sort_by is stable, so equal timestamps keep source order.
    entries.sort_by(|a, b| a.time.total_cmp(&b.time));
    bound_word_times(&mut entries);
    entries
}

fn parse_line(raw: &str) -> Option<Vec<LyricEntry>> {
    if raw.trim().is_empty() || METADATA_MARKER.is_match(raw) {
        return None;
    }

    let times: Vec<f64> = LINE_MARKER
        .captures_iter(raw)
        .filter_map(|caps| {
            marker_seconds(
                caps.get(1)?.as_str(),
                caps.get(2)?.as_str(),
                caps.get(3).map(|m| m.as_str()),
            )
        })
        .collect();
    let first_time = *times.first()?;

    let text = LINE_MARKER.replace_all(raw, "");
    let text = text.trim();
    let words = split_words(text, first_time);
    let line = INLINE_MARKER.replace_all(text, "").trim().to_string();

    Some(
        times
            .into_iter()
            .map(|time| {
                let shift = time - first_time;
                LyricEntry {
                    time,
                    line: line.clone(),
                    words: words
                        .iter()
                        .map(|word| WordEntry {
                            time: word.time + shift,
                            text: word.text.clone(),
                        })
                        .collect(),
                }
            })
            .collect(),
    )
}

/// Splits `text` at its inline markers. Each marker closes the span since the
/// previous one, stamping it with the previous marker's time; text before the
/// first marker is stamped with `line_time`. Without inline markers the line
/// has no word timing at all.
fn split_words(text: &str, line_time: f64) -> Vec<WordEntry> {
    let mut words = Vec::new();
    let mut span_start = 0;
    let mut span_time = line_time;
    let mut saw_marker = false;

    for caps in INLINE_MARKER.captures_iter(text) {
        let Some(whole) = caps.get(0) else { continue };
        let Some(time) = marker_seconds(&caps[1], &caps[2], Some(&caps[3])) else {
            continue;
        };
        push_word(&mut words, &text[span_start..whole.start()], span_time);
        span_start = whole.end();
        span_time = time;
        saw_marker = true;
    }

    if !saw_marker {
        return Vec::new();
    }
    push_word(&mut words, &text[span_start..], span_time);
    words
}

fn push_word(words: &mut Vec<WordEntry>, span: &str, time: f64) {
    if span.trim().is_empty() {
        return;
    }
    words.push(WordEntry {
        time,
        text: span.to_string(),
    });
}

fn marker_seconds(minutes: &str, seconds: &str, fraction: Option<&str>) -> Option<f64> {
    let minutes: u32 = minutes.parse().ok()?;
    let seconds: u32 = seconds.parse().ok()?;
    let fraction = match fraction {
        Some(digits) => {
            let value: u32 = digits.parse().ok()?;
            f64::from(value) / 10_f64.powi(digits.len() as i32)
        }
        None => 0.0,
    };
    Some(f64::from(minutes) * 60.0 + f64::from(seconds) + fraction)
}

/// Keeps every word inside its entry's window and in non-decreasing order.
fn bound_word_times(entries: &mut [LyricEntry]) {
    let uppers: Vec<Option<f64>> = (0..entries.len())
        .map(|i| entries.get(i + 1).map(|next| next.time))
        .collect();

    for (entry, upper) in entries.iter_mut().zip(uppers) {
        let mut floor = entry.time;
        for word in &mut entry.words {
            let mut time = word.time.max(floor);
            if let Some(upper) = upper {
                time = time.min(upper);
            }
            word.time = time;
            floor = time;
        }
    }
}

/// External playback clock, read by polling.
pub trait PlaybackSource {
    /// Current playback position in seconds.
    fn current_time(&self) -> f64;

    fn has_ended(&self) -> bool;

    /// Asks playback to start. `user_gesture` is set when the request comes
    /// from a tap; backends may refuse un-gestured starts. Returns whether
    /// playback is now running.
    fn play(&mut self, user_gesture: bool) -> bool;

    fn pause(&mut self);

    fn seek(&mut self, seconds: f64);

    /// Host time pump. Real players track their own position and ignore it.
    fn advance(&mut self, delta: Duration);
}

/// Simulated player: position advances only through [`PlaybackSource::advance`].
#[derive(Debug, Clone)]
pub struct PlaybackClock {
    pub time_seconds: f64,
    duration_seconds: f64,
    autoplay: bool,
    playing: bool,
    ended: bool,
}

impl PlaybackClock {
    pub fn new(duration_seconds: f64, autoplay: bool) -> Self {
        Self {
            time_seconds: 0.0,
            duration_seconds: duration_seconds.max(0.0),
            autoplay,
            playing: false,
            ended: false,
        }
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn reset(&mut self) {
        self.time_seconds = 0.0;
        self.playing = false;
        self.ended = false;
    }
}

impl PlaybackSource for PlaybackClock {
    fn current_time(&self) -> f64 {
        self.time_seconds
    }

    fn has_ended(&self) -> bool {
        self.ended
    }

    fn play(&mut self, user_gesture: bool) -> bool {
        if self.ended {
            return false;
        }
        if self.autoplay || user_gesture {
            self.playing = true;
        }
        self.playing
    }

    fn pause(&mut self) {
        self.playing = false;
    }

    fn seek(&mut self, seconds: f64) {
        self.time_seconds = seconds.clamp(0.0, self.duration_seconds);
        self.ended = false;
    }

    fn advance(&mut self, delta: Duration) {
        if !self.playing {
            return;
        }
        self.time_seconds += delta.as_secs_f64();
        if self.time_seconds >= self.duration_seconds {
            self.time_seconds = self.duration_seconds;
            self.playing = false;
            self.ended = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn parses_word_timed_line() {
        let entries = parse_timeline("[00:05.00]<00:05.00>Hi <00:05.20>there");

        assert_eq!(entries.len(), 1);
        let entry = &entries[0];
        assert!(approx(entry.time, 5.0));
        assert_eq!(entry.line, "Hi there");
        assert_eq!(entry.words.len(), 2);
        assert!(approx(entry.words[0].time, 5.0));
        assert_eq!(entry.words[0].text, "Hi ");
        assert!(approx(entry.words[1].time, 5.2));
        assert_eq!(entry.words[1].text, "there");
    }

    #[test]
    fn text_before_first_inline_marker_takes_line_time() {
        let entries = parse_timeline("[00:10.00]Hello <00:10.50>world");

        let entry = &entries[0];
        assert_eq!(entry.line, "Hello world");
        let words: Vec<(f64, &str)> = entry
            .words
            .iter()
            .map(|w| (w.time, w.text.as_str()))
            .collect();
        assert_eq!(words, vec![(10.0, "Hello "), (10.5, "world")]);
    }

    #[test]
    fn words_concatenate_to_the_line() {
        let entries = parse_timeline("[01:00.00]<01:00.00>one <01:00.30>two <01:00.60>three");
        let joined: String = entries[0].words.iter().map(|w| w.text.as_str()).collect();
        assert_eq!(joined, entries[0].line);
    }

    #[test]
    fn skips_metadata_blank_and_untimed_lines() {
        let text = "[ti: Our Song]\n[AR:Someone]\n\nno timestamp here\n[al:Album]\n[length: 03:00]\n[00:01.00]kept\n[xx:yy]broken";
        let entries = parse_timeline(text);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].line, "kept");
        assert!(entries[0].words.is_empty());
    }

    #[test]
    fn multiple_markers_expand_and_sort() {
        let text = "[00:30.00]later\r\n[00:10.00][00:50.00]chorus\n[00:20.00]middle";
        let entries = parse_timeline(text);

        let summary: Vec<(f64, &str)> = entries
            .iter()
            .map(|e| (e.time, e.line.as_str()))
            .collect();
        assert_eq!(
            summary,
            vec![
                (10.0, "chorus"),
                (20.0, "middle"),
                (30.0, "later"),
                (50.0, "chorus")
            ]
        );
    }

    #[test]
    fn repeated_lines_shift_their_words() {
        let entries = parse_timeline("[00:10.00][00:40.00]<00:10.00>la <00:11.00>la");
        assert!(approx(entries[0].words[1].time, 11.0));
        assert!(approx(entries[1].words[0].time, 40.0));
        assert!(approx(entries[1].words[1].time, 41.0));
    }

    #[test]
    fn equal_times_keep_source_order() {
        let entries = parse_timeline("[00:02.00]first\n[00:01.00]zero\n[00:02.00]second");
        let lines: Vec<&str> = entries.iter().map(|e| e.line.as_str()).collect();
        assert_eq!(lines, vec!["zero", "first", "second"]);
    }

    #[test]
    fn word_times_stay_inside_their_entry() {
        let text = "[00:05.00]<00:04.00>early <00:09.00>late <00:07.00>back\n[00:08.00]next";
        let entries = parse_timeline(text);
        let times: Vec<f64> = entries[0].words.iter().map(|w| w.time).collect();
        assert_eq!(times, vec![5.0, 8.0, 8.0]);
    }

    #[test]
    fn accepts_optional_and_millisecond_fractions() {
        let entries = parse_timeline("[01:02]a\n[00:03.250]b");
        assert!(approx(entries[0].time, 3.25));
        assert!(approx(entries[1].time, 62.0));
    }

    #[test]
    fn index_lookup_uses_half_open_windows() {
        let timeline = Timeline::parse("[00:00.00]a\n[00:05.00]b\n[00:10.00]c");
        let indices: Vec<Option<usize>> = [0.0, 4.9, 5.0, 9.99, 10.0, 999.0]
            .iter()
            .map(|&t| timeline.index_at(t))
            .collect();
        assert_eq!(
            indices,
            vec![Some(0), Some(0), Some(1), Some(1), Some(2), Some(2)]
        );
        assert_eq!(Timeline::parse("[00:01.00]x").index_at(0.5), None);
    }

    #[test]
    fn playback_clock_respects_autoplay_and_duration() {
        let mut blocked = PlaybackClock::new(2.0, false);
        assert!(!blocked.play(false));
        blocked.advance(Duration::from_secs(1));
        assert_eq!(blocked.current_time(), 0.0);
        assert!(blocked.play(true));

        blocked.advance(Duration::from_millis(2_500));
        assert!(blocked.has_ended());
        assert_eq!(blocked.current_time(), 2.0);
        assert!(!blocked.is_playing());
    }
}
