//! Scripted finale: text erosion, overlay fall and a single closing event.
//!
//! Three independently scheduled tracks run on the sequencer's own timers:
//! an erosion interval that strips one text unit per step, an overlay armed
//! shortly before the end, and a one-off disintegration cue emitted
//! synchronously when the sequence starts. The finale fires after the overlay
//! has had time to play out, guarded by a latch so it can never fire twice.

use std::{collections::VecDeque, time::Duration};

use crate::{
    config::RevealConfig,
    rng::{shuffle, DeterministicRng},
    scheduler::{Latch, Scheduler, TimerId},
};

/// A piece of displayed text that the erosion track can remove.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErodableUnit {
    pub id: usize,
    pub text: String,
}

/// Where one puzzle tile flies when the board disintegrates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TileScatter {
    pub tile: usize,
    pub dx_px: f32,
    pub dy_px: f32,
    pub rotation_deg: f32,
}

/// One falling column of the overlay effect, in seconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverlayColumn {
    pub delay: f64,
    pub duration: f64,
    pub width_vmax: f64,
}

impl OverlayColumn {
    fn ends_after(&self) -> f64 {
        self.delay + self.duration
    }
}

/// Everything decided when the sequence starts.
#[derive(Debug, Clone, PartialEq)]
pub struct RevealPlan {
    pub scatter: Vec<TileScatter>,
    pub columns: Vec<OverlayColumn>,
    pub erase_interval: Duration,
    pub overlay_at: Duration,
    pub overlay_duration: Duration,
    pub finale_at: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RevealEvent {
    /// The unit starts its erase animation.
    Eroding(usize),
    /// The unit's text is gone.
    Cleared(usize),
    /// The overlay starts falling.
    OverlayFall,
    Finale,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Track {
    Erode,
    Clear(usize),
    Overlay,
    Finale,
}

pub struct RevealSequencer {
    config: RevealConfig,
    rng: Box<dyn DeterministicRng>,
    timers: Scheduler<Track>,
    eraser: Option<TimerId>,
    erase_queue: VecDeque<ErodableUnit>,
    started_at: Option<Duration>,
    finale: Latch,
    cancelled: bool,
}

impl RevealSequencer {
    pub fn new(config: RevealConfig, rng: Box<dyn DeterministicRng>) -> Self {
        Self {
            config,
            rng,
            timers: Scheduler::new(),
            eraser: None,
            erase_queue: VecDeque::new(),
            started_at: None,
            finale: Latch::new(),
            cancelled: false,
        }
    }

    /// Arms every track. A sequencer runs once; later calls return `None`.
    pub fn start(
        &mut self,
        now: Duration,
        units: Vec<ErodableUnit>,
        tile_count: usize,
    ) -> Option<RevealPlan> {
        if self.started_at.is_some() || self.cancelled {
            return None;
        }
        self.started_at = Some(now);

        let scatter = (0..tile_count)
            .map(|tile| TileScatter {
                tile,
                dx_px: self.rng.next_range(-130.0, 130.0).round() as f32,
                dy_px: self.rng.next_range(140.0, 520.0).round() as f32,
                rotation_deg: self.rng.next_range(-60.0, 60.0).round() as f32,
            })
            .collect();

        let mut queue: Vec<ErodableUnit> = units
            .into_iter()
            .filter(|unit| !unit.text.trim().is_empty())
            .collect();
        shuffle(&mut queue, self.rng.as_mut());
        let erase_interval = self.config.erase_interval(queue.len());
        self.erase_queue = queue.into();
        self.eraser = Some(self.timers.schedule_every(now, erase_interval, Track::Erode));

        let columns: Vec<OverlayColumn> = (0..self.config.overlay_columns)
            .map(|_| OverlayColumn {
                delay: round_centis(self.rng.next_range(0.0, 1.1)),
                duration: round_centis(self.rng.next_range(3.7, 6.3)),
                width_vmax: round_centis(self.rng.next_range(2.6, 4.2)),
            })
            .collect();
        let longest = columns
            .iter()
            .map(OverlayColumn::ends_after)
            .fold(0.0_f64, f64::max);
        let overlay_duration = Duration::from_millis((longest * 1000.0).round() as u64);

        let overlay_at = now + self.config.overlay_arm();
        let finale_at = overlay_at + overlay_duration + self.config.settle();
        self.timers.schedule_at(overlay_at, Track::Overlay);
        self.timers.schedule_at(finale_at, Track::Finale);

        tracing::info!(
            units = self.erase_queue.len(),
            erase_interval_ms = erase_interval.as_millis() as u64,
            finale_in_ms = (finale_at - now).as_millis() as u64,
            "reveal sequence started"
        );

        Some(RevealPlan {
            scatter,
            columns,
            erase_interval,
            overlay_at,
            overlay_duration,
            finale_at,
        })
    }

    /// Everything that happened up to `now`, in time order.
    pub fn advance(&mut self, now: Duration) -> Vec<RevealEvent> {
        let mut events = Vec::new();
        if self.cancelled {
            return events;
        }

        while let Some(fired) = self.timers.pop_due(now) {
            match fired.event {
                Track::Erode => match self.erase_queue.pop_front() {
                    Some(unit) => {
                        self.timers.schedule_after(
                            fired.at,
                            self.config.erase_clear(),
                            Track::Clear(unit.id),
                        );
                        events.push(RevealEvent::Eroding(unit.id));
                    }
                    None => self.stop_eraser(),
                },
                Track::Clear(id) => events.push(RevealEvent::Cleared(id)),
                Track::Overlay => events.push(RevealEvent::OverlayFall),
                Track::Finale => {
                    self.stop_eraser();
                    if self.finale.fire() {
                        tracing::info!("reveal sequence finale");
                        events.push(RevealEvent::Finale);
                    }
                }
            }
        }
        events
    }

    /// Cancels every pending timer. Idempotent; once cancelled the finale can
    /// no longer fire.
    pub fn cancel(&mut self) {
        self.cancelled = true;
        self.eraser = None;
        self.timers.cancel_all();
    }

    pub fn is_started(&self) -> bool {
        self.started_at.is_some()
    }

    /// Started, not cancelled, finale still pending.
    pub fn is_armed(&self) -> bool {
        self.is_started() && !self.cancelled && !self.finale.has_fired()
    }

    pub fn finale_fired(&self) -> bool {
        self.finale.has_fired()
    }

    pub fn remaining_units(&self) -> usize {
        self.erase_queue.len()
    }

    pub fn elapsed(&self, now: Duration) -> Duration {
        self.started_at
            .map(|start| now.saturating_sub(start))
            .unwrap_or_default()
    }

    fn stop_eraser(&mut self) {
        if let Some(id) = self.eraser.take() {
            self.timers.cancel(id);
        }
    }
}

impl std::fmt::Debug for RevealSequencer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RevealSequencer")
            .field("started_at", &self.started_at)
            .field("remaining_units", &self.erase_queue.len())
            .field("finale_fired", &self.finale.has_fired())
            .field("cancelled", &self.cancelled)
            .finish()
    }
}

fn round_centis(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::StdDeterministicRng;

    fn units(count: usize) -> Vec<ErodableUnit> {
        (0..count)
            .map(|id| ErodableUnit {
                id,
                text: format!("word{id} "),
            })
            .collect()
    }

    fn sequencer(seed: u64) -> RevealSequencer {
        RevealSequencer::new(
            RevealConfig::default(),
            Box::new(StdDeterministicRng::seeded(seed)),
        )
    }

    fn run_to(sequencer: &mut RevealSequencer, end: Duration, step: Duration) -> Vec<RevealEvent> {
        let mut now = Duration::ZERO;
        let mut events = Vec::new();
        while now <= end {
            events.extend(sequencer.advance(now));
            now += step;
        }
        events
    }

    fn finales(events: &[RevealEvent]) -> usize {
        events
            .iter()
            .filter(|event| **event == RevealEvent::Finale)
            .count()
    }

    #[test]
    fn finale_fires_exactly_once_for_any_queue_length() {
        for count in [0, 1, 50] {
            let mut stepped = sequencer(count as u64);
            stepped.start(Duration::ZERO, units(count), 9).unwrap();
            let events = run_to(&mut stepped, Duration::from_secs(30), Duration::from_millis(16));
            assert_eq!(finales(&events), 1, "queue length {count}");

            let mut jumped = sequencer(count as u64);
            jumped.start(Duration::ZERO, units(count), 9).unwrap();
            let mut events = jumped.advance(Duration::from_secs(60));
            events.extend(jumped.advance(Duration::from_secs(120)));
            assert_eq!(finales(&events), 1, "queue length {count}");
        }
    }

    #[test]
    fn every_unit_erodes_then_clears_before_the_finale() {
        let mut seq = sequencer(3);
        let plan = seq.start(Duration::ZERO, units(50), 0).unwrap();
        assert_eq!(plan.erase_interval, Duration::from_millis(276));

        let events = run_to(&mut seq, Duration::from_secs(25), Duration::from_millis(10));
        let eroded = events
            .iter()
            .filter(|e| matches!(e, RevealEvent::Eroding(_)))
            .count();
        let cleared = events
            .iter()
            .filter(|e| matches!(e, RevealEvent::Cleared(_)))
            .count();
        assert_eq!(eroded, 50);
        assert_eq!(cleared, 50);

        let finale_index = events.iter().position(|e| *e == RevealEvent::Finale).unwrap();
        let overlay_index = events
            .iter()
            .position(|e| *e == RevealEvent::OverlayFall)
            .unwrap();
        assert!(overlay_index < finale_index);
        assert_eq!(seq.remaining_units(), 0);
    }

    #[test]
    fn blank_units_are_not_queued() {
        let mut seq = sequencer(1);
        let mut list = units(3);
        list.push(ErodableUnit {
            id: 99,
            text: "   ".into(),
        });
        seq.start(Duration::ZERO, list, 0).unwrap();
        assert_eq!(seq.remaining_units(), 3);
    }

    #[test]
    fn finale_waits_for_the_overlay() {
        let mut seq = sequencer(8);
        let plan = seq.start(Duration::from_secs(2), units(5), 0).unwrap();

        assert_eq!(plan.columns.len(), 30);
        assert_eq!(plan.overlay_at, Duration::from_secs(15));
        let longest = plan
            .columns
            .iter()
            .map(|c| c.delay + c.duration)
            .fold(0.0, f64::max);
        assert!((3.7..=7.4).contains(&longest));
        assert_eq!(
            plan.finale_at,
            plan.overlay_at + plan.overlay_duration + Duration::from_millis(250)
        );

        let before = seq.advance(plan.finale_at - Duration::from_millis(1));
        assert_eq!(finales(&before), 0);
        assert!(seq.is_armed());
        assert_eq!(seq.advance(plan.finale_at), vec![RevealEvent::Finale]);
        assert!(!seq.is_armed());
    }

    #[test]
    fn scatter_covers_every_tile_within_bounds() {
        let mut seq = sequencer(4);
        let plan = seq.start(Duration::ZERO, Vec::new(), 9).unwrap();
        assert_eq!(plan.scatter.len(), 9);
        for (index, scatter) in plan.scatter.iter().enumerate() {
            assert_eq!(scatter.tile, index);
            assert!((-130.0..=130.0).contains(&scatter.dx_px));
            assert!((140.0..=520.0).contains(&scatter.dy_px));
            assert!((-60.0..=60.0).contains(&scatter.rotation_deg));
        }
    }

    #[test]
    fn cancel_prevents_the_finale() {
        let mut seq = sequencer(5);
        seq.start(Duration::ZERO, units(10), 0).unwrap();
        seq.advance(Duration::from_secs(5));
        seq.cancel();
        seq.cancel();
        assert!(seq.advance(Duration::from_secs(60)).is_empty());
        assert!(!seq.finale_fired());
        assert!(!seq.is_armed());
    }

    #[test]
    fn starts_only_once() {
        let mut seq = sequencer(6);
        assert!(seq.start(Duration::ZERO, units(2), 0).is_some());
        assert!(seq.start(Duration::from_secs(1), units(2), 0).is_none());
    }
}
