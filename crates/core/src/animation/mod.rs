//! Optional visual-effects capability.
//!
//! Scenes receive a boxed [`Animator`] chosen once at startup: either the
//! interpolating [`TweenAnimator`] or the [`InstantAnimator`] fallback that
//! jumps straight to end states. No scene decision depends on which one is in
//! use; completion instants returned by [`Animator::play`] are only used to
//! schedule purely visual follow-ups.

use std::{collections::BTreeMap, time::Duration};

use crate::{config::AnimationBackend, render::RenderGraph};

/// Easing curves, named after their usual tweening-library counterparts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Ease {
    Linear,
    /// Decelerating curve of the given power (`power2.out` is `PowerOut(2)`).
    PowerOut(i32),
    PowerInOut(i32),
}

impl Ease {
    /// Maps linear progress in `[0, 1]` onto the curve.
    pub fn apply(self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Ease::Linear => t,
            Ease::PowerOut(power) => 1.0 - (1.0 - t).powi(power + 1),
            Ease::PowerInOut(power) => {
                if t < 0.5 {
                    0.5 * (2.0 * t).powi(power + 1)
                } else {
                    1.0 - 0.5 * (2.0 * (1.0 - t)).powi(power + 1)
                }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Tween {
    pub target: String,
    pub property: String,
    pub from: f32,
    pub to: f32,
    pub duration: Duration,
    pub delay: Duration,
    pub ease: Ease,
}

impl Tween {
    pub fn new(
        target: impl Into<String>,
        property: impl Into<String>,
        from: f32,
        to: f32,
        duration: Duration,
    ) -> Self {
        Self {
            target: target.into(),
            property: property.into(),
            from,
            to,
            duration,
            delay: Duration::ZERO,
            ease: Ease::PowerOut(2),
        }
    }

    pub fn ease(mut self, ease: Ease) -> Self {
        self.ease = ease;
        self
    }

    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    fn value_at(&self, started: Duration, now: Duration) -> f32 {
        let begin = started + self.delay;
        if now <= begin {
            return self.from;
        }
        if self.duration.is_zero() {
            return self.to;
        }
        let progress = (now - begin).as_secs_f32() / self.duration.as_secs_f32();
        self.from + (self.to - self.from) * self.ease.apply(progress)
    }
}

type PropertyKey = (String, String);

pub trait Animator {
    fn backend(&self) -> AnimationBackend;

    /// Starts `tween` at `now`, replacing any tween on the same property, and
    /// returns the instant its end state is reached.
    fn play(&mut self, now: Duration, tween: Tween) -> Duration;

    /// Current value of every property this animator has touched.
    fn values(&self, now: Duration) -> Vec<(String, String, f32)>;

    /// Whether any tween is still in flight at `now`.
    fn is_animating(&self, now: Duration) -> bool;

    /// Stops every tween, leaving properties at their current values.
    fn cancel_all(&mut self, now: Duration);

    /// Writes current values into the view graph.
    fn apply(&self, now: Duration, view: &mut RenderGraph) {
        for (target, property, value) in self.values(now) {
            view.set_prop(&target, &property, value);
        }
    }
}

/// Builds the animator for the configured backend.
pub fn make_animator(backend: AnimationBackend) -> Box<dyn Animator> {
    match backend {
        AnimationBackend::Tween => Box::new(TweenAnimator::new()),
        AnimationBackend::Instant => Box::new(InstantAnimator::new()),
    }
}

#[derive(Debug, Clone)]
struct ActiveTween {
    tween: Tween,
    started: Duration,
}

impl ActiveTween {
    fn ends_at(&self) -> Duration {
        self.started + self.tween.delay + self.tween.duration
    }
}

/// Interpolating backend.
#[derive(Debug, Default)]
pub struct TweenAnimator {
    active: BTreeMap<PropertyKey, ActiveTween>,
    settled: BTreeMap<PropertyKey, f32>,
}

impl TweenAnimator {
    pub fn new() -> Self {
        Self::default()
    }

    fn settle(&mut self, now: Duration) {
        let done: Vec<PropertyKey> = self
            .active
            .iter()
            .filter(|(_, active)| active.ends_at() <= now)
            .map(|(key, _)| key.clone())
            .collect();
        for key in done {
            if let Some(active) = self.active.remove(&key) {
                self.settled.insert(key, active.tween.to);
            }
        }
    }
}

impl Animator for TweenAnimator {
    fn backend(&self) -> AnimationBackend {
        AnimationBackend::Tween
    }

    fn play(&mut self, now: Duration, tween: Tween) -> Duration {
        self.settle(now);
        let key = (tween.target.clone(), tween.property.clone());
        self.settled.remove(&key);
        let active = ActiveTween {
            tween,
            started: now,
        };
        let ends_at = active.ends_at();
        self.active.insert(key, active);
        ends_at
    }

    fn values(&self, now: Duration) -> Vec<(String, String, f32)> {
        let mut values: BTreeMap<&PropertyKey, f32> =
            self.settled.iter().map(|(key, value)| (key, *value)).collect();
        for (key, active) in &self.active {
            values.insert(key, active.tween.value_at(active.started, now));
        }
        values
            .into_iter()
            .map(|((target, property), value)| (target.clone(), property.clone(), value))
            .collect()
    }

    fn is_animating(&self, now: Duration) -> bool {
        self.active.values().any(|active| active.ends_at() > now)
    }

    fn cancel_all(&mut self, now: Duration) {
        let active = std::mem::take(&mut self.active);
        for (key, running) in active {
            let value = running.tween.value_at(running.started, now);
            self.settled.insert(key, value);
        }
    }
}

/// Fallback used when no animation capability is wanted: end states are set
/// synchronously.
#[derive(Debug, Default)]
pub struct InstantAnimator {
    settled: BTreeMap<PropertyKey, f32>,
}

impl InstantAnimator {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Animator for InstantAnimator {
    fn backend(&self) -> AnimationBackend {
        AnimationBackend::Instant
    }

    fn play(&mut self, now: Duration, tween: Tween) -> Duration {
        self.settled
            .insert((tween.target, tween.property), tween.to);
        now
    }

    fn values(&self, _now: Duration) -> Vec<(String, String, f32)> {
        self.settled
            .iter()
            .map(|((target, property), value)| (target.clone(), property.clone(), *value))
            .collect()
    }

    fn is_animating(&self, _now: Duration) -> bool {
        false
    }

    fn cancel_all(&mut self, _now: Duration) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secs(value: f32) -> Duration {
        Duration::from_secs_f32(value)
    }

    #[test]
    fn tween_interpolates_and_settles() {
        let mut animator = TweenAnimator::new();
        let tween = Tween::new("cover", "rotate_y", 0.0, -160.0, secs(1.6)).ease(Ease::Linear);
        let done = animator.play(Duration::ZERO, tween);

        assert_eq!(done, secs(1.6));
        let halfway = animator.values(secs(0.8));
        assert!((halfway[0].2 + 80.0).abs() < 0.01);
        assert!(animator.is_animating(secs(0.8)));
        assert!(!animator.is_animating(secs(2.0)));

        let mut view = RenderGraph::new();
        animator.apply(secs(2.0), &mut view);
        assert_eq!(view.prop("cover", "rotate_y"), Some(-160.0));
    }

    #[test]
    fn instant_backend_completes_immediately() {
        let mut animator = make_animator(AnimationBackend::Instant);
        let now = secs(3.0);
        let done = animator.play(now, Tween::new("line", "opacity", 0.0, 1.0, secs(0.7)));

        assert_eq!(done, now);
        assert_eq!(animator.values(now), vec![("line".to_string(), "opacity".to_string(), 1.0)]);
    }

    #[test]
    fn delay_holds_start_value() {
        let mut animator = TweenAnimator::new();
        animator.play(
            Duration::ZERO,
            Tween::new("content", "opacity", 0.0, 1.0, secs(0.6)).delay(secs(0.2)),
        );
        assert_eq!(animator.values(secs(0.1))[0].2, 0.0);
    }

    #[test]
    fn easing_hits_endpoints() {
        for ease in [Ease::Linear, Ease::PowerOut(3), Ease::PowerInOut(2)] {
            assert_eq!(ease.apply(0.0), 0.0);
            assert!((ease.apply(1.0) - 1.0).abs() < f32::EPSILON);
        }
    }

    #[test]
    fn cancel_freezes_values() {
        let mut animator = TweenAnimator::new();
        animator.play(
            Duration::ZERO,
            Tween::new("x", "y", 0.0, 10.0, secs(1.0)).ease(Ease::Linear),
        );
        animator.cancel_all(secs(0.5));
        assert!(!animator.is_animating(secs(0.6)));
        assert!((animator.values(secs(5.0))[0].2 - 5.0).abs() < 0.01);
    }
}
