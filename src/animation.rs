//! Animation time keeping.
//!
//! Evaluating animation curves is the animator's business. This module only makes
//! sure the animator is fed the right amount of time, including time that passed
//! while the scene was not drawn.

use crate::data_structures::graph::ImportedScene;

/// Receives elapsed time. Implementations sample their curves however they like.
pub trait Animator {
    fn advance(&mut self, seconds: f64);
}

/// Defers animator updates during silent frames without losing their time.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct AnimationClock {
    carried: f64,
}

impl AnimationClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Silent frames only add to the carried time. A visible frame hands
    /// `delta + carried` to the animator, resets the carry and returns what was
    /// delivered.
    pub fn advance(&mut self, delta: f64, silent: bool, animator: &mut dyn Animator) -> Option<f64> {
        if silent {
            self.carried += delta;
            return None;
        }
        let delivered = delta + self.carried;
        self.carried = 0.0;
        animator.advance(delivered);
        Some(delivered)
    }

    /// Time accumulated by silent frames and not yet delivered.
    pub fn carried(&self) -> f64 {
        self.carried
    }
}

/// Looping playback position over a single clip.
#[derive(Clone, Debug, PartialEq)]
pub struct ClipCursor {
    pub speed: f64,
    pub looping: bool,
    duration: f64,
    time: f64,
}

impl ClipCursor {
    pub fn new(duration: f64) -> Self {
        Self {
            speed: 1.0,
            looping: true,
            duration: duration.max(0.0),
            time: 0.0,
        }
    }

    /// Cursor over the longest animation of `scene` (zero length if there is none).
    pub fn from_scene(scene: &ImportedScene) -> Self {
        let duration = scene
            .animations
            .iter()
            .map(|animation| animation.duration)
            .fold(0.0, f64::max);
        Self::new(duration)
    }

    pub fn time(&self) -> f64 {
        self.time
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }
}

impl Animator for ClipCursor {
    fn advance(&mut self, seconds: f64) {
        if self.duration <= 0.0 {
            return;
        }
        self.time += seconds * self.speed;
        if self.looping {
            self.time = self.time.rem_euclid(self.duration);
        } else {
            self.time = self.time.clamp(0.0, self.duration);
        }
    }
}
