//! Per-layer morph progress between the scattered (0) and formed (1) states.
//!
//! Progress is a continuous scalar rather than a discrete state so the
//! renderer can blend. The target flips instantly on toggle; progress then
//! chases it every frame.

use serde::{Deserialize, Serialize};

/// How progress approaches its target each frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SmoothingMode {
    /// `progress += (target - progress) * (1 - exp(-rate * dt))`.
    /// Same transient regardless of frame rate.
    #[default]
    Exponential,
    /// `progress += (target - progress) * rate * dt`, the first-order form.
    /// Converges to the same fixed point but its transient depends on dt.
    Linear,
}

/// Distance from the target below which a layer counts as settled.
pub const SETTLED_EPSILON: f32 = 0.01;

/// Morph state for a single layer.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MorphController {
    progress: f32,
    target: f32,
    rate: f32,
    mode: SmoothingMode,
}

impl MorphController {
    /// Start settled at the initial display state.
    pub fn new(rate: f32, formed: bool, mode: SmoothingMode) -> Self {
        let value = if formed { 1.0 } else { 0.0 };
        Self {
            progress: value,
            target: value,
            rate,
            mode,
        }
    }

    /// Flip the target. Progress is left alone.
    pub fn set_formed(&mut self, formed: bool) {
        self.target = if formed { 1.0 } else { 0.0 };
    }

    /// Advance by `dt` seconds and return the new progress.
    pub fn step(&mut self, dt: f32) -> f32 {
        if !(dt > 0.0) {
            return self.progress;
        }

        let blend = match self.mode {
            SmoothingMode::Exponential => 1.0 - (-self.rate * dt).exp(),
            // Clamp so a long frame lands on the target instead of overshooting.
            SmoothingMode::Linear => (self.rate * dt).min(1.0),
        };

        self.progress += (self.target - self.progress) * blend;
        self.progress = self.progress.clamp(0.0, 1.0);
        self.progress
    }

    pub fn progress(&self) -> f32 {
        self.progress
    }

    pub fn target(&self) -> f32 {
        self.target
    }

    pub fn is_formed_target(&self) -> bool {
        self.target >= 0.5
    }

    pub fn rate(&self) -> f32 {
        self.rate
    }

    pub fn mode(&self) -> SmoothingMode {
        self.mode
    }

    /// Within [`SETTLED_EPSILON`] of the target.
    pub fn is_settled(&self) -> bool {
        (self.progress - self.target).abs() < SETTLED_EPSILON
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn converge(mode: SmoothingMode, formed: bool) {
        let rate = 2.0;
        let dt = 1.0 / 60.0;
        let mut morph = MorphController::new(rate, !formed, mode);
        morph.set_formed(formed);

        // Bounded by a few time constants.
        let max_steps = (5.0 / (rate * dt)).ceil() as usize;
        let mut prev = morph.progress();
        let mut settled_at = None;
        for i in 0..max_steps {
            let p = morph.step(dt);
            if formed {
                assert!(p >= prev, "progress must not decrease toward 1");
            } else {
                assert!(p <= prev, "progress must not increase toward 0");
            }
            prev = p;
            if settled_at.is_none() && morph.is_settled() {
                settled_at = Some(i);
            }
        }
        assert!(settled_at.is_some(), "{:?} did not settle", mode);
    }

    #[test]
    fn test_exponential_converges_to_formed() {
        converge(SmoothingMode::Exponential, true);
    }

    #[test]
    fn test_exponential_converges_to_scattered() {
        converge(SmoothingMode::Exponential, false);
    }

    #[test]
    fn test_linear_converges_both_ways() {
        converge(SmoothingMode::Linear, true);
        converge(SmoothingMode::Linear, false);
    }

    #[test]
    fn test_initial_state_is_settled() {
        let formed = MorphController::new(1.5, true, SmoothingMode::Exponential);
        assert_eq!(formed.progress(), 1.0);
        assert!(formed.is_settled());

        let scattered = MorphController::new(1.5, false, SmoothingMode::Exponential);
        assert_eq!(scattered.progress(), 0.0);
        assert!(scattered.is_settled());
    }

    #[test]
    fn test_toggle_does_not_jump_progress() {
        let mut morph = MorphController::new(2.0, true, SmoothingMode::Exponential);
        morph.set_formed(false);
        assert_eq!(morph.progress(), 1.0);
        assert_eq!(morph.target(), 0.0);
        assert!(!morph.is_settled());
    }

    #[test]
    fn test_slower_rate_lags_behind() {
        let mut foliage = MorphController::new(1.5, false, SmoothingMode::Exponential);
        let mut ornament = MorphController::new(2.0, false, SmoothingMode::Exponential);
        foliage.set_formed(true);
        ornament.set_formed(true);
        for _ in 0..30 {
            foliage.step(1.0 / 60.0);
            ornament.step(1.0 / 60.0);
        }
        assert!(foliage.progress() < ornament.progress());
    }

    #[test]
    fn test_long_frame_does_not_overshoot() {
        let mut morph = MorphController::new(2.0, false, SmoothingMode::Linear);
        morph.set_formed(true);
        assert_eq!(morph.step(5.0), 1.0);

        let mut morph = MorphController::new(2.0, false, SmoothingMode::Exponential);
        morph.set_formed(true);
        let p = morph.step(5.0);
        assert!(p > 0.99 && p <= 1.0);
    }

    #[test]
    fn test_zero_or_negative_dt_is_noop() {
        let mut morph = MorphController::new(2.0, false, SmoothingMode::Exponential);
        morph.set_formed(true);
        assert_eq!(morph.step(0.0), 0.0);
        assert_eq!(morph.step(-1.0), 0.0);
        assert_eq!(morph.step(f32::NAN), 0.0);
    }
}
