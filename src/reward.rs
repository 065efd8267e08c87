//! Goal-distance metrics and the shaped landing reward.

use nalgebra::Vector3;

/// Vertical distance under which the proximity latch fires.
pub const PROXIMITY_THRESHOLD: f64 = 20.0;
/// Floor applied to the closing speed before it enters the penalty base.
pub const MIN_SPEED: f64 = 0.05;
/// Speed at which the penalty base reaches zero.
pub const SPEED_SCALE: f64 = 1.0;
/// Stand-in for a speed penalty that evaluates to NaN.
pub const SPEED_PENALTY_FALLBACK: f64 = 0.01;

/// L1 distances between a position and the target.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct GoalMetrics {
    /// Distance over all three axes.
    pub dist: f64,
    /// Altitude gap.
    pub vdist: f64,
    /// Distance over the horizontal plane.
    pub hdist: f64,
}

impl GoalMetrics {
    pub fn measure(position: &Vector3<f64>, target: &Vector3<f64>) -> Self {
        let delta = (position - target).abs();
        GoalMetrics {
            dist: delta.sum(),
            vdist: delta.z,
            hdist: delta.x + delta.y,
        }
    }
}

/// `1 - vdist / init_vdist`: one at the target altitude, zero at the start
/// altitude, negative beyond it.
pub fn proximity_reward(vdist: f64, init_vdist: f64) -> f64 {
    1.0 - vdist / init_vdist
}

/// Penalises fast vertical closing. The exponent shrinks with the remaining
/// altitude gap, so the penalty fades out near the target.
pub fn speed_penalty(speed: f64, vdist: f64, init_vdist: f64) -> f64 {
    let base = 1.0 - speed.max(MIN_SPEED) / SPEED_SCALE;
    let penalty = base.powf(1.0 - vdist / init_vdist);
    if penalty.is_nan() {
        SPEED_PENALTY_FALLBACK
    } else {
        penalty
    }
}

/// Reward for one physics substep, scaled by `1 / action_repeat` so episode
/// totals do not depend on the repeat count.
///
/// `init_vdist == 0` is not guarded: the result is NaN or infinite.
pub fn shaped_reward(vdist: f64, init_vdist: f64, speed: f64, action_repeat: usize) -> f64 {
    proximity_reward(vdist, init_vdist) * speed_penalty(speed, vdist, init_vdist)
        / action_repeat as f64
}
