//! Saturation / Wavefolding
//!
//! Both saturators act only on the part of the signal above a cutoff
//! threshold and are odd-symmetric: a negative input is shaped as its
//! magnitude and then mirrored.
//!
//! # Soft saturation
//!
//! Below the cutoff the signal passes untouched. Between the cutoff and 1.0
//! the excess is squashed by a rational curve
//!
//!   f(x) = cutoff + d / (1 + (d / (1 - cutoff))²),   d = x - cutoff
//!
//! which is tangent to the identity at the cutoff and flattens towards
//! (cutoff + 1) / 2 at full scale. Anything louder than 1.0 is pinned there.
//!
//! # Hard saturation
//!
//!   f(x) = min(x, cutoff)
//!
//! # Wavefolding
//!
//! The folder scales the signal around a base offset, then reflects anything
//! outside [-1, 1] back inside, once per fold:
//!
//!   x > 1   →  2 - x
//!   x < -1  → -2 - x
//!
//! More folds (and more gain) means more reflections and brighter,
//! more metallic harmonics.

/// Fold counts above this are rejected at evaluation time.
pub const MAX_FOLDS: usize = 1024;

#[inline]
fn soft_knee(value: f64, cutoff: f64) -> f64 {
    if value < cutoff {
        value
    } else if value < 1.0 {
        let diff = value - cutoff;
        cutoff + diff / (1.0 + (diff / (1.0 - cutoff)).powi(2))
    } else {
        (cutoff + 1.0) / 2.0
    }
}

/// Smooth rational saturation above `cutoff`.
#[inline]
pub fn soft_saturate(sample: f64, cutoff: f64) -> f64 {
    if sample < 0.0 {
        -soft_knee(-sample, cutoff)
    } else {
        soft_knee(sample, cutoff)
    }
}

/// Hard limit at `cutoff`, mirrored for negative input.
#[inline]
pub fn hard_saturate(sample: f64, cutoff: f64) -> f64 {
    if sample < 0.0 {
        -(-sample).min(cutoff)
    } else {
        sample.min(cutoff)
    }
}

/// Scale around `base` by `gain * folds` and reflect into [-1, 1] `folds`
/// times. A negative count still scales but never reflects.
#[inline]
pub fn wavefold(sample: f64, folds: i64, gain: f64, base: f64) -> f64 {
    let mut x = (sample - base) * gain * folds as f64;
    for _ in 0..folds.max(0) {
        if x > 1.0 {
            x = 2.0 - x;
        } else if x < -1.0 {
            x = -2.0 - x;
        }
    }
    x + base
}
