/*
PCM Conversion
==============

Graph output is an unbounded f64. Sinks take signed 16-bit PCM, produced by a
fixed linear scale with ample headroom:

    pcm = clamp(trunc(x · 65535 / 20), i16::MIN, i16::MAX)

so full scale (±1.0) lands at ±3276, a tenth of the available range, and a
mix of roughly ten full-scale voices still fits before it clips. NaN encodes
as silence.
*/

/// Multiplier from graph units to PCM steps.
pub const HEADROOM_SCALE: f64 = 65_535.0 / 20.0;

#[inline]
pub fn encode_sample(value: f64) -> i16 {
    let scaled = (value * HEADROOM_SCALE).trunc();
    if scaled.is_nan() {
        return 0;
    }
    scaled.clamp(i16::MIN as f64, i16::MAX as f64) as i16
}

/// Normalised float sample for device output, where 1.0 is full scale.
#[inline]
pub fn pcm_to_f32(sample: i16) -> f32 {
    sample as f32 / 32_768.0
}
