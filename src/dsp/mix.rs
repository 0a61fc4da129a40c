/// Linear crossfade: `ratio` 0 yields `dry`, 1 yields `wet`.
#[inline]
pub fn interpolate(dry: f64, wet: f64, ratio: f64) -> f64 {
    dry * (1.0 - ratio) + wet * ratio
}
