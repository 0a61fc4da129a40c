use std::f64::consts::TAU;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::dsp::history::HistoryBuffer;

/*
| type              | numerator b0, b1, b2            | passes          | rejects      |
| ----------------- | ------------------------------- | --------------- | ------------ |
| low-pass          | (1-cos)/2, 1-cos, (1-cos)/2     | below cutoff    | above cutoff |
| high-pass         | (1+cos)/2, -(1+cos), (1+cos)/2  | above cutoff    | below cutoff |
| band-pass         | sin/2, 0, -sin/2                | around cutoff   | outside      |
| notch / band-stop | 1, -2cos, 1                     | outside         | around       |

All four share the RBJ denominator:

    w0    = 2π · cutoff / sample_rate
    alpha = sin(w0) / (2·Q)
    a     = [1 + alpha, -2·cos(w0), 1 - alpha]

and the normalised recurrence

    y0 = c1·x[0] + c2·x[1] + c3·x[2] - c4·y[0] - c5·y[1]

where x[k] / y[k] are the input / output k samples back (y[0] is the
previous output, because y0 is pushed only after it is computed).
*/

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BiquadKind {
    LowPass,
    HighPass,
    BandPass,
    Notch,
}

/// Normalised biquad coefficients `[c1, c2, c3, c4, c5]`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BiquadCoefficients(pub [f64; 5]);

impl BiquadCoefficients {
    pub fn design(kind: BiquadKind, cutoff_hz: f64, q: f64, sample_rate: f64) -> Self {
        let w0 = TAU * (cutoff_hz / sample_rate);
        let (sin_w0, cos_w0) = w0.sin_cos();
        let alpha = sin_w0 / (2.0 * q);

        let a = [1.0 + alpha, -2.0 * cos_w0, 1.0 - alpha];
        let b = match kind {
            BiquadKind::LowPass => [(1.0 - cos_w0) / 2.0, 1.0 - cos_w0, (1.0 - cos_w0) / 2.0],
            BiquadKind::HighPass => [(1.0 + cos_w0) / 2.0, -(1.0 + cos_w0), (1.0 + cos_w0) / 2.0],
            BiquadKind::BandPass => [sin_w0 / 2.0, 0.0, -sin_w0 / 2.0],
            BiquadKind::Notch => [1.0, -2.0 * cos_w0, 1.0],
        };

        Self([b[0] / a[0], b[1] / a[0], b[2] / a[0], a[1] / a[0], a[2] / a[0]])
    }
}

/// Second-order IIR section over two history buffers.
#[derive(Debug, Clone)]
pub struct Biquad {
    kind: BiquadKind,
    coefficients: BiquadCoefficients,
    inputs: HistoryBuffer,
    outputs: HistoryBuffer,
}

impl Biquad {
    pub fn new(kind: BiquadKind) -> Self {
        Self {
            kind,
            coefficients: BiquadCoefficients::default(),
            inputs: HistoryBuffer::with_lag(2),
            outputs: HistoryBuffer::with_lag(1),
        }
    }

    pub fn kind(&self) -> BiquadKind {
        self.kind
    }

    pub fn coefficients(&self) -> BiquadCoefficients {
        self.coefficients
    }

    /// Recompute coefficients. Callers only do this when cutoff or Q changed.
    pub fn design(&mut self, cutoff_hz: f64, q: f64, sample_rate: f64) {
        self.coefficients = BiquadCoefficients::design(self.kind, cutoff_hz, q, sample_rate);
    }

    #[inline]
    pub fn next_sample(&mut self, sample: f64) -> f64 {
        let [c1, c2, c3, c4, c5] = self.coefficients.0;
        self.inputs.push(sample);
        let y0 = c1 * self.inputs.get(0) + c2 * self.inputs.get(1) + c3 * self.inputs.get(2)
            - c4 * self.outputs.get(0)
            - c5 * self.outputs.get(1);
        self.outputs.push(y0);
        y0
    }

    pub fn reset(&mut self) {
        self.inputs.reset();
        self.outputs.reset();
    }
}

/// Single-pole allpass; the cutoff sets the phase-shift corner.
#[derive(Debug, Clone, Default)]
pub struct Allpass {
    last: f64,
}

impl Allpass {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn next_sample(&mut self, sample: f64, cutoff_hz: f64, sample_rate: f64) -> f64 {
        let delay = cutoff_hz / sample_rate;
        let c = (1.0 - delay) / (1.0 + delay);
        let y0 = -c * sample + self.last;
        self.last = c * y0 + sample;
        y0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsp::oscillator::{Phasor, Waveform};

    const SAMPLE_RATE: f64 = 48_000.0;

    fn peak_after_transient(buffer: &[f64]) -> f64 {
        let skip = buffer.len().min(256);
        buffer
            .get(skip..)
            .unwrap_or(buffer)
            .iter()
            .fold(0.0f64, |acc, &x| acc.max(x.abs()))
    }

    fn filtered_sine(kind: BiquadKind, cutoff: f64, freq: f64) -> Vec<f64> {
        let mut filter = Biquad::new(kind);
        filter.design(cutoff, 0.707, SAMPLE_RATE);
        let mut phasor = Phasor::new();
        phasor.set_frequency(freq, SAMPLE_RATE);
        (0..4096)
            .map(|_| filter.next_sample(Waveform::Sine.sample(phasor.advance(), 0.0)))
            .collect()
    }

    #[test]
    fn test_lowpass_dc_gain_is_unity() {
        let mut filter = Biquad::new(BiquadKind::LowPass);
        filter.design(500.0, 0.707, SAMPLE_RATE);
        let mut last = 0.0;
        for _ in 0..4096 {
            last = filter.next_sample(1.0);
        }
        assert!((last - 1.0).abs() < 1e-6, "settled at {}", last);
    }

    #[test]
    fn test_highpass_blocks_dc() {
        let mut filter = Biquad::new(BiquadKind::HighPass);
        filter.design(500.0, 0.707, SAMPLE_RATE);
        let mut last = 1.0;
        for _ in 0..4096 {
            last = filter.next_sample(1.0);
        }
        assert!(last.abs() < 1e-6, "settled at {}", last);
    }

    #[test]
    fn test_lowpass_attenuates_high_more_than_low() {
        let low = peak_after_transient(&filtered_sine(BiquadKind::LowPass, 1_000.0, 100.0));
        let high = peak_after_transient(&filtered_sine(BiquadKind::LowPass, 1_000.0, 10_000.0));
        assert!(
            high * 10.0 < low,
            "expected strong high attenuation, got low={}, high={}",
            low,
            high
        );
    }

    #[test]
    fn test_bandpass_emphasizes_cutoff_frequency() {
        let pass = peak_after_transient(&filtered_sine(BiquadKind::BandPass, 1_000.0, 1_000.0));
        let off = peak_after_transient(&filtered_sine(BiquadKind::BandPass, 1_000.0, 100.0));
        assert!(
            pass > off * 2.0,
            "expected bandpass to emphasize cutoff freq, got pass={}, off={}",
            pass,
            off
        );
    }

    #[test]
    fn test_notch_rejects_cutoff_frequency() {
        let center = peak_after_transient(&filtered_sine(BiquadKind::Notch, 1_000.0, 1_000.0));
        let off = peak_after_transient(&filtered_sine(BiquadKind::Notch, 1_000.0, 100.0));
        assert!(
            center * 2.0 < off,
            "expected notch to reject center freq, got center={}, off={}",
            center,
            off
        );
    }

    #[test]
    fn test_allpass_preserves_energy() {
        let mut allpass = Allpass::new();
        let mut phasor = Phasor::new();
        phasor.set_frequency(440.0, SAMPLE_RATE);
        let out: Vec<f64> = (0..8192)
            .map(|_| allpass.next_sample(Waveform::Sine.sample(phasor.advance(), 0.0), 800.0, SAMPLE_RATE))
            .collect();
        let peak = peak_after_transient(&out);
        assert!((peak - 1.0).abs() < 0.05, "allpass changed amplitude: {}", peak);
    }
}
