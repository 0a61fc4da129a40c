/*
Rhythm Patterns
===============

A rhythm turns a steadily counting beat into an irregular but repeating
pulse. It is described by note-duration weights; their running sums (minus
one) say at which beat of the cycle each note lands.

  weights   [1, 2, 1]
  offsets   [0, 2, 3]          cumulative: 1-1, 3-1, 4-1
  cycle n   3 entries

Mapping a beat b (an integer) onto the pattern:

    position(b) = floor(b / n) · n + offsets[b mod n]

  b         0  1  2  3  4  5  6
  position  0  2  3  3  5  6  6

Feeding the position into a trigger fires once per pattern step, and the
uneven gaps between positions are the rhythm.
*/

use crate::error::BuildError;

#[derive(Debug, Clone, PartialEq)]
pub struct RhythmPattern {
    offsets: Vec<f64>,
}

impl RhythmPattern {
    pub fn new(weights: &[f64]) -> Result<Self, BuildError> {
        if weights.is_empty() {
            return Err(BuildError::invalid("rhythm", "needs at least one weight"));
        }
        if let Some(bad) = weights.iter().find(|w| !w.is_finite()) {
            return Err(BuildError::invalid(
                "rhythm",
                format!("weight {} is not finite", bad),
            ));
        }
        let offsets = weights
            .iter()
            .scan(0.0, |beat, &w| {
                *beat += w;
                Some(*beat - 1.0)
            })
            .collect();
        Ok(Self { offsets })
    }

    pub fn offsets(&self) -> &[f64] {
        &self.offsets
    }

    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }

    pub fn position(&self, beat: i64) -> f64 {
        let n = self.offsets.len() as i64;
        (beat.div_euclid(n) * n) as f64 + self.offsets[beat.rem_euclid(n) as usize]
    }
}
