/*
Scale Masks
===========

A scale is a 12-entry mask over pitch classes: entry `i` says whether the
semitone `i` above C is allowed. Quantizing a note walks downwards from the
(truncated) note until it lands on an allowed pitch class, so the result is
always the nearest scale note at or below the input, in the same octave or
the one below.

    C  C# D  D# E  F  F# G  G# A  A# B
    1  0  1  0  1  1  0  1  0  1  0  1      major, root 0

    quantize(61) → 61 % 12 = 1 (C#) is off → 60 (C) is on → 60

Named scales are stored as interval masks relative to their tonic and
rotated up to the requested root:

    mask[pc] = intervals[(pc - root) mod 12]

so `major` with root 2 allows D E F# G A B C#.
*/

use crate::error::BuildError;

const MAJOR: [bool; 12] = mask(&[0, 2, 4, 5, 7, 9, 11]);
const MINOR: [bool; 12] = mask(&[0, 2, 3, 5, 7, 8, 10]);
const HARMONIC_MINOR: [bool; 12] = mask(&[0, 2, 3, 5, 7, 8, 11]);
const PENTATONIC: [bool; 12] = mask(&[0, 2, 4, 7, 9]);
const MINOR_PENTATONIC: [bool; 12] = mask(&[0, 3, 5, 7, 10]);
const BLUES: [bool; 12] = mask(&[0, 3, 5, 6, 7, 10]);
const CHROMATIC: [bool; 12] = [true; 12];

const fn mask(degrees: &[usize]) -> [bool; 12] {
    let mut out = [false; 12];
    let mut i = 0;
    while i < degrees.len() {
        out[degrees[i]] = true;
        i += 1;
    }
    out
}

/// Scale names accepted by [`ScaleMask::named`].
pub const SCALE_NAMES: &[&str] = &[
    "major",
    "minor",
    "harmonic_minor",
    "pentatonic",
    "minor_pentatonic",
    "blues",
    "chromatic",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScaleMask([bool; 12]);

impl ScaleMask {
    /// Build from an explicit mask; at least one pitch class must be allowed.
    pub fn new(mask: [bool; 12]) -> Result<Self, BuildError> {
        if !mask.iter().any(|&on| on) {
            return Err(BuildError::EmptyScale);
        }
        Ok(Self(mask))
    }

    pub fn major(root: i64) -> Result<Self, BuildError> {
        Self::named("major", root)
    }

    pub fn named(name: &str, root: i64) -> Result<Self, BuildError> {
        let intervals = match name {
            "major" => MAJOR,
            "minor" => MINOR,
            "harmonic_minor" => HARMONIC_MINOR,
            "pentatonic" => PENTATONIC,
            "minor_pentatonic" => MINOR_PENTATONIC,
            "blues" => BLUES,
            "chromatic" => CHROMATIC,
            other => return Err(BuildError::UnknownScale(other.to_string())),
        };
        if !(0..12).contains(&root) {
            return Err(BuildError::InvalidRoot(root));
        }
        let root = root as usize;
        let mut rotated = [false; 12];
        for (pc, slot) in rotated.iter_mut().enumerate() {
            *slot = intervals[(pc + 12 - root) % 12];
        }
        Ok(Self(rotated))
    }

    pub fn allows(&self, note: i64) -> bool {
        self.0[note.rem_euclid(12) as usize]
    }

    pub fn as_array(&self) -> [bool; 12] {
        self.0
    }

    /// Truncate `note` and step down to the nearest allowed pitch class.
    pub fn quantize(&self, note: f64) -> f64 {
        let mut note = note.trunc().clamp(-1e9, 1e9) as i64;
        // A non-empty mask is hit within 12 steps.
        for _ in 0..12 {
            if self.allows(note) {
                break;
            }
            note -= 1;
        }
        note as f64
    }
}
