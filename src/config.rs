use std::path::PathBuf;

use crate::error::EngineError;

pub const DEFAULT_SAMPLE_RATE: u32 = 44_100;
pub const DEFAULT_CHANNELS: u16 = 1;
/// Upper bound on output channels; every lane is a full graph copy.
pub const MAX_CHANNELS: u16 = 32;

/// Offline render target: the session ends after `duration_secs`.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct ExportConfig {
    pub path: PathBuf,
    pub duration_secs: f64,
}

impl ExportConfig {
    pub fn frames(&self, sample_rate: u32) -> u64 {
        (self.duration_secs * f64::from(sample_rate)).round() as u64
    }
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    pub sample_rate: u32,
    pub channels: u16,
    pub export: Option<ExportConfig>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sample_rate: DEFAULT_SAMPLE_RATE,
            channels: DEFAULT_CHANNELS,
            export: None,
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.sample_rate == 0 {
            return Err(EngineError::Config("sample rate must be positive".into()));
        }
        if self.channels == 0 || self.channels > MAX_CHANNELS {
            return Err(EngineError::Config(format!(
                "channel count must be between 1 and {}, got {}",
                MAX_CHANNELS, self.channels
            )));
        }
        if let Some(export) = &self.export {
            if !(export.duration_secs.is_finite() && export.duration_secs > 0.0) {
                return Err(EngineError::Config(format!(
                    "export duration must be positive, got {}",
                    export.duration_secs
                )));
            }
        }
        Ok(())
    }
}
