use serde::Deserialize;
use std::fs::OpenOptions;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("noise_suppression_level must be in [0, 4], got {0}")]
    NoiseSuppressionLevel(u8),
    #[error("auto_gain_dbfs must be in [0, 31], got {0}")]
    AutoGainDbfs(u8),
    #[error("volume_multiplier must be a finite, non-negative number, got {0}")]
    VolumeMultiplier(f32),
    #[error("audio_seconds_to_buffer must be in [0, 60], got {0}")]
    AudioSecondsToBuffer(f64),
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub audio: AudioSettings,
    pub wake_word: WakeWordSettings,
    pub debug_recording_dir: Option<PathBuf>,
    pub log: Log,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AudioSettings {
    /// 0 = disabled, 4 = max
    pub noise_suppression_level: u8,
    /// dBFS of automatic gain; 0 = disabled, 31 = max
    pub auto_gain_dbfs: u8,
    /// Applied directly to PCM samples.
    pub volume_multiplier: f32,
    pub is_vad_enabled: bool,
    /// Seconds of silence after the voice command has ended.
    pub silence_seconds: f32,
}

impl Default for AudioSettings {
    fn default() -> Self {
        Self {
            noise_suppression_level: 0,
            auto_gain_dbfs: 0,
            volume_multiplier: 1.0,
            is_vad_enabled: true,
            silence_seconds: 0.7,
        }
    }
}

impl AudioSettings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.noise_suppression_level > 4 {
            return Err(ConfigError::NoiseSuppressionLevel(
                self.noise_suppression_level,
            ));
        }
        if self.auto_gain_dbfs > 31 {
            return Err(ConfigError::AutoGainDbfs(self.auto_gain_dbfs));
        }
        if !self.volume_multiplier.is_finite() || self.volume_multiplier < 0.0 {
            return Err(ConfigError::VolumeMultiplier(self.volume_multiplier));
        }
        Ok(())
    }

    /// True if VAD, noise suppression or auto gain is enabled.
    pub fn needs_processor(&self) -> bool {
        self.is_vad_enabled || self.noise_suppression_level > 0 || self.auto_gain_dbfs > 0
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct WakeWordSettings {
    /// Seconds of silence before detection times out.
    pub timeout: Option<f64>,
    /// Seconds of audio to keep from before detection and forward to STT.
    pub audio_seconds_to_buffer: f64,
}

impl WakeWordSettings {
    pub const MAX_AUDIO_SECONDS_TO_BUFFER: f64 = 60.0;

    pub fn validate(&self) -> Result<(), ConfigError> {
        let secs = self.audio_seconds_to_buffer;
        if !(0.0..=Self::MAX_AUDIO_SECONDS_TO_BUFFER).contains(&secs) {
            return Err(ConfigError::AudioSecondsToBuffer(secs));
        }
        Ok(())
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
            .filter(|secs| secs.is_finite() && *secs >= 0.0)
            .map(Duration::from_secs_f64)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Log {
    pub directive: String,
}

impl Default for Log {
    fn default() -> Self {
        Self {
            directive: "info".to_string(),
        }
    }
}

impl TryFrom<PathBuf> for Config {
    type Error = anyhow::Error;

    fn try_from(value: PathBuf) -> Result<Self, Self::Error> {
        let file = OpenOptions::new().read(true).open(value)?;
        let config: Config = serde_yaml::from_reader(file)?;
        config.audio.validate()?;
        config.wake_word.validate()?;
        Ok(config)
    }
}
