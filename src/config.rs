// Copyright (C) 2026 Michael Wilson <mike@mdwn.dev>
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, version 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//
use std::time::Duration;

const MICROS_PER_SECOND: f64 = 1_000_000.0;

/// Typed error for click configuration problems. All of these are fatal at
/// startup; none of them is retried.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("no output channel selected, enable at least one of left/right")]
    NoChannelSelected,
    #[error("BPM must be greater than zero, got {0}")]
    InvalidBpm(f64),
    #[error("sample rate must be greater than zero, got {0}")]
    InvalidSampleRate(f64),
    #[error("pulse width must not be negative, got {0}ms")]
    InvalidPulseWidth(f64),
    #[error("volume must not be negative, got {0}")]
    InvalidVolume(f64),
}

/// The click configuration. Immutable for the lifetime of a run; both the
/// tempo driver and the click generator are constructed from it.
#[derive(Clone, Copy, Debug)]
pub struct ClickConfig {
    /// Beats per minute.
    bpm: f64,
    /// The output sample rate in Hz.
    sample_rate: f64,
    /// How long the pulse stays audible within a beat, in microseconds.
    pulse_width: f64,
    /// The output amplitude. 1.0 is full scale; values are not clamped.
    volume: f64,
    /// Extra delay before each beat trigger is posted. Compensates for
    /// downstream output latency.
    tune_latency: Duration,
    /// Whether the click is sent to the left channel.
    left: bool,
    /// Whether the click is sent to the right channel.
    right: bool,
}

impl ClickConfig {
    /// Creates a validated click configuration. The pulse width is taken in
    /// milliseconds, matching the CLI, and stored in microseconds.
    pub fn new(
        bpm: f64,
        sample_rate: f64,
        pulse_width_ms: f64,
        volume: f64,
        tune_latency: Duration,
        left: bool,
        right: bool,
    ) -> Result<ClickConfig, ConfigError> {
        if !left && !right {
            return Err(ConfigError::NoChannelSelected);
        }
        // Negated comparisons so that NaN fails validation too.
        if !(bpm > 0.0) {
            return Err(ConfigError::InvalidBpm(bpm));
        }
        if !(sample_rate > 0.0) {
            return Err(ConfigError::InvalidSampleRate(sample_rate));
        }
        if !(pulse_width_ms >= 0.0) {
            return Err(ConfigError::InvalidPulseWidth(pulse_width_ms));
        }
        if !(volume >= 0.0) {
            return Err(ConfigError::InvalidVolume(volume));
        }

        Ok(ClickConfig {
            bpm,
            sample_rate,
            pulse_width: pulse_width_ms * 1000.0,
            volume,
            tune_latency,
            left,
            right,
        })
    }

    /// Returns the configured tempo in beats per minute.
    pub fn bpm(&self) -> f64 {
        self.bpm
    }

    /// Returns the output sample rate in Hz.
    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    /// Returns the pulse width in microseconds.
    pub fn pulse_width(&self) -> f64 {
        self.pulse_width
    }

    /// Returns the output amplitude.
    pub fn volume(&self) -> f64 {
        self.volume
    }

    /// Returns the extra delay inserted before each beat trigger is posted.
    pub fn tune_latency(&self) -> Duration {
        self.tune_latency
    }

    /// Returns true if the click goes to the left channel.
    pub fn left(&self) -> bool {
        self.left
    }

    /// Returns true if the click goes to the right channel.
    pub fn right(&self) -> bool {
        self.right
    }

    /// The interval between beats.
    pub fn beat_interval(&self) -> Duration {
        Duration::from_secs_f64(60.0 / self.bpm)
    }

    /// The number of samples in one full beat at the configured tempo.
    pub fn beat_period_samples(&self) -> f64 {
        self.sample_rate * 60.0 / self.bpm
    }

    /// The number of samples the pulse stays audible within a beat.
    pub fn pulse_window_samples(&self) -> f64 {
        self.sample_rate * self.pulse_width / MICROS_PER_SECOND
    }
}
