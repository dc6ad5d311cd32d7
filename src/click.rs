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
use crate::config::ClickConfig;
use crate::trigger::TriggerReceiver;

/// The number of interleaved lanes in an output frame. The click is defined
/// on a stereo frame: lane 0 is left, lane 1 is right.
pub const CHANNELS: usize = 2;

/// The per-sample click state machine. Owned by the audio output callback,
/// which is the only thread that touches it; the tempo driver communicates
/// with it exclusively through the trigger queue.
pub struct ClickGenerator {
    /// Amplitude emitted while the pulse is audible.
    volume: f64,
    /// Whether the click goes to the left lane.
    left: bool,
    /// Whether the click goes to the right lane.
    right: bool,
    /// Samples the pulse stays audible after a trigger.
    pulse_window_samples: f64,
    /// Samples in one full beat.
    beat_period_samples: f64,
    /// Incoming beat triggers from the tempo driver.
    triggers: TriggerReceiver,
    /// Whether a pulse is currently sounding.
    activated: bool,
    /// Samples since the pulse was last (re)armed.
    sample_counter: f64,
}

impl ClickGenerator {
    /// Creates a generator in the silent state. No pulse sounds until the
    /// first trigger arrives.
    pub fn new(config: &ClickConfig, triggers: TriggerReceiver) -> ClickGenerator {
        ClickGenerator {
            volume: config.volume(),
            left: config.left(),
            right: config.right(),
            pulse_window_samples: config.pulse_window_samples(),
            beat_period_samples: config.beat_period_samples(),
            triggers,
            activated: false,
            sample_counter: 0.0,
        }
    }

    /// Fills the interleaved stereo buffer with the next block of samples.
    /// Never blocks and never allocates; silence is a valid value while no
    /// pulse is sounding, so the stream never underruns on its own.
    pub fn fill(&mut self, data: &mut [f32]) {
        for frame in data.chunks_exact_mut(CHANNELS) {
            // At most one trigger is consumed per frame. A trigger landing
            // mid-pulse restarts the window: last trigger wins.
            if self.triggers.try_recv().is_some() {
                self.activated = true;
                self.sample_counter = 0.0;
            }

            let sample = if self.activated && self.sample_counter < self.pulse_window_samples {
                self.volume as f32
            } else {
                0.0
            };

            frame[0] = if self.left { sample } else { 0.0 };
            frame[1] = if self.right { sample } else { 0.0 };

            self.sample_counter += 1.0;
            if self.sample_counter > self.beat_period_samples {
                self.sample_counter = 0.0;
                self.activated = false;
            }
        }
    }
}

#[cfg(test)]
mod test {
    use std::time::Duration;

    use crate::config::ClickConfig;
    use crate::trigger::{self, TriggerSender};

    use super::{ClickGenerator, CHANNELS};

    fn new_generator(
        bpm: f64,
        sample_rate: f64,
        pulse_width_ms: f64,
        volume: f64,
        left: bool,
        right: bool,
    ) -> (ClickGenerator, TriggerSender) {
        let config = ClickConfig::new(
            bpm,
            sample_rate,
            pulse_width_ms,
            volume,
            Duration::ZERO,
            left,
            right,
        )
        .expect("valid config");
        let (tx, rx) = trigger::channel();
        (ClickGenerator::new(&config, rx), tx)
    }

    fn fill_frames(generator: &mut ClickGenerator, frames: usize) -> Vec<f32> {
        let mut data = vec![0.0f32; frames * CHANNELS];
        generator.fill(&mut data);
        data
    }

    fn frame(data: &[f32], n: usize) -> (f32, f32) {
        (data[n * CHANNELS], data[n * CHANNELS + 1])
    }

    #[test]
    fn test_silent_until_triggered() {
        let (mut generator, _tx) = new_generator(120.0, 8000.0, 10.0, 1.0, true, true);

        let data = fill_frames(&mut generator, 512);
        assert!(data.iter().all(|sample| *sample == 0.0));
    }

    // 120 BPM at 8kHz with a 10ms pulse is a 4000-sample beat with an
    // 80-sample window.
    #[test]
    fn test_one_beat_after_one_trigger() {
        let (mut generator, tx) = new_generator(120.0, 8000.0, 10.0, 1.0, true, true);

        assert!(tx.try_send());
        let data = fill_frames(&mut generator, 4000);

        for n in 0..80 {
            assert_eq!((1.0, 1.0), frame(&data, n), "frame {} should be active", n);
        }
        for n in 80..4000 {
            assert_eq!((0.0, 0.0), frame(&data, n), "frame {} should be silent", n);
        }
    }

    #[test]
    fn test_pulse_window_boundary_is_strict() {
        // 44100 * 4800us / 1e6 = 211.68 samples: the last active sample
        // index is 211, the first silent one is 212.
        let (mut generator, tx) = new_generator(60.0, 44100.0, 4.8, 0.8, true, true);

        assert!(tx.try_send());
        let data = fill_frames(&mut generator, 300);

        assert_eq!((0.8, 0.8), frame(&data, 210));
        assert_eq!((0.8, 0.8), frame(&data, 211));
        assert_eq!((0.0, 0.0), frame(&data, 212));
    }

    #[test]
    fn test_trigger_mid_pulse_restarts_window() {
        let (mut generator, tx) = new_generator(120.0, 8000.0, 10.0, 1.0, true, true);

        assert!(tx.try_send());
        let data = fill_frames(&mut generator, 40);
        assert!(data.iter().all(|sample| *sample == 1.0));

        // Re-arming 40 samples in buys a full 80-sample window again, not
        // the 40 remaining ones.
        assert!(tx.try_send());
        let data = fill_frames(&mut generator, 80);
        assert!(data.iter().all(|sample| *sample == 1.0));

        let data = fill_frames(&mut generator, 1);
        assert_eq!((0.0, 0.0), frame(&data, 0));
    }

    #[test]
    fn test_channel_masking() {
        let (mut generator, tx) = new_generator(120.0, 8000.0, 10.0, 1.0, true, false);
        assert!(tx.try_send());
        let data = fill_frames(&mut generator, 4000);
        for n in 0..4000 {
            let (left, right) = frame(&data, n);
            assert_eq!(0.0, right, "right lane must stay silent at frame {}", n);
            assert_eq!(if n < 80 { 1.0 } else { 0.0 }, left);
        }

        let (mut generator, tx) = new_generator(120.0, 8000.0, 10.0, 1.0, false, true);
        assert!(tx.try_send());
        let data = fill_frames(&mut generator, 4000);
        for n in 0..4000 {
            let (left, right) = frame(&data, n);
            assert_eq!(0.0, left, "left lane must stay silent at frame {}", n);
            assert_eq!(if n < 80 { 1.0 } else { 0.0 }, right);
        }
    }

    #[test]
    fn test_volume_is_passed_through_unscaled() {
        let (mut generator, tx) = new_generator(120.0, 8000.0, 10.0, 0.5, true, true);

        assert!(tx.try_send());
        let data = fill_frames(&mut generator, 80);
        assert!(data.iter().all(|sample| *sample == 0.5));
    }

    #[test]
    fn test_deactivates_when_beat_period_elapses() {
        // Pulse width (200ms = 200 samples at 1kHz) exceeding the beat
        // period (100 samples at 600 BPM) keeps the pulse audible until the
        // period rollover shuts it off.
        let (mut generator, tx) = new_generator(600.0, 1000.0, 200.0, 1.0, true, true);

        assert!(tx.try_send());
        let data = fill_frames(&mut generator, 101);
        assert!(data.iter().all(|sample| *sample == 1.0));

        let data = fill_frames(&mut generator, 50);
        assert!(data.iter().all(|sample| *sample == 0.0));
    }

    #[test]
    fn test_rearms_after_natural_rollover() {
        let (mut generator, tx) = new_generator(600.0, 1000.0, 10.0, 1.0, true, true);

        assert!(tx.try_send());
        // Run well past the 100-sample beat period, then re-trigger.
        let _ = fill_frames(&mut generator, 500);
        assert!(tx.try_send());

        let data = fill_frames(&mut generator, 10);
        assert!(data.iter().all(|sample| *sample == 1.0));
    }
}
