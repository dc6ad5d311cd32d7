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
use std::{
    error::Error,
    fmt,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex,
    },
    time::Duration,
};

use tracing::{info, span, Level};

use crate::{
    click::{ClickGenerator, CHANNELS},
    config::ClickConfig,
    playsync::CancelHandle,
};

/// Frames pulled per block, mirroring a typical hardware callback size.
const BLOCK_FRAMES: usize = 512;

/// A mock device. Pumps the generator without touching any audio hardware
/// and records what would have been played.
#[derive(Clone)]
pub struct Device {
    name: String,
    is_playing: Arc<AtomicBool>,
    captured: Arc<Mutex<Vec<f32>>>,
}

impl Device {
    /// Gets the given mock device.
    pub fn get(name: &str) -> Device {
        Device {
            name: name.to_string(),
            is_playing: Arc::new(AtomicBool::new(false)),
            captured: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Returns true if the device is currently playing.
    #[cfg(test)]
    pub fn is_playing(&self) -> bool {
        self.is_playing.load(Ordering::Relaxed)
    }

    /// Returns the interleaved samples produced so far.
    #[cfg(test)]
    pub fn captured(&self) -> Vec<f32> {
        self.captured.lock().expect("Error getting lock").clone()
    }
}

impl crate::audio::Device for Device {
    /// Pulls blocks from the generator at roughly real-time pace until
    /// cancelled.
    fn play(
        &self,
        config: &ClickConfig,
        mut generator: ClickGenerator,
        cancel_handle: CancelHandle,
    ) -> Result<(), Box<dyn Error + Send + Sync>> {
        let span = span!(Level::INFO, "play click (mock)");
        let _enter = span.enter();

        info!(device = self.name, bpm = config.bpm(), "Playing click.");

        let block_duration = Duration::from_secs_f64(BLOCK_FRAMES as f64 / config.sample_rate());
        let mut block = vec![0.0f32; BLOCK_FRAMES * CHANNELS];

        self.is_playing.store(true, Ordering::Relaxed);
        loop {
            generator.fill(&mut block);
            self.captured
                .lock()
                .expect("Error getting lock")
                .extend_from_slice(&block);

            if cancel_handle.wait_timeout(block_duration) {
                break;
            }
        }
        self.is_playing.store(false, Ordering::Relaxed);

        info!(device = self.name, "Stopped playing.");
        Ok(())
    }

    #[cfg(test)]
    fn to_mock(&self) -> Result<Arc<Device>, Box<dyn Error + Send + Sync>> {
        Ok(Arc::new(self.clone()))
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (Mock)", self.name)
    }
}
