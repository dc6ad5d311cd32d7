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
use std::{error::Error, sync::Arc};

use tokio::task;
use tracing::{info, span, Level, Span};

use crate::{
    audio,
    click::ClickGenerator,
    config::ClickConfig,
    playsync::CancelHandle,
    tempo::TempoDriver,
    trigger,
};

/// Plays the click through the configured audio device until cancelled.
pub struct Player {
    /// The device to play the click through.
    device: Arc<dyn audio::Device>,
    /// The click configuration for this run.
    config: ClickConfig,
    /// Cancelling this stops the tempo driver and releases the device.
    cancel_handle: CancelHandle,
    /// The logging span.
    span: Span,
}

impl Player {
    /// Creates a new player.
    pub fn new(config: ClickConfig, device: Arc<dyn audio::Device>) -> Player {
        Player {
            device,
            config,
            cancel_handle: CancelHandle::new(),
            span: span!(Level::INFO, "player"),
        }
    }

    /// Returns the handle that stops this player.
    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel_handle.clone()
    }

    /// Plays the click until the cancel handle fires. The tempo driver is
    /// stopped and the device released before this returns.
    pub async fn play(&self) -> Result<(), Box<dyn Error + Send + Sync>> {
        let _enter = self.span.enter();

        info!(
            device = %self.device,
            bpm = self.config.bpm(),
            sample_rate = self.config.sample_rate(),
            left = self.config.left(),
            right = self.config.right(),
            "Starting click playback."
        );

        let (trigger_tx, trigger_rx) = trigger::channel();
        let generator = ClickGenerator::new(&self.config, trigger_rx);
        let tempo = TempoDriver::start(&self.config, trigger_tx, self.cancel_handle.clone());

        let result = {
            let device = Arc::clone(&self.device);
            let config = self.config;
            let cancel_handle = self.cancel_handle.clone();
            task::spawn_blocking(move || device.play(&config, generator, cancel_handle)).await
        };

        // However playback ended, the driver winds down with it.
        self.cancel_handle.cancel();
        tempo.stop();

        match result {
            Ok(play_result) => play_result,
            Err(e) => Err(Box::new(e) as Box<dyn Error + Send + Sync>),
        }
    }
}
