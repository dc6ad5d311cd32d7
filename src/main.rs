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
mod audio;
mod click;
mod config;
mod player;
mod playsync;
mod tempo;
mod trigger;

use std::error::Error;
use std::time::Duration;

use clap::{crate_version, Parser, Subcommand};
use tracing::info;

use crate::config::ClickConfig;
use crate::player::Player;

#[derive(Parser)]
#[clap(
    author = "Michael Wilson",
    version = crate_version!(),
    about = "A metronome click generator."
)]
struct Cli {
    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Lists the available audio output devices.
    Devices {},
    /// Plays the click through the audio interface.
    Play {
        /// Send the click to the left channel.
        #[arg(long)]
        left: bool,
        /// Send the click to the right channel.
        #[arg(long)]
        right: bool,
        /// Beats per minute.
        #[arg(long, default_value_t = 60.0)]
        bpm: f64,
        /// The sample rate in Hz.
        #[arg(long, default_value_t = 44100.0)]
        sr: f64,
        /// The pulse width in milliseconds.
        #[arg(long, default_value_t = 4.8)]
        pw: f64,
        /// The output amplitude. 1.0 is full scale.
        #[arg(long, default_value_t = 1.0)]
        vol: f64,
        /// Extra delay in milliseconds before each beat trigger fires.
        /// Compensates for output latency.
        #[arg(long, default_value_t = 0)]
        tune_latency: u64,
        /// The device name to play through. Uses the default output device
        /// when not set.
        #[arg(short, long)]
        device: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Devices {} => {
            let devices = audio::list_devices()?;

            if devices.is_empty() {
                println!("No devices found.");
                return Ok(());
            }

            println!("Devices:");
            for device in devices {
                println!("- {}", device);
            }
        }
        Commands::Play {
            left,
            right,
            bpm,
            sr,
            pw,
            vol,
            tune_latency,
            device,
        } => {
            let config = ClickConfig::new(
                bpm,
                sr,
                pw,
                vol,
                Duration::from_millis(tune_latency),
                left,
                right,
            )?;
            let device = audio::get_device(device.as_deref())?;

            let player = Player::new(config, device);

            let cancel_handle = player.cancel_handle();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    info!("Interrupt received, stopping.");
                    cancel_handle.cancel();
                }
            });

            player.play().await?;
        }
    }

    Ok(())
}
