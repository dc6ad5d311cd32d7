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
use std::{error::Error, fmt};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use tracing::{error, info, span, Level};

use crate::{
    audio::Device as AudioDevice,
    click::{ClickGenerator, CHANNELS},
    config::ClickConfig,
    playsync::CancelHandle,
};

/// A small wrapper around a cpal::Device. Stores the probed output
/// capabilities so playback can validate against them.
pub struct Device {
    /// The name of the device.
    name: String,
    /// The host ID of the device.
    host_id: cpal::HostId,
    /// The underlying cpal device.
    device: cpal::Device,
    /// The maximum number of output channels the device supports.
    max_channels: u16,
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (Channels={}) ({})",
            self.name,
            self.max_channels,
            self.host_id.name()
        )
    }
}

/// f32 output: the generator writes the device buffer directly.
fn create_f32_callback(
    mut generator: ClickGenerator,
) -> impl FnMut(&mut [f32], &cpal::OutputCallbackInfo) + Send + 'static {
    move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
        generator.fill(data);
    }
}

/// Integer output: generate into a reused scratch buffer and convert.
fn create_converting_callback<T: cpal::SizedSample + cpal::FromSample<f32>>(
    mut generator: ClickGenerator,
) -> impl FnMut(&mut [T], &cpal::OutputCallbackInfo) + Send + 'static {
    let mut scratch: Vec<f32> = Vec::new();
    move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
        scratch.resize(data.len(), 0.0);
        generator.fill(&mut scratch);
        for (dst, &src) in data.iter_mut().zip(scratch.iter()) {
            *dst = T::from_sample(src);
        }
    }
}

impl Device {
    /// Lists cpal devices and produces the Device trait.
    pub fn list() -> Result<Vec<Box<dyn AudioDevice>>, Box<dyn Error + Send + Sync>> {
        Ok(Device::list_cpal_devices()?
            .into_iter()
            .map(|device| {
                let device: Box<dyn AudioDevice> = Box::new(device);
                device
            })
            .collect())
    }

    /// Lists cpal devices that have at least one output channel.
    fn list_cpal_devices() -> Result<Vec<Device>, Box<dyn Error + Send + Sync>> {
        // Suppress noisy backend output while probing.
        let _shh_stdout = shh::stdout()?;
        let _shh_stderr = shh::stderr()?;

        let mut devices: Vec<Device> = Vec::new();
        for host_id in cpal::available_hosts() {
            let host_devices = match cpal::host_from_id(host_id)?.devices() {
                Ok(host_devices) => host_devices,
                Err(e) => {
                    error!(
                        err = e.to_string(),
                        host = host_id.name(),
                        "Unable to list devices for host"
                    );
                    continue;
                }
            };

            for device in host_devices {
                let output_configs = match device.supported_output_configs() {
                    Ok(output_configs) => output_configs,
                    Err(_) => continue,
                };

                let mut max_channels = 0;
                for output_config in output_configs {
                    if max_channels < output_config.channels() {
                        max_channels = output_config.channels();
                    }
                }

                if max_channels > 0 {
                    devices.push(Device {
                        name: device.name()?,
                        host_id,
                        device,
                        max_channels,
                    })
                }
            }
        }

        devices.sort_by_key(|device| device.name.to_string());
        Ok(devices)
    }

    /// Gets the named cpal device, or the default output device when no name
    /// is given.
    pub fn get(name: Option<&str>) -> Result<Device, Box<dyn Error + Send + Sync>> {
        let Some(name) = name else {
            // Suppress noisy backend output while probing.
            let _shh_stdout = shh::stdout()?;
            let _shh_stderr = shh::stderr()?;

            let host = cpal::default_host();
            let device = host
                .default_output_device()
                .ok_or("no default audio output device available")?;

            let mut max_channels = 0;
            for output_config in device.supported_output_configs()? {
                if max_channels < output_config.channels() {
                    max_channels = output_config.channels();
                }
            }

            return Ok(Device {
                name: device.name()?,
                host_id: host.id(),
                device,
                max_channels,
            });
        };

        match Device::list_cpal_devices()?
            .into_iter()
            .find(|device| device.name.trim() == name)
        {
            Some(device) => Ok(device),
            None => Err(format!("no device found with name {}", name).into()),
        }
    }

    /// Picks an output sample format for the stream: f32 when the device
    /// supports it at the requested rate and channel count, otherwise the
    /// first integer format we can convert to.
    fn select_sample_format(
        &self,
        channels: u16,
        sample_rate: cpal::SampleRate,
    ) -> Result<cpal::SampleFormat, Box<dyn Error + Send + Sync>> {
        let mut fallback = None;
        for output_config in self.device.supported_output_configs()? {
            if output_config.channels() != channels
                || sample_rate < output_config.min_sample_rate()
                || sample_rate > output_config.max_sample_rate()
            {
                continue;
            }
            match output_config.sample_format() {
                cpal::SampleFormat::F32 => return Ok(cpal::SampleFormat::F32),
                format @ (cpal::SampleFormat::I16 | cpal::SampleFormat::I32) => {
                    fallback.get_or_insert(format);
                }
                _ => {}
            }
        }

        match fallback {
            Some(format) => Ok(format),
            None => Err(format!(
                "audio device {} does not support {} channels at {}Hz",
                self.name, channels, sample_rate
            )
            .into()),
        }
    }
}

impl AudioDevice for Device {
    /// Plays the click through the audio device until cancelled.
    fn play(
        &self,
        config: &ClickConfig,
        generator: ClickGenerator,
        cancel_handle: CancelHandle,
    ) -> Result<(), Box<dyn Error + Send + Sync>> {
        let span = span!(Level::INFO, "play click (cpal)");
        let _enter = span.enter();

        let channels = CHANNELS as u16;
        if self.max_channels < channels {
            return Err(format!(
                "the click needs {} output channels, audio device {} only has {}",
                channels, self.name, self.max_channels
            )
            .into());
        }

        let sample_rate = config.sample_rate() as u32;
        let sample_format = self.select_sample_format(channels, sample_rate)?;

        info!(
            device = self.name,
            sample_rate = sample_rate,
            format = ?sample_format,
            "Opening output stream."
        );

        let stream_config = cpal::StreamConfig {
            channels,
            sample_rate,
            buffer_size: cpal::BufferSize::Default,
        };

        let stream = match sample_format {
            cpal::SampleFormat::F32 => self.device.build_output_stream(
                &stream_config,
                create_f32_callback(generator),
                |err| error!("cpal output stream error: {}", err),
                None,
            ),
            cpal::SampleFormat::I16 => self.device.build_output_stream(
                &stream_config,
                create_converting_callback::<i16>(generator),
                |err| error!("cpal output stream error: {}", err),
                None,
            ),
            cpal::SampleFormat::I32 => self.device.build_output_stream(
                &stream_config,
                create_converting_callback::<i32>(generator),
                |err| error!("cpal output stream error: {}", err),
                None,
            ),
            other => return Err(format!("unsupported sample format {:?}", other).into()),
        }?;

        stream.play()?;

        // Park until shutdown. The generator produces silence between
        // pulses, so the stream never starves on its own.
        cancel_handle.wait();

        // Dropping the stream closes the device; the in-flight callback
        // completes first.
        drop(stream);

        info!(device = self.name, "Output stream released.");
        Ok(())
    }

    #[cfg(test)]
    fn to_mock(
        &self,
    ) -> Result<std::sync::Arc<super::mock::Device>, Box<dyn Error + Send + Sync>> {
        Err("not a mock".into())
    }
}
