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
use std::{error::Error, fmt, sync::Arc};

use crate::click::ClickGenerator;
use crate::config::ClickConfig;
use crate::playsync::CancelHandle;

pub mod cpal;
pub mod mock;

/// An audio output device that can pump the click generator.
pub trait Device: fmt::Display + Send + Sync {
    /// Plays the generator through the audio interface. Blocks until the
    /// cancel handle fires, then releases the output stream; in-flight
    /// callbacks complete rather than being interrupted.
    fn play(
        &self,
        config: &ClickConfig,
        generator: ClickGenerator,
        cancel_handle: CancelHandle,
    ) -> Result<(), Box<dyn Error + Send + Sync>>;

    #[cfg(test)]
    fn to_mock(&self) -> Result<Arc<mock::Device>, Box<dyn Error + Send + Sync>>;
}

/// Lists devices known to cpal.
pub fn list_devices() -> Result<Vec<Box<dyn Device>>, Box<dyn Error + Send + Sync>> {
    cpal::Device::list()
}

/// Gets the device with the given name, or the default output device when no
/// name is given.
pub fn get_device(name: Option<&str>) -> Result<Arc<dyn Device>, Box<dyn Error + Send + Sync>> {
    if let Some(name) = name {
        if name.starts_with("mock") {
            return Ok(Arc::new(mock::Device::get(name)));
        }
    }

    Ok(Arc::new(cpal::Device::get(name)?))
}
