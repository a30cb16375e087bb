use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{anyhow, Result};

use super::{api, ChannelLevels, DeviceId};

/// Callback fired by the host whenever its device list changes.
pub type DeviceListCallback = Arc<dyn Fn() + Send + Sync>;

/// Handle returned by [`HostTrait::watch_devices`], used to unregister.
pub type WatchId = u64;

/// Primitive operations against the host audio subsystem.
pub trait HostTrait: Send + Sync {
    fn get_output_devices(&self) -> Result<HashMap<DeviceId, String>>;
    fn get_default_output_device(&self) -> Result<DeviceId>;
    fn set_output_device(&self, id: DeviceId) -> Result<()>;
    fn is_aggregate_device(&self, id: DeviceId) -> Result<bool>;
    fn get_aggregate_sub_device_list(&self, id: DeviceId) -> Result<Vec<DeviceId>>;
    fn is_output_device(&self, id: DeviceId) -> Result<bool>;
    /// Per-channel scalar volumes, master first when the device has one.
    fn get_device_volume(&self, id: DeviceId) -> Result<Vec<f32>>;
    fn set_device_volume(&self, id: DeviceId, levels: ChannelLevels) -> Result<()>;
    fn is_device_muted(&self, id: DeviceId) -> Result<bool>;
    fn set_device_mute(&self, id: DeviceId, muted: bool) -> Result<()>;
    fn watch_devices(&self, callback: DeviceListCallback) -> Result<WatchId>;
    fn unwatch_devices(&self, watch: WatchId) -> Result<()>;
}

pub enum Host {
    Simulated(api::simulated::SimulatedHost),
    #[cfg(target_os = "macos")]
    CoreAudio(api::coreaudio::host::Host),
}

impl Host {
    pub fn default_name() -> &'static str {
        if cfg!(target_os = "macos") {
            "coreaudio"
        } else {
            "simulated"
        }
    }

    pub fn new(name: &str) -> Result<Self> {
        match name {
            "simulated" => Ok(Host::Simulated(api::simulated::SimulatedHost::with_demo_devices()?)),
            #[cfg(target_os = "macos")]
            "coreaudio" => Ok(Host::CoreAudio(api::coreaudio::host::Host::new())),
            _ => Err(anyhow!("unsupported audio host: {}", name)),
        }
    }

    fn inner(&self) -> &dyn HostTrait {
        match self {
            Self::Simulated(host) => host,
            #[cfg(target_os = "macos")]
            Self::CoreAudio(host) => host,
        }
    }
}

impl HostTrait for Host {
    fn get_output_devices(&self) -> Result<HashMap<DeviceId, String>> {
        self.inner().get_output_devices()
    }

    fn get_default_output_device(&self) -> Result<DeviceId> {
        self.inner().get_default_output_device()
    }

    fn set_output_device(&self, id: DeviceId) -> Result<()> {
        self.inner().set_output_device(id)
    }

    fn is_aggregate_device(&self, id: DeviceId) -> Result<bool> {
        self.inner().is_aggregate_device(id)
    }

    fn get_aggregate_sub_device_list(&self, id: DeviceId) -> Result<Vec<DeviceId>> {
        self.inner().get_aggregate_sub_device_list(id)
    }

    fn is_output_device(&self, id: DeviceId) -> Result<bool> {
        self.inner().is_output_device(id)
    }

    fn get_device_volume(&self, id: DeviceId) -> Result<Vec<f32>> {
        self.inner().get_device_volume(id)
    }

    fn set_device_volume(&self, id: DeviceId, levels: ChannelLevels) -> Result<()> {
        self.inner().set_device_volume(id, levels)
    }

    fn is_device_muted(&self, id: DeviceId) -> Result<bool> {
        self.inner().is_device_muted(id)
    }

    fn set_device_mute(&self, id: DeviceId, muted: bool) -> Result<()> {
        self.inner().set_device_mute(id, muted)
    }

    fn watch_devices(&self, callback: DeviceListCallback) -> Result<WatchId> {
        self.inner().watch_devices(callback)
    }

    fn unwatch_devices(&self, watch: WatchId) -> Result<()> {
        self.inner().unwatch_devices(watch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_host_name_is_rejected() {
        assert!(Host::new("jack").is_err());
    }

    #[test]
    fn simulated_host_dispatches_through_enum() {
        let host = Host::new("simulated").unwrap();
        let devices = host.get_output_devices().unwrap();
        assert!(!devices.is_empty());
        let default = host.get_default_output_device().unwrap();
        assert!(devices.contains_key(&default));
    }
}
