//! Single logical volume and mute control over the selected output device.
//!
//! Aggregate devices are read through one representative sub-device (the
//! first one with output streams) and written through every sub-device.

use std::sync::Arc;

use anyhow::Result;
use log::{debug, info, warn};

use super::device::max_channel_volume;
use super::{ChannelLevels, DeviceId, DeviceInfo, DeviceRegistry, HostTrait, WatchId};

pub struct DeviceVolumeCoordinator<H: HostTrait + 'static> {
    host: Arc<H>,
    registry: Arc<DeviceRegistry>,
    selected: Option<DeviceId>,
    watch: Option<WatchId>,
}

impl<H: HostTrait + 'static> DeviceVolumeCoordinator<H> {
    /// Loads the device list and keeps it current for as long as the coordinator lives.
    pub fn new(host: Arc<H>) -> Self {
        let registry = Arc::new(DeviceRegistry::new());
        if let Err(err) = registry.refresh(host.as_ref()) {
            warn!("unable to list output devices: {}", err);
        }

        let watched_host = Arc::downgrade(&host);
        let watched_registry = Arc::downgrade(&registry);
        let watch = host
            .watch_devices(Arc::new(move || {
                let (Some(host), Some(registry)) =
                    (watched_host.upgrade(), watched_registry.upgrade())
                else {
                    return;
                };
                match registry.refresh(host.as_ref()) {
                    Ok(()) => info!("output device list changed"),
                    Err(err) => warn!("unable to refresh output devices: {}", err),
                }
            }))
            .map_err(|err| warn!("unable to watch device list changes: {}", err))
            .ok();

        Self {
            host,
            registry,
            selected: None,
            watch,
        }
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn refresh_devices(&self) -> Result<()> {
        self.registry.refresh(self.host.as_ref())
    }

    pub fn devices(&self) -> Vec<(DeviceId, String)> {
        self.registry.sorted()
    }

    pub fn device_name(&self, id: DeviceId) -> Option<String> {
        self.registry.name(id)
    }

    pub fn selected_device(&self) -> Option<DeviceId> {
        self.selected
    }

    /// Unknown ids are accepted; later reads and writes against them come back empty.
    pub fn select_device(&mut self, id: DeviceId) {
        match self.registry.name(id) {
            Some(name) => info!("selected output device {} ({})", id, name),
            None => info!("selected output device {} (not in device list)", id),
        }
        self.selected = Some(id);
    }

    /// Makes `id` the system default output and selects it.
    pub fn set_output_device(&mut self, id: DeviceId) -> Result<()> {
        self.host.set_output_device(id)?;
        self.select_device(id);
        Ok(())
    }

    pub fn selected_device_info(&self) -> Option<DeviceInfo> {
        let id = self.selected?;
        let name = self.registry.name(id).unwrap_or_default();
        self.ok_or_warn(DeviceInfo::query(self.host.as_ref(), id, name))
    }

    fn writable_selection(&self, action: &str) -> Option<DeviceInfo> {
        let Some(id) = self.selected else {
            debug!("{} without a selected device", action);
            return None;
        };
        let device = self.selected_device_info();
        if device.is_none() {
            debug!("{} skipped, selected device {} is not readable", action, id);
        }
        device
    }

    pub fn get_selected_device_volume(&self) -> Option<f32> {
        let Some(id) = self.selected else {
            debug!("volume read without a selected device");
            return None;
        };
        let source = self.read_source(id)?;
        let channels = self.ok_or_warn(self.host.get_device_volume(source))?;
        max_channel_volume(&channels)
    }

    pub fn set_selected_device_volume(&self, master: f32, left: f32, right: f32) {
        let Some(device) = self.writable_selection("volume write") else {
            return;
        };
        let levels = ChannelLevels::new(master, left, right);
        let muted = levels.is_silent();
        for target in device.write_targets() {
            self.ok_or_warn(self.host.set_device_volume(target, levels));
            self.ok_or_warn(self.host.set_device_mute(target, muted));
        }
        debug!(
            "set volume {:.4}/{:.4}/{:.4} (muted: {}) on device {}",
            master, left, right, muted, device.id
        );
    }

    pub fn is_selected_device_muted(&self) -> bool {
        let Some(id) = self.selected else {
            return false;
        };
        self.read_source(id)
            .and_then(|source| self.ok_or_warn(self.host.is_device_muted(source)))
            .unwrap_or(false)
    }

    pub fn toggle_mute(&self) {
        let Some(device) = self.writable_selection("mute toggle") else {
            return;
        };
        if self.is_selected_device_muted() {
            for target in device.write_targets() {
                self.ok_or_warn(self.host.set_device_mute(target, false));
            }
            if let Some(volume) = self.get_selected_device_volume() {
                self.set_selected_device_volume(volume, volume, volume);
            }
            info!("unmuted device {}", device.id);
        } else {
            for target in device.write_targets() {
                self.ok_or_warn(self.host.set_device_mute(target, true));
            }
            info!("muted device {}", device.id);
        }
    }

    /// Volume as the status line shows it: 0 to 100, 0 while muted.
    pub fn display_volume(&self) -> Option<f32> {
        let volume = self.get_selected_device_volume()?;
        if self.is_selected_device_muted() {
            Some(0.0)
        } else {
            Some(volume * 100.0)
        }
    }

    /// Device whose state stands for `id` on reads: the representative sub-device of an
    /// aggregate, otherwise `id` itself.
    fn read_source(&self, id: DeviceId) -> Option<DeviceId> {
        if !self.ok_or_warn(self.host.is_aggregate_device(id))? {
            return Some(id);
        }
        let sub_devices = self.ok_or_warn(self.host.get_aggregate_sub_device_list(id))?;
        let representative = sub_devices
            .into_iter()
            .find(|sub| self.host.is_output_device(*sub).unwrap_or(false));
        if representative.is_none() {
            debug!("aggregate device {} has no output sub-device", id);
        }
        representative
    }

    fn ok_or_warn<T>(&self, result: Result<T>) -> Option<T> {
        result.map_err(|err| warn!("audio host call failed: {}", err)).ok()
    }
}

impl<H: HostTrait + 'static> Drop for DeviceVolumeCoordinator<H> {
    fn drop(&mut self) {
        if let Some(watch) = self.watch.take() {
            if let Err(err) = self.host.unwatch_devices(watch) {
                warn!("unable to stop watching device list: {}", err);
            }
        }
    }
}
