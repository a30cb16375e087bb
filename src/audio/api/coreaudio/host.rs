use std::collections::HashMap;
use std::ffi::c_void;
use std::sync::{Mutex, MutexGuard};

use anyhow::{anyhow, Result};
use coreaudio_sys::{
    kAudioAggregateDeviceClassID, kAudioAggregateDevicePropertyActiveSubDeviceList,
    kAudioDevicePropertyDeviceName, kAudioDevicePropertyMute, kAudioDevicePropertyStreams,
    kAudioDevicePropertyVolumeScalar, kAudioHardwarePropertyDefaultOutputDevice,
    kAudioHardwarePropertyDevices, kAudioObjectPropertyClass, kAudioObjectPropertyScopeGlobal,
    kAudioObjectPropertyScopeOutput, kAudioObjectSystemObject, AudioClassID,
    AudioObjectAddPropertyListener, AudioObjectID, AudioObjectPropertyAddress,
    AudioObjectPropertyElement, AudioObjectRemovePropertyListener, OSStatus,
};
use log::{debug, warn};

use super::utils::{
    address, get_property, get_property_array, get_property_size, get_property_string,
    has_property, host_error, is_settable, set_property, ELEMENT_MAIN,
};
use crate::audio::{ChannelLevels, DeviceId, DeviceListCallback, HostTrait, WatchId};

const SYSTEM_OBJECT: AudioObjectID = kAudioObjectSystemObject as AudioObjectID;
const LEFT: AudioObjectPropertyElement = 1;
const RIGHT: AudioObjectPropertyElement = 2;

fn devices_address() -> AudioObjectPropertyAddress {
    address(
        kAudioHardwarePropertyDevices,
        kAudioObjectPropertyScopeGlobal,
        ELEMENT_MAIN,
    )
}

fn output_address(selector: u32, element: AudioObjectPropertyElement) -> AudioObjectPropertyAddress {
    address(selector, kAudioObjectPropertyScopeOutput, element)
}

fn device_name(id: DeviceId) -> Result<String> {
    get_property_string(
        id,
        &address(
            kAudioDevicePropertyDeviceName,
            kAudioObjectPropertyScopeGlobal,
            ELEMENT_MAIN,
        ),
    )
}

/// Keeps the output devices among `ids`. A device that fails its output query
/// is skipped, since it may have been unplugged after the list was read.
fn collect_outputs(
    ids: Vec<DeviceId>,
    is_output: impl Fn(DeviceId) -> Result<bool>,
    name: impl Fn(DeviceId) -> Result<String>,
) -> HashMap<DeviceId, String> {
    let mut devices = HashMap::new();
    for id in ids {
        match is_output(id) {
            Ok(true) => {}
            Ok(false) => continue,
            Err(err) => {
                debug!("skipping device {}: {}", id, err);
                continue;
            }
        }
        let name = name(id).unwrap_or_else(|err| {
            debug!("no name for device {}: {}", id, err);
            format!("Device {}", id)
        });
        devices.insert(id, name);
    }
    devices
}

unsafe extern "C" fn devices_changed(
    _object: AudioObjectID,
    _count: u32,
    _addresses: *const AudioObjectPropertyAddress,
    client_data: *mut c_void,
) -> OSStatus {
    // client_data points at a callback boxed in `Host::watchers`, alive until removal
    let callback = &*(client_data as *const DeviceListCallback);
    callback();
    0
}

#[derive(Default)]
pub struct Host {
    watchers: Mutex<HashMap<WatchId, Box<DeviceListCallback>>>,
    next_watch: Mutex<WatchId>,
}

impl Host {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    fn watchers(&self) -> Result<MutexGuard<'_, HashMap<WatchId, Box<DeviceListCallback>>>> {
        self.watchers
            .lock()
            .map_err(|_| anyhow!("device watcher table poisoned"))
    }

    fn remove_listener(callback: &DeviceListCallback) -> Result<()> {
        let client_data = callback as *const DeviceListCallback as *mut c_void;
        let status = unsafe {
            AudioObjectRemovePropertyListener(
                SYSTEM_OBJECT,
                &devices_address(),
                Some(devices_changed),
                client_data,
            )
        };
        if status != 0 {
            return Err(anyhow!(
                "unable to remove device listener: {} ({})",
                host_error(status),
                status
            ));
        }
        Ok(())
    }
}

impl HostTrait for Host {
    fn get_output_devices(&self) -> Result<HashMap<DeviceId, String>> {
        let ids = get_property_array::<AudioObjectID>(SYSTEM_OBJECT, &devices_address())?;
        Ok(collect_outputs(ids, |id| self.is_output_device(id), device_name))
    }

    fn get_default_output_device(&self) -> Result<DeviceId> {
        let id: AudioObjectID = get_property(
            SYSTEM_OBJECT,
            &address(
                kAudioHardwarePropertyDefaultOutputDevice,
                kAudioObjectPropertyScopeGlobal,
                ELEMENT_MAIN,
            ),
        )?;
        Ok(id)
    }

    fn set_output_device(&self, id: DeviceId) -> Result<()> {
        let value: AudioObjectID = id;
        set_property(
            SYSTEM_OBJECT,
            &address(
                kAudioHardwarePropertyDefaultOutputDevice,
                kAudioObjectPropertyScopeGlobal,
                ELEMENT_MAIN,
            ),
            &value,
        )
    }

    fn is_aggregate_device(&self, id: DeviceId) -> Result<bool> {
        let class: AudioClassID = get_property(
            id,
            &address(
                kAudioObjectPropertyClass,
                kAudioObjectPropertyScopeGlobal,
                ELEMENT_MAIN,
            ),
        )?;
        Ok(class == kAudioAggregateDeviceClassID as AudioClassID)
    }

    fn get_aggregate_sub_device_list(&self, id: DeviceId) -> Result<Vec<DeviceId>> {
        get_property_array::<AudioObjectID>(
            id,
            &address(
                kAudioAggregateDevicePropertyActiveSubDeviceList,
                kAudioObjectPropertyScopeGlobal,
                ELEMENT_MAIN,
            ),
        )
    }

    fn is_output_device(&self, id: DeviceId) -> Result<bool> {
        let address = output_address(kAudioDevicePropertyStreams, ELEMENT_MAIN);
        if !has_property(id, &address) {
            return Ok(false);
        }
        Ok(get_property_size(id, &address)? > 0)
    }

    fn get_device_volume(&self, id: DeviceId) -> Result<Vec<f32>> {
        let mut channels = Vec::with_capacity(3);
        for element in [ELEMENT_MAIN, LEFT, RIGHT] {
            let address = output_address(kAudioDevicePropertyVolumeScalar, element);
            if has_property(id, &address) {
                channels.push(get_property::<f32>(id, &address)?);
            }
        }
        Ok(channels)
    }

    fn set_device_volume(&self, id: DeviceId, levels: ChannelLevels) -> Result<()> {
        for (element, level) in [
            (ELEMENT_MAIN, levels.master),
            (LEFT, levels.left),
            (RIGHT, levels.right),
        ] {
            let address = output_address(kAudioDevicePropertyVolumeScalar, element);
            if has_property(id, &address) && is_settable(id, &address)? {
                set_property(id, &address, &level.clamp(0.0, 1.0))?;
            }
        }
        Ok(())
    }

    fn is_device_muted(&self, id: DeviceId) -> Result<bool> {
        let address = output_address(kAudioDevicePropertyMute, ELEMENT_MAIN);
        if !has_property(id, &address) {
            return Ok(false);
        }
        Ok(get_property::<u32>(id, &address)? != 0)
    }

    fn set_device_mute(&self, id: DeviceId, muted: bool) -> Result<()> {
        let address = output_address(kAudioDevicePropertyMute, ELEMENT_MAIN);
        if !has_property(id, &address) || !is_settable(id, &address)? {
            debug!("device {} has no settable mute control", id);
            return Ok(());
        }
        set_property(id, &address, &(muted as u32))
    }

    fn watch_devices(&self, callback: DeviceListCallback) -> Result<WatchId> {
        let callback = Box::new(callback);
        let client_data = &*callback as *const DeviceListCallback as *mut c_void;
        let watch = {
            let mut next_watch = self
                .next_watch
                .lock()
                .map_err(|_| anyhow!("device watcher counter poisoned"))?;
            let watch = *next_watch;
            *next_watch += 1;
            watch
        };
        // stored before the HAL learns its address, so it outlives every notification
        self.watchers()?.insert(watch, callback);

        let status = unsafe {
            AudioObjectAddPropertyListener(
                SYSTEM_OBJECT,
                &devices_address(),
                Some(devices_changed),
                client_data,
            )
        };
        if status != 0 {
            self.watchers()?.remove(&watch);
            return Err(anyhow!(
                "unable to listen for device changes: {} ({})",
                host_error(status),
                status
            ));
        }
        Ok(watch)
    }

    fn unwatch_devices(&self, watch: WatchId) -> Result<()> {
        let callback = self
            .watchers()?
            .remove(&watch)
            .ok_or_else(|| anyhow!("no device watcher registered as {}", watch))?;
        if let Err(err) = Self::remove_listener(&callback) {
            // still registered with the HAL, so the callback has to stay alive
            self.watchers()?.insert(watch, callback);
            return Err(err);
        }
        Ok(())
    }
}

impl Drop for Host {
    fn drop(&mut self) {
        let Ok(mut watchers) = self.watchers() else {
            return;
        };
        for (_, callback) in watchers.drain() {
            if let Err(err) = Self::remove_listener(&callback) {
                warn!("{}", err);
                std::mem::forget(callback);
            }
        }
    }
}
