//! In-memory audio host.
//!
//! Models just enough of a HAL for the coordinator: output and input devices,
//! per-channel scalar volume, a mute flag, aggregate devices with an ordered
//! sub-device list, a default output and device-list change notifications.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard};

use anyhow::{anyhow, Result};
use log::debug;

use crate::audio::{ChannelLevels, DeviceId, DeviceListCallback, HostTrait, WatchId};

#[derive(Debug, Clone)]
struct SimulatedDevice {
    name: String,
    is_output: bool,
    /// master, left, right; empty when the device has no volume control
    channels: Vec<f32>,
    muted: bool,
    sub_devices: Option<Vec<DeviceId>>,
}

#[derive(Default)]
struct State {
    devices: BTreeMap<DeviceId, SimulatedDevice>,
    default_output: Option<DeviceId>,
    watchers: Vec<(WatchId, DeviceListCallback)>,
    next_watch: WatchId,
}

#[derive(Default)]
pub struct SimulatedHost {
    state: Mutex<State>,
}

impl SimulatedHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Two physical outputs, a microphone and a multi-output device spanning both outputs.
    pub fn with_demo_devices() -> Result<Self> {
        let host = Self::new();
        host.add_device(41, "Built-in Speakers", 0.5)?;
        host.add_device(57, "USB Headphones", 0.4)?;
        host.add_input_device(63, "Built-in Microphone")?;
        host.add_aggregate(72, "Multi-Output Device", &[41, 57])?;
        Ok(host)
    }

    pub fn add_device(&self, id: DeviceId, name: &str, volume: f32) -> Result<()> {
        self.insert(
            id,
            SimulatedDevice {
                name: name.to_string(),
                is_output: true,
                channels: vec![volume; 3],
                muted: false,
                sub_devices: None,
            },
        )
    }

    pub fn add_input_device(&self, id: DeviceId, name: &str) -> Result<()> {
        self.insert(
            id,
            SimulatedDevice {
                name: name.to_string(),
                is_output: false,
                channels: vec![1.0; 3],
                muted: false,
                sub_devices: None,
            },
        )
    }

    /// Aggregates carry no volume control of their own; their sub-devices do.
    pub fn add_aggregate(&self, id: DeviceId, name: &str, sub_devices: &[DeviceId]) -> Result<()> {
        self.insert(
            id,
            SimulatedDevice {
                name: name.to_string(),
                is_output: true,
                channels: Vec::new(),
                muted: false,
                sub_devices: Some(sub_devices.to_vec()),
            },
        )
    }

    fn insert(&self, id: DeviceId, device: SimulatedDevice) -> Result<()> {
        {
            let mut state = self.lock()?;
            if device.is_output && state.default_output.is_none() {
                state.default_output = Some(id);
            }
            state.devices.insert(id, device);
        }
        self.notify()
    }

    fn notify(&self) -> Result<()> {
        let watchers: Vec<DeviceListCallback> = self
            .lock()?
            .watchers
            .iter()
            .map(|(_, callback)| callback.clone())
            .collect();
        for callback in watchers {
            callback();
        }
        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, State>> {
        self.state
            .lock()
            .map_err(|_| anyhow!("simulated host state poisoned"))
    }

    fn device(state: &State, id: DeviceId) -> Result<&SimulatedDevice> {
        state
            .devices
            .get(&id)
            .ok_or_else(|| anyhow!("unknown device {}", id))
    }

    fn device_mut(state: &mut State, id: DeviceId) -> Result<&mut SimulatedDevice> {
        state
            .devices
            .get_mut(&id)
            .ok_or_else(|| anyhow!("unknown device {}", id))
    }
}

impl HostTrait for SimulatedHost {
    fn get_output_devices(&self) -> Result<HashMap<DeviceId, String>> {
        Ok(self
            .lock()?
            .devices
            .iter()
            .filter(|(_, device)| device.is_output)
            .map(|(id, device)| (*id, device.name.clone()))
            .collect())
    }

    fn get_default_output_device(&self) -> Result<DeviceId> {
        self.lock()?
            .default_output
            .ok_or_else(|| anyhow!("no default output device"))
    }

    fn set_output_device(&self, id: DeviceId) -> Result<()> {
        let mut state = self.lock()?;
        if !Self::device(&state, id)?.is_output {
            return Err(anyhow!("device {} has no output streams", id));
        }
        state.default_output = Some(id);
        debug!("default output set to {}", id);
        Ok(())
    }

    fn is_aggregate_device(&self, id: DeviceId) -> Result<bool> {
        let state = self.lock()?;
        Ok(Self::device(&state, id)?.sub_devices.is_some())
    }

    fn get_aggregate_sub_device_list(&self, id: DeviceId) -> Result<Vec<DeviceId>> {
        let state = self.lock()?;
        Ok(Self::device(&state, id)?
            .sub_devices
            .clone()
            .unwrap_or_default())
    }

    fn is_output_device(&self, id: DeviceId) -> Result<bool> {
        let state = self.lock()?;
        Ok(Self::device(&state, id)?.is_output)
    }

    fn get_device_volume(&self, id: DeviceId) -> Result<Vec<f32>> {
        let state = self.lock()?;
        Ok(Self::device(&state, id)?.channels.clone())
    }

    fn set_device_volume(&self, id: DeviceId, levels: ChannelLevels) -> Result<()> {
        let mut state = self.lock()?;
        let device = Self::device_mut(&mut state, id)?;
        if !device.channels.is_empty() {
            device.channels = vec![
                levels.master.clamp(0.0, 1.0),
                levels.left.clamp(0.0, 1.0),
                levels.right.clamp(0.0, 1.0),
            ];
        }
        Ok(())
    }

    fn is_device_muted(&self, id: DeviceId) -> Result<bool> {
        let state = self.lock()?;
        Ok(Self::device(&state, id)?.muted)
    }

    fn set_device_mute(&self, id: DeviceId, muted: bool) -> Result<()> {
        let mut state = self.lock()?;
        Self::device_mut(&mut state, id)?.muted = muted;
        Ok(())
    }

    fn watch_devices(&self, callback: DeviceListCallback) -> Result<WatchId> {
        let mut state = self.lock()?;
        let watch = state.next_watch;
        state.next_watch += 1;
        state.watchers.push((watch, callback));
        Ok(watch)
    }

    fn unwatch_devices(&self, watch: WatchId) -> Result<()> {
        let mut state = self.lock()?;
        let before = state.watchers.len();
        state.watchers.retain(|(id, _)| *id != watch);
        if state.watchers.len() == before {
            return Err(anyhow!("no device watcher registered as {}", watch));
        }
        Ok(())
    }
}

#[cfg(test)]
impl SimulatedHost {
    pub fn remove_device(&self, id: DeviceId) -> Result<()> {
        {
            let mut state = self.lock()?;
            state
                .devices
                .remove(&id)
                .ok_or_else(|| anyhow!("unknown device {}", id))?;
            if state.default_output == Some(id) {
                state.default_output = state
                    .devices
                    .iter()
                    .find(|(_, device)| device.is_output)
                    .map(|(id, _)| *id);
            }
        }
        self.notify()
    }

    /// Overwrites the channel levels directly, as another app changing the device would.
    pub fn set_channels(&self, id: DeviceId, channels: &[f32]) -> Result<()> {
        let mut state = self.lock()?;
        let device = Self::device_mut(&mut state, id)?;
        device.channels = channels.to_vec();
        Ok(())
    }

    pub fn watcher_count(&self) -> usize {
        self.lock().unwrap().watchers.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn lists_only_output_devices() {
        let host = SimulatedHost::with_demo_devices().unwrap();
        let devices = host.get_output_devices().unwrap();
        assert_eq!(devices.len(), 3);
        assert!(!devices.contains_key(&63));
        assert_eq!(host.get_default_output_device().unwrap(), 41);
    }

    #[test]
    fn watchers_fire_on_changes_until_removed() {
        let host = SimulatedHost::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        let watch = host
            .watch_devices(Arc::new(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            }))
            .unwrap();

        host.add_device(1, "Speakers", 0.5).unwrap();
        host.remove_device(1).unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 2);

        host.unwatch_devices(watch).unwrap();
        host.add_device(2, "Headphones", 0.5).unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 2);
        assert!(host.unwatch_devices(watch).is_err());
    }

    #[test]
    fn watcher_may_query_host_from_callback() {
        let host = Arc::new(SimulatedHost::new());
        let seen = Arc::new(AtomicUsize::new(0));
        let (inner, seen_inner) = (host.clone(), seen.clone());
        host.watch_devices(Arc::new(move || {
            let count = inner.get_output_devices().map(|d| d.len()).unwrap_or(0);
            seen_inner.store(count, Ordering::SeqCst);
        }))
        .unwrap();

        host.add_device(1, "Speakers", 0.5).unwrap();
        assert_eq!(seen.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn aggregate_ignores_volume_writes_on_itself() {
        let host = SimulatedHost::with_demo_devices().unwrap();
        host.set_device_volume(72, ChannelLevels::uniform(0.9)).unwrap();
        assert!(host.get_device_volume(72).unwrap().is_empty());
    }

    #[test]
    fn removing_default_falls_back_to_another_output() {
        let host = SimulatedHost::with_demo_devices().unwrap();
        host.remove_device(41).unwrap();
        assert_eq!(host.get_default_output_device().unwrap(), 57);
        assert!(host.set_output_device(63).is_err());
        assert!(host.get_device_volume(41).is_err());
    }
}
