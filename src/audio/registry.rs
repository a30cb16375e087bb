use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use arc_swap::ArcSwap;
use log::debug;

use super::{DeviceId, HostTrait};

/// Device id to name map, swapped wholesale on every refresh.
pub struct DeviceRegistry {
    devices: ArcSwap<HashMap<DeviceId, String>>,
}

impl DeviceRegistry {
    pub fn new() -> Self {
        Self {
            devices: ArcSwap::from_pointee(HashMap::new()),
        }
    }

    pub fn refresh<H: HostTrait + ?Sized>(&self, host: &H) -> Result<()> {
        let devices = host.get_output_devices()?;
        debug!("device list refreshed: {} output devices", devices.len());
        self.devices.store(Arc::new(devices));
        Ok(())
    }

    pub fn name(&self, id: DeviceId) -> Option<String> {
        self.devices.load().get(&id).cloned()
    }

    /// Devices sorted by name, the order the selector lists them in.
    pub fn sorted(&self) -> Vec<(DeviceId, String)> {
        let mut devices: Vec<(DeviceId, String)> = self
            .devices
            .load()
            .iter()
            .map(|(id, name)| (*id, name.clone()))
            .collect();
        devices.sort_by(|a, b| a.1.cmp(&b.1).then(a.0.cmp(&b.0)));
        devices
    }
}

impl Default for DeviceRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
impl DeviceRegistry {
    pub fn snapshot(&self) -> Arc<HashMap<DeviceId, String>> {
        self.devices.load_full()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::api::simulated::SimulatedHost;

    #[test]
    fn refresh_discards_stale_entries() {
        let host = SimulatedHost::new();
        host.add_device(1, "Speakers", 0.5).unwrap();
        host.add_device(2, "Headphones", 0.5).unwrap();

        let registry = DeviceRegistry::new();
        registry.refresh(&host).unwrap();
        assert_eq!(registry.snapshot().len(), 2);

        host.remove_device(2).unwrap();
        host.add_device(7, "Dock", 0.5).unwrap();
        registry.refresh(&host).unwrap();

        assert_eq!(registry.name(2), None);
        assert_eq!(registry.name(7).as_deref(), Some("Dock"));
        assert_eq!(
            registry.sorted(),
            vec![(7, "Dock".to_string()), (1, "Speakers".to_string())]
        );
    }

    #[test]
    fn old_snapshot_survives_refresh() {
        let host = SimulatedHost::new();
        host.add_device(1, "Speakers", 0.5).unwrap();
        let registry = DeviceRegistry::new();
        registry.refresh(&host).unwrap();

        let before = registry.snapshot();
        host.remove_device(1).unwrap();
        registry.refresh(&host).unwrap();

        assert_eq!(before.get(&1).map(String::as_str), Some("Speakers"));
        assert!(registry.snapshot().is_empty());
    }
}
