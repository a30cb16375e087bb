use anyhow::Result;

use super::{DeviceId, HostTrait};

/// Snapshot of an output device as the host reports it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceInfo {
    pub id: DeviceId,
    pub name: String,
    pub is_aggregate: bool,
    pub sub_devices: Vec<DeviceId>,
}

impl DeviceInfo {
    /// Queries the host for everything known about `id`.
    pub fn query<H: HostTrait + ?Sized>(host: &H, id: DeviceId, name: String) -> Result<Self> {
        let is_aggregate = host.is_aggregate_device(id)?;
        let sub_devices = if is_aggregate {
            host.get_aggregate_sub_device_list(id)?
        } else {
            Vec::new()
        };
        Ok(Self {
            id,
            name,
            is_aggregate,
            sub_devices,
        })
    }

    /// Devices a write has to reach: every sub-device of an aggregate, or the device itself.
    pub fn write_targets(&self) -> Vec<DeviceId> {
        if self.is_aggregate {
            self.sub_devices.clone()
        } else {
            vec![self.id]
        }
    }
}

/// Loudest channel of a device, `None` when it exposes no volume control.
pub fn max_channel_volume(channels: &[f32]) -> Option<f32> {
    channels.iter().copied().reduce(f32::max)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::api::simulated::SimulatedHost;

    #[test]
    fn max_channel_volume_picks_loudest() {
        assert_eq!(max_channel_volume(&[0.2, 0.7, 0.5]), Some(0.7));
        assert_eq!(max_channel_volume(&[]), None);
    }

    #[test]
    fn query_collects_aggregate_sub_devices() {
        let host = SimulatedHost::new();
        host.add_device(1, "Speakers", 0.5).unwrap();
        host.add_device(2, "Headphones", 0.5).unwrap();
        host.add_aggregate(3, "Multi-Output", &[1, 2]).unwrap();

        let info = DeviceInfo::query(&host, 3, "Multi-Output".to_string()).unwrap();
        assert!(info.is_aggregate);
        assert_eq!(info.write_targets(), vec![1, 2]);

        let plain = DeviceInfo::query(&host, 1, "Speakers".to_string()).unwrap();
        assert!(!plain.is_aggregate);
        assert_eq!(plain.write_targets(), vec![1]);
    }
}
