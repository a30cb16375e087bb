pub(crate) mod api;
pub(crate) mod coordinator;
pub(crate) mod device;
pub(crate) mod host;
pub(crate) mod registry;
pub(crate) mod stepper;

pub use coordinator::DeviceVolumeCoordinator;
pub use device::DeviceInfo;
pub use host::{DeviceListCallback, Host, HostTrait, WatchId};
pub use registry::DeviceRegistry;
pub use stepper::{MediaKey, VolumeStepper};

/// Platform-assigned identifier of an audio object.
pub type DeviceId = u32;

/// Levels at or below this on every channel are treated as silence.
pub const MUTE_THRESHOLD: f32 = 0.001;

/// Volume levels for the three channels the app drives.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChannelLevels {
    pub master: f32,
    pub left: f32,
    pub right: f32,
}

impl ChannelLevels {
    pub fn new(master: f32, left: f32, right: f32) -> Self {
        Self { master, left, right }
    }

    /// True when every channel sits below [`MUTE_THRESHOLD`].
    pub fn is_silent(&self) -> bool {
        self.master < MUTE_THRESHOLD && self.left < MUTE_THRESHOLD && self.right < MUTE_THRESHOLD
    }
}

#[cfg(test)]
impl ChannelLevels {
    pub fn uniform(volume: f32) -> Self {
        Self::new(volume, volume, volume)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn silent_only_when_all_channels_are_below_threshold() {
        assert!(ChannelLevels::uniform(0.0).is_silent());
        assert!(ChannelLevels::new(0.0005, 0.0, 0.0009).is_silent());
        assert!(!ChannelLevels::new(0.0, 0.5, 0.0).is_silent());
        assert!(!ChannelLevels::uniform(MUTE_THRESHOLD).is_silent());
    }
}
