mod device_selector;
mod volume_osd;

pub(crate) use device_selector::DeviceSelector;
pub(crate) use volume_osd::{OnScreenDisplay, VolumeOsd};
