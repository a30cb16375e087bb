use log::debug;

use super::{DeviceVolumeCoordinator, HostTrait};

pub const DEFAULT_TICKS: u32 = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKey {
    VolumeUp,
    VolumeDown,
    Mute,
    /// Any other media key (play, next, brightness...), ignored.
    Other,
}

/// Turns discrete media-key presses into volume steps of `1 / ticks`.
#[derive(Debug, Clone, Copy)]
pub struct VolumeStepper {
    ticks: u32,
}

impl VolumeStepper {
    pub fn new(ticks: u32) -> Self {
        Self {
            ticks: ticks.max(1),
        }
    }

    pub fn ticks(&self) -> u32 {
        self.ticks
    }

    pub fn step(&self) -> f32 {
        1.0 / self.ticks as f32
    }

    /// Nearest multiple of the step, within `[0, 1]`.
    pub fn quantize(&self, volume: f32) -> f32 {
        let step = self.step();
        ((volume / step).round() * step).clamp(0.0, 1.0)
    }

    pub fn step_up(&self, volume: f32) -> f32 {
        (self.quantize(volume) + self.step()).clamp(0.0, 1.0)
    }

    pub fn step_down(&self, volume: f32) -> f32 {
        (self.quantize(volume) - self.step()).clamp(0.0, 1.0)
    }

    /// Applies `key` to the selected device and returns the 0-100 value to display,
    /// or `None` when the event was ignored.
    pub fn handle<H: HostTrait + 'static>(
        &self,
        coordinator: &DeviceVolumeCoordinator<H>,
        key: MediaKey,
    ) -> Option<f32> {
        if key == MediaKey::Other {
            debug!("ignoring unhandled media key");
            return None;
        }
        let Some(volume) = coordinator.get_selected_device_volume() else {
            debug!("no readable volume, ignoring {:?}", key);
            return None;
        };

        let volume = match key {
            MediaKey::VolumeUp => self.step_up(volume),
            MediaKey::VolumeDown => self.step_down(volume),
            MediaKey::Mute => {
                coordinator.toggle_mute();
                return Some(if coordinator.is_selected_device_muted() {
                    0.0
                } else {
                    coordinator.get_selected_device_volume().unwrap_or(0.0) * 100.0
                });
            }
            MediaKey::Other => return None,
        };

        coordinator.set_selected_device_volume(volume, volume, volume);
        debug!("{:?} -> volume {:.4}", key, volume);
        Some(volume * 100.0)
    }
}

impl Default for VolumeStepper {
    fn default() -> Self {
        Self::new(DEFAULT_TICKS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::api::simulated::SimulatedHost;
    use std::sync::Arc;

    fn is_multiple_of_step(stepper: &VolumeStepper, value: f32) -> bool {
        let ratio = value / stepper.step();
        (ratio - ratio.round()).abs() < 1e-4
    }

    fn single_device(volume: f32) -> (Arc<SimulatedHost>, DeviceVolumeCoordinator<SimulatedHost>) {
        let host = Arc::new(SimulatedHost::new());
        host.add_device(1, "Speakers", volume).unwrap();
        let mut coordinator = DeviceVolumeCoordinator::new(host.clone());
        coordinator.select_device(1);
        (host, coordinator)
    }

    #[test]
    fn quantize_lands_on_step_and_is_idempotent() {
        for ticks in [1, 2, 10, 16, 64] {
            let stepper = VolumeStepper::new(ticks);
            for i in 0..=1000 {
                let v = i as f32 / 1000.0;
                let q = stepper.quantize(v);
                assert!((0.0..=1.0).contains(&q), "{} out of range", q);
                assert!(is_multiple_of_step(&stepper, q), "{} not on a step", q);
                assert_eq!(stepper.quantize(q), q);
            }
        }
    }

    #[test]
    fn steps_saturate_at_bounds() {
        let stepper = VolumeStepper::new(16);
        for i in 0..=16 {
            let v = i as f32 / 16.0;
            assert!(stepper.step_up(v) <= 1.0);
            assert!(stepper.step_down(v) >= 0.0);
        }
        assert_eq!(stepper.step_up(1.0), 1.0);
        assert_eq!(stepper.step_down(0.0), 0.0);
        assert_eq!(stepper.step_down(0.01), 0.0);
    }

    #[test]
    fn zero_ticks_falls_back_to_one() {
        let stepper = VolumeStepper::new(0);
        assert_eq!(stepper.ticks(), 1);
        assert_eq!(stepper.step_up(0.2), 1.0);
    }

    #[test]
    fn volume_up_from_forty_percent() {
        let (host, coordinator) = single_device(0.40);
        let stepper = VolumeStepper::new(16);

        assert_eq!(stepper.quantize(0.40), 0.375);
        let shown = stepper.handle(&coordinator, MediaKey::VolumeUp);

        assert_eq!(shown, Some(43.75));
        assert_eq!(host.get_device_volume(1).unwrap(), vec![0.4375; 3]);
    }

    #[test]
    fn volume_down_to_zero_mutes() {
        let (host, coordinator) = single_device(0.05);
        let stepper = VolumeStepper::new(16);

        assert_eq!(stepper.handle(&coordinator, MediaKey::VolumeDown), Some(0.0));
        assert!(host.is_device_muted(1).unwrap());

        let shown = stepper.handle(&coordinator, MediaKey::VolumeUp).unwrap();
        assert_eq!(shown, 6.25);
        assert!(!host.is_device_muted(1).unwrap());
    }

    #[test]
    fn mute_key_displays_zero_then_restores() {
        let (host, coordinator) = single_device(0.6);
        let stepper = VolumeStepper::new(16);

        assert_eq!(stepper.handle(&coordinator, MediaKey::Mute), Some(0.0));
        assert!(host.is_device_muted(1).unwrap());
        assert_eq!(host.get_device_volume(1).unwrap(), vec![0.6; 3]);

        let shown = stepper.handle(&coordinator, MediaKey::Mute).unwrap();
        assert!((shown - 60.0).abs() < 1e-3);
        assert!(!host.is_device_muted(1).unwrap());
    }

    #[test]
    fn other_keys_and_missing_selection_are_ignored() {
        let (host, coordinator) = single_device(0.5);
        let stepper = VolumeStepper::default();
        assert_eq!(stepper.handle(&coordinator, MediaKey::Other), None);
        assert_eq!(host.get_device_volume(1).unwrap(), vec![0.5; 3]);

        let unselected = DeviceVolumeCoordinator::new(host.clone());
        assert_eq!(stepper.handle(&unselected, MediaKey::VolumeUp), None);
        assert_eq!(stepper.handle(&unselected, MediaKey::Mute), None);
        assert!(!host.is_device_muted(1).unwrap());
    }
}
