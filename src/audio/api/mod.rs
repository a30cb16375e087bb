#[cfg(target_os = "macos")]
pub mod coreaudio;
pub mod simulated;
