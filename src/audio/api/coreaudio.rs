//! CoreAudio HAL backend.
//!
//! Everything goes through the `AudioObject*` property API on device ids;
//! no IO procs are installed.

pub mod host;
mod utils;
