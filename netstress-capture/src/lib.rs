//! Traffic capture driver for netstress
//!
//! Capture mechanics live in an external native library exposed through the
//! narrow [`CaptureBackend`] contract; this crate only orchestrates worker
//! threads and an optional duration timer around it. The persisted capture
//! file format is owned by the library.

pub mod backend;
pub mod logger;

pub use backend::{CaptureBackend, TrafficCaptureConfig};
pub use logger::TrafficLogger;

#[cfg(feature = "native-capture")]
pub use backend::native::NativeCaptureBackend;
