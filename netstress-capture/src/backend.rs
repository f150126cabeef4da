//! External capture service contract
//!
//! The native library exposes exactly three operations; the config layout
//! and call signatures here reproduce that contract and must not drift from
//! it.

/// Configuration handed to the capture library
#[derive(Debug, Clone)]
pub struct TrafficCaptureConfig {
    pub interface: String,
    pub bpf_filter: String,
    pub output_file: String,
    /// Seconds to capture; 0 means unbounded
    pub duration: i32,
    /// Maximum packets to capture; 0 means unbounded
    pub max_packets: i32,
    /// Bytes captured per packet
    pub snaplen: i32,
    pub promisc: bool,
}

/// The external capture library: start blocks until the capture ends, stop
/// unblocks a running start, and a non-zero start status is explained by
/// `get_last_error`.
pub trait CaptureBackend: Send + Sync {
    /// Begin capturing; returns 0 on success
    fn capture_start(&self, config: &TrafficCaptureConfig) -> i32;

    /// Stop a running capture
    fn capture_stop(&self);

    /// Human-readable reason for the last failure
    fn get_last_error(&self) -> String;
}

/// FFI binding to the native `traffic` library
#[cfg(feature = "native-capture")]
pub mod native {
    use super::{CaptureBackend, TrafficCaptureConfig};
    use std::ffi::{CStr, CString};
    use std::os::raw::{c_char, c_int};

    #[repr(C)]
    struct RawCaptureConfig {
        interface: *const c_char,
        bpf_filter: *const c_char,
        output_file: *const c_char,
        duration: c_int,
        max_packets: c_int,
        snaplen: c_int,
        promisc: bool,
    }

    #[link(name = "traffic")]
    extern "C" {
        fn traffic_capture_start(config: *const RawCaptureConfig) -> c_int;
        fn traffic_capture_stop();
        fn traffic_get_last_error() -> *const c_char;
    }

    /// Capture backend backed by libtraffic
    pub struct NativeCaptureBackend;

    impl CaptureBackend for NativeCaptureBackend {
        fn capture_start(&self, config: &TrafficCaptureConfig) -> i32 {
            let interface = match CString::new(config.interface.clone()) {
                Ok(s) => s,
                Err(_) => return -1,
            };
            let bpf_filter = match CString::new(config.bpf_filter.clone()) {
                Ok(s) => s,
                Err(_) => return -1,
            };
            let output_file = match CString::new(config.output_file.clone()) {
                Ok(s) => s,
                Err(_) => return -1,
            };

            let raw = RawCaptureConfig {
                interface: interface.as_ptr(),
                bpf_filter: bpf_filter.as_ptr(),
                output_file: output_file.as_ptr(),
                duration: config.duration,
                max_packets: config.max_packets,
                snaplen: config.snaplen,
                promisc: config.promisc,
            };

            unsafe { traffic_capture_start(&raw) }
        }

        fn capture_stop(&self) {
            unsafe { traffic_capture_stop() }
        }

        fn get_last_error(&self) -> String {
            unsafe {
                let ptr = traffic_get_last_error();
                if ptr.is_null() {
                    "unknown".to_string()
                } else {
                    CStr::from_ptr(ptr).to_string_lossy().into_owned()
                }
            }
        }
    }
}
