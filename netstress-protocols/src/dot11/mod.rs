//! 802.11 deauthentication and interception
//!
//! Channel scanning, SSID/client discovery and the deauthentication flood
//! loop. Frame decoding and raw monitor-mode capture are external
//! capabilities consumed through the [`interceptor::Sniffer`] seam; this
//! module owns the classification, targeting and attack state machine.

pub mod frames;
pub mod interceptor;
pub mod output;
pub mod radio;
pub mod ssid;

pub use frames::{frequency_to_channel, Band, DeauthFrame, FrameKind, SniffedFrame};
pub use interceptor::{ChannelCycle, FrameTx, Interceptor, InterceptorConfig, Sniffer};
pub use radio::{IwRadio, Radio};
pub use ssid::Ssid;
