//! Error types for netstress

use thiserror::Error;

/// Result type alias for netstress operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for netstress
#[derive(Error, Debug)]
pub enum Error {
    /// Network I/O error
    #[error("Network I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Interface not found
    #[error("Interface '{0}' not found")]
    InterfaceNotFound(String),

    /// Interface error
    #[error("Interface error: {0}")]
    Interface(String),

    /// Invalid parameter error
    #[error("Invalid parameter '{name}': {reason}")]
    InvalidParameter { name: String, reason: String },

    /// Malformed MAC address
    #[error("Invalid MAC address: {0}")]
    InvalidMac(String),

    /// Attack execution error
    #[error("Attack error: {0}")]
    Attack(String),

    /// Packet capture error
    #[error("Capture error: {0}")]
    Capture(String),

    /// Wireless subsystem error
    #[error("Wireless error: {0}")]
    Wireless(String),

    /// Execution failed
    #[error("Execution failed: {0}")]
    ExecutionFailed(String),
}

impl Error {
    /// Create an attack error with a custom message
    pub fn attack<S: Into<String>>(msg: S) -> Self {
        Error::Attack(msg.into())
    }

    /// Create a wireless error with a custom message
    pub fn wireless<S: Into<String>>(msg: S) -> Self {
        Error::Wireless(msg.into())
    }

    /// Create an invalid parameter error
    pub fn invalid_parameter<S: Into<String>>(name: S, reason: S) -> Self {
        Error::InvalidParameter {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// True when the underlying cause is a permission-denied I/O error.
    ///
    /// The ARP keep-alive loop tolerates these per packet instead of
    /// terminating the whole run.
    pub fn is_permission_denied(&self) -> bool {
        matches!(self, Error::Io(e) if e.kind() == std::io::ErrorKind::PermissionDenied)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_permission_denied_detection() {
        let denied = Error::Io(std::io::Error::from(std::io::ErrorKind::PermissionDenied));
        assert!(denied.is_permission_denied());

        let other = Error::Io(std::io::Error::from(std::io::ErrorKind::BrokenPipe));
        assert!(!other.is_permission_denied());

        assert!(!Error::attack("boom").is_permission_denied());
    }

    #[test]
    fn test_error_display() {
        let err = Error::InterfaceNotFound("wlan9".to_string());
        assert_eq!(err.to_string(), "Interface 'wlan9' not found");

        let err = Error::invalid_parameter("num_devices", "must be at least 1");
        assert_eq!(
            err.to_string(),
            "Invalid parameter 'num_devices': must be at least 1"
        );
    }
}
