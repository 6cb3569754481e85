//! Device load and transport errors

use thiserror::Error;

/// Failures reported while loading or talking to a device
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeviceError {
    /// A platform companion file required to mount developer services is absent
    #[error("Missing support file for {os} {version}")]
    MissingSupportFile { os: String, version: String },

    #[error("Device is not paired with this host")]
    NotPaired,

    #[error("Device disconnected")]
    Disconnected,

    #[error("Failed to mount developer image: {0}")]
    ImageMount(String),

    #[error("Location transport error: {0}")]
    Transport(String),
}

impl DeviceError {
    pub fn missing_support_file(os: impl Into<String>, version: impl Into<String>) -> Self {
        Self::MissingSupportFile {
            os: os.into(),
            version: version.into(),
        }
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport(message.into())
    }

    /// Only a missing support file can be fixed by this layer (download + retry)
    pub fn is_recoverable(&self) -> bool {
        matches!(self, DeviceError::MissingSupportFile { .. })
    }
}

impl From<DeviceError> for locswitch_core::Error {
    fn from(err: DeviceError) -> Self {
        locswitch_core::Error::device(err.to_string())
    }
}
