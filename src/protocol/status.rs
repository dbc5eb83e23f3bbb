//! Configuration model status codes

use std::fmt;

/// Status code carried in configuration status messages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum StatusCode {
    /// Success
    Success = 0x00,
    /// Invalid Address
    InvalidAddress = 0x01,
    /// Invalid Model
    InvalidModel = 0x02,
    /// Invalid AppKey Index
    InvalidAppKeyIndex = 0x03,
    /// Invalid NetKey Index
    InvalidNetKeyIndex = 0x04,
    /// Insufficient Resources
    InsufficientResources = 0x05,
    /// Key Index Already Stored
    KeyIndexAlreadyStored = 0x06,
    /// Invalid Publish Parameters
    InvalidPublishParameters = 0x07,
    /// Not a Subscribe Model
    NotASubscribeModel = 0x08,
    /// Storage Failure
    StorageFailure = 0x09,
    /// Feature Not Supported
    FeatureNotSupported = 0x0A,
    /// Cannot Update
    CannotUpdate = 0x0B,
    /// Cannot Remove
    CannotRemove = 0x0C,
    /// Cannot Bind
    CannotBind = 0x0D,
    /// Temporarily Unable to Change State
    TemporarilyUnableToChangeState = 0x0E,
    /// Cannot Set
    CannotSet = 0x0F,
    /// Unspecified Error
    UnspecifiedError = 0x10,
    /// Invalid Binding
    InvalidBinding = 0x11,
}

impl StatusCode {
    /// Convert from byte
    #[must_use]
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0x00 => Some(Self::Success),
            0x01 => Some(Self::InvalidAddress),
            0x02 => Some(Self::InvalidModel),
            0x03 => Some(Self::InvalidAppKeyIndex),
            0x04 => Some(Self::InvalidNetKeyIndex),
            0x05 => Some(Self::InsufficientResources),
            0x06 => Some(Self::KeyIndexAlreadyStored),
            0x07 => Some(Self::InvalidPublishParameters),
            0x08 => Some(Self::NotASubscribeModel),
            0x09 => Some(Self::StorageFailure),
            0x0A => Some(Self::FeatureNotSupported),
            0x0B => Some(Self::CannotUpdate),
            0x0C => Some(Self::CannotRemove),
            0x0D => Some(Self::CannotBind),
            0x0E => Some(Self::TemporarilyUnableToChangeState),
            0x0F => Some(Self::CannotSet),
            0x10 => Some(Self::UnspecifiedError),
            0x11 => Some(Self::InvalidBinding),
            _ => None,
        }
    }

    /// Convert to byte
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    /// Check for success
    #[must_use]
    pub const fn is_success(self) -> bool {
        matches!(self, Self::Success)
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Success => "Success",
            Self::InvalidAddress => "Invalid Address",
            Self::InvalidModel => "Invalid Model",
            Self::InvalidAppKeyIndex => "Invalid AppKey Index",
            Self::InvalidNetKeyIndex => "Invalid NetKey Index",
            Self::InsufficientResources => "Insufficient Resources",
            Self::KeyIndexAlreadyStored => "Key Index Already Stored",
            Self::InvalidPublishParameters => "Invalid Publish Parameters",
            Self::NotASubscribeModel => "Not a Subscribe Model",
            Self::StorageFailure => "Storage Failure",
            Self::FeatureNotSupported => "Feature Not Supported",
            Self::CannotUpdate => "Cannot Update",
            Self::CannotRemove => "Cannot Remove",
            Self::CannotBind => "Cannot Bind",
            Self::TemporarilyUnableToChangeState => "Temporarily Unable to Change State",
            Self::CannotSet => "Cannot Set",
            Self::UnspecifiedError => "Unspecified Error",
            Self::InvalidBinding => "Invalid Binding",
        };
        write!(f, "{name}")
    }
}
