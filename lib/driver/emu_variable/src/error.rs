//! Errors reported by the variable store.

use core::{error, fmt};

use uefi::data_type::Status;

use crate::config::ConfigError;

/// Various errors that can occur while accessing a [`VariableStore`][s].
///
/// [s]: crate::VariableStore
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub enum VariableError {
    /// A name, vendor, attribute combination, or size was not acceptable.
    InvalidParameter,
    /// The attribute combination is not supported.
    Unsupported,
    /// No visible variable matched the request.
    NotFound,
    /// The caller's buffer cannot hold the result.
    BufferTooSmall {
        /// The number of bytes needed.
        required: usize,
    },
    /// The arena the variable belongs in has no room left.
    OutOfResources,
    /// The variable cannot be modified in the current phase.
    WriteProtected,
}

impl fmt::Display for VariableError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidParameter => f.pad("invalid parameter"),
            Self::Unsupported => f.pad("unsupported attributes"),
            Self::NotFound => f.pad("variable not found"),
            Self::BufferTooSmall { required } => {
                write!(f, "buffer too small: {required} bytes required")
            }
            Self::OutOfResources => f.pad("variable store is full"),
            Self::WriteProtected => f.pad("variable is write protected"),
        }
    }
}

impl error::Error for VariableError {}

impl From<VariableError> for Status {
    fn from(value: VariableError) -> Self {
        match value {
            VariableError::InvalidParameter => Status::INVALID_PARAMETER,
            VariableError::Unsupported => Status::UNSUPPORTED,
            VariableError::NotFound => Status::NOT_FOUND,
            VariableError::BufferTooSmall { .. } => Status::BUFFER_TOO_SMALL,
            VariableError::OutOfResources => Status::OUT_OF_RESOURCES,
            VariableError::WriteProtected => Status::WRITE_PROTECTED,
        }
    }
}

/// Various errors that can occur while loading a non-volatile image.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub enum ImageError {
    /// The configuration the image is loaded with is inconsistent.
    Config(ConfigError),
    /// The image length does not match the configured non-volatile store size.
    SizeMismatch {
        /// The configured store size.
        expected: usize,
        /// The length of the image.
        actual: usize,
    },
    /// The store header does not carry the variable store signature.
    InvalidSignature,
    /// The size recorded in the store header does not match the image length.
    InvalidHeaderSize(u32),
    /// The store is not formatted.
    NotFormatted,
    /// The store is not marked healthy.
    Unhealthy,
    /// The entry at the given offset extends past the end of the store or is malformed.
    MalformedEntry {
        /// Byte offset of the entry header within the image.
        offset: usize,
    },
}

impl From<ConfigError> for ImageError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl fmt::Display for ImageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(error) => write!(f, "invalid configuration: {error}"),
            Self::SizeMismatch { expected, actual } => {
                write!(f, "image is {actual} bytes, expected {expected}")
            }
            Self::InvalidSignature => f.pad("image does not carry the variable store signature"),
            Self::InvalidHeaderSize(size) => write!(f, "store header records size {size}"),
            Self::NotFormatted => f.pad("store is not formatted"),
            Self::Unhealthy => f.pad("store is not healthy"),
            Self::MalformedEntry { offset } => write!(f, "malformed entry at offset {offset:#x}"),
        }
    }
}

impl error::Error for ImageError {}
