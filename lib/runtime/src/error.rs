//! Errors reported while assembling the runtime services.

use core::{error, fmt};

use emu_variable::ImageError;

/// Various errors that can occur while creating a [`RuntimeServices`][r].
///
/// [r]: crate::RuntimeServices
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub enum SetupError {
    /// The clock configuration is inconsistent.
    Rtc(pc_rtc::ConfigError),
    /// The variable store configuration or its restored image is not valid.
    Variables(ImageError),
}

impl From<pc_rtc::ConfigError> for SetupError {
    fn from(value: pc_rtc::ConfigError) -> Self {
        Self::Rtc(value)
    }
}

impl From<ImageError> for SetupError {
    fn from(value: ImageError) -> Self {
        Self::Variables(value)
    }
}

impl From<emu_variable::ConfigError> for SetupError {
    fn from(value: emu_variable::ConfigError) -> Self {
        Self::Variables(ImageError::Config(value))
    }
}

impl fmt::Display for SetupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rtc(error) => write!(f, "real-time clock: {error}"),
            Self::Variables(error) => write!(f, "variable store: {error}"),
        }
    }
}

impl error::Error for SetupError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            Self::Rtc(error) => Some(error),
            Self::Variables(error) => Some(error),
        }
    }
}
