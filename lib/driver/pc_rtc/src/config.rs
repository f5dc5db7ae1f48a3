//! Platform configuration of the real-time clock driver.

use core::{error, fmt, ops::RangeInclusive};

use uefi::time::Time;

use crate::{
    calendar,
    error::TimeField,
    register::{self, RegisterB},
};

/// Platform configuration of a [`PcRtc`][d].
///
/// [d]: crate::PcRtc
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub struct RtcConfig {
    /// Value programmed into register A at initialization.
    pub register_a: u8,
    /// Value programmed into register B at initialization. The alarm interrupt enable bit is
    /// carried over from the previous contents.
    pub register_b: u8,
    /// Value programmed into register D at initialization.
    pub register_d: u8,
    /// Upper bound, in microseconds, on the wait for an update cycle to finish.
    pub update_timeout_us: u32,
    /// Location of the century byte, or `None` if the century must be inferred.
    pub century_register: Option<u8>,
    /// Earliest year the driver accepts.
    pub minimal_valid_year: u16,
    /// Latest year the driver accepts.
    pub maximal_valid_year: u16,
    /// Time programmed when the clock holds garbage at initialization.
    pub default_time: Time,
}

impl RtcConfig {
    /// Returns the range of years the driver accepts.
    pub const fn valid_years(&self) -> RangeInclusive<u16> {
        self.minimal_valid_year..=self.maximal_valid_year
    }

    /// Checks that the configuration is internally consistent.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] describing the first inconsistency found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.minimal_valid_year > self.maximal_valid_year {
            return Err(ConfigError::InvertedYearRange {
                minimal: self.minimal_valid_year,
                maximal: self.maximal_valid_year,
            });
        }
        if self.maximal_valid_year > MAXIMAL_ENCODABLE_YEAR {
            return Err(ConfigError::UnencodableYear(self.maximal_valid_year));
        }
        if self.register_b & RegisterB::SET != 0 {
            return Err(ConfigError::UpdatesInhibited);
        }
        match self.century_register {
            Some(century) if century <= register::REGISTER_D => {
                return Err(ConfigError::CenturyOverlapsClock(century));
            }
            _ => {}
        }

        calendar::validate(&self.default_time, self.valid_years())
            .map_err(ConfigError::DefaultTime)
    }
}

/// Latest year representable by a two digit year and a two digit century.
const MAXIMAL_ENCODABLE_YEAR: u16 = 9999;

impl Default for RtcConfig {
    fn default() -> Self {
        Self {
            register_a: 0x26,
            register_b: RegisterB::HOUR_24,
            register_d: 0x00,
            update_timeout_us: 100_000,
            century_register: Some(register::CENTURY),
            minimal_valid_year: 1998,
            maximal_valid_year: 2099,
            default_time: Time::new(2001, 1, 1, 0, 0, 0),
        }
    }
}

/// Various errors that can occur while validating an [`RtcConfig`].
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub enum ConfigError {
    /// The minimal valid year lies after the maximal valid year.
    InvertedYearRange {
        /// The configured minimal valid year.
        minimal: u16,
        /// The configured maximal valid year.
        maximal: u16,
    },
    /// The year cannot be held by the century and year registers.
    UnencodableYear(u16),
    /// The configured register B inhibits updates.
    UpdatesInhibited,
    /// The century register overlaps the clock and status registers.
    CenturyOverlapsClock(u8),
    /// The default time is not itself valid.
    DefaultTime(TimeField),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvertedYearRange { minimal, maximal } => {
                write!(f, "minimal valid year {minimal} lies after maximal valid year {maximal}")
            }
            Self::UnencodableYear(year) => write!(f, "year {year} cannot be encoded"),
            Self::UpdatesInhibited => write!(f, "configured register B inhibits updates"),
            Self::CenturyOverlapsClock(register) => {
                write!(f, "century register {register:#04x} overlaps the clock registers")
            }
            Self::DefaultTime(field) => write!(f, "default time has an invalid {field}"),
        }
    }
}

impl error::Error for ConfigError {}

#[cfg(test)]
mod test {
    use uefi::time::Time;

    use super::{ConfigError, RtcConfig};
    use crate::error::TimeField;

    #[test]
    fn default_is_valid() {
        assert_eq!(RtcConfig::default().validate(), Ok(()));
    }

    #[test]
    fn inconsistencies_are_rejected() {
        let config = RtcConfig {
            minimal_valid_year: 2100,
            ..RtcConfig::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::InvertedYearRange {
                minimal: 2100,
                maximal: 2099
            })
        );

        let config = RtcConfig {
            default_time: Time::new(1990, 1, 1, 0, 0, 0),
            ..RtcConfig::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::DefaultTime(TimeField::Year))
        );

        let config = RtcConfig {
            century_register: Some(0x09),
            ..RtcConfig::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::CenturyOverlapsClock(0x09))
        );

        let config = RtcConfig {
            register_b: 0x82,
            ..RtcConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::UpdatesInhibited));
    }
}
