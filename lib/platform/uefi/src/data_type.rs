//! Definitions of common data types.
//!
//! This module defines the status codes, booleans, and identifiers shared by the runtime
//! services.

use core::{error, fmt};

/// Logical boolean.
///
/// Should be either [`Boolean::FALSE`] or [`Boolean::TRUE`]. Other values are undefined.
#[repr(transparent)]
#[derive(Clone, Copy, Debug, Default, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct Boolean(pub u8);

impl Boolean {
    /// Corresponds to [`false`].
    pub const FALSE: Self = Self(0);
    /// Corresponds to [`true`].
    pub const TRUE: Self = Self(1);
}

impl From<bool> for Boolean {
    fn from(value: bool) -> Self {
        if value { Self::TRUE } else { Self::FALSE }
    }
}

impl From<Boolean> for bool {
    fn from(value: Boolean) -> Self {
        value != Boolean::FALSE
    }
}

/// An UCS-2 character.
#[repr(transparent)]
#[derive(Clone, Copy, Debug, Default, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct Char16(pub u16);

impl Char16 {
    /// The terminating character of a null-terminated string.
    pub const NULL: Self = Self(0);

    /// Returns `true` if the [`Char16`] is a valid character according to the UCS-2 specification.
    pub const fn valid(self) -> bool {
        self.0 <= 0xD7FF || self.0 >= 0xE000
    }
}

/// 128-bit buffer containing a unique identifier value. Unless otherwise specified,
/// aligned on a 64-bit boundary.
#[repr(C, align(8))]
#[derive(Clone, Copy, Debug, Default, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct Guid {
    /// The little-endian low field of the timestamp.
    pub time_low: u32,
    /// The little-endian middle field of the timestamp.
    pub time_mid: [u8; 2],
    /// The little-endian middle field of the timestamp and the version number.
    pub time_high_version: [u8; 2],
    /// The high field of the clock sequence and reserved.
    pub clock_seq_high_reserved: u8,
    /// The low field of the clock sequence.
    pub clock_seq_low: u8,
    /// The spatially unique node identifier.
    pub node: [u8; 6],
}

impl Guid {
    /// The size, in bytes, of the serialized form of a [`Guid`].
    pub const SIZE: usize = 16;

    /// The all-zero [`Guid`].
    pub const ZERO: Self = Self::from_bytes([0; Self::SIZE]);

    /// Offsets into the textual form of the two hex characters describing each byte of the
    /// serialized form.
    const TEXT_POSITIONS: [usize; Self::SIZE] =
        [6, 4, 2, 0, 11, 9, 16, 14, 19, 21, 24, 26, 28, 30, 32, 34];

    /// Offsets into the textual form of the `-` seperators.
    const SEPERATOR_POSITIONS: [usize; 4] = [8, 13, 18, 23];

    /// Constructs a [`Guid`] from its 16-byte serialized form.
    pub const fn from_bytes(bytes: [u8; Self::SIZE]) -> Self {
        Self {
            time_low: u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]),
            time_mid: [bytes[4], bytes[5]],
            time_high_version: [bytes[6], bytes[7]],
            clock_seq_high_reserved: bytes[8],
            clock_seq_low: bytes[9],
            node: [
                bytes[10], bytes[11], bytes[12], bytes[13], bytes[14], bytes[15],
            ],
        }
    }

    /// Returns the 16-byte serialized form of this [`Guid`].
    pub const fn to_bytes(&self) -> [u8; Self::SIZE] {
        let time_low = self.time_low.to_le_bytes();

        [
            time_low[0],
            time_low[1],
            time_low[2],
            time_low[3],
            self.time_mid[0],
            self.time_mid[1],
            self.time_high_version[0],
            self.time_high_version[1],
            self.clock_seq_high_reserved,
            self.clock_seq_low,
            self.node[0],
            self.node[1],
            self.node[2],
            self.node[3],
            self.node[4],
            self.node[5],
        ]
    }

    /// Parses a [`Guid`] from the given [`str`].
    ///
    /// # Errors
    /// - [`ParseGuidError::InvalidLength`] if the given [`str`] is not exactly 36 bytes long.
    /// - [`ParseGuidError::InvalidSeperator`] if the given [`str`] has invalid seperator
    ///   characters.
    /// - [`ParseGuidError::InvalidHexCharacter`] if the given [`str`] has invalid hex characters.
    pub const fn try_parse(s: &str) -> Result<Self, ParseGuidError> {
        let text = s.as_bytes();
        if text.len() != 36 {
            return Err(ParseGuidError::InvalidLength);
        }

        let mut index = 0;
        while index < Self::SEPERATOR_POSITIONS.len() {
            let position = Self::SEPERATOR_POSITIONS[index];
            if text[position] != b'-' {
                return Err(ParseGuidError::InvalidSeperator {
                    c: text[position],
                    position,
                });
            }

            index += 1;
        }

        let mut bytes = [0u8; Self::SIZE];
        let mut index = 0;
        while index < Self::SIZE {
            let position = Self::TEXT_POSITIONS[index];

            let high = match parse_nibble(text[position]) {
                Some(nibble) => nibble,
                None => {
                    return Err(ParseGuidError::InvalidHexCharacter {
                        c: text[position],
                        position,
                    });
                }
            };
            let low = match parse_nibble(text[position + 1]) {
                Some(nibble) => nibble,
                None => {
                    return Err(ParseGuidError::InvalidHexCharacter {
                        c: text[position + 1],
                        position: position + 1,
                    });
                }
            };

            bytes[index] = (high << 4) | low;
            index += 1;
        }

        Ok(Self::from_bytes(bytes))
    }

    /// Converts this [`Guid`] to its string representation with lowercase hex characters.
    pub const fn to_str_lower(&self) -> [u8; 36] {
        let bytes = self.to_bytes();
        let mut text = [b'-'; 36];

        let mut index = 0;
        while index < Self::SIZE {
            let position = Self::TEXT_POSITIONS[index];
            text[position] = HEX_LOWER[(bytes[index] >> 4) as usize];
            text[position + 1] = HEX_LOWER[(bytes[index] & 0xF) as usize];

            index += 1;
        }

        text
    }
}

impl fmt::Display for Guid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = self.to_str_lower();
        for &c in &text {
            fmt::Write::write_char(f, char::from(c))?;
        }

        Ok(())
    }
}

/// Lowercase hex digits indexed by nibble value.
const HEX_LOWER: [u8; 16] = *b"0123456789abcdef";

/// Returns the nibble that the hex character `c` represents.
const fn parse_nibble(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}

/// Various errors that could occur while parsing a [`Guid`].
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub enum ParseGuidError {
    /// The given string has the wrong length, expected 36 bytes.
    InvalidLength,
    /// The input is missing a seperator character (`-`) at index `position`.
    InvalidSeperator {
        /// The invalid seperator character.
        c: u8,
        /// The index at which the invalid seperator character is located.
        position: usize,
    },
    /// The input contains an invalid hex character at index `position`.
    InvalidHexCharacter {
        /// The invalid hex character.
        c: u8,
        /// The index at which the invalid hex character is located.
        position: usize,
    },
}

impl fmt::Display for ParseGuidError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::InvalidLength => {
                write!(f, "given GUID string has wrong length: expected 36 bytes")
            }
            Self::InvalidSeperator { c, position } => write!(
                f,
                "given GUID string has invalid seperator at {position}: '{}'",
                char::from(c)
            ),
            Self::InvalidHexCharacter { c, position } => write!(
                f,
                "given GUID string has invalid hex character at {position}: '{}'",
                char::from(c)
            ),
        }
    }
}

impl error::Error for ParseGuidError {}

/// Parses a [`Guid`] and panics if an error occurs.
///
/// Intended for use at compile time.
#[macro_export]
macro_rules! guid {
    ($expr:tt) => {{
        match $crate::data_type::Guid::try_parse($expr) {
            Ok(guid) => guid,
            Err($crate::data_type::ParseGuidError::InvalidLength) => {
                panic!("provided GUID is of an invalid length")
            }
            Err($crate::data_type::ParseGuidError::InvalidSeperator { .. }) => {
                panic!("given GUID has an invalid seperator character")
            }
            Err($crate::data_type::ParseGuidError::InvalidHexCharacter { .. }) => {
                panic!("given GUID has an invalid hex character")
            }
        }
    }};
}

/// A status code reported by a runtime service.
#[repr(transparent)]
#[derive(Clone, Copy, Hash, Default, PartialEq, Eq)]
pub struct Status(pub usize);

impl Status {
    /// All [`Self`]es with the [`Self::ERROR_BIT`] set are error codes.
    pub const ERROR_BIT: usize = 1 << (usize::BITS - 1);

    /// The operation completed successfully.
    pub const SUCCESS: Self = Self(0);

    /// A parameter was incorrect.
    pub const INVALID_PARAMETER: Self = Self(Self::ERROR_BIT | 2);
    /// The operation is not supported.
    pub const UNSUPPORTED: Self = Self(Self::ERROR_BIT | 3);
    /// The buffer is not large enough to hold the requested data. The required buffer size is
    /// returned in the appropriate parameter when this error occurs.
    pub const BUFFER_TOO_SMALL: Self = Self(Self::ERROR_BIT | 5);
    /// The physical device reported an error while attempting the operation.
    pub const DEVICE_ERROR: Self = Self(Self::ERROR_BIT | 7);
    /// The device cannot be written to.
    pub const WRITE_PROTECTED: Self = Self(Self::ERROR_BIT | 8);
    /// A resource has run out.
    pub const OUT_OF_RESOURCES: Self = Self(Self::ERROR_BIT | 9);
    /// The item was not found.
    pub const NOT_FOUND: Self = Self(Self::ERROR_BIT | 14);

    /// Returns `true` if `self` is an error code, otherwise returns `false`.
    pub const fn error(self) -> bool {
        self.0 & Self::ERROR_BIT == Self::ERROR_BIT
    }
}

impl fmt::Debug for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::SUCCESS => "SUCCESS".fmt(f),
            Self::INVALID_PARAMETER => "INVALID_PARAMETER".fmt(f),
            Self::UNSUPPORTED => "UNSUPPORTED".fmt(f),
            Self::BUFFER_TOO_SMALL => "BUFFER_TOO_SMALL".fmt(f),
            Self::DEVICE_ERROR => "DEVICE_ERROR".fmt(f),
            Self::WRITE_PROTECTED => "WRITE_PROTECTED".fmt(f),
            Self::OUT_OF_RESOURCES => "OUT_OF_RESOURCES".fmt(f),
            Self::NOT_FOUND => "NOT_FOUND".fmt(f),
            Self(unknown) => f.debug_tuple("Status").field(&unknown).finish(),
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[cfg(test)]
mod test {
    use crate::data_type::{Guid, ParseGuidError, Status};

    const TEST_GUID: Guid = Guid {
        time_low: 0x09576e91,
        time_mid: [0x3f, 0x6d],
        time_high_version: [0xd2, 0x11],
        clock_seq_high_reserved: 0x8e,
        clock_seq_low: 0x39,
        node: [0x00, 0xa0, 0xc9, 0x69, 0x72, 0x3b],
    };

    const TEST_GUID_STR_LOWER: &str = "09576e91-6d3f-11d2-8e39-00a0c969723b";
    const TEST_GUID_STR_UPPER: &str = "09576E91-6D3F-11D2-8E39-00A0C969723B";

    #[test]
    fn parse() {
        assert_eq!(Guid::try_parse(TEST_GUID_STR_LOWER), Ok(TEST_GUID));
        assert_eq!(Guid::try_parse(TEST_GUID_STR_UPPER), Ok(TEST_GUID));
    }

    #[test]
    fn upper_to_lower_passthrough() {
        let guid = Guid::try_parse(TEST_GUID_STR_UPPER).unwrap();

        assert_eq!(&guid.to_str_lower(), TEST_GUID_STR_LOWER.as_bytes());
    }

    #[test]
    fn serialized_form_is_little_endian() {
        let bytes = TEST_GUID.to_bytes();

        assert_eq!(&bytes[..4], &[0x91, 0x6e, 0x57, 0x09]);
        assert_eq!(Guid::from_bytes(bytes), TEST_GUID);
    }

    #[test]
    fn parse_errors() {
        assert_eq!(Guid::try_parse("09576e91"), Err(ParseGuidError::InvalidLength));
        assert_eq!(
            Guid::try_parse("09576e91_6d3f-11d2-8e39-00a0c969723b"),
            Err(ParseGuidError::InvalidSeperator {
                c: b'_',
                position: 8
            })
        );
        assert_eq!(
            Guid::try_parse("09576e91-6d3f-11d2-8e39-00a0c969723g"),
            Err(ParseGuidError::InvalidHexCharacter {
                c: b'g',
                position: 35
            })
        );
    }

    #[test]
    fn status_error_bit() {
        assert!(!Status::SUCCESS.error());
        assert!(Status::NOT_FOUND.error());
        assert!(Status::DEVICE_ERROR.error());
    }
}
