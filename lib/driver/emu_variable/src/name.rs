//! UCS-2 variable names.

use alloc::vec::Vec;
use core::fmt;

use uefi::data_type::Char16;

/// The name of a variable, stored without its null terminator.
#[derive(Clone, Debug, Default, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct VariableName(Vec<u16>);

impl VariableName {
    /// Creates a [`VariableName`] from `name`.
    pub fn new(name: &str) -> Self {
        Self(name.encode_utf16().collect())
    }

    /// Creates a [`VariableName`] from UCS-2 characters, stopping at the first null character.
    pub fn from_ucs2(name: &[u16]) -> Self {
        let end = name
            .iter()
            .position(|&c| c == Char16::NULL.0)
            .unwrap_or(name.len());

        Self(name[..end].to_vec())
    }

    /// Returns the characters of the name, without a terminator.
    pub fn as_ucs2(&self) -> &[u16] {
        &self.0
    }

    /// Returns `true` if the name has no characters.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the size of the name in bytes, including its null terminator.
    pub fn size(&self) -> usize {
        size_with_terminator(&self.0)
    }

    /// Returns `true` if the name begins with `prefix`.
    pub fn starts_with(&self, prefix: &str) -> bool {
        starts_with(&self.0, prefix)
    }

    /// Writes the name followed by a null terminator into `buffer`.
    ///
    /// Returns `None` if `buffer` is too small.
    pub fn write_with_nul(&self, buffer: &mut [u16]) -> Option<usize> {
        let length = self.0.len() + 1;
        let target = buffer.get_mut(..length)?;
        let (terminator, characters) = target.split_last_mut()?;

        characters.copy_from_slice(&self.0);
        *terminator = Char16::NULL.0;
        Some(length)
    }
}

impl From<&str> for VariableName {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl fmt::Display for VariableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for c in char::decode_utf16(self.0.iter().copied()) {
            fmt::Write::write_char(f, c.unwrap_or(char::REPLACEMENT_CHARACTER))?;
        }

        Ok(())
    }
}

/// Returns the size in bytes of `name` once a null terminator is appended.
pub const fn size_with_terminator(name: &[u16]) -> usize {
    (name.len() + 1) * size_of::<u16>()
}

/// Returns `true` if `name` begins with the ASCII `prefix`.
pub fn starts_with(name: &[u16], prefix: &str) -> bool {
    let mut characters = name.iter();
    prefix
        .encode_utf16()
        .all(|expected| characters.next() == Some(&expected))
}
