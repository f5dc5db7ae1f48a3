//! Variable entries and their serialized layout.
//!
//! An entry is serialized as a 32 byte header followed by the null terminated name and the
//! data, each padded to a four byte boundary:
//!
//! | Offset | Size | Field        |
//! |--------|------|--------------|
//! | 0      | 2    | start id     |
//! | 2      | 1    | state        |
//! | 3      | 1    | reserved     |
//! | 4      | 4    | attributes   |
//! | 8      | 4    | name size    |
//! | 12     | 4    | data size    |
//! | 16     | 16   | vendor GUID  |

use alloc::vec::Vec;

use uefi::{data_type::Guid, variable::VariableAttributes};

use crate::{error::ImageError, name::VariableName};

/// Size of a serialized entry header.
pub const HEADER_SIZE: usize = 32;

/// Value marking the start of a serialized entry.
pub const START_ID: u16 = 0x55AA;

/// Alignment of the name and data of a serialized entry.
pub const ALIGNMENT: usize = 4;

/// Rounds `size` up to [`ALIGNMENT`].
pub const fn pad(size: usize) -> usize {
    size.next_multiple_of(ALIGNMENT)
}

/// Returns the serialized size of an entry with the given name and data sizes.
pub const fn encoded_size(name_size: usize, data_size: usize) -> usize {
    HEADER_SIZE + pad(name_size) + pad(data_size)
}

/// The life cycle state of an entry.
///
/// States only ever clear bits, so every transition can be applied to flash in place.
#[repr(transparent)]
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub struct VariableState(pub u8);

impl VariableState {
    /// The entry is the live version of its variable.
    pub const ADDED: Self = Self(0x3F);
    /// Mask applied while the entry is being superseded.
    pub const IN_DELETED_TRANSITION: u8 = 0xFE;
    /// Mask applied once the entry is dead.
    pub const DELETED: u8 = 0xFD;

    /// Returns `true` if the entry is the live version of its variable.
    pub const fn is_added(self) -> bool {
        self.0 == Self::ADDED.0
    }

    /// Returns the state with the in-deleted-transition mask applied.
    #[must_use]
    pub const fn in_deleted_transition(self) -> Self {
        Self(self.0 & Self::IN_DELETED_TRANSITION)
    }

    /// Returns the state with the deleted mask applied.
    #[must_use]
    pub const fn deleted(self) -> Self {
        Self(self.0 & Self::DELETED)
    }
}

/// A single version of a variable.
#[derive(Clone, Debug, Hash, PartialEq, Eq)]
pub struct Entry {
    /// The life cycle state.
    pub state: VariableState,
    /// The attributes the variable was set with.
    pub attributes: VariableAttributes,
    /// The vendor namespace.
    pub vendor: Guid,
    /// The name within the vendor namespace.
    pub name: VariableName,
    /// The contents.
    pub data: Vec<u8>,
}

impl Entry {
    /// Creates a live entry.
    pub fn new(
        name: VariableName,
        vendor: Guid,
        attributes: VariableAttributes,
        data: Vec<u8>,
    ) -> Self {
        Self {
            state: VariableState::ADDED,
            attributes,
            vendor,
            name,
            data,
        }
    }

    /// Returns `true` if the entry is named `name` in the namespace `vendor`.
    pub fn matches(&self, name: &[u16], vendor: &Guid) -> bool {
        self.vendor == *vendor && self.name.as_ucs2() == name
    }

    /// Returns the number of bytes the entry occupies in its arena.
    pub fn physical_size(&self) -> usize {
        encoded_size(self.name.size(), self.data.len())
    }

    /// Appends the serialized entry to `out`.
    ///
    /// Padding is filled with zeros.
    pub fn encode_into(&self, out: &mut Vec<u8>) {
        let start = out.len();
        let name_size = self.name.size();

        out.extend_from_slice(&START_ID.to_le_bytes());
        out.push(self.state.0);
        out.push(0);
        out.extend_from_slice(&self.attributes.bits().to_le_bytes());
        out.extend_from_slice(&size_field(name_size).to_le_bytes());
        out.extend_from_slice(&size_field(self.data.len()).to_le_bytes());
        out.extend_from_slice(&self.vendor.to_bytes());

        for c in self.name.as_ucs2() {
            out.extend_from_slice(&c.to_le_bytes());
        }
        out.extend_from_slice(&[0; 2]);
        out.resize(start + HEADER_SIZE + pad(name_size), 0);

        out.extend_from_slice(&self.data);
        out.resize(start + self.physical_size(), 0);
    }

    /// Decodes the entry at `offset` within `image`.
    ///
    /// Returns `Ok(None)` if no entry header starts at `offset`, and the entry along with its
    /// serialized size otherwise.
    ///
    /// # Errors
    ///
    /// Returns [`ImageError::MalformedEntry`] if the header is present but the entry is malformed
    /// or extends past the end of `image`.
    pub fn decode(image: &[u8], offset: usize) -> Result<Option<(Self, usize)>, ImageError> {
        let malformed = ImageError::MalformedEntry { offset };

        let Some(bytes) = image.get(offset..) else {
            return Ok(None);
        };
        let Some(header) = bytes.get(..HEADER_SIZE) else {
            return Ok(None);
        };
        if u16::from_le_bytes([header[0], header[1]]) != START_ID {
            return Ok(None);
        }

        let field = |offset: usize| {
            u32::from_le_bytes([
                header[offset],
                header[offset + 1],
                header[offset + 2],
                header[offset + 3],
            ])
        };
        let attributes = VariableAttributes::from_bits_retain(field(4));
        let name_size = usize::try_from(field(8)).map_err(|_| malformed)?;
        let data_size = usize::try_from(field(12)).map_err(|_| malformed)?;
        if name_size < size_of::<u16>() || name_size % size_of::<u16>() != 0 {
            return Err(malformed);
        }

        let size = HEADER_SIZE
            .checked_add(pad(name_size))
            .and_then(|size| size.checked_add(pad(data_size)))
            .ok_or(malformed)?;
        let body = bytes.get(..size).ok_or(malformed)?;

        let mut vendor = [0; Guid::SIZE];
        vendor.copy_from_slice(&header[16..32]);

        let characters: Vec<u16> = body[HEADER_SIZE..HEADER_SIZE + name_size]
            .chunks_exact(2)
            .map(|c| u16::from_le_bytes([c[0], c[1]]))
            .collect();
        let name = VariableName::from_ucs2(&characters);
        if name.size() != name_size {
            return Err(malformed);
        }

        let data_start = HEADER_SIZE + pad(name_size);
        let entry = Self {
            state: VariableState(header[2]),
            attributes,
            vendor: Guid::from_bytes(vendor),
            name,
            data: body[data_start..data_start + data_size].to_vec(),
        };

        Ok(Some((entry, size)))
    }
}

/// Converts an in-memory size to its 32-bit serialized form.
///
/// Sizes are bounded by the store size, which is validated to fit.
fn size_field(size: usize) -> u32 {
    u32::try_from(size).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod test {
    use alloc::vec::Vec;

    use uefi::{guid, variable::VariableAttributes};

    use super::{Entry, HEADER_SIZE, VariableState, encoded_size};
    use crate::{error::ImageError, name::VariableName};

    #[test]
    fn sizes_are_padded() {
        assert_eq!(encoded_size(2, 0), HEADER_SIZE + 4);
        assert_eq!(encoded_size(8, 4), HEADER_SIZE + 8 + 4);
        assert_eq!(encoded_size(10, 5), HEADER_SIZE + 12 + 8);
    }

    #[test]
    fn state_transitions_only_clear_bits() {
        let transition = VariableState::ADDED.in_deleted_transition();
        assert_eq!(transition, VariableState(0x3E));
        assert!(!transition.is_added());

        assert_eq!(transition.deleted(), VariableState(0x3C));
        assert_eq!(VariableState::ADDED.deleted(), VariableState(0x3D));
    }

    #[test]
    fn serialized_layout() {
        let entry = Entry::new(
            VariableName::new("RTC"),
            guid!("378d7b65-8da9-4773-b6e4-a47826a833e1"),
            VariableAttributes::NON_VOLATILE | VariableAttributes::BOOT_SERVICES_ACCESS,
            Vec::from([0xAA, 0xBB, 0xCC]),
        );

        let mut bytes = Vec::new();
        entry.encode_into(&mut bytes);

        assert_eq!(bytes.len(), entry.physical_size());
        assert_eq!(bytes.len(), HEADER_SIZE + 8 + 4);
        assert_eq!(&bytes[0..4], &[0xAA, 0x55, 0x3F, 0x00]);
        assert_eq!(&bytes[4..8], &3u32.to_le_bytes());
        assert_eq!(&bytes[8..12], &8u32.to_le_bytes());
        assert_eq!(&bytes[12..16], &3u32.to_le_bytes());
        assert_eq!(&bytes[32..40], &[b'R', 0, b'T', 0, b'C', 0, 0, 0]);
        assert_eq!(&bytes[40..44], &[0xAA, 0xBB, 0xCC, 0x00]);

        assert_eq!(Entry::decode(&bytes, 0), Ok(Some((entry, 44))));
    }

    #[test]
    fn decode_stops_at_free_space() {
        assert_eq!(Entry::decode(&[0xFF; 64], 0), Ok(None));
        assert_eq!(Entry::decode(&[0xAA, 0x55], 0), Ok(None));
        assert_eq!(Entry::decode(&[0xFF; 64], 128), Ok(None));
    }

    #[test]
    fn decode_rejects_truncated_entry() {
        let entry = Entry::new(
            VariableName::new("Lang"),
            uefi::variable::GLOBAL_VARIABLE,
            VariableAttributes::BOOT_SERVICES_ACCESS,
            Vec::from([1, 2, 3, 4, 5, 6, 7, 8]),
        );
        let mut bytes = Vec::new();
        entry.encode_into(&mut bytes);

        let mut image = Vec::from([0xFF; 8]);
        image.extend_from_slice(&bytes[..bytes.len() - 4]);
        assert_eq!(
            Entry::decode(&image, 8),
            Err(ImageError::MalformedEntry { offset: 8 })
        );
    }
}
