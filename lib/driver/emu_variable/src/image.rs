//! The serialized form of the non-volatile arena.
//!
//! An image starts with a 28 byte store header, followed by back to back entries. Space after
//! the last entry is left erased (`0xFF`).
//!
//! | Offset | Size | Field     |
//! |--------|------|-----------|
//! | 0      | 16   | signature |
//! | 16     | 4    | size      |
//! | 20     | 1    | format    |
//! | 21     | 1    | state     |
//! | 22     | 6    | reserved  |

use alloc::vec::Vec;

use uefi::{data_type::Guid, guid};

use crate::{entry::Entry, error::ImageError};

/// Size of the store header.
pub const STORE_HEADER_SIZE: usize = 28;

/// Signature identifying a variable store.
pub const VARIABLE_STORE_SIGNATURE: Guid = guid!("ddcf3616-3275-4164-98b6-fe85707ffe7d");

/// Format byte of a formatted store.
pub const FORMATTED: u8 = 0x5A;

/// State byte of a healthy store.
pub const HEALTHY: u8 = 0xFE;

/// Value of erased storage.
pub const ERASED: u8 = 0xFF;

/// Serializes a store of `size` bytes holding `entries`.
///
/// Entries that do not fit are not written.
pub fn encode(size: usize, entries: &[Entry]) -> Vec<u8> {
    let mut image = Vec::with_capacity(size);

    image.extend_from_slice(&VARIABLE_STORE_SIGNATURE.to_bytes());
    image.extend_from_slice(&u32::try_from(size).unwrap_or(u32::MAX).to_le_bytes());
    image.push(FORMATTED);
    image.push(HEALTHY);
    image.extend_from_slice(&[0; 6]);

    for entry in entries {
        if image.len() + entry.physical_size() > size {
            break;
        }
        entry.encode_into(&mut image);
    }

    image.resize(size, ERASED);
    image
}

/// Deserializes the entries of an image that must be `expected_size` bytes long.
///
/// Entries are read until the first position that does not start with an entry header.
///
/// # Errors
///
/// Returns [`ImageError`] if the image has the wrong size, an invalid header, or a malformed
/// entry.
pub fn decode(image: &[u8], expected_size: usize) -> Result<Vec<Entry>, ImageError> {
    if image.len() != expected_size {
        return Err(ImageError::SizeMismatch {
            expected: expected_size,
            actual: image.len(),
        });
    }

    let Some(header) = image.get(..STORE_HEADER_SIZE) else {
        return Err(ImageError::SizeMismatch {
            expected: expected_size,
            actual: image.len(),
        });
    };

    let mut signature = [0; Guid::SIZE];
    signature.copy_from_slice(&header[..Guid::SIZE]);
    if Guid::from_bytes(signature) != VARIABLE_STORE_SIGNATURE {
        return Err(ImageError::InvalidSignature);
    }

    let size = u32::from_le_bytes([header[16], header[17], header[18], header[19]]);
    if usize::try_from(size).ok() != Some(image.len()) {
        return Err(ImageError::InvalidHeaderSize(size));
    }
    if header[20] != FORMATTED {
        return Err(ImageError::NotFormatted);
    }
    if header[21] != HEALTHY {
        return Err(ImageError::Unhealthy);
    }

    let mut entries = Vec::new();
    let mut offset = STORE_HEADER_SIZE;
    while let Some((entry, size)) = Entry::decode(image, offset)? {
        entries.push(entry);
        offset += size;
    }

    Ok(entries)
}
