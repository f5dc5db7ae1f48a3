//! Memory backed variable store.
//!
//! [`VariableStore`] keeps variables in two append-only arenas, one non-volatile and one
//! volatile. Entries are never removed: deleting or replacing a variable only changes the state
//! of its old entry, so arena space is consumed until the store is recreated.

#![no_std]

extern crate alloc;

pub mod config;
pub mod entry;
pub mod error;
pub mod image;
pub mod name;
pub mod store;

mod arena;

pub use config::{ConfigError, VariableStoreConfig};
pub use error::{ImageError, VariableError};
pub use name::VariableName;
pub use store::{VariableInfo, VariableStorageInfo, VariableStore};
