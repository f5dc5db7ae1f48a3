//! The variable store and its access rules.

use alloc::vec::Vec;

use log::{info, trace, warn};
use spin::Mutex;
use uefi::{
    data_type::Guid,
    phase::{BootPhase, ExecutionPhase},
    variable::VariableAttributes,
};

use crate::{
    arena::{ArenaKind, Arenas, Pool},
    config::{ConfigError, VariableStoreConfig},
    entry::{Entry, HEADER_SIZE, encoded_size},
    error::{ImageError, VariableError},
    image,
    name::{self, VariableName},
};

/// Name prefix required of hardware error records.
pub const HARDWARE_ERROR_RECORD_PREFIX: &str = "HwErrRec";

/// A description of a live variable.
#[derive(Clone, Debug, Hash, PartialEq, Eq)]
pub struct VariableInfo {
    /// The name of the variable.
    pub name: VariableName,
    /// The vendor namespace of the variable.
    pub vendor: Guid,
    /// The attributes of the variable.
    pub attributes: VariableAttributes,
    /// The size of the contents of the variable.
    pub data_size: usize,
}

/// Space information for one kind of variable.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub struct VariableStorageInfo {
    /// Total space available to variables of the queried kind.
    pub maximum_storage_size: usize,
    /// Space not yet consumed by variables of the queried kind.
    pub remaining_storage_size: usize,
    /// Largest variable, excluding its header, that could currently be stored.
    pub maximum_variable_size: usize,
}

/// A variable store backed by two append-only arenas.
///
/// Both arenas are guarded by a single lock. Lookups search the non-volatile arena before the
/// volatile one.
pub struct VariableStore<E: ExecutionPhase = BootPhase> {
    /// The sizing of the store.
    config: VariableStoreConfig,
    /// Reports whether the restricted runtime access rules apply.
    phase: E,
    /// The entries of both arenas.
    arenas: Mutex<Arenas>,
}

impl<E: ExecutionPhase> VariableStore<E> {
    /// Creates an empty [`VariableStore`].
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if `config` is inconsistent.
    pub fn new(config: VariableStoreConfig, phase: E) -> Result<Self, ConfigError> {
        config.validate()?;

        info!(
            "variable store created: {:#x} bytes non-volatile, {:#x} bytes volatile",
            config.non_volatile_store_size, config.volatile_store_size
        );
        Ok(Self {
            config,
            phase,
            arenas: Mutex::new(Arenas::default()),
        })
    }

    /// Creates a [`VariableStore`] whose non-volatile arena is restored from `image`.
    ///
    /// Superseded and deleted entries are restored as well, so the space they occupy stays
    /// consumed.
    ///
    /// # Errors
    ///
    /// Returns [`ImageError`] if `config` is inconsistent or `image` is not a valid store of
    /// the configured size.
    pub fn with_non_volatile_image(
        config: VariableStoreConfig,
        phase: E,
        image: &[u8],
    ) -> Result<Self, ImageError> {
        let store = Self::new(config, phase)?;

        let entries = image::decode(image, config.non_volatile_store_size)
            .inspect_err(|error| warn!("rejecting non-volatile variable image: {error}"))?;
        info!("restored {} non-volatile variable entries", entries.len());

        store.arenas.lock().non_volatile = entries;
        Ok(store)
    }

    /// Serializes the non-volatile arena.
    pub fn export_non_volatile(&self) -> Vec<u8> {
        image::encode(
            self.config.non_volatile_store_size,
            &self.arenas.lock().non_volatile,
        )
    }

    /// Returns the sizing of the store.
    pub const fn config(&self) -> &VariableStoreConfig {
        &self.config
    }

    /// Describes the live variable named `name` in `vendor`.
    ///
    /// An empty `name` matches the first visible variable. At runtime, variables without runtime
    /// access are invisible.
    ///
    /// # Errors
    ///
    /// Returns [`VariableError::InvalidParameter`] if `name` is not empty and `vendor` is
    /// `None`, and [`VariableError::NotFound`] if nothing matches.
    pub fn find_variable(
        &self,
        name: &[u16],
        vendor: Option<&Guid>,
    ) -> Result<VariableInfo, VariableError> {
        let arenas = self.arenas.lock();
        let position = arenas
            .find(name, vendor, self.phase.at_runtime())?
            .ok_or(VariableError::NotFound)?;
        let entry = arenas.entry(position);

        Ok(VariableInfo {
            name: entry.name.clone(),
            vendor: entry.vendor,
            attributes: entry.attributes,
            data_size: entry.data.len(),
        })
    }

    /// Copies the contents of the variable named `name` in `vendor` into `data`.
    ///
    /// Returns the attributes of the variable and the size of its contents.
    ///
    /// # Errors
    ///
    /// Returns [`VariableError::NotFound`] if no visible variable matches, and
    /// [`VariableError::BufferTooSmall`] with the size of the contents if `data` cannot hold
    /// them.
    pub fn get_variable(
        &self,
        name: &[u16],
        vendor: &Guid,
        data: &mut [u8],
    ) -> Result<(VariableAttributes, usize), VariableError> {
        let arenas = self.arenas.lock();
        let position = arenas
            .find(name, Some(vendor), self.phase.at_runtime())?
            .ok_or(VariableError::NotFound)?;
        let entry = arenas.entry(position);

        let size = entry.data.len();
        data.get_mut(..size)
            .ok_or(VariableError::BufferTooSmall { required: size })?
            .copy_from_slice(&entry.data);

        Ok((entry.attributes, size))
    }

    /// Returns the variable that follows `name` in `vendor`, or the first variable if `name` is
    /// empty.
    ///
    /// `name_buffer_size` is the size in bytes of the caller's name buffer. The iteration
    /// position is not consumed when the buffer is too small.
    ///
    /// # Errors
    ///
    /// Returns [`VariableError::NotFound`] if `name` is unknown or no further variable exists,
    /// and [`VariableError::BufferTooSmall`] with the size of the name including its terminator
    /// if it does not fit.
    pub fn get_next_variable_name(
        &self,
        name: &[u16],
        vendor: &Guid,
        name_buffer_size: usize,
    ) -> Result<(VariableName, Guid), VariableError> {
        let at_runtime = self.phase.at_runtime();
        let arenas = self.arenas.lock();

        let previous = if name.is_empty() {
            None
        } else {
            Some(
                arenas
                    .find(name, Some(vendor), at_runtime)?
                    .ok_or(VariableError::NotFound)?,
            )
        };

        let next = arenas
            .positions_after(previous)
            .find(|&position| arenas.visible(position, at_runtime))
            .ok_or(VariableError::NotFound)?;
        let entry = arenas.entry(next);

        let required = entry.name.size();
        if required > name_buffer_size {
            return Err(VariableError::BufferTooSmall { required });
        }

        Ok((entry.name.clone(), entry.vendor))
    }

    /// Creates, replaces, or deletes the variable named `name` in `vendor`.
    ///
    /// Empty `data` or attributes without either access bit delete the variable. Writing the
    /// contents a variable already holds succeeds without consuming space.
    ///
    /// # Errors
    ///
    /// - [`VariableError::InvalidParameter`] if the name, attributes, or size are not
    ///   acceptable, or a runtime write breaks the runtime access rules. This includes runtime
    ///   writes to a variable that exists without runtime access.
    /// - [`VariableError::WriteProtected`] if a volatile variable is modified at runtime.
    /// - [`VariableError::NotFound`] if a variable that does not exist is deleted.
    /// - [`VariableError::OutOfResources`] if the arena has no room for the new contents.
    pub fn set_variable(
        &self,
        name: &[u16],
        vendor: &Guid,
        attributes: VariableAttributes,
        data: &[u8],
    ) -> Result<(), VariableError> {
        let at_runtime = self.phase.at_runtime();
        self.check_set_parameters(name, attributes, data.len())?;

        let mut arenas = self.arenas.lock();
        // Entries hidden at runtime still own their key.
        let existing = arenas.find(name, Some(vendor), false)?;
        let delete = data.is_empty() || !attributes.intersects(VariableAttributes::ACCESS);

        match existing {
            Some(position) => {
                let entry = arenas.entry(position);
                if at_runtime {
                    if !entry.attributes.contains(VariableAttributes::RUNTIME_ACCESS) {
                        return Err(VariableError::InvalidParameter);
                    }
                    if position.kind == ArenaKind::Volatile {
                        return Err(VariableError::WriteProtected);
                    }
                    if !entry.attributes.contains(VariableAttributes::NON_VOLATILE) {
                        return Err(VariableError::InvalidParameter);
                    }
                }

                if delete {
                    trace!("deleting variable {}", entry.name);
                    let state = entry.state.deleted();
                    arenas.set_state(position, state);
                    return Ok(());
                }

                if entry.data == data {
                    return Ok(());
                }
            }
            None => {
                if delete {
                    return Err(VariableError::NotFound);
                }

                let runtime_creatable =
                    VariableAttributes::NON_VOLATILE | VariableAttributes::RUNTIME_ACCESS;
                if at_runtime && !attributes.contains(runtime_creatable) {
                    return Err(VariableError::InvalidParameter);
                }
            }
        }

        let entry = Entry::new(
            VariableName::from_ucs2(name),
            *vendor,
            attributes,
            data.to_vec(),
        );

        // Space is checked before the old entry is touched, so a failed write leaves it live.
        let pool = Pool::of(ArenaKind::of(attributes), attributes);
        if arenas.used(pool) + entry.physical_size() > pool.capacity(&self.config) {
            warn!("no room for variable {} in {pool:?} storage", entry.name);
            return Err(VariableError::OutOfResources);
        }

        if let Some(position) = existing {
            let state = arenas.entry(position).state.in_deleted_transition();
            arenas.set_state(position, state);
        }

        arenas.append(entry, &self.config)?;

        if let Some(position) = existing {
            let old = arenas.entry(position);
            trace!("superseded variable {}", old.name);
            let state = old.state.deleted();
            arenas.set_state(position, state);
        }

        Ok(())
    }

    /// Reports the space available to variables with `attributes`.
    ///
    /// Every entry ever written to the queried pool counts against it, since space is never
    /// reclaimed.
    ///
    /// # Errors
    ///
    /// Returns [`VariableError::InvalidParameter`] or [`VariableError::Unsupported`] if the
    /// attribute combination cannot be queried in the current phase.
    pub fn query_variable_info(
        &self,
        attributes: VariableAttributes,
    ) -> Result<VariableStorageInfo, VariableError> {
        if attributes.is_empty() {
            return Err(VariableError::InvalidParameter);
        }
        if !attributes.intersects(VariableAttributes::STORAGE) {
            return Err(VariableError::Unsupported);
        }
        if attributes.runtime_without_boot_access() {
            return Err(VariableError::InvalidParameter);
        }
        if self.phase.at_runtime() && !attributes.contains(VariableAttributes::RUNTIME_ACCESS) {
            return Err(VariableError::InvalidParameter);
        }

        let hardware_error = attributes.contains(VariableAttributes::HARDWARE_ERROR_RECORD);
        if hardware_error && !attributes.contains(VariableAttributes::NON_VOLATILE) {
            return Err(VariableError::InvalidParameter);
        }
        if attributes.intersects(VariableAttributes::AUTHENTICATED) {
            return Err(VariableError::Unsupported);
        }

        let pool = Pool::of(ArenaKind::of(attributes), attributes);
        let configured_maximum = if hardware_error {
            self.config.max_hardware_error_variable_size
        } else {
            self.config.max_variable_size
        };

        let maximum_storage_size = pool.capacity(&self.config);
        let remaining_storage_size =
            maximum_storage_size.saturating_sub(self.arenas.lock().used(pool));
        let maximum_variable_size = remaining_storage_size
            .checked_sub(HEADER_SIZE)
            .map_or(0, |room| room.min(configured_maximum - HEADER_SIZE));

        Ok(VariableStorageInfo {
            maximum_storage_size,
            remaining_storage_size,
            maximum_variable_size,
        })
    }

    /// Validates a write before any entry is looked up.
    fn check_set_parameters(
        &self,
        name: &[u16],
        attributes: VariableAttributes,
        data_size: usize,
    ) -> Result<(), VariableError> {
        if name.is_empty() || name.contains(&0) {
            return Err(VariableError::InvalidParameter);
        }
        if attributes.intersects(
            VariableAttributes::AUTHENTICATED.union(VariableAttributes::APPEND_WRITE),
        ) {
            return Err(VariableError::InvalidParameter);
        }
        if attributes.runtime_without_boot_access() {
            return Err(VariableError::InvalidParameter);
        }

        let size = encoded_size(name::size_with_terminator(name), data_size);
        let maximum = if attributes.contains(VariableAttributes::HARDWARE_ERROR_RECORD) {
            if !attributes.contains(VariableAttributes::NON_VOLATILE)
                || !name::starts_with(name, HARDWARE_ERROR_RECORD_PREFIX)
            {
                return Err(VariableError::InvalidParameter);
            }

            self.config.max_hardware_error_variable_size
        } else {
            self.config.max_variable_size
        };
        if size > maximum {
            return Err(VariableError::InvalidParameter);
        }

        Ok(())
    }
}
