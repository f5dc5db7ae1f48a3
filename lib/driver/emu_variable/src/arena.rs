//! The two append-only arenas and their space accounting.

use alloc::vec::Vec;

use uefi::{data_type::Guid, variable::VariableAttributes};

use crate::{
    config::VariableStoreConfig,
    entry::{Entry, VariableState},
    error::VariableError,
};

/// Which arena an entry lives in.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub enum ArenaKind {
    /// Entries that survive a reset. Searched first.
    NonVolatile,
    /// Entries lost on reset.
    Volatile,
}

impl ArenaKind {
    /// Returns the arena that holds variables with `attributes`.
    pub fn of(attributes: VariableAttributes) -> Self {
        if attributes.contains(VariableAttributes::NON_VOLATILE) {
            Self::NonVolatile
        } else {
            Self::Volatile
        }
    }
}

/// A space quota that entries are charged against.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub enum Pool {
    /// The whole volatile arena.
    Volatile,
    /// The non-volatile arena minus the hardware error quota.
    Common,
    /// The hardware error quota of the non-volatile arena.
    HardwareError,
}

impl Pool {
    /// Returns the pool charged for an entry with `attributes` in the arena `kind`.
    pub fn of(kind: ArenaKind, attributes: VariableAttributes) -> Self {
        match kind {
            ArenaKind::Volatile => Self::Volatile,
            ArenaKind::NonVolatile
                if attributes.contains(VariableAttributes::HARDWARE_ERROR_RECORD) =>
            {
                Self::HardwareError
            }
            ArenaKind::NonVolatile => Self::Common,
        }
    }

    /// Returns the arena the pool is carved from.
    pub const fn arena(self) -> ArenaKind {
        match self {
            Self::Volatile => ArenaKind::Volatile,
            Self::Common | Self::HardwareError => ArenaKind::NonVolatile,
        }
    }

    /// Returns the number of bytes the pool may hold.
    pub const fn capacity(self, config: &VariableStoreConfig) -> usize {
        match self {
            Self::Volatile => config.volatile_storage_size(),
            Self::Common => config.common_storage_size(),
            Self::HardwareError => config.hardware_error_storage_size,
        }
    }
}

/// The location of an entry.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct Position {
    /// The arena holding the entry.
    pub kind: ArenaKind,
    /// The index of the entry within its arena.
    pub index: usize,
}

/// Both arenas of a store.
#[derive(Debug, Default)]
pub struct Arenas {
    /// Entries in the order they were appended to the non-volatile arena.
    pub non_volatile: Vec<Entry>,
    /// Entries in the order they were appended to the volatile arena.
    pub volatile: Vec<Entry>,
}

impl Arenas {
    /// Returns the entries of the arena `kind`.
    pub fn arena(&self, kind: ArenaKind) -> &[Entry] {
        match kind {
            ArenaKind::NonVolatile => &self.non_volatile,
            ArenaKind::Volatile => &self.volatile,
        }
    }

    /// Returns the entry at `position`.
    pub fn entry(&self, position: Position) -> &Entry {
        &self.arena(position.kind)[position.index]
    }

    /// Replaces the state of the entry at `position`.
    pub fn set_state(&mut self, position: Position, state: VariableState) {
        let arena = match position.kind {
            ArenaKind::NonVolatile => &mut self.non_volatile,
            ArenaKind::Volatile => &mut self.volatile,
        };

        arena[position.index].state = state;
    }

    /// Returns the bytes charged to `pool`, counting every entry regardless of its state.
    pub fn used(&self, pool: Pool) -> usize {
        let kind = pool.arena();
        self.arena(kind)
            .iter()
            .filter(|entry| Pool::of(kind, entry.attributes) == pool)
            .map(Entry::physical_size)
            .sum()
    }

    /// Appends `entry` to the arena its attributes select, if `pool` has room for it.
    pub fn append(
        &mut self,
        entry: Entry,
        config: &VariableStoreConfig,
    ) -> Result<Position, VariableError> {
        let kind = ArenaKind::of(entry.attributes);
        let pool = Pool::of(kind, entry.attributes);
        if self.used(pool) + entry.physical_size() > pool.capacity(config) {
            return Err(VariableError::OutOfResources);
        }

        let arena = match kind {
            ArenaKind::NonVolatile => &mut self.non_volatile,
            ArenaKind::Volatile => &mut self.volatile,
        };
        arena.push(entry);

        Ok(Position {
            kind,
            index: arena.len() - 1,
        })
    }

    /// Returns every position after `after`, non-volatile arena first.
    pub fn positions_after(&self, after: Option<Position>) -> impl Iterator<Item = Position> {
        let non_volatile = (0..self.non_volatile.len()).map(|index| Position {
            kind: ArenaKind::NonVolatile,
            index,
        });
        let volatile = (0..self.volatile.len()).map(|index| Position {
            kind: ArenaKind::Volatile,
            index,
        });

        non_volatile
            .chain(volatile)
            .filter(move |position| after.is_none_or(|after| *position > after))
    }

    /// Returns `true` if the entry at `position` can be seen in the current phase.
    pub fn visible(&self, position: Position, at_runtime: bool) -> bool {
        let entry = self.entry(position);
        entry.state.is_added()
            && (!at_runtime
                || entry
                    .attributes
                    .contains(VariableAttributes::RUNTIME_ACCESS))
    }

    /// Finds the live entry named `name` in `vendor`.
    ///
    /// An empty name matches the first visible entry.
    ///
    /// # Errors
    ///
    /// Returns [`VariableError::InvalidParameter`] if `name` is not empty and `vendor` is
    /// `None`.
    pub fn find(
        &self,
        name: &[u16],
        vendor: Option<&Guid>,
        at_runtime: bool,
    ) -> Result<Option<Position>, VariableError> {
        let mut candidates = self
            .positions_after(None)
            .filter(|&position| self.visible(position, at_runtime));

        if name.is_empty() {
            return Ok(candidates.next());
        }

        let vendor = vendor.ok_or(VariableError::InvalidParameter)?;
        Ok(candidates.find(|&position| self.entry(position).matches(name, vendor)))
    }
}

#[cfg(test)]
mod test {
    use alloc::vec::Vec;

    use uefi::{guid, variable::VariableAttributes};

    use super::{ArenaKind, Arenas, Pool, Position};
    use crate::{
        config::VariableStoreConfig, entry::Entry, error::VariableError, name::VariableName,
    };

    fn entry(name: &str, attributes: VariableAttributes, size: usize) -> Entry {
        Entry::new(
            VariableName::new(name),
            guid!("a3b7b1e4-5c2d-4b7e-9f0a-1c2d3e4f5a6b"),
            attributes,
            Vec::from_iter(core::iter::repeat_n(0x5A, size)),
        )
    }

    #[test]
    fn pools_are_charged_separately() {
        let config = VariableStoreConfig::default();
        let mut arenas = Arenas::default();
        let nv = VariableAttributes::NON_VOLATILE | VariableAttributes::BOOT_SERVICES_ACCESS;

        arenas
            .append(entry("A", nv, 4), &config)
            .expect("room available");
        arenas
            .append(
                entry("HwErrRec0000", nv | VariableAttributes::HARDWARE_ERROR_RECORD, 4),
                &config,
            )
            .expect("room available");

        assert_eq!(arenas.used(Pool::Common), 32 + 4 + 4);
        assert_eq!(arenas.used(Pool::HardwareError), 32 + 28 + 4);
        assert_eq!(arenas.used(Pool::Volatile), 0);
    }

    #[test]
    fn full_pool_rejects_append() {
        let config = VariableStoreConfig {
            volatile_store_size: 28 + 64,
            ..VariableStoreConfig::default()
        };
        let mut arenas = Arenas::default();

        let position = arenas
            .append(
                entry("A", VariableAttributes::BOOT_SERVICES_ACCESS, 28),
                &config,
            )
            .expect("entry fits exactly");
        assert_eq!(
            position,
            Position {
                kind: ArenaKind::Volatile,
                index: 0
            }
        );

        assert_eq!(
            arenas.append(
                entry("B", VariableAttributes::BOOT_SERVICES_ACCESS, 0),
                &config
            ),
            Err(VariableError::OutOfResources)
        );
    }

    #[test]
    fn non_volatile_positions_come_first() {
        let config = VariableStoreConfig::default();
        let mut arenas = Arenas::default();
        let bs = VariableAttributes::BOOT_SERVICES_ACCESS;

        let volatile = arenas.append(entry("V", bs, 1), &config).expect("room");
        let non_volatile = arenas
            .append(entry("N", bs | VariableAttributes::NON_VOLATILE, 1), &config)
            .expect("room");

        let order: Vec<Position> = arenas.positions_after(None).collect();
        assert_eq!(order, [non_volatile, volatile]);
        assert_eq!(arenas.positions_after(Some(volatile)).count(), 0);
    }
}
