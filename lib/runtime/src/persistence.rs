//! Clock state persisted through the variable store.

use alloc::{sync::Arc, vec::Vec};

use emu_variable::{VariableError, VariableStore};
use log::warn;
use pc_rtc::{
    PersistenceError, RtcPersistence,
    persistence::{pack_time_zone, unpack_time_zone},
};
use uefi::{
    data_type::Guid,
    guid,
    phase::PhaseFlag,
    time::{Daylight, Time},
    variable::VariableAttributes,
};

/// Vendor namespace of the clock variables.
pub const RTC_VENDOR: Guid = guid!("378d7b65-8da9-4773-b6e4-a47826a833e1");

/// Name of the variable holding the packed time zone and daylight flags.
pub const TIME_ZONE_VARIABLE: &str = "RTC";

/// Name of the variable holding the full alarm time.
pub const ALARM_VARIABLE: &str = "RTCALARM";

/// Attributes of the clock variables.
pub const RTC_VARIABLE_ATTRIBUTES: VariableAttributes = VariableAttributes::NON_VOLATILE
    .union(VariableAttributes::BOOT_SERVICES_ACCESS)
    .union(VariableAttributes::RUNTIME_ACCESS);

/// The variable store used by [`RuntimeServices`][r].
///
/// [r]: crate::RuntimeServices
pub type SharedVariableStore = Arc<VariableStore<Arc<PhaseFlag>>>;

/// An [`RtcPersistence`] that keeps the clock state in non-volatile variables.
pub struct VariablePersistence {
    /// The store the variables live in.
    store: SharedVariableStore,
}

impl VariablePersistence {
    /// Creates a [`VariablePersistence`] writing into `store`.
    pub const fn new(store: SharedVariableStore) -> Self {
        Self { store }
    }

    /// Reads the variable `name` if it holds exactly `N` bytes.
    fn load<const N: usize>(&self, name: &str) -> Option<[u8; N]> {
        let name: Vec<u16> = name.encode_utf16().collect();
        let mut buffer = [0; N];

        match self.store.get_variable(&name, &RTC_VENDOR, &mut buffer) {
            Ok((_, size)) if size == N => Some(buffer),
            Ok((_, size)) => {
                warn!("ignoring clock variable of {size} bytes");
                None
            }
            Err(VariableError::BufferTooSmall { required }) => {
                warn!("ignoring clock variable of {required} bytes");
                None
            }
            Err(_) => None,
        }
    }

    /// Writes `data` to the variable `name`, deleting it if `data` is empty.
    fn store(&self, name: &str, data: &[u8]) -> Result<(), PersistenceError> {
        let name: Vec<u16> = name.encode_utf16().collect();

        match self
            .store
            .set_variable(&name, &RTC_VENDOR, RTC_VARIABLE_ATTRIBUTES, data)
        {
            Ok(()) => Ok(()),
            Err(VariableError::NotFound) if data.is_empty() => Ok(()),
            Err(VariableError::OutOfResources) => Err(PersistenceError::OutOfResources),
            Err(_) => Err(PersistenceError::WriteRejected),
        }
    }
}

impl RtcPersistence for VariablePersistence {
    fn load_time_zone(&mut self) -> Option<(i16, Daylight)> {
        self.load(TIME_ZONE_VARIABLE)
            .map(|bytes| unpack_time_zone(u32::from_le_bytes(bytes)))
    }

    fn store_time_zone(
        &mut self,
        time_zone: i16,
        daylight: Daylight,
    ) -> Result<(), PersistenceError> {
        if time_zone == Time::UNSPECIFIED_TIMEZONE && daylight.is_empty() {
            return self.store(TIME_ZONE_VARIABLE, &[]);
        }

        self.store(
            TIME_ZONE_VARIABLE,
            &pack_time_zone(time_zone, daylight).to_le_bytes(),
        )
    }

    fn load_alarm(&mut self) -> Option<Time> {
        self.load(ALARM_VARIABLE).map(|bytes| Time::from_bytes(&bytes))
    }

    fn store_alarm(&mut self, alarm: &Time) -> Result<(), PersistenceError> {
        self.store(ALARM_VARIABLE, &alarm.to_bytes())
    }
}
