//! Time and variable runtime services.
//!
//! [`RuntimeServices`] owns a [`PcRtc`] and a [`VariableStore`] and exposes them with the
//! firmware calling conventions: every entry point returns a [`Status`], out-parameters are
//! optional references, and sizes are exchanged in bytes. Required arguments that are absent are
//! rejected with [`Status::INVALID_PARAMETER`] before any side effect.
//!
//! The clock keeps its time zone, daylight flags, and alarm date in non-volatile variables of
//! the same store.

#![no_std]

extern crate alloc;

pub mod error;
pub mod persistence;

use alloc::{sync::Arc, vec::Vec};

use emu_variable::{VariableError, VariableName, VariableStore, VariableStoreConfig};
use log::{info, warn};
use pc_rtc::{Delay, PcRtc, PortIo, RtcConfig};
use uefi::{
    data_type::{Boolean, Guid, Status},
    phase::PhaseFlag,
    time::{Time, TimeCapabilities},
    variable::VariableAttributes,
};

pub use error::SetupError;
pub use persistence::{SharedVariableStore, VariablePersistence};

/// The clock and variable services of a PC-AT platform.
pub struct RuntimeServices<P: PortIo, D: Delay> {
    /// The boot to runtime transition shared with the variable store.
    phase: Arc<PhaseFlag>,
    /// The variable store, shared with the clock persistence.
    variables: SharedVariableStore,
    /// The real-time clock.
    rtc: PcRtc<P, D, VariablePersistence>,
}

impl<P: PortIo, D: Delay> RuntimeServices<P, D> {
    /// Creates [`RuntimeServices`] with an empty variable store.
    ///
    /// The clock is not touched until [`RuntimeServices::initialize`] is called.
    ///
    /// # Errors
    ///
    /// Returns [`SetupError`] if either configuration is inconsistent.
    pub fn new(
        io: P,
        delay: D,
        rtc_config: RtcConfig,
        variable_config: VariableStoreConfig,
    ) -> Result<Self, SetupError> {
        let phase = Arc::new(PhaseFlag::new());
        let variables = VariableStore::new(variable_config, phase.clone())?;

        Self::assemble(io, delay, rtc_config, phase, variables)
    }

    /// Creates [`RuntimeServices`] whose non-volatile variables are restored from `image`.
    ///
    /// # Errors
    ///
    /// Returns [`SetupError`] if either configuration is inconsistent or `image` is not a valid
    /// non-volatile store.
    pub fn with_non_volatile_image(
        io: P,
        delay: D,
        rtc_config: RtcConfig,
        variable_config: VariableStoreConfig,
        image: &[u8],
    ) -> Result<Self, SetupError> {
        let phase = Arc::new(PhaseFlag::new());
        let variables =
            VariableStore::with_non_volatile_image(variable_config, phase.clone(), image)?;

        Self::assemble(io, delay, rtc_config, phase, variables)
    }

    /// Wires the clock to `variables`.
    fn assemble(
        io: P,
        delay: D,
        rtc_config: RtcConfig,
        phase: Arc<PhaseFlag>,
        variables: VariableStore<Arc<PhaseFlag>>,
    ) -> Result<Self, SetupError> {
        let variables = Arc::new(variables);
        let rtc = PcRtc::new(
            io,
            delay,
            VariablePersistence::new(variables.clone()),
            rtc_config,
        )?;

        Ok(Self {
            phase,
            variables,
            rtc,
        })
    }

    /// Brings the clock into its configured mode.
    pub fn initialize(&self) -> Status {
        match self.rtc.initialize() {
            Ok(()) => {
                info!("runtime services initialized");
                Status::SUCCESS
            }
            Err(error) => {
                warn!("real-time clock initialization failed: {error}");
                error.into()
            }
        }
    }

    /// Returns the variable store.
    pub fn variables(&self) -> &VariableStore<Arc<PhaseFlag>> {
        &self.variables
    }

    /// Serializes the non-volatile variables.
    pub fn export_non_volatile(&self) -> Vec<u8> {
        self.variables.export_non_volatile()
    }

    /// Switches every service to its runtime access rules.
    ///
    /// The transition cannot be undone.
    pub fn exit_boot_services(&self) {
        info!("exiting boot services");
        self.phase.exit_boot_services();
    }

    /// Reads the current time and, optionally, the capabilities of the clock.
    pub fn get_time(
        &self,
        time: Option<&mut Time>,
        capabilities: Option<&mut TimeCapabilities>,
    ) -> Status {
        let Some(time) = time else {
            return Status::INVALID_PARAMETER;
        };

        match self.rtc.get_time() {
            Ok(now) => *time = now,
            Err(error) => return error.into(),
        }
        if let Some(capabilities) = capabilities {
            *capabilities = PcRtc::<P, D, VariablePersistence>::CAPABILITIES;
        }

        Status::SUCCESS
    }

    /// Sets the current time.
    pub fn set_time(&self, time: Option<&Time>) -> Status {
        let Some(time) = time else {
            return Status::INVALID_PARAMETER;
        };

        status(self.rtc.set_time(time))
    }

    /// Reads the state of the wakeup alarm.
    pub fn get_wakeup_time(
        &self,
        enabled: Option<&mut Boolean>,
        pending: Option<&mut Boolean>,
        time: Option<&mut Time>,
    ) -> Status {
        let (Some(enabled), Some(pending), Some(time)) = (enabled, pending, time) else {
            return Status::INVALID_PARAMETER;
        };

        match self.rtc.get_wakeup_time() {
            Ok(alarm) => {
                *enabled = alarm.enabled.into();
                *pending = alarm.pending.into();
                *time = alarm.time;
                Status::SUCCESS
            }
            Err(error) => error.into(),
        }
    }

    /// Enables the wakeup alarm at `time`, or disables it.
    pub fn set_wakeup_time(&self, enable: Boolean, time: Option<&Time>) -> Status {
        status(self.rtc.set_wakeup_time(enable.into(), time))
    }

    /// Copies the contents of a variable into `data`.
    ///
    /// `name` is read up to its null terminator. On entry `data_size` holds the size of `data`.
    /// On success it holds the size of the contents, and on [`Status::BUFFER_TOO_SMALL`] the
    /// size required.
    pub fn get_variable(
        &self,
        name: Option<&[u16]>,
        vendor: Option<&Guid>,
        attributes: Option<&mut VariableAttributes>,
        data_size: Option<&mut usize>,
        data: Option<&mut [u8]>,
    ) -> Status {
        let (Some(name), Some(vendor), Some(data_size)) = (name, vendor, data_size) else {
            return Status::INVALID_PARAMETER;
        };

        let name = VariableName::from_ucs2(name);
        let has_buffer = data.is_some();
        let buffer: &mut [u8] = match data {
            Some(data) => {
                let length = data.len().min(*data_size);
                &mut data[..length]
            }
            None => &mut [],
        };

        match self.variables.get_variable(name.as_ucs2(), vendor, buffer) {
            Ok((stored_attributes, size)) => {
                *data_size = size;
                if let Some(attributes) = attributes {
                    *attributes = stored_attributes;
                }
                Status::SUCCESS
            }
            Err(VariableError::BufferTooSmall { required })
                if !has_buffer && required <= *data_size =>
            {
                Status::INVALID_PARAMETER
            }
            Err(VariableError::BufferTooSmall { required }) => {
                *data_size = required;
                Status::BUFFER_TOO_SMALL
            }
            Err(error) => error.into(),
        }
    }

    /// Advances a variable name enumeration.
    ///
    /// On entry `name` holds the previously returned name, or an empty string to start, and
    /// `name_size` the size of `name` in bytes. On success `name` and `vendor` hold the next
    /// variable and `name_size` the size of its name including the terminator.
    pub fn get_next_variable_name(
        &self,
        name_size: Option<&mut usize>,
        name: Option<&mut [u16]>,
        vendor: Option<&mut Guid>,
    ) -> Status {
        let (Some(name_size), Some(name), Some(vendor)) = (name_size, name, vendor) else {
            return Status::INVALID_PARAMETER;
        };

        let previous = VariableName::from_ucs2(name);
        match self
            .variables
            .get_next_variable_name(previous.as_ucs2(), vendor, *name_size)
        {
            Ok((next, next_vendor)) => {
                let capacity = name.len().min(*name_size / size_of::<u16>());
                *name_size = next.size();
                if next.write_with_nul(&mut name[..capacity]).is_none() {
                    return Status::BUFFER_TOO_SMALL;
                }

                *vendor = next_vendor;
                Status::SUCCESS
            }
            Err(VariableError::BufferTooSmall { required }) => {
                *name_size = required;
                Status::BUFFER_TOO_SMALL
            }
            Err(error) => error.into(),
        }
    }

    /// Creates, replaces, or deletes a variable.
    ///
    /// `name` is read up to its null terminator. Absent or empty `data` deletes the variable.
    pub fn set_variable(
        &self,
        name: Option<&[u16]>,
        vendor: Option<&Guid>,
        attributes: VariableAttributes,
        data: Option<&[u8]>,
    ) -> Status {
        let (Some(name), Some(vendor)) = (name, vendor) else {
            return Status::INVALID_PARAMETER;
        };

        let name = VariableName::from_ucs2(name);
        status(self.variables.set_variable(
            name.as_ucs2(),
            vendor,
            attributes,
            data.unwrap_or_default(),
        ))
    }

    /// Reports the space available to variables with `attributes`.
    pub fn query_variable_info(
        &self,
        attributes: VariableAttributes,
        maximum_storage_size: Option<&mut u64>,
        remaining_storage_size: Option<&mut u64>,
        maximum_variable_size: Option<&mut u64>,
    ) -> Status {
        let (Some(maximum_storage), Some(remaining_storage), Some(maximum_variable)) =
            (maximum_storage_size, remaining_storage_size, maximum_variable_size)
        else {
            return Status::INVALID_PARAMETER;
        };

        match self.variables.query_variable_info(attributes) {
            Ok(info) => {
                *maximum_storage = widen(info.maximum_storage_size);
                *remaining_storage = widen(info.remaining_storage_size);
                *maximum_variable = widen(info.maximum_variable_size);
                Status::SUCCESS
            }
            Err(error) => error.into(),
        }
    }
}

/// Converts the result of a service without outputs to its [`Status`].
fn status<E: Into<Status>>(result: Result<(), E>) -> Status {
    match result {
        Ok(()) => Status::SUCCESS,
        Err(error) => error.into(),
    }
}

/// Converts an in-memory size to the 64-bit size reported to callers.
fn widen(size: usize) -> u64 {
    u64::try_from(size).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod test {
    use alloc::{vec, vec::Vec};

    use emu_variable::VariableStoreConfig;
    use pc_rtc::{RtcConfig, emulated::EmulatedCmos};
    use uefi::{
        data_type::{Boolean, Guid, Status},
        guid,
        time::{Daylight, Time, TimeCapabilities},
        variable::VariableAttributes,
    };

    use super::RuntimeServices;
    use crate::persistence::{RTC_VARIABLE_ATTRIBUTES, RTC_VENDOR};

    const VENDOR: Guid = guid!("9e1f2c3d-4b5a-4697-8877-665544332211");

    const NV_BS_RT: VariableAttributes = VariableAttributes::NON_VOLATILE
        .union(VariableAttributes::BOOT_SERVICES_ACCESS)
        .union(VariableAttributes::RUNTIME_ACCESS);

    type Services = RuntimeServices<EmulatedCmos, EmulatedCmos>;

    fn services(cmos: &EmulatedCmos) -> Services {
        RuntimeServices::new(
            cmos.clone(),
            cmos.clone(),
            RtcConfig::default(),
            VariableStoreConfig::default(),
        )
        .expect("default configuration is valid")
    }

    fn initialized() -> (EmulatedCmos, Services) {
        let cmos = EmulatedCmos::new();
        let services = services(&cmos);
        assert_eq!(services.initialize(), Status::SUCCESS);

        (cmos, services)
    }

    fn ucs2(name: &str) -> Vec<u16> {
        name.encode_utf16().chain([0]).collect()
    }

    fn zoned(time_zone: i16, daylight: Daylight) -> Time {
        let mut time = Time::new(2024, 3, 10, 12, 0, 0);
        time.time_zone = time_zone;
        time.daylight = daylight;
        time
    }

    fn time_zone_variable(services: &Services) -> Result<Vec<u8>, Status> {
        let mut size = 16;
        let mut data = [0; 16];
        let mut attributes = VariableAttributes::empty();

        let status = services.get_variable(
            Some(&ucs2("RTC")[..]),
            Some(&RTC_VENDOR),
            Some(&mut attributes),
            Some(&mut size),
            Some(&mut data[..]),
        );
        if status != Status::SUCCESS {
            return Err(status);
        }

        assert_eq!(attributes, RTC_VARIABLE_ATTRIBUTES);
        Ok(data[..size].to_vec())
    }

    #[test]
    fn time_round_trip() {
        let (_, services) = initialized();
        let time = zoned(-60, Daylight::ADJUST_DAYLIGHT);
        assert_eq!(services.set_time(Some(&time)), Status::SUCCESS);

        let mut now = Time::default();
        let mut capabilities = TimeCapabilities::default();
        assert_eq!(
            services.get_time(Some(&mut now), Some(&mut capabilities)),
            Status::SUCCESS
        );

        assert_eq!(now, time);
        assert_eq!(capabilities.resolution, 1);
        assert_eq!(capabilities.accuracy, 50_000_000);
        assert!(!capabilities.sets_to_zero);
    }

    #[test]
    fn time_zone_is_kept_in_a_variable() {
        let (cmos, services) = initialized();
        let time = zoned(-480, Daylight::IN_DAYLIGHT);
        assert_eq!(services.set_time(Some(&time)), Status::SUCCESS);
        assert_eq!(time_zone_variable(&services), Ok(vec![0x20, 0xFE, 0x02, 0x00]));

        let image = services.export_non_volatile();
        let rebooted = RuntimeServices::with_non_volatile_image(
            cmos.clone(),
            cmos,
            RtcConfig::default(),
            VariableStoreConfig::default(),
            &image,
        )
        .expect("image is valid");
        assert_eq!(rebooted.initialize(), Status::SUCCESS);

        let mut now = Time::default();
        assert_eq!(rebooted.get_time(Some(&mut now), None), Status::SUCCESS);
        assert_eq!(now.time_zone, -480);
        assert_eq!(now.daylight, Daylight::IN_DAYLIGHT);
    }

    #[test]
    fn unspecified_time_zone_removes_the_variable() {
        let (_, services) = initialized();
        assert_eq!(
            services.set_time(Some(&zoned(60, Daylight::empty()))),
            Status::SUCCESS
        );
        assert!(time_zone_variable(&services).is_ok());

        assert_eq!(
            services.set_time(Some(&zoned(Time::UNSPECIFIED_TIMEZONE, Daylight::empty()))),
            Status::SUCCESS
        );
        assert_eq!(time_zone_variable(&services), Err(Status::NOT_FOUND));
    }

    #[test]
    fn absent_arguments_are_rejected() {
        let (_, services) = initialized();
        let mut size = 0;
        let mut enabled = Boolean::FALSE;
        let mut guid = Guid::ZERO;
        let mut name = [0u16; 8];

        assert_eq!(services.get_time(None, None), Status::INVALID_PARAMETER);
        assert_eq!(services.set_time(None), Status::INVALID_PARAMETER);
        assert_eq!(
            services.get_wakeup_time(Some(&mut enabled), None, None),
            Status::INVALID_PARAMETER
        );
        assert_eq!(
            services.set_wakeup_time(Boolean::TRUE, None),
            Status::INVALID_PARAMETER
        );
        assert_eq!(
            services.get_variable(Some(&ucs2("A")[..]), None, None, Some(&mut size), None),
            Status::INVALID_PARAMETER
        );
        assert_eq!(
            services.get_next_variable_name(None, Some(&mut name[..]), Some(&mut guid)),
            Status::INVALID_PARAMETER
        );
        assert_eq!(
            services.set_variable(None, Some(&VENDOR), NV_BS_RT, Some(&[1][..])),
            Status::INVALID_PARAMETER
        );
        assert_eq!(
            services.query_variable_info(NV_BS_RT, None, None, None),
            Status::INVALID_PARAMETER
        );
    }

    #[test]
    fn invalid_time_is_rejected() {
        let (_, services) = initialized();
        let mut time = zoned(0, Daylight::empty());
        time.month = 13;

        assert_eq!(services.set_time(Some(&time)), Status::INVALID_PARAMETER);
    }

    #[test]
    fn wakeup_alarm() {
        let (cmos, services) = initialized();
        assert_eq!(
            services.set_time(Some(&Time::new(2024, 2, 29, 22, 0, 0))),
            Status::SUCCESS
        );

        let far = Time::new(2024, 3, 2, 6, 0, 0);
        assert_eq!(
            services.set_wakeup_time(Boolean::TRUE, Some(&far)),
            Status::UNSUPPORTED
        );

        let alarm = Time::new(2024, 3, 1, 6, 30, 0);
        assert_eq!(
            services.set_wakeup_time(Boolean::TRUE, Some(&alarm)),
            Status::SUCCESS
        );
        cmos.raise_alarm();

        let mut enabled = Boolean::FALSE;
        let mut pending = Boolean::FALSE;
        let mut time = Time::default();
        assert_eq!(
            services.get_wakeup_time(Some(&mut enabled), Some(&mut pending), Some(&mut time)),
            Status::SUCCESS
        );
        assert_eq!(enabled, Boolean::TRUE);
        assert_eq!(pending, Boolean::TRUE);
        assert_eq!(time, alarm);
    }

    #[test]
    fn device_errors_are_reported() {
        let (cmos, services) = initialized();
        cmos.set_update_stuck(true);

        let mut now = Time::default();
        assert_eq!(services.get_time(Some(&mut now), None), Status::DEVICE_ERROR);
    }

    #[test]
    fn variable_buffer_sizes() {
        let cmos = EmulatedCmos::new();
        let services = services(&cmos);
        assert_eq!(
            services.set_variable(
                Some(&ucs2("Boot")[..]),
                Some(&VENDOR),
                NV_BS_RT,
                Some(&[1, 2, 3][..])
            ),
            Status::SUCCESS
        );

        let mut size = 2;
        let mut data = [0; 8];
        assert_eq!(
            services.get_variable(
                Some(&ucs2("Boot")[..]),
                Some(&VENDOR),
                None,
                Some(&mut size),
                Some(&mut data[..])
            ),
            Status::BUFFER_TOO_SMALL
        );
        assert_eq!(size, 3);

        assert_eq!(
            services.get_variable(
                Some(&ucs2("Boot")[..]),
                Some(&VENDOR),
                None,
                Some(&mut size),
                None
            ),
            Status::INVALID_PARAMETER
        );

        assert_eq!(
            services.get_variable(
                Some(&ucs2("Boot")[..]),
                Some(&VENDOR),
                None,
                Some(&mut size),
                Some(&mut data[..])
            ),
            Status::SUCCESS
        );
        assert_eq!(&data[..size], &[1, 2, 3]);
    }

    #[test]
    fn enumerate_names() {
        let cmos = EmulatedCmos::new();
        let services = services(&cmos);
        for name in ["First", "Second"] {
            assert_eq!(
                services.set_variable(
                    Some(&ucs2(name)[..]),
                    Some(&VENDOR),
                    NV_BS_RT,
                    Some(&[1][..])
                ),
                Status::SUCCESS
            );
        }

        let mut name = [0u16; 16];
        let mut vendor = Guid::ZERO;
        let mut size = 4;
        assert_eq!(
            services.get_next_variable_name(
                Some(&mut size),
                Some(&mut name[..]),
                Some(&mut vendor)
            ),
            Status::BUFFER_TOO_SMALL
        );
        assert_eq!(size, ucs2("First").len() * 2);

        let mut names = Vec::new();
        loop {
            size = name.len() * 2;
            match services.get_next_variable_name(
                Some(&mut size),
                Some(&mut name[..]),
                Some(&mut vendor),
            ) {
                Status::SUCCESS => names.push(name[..size / 2].to_vec()),
                status => {
                    assert_eq!(status, Status::NOT_FOUND);
                    break;
                }
            }
            assert_eq!(vendor, VENDOR);
        }

        assert_eq!(names, [ucs2("First"), ucs2("Second")]);
    }

    #[test]
    fn runtime_restrictions_apply_after_exit() {
        let (_, services) = initialized();
        assert_eq!(
            services.set_variable(
                Some(&ucs2("BootOnly")[..]),
                Some(&VENDOR),
                VariableAttributes::BOOT_SERVICES_ACCESS,
                Some(&[1][..])
            ),
            Status::SUCCESS
        );

        services.exit_boot_services();

        let mut size = 8;
        let mut data = [0; 8];
        assert_eq!(
            services.get_variable(
                Some(&ucs2("BootOnly")[..]),
                Some(&VENDOR),
                None,
                Some(&mut size),
                Some(&mut data[..])
            ),
            Status::NOT_FOUND
        );
        assert_eq!(
            services.set_variable(
                Some(&ucs2("Late")[..]),
                Some(&VENDOR),
                VariableAttributes::BOOT_SERVICES_ACCESS,
                Some(&[1][..])
            ),
            Status::INVALID_PARAMETER
        );

        assert_eq!(
            services.set_time(Some(&zoned(120, Daylight::empty()))),
            Status::SUCCESS
        );
        assert!(time_zone_variable(&services).is_ok());

        let (mut maximum, mut remaining, mut variable) = (0, 0, 0);
        assert_eq!(
            services.query_variable_info(
                VariableAttributes::NON_VOLATILE | VariableAttributes::BOOT_SERVICES_ACCESS,
                Some(&mut maximum),
                Some(&mut remaining),
                Some(&mut variable)
            ),
            Status::INVALID_PARAMETER
        );
        assert_eq!(
            services.query_variable_info(
                NV_BS_RT,
                Some(&mut maximum),
                Some(&mut remaining),
                Some(&mut variable)
            ),
            Status::SUCCESS
        );
        assert!(remaining < maximum);
    }
}
