//! The real-time clock driver.

use log::{debug, info, warn};
use spin::Mutex;
use uefi::time::{Daylight, Time, TimeCapabilities};

use crate::{
    calendar,
    config::{ConfigError, RtcConfig},
    encoding::{Encoding, RawTime},
    error::RtcError,
    hardware::{self, Delay, PortIo},
    persistence::{NoPersistence, RtcPersistence},
    register::{self, RegisterA, RegisterB, RegisterC, RegisterD},
};

/// Delay between two polls of the update-in-progress flag, in microseconds.
const UPDATE_POLL_INTERVAL_US: u32 = 10;

/// The state of the wakeup alarm.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub struct AlarmState {
    /// The alarm interrupt is enabled.
    pub enabled: bool,
    /// The alarm has fired and the signal has not yet been observed.
    pub pending: bool,
    /// The time at which the alarm fires.
    pub time: Time,
}

/// Driver for a PC-AT compatible CMOS real-time clock.
///
/// Every operation runs under a single lock that covers register access and the cached time
/// zone.
pub struct PcRtc<P: PortIo, D: Delay, S: RtcPersistence = NoPersistence> {
    /// The platform configuration.
    config: RtcConfig,
    /// The hardware and the values the hardware cannot hold.
    state: Mutex<RtcState<P, D, S>>,
}

/// The lock protected part of a [`PcRtc`].
struct RtcState<P, D, S> {
    /// Access to the CMOS ports.
    io: P,
    /// Busy-wait primitive used while the clock updates.
    delay: D,
    /// Storage for the time zone and alarm date.
    persistence: S,
    /// The time zone last set.
    time_zone: i16,
    /// The daylight flags last set.
    daylight: Daylight,
    /// The configured century register exists.
    century_supported: bool,
}

impl<P: PortIo, D: Delay, S: RtcPersistence> PcRtc<P, D, S> {
    /// The capabilities of the clock.
    ///
    /// Accuracy is expressed in parts per trillion: 50 parts per million.
    pub const CAPABILITIES: TimeCapabilities = TimeCapabilities {
        resolution: 1,
        accuracy: 50_000_000,
        sets_to_zero: false,
    };

    /// Creates a new [`PcRtc`] without touching the hardware.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if `config` is inconsistent.
    pub fn new(io: P, delay: D, persistence: S, config: RtcConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        Ok(Self {
            config,
            state: Mutex::new(RtcState {
                io,
                delay,
                persistence,
                time_zone: Time::UNSPECIFIED_TIMEZONE,
                daylight: Daylight::empty(),
                century_supported: false,
            }),
        })
    }

    /// Returns the configuration of the driver.
    pub const fn config(&self) -> &RtcConfig {
        &self.config
    }

    /// Programs the clock into its configured mode and repairs invalid contents.
    ///
    /// An undecodable or out of range time is replaced with
    /// [`RtcConfig::default_time`], and a disabled alarm with undecodable registers is
    /// reprogrammed to the same time.
    ///
    /// # Errors
    ///
    /// Returns a device error if the clock never becomes ready or the repaired state cannot be
    /// written back.
    pub fn initialize(&self) -> Result<(), RtcError> {
        let config = &self.config;
        let mut state = self.state.lock();

        state.write(register::REGISTER_A, config.register_a);
        let old_register_b = RegisterB(state.read(register::REGISTER_B));
        state.read(register::REGISTER_C);
        state.write(register::REGISTER_D, config.register_d);

        if let Err(error) = state.wait_to_update(config.update_timeout_us) {
            state.time_zone = Time::UNSPECIFIED_TIMEZONE;
            state.daylight = Daylight::empty();
            warn!("real-time clock initialization failed: {error}");
            return Err(error);
        }

        state.century_supported = state.probe_century(config.century_register);
        let old_encoding = Encoding::from_register_b(old_register_b);
        let raw = state.read_time_registers(config);
        let alarm = state.read_alarm_registers(old_encoding);

        let register_b = config.register_b | (old_register_b.0 & RegisterB::ALARM_INTERRUPT);
        state.write(register::REGISTER_B, register_b);

        let (time_zone, daylight) = state
            .persistence
            .load_time_zone()
            .unwrap_or((Time::UNSPECIFIED_TIMEZONE, Daylight::empty()));
        state.time_zone = time_zone;
        state.daylight = daylight;

        // The registers still hold values in the encoding that was active before reprogramming.
        let decoded = old_encoding
            .decode_time(&raw, config.minimal_valid_year)
            .and_then(|mut time| {
                time.time_zone = time_zone;
                time.daylight = daylight;
                calendar::validate(&time, config.valid_years())?;
                Ok(time)
            });
        let time = match decoded {
            Ok(time) => time,
            Err(field) => {
                warn!(
                    "real-time clock holds an invalid {field}, resetting to {}-{:02}-{:02}",
                    config.default_time.year, config.default_time.month, config.default_time.day
                );
                config.default_time
            }
        };

        state.set_time(&time, config)?;

        if let Some((hour, minute, second)) = alarm {
            if Encoding::from_register_b(RegisterB(register_b)) != old_encoding {
                let mut alarm = config.default_time;
                alarm.hour = hour;
                alarm.minute = minute;
                alarm.second = second;

                debug!("re-encoding wakeup alarm registers");
                state.wait_to_update(config.update_timeout_us)?;
                state.write_alarm(&alarm, old_register_b.alarm_interrupt_enabled());
            }
        }

        let repair = match state.wakeup_time(config) {
            Ok(_) => false,
            Err(RtcError::CorruptTime(_)) => {
                !RegisterB(state.read(register::REGISTER_B)).alarm_interrupt_enabled()
            }
            Err(error) => return Err(error),
        };
        if repair {
            let mut alarm = config.default_time;
            alarm.time_zone = state.time_zone;
            alarm.daylight = state.daylight;

            debug!("resetting invalid wakeup alarm registers");
            state.wait_to_update(config.update_timeout_us)?;
            state.persistence.store_alarm(&alarm)?;
            state.write_alarm(&alarm, false);
        }

        info!(
            "real-time clock initialized at {}-{:02}-{:02} {:02}:{:02}:{:02}",
            time.year, time.month, time.day, time.hour, time.minute, time.second
        );
        Ok(())
    }

    /// Returns the current time.
    ///
    /// # Errors
    ///
    /// Returns a device error if the clock is not ready or holds an invalid time.
    pub fn get_time(&self) -> Result<Time, RtcError> {
        self.state.lock().time(&self.config)
    }

    /// Sets the current time, including the time zone and daylight flags.
    ///
    /// # Errors
    ///
    /// Returns [`RtcError::InvalidTime`] if `time` is not valid, and a device error if the clock
    /// is not ready or the time zone cannot be persisted.
    pub fn set_time(&self, time: &Time) -> Result<(), RtcError> {
        calendar::validate(time, self.config.valid_years()).map_err(RtcError::InvalidTime)?;

        self.state.lock().set_time(time, &self.config)
    }

    /// Returns the state of the wakeup alarm.
    ///
    /// Reading the alarm acknowledges a pending alarm.
    ///
    /// # Errors
    ///
    /// Returns a device error if the clock is not ready or the alarm registers are invalid.
    pub fn get_wakeup_time(&self) -> Result<AlarmState, RtcError> {
        self.state.lock().wakeup_time(&self.config)
    }

    /// Enables the wakeup alarm at `time`, or disables it.
    ///
    /// An enabled alarm must lie within one day after the current time.
    ///
    /// # Errors
    ///
    /// Returns [`RtcError::MissingArgument`] if enabling without a time,
    /// [`RtcError::InvalidTime`] if `time` is not valid, [`RtcError::AlarmOutOfRange`] if `time`
    /// is too far from the current time, and a device error if the clock is not ready.
    pub fn set_wakeup_time(&self, enable: bool, time: Option<&Time>) -> Result<(), RtcError> {
        let config = &self.config;

        let alarm = match (enable, time) {
            (true, None) => return Err(RtcError::MissingArgument),
            (true, Some(alarm)) => {
                calendar::validate(alarm, config.valid_years()).map_err(RtcError::InvalidTime)?;
                Some(*alarm)
            }
            (false, _) => None,
        };

        // The range check and the write share one guard.
        let mut state = self.state.lock();
        if let Some(alarm) = &alarm {
            let now = state.time(config)?;
            if !calendar::is_within_one_day(&now, alarm) {
                debug!(
                    "rejecting alarm at {}-{:02}-{:02} {:02}:{:02}:{:02}",
                    alarm.year, alarm.month, alarm.day, alarm.hour, alarm.minute, alarm.second
                );
                return Err(RtcError::AlarmOutOfRange);
            }
        }
        state.wait_to_update(config.update_timeout_us)?;

        match alarm {
            Some(alarm) => {
                state.persistence.store_alarm(&alarm)?;
                state.write_alarm(&alarm, true);
            }
            None => {
                if let Ok(current) = state.decode_alarm(config) {
                    state.persistence.store_alarm(&current)?;
                }

                let register_b = RegisterB(state.read(register::REGISTER_B));
                state.write(register::REGISTER_B, register_b.with_alarm_interrupt(false).0);
            }
        }

        Ok(())
    }
}

impl<P: PortIo, D: Delay, S: RtcPersistence> RtcState<P, D, S> {
    /// Reads the CMOS register at `address`.
    fn read(&mut self, address: u8) -> u8 {
        hardware::read_register(&mut self.io, address)
    }

    /// Writes `value` to the CMOS register at `address`.
    fn write(&mut self, address: u8, value: u8) {
        hardware::write_register(&mut self.io, address, value);
    }

    /// Waits until the clock is not in the middle of an update cycle.
    fn wait_to_update(&mut self, timeout_us: u32) -> Result<(), RtcError> {
        if !RegisterD(self.read(register::REGISTER_D)).valid_ram_and_time() {
            warn!("real-time clock reports invalid RAM and time");
            return Err(RtcError::InvalidRamAndTime);
        }

        let mut polls = timeout_us / UPDATE_POLL_INTERVAL_US + 1;
        while RegisterA(self.read(register::REGISTER_A)).update_in_progress() {
            if polls == 0 {
                warn!("real-time clock update did not finish within {timeout_us}us");
                return Err(RtcError::UpdateTimeout);
            }

            self.delay.delay_us(UPDATE_POLL_INTERVAL_US);
            polls -= 1;
        }

        if !RegisterD(self.read(register::REGISTER_D)).valid_ram_and_time() {
            warn!("real-time clock reports invalid RAM and time");
            return Err(RtcError::InvalidRamAndTime);
        }

        Ok(())
    }

    /// Returns `true` if `century_register` is backed by storage.
    ///
    /// The original contents are restored afterwards.
    fn probe_century(&mut self, century_register: Option<u8>) -> bool {
        let Some(address) = century_register else {
            debug!("no century register configured");
            return false;
        };

        let original = self.read(address);
        self.write(address, !original);
        let present = self.read(address) == !original;
        self.write(address, original);

        debug!("century register {address:#04x} present: {present}");
        present
    }

    /// Reads the time registers and, if supported, the century register.
    fn read_time_registers(&mut self, config: &RtcConfig) -> RawTime {
        let century = match (self.century_supported, config.century_register) {
            (true, Some(address)) => Some(self.read(address)),
            _ => None,
        };

        RawTime {
            second: self.read(register::SECONDS),
            minute: self.read(register::MINUTES),
            hour: self.read(register::HOURS),
            day: self.read(register::DAY_OF_THE_MONTH),
            month: self.read(register::MONTH),
            year: self.read(register::YEAR),
            century,
        }
    }

    /// Reads the alarm hour, minute, and second registers in `encoding`.
    ///
    /// Returns `None` if any of them does not hold a valid value.
    fn read_alarm_registers(&mut self, encoding: Encoding) -> Option<(u8, u8, u8)> {
        let hour = encoding.decode_hour(self.read(register::HOURS_ALARM))?;
        let minute = encoding.decode_value(self.read(register::MINUTES_ALARM))?;
        let second = encoding.decode_value(self.read(register::SECONDS_ALARM))?;

        (hour < 24 && minute < 60 && second < 60).then_some((hour, minute, second))
    }

    /// Decodes `raw` with the cached time zone and validates the result.
    fn decode(
        &self,
        raw: &RawTime,
        register_b: RegisterB,
        config: &RtcConfig,
    ) -> Result<Time, RtcError> {
        let mut time = Encoding::from_register_b(register_b)
            .decode_time(raw, config.minimal_valid_year)
            .map_err(RtcError::CorruptTime)?;
        time.time_zone = self.time_zone;
        time.daylight = self.daylight;

        calendar::validate(&time, config.valid_years()).map_err(RtcError::CorruptTime)?;
        Ok(time)
    }

    /// Reads and validates the current time.
    fn time(&mut self, config: &RtcConfig) -> Result<Time, RtcError> {
        self.wait_to_update(config.update_timeout_us)?;

        let raw = self.read_time_registers(config);
        let register_b = RegisterB(self.read(register::REGISTER_B));
        self.decode(&raw, register_b, config)
    }

    /// Writes an already validated `time` to the clock and caches its time zone.
    fn set_time(&mut self, time: &Time, config: &RtcConfig) -> Result<(), RtcError> {
        self.wait_to_update(config.update_timeout_us)?;

        if time.time_zone != self.time_zone || time.daylight != self.daylight {
            self.persistence.store_time_zone(time.time_zone, time.daylight)?;
        }

        let register_b = RegisterB(self.read(register::REGISTER_B));
        self.write(register::REGISTER_B, register_b.with_set(true).0);

        let raw = Encoding::from_register_b(register_b).encode_time(time);
        self.write(register::SECONDS, raw.second);
        self.write(register::MINUTES, raw.minute);
        self.write(register::HOURS, raw.hour);
        self.write(register::DAY_OF_THE_MONTH, raw.day);
        self.write(register::MONTH, raw.month);
        self.write(register::YEAR, raw.year);
        if let (true, Some(address), Some(century)) =
            (self.century_supported, config.century_register, raw.century)
        {
            self.write(address, century);
        }

        self.write(register::REGISTER_B, register_b.with_set(false).0);

        self.time_zone = time.time_zone;
        self.daylight = time.daylight;
        Ok(())
    }

    /// Reads the alarm registers, completing the date from the current date or the persisted
    /// alarm.
    fn decode_alarm(&mut self, config: &RtcConfig) -> Result<Time, RtcError> {
        let register_b = RegisterB(self.read(register::REGISTER_B));
        let mut raw = self.read_time_registers(config);
        raw.second = self.read(register::SECONDS_ALARM);
        raw.minute = self.read(register::MINUTES_ALARM);
        raw.hour = self.read(register::HOURS_ALARM);

        let mut time = Encoding::from_register_b(register_b)
            .decode_time(&raw, config.minimal_valid_year)
            .map_err(RtcError::CorruptTime)?;
        if let Some(stored) = self.persistence.load_alarm() {
            time.year = stored.year;
            time.month = stored.month;
            time.day = stored.day;
        }
        time.time_zone = self.time_zone;
        time.daylight = self.daylight;

        calendar::validate(&time, config.valid_years()).map_err(RtcError::CorruptTime)?;
        Ok(time)
    }

    /// Reads the alarm enable and pending flags and the alarm time.
    fn wakeup_time(&mut self, config: &RtcConfig) -> Result<AlarmState, RtcError> {
        self.wait_to_update(config.update_timeout_us)?;

        let enabled = RegisterB(self.read(register::REGISTER_B)).alarm_interrupt_enabled();
        let pending = RegisterC(self.read(register::REGISTER_C)).alarm_flag();
        let time = self.decode_alarm(config)?;

        Ok(AlarmState {
            enabled,
            pending,
            time,
        })
    }

    /// Programs the alarm registers with `alarm` and sets the alarm enable to `enable`.
    fn write_alarm(&mut self, alarm: &Time, enable: bool) {
        let register_b = RegisterB(self.read(register::REGISTER_B));
        let encoding = Encoding::from_register_b(register_b);

        self.write(register::REGISTER_B, register_b.with_set(true).0);
        self.write(register::SECONDS_ALARM, encoding.encode_value(alarm.second));
        self.write(register::MINUTES_ALARM, encoding.encode_value(alarm.minute));
        self.write(register::HOURS_ALARM, encoding.encode_hour(alarm.hour));
        self.write(
            register::REGISTER_B,
            register_b.with_alarm_interrupt(enable).with_set(false).0,
        );
    }
}

#[cfg(test)]
mod test {
    use alloc::sync::Arc;

    use spin::Mutex;
    use uefi::time::{Daylight, Time};

    use super::PcRtc;
    use crate::{
        config::{ConfigError, RtcConfig},
        emulated::EmulatedCmos,
        encoding::{Encoding, RawTime},
        error::{RtcError, TimeField},
        persistence::{NoPersistence, PersistenceError, RtcPersistence},
        register,
    };

    /// Persisted clock state shared between a test and the driver under test.
    #[derive(Default)]
    struct Stored {
        time_zone: Option<(i16, Daylight)>,
        alarm: Option<Time>,
        time_zone_writes: u32,
        reject_writes: bool,
    }

    #[derive(Clone, Default)]
    struct SharedPersistence(Arc<Mutex<Stored>>);

    impl RtcPersistence for SharedPersistence {
        fn load_time_zone(&mut self) -> Option<(i16, Daylight)> {
            self.0.lock().time_zone
        }

        fn store_time_zone(
            &mut self,
            time_zone: i16,
            daylight: Daylight,
        ) -> Result<(), PersistenceError> {
            let mut stored = self.0.lock();
            if stored.reject_writes {
                return Err(PersistenceError::WriteRejected);
            }

            stored.time_zone = Some((time_zone, daylight));
            stored.time_zone_writes += 1;
            Ok(())
        }

        fn load_alarm(&mut self) -> Option<Time> {
            self.0.lock().alarm
        }

        fn store_alarm(&mut self, alarm: &Time) -> Result<(), PersistenceError> {
            let mut stored = self.0.lock();
            if stored.reject_writes {
                return Err(PersistenceError::WriteRejected);
            }

            stored.alarm = Some(*alarm);
            Ok(())
        }
    }

    type TestRtc = PcRtc<EmulatedCmos, EmulatedCmos, SharedPersistence>;

    fn driver(cmos: &EmulatedCmos) -> (TestRtc, SharedPersistence) {
        let persistence = SharedPersistence::default();
        let rtc = PcRtc::new(
            cmos.clone(),
            cmos.clone(),
            persistence.clone(),
            RtcConfig::default(),
        )
        .expect("default configuration is valid");

        (rtc, persistence)
    }

    fn initialized_at(time: &Time) -> (EmulatedCmos, TestRtc, SharedPersistence) {
        let cmos = EmulatedCmos::new();
        let (rtc, persistence) = driver(&cmos);
        rtc.initialize().expect("clock initializes");
        rtc.set_time(time).expect("time is valid");

        (cmos, rtc, persistence)
    }

    #[test]
    fn invalid_time_defaults_at_initialization() {
        let cmos = EmulatedCmos::new();
        let (rtc, _) = driver(&cmos);

        rtc.initialize().expect("clock initializes");

        assert_eq!(rtc.get_time(), Ok(Time::new(2001, 1, 1, 0, 0, 0)));
        assert_eq!(
            cmos.time_registers(),
            RawTime {
                second: 0x00,
                minute: 0x00,
                hour: 0x00,
                day: 0x01,
                month: 0x01,
                year: 0x01,
                century: Some(0x20),
            }
        );
    }

    #[test]
    fn zero_year_defaults_at_initialization() {
        let cmos = EmulatedCmos::new();
        cmos.set_time_registers(&RawTime {
            second: 0x00,
            minute: 0x30,
            hour: 0x12,
            day: 0x15,
            month: 0x06,
            year: 0x00,
            century: Some(0x00),
        });
        let (rtc, _) = driver(&cmos);

        rtc.initialize().expect("clock initializes");

        assert_eq!(rtc.get_time(), Ok(Time::new(2001, 1, 1, 0, 0, 0)));
        let raw = cmos.time_registers();
        assert_eq!((raw.year, raw.century), (0x01, Some(0x20)));
    }

    #[test]
    fn initialization_converts_to_configured_mode() {
        let cmos = EmulatedCmos::new();
        cmos.set_register(register::REGISTER_B, 0x04);
        cmos.set_time_registers(&RawTime {
            second: 0,
            minute: 30,
            hour: 0x81,
            day: 15,
            month: 6,
            year: 23,
            century: Some(20),
        });
        let (rtc, _) = driver(&cmos);

        rtc.initialize().expect("clock initializes");

        assert_eq!(rtc.get_time(), Ok(Time::new(2023, 6, 15, 13, 30, 0)));
        assert_eq!(cmos.register(register::REGISTER_B), 0x02);

        let raw = cmos.time_registers();
        assert_eq!((raw.hour, raw.minute), (0x13, 0x30));
        assert_eq!(raw.century, Some(0x20));
    }

    #[test]
    fn initialization_converts_enabled_alarm() {
        let cmos = EmulatedCmos::new();
        cmos.set_register(register::REGISTER_B, 0x26);
        cmos.set_time_registers(&RawTime {
            second: 0,
            minute: 0,
            hour: 10,
            day: 15,
            month: 6,
            year: 23,
            century: Some(20),
        });
        cmos.set_register(register::HOURS_ALARM, 13);
        cmos.set_register(register::MINUTES_ALARM, 30);
        cmos.set_register(register::SECONDS_ALARM, 0);
        let (rtc, _) = driver(&cmos);

        rtc.initialize().expect("clock initializes");

        assert_eq!(rtc.get_time(), Ok(Time::new(2023, 6, 15, 10, 0, 0)));
        assert_eq!(cmos.register(register::REGISTER_B), 0x22);
        assert_eq!(cmos.alarm_registers(), (0x13, 0x30, 0x00));

        let state = rtc.get_wakeup_time().expect("alarm is readable");
        assert!(state.enabled);
        assert_eq!(state.time, Time::new(2023, 6, 15, 13, 30, 0));
    }

    #[test]
    fn initialization_keeps_alarm_enable() {
        let cmos = EmulatedCmos::new();
        cmos.set_register(register::REGISTER_B, 0x22);
        let (rtc, _) = driver(&cmos);

        rtc.initialize().expect("clock initializes");

        assert_eq!(cmos.register(register::REGISTER_B), 0x22);
    }

    #[test]
    fn invalid_ram_fails_initialization() {
        let cmos = EmulatedCmos::new();
        cmos.set_valid_ram_and_time(false);
        let (rtc, _) = driver(&cmos);

        assert_eq!(rtc.initialize(), Err(RtcError::InvalidRamAndTime));
        assert!(rtc.get_time().is_err_and(RtcError::is_device_error));
    }

    #[test]
    fn persisted_time_zone_is_restored() {
        let cmos = EmulatedCmos::new();
        let (rtc, persistence) = driver(&cmos);
        persistence.0.lock().time_zone = Some((-300, Daylight::ADJUST_DAYLIGHT));

        let mut time = Time::new(2022, 3, 4, 5, 6, 7);
        let bcd_24 = Encoding {
            binary: false,
            hour_24: true,
        };
        cmos.set_time_registers(&bcd_24.encode_time(&time));
        rtc.initialize().expect("clock initializes");

        time.time_zone = -300;
        time.daylight = Daylight::ADJUST_DAYLIGHT;
        assert_eq!(rtc.get_time(), Ok(time));
        assert_eq!(persistence.0.lock().time_zone_writes, 0);
    }

    #[test]
    fn set_time_rejects_years_outside_range() {
        let (_, rtc, _) = initialized_at(&Time::new(2020, 1, 1, 0, 0, 0));

        assert_eq!(
            rtc.set_time(&Time::new(1997, 12, 31, 0, 0, 0)),
            Err(RtcError::InvalidTime(TimeField::Year))
        );
        assert_eq!(
            rtc.set_time(&Time::new(2100, 1, 1, 0, 0, 0)),
            Err(RtcError::InvalidTime(TimeField::Year))
        );
        assert_eq!(rtc.get_time(), Ok(Time::new(2020, 1, 1, 0, 0, 0)));
    }

    #[test]
    fn set_time_round_trip_persists_changed_time_zone() {
        let (_, rtc, persistence) = initialized_at(&Time::new(2020, 1, 1, 0, 0, 0));

        let mut time = Time::new(2024, 2, 29, 23, 59, 58);
        time.time_zone = -480;
        time.daylight = Daylight::ADJUST_DAYLIGHT;

        rtc.set_time(&time).expect("time is valid");
        rtc.set_time(&time).expect("time is valid");

        assert_eq!(rtc.get_time(), Ok(time));
        let stored = persistence.0.lock();
        assert_eq!(stored.time_zone, Some((-480, Daylight::ADJUST_DAYLIGHT)));
        assert_eq!(stored.time_zone_writes, 1);
    }

    #[test]
    fn persistence_failure_leaves_clock_untouched() {
        let (_, rtc, persistence) = initialized_at(&Time::new(2020, 1, 1, 0, 0, 0));
        persistence.0.lock().reject_writes = true;

        let mut time = Time::new(2021, 1, 1, 0, 0, 0);
        time.time_zone = 60;

        assert_eq!(
            rtc.set_time(&time),
            Err(RtcError::Persistence(PersistenceError::WriteRejected))
        );
        assert_eq!(rtc.get_time(), Ok(Time::new(2020, 1, 1, 0, 0, 0)));
    }

    #[test]
    fn stuck_update_times_out() {
        let (cmos, rtc, _) = initialized_at(&Time::new(2020, 1, 1, 0, 0, 0));
        let before = cmos.delayed_us();
        cmos.set_update_stuck(true);

        assert_eq!(rtc.get_time(), Err(RtcError::UpdateTimeout));
        assert_eq!(cmos.delayed_us() - before, 100_010);
    }

    #[test]
    fn brief_update_is_waited_out() {
        let (cmos, rtc, _) = initialized_at(&Time::new(2020, 1, 1, 0, 0, 0));
        let before = cmos.delayed_us();
        cmos.set_update_in_progress(3);

        assert_eq!(rtc.get_time(), Ok(Time::new(2020, 1, 1, 0, 0, 0)));
        assert_eq!(cmos.delayed_us() - before, 30);
    }

    #[test]
    fn missing_century_register_is_inferred() {
        let cmos = EmulatedCmos::new();
        cmos.remove_century_register();
        cmos.set_time_registers(&RawTime {
            second: 0x00,
            minute: 0x00,
            hour: 0x12,
            day: 0x01,
            month: 0x01,
            year: 0x05,
            century: None,
        });
        let (rtc, _) = driver(&cmos);

        rtc.initialize().expect("clock initializes");

        assert_eq!(rtc.get_time(), Ok(Time::new(2005, 1, 1, 12, 0, 0)));
        assert_eq!(cmos.time_registers().century, None);
    }

    #[test]
    fn corrupt_registers_fail_get_time() {
        let (cmos, rtc, _) = initialized_at(&Time::new(2020, 1, 1, 0, 0, 0));
        cmos.set_register(register::MINUTES, 0x7A);

        assert_eq!(
            rtc.get_time(),
            Err(RtcError::CorruptTime(TimeField::Minute))
        );
    }

    #[test]
    fn alarm_within_one_day() {
        let (cmos, rtc, persistence) = initialized_at(&Time::new(2023, 6, 15, 10, 0, 0));
        let alarm = Time::new(2023, 6, 16, 9, 0, 0);

        rtc.set_wakeup_time(true, Some(&alarm))
            .expect("alarm is within one day");

        let state = rtc.get_wakeup_time().expect("alarm is readable");
        assert!(state.enabled);
        assert!(!state.pending);
        assert_eq!(state.time, alarm);
        assert_eq!(cmos.alarm_registers(), (0x09, 0x00, 0x00));
        assert_eq!(persistence.0.lock().alarm, Some(alarm));

        cmos.raise_alarm();
        assert_eq!(rtc.get_wakeup_time().map(|state| state.pending), Ok(true));
        assert_eq!(rtc.get_wakeup_time().map(|state| state.pending), Ok(false));
    }

    #[test]
    fn alarm_rejections() {
        let (_, rtc, _) = initialized_at(&Time::new(2023, 6, 15, 10, 0, 0));

        assert_eq!(
            rtc.set_wakeup_time(true, None),
            Err(RtcError::MissingArgument)
        );
        assert_eq!(
            rtc.set_wakeup_time(true, Some(&Time::new(2023, 13, 16, 9, 0, 0))),
            Err(RtcError::InvalidTime(TimeField::Month))
        );
        assert_eq!(
            rtc.set_wakeup_time(true, Some(&Time::new(2023, 6, 17, 9, 0, 0))),
            Err(RtcError::AlarmOutOfRange)
        );
        assert_eq!(
            rtc.set_wakeup_time(true, Some(&Time::new(2023, 6, 16, 11, 0, 0))),
            Err(RtcError::AlarmOutOfRange)
        );
        assert_eq!(rtc.get_wakeup_time().map(|state| state.enabled), Ok(false));
    }

    #[test]
    fn disabling_keeps_alarm_time() {
        let (cmos, rtc, _) = initialized_at(&Time::new(2023, 12, 31, 22, 0, 0));
        let alarm = Time::new(2024, 1, 1, 6, 30, 0);
        rtc.set_wakeup_time(true, Some(&alarm))
            .expect("alarm is within one day");

        rtc.set_wakeup_time(false, None).expect("alarm disables");

        let state = rtc.get_wakeup_time().expect("alarm is readable");
        assert!(!state.enabled);
        assert_eq!(state.time, alarm);
        assert_eq!(cmos.register(register::REGISTER_B), 0x02);
    }

    #[test]
    fn invalid_disabled_alarm_is_reset() {
        let cmos = EmulatedCmos::new();
        cmos.set_register(register::SECONDS_ALARM, 0xFF);
        cmos.set_register(register::MINUTES_ALARM, 0xFF);
        cmos.set_register(register::HOURS_ALARM, 0xFF);
        let (rtc, persistence) = driver(&cmos);

        rtc.initialize().expect("clock initializes");

        let default = RtcConfig::default().default_time;
        assert_eq!(cmos.alarm_registers(), (0x00, 0x00, 0x00));
        assert_eq!(persistence.0.lock().alarm, Some(default));

        let state = rtc.get_wakeup_time().expect("alarm is readable");
        assert!(!state.enabled);
        assert_eq!(state.time, default);
    }

    #[test]
    fn inconsistent_configuration_is_rejected() {
        let cmos = EmulatedCmos::new();
        let config = RtcConfig {
            maximal_valid_year: 1990,
            ..RtcConfig::default()
        };

        assert!(matches!(
            PcRtc::new(cmos.clone(), cmos, NoPersistence, config),
            Err(ConfigError::InvertedYearRange { .. })
        ));
    }

    #[test]
    fn capabilities() {
        let capabilities = PcRtc::<EmulatedCmos, EmulatedCmos>::CAPABILITIES;

        assert_eq!(capabilities.resolution, 1);
        assert_eq!(capabilities.accuracy, 50_000_000);
        assert!(!capabilities.sets_to_zero);
    }
}
