//! A platform-agnostic driver for the NXP PCF8563 real-time clock.
//!
//! The driver is built on the `embedded-hal` 1.0 I2C traits and works in
//! `no_std` environments. It covers the date/time registers, the low-voltage
//! integrity flag, the single minute/hour/day/weekday alarm with interrupt
//! delivery, and the CLKOUT output.
//!
//! # Features
//!
//! - `async`: switch the driver to `embedded-hal-async` I2C; every bus method
//!   becomes `async fn`
//! - `log`: emit diagnostics through the `log` facade
//! - `defmt`: emit diagnostics through `defmt` and derive `defmt::Format`
//!
//! # Conventions
//!
//! [`DateTime`] uses a zero-indexed month (0-11) and a Sunday-based weekday
//! (0-6). Years are stored as two digits counted from [`CENTURY_BASE`].
//!
//! # Example
//!
//! ```rust,ignore
//! use pcf8563::{AlarmTime, DateTime, Pcf8563, DEFAULT_ADDRESS};
//!
//! let mut rtc = Pcf8563::new(i2c, DEFAULT_ADDRESS, false);
//! if !rtc.is_clock_integrity_ok()? {
//!     rtc.write_datetime(&DateTime { second: 0, minute: 30, hour: 12, day: 1,
//!                                    month: 0, year: 2025, weekday: 3 })?;
//!     rtc.clear_low_voltage_flag()?;
//! }
//!
//! let mut rtc = rtc.configure_alarm(int_pin, on_alarm);
//! rtc.set_alarm(&AlarmTime::new().hour(7).minute(0))?;
//!
//! // from the falling-edge handler of int_pin:
//! rtc.on_alarm_interrupt();
//! ```

#![no_std]

cfg_if::cfg_if! {
    if #[cfg(feature = "log")] {
        macro_rules! debug {
            ($($arg:tt)*) => { log::debug!($($arg)*) };
        }
        macro_rules! warn {
            ($($arg:tt)*) => { log::warn!($($arg)*) };
        }
    } else if #[cfg(feature = "defmt")] {
        macro_rules! debug {
            ($($arg:tt)*) => { defmt::debug!($($arg)*) };
        }
        macro_rules! warn {
            ($($arg:tt)*) => { defmt::warn!($($arg)*) };
        }
    } else {
        macro_rules! debug {
            ($($arg:tt)*) => {};
        }
        macro_rules! warn {
            ($($arg:tt)*) => {};
        }
    }
}

pub mod alarm;
pub mod datetime;
pub mod interrupt;
mod registers;

use chrono::NaiveDateTime;
use embedded_hal::digital::{ErrorType as PinErrorType, InputPin};
#[cfg(not(feature = "async"))]
use embedded_hal::i2c::I2c;
#[cfg(feature = "async")]
use embedded_hal_async::i2c::I2c;
use paste::paste;

pub use alarm::{AlarmField, AlarmState, AlarmTime, ALARM_FIELD_DISABLED};
pub use datetime::{DateTime, DateTimeError, Field};
use datetime::Pcf8563DateTime;
pub use interrupt::AlarmInterrupt;
pub use registers::*;

/// 7-bit I2C address of the PCF8563 (0xA2/0xA3 as 8-bit write/read).
pub const DEFAULT_ADDRESS: u8 = 0x51;

/// Source of the current wall-clock time for [`Pcf8563::sync`].
pub trait TimeSource {
    /// Current date and time.
    fn now(&self) -> NaiveDateTime;
}

/// Device configuration applied by `configure`.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Config {
    /// Drive the CLKOUT pin
    pub clkout_enabled: bool,
    /// CLKOUT frequency when enabled
    pub clkout_frequency: ClkoutFrequency,
    /// INT pin behavior for timer interrupts
    pub interrupt_mode: InterruptMode,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            clkout_enabled: false,
            clkout_frequency: ClkoutFrequency::Hz32768,
            interrupt_mode: InterruptMode::Level,
        }
    }
}

/// Errors returned by the driver.
#[derive(Debug)]
pub enum Pcf8563Error<I2CE> {
    /// A setter was given a value outside the field's range. Nothing was sent
    /// to the device.
    InvalidArgument(Field),
    /// A burst read failed
    BusRead {
        /// Device address
        address: u8,
        /// First register of the burst
        register: RegAddr,
        /// Error reported by the bus
        source: I2CE,
    },
    /// A burst write failed
    BusWrite {
        /// Device address
        address: u8,
        /// First register of the burst
        register: RegAddr,
        /// Error reported by the bus
        source: I2CE,
    },
    /// The operation needs state that has not been set up
    Precondition(&'static str),
    /// The date registers do not hold a valid calendar date
    InvalidDateTime,
}

impl<I2CE> From<DateTimeError> for Pcf8563Error<I2CE> {
    fn from(e: DateTimeError) -> Self {
        match e {
            DateTimeError::InvalidArgument(field) => Pcf8563Error::InvalidArgument(field),
            DateTimeError::InvalidDateTime => Pcf8563Error::InvalidDateTime,
        }
    }
}

/// Placeholder interrupt pin for a driver without `configure_alarm`.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct NoPin;

impl PinErrorType for NoPin {
    type Error = core::convert::Infallible;
}

impl InputPin for NoPin {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        Ok(false)
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        Ok(true)
    }
}

/// PCF8563 Real-Time Clock driver.
pub struct Pcf8563<I2C, P = NoPin> {
    i2c: I2C,
    address: u8,
    debug: bool,
    alarm: AlarmState,
    interrupt: Option<AlarmInterrupt<P>>,
}

impl<I2C: I2c> Pcf8563<I2C> {
    /// Creates a new driver instance.
    ///
    /// # Arguments
    /// * `i2c` - The I2C bus implementation
    /// * `address` - 7-bit device address, normally [`DEFAULT_ADDRESS`]
    /// * `debug` - log every register transfer
    pub fn new(i2c: I2C, address: u8, debug: bool) -> Self {
        Self {
            i2c,
            address,
            debug,
            alarm: AlarmState::new(),
            interrupt: None,
        }
    }
}

// This macro generates a getter and a setter for each single register,
// blocking or async depending on the `async` feature.
macro_rules! register_access {
    ($(($name:ident, $regaddr:expr, $typ:ty)),+ $(,)?) => {
        $(
            paste! {
                #[doc = concat!("Reads the ", stringify!($name), " register.")]
                #[cfg(not(feature = "async"))]
                pub fn $name(&mut self) -> Result<$typ, Pcf8563Error<I2C::Error>> {
                    let mut data = [0];
                    self.read_registers($regaddr, &mut data)?;
                    Ok(<$typ>::from(data[0]))
                }
                #[doc = concat!("Reads the ", stringify!($name), " register.")]
                #[cfg(feature = "async")]
                pub async fn $name(&mut self) -> Result<$typ, Pcf8563Error<I2C::Error>> {
                    let mut data = [0];
                    self.read_registers($regaddr, &mut data).await?;
                    Ok(<$typ>::from(data[0]))
                }

                #[doc = concat!("Writes the ", stringify!($name), " register.")]
                #[cfg(not(feature = "async"))]
                pub fn [<set_ $name>](&mut self, value: $typ) -> Result<(), Pcf8563Error<I2C::Error>> {
                    self.write_registers($regaddr, &[value.into()])
                }
                #[doc = concat!("Writes the ", stringify!($name), " register.")]
                #[cfg(feature = "async")]
                pub async fn [<set_ $name>](&mut self, value: $typ) -> Result<(), Pcf8563Error<I2C::Error>> {
                    self.write_registers($regaddr, &[value.into()]).await
                }
            }
        )+
    };
}

impl<I2C: I2c, P: InputPin> Pcf8563<I2C, P> {
    /// Binds the alarm interrupt pin and callback and resets the alarm state.
    ///
    /// Every field is forgotten, so a bare `set_alarm` fails until a field is
    /// set again. The interrupt starts disarmed. Nothing is sent to the device.
    pub fn configure_alarm<Q: InputPin>(self, pin: Q, callback: fn()) -> Pcf8563<I2C, Q> {
        if self.debug {
            debug!("PCF8563 @{}: alarm interrupt configured", self.address);
        }
        Pcf8563 {
            i2c: self.i2c,
            address: self.address,
            debug: self.debug,
            alarm: AlarmState::new(),
            interrupt: Some(AlarmInterrupt::new(pin, callback)),
        }
    }

    /// Handles a falling edge on the alarm interrupt line.
    ///
    /// Call this from the GPIO interrupt handler. The callback runs at most
    /// once per successful `set_alarm`; further edges are ignored until the
    /// alarm is set again. Returns whether the callback ran.
    pub fn on_alarm_interrupt(&mut self) -> bool {
        self.interrupt
            .as_mut()
            .is_some_and(AlarmInterrupt::on_falling_edge)
    }

    /// `true` while an alarm edge would reach the callback.
    #[must_use]
    pub fn is_alarm_armed(&self) -> bool {
        self.interrupt.as_ref().is_some_and(AlarmInterrupt::is_armed)
    }

    /// Alarm fields written so far.
    #[must_use]
    pub fn alarm_state(&self) -> &AlarmState {
        &self.alarm
    }

    /// Device address in use.
    #[must_use]
    pub fn address(&self) -> u8 {
        self.address
    }

    /// Releases the I2C bus.
    pub fn release(self) -> I2C {
        self.i2c
    }

    register_access!(
        (control1, RegAddr::Control1, Control1),
        (control2, RegAddr::Control2, Control2),
        (second, RegAddr::Seconds, Seconds),
        (minute, RegAddr::Minutes, Minutes),
        (hour, RegAddr::Hours, Hours),
        (day, RegAddr::Days, Days),
        (weekday, RegAddr::Weekdays, Weekdays),
        (month, RegAddr::CenturyMonths, CenturyMonths),
        (year, RegAddr::Years, Years),
        (alarm_minute, RegAddr::AlarmMinute, AlarmMinute),
        (alarm_hour, RegAddr::AlarmHour, AlarmHour),
        (alarm_day, RegAddr::AlarmDay, AlarmDay),
        (alarm_weekday, RegAddr::AlarmWeekday, AlarmWeekday),
        (clkout_control, RegAddr::ClkoutControl, ClkoutControl),
        (timer_control, RegAddr::TimerControl, TimerControl),
        (timer, RegAddr::Timer, Timer),
    );
}

#[maybe_async_cfg::maybe(
    sync(cfg(not(feature = "async")), keep_self),
    async(feature = "async", keep_self)
)]
impl<I2C: I2c, P: InputPin> Pcf8563<I2C, P> {
    /// Reads `buf.len()` consecutive registers starting at `register` in one
    /// burst.
    async fn read_registers(
        &mut self,
        register: RegAddr,
        buf: &mut [u8],
    ) -> Result<(), Pcf8563Error<I2C::Error>> {
        let address = self.address;
        self.i2c
            .write_read(address, &[register as u8], buf)
            .await
            .map_err(|source| Pcf8563Error::BusRead {
                address,
                register,
                source,
            })?;
        if self.debug {
            debug!("PCF8563 @{}: read {:?} -> {:?}", address, register, buf);
        }
        Ok(())
    }

    /// Writes `data` to consecutive registers starting at `register` in one
    /// burst. `data` holds at most 7 bytes.
    async fn write_registers(
        &mut self,
        register: RegAddr,
        data: &[u8],
    ) -> Result<(), Pcf8563Error<I2C::Error>> {
        let address = self.address;
        let mut frame = [0u8; 8];
        frame[0] = register as u8;
        frame[1..=data.len()].copy_from_slice(data);
        if self.debug {
            debug!("PCF8563 @{}: write {:?} <- {:?}", address, register, data);
        }
        self.i2c
            .write(address, &frame[..=data.len()])
            .await
            .map_err(|source| Pcf8563Error::BusWrite {
                address,
                register,
                source,
            })
    }

    /// Applies `config`: CLKOUT output and the INT pin mode.
    ///
    /// # Errors
    /// * `Pcf8563Error::BusRead`/`BusWrite` on bus failure
    pub async fn configure(&mut self, config: &Config) -> Result<(), Pcf8563Error<I2C::Error>> {
        let mut clkout = self.clkout_control().await?;
        clkout.set_enabled(config.clkout_enabled);
        clkout.set_frequency(config.clkout_frequency);
        self.set_clkout_control(clkout).await?;

        let mut control = self.control2().await?;
        control.set_interrupt_mode(config.interrupt_mode);
        self.set_control2(control).await?;
        debug!("PCF8563: configured {:?}", config);
        Ok(())
    }

    /// Reads the current date and time in one 7-register burst.
    ///
    /// The values are returned as stored, without range checks. A set
    /// low-voltage flag is logged but not treated as an error; see
    /// `is_clock_integrity_ok`.
    ///
    /// # Errors
    /// * `Pcf8563Error::BusRead` on bus failure
    pub async fn read_datetime(&mut self) -> Result<DateTime, Pcf8563Error<I2C::Error>> {
        let mut data = [0; 7];
        self.read_registers(RegAddr::Seconds, &mut data).await?;
        let raw = Pcf8563DateTime::from(data);
        if raw.low_voltage() {
            warn!("PCF8563: low-voltage flag set, time may be invalid");
        }
        Ok(raw.into_datetime())
    }

    /// Writes `datetime` in one 7-register burst.
    ///
    /// Every field is validated first; nothing is sent if any is out of
    /// range. The write also clears the low-voltage flag.
    ///
    /// # Errors
    /// * `Pcf8563Error::InvalidArgument` naming the first bad field
    /// * `Pcf8563Error::BusWrite` on bus failure
    pub async fn write_datetime(
        &mut self,
        datetime: &DateTime,
    ) -> Result<(), Pcf8563Error<I2C::Error>> {
        let raw = Pcf8563DateTime::from_datetime(datetime)?;
        let data: [u8; 7] = (&raw).into();
        self.write_registers(RegAddr::Seconds, &data).await
    }

    /// Reads the current date and time as a chrono value.
    ///
    /// # Errors
    /// * `Pcf8563Error::BusRead` on bus failure
    /// * `Pcf8563Error::InvalidDateTime` if the registers do not hold a real date
    pub async fn datetime(&mut self) -> Result<NaiveDateTime, Pcf8563Error<I2C::Error>> {
        let datetime = self.read_datetime().await?;
        Ok(NaiveDateTime::try_from(datetime)?)
    }

    /// Sets the date and time from a chrono value.
    ///
    /// # Errors
    /// * `Pcf8563Error::InvalidArgument` if the year is outside the device's century
    /// * `Pcf8563Error::BusWrite` on bus failure
    pub async fn set_datetime(
        &mut self,
        datetime: &NaiveDateTime,
    ) -> Result<(), Pcf8563Error<I2C::Error>> {
        self.write_datetime(&DateTime::from(datetime)).await
    }

    /// Sets the device clock from `source`.
    ///
    /// # Errors
    /// Same as `set_datetime`.
    pub async fn sync<T: TimeSource>(&mut self, source: &T) -> Result<(), Pcf8563Error<I2C::Error>> {
        let now = source.now();
        if self.debug {
            debug!("PCF8563 @{}: sync to host time", self.address);
        }
        self.set_datetime(&now).await
    }

    /// `false` if the low-voltage flag is set, meaning backup power dropped
    /// too low at some point and the time may be wrong. Reads the device on
    /// every call.
    ///
    /// # Errors
    /// * `Pcf8563Error::BusRead` on bus failure
    pub async fn is_clock_integrity_ok(&mut self) -> Result<bool, Pcf8563Error<I2C::Error>> {
        Ok(!self.second().await?.low_voltage())
    }

    /// Clears the low-voltage flag, keeping the stored seconds.
    ///
    /// # Errors
    /// * `Pcf8563Error::BusRead`/`BusWrite` on bus failure
    pub async fn clear_low_voltage_flag(&mut self) -> Result<(), Pcf8563Error<I2C::Error>> {
        let mut seconds = self.second().await?;
        seconds.set_low_voltage(false);
        self.set_second(seconds).await
    }

    /// Sets and arms the alarm.
    ///
    /// Fields present in `time` replace the stored ones; absent fields keep
    /// their previously set value, or stay disabled if never set. All four
    /// alarm registers are written in one burst, then the alarm interrupt is
    /// enabled and the timer interrupt disabled. Passing an empty `time`
    /// re-arms the alarm with the stored fields.
    ///
    /// # Errors
    /// * `Pcf8563Error::InvalidArgument` if a field is out of range
    /// * `Pcf8563Error::Precondition` if `time` is empty and no field was ever set
    /// * `Pcf8563Error::BusRead`/`BusWrite` on bus failure
    pub async fn set_alarm(&mut self, time: &AlarmTime) -> Result<(), Pcf8563Error<I2C::Error>> {
        let raw = self.alarm.merge(time)?;
        if time.is_empty() && !self.alarm.has_time() {
            return Err(Pcf8563Error::Precondition("no alarm time configured"));
        }
        self.write_registers(RegAddr::AlarmMinute, &raw).await?;

        let mut control = self.control2().await?;
        control.set_alarm_interrupt_enable(true);
        control.set_timer_interrupt_enable(false);
        self.set_control2(control).await?;

        self.alarm.commit(time, raw);
        if let Some(irq) = self.interrupt.as_mut() {
            irq.arm();
        }
        if self.debug {
            debug!("PCF8563 @{}: alarm armed {:?}", self.address, raw);
        }
        Ok(())
    }

    /// Disables the alarm interrupt. Stored alarm fields are kept, so an
    /// empty `set_alarm` re-arms the same time.
    ///
    /// # Errors
    /// * `Pcf8563Error::BusRead`/`BusWrite` on bus failure
    pub async fn unset_alarm(&mut self) -> Result<(), Pcf8563Error<I2C::Error>> {
        let mut control = self.control2().await?;
        control.set_alarm_interrupt_enable(false);
        self.set_control2(control).await?;
        if let Some(irq) = self.interrupt.as_mut() {
            irq.disarm();
        }
        Ok(())
    }

    /// Disables the alarm and timer interrupts, clears the alarm flag,
    /// disables all four alarm registers and forgets the stored fields.
    ///
    /// # Errors
    /// * `Pcf8563Error::BusRead`/`BusWrite` on bus failure
    pub async fn clear_alarm(&mut self) -> Result<(), Pcf8563Error<I2C::Error>> {
        let mut control = self.control2().await?;
        control.set_alarm_interrupt_enable(false);
        control.set_alarm_flag(false);
        control.set_timer_interrupt_enable(false);
        self.set_control2(control).await?;
        // AIE is off on the device from here on
        if let Some(irq) = self.interrupt.as_mut() {
            irq.disarm();
        }

        self.write_registers(RegAddr::AlarmMinute, &[ALARM_FIELD_DISABLED; 4])
            .await?;
        self.alarm.reset();
        Ok(())
    }

    /// Clears the alarm flag so INT is released. The alarm stays enabled.
    ///
    /// # Errors
    /// * `Pcf8563Error::BusRead`/`BusWrite` on bus failure
    pub async fn silence_alarm(&mut self) -> Result<(), Pcf8563Error<I2C::Error>> {
        let mut control = self.control2().await?;
        control.set_alarm_flag(false);
        self.set_control2(control).await
    }

    /// `true` if the alarm has matched since the flag was last cleared.
    ///
    /// # Errors
    /// * `Pcf8563Error::BusRead` on bus failure
    pub async fn alarm_triggered(&mut self) -> Result<bool, Pcf8563Error<I2C::Error>> {
        Ok(self.control2().await?.alarm_flag())
    }

    /// Reads back the alarm registers. Disabled fields are `None`.
    ///
    /// # Errors
    /// * `Pcf8563Error::BusRead` on bus failure
    pub async fn alarm(&mut self) -> Result<AlarmTime, Pcf8563Error<I2C::Error>> {
        let mut data = [0; 4];
        self.read_registers(RegAddr::AlarmMinute, &mut data).await?;
        Ok(AlarmTime::from_registers(data))
    }
}
