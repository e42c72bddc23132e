//! Alarm configuration utilities for the PCF8563 RTC.
//!
//! The PCF8563 has a single alarm built from four registers: minute, hour,
//! day of month and weekday. Each register carries its own disable bit (bit 7,
//! `AE_x`): a field with the bit set does not take part in the match, and the
//! alarm fires when every enabled field matches the current time. With the
//! alarm interrupt enabled the peripheral then sets the alarm flag (AF) and
//! pulls INT low until AF is cleared.
//!
//! # Field persistence
//!
//! The driver remembers every field it has written in an [`AlarmState`]. A
//! later [`AlarmTime`] that leaves a field out does not clear it: the stored
//! value is written again, still enabled. Fields never set are written fully
//! disabled (`0x80`). Only clearing the alarm forgets stored fields.
//!
//! # Example
//!
//! ```rust,ignore
//! // Every day at 17:15
//! rtc.set_alarm(&AlarmTime::new().hour(17))?;
//! rtc.set_alarm(&AlarmTime::new().minute(15))?;
//! ```

use crate::datetime::{DateTimeError, Field};
use crate::registers::{bcd_to_integer, integer_to_bcd};
use crate::{AlarmDay, AlarmHour, AlarmMinute, AlarmWeekday, RegAddr};

/// Encoded value of an alarm register that takes no part in the match.
pub const ALARM_FIELD_DISABLED: u8 = 0x80;

/// One of the four alarm registers, in register order.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AlarmField {
    /// Minute alarm (0-59)
    Minute = 0,
    /// Hour alarm (0-23)
    Hour = 1,
    /// Day of month alarm (1-31)
    Day = 2,
    /// Weekday alarm (0-6, 0 = Sunday)
    Weekday = 3,
}

impl AlarmField {
    /// All fields in register order.
    pub const ALL: [AlarmField; 4] = [
        AlarmField::Minute,
        AlarmField::Hour,
        AlarmField::Day,
        AlarmField::Weekday,
    ];

    /// Register holding this field.
    #[must_use]
    pub fn register(self) -> RegAddr {
        match self {
            AlarmField::Minute => RegAddr::AlarmMinute,
            AlarmField::Hour => RegAddr::AlarmHour,
            AlarmField::Day => RegAddr::AlarmDay,
            AlarmField::Weekday => RegAddr::AlarmWeekday,
        }
    }

    fn field(self) -> Field {
        match self {
            AlarmField::Minute => Field::Minute,
            AlarmField::Hour => Field::Hour,
            AlarmField::Day => Field::Day,
            AlarmField::Weekday => Field::Weekday,
        }
    }

    fn in_range(self, value: u8) -> bool {
        match self {
            AlarmField::Minute => value <= 59,
            AlarmField::Hour => value <= 23,
            AlarmField::Day => (1..=31).contains(&value),
            AlarmField::Weekday => value <= 6,
        }
    }

    /// Encodes `value` as an enabled register byte.
    ///
    /// The value is truncated to the register's field width; callers validate
    /// the range first.
    pub(crate) fn encode(self, value: u8) -> u8 {
        match self {
            AlarmField::Minute => {
                let mut reg = AlarmMinute::default();
                reg.set_bcd(integer_to_bcd(value));
                reg.into()
            }
            AlarmField::Hour => {
                let mut reg = AlarmHour::default();
                reg.set_bcd(integer_to_bcd(value));
                reg.into()
            }
            AlarmField::Day => {
                let mut reg = AlarmDay::default();
                reg.set_bcd(integer_to_bcd(value));
                reg.into()
            }
            AlarmField::Weekday => {
                let mut reg = AlarmWeekday::default();
                reg.set_weekday(value);
                reg.into()
            }
        }
    }

    /// Decodes a register byte, returning `None` if the field is disabled.
    pub(crate) fn decode(self, raw: u8) -> Option<u8> {
        let (disabled, value) = match self {
            AlarmField::Minute => {
                let reg = AlarmMinute(raw);
                (reg.disabled(), bcd_to_integer(reg.bcd()))
            }
            AlarmField::Hour => {
                let reg = AlarmHour(raw);
                (reg.disabled(), bcd_to_integer(reg.bcd()))
            }
            AlarmField::Day => {
                let reg = AlarmDay(raw);
                (reg.disabled(), bcd_to_integer(reg.bcd()))
            }
            AlarmField::Weekday => {
                let reg = AlarmWeekday(raw);
                (reg.disabled(), reg.weekday())
            }
        };
        (!disabled).then_some(value)
    }
}

/// The alarm fields to match. `None` leaves a field out.
///
/// Passed to `set_alarm`, where absent fields keep whatever was set before,
/// and returned by `alarm`, where `None` means the field is disabled.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AlarmTime {
    /// Minute (0-59)
    pub minute: Option<u8>,
    /// Hour (0-23)
    pub hour: Option<u8>,
    /// Day of month (1-31)
    pub day: Option<u8>,
    /// Weekday (0-6, 0 = Sunday)
    pub weekday: Option<u8>,
}

impl AlarmTime {
    /// An alarm time with no fields.
    #[must_use]
    pub const fn new() -> Self {
        AlarmTime {
            minute: None,
            hour: None,
            day: None,
            weekday: None,
        }
    }

    /// Sets the alarm minute (0-59).
    #[must_use]
    pub const fn minute(mut self, minute: u8) -> Self {
        self.minute = Some(minute);
        self
    }

    /// Sets the alarm hour (0-23).
    #[must_use]
    pub const fn hour(mut self, hour: u8) -> Self {
        self.hour = Some(hour);
        self
    }

    /// Sets the alarm day of month (1-31).
    #[must_use]
    pub const fn day(mut self, day: u8) -> Self {
        self.day = Some(day);
        self
    }

    /// Sets the alarm weekday (0-6, Sunday = 0).
    #[must_use]
    pub const fn weekday(mut self, weekday: u8) -> Self {
        self.weekday = Some(weekday);
        self
    }

    /// Value supplied for `field`, if any.
    #[must_use]
    pub fn get(&self, field: AlarmField) -> Option<u8> {
        match field {
            AlarmField::Minute => self.minute,
            AlarmField::Hour => self.hour,
            AlarmField::Day => self.day,
            AlarmField::Weekday => self.weekday,
        }
    }

    fn set(&mut self, field: AlarmField, value: Option<u8>) {
        match field {
            AlarmField::Minute => self.minute = value,
            AlarmField::Hour => self.hour = value,
            AlarmField::Day => self.day = value,
            AlarmField::Weekday => self.weekday = value,
        }
    }

    /// `true` if no field is supplied.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        AlarmField::ALL.iter().all(|f| self.get(*f).is_none())
    }

    /// Checks every supplied field against its legal range.
    ///
    /// # Errors
    ///
    /// Returns [`DateTimeError::InvalidArgument`] naming the first field out of
    /// range.
    pub fn validate(&self) -> Result<(), DateTimeError> {
        for field in AlarmField::ALL {
            if let Some(value) = self.get(field) {
                if !field.in_range(value) {
                    return Err(DateTimeError::InvalidArgument(field.field()));
                }
            }
        }
        Ok(())
    }

    /// Decodes the four alarm registers, in register order.
    #[must_use]
    pub fn from_registers(raw: [u8; 4]) -> Self {
        let mut time = AlarmTime::new();
        for field in AlarmField::ALL {
            time.set(field, field.decode(raw[field as usize]));
        }
        time
    }
}

/// Alarm fields the driver has written, kept between calls.
///
/// A slot is `None` until its field is set and after the alarm is cleared.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct AlarmState {
    slots: [Option<u8>; 4],
}

impl AlarmState {
    /// State with no field ever set.
    #[must_use]
    pub const fn new() -> Self {
        AlarmState { slots: [None; 4] }
    }

    /// Forgets every stored field.
    pub fn reset(&mut self) {
        self.slots = [None; 4];
    }

    /// `true` once any field has been set since the last reset.
    #[must_use]
    pub fn has_time(&self) -> bool {
        self.slots.iter().any(Option::is_some)
    }

    /// Stored encoded byte for `field`.
    #[must_use]
    pub fn stored(&self, field: AlarmField) -> Option<u8> {
        self.slots[field as usize]
    }

    /// Computes the four register bytes for `time` merged over the stored
    /// fields, without changing the state.
    ///
    /// Supplied fields are encoded enabled. Absent fields take their stored
    /// byte with the disable bit cleared, or [`ALARM_FIELD_DISABLED`] if they
    /// were never set.
    ///
    /// # Errors
    ///
    /// Returns [`DateTimeError::InvalidArgument`] for an out of range field.
    pub fn merge(&self, time: &AlarmTime) -> Result<[u8; 4], DateTimeError> {
        time.validate()?;
        let mut raw = [ALARM_FIELD_DISABLED; 4];
        for field in AlarmField::ALL {
            raw[field as usize] = match (time.get(field), self.stored(field)) {
                (Some(value), _) => field.encode(value),
                (None, Some(stored)) => stored & !ALARM_FIELD_DISABLED,
                (None, None) => ALARM_FIELD_DISABLED,
            };
        }
        Ok(raw)
    }

    /// Records the bytes produced by [`merge`](Self::merge) for the supplied
    /// fields once they have reached the peripheral.
    pub fn commit(&mut self, time: &AlarmTime, raw: [u8; 4]) {
        for field in AlarmField::ALL {
            if time.get(field).is_some() {
                self.slots[field as usize] = Some(raw[field as usize]);
            }
        }
    }
}
