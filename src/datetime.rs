//! `DateTime` conversion and register utilities for the PCF8563 RTC.
//!
//! This module provides the host-facing [`DateTime`] value and the internal
//! representation of the peripheral's seven date/time registers, together with
//! validated conversion between the two.
//!
//! # Conventions
//!
//! [`DateTime`] follows the host convention: `month` is zero-indexed (0-11)
//! and `weekday` counts from Sunday (0-6). The peripheral stores the month
//! one-indexed, so the driver adds 1 on write and subtracts 1 on read. The
//! year register only holds two digits counted from [`CENTURY_BASE`].
//!
//! # Register Model
//!
//! The PCF8563 stores date and time in 7 consecutive registers starting at
//! 0x02: Seconds, Minutes, Hours, Days, Weekdays, Century/Months, Years.
//!
//! # Error Handling
//!
//! Validation and conversion errors are reported via [`DateTimeError`].

use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike};

use crate::registers::{bcd_to_integer, integer_to_bcd, CENTURY_BASE};
use crate::{CenturyMonths, Days, Hours, Minutes, Seconds, Weekdays, Years};

/// Names the field rejected by a setter.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Field {
    /// Seconds (0-59)
    Second,
    /// Minutes (0-59)
    Minute,
    /// Hours (0-23)
    Hour,
    /// Day of month (1-31)
    Day,
    /// Weekday (0-6)
    Weekday,
    /// Month (0-11)
    Month,
    /// Year (`CENTURY_BASE` to `CENTURY_BASE + 99`)
    Year,
}

/// Errors that can occur during date/time validation or conversion.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DateTimeError {
    /// A field is outside its legal range
    InvalidArgument(Field),
    /// The values do not form a calendar date (e.g. February 30th)
    InvalidDateTime,
}

/// Calendar date and wall-clock time as the host sees it.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DateTime {
    /// Seconds (0-59)
    pub second: u8,
    /// Minutes (0-59)
    pub minute: u8,
    /// Hours (0-23)
    pub hour: u8,
    /// Day of month (1-31)
    pub day: u8,
    /// Month, zero-indexed (0 = January, 11 = December)
    pub month: u8,
    /// Absolute year, e.g. 2016
    pub year: i32,
    /// Day of week (0 = Sunday, 6 = Saturday)
    pub weekday: u8,
}

impl DateTime {
    /// Checks every field against its legal range.
    ///
    /// # Errors
    ///
    /// Returns [`DateTimeError::InvalidArgument`] naming the first field that is
    /// out of range.
    pub fn validate(&self) -> Result<(), DateTimeError> {
        let check = |ok: bool, field: Field| {
            if ok {
                Ok(())
            } else {
                Err(DateTimeError::InvalidArgument(field))
            }
        };
        check(self.second <= 59, Field::Second)?;
        check(self.minute <= 59, Field::Minute)?;
        check(self.hour <= 23, Field::Hour)?;
        check((1..=31).contains(&self.day), Field::Day)?;
        check(self.weekday <= 6, Field::Weekday)?;
        check(self.month <= 11, Field::Month)?;
        check(
            (CENTURY_BASE..CENTURY_BASE + 100).contains(&self.year),
            Field::Year,
        )
    }
}

impl From<&NaiveDateTime> for DateTime {
    fn from(dt: &NaiveDateTime) -> Self {
        // chrono guarantees the ranges, so the narrowing casts are lossless.
        DateTime {
            second: dt.second() as u8,
            minute: dt.minute() as u8,
            hour: dt.hour() as u8,
            day: dt.day() as u8,
            month: dt.month0() as u8,
            year: dt.year(),
            weekday: dt.weekday().num_days_from_sunday() as u8,
        }
    }
}

impl TryFrom<DateTime> for NaiveDateTime {
    type Error = DateTimeError;

    /// Builds a chrono value. The weekday is ignored; chrono derives it from
    /// the date.
    fn try_from(dt: DateTime) -> Result<Self, Self::Error> {
        NaiveDate::from_ymd_opt(dt.year, u32::from(dt.month) + 1, u32::from(dt.day))
            .and_then(|d| {
                d.and_hms_opt(
                    u32::from(dt.hour),
                    u32::from(dt.minute),
                    u32::from(dt.second),
                )
            })
            .ok_or(DateTimeError::InvalidDateTime)
    }
}

/// Internal representation of the PCF8563 date and time registers.
///
/// This struct models the 7 date/time registers using strongly-typed bitfield
/// wrappers for each field and is what travels over the bus in one burst.
#[derive(Debug, Copy, Clone, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub(crate) struct Pcf8563DateTime {
    seconds: Seconds,
    minutes: Minutes,
    hours: Hours,
    days: Days,
    weekdays: Weekdays,
    months: CenturyMonths,
    years: Years,
}

impl Pcf8563DateTime {
    /// Validates `datetime` and encodes it into register form.
    ///
    /// The low-voltage and century flags are written as 0.
    pub(crate) fn from_datetime(datetime: &DateTime) -> Result<Self, DateTimeError> {
        datetime.validate()?;

        let mut seconds = Seconds::default();
        seconds.set_bcd(integer_to_bcd(datetime.second));
        let mut minutes = Minutes::default();
        minutes.set_bcd(integer_to_bcd(datetime.minute));
        let mut hours = Hours::default();
        hours.set_bcd(integer_to_bcd(datetime.hour));
        let mut days = Days::default();
        days.set_bcd(integer_to_bcd(datetime.day));
        let mut weekdays = Weekdays::default();
        weekdays.set_weekday(datetime.weekday);
        let mut months = CenturyMonths::default();
        months.set_bcd(integer_to_bcd(datetime.month + 1));
        let year_offset = u8::try_from(datetime.year - CENTURY_BASE)
            .map_err(|_| DateTimeError::InvalidArgument(Field::Year))?;
        let mut years = Years::default();
        years.set_bcd(integer_to_bcd(year_offset));

        let raw = Pcf8563DateTime {
            seconds,
            minutes,
            hours,
            days,
            weekdays,
            months,
            years,
        };
        debug!("raw={:?}", raw);
        Ok(raw)
    }

    /// Decodes the registers. Flag bits are masked off before BCD decoding.
    ///
    /// No range check is made; a register file holding garbage decodes to a
    /// garbage `DateTime`.
    pub(crate) fn into_datetime(self) -> DateTime {
        DateTime {
            second: bcd_to_integer(self.seconds.bcd()),
            minute: bcd_to_integer(self.minutes.bcd()),
            hour: bcd_to_integer(self.hours.bcd()),
            day: bcd_to_integer(self.days.bcd()),
            month: bcd_to_integer(self.months.bcd()).saturating_sub(1),
            year: CENTURY_BASE + i32::from(bcd_to_integer(self.years.bcd())),
            weekday: self.weekdays.weekday(),
        }
    }

    pub(crate) fn low_voltage(&self) -> bool {
        self.seconds.low_voltage()
    }
}

impl From<[u8; 7]> for Pcf8563DateTime {
    fn from(data: [u8; 7]) -> Self {
        Pcf8563DateTime {
            seconds: Seconds(data[0]),
            minutes: Minutes(data[1]),
            hours: Hours(data[2]),
            days: Days(data[3]),
            weekdays: Weekdays(data[4]),
            months: CenturyMonths(data[5]),
            years: Years(data[6]),
        }
    }
}

impl From<&Pcf8563DateTime> for [u8; 7] {
    fn from(dt: &Pcf8563DateTime) -> [u8; 7] {
        [
            dt.seconds.0,
            dt.minutes.0,
            dt.hours.0,
            dt.days.0,
            dt.weekdays.0,
            dt.months.0,
            dt.years.0,
        ]
    }
}
