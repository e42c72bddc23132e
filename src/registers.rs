//! Register definitions and bitfield structures for the PCF8563 RTC.
//!
//! This module contains the register map, the BCD helpers and one bitfield
//! type per register. Every value field is declared with exactly the width the
//! peripheral uses for it, so reading a field through its accessor already
//! strips the flag bits that share the byte (the low-voltage bit in seconds,
//! the century bit in month, the alarm disable bits).

use bitfield::bitfield;

/// Register addresses for the PCF8563 RTC.
#[allow(unused)]
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RegAddr {
    /// Control/status register 1 (STOP, test bits)
    Control1 = 0x00,
    /// Control/status register 2 (alarm and timer flags and enables)
    Control2 = 0x01,
    /// Seconds register (0-59) with the low-voltage flag in bit 7
    Seconds = 0x02,
    /// Minutes register (0-59)
    Minutes = 0x03,
    /// Hours register (0-23)
    Hours = 0x04,
    /// Day of month register (1-31)
    Days = 0x05,
    /// Weekday register (0-6)
    Weekdays = 0x06,
    /// Month register (1-12) with the century flag in bit 7
    CenturyMonths = 0x07,
    /// Year register (0-99)
    Years = 0x08,
    /// Minute alarm register
    AlarmMinute = 0x09,
    /// Hour alarm register
    AlarmHour = 0x0A,
    /// Day alarm register
    AlarmDay = 0x0B,
    /// Weekday alarm register
    AlarmWeekday = 0x0C,
    /// CLKOUT control register
    ClkoutControl = 0x0D,
    /// Timer control register
    TimerControl = 0x0E,
    /// Timer countdown value register
    Timer = 0x0F,
}

/// Fixed century the two-digit year register is counted from.
///
/// The peripheral only ever stores two year digits. Years written to it must
/// fall in `CENTURY_BASE..CENTURY_BASE + 100`.
pub const CENTURY_BASE: i32 = 2000;

/// Converts an integer in `0..=99` to packed BCD.
///
/// The tens digit lands in the high nibble and the ones digit in the low
/// nibble. Values above 99 are a caller error and produce garbage; no check is
/// made here.
#[must_use]
pub const fn integer_to_bcd(value: u8) -> u8 {
    ((value / 10) << 4) | (value % 10)
}

/// Converts a packed BCD byte back to an integer in `0..=99`.
///
/// Flag bits sharing the byte must be masked off by the caller first.
#[must_use]
pub const fn bcd_to_integer(bcd: u8) -> u8 {
    (bcd >> 4) * 10 + (bcd & 0x0F)
}

/// CLKOUT output frequency selection (FD1/FD0).
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ClkoutFrequency {
    /// 32.768 kHz
    Hz32768 = 0b00,
    /// 1.024 kHz
    Hz1024 = 0b01,
    /// 32 Hz
    Hz32 = 0b10,
    /// 1 Hz
    Hz1 = 0b11,
}
impl From<u8> for ClkoutFrequency {
    /// Creates a `ClkoutFrequency` from a raw register value.
    ///
    /// # Panics
    /// Panics if the value is not 0b00, 0b01, 0b10, or 0b11.
    fn from(v: u8) -> Self {
        match v {
            0b00 => ClkoutFrequency::Hz32768,
            0b01 => ClkoutFrequency::Hz1024,
            0b10 => ClkoutFrequency::Hz32,
            0b11 => ClkoutFrequency::Hz1,
            _ => panic!("Invalid value for ClkoutFrequency: {}", v),
        }
    }
}
impl From<ClkoutFrequency> for u8 {
    fn from(v: ClkoutFrequency) -> Self {
        v as u8
    }
}

/// How the INT pin behaves while a timer or alarm flag is active (TI_TP).
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum InterruptMode {
    /// INT follows the flag and stays low until the flag is cleared
    Level = 0,
    /// INT pulses (timer only; alarms always use level mode)
    Pulse = 1,
}
impl From<u8> for InterruptMode {
    /// Creates an `InterruptMode` from a raw register value.
    ///
    /// # Panics
    /// Panics if the value is not 0 or 1.
    fn from(v: u8) -> Self {
        match v {
            0 => InterruptMode::Level,
            1 => InterruptMode::Pulse,
            _ => panic!("Invalid value for InterruptMode: {}", v),
        }
    }
}
impl From<InterruptMode> for u8 {
    fn from(v: InterruptMode) -> Self {
        v as u8
    }
}

// This macro generates the From<u8> and Into<u8> implementations for the
// register type
macro_rules! from_register_u8 {
    ($typ:ty) => {
        impl From<u8> for $typ {
            fn from(v: u8) -> Self {
                paste::paste!([< $typ >](v))
            }
        }
        impl From<$typ> for u8 {
            fn from(v: $typ) -> Self {
                v.0
            }
        }
    };
}

bitfield! {
    /// Control/status register 1.
    #[derive(Clone, Copy, Default, PartialEq)]
    #[cfg_attr(feature = "defmt", derive(defmt::Format))]
    pub struct Control1(u8);
    impl Debug;
    /// EXT_CLK test mode
    pub test1, set_test1: 7;
    /// Stops the RTC clock when set
    pub stop, set_stop: 5;
    /// Power-on reset override
    pub testc, set_testc: 3;
}
from_register_u8!(Control1);

bitfield! {
    /// Control/status register 2: alarm and timer flags and interrupt enables.
    #[derive(Clone, Copy, Default, PartialEq)]
    pub struct Control2(u8);
    impl Debug;
    /// INT pin mode for the timer (TI_TP)
    pub from into InterruptMode, interrupt_mode, set_interrupt_mode: 4, 4;
    /// Alarm flag (AF), set by the peripheral when the alarm matches
    pub alarm_flag, set_alarm_flag: 3;
    /// Timer flag (TF)
    pub timer_flag, set_timer_flag: 2;
    /// Alarm interrupt enable (AIE)
    pub alarm_interrupt_enable, set_alarm_interrupt_enable: 1;
    /// Timer interrupt enable (TIE)
    pub timer_interrupt_enable, set_timer_interrupt_enable: 0;
}
from_register_u8!(Control2);

#[cfg(feature = "defmt")]
impl defmt::Format for Control2 {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "Control2(");
        if self.alarm_interrupt_enable() {
            defmt::write!(f, "AIE ");
        }
        if self.alarm_flag() {
            defmt::write!(f, "AF ");
        }
        if self.timer_interrupt_enable() {
            defmt::write!(f, "TIE ");
        }
        if self.timer_flag() {
            defmt::write!(f, "TF ");
        }
        defmt::write!(f, ")");
    }
}

bitfield! {
    /// Seconds register (0-59) with BCD encoding and the low-voltage flag.
    #[derive(Clone, Copy, Default, PartialEq)]
    pub struct Seconds(u8);
    impl Debug;
    /// Low-voltage flag (VL); integrity of the time is not guaranteed when set
    pub low_voltage, set_low_voltage: 7;
    /// Seconds in BCD (bits 0-6)
    pub bcd, set_bcd: 6, 0;
}
from_register_u8!(Seconds);

#[cfg(feature = "defmt")]
impl defmt::Format for Seconds {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "Seconds({}s", bcd_to_integer(self.bcd()));
        if self.low_voltage() {
            defmt::write!(f, ", VL");
        }
        defmt::write!(f, ")");
    }
}

bitfield! {
    /// Minutes register (0-59) with BCD encoding.
    #[derive(Clone, Copy, Default, PartialEq)]
    #[cfg_attr(feature = "defmt", derive(defmt::Format))]
    pub struct Minutes(u8);
    impl Debug;
    /// Minutes in BCD (bits 0-6)
    pub bcd, set_bcd: 6, 0;
}
from_register_u8!(Minutes);

bitfield! {
    /// Hours register (0-23) with BCD encoding.
    #[derive(Clone, Copy, Default, PartialEq)]
    #[cfg_attr(feature = "defmt", derive(defmt::Format))]
    pub struct Hours(u8);
    impl Debug;
    /// Hours in BCD (bits 0-5)
    pub bcd, set_bcd: 5, 0;
}
from_register_u8!(Hours);

bitfield! {
    /// Day of month register (1-31) with BCD encoding.
    #[derive(Clone, Copy, Default, PartialEq)]
    #[cfg_attr(feature = "defmt", derive(defmt::Format))]
    pub struct Days(u8);
    impl Debug;
    /// Day of month in BCD (bits 0-5)
    pub bcd, set_bcd: 5, 0;
}
from_register_u8!(Days);

bitfield! {
    /// Weekday register (0-6, 0 = Sunday), stored in binary.
    #[derive(Clone, Copy, Default, PartialEq)]
    #[cfg_attr(feature = "defmt", derive(defmt::Format))]
    pub struct Weekdays(u8);
    impl Debug;
    /// Weekday (bits 0-2)
    pub weekday, set_weekday: 2, 0;
}
from_register_u8!(Weekdays);

bitfield! {
    /// Month register (1-12) with BCD encoding and the century flag.
    #[derive(Clone, Copy, Default, PartialEq)]
    #[cfg_attr(feature = "defmt", derive(defmt::Format))]
    pub struct CenturyMonths(u8);
    impl Debug;
    /// Century flag, toggled by the peripheral when the year wraps 99 -> 00
    pub century, set_century: 7;
    /// Month in BCD (bits 0-4), one-indexed
    pub bcd, set_bcd: 4, 0;
}
from_register_u8!(CenturyMonths);

bitfield! {
    /// Year register (0-99) with BCD encoding.
    #[derive(Clone, Copy, Default, PartialEq)]
    #[cfg_attr(feature = "defmt", derive(defmt::Format))]
    pub struct Years(u8);
    impl Debug;
    /// Years since `CENTURY_BASE` in BCD
    pub bcd, set_bcd: 7, 0;
}
from_register_u8!(Years);

// Alarm registers. Bit 7 is AE_x: 1 disables the field, 0 makes it take part
// in the alarm match.

bitfield! {
    /// Minute alarm register.
    #[derive(Clone, Copy, Default, PartialEq)]
    pub struct AlarmMinute(u8);
    impl Debug;
    /// Field disabled (AE_M)
    pub disabled, set_disabled: 7;
    /// Minute in BCD (bits 0-6)
    pub bcd, set_bcd: 6, 0;
}
from_register_u8!(AlarmMinute);

bitfield! {
    /// Hour alarm register.
    #[derive(Clone, Copy, Default, PartialEq)]
    pub struct AlarmHour(u8);
    impl Debug;
    /// Field disabled (AE_H)
    pub disabled, set_disabled: 7;
    /// Hour in BCD (bits 0-5)
    pub bcd, set_bcd: 5, 0;
}
from_register_u8!(AlarmHour);

bitfield! {
    /// Day alarm register.
    #[derive(Clone, Copy, Default, PartialEq)]
    pub struct AlarmDay(u8);
    impl Debug;
    /// Field disabled (AE_D)
    pub disabled, set_disabled: 7;
    /// Day of month in BCD (bits 0-5)
    pub bcd, set_bcd: 5, 0;
}
from_register_u8!(AlarmDay);

bitfield! {
    /// Weekday alarm register.
    #[derive(Clone, Copy, Default, PartialEq)]
    pub struct AlarmWeekday(u8);
    impl Debug;
    /// Field disabled (AE_W)
    pub disabled, set_disabled: 7;
    /// Weekday (bits 0-2)
    pub weekday, set_weekday: 2, 0;
}
from_register_u8!(AlarmWeekday);

macro_rules! alarm_register_format {
    ($typ:ident, $value:ident, $decode:expr) => {
        #[cfg(feature = "defmt")]
        impl defmt::Format for $typ {
            fn format(&self, f: defmt::Formatter) {
                let decode: fn(u8) -> u8 = $decode;
                defmt::write!(f, "{}({}", stringify!($typ), decode(self.$value()));
                if self.disabled() {
                    defmt::write!(f, ", disabled");
                }
                defmt::write!(f, ")");
            }
        }
    };
}
alarm_register_format!(AlarmMinute, bcd, bcd_to_integer);
alarm_register_format!(AlarmHour, bcd, bcd_to_integer);
alarm_register_format!(AlarmDay, bcd, bcd_to_integer);
alarm_register_format!(AlarmWeekday, weekday, |w| w);

bitfield! {
    /// CLKOUT control register.
    #[derive(Clone, Copy, Default, PartialEq)]
    #[cfg_attr(feature = "defmt", derive(defmt::Format))]
    pub struct ClkoutControl(u8);
    impl Debug;
    /// CLKOUT output enable (FE)
    pub enabled, set_enabled: 7;
    /// CLKOUT frequency (FD1/FD0)
    pub from into ClkoutFrequency, frequency, set_frequency: 1, 0;
}
from_register_u8!(ClkoutControl);

bitfield! {
    /// Timer control register.
    #[derive(Clone, Copy, Default, PartialEq)]
    #[cfg_attr(feature = "defmt", derive(defmt::Format))]
    pub struct TimerControl(u8);
    impl Debug;
    /// Timer enable (TE)
    pub enabled, set_enabled: 7;
    /// Timer source clock (TD1/TD0): 4096 Hz, 64 Hz, 1 Hz, 1/60 Hz
    pub source, set_source: 1, 0;
}
from_register_u8!(TimerControl);

bitfield! {
    /// Timer countdown value register.
    #[derive(Clone, Copy, Default, PartialEq)]
    #[cfg_attr(feature = "defmt", derive(defmt::Format))]
    pub struct Timer(u8);
    impl Debug;
    /// Countdown value
    pub value, set_value: 7, 0;
}
from_register_u8!(Timer);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bcd_roundtrip_all_values() {
        for v in 0..=99u8 {
            assert_eq!(bcd_to_integer(integer_to_bcd(v)), v, "value {}", v);
        }
    }

    #[test]
    fn test_bcd_nibble_layout() {
        assert_eq!(integer_to_bcd(0), 0x00);
        assert_eq!(integer_to_bcd(9), 0x09);
        assert_eq!(integer_to_bcd(10), 0x10);
        assert_eq!(integer_to_bcd(59), 0x59);
        assert_eq!(integer_to_bcd(99), 0x99);
        assert_eq!(bcd_to_integer(0x47), 47);
    }

    #[test]
    fn test_clkout_frequency_conversions() {
        assert_eq!(ClkoutFrequency::from(0b00), ClkoutFrequency::Hz32768);
        assert_eq!(ClkoutFrequency::from(0b01), ClkoutFrequency::Hz1024);
        assert_eq!(ClkoutFrequency::from(0b10), ClkoutFrequency::Hz32);
        assert_eq!(ClkoutFrequency::from(0b11), ClkoutFrequency::Hz1);
        assert_eq!(u8::from(ClkoutFrequency::Hz1), 0b11);
    }

    #[test]
    #[should_panic(expected = "Invalid value for ClkoutFrequency: 4")]
    fn test_invalid_clkout_frequency_conversion() {
        let _ = ClkoutFrequency::from(4);
    }

    #[test]
    #[should_panic(expected = "Invalid value for InterruptMode: 2")]
    fn test_invalid_interrupt_mode_conversion() {
        let _ = InterruptMode::from(2);
    }

    #[test]
    fn test_seconds_register_masks_low_voltage_flag() {
        let seconds = Seconds::from(0xD9); // VL set, 59 seconds
        assert!(seconds.low_voltage());
        assert_eq!(seconds.bcd(), 0x59);
        assert_eq!(bcd_to_integer(seconds.bcd()), 59);

        let mut seconds = Seconds::from(0x80);
        assert!(seconds.low_voltage());
        assert_eq!(seconds.bcd(), 0);
        seconds.set_low_voltage(false);
        assert_eq!(u8::from(seconds), 0x00);
    }

    #[test]
    fn test_value_register_widths() {
        // Bits above each field's width are not part of the value.
        assert_eq!(Minutes::from(0xFF).bcd(), 0x7F);
        assert_eq!(Hours::from(0xFF).bcd(), 0x3F);
        assert_eq!(Days::from(0xFF).bcd(), 0x3F);
        assert_eq!(Weekdays::from(0xFF).weekday(), 0x07);
        assert_eq!(Years::from(0x99).bcd(), 0x99);
    }

    #[test]
    fn test_century_months_register() {
        let month = CenturyMonths::from(0x92); // century, December
        assert!(month.century());
        assert_eq!(bcd_to_integer(month.bcd()), 12);

        let mut month = CenturyMonths::default();
        month.set_bcd(integer_to_bcd(7));
        assert!(!month.century());
        assert_eq!(u8::from(month), 0x07);
    }

    #[test]
    fn test_control2_bits() {
        let mut control = Control2::default();
        control.set_timer_interrupt_enable(true);
        assert_eq!(u8::from(control), 0x01);
        control.set_alarm_interrupt_enable(true);
        assert_eq!(u8::from(control), 0x03);
        control.set_alarm_flag(true);
        assert_eq!(u8::from(control), 0x0B);
        control.set_timer_flag(true);
        assert_eq!(u8::from(control), 0x0F);
        control.set_interrupt_mode(InterruptMode::Pulse);
        assert_eq!(u8::from(control), 0x1F);

        let control = Control2::from(0x0A);
        assert!(control.alarm_flag());
        assert!(control.alarm_interrupt_enable());
        assert!(!control.timer_interrupt_enable());
        assert_eq!(control.interrupt_mode(), InterruptMode::Level);
    }

    #[test]
    fn test_control1_bits() {
        let control = Control1::from(0x20);
        assert!(control.stop());
        assert!(!control.test1());
        assert!(!control.testc());
    }

    #[test]
    fn test_alarm_register_disable_bit() {
        let mut minute = AlarmMinute::default();
        minute.set_bcd(integer_to_bcd(45));
        assert_eq!(u8::from(minute), 0x45);
        minute.set_disabled(true);
        assert_eq!(u8::from(minute), 0xC5);
        assert_eq!(minute.bcd(), 0x45);

        let hour = AlarmHour::from(0x97);
        assert!(hour.disabled());
        assert_eq!(bcd_to_integer(hour.bcd()), 17);

        let day = AlarmDay::from(0x31);
        assert!(!day.disabled());
        assert_eq!(bcd_to_integer(day.bcd()), 31);

        let weekday = AlarmWeekday::from(0x86);
        assert!(weekday.disabled());
        assert_eq!(weekday.weekday(), 6);
    }

    #[test]
    fn test_clkout_and_timer_control() {
        let mut clkout = ClkoutControl::default();
        clkout.set_enabled(true);
        clkout.set_frequency(ClkoutFrequency::Hz1);
        assert_eq!(u8::from(clkout), 0x83);
        assert_eq!(ClkoutControl::from(0x81).frequency(), ClkoutFrequency::Hz1024);

        let timer = TimerControl::from(0x82);
        assert!(timer.enabled());
        assert_eq!(timer.source(), 2);
        assert_eq!(Timer::from(0x3C).value(), 60);
    }
}
