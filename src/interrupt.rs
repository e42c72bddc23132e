//! Alarm interrupt delivery.
//!
//! The PCF8563 pulls its open-drain INT line low when the alarm matches and
//! keeps it low until the alarm flag is cleared. The host's GPIO layer is
//! expected to watch that line for a falling edge and call
//! `Pcf8563::on_alarm_interrupt` from its handler. [`AlarmInterrupt`] turns
//! those edges into at most one callback per arming of the alarm, so a line
//! that glitches or re-asserts before the alarm is silenced does not fire the
//! callback twice.

use embedded_hal::digital::InputPin;

/// Interrupt pin and callback bound by `configure_alarm`.
pub struct AlarmInterrupt<P> {
    pin: P,
    callback: fn(),
    armed: bool,
}

impl<P: InputPin> AlarmInterrupt<P> {
    /// Binds `pin` and `callback`. Starts disarmed.
    pub fn new(pin: P, callback: fn()) -> Self {
        Self {
            pin,
            callback,
            armed: false,
        }
    }

    /// Lets the next edge reach the callback.
    pub fn arm(&mut self) {
        self.armed = true;
    }

    /// Ignores edges until the next `arm`.
    pub fn disarm(&mut self) {
        self.armed = false;
    }

    /// `true` while an edge would reach the callback.
    #[must_use]
    pub fn is_armed(&self) -> bool {
        self.armed
    }

    /// Handles a falling edge on the interrupt line.
    ///
    /// Runs the callback and disarms if armed. The line level is not
    /// sampled. Returns whether the callback ran.
    pub fn on_falling_edge(&mut self) -> bool {
        if !self.armed {
            return false;
        }
        self.armed = false;
        (self.callback)();
        true
    }

    /// Gives back the pin.
    pub fn release(self) -> P {
        self.pin
    }
}
