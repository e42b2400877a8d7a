//! GPIO indicator outputs
//!
//! Buzzer, alarm light and status LED each on their own pin, driven
//! directly or through a transistor.

use phonebox_core::traits::Indicators;
use phonebox_hal::OutputPin;

/// Indicators on three GPIO pins
///
/// The buzzer and alarm light can be active-low for sinking drivers.
pub struct PinIndicators<B, L, S> {
    buzzer: B,
    alarm: L,
    status: S,
    /// If true, buzzer and alarm ON = pin LOW
    inverted: bool,
    buzzer_on: bool,
    alarm_on: bool,
}

impl<B: OutputPin, L: OutputPin, S: OutputPin> PinIndicators<B, L, S> {
    /// Create indicators, all off
    pub fn new(buzzer: B, alarm: L, status: S, inverted: bool) -> Self {
        let mut indicators = Self {
            buzzer,
            alarm,
            status,
            inverted,
            buzzer_on: false,
            alarm_on: false,
        };
        indicators.set_buzzer(false);
        indicators.set_alarm(false);
        indicators.status.set_low();
        indicators
    }

    /// Create indicators with active-high outputs
    pub fn new_active_high(buzzer: B, alarm: L, status: S) -> Self {
        Self::new(buzzer, alarm, status, false)
    }

    /// Check if the buzzer is on
    pub fn buzzer_on(&self) -> bool {
        self.buzzer_on
    }

    /// Check if the alarm light is on
    pub fn alarm_on(&self) -> bool {
        self.alarm_on
    }

    /// Check if the status LED is lit
    pub fn status_lit(&self) -> bool {
        self.status.is_set_high()
    }
}

impl<B: OutputPin, L: OutputPin, S: OutputPin> Indicators for PinIndicators<B, L, S> {
    fn set_buzzer(&mut self, on: bool) {
        self.buzzer_on = on;
        self.buzzer.set_state(on != self.inverted);
    }

    fn set_alarm(&mut self, on: bool) {
        self.alarm_on = on;
        self.alarm.set_state(on != self.inverted);
    }

    fn toggle_status(&mut self) {
        self.status.toggle();
    }
}
