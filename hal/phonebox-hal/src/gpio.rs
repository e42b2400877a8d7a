//! GPIO pin abstractions
//!
//! Digital lines used by the node: the shift-register control lines,
//! the buzzer and alarm light outputs and the status LED.

/// Digital output pin
///
/// Implementations drive the physical line for the specific chip.
pub trait OutputPin {
    /// Drive the line high (logic 1)
    fn set_high(&mut self);

    /// Drive the line low (logic 0)
    fn set_low(&mut self);

    /// Drive the line to a specific level
    fn set_state(&mut self, high: bool) {
        if high {
            self.set_high();
        } else {
            self.set_low();
        }
    }

    /// Check if the line is currently driven high
    fn is_set_high(&self) -> bool;

    /// Check if the line is currently driven low
    fn is_set_low(&self) -> bool {
        !self.is_set_high()
    }

    /// Invert the current level
    fn toggle(&mut self) {
        if self.is_set_high() {
            self.set_low();
        } else {
            self.set_high();
        }
    }

    /// Emit a single high-then-low pulse
    ///
    /// Used for clock lines. The pulse width is whatever the pin write
    /// latency gives; callers add settling delays around it.
    fn pulse(&mut self) {
        self.set_high();
        self.set_low();
    }
}

/// Digital input pin
pub trait InputPin {
    /// Check if the line reads high (logic 1)
    fn is_high(&self) -> bool;

    /// Check if the line reads low (logic 0)
    fn is_low(&self) -> bool {
        !self.is_high()
    }
}
