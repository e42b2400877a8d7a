//! Annunciator outputs

/// Buzzer, alarm light and status LED
pub trait Indicators {
    /// Turn the buzzer on or off
    fn set_buzzer(&mut self, on: bool);

    /// Turn the alarm light on or off
    fn set_alarm(&mut self, on: bool);

    /// Toggle the status LED (download activity)
    fn toggle_status(&mut self);
}
