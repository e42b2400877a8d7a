//! Debounced charge detection
//!
//! Some inputs are fed from a charging circuit that toggles while
//! charging. An input counts as charged once it has changed level
//! `CHARGE_DETECT` times. If a charged input then changes again after a
//! gap of `CHARGE_TIMEOUT_MS` or more, it is demoted back to charging and
//! counting starts over.

use super::{CHARGE_DETECT, CHARGE_TIMEOUT_MS, INPUT_COUNT, MAX_CHAIN_INPUTS};

/// Result of observing a level change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ChargeEvent {
    /// Change counted towards the charged threshold
    Counted,
    /// Charged input fell back to charging
    Demoted,
}

/// Input state of the whole chain
#[derive(Debug, Clone)]
pub struct ModuleChainState {
    module_count: u8,
    inputs_per_module: u8,
    levels: [bool; MAX_CHAIN_INPUTS],
    changes: [u8; MAX_CHAIN_INPUTS],
    last_change_ms: [Option<u32>; MAX_CHAIN_INPUTS],
}

impl ModuleChainState {
    /// Create state for `module_count` modules
    ///
    /// `inputs_per_module` is capped at `INPUT_COUNT`.
    pub fn new(module_count: u8, inputs_per_module: u8) -> Self {
        Self {
            module_count,
            inputs_per_module: inputs_per_module.min(INPUT_COUNT),
            levels: [false; MAX_CHAIN_INPUTS],
            changes: [0; MAX_CHAIN_INPUTS],
            last_change_ms: [None; MAX_CHAIN_INPUTS],
        }
    }

    /// Number of modules in the chain
    pub fn module_count(&self) -> u8 {
        self.module_count
    }

    /// Number of inputs tracked
    pub fn input_count(&self) -> usize {
        (self.module_count as usize * self.inputs_per_module as usize).min(MAX_CHAIN_INPUTS)
    }

    /// Last observed level of input `index`
    pub fn level(&self, index: usize) -> bool {
        self.levels.get(index).copied().unwrap_or(false)
    }

    /// Level changes counted for input `index`
    pub fn change_count(&self, index: usize) -> u8 {
        self.changes.get(index).copied().unwrap_or(0)
    }

    /// Check if input `index` has reached the charged threshold
    pub fn is_charged(&self, index: usize) -> bool {
        self.change_count(index) == CHARGE_DETECT
    }

    /// Record a sample of input `index` taken at `now_ms`
    ///
    /// Returns what the change meant, or `None` if the level is unchanged,
    /// the index is out of range, or a charged input changed again within
    /// the timeout.
    pub fn observe(&mut self, index: usize, level: bool, now_ms: u32) -> Option<ChargeEvent> {
        if index >= self.input_count() {
            return None;
        }

        let previous = core::mem::replace(&mut self.levels[index], level);
        if previous == level {
            return None;
        }

        let changes = self.changes[index];
        let last = self.last_change_ms[index];
        let elapsed = last.map(|t| now_ms.wrapping_sub(t));

        match elapsed {
            Some(gap) if gap >= CHARGE_TIMEOUT_MS && changes == CHARGE_DETECT => {
                self.changes[index] = 0;
                Some(ChargeEvent::Demoted)
            }
            None => {
                self.count_change(index, now_ms);
                Some(ChargeEvent::Counted)
            }
            Some(_) if changes != CHARGE_DETECT => {
                self.count_change(index, now_ms);
                Some(ChargeEvent::Counted)
            }
            Some(_) => None,
        }
    }

    fn count_change(&mut self, index: usize, now_ms: u32) {
        self.last_change_ms[index] = Some(now_ms);
        self.changes[index] = self.changes[index].saturating_add(1);
    }
}
