//! Shift-register module chain
//!
//! Each module holds `outputs_per_module` serial-in/parallel-out output
//! stages and, for its first `inputs_per_module` bits, parallel-in/serial-out
//! input stages clocked by the same shift clock.
//!
//! One transfer cycle:
//!
//! ```text
//! LOAD   ‾‾‾\___________/‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾
//! LATCH  ________/‾\___________________________/‾\____
//! SHIFT  _____________________/‾\__/‾\ ... /‾\________
//! DOUT   ====================< b0 >< b1 > ... < bN >==
//! ```
//!
//! Inputs are sampled on data-in before each shift pulse. Outputs appear
//! on the module pins only at the final latch.

use embedded_hal::delay::DelayNs;
use phonebox_core::chain::{ChargeEvent, ModuleChainState, INPUT_COUNT};
use phonebox_core::config::ChainGeometry;
use phonebox_core::traits::IoChain;
use phonebox_hal::{InputPin, OutputPin};
use phonebox_protocol::{ModuleRecord, MAX_IO_MODULES};

/// Settling time around every clock edge (1 ms)
pub const CLOCK_DELAY_US: u32 = 1000;

/// Control lines of the chain
pub struct ChainPins<DO, SC, LC, LD, DI> {
    /// Serial data to the first module
    pub data_out: DO,
    /// Shift clock
    pub shift_clock: SC,
    /// Storage latch clock
    pub latch_clock: LC,
    /// Parallel load, active low
    pub load: LD,
    /// Serial data from the last module
    pub data_in: DI,
}

/// Shift-register I/O module chain
pub struct ShiftRegisterChain<DO, SC, LC, LD, DI, D> {
    pins: ChainPins<DO, SC, LC, LD, DI>,
    delay: D,
    geometry: ChainGeometry,
    state: ModuleChainState,
}

impl<DO, SC, LC, LD, DI, D> ShiftRegisterChain<DO, SC, LC, LD, DI, D>
where
    DO: OutputPin,
    SC: OutputPin,
    LC: OutputPin,
    LD: OutputPin,
    DI: InputPin,
    D: DelayNs,
{
    /// Create a chain of `module_count` modules
    ///
    /// Lines start idle: clocks and data low, load high.
    pub fn new(
        mut pins: ChainPins<DO, SC, LC, LD, DI>,
        delay: D,
        geometry: ChainGeometry,
        module_count: u8,
    ) -> Self {
        pins.data_out.set_low();
        pins.shift_clock.set_low();
        pins.latch_clock.set_low();
        pins.load.set_high();

        let module_count = module_count.min(MAX_IO_MODULES as u8);
        Self {
            pins,
            delay,
            geometry,
            state: ModuleChainState::new(module_count, geometry.inputs_per_module),
        }
    }

    /// Settle the module count at startup
    ///
    /// A configured count wins. Otherwise the chain is probed, and a chain
    /// that cannot be probed is assumed to hold one module.
    pub fn detect_modules(&mut self, configured: Option<u8>) -> u8 {
        let count = configured
            .or_else(|| self.probe_module_count())
            .unwrap_or(1);
        self.set_module_count(count);
        self.module_count()
    }

    /// Change the module count, discarding input history
    pub fn set_module_count(&mut self, count: u8) {
        let count = count.min(MAX_IO_MODULES as u8);
        self.state = ModuleChainState::new(count, self.geometry.inputs_per_module);
    }

    /// Count the modules by looping a marker bit through the chain
    ///
    /// Zeros are clocked through the longest possible chain, then a single
    /// high bit. The number of shift clocks until it reappears on data-in
    /// is the chain length in bits. Returns `None` if the marker never
    /// comes back or the length is not a whole number of modules.
    ///
    /// Outputs are not latched, so module pins keep their state.
    pub fn probe_module_count(&mut self) -> Option<u8> {
        let max_bits = self.geometry.bits_for(MAX_IO_MODULES as u8);

        self.pins.data_out.set_low();
        for _ in 0..max_bits {
            self.shift();
        }

        self.pins.data_out.set_high();
        self.shift();
        self.pins.data_out.set_low();

        let per_module = self.geometry.outputs_per_module as u32;
        for clocks in 1..=max_bits {
            if self.pins.data_in.is_high() {
                return (clocks % per_module == 0).then(|| (clocks / per_module) as u8);
            }
            self.shift();
        }
        None
    }

    /// Scan all inputs into the charge detector
    ///
    /// Walks the same `outputs_per_module` bits per module as
    /// [`IoChain::transfer`]; input `bit` of `module` is tracked at index
    /// `module * inputs_per_module + bit`. Outputs are not latched. Returns
    /// how many inputs were demoted from charged back to charging.
    pub fn load_inputs(&mut self, now_ms: u32) -> usize {
        self.shift_load();

        let outputs = self.geometry.outputs_per_module as usize;
        let inputs = self.geometry.inputs_per_module.min(INPUT_COUNT) as usize;

        let mut demoted = 0;
        for module in 0..self.module_count() as usize {
            for bit in 0..outputs {
                if bit < inputs {
                    let level = self.pins.data_in.is_high();
                    let index = module * inputs + bit;
                    if self.state.observe(index, level, now_ms) == Some(ChargeEvent::Demoted) {
                        demoted += 1;
                    }
                }
                self.shift();
            }
        }
        demoted
    }

    /// Input state tracked by the charge detector
    pub fn state(&self) -> &ModuleChainState {
        &self.state
    }

    /// Bit layout in use
    pub fn geometry(&self) -> ChainGeometry {
        self.geometry
    }

    /// Release the pins and delay
    pub fn release(self) -> (ChainPins<DO, SC, LC, LD, DI>, D) {
        (self.pins, self.delay)
    }

    /// Copy module inputs into the shift stages
    fn shift_load(&mut self) {
        self.pins.load.set_low();
        self.delay.delay_us(CLOCK_DELAY_US);
        self.latch();
        self.delay.delay_us(CLOCK_DELAY_US);
        self.pins.load.set_high();
    }

    fn shift(&mut self) {
        self.delay.delay_us(CLOCK_DELAY_US);
        self.pins.shift_clock.pulse();
        self.delay.delay_us(CLOCK_DELAY_US);
    }

    fn latch(&mut self) {
        self.delay.delay_us(CLOCK_DELAY_US);
        self.pins.latch_clock.pulse();
        self.delay.delay_us(CLOCK_DELAY_US);
    }
}

impl<DO, SC, LC, LD, DI, D> IoChain for ShiftRegisterChain<DO, SC, LC, LD, DI, D>
where
    DO: OutputPin,
    SC: OutputPin,
    LC: OutputPin,
    LD: OutputPin,
    DI: InputPin,
    D: DelayNs,
{
    fn module_count(&self) -> u8 {
        self.state.module_count()
    }

    fn transfer(&mut self, records: &mut [ModuleRecord]) {
        self.shift_load();

        let count = (self.module_count() as usize).min(records.len());
        let outputs = self.geometry.outputs_per_module;
        let inputs = self.geometry.inputs_per_module;

        for record in records.iter_mut().take(count) {
            record.inputs = 0;
            for bit in 0..outputs {
                self.pins.data_out.set_state(record.output(bit));
                if bit < inputs && self.pins.data_in.is_high() {
                    record.set_input(bit);
                }
                self.shift();
            }
        }

        self.latch();
    }
}
