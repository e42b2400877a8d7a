//! I/O module chain trait

use phonebox_protocol::ModuleRecord;

/// A chain of cascaded I/O modules driven as one shift sequence
pub trait IoChain {
    /// Number of modules connected
    ///
    /// Determined once at startup and reported back to the server in
    /// every frame reply.
    fn module_count(&self) -> u8;

    /// Run one scan-and-drive cycle
    ///
    /// Drives `outputs` of the first [`IoChain::module_count`] records and
    /// replaces their `inputs` with freshly sampled values. Records past the
    /// chain length are left untouched.
    fn transfer(&mut self, records: &mut [ModuleRecord]);
}
