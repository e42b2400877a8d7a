//! Configuration type definitions

use heapless::String;
use serde::{Deserialize, Serialize};

use crate::chain::{INPUT_COUNT, OUTPUT_COUNT};

/// Maximum server host name length
pub const MAX_HOST_LEN: usize = 64;

/// Largest chunk read per update step
pub const MAX_CHUNK_SIZE: usize = 1024;

/// Widest supported module record
pub const MAX_OUTPUTS_PER_MODULE: u8 = 32;

/// Bits per module on the shift-register chain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ChainGeometry {
    /// Output bits shifted out per module
    pub outputs_per_module: u8,
    /// Leading bits also sampled as inputs
    pub inputs_per_module: u8,
}

impl Default for ChainGeometry {
    fn default() -> Self {
        Self {
            outputs_per_module: OUTPUT_COUNT,
            inputs_per_module: INPUT_COUNT,
        }
    }
}

impl ChainGeometry {
    /// Check that the geometry fits a module record
    pub fn is_valid(&self) -> bool {
        (1..=MAX_OUTPUTS_PER_MODULE).contains(&self.outputs_per_module)
            && self.inputs_per_module <= self.outputs_per_module
            && self.inputs_per_module <= INPUT_COUNT
    }

    /// Shift clocks needed for `modules` modules
    pub fn bits_for(&self, modules: u8) -> u32 {
        modules as u32 * self.outputs_per_module as u32
    }
}

/// Reconnect policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RetryPolicy {
    /// Failed attempts tolerated before a restart is requested
    pub max_retries: u8,
    /// Wait between attempts
    pub backoff_ms: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            backoff_ms: 5000,
        }
    }
}

/// Complete node configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeConfig {
    /// Control server host
    pub server_host: String<MAX_HOST_LEN>,
    /// Control server port
    pub server_port: u16,
    /// Address byte sent right after connecting
    pub node_address: u8,
    /// Fixed module count, or `None` to probe the chain at boot
    pub module_count: Option<u8>,
    /// Chain bit layout
    pub geometry: ChainGeometry,
    /// Reconnect policy
    pub retry: RetryPolicy,
    /// Wait after acknowledging a received image, before restarting
    pub restart_delay_ms: u32,
    /// Wait after installing an image at boot, before restarting
    pub install_restart_delay_ms: u32,
    /// Bytes read per update step
    pub chunk_size: u16,
}

impl Default for NodeConfig {
    fn default() -> Self {
        let mut server_host = String::new();
        let _ = server_host.push_str("10.0.0.12");

        Self {
            server_host,
            server_port: 4444,
            node_address: 64,
            module_count: None,
            geometry: ChainGeometry::default(),
            retry: RetryPolicy::default(),
            restart_delay_ms: 5000,
            install_restart_delay_ms: 3000,
            chunk_size: MAX_CHUNK_SIZE as u16,
        }
    }
}

impl NodeConfig {
    /// Check for settings the node cannot run with
    pub fn validate(&self) -> bool {
        self.geometry.is_valid()
            && !self.server_host.is_empty()
            && self.chunk_size > 0
            && self
                .module_count
                .map_or(true, |n| (1..=phonebox_protocol::MAX_IO_MODULES as u8).contains(&n))
    }

    /// Chunk size clamped to the update buffer
    pub fn chunk_len(&self) -> usize {
        (self.chunk_size as usize).clamp(1, MAX_CHUNK_SIZE)
    }
}
