use std::time::Duration;

use x11sim_protocol::{DEFAULT_MAX_REPLY_BYTES, PROTOCOL_MAJOR_VERSION};

#[derive(Debug, Clone)]
pub struct SimulatorConfig {
    pub protocol_major: u16,
    pub reply_timeout: Duration,
    pub max_reply_bytes: usize,
    /// How long `finish` keeps the channel open after the last request.
    pub idle_period: Duration,
    pub root_window: u32,
    pub root_depth: u8,
    pub root_visual: u32,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            protocol_major: PROTOCOL_MAJOR_VERSION,
            reply_timeout: Duration::from_secs(5),
            max_reply_bytes: DEFAULT_MAX_REPLY_BYTES,
            idle_period: Duration::from_millis(500),
            root_window: 0x0000_0100,
            root_depth: 24,
            root_visual: 0x0000_0021,
        }
    }
}
