//! Session configuration.
//!
//! Every field has a default, so a JSON document only needs the fields it
//! changes:
//!
//! ```
//! use transpose_client::config::SessionConfig;
//! use transpose_client::protocol::PhaseSet;
//!
//! let config = SessionConfig::from_json_str(r#"{ "phase_set": "with_ready" }"#).unwrap();
//! assert_eq!(config.phase_set, PhaseSet::WithReady);
//! assert_eq!(config.receive_buffer_size, 1500);
//! ```

use serde::Deserialize;

use crate::error::{ClientError, Result};
use crate::protocol::{PhaseSet, TypeTag, DEFAULT_RECEIVE_BUFFER_SIZE, MIN_RECEIVE_BUFFER_SIZE};

/// Default address of the remote service.
pub const DEFAULT_ADDRESS: &str = "127.0.0.1:3333";

/// Thread count sent when the caller gives none; 0 lets the service decide.
pub const DEFAULT_THREAD_COUNT: u8 = 0;

/// Settings owned by one session.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// `host:port` of the remote service.
    pub address: String,
    /// Size of the single-read buffer.
    pub receive_buffer_size: usize,
    /// What the send_data type byte carries.
    pub type_tag: TypeTag,
    /// Phase numbering used by the service.
    pub phase_set: PhaseSet,
    /// Thread count for start_calculation when none is given.
    pub default_thread_count: u8,
}

impl SessionConfig {
    /// Parse a JSON document and validate it.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check values serde cannot check.
    ///
    /// Fails with `InvalidConfig`, which classifies as [`ErrorClass::Config`].
    ///
    /// [`ErrorClass::Config`]: crate::error::ErrorClass::Config
    pub fn validate(&self) -> Result<()> {
        if self.receive_buffer_size < MIN_RECEIVE_BUFFER_SIZE {
            return Err(ClientError::InvalidConfig(format!(
                "receive_buffer_size must be at least {}, got {}",
                MIN_RECEIVE_BUFFER_SIZE, self.receive_buffer_size
            )));
        }
        Ok(())
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            address: DEFAULT_ADDRESS.to_string(),
            receive_buffer_size: DEFAULT_RECEIVE_BUFFER_SIZE,
            type_tag: TypeTag::default(),
            phase_set: PhaseSet::default(),
            default_thread_count: DEFAULT_THREAD_COUNT,
        }
    }
}
