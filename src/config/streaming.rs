//! Streaming limits configuration

use serde::Deserialize;
use std::time::Duration;

use crate::application::StreamLimits;

use super::error::ValidationError;

/// Per-connection and per-request streaming limits
#[derive(Debug, Clone, Deserialize)]
pub struct StreamingConfig {
    /// Upper bound on one request, in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Upper bound on the gap between two handler events, in seconds
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_secs: u64,

    /// Frames queued per connection before handlers are slowed down
    #[serde(default = "default_outbound_buffer")]
    pub outbound_buffer: usize,
}

impl StreamingConfig {
    pub fn limits(&self) -> StreamLimits {
        StreamLimits {
            request_timeout: Duration::from_secs(self.request_timeout_secs),
            idle_timeout: Duration::from_secs(self.idle_timeout_secs),
        }
    }

    /// Validate streaming configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.request_timeout_secs == 0 {
            return Err(ValidationError::InvalidTimeout("request_timeout_secs"));
        }
        if self.idle_timeout_secs == 0 || self.idle_timeout_secs > self.request_timeout_secs {
            return Err(ValidationError::InvalidTimeout("idle_timeout_secs"));
        }
        if self.outbound_buffer == 0 || self.outbound_buffer > 4096 {
            return Err(ValidationError::InvalidBufferSize);
        }
        Ok(())
    }
}

impl Default for StreamingConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: default_request_timeout(),
            idle_timeout_secs: default_idle_timeout(),
            outbound_buffer: default_outbound_buffer(),
        }
    }
}

fn default_request_timeout() -> u64 {
    300
}

fn default_idle_timeout() -> u64 {
    60
}

fn default_outbound_buffer() -> usize {
    64
}
