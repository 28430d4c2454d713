use serde::{Deserialize, Serialize};

use crate::domain::service::ServiceConfig;

/// `modules.chat` configuration section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ChatConfig {
    /// Longest accepted message, in characters.
    #[serde(default = "default_max_message_length")]
    pub max_message_length: usize,
    /// Per-connection queue of pushed frames; a full queue drops frames.
    #[serde(default = "default_subscriber_buffer")]
    pub subscriber_buffer: usize,
    /// Period of the client-side polling fallback.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    #[serde(default = "default_sse_keepalive_secs")]
    pub sse_keepalive_secs: u64,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            max_message_length: default_max_message_length(),
            subscriber_buffer: default_subscriber_buffer(),
            poll_interval_ms: default_poll_interval_ms(),
            sse_keepalive_secs: default_sse_keepalive_secs(),
        }
    }
}

impl ChatConfig {
    pub fn service_config(&self) -> ServiceConfig {
        ServiceConfig {
            max_message_length: self.max_message_length,
        }
    }
}

fn default_max_message_length() -> usize {
    2000
}

fn default_subscriber_buffer() -> usize {
    64
}

fn default_poll_interval_ms() -> u64 {
    3000
}

fn default_sse_keepalive_secs() -> u64 {
    15
}
