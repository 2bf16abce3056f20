//! Configuration for the response tracker.

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TrackerConfig {
    /// Substring a URL must contain to be considered relevant.
    pub api_host: String,
    /// Maximum number of retained response entries; oldest evicted first.
    pub max_responses: usize,
    /// Capture and parse JSON payloads into stored entries.
    pub capture_body: bool,
    /// Restrict relevance to requests initiated as xhr/fetch.
    pub api_resource_types_only: bool,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            api_host: "fakestoreapi.com".to_string(),
            max_responses: 1000,
            capture_body: true,
            api_resource_types_only: false,
        }
    }
}

impl TrackerConfig {
    pub fn for_host(host: impl Into<String>) -> Self {
        Self {
            api_host: host.into(),
            ..Self::default()
        }
    }
}
