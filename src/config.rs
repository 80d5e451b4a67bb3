//! Configuration for the API logging middleware.
//!
//! All types derive Serde traits so hosts can embed them in their own config
//! files or load them standalone from TOML.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Per-route settings for the `api_logging` middleware.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ApiLoggingConfig {
    /// Header names included in `request_data`. Empty = all request headers.
    pub header_keys: Vec<String>,

    /// Actions for which the request body is not logged.
    pub skip_request_data_actions: Vec<String>,

    /// Actions for which the response body is not logged.
    pub skip_response_data_actions: Vec<String>,

    /// Cap on buffered request/response bodies. Bodies over the cap are
    /// forwarded untouched and logged without data.
    pub max_body_bytes: usize,
}

impl Default for ApiLoggingConfig {
    fn default() -> Self {
        Self {
            header_keys: Vec::new(),
            skip_request_data_actions: Vec::new(),
            skip_response_data_actions: Vec::new(),
            max_body_bytes: 1024 * 1024,
        }
    }
}

impl ApiLoggingConfig {
    /// Load from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, Error> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }
}
