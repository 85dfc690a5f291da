//! Configuration for file-backed block streams

use std::path::PathBuf;

use crate::config::{DEFAULT_BLOCK_SIZE, DEFAULT_HEADER_SIZE};
use crate::error::{Result, VoltcapError};

/// Configuration for opening a captured file as a block stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamConfig {
    /// Path of the captured file
    pub path: PathBuf,
    /// Maximum bytes per block for copying loaders
    pub block_size: usize,
    /// Bytes read before `HDR_SIZE` is known
    pub header_size_hint: usize,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::new(),
            block_size: DEFAULT_BLOCK_SIZE,
            header_size_hint: DEFAULT_HEADER_SIZE,
        }
    }
}

impl StreamConfig {
    /// Create a configuration for the given file
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ..Default::default()
        }
    }

    /// Set the loader block size
    pub fn with_block_size(mut self, block_size: usize) -> Self {
        self.block_size = block_size;
        self
    }

    /// Set the initial header read size
    pub fn with_header_size_hint(mut self, hint: usize) -> Self {
        self.header_size_hint = hint;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.path.as_os_str().is_empty() {
            return Err(VoltcapError::validation("path", "Stream path cannot be empty"));
        }

        if self.block_size == 0 {
            return Err(VoltcapError::validation("block_size", "Block size must be greater than 0"));
        }

        if self.header_size_hint == 0 {
            return Err(VoltcapError::validation(
                "header_size_hint",
                "Header size hint must be greater than 0",
            ));
        }

        Ok(())
    }
}
