//! Tunable knobs for the dispatch core (C12): worker threads per device
//! and the work-queue depth ceiling used to simulate resource exhaustion.

use serde::Deserialize;
use snafu::ResultExt;

use crate::core::{self, CoreError};

fn default_workers_per_device() -> usize {
    1
}

fn default_queue_depth() -> usize {
    128
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default = "default_workers_per_device")]
    pub workers_per_device: usize,
    #[serde(default = "default_queue_depth")]
    pub queue_depth: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            workers_per_device: default_workers_per_device(),
            queue_depth: default_queue_depth(),
        }
    }
}

impl Config {
    pub fn from_yaml(input: &str) -> Result<Self, CoreError> {
        let config: Config = serde_yaml::from_str(input).context(core::ConfigParse)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        snafu::ensure!(
            self.queue_depth > 0,
            core::InvalidQueueDepth {
                depth: self.queue_depth,
            }
        );
        Ok(())
    }
}
