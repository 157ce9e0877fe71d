// SPDX-License-Identifier: MIT OR Apache-2.0
//! Orchestrator settings.

use crate::sequencer::SequencerOptions;
use crate::timing::NegativeStartPolicy;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Refresh rate the frame driver samples at, in Hz
pub const DEFAULT_REFRESH_RATE: u32 = 60;

/// Engine-wide settings shared by every timeline of a host
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrchestratorSettings {
    /// State targets are told to transition to
    pub enter_state: String,
    /// State targets are set to on reset and between loop iterations
    pub baseline_state: String,
    /// Hold the walk until each transition reports completion
    pub await_completion: bool,
    /// Handling of entries that resolve before time zero
    pub negative_start: NegativeStartPolicy,
    /// Reject handles that do not support the enter and baseline states
    pub require_capabilities: bool,
    /// Samples per second taken by the frame driver
    pub refresh_rate: u32,
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        Self {
            enter_state: "visible".to_string(),
            baseline_state: "hidden".to_string(),
            await_completion: true,
            negative_start: NegativeStartPolicy::Allow,
            require_capabilities: true,
            refresh_rate: DEFAULT_REFRESH_RATE,
        }
    }
}

impl OrchestratorSettings {
    /// Interval between two driver samples
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / f64::from(self.refresh_rate.max(1)))
    }

    /// States a handle must support to be registered
    pub fn required_states(&self) -> Vec<String> {
        if self.require_capabilities {
            vec![self.enter_state.clone(), self.baseline_state.clone()]
        } else {
            Vec::new()
        }
    }

    pub(crate) fn sequencer_options(&self) -> SequencerOptions {
        SequencerOptions {
            enter_state: self.enter_state.clone(),
            await_completion: self.await_completion,
        }
    }
}
