// SPDX-License-Identifier: MIT OR Apache-2.0
//! Error types for the timeline engine.

use thiserror::Error;

/// Errors raised while loading, validating or driving a timeline
#[derive(Debug, Error)]
pub enum TimelineError {
    /// Reading a timeline document failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A timeline document could not be parsed
    #[error("Failed to parse timeline: {0}")]
    Parse(#[from] ron::error::SpannedError),

    /// An entry resolved to a negative start time under the `Reject` policy
    #[error("Entry {index} starts at {time}s, before the timeline origin")]
    NegativeStart {
        /// Index of the entry in the sequence
        index: usize,
        /// The resolved (negative) start time
        time: f64,
    },

    /// An entry has no target id
    #[error("Entry {index} has an empty target id")]
    EmptyTargetId {
        /// Index of the entry in the sequence
        index: usize,
    },

    /// An entry declares a negative or non-finite duration
    #[error("Entry {index} has an invalid duration: {value}")]
    InvalidDuration {
        /// Index of the entry in the sequence
        index: usize,
        /// The offending value
        value: f64,
    },

    /// An entry declares a negative or non-finite delay or stagger
    #[error("Entry {index} has an invalid {field}: {value}")]
    InvalidTiming {
        /// Index of the entry in the sequence
        index: usize,
        /// Name of the offending field
        field: &'static str,
        /// The offending value
        value: f64,
    },

    /// The timeline start delay is negative or non-finite
    #[error("Timeline delay must be a finite, non-negative number of seconds, got {0}")]
    InvalidDelay(f64),

    /// A visibility threshold outside `[0, 1]`
    #[error("Visibility threshold must be within [0, 1], got {0}")]
    InvalidThreshold(f64),

    /// A handle does not support a state the engine will command
    #[error("Target {id} does not support state {state:?}")]
    MissingCapability {
        /// Target id that failed registration
        id: String,
        /// The unsupported state name
        state: String,
    },

    /// The frame driver is no longer running
    #[error("Timeline driver has shut down")]
    DriverClosed,
}

/// Result type for timeline operations
pub type Result<T> = std::result::Result<T, TimelineError>;
