// SPDX-License-Identifier: MIT OR Apache-2.0
//! Start-time resolution and duration calculation.
//!
//! Both walk the sequence forward with a running cursor that always sits at
//! the end of the previous entry. Everything here is pure, so a consumer can
//! show the total duration before anything plays.

use crate::animation::DEFAULT_DURATION;
use crate::config::{StartAt, TimelineEntry};
use crate::error::{Result, TimelineError};
use serde::{Deserialize, Serialize};

/// What to do with an entry that resolves before the timeline origin
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum NegativeStartPolicy {
    /// Keep the negative time; the entry fires immediately
    #[default]
    Allow,
    /// Move the entry to time zero
    Clamp,
    /// Fail validation
    Reject,
}

/// Resolve a start reference against the running cursor
pub fn resolve(start_at: &StartAt, cursor: f64) -> f64 {
    match start_at {
        StartAt::Absolute(time) => *time,
        StartAt::Previous | StartAt::Unrecognized(_) => cursor,
        StartAt::After(offset) => cursor + offset,
        StartAt::Before(offset) => cursor - offset,
    }
}

/// Absolute placement of one entry
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedPoint {
    /// Start time in seconds
    pub start_time: f64,
    /// End time in seconds
    pub end_time: f64,
}

impl ResolvedPoint {
    /// Length of the entry
    pub fn duration(&self) -> f64 {
        self.end_time - self.start_time
    }
}

/// Every entry placed on the time axis, plus the total duration
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ResolvedTimeline {
    points: Vec<ResolvedPoint>,
    duration: f64,
}

impl ResolvedTimeline {
    /// Resolve a sequence under the given policy
    pub fn new(sequence: &[TimelineEntry], policy: NegativeStartPolicy) -> Result<Self> {
        let mut points = Vec::with_capacity(sequence.len());
        let mut cursor = 0.0_f64;
        let mut max_end = 0.0_f64;

        for (index, entry) in sequence.iter().enumerate() {
            let mut start_time = resolve(&entry.start_at, cursor);
            if start_time < 0.0 {
                match policy {
                    NegativeStartPolicy::Allow => {}
                    NegativeStartPolicy::Clamp => start_time = 0.0,
                    NegativeStartPolicy::Reject => {
                        return Err(TimelineError::NegativeStart { index, time: start_time });
                    }
                }
            }

            let end_time = start_time + entry_duration(entry);
            max_end = max_end.max(end_time);
            cursor = end_time;
            points.push(ResolvedPoint { start_time, end_time });
        }

        Ok(Self {
            points,
            duration: max_end.max(DEFAULT_DURATION),
        })
    }

    /// Resolved placement of each entry, in sequence order
    pub fn points(&self) -> &[ResolvedPoint] {
        &self.points
    }

    /// Placement of the entry at `index`
    pub fn point(&self, index: usize) -> Option<ResolvedPoint> {
        self.points.get(index).copied()
    }

    /// Total duration in seconds; never below the default entry duration
    pub fn duration(&self) -> f64 {
        self.duration
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Whether the timeline has no entries
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

fn entry_duration(entry: &TimelineEntry) -> f64 {
    let duration = entry.animation.duration;
    if duration.is_finite() && duration >= 0.0 {
        duration
    } else {
        DEFAULT_DURATION
    }
}

/// Total duration of a sequence with negative starts left as authored
pub fn compute_duration(sequence: &[TimelineEntry]) -> f64 {
    resolve_points(sequence)
        .iter()
        .map(|point| point.end_time)
        .fold(0.0, f64::max)
        .max(DEFAULT_DURATION)
}

/// Per-entry placements with negative starts left as authored
pub fn resolve_points(sequence: &[TimelineEntry]) -> Vec<ResolvedPoint> {
    let mut cursor = 0.0;
    sequence
        .iter()
        .map(|entry| {
            let start_time = resolve(&entry.start_at, cursor);
            let end_time = start_time + entry_duration(entry);
            cursor = end_time;
            ResolvedPoint { start_time, end_time }
        })
        .collect()
}
