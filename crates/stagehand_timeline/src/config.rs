// SPDX-License-Identifier: MIT OR Apache-2.0
//! Timeline definitions.
//!
//! A [`TimelineConfig`] is the immutable input of a play invocation: an
//! ordered list of [`TimelineEntry`] values plus trigger and loop settings.
//! Definitions are usually written in RON:
//!
//! ```ron
//! (
//!     name: "Landing",
//!     trigger: on_scroll,
//!     loop: 2,
//!     sequence: [
//!         (target: "hero", start_at: "previous", animation: (duration: 0.6)),
//!         (target: "sub", start_at: "+=0.2", animation: (duration: 0.4)),
//!     ],
//! )
//! ```

use crate::animation::{AnimationConfig, ScrollTrigger};
use crate::error::{Result, TimelineError};
use crate::timing::{NegativeStartPolicy, ResolvedTimeline};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use uuid::Uuid;

/// Unique identifier for a timeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimelineId(pub Uuid);

impl TimelineId {
    /// Create a new random timeline ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for TimelineId {
    fn default() -> Self {
        Self::new()
    }
}

/// Reference point an entry starts from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(from = "RawStartAt", into = "RawStartAt")]
pub enum StartAt {
    /// Absolute time in seconds from the timeline origin
    Absolute(f64),
    /// Right after the previous entry ends
    #[default]
    Previous,
    /// `"+=N"`: N seconds after the previous entry ends
    After(f64),
    /// `"-=N"`: N seconds before the previous entry ends
    Before(f64),
    /// Anything else; resolves like [`StartAt::Previous`]
    Unrecognized(String),
}

impl StartAt {
    /// Parse the textual form (`"previous"`, `"+=N"`, `"-=N"` or a number)
    pub fn parse(text: &str) -> Self {
        let trimmed = text.trim();
        if trimmed == "previous" {
            return Self::Previous;
        }
        if let Some(offset) = trimmed.strip_prefix("+=") {
            return parse_offset(offset).map_or_else(|| Self::Unrecognized(text.to_owned()), Self::After);
        }
        if let Some(offset) = trimmed.strip_prefix("-=") {
            return parse_offset(offset).map_or_else(|| Self::Unrecognized(text.to_owned()), Self::Before);
        }
        parse_offset(trimmed).map_or_else(|| Self::Unrecognized(text.to_owned()), Self::Absolute)
    }

    /// Whether the value was understood
    pub fn is_recognized(&self) -> bool {
        !matches!(self, Self::Unrecognized(_))
    }
}

fn parse_offset(text: &str) -> Option<f64> {
    text.trim().parse::<f64>().ok().filter(|value| value.is_finite())
}

impl fmt::Display for StartAt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Absolute(time) => write!(f, "{time}"),
            Self::Previous => f.write_str("previous"),
            Self::After(offset) => write!(f, "+={offset}"),
            Self::Before(offset) => write!(f, "-={offset}"),
            Self::Unrecognized(text) => f.write_str(text),
        }
    }
}

impl From<f64> for StartAt {
    fn from(time: f64) -> Self {
        Self::Absolute(time)
    }
}

impl From<&str> for StartAt {
    fn from(text: &str) -> Self {
        Self::parse(text)
    }
}

/// Wire form of [`StartAt`]: either a number or a string
#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum RawStartAt {
    Seconds(f64),
    Text(String),
}

impl From<RawStartAt> for StartAt {
    fn from(raw: RawStartAt) -> Self {
        match raw {
            RawStartAt::Seconds(time) => Self::Absolute(time),
            RawStartAt::Text(text) => Self::parse(&text),
        }
    }
}

impl From<StartAt> for RawStartAt {
    fn from(start_at: StartAt) -> Self {
        match start_at {
            StartAt::Absolute(time) => Self::Seconds(time),
            other => Self::Text(other.to_string()),
        }
    }
}

/// Event class that starts playback
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Trigger {
    /// Play as soon as the timeline is mounted
    #[default]
    OnLoad,
    /// Play when the container becomes visible
    OnScroll,
    /// Only play when told to
    OnClick,
}

impl Trigger {
    /// Get the display name
    pub fn name(&self) -> &'static str {
        match self {
            Self::OnLoad => "On Load",
            Self::OnScroll => "On Scroll",
            Self::OnClick => "On Click",
        }
    }
}

/// How many passes through the sequence to play
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(from = "RawLoopMode", into = "RawLoopMode")]
pub enum LoopMode {
    /// A single pass
    #[default]
    Once,
    /// A fixed number of passes
    Count(u32),
    /// Repeat until paused
    Infinite,
}

impl LoopMode {
    /// Total number of passes, or `None` when unbounded
    pub fn iterations(&self) -> Option<u32> {
        match self {
            Self::Once => Some(1),
            Self::Count(count) => Some((*count).max(1)),
            Self::Infinite => None,
        }
    }

    /// Whether another pass follows the one with the given zero-based index
    pub fn continues_after(&self, iteration: u32) -> bool {
        self.iterations().map_or(true, |total| iteration + 1 < total)
    }
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum RawLoopMode {
    Flag(bool),
    Count(u32),
}

impl From<RawLoopMode> for LoopMode {
    fn from(raw: RawLoopMode) -> Self {
        match raw {
            RawLoopMode::Flag(true) => Self::Infinite,
            RawLoopMode::Flag(false) | RawLoopMode::Count(0 | 1) => Self::Once,
            RawLoopMode::Count(count) => Self::Count(count),
        }
    }
}

impl From<LoopMode> for RawLoopMode {
    fn from(mode: LoopMode) -> Self {
        match mode {
            LoopMode::Once => Self::Flag(false),
            LoopMode::Count(count) => Self::Count(count),
            LoopMode::Infinite => Self::Flag(true),
        }
    }
}

/// One scheduled transition of a single target
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineEntry {
    /// Id the target registers under
    pub target: String,
    /// Optional human-readable label
    #[serde(default)]
    pub label: Option<String>,
    /// When the entry starts
    #[serde(default)]
    pub start_at: StartAt,
    /// Transition settings
    #[serde(default)]
    pub animation: AnimationConfig,
}

impl TimelineEntry {
    /// Create an entry that chains after the previous one
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            label: None,
            start_at: StartAt::Previous,
            animation: AnimationConfig::default(),
        }
    }

    /// Set the start reference
    pub fn at(mut self, start_at: impl Into<StartAt>) -> Self {
        self.start_at = start_at.into();
        self
    }

    /// Set the transition duration
    pub fn duration(mut self, duration: f64) -> Self {
        self.animation.duration = duration;
        self
    }

    /// Set the label
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Replace the animation settings
    pub fn animation(mut self, animation: AnimationConfig) -> Self {
        self.animation = animation;
        self
    }
}

/// An ordered collection of entries with trigger and loop settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimelineConfig {
    /// Unique timeline ID
    pub id: TimelineId,
    /// Timeline name
    pub name: String,
    /// Entries in dispatch order
    pub sequence: Vec<TimelineEntry>,
    /// What starts playback
    pub trigger: Trigger,
    /// Number of passes
    #[serde(rename = "loop")]
    pub loop_mode: LoopMode,
    /// Seconds to wait before an autonomous trigger plays
    pub delay: f64,
    /// Whether `OnLoad` plays without an explicit call
    pub auto_play: bool,
    /// Container visibility settings for `OnScroll`
    pub scroll_trigger: ScrollTrigger,
}

impl Default for TimelineConfig {
    fn default() -> Self {
        Self::new("Untitled Timeline")
    }
}

impl TimelineConfig {
    /// Create an empty timeline
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: TimelineId::new(),
            name: name.into(),
            sequence: Vec::new(),
            trigger: Trigger::OnLoad,
            loop_mode: LoopMode::Once,
            delay: 0.0,
            auto_play: true,
            scroll_trigger: ScrollTrigger::default(),
        }
    }

    /// Append an entry
    pub fn with_entry(mut self, entry: TimelineEntry) -> Self {
        self.sequence.push(entry);
        self
    }

    /// Set the trigger
    pub fn with_trigger(mut self, trigger: Trigger) -> Self {
        self.trigger = trigger;
        self
    }

    /// Set the loop mode
    pub fn with_loop(mut self, loop_mode: LoopMode) -> Self {
        self.loop_mode = loop_mode;
        self
    }

    /// Parse a timeline from RON text
    pub fn from_ron_str(text: &str) -> Result<Self> {
        Ok(ron::from_str(text)?)
    }

    /// Load a timeline from a RON file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_ron_str(&content)
    }

    /// Total duration in seconds, computable before playback starts
    ///
    /// Negative start times are left as authored. Use
    /// [`TimelineConfig::resolved_duration`] for the length a timeline built
    /// under a given policy will report.
    pub fn duration(&self) -> f64 {
        crate::timing::compute_duration(&self.sequence)
    }

    /// Total duration once negative start times are handled by `policy`
    pub fn resolved_duration(&self, policy: NegativeStartPolicy) -> Result<f64> {
        ResolvedTimeline::new(&self.sequence, policy).map(|resolved| resolved.duration())
    }

    /// Check entries for authoring mistakes
    pub fn validate(&self, policy: NegativeStartPolicy) -> Result<()> {
        for (index, entry) in self.sequence.iter().enumerate() {
            if entry.target.trim().is_empty() {
                return Err(TimelineError::EmptyTargetId { index });
            }
            let duration = entry.animation.duration;
            if !is_valid_seconds(duration) {
                return Err(TimelineError::InvalidDuration { index, value: duration });
            }
            for (field, value) in [
                ("delay", entry.animation.delay),
                ("stagger", entry.animation.stagger),
            ] {
                if !is_valid_seconds(value) {
                    return Err(TimelineError::InvalidTiming { index, field, value });
                }
            }
            if !entry.start_at.is_recognized() {
                tracing::warn!(
                    "Timeline {:?} entry {} has unrecognized start_at {:?}, chaining after previous",
                    self.name,
                    index,
                    entry.start_at.to_string()
                );
            }
        }

        if !is_valid_seconds(self.delay) {
            return Err(TimelineError::InvalidDelay(self.delay));
        }

        let threshold = self.scroll_trigger.threshold;
        if !(0.0..=1.0).contains(&threshold) {
            return Err(TimelineError::InvalidThreshold(threshold));
        }

        ResolvedTimeline::new(&self.sequence, policy).map(|_| ())
    }
}

fn is_valid_seconds(value: f64) -> bool {
    value.is_finite() && value >= 0.0
}
