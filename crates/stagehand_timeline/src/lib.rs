// SPDX-License-Identifier: MIT OR Apache-2.0
//! Timeline orchestration for Stagehand.
//!
//! This crate coordinates sequenced, time-based transitions across
//! independently owned components:
//! - Start-time resolution (absolute, chained, relative offsets)
//! - Up-front duration calculation
//! - Cancellable dispatch of transition commands
//! - Play / pause / reset / seek / loop
//! - Load, scroll and click triggers
//!
//! ## Architecture
//!
//! The orchestrator is built on:
//! - A shared target registry participants register handles with
//! - A tick-driven sequencer with generation-based cancellation
//! - A playback engine that samples progress from a clock
//! - An async frame driver that ticks and applies control commands
//!
//! The engine never renders anything; each target interprets the state
//! names and transition parameters it is sent.

pub mod animation;
pub mod clock;
pub mod config;
pub mod driver;
pub mod error;
pub mod playback;
pub mod registry;
pub mod sequencer;
pub mod settings;
pub mod signal;
pub mod timeline;
pub mod timing;
pub mod trigger;

pub use animation::{
    AnimationConfig, AnimationTrigger, AnimationType, Direction, Easing, HoverConfig,
    ScrollTrigger, SpringConfig, TransitionParams, DEFAULT_DURATION, DEFAULT_VISIBILITY_THRESHOLD,
};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{LoopMode, StartAt, TimelineConfig, TimelineEntry, TimelineId, Trigger};
pub use driver::{ControlCommand, PlaybackControls};
pub use error::{Result, TimelineError};
pub use playback::{IterationEnd, PlaybackEngine, PlaybackSnapshot, PlaybackState};
pub use registry::{Registration, SharedTarget, TargetHandle, TargetRegistry};
pub use sequencer::{Dispatch, Sequencer, SequencerOptions};
pub use settings::OrchestratorSettings;
pub use signal::{Completer, CompletionSignal};
pub use timeline::Timeline;
pub use timing::{compute_duration, resolve, resolve_points, NegativeStartPolicy, ResolvedPoint, ResolvedTimeline};
pub use trigger::{TriggerAction, TriggerController};
