// SPDX-License-Identifier: MIT OR Apache-2.0
//! Autonomous playback triggers.
//!
//! The controller never plays anything itself; it tells the timeline when a
//! trigger has fired and the timeline acts on it during its next tick.

use crate::animation::ScrollTrigger;
use crate::config::{TimelineConfig, Trigger};

/// What a fired trigger asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerAction {
    /// Start playback
    Play,
    /// Return to the beginning and start playback
    Replay,
}

/// Decides when playback starts without an explicit call
#[derive(Debug, Clone)]
pub struct TriggerController {
    trigger: Trigger,
    auto_play: bool,
    delay: f64,
    scroll: ScrollTrigger,
    armed: bool,
    fired: bool,
    in_view: bool,
    pending: Option<(f64, TriggerAction)>,
}

impl TriggerController {
    /// Create a controller for the given timeline settings
    pub fn new(config: &TimelineConfig) -> Self {
        Self {
            trigger: config.trigger,
            auto_play: config.auto_play,
            delay: config.delay.max(0.0),
            scroll: config.scroll_trigger,
            armed: false,
            fired: false,
            in_view: false,
            pending: None,
        }
    }

    /// The configured trigger
    pub fn trigger(&self) -> Trigger {
        self.trigger
    }

    /// Whether the trigger has fired during this mount
    pub fn has_fired(&self) -> bool {
        self.fired
    }

    /// Arm the controller; `OnLoad` schedules its play here
    pub fn mount(&mut self, now: f64) {
        self.armed = true;
        self.fired = false;
        self.in_view = false;
        self.pending = None;

        if self.trigger == Trigger::OnLoad && self.auto_play {
            self.fired = true;
            self.pending = Some((now + self.delay, TriggerAction::Play));
            tracing::debug!("Load trigger scheduled in {:.3}s", self.delay);
        }
    }

    /// Disarm the controller and drop anything scheduled
    pub fn unmount(&mut self) {
        self.armed = false;
        self.pending = None;
    }

    /// Report how much of the timeline's container is visible
    pub fn report_visibility(&mut self, ratio: f64, now: f64) {
        if !self.armed || self.trigger != Trigger::OnScroll {
            return;
        }

        let visible = ratio >= self.scroll.threshold;
        let entered = visible && !self.in_view;
        self.in_view = visible;
        if !entered {
            return;
        }

        if !self.fired {
            self.fired = true;
            self.pending = Some((now + self.delay, TriggerAction::Play));
            tracing::debug!("Scroll trigger crossed threshold {:.2}", self.scroll.threshold);
        } else if !self.scroll.once {
            self.pending = Some((now + self.delay, TriggerAction::Replay));
            tracing::debug!("Scroll trigger re-entered view, replaying");
        }
    }

    /// Take the action that is due at `now`, if any
    pub fn poll(&mut self, now: f64) -> Option<TriggerAction> {
        match self.pending {
            Some((at, action)) if now >= at => {
                self.pending = None;
                Some(action)
            }
            _ => None,
        }
    }
}
