// SPDX-License-Identifier: MIT OR Apache-2.0
//! Playback state and progress sampling.

use crate::config::LoopMode;
use serde::{Deserialize, Serialize};

/// Playback state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PlaybackState {
    /// Never played, or reset
    #[default]
    Idle,
    /// Playing forward
    Playing,
    /// Paused mid-sequence
    Paused,
    /// Final iteration finished
    Completed,
}

impl PlaybackState {
    /// Get a status string for display
    pub fn status_text(&self) -> &'static str {
        match self {
            Self::Idle => "Idle",
            Self::Playing => "Playing",
            Self::Paused => "Paused",
            Self::Completed => "Completed",
        }
    }
}

/// Read model published to consumers
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PlaybackSnapshot {
    /// Playback state
    pub state: PlaybackState,
    /// Shorthand for `state == Playing`
    pub is_playing: bool,
    /// Progress of the current iteration, in `[0, 1]`
    pub progress: f64,
    /// Total duration in seconds
    pub duration: f64,
    /// `progress * duration`
    pub current_time: f64,
    /// Zero-based loop iteration
    pub iteration: u32,
}

/// What happened when an iteration ran to its end
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IterationEnd {
    /// Another pass starts now
    Looped(u32),
    /// Playback halted in [`PlaybackState::Completed`]
    Completed,
}

/// Owns playback state and turns clock samples into progress
#[derive(Debug, Clone)]
pub struct PlaybackEngine {
    state: PlaybackState,
    progress: f64,
    duration: f64,
    /// Synthetic clock time at which the current iteration began
    start_reference: f64,
    iteration: u32,
    loop_mode: LoopMode,
}

impl PlaybackEngine {
    /// Create an idle engine for a timeline of `duration` seconds
    pub fn new(duration: f64, loop_mode: LoopMode) -> Self {
        Self {
            state: PlaybackState::Idle,
            progress: 0.0,
            duration,
            start_reference: 0.0,
            iteration: 0,
            loop_mode,
        }
    }

    /// Start or resume playback
    ///
    /// Returns false if already playing. Resuming keeps the elapsed time;
    /// playing a completed timeline starts over from the first iteration.
    pub fn play(&mut self, now: f64) -> bool {
        match self.state {
            PlaybackState::Playing => return false,
            PlaybackState::Completed => {
                self.progress = 0.0;
                self.iteration = 0;
            }
            PlaybackState::Idle | PlaybackState::Paused => {}
        }
        self.start_reference = now - self.progress * self.duration;
        self.state = PlaybackState::Playing;
        true
    }

    /// Pause playback, keeping progress
    pub fn pause(&mut self) -> bool {
        if self.state == PlaybackState::Playing {
            self.state = PlaybackState::Paused;
            true
        } else {
            false
        }
    }

    /// Stop and return to the beginning
    pub fn reset(&mut self) {
        self.state = PlaybackState::Idle;
        self.progress = 0.0;
        self.iteration = 0;
        self.start_reference = 0.0;
    }

    /// Jump to `time`, clamped to the timeline
    ///
    /// Returns the clamped time. A completed engine becomes paused at the
    /// new position so the next `play` resumes from there.
    pub fn seek(&mut self, now: f64, time: f64) -> f64 {
        let time = if time.is_nan() { 0.0 } else { time.clamp(0.0, self.duration) };
        self.progress = time / self.duration;
        self.start_reference = now - time;
        if self.state == PlaybackState::Completed {
            self.state = PlaybackState::Paused;
        }
        time
    }

    /// Take a progress sample
    ///
    /// Returns the new progress, or `None` when not playing.
    pub fn sample(&mut self, now: f64) -> Option<f64> {
        if self.state != PlaybackState::Playing {
            return None;
        }
        self.progress = (self.elapsed(now) / self.duration).clamp(0.0, 1.0);
        Some(self.progress)
    }

    /// Seconds since the current iteration began
    pub fn elapsed(&self, now: f64) -> f64 {
        match self.state {
            PlaybackState::Playing => now - self.start_reference,
            _ => self.current_time(),
        }
    }

    /// Close the current iteration and decide whether to loop
    pub fn finish_iteration(&mut self, now: f64) -> IterationEnd {
        if self.loop_mode.continues_after(self.iteration) {
            self.iteration = self.iteration.saturating_add(1);
            self.progress = 0.0;
            self.start_reference = now;
            IterationEnd::Looped(self.iteration)
        } else {
            self.progress = 1.0;
            self.state = PlaybackState::Completed;
            IterationEnd::Completed
        }
    }

    /// Current time within the iteration
    pub fn current_time(&self) -> f64 {
        self.progress * self.duration
    }

    /// Playback state
    pub fn state(&self) -> PlaybackState {
        self.state
    }

    /// Is currently playing
    pub fn is_playing(&self) -> bool {
        self.state == PlaybackState::Playing
    }

    /// Progress in `[0, 1]`
    pub fn progress(&self) -> f64 {
        self.progress
    }

    /// Total duration
    pub fn duration(&self) -> f64 {
        self.duration
    }

    /// Zero-based loop iteration
    pub fn iteration(&self) -> u32 {
        self.iteration
    }

    /// Build the consumer read model
    pub fn snapshot(&self) -> PlaybackSnapshot {
        PlaybackSnapshot {
            state: self.state,
            is_playing: self.is_playing(),
            progress: self.progress,
            duration: self.duration,
            current_time: self.current_time(),
            iteration: self.iteration,
        }
    }
}
