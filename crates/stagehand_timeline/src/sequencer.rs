// SPDX-License-Identifier: MIT OR Apache-2.0
//! Dispatch state machine.
//!
//! The sequencer walks the entry list once per loop iteration. It is driven
//! by [`Sequencer::tick`] with the current timeline time and never blocks:
//! waiting for a start time and waiting for a completion signal are both
//! phases that are re-checked on the next tick.
//!
//! Every phase records the generation it was entered under. Cancelling bumps
//! the generation, so a phase from before the cancel is recognised as stale
//! when it would resume and is dropped instead of firing.

use crate::animation::TransitionParams;
use crate::config::TimelineEntry;
use crate::registry::TargetRegistry;
use crate::signal::CompletionSignal;
use crate::timing::ResolvedTimeline;
use std::sync::Arc;

/// Sequencer behaviour shared by every iteration
#[derive(Debug, Clone)]
pub struct SequencerOptions {
    /// State name passed to `start`
    pub enter_state: String,
    /// Hold the walk until each dispatched transition reports completion
    pub await_completion: bool,
}

impl Default for SequencerOptions {
    fn default() -> Self {
        Self {
            enter_state: "visible".to_string(),
            await_completion: true,
        }
    }
}

/// A transition command that was issued
#[derive(Debug, Clone, PartialEq)]
pub struct Dispatch {
    /// Index of the entry in the sequence
    pub index: usize,
    /// Target id the command went to
    pub target: String,
    /// Resolved start time of the entry
    pub scheduled_at: f64,
    /// Timeline time the command actually went out
    pub dispatched_at: f64,
    /// Loop iteration
    pub iteration: u32,
}

/// Where the walk currently is
enum Phase {
    /// Suspended until the timeline reaches `at`
    WaitingForStart {
        index: usize,
        at: f64,
        generation: u64,
    },
    /// Suspended until a dispatched transition completes
    AwaitingCompletion {
        index: usize,
        signal: CompletionSignal,
        generation: u64,
    },
    /// Every entry of this iteration has been handled
    Finished,
}

/// Walks a resolved timeline and issues transition commands
pub struct Sequencer {
    entries: Arc<[TimelineEntry]>,
    timeline: ResolvedTimeline,
    options: SequencerOptions,
    phase: Phase,
    /// Next entry to consider
    next: usize,
    /// Entries starting before this time are skipped after a seek
    skip_before: Option<f64>,
    generation: u64,
    iteration: u32,
    dispatched: u64,
}

impl Sequencer {
    /// Create a sequencer positioned at the start of the first iteration
    pub fn new(
        entries: Arc<[TimelineEntry]>,
        timeline: ResolvedTimeline,
        options: SequencerOptions,
    ) -> Self {
        let mut sequencer = Self {
            entries,
            timeline,
            options,
            phase: Phase::Finished,
            next: 0,
            skip_before: None,
            generation: 0,
            iteration: 0,
            dispatched: 0,
        };
        sequencer.enter_wait();
        sequencer
    }

    /// Current cancellation generation
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Current loop iteration
    pub fn iteration(&self) -> u32 {
        self.iteration
    }

    /// Total commands issued since creation
    pub fn dispatched(&self) -> u64 {
        self.dispatched
    }

    /// Whether the current iteration has handled every entry
    pub fn is_finished(&self) -> bool {
        matches!(self.phase, Phase::Finished)
    }

    /// Whether the walk is held by an outstanding completion signal
    pub fn is_awaiting_completion(&self) -> bool {
        matches!(
            self.phase,
            Phase::AwaitingCompletion { generation, .. } if generation == self.generation
        )
    }

    /// Invalidate every outstanding wait without moving the walk
    ///
    /// Entries that have not fired yet will still fire once ticking
    /// resumes. A completion that was being awaited is abandoned.
    pub fn cancel(&mut self) {
        self.generation += 1;
        tracing::trace!("Sequencer cancelled, generation {}", self.generation);
    }

    /// Start a new iteration from the first entry
    pub fn restart(&mut self, iteration: u32) {
        self.generation += 1;
        self.iteration = iteration;
        self.next = 0;
        self.skip_before = None;
        self.enter_wait();
    }

    /// Reposition the walk at `time` without replaying earlier entries
    pub fn seek(&mut self, time: f64) {
        self.generation += 1;
        self.next = 0;
        self.skip_before = (time > 0.0).then_some(time);
        self.enter_wait();
    }

    /// Advance the walk to `time`, dispatching every entry that is due
    pub fn tick(&mut self, time: f64, registry: &TargetRegistry) -> Vec<Dispatch> {
        let mut issued = Vec::new();

        loop {
            match &mut self.phase {
                Phase::Finished => break,
                Phase::WaitingForStart { generation, .. }
                | Phase::AwaitingCompletion { generation, .. }
                    if *generation != self.generation =>
                {
                    if matches!(self.phase, Phase::AwaitingCompletion { .. }) {
                        tracing::trace!("Discarding stale completion wait");
                    }
                    self.enter_wait();
                }
                Phase::AwaitingCompletion { index, signal, .. } => {
                    if !signal.poll_complete() {
                        break;
                    }
                    tracing::trace!("Entry {} completed", index);
                    self.enter_wait();
                }
                Phase::WaitingForStart { index, at, .. } => {
                    if time < *at {
                        break;
                    }
                    let index = *index;
                    let scheduled_at = *at;
                    self.next = index + 1;
                    match self.fire(index, scheduled_at, time, registry) {
                        Some((dispatch, signal)) => {
                            issued.push(dispatch);
                            if self.options.await_completion {
                                self.phase = Phase::AwaitingCompletion {
                                    index,
                                    signal,
                                    generation: self.generation,
                                };
                            } else {
                                self.enter_wait();
                            }
                        }
                        None => self.enter_wait(),
                    }
                }
            }
        }

        issued
    }

    /// Move to the next entry that should fire, or finish the iteration
    fn enter_wait(&mut self) {
        while let Some(point) = self.timeline.point(self.next) {
            let skipped = self
                .skip_before
                .is_some_and(|seek_time| point.start_time < seek_time);
            if !skipped {
                self.phase = Phase::WaitingForStart {
                    index: self.next,
                    at: point.start_time,
                    generation: self.generation,
                };
                return;
            }
            tracing::trace!("Skipping entry {} before seek point", self.next);
            self.next += 1;
        }
        self.phase = Phase::Finished;
    }

    /// Look the target up and issue its command
    fn fire(
        &mut self,
        index: usize,
        scheduled_at: f64,
        time: f64,
        registry: &TargetRegistry,
    ) -> Option<(Dispatch, CompletionSignal)> {
        let entry = self.entries.get(index)?;
        if !entry.animation.enabled {
            tracing::debug!("Entry {} ({:?}) is disabled", index, entry.target);
            return None;
        }

        let Some(handle) = registry.lookup(&entry.target) else {
            tracing::debug!(
                "Target {:?} not registered, skipping entry {}",
                entry.target,
                index
            );
            return None;
        };

        let params =
            TransitionParams::from_config(&entry.animation, entry.label.as_deref(), self.iteration);
        let signal = handle.start(&self.options.enter_state, &params);
        self.dispatched += 1;
        tracing::debug!(
            "Dispatched {:?} to {:?} at {:.3}s (scheduled {:.3}s, iteration {})",
            self.options.enter_state,
            entry.target,
            time,
            scheduled_at,
            self.iteration
        );

        Some((
            Dispatch {
                index,
                target: entry.target.clone(),
                scheduled_at,
                dispatched_at: time,
                iteration: self.iteration,
            },
            signal,
        ))
    }
}
