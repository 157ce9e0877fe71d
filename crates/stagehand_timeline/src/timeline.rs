// SPDX-License-Identifier: MIT OR Apache-2.0
//! The timeline orchestrator.
//!
//! A [`Timeline`] is the context object for one timeline instance. It owns
//! the target registry, the playback engine, the sequencer and the trigger
//! controller, and is advanced by [`Timeline::tick`] from a single context
//! (usually the [frame driver](crate::driver)). Several timelines on one
//! page are fully isolated from each other.

use crate::clock::Clock;
use crate::config::TimelineConfig;
use crate::error::Result;
use crate::playback::{IterationEnd, PlaybackEngine, PlaybackSnapshot, PlaybackState};
use crate::registry::{Registration, SharedTarget, TargetRegistry};
use crate::sequencer::{Dispatch, Sequencer};
use crate::settings::OrchestratorSettings;
use crate::timing::ResolvedTimeline;
use crate::trigger::{TriggerAction, TriggerController};
use std::sync::Arc;
use tokio::sync::watch;

/// One orchestrated timeline
pub struct Timeline {
    config: Arc<TimelineConfig>,
    resolved: ResolvedTimeline,
    settings: OrchestratorSettings,
    registry: TargetRegistry,
    engine: PlaybackEngine,
    sequencer: Sequencer,
    trigger: TriggerController,
    clock: Arc<dyn Clock>,
    snapshot_tx: watch::Sender<PlaybackSnapshot>,
}

impl Timeline {
    /// Validate `config` and build an idle timeline
    pub fn new(
        config: TimelineConfig,
        settings: OrchestratorSettings,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        config.validate(settings.negative_start)?;
        let resolved = ResolvedTimeline::new(&config.sequence, settings.negative_start)?;
        let entries: Arc<[_]> = config.sequence.clone().into();

        let engine = PlaybackEngine::new(resolved.duration(), config.loop_mode);
        let sequencer = Sequencer::new(entries, resolved.clone(), settings.sequencer_options());
        let trigger = TriggerController::new(&config);
        let registry = TargetRegistry::with_required_states(settings.required_states());
        let (snapshot_tx, _) = watch::channel(engine.snapshot());

        tracing::info!(
            "Created timeline {:?} with {} entries, {:.3}s",
            config.name,
            config.sequence.len(),
            resolved.duration()
        );

        Ok(Self {
            config: Arc::new(config),
            resolved,
            settings,
            registry,
            engine,
            sequencer,
            trigger,
            clock,
            snapshot_tx,
        })
    }

    /// The timeline definition
    pub fn config(&self) -> &TimelineConfig {
        &self.config
    }

    /// The settings this timeline was built with
    pub fn settings(&self) -> &OrchestratorSettings {
        &self.settings
    }

    /// Placement of every entry
    pub fn resolved(&self) -> &ResolvedTimeline {
        &self.resolved
    }

    /// Registry participants register with; clones share the mapping
    pub fn registry(&self) -> TargetRegistry {
        self.registry.clone()
    }

    /// Register a participating component
    pub fn register_component(&self, id: impl Into<String>, handle: SharedTarget) -> Result<()> {
        self.registry.register(id, handle)
    }

    /// Register a component for as long as the returned guard lives
    pub fn register_scoped(&self, id: impl Into<String>, handle: SharedTarget) -> Result<Registration> {
        self.registry.register_scoped(id, handle)
    }

    /// Remove a participating component
    pub fn unregister_component(&self, id: &str) {
        self.registry.unregister(id);
    }

    /// Arm the trigger; call once when the timeline's container mounts
    pub fn mount(&mut self) {
        let now = self.clock.now();
        self.trigger.mount(now);
        tracing::debug!(
            "Mounted timeline {:?} ({})",
            self.config.name,
            self.config.trigger.name()
        );
    }

    /// Stop everything; no command fires after this returns
    pub fn unmount(&mut self) {
        self.trigger.unmount();
        self.sequencer.cancel();
        self.engine.pause();
        self.publish();
        tracing::debug!("Unmounted timeline {:?}", self.config.name);
    }

    /// Start or resume playback
    pub fn play(&mut self) {
        let now = self.clock.now();
        let from_completed = self.engine.state() == PlaybackState::Completed;
        if !self.engine.play(now) {
            return;
        }
        if from_completed {
            self.return_to_baseline();
            self.sequencer.restart(0);
        }
        tracing::info!(
            "Playing timeline {:?} from {:.3}s",
            self.config.name,
            self.engine.current_time()
        );
        self.publish();
    }

    /// Pause playback, keeping the current position
    pub fn pause(&mut self) {
        self.sequencer.cancel();
        if self.engine.pause() {
            tracing::info!(
                "Paused timeline {:?} at {:.3}s",
                self.config.name,
                self.engine.current_time()
            );
        }
        self.publish();
    }

    /// Stop, rewind and return every registered target to baseline
    pub fn reset(&mut self) {
        self.engine.reset();
        self.sequencer.restart(0);
        self.return_to_baseline();
        tracing::info!("Reset timeline {:?}", self.config.name);
        self.publish();
    }

    /// Move the playhead without replaying skipped entries
    pub fn seek_to(&mut self, time: f64) {
        let now = self.clock.now();
        let time = self.engine.seek(now, time);
        self.sequencer.seek(time);
        tracing::debug!("Seeked timeline {:?} to {:.3}s", self.config.name, time);
        self.publish();
    }

    /// Current time within the iteration, in seconds
    pub fn current_time(&self) -> f64 {
        self.engine.current_time()
    }

    /// Report container visibility for the scroll trigger
    pub fn report_visibility(&mut self, ratio: f64) {
        let now = self.clock.now();
        self.trigger.report_visibility(ratio, now);
    }

    /// Advance triggers, progress and dispatch to the current clock time
    pub fn tick(&mut self) -> Vec<Dispatch> {
        let now = self.clock.now();

        match self.trigger.poll(now) {
            Some(TriggerAction::Play) => self.play(),
            Some(TriggerAction::Replay) => {
                self.reset();
                self.play();
            }
            None => {}
        }

        let mut issued = Vec::new();
        if self.engine.sample(now).is_some() {
            let elapsed = self.engine.elapsed(now);
            issued = self.sequencer.tick(elapsed, &self.registry);
            tracing::trace!("Sampled progress {:.3}", self.engine.progress());

            if self.engine.progress() >= 1.0 && self.sequencer.is_finished() {
                self.end_iteration(now);
            }
        }

        self.publish();
        issued
    }

    fn end_iteration(&mut self, now: f64) {
        match self.engine.finish_iteration(now) {
            IterationEnd::Looped(iteration) => {
                tracing::debug!(
                    "Timeline {:?} looping, iteration {}",
                    self.config.name,
                    iteration
                );
                self.return_to_baseline();
                self.sequencer.restart(iteration);
            }
            IterationEnd::Completed => {
                tracing::info!("Timeline {:?} completed", self.config.name);
            }
        }
    }

    /// Set every currently registered target to the baseline state
    fn return_to_baseline(&self) {
        for (id, handle) in self.registry.snapshot() {
            tracing::trace!("Returning {:?} to {:?}", id, self.settings.baseline_state);
            handle.set(&self.settings.baseline_state);
        }
    }

    /// Current read model
    pub fn snapshot(&self) -> PlaybackSnapshot {
        self.engine.snapshot()
    }

    /// Watch the read model as it changes
    pub fn subscribe(&self) -> watch::Receiver<PlaybackSnapshot> {
        self.snapshot_tx.subscribe()
    }

    /// Playback state
    pub fn state(&self) -> PlaybackState {
        self.engine.state()
    }

    /// Is currently playing
    pub fn is_playing(&self) -> bool {
        self.engine.is_playing()
    }

    /// Progress in `[0, 1]`
    pub fn progress(&self) -> f64 {
        self.engine.progress()
    }

    /// Total duration in seconds
    pub fn duration(&self) -> f64 {
        self.engine.duration()
    }

    /// Total commands issued since creation
    pub fn dispatched(&self) -> u64 {
        self.sequencer.dispatched()
    }

    fn publish(&self) {
        let snapshot = self.engine.snapshot();
        self.snapshot_tx.send_if_modified(|current| {
            if *current == snapshot {
                false
            } else {
                *current = snapshot;
                true
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::config::{LoopMode, TimelineEntry, Trigger};
    use crate::registry::testing::{Command, Completion, RecordingTarget};

    const FRAME: f64 = 1.0 / 60.0;

    fn example_config() -> TimelineConfig {
        TimelineConfig::new("example")
            .with_trigger(Trigger::OnClick)
            .with_entry(TimelineEntry::new("hero").at("previous").duration(0.6))
            .with_entry(TimelineEntry::new("sub").at("+=0.2").duration(0.4))
    }

    fn timeline(config: TimelineConfig) -> (Timeline, ManualClock) {
        let clock = ManualClock::new();
        let timeline =
            Timeline::new(config, OrchestratorSettings::default(), Arc::new(clock.clone())).unwrap();
        (timeline, clock)
    }

    /// Tick in frame steps for `seconds`
    fn run(timeline: &mut Timeline, clock: &ManualClock, seconds: f64) {
        let frames = (seconds / FRAME).round() as usize;
        for _ in 0..frames {
            clock.advance(FRAME);
            timeline.tick();
        }
    }

    #[test]
    fn test_duration_known_before_play() {
        let (timeline, _) = timeline(example_config());
        assert!((timeline.duration() - 1.2).abs() < 1e-9);
        assert_eq!(timeline.state(), PlaybackState::Idle);
        assert_eq!(timeline.snapshot().progress, 0.0);
    }

    #[test]
    fn test_example_dispatch_times() {
        let (mut timeline, clock) = timeline(example_config());
        let hero = RecordingTarget::new();
        let sub = RecordingTarget::new();
        timeline.register_component("hero", hero.clone()).unwrap();
        timeline.register_component("sub", sub.clone()).unwrap();

        timeline.play();
        let issued = timeline.tick();
        assert_eq!(issued.len(), 1);
        assert_eq!(issued[0].target, "hero");

        clock.advance(0.79);
        assert!(timeline.tick().is_empty());
        clock.advance(0.01);
        let issued = timeline.tick();
        assert_eq!(issued.len(), 1);
        assert_eq!(issued[0].target, "sub");

        clock.advance(0.5);
        timeline.tick();
        assert_eq!(timeline.state(), PlaybackState::Completed);
        assert_eq!(timeline.progress(), 1.0);
        assert_eq!(hero.starts(), 1);
        assert_eq!(sub.starts(), 1);
    }

    #[test]
    fn test_pause_right_after_play_dispatches_nothing() {
        let (mut timeline, clock) = timeline(example_config());
        let hero = RecordingTarget::new();
        timeline.register_component("hero", hero.clone()).unwrap();

        timeline.play();
        timeline.pause();
        run(&mut timeline, &clock, 2.0);

        assert_eq!(hero.starts(), 0);
        assert_eq!(timeline.dispatched(), 0);
        assert_eq!(timeline.state(), PlaybackState::Paused);
    }

    #[test]
    fn test_pause_and_resume_keeps_position() {
        let (mut timeline, clock) = timeline(example_config());
        let sub = RecordingTarget::new();
        timeline.register_component("sub", sub.clone()).unwrap();

        timeline.play();
        run(&mut timeline, &clock, 0.5);
        timeline.pause();
        let paused_at = timeline.current_time();
        assert!((paused_at - 0.5).abs() < 0.02);

        run(&mut timeline, &clock, 5.0);
        assert_eq!(sub.starts(), 0);
        assert_eq!(timeline.current_time(), paused_at);

        timeline.play();
        run(&mut timeline, &clock, 0.25);
        assert_eq!(sub.starts(), 0);
        run(&mut timeline, &clock, 0.1);
        assert_eq!(sub.starts(), 1);
    }

    #[test]
    fn test_reset_returns_all_targets_to_baseline() {
        let (mut timeline, clock) = timeline(example_config());
        let hero = RecordingTarget::new();
        let bystander = RecordingTarget::new();
        timeline.register_component("hero", hero.clone()).unwrap();
        timeline.register_component("bystander", bystander.clone()).unwrap();

        timeline.play();
        run(&mut timeline, &clock, 0.7);
        timeline.reset();

        assert_eq!(timeline.progress(), 0.0);
        assert_eq!(timeline.state(), PlaybackState::Idle);
        assert_eq!(hero.last(), Some(Command::Set("hidden".to_string())));
        assert_eq!(bystander.commands(), vec![Command::Set("hidden".to_string())]);

        timeline.play();
        timeline.tick();
        assert_eq!(hero.starts(), 2);
    }

    #[test]
    fn test_loop_count_repeats_then_completes() {
        let (mut timeline, clock) = timeline(example_config().with_loop(LoopMode::Count(3)));
        let hero = RecordingTarget::new();
        let sub = RecordingTarget::new();
        timeline.register_component("hero", hero.clone()).unwrap();
        timeline.register_component("sub", sub.clone()).unwrap();

        timeline.play();
        timeline.tick();
        run(&mut timeline, &clock, 10.0);

        assert_eq!(timeline.state(), PlaybackState::Completed);
        assert_eq!(hero.starts(), 3);
        assert_eq!(sub.starts(), 3);
        assert_eq!(timeline.snapshot().iteration, 2);

        // Baseline is restored between iterations only.
        let sets = hero
            .commands()
            .iter()
            .filter(|command| matches!(command, Command::Set(_)))
            .count();
        assert_eq!(sets, 2);
    }

    #[test]
    fn test_infinite_loop_never_halts() {
        let (mut timeline, clock) = timeline(example_config().with_loop(LoopMode::Infinite));
        let hero = RecordingTarget::new();
        timeline.register_component("hero", hero.clone()).unwrap();

        timeline.play();
        run(&mut timeline, &clock, 30.0);
        assert!(timeline.is_playing());
        assert!(hero.starts() >= 20);

        timeline.pause();
        let count = hero.starts();
        run(&mut timeline, &clock, 5.0);
        assert_eq!(hero.starts(), count);
    }

    #[test]
    fn test_seek_does_not_replay_skipped_entries() {
        let (mut timeline, clock) = timeline(example_config());
        let hero = RecordingTarget::new();
        let sub = RecordingTarget::new();
        timeline.register_component("hero", hero.clone()).unwrap();
        timeline.register_component("sub", sub.clone()).unwrap();

        timeline.seek_to(0.7);
        assert!((timeline.current_time() - 0.7).abs() < 1e-9);
        timeline.play();
        timeline.tick();
        assert_eq!(hero.starts(), 0);

        run(&mut timeline, &clock, 0.15);
        assert_eq!(sub.starts(), 1);

        timeline.seek_to(99.0);
        assert_eq!(timeline.current_time(), timeline.duration());
    }

    #[test]
    fn test_unregister_mid_wait_skips_silently() {
        let (mut timeline, clock) = timeline(example_config());
        let sub = RecordingTarget::new();
        timeline.register_component("sub", sub.clone()).unwrap();

        timeline.play();
        run(&mut timeline, &clock, 0.4);
        timeline.unregister_component("sub");
        run(&mut timeline, &clock, 1.0);

        assert_eq!(sub.starts(), 0);
        assert_eq!(timeline.state(), PlaybackState::Completed);
    }

    #[test]
    fn test_reregistered_handle_receives_dispatch() {
        let (mut timeline, clock) = timeline(example_config());
        let old = RecordingTarget::new();
        let new = RecordingTarget::new();
        timeline.register_component("sub", old.clone()).unwrap();

        timeline.play();
        run(&mut timeline, &clock, 0.4);
        timeline.register_component("sub", new.clone()).unwrap();
        run(&mut timeline, &clock, 0.5);

        assert_eq!(old.starts(), 0);
        assert_eq!(new.starts(), 1);
    }

    #[test]
    fn test_stalled_completion_does_not_block_progress() {
        let (mut timeline, clock) = timeline(example_config());
        let hero = RecordingTarget::with_completion(Completion::Never);
        let sub = RecordingTarget::new();
        timeline.register_component("hero", hero.clone()).unwrap();
        timeline.register_component("sub", sub.clone()).unwrap();

        timeline.play();
        run(&mut timeline, &clock, 2.0);

        assert_eq!(timeline.progress(), 1.0);
        assert_eq!(sub.starts(), 0);
        assert!(timeline.is_playing());
    }

    #[test]
    fn test_late_completion_after_pause_is_ignored() {
        let (mut timeline, clock) = timeline(example_config());
        let hero = RecordingTarget::with_completion(Completion::Manual);
        let sub = RecordingTarget::new();
        timeline.register_component("hero", hero.clone()).unwrap();
        timeline.register_component("sub", sub.clone()).unwrap();

        timeline.play();
        timeline.tick();
        timeline.pause();
        hero.finish_all();
        run(&mut timeline, &clock, 2.0);
        assert_eq!(sub.starts(), 0);
    }

    #[test]
    fn test_on_load_trigger_autoplays() {
        let config = example_config().with_trigger(Trigger::OnLoad);
        let (mut timeline, clock) = timeline(config);
        let hero = RecordingTarget::new();
        timeline.register_component("hero", hero.clone()).unwrap();

        timeline.mount();
        timeline.tick();
        assert!(timeline.is_playing());
        assert_eq!(hero.starts(), 1);
        run(&mut timeline, &clock, 2.0);
        assert_eq!(timeline.state(), PlaybackState::Completed);
    }

    #[test]
    fn test_on_scroll_trigger_plays_at_threshold() {
        let config = example_config().with_trigger(Trigger::OnScroll);
        let (mut timeline, _clock) = timeline(config);

        timeline.mount();
        timeline.report_visibility(0.1);
        timeline.tick();
        assert_eq!(timeline.state(), PlaybackState::Idle);

        timeline.report_visibility(0.4);
        timeline.tick();
        assert!(timeline.is_playing());
    }

    #[test]
    fn test_unmount_stops_dispatch() {
        let (mut timeline, clock) = timeline(example_config());
        let sub = RecordingTarget::new();
        timeline.register_component("sub", sub.clone()).unwrap();

        timeline.play();
        run(&mut timeline, &clock, 0.3);
        timeline.unmount();
        run(&mut timeline, &clock, 2.0);
        assert_eq!(sub.starts(), 0);
        assert!(!timeline.is_playing());
    }

    #[test]
    fn test_play_after_completion_replays() {
        let (mut timeline, clock) = timeline(example_config());
        let hero = RecordingTarget::new();
        timeline.register_component("hero", hero.clone()).unwrap();

        timeline.play();
        run(&mut timeline, &clock, 2.0);
        assert_eq!(timeline.state(), PlaybackState::Completed);

        timeline.play();
        timeline.tick();
        assert_eq!(hero.starts(), 2);
        assert_eq!(timeline.snapshot().iteration, 0);
    }

    #[test]
    fn test_seek_after_completion_resumes_from_seek_point() {
        let (mut timeline, clock) = timeline(example_config());
        let hero = RecordingTarget::new();
        let sub = RecordingTarget::new();
        timeline.register_component("hero", hero.clone()).unwrap();
        timeline.register_component("sub", sub.clone()).unwrap();

        timeline.play();
        run(&mut timeline, &clock, 2.0);
        assert_eq!(timeline.state(), PlaybackState::Completed);

        timeline.seek_to(0.7);
        assert_eq!(timeline.state(), PlaybackState::Paused);
        assert!((timeline.current_time() - 0.7).abs() < 1e-9);

        timeline.play();
        timeline.tick();
        assert_eq!(hero.starts(), 1);
        assert!((timeline.current_time() - 0.7).abs() < 1e-9);

        run(&mut timeline, &clock, 0.2);
        assert_eq!(sub.starts(), 2);
        assert_eq!(hero.starts(), 1);
    }

    #[test]
    fn test_subscribers_see_progress() {
        let (mut timeline, clock) = timeline(example_config());
        let receiver = timeline.subscribe();

        timeline.play();
        run(&mut timeline, &clock, 0.6);
        let snapshot = *receiver.borrow();
        assert!(snapshot.is_playing);
        assert!((snapshot.progress - 0.5).abs() < 0.02);
        assert!((snapshot.duration - 1.2).abs() < 1e-9);
    }

    #[test]
    fn test_capability_checked_at_registration() {
        let (timeline, _) = timeline(example_config());
        let partial = RecordingTarget::supporting(vec!["visible"]);
        assert!(timeline.register_component("hero", partial).is_err());
        assert!(timeline.registry().is_empty());
    }

    #[test]
    fn test_isolated_timelines() {
        let (first, _) = timeline(example_config());
        let (second, _) = timeline(example_config());
        first.register_component("hero", RecordingTarget::new()).unwrap();
        assert!(second.registry().lookup("hero").is_none());
    }
}
