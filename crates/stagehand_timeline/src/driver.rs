// SPDX-License-Identifier: MIT OR Apache-2.0
//! Async frame driver.
//!
//! [`spawn`] moves a [`Timeline`] onto a tokio task that ticks it at the
//! refresh rate. Consumers talk to it through [`PlaybackControls`], which
//! queue commands the driver applies between ticks. All queued commands are
//! drained before a tick samples, so a `play` immediately followed by a
//! `pause` never dispatches anything.

use crate::error::{Result, TimelineError};
use crate::playback::{PlaybackSnapshot, PlaybackState};
use crate::registry::TargetRegistry;
use crate::timeline::Timeline;
use std::ops::ControlFlow;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// A control request queued for the driver
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ControlCommand {
    /// Start or resume playback
    Play,
    /// Pause playback
    Pause,
    /// Rewind and return targets to baseline
    Reset,
    /// Move the playhead
    SeekTo(f64),
    /// Report container visibility
    ReportVisibility(f64),
    /// Unmount the timeline and stop the driver
    Shutdown,
}

/// Consumer-side handle to a driven timeline
#[derive(Debug, Clone)]
pub struct PlaybackControls {
    commands: mpsc::UnboundedSender<ControlCommand>,
    snapshot: watch::Receiver<PlaybackSnapshot>,
    registry: TargetRegistry,
}

impl PlaybackControls {
    fn send(&self, command: ControlCommand) -> Result<()> {
        self.commands
            .send(command)
            .map_err(|_| TimelineError::DriverClosed)
    }

    /// Start or resume playback
    pub fn play(&self) -> Result<()> {
        self.send(ControlCommand::Play)
    }

    /// Pause playback
    pub fn pause(&self) -> Result<()> {
        self.send(ControlCommand::Pause)
    }

    /// Rewind and return targets to baseline
    pub fn reset(&self) -> Result<()> {
        self.send(ControlCommand::Reset)
    }

    /// Move the playhead to `time` seconds
    pub fn seek_to(&self, time: f64) -> Result<()> {
        self.send(ControlCommand::SeekTo(time))
    }

    /// Report how much of the container is visible
    pub fn report_visibility(&self, ratio: f64) -> Result<()> {
        self.send(ControlCommand::ReportVisibility(ratio))
    }

    /// Unmount the timeline and stop the driver
    pub fn shutdown(&self) -> Result<()> {
        self.send(ControlCommand::Shutdown)
    }

    /// Latest published read model
    pub fn snapshot(&self) -> PlaybackSnapshot {
        *self.snapshot.borrow()
    }

    /// Current time as of the latest sample
    pub fn current_time(&self) -> f64 {
        self.snapshot().current_time
    }

    /// Watch the read model as it changes
    pub fn subscribe(&self) -> watch::Receiver<PlaybackSnapshot> {
        self.snapshot.clone()
    }

    /// Registry of the driven timeline
    pub fn registry(&self) -> &TargetRegistry {
        &self.registry
    }

    /// Wait until playback reaches `state`
    pub async fn wait_for_state(&self, state: PlaybackState) -> Result<PlaybackSnapshot> {
        let mut receiver = self.snapshot.clone();
        let snapshot = receiver
            .wait_for(|snapshot| snapshot.state == state)
            .await
            .map_err(|_| TimelineError::DriverClosed)?;
        Ok(*snapshot)
    }
}

/// Drive `timeline` on a new task, sampling every `refresh`
///
/// Must be called from within a tokio runtime. The task mounts the
/// timeline, runs until [`PlaybackControls::shutdown`] is called or every
/// control handle is dropped, then unmounts it and hands it back.
pub fn spawn(timeline: Timeline, refresh: Duration) -> (PlaybackControls, JoinHandle<Timeline>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let controls = PlaybackControls {
        commands: tx,
        snapshot: timeline.subscribe(),
        registry: timeline.registry(),
    };
    let handle = tokio::spawn(run(timeline, rx, refresh));
    (controls, handle)
}

/// Drive with the refresh rate from the timeline's settings
pub fn spawn_default(timeline: Timeline) -> (PlaybackControls, JoinHandle<Timeline>) {
    let refresh = timeline.settings().refresh_interval();
    spawn(timeline, refresh)
}

async fn run(
    mut timeline: Timeline,
    mut commands: mpsc::UnboundedReceiver<ControlCommand>,
    refresh: Duration,
) -> Timeline {
    let mut interval = tokio::time::interval(refresh);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    timeline.mount();
    tracing::debug!("Driver started for {:?}", timeline.config().name);

    'driver: loop {
        tokio::select! {
            biased;

            command = commands.recv() => {
                let Some(command) = command else { break 'driver };
                if apply(&mut timeline, command).is_break() {
                    break 'driver;
                }
            }

            _ = interval.tick() => {
                while let Ok(command) = commands.try_recv() {
                    if apply(&mut timeline, command).is_break() {
                        break 'driver;
                    }
                }
                timeline.tick();
            }
        }
    }

    timeline.unmount();
    tracing::debug!("Driver stopped for {:?}", timeline.config().name);
    timeline
}

fn apply(timeline: &mut Timeline, command: ControlCommand) -> ControlFlow<()> {
    match command {
        ControlCommand::Play => timeline.play(),
        ControlCommand::Pause => timeline.pause(),
        ControlCommand::Reset => timeline.reset(),
        ControlCommand::SeekTo(time) => timeline.seek_to(time),
        ControlCommand::ReportVisibility(ratio) => timeline.report_visibility(ratio),
        ControlCommand::Shutdown => return ControlFlow::Break(()),
    }
    ControlFlow::Continue(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::SystemClock;
    use crate::config::{LoopMode, TimelineConfig, TimelineEntry, Trigger};
    use crate::registry::testing::RecordingTarget;
    use crate::settings::OrchestratorSettings;
    use std::sync::Arc;

    fn example_config(trigger: Trigger) -> TimelineConfig {
        TimelineConfig::new("driven")
            .with_trigger(trigger)
            .with_entry(TimelineEntry::new("hero").duration(0.6))
            .with_entry(TimelineEntry::new("sub").at("+=0.2").duration(0.4))
    }

    fn driven(config: TimelineConfig) -> Timeline {
        Timeline::new(
            config,
            OrchestratorSettings::default(),
            Arc::new(SystemClock::new()),
        )
        .unwrap()
    }

    fn example(trigger: Trigger) -> Timeline {
        driven(example_config(trigger))
    }

    #[tokio::test(start_paused = true)]
    async fn test_play_then_pause_dispatches_nothing() {
        let timeline = example(Trigger::OnClick);
        let hero = RecordingTarget::new();
        timeline.register_component("hero", hero.clone()).unwrap();
        let (controls, handle) = spawn_default(timeline);

        controls.play().unwrap();
        controls.pause().unwrap();
        tokio::time::sleep(Duration::from_secs(2)).await;

        assert_eq!(hero.starts(), 0);
        assert_eq!(controls.snapshot().state, PlaybackState::Paused);

        controls.shutdown().unwrap();
        let timeline = handle.await.unwrap();
        assert_eq!(timeline.dispatched(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_on_load_runs_to_completion() {
        let timeline = example(Trigger::OnLoad);
        let hero = RecordingTarget::new();
        let sub = RecordingTarget::new();
        timeline.register_component("hero", hero.clone()).unwrap();
        timeline.register_component("sub", sub.clone()).unwrap();
        let (controls, handle) = spawn_default(timeline);

        let snapshot = controls
            .wait_for_state(PlaybackState::Completed)
            .await
            .unwrap();
        assert_eq!(snapshot.progress, 1.0);
        assert_eq!(hero.starts(), 1);
        assert_eq!(sub.starts(), 1);

        controls.shutdown().unwrap();
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_loop_count_through_driver() {
        let timeline = driven(example_config(Trigger::OnClick).with_loop(LoopMode::Count(3)));
        let hero = RecordingTarget::new();
        timeline.register_component("hero", hero.clone()).unwrap();
        let (controls, handle) = spawn_default(timeline);

        controls.play().unwrap();
        controls
            .wait_for_state(PlaybackState::Completed)
            .await
            .unwrap();
        assert_eq!(hero.starts(), 3);

        controls.shutdown().unwrap();
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_scroll_visibility_through_driver() {
        let timeline = example(Trigger::OnScroll);
        let hero = RecordingTarget::new();
        timeline.register_component("hero", hero.clone()).unwrap();
        let (controls, handle) = spawn_default(timeline);

        controls.report_visibility(0.1).unwrap();
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(hero.starts(), 0);

        controls.report_visibility(0.5).unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(hero.starts(), 1);
        assert!(controls.snapshot().is_playing);

        controls.shutdown().unwrap();
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_seek_and_reset_through_driver() {
        let timeline = example(Trigger::OnClick);
        let hero = RecordingTarget::new();
        timeline.register_component("hero", hero.clone()).unwrap();
        let (controls, handle) = spawn_default(timeline);

        controls.seek_to(0.9).unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!((controls.current_time() - 0.9).abs() < 1e-9);

        controls.reset().unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(controls.current_time(), 0.0);
        assert_eq!(controls.snapshot().state, PlaybackState::Idle);

        controls.shutdown().unwrap();
        handle.await.unwrap();
        assert!(controls.play().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_queued_after_play_stops_before_any_tick() {
        let timeline = example(Trigger::OnClick);
        let hero = RecordingTarget::new();
        timeline.register_component("hero", hero.clone()).unwrap();
        let (controls, handle) = spawn_default(timeline);

        controls.play().unwrap();
        controls.shutdown().unwrap();
        controls.play().unwrap();
        let timeline = handle.await.unwrap();

        assert_eq!(hero.starts(), 0);
        assert_eq!(timeline.dispatched(), 0);
        assert_eq!(timeline.state(), PlaybackState::Paused);
        assert!(controls.play().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_participants_register_through_controls() {
        let timeline = example(Trigger::OnClick);
        let (controls, handle) = spawn_default(timeline);

        let hero = RecordingTarget::new();
        let guard = controls
            .registry()
            .register_scoped("hero", hero.clone())
            .unwrap();
        controls.play().unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(hero.starts(), 1);

        drop(guard);
        assert!(controls.registry().is_empty());

        controls.shutdown().unwrap();
        handle.await.unwrap();
    }
}
