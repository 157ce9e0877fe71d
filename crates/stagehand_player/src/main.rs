// SPDX-License-Identifier: MIT OR Apache-2.0
//! `Stagehand` Player - drives a timeline document against console targets.
//!
//! Usage: `stagehand_player <timeline.ron>`
//!
//! Every target id referenced by the timeline is registered as a console
//! target that narrates the commands it receives. Settings are read from a
//! `player.ron` next to the timeline when present.

mod settings;
mod target;

use settings::{PlayerSettings, SETTINGS_FILE_NAME};
use stagehand_timeline::{driver, PlaybackState, SystemClock, Timeline, TimelineConfig, Trigger};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use target::ConsoleTarget;
use thiserror::Error;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Player errors
#[derive(Debug, Error)]
pub enum PlayerError {
    /// Missing command line argument
    #[error("Usage: stagehand_player <timeline.ron>")]
    Usage,

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Settings could not be parsed
    #[error("Failed to parse settings: {0}")]
    Parse(#[from] ron::error::SpannedError),

    /// Timeline error
    #[error(transparent)]
    Timeline(#[from] stagehand_timeline::TimelineError),
}

fn main() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("stagehand_player=info,stagehand_timeline=info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Stagehand Player v{}", env!("CARGO_PKG_VERSION"));

    let Some(path) = std::env::args_os().nth(1).map(PathBuf::from) else {
        tracing::error!("{}", PlayerError::Usage);
        std::process::exit(2);
    };

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            tracing::error!("Failed to create tokio runtime: {e}");
            std::process::exit(1);
        }
    };

    if let Err(e) = runtime.block_on(run(&path)) {
        tracing::error!("Player failed: {e}");
        std::process::exit(1);
    }
}

async fn run(path: &Path) -> Result<(), PlayerError> {
    let settings_path = path
        .parent()
        .map(|dir| dir.join(SETTINGS_FILE_NAME))
        .unwrap_or_else(|| PathBuf::from(SETTINGS_FILE_NAME));
    let settings = PlayerSettings::load_or_default(&settings_path).await?;

    let content = tokio::fs::read_to_string(path).await?;
    let config = TimelineConfig::from_ron_str(&content)?;
    let trigger = config.trigger;
    let timeline = Timeline::new(
        config,
        settings.orchestrator.clone(),
        Arc::new(SystemClock::new()),
    )?;
    tracing::info!(
        "Loaded {:?}: {} entries, {:.2}s, {}",
        timeline.config().name,
        timeline.config().sequence.len(),
        timeline.duration(),
        trigger.name()
    );

    let mut targets = Vec::new();
    for entry in &timeline.config().sequence {
        if timeline.registry().contains(&entry.target) {
            continue;
        }
        let target = Arc::new(ConsoleTarget::new(
            &entry.target,
            &settings.orchestrator.baseline_state,
        ));
        let registration = timeline.register_scoped(entry.target.clone(), target.clone())?;
        targets.push((target, registration));
    }

    let (controls, handle) = driver::spawn_default(timeline);

    match trigger {
        Trigger::OnLoad => {}
        Trigger::OnScroll => controls.report_visibility(settings.visibility)?,
        Trigger::OnClick if settings.click => controls.play()?,
        Trigger::OnClick => tracing::warn!("Click trigger with click disabled, nothing will play"),
    }

    let limit = Duration::try_from_secs_f64(settings.max_run_seconds.max(0.0))
        .unwrap_or(Duration::MAX);
    match tokio::time::timeout(limit, controls.wait_for_state(PlaybackState::Completed)).await {
        Ok(result) => {
            let snapshot = result?;
            tracing::info!("Completed after {} iteration(s)", snapshot.iteration + 1);
        }
        Err(_) => {
            let snapshot = controls.snapshot();
            tracing::info!(
                "Stopping after {:.1}s at {:.2}s ({}), iteration {}",
                settings.max_run_seconds,
                snapshot.current_time,
                snapshot.state.status_text(),
                snapshot.iteration + 1
            );
        }
    }

    controls.shutdown()?;
    let timeline = handle.await.map_err(std::io::Error::other)?;
    tracing::info!("Issued {} command(s)", timeline.dispatched());
    for (target, registration) in targets {
        tracing::info!("[{}] final state {:?}", target.id(), target.state());
        drop(registration);
    }
    Ok(())
}
