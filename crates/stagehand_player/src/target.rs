// SPDX-License-Identifier: MIT OR Apache-2.0
//! Console target that narrates the commands it receives.

use parking_lot::Mutex;
use stagehand_timeline::{CompletionSignal, TargetHandle, TransitionParams};
use std::time::Duration;

/// A target that logs every command and completes after the transition time
pub struct ConsoleTarget {
    id: String,
    state: Mutex<String>,
}

impl ConsoleTarget {
    /// Create a target resting in `baseline`
    pub fn new(id: impl Into<String>, baseline: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            state: Mutex::new(baseline.into()),
        }
    }

    /// Target id
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The state the target was last told to reach
    pub fn state(&self) -> String {
        self.state.lock().clone()
    }
}

impl TargetHandle for ConsoleTarget {
    fn start(&self, state: &str, params: &TransitionParams) -> CompletionSignal {
        tracing::info!(
            "[{}] {} -> {:?} over {:.2}s ({:?}, iteration {})",
            self.id,
            params.kind.name(),
            state,
            params.duration,
            params.easing,
            params.iteration
        );
        *self.state.lock() = state.to_owned();

        let seconds = params.delay + params.duration;
        let total = match Duration::try_from_secs_f64(seconds) {
            Ok(total) => total,
            Err(e) => {
                tracing::warn!("[{}] cannot wait {}s ({e}), completing now", self.id, seconds);
                return CompletionSignal::ready();
            }
        };

        let (completer, signal) = CompletionSignal::channel();
        let id = self.id.clone();
        tokio::spawn(async move {
            tokio::time::sleep(total).await;
            tracing::debug!("[{}] transition finished", id);
            completer.complete();
        });
        signal
    }

    fn set(&self, state: &str) {
        tracing::info!("[{}] set {:?}", self.id, state);
        *self.state.lock() = state.to_owned();
    }
}
