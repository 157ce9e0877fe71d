// SPDX-License-Identifier: MIT OR Apache-2.0
//! Registry of controllable targets.
//!
//! Components register a [`TargetHandle`] under an opaque id when they mount
//! and unregister when they unmount. The registry can be cloned freely and
//! handed to participants; all clones share one mapping.

use crate::animation::TransitionParams;
use crate::error::{Result, TimelineError};
use crate::signal::CompletionSignal;
use indexmap::IndexMap;
use parking_lot::RwLock;
use std::fmt;
use std::sync::Arc;

/// Capability surface a component exposes to the engine
pub trait TargetHandle: Send + Sync {
    /// Begin a transition towards `state`
    fn start(&self, state: &str, params: &TransitionParams) -> CompletionSignal;

    /// Jump to `state` without a transition
    fn set(&self, state: &str);

    /// Whether the target understands `state`
    fn supports(&self, state: &str) -> bool {
        let _ = state;
        true
    }
}

/// Shared handle to a registered target
pub type SharedTarget = Arc<dyn TargetHandle>;

/// Mapping from target id to handle
#[derive(Clone)]
pub struct TargetRegistry {
    targets: Arc<RwLock<IndexMap<String, SharedTarget>>>,
    required_states: Arc<[String]>,
}

impl TargetRegistry {
    /// Create a registry that accepts any handle
    pub fn new() -> Self {
        Self::with_required_states(Vec::new())
    }

    /// Create a registry that rejects handles missing any of `states`
    pub fn with_required_states(states: Vec<String>) -> Self {
        Self {
            targets: Arc::new(RwLock::new(IndexMap::new())),
            required_states: states.into(),
        }
    }

    /// Insert or replace the handle for `id`
    pub fn register(&self, id: impl Into<String>, handle: SharedTarget) -> Result<()> {
        let id = id.into();
        if let Some(state) = self
            .required_states
            .iter()
            .find(|state| !handle.supports(state))
        {
            return Err(TimelineError::MissingCapability {
                id,
                state: state.clone(),
            });
        }

        let replaced = self.targets.write().insert(id.clone(), handle).is_some();
        if replaced {
            tracing::debug!("Replaced target handle {:?}", id);
        } else {
            tracing::debug!("Registered target {:?}", id);
        }
        Ok(())
    }

    /// Register and get a guard that unregisters on drop
    pub fn register_scoped(&self, id: impl Into<String>, handle: SharedTarget) -> Result<Registration> {
        let id = id.into();
        self.register(id.clone(), Arc::clone(&handle))?;
        Ok(Registration {
            registry: self.clone(),
            id,
            handle,
        })
    }

    /// Remove the handle for `id`
    pub fn unregister(&self, id: &str) -> Option<SharedTarget> {
        let removed = self.targets.write().shift_remove(id);
        if removed.is_some() {
            tracing::debug!("Unregistered target {:?}", id);
        }
        removed
    }

    /// Get the handle currently registered for `id`
    pub fn lookup(&self, id: &str) -> Option<SharedTarget> {
        self.targets.read().get(id).cloned()
    }

    /// Whether `id` is registered
    pub fn contains(&self, id: &str) -> bool {
        self.targets.read().contains_key(id)
    }

    /// Registered ids in registration order
    pub fn ids(&self) -> Vec<String> {
        self.targets.read().keys().cloned().collect()
    }

    /// Copy of every registration, taken under a single read lock
    pub fn snapshot(&self) -> Vec<(String, SharedTarget)> {
        self.targets
            .read()
            .iter()
            .map(|(id, handle)| (id.clone(), Arc::clone(handle)))
            .collect()
    }

    /// Number of registered targets
    pub fn len(&self) -> usize {
        self.targets.read().len()
    }

    /// Whether nothing is registered
    pub fn is_empty(&self) -> bool {
        self.targets.read().is_empty()
    }

    /// Remove every registration
    pub fn clear(&self) {
        self.targets.write().clear();
    }
}

impl Default for TargetRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for TargetRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TargetRegistry")
            .field("ids", &self.ids())
            .field("required_states", &self.required_states)
            .finish()
    }
}

/// Keeps a target registered for as long as it is alive
///
/// Dropping the guard only removes the mapping if it still points at the
/// handle this guard registered.
#[must_use = "the target is unregistered when the guard is dropped"]
pub struct Registration {
    registry: TargetRegistry,
    id: String,
    handle: SharedTarget,
}

impl Registration {
    /// The registered id
    pub fn id(&self) -> &str {
        &self.id
    }
}

impl Drop for Registration {
    fn drop(&mut self) {
        let mut targets = self.registry.targets.write();
        let still_ours = targets
            .get(&self.id)
            .is_some_and(|current| Arc::ptr_eq(current, &self.handle));
        if still_ours {
            targets.shift_remove(&self.id);
            tracing::debug!("Unregistered target {:?} on drop", self.id);
        }
    }
}

impl fmt::Debug for Registration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registration").field("id", &self.id).finish()
    }
}
