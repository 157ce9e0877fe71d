// SPDX-License-Identifier: MIT OR Apache-2.0
//! Completion signals returned by targets.
//!
//! A target answers `start` with a [`CompletionSignal`] that resolves once
//! its transition has finished. The sequencer polls signals from its tick
//! and never blocks on them.

use futures::future::{self, BoxFuture};
use futures::FutureExt;
use std::fmt;
use std::future::Future;
use tokio::sync::oneshot;

/// Resolves when a dispatched transition finishes
pub struct CompletionSignal {
    inner: Option<BoxFuture<'static, ()>>,
}

impl CompletionSignal {
    /// A signal that has already resolved
    pub fn ready() -> Self {
        Self { inner: None }
    }

    /// A signal that never resolves
    pub fn never() -> Self {
        Self::from_future(future::pending())
    }

    /// Wrap any future
    pub fn from_future<F>(future: F) -> Self
    where
        F: Future<Output = ()> + Send + 'static,
    {
        Self {
            inner: Some(future.boxed()),
        }
    }

    /// Create a signal paired with the [`Completer`] that resolves it
    ///
    /// Dropping the completer also resolves the signal, so a target that
    /// goes away cannot stall the sequence.
    pub fn channel() -> (Completer, Self) {
        let (tx, rx) = oneshot::channel();
        let signal = Self::from_future(async move {
            let _ = rx.await;
        });
        (Completer { tx: Some(tx) }, signal)
    }

    /// Check for completion without waiting
    pub fn poll_complete(&mut self) -> bool {
        let Some(inner) = self.inner.as_mut() else {
            return true;
        };
        if inner.now_or_never().is_some() {
            self.inner = None;
            true
        } else {
            false
        }
    }

    /// Whether the signal has been observed as resolved
    pub fn is_complete(&self) -> bool {
        self.inner.is_none()
    }
}

impl Default for CompletionSignal {
    fn default() -> Self {
        Self::ready()
    }
}

impl fmt::Debug for CompletionSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompletionSignal")
            .field("complete", &self.is_complete())
            .finish()
    }
}

impl Future for CompletionSignal {
    type Output = ();

    fn poll(
        mut self: std::pin::Pin<&mut Self>,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<()> {
        let Some(inner) = self.inner.as_mut() else {
            return std::task::Poll::Ready(());
        };
        match inner.poll_unpin(cx) {
            std::task::Poll::Ready(()) => {
                self.inner = None;
                std::task::Poll::Ready(())
            }
            std::task::Poll::Pending => std::task::Poll::Pending,
        }
    }
}

/// Resolves the paired [`CompletionSignal`]
#[derive(Debug)]
pub struct Completer {
    tx: Option<oneshot::Sender<()>>,
}

impl Completer {
    /// Mark the transition as finished
    pub fn complete(mut self) {
        if let Some(tx) = self.tx.take() {
            let _ = tx.send(());
        }
    }
}
