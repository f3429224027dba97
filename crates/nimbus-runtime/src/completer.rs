// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Oneshot fulfilment primitive for offload-tier handlers.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::oneshot;
use tracing::warn;

use crate::error::ErrorReport;

type Outcome<T> = Result<T, ErrorReport>;

/// Completion handle passed to offload-tier user code.
///
/// The first `succeed`/`fail` call wins; later calls are ignored. The
/// handle may be cloned and moved freely across threads.
pub struct Completer<T> {
    fulfilled: Arc<AtomicBool>,
    sender: Arc<Mutex<Option<oneshot::Sender<Outcome<T>>>>>,
}

impl<T> Clone for Completer<T> {
    fn clone(&self) -> Self {
        Self {
            fulfilled: self.fulfilled.clone(),
            sender: self.sender.clone(),
        }
    }
}

impl<T: Send + 'static> Completer<T> {
    /// Create a completer and the receiver the wrapper awaits.
    pub(crate) fn new() -> (Self, oneshot::Receiver<Outcome<T>>) {
        let (tx, rx) = oneshot::channel();
        let completer = Self {
            fulfilled: Arc::new(AtomicBool::new(false)),
            sender: Arc::new(Mutex::new(Some(tx))),
        };
        (completer, rx)
    }

    /// Signal success. Returns false if the invocation was already completed.
    pub fn succeed(&self, value: T) -> bool {
        self.complete(Ok(value))
    }

    /// Signal failure with a prepared error report.
    pub fn fail(&self, report: ErrorReport) -> bool {
        self.complete(Err(report))
    }

    /// Signal failure with a user error; its runtime type name becomes the
    /// reported kind.
    pub fn fail_with<E: std::error::Error>(&self, error: &E) -> bool {
        self.complete(Err(ErrorReport::from_error(error)))
    }

    fn complete(&self, outcome: Outcome<T>) -> bool {
        if self.fulfilled.swap(true, Ordering::SeqCst) {
            warn!("invocation completed twice; second signal ignored");
            return false;
        }
        let Ok(mut slot) = self.sender.lock() else {
            return false;
        };
        match slot.take() {
            // The receiver only disappears when the invocation is torn down.
            Some(tx) => tx.send(outcome).is_ok(),
            None => false,
        }
    }
}

impl<T> std::fmt::Debug for Completer<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Completer")
            .field("fulfilled", &self.fulfilled.load(Ordering::SeqCst))
            .finish()
    }
}
