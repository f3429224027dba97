// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Shutdown coordinator: translates signals into a cooperative stop.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::config::StopSignal;

/// Observes stop signals and exposes the flag the loop polls between cycles.
///
/// Delivery never interrupts an in-flight invocation; the loop drains at the
/// next cycle boundary, and a pending `next` long-poll is abandoned.
#[derive(Clone)]
pub struct ShutdownController {
    requested: Arc<AtomicBool>,
    token: CancellationToken,
}

impl ShutdownController {
    /// Create a controller with no signal handlers installed.
    ///
    /// Use [`trigger`](Self::trigger) for programmatic stops (tests,
    /// embedding); call [`install_signal_handlers`](Self::install_signal_handlers)
    /// to wire process signals.
    pub fn new() -> Self {
        Self {
            requested: Arc::new(AtomicBool::new(false)),
            token: CancellationToken::new(),
        }
    }

    /// Install handlers for the configured stop signal and INT.
    #[cfg(unix)]
    pub fn install_signal_handlers(&self, stop_signal: StopSignal) -> std::io::Result<()> {
        use tokio::signal::unix::{SignalKind, signal};

        let mut stop = signal(stop_signal.kind())?;
        let mut interrupt = if stop_signal.kind() == SignalKind::interrupt() {
            None
        } else {
            Some(signal(SignalKind::interrupt())?)
        };

        let controller = self.clone();
        tokio::spawn(async move {
            match interrupt.as_mut() {
                Some(interrupt) => {
                    tokio::select! {
                        _ = stop.recv() => {}
                        _ = interrupt.recv() => {}
                    }
                }
                None => {
                    stop.recv().await;
                }
            }
            info!(signal = %stop_signal, "stop signal received, draining at cycle boundary");
            controller.trigger();
        });
        Ok(())
    }

    /// Install a Ctrl+C handler on platforms without unix signals.
    #[cfg(not(unix))]
    pub fn install_signal_handlers(&self, _stop_signal: StopSignal) -> std::io::Result<()> {
        let controller = self.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("interrupt received, draining at cycle boundary");
                controller.trigger();
            }
        });
        Ok(())
    }

    /// Request a cooperative stop.
    pub fn trigger(&self) {
        self.requested.store(true, Ordering::SeqCst);
        self.token.cancel();
    }

    /// Whether a stop has been requested; polled between cycles.
    pub fn is_requested(&self) -> bool {
        self.requested.load(Ordering::SeqCst)
    }

    /// Resolves once a stop is requested; used to abandon the `next` long-poll.
    pub async fn cancelled(&self) {
        self.token.cancelled().await
    }
}

impl Default for ShutdownController {
    fn default() -> Self {
        Self::new()
    }
}
