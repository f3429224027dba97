// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Agent lifecycle: initialization, the steady-state loop, draining.

use tracing::{debug, error, info};

use crate::client::RuntimeClient;
use crate::config::Config;
use crate::context::BufferAllocator;
use crate::error::{ErrorReport, RuntimeError};
use crate::handler::ByteHandler;
use crate::runner::{self, Cycle};
use crate::shutdown::ShutdownController;

/// Lifecycle states of the agent.
///
/// `Initializing → Running → Draining → Terminated`, with the exceptional
/// edge `Running → Failed → Terminated` (and `Initializing → Failed` when
/// setup breaks before the loop starts).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Initializing,
    Running,
    Draining,
    Failed,
    Terminated,
}

impl std::fmt::Display for RunState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Initializing => "initializing",
            Self::Running => "running",
            Self::Draining => "draining",
            Self::Failed => "failed",
            Self::Terminated => "terminated",
        };
        f.write_str(name)
    }
}

/// The long-lived agent: owns the loop from first `next` to drain.
///
/// At most one invocation is in flight at any instant; invocation N's
/// outcome is posted before invocation N+1 is fetched.
pub struct Runtime<H> {
    config: Config,
    client: RuntimeClient,
    shutdown: ShutdownController,
    handler: H,
    allocator: BufferAllocator,
    state: RunState,
    completed_cycles: u64,
}

impl<H: ByteHandler> Runtime<H> {
    /// Assemble a runtime from explicit parts.
    ///
    /// The caller owns signal-handler installation on the controller; this
    /// is the entry point for tests and embedders.
    pub fn with_parts(
        config: Config,
        client: RuntimeClient,
        shutdown: ShutdownController,
        handler: H,
    ) -> Self {
        Self {
            config,
            client,
            shutdown,
            handler,
            allocator: BufferAllocator,
            state: RunState::Initializing,
            completed_cycles: 0,
        }
    }

    /// Number of cycles completed so far.
    pub fn completed_cycles(&self) -> u64 {
        self.completed_cycles
    }

    /// Current lifecycle state.
    pub fn state(&self) -> RunState {
        self.state
    }

    fn transition(&mut self, next: RunState) {
        debug!(from = %self.state, to = %next, "lifecycle transition");
        self.state = next;
    }

    /// Drive the loop until a clean drain or a terminal failure.
    pub async fn run(mut self) -> Result<(), RuntimeError> {
        self.transition(RunState::Running);
        info!(
            max_requests = ?self.config.max_requests,
            stop_signal = %self.config.stop_signal,
            "runtime entering invocation loop"
        );

        let served = self.serve().await;

        match served {
            Ok(()) => {
                self.transition(RunState::Draining);
                self.client.close().await;
                self.transition(RunState::Terminated);
                info!(cycles = self.completed_cycles, "runtime drained cleanly");
                Ok(())
            }
            Err(e) => {
                self.transition(RunState::Failed);
                error!(error = %e, cycles = self.completed_cycles, "runtime loop failed");
                self.client.close().await;
                self.transition(RunState::Terminated);
                Err(e)
            }
        }
    }

    async fn serve(&mut self) -> Result<(), RuntimeError> {
        loop {
            if self.shutdown.is_requested() {
                return Ok(());
            }
            if let Some(bound) = self.config.max_requests {
                if self.completed_cycles >= bound {
                    info!(bound, "request bound reached");
                    return Ok(());
                }
            }

            match runner::run_once(&self.client, &self.handler, &self.allocator, &self.shutdown)
                .await?
            {
                Cycle::Completed => self.completed_cycles += 1,
                Cycle::Interrupted => return Ok(()),
            }
        }
    }
}

/// Run the agent with the given handler until drain or terminal failure.
///
/// Reads configuration and the control-plane endpoint from the environment,
/// installs signal handlers and enters the loop. Map the error to a process
/// exit code with [`RuntimeError::exit_code`].
pub async fn run<H: ByteHandler>(handler: H) -> Result<(), RuntimeError> {
    let config = Config::from_env()?;
    let client = RuntimeClient::from_env(&config)?;

    let shutdown = ShutdownController::new();
    if let Err(e) = shutdown.install_signal_handlers(config.stop_signal) {
        // The connection is up; tell the control plane why init failed.
        let report = ErrorReport::initialization(&e);
        if let Err(post) = client.report_init_error(&report).await {
            error!(error = %post, "failed to post initialization error");
        }
        return Err(RuntimeError::Init(format!("signal handler installation: {e}")));
    }

    Runtime::with_parts(config, client, shutdown, handler).run().await
}
