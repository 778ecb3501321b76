// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Fixed-delay state publishing.

use std::sync::Arc;
use std::time::Duration;

use crate::error::Result;
use crate::protocol::{Gateway, Publisher};
use crate::sync::{PublishReport, Synchronizer};

/// Delay between the end of one cycle and the start of the next.
pub const POLL_INTERVAL: Duration = Duration::from_secs(1);

/// What the loop is currently doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollState {
    /// Waiting for the next cycle.
    Idle,
    /// Fetching and publishing.
    Polling,
}

/// Republishes gateway state forever.
///
/// Cycles never overlap and the delay is measured from the end of the
/// previous cycle, so the period is the interval plus the work time. There
/// is no catch-up after a slow cycle.
#[derive(Debug)]
pub struct PollLoop<G, P> {
    synchronizer: Arc<Synchronizer<G, P>>,
    interval: Duration,
    state: PollState,
    cycles: u64,
}

impl<G: Gateway, P: Publisher> PollLoop<G, P> {
    /// Creates a loop with the default one-second interval.
    #[must_use]
    pub fn new(synchronizer: Arc<Synchronizer<G, P>>) -> Self {
        Self {
            synchronizer,
            interval: POLL_INTERVAL,
            state: PollState::Idle,
            cycles: 0,
        }
    }

    /// Overrides the delay between cycles.
    #[must_use]
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Returns the current state.
    #[must_use]
    pub fn state(&self) -> PollState {
        self.state
    }

    /// Returns the number of completed cycles.
    #[must_use]
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    /// Runs a single publish cycle.
    ///
    /// # Errors
    ///
    /// Returns the error of the underlying publish pass.
    pub async fn tick(&mut self) -> Result<PublishReport> {
        self.state = PollState::Polling;
        let result = self.synchronizer.publish_all().await;
        self.state = PollState::Idle;
        self.cycles += 1;
        result
    }

    /// Runs until the task is dropped or the process exits.
    pub async fn run(mut self) {
        tracing::info!(interval_ms = self.interval.as_millis(), "Poll loop started");

        loop {
            match self.tick().await {
                Ok(report) => {
                    tracing::debug!(
                        cycle = self.cycles,
                        units = report.units,
                        published = report.attempted - report.failed,
                        failed = report.failed,
                        "Published unit state"
                    );
                }
                Err(e) => {
                    tracing::error!(cycle = self.cycles, error = %e, "Publish cycle failed");
                }
            }
            tokio::time::sleep(self.interval).await;
        }
    }
}
