//! The polling loop.
//!
//! [`ClarificationMonitor`] logs in, absorbs a baseline snapshot, and then
//! alternates between [`MonitorState::Polling`] and
//! [`MonitorState::BackoffWait`] forever. Startup failures are returned to
//! the caller; nothing after startup is fatal.

use std::time::Duration;

use monitor_core::error::{MonitorError, Result};
use monitor_core::models::{Change, ChangeKind};
use monitor_core::settings::{
    floor_interval, MonitorConfig, DEFAULT_RELOGIN_AFTER, DEFAULT_RETRY_WAIT,
};
use tokio::time;
use tracing::{debug, error, info, warn};

use crate::detector::ChangeDetector;
use crate::notifier::{self, DeliveryOutcome, Notifier};
use crate::source::ClarificationSource;
use crate::store::StateStore;

// ── MonitorState ──────────────────────────────────────────────────────────────

/// Where the monitor is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorState {
    Init,
    LoggingIn,
    Baselining,
    /// Steady state: wait one interval, then poll.
    Polling,
    /// The last poll failed: wait the backoff, then poll again.
    BackoffWait,
}

// ── PollPolicy ────────────────────────────────────────────────────────────────

/// Timing and recovery knobs for the loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    /// Delay between successful polls; never below one second.
    pub interval: Duration,
    /// Delay after a failed poll.
    pub backoff: Duration,
    /// Consecutive session failures before logging in again; 0 disables.
    pub relogin_after: u32,
}

impl PollPolicy {
    pub fn new(interval: Duration, backoff: Duration, relogin_after: u32) -> Self {
        Self {
            interval: floor_interval(Some(interval)),
            backoff,
            relogin_after,
        }
    }

    pub fn from_config(config: &MonitorConfig) -> Self {
        Self::new(
            config.check_interval(),
            config.retry_wait(),
            config.relogin_after,
        )
    }

    /// How long to sleep before the next poll when in `state`.
    pub fn delay_for(&self, state: MonitorState) -> Duration {
        match state {
            MonitorState::Polling => self.interval,
            MonitorState::BackoffWait => self.backoff,
            MonitorState::Init | MonitorState::LoggingIn | MonitorState::Baselining => {
                Duration::ZERO
            }
        }
    }

    /// `true` when `session_failures` consecutive failures warrant a re-login.
    pub fn should_relogin(&self, session_failures: u32) -> bool {
        self.relogin_after > 0 && session_failures > 0 && session_failures % self.relogin_after == 0
    }
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self::new(Duration::from_secs(30), DEFAULT_RETRY_WAIT, DEFAULT_RELOGIN_AFTER)
    }
}

// ── CycleReport ───────────────────────────────────────────────────────────────

/// Counts from one poll.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    /// Records in the fetched snapshot, including ones without an id.
    pub seen: usize,
    pub new: usize,
    pub updated: usize,
    pub delivered: usize,
    /// Deliveries that failed; those records are retried next poll.
    pub failed: usize,
    /// Changes whose message rendered empty.
    pub skipped: usize,
}

// ── ClarificationMonitor ──────────────────────────────────────────────────────

/// Single-task monitor tying source, detector, notifier and store together.
pub struct ClarificationMonitor<S, N> {
    source: S,
    notifier: N,
    store: StateStore,
    policy: PollPolicy,
    state: MonitorState,
    /// Consecutive session-type poll failures since the last good fetch.
    session_failures: u32,
}

impl<S, N> ClarificationMonitor<S, N>
where
    S: ClarificationSource,
    N: Notifier,
{
    pub fn new(source: S, notifier: N, policy: PollPolicy) -> Self {
        Self {
            source,
            notifier,
            store: StateStore::new(),
            policy,
            state: MonitorState::Init,
            session_failures: 0,
        }
    }

    pub fn state(&self) -> MonitorState {
        self.state
    }

    pub fn store(&self) -> &StateStore {
        &self.store
    }

    pub fn policy(&self) -> &PollPolicy {
        &self.policy
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    /// Log in and absorb the baseline snapshot.
    ///
    /// Returns the number of records seeded. Any error here means the
    /// monitor has nothing to compare against and must not continue.
    pub async fn start(&mut self) -> Result<usize> {
        self.state = MonitorState::LoggingIn;
        if let Err(e) = self.source.login().await {
            error!(error = %e, "login failed");
            return Err(e);
        }

        self.state = MonitorState::Baselining;
        let snapshot = match self.source.fetch_snapshot().await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                error!(error = %e, "initial clarification fetch failed");
                return Err(e);
            }
        };

        ChangeDetector::process(&snapshot, &mut self.store);
        let seeded = self.store.len();
        info!(records = snapshot.len(), seeded, "initial clarification snapshot loaded");
        for record in &snapshot {
            debug!(%record, "baseline");
        }

        self.state = MonitorState::Polling;
        Ok(seeded)
    }

    /// Fetch once, announce every change, and remember what was delivered.
    ///
    /// Fetch and parse errors are returned; delivery errors are logged and
    /// counted, leaving the affected records pending for the next poll.
    pub async fn poll_once(&mut self) -> Result<CycleReport> {
        let snapshot = match self.source.fetch_snapshot().await {
            Ok(snapshot) => {
                self.session_failures = 0;
                snapshot
            }
            Err(e) => {
                if e.is_session_failure() {
                    self.session_failures += 1;
                }
                return Err(e);
            }
        };

        let mut report = CycleReport {
            seen: snapshot.len(),
            ..Default::default()
        };

        for change in ChangeDetector::process(&snapshot, &mut self.store) {
            match change.kind {
                ChangeKind::New => {
                    report.new += 1;
                    info!(record = %change.record, "new clarification");
                }
                ChangeKind::Updated => {
                    report.updated += 1;
                    info!(record = %change.record, "clarification answered");
                }
            }

            let outcome = notifier::notify(&self.notifier, &change).await;
            self.settle_delivery(change, outcome, &mut report);
        }

        Ok(report)
    }

    /// Count a delivery attempt and store the record only if it was sent.
    fn settle_delivery(
        &mut self,
        change: Change,
        outcome: Result<DeliveryOutcome>,
        report: &mut CycleReport,
    ) {
        match outcome {
            Ok(DeliveryOutcome::Delivered) => {
                report.delivered += 1;
                self.store.record_delivered(change.record);
            }
            Ok(DeliveryOutcome::SkippedEmpty) => report.skipped += 1,
            Err(e) => {
                report.failed += 1;
                warn!(
                    id = %change.record.id,
                    error = %e,
                    "failed to deliver notification; will retry next poll"
                );
            }
        }
    }

    /// Run until the process is stopped.
    ///
    /// Only returns on a startup failure.
    pub async fn run(&mut self) -> Result<()> {
        self.start().await?;

        loop {
            time::sleep(self.policy.delay_for(self.state)).await;
            self.state = self.poll_step().await;
        }
    }

    /// One poll plus the state transition it implies.
    async fn poll_step(&mut self) -> MonitorState {
        match self.poll_once().await {
            Ok(report) => {
                if report.new + report.updated > 0 {
                    info!(?report, "poll complete");
                } else {
                    debug!(?report, "poll complete");
                }
                MonitorState::Polling
            }
            Err(e @ MonitorError::Parse(_)) => {
                warn!(error = %e, "clarification board unreadable; skipping this poll");
                MonitorState::Polling
            }
            Err(e) => {
                warn!(
                    error = %e,
                    retry_in = ?self.policy.backoff,
                    "failed to fetch clarifications"
                );
                if e.is_session_failure() {
                    self.relogin_if_due().await;
                }
                MonitorState::BackoffWait
            }
        }
    }

    async fn relogin_if_due(&mut self) {
        if !self.policy.should_relogin(self.session_failures) {
            return;
        }
        warn!(
            failures = self.session_failures,
            "repeated session failures; logging in again"
        );
        match self.source.login().await {
            Ok(()) => {
                info!("re-login succeeded");
                self.session_failures = 0;
            }
            Err(e) => error!(error = %e, "re-login failed; will keep polling"),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
