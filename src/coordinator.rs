//! Polling of one stop and publication of its latest good board.
//!
//! [`PollCoordinator::refresh`] runs a single fetch-and-normalize cycle. A
//! successful cycle replaces the published board wholesale; a failed one only
//! records the error, so readers keep the last known-good board through
//! outages. At most one fetch is in flight per coordinator, and nothing is
//! written once [`PollCoordinator::shutdown`] has returned.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::{RwLock, watch};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::board::{DepartureBoard, build_board};
use crate::error::FetchError;
use crate::services::DeparturesApi;
use crate::time::parse_timestamp;

/// Source of the reference instant for each cycle.
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// Per-stop polling parameters, already validated.
#[derive(Debug, Clone)]
pub struct PollSettings {
    pub stop_id: String,
    pub max_departures: usize,
    pub request_timeout: Duration,
    pub timezone: Tz,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollPhase {
    /// No fetch has succeeded yet.
    Uninitialized,
    /// A board has been published. Failures never leave this phase.
    Ready,
}

/// What the display layer can read at any time.
#[derive(Debug, Clone, Default)]
pub struct PollState {
    pub last_good_board: Option<Arc<DepartureBoard>>,
    pub last_error: Option<FetchError>,
    /// When the last good board was committed.
    pub last_success: Option<DateTime<Utc>>,
    /// The feed's own `lastUpdate` stamp from the last good payload.
    pub upstream_last_update: Option<DateTime<Utc>>,
}

impl PollState {
    pub fn phase(&self) -> PollPhase {
        if self.last_good_board.is_some() {
            PollPhase::Ready
        } else {
            PollPhase::Uninitialized
        }
    }

    /// A board is shown but the latest fetch failed.
    pub fn is_stale(&self) -> bool {
        self.last_good_board.is_some() && self.last_error.is_some()
    }
}

pub struct PollCoordinator<A> {
    api: A,
    settings: PollSettings,
    clock: Clock,
    state: RwLock<PollState>,
    in_flight: AtomicBool,
    shutdown: watch::Sender<bool>,
}

impl<A: DeparturesApi> PollCoordinator<A> {
    pub fn new(api: A, settings: PollSettings) -> Self {
        let (shutdown, _) = watch::channel(false);
        Self {
            api,
            settings,
            clock: Arc::new(Utc::now),
            state: RwLock::new(PollState::default()),
            in_flight: AtomicBool::new(false),
            shutdown,
        }
    }

    /// Replaces the wall clock used as `now` for each cycle.
    pub fn with_clock<F>(mut self, clock: F) -> Self
    where
        F: Fn() -> DateTime<Utc> + Send + Sync + 'static,
    {
        self.clock = Arc::new(clock);
        self
    }

    pub fn settings(&self) -> &PollSettings {
        &self.settings
    }

    /// Fetches departures once and publishes the resulting board.
    ///
    /// The instant the response arrived is used as `now` for normalization.
    ///
    /// # Errors
    ///
    /// - [`FetchError::Busy`] if another refresh is in flight; state is untouched.
    /// - [`FetchError::Cancelled`] if the coordinator is or gets shut down; state
    ///   is untouched.
    /// - Any other [`FetchError`] is recorded as the last error while the
    ///   previous board stays published.
    #[tracing::instrument(skip(self), fields(stop_id = %self.settings.stop_id))]
    pub async fn refresh(&self) -> Result<Arc<DepartureBoard>, FetchError> {
        if self.is_shut_down() {
            return Err(FetchError::Cancelled);
        }

        let Some(_in_flight) = InFlight::acquire(&self.in_flight) else {
            debug!("Refresh already in flight, discarding trigger");
            return Err(FetchError::Busy);
        };

        let timeout = self.settings.request_timeout;
        let mut shutdown = self.shutdown.subscribe();

        let fetched = tokio::select! {
            _ = shutdown.wait_for(|closed| *closed) => {
                debug!("Shut down during fetch, abandoning request");
                return Err(FetchError::Cancelled);
            }
            result = tokio::time::timeout(timeout, self.api.fetch_departures(&self.settings.stop_id)) => {
                result.unwrap_or(Err(FetchError::Timeout(timeout)))
            }
        };

        let now = (self.clock)();
        let mut state = self.state.write().await;
        if self.is_shut_down() {
            return Err(FetchError::Cancelled);
        }

        match fetched {
            Ok(payload) => {
                let board = Arc::new(build_board(
                    &payload.departures,
                    now,
                    self.settings.max_departures,
                    self.settings.timezone,
                ));

                state.last_good_board = Some(Arc::clone(&board));
                state.last_error = None;
                state.last_success = Some(now);
                state.upstream_last_update = payload
                    .last_update()
                    .and_then(|raw| parse_timestamp(&raw, self.settings.timezone).ok());

                info!(
                    received = payload.departures.len(),
                    departures = board.len(),
                    "Board refreshed"
                );
                Ok(board)
            }
            Err(e) => {
                if e.is_fetch_failure() {
                    warn!(
                        error = %e,
                        kept_previous = state.last_good_board.is_some(),
                        "Departures fetch failed"
                    );
                    state.last_error = Some(e.clone());
                }
                Err(e)
            }
        }
    }

    pub async fn current_board(&self) -> Option<Arc<DepartureBoard>> {
        self.state.read().await.last_good_board.clone()
    }

    pub async fn current_error(&self) -> Option<FetchError> {
        self.state.read().await.last_error.clone()
    }

    pub async fn snapshot(&self) -> PollState {
        self.state.read().await.clone()
    }

    pub async fn phase(&self) -> PollPhase {
        self.state.read().await.phase()
    }

    pub fn is_shut_down(&self) -> bool {
        *self.shutdown.borrow()
    }

    /// Stops polling and abandons any in-flight fetch.
    ///
    /// Once this returns, no refresh writes to the state anymore.
    pub async fn shutdown(&self) {
        self.shutdown.send_replace(true);
        // Wait out a commit that already holds the lock.
        let _state = self.state.write().await;
        info!(stop_id = %self.settings.stop_id, "Coordinator shut down");
    }

    /// Refreshes every `period` until shut down, handing each cycle's state to
    /// `on_cycle`. Discarded triggers are not reported.
    ///
    /// # Panics
    ///
    /// Panics if `period` is zero.
    pub async fn run<F>(&self, period: Duration, mut on_cycle: F)
    where
        F: FnMut(&PollState),
    {
        let mut shutdown = self.shutdown.subscribe();
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!(
            stop_id = %self.settings.stop_id,
            period_secs = period.as_secs(),
            "Polling started"
        );

        loop {
            tokio::select! {
                _ = shutdown.wait_for(|closed| *closed) => break,
                _ = ticker.tick() => {}
            }

            match self.refresh().await {
                Err(FetchError::Cancelled) => break,
                Err(FetchError::Busy) => continue,
                _ => {}
            }

            let state = self.snapshot().await;
            on_cycle(&state);
        }

        info!(stop_id = %self.settings.stop_id, "Polling stopped");
    }
}

/// Marks a fetch as in flight until dropped.
struct InFlight<'a>(&'a AtomicBool);

impl<'a> InFlight<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}
