//! Application state and the handlers that move it.
//!
//! `App` is owned by whichever loop drives the interface. Handlers take the
//! current time as an argument so notice expiry is reproducible.

use super::phase::{PhaseEvent, RequestPhase};
use crate::benchmarks::BENCHMARK_LIMIT_MESSAGE;
use crate::catalog::{BenchmarkCatalog, FundCatalog};
use crate::config::Settings;
use crate::error::BacktestError;
use crate::export::{self, CsvArtifact};
use crate::form::FormState;
use crate::model::{BacktestRequest, BacktestResult};
use crate::notify::{NotificationManager, Severity};
use crate::render::{self, ResultView};
use crate::tabs::{Tab, TabController};
use std::time::Instant;

pub const CACHE_CLEARED_MESSAGE: &str = "Cache cleared. Rerun the backtest.";

/// Monotonic id handed out per submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct SubmissionId(pub u64);

pub struct App {
    pub funds: FundCatalog,
    pub form: FormState,
    pub phase: RequestPhase,
    /// Most recent successful result; the only input to CSV export.
    pub current: Option<BacktestResult>,
    pub view: Option<ResultView>,
    pub notices: NotificationManager,
    pub tabs: TabController,
    started: u64,
    settled: u64,
}

impl App {
    pub fn new(
        settings: &Settings,
        today: time::Date,
        funds: FundCatalog,
        benchmarks: &BenchmarkCatalog,
        initial_tab: Tab,
    ) -> Self {
        let form = FormState::new(settings, today, &funds, benchmarks);
        Self {
            funds,
            form,
            phase: RequestPhase::Idle,
            current: None,
            view: None,
            notices: NotificationManager::new(settings.notice_ttl),
            tabs: TabController::new(initial_tab),
            started: 0,
            settled: 0,
        }
    }

    /// Start a submission: move to `Loading` (hiding results and any error
    /// panel) and build a fresh request from the form. Nothing blocks a
    /// submission while another is still in flight.
    pub fn submit(&mut self) -> (SubmissionId, BacktestRequest) {
        self.started += 1;
        let id = SubmissionId(self.started);
        self.phase = self.phase.next(PhaseEvent::Submitted);
        let request = self.form.collect();
        tracing::info!(
            id = id.0,
            fund = %request.fund_id,
            benchmarks = ?request.benchmarks,
            "submitting backtest"
        );
        (id, request)
    }

    /// Apply a completed call. Whichever call completes last wins, even if
    /// it was submitted earlier.
    pub fn settle(
        &mut self,
        id: SubmissionId,
        outcome: Result<BacktestResult, BacktestError>,
        now: Instant,
    ) {
        self.settled += 1;
        if id.0 != self.started {
            tracing::debug!(
                id = id.0,
                latest = self.started,
                "earlier submission completed after a newer one started"
            );
        }

        match outcome {
            Ok(result) => {
                self.view = Some(render::render(&result, &self.form));
                if !result.warnings().is_empty() {
                    self.notices.push(
                        Severity::Warning,
                        format!(
                            "Warning: Failed to fetch data for: {}",
                            result.warnings().join(", ")
                        ),
                        now,
                    );
                }
                if !result.missing_tickers().is_empty() {
                    self.notices.push(
                        Severity::Info,
                        format!(
                            "Note: These tickers were dropped (weights renormalized): {}",
                            result.missing_tickers().join(", ")
                        ),
                        now,
                    );
                }
                self.current = Some(result);
                self.phase = self.phase.next(PhaseEvent::Succeeded);
            }
            Err(err) => {
                let message = err.to_string();
                tracing::error!(id = id.0, error = %message, "backtest failed");
                if err.is_malformed() {
                    self.notices.push(Severity::Error, message.clone(), now);
                }
                self.phase = self.phase.next(PhaseEvent::Failed(message));
            }
        }
    }

    pub fn cache_cleared(&mut self, now: Instant) {
        self.notices.push(Severity::Info, CACHE_CLEARED_MESSAGE, now);
    }

    pub fn toggle_benchmark(&mut self, index: usize, now: Instant) {
        if self.form.benchmarks.toggle(index) {
            self.notices
                .push(Severity::Warning, BENCHMARK_LIMIT_MESSAGE, now);
        }
    }

    pub fn cycle_fund(&mut self, forward: bool) {
        self.form.cycle_fund(&self.funds, forward);
    }

    pub fn set_fee_enabled(&mut self, enabled: bool) {
        self.form.set_fee_enabled(enabled);
    }

    /// CSV for the current result; `None` (and no error) when there is none.
    pub fn export_csv(&self) -> Option<CsvArtifact> {
        export::artifact(self.current.as_ref())
    }

    /// Drop notices whose time is up.
    pub fn tick(&mut self, now: Instant) {
        self.notices.expire(now);
    }

    pub fn loading_indicator(&self) -> bool {
        self.phase.is_loading()
    }

    pub fn in_flight(&self) -> u64 {
        self.started.saturating_sub(self.settled)
    }
}
