//! Application-level orchestration.
//!
//! `App` holds the state every presentation layer reads and the handlers
//! that change it. The controller performs service calls off the UI thread
//! and reports completions as events.

mod app;
mod controller;
mod phase;

pub(crate) use app::App;
#[cfg(test)]
pub(crate) use app::{SubmissionId, CACHE_CLEARED_MESSAGE};
pub(crate) use controller::{run_controller, AppEvent, UiCommand};
pub(crate) use phase::RequestPhase;
