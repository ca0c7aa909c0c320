//! Request controller.
//!
//! Runs on the tokio runtime, performs service calls on behalf of the UI loop
//! and reports completions back as events.

use super::app::SubmissionId;
use crate::client::BacktestClient;
use crate::error::BacktestError;
use crate::model::{BacktestRequest, BacktestResult};
use crate::notify::Severity;
use anyhow::Result;
use futures::FutureExt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};
use tokio::task::JoinSet;

/// Commands emitted by presentation layers.
#[derive(Debug, Clone)]
pub(crate) enum UiCommand {
    Submit {
        id: SubmissionId,
        request: BacktestRequest,
    },
    ClearCache,
    Quit,
}

/// Completions reported back to presentation layers.
#[derive(Debug)]
pub(crate) enum AppEvent {
    BacktestSettled {
        id: SubmissionId,
        outcome: Result<BacktestResult, BacktestError>,
    },
    CacheCleared,
    Notice(Severity, String),
}

/// Serve UI commands until `Quit` or the command channel closes.
///
/// Every submission gets its own task; nothing is queued or cancelled, so
/// completions arrive in whatever order the service answers.
pub(crate) async fn run_controller(
    client: BacktestClient,
    event_tx: UnboundedSender<AppEvent>,
    mut cmd_rx: UnboundedReceiver<UiCommand>,
) -> Result<()> {
    let mut tasks: JoinSet<Option<AppEvent>> = JoinSet::new();

    loop {
        tokio::select! {
            cmd = cmd_rx.recv() => {
                match cmd {
                    Some(UiCommand::Submit { id, request }) => {
                        let client = client.clone();
                        tasks.spawn(async move {
                            Some(settle_submission(id, client.submit(&request)).await)
                        });
                    }
                    Some(UiCommand::ClearCache) => {
                        let client = client.clone();
                        tasks.spawn(async move {
                            match client.clear_cache().await {
                                Ok(()) => Some(AppEvent::CacheCleared),
                                Err(e) => {
                                    tracing::warn!(error = %e, "cache clear failed");
                                    None
                                }
                            }
                        });
                    }
                    Some(UiCommand::Quit) | None => break,
                }
            }
            // Guarded: an empty JoinSet resolves to None immediately.
            Some(joined) = tasks.join_next(), if !tasks.is_empty() => {
                match joined {
                    Ok(Some(event)) => {
                        if event_tx.send(event).is_err() {
                            tracing::debug!("event receiver dropped");
                            break;
                        }
                    }
                    Ok(None) => {}
                    Err(e) => {
                        tracing::error!(error = %e, "request task failed");
                        let _ = event_tx.send(AppEvent::Notice(
                            Severity::Error,
                            format!("Request task failed: {e}"),
                        ));
                    }
                }
            }
        }
    }

    if !tasks.is_empty() {
        tracing::debug!(pending = tasks.len(), "dropping in-flight requests on quit");
    }
    tasks.abort_all();
    Ok(())
}

/// Drive one submission to its settled event. A panic inside the call
/// still settles `id`, as a failure, so the loading state always clears.
async fn settle_submission<F>(id: SubmissionId, call: F) -> AppEvent
where
    F: Future<Output = Result<BacktestResult, BacktestError>>,
{
    let outcome = match AssertUnwindSafe(call).catch_unwind().await {
        Ok(outcome) => outcome,
        Err(_) => {
            tracing::error!(id = id.0, "backtest request panicked");
            Err(BacktestError::service(None))
        }
    };
    AppEvent::BacktestSettled { id, outcome }
}
