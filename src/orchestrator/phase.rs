/// Where the most recent backtest request stands.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum RequestPhase {
    #[default]
    Idle,
    Loading,
    Success,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PhaseEvent {
    Submitted,
    Succeeded,
    Failed(String),
}

impl RequestPhase {
    /// The one transition function. A submission restarts at `Loading` from
    /// any state; a settlement lands in `Success` or `Failed` whatever came
    /// before, so the last request to complete decides the outcome.
    pub fn next(&self, event: PhaseEvent) -> RequestPhase {
        let next = match event {
            PhaseEvent::Submitted => RequestPhase::Loading,
            PhaseEvent::Succeeded => RequestPhase::Success,
            PhaseEvent::Failed(message) => RequestPhase::Failed(message),
        };
        tracing::debug!(from = ?self, to = ?next, "request phase");
        next
    }

    /// The loading indicator is visible in exactly this state.
    pub fn is_loading(&self) -> bool {
        matches!(self, RequestPhase::Loading)
    }

    pub fn shows_results(&self) -> bool {
        matches!(self, RequestPhase::Success)
    }

    /// Text for the error panel, which is shown only in `Failed`.
    pub fn error_message(&self) -> Option<&str> {
        match self {
            RequestPhase::Failed(message) => Some(message),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn submission_restarts_from_any_state() {
        for from in [
            RequestPhase::Idle,
            RequestPhase::Loading,
            RequestPhase::Success,
            RequestPhase::Failed("x".into()),
        ] {
            assert_eq!(from.next(PhaseEvent::Submitted), RequestPhase::Loading);
        }
    }

    #[test]
    fn panels_follow_state() {
        let loading = RequestPhase::Idle.next(PhaseEvent::Submitted);
        assert!(loading.is_loading());
        assert!(!loading.shows_results());
        assert!(loading.error_message().is_none());

        let failed = loading.next(PhaseEvent::Failed("fund not found".into()));
        assert!(!failed.is_loading());
        assert!(!failed.shows_results());
        assert_eq!(failed.error_message(), Some("fund not found"));

        let ok = failed.next(PhaseEvent::Succeeded);
        assert!(ok.shows_results());
        assert!(ok.error_message().is_none());
    }
}
