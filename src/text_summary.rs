//! Text summary builder for CLI output.
//!
//! Formats the settled application state into human-readable lines for
//! text mode.

use crate::orchestrator::{App, RequestPhase};

/// Pre-formatted lines for text output.
pub(crate) struct TextSummary {
    pub lines: Vec<String>,
}

pub(crate) fn build_text_summary(app: &App) -> TextSummary {
    let mut lines = Vec::new();

    // Notices first, most recent on top, as they stack above the results.
    for notice in app.notices.iter() {
        lines.push(format!("[{}] {}", notice.severity.class(), notice.message));
    }

    match (&app.phase, app.view.as_ref()) {
        (RequestPhase::Failed(message), _) => {
            lines.push(format!("Error: {message}"));
        }
        (RequestPhase::Success, Some(view)) => {
            let width = view
                .kpi_cards
                .iter()
                .map(|c| c.label.len())
                .max()
                .unwrap_or(0);
            for card in &view.kpi_cards {
                lines.push(format!("{:<width$}  {}", card.label, card.value));
            }
            lines.push(String::new());
            lines.extend(view.assumptions.iter().cloned());

            let a = &view.analytics;
            if !a.yearly.is_empty() {
                lines.push(String::new());
                lines.push("Yearly returns:".into());
                for (year, r) in &a.yearly {
                    lines.push(format!("  {year}  {:>7.2}%", r * 100.0));
                }
            }
            if a.months > 0 {
                lines.push(format!(
                    "Positive months: {} of {}",
                    a.positive_months, a.months
                ));
            }
        }
        _ => lines.push("No result.".into()),
    }

    TextSummary { lines }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::error::BacktestError;
    use crate::tabs::Tab;
    use crate::test_support::{sample_benchmarks, sample_funds, sample_result_json};
    use std::time::Instant;
    use time::macros::date;

    fn app() -> App {
        App::new(
            &Settings::default(),
            date!(2025 - 01 - 15),
            sample_funds(),
            &sample_benchmarks(),
            Tab::Equity,
        )
    }

    #[test]
    fn success_lists_kpis_assumptions_and_notices() {
        let mut a = app();
        let mut v = sample_result_json(24);
        v["warnings"] = serde_json::json!(["XYZ"]);
        let (id, _) = a.submit();
        a.settle(id, Ok(serde_json::from_value(v).unwrap()), Instant::now());

        let lines = build_text_summary(&a).lines;
        assert_eq!(lines[0], "[warning] Warning: Failed to fetch data for: XYZ");
        assert!(lines[1].starts_with("Final Value"));
        assert!(lines[1].ends_with("$123,456"));
        assert!(lines.iter().any(|l| l == "Rebalance: Annual, Annual fee: 0.20%"));
        assert!(lines.iter().any(|l| l == "  2020    -3.00%"));
        assert_eq!(lines.last().unwrap(), "Positive months: 2 of 3");
    }

    #[test]
    fn failure_prints_only_the_error() {
        let mut a = app();
        let (id, _) = a.submit();
        a.settle(
            id,
            Err(BacktestError::Service("fund not found".into())),
            Instant::now(),
        );
        assert_eq!(build_text_summary(&a).lines, ["Error: fund not found"]);
    }
}
