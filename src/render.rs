//! Result-to-view transformation.
//!
//! Everything here is pure: a result (plus the form it was rendered against)
//! goes in, display fragments come out. Drawing them is the TUI's job.

use crate::form::{parse_number, FormState};
use crate::model::{parse_date, BacktestResult};
use time::Date;

pub const KPI_LABELS: [&str; 5] = [
    "Final Value",
    "Absolute Return",
    "CAGR",
    "Volatility (ann.)",
    "% Positive Months",
];

pub const DATA_DISCLAIMER: &str =
    "Prices via Yahoo Finance (auto-adjusted 'Close'). Prototype — not investment advice.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KpiCard {
    pub label: &'static str,
    pub value: String,
}

/// A plottable line: x is days since the portfolio's first date.
#[derive(Debug, Clone, Default)]
pub struct Curve {
    pub name: String,
    pub points: Vec<(f64, f64)>,
}

#[derive(Debug, Clone, Default)]
pub struct EquityView {
    pub portfolio: Curve,
    pub benchmarks: Vec<Curve>,
    pub first_date: String,
    pub last_date: String,
}

#[derive(Debug, Clone, Default)]
pub struct AnalyticsView {
    /// (year, return) ascending by year.
    pub yearly: Vec<(String, f64)>,
    pub rolling_12m: Curve,
    pub months: usize,
    pub positive_months: usize,
}

#[derive(Debug, Clone)]
pub struct ResultView {
    pub kpi_cards: [KpiCard; 5],
    pub assumptions: Vec<String>,
    pub equity: EquityView,
    pub analytics: AnalyticsView,
}

pub fn render(result: &BacktestResult, form: &FormState) -> ResultView {
    ResultView {
        kpi_cards: kpi_cards(result),
        assumptions: assumptions(result, form),
        equity: equity_view(result),
        analytics: analytics_view(&result.analytics, first_date(result)),
    }
}

/// Five cards in fixed order; values are shown exactly as received.
pub fn kpi_cards(result: &BacktestResult) -> [KpiCard; 5] {
    let k = &result.kpis;
    let values = [&k.final_value, &k.abs_return, &k.cagr, &k.vol, &k.pct_pos_months];
    std::array::from_fn(|i| KpiCard {
        label: KPI_LABELS[i],
        value: values[i].clone(),
    })
}

/// Annual fee as a percentage with two decimals. Unparsable input renders as
/// `NaN%`.
pub fn fee_percent(raw_fee: &str) -> String {
    format!("{:.2}%", parse_number(raw_fee) * 100.0)
}

pub fn assumptions(result: &BacktestResult, form: &FormState) -> Vec<String> {
    vec![
        format!("Fund: {}", result.fund_name),
        format!(
            "Effective window: {} → {} (aligned across tickers)",
            result.effective_start, result.effective_end
        ),
        format!(
            "Rebalance: {}, Annual fee: {}",
            form.rebalance,
            fee_percent(&form.fee_value)
        ),
        DATA_DISCLAIMER.to_string(),
    ]
}

fn first_date(result: &BacktestResult) -> Option<Date> {
    result.portfolio.dates.first().and_then(|d| parse_date(d))
}

/// Pair dates with values as (days since `origin`, value), skipping dates
/// that do not parse.
fn to_points(origin: Option<Date>, dates: &[String], values: &[f64]) -> Vec<(f64, f64)> {
    let Some(origin) = origin else {
        return Vec::new();
    };
    dates
        .iter()
        .zip(values)
        .filter_map(|(d, v)| {
            let day = parse_date(d)?;
            Some(((day - origin).whole_days() as f64, *v))
        })
        .collect()
}

pub fn equity_view(result: &BacktestResult) -> EquityView {
    let origin = first_date(result);
    let p = &result.portfolio;
    EquityView {
        portfolio: Curve {
            name: "Portfolio".into(),
            points: to_points(origin, &p.dates, &p.equity),
        },
        benchmarks: result
            .benchmarks
            .iter()
            .map(|b| Curve {
                name: b.name.clone(),
                points: to_points(origin, &b.dates, &b.data),
            })
            .collect(),
        first_date: p.dates.first().cloned().unwrap_or_default(),
        last_date: p.dates.last().cloned().unwrap_or_default(),
    }
}

/// Read the pieces of the analytics block the view knows about. Missing or
/// differently shaped entries simply render empty.
pub fn analytics_view(analytics: &serde_json::Value, origin: Option<Date>) -> AnalyticsView {
    let mut yearly: Vec<(String, f64)> = analytics
        .get("yearly_returns")
        .and_then(|v| v.as_object())
        .map(|m| {
            m.iter()
                .filter_map(|(year, r)| Some((year.clone(), r.as_f64()?)))
                .collect()
        })
        .unwrap_or_default();
    yearly.sort_by(|a, b| a.0.cmp(&b.0));

    let monthly: Vec<f64> = analytics
        .get("monthly_returns")
        .and_then(|v| v.as_array())
        .map(|a| a.iter().filter_map(|v| v.as_f64()).collect())
        .unwrap_or_default();

    let rolling = analytics.get("rolling_12m");
    let strings = |key: &str| -> Vec<String> {
        rolling
            .and_then(|r| r.get(key))
            .and_then(|v| v.as_array())
            .map(|a| {
                a.iter()
                    .filter_map(|v| v.as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default()
    };
    let rolling_dates = strings("dates");
    let rolling_data: Vec<f64> = rolling
        .and_then(|r| r.get("data"))
        .and_then(|v| v.as_array())
        .map(|a| a.iter().filter_map(|v| v.as_f64()).collect())
        .unwrap_or_default();

    AnalyticsView {
        yearly,
        rolling_12m: Curve {
            name: "Rolling 12m".into(),
            points: to_points(origin, &rolling_dates, &rolling_data),
        },
        months: monthly.len(),
        positive_months: monthly.iter().filter(|r| **r > 0.0).count(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::test_support::{sample_benchmarks, sample_funds, sample_result};
    use time::macros::date;

    fn form() -> FormState {
        FormState::new(
            &Settings::default(),
            date!(2025 - 01 - 15),
            &sample_funds(),
            &sample_benchmarks(),
        )
    }

    #[test]
    fn kpi_cards_keep_order_and_values() {
        let cards = kpi_cards(&sample_result(3));
        let labels: Vec<_> = cards.iter().map(|c| c.label).collect();
        assert_eq!(labels, KPI_LABELS);
        assert_eq!(cards[0].value, "$123,456");
        assert_eq!(cards[4].value, "58.33%");
    }

    #[test]
    fn assumptions_use_form_rebalance_and_fee() {
        let mut f = form();
        f.rebalance = "None".into();
        f.fee_value = "0.0125".into();
        let lines = assumptions(&sample_result(3), &f);
        assert_eq!(lines[0], "Fund: Fund 1 — Core Income (low risk)");
        assert_eq!(
            lines[1],
            "Effective window: 2020-01-01 → 2020-03-01 (aligned across tickers)"
        );
        assert_eq!(lines[2], "Rebalance: None, Annual fee: 1.25%");
        assert_eq!(lines[3], DATA_DISCLAIMER);
    }

    #[test]
    fn fee_percent_formats_two_decimals() {
        assert_eq!(fee_percent("0.002"), "0.20%");
        assert_eq!(fee_percent("abc"), "NaN%");
    }

    #[test]
    fn equity_points_use_day_offsets() {
        let v = equity_view(&sample_result(3));
        let xs: Vec<f64> = v.portfolio.points.iter().map(|p| p.0).collect();
        assert_eq!(xs, [0.0, 31.0, 60.0]);
        assert_eq!(v.benchmarks.len(), 1);
        assert_eq!(v.benchmarks[0].points.len(), 3);
        assert_eq!(v.last_date, "2020-03-01");
    }

    #[test]
    fn analytics_reads_known_sections() {
        let r = sample_result(24);
        let a = analytics_view(&r.analytics, parse_date("2020-01-01"));
        assert_eq!(
            a.yearly,
            vec![("2020".to_string(), -0.03), ("2021".to_string(), 0.12)]
        );
        assert_eq!(a.months, 3);
        assert_eq!(a.positive_months, 2);
        assert_eq!(a.rolling_12m.points, vec![(366.0, 0.05), (397.0, 0.07)]);
    }

    #[test]
    fn analytics_tolerates_unknown_shape() {
        let a = analytics_view(&serde_json::json!("opaque"), None);
        assert!(a.yearly.is_empty());
        assert!(a.rolling_12m.points.is_empty());
        assert_eq!(a.months, 0);
    }

    #[test]
    fn render_combines_sections() {
        let view = render(&sample_result(24), &form());
        assert_eq!(view.kpi_cards.len(), 5);
        assert_eq!(view.assumptions.len(), 4);
        assert_eq!(view.equity.portfolio.points.len(), 24);
    }
}
