//! Shared fixtures for unit tests.

use crate::catalog::{BenchmarkCatalog, FundCatalog};
use crate::model::{BacktestRequest, BacktestResult};
use serde_json::json;

pub fn sample_request() -> BacktestRequest {
    BacktestRequest {
        fund_id: "F1".into(),
        start_date: "2015-01-01".into(),
        end_date: "2025-01-01".into(),
        start_amount: 100_000.0,
        currency: "USD".into(),
        rebalance: "Annual".into(),
        fee_toggle: true,
        fee_value: 0.002,
        rf_rate: 0.0,
        benchmarks: vec!["SPY".into(), "GLD".into()],
    }
}

/// Monthly dates starting 2020-01-01.
pub fn monthly_dates(n: usize) -> Vec<String> {
    (0..n)
        .map(|i| format!("{}-{:02}-01", 2020 + i / 12, i % 12 + 1))
        .collect()
}

pub fn sample_result_json(points: usize) -> serde_json::Value {
    let dates = monthly_dates(points);
    let equity: Vec<f64> = (0..points).map(|i| 1.0 + i as f64 * 0.01).collect();
    json!({
        "success": true,
        "fund_name": "Fund 1 — Core Income (low risk)",
        "effective_start": dates.first().cloned().unwrap_or_default(),
        "effective_end": dates.last().cloned().unwrap_or_default(),
        "portfolio": { "dates": dates, "equity": equity },
        "benchmarks": [
            { "name": "S&P 500 (SPY)", "dates": dates, "data": equity }
        ],
        "kpis": {
            "final_value": "$123,456",
            "abs_return": "23.46%",
            "cagr": "4.30%",
            "vol": "6.12%",
            "pct_pos_months": "58.33%"
        },
        "analytics": {
            "yearly_returns": { "2021": 0.12, "2020": -0.03 },
            "monthly_returns": [0.01, -0.02, 0.03],
            "rolling_12m": { "data": [0.05, 0.07], "dates": ["2021-01-01", "2021-02-01"] }
        },
        "missing_tickers": [],
        "warnings": []
    })
}

pub fn sample_result(points: usize) -> BacktestResult {
    serde_json::from_value(sample_result_json(points)).expect("fixture parses")
}

pub fn sample_funds() -> FundCatalog {
    FundCatalog::from_json(
        r#"{
            "F1": {"name": "Fund 1 — Core Income (low risk)", "default_fee": 0.002, "default_rebalance": "Annual"},
            "F2": {"name": "Fund 2 — Pro Core", "default_fee": 0.0035}
        }"#,
    )
    .expect("fund fixture parses")
}

pub fn sample_benchmarks() -> BenchmarkCatalog {
    BenchmarkCatalog::from_json(
        r#"{
            "SPY": {"name": "S&P 500 (SPY)"},
            "GLD": {"name": "Gold (GLD)"},
            "VEA": {"name": "Developed ex-US (VEA)"},
            "60/40": {"name": "60/40 (SPY/IEF)"},
            "IEF": {"name": "UST 7-10y (IEF)"}
        }"#,
    )
    .expect("benchmark fixture parses")
}
