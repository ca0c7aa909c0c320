//! Form defaults and client timings.
//!
//! Values come from an optional JSON file (`--config`); anything missing
//! falls back to the defaults below, and explicit CLI flags win over both.

use crate::model::format_date;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use time::Date;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub fund_id: String,
    /// `None` means ten years before today.
    pub start_date: Option<String>,
    /// `None` means today.
    pub end_date: Option<String>,
    pub start_amount: f64,
    pub currency: String,
    pub rebalance: String,
    pub fee_toggle: bool,
    /// Used until a catalog fund supplies its own default fee.
    pub fee_value: f64,
    pub rf_rate: f64,
    pub benchmarks: Vec<String>,
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,
    #[serde(with = "humantime_serde")]
    pub notice_ttl: Duration,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            fund_id: "F1".into(),
            start_date: None,
            end_date: None,
            start_amount: 100_000.0,
            currency: "USD".into(),
            rebalance: "Annual".into(),
            fee_toggle: true,
            fee_value: 0.002,
            rf_rate: 0.0,
            benchmarks: vec!["SPY".into(), "60/40".into(), "GLD".into()],
            timeout: Duration::from_secs(120),
            notice_ttl: Duration::from_secs(5),
        }
    }
}

impl Settings {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("read config {}", path.display()))?;
        serde_json::from_str(&raw).with_context(|| format!("parse config {}", path.display()))
    }

    /// Resolve the date window, filling gaps relative to `today`.
    pub fn window(&self, today: Date) -> (String, String) {
        let start = self
            .start_date
            .clone()
            .unwrap_or_else(|| format_date(years_before(today, 10)));
        let end = self.end_date.clone().unwrap_or_else(|| format_date(today));
        (start, end)
    }
}

/// Same calendar day `years` earlier; 29 February maps to the 28th.
fn years_before(d: Date, years: i32) -> Date {
    let year = d.year() - years;
    d.replace_year(year)
        .or_else(|_| Date::from_calendar_date(year, d.month(), 28))
        .unwrap_or(d)
}
