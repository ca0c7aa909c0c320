use serde::{Deserialize, Deserializer, Serialize};
use time::macros::format_description;
use time::Date;

/// Payload posted to the backtest endpoint.
///
/// Numeric fields that failed to parse carry `f64::NAN`; `serde_json` writes
/// those as `null`, so the service sees a non-numeric value rather than a
/// client-side rejection.
#[derive(Debug, Clone, Serialize)]
pub struct BacktestRequest {
    pub fund_id: String,
    pub start_date: String,
    pub end_date: String,
    pub start_amount: f64,
    pub currency: String,
    pub rebalance: String,
    pub fee_toggle: bool,
    pub fee_value: f64,
    pub rf_rate: f64,
    pub benchmarks: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestResult {
    pub fund_name: String,
    pub effective_start: String,
    pub effective_end: String,
    pub kpis: Kpis,
    pub portfolio: PortfolioSeries,
    #[serde(default)]
    pub benchmarks: Vec<BenchmarkSeries>,
    // Passed through to the analytics view untouched.
    #[serde(default)]
    pub analytics: serde_json::Value,
    #[serde(default)]
    pub warnings: Option<Vec<String>>,
    #[serde(default)]
    pub missing_tickers: Option<Vec<String>>,
}

/// Pre-formatted KPI values. The service may send strings or bare numbers;
/// both are kept verbatim as text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Kpis {
    #[serde(deserialize_with = "scalar_text")]
    pub final_value: String,
    #[serde(deserialize_with = "scalar_text")]
    pub abs_return: String,
    #[serde(deserialize_with = "scalar_text")]
    pub cagr: String,
    #[serde(deserialize_with = "scalar_text")]
    pub vol: String,
    #[serde(deserialize_with = "scalar_text")]
    pub pct_pos_months: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PortfolioSeries {
    pub dates: Vec<String>,
    pub equity: Vec<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchmarkSeries {
    pub name: String,
    pub dates: Vec<String>,
    pub data: Vec<f64>,
}

/// Body of a non-success response.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorPayload {
    #[serde(default, deserialize_with = "optional_scalar_text")]
    pub error: Option<String>,
}

fn scalar_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let v = serde_json::Value::deserialize(deserializer)?;
    Ok(match v {
        serde_json::Value::String(s) => s,
        other => other.to_string(),
    })
}

fn optional_scalar_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let v = serde_json::Value::deserialize(deserializer)?;
    Ok(match v {
        serde_json::Value::Null => None,
        serde_json::Value::String(s) => Some(s),
        other => Some(other.to_string()),
    })
}

/// Parse a `YYYY-MM-DD` calendar date.
pub fn parse_date(s: &str) -> Option<Date> {
    Date::parse(s.trim(), format_description!("[year]-[month]-[day]")).ok()
}

pub fn format_date(d: Date) -> String {
    d.format(format_description!("[year]-[month]-[day]"))
        .unwrap_or_else(|_| d.to_string())
}

impl PortfolioSeries {
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    /// Check that dates and equity line up and the dates strictly ascend.
    pub fn validate(&self) -> Result<(), String> {
        if self.dates.len() != self.equity.len() {
            return Err(format!(
                "portfolio has {} dates but {} equity values",
                self.dates.len(),
                self.equity.len()
            ));
        }
        let mut prev: Option<Date> = None;
        for raw in &self.dates {
            let d = parse_date(raw).ok_or_else(|| format!("invalid portfolio date {raw:?}"))?;
            if let Some(p) = prev {
                if d <= p {
                    return Err(format!("portfolio dates not ascending at {raw}"));
                }
            }
            prev = Some(d);
        }
        Ok(())
    }
}

impl BacktestResult {
    pub fn validate(&self) -> Result<(), String> {
        for (label, raw) in [
            ("effective start", &self.effective_start),
            ("effective end", &self.effective_end),
        ] {
            if parse_date(raw).is_none() {
                return Err(format!("invalid {label} date {raw:?}"));
            }
        }
        self.portfolio.validate()
    }

    /// Instruments that failed to fetch, if any.
    pub fn warnings(&self) -> &[String] {
        self.warnings.as_deref().unwrap_or_default()
    }

    /// Instruments dropped from the fund (weights renormalized), if any.
    pub fn missing_tickers(&self) -> &[String] {
        self.missing_tickers.as_deref().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{sample_request, sample_result_json};

    #[test]
    fn unparsable_numbers_serialize_as_null() {
        let mut req = sample_request();
        req.start_amount = f64::NAN;
        let v = serde_json::to_value(&req).unwrap();
        assert!(v["start_amount"].is_null());
        assert_eq!(v["fee_value"], serde_json::json!(0.002));
        assert_eq!(v["benchmarks"], serde_json::json!(["SPY", "GLD"]));
    }

    #[test]
    fn result_accepts_numeric_kpis_and_missing_optionals() {
        let mut v = sample_result_json(3);
        v["kpis"]["cagr"] = serde_json::json!(0.071);
        v.as_object_mut().unwrap().remove("warnings");
        v["missing_tickers"] = serde_json::Value::Null;
        let r: BacktestResult = serde_json::from_value(v).unwrap();
        assert_eq!(r.kpis.cagr, "0.071");
        assert!(r.warnings().is_empty());
        assert!(r.missing_tickers().is_empty());
        assert!(r.validate().is_ok());
    }

    #[test]
    fn validate_rejects_length_mismatch() {
        let mut v = sample_result_json(3);
        v["portfolio"]["equity"] = serde_json::json!([1.0, 1.1]);
        let r: BacktestResult = serde_json::from_value(v).unwrap();
        assert!(r.validate().unwrap_err().contains("3 dates but 2"));
    }

    #[test]
    fn validate_rejects_unordered_dates() {
        let mut v = sample_result_json(2);
        v["portfolio"]["dates"] = serde_json::json!(["2020-02-01", "2020-02-01"]);
        let r: BacktestResult = serde_json::from_value(v).unwrap();
        assert!(r.validate().is_err());
    }

    #[test]
    fn validate_rejects_bad_effective_date() {
        let mut v = sample_result_json(3);
        v["effective_end"] = serde_json::json!("../../evil");
        let r: BacktestResult = serde_json::from_value(v).unwrap();
        assert!(r.validate().unwrap_err().contains("effective end"));
    }

    #[test]
    fn error_payload_accepts_non_string_error() {
        let p: ErrorPayload = serde_json::from_str(r#"{"error": 123}"#).unwrap();
        assert_eq!(p.error.as_deref(), Some("123"));
        let p: ErrorPayload = serde_json::from_str(r#"{"error": "fund not found"}"#).unwrap();
        assert_eq!(p.error.as_deref(), Some("fund not found"));
        let p: ErrorPayload = serde_json::from_str(r#"{"error": null}"#).unwrap();
        assert_eq!(p.error, None);
        let p: ErrorPayload = serde_json::from_str("{}").unwrap();
        assert_eq!(p.error, None);
    }

    #[test]
    fn date_helpers_round_trip_iso_dates() {
        let d = parse_date("2016-02-29").unwrap();
        assert_eq!(format_date(d), "2016-02-29");
        assert!(parse_date("2016-13-01").is_none());
        assert!(parse_date("").is_none());
    }
}
