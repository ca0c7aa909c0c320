//! Fund and benchmark lookup tables.
//!
//! Both catalogs are loaded once before the first render and never mutated
//! afterwards. They come either from JSON files or from the service's
//! `/api/funds` and `/api/benchmarks` endpoints.

use crate::client::BacktestClient;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FundMeta {
    pub name: String,
    pub default_fee: f64,
    #[serde(default)]
    pub default_rebalance: Option<String>,
    #[serde(default)]
    pub risk_level: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// Read-only mapping from fund identifier to metadata.
#[derive(Debug, Clone, Default)]
pub struct FundCatalog {
    funds: BTreeMap<String, FundMeta>,
}

impl FundCatalog {
    pub fn new(funds: BTreeMap<String, FundMeta>) -> Self {
        Self { funds }
    }

    pub fn from_json(s: &str) -> Result<Self> {
        let funds: BTreeMap<String, FundMeta> =
            serde_json::from_str(s).context("parse fund catalog")?;
        Ok(Self::new(funds))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("read fund catalog {}", path.display()))?;
        Self::from_json(&raw)
    }

    pub fn get(&self, id: &str) -> Option<&FundMeta> {
        self.funds.get(id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.funds.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.funds.len()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BenchmarkOption {
    pub id: String,
    pub name: String,
}

/// Benchmark choices in the order the source listed them.
#[derive(Debug, Clone, Default)]
pub struct BenchmarkCatalog {
    options: Vec<BenchmarkOption>,
}

impl BenchmarkCatalog {
    /// Build from a JSON object keyed by benchmark id. Each value may carry a
    /// `name`; the id is used when it doesn't.
    pub fn from_map(map: serde_json::Map<String, serde_json::Value>) -> Self {
        let options = map
            .into_iter()
            .map(|(id, v)| {
                let name = v
                    .get("name")
                    .and_then(|n| n.as_str())
                    .map(str::to_string)
                    .unwrap_or_else(|| id.clone());
                BenchmarkOption { id, name }
            })
            .collect();
        Self { options }
    }

    pub fn from_json(s: &str) -> Result<Self> {
        let map: serde_json::Map<String, serde_json::Value> =
            serde_json::from_str(s).context("parse benchmark catalog")?;
        Ok(Self::from_map(map))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("read benchmark catalog {}", path.display()))?;
        Self::from_json(&raw)
    }

    pub fn options(&self) -> &[BenchmarkOption] {
        &self.options
    }

    pub fn len(&self) -> usize {
        self.options.len()
    }
}

/// Load both catalogs, preferring local files and falling back to the service.
pub async fn resolve(
    funds_path: Option<&Path>,
    benchmarks_path: Option<&Path>,
    client: &BacktestClient,
) -> Result<(FundCatalog, BenchmarkCatalog)> {
    let funds = async {
        match funds_path {
            Some(p) => FundCatalog::load(p),
            None => client.fetch_funds().await.context("fetch fund catalog"),
        }
    };
    let benchmarks = async {
        match benchmarks_path {
            Some(p) => BenchmarkCatalog::load(p),
            None => client
                .fetch_benchmarks()
                .await
                .context("fetch benchmark catalog"),
        }
    };
    let (funds, benchmarks) = futures::future::try_join(funds, benchmarks).await?;
    tracing::info!(
        funds = funds.len(),
        benchmarks = benchmarks.len(),
        "catalogs loaded"
    );
    Ok((funds, benchmarks))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::sample_benchmarks;
    use std::io::Write;

    #[test]
    fn fund_lookup_ignores_extra_fields() {
        let c = FundCatalog::from_json(
            r#"{"F9": {"name": "Nine", "default_fee": 0.01, "allocations": {"SPY": 1.0}}}"#,
        )
        .unwrap();
        assert_eq!(c.get("F9").map(|f| f.default_fee), Some(0.01));
        assert!(c.get("F1").is_none());
    }

    #[test]
    fn benchmark_order_follows_source() {
        let ids: Vec<_> = sample_benchmarks()
            .options()
            .iter()
            .map(|o| o.id.clone())
            .collect();
        assert_eq!(ids, ["SPY", "GLD", "VEA", "60/40", "IEF"]);
    }

    #[test]
    fn benchmark_without_name_uses_id() {
        let c = BenchmarkCatalog::from_json(r#"{"XYZ": {}}"#).unwrap();
        assert_eq!(c.options()[0].name, "XYZ");
    }

    #[tokio::test]
    async fn resolve_prefers_files() {
        let mut funds = tempfile::NamedTempFile::new().unwrap();
        write!(funds, r#"{{"F1": {{"name": "One", "default_fee": 0.002}}}}"#).unwrap();
        let mut benches = tempfile::NamedTempFile::new().unwrap();
        write!(benches, r#"{{"SPY": {{"name": "S&P"}}}}"#).unwrap();

        // Unroutable base URL: any network call would fail the test.
        let client =
            BacktestClient::new("http://127.0.0.1:9", std::time::Duration::from_secs(1)).unwrap();
        let (f, b) = resolve(Some(funds.path()), Some(benches.path()), &client)
            .await
            .unwrap();
        assert_eq!(f.len(), 1);
        assert_eq!(b.options()[0].name, "S&P");
    }
}
