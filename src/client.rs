//! HTTP client for the backtesting service.

use crate::catalog::{BenchmarkCatalog, FundCatalog, FundMeta};
use crate::error::BacktestError;
use crate::model::{BacktestRequest, BacktestResult, ErrorPayload};
use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct BacktestClient {
    http: reqwest::Client,
    base_url: String,
}

impl BacktestClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(format!("backtest-console/{}", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .context("build http client")?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Run one backtest. Any non-success status is a failure regardless of
    /// body; a success body that does not hold a well-formed result is
    /// rejected as malformed.
    pub async fn submit(&self, req: &BacktestRequest) -> Result<BacktestResult, BacktestError> {
        let resp = self
            .http
            .post(self.url("/api/backtest"))
            .json(req)
            .send()
            .await?;
        let status = resp.status();
        let body = resp.bytes().await?;

        if !status.is_success() {
            let message = serde_json::from_slice::<ErrorPayload>(&body)
                .ok()
                .and_then(|p| p.error);
            let err = BacktestError::service(message);
            tracing::warn!(%status, error = %err, "backtest request rejected");
            return Err(err);
        }

        let result: BacktestResult = serde_json::from_slice(&body)
            .map_err(|e| BacktestError::MalformedResponse(e.to_string()))?;
        result
            .validate()
            .map_err(BacktestError::MalformedResponse)?;
        tracing::debug!(
            fund = %result.fund_name,
            points = result.portfolio.len(),
            "backtest result received"
        );
        Ok(result)
    }

    /// Ask the service to drop its price cache. The response body is not
    /// consumed; a completed exchange counts as success whatever the status.
    pub async fn clear_cache(&self) -> Result<(), BacktestError> {
        let resp = self.http.post(self.url("/api/clear-cache")).send().await?;
        tracing::debug!(status = %resp.status(), "cache clear completed");
        Ok(())
    }

    pub async fn fetch_funds(&self) -> Result<FundCatalog, BacktestError> {
        let funds: BTreeMap<String, FundMeta> = self
            .http
            .get(self.url("/api/funds"))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(FundCatalog::new(funds))
    }

    pub async fn fetch_benchmarks(&self) -> Result<BenchmarkCatalog, BacktestError> {
        let map: serde_json::Map<String, serde_json::Value> = self
            .http
            .get(self.url("/api/benchmarks"))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(BenchmarkCatalog::from_map(map))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FALLBACK_ERROR;
    use crate::test_support::{sample_request, sample_result_json};
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> BacktestClient {
        BacktestClient::new(&server.uri(), Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn submit_parses_success_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/backtest"))
            .and(body_partial_json(json!({"fund_id": "F1", "fee_toggle": true})))
            .respond_with(ResponseTemplate::new(200).set_body_json(sample_result_json(24)))
            .expect(1)
            .mount(&server)
            .await;

        let r = client_for(&server).submit(&sample_request()).await.unwrap();
        assert_eq!(r.portfolio.len(), 24);
        assert_eq!(r.kpis.final_value, "$123,456");
    }

    #[tokio::test]
    async fn submit_surfaces_error_field() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/backtest"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({"error": "fund not found"})))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .submit(&sample_request())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "fund not found");
    }

    #[tokio::test]
    async fn submit_shows_non_string_error_field() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/backtest"))
            .respond_with(ResponseTemplate::new(500).set_body_json(json!({"error": 123})))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .submit(&sample_request())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "123");
    }

    #[tokio::test]
    async fn submit_falls_back_without_error_field() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/backtest"))
            .respond_with(ResponseTemplate::new(502).set_body_string("<html>bad gateway</html>"))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .submit(&sample_request())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), FALLBACK_ERROR);
    }

    #[tokio::test]
    async fn submit_treats_non_success_as_failure_even_with_result_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/backtest"))
            .respond_with(ResponseTemplate::new(500).set_body_json(sample_result_json(3)))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .submit(&sample_request())
            .await
            .unwrap_err();
        assert!(matches!(err, BacktestError::Service(_)));
    }

    #[tokio::test]
    async fn submit_rejects_malformed_success_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/backtest"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"fund_name": "x"})))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .submit(&sample_request())
            .await
            .unwrap_err();
        assert!(err.is_malformed());
    }

    #[tokio::test]
    async fn clear_cache_ignores_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/clear-cache"))
            .respond_with(ResponseTemplate::new(500))
            .expect(1)
            .mount(&server)
            .await;

        assert!(client_for(&server).clear_cache().await.is_ok());
    }

    #[tokio::test]
    async fn clear_cache_reports_transport_failure() {
        let client = BacktestClient::new("http://127.0.0.1:9", Duration::from_secs(1)).unwrap();
        let err = client.clear_cache().await.unwrap_err();
        assert!(matches!(err, BacktestError::Transport(_)));
    }

    #[tokio::test]
    async fn fetches_catalogs() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/funds"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "F1": {"name": "Fund 1", "default_fee": 0.002, "allocations": {"LQD": 0.5}}
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/benchmarks"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "SPY": {"name": "S&P 500 (SPY)"},
                "60/40": {"name": "60/40 (SPY/IEF)"}
            })))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let funds = client.fetch_funds().await.unwrap();
        let benches = client.fetch_benchmarks().await.unwrap();
        assert_eq!(funds.get("F1").unwrap().name, "Fund 1");
        assert_eq!(benches.options()[1].id, "60/40");
    }

    #[test]
    fn base_url_trailing_slash_trimmed() {
        let c = BacktestClient::new("http://localhost:5000/", Duration::from_secs(1)).unwrap();
        assert_eq!(c.base_url, "http://localhost:5000");
        assert_eq!(c.url("/api/funds"), "http://localhost:5000/api/funds");
    }
}
