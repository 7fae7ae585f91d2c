//! Simulated trading strategy backtester.

use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use mcp_core::job::{Job, JOB_TYPE_BACKTEST};
use mcp_core::types::JsonMap;
use mcp_dispatch::{require_params, HandlerError, JobHandler};
use rand::Rng;
use serde_json::{json, Value};

use crate::short_id;

const DEFAULT_DELAY: Duration = Duration::from_secs(3);
const DATE_FORMAT: &str = "%Y-%m-%d";
/// Length of the simulated equity curve.
const TRADING_DAYS: i64 = 252;
const REQUIRED: &[&str] = &["strategy", "ticker"];

/// Handles `backtest` jobs.
///
/// Payload: `strategy` and `ticker` (required), `start_date` and
/// `end_date` as `YYYY-MM-DD` (defaults 2023-01-01 / 2023-12-31),
/// `initial_capital` (default 100000).
#[derive(Debug, Clone)]
pub struct BacktestHandler {
    delay: Duration,
}

impl BacktestHandler {
    pub fn new() -> Self {
        Self {
            delay: DEFAULT_DELAY,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

impl Default for BacktestHandler {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl JobHandler for BacktestHandler {
    fn name(&self) -> &str {
        "backtest_agent"
    }

    fn job_types(&self) -> &[&str] {
        &[JOB_TYPE_BACKTEST]
    }

    async fn validate(&self, job: &Job) -> bool {
        if job.job_type != JOB_TYPE_BACKTEST {
            return false;
        }
        match require_params(job, REQUIRED) {
            Ok(()) => true,
            Err(e) => {
                tracing::error!(job_id = %job.id, error = %e, "Rejecting backtest");
                false
            }
        }
    }

    async fn execute(&self, job: &Job) -> Result<JsonMap, HandlerError> {
        tracing::info!(job_id = %job.id, "Starting backtest");
        let params = BacktestParams::from_payload(&job.payload)?;

        tokio::time::sleep(self.delay).await;
        let result = simulate(&params, &job.id);

        tracing::info!(job_id = %job.id, "Backtest completed");
        Ok(result)
    }
}

struct BacktestParams {
    strategy: Value,
    ticker: Value,
    start_date: NaiveDate,
    end_date: NaiveDate,
    initial_capital: f64,
}

impl BacktestParams {
    fn from_payload(payload: &JsonMap) -> Result<Self, HandlerError> {
        let initial_capital = match payload.get("initial_capital") {
            None => 100_000.0,
            Some(value) => value.as_f64().ok_or_else(|| HandlerError::InvalidParameter {
                name: "initial_capital".into(),
                reason: "must be a number".into(),
            })?,
        };
        Ok(Self {
            strategy: payload.get("strategy").cloned().unwrap_or_else(|| json!("momentum")),
            ticker: payload.get("ticker").cloned().unwrap_or_else(|| json!("AAPL")),
            start_date: date_param(payload, "start_date", "2023-01-01")?,
            end_date: date_param(payload, "end_date", "2023-12-31")?,
            initial_capital,
        })
    }
}

fn date_param(payload: &JsonMap, name: &str, default: &str) -> Result<NaiveDate, HandlerError> {
    let raw = match payload.get(name) {
        None => default,
        Some(value) => value.as_str().ok_or_else(|| HandlerError::InvalidParameter {
            name: name.into(),
            reason: "must be a YYYY-MM-DD string".into(),
        })?,
    };
    NaiveDate::parse_from_str(raw, DATE_FORMAT).map_err(|e| HandlerError::InvalidParameter {
        name: name.into(),
        reason: e.to_string(),
    })
}

/// Produce a fake trade log and daily equity curve.
fn simulate(params: &BacktestParams, job_id: &str) -> JsonMap {
    let mut rng = rand::rng();
    let total_return: f64 = rng.random_range(-0.2..0.4);
    let sharpe_ratio: f64 = rng.random_range(0.5..2.5);
    let max_drawdown: f64 = rng.random_range(0.05..0.25);

    let num_trades: u32 = rng.random_range(10..=50);
    let trades: Vec<Value> = (0..num_trades)
        .map(|_| {
            let date = params.start_date + chrono::Duration::days(rng.random_range(0..=365));
            json!({
                "date": date.format(DATE_FORMAT).to_string(),
                "action": if rng.random_bool(0.5) { "BUY" } else { "SELL" },
                "price": rng.random_range(100.0..200.0),
                "quantity": rng.random_range(10..=100),
                "pnl": rng.random_range(-1000.0..2000.0),
            })
        })
        .collect();

    let mut value = params.initial_capital;
    let portfolio_values: Vec<Value> = (0..TRADING_DAYS)
        .map(|day| {
            value *= 1.0 + rng.random_range(-0.05..0.05);
            let date = params.start_date + chrono::Duration::days(day);
            json!({ "date": date.format(DATE_FORMAT).to_string(), "value": value })
        })
        .collect();

    let mut result = JsonMap::new();
    result.insert("strategy".into(), params.strategy.clone());
    result.insert("ticker".into(), params.ticker.clone());
    result.insert("start_date".into(), json!(params.start_date.format(DATE_FORMAT).to_string()));
    result.insert("end_date".into(), json!(params.end_date.format(DATE_FORMAT).to_string()));
    result.insert("initial_capital".into(), json!(params.initial_capital));
    result.insert("final_value".into(), json!(value));
    result.insert("total_return".into(), json!(total_return));
    result.insert("annualized_return".into(), json!(total_return));
    result.insert("sharpe_ratio".into(), json!(sharpe_ratio));
    result.insert("max_drawdown".into(), json!(max_drawdown));
    result.insert("num_trades".into(), json!(num_trades));
    result.insert("trades".into(), Value::Array(trades));
    result.insert("portfolio_values".into(), Value::Array(portfolio_values));
    result.insert("backtest_id".into(), json!(format!("bt_{}", short_id(job_id))));
    result.insert("completed_at".into(), json!(chrono::Utc::now().to_rfc3339()));
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn job(payload: Value) -> Job {
        Job::new(
            JOB_TYPE_BACKTEST,
            payload.as_object().cloned().unwrap_or_default(),
            JsonMap::new(),
        )
    }

    fn handler() -> BacktestHandler {
        BacktestHandler::new().with_delay(Duration::ZERO)
    }

    #[tokio::test]
    async fn validate_requires_strategy_and_ticker() {
        assert!(handler().validate(&job(json!({"strategy": "momentum", "ticker": "MSFT"}))).await);
        assert!(!handler().validate(&job(json!({"ticker": "MSFT"}))).await);
    }

    #[tokio::test]
    async fn result_has_expected_shape() {
        let job = job(json!({
            "strategy": "mean_reversion",
            "ticker": "MSFT",
            "start_date": "2024-01-01",
            "initial_capital": 5000,
        }));
        let result = handler().execute(&job).await.unwrap();

        assert_eq!(result["strategy"], "mean_reversion");
        assert_eq!(result["ticker"], "MSFT");
        assert_eq!(result["start_date"], "2024-01-01");
        assert_eq!(result["end_date"], "2023-12-31");
        assert_eq!(result["initial_capital"], 5000.0);
        assert_eq!(result["total_return"], result["annualized_return"]);

        let trades = result["trades"].as_array().unwrap();
        assert_eq!(trades.len() as u64, result["num_trades"].as_u64().unwrap());
        assert!((10..=50).contains(&trades.len()));

        let curve = result["portfolio_values"].as_array().unwrap();
        assert_eq!(curve.len(), TRADING_DAYS as usize);
        assert_eq!(curve[0]["date"], "2024-01-01");
        assert_eq!(curve.last().unwrap()["value"], result["final_value"]);
        assert_eq!(result["backtest_id"], format!("bt_{}", short_id(&job.id)));
    }

    #[tokio::test]
    async fn bad_date_is_rejected() {
        let err = handler()
            .execute(&job(json!({"strategy": "s", "ticker": "T", "start_date": "01/02/2023"})))
            .await
            .unwrap_err();
        assert_matches!(err, HandlerError::InvalidParameter { name, .. } if name == "start_date");
    }
}
