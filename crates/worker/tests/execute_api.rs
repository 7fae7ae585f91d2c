mod common;

use axum::http::StatusCode;
use serde_json::json;

use common::{build_test_app, post_json};

#[tokio::test]
async fn ml_experiment_returns_bare_result() {
    let (status, body) = post_json(
        build_test_app(),
        "/execute",
        json!({
            "job_id": "0123456789",
            "type": "ml_experiment",
            "payload": {"model": "linear", "dataset": "iris", "epochs": 3},
            "metadata": {},
        }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["model_type"], "linear");
    assert_eq!(body["experiment_id"], "exp_01234567");
    assert!(body.get("data").is_none());
}

#[tokio::test]
async fn unknown_job_type_is_bad_request() {
    let (status, body) = post_json(
        build_test_app(),
        "/execute",
        json!({"job_id": "j", "type": "generic", "payload": {}, "metadata": {}}),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "UNKNOWN_JOB_TYPE");
}

#[tokio::test]
async fn missing_parameters_are_rejected() {
    let (status, body) = post_json(
        build_test_app(),
        "/execute",
        json!({"job_id": "j1", "type": "backtest", "payload": {"ticker": "AAPL"}, "metadata": {}}),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");
    assert_eq!(
        body["error"],
        "Validation failed: handler backtest_agent rejected job j1"
    );
}

#[tokio::test]
async fn invalid_parameter_during_execution_is_bad_request() {
    let (status, body) = post_json(
        build_test_app(),
        "/execute",
        json!({
            "job_id": "j2",
            "type": "backtest",
            "payload": {"strategy": "s", "ticker": "T", "start_date": "yesterday"},
            "metadata": {},
        }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");
}
