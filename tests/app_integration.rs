use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode},
};
use fxconv::core::config::AppConfig;
use fxconv::core::scheduler::{ManualTicker, RefreshScheduler};
use fxconv::server::{app_router, build_provider, build_state, handlers::RatesResponse};
use std::time::Duration;
use tower::ServiceExt;
use tracing::info;

mod test_utils {
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    pub const LIVE_RESPONSE: &str = r#"{
        "success": true,
        "source": "EUR",
        "quotes": {
            "EURUSD": 1.0842,
            "EURGBP": 0.8571,
            "EURJPY": 162.37
        }
    }"#;

    pub async fn create_mock_server(mock_response: &str) -> MockServer {
        let mock_server = MockServer::start().await;
        mount_response(&mock_server, mock_response).await;
        mock_server
    }

    pub async fn mount_response(mock_server: &MockServer, mock_response: &str) {
        mock_server.reset().await;
        Mock::given(method("GET"))
            .and(path("/live"))
            .and(query_param("access_key", "integration-key"))
            .and(query_param("source", "EUR"))
            .respond_with(ResponseTemplate::new(200).set_body_string(mock_response))
            .mount(mock_server)
            .await;
    }
}

fn config_for(server: &wiremock::MockServer) -> AppConfig {
    let mut config = AppConfig::default();
    config.exchange.api_key = "integration-key".to_string();
    config.exchange.api_url = format!("{}/live", server.uri());
    config.exchange.currencies = "USD,GBP,JPY".to_string();
    config.exchange.request_timeout_secs = 5;
    config
}

async fn build_router(config: &AppConfig) -> Router {
    let provider = build_provider(config).unwrap();
    let (state, _) = build_state(config, provider).await.unwrap();
    app_router(state)
}

async fn get(app: &Router, uri: &str) -> (StatusCode, String) {
    let response = app
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, String::from_utf8(body.to_vec()).unwrap())
}

#[test_log::test(tokio::test)]
async fn test_convert_eur_to_usd_is_greater_than_one() {
    let server = test_utils::create_mock_server(test_utils::LIVE_RESPONSE).await;
    let app = build_router(&config_for(&server)).await;

    let (status, body) = get(&app, "/currencies/convert?source=EUR&target=USD&amount=1").await;

    assert_eq!(status, StatusCode::OK);
    let value: f64 = body.parse().unwrap();
    info!(value, "EUR -> USD");
    assert!(value > 1.0);
    assert_eq!(value, 1.08);
}

#[test_log::test(tokio::test)]
async fn test_convert_usd_to_eur_is_less_than_one() {
    let server = test_utils::create_mock_server(test_utils::LIVE_RESPONSE).await;
    let app = build_router(&config_for(&server)).await;

    let (status, body) = get(&app, "/currencies/convert?source=usd&target=eur&amount=1").await;

    assert_eq!(status, StatusCode::OK);
    let value: f64 = body.parse().unwrap();
    assert!(value < 1.0);
}

#[test_log::test(tokio::test)]
async fn test_same_currency_returns_amount() {
    let server = test_utils::create_mock_server(test_utils::LIVE_RESPONSE).await;
    let app = build_router(&config_for(&server)).await;

    let (status, body) = get(&app, "/currencies/convert?source=USD&target=USD&amount=100").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.parse::<f64>().unwrap(), 100.0);
}

#[test_log::test(tokio::test)]
async fn test_bad_requests() {
    let server = test_utils::create_mock_server(test_utils::LIVE_RESPONSE).await;
    let app = build_router(&config_for(&server)).await;

    let cases = [
        (
            "/currencies/convert?source=XYZ&target=USD&amount=10",
            "Exchange rate unavailable for XYZ",
        ),
        (
            "/currencies/convert?source=EUR&target=USD&amount=-5",
            "Amount must be greater than zero.",
        ),
        (
            "/currencies/convert?source=EUR&target=USD&amount=0",
            "Amount must be greater than zero.",
        ),
        (
            "/currencies/convert?source=EUR&target=USD",
            "Amount must be provided.",
        ),
        (
            "/currencies/convert?source=&target=USD&amount=1",
            "Source and target currencies must be provided.",
        ),
        (
            "/currencies/convert?target=USD&amount=1",
            "Source and target currencies must be provided.",
        ),
        (
            "/currencies/convert?source=EUR&target=USD&amount=abc",
            "Invalid query parameters",
        ),
    ];

    for (uri, expected) in cases {
        let (status, body) = get(&app, uri).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
        assert!(body.contains(expected), "{uri}: {body}");
    }
}

#[test_log::test(tokio::test)]
async fn test_rates_and_health_endpoints() {
    let server = test_utils::create_mock_server(test_utils::LIVE_RESPONSE).await;
    let app = build_router(&config_for(&server)).await;

    let (status, body) = get(&app, "/healthz").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "ok");

    let (status, body) = get(&app, "/currencies/rates").await;
    assert_eq!(status, StatusCode::OK);
    let rates: RatesResponse = serde_json::from_str(&body).unwrap();
    assert_eq!(rates.base, "EUR");
    assert!(rates.fetched_at.is_some());
    assert_eq!(rates.rates.len(), 3);
    assert_eq!(rates.rates.get("GBP"), Some(&0.8571));
}

#[test_log::test(tokio::test)]
async fn test_startup_fails_when_initial_fetch_fails() {
    let server =
        test_utils::create_mock_server(r#"{"success": false, "error": {"code": 101}}"#).await;
    let config = config_for(&server);

    let provider = build_provider(&config).unwrap();
    let result = build_state(&config, provider).await;

    let err = result.err().expect("startup should fail");
    assert!(
        err.to_string()
            .contains("Failed to fetch initial exchange rates")
    );
}

#[test_log::test(tokio::test)]
async fn test_startup_tolerates_failed_fetch_when_configured() {
    let server =
        test_utils::create_mock_server(r#"{"success": false, "error": {"code": 101}}"#).await;
    let mut config = config_for(&server);
    config.require_initial_rates = false;

    let app = build_router(&config).await;

    let (status, body) = get(&app, "/currencies/convert?source=EUR&target=USD&amount=1").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("USD"));

    // The base currency needs no table entry
    let (status, _) = get(&app, "/currencies/convert?source=EUR&target=eur&amount=1").await;
    assert_eq!(status, StatusCode::OK);
}

#[test_log::test(tokio::test)]
async fn test_scheduled_refresh_updates_and_retains_rates() {
    let server = test_utils::create_mock_server(test_utils::LIVE_RESPONSE).await;
    let config = config_for(&server);
    let provider = build_provider(&config).unwrap();
    let (state, refresher) = build_state(&config, provider).await.unwrap();
    let app = app_router(state.clone());

    let (trigger, ticker) = ManualTicker::new();
    let scheduler = RefreshScheduler::start(refresher, ticker);

    // Provider error: the previous snapshot is kept
    let before = state.store.snapshot();
    test_utils::mount_response(&server, r#"{"success": false, "error": "quota"}"#).await;
    trigger.fire().await;
    wait_for_requests(&server, 1).await;
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(*state.store.snapshot(), *before);
    let (status, _) = get(&app, "/currencies/convert?source=EUR&target=JPY&amount=1").await;
    assert_eq!(status, StatusCode::OK);

    // A new table drops currencies missing from the response
    test_utils::mount_response(
        &server,
        r#"{"success": true, "quotes": {"EURUSD": 2.0}}"#,
    )
    .await;
    trigger.fire().await;
    wait_for_requests(&server, 1).await;
    for _ in 0..100 {
        if state.store.snapshot().len() == 1 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    let (status, body) = get(&app, "/currencies/convert?source=EUR&target=USD&amount=3").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.parse::<f64>().unwrap(), 6.0);

    let (status, body) = get(&app, "/currencies/convert?source=EUR&target=JPY&amount=1").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("JPY"));

    scheduler.stop().await;
}

/// Waits until the mock server has seen `expected` requests since its last reset.
async fn wait_for_requests(server: &wiremock::MockServer, expected: usize) {
    for _ in 0..200 {
        let seen = server
            .received_requests()
            .await
            .map(|r| r.len())
            .unwrap_or(0);
        if seen >= expected {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("mock server did not receive {expected} requests");
}
