//! HTTP carbon intensity providers against a mock server
//!
//! The providers use a blocking client, so every call is moved onto the
//! blocking pool while wiremock runs on the test runtime.

use chrono::{Duration, Utc};
use greenops::carbon_aware::{
    CarbonAwareScheduler, CarbonIntensityAPI, CarbonIntensityProvider, CarbonProvider,
    SchedulerConfig,
};
use greenops::Error;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn fetch(provider: CarbonProvider, region: &'static str) -> greenops::Result<f64> {
    tokio::task::spawn_blocking(move || {
        let api = CarbonIntensityAPI::new(provider)?;
        api.get_intensity(region)
    })
    .await
    .expect("blocking task panicked")
}

#[tokio::test(flavor = "multi_thread")]
async fn test_electricitymap_latest_intensity() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v3/carbon-intensity/latest"))
        .and(query_param("zone", "DE"))
        .and(header("auth-token", "secret"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"{"zone": "DE", "carbonIntensity": 302, "datetime": "2024-05-01T10:00:00.000Z"}"#,
        ))
        .mount(&mock_server)
        .await;

    let provider = CarbonProvider::ElectricityMap {
        url: mock_server.uri(),
        token: "secret".to_string(),
    };

    assert_eq!(fetch(provider, "DE").await.unwrap(), 302.0);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_electricitymap_error_status() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v3/carbon-intensity/latest"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&mock_server)
        .await;

    let provider = CarbonProvider::ElectricityMap {
        url: mock_server.uri(),
        token: String::new(),
    };

    assert!(matches!(
        fetch(provider, "DE").await,
        Err(Error::NetworkError(_))
    ));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_electricitymap_missing_field() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v3/carbon-intensity/latest"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"zone": "DE"}"#))
        .mount(&mock_server)
        .await;

    let provider = CarbonProvider::ElectricityMap {
        url: mock_server.uri(),
        token: String::new(),
    };

    assert!(matches!(
        fetch(provider, "DE").await,
        Err(Error::ParseError(_))
    ));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_custom_provider_selects_region() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/intensity"))
        .and(header("Authorization", "Bearer token"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"{"regions": [
                {"region": "us-east-1", "carbonIntensity": 410.0},
                {"region": "us-west-2", "carbonIntensity": 95.5}
            ]}"#,
        ))
        .mount(&mock_server)
        .await;

    let provider = CarbonProvider::Custom {
        url: format!("{}/intensity", mock_server.uri()),
        auth_header: Some("Bearer token".to_string()),
    };

    assert_eq!(fetch(provider.clone(), "us-west-2").await.unwrap(), 95.5);
    assert!(matches!(
        fetch(provider, "eu-west-1").await,
        Err(Error::RegionNotFound(_))
    ));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_health_check() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&mock_server)
        .await;

    let provider = CarbonProvider::ElectricityMap {
        url: mock_server.uri(),
        token: String::new(),
    };

    let healthy =
        tokio::task::spawn_blocking(move || CarbonIntensityAPI::new(provider)?.health_check())
            .await
            .unwrap()
            .unwrap();
    assert!(healthy);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_scheduler_fails_open_when_provider_errors() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v3/carbon-intensity/latest"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    let provider = CarbonProvider::ElectricityMap {
        url: mock_server.uri(),
        token: String::new(),
    };

    let executed = tokio::task::spawn_blocking(move || {
        let api = CarbonIntensityAPI::new(provider)?;
        let scheduler = CarbonAwareScheduler::new(SchedulerConfig::new("DE", 100.0), api);
        let mut ran = false;
        let executed = scheduler.schedule("nightly", Utc::now() + Duration::hours(8), || {
            ran = true
        });
        Ok::<_, Error>(executed && ran)
    })
    .await
    .unwrap()
    .unwrap();

    assert!(executed);
}
