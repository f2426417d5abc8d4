use serde_json::json;
use std::time::Duration;
use weather_search::{Coordinate, OpenMeteo, UpstreamError, WeatherSource};
use wiremock::{
    matchers::{method, path, query_param},
    Mock, MockServer, ResponseTemplate,
};

async fn client_for(server: &MockServer) -> OpenMeteo {
    OpenMeteo::new(
        format!("{}/v1/forecast", server.uri()),
        Duration::from_secs(2),
    )
    .unwrap()
}

#[tokio::test]
async fn parses_current_conditions() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/forecast"))
        .and(query_param("latitude", "40.7128"))
        .and(query_param("longitude", "-74.006"))
        .and(query_param(
            "current",
            "temperature_2m,relative_humidity_2m,weather_code",
        ))
        .and(query_param("timezone", "auto"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "latitude": 40.71,
            "longitude": -74.0,
            "current": {
                "time": "2024-08-01T12:00",
                "interval": 900,
                "temperature_2m": 27.4,
                "relative_humidity_2m": 62,
                "weather_code": 2
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let reading = client_for(&server)
        .await
        .current(Coordinate::new(40.7128, -74.006))
        .await
        .unwrap();

    assert_eq!(reading.temperature, 27.4);
    assert_eq!(reading.humidity, 62.0);
    assert_eq!(reading.weather_code, 2);
}

#[tokio::test]
async fn non_success_status_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&server)
        .await;

    let result = client_for(&server)
        .await
        .current(Coordinate::new(1.0, 2.0))
        .await;

    assert!(matches!(result, Err(UpstreamError::Status(429))));
}

#[tokio::test]
async fn missing_current_block_is_malformed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"latitude": 1.0})))
        .mount(&server)
        .await;

    let result = client_for(&server)
        .await
        .current(Coordinate::new(1.0, 2.0))
        .await;

    assert!(matches!(result, Err(UpstreamError::Malformed(_))));
}

#[tokio::test]
async fn slow_upstream_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
        .mount(&server)
        .await;

    let result = client_for(&server)
        .await
        .current(Coordinate::new(1.0, 2.0))
        .await;

    assert!(matches!(result, Err(UpstreamError::Request(_))));
}
