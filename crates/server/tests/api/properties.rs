use crate::helpers::{property, reading, spawn_app, MockStore, MockWeather};
use axum::{
    body::{to_bytes, Body},
    http::Request,
};
use hyper::{Method, StatusCode};
use serde_json::json;
use tower::ServiceExt;
use weather_search::{StoreError, UpstreamError};

/// Store holding `rows` on its first page and nothing after
fn single_page_store(rows: Vec<weather_search::PropertyRecord>) -> MockStore {
    let mut store = MockStore::new();
    store.expect_find().returning(move |query| {
        if query.skip == 0 {
            Ok(rows.clone())
        } else {
            Ok(vec![])
        }
    });
    store
}

/// Temperature follows latitude; latitude 1.0 is raining, everything else is clear
fn latitude_weather() -> MockWeather {
    let mut weather = MockWeather::new();
    weather.expect_current().returning(|coordinate| {
        let code = if coordinate.lat == 1.0 { 61 } else { 0 };
        Ok(reading(coordinate.lat, 55.0, code))
    });
    weather
}

#[tokio::test]
async fn health_check_reports_ok() {
    let test_app = spawn_app(MockStore::new(), MockWeather::new()).await;

    let request = Request::builder()
        .method(Method::GET)
        .uri("/")
        .body(Body::empty())
        .unwrap();
    let response = test_app.app.clone().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&body[..], b"Weather Search: OK");
}

#[tokio::test]
async fn unfiltered_search_returns_enriched_properties() {
    let store = single_page_store(vec![
        property(1, "Lakeside Cabin", Some(21.5), Some(-87.6)),
        property(2, "Downtown Loft", Some(30.0), Some(-87.7)),
    ]);
    let test_app = spawn_app(store, latitude_weather()).await;

    let (status, body) = test_app.get_json("/get-properties").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!([
            {
                "id": 1,
                "name": "Lakeside Cabin",
                "city": "Springfield",
                "state": "IL",
                "country": "US",
                "lat": 21.5,
                "lng": -87.6,
                "isActive": true,
                "weather": {"temperature": 21.5, "humidity": 55.0, "weatherCode": 0}
            },
            {
                "id": 2,
                "name": "Downtown Loft",
                "city": "Springfield",
                "state": "IL",
                "country": "US",
                "lat": 30.0,
                "lng": -87.7,
                "isActive": true,
                "weather": {"temperature": 30.0, "humidity": 55.0, "weatherCode": 0}
            }
        ])
    );
}

#[tokio::test]
async fn temperature_range_filters_results() {
    let store = single_page_store(vec![
        property(1, "Cold", Some(5.0), Some(10.0)),
        property(2, "Mild", Some(18.0), Some(10.0)),
        property(3, "Hot", Some(35.0), Some(10.0)),
    ]);
    let test_app = spawn_app(store, latitude_weather()).await;

    let (status, body) = test_app
        .get_json("/get-properties?tempMin=10&tempMax=30")
        .await;

    assert_eq!(status, StatusCode::OK);
    let names: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Mild"]);
}

#[tokio::test]
async fn bracketed_conditions_are_accepted() {
    let store = single_page_store(vec![
        property(1, "Wet", Some(1.0), Some(10.0)),
        property(2, "Dry", Some(2.0), Some(10.0)),
    ]);
    let test_app = spawn_app(store, latitude_weather()).await;

    let (status, body) = test_app
        .get_json("/get-properties?conditions%5B%5D=Rainy&conditions%5B%5D=snow")
        .await;

    assert_eq!(status, StatusCode::OK);
    let body = body.as_array().unwrap();
    assert_eq!(body.len(), 1);
    assert_eq!(body[0]["name"], "Wet");
    assert_eq!(body[0]["weather"]["weatherCode"], 61);
}

#[tokio::test]
async fn empty_conditions_value_means_no_condition_filter() {
    let store = single_page_store(vec![
        property(1, "Wet", Some(1.0), Some(10.0)),
        property(2, "Dry", Some(2.0), Some(10.0)),
    ]);
    let test_app = spawn_app(store, latitude_weather()).await;

    let (status, body) = test_app.get_json("/get-properties?conditions=").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn search_text_reaches_the_store() {
    let mut store = MockStore::new();
    store
        .expect_find()
        .withf(|query| query.search.as_deref() == Some("Lake") && query.take == 50)
        .times(1)
        .returning(|_| Ok(vec![]));
    let test_app = spawn_app(store, MockWeather::new()).await;

    let (status, body) = test_app
        .get_json("/get-properties?searchText=%20Lake%20")
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn unavailable_weather_is_excluded() {
    let store = single_page_store(vec![
        property(1, "No Coordinates", None, None),
        property(2, "Upstream Down", Some(20.0), Some(10.0)),
        property(3, "Reachable", Some(25.0), Some(10.0)),
    ]);
    let mut weather = MockWeather::new();
    weather.expect_current().returning(|coordinate| {
        if coordinate.lat == 20.0 {
            Err(UpstreamError::Status(503))
        } else {
            Ok(reading(coordinate.lat, 40.0, 3))
        }
    });
    let test_app = spawn_app(store, weather).await;

    let (status, body) = test_app.get_json("/get-properties").await;

    assert_eq!(status, StatusCode::OK);
    let body = body.as_array().unwrap();
    assert_eq!(body.len(), 1);
    assert_eq!(body[0]["id"], 3);
}

#[tokio::test]
async fn out_of_range_temperature_is_rejected() {
    let mut store = MockStore::new();
    store.expect_find().times(0);
    let test_app = spawn_app(store, MockWeather::new()).await;

    let (status, body) = test_app
        .get_json("/get-properties?tempMin=-25&tempMax=10")
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body,
        json!({"error": "Temperature must be between -20°C and 50°C"})
    );
}

#[tokio::test]
async fn inverted_humidity_range_is_rejected() {
    let test_app = spawn_app(MockStore::new(), MockWeather::new()).await;

    let (status, body) = test_app
        .get_json("/get-properties?humidityMin=80&humidityMax=20")
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"error": "Min humidity cannot exceed max"}));
}

#[tokio::test]
async fn non_numeric_temperature_is_rejected() {
    let test_app = spawn_app(MockStore::new(), MockWeather::new()).await;

    let (status, body) = test_app.get_json("/get-properties?tempMax=warm").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"error": "Temperature must be a number"}));
}

#[tokio::test]
async fn unknown_conditions_are_listed() {
    let test_app = spawn_app(MockStore::new(), MockWeather::new()).await;

    let (status, body) = test_app
        .get_json("/get-properties?conditions=foo&conditions=Rainy&conditions=hail")
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"error": "Invalid conditions: foo, hail"}));
}

#[tokio::test]
async fn store_failure_is_an_opaque_server_error() {
    let mut store = MockStore::new();
    store
        .expect_find()
        .times(1)
        .returning(|_| Err(StoreError::Seed(String::from("disk on fire"))));
    let test_app = spawn_app(store, MockWeather::new()).await;

    let (status, body) = test_app.get_json("/get-properties").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({"error": "Internal Server Error"}));
}
