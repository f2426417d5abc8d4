use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::Request,
    Router,
};
use hyper::{header, Method, StatusCode};
use mockall::mock;
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;
use weather_search::{
    app, AppState, Coordinate, PropertyQuery, PropertyRecord, PropertySearch, PropertyStore,
    SearchSettings, StoreError, UpstreamError, WeatherCache, WeatherClient, WeatherReading,
    WeatherSource,
};

mock! {
    pub Store {}

    #[async_trait]
    impl PropertyStore for Store {
        async fn find(&self, query: &PropertyQuery) -> Result<Vec<PropertyRecord>, StoreError>;
    }
}

mock! {
    pub Weather {}

    #[async_trait]
    impl WeatherSource for Weather {
        async fn current(&self, coordinate: Coordinate) -> Result<WeatherReading, UpstreamError>;
    }
}

pub struct TestApp {
    pub app: Router,
}

pub async fn spawn_app(store: MockStore, weather: MockWeather) -> TestApp {
    let client = WeatherClient::new(Arc::new(weather), Arc::new(WeatherCache::new()));
    let search = PropertySearch::new(
        Arc::new(store),
        Arc::new(client),
        SearchSettings::default(),
    );
    let app_state = AppState {
        search: Arc::new(search),
        cors_origin: None,
    };

    TestApp { app: app(app_state) }
}

impl TestApp {
    /// Issue a GET and return the status with the decoded JSON body
    pub async fn get_json(&self, uri: &str) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(Method::GET)
            .uri(uri)
            .header(header::ACCEPT, "application/json")
            .body(Body::empty())
            .unwrap();

        let response = self
            .app
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to execute request.");

        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }
}

pub fn property(id: i64, name: &str, lat: Option<f64>, lng: Option<f64>) -> PropertyRecord {
    PropertyRecord {
        id,
        name: name.to_owned(),
        city: Some(String::from("Springfield")),
        state: Some(String::from("IL")),
        country: Some(String::from("US")),
        lat,
        lng,
        is_active: true,
    }
}

pub fn reading(temperature: f64, humidity: f64, weather_code: i32) -> WeatherReading {
    WeatherReading {
        temperature,
        humidity,
        weather_code,
    }
}
