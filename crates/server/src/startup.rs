use crate::{
    db::{self, Database, PropertyStore},
    get_properties, index_handler, routes, Cli, OpenMeteo, PropertySearch, WeatherCache,
    WeatherClient,
};
use anyhow::anyhow;
use axum::{
    body::Body,
    extract::Request,
    middleware::{self, Next},
    response::IntoResponse,
    routing::get,
    Router,
};
use hyper::{
    header::{HeaderValue, ACCEPT, CONTENT_TYPE},
    Method,
};
use log::{debug, info, warn};
use std::{path::Path, sync::Arc, time::Duration};
use tower_http::cors::{Any, CorsLayer};
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable};

const CACHE_SWEEP_INTERVAL: Duration = Duration::from_secs(300);

#[derive(Clone)]
pub struct AppState {
    pub search: Arc<PropertySearch>,
    /// Browser origin allowed to call the api; any origin when unset
    pub cors_origin: Option<HeaderValue>,
}

#[derive(OpenApi)]
#[openapi(
    paths(
        routes::home::index::index_handler,
        routes::properties::get_properties::get_properties,
    ),
    components(
        schemas(
                db::PropertyRecord,
                db::EnrichedProperty,
                crate::WeatherReading,
                routes::properties::get_properties::ErrorBody,
        )
    ),
    tags(
        (name = "weather search api", description = "property search filtered by live weather at each property")
    )
)]
struct ApiDoc;

pub async fn build_app_state(cli: &Cli) -> Result<AppState, anyhow::Error> {
    let db_dir = cli.db_dir();
    let db = Database::new(Path::new(&db_dir))
        .await
        .map_err(|e| anyhow!("error setting up SQLite database: {}", e))?;
    db.health_check()
        .await
        .map_err(|e| anyhow!("database health check failed: {}", e))?;

    if let Some(seed_file) = cli.seed_file.as_deref() {
        if weather_search_core::path_exists(Path::new(seed_file)) {
            db.seed_from_file(Path::new(seed_file))
                .await
                .map_err(|e| anyhow!("error seeding properties: {}", e))?;
        } else {
            warn!("seed file not found, skipping: {}", seed_file);
        }
    }

    let source = OpenMeteo::new(cli.weather_url(), cli.weather_timeout())
        .map_err(|e| anyhow!("error building weather api client: {}", e))?;
    let cache = Arc::new(WeatherCache::with_capacity(cli.weather_cache_capacity()));
    spawn_cache_sweep(cache.clone());
    let weather = WeatherClient::new(Arc::new(source), cache)
        .with_ttl(cli.weather_ttl())
        .with_concurrency(cli.weather_concurrency());

    let store: Arc<dyn PropertyStore> = Arc::new(db);
    let search = PropertySearch::new(store, Arc::new(weather), cli.search_settings());

    let cors_origin = cli
        .frontend_url
        .as_deref()
        .map(HeaderValue::from_str)
        .transpose()
        .map_err(|e| anyhow!("invalid frontend url: {}", e))?;
    if let Some(origin) = &cors_origin {
        info!("  CORS origin: {:?}", origin);
    }

    Ok(AppState {
        search: Arc::new(search),
        cors_origin,
    })
}

/// Expired readings are otherwise only dropped when read or when the cache is full
fn spawn_cache_sweep(cache: Arc<WeatherCache>) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(CACHE_SWEEP_INTERVAL);
        interval.tick().await;
        loop {
            interval.tick().await;
            let purged = cache.purge_expired();
            if purged > 0 {
                debug!("purged {} expired weather readings", purged);
            }
        }
    });
}

pub fn app(app_state: AppState) -> Router {
    let api_docs = ApiDoc::openapi();
    let cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([ACCEPT, CONTENT_TYPE]);
    let cors = match app_state.cors_origin.clone() {
        Some(origin) => cors.allow_origin(origin).allow_credentials(true),
        None => cors.allow_origin(Any),
    };

    Router::new()
        .route("/", get(index_handler))
        .route("/get-properties", get(get_properties))
        .with_state(Arc::new(app_state))
        .layer(middleware::from_fn(log_request))
        .merge(Scalar::with_url("/docs", api_docs))
        .layer(cors)
}

async fn log_request(request: Request<Body>, next: Next) -> impl IntoResponse {
    let now = time::OffsetDateTime::now_utc();
    let path = request
        .uri()
        .path_and_query()
        .map(|p| p.as_str())
        .unwrap_or_default()
        .to_owned();
    info!(target: "http_request","new request, {} {}", request.method().as_str(), path);

    let response = next.run(request).await;
    let response_time = time::OffsetDateTime::now_utc() - now;
    info!(target: "http_response", "response, code: {}, time: {}", response.status().as_str(), response_time);

    response
}
