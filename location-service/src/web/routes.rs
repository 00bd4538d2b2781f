//! HTTP route handlers.

use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::clock::Clock;
use crate::domain::{Coordinates, FuelType, Position};
use crate::geocoding::Geocoder;
use crate::ranking::{cheapest_nearby, rank_by_distance, within_radius};
use crate::sensor::PositionSensor;
use crate::service::LocationError;
use crate::stations::StationError;

use super::dto::*;
use super::state::AppState;

/// Default number of nearby stations returned.
const DEFAULT_NEARBY_LIMIT: usize = 20;

/// Upper bound on nearby stations returned.
const MAX_NEARBY_LIMIT: usize = 100;

/// Create the application router.
pub fn create_router<S, G, C>(state: AppState<S, G, C>) -> Router
where
    S: PositionSensor,
    G: Geocoder,
    C: Clock,
{
    Router::new()
        .route("/health", get(health))
        .route(
            "/position",
            get(get_position::<S, G, C>).put(set_position::<S, G, C>),
        )
        .route("/position/refresh", post(refresh_position::<S, G, C>))
        .route("/position/search", post(search_address::<S, G, C>))
        .route("/stations/nearby", get(nearby_stations::<S, G, C>))
        .route("/stations/refresh", post(refresh_stations::<S, G, C>))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint.
async fn health() -> &'static str {
    "ok"
}

/// Current position, acquisition flag and last error.
async fn get_position<S, G, C>(
    State(state): State<AppState<S, G, C>>,
) -> Json<PositionStatusResponse>
where
    S: PositionSensor,
    G: Geocoder,
    C: Clock,
{
    let location = &state.location;
    Json(PositionStatusResponse {
        position: location.current_position().as_ref().map(PositionResult::from),
        acquiring: location.is_acquiring(),
        last_error: location.last_error().map(|e| e.code().to_string()),
    })
}

/// Set the position from coordinates supplied by the client.
async fn set_position<S, G, C>(
    State(state): State<AppState<S, G, C>>,
    Json(req): Json<SetPositionRequest>,
) -> Result<Json<PositionResult>, AppError>
where
    S: PositionSensor,
    G: Geocoder,
    C: Clock,
{
    let coordinates =
        Coordinates::new(req.latitude, req.longitude).map_err(|e| AppError::BadRequest {
            message: e.to_string(),
        })?;

    let mut position = Position::new(coordinates, state.location.clock().now());
    if let Some(address) = req.address.filter(|a| !a.trim().is_empty()) {
        position = position.with_address(address);
    }

    let position = state.location.set_position(position).await;
    Ok(Json(PositionResult::from(&position)))
}

/// Take a high-accuracy fix now.
async fn refresh_position<S, G, C>(
    State(state): State<AppState<S, G, C>>,
) -> Result<Json<PositionResult>, AppError>
where
    S: PositionSensor,
    G: Geocoder,
    C: Clock,
{
    let position = state.location.refresh_now().await?;
    Ok(Json(PositionResult::from(&position)))
}

/// Locate a typed address and make it the current position.
async fn search_address<S, G, C>(
    State(state): State<AppState<S, G, C>>,
    Json(req): Json<AddressSearchRequest>,
) -> Result<Json<PositionResult>, AppError>
where
    S: PositionSensor,
    G: Geocoder,
    C: Clock,
{
    let query = req.query.trim();
    if query.is_empty() {
        return Err(AppError::BadRequest {
            message: "query must not be empty".to_string(),
        });
    }

    let position = state.location.locate_address(query).await?;
    Ok(Json(PositionResult::from(&position)))
}

/// Stations ranked from the current position.
///
/// Without `fuel`, stations are ordered nearest-first; with it, cheapest
/// first among those selling that fuel.
async fn nearby_stations<S, G, C>(
    State(state): State<AppState<S, G, C>>,
    Query(req): Query<NearbyStationsRequest>,
) -> Result<Json<NearbyStationsResponse>, AppError>
where
    S: PositionSensor,
    G: Geocoder,
    C: Clock,
{
    if let Some(radius) = req.radius_km
        && !(radius.is_finite() && radius >= 0.0)
    {
        return Err(AppError::BadRequest {
            message: format!("Invalid radius: {radius}"),
        });
    }

    let fuel = req
        .fuel
        .as_deref()
        .filter(|f| !f.is_empty())
        .map(str::parse::<FuelType>)
        .transpose()
        .map_err(|e| AppError::BadRequest {
            message: e.to_string(),
        })?;

    let limit = req
        .limit
        .unwrap_or(DEFAULT_NEARBY_LIMIT)
        .min(MAX_NEARBY_LIMIT);

    let position = state.location.current_position();
    let from = position.as_ref().map(Position::coordinates);

    let stations = state
        .stations
        .read(|stations| {
            let ranked = match (fuel, req.radius_km) {
                (Some(fuel), radius) => cheapest_nearby(stations, from.as_ref(), fuel, radius),
                (None, Some(radius)) => within_radius(stations, from.as_ref(), radius),
                (None, None) => rank_by_distance(stations, from.as_ref()),
            };
            ranked
                .iter()
                .take(limit)
                .map(StationResult::from)
                .collect::<Vec<_>>()
        })
        .await;

    Ok(Json(NearbyStationsResponse {
        position: position.as_ref().map(PositionResult::from),
        stations,
    }))
}

/// Reload the station list from the backend.
async fn refresh_stations<S, G, C>(
    State(state): State<AppState<S, G, C>>,
) -> Result<Json<StationRefreshResponse>, AppError>
where
    S: PositionSensor,
    G: Geocoder,
    C: Clock,
{
    let count = state.stations.refresh().await?;
    Ok(Json(StationRefreshResponse { count }))
}

/// Application error type.
#[derive(Debug)]
pub enum AppError {
    BadRequest { message: String },
    Location(LocationError),
    Upstream { message: String },
}

impl From<LocationError> for AppError {
    fn from(e: LocationError) -> Self {
        AppError::Location(e)
    }
}

impl From<StationError> for AppError {
    fn from(e: StationError) -> Self {
        AppError::Upstream {
            message: e.to_string(),
        }
    }
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            AppError::Location(LocationError::PermissionDenied) => StatusCode::FORBIDDEN,
            AppError::Location(LocationError::Timeout) => StatusCode::GATEWAY_TIMEOUT,
            AppError::Location(
                LocationError::PositionUnavailable | LocationError::GeocodingUnavailable,
            ) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Upstream { .. } => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status();
        let body = match self {
            AppError::BadRequest { message } | AppError::Upstream { message } => ErrorResponse {
                error: message,
                code: None,
            },
            AppError::Location(e) => ErrorResponse::from_location(e),
        };

        warn!(status = status.as_u16(), error = %body.error, "request failed");

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use chrono::{TimeZone, Utc};
    use serde_json::{Value, json};

    use super::*;
    use crate::clock::ManualClock;
    use crate::domain::Station;
    use crate::geocoding::{GeocodedAddress, MockGeocoder};
    use crate::sensor::{MockSensor, SensorError, SensorReading};
    use crate::service::{LocationConfig, LocationService};
    use crate::stations::{StationClient, StationClientConfig, StationDirectory};

    struct TestApp {
        base: String,
        http: reqwest::Client,
        sensor: MockSensor,
        geocoder: MockGeocoder,
    }

    fn coords(lat: f64, lon: f64) -> Coordinates {
        Coordinates::new(lat, lon).unwrap()
    }

    fn stations() -> Vec<Station> {
        let mut far = Station::new("far", "Posto Longe", coords(0.0, 0.5));
        far.prices.insert(FuelType::Ethanol, 3.49);
        let mut near = Station::new("near", "Posto Perto", coords(0.0, 0.01));
        near.prices.insert(FuelType::Ethanol, 3.99);
        near.prices.insert(FuelType::Diesel, 5.99);
        let mid = Station::new("mid", "Posto Meio", coords(0.0, 0.1));
        vec![far, near, mid]
    }

    async fn spawn_app(config: LocationConfig) -> TestApp {
        let sensor = MockSensor::new();
        let geocoder = MockGeocoder::new();
        let clock = ManualClock::new(Utc.with_ymd_and_hms(2024, 3, 15, 12, 0, 0).unwrap());
        let location =
            LocationService::with_clock(sensor.clone(), geocoder.clone(), config, None, clock);

        let client =
            StationClient::new(StationClientConfig::new("http://127.0.0.1:9", "key").with_timeout(1))
                .unwrap();
        let directory = StationDirectory::new(client, stations());

        let app = create_router(AppState::new(location, directory));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        TestApp {
            base: format!("http://{addr}"),
            http: reqwest::Client::new(),
            sensor,
            geocoder,
        }
    }

    impl TestApp {
        async fn get(&self, path: &str) -> (StatusCode, Value) {
            let resp = self.http.get(format!("{}{path}", self.base)).send().await.unwrap();
            (resp.status(), resp.json().await.unwrap())
        }

        async fn send(&self, method: reqwest::Method, path: &str, body: Value) -> (StatusCode, Value) {
            let resp = self
                .http
                .request(method, format!("{}{path}", self.base))
                .json(&body)
                .send()
                .await
                .unwrap();
            (resp.status(), resp.json().await.unwrap())
        }

        fn ids(body: &Value) -> Vec<String> {
            body["stations"]
                .as_array()
                .unwrap()
                .iter()
                .map(|s| s["id"].as_str().unwrap().to_string())
                .collect()
        }
    }

    #[tokio::test]
    async fn health_check() {
        let app = spawn_app(LocationConfig::default()).await;
        let body = app
            .http
            .get(format!("{}/health", app.base))
            .send()
            .await
            .unwrap()
            .text()
            .await
            .unwrap();
        assert_eq!(body, "ok");
    }

    #[tokio::test]
    async fn position_starts_empty() {
        let app = spawn_app(LocationConfig::default()).await;
        let (status, body) = app.get("/position").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["position"], Value::Null);
        assert_eq!(body["acquiring"], false);
        assert_eq!(body["last_error"], Value::Null);
    }

    #[tokio::test]
    async fn put_position_resolves_address() {
        let app = spawn_app(LocationConfig::default()).await;

        let (status, body) = app
            .send(
                reqwest::Method::PUT,
                "/position",
                json!({"latitude": 1.5, "longitude": -2.0}),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["address"], "Near 1.5,-2");

        let (_, status_body) = app.get("/position").await;
        assert_eq!(status_body["position"]["latitude"], 1.5);
        assert_eq!(status_body["position"]["observed_at"], "2024-03-15T12:00:00Z");
    }

    #[tokio::test]
    async fn put_position_rejects_invalid_coordinates() {
        let app = spawn_app(LocationConfig::default()).await;

        let (status, body) = app
            .send(
                reqwest::Method::PUT,
                "/position",
                json!({"latitude": 91.0, "longitude": 0.0}),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("latitude"));
    }

    #[tokio::test]
    async fn refresh_returns_new_position() {
        let app = spawn_app(LocationConfig::default()).await;
        app.sensor
            .push_fix(Ok(SensorReading::new(coords(-23.55, -46.63))));

        let (status, body) = app
            .send(reqwest::Method::POST, "/position/refresh", json!({}))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["latitude"], -23.55);
        assert_eq!(body["address"], "Near -23.55,-46.63");
    }

    #[tokio::test]
    async fn refresh_permission_denied_is_forbidden() {
        let app = spawn_app(LocationConfig::default()).await;
        app.sensor.push_fix(Err(SensorError::PermissionDenied));

        let (status, body) = app
            .send(reqwest::Method::POST, "/position/refresh", json!({}))
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["code"], "permission_denied");

        let (_, status_body) = app.get("/position").await;
        assert_eq!(status_body["last_error"], "permission_denied");
    }

    #[tokio::test]
    async fn refresh_unavailable() {
        let app = spawn_app(LocationConfig::default()).await;
        app.sensor
            .push_fix(Err(SensorError::PositionUnavailable("no signal".into())));

        let (status, body) = app
            .send(reqwest::Method::POST, "/position/refresh", json!({}))
            .await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["code"], "position_unavailable");
    }

    #[tokio::test]
    async fn refresh_timeout_is_gateway_timeout() {
        let config = LocationConfig::default().with_refresh_timeout(Duration::from_millis(50));
        let app = spawn_app(config).await;

        let (status, body) = app
            .send(reqwest::Method::POST, "/position/refresh", json!({}))
            .await;
        assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(body["code"], "timeout");
    }

    #[tokio::test]
    async fn search_address() {
        let app = spawn_app(LocationConfig::default()).await;
        app.geocoder.add_place(
            "Avenida Paulista 1000",
            GeocodedAddress {
                coordinates: coords(-23.5648, -46.6524),
                formatted_address: "Av. Paulista, 1000 - Bela Vista, São Paulo - SP".to_string(),
            },
        );

        let (status, body) = app
            .send(
                reqwest::Method::POST,
                "/position/search",
                json!({"query": "avenida paulista 1000"}),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["latitude"], -23.5648);

        let (status, body) = app
            .send(
                reqwest::Method::POST,
                "/position/search",
                json!({"query": "Nowhere"}),
            )
            .await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["code"], "geocoding_unavailable");

        let (status, _) = app
            .send(reqwest::Method::POST, "/position/search", json!({"query": "  "}))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn nearby_without_position_keeps_order() {
        let app = spawn_app(LocationConfig::default()).await;

        let (status, body) = app.get("/stations/nearby").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["position"], Value::Null);
        assert_eq!(TestApp::ids(&body), vec!["far", "near", "mid"]);
        assert_eq!(body["stations"][0]["distance_km"], Value::Null);
    }

    #[tokio::test]
    async fn nearby_ranks_from_current_position() {
        let app = spawn_app(LocationConfig::default()).await;
        app.send(
            reqwest::Method::PUT,
            "/position",
            json!({"latitude": 0.0, "longitude": 0.0, "address": "Origin"}),
        )
        .await;

        let (_, body) = app.get("/stations/nearby").await;
        assert_eq!(TestApp::ids(&body), vec!["near", "mid", "far"]);
        let d = body["stations"][0]["distance_km"].as_f64().unwrap();
        assert!((d - 1.112).abs() < 0.01);

        let (_, body) = app.get("/stations/nearby?radius_km=20").await;
        assert_eq!(TestApp::ids(&body), vec!["near", "mid"]);

        let (_, body) = app.get("/stations/nearby?limit=1").await;
        assert_eq!(TestApp::ids(&body), vec!["near"]);

        let (_, body) = app.get("/stations/nearby?fuel=ethanol").await;
        assert_eq!(TestApp::ids(&body), vec!["far", "near"]);
        assert_eq!(body["stations"][0]["prices"]["ethanol"], 3.49);

        let (_, body) = app.get("/stations/nearby?fuel=ethanol&radius_km=20").await;
        assert_eq!(TestApp::ids(&body), vec!["near"]);
    }

    #[tokio::test]
    async fn nearby_rejects_bad_parameters() {
        let app = spawn_app(LocationConfig::default()).await;

        let (status, _) = app.get("/stations/nearby?fuel=kerosene").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = app.get("/stations/nearby?radius_km=-3").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn station_refresh_failure_is_bad_gateway() {
        let app = spawn_app(LocationConfig::default()).await;

        let (status, body) = app
            .send(reqwest::Method::POST, "/stations/refresh", json!({}))
            .await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert!(body["error"].is_string());

        // The existing list survives
        let (_, body) = app.get("/stations/nearby").await;
        assert_eq!(TestApp::ids(&body).len(), 3);
    }
}
