use std::time::Duration;

use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use location_service::config::AppConfig;
use location_service::geocoding::{CachedGeocoder, GeocodeCacheConfig, GeocodingClient};
use location_service::sensor::LineSensor;
use location_service::service::{LocationEvent, LocationService};
use location_service::stations::{StationClient, StationDirectory};
use location_service::store::PositionStore;
use location_service::web::{AppState, create_router};

/// How often to refresh the station list.
const STATION_REFRESH_INTERVAL: Duration = Duration::from_secs(15 * 60);

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = AppConfig::from_env()?;

    // Positions arrive as `lat,lon[,accuracy_m]` lines on stdin
    let sensor = LineSensor::spawn(tokio::io::BufReader::new(tokio::io::stdin()));

    let geocoder = CachedGeocoder::new(
        GeocodingClient::new(config.geocoding.clone())?,
        &GeocodeCacheConfig::default(),
    );
    let store = PositionStore::new(&config.cache_path);
    let location = LocationService::new(sensor, geocoder, config.location.clone(), Some(store));

    let _events = location.observe(|event| match event {
        LocationEvent::Updated(position) => info!(
            latitude = position.latitude(),
            longitude = position.longitude(),
            "location changed"
        ),
        LocationEvent::Failed(error) => warn!(code = error.code(), "location unavailable"),
    });
    let watch = location.start_watch();

    let station_client = StationClient::new(config.stations.clone())?;
    let stations = match StationDirectory::fetch(station_client.clone()).await {
        Ok(directory) => directory,
        Err(e) => {
            warn!(error = %e, "failed to fetch stations, starting with an empty list");
            StationDirectory::empty(station_client)
        }
    };
    info!(count = stations.len().await, "loaded stations");

    // Spawn background task to refresh the station list
    let stations_refresh = stations.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(STATION_REFRESH_INTERVAL);
        interval.tick().await; // First tick is immediate, skip it
        loop {
            interval.tick().await;
            match stations_refresh.refresh().await {
                Ok(count) => info!(count, "refreshed stations"),
                Err(e) => warn!(error = %e, "failed to refresh stations"),
            }
        }
    });

    let app = create_router(AppState::new(location, stations));

    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    info!(addr = %config.listen_addr, "location service listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(error = %e, "failed to listen for shutdown signal");
                std::future::pending::<()>().await;
            }
        })
        .await?;

    watch.stop().await;
    info!("shut down");
    Ok(())
}
