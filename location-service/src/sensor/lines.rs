//! Sensor fed by text lines of `lat,lon[,accuracy_m]`.
//!
//! Useful with a GPS daemon piped through a formatter, a replayed track
//! file, or a human typing fixes on stdin. Blank lines and lines starting
//! with `#` are ignored; malformed lines are logged and skipped.

use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::{mpsc, watch};
use tracing::{debug, warn};

use crate::domain::Coordinates;

use super::error::SensorError;
use super::{PositionSensor, ReadOptions, SensorReading, WATCH_BUFFER, WatchOptions, WatchReceiver};

type Fix = Result<SensorReading, SensorError>;

/// Parse a `lat,lon[,accuracy_m]` line.
pub fn parse_fix(line: &str) -> Result<SensorReading, String> {
    let mut fields = line.split(',').map(str::trim);

    let lat = fields
        .next()
        .ok_or("missing latitude")?
        .parse::<f64>()
        .map_err(|e| format!("bad latitude: {e}"))?;
    let lon = fields
        .next()
        .ok_or("missing longitude")?
        .parse::<f64>()
        .map_err(|e| format!("bad longitude: {e}"))?;
    let accuracy = fields
        .next()
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<f64>().map_err(|e| format!("bad accuracy: {e}")))
        .transpose()?;

    if fields.next().is_some() {
        return Err("too many fields".to_string());
    }

    let coordinates = Coordinates::new(lat, lon).map_err(|e| e.to_string())?;
    let reading = SensorReading::new(coordinates);
    Ok(match accuracy {
        Some(metres) => reading.with_accuracy(metres),
        None => reading,
    })
}

/// Sensor reading fixes from an async line source.
///
/// A background task reads the source and keeps the latest fix. When the
/// source ends, the sensor reports `PositionUnavailable`.
#[derive(Debug, Clone)]
pub struct LineSensor {
    latest: watch::Receiver<Option<Fix>>,
}

impl LineSensor {
    /// Start reading fixes from `reader`. Must be called inside a tokio runtime.
    pub fn spawn<R>(reader: R) -> Self
    where
        R: AsyncBufRead + Unpin + Send + 'static,
    {
        let (tx, rx) = watch::channel(None);

        tokio::spawn(async move {
            let mut lines = reader.lines();
            loop {
                match lines.next_line().await {
                    Ok(Some(line)) => {
                        let line = line.trim();
                        if line.is_empty() || line.starts_with('#') {
                            continue;
                        }
                        match parse_fix(line) {
                            Ok(reading) => {
                                debug!(coordinates = %reading.coordinates, "sensor fix");
                                tx.send_replace(Some(Ok(reading)));
                            }
                            Err(e) => warn!(line, error = %e, "ignoring malformed fix"),
                        }
                    }
                    Ok(None) => {
                        tx.send_replace(Some(Err(SensorError::PositionUnavailable(
                            "position source closed".to_string(),
                        ))));
                        break;
                    }
                    Err(e) => {
                        tx.send_replace(Some(Err(SensorError::PositionUnavailable(format!(
                            "position source failed: {e}"
                        )))));
                        break;
                    }
                }
            }
        });

        Self { latest: rx }
    }
}

impl PositionSensor for LineSensor {
    async fn read_once(&self, options: ReadOptions) -> Result<SensorReading, SensorError> {
        let mut rx = self.latest.clone();

        // Lines carry no timestamp, so any non-zero max age accepts the last fix
        let cached = rx.borrow_and_update().clone();
        if !options.max_age.is_zero()
            && let Some(Ok(reading)) = cached
        {
            return Ok(reading);
        }

        let next_fix = async move {
            loop {
                if rx.changed().await.is_err() {
                    return Err(SensorError::PositionUnavailable(
                        "position source closed".to_string(),
                    ));
                }
                let fix = rx.borrow_and_update().clone();
                if let Some(fix) = fix {
                    return fix;
                }
            }
        };

        tokio::time::timeout(options.timeout, next_fix)
            .await
            .map_err(|_| SensorError::Timeout)?
    }

    fn watch(&self, _options: WatchOptions) -> WatchReceiver {
        let (tx, out) = mpsc::channel(WATCH_BUFFER);
        let mut rx = self.latest.clone();

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = tx.closed() => break,
                    changed = rx.changed() => {
                        if changed.is_err() {
                            break;
                        }
                        let fix = rx.borrow_and_update().clone();
                        if let Some(fix) = fix
                            && tx.send(fix).await.is_err()
                        {
                            break;
                        }
                    }
                }
            }
        });

        out
    }
}
