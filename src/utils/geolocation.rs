use crate::error::GeolocationFailure;
use crate::utils::validation::validate_coordinates;
use std::future::Future;
use std::time::Duration;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Position {
    pub latitude: f64,
    pub longitude: f64,
    /// Reported accuracy radius in meters, if the source provides one.
    pub accuracy: Option<f64>,
}

/// Single, time-bounded attempt to obtain a position. No retries.
pub async fn acquire_position<F>(source: F, timeout: Duration) -> Result<Position, GeolocationFailure>
where
    F: Future<Output = Result<Position, GeolocationFailure>>,
{
    match tokio::time::timeout(timeout, source).await {
        Ok(result) => result,
        Err(_) => {
            tracing::warn!(?timeout, "Geolocation attempt timed out");
            Err(GeolocationFailure::Timeout)
        }
    }
}

/// Position typed in by the user as command arguments.
pub async fn position_from_arguments(
    latitude: Option<f64>,
    longitude: Option<f64>,
    accuracy: Option<f64>,
) -> Result<Position, GeolocationFailure> {
    let (latitude, longitude) = match (latitude, longitude) {
        (Some(lat), Some(lon)) => (lat, lon),
        (None, None) => return Err(GeolocationFailure::Unsupported),
        _ => return Err(GeolocationFailure::PositionUnavailable),
    };

    if validate_coordinates(latitude, longitude).is_err() {
        return Err(GeolocationFailure::PositionUnavailable);
    }

    let accuracy = accuracy.filter(|a| a.is_finite() && *a >= 0.0);

    Ok(Position {
        latitude,
        longitude,
        accuracy,
    })
}
