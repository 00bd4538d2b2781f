//! Great-circle distance.

/// Mean Earth radius in kilometres.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Haversine distance between two points given in decimal degrees, in km.
///
/// Pure and deterministic; used by the update gate and by station ranking.
///
/// # Example
///
/// ```
/// use location_service::distance::haversine_km;
///
/// // One degree of latitude is roughly 111.2 km
/// let d = haversine_km(0.0, 0.0, 1.0, 0.0);
/// assert!((d - 111.195).abs() < 0.01);
/// ```
pub fn haversine_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_lon = (lon2 - lon1).to_radians();

    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lon / 2.0).sin().powi(2);

    // Clamp guards against a > 1 from rounding on antipodal points
    let c = 2.0 * a.sqrt().min(1.0).asin();

    EARTH_RADIUS_KM * c
}
