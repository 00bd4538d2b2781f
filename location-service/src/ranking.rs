//! Station ranking by distance and price.
//!
//! Distances are computed against the current position on every call and
//! returned alongside the station; nothing is cached on the station itself.
//! With no position every distance is absent, and stations keep their
//! original order.

use std::cmp::Ordering;

use crate::domain::{Coordinates, FuelType, Station};

/// A station paired with its distance from the current position.
#[derive(Debug, Clone, PartialEq)]
pub struct RankedStation<'a> {
    pub station: &'a Station,
    /// Kilometres from the current position; `None` if no position is known.
    pub distance_km: Option<f64>,
}

/// Order two optional distances: known distances ascending, absent last.
fn compare_distance(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.total_cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Pair every station with its distance from `from`.
pub fn with_distances<'a>(
    stations: &'a [Station],
    from: Option<&Coordinates>,
) -> Vec<RankedStation<'a>> {
    stations
        .iter()
        .map(|station| RankedStation {
            station,
            distance_km: from.map(|c| c.distance_km(&station.coordinates)),
        })
        .collect()
}

/// Rank stations nearest-first.
///
/// Stations without a distance sort last. The sort is stable, so ties
/// (including the all-absent case) keep their input order.
pub fn rank_by_distance<'a>(
    stations: &'a [Station],
    from: Option<&Coordinates>,
) -> Vec<RankedStation<'a>> {
    let mut ranked = with_distances(stations, from);
    ranked.sort_by(|a, b| compare_distance(a.distance_km, b.distance_km));
    ranked
}

/// Stations within `radius_km` of `from`, nearest-first.
///
/// Returns nothing when there is no position, since no distance is known.
pub fn within_radius<'a>(
    stations: &'a [Station],
    from: Option<&Coordinates>,
    radius_km: f64,
) -> Vec<RankedStation<'a>> {
    rank_by_distance(stations, from)
        .into_iter()
        .filter(|r| r.distance_km.is_some_and(|d| d <= radius_km))
        .collect()
}

/// Stations selling `fuel`, cheapest first, then nearest.
///
/// When a radius is given, only stations with a known distance inside it
/// are kept.
pub fn cheapest_nearby<'a>(
    stations: &'a [Station],
    from: Option<&Coordinates>,
    fuel: FuelType,
    radius_km: Option<f64>,
) -> Vec<RankedStation<'a>> {
    let mut ranked: Vec<_> = with_distances(stations, from)
        .into_iter()
        .filter(|r| r.station.price(fuel).is_some())
        .filter(|r| match radius_km {
            Some(radius) => r.distance_km.is_some_and(|d| d <= radius),
            None => true,
        })
        .collect();

    ranked.sort_by(|a, b| {
        let price_cmp = match (a.station.price(fuel), b.station.price(fuel)) {
            (Some(pa), Some(pb)) => pa.total_cmp(&pb),
            _ => Ordering::Equal,
        };
        if price_cmp != Ordering::Equal {
            return price_cmp;
        }
        compare_distance(a.distance_km, b.distance_km)
    });

    ranked
}
