//! Fuel stations and their prices.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::error::DomainError;
use super::position::Coordinates;

/// Fuel types sold at stations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FuelType {
    Gasoline,
    AdditiveGasoline,
    Ethanol,
    Diesel,
    DieselS10,
    /// Compressed natural gas
    Gnv,
}

impl FuelType {
    /// All fuel types, in display order.
    pub const ALL: [FuelType; 6] = [
        FuelType::Gasoline,
        FuelType::AdditiveGasoline,
        FuelType::Ethanol,
        FuelType::Diesel,
        FuelType::DieselS10,
        FuelType::Gnv,
    ];

    /// The wire name used by the backend and the HTTP API.
    pub fn as_str(&self) -> &'static str {
        match self {
            FuelType::Gasoline => "gasoline",
            FuelType::AdditiveGasoline => "additive_gasoline",
            FuelType::Ethanol => "ethanol",
            FuelType::Diesel => "diesel",
            FuelType::DieselS10 => "diesel_s10",
            FuelType::Gnv => "gnv",
        }
    }
}

impl fmt::Display for FuelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FuelType {
    type Err = DomainError;

    /// Parse a wire name, ignoring case and surrounding whitespace.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        FuelType::ALL
            .into_iter()
            .find(|f| f.as_str() == normalized)
            .ok_or_else(|| DomainError::UnknownFuelType(s.to_string()))
    }
}

/// A fuel station as published by the backend.
///
/// Stations are read-only to this crate: distances are computed alongside
/// them (see [`crate::ranking`]) and never stored on the station itself.
#[derive(Debug, Clone, PartialEq)]
pub struct Station {
    pub id: String,
    pub name: String,
    pub address: Option<String>,
    pub coordinates: Coordinates,
    /// Price per litre (or m³ for GNV), by fuel type.
    pub prices: BTreeMap<FuelType, f64>,
    pub prices_updated_at: Option<DateTime<Utc>>,
}

impl Station {
    /// Create a station with no prices.
    pub fn new(id: impl Into<String>, name: impl Into<String>, coordinates: Coordinates) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            address: None,
            coordinates,
            prices: BTreeMap::new(),
            prices_updated_at: None,
        }
    }

    /// Price for a fuel type, if the station sells it.
    pub fn price(&self, fuel: FuelType) -> Option<f64> {
        self.prices.get(&fuel).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_fuel_types() {
        assert_eq!("gasoline".parse::<FuelType>(), Ok(FuelType::Gasoline));
        assert_eq!(" Ethanol ".parse::<FuelType>(), Ok(FuelType::Ethanol));
        assert_eq!("DIESEL_S10".parse::<FuelType>(), Ok(FuelType::DieselS10));
        assert_eq!("gnv".parse::<FuelType>(), Ok(FuelType::Gnv));
        assert_eq!(
            "kerosene".parse::<FuelType>(),
            Err(DomainError::UnknownFuelType("kerosene".into()))
        );
    }

    #[test]
    fn wire_names_roundtrip() {
        for fuel in FuelType::ALL {
            assert_eq!(fuel.as_str().parse::<FuelType>(), Ok(fuel));
            let json = serde_json::to_string(&fuel).unwrap();
            assert_eq!(json, format!("\"{}\"", fuel.as_str()));
        }
    }

    #[test]
    fn price_lookup() {
        let mut station = Station::new("1", "Posto Central", Coordinates::new(0.0, 0.0).unwrap());
        station.prices.insert(FuelType::Ethanol, 3.89);

        assert_eq!(station.price(FuelType::Ethanol), Some(3.89));
        assert_eq!(station.price(FuelType::Diesel), None);
    }
}
