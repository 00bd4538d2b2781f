//! Location service for a fuel-loyalty client.
//!
//! Keeps the user's best-known position up to date with as few sensor
//! reads and geocoding calls as possible, and ranks fuel stations by
//! distance from it.

pub mod clock;
pub mod config;
pub mod distance;
pub mod domain;
pub mod geocoding;
pub mod ranking;
pub mod sensor;
pub mod service;
pub mod stations;
pub mod store;
pub mod web;
