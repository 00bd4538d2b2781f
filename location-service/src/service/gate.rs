//! Update-acceptance gate for passive readings.
//!
//! Passive readings arrive often and noisily. The gate drops readings that
//! would not meaningfully change the published position, which avoids
//! redundant reverse-geocoding calls and storage writes:
//!
//! 1. No prior position: accept.
//! 2. Less than the update interval since the last acceptance: reject.
//! 3. Within the significant distance of the prior position: reject.
//! 4. Otherwise accept.
//!
//! Manual refreshes and externally supplied positions bypass the gate.

use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};

use crate::domain::{Coordinates, Position};

use super::config::LocationConfig;

/// Outcome of gating one reading.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GateDecision {
    Accept,
    /// The last acceptance was too recent.
    TooSoon { elapsed: TimeDelta },
    /// The reading is too close to the current position.
    TooClose { distance_km: f64 },
}

impl GateDecision {
    pub fn is_accept(&self) -> bool {
        matches!(self, GateDecision::Accept)
    }
}

/// Time and distance thresholds for passive updates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UpdateGate {
    interval: TimeDelta,
    significant_distance_km: f64,
}

impl UpdateGate {
    pub fn new(interval: Duration, significant_distance_km: f64) -> Self {
        Self {
            interval: TimeDelta::from_std(interval).unwrap_or(TimeDelta::MAX),
            significant_distance_km,
        }
    }

    pub fn from_config(config: &LocationConfig) -> Self {
        Self::new(config.update_interval, config.significant_distance_km)
    }

    /// Decide whether `candidate` should replace `prior`.
    ///
    /// `last_accepted_at` falls back to the prior position's observation
    /// time when no acceptance has happened yet in this process (a position
    /// restored from cache).
    pub fn evaluate(
        &self,
        prior: Option<&Position>,
        last_accepted_at: Option<DateTime<Utc>>,
        candidate: &Coordinates,
        now: DateTime<Utc>,
    ) -> GateDecision {
        let Some(prior) = prior else {
            return GateDecision::Accept;
        };

        let since = last_accepted_at.unwrap_or_else(|| prior.observed_at());
        let elapsed = now.signed_duration_since(since);
        if elapsed < self.interval {
            return GateDecision::TooSoon { elapsed };
        }

        let distance_km = prior.distance_km(candidate);
        if distance_km <= self.significant_distance_km {
            return GateDecision::TooClose { distance_km };
        }

        GateDecision::Accept
    }
}

impl Default for UpdateGate {
    fn default() -> Self {
        Self::from_config(&LocationConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(mins: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 15, 12, 0, 0).unwrap() + TimeDelta::minutes(mins)
    }

    fn coords(lat: f64, lon: f64) -> Coordinates {
        Coordinates::new(lat, lon).unwrap()
    }

    fn origin_at(mins: i64) -> Position {
        Position::new(coords(0.0, 0.0), at(mins))
    }

    #[test]
    fn no_prior_accepts_anything() {
        let gate = UpdateGate::default();
        assert_eq!(
            gate.evaluate(None, None, &coords(0.0, 0.0), at(0)),
            GateDecision::Accept
        );
        assert_eq!(
            gate.evaluate(None, Some(at(0)), &coords(0.0, 0.000001), at(0)),
            GateDecision::Accept
        );
    }

    #[test]
    fn interval_gate_dominates() {
        // 10 minutes ago, ~0.22 km away: far enough, too soon
        let gate = UpdateGate::default();
        let prior = origin_at(0);

        let decision = gate.evaluate(Some(&prior), Some(at(0)), &coords(0.0, 0.002), at(10));
        assert_eq!(
            decision,
            GateDecision::TooSoon {
                elapsed: TimeDelta::minutes(10)
            }
        );
    }

    #[test]
    fn distance_gate_after_interval() {
        // 40 minutes ago, ~0.01 km away: late enough, too close
        let gate = UpdateGate::default();
        let prior = origin_at(0);

        let decision = gate.evaluate(Some(&prior), Some(at(0)), &coords(0.0, 0.0001), at(40));
        assert!(matches!(decision, GateDecision::TooClose { distance_km } if distance_km < 0.1));
    }

    #[test]
    fn both_gates_fail() {
        let gate = UpdateGate::default();
        let prior = origin_at(0);

        let decision = gate.evaluate(Some(&prior), Some(at(0)), &coords(0.0, 0.0001), at(5));
        assert!(matches!(decision, GateDecision::TooSoon { .. }));
    }

    #[test]
    fn accepts_when_both_pass() {
        // 40 minutes ago, ~1.1 km away
        let gate = UpdateGate::default();
        let prior = origin_at(0);

        assert_eq!(
            gate.evaluate(Some(&prior), Some(at(0)), &coords(0.0, 0.01), at(40)),
            GateDecision::Accept
        );
    }

    #[test]
    fn interval_boundary_is_inclusive() {
        let gate = UpdateGate::default();
        let prior = origin_at(0);

        assert!(
            !gate
                .evaluate(Some(&prior), Some(at(0)), &coords(0.0, 0.01), at(29))
                .is_accept()
        );
        assert!(
            gate.evaluate(Some(&prior), Some(at(0)), &coords(0.0, 0.01), at(30))
                .is_accept()
        );
    }

    #[test]
    fn exactly_significant_distance_is_rejected() {
        // Threshold set to the exact distance of the candidate
        let candidate = coords(0.0, 0.01);
        let exact = origin_at(0).distance_km(&candidate);
        let gate = UpdateGate::new(Duration::from_secs(60), exact);

        assert!(matches!(
            gate.evaluate(Some(&origin_at(0)), Some(at(0)), &candidate, at(40)),
            GateDecision::TooClose { .. }
        ));
    }

    #[test]
    fn falls_back_to_observation_time() {
        let gate = UpdateGate::default();
        let cached = origin_at(0);

        assert!(matches!(
            gate.evaluate(Some(&cached), None, &coords(0.0, 0.01), at(10)),
            GateDecision::TooSoon { .. }
        ));
        assert!(
            gate.evaluate(Some(&cached), None, &coords(0.0, 0.01), at(31))
                .is_accept()
        );
    }

    #[test]
    fn last_acceptance_not_observation_drives_interval() {
        // Position observed long ago but accepted recently (e.g. set manually)
        let gate = UpdateGate::default();
        let prior = origin_at(-120);

        assert!(matches!(
            gate.evaluate(Some(&prior), Some(at(0)), &coords(0.0, 0.01), at(10)),
            GateDecision::TooSoon { .. }
        ));
    }
}
