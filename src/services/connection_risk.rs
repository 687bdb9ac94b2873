//! Connection risk assessment for two-leg itineraries.
//!
//! Pure calculation; the poller (or an on-demand request path) persists the
//! result, never this module.

use std::sync::LazyLock;

use chrono::Utc;
use regex::Regex;

use crate::models::{
    ConnectionRisk, FactorImpact, Flight, FlightStatus, RiskFactor, RiskFactorKind, RiskLevel,
};

/// Flat walking-time estimate for a terminal change, in minutes.
/// Large airports can be far worse; this is the floor, not an average.
const TERMINAL_CHANGE_MINUTES: f64 = 15.0;

static NON_DIGITS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\D").expect("non-digit pattern is valid"));

/// Computes the risk of missing the outgoing leg, given the freshest state
/// of both flights.
///
/// The level is a deterministic function of the effective buffer (scheduled
/// connection time minus current delay minus estimated gate-change walking
/// time); the factor list is explanatory only. An already-canceled incoming
/// leg forces CRITICAL regardless of buffer. The historical on-time rate is
/// supplied by an external collaborator; when absent the factor is omitted.
pub fn calculate_risk(
    incoming: &Flight,
    outgoing: &Flight,
    on_time_rate: Option<f64>,
) -> ConnectionRisk {
    let buffer_minutes = (outgoing.scheduled_departure - incoming.scheduled_arrival).num_seconds()
        as f64
        / 60.0;
    let current_delay = incoming.delay_minutes as f64;
    let gate_change_minutes = estimate_gate_change_minutes(
        incoming.arrival_gate.as_deref(),
        outgoing.departure_gate.as_deref(),
        incoming.destination_terminal.as_deref(),
        outgoing.origin_terminal.as_deref(),
    );

    let effective_buffer = buffer_minutes - current_delay - gate_change_minutes;

    let level = if incoming.status == FlightStatus::Canceled {
        RiskLevel::Critical
    } else if effective_buffer < 20.0 {
        RiskLevel::Critical
    } else if effective_buffer < 30.0 {
        RiskLevel::HighRisk
    } else if effective_buffer < 45.0 {
        RiskLevel::AtRisk
    } else {
        RiskLevel::OnTrack
    };

    let mut factors = vec![
        RiskFactor {
            kind: RiskFactorKind::ConnectionTime,
            description: format!("{} minutes between flights", buffer_minutes.floor() as i64),
            impact: if buffer_minutes >= 45.0 {
                FactorImpact::Positive
            } else if buffer_minutes >= 30.0 {
                FactorImpact::Neutral
            } else {
                FactorImpact::Negative
            },
            weight: 0.3,
        },
        RiskFactor {
            kind: RiskFactorKind::Delay,
            description: if current_delay > 0.0 {
                format!("Incoming flight delayed {} minutes", incoming.delay_minutes)
            } else {
                "No current delay".to_string()
            },
            impact: if current_delay > 0.0 {
                FactorImpact::Negative
            } else {
                FactorImpact::Positive
            },
            weight: 0.4,
        },
        RiskFactor {
            kind: RiskFactorKind::GateDistance,
            description: if gate_change_minutes > 10.0 {
                format!("~{} minutes between gates", gate_change_minutes.round() as i64)
            } else {
                "Same gate/terminal".to_string()
            },
            impact: if gate_change_minutes > 10.0 {
                FactorImpact::Negative
            } else {
                FactorImpact::Positive
            },
            weight: 0.2,
        },
    ];

    if let Some(rate) = on_time_rate {
        factors.push(RiskFactor {
            kind: RiskFactorKind::Historical,
            description: format!("Historical on-time rate: {}%", (rate * 100.0).round() as i64),
            impact: if rate > 0.85 {
                FactorImpact::Positive
            } else {
                FactorImpact::Neutral
            },
            weight: 0.1,
        });
    }

    let confidence = confidence_score(incoming, outgoing, on_time_rate.is_some());

    ConnectionRisk {
        level,
        buffer_minutes: effective_buffer.round() as i32,
        factors,
        confidence,
        calculated_at: Utc::now(),
    }
}

/// Estimates walking time between the arrival gate and the next departure
/// gate, in minutes.
fn estimate_gate_change_minutes(
    from_gate: Option<&str>,
    to_gate: Option<&str>,
    from_terminal: Option<&str>,
    to_terminal: Option<&str>,
) -> f64 {
    let from = from_gate.unwrap_or("");
    let to = to_gate.unwrap_or("");

    if from == to {
        return 0.0;
    }

    if from_terminal == to_terminal {
        // ~5 min base + 0.5 min per gate of distance within the terminal
        let distance = (gate_number(from) - gate_number(to)).abs() as f64;
        return 5.0 + distance * 0.5;
    }

    TERMINAL_CHANGE_MINUTES
}

/// Numeric part of a gate label ("B12" -> 12); 0 when absent
fn gate_number(gate: &str) -> i32 {
    NON_DIGITS.replace_all(gate, "").parse().unwrap_or(0)
}

/// Data-completeness score in `[0, 1]`.
///
/// Schedule data alone scores 0.6; known connection gates, live estimates on
/// the incoming leg, and a supplied historical rate raise it.
fn confidence_score(incoming: &Flight, outgoing: &Flight, has_historical: bool) -> f64 {
    let mut confidence: f64 = 0.6;
    if incoming.arrival_gate.is_some() && outgoing.departure_gate.is_some() {
        confidence += 0.15;
    }
    if incoming.estimated_arrival.is_some() || incoming.actual_arrival.is_some() {
        confidence += 0.15;
    }
    if has_historical {
        confidence += 0.1;
    }
    confidence.min(1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use proptest::prelude::*;
    use uuid::Uuid;

    fn ts(hour: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 15, hour, min, 0).unwrap()
    }

    fn leg(scheduled_departure: DateTime<Utc>, scheduled_arrival: DateTime<Utc>) -> Flight {
        Flight {
            id: Uuid::new_v4(),
            airline_code: "AA".to_string(),
            airline_name: "American Airlines".to_string(),
            flight_number: "1234".to_string(),
            origin_code: "LAX".to_string(),
            origin_terminal: Some("T4".to_string()),
            destination_code: "ORD".to_string(),
            destination_terminal: Some("T1".to_string()),
            departure_gate: Some("A1".to_string()),
            arrival_gate: Some("B5".to_string()),
            scheduled_departure,
            scheduled_arrival,
            estimated_departure: None,
            estimated_arrival: None,
            actual_departure: None,
            actual_arrival: None,
            status: FlightStatus::Scheduled,
            delay_minutes: 0,
            aircraft_type: None,
            last_fetched_at: ts(9, 0),
            created_at: ts(8, 0),
            updated_at: ts(9, 0),
        }
    }

    /// Incoming/outgoing pair with a same-gate, same-terminal transfer and
    /// the given raw buffer.
    fn same_gate_pair(buffer_minutes: i64) -> (Flight, Flight) {
        let incoming = leg(ts(10, 0), ts(14, 0));
        let mut outgoing = leg(
            ts(14, 0) + Duration::minutes(buffer_minutes),
            ts(20, 0),
        );
        outgoing.origin_terminal = incoming.destination_terminal.clone();
        outgoing.departure_gate = incoming.arrival_gate.clone();
        (incoming, outgoing)
    }

    #[test]
    fn test_delayed_incoming_scenario_is_high_risk() {
        // 14:00 arrival, 14:50 departure, same gate: raw buffer 50 minus
        // 30 minutes of delay leaves an effective buffer of exactly 20,
        // which falls in the HIGH_RISK band, not CRITICAL.
        let (mut incoming, outgoing) = same_gate_pair(50);
        incoming.delay_minutes = 30;

        let risk = calculate_risk(&incoming, &outgoing, None);
        assert_eq!(risk.level, RiskLevel::HighRisk);
        assert_eq!(risk.buffer_minutes, 20);
    }

    #[test]
    fn test_comfortable_connection_is_on_track_with_high_confidence() {
        let (incoming, outgoing) = same_gate_pair(90);

        let risk = calculate_risk(&incoming, &outgoing, None);
        assert_eq!(risk.level, RiskLevel::OnTrack);
        assert!(risk.confidence > 0.7);
        assert!(risk.confidence <= 1.0);
    }

    #[test]
    fn test_canceled_incoming_forces_critical() {
        let (mut incoming, outgoing) = same_gate_pair(180);
        incoming.status = FlightStatus::Canceled;

        let risk = calculate_risk(&incoming, &outgoing, None);
        assert_eq!(risk.level, RiskLevel::Critical);
    }

    #[test]
    fn test_threshold_boundaries() {
        let cases = [
            (19, RiskLevel::Critical),
            (20, RiskLevel::HighRisk),
            (29, RiskLevel::HighRisk),
            (30, RiskLevel::AtRisk),
            (44, RiskLevel::AtRisk),
            (45, RiskLevel::OnTrack),
        ];
        for (buffer, expected) in cases {
            let (incoming, outgoing) = same_gate_pair(buffer);
            let risk = calculate_risk(&incoming, &outgoing, None);
            assert_eq!(risk.level, expected, "buffer of {} minutes", buffer);
        }
    }

    #[test]
    fn test_gate_change_same_terminal_scales_with_distance() {
        assert_eq!(
            estimate_gate_change_minutes(Some("A12"), Some("A12"), Some("T1"), Some("T1")),
            0.0
        );
        // 5 + 0.5 * |12 - 20|
        assert_eq!(
            estimate_gate_change_minutes(Some("A12"), Some("A20"), Some("T1"), Some("T1")),
            9.0
        );
        assert_eq!(
            estimate_gate_change_minutes(Some("A12"), Some("C3"), Some("T1"), Some("T2")),
            15.0
        );
    }

    #[test]
    fn test_gate_number_parsing() {
        assert_eq!(gate_number("B12"), 12);
        assert_eq!(gate_number("102"), 102);
        assert_eq!(gate_number("TBD"), 0);
        assert_eq!(gate_number(""), 0);
    }

    #[test]
    fn test_terminal_change_reduces_effective_buffer() {
        let (incoming, mut outgoing) = same_gate_pair(50);
        outgoing.departure_gate = Some("C3".to_string());
        outgoing.origin_terminal = Some("T9".to_string());

        // 50 - 15 terminal change = 35 -> AT_RISK
        let risk = calculate_risk(&incoming, &outgoing, None);
        assert_eq!(risk.level, RiskLevel::AtRisk);
        assert_eq!(risk.buffer_minutes, 35);
    }

    #[test]
    fn test_historical_factor_omitted_without_source() {
        let (incoming, outgoing) = same_gate_pair(90);
        let risk = calculate_risk(&incoming, &outgoing, None);

        assert_eq!(risk.factors.len(), 3);
        assert!(
            !risk
                .factors
                .iter()
                .any(|f| f.kind == RiskFactorKind::Historical)
        );
    }

    #[test]
    fn test_historical_factor_included_when_supplied() {
        let (incoming, outgoing) = same_gate_pair(90);
        let risk = calculate_risk(&incoming, &outgoing, Some(0.92));

        let historical = risk
            .factors
            .iter()
            .find(|f| f.kind == RiskFactorKind::Historical)
            .expect("historical factor present");
        assert_eq!(historical.weight, 0.1);
        assert_eq!(historical.impact, FactorImpact::Positive);
        assert!(historical.description.contains("92%"));
    }

    #[test]
    fn test_factors_do_not_influence_level() {
        let (incoming, outgoing) = same_gate_pair(90);
        let without = calculate_risk(&incoming, &outgoing, None);
        let with = calculate_risk(&incoming, &outgoing, Some(0.5));
        assert_eq!(without.level, with.level);
    }

    #[test]
    fn test_fixed_factor_weights() {
        let (incoming, outgoing) = same_gate_pair(90);
        let risk = calculate_risk(&incoming, &outgoing, Some(0.9));

        let weight_of = |kind: RiskFactorKind| {
            risk.factors
                .iter()
                .find(|f| f.kind == kind)
                .map(|f| f.weight)
                .unwrap()
        };
        assert_eq!(weight_of(RiskFactorKind::ConnectionTime), 0.3);
        assert_eq!(weight_of(RiskFactorKind::Delay), 0.4);
        assert_eq!(weight_of(RiskFactorKind::GateDistance), 0.2);
        assert_eq!(weight_of(RiskFactorKind::Historical), 0.1);
    }

    proptest! {
        /// Shrinking the effective buffer never improves the level.
        #[test]
        fn prop_level_monotone_in_buffer(
            buffer in 0i64..180,
            shrink in 1i64..120,
        ) {
            let (incoming, outgoing) = same_gate_pair(buffer);
            let (incoming_tighter, outgoing_tighter) = same_gate_pair(buffer - shrink);

            let wide = calculate_risk(&incoming, &outgoing, None);
            let tight = calculate_risk(&incoming_tighter, &outgoing_tighter, None);

            // RiskLevel orders by severity, so "worse or equal" is >=
            prop_assert!(tight.level >= wide.level);
        }

        /// Confidence always lands in [0, 1].
        #[test]
        fn prop_confidence_in_unit_interval(
            buffer in -120i64..240,
            has_historical in proptest::bool::ANY,
        ) {
            let (incoming, outgoing) = same_gate_pair(buffer);
            let rate = has_historical.then_some(0.8);
            let risk = calculate_risk(&incoming, &outgoing, rate);
            prop_assert!((0.0..=1.0).contains(&risk.confidence));
        }
    }
}
