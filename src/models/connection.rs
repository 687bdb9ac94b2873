//! Connection models: risk levels, contributing factors, and the persisted row.

use chrono::{DateTime, Utc};
use diesel::deserialize::{self, FromSql};
use diesel::pg::Pg;
use diesel::prelude::*;
use diesel::serialize::{self, Output, ToSql};
use diesel::sql_types::Text;
use diesel::{AsExpression, FromSqlRow};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::io::Write;
use uuid::Uuid;

// ============================================================================
// Enums
// ============================================================================

/// Risk level of a connection.
///
/// Variant order is severity order, so `Ord` compares "how bad it is".
/// The level is a deterministic function of the effective buffer only.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    AsExpression,
    FromSqlRow,
)]
#[diesel(sql_type = Text)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskLevel {
    OnTrack,
    AtRisk,
    HighRisk,
    Critical,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::OnTrack => "ON_TRACK",
            RiskLevel::AtRisk => "AT_RISK",
            RiskLevel::HighRisk => "HIGH_RISK",
            RiskLevel::Critical => "CRITICAL",
        }
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl diesel::query_builder::QueryId for RiskLevel {
    type QueryId = RiskLevel;
    const HAS_STATIC_QUERY_ID: bool = false;
}

impl ToSql<Text, Pg> for RiskLevel {
    fn to_sql<'b>(&'b self, out: &mut Output<'b, '_, Pg>) -> serialize::Result {
        out.write_all(self.as_str().as_bytes())?;
        Ok(serialize::IsNull::No)
    }
}

impl FromSql<Text, Pg> for RiskLevel {
    fn from_sql(
        bytes: <Pg as diesel::backend::Backend>::RawValue<'_>,
    ) -> deserialize::Result<Self> {
        let s = <String as FromSql<Text, Pg>>::from_sql(bytes)?;
        match s.as_str() {
            "ON_TRACK" => Ok(RiskLevel::OnTrack),
            "AT_RISK" => Ok(RiskLevel::AtRisk),
            "HIGH_RISK" => Ok(RiskLevel::HighRisk),
            "CRITICAL" => Ok(RiskLevel::Critical),
            _ => Err(format!("Unrecognized risk level: {}", s).into()),
        }
    }
}

/// Direction of a factor's contribution to the risk picture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FactorImpact {
    Positive,
    Negative,
    Neutral,
}

/// Category of a risk factor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskFactorKind {
    ConnectionTime,
    Delay,
    GateDistance,
    Historical,
}

/// Explanatory factor attached to a risk assessment.
///
/// Factors never influence the level directly; they exist so a client can
/// explain the assessment to the user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskFactor {
    pub kind: RiskFactorKind,
    pub description: String,
    pub impact: FactorImpact,
    pub weight: f64,
}

/// Result of a risk calculation for one connection
#[derive(Debug, Clone, Serialize)]
pub struct ConnectionRisk {
    pub level: RiskLevel,
    /// Effective buffer, signed; negative when the connection is already lost
    pub buffer_minutes: i32,
    pub factors: Vec<RiskFactor>,
    pub confidence: f64,
    pub calculated_at: DateTime<Utc>,
}

// ============================================================================
// Connection Models (Query/Update)
// ============================================================================

/// Connection query model for SELECT operations
#[derive(Debug, Clone, Queryable, Selectable, Serialize)]
#[diesel(table_name = crate::schema::connections)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Connection {
    pub id: Uuid,
    pub incoming_flight_id: Uuid,
    pub outgoing_flight_id: Uuid,
    pub risk_level: RiskLevel,
    pub buffer_minutes: i32,
    pub risk_factors: JsonValue,
    pub confidence: f64,
    pub calculated_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// UpdateConnectionRisk model for risk recomputation writes
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = crate::schema::connections)]
pub struct UpdateConnectionRisk {
    pub risk_level: RiskLevel,
    pub buffer_minutes: i32,
    pub risk_factors: JsonValue,
    pub confidence: f64,
    pub calculated_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UpdateConnectionRisk {
    pub fn from_risk(risk: &ConnectionRisk) -> Self {
        Self {
            risk_level: risk.level,
            buffer_minutes: risk.buffer_minutes,
            risk_factors: serde_json::to_value(&risk.factors)
                .unwrap_or_else(|_| JsonValue::Array(Vec::new())),
            confidence: risk.confidence,
            calculated_at: risk.calculated_at,
            updated_at: risk.calculated_at,
        }
    }
}
