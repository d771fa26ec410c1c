use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{DistressType, LaneMeasurement, LaneSlot, Severity};
use super::evaluation::{worst_severity, AlertCandidate};

macro_rules! id_newtype {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        pub struct $name(pub i64);
    };
}

id_newtype!(HighwayId);
id_newtype!(SegmentId);
id_newtype!(LaneId);
id_newtype!(AlertId);

/// A national highway known to the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HighwayRecord {
    pub id: HighwayId,
    pub code: String,
    pub name: String,
    pub total_length_km: f64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewHighway {
    pub code: String,
    pub name: String,
    pub total_length_km: f64,
}

impl NewHighway {
    /// Default registration for a code first seen during ingestion.
    pub fn from_code(code: &str) -> Self {
        Self {
            code: code.to_string(),
            name: format!("National Highway {code}"),
            total_length_km: 0.0,
        }
    }
}

/// A surveyed chainage interval of one highway.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentRecord {
    pub id: SegmentId,
    pub highway_id: HighwayId,
    pub chainage_start: f64,
    pub chainage_end: f64,
    pub length_km: f64,
    pub survey_date: NaiveDate,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewSegment {
    pub highway_id: HighwayId,
    pub chainage_start: f64,
    pub chainage_end: f64,
    pub survey_date: NaiveDate,
}

/// Persisted lane readings, the stored projection of a [`LaneMeasurement`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LaneRecord {
    pub id: LaneId,
    pub segment_id: SegmentId,
    pub lane: LaneSlot,
    pub latitude: f64,
    pub longitude: f64,
    pub roughness: Option<f64>,
    pub rut_depth: Option<f64>,
    pub crack_area: Option<f64>,
    pub ravelling: Option<f64>,
    pub created_at: DateTime<Utc>,
}

/// Persisted threshold-violation alert with resolution state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertRecord {
    pub id: AlertId,
    pub lane_id: LaneId,
    pub distress: DistressType,
    pub severity: Severity,
    pub threshold_value: f64,
    pub actual_value: f64,
    pub message: String,
    pub is_resolved: bool,
    pub created_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
}

/// One lane plus its alerts, as the dashboard consumes it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LaneWithAlerts {
    pub lane: LaneRecord,
    pub alerts: Vec<AlertRecord>,
}

/// A segment joined with its highway and lane/alert children.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SegmentDetail {
    pub segment: SegmentRecord,
    pub highway: HighwayRecord,
    pub lanes: Vec<LaneWithAlerts>,
}

impl SegmentDetail {
    /// Displayed condition for the segment: worst unresolved alert
    /// severity across all lanes, `excellent` when nothing alerted.
    pub fn worst_severity(&self) -> Severity {
        worst_severity(
            self.lanes
                .iter()
                .flat_map(|lane| &lane.alerts)
                .filter(|alert| !alert.is_resolved)
                .map(|alert| alert.severity),
        )
    }
}

/// Segment listing filters; limit defaults are the repository's concern.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SegmentFilter {
    pub highway_code: Option<String>,
    pub surveyed_from: Option<NaiveDate>,
    pub surveyed_to: Option<NaiveDate>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct AlertFilter {
    pub severity: Option<Severity>,
    pub resolved: Option<bool>,
    pub limit: Option<usize>,
}

/// Alert share of one distress type across all stored alerts.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DistressShare {
    pub distress: DistressType,
    pub count: usize,
    pub percentage: f64,
}

/// Dashboard headline figures.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NetworkStats {
    pub total_segments: usize,
    pub critical_alerts: usize,
    pub avg_roughness: f64,
    pub distress_distribution: Vec<DistressShare>,
}

/// Storage abstraction so the pipeline and HTTP surface can be exercised
/// without a database. Bulk lane creation is order-preserving so alert
/// generation can zip created lanes back to their source measurements.
pub trait SurveyRepository: Send + Sync {
    fn highways(&self) -> Result<Vec<HighwayRecord>, RepositoryError>;
    fn highway_by_code(&self, code: &str) -> Result<Option<HighwayRecord>, RepositoryError>;
    fn create_highway(&self, highway: NewHighway) -> Result<HighwayRecord, RepositoryError>;

    fn segments(&self, filter: &SegmentFilter) -> Result<Vec<SegmentDetail>, RepositoryError>;
    fn segment_by_id(&self, id: SegmentId) -> Result<Option<SegmentDetail>, RepositoryError>;
    fn create_segment(&self, segment: NewSegment) -> Result<SegmentRecord, RepositoryError>;

    fn bulk_create_lanes(
        &self,
        segment_id: SegmentId,
        measurements: &[LaneMeasurement],
    ) -> Result<Vec<LaneRecord>, RepositoryError>;

    fn alerts(&self, filter: &AlertFilter) -> Result<Vec<AlertRecord>, RepositoryError>;
    fn create_alert(
        &self,
        lane_id: LaneId,
        candidate: &AlertCandidate,
    ) -> Result<AlertRecord, RepositoryError>;
    fn resolve_alert(&self, id: AlertId) -> Result<AlertRecord, RepositoryError>;

    fn stats(&self) -> Result<NetworkStats, RepositoryError>;
    fn search_segments(&self, query: &str) -> Result<Vec<SegmentDetail>, RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record not found")]
    NotFound,
    #[error("record already exists")]
    Conflict,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alert(severity: Severity, resolved: bool) -> AlertRecord {
        AlertRecord {
            id: AlertId(1),
            lane_id: LaneId(1),
            distress: DistressType::Roughness,
            severity,
            threshold_value: 2400.0,
            actual_value: 2900.0,
            message: String::new(),
            is_resolved: resolved,
            created_at: Utc::now(),
            resolved_at: None,
        }
    }

    fn detail(lane_alerts: Vec<Vec<AlertRecord>>) -> SegmentDetail {
        let highway = HighwayRecord {
            id: HighwayId(1),
            code: "NH-44".to_string(),
            name: "National Highway NH-44".to_string(),
            total_length_km: 0.0,
            created_at: Utc::now(),
        };
        let segment = SegmentRecord {
            id: SegmentId(1),
            highway_id: highway.id,
            chainage_start: 10.0,
            chainage_end: 10.5,
            length_km: 0.5,
            survey_date: NaiveDate::from_ymd_opt(2026, 3, 14).expect("valid date"),
            created_at: Utc::now(),
        };
        let lanes = lane_alerts
            .into_iter()
            .enumerate()
            .map(|(index, alerts)| LaneWithAlerts {
                lane: LaneRecord {
                    id: LaneId(index as i64),
                    segment_id: segment.id,
                    lane: LaneSlot::ALL[index],
                    latitude: 28.7,
                    longitude: 77.1,
                    roughness: None,
                    rut_depth: None,
                    crack_area: None,
                    ravelling: None,
                    created_at: Utc::now(),
                },
                alerts,
            })
            .collect();

        SegmentDetail {
            segment,
            highway,
            lanes,
        }
    }

    #[test]
    fn worst_severity_takes_maximum_across_lanes() {
        let detail = detail(vec![
            vec![alert(Severity::Good, false)],
            vec![alert(Severity::Critical, false)],
            vec![alert(Severity::Fair, false)],
        ]);
        assert_eq!(detail.worst_severity(), Severity::Critical);
    }

    #[test]
    fn worst_severity_ignores_resolved_alerts() {
        let detail = detail(vec![
            vec![alert(Severity::Critical, true)],
            vec![alert(Severity::Fair, false)],
        ]);
        assert_eq!(detail.worst_severity(), Severity::Fair);
    }

    #[test]
    fn segment_without_alerts_reads_excellent() {
        let detail = detail(vec![vec![], vec![]]);
        assert_eq!(detail.worst_severity(), Severity::Excellent);
    }

    #[test]
    fn new_highway_from_code_derives_display_name() {
        let highway = NewHighway::from_code("NH-148N");
        assert_eq!(highway.name, "National Highway NH-148N");
        assert_eq!(highway.total_length_km, 0.0);
    }
}
