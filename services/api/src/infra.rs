use chrono::Utc;
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};

use roadwatch::survey::domain::LaneMeasurement;
use roadwatch::survey::evaluation::AlertCandidate;
use roadwatch::survey::repository::{
    AlertFilter, AlertId, AlertRecord, DistressShare, HighwayId, HighwayRecord, LaneId, LaneRecord,
    NetworkStats, NewHighway, NewSegment, RepositoryError, SegmentDetail, SegmentFilter, SegmentId,
    SegmentRecord, SurveyRepository,
};
use roadwatch::survey::{
    DelimitedTableReader, DistressEvaluator, DistressType, Severity, SurveyDecoder, SurveyService,
    ThresholdProfile, UploadPolicy,
};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

const DEFAULT_SEGMENT_LIMIT: usize = 50;
const DEFAULT_ALERT_LIMIT: usize = 50;
const SEARCH_LIMIT: usize = 20;

#[derive(Default)]
struct Store {
    highways: Vec<HighwayRecord>,
    segments: Vec<SegmentRecord>,
    lanes: Vec<LaneRecord>,
    alerts: Vec<AlertRecord>,
    next_id: i64,
}

impl Store {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn detail(&self, segment: &SegmentRecord) -> Option<SegmentDetail> {
        let highway = self
            .highways
            .iter()
            .find(|highway| highway.id == segment.highway_id)?
            .clone();

        let lanes = self
            .lanes
            .iter()
            .filter(|lane| lane.segment_id == segment.id)
            .map(|lane| roadwatch::survey::repository::LaneWithAlerts {
                lane: lane.clone(),
                alerts: self
                    .alerts
                    .iter()
                    .filter(|alert| alert.lane_id == lane.id)
                    .cloned()
                    .collect(),
            })
            .collect();

        Some(SegmentDetail {
            segment: segment.clone(),
            highway,
            lanes,
        })
    }
}

/// Mutex-backed repository standing in for the relational store. Keeps the
/// HTTP surface and the CLI exercisable without a database.
#[derive(Default, Clone)]
pub(crate) struct InMemorySurveyRepository {
    store: Arc<Mutex<Store>>,
}

impl SurveyRepository for InMemorySurveyRepository {
    fn highways(&self) -> Result<Vec<HighwayRecord>, RepositoryError> {
        let store = self.store.lock().expect("store mutex poisoned");
        let mut highways = store.highways.clone();
        highways.sort_by(|a, b| a.code.cmp(&b.code));
        Ok(highways)
    }

    fn highway_by_code(&self, code: &str) -> Result<Option<HighwayRecord>, RepositoryError> {
        let store = self.store.lock().expect("store mutex poisoned");
        Ok(store
            .highways
            .iter()
            .find(|highway| highway.code == code)
            .cloned())
    }

    fn create_highway(&self, highway: NewHighway) -> Result<HighwayRecord, RepositoryError> {
        let mut store = self.store.lock().expect("store mutex poisoned");
        if store.highways.iter().any(|existing| existing.code == highway.code) {
            return Err(RepositoryError::Conflict);
        }
        let record = HighwayRecord {
            id: HighwayId(store.next_id()),
            code: highway.code,
            name: highway.name,
            total_length_km: highway.total_length_km,
            created_at: Utc::now(),
        };
        store.highways.push(record.clone());
        Ok(record)
    }

    fn segments(&self, filter: &SegmentFilter) -> Result<Vec<SegmentDetail>, RepositoryError> {
        let store = self.store.lock().expect("store mutex poisoned");

        let highway_id = match &filter.highway_code {
            Some(code) => match store.highways.iter().find(|highway| &highway.code == code) {
                Some(highway) => Some(highway.id),
                // Unknown highway filters to an empty listing, not an error.
                None => return Ok(Vec::new()),
            },
            None => None,
        };

        let mut matched: Vec<&SegmentRecord> = store
            .segments
            .iter()
            .filter(|segment| highway_id.is_none_or(|id| segment.highway_id == id))
            .filter(|segment| {
                filter
                    .surveyed_from
                    .is_none_or(|from| segment.survey_date >= from)
            })
            .filter(|segment| filter.surveyed_to.is_none_or(|to| segment.survey_date <= to))
            .collect();

        // Newest surveys first, id as the tiebreaker for same-day uploads.
        matched.sort_by(|a, b| (b.survey_date, b.id).cmp(&(a.survey_date, a.id)));

        let offset = filter.offset.unwrap_or(0);
        let limit = filter.limit.unwrap_or(DEFAULT_SEGMENT_LIMIT);
        Ok(matched
            .into_iter()
            .skip(offset)
            .take(limit)
            .filter_map(|segment| store.detail(segment))
            .collect())
    }

    fn segment_by_id(&self, id: SegmentId) -> Result<Option<SegmentDetail>, RepositoryError> {
        let store = self.store.lock().expect("store mutex poisoned");
        Ok(store
            .segments
            .iter()
            .find(|segment| segment.id == id)
            .and_then(|segment| store.detail(segment)))
    }

    fn create_segment(&self, segment: NewSegment) -> Result<SegmentRecord, RepositoryError> {
        let mut store = self.store.lock().expect("store mutex poisoned");
        let record = SegmentRecord {
            id: SegmentId(store.next_id()),
            highway_id: segment.highway_id,
            chainage_start: segment.chainage_start,
            chainage_end: segment.chainage_end,
            length_km: segment.chainage_end - segment.chainage_start,
            survey_date: segment.survey_date,
            created_at: Utc::now(),
        };
        store.segments.push(record.clone());
        Ok(record)
    }

    fn bulk_create_lanes(
        &self,
        segment_id: SegmentId,
        measurements: &[LaneMeasurement],
    ) -> Result<Vec<LaneRecord>, RepositoryError> {
        let mut store = self.store.lock().expect("store mutex poisoned");
        let mut created = Vec::with_capacity(measurements.len());
        for measurement in measurements {
            let record = LaneRecord {
                id: LaneId(store.next_id()),
                segment_id,
                lane: measurement.lane,
                latitude: measurement.latitude,
                longitude: measurement.longitude,
                roughness: measurement.roughness,
                rut_depth: measurement.rut_depth,
                crack_area: measurement.crack_area,
                ravelling: measurement.ravelling,
                created_at: Utc::now(),
            };
            store.lanes.push(record.clone());
            created.push(record);
        }
        Ok(created)
    }

    fn alerts(&self, filter: &AlertFilter) -> Result<Vec<AlertRecord>, RepositoryError> {
        let store = self.store.lock().expect("store mutex poisoned");
        let mut matched: Vec<&AlertRecord> = store
            .alerts
            .iter()
            .filter(|alert| filter.severity.is_none_or(|severity| alert.severity == severity))
            .filter(|alert| filter.resolved.is_none_or(|resolved| alert.is_resolved == resolved))
            .collect();

        matched.sort_by(|a, b| b.id.cmp(&a.id));
        Ok(matched
            .into_iter()
            .take(filter.limit.unwrap_or(DEFAULT_ALERT_LIMIT))
            .cloned()
            .collect())
    }

    fn create_alert(
        &self,
        lane_id: LaneId,
        candidate: &AlertCandidate,
    ) -> Result<AlertRecord, RepositoryError> {
        let mut store = self.store.lock().expect("store mutex poisoned");
        if !store.lanes.iter().any(|lane| lane.id == lane_id) {
            return Err(RepositoryError::NotFound);
        }
        let record = AlertRecord {
            id: AlertId(store.next_id()),
            lane_id,
            distress: candidate.distress,
            severity: candidate.severity,
            threshold_value: candidate.threshold_value,
            actual_value: candidate.actual_value,
            message: candidate.message.clone(),
            is_resolved: false,
            created_at: Utc::now(),
            resolved_at: None,
        };
        store.alerts.push(record.clone());
        Ok(record)
    }

    fn resolve_alert(&self, id: AlertId) -> Result<AlertRecord, RepositoryError> {
        let mut store = self.store.lock().expect("store mutex poisoned");
        let alert = store
            .alerts
            .iter_mut()
            .find(|alert| alert.id == id)
            .ok_or(RepositoryError::NotFound)?;
        alert.is_resolved = true;
        alert.resolved_at = Some(Utc::now());
        Ok(alert.clone())
    }

    fn stats(&self) -> Result<NetworkStats, RepositoryError> {
        let store = self.store.lock().expect("store mutex poisoned");

        let measured: Vec<f64> = store
            .lanes
            .iter()
            .filter_map(|lane| lane.roughness)
            .collect();
        let avg_roughness = if measured.is_empty() {
            0.0
        } else {
            measured.iter().sum::<f64>() / measured.len() as f64
        };

        let total_alerts = store.alerts.len();
        let distress_distribution = DistressType::ALL
            .into_iter()
            .map(|distress| {
                let count = store
                    .alerts
                    .iter()
                    .filter(|alert| alert.distress == distress)
                    .count();
                let percentage = if total_alerts > 0 {
                    count as f64 / total_alerts as f64 * 100.0
                } else {
                    0.0
                };
                DistressShare {
                    distress,
                    count,
                    percentage,
                }
            })
            .collect();

        Ok(NetworkStats {
            total_segments: store.segments.len(),
            critical_alerts: store
                .alerts
                .iter()
                .filter(|alert| alert.severity == Severity::Critical && !alert.is_resolved)
                .count(),
            avg_roughness,
            distress_distribution,
        })
    }

    fn search_segments(&self, query: &str) -> Result<Vec<SegmentDetail>, RepositoryError> {
        let store = self.store.lock().expect("store mutex poisoned");
        let needle = query.to_ascii_lowercase();

        let matching_highways: Vec<HighwayId> = store
            .highways
            .iter()
            .filter(|highway| {
                highway.code.to_ascii_lowercase().contains(&needle)
                    || highway.name.to_ascii_lowercase().contains(&needle)
            })
            .map(|highway| highway.id)
            .collect();

        let mut matched: Vec<&SegmentRecord> = store
            .segments
            .iter()
            .filter(|segment| matching_highways.contains(&segment.highway_id))
            .collect();
        matched.sort_by(|a, b| (b.survey_date, b.id).cmp(&(a.survey_date, a.id)));

        Ok(matched
            .into_iter()
            .take(SEARCH_LIMIT)
            .filter_map(|segment| store.detail(segment))
            .collect())
    }
}

/// Wires the facade the router and CLI operations share.
pub(crate) fn survey_service(
    repository: Arc<InMemorySurveyRepository>,
    max_upload_bytes: usize,
) -> SurveyService<InMemorySurveyRepository> {
    SurveyService::new(
        repository,
        SurveyDecoder::standard(),
        DistressEvaluator::new(ThresholdProfile::default()),
        Box::new(DelimitedTableReader::default()),
        UploadPolicy::default()
            .with_max_bytes(max_upload_bytes)
            // Delimited-text deployments feed the same gate.
            .also_accepting(".csv"),
    )
}
