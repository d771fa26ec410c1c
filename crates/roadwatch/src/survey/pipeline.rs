use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{info, warn};

use super::decoder::{SkipCounts, SurveyDecoder};
use super::domain::LaneMeasurement;
use super::evaluation::DistressEvaluator;
use super::repository::{NewHighway, NewSegment, RepositoryError, SurveyRepository};
use super::table::{RawTable, TableReadError, TableReader};

/// Structured ingestion outcome: per-category created counts rather than a
/// boolean, because partial success is the designed failure mode.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IngestOutcome {
    pub highways_created: usize,
    pub segments_created: usize,
    pub lanes_created: usize,
    pub alerts_created: usize,
    /// Grouped segments that failed persistence and were skipped over.
    pub segments_failed: usize,
    /// Lane measurements the decoder admitted.
    pub measurements_decoded: usize,
    pub rows_skipped: SkipCounts,
    pub elapsed_ms: u128,
}

/// Ingestion failures surfaced to the caller. Everything row- or
/// segment-scoped is absorbed into the outcome counts instead.
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error(transparent)]
    Table(#[from] TableReadError),
    /// Table read fine but nothing survived admission. Distinct from a
    /// fatal read error so callers can suggest a format inspection.
    #[error("no valid survey data found in the uploaded table")]
    NoValidData,
}

/// Decoded measurements grouped under one (highway, chainage interval).
struct SegmentGroup {
    highway_code: String,
    chainage_start: f64,
    chainage_end: f64,
    lanes: Vec<LaneMeasurement>,
}

/// Orchestrates decode, grouping, persistence, and alert derivation.
///
/// Segments are processed sequentially; a persistence failure inside one
/// group is logged and skipped so the rest of the upload still lands.
/// Re-uploading an already-ingested range intentionally creates fresh
/// records (last write wins) pending a product decision on upserts.
pub struct IngestPipeline<R> {
    repository: Arc<R>,
    decoder: SurveyDecoder,
    evaluator: DistressEvaluator,
}

impl<R: SurveyRepository> IngestPipeline<R> {
    pub fn new(repository: Arc<R>, decoder: SurveyDecoder, evaluator: DistressEvaluator) -> Self {
        Self {
            repository,
            decoder,
            evaluator,
        }
    }

    pub fn decoder(&self) -> &SurveyDecoder {
        &self.decoder
    }

    /// Read bytes through the given table reader, then ingest.
    pub fn ingest_bytes(
        &self,
        reader: &dyn TableReader,
        bytes: &[u8],
        survey_date: NaiveDate,
    ) -> Result<IngestOutcome, IngestError> {
        let table = reader.read(bytes)?;
        self.ingest(&table, survey_date)
    }

    pub fn ingest(
        &self,
        table: &RawTable,
        survey_date: NaiveDate,
    ) -> Result<IngestOutcome, IngestError> {
        let started = Instant::now();
        let summary = self.decoder.decode(table);

        if summary.measurements.is_empty() {
            return Err(IngestError::NoValidData);
        }

        let mut outcome = IngestOutcome {
            measurements_decoded: summary.measurements.len(),
            rows_skipped: summary.skipped,
            ..IngestOutcome::default()
        };

        for group in group_by_segment(summary.measurements) {
            if let Err(error) = self.persist_group(&group, survey_date, &mut outcome) {
                outcome.segments_failed += 1;
                warn!(
                    highway = %group.highway_code,
                    chainage_start = group.chainage_start,
                    chainage_end = group.chainage_end,
                    error = %error,
                    "skipping segment after persistence failure"
                );
            }
        }

        outcome.elapsed_ms = started.elapsed().as_millis();
        info!(
            highways = outcome.highways_created,
            segments = outcome.segments_created,
            lanes = outcome.lanes_created,
            alerts = outcome.alerts_created,
            skipped_rows = outcome.rows_skipped.total(),
            elapsed_ms = outcome.elapsed_ms as u64,
            "survey ingestion finished"
        );

        Ok(outcome)
    }

    fn persist_group(
        &self,
        group: &SegmentGroup,
        survey_date: NaiveDate,
        outcome: &mut IngestOutcome,
    ) -> Result<(), RepositoryError> {
        let highway = match self.repository.highway_by_code(&group.highway_code)? {
            Some(existing) => existing,
            None => {
                let created = self
                    .repository
                    .create_highway(NewHighway::from_code(&group.highway_code))?;
                outcome.highways_created += 1;
                created
            }
        };

        let segment = self.repository.create_segment(NewSegment {
            highway_id: highway.id,
            chainage_start: group.chainage_start,
            chainage_end: group.chainage_end,
            survey_date,
        })?;
        outcome.segments_created += 1;

        let lanes = self.repository.bulk_create_lanes(segment.id, &group.lanes)?;
        outcome.lanes_created += lanes.len();

        // bulk_create_lanes preserves input order, so created lanes zip
        // back onto their source measurements.
        for (lane, measurement) in lanes.iter().zip(&group.lanes) {
            for candidate in self.evaluator.alerts_for(measurement) {
                self.repository.create_alert(lane.id, &candidate)?;
                outcome.alerts_created += 1;
            }
        }

        Ok(())
    }
}

/// Groups the flat measurement stream by (highway, chainage interval),
/// preserving first-seen order.
fn group_by_segment(measurements: Vec<LaneMeasurement>) -> Vec<SegmentGroup> {
    let mut groups: Vec<SegmentGroup> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for measurement in measurements {
        let key = format!(
            "{}-{}-{}",
            measurement.highway_code, measurement.chainage_start, measurement.chainage_end
        );
        match index.get(&key) {
            Some(&position) => groups[position].lanes.push(measurement),
            None => {
                index.insert(key, groups.len());
                groups.push(SegmentGroup {
                    highway_code: measurement.highway_code.clone(),
                    chainage_start: measurement.chainage_start,
                    chainage_end: measurement.chainage_end,
                    lanes: vec![measurement],
                });
            }
        }
    }

    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::survey::domain::LaneSlot;

    fn measurement(code: &str, start: f64, end: f64, lane: LaneSlot) -> LaneMeasurement {
        LaneMeasurement {
            highway_code: code.to_string(),
            chainage_start: start,
            chainage_end: end,
            lane,
            latitude: 28.7,
            longitude: 77.1,
            roughness: None,
            rut_depth: None,
            crack_area: None,
            ravelling: None,
        }
    }

    #[test]
    fn grouping_preserves_first_seen_order() {
        let groups = group_by_segment(vec![
            measurement("NH-44", 10.0, 10.5, LaneSlot::L1),
            measurement("NH-48", 3.0, 3.5, LaneSlot::L1),
            measurement("NH-44", 10.0, 10.5, LaneSlot::R1),
            measurement("NH-44", 10.5, 11.0, LaneSlot::L1),
        ]);

        let keys: Vec<(String, f64)> = groups
            .iter()
            .map(|group| (group.highway_code.clone(), group.chainage_start))
            .collect();
        assert_eq!(
            keys,
            [
                ("NH-44".to_string(), 10.0),
                ("NH-48".to_string(), 3.0),
                ("NH-44".to_string(), 10.5),
            ]
        );
        assert_eq!(groups[0].lanes.len(), 2);
        assert_eq!(groups[0].lanes[1].lane, LaneSlot::R1);
    }
}
