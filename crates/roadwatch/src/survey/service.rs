use std::sync::Arc;

use chrono::NaiveDate;

use super::decoder::SurveyDecoder;
use super::evaluation::DistressEvaluator;
use super::inspect::{diagnose, TableDiagnostics};
use super::pipeline::{IngestError, IngestOutcome, IngestPipeline};
use super::repository::{
    AlertFilter, AlertId, AlertRecord, HighwayRecord, NetworkStats, RepositoryError, SegmentDetail,
    SegmentFilter, SegmentId, SurveyRepository,
};
use super::table::{TableReadError, TableReader};
use super::upload::{UploadError, UploadPolicy};

/// Facade composing the upload gate, table reader, ingestion pipeline,
/// and repository query surface behind one seam the HTTP router and CLI
/// both call.
pub struct SurveyService<R> {
    repository: Arc<R>,
    pipeline: IngestPipeline<R>,
    reader: Box<dyn TableReader>,
    policy: UploadPolicy,
}

impl<R: SurveyRepository> SurveyService<R> {
    pub fn new(
        repository: Arc<R>,
        decoder: SurveyDecoder,
        evaluator: DistressEvaluator,
        reader: Box<dyn TableReader>,
        policy: UploadPolicy,
    ) -> Self {
        let pipeline = IngestPipeline::new(repository.clone(), decoder, evaluator);
        Self {
            repository,
            pipeline,
            reader,
            policy,
        }
    }

    /// Validate and ingest an uploaded survey file, returning the
    /// per-category created counts.
    pub fn upload(
        &self,
        file_name: &str,
        bytes: &[u8],
        survey_date: NaiveDate,
    ) -> Result<IngestOutcome, SurveyServiceError> {
        self.policy.validate(file_name, bytes.len())?;
        let outcome = self
            .pipeline
            .ingest_bytes(self.reader.as_ref(), bytes, survey_date)?;
        Ok(outcome)
    }

    /// Structural diagnostics for an upload, without ingesting anything.
    pub fn inspect(
        &self,
        file_name: &str,
        bytes: &[u8],
    ) -> Result<TableDiagnostics, SurveyServiceError> {
        self.policy.validate(file_name, bytes.len())?;
        let table = self.reader.read(bytes)?;
        Ok(diagnose(&table, self.pipeline.decoder()))
    }

    pub fn highways(&self) -> Result<Vec<HighwayRecord>, SurveyServiceError> {
        Ok(self.repository.highways()?)
    }

    pub fn segments(&self, filter: &SegmentFilter) -> Result<Vec<SegmentDetail>, SurveyServiceError> {
        Ok(self.repository.segments(filter)?)
    }

    pub fn segment(&self, id: SegmentId) -> Result<SegmentDetail, SurveyServiceError> {
        self.repository
            .segment_by_id(id)?
            .ok_or(SurveyServiceError::Repository(RepositoryError::NotFound))
    }

    pub fn alerts(&self, filter: &AlertFilter) -> Result<Vec<AlertRecord>, SurveyServiceError> {
        Ok(self.repository.alerts(filter)?)
    }

    pub fn resolve_alert(&self, id: AlertId) -> Result<AlertRecord, SurveyServiceError> {
        Ok(self.repository.resolve_alert(id)?)
    }

    pub fn stats(&self) -> Result<NetworkStats, SurveyServiceError> {
        Ok(self.repository.stats()?)
    }

    pub fn search_segments(&self, query: &str) -> Result<Vec<SegmentDetail>, SurveyServiceError> {
        Ok(self.repository.search_segments(query)?)
    }
}

/// Error raised by the survey service facade.
#[derive(Debug, thiserror::Error)]
pub enum SurveyServiceError {
    #[error(transparent)]
    Upload(#[from] UploadError),
    #[error(transparent)]
    Ingest(#[from] IngestError),
    #[error(transparent)]
    Table(#[from] TableReadError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
