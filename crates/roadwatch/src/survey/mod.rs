pub mod decoder;
pub mod domain;
pub mod evaluation;
pub mod inspect;
pub mod pipeline;
pub mod repository;
pub mod router;
pub mod service;
pub mod table;
pub mod upload;

pub use decoder::{ColumnMap, DecodeSummary, SkipCounts, SurveyDecoder};
pub use domain::{DistressType, LaneMeasurement, LaneSlot, Severity};
pub use evaluation::{AlertCandidate, DistressEvaluator, ThresholdProfile};
pub use pipeline::{IngestError, IngestOutcome, IngestPipeline};
pub use repository::{RepositoryError, SurveyRepository};
pub use router::survey_router;
pub use service::{SurveyService, SurveyServiceError};
pub use table::{DelimitedTableReader, RawTable, TableReader};
pub use upload::{UploadError, UploadPolicy};
