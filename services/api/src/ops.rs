use std::path::PathBuf;
use std::sync::Arc;

use chrono::{Local, NaiveDate};
use clap::Args;

use crate::infra::{survey_service, InMemorySurveyRepository};
use roadwatch::error::AppError;
use roadwatch::survey::pipeline::IngestError;
use roadwatch::survey::SurveyServiceError;

#[derive(Args, Debug)]
pub(crate) struct IngestArgs {
    /// Survey export file (.xlsx/.xls are gated by name; content is read
    /// as delimited text)
    pub(crate) file: PathBuf,
    /// Survey date recorded on created segments, YYYY-MM-DD (defaults to
    /// today)
    #[arg(long, value_parser = parse_date_arg)]
    pub(crate) survey_date: Option<NaiveDate>,
}

#[derive(Args, Debug)]
pub(crate) struct InspectArgs {
    /// Survey export file to diagnose
    pub(crate) file: PathBuf,
}

fn parse_date_arg(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}

fn file_name_of(path: &PathBuf) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_default()
}

fn app_error(error: SurveyServiceError) -> AppError {
    match error {
        SurveyServiceError::Upload(err) => AppError::Upload(err),
        SurveyServiceError::Ingest(err) => AppError::Ingest(err),
        SurveyServiceError::Table(err) => AppError::Ingest(IngestError::Table(err)),
        SurveyServiceError::Repository(err) => {
            AppError::Io(std::io::Error::other(err.to_string()))
        }
    }
}

pub(crate) fn run_ingest(args: IngestArgs) -> Result<(), AppError> {
    let bytes = std::fs::read(&args.file)?;
    let repository = Arc::new(InMemorySurveyRepository::default());
    let service = survey_service(repository, roadwatch::survey::upload::DEFAULT_MAX_UPLOAD_BYTES);

    let survey_date = args
        .survey_date
        .unwrap_or_else(|| Local::now().date_naive());

    let outcome = service
        .upload(&file_name_of(&args.file), &bytes, survey_date)
        .map_err(app_error)?;

    println!("Ingested {}", args.file.display());
    println!("  highways created: {}", outcome.highways_created);
    println!("  segments created: {}", outcome.segments_created);
    println!("  lanes created:    {}", outcome.lanes_created);
    println!("  alerts created:   {}", outcome.alerts_created);
    if outcome.segments_failed > 0 {
        println!("  segments failed:  {}", outcome.segments_failed);
    }
    println!(
        "  rows skipped:     {} ({} missing mandatory cells, {} invalid chainage)",
        outcome.rows_skipped.total(),
        outcome.rows_skipped.missing_mandatory,
        outcome.rows_skipped.invalid_chainage
    );
    println!("  completed in {} ms", outcome.elapsed_ms);

    Ok(())
}

pub(crate) fn run_inspect(args: InspectArgs) -> Result<(), AppError> {
    let bytes = std::fs::read(&args.file)?;
    let repository = Arc::new(InMemorySurveyRepository::default());
    let service = survey_service(repository, roadwatch::survey::upload::DEFAULT_MAX_UPLOAD_BYTES);

    let diagnostics = service
        .inspect(&file_name_of(&args.file), &bytes)
        .map_err(app_error)?;

    let rendered = serde_json::to_string_pretty(&diagnostics)
        .map_err(|err| AppError::Io(std::io::Error::other(err)))?;
    println!("{rendered}");

    Ok(())
}
