//! Ingest command implementation

use std::path::PathBuf;

use crate::cli::error::CliError;
use crate::cli::output::format_ingest_report;
use crate::config::AppConfig;
use crate::ingest::IngestionTrigger;

/// Arguments for the `ingest` command
pub struct IngestArgs {
    /// Local CSV file to upload
    pub file: PathBuf,
    /// Blob name in the raw container (defaults to the file name)
    pub name: Option<String>,
    /// Print the report as JSON
    pub json: bool,
}

fn blob_name(args: &IngestArgs) -> Result<String, CliError> {
    if let Some(name) = &args.name {
        return Ok(name.clone());
    }
    args.file
        .file_name()
        .and_then(|n| n.to_str())
        .map(str::to_string)
        .ok_or_else(|| {
            CliError::InvalidArgument(format!("Cannot derive a blob name from {}", args.file.display()))
        })
}

/// Handle the `ingest` command: upload into the raw container and run the pipeline
pub async fn handle_ingest(args: &IngestArgs, config: &AppConfig) -> Result<(), CliError> {
    let content = tokio::fs::read(&args.file)
        .await
        .map_err(|e| CliError::FileReadError(args.file.clone(), e.to_string()))?;
    let name = blob_name(args)?;

    let store = config.storage.open()?;
    let trigger = IngestionTrigger::new(store, config.containers.outputs.clone());
    let report = trigger
        .upload_and_handle(&config.containers.raw, &name, &content)
        .await?;

    if args.json {
        let json = serde_json::to_string_pretty(&report)
            .map_err(|e| CliError::InvalidArgument(e.to_string()))?;
        println!("{json}");
    } else {
        print!("{}", format_ingest_report(&report, trigger.outputs_container()));
    }
    Ok(())
}
