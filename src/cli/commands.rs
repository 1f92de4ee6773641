//! CLI Command Handlers
//!
//! Each handler builds the service from configuration, performs one
//! operation, and prints a human-readable or JSON rendering of the result.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tracing::warn;

use crate::ai::{ChatService, create_provider};
use crate::config::{Config, ConfigLoader};
use crate::service::AnalysisService;
use crate::storage::{BlobStore, Database, FsBlobStore};
use crate::types::{AnalysisPayload, KpiValue, Result, RunStatus};

/// Wire up the service stack from loaded configuration.
pub fn build_service(config: &Config) -> Result<Arc<AnalysisService>> {
    let db = Arc::new(Database::open(config.storage.database_path())?);
    let blobs: Arc<dyn BlobStore> = Arc::new(FsBlobStore::new(config.storage.blobs_dir()));

    let provider = if config.llm.enabled {
        match create_provider(config.llm.provider_config()) {
            Ok(provider) => Some(provider),
            Err(e) => {
                warn!(error = %e, "completion provider unavailable, chat will use fallback");
                None
            }
        }
    } else {
        None
    };

    Ok(AnalysisService::new(
        db,
        blobs,
        ChatService::new(provider),
        config.analysis.seed,
    ))
}

fn guess_mime(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default()
        .to_lowercase()
        .as_str()
    {
        "csv" => "text/csv",
        "tsv" | "txt" => "text/plain",
        "json" => "application/json",
        "xlsx" | "xls" => "application/vnd.ms-excel",
        "pdf" => "application/pdf",
        _ => "application/octet-stream",
    }
}

/// `upload <file>`: store a file and print the upload id.
pub async fn upload(config: &Config, path: &Path) -> Result<String> {
    let service = build_service(config)?;
    let bytes = tokio::fs::read(path).await?;
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("upload.bin");

    let record = service.upload(name, guess_mime(path), bytes).await?;
    println!("Uploaded {} ({} bytes)", record.original_name, record.size);
    println!("Upload id: {}", record.id);
    Ok(record.id)
}

/// `analyze`: start a run for an upload (or a file uploaded on the spot) and
/// optionally wait for it to finish.
pub async fn analyze(
    config: &Config,
    upload_id: Option<String>,
    file: Option<&Path>,
    wait_secs: Option<u64>,
) -> Result<()> {
    let service = build_service(config)?;

    let upload_id = match (upload_id, file) {
        (Some(id), _) => id,
        (None, Some(path)) => {
            let bytes = tokio::fs::read(path).await?;
            let name = path
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or("upload.bin");
            let record = service.upload(name, guess_mime(path), bytes).await?;
            println!("Upload id: {}", record.id);
            record.id
        }
        (None, None) => {
            return Err(crate::types::InsightError::Config(
                "provide an upload id or --file".to_string(),
            ));
        }
    };

    let run = service.start_analysis(&upload_id).await?;
    println!("Analysis id: {}", run.id);

    match wait_secs {
        Some(secs) => {
            let record = service
                .wait_for_analysis(&run.id, Duration::from_secs(secs))
                .await?;
            println!("Status: {}", record.status.as_str());
            if let Some(payload) = &record.payload {
                print_payload_summary(payload);
            }
        }
        None => {
            println!("Status: {}", run.status.as_str());
            println!("Poll with: insightboard status {}", run.id);
        }
    }
    Ok(())
}

/// `status <analysis-id>`: print the run status.
pub async fn status(config: &Config, analysis_id: &str) -> Result<RunStatus> {
    let service = build_service(config)?;
    let status = service.analysis_status(analysis_id)?;
    println!("{}", status.as_str());
    Ok(status)
}

/// `show <analysis-id>`: print the result payload.
pub async fn show(config: &Config, analysis_id: &str, as_json: bool) -> Result<()> {
    let service = build_service(config)?;
    let record = service.get_analysis(analysis_id)?;

    if as_json {
        println!("{}", serde_json::to_string_pretty(&record)?);
        return Ok(());
    }

    println!("Analysis {} ({})", record.id, record.status.as_str());
    match &record.payload {
        Some(payload) => print_payload_summary(payload),
        None => println!("No payload yet."),
    }
    Ok(())
}

/// `chat <message>`: one chat exchange against recent analyses.
pub async fn chat(config: &Config, message: &str) -> Result<()> {
    let service = build_service(config)?;
    let reply = service.chat(message).await?;
    println!("{}", reply.message);
    if !reply.suggestions.is_empty() {
        println!("\nTry asking:");
        for suggestion in &reply.suggestions {
            println!("  - {}", suggestion);
        }
    }
    Ok(())
}

/// `config init`: create the project config directory.
pub fn config_init() -> Result<()> {
    let dir = ConfigLoader::init_project()?;
    println!("Initialized {}", dir.display());
    Ok(())
}

/// `config show`: print the effective merged configuration.
pub fn config_show(as_json: bool) -> Result<()> {
    let config = ConfigLoader::load()?;
    if as_json {
        println!("{}", serde_json::to_string_pretty(&config)?);
    } else {
        println!(
            "{}",
            toml::to_string_pretty(&config)
                .map_err(|e| crate::types::InsightError::Config(e.to_string()))?
        );
    }
    Ok(())
}

/// `config path`: print where configuration is read from.
pub fn config_path() {
    if let Some(global) = ConfigLoader::global_config_path() {
        let exists = if global.exists() { "✓" } else { "✗" };
        println!("Global:  {} {}", exists, global.display());
    }
    let project = ConfigLoader::project_config_path();
    let exists = if project.exists() { "✓" } else { "✗" };
    println!("Project: {} {}", exists, project.display());
}

fn print_payload_summary(payload: &AnalysisPayload) {
    println!("\n{}", payload.summary.executive);

    println!("\nKPIs:");
    for kpi in &payload.kpis {
        let value = match &kpi.value {
            KpiValue::Number(n) => n.to_string(),
            KpiValue::Text(t) => t.clone(),
        };
        let unit = kpi.unit.as_deref().unwrap_or("");
        let change = kpi
            .change
            .as_deref()
            .map(|c| format!(" ({c})"))
            .unwrap_or_default();
        println!("  {}: {}{}{}", kpi.name, value, unit, change);
    }

    println!("\nInsights:");
    for insight in &payload.insights {
        println!("  - {}", insight);
    }

    println!("\nAction items:");
    for item in &payload.action_items {
        println!("  [{:?}] {}", item.priority, item.title);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mime_guess_by_extension() {
        assert_eq!(guess_mime(Path::new("a.csv")), "text/csv");
        assert_eq!(guess_mime(Path::new("a.XLSX")), "application/vnd.ms-excel");
        assert_eq!(guess_mime(Path::new("noext")), "application/octet-stream");
    }
}
