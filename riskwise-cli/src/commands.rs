//! CLI subcommand handlers.

use crate::{Commands, ConfigAction, RiskAction};
use anyhow::Context;
use chrono::{DateTime, NaiveDate, Utc};
use riskwise_core::config::WORKSPACE_DIR;
use riskwise_core::export::export;
use riskwise_core::{
    ApiResponse, AppState, DateRange, ExportFormat, ExportOptions, NewRiskEntry,
    RiskCalculationInput, RiskCalculationService, RiskEntryPatch, RiskFilter, RiskRegister,
    RiskRegisterEntry, RiskwiseConfig, open_repository,
};
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::info;

/// Handle a CLI subcommand.
pub async fn handle_command(
    command: Commands,
    config: RiskwiseConfig,
    workspace: &Path,
) -> anyhow::Result<()> {
    match command {
        Commands::Calculate { input } => handle_calculate(&input, &config),
        Commands::Risk { action } => handle_risk(action, &config, workspace),
        Commands::Export {
            format,
            from,
            to,
            output,
        } => handle_export(format, from, to, output, &config, workspace),
        Commands::Serve { host, port } => handle_serve(host, port, config, workspace).await,
        Commands::Config { action } => handle_config(action, &config, workspace),
    }
}

/// Read a file, or stdin when the path is `-`.
fn read_input(path: &Path) -> anyhow::Result<String> {
    if path == Path::new("-") {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        Ok(buf)
    } else {
        std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
    }
}

fn open_register(config: &RiskwiseConfig, workspace: &Path) -> anyhow::Result<RiskRegister> {
    let repository = open_repository(&config.register, workspace)
        .map_err(|e| anyhow::anyhow!("Failed to open risk register: {}", e))?;
    Ok(RiskRegister::new(repository))
}

fn handle_calculate(input: &Path, config: &RiskwiseConfig) -> anyhow::Result<()> {
    let service = RiskCalculationService::new(config.calculation.clone());
    let output = calculate_document(&read_input(input)?, &service)?;
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

/// Run a single request or a batch and render the outcome as envelopes.
///
/// A single request that fails is an error; inside a batch each failure is
/// reported in its own envelope.
fn calculate_document(
    text: &str,
    service: &RiskCalculationService,
) -> anyhow::Result<serde_json::Value> {
    let value: serde_json::Value =
        serde_json::from_str(text).context("Calculation request is not valid JSON")?;

    if value.is_array() {
        let inputs: Vec<RiskCalculationInput> = serde_json::from_value(value)?;
        let results: Vec<_> = service
            .calculate_batch(inputs)
            .into_iter()
            .map(|result| match result {
                Ok(result) => ApiResponse::ok(result, "Cálculo de riesgo completado exitosamente"),
                Err(e) => ApiResponse::failure(e.client_message()),
            })
            .collect();
        Ok(serde_json::to_value(results)?)
    } else {
        let input: RiskCalculationInput = serde_json::from_value(value)?;
        let result = service
            .calculate(input)
            .map_err(|e| anyhow::anyhow!(e.client_message()))?;
        Ok(serde_json::to_value(result)?)
    }
}

fn handle_risk(
    action: RiskAction,
    config: &RiskwiseConfig,
    workspace: &Path,
) -> anyhow::Result<()> {
    let register = open_register(config, workspace)?;
    let client_error = |e: riskwise_core::RiskwiseError| anyhow::anyhow!(e.client_message());

    match action {
        RiskAction::List {
            search,
            status,
            category,
        } => {
            let entries = register
                .list(&RiskFilter {
                    search,
                    status,
                    category,
                })
                .map_err(client_error)?;
            for entry in &entries {
                println!("{}", format_entry_line(entry));
            }
            println!("{} riesgos encontrados", entries.len());
            Ok(())
        }
        RiskAction::Add { input } => {
            let new_entry: NewRiskEntry = serde_json::from_str(&read_input(&input)?)
                .context("Risk entry is not valid JSON")?;
            let entry = register.create(new_entry).map_err(client_error)?;
            println!("{}", serde_json::to_string_pretty(&entry)?);
            Ok(())
        }
        RiskAction::Show { id } => {
            let entry = register.get(&id).map_err(client_error)?;
            println!("{}", serde_json::to_string_pretty(&entry)?);
            Ok(())
        }
        RiskAction::Update { id, input } => {
            let patch: RiskEntryPatch = serde_json::from_str(&read_input(&input)?)
                .context("Risk patch is not valid JSON")?;
            let entry = register.update(&id, patch).map_err(client_error)?;
            println!("{}", serde_json::to_string_pretty(&entry)?);
            Ok(())
        }
        RiskAction::Delete { id } => {
            let entry = register.delete(&id).map_err(client_error)?;
            println!("Deleted {} ({})", entry.id, entry.name);
            Ok(())
        }
    }
}

/// One-line summary used by `risk list`.
fn format_entry_line(entry: &RiskRegisterEntry) -> String {
    format!(
        "{}  {:>6.2}  {:<9} {:<12} {}",
        entry.id,
        entry.residual_risk_score,
        entry.residual_risk_level.label(),
        entry.status.as_str(),
        entry.name
    )
}

/// Parse a date-range bound. Plain dates cover the whole day.
fn parse_date_bound(text: &str, end_of_day: bool) -> anyhow::Result<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Ok(dt.with_timezone(&Utc));
    }
    let date = NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .with_context(|| format!("Invalid date '{}': use YYYY-MM-DD or RFC 3339", text))?;
    let time = if end_of_day {
        date.and_hms_milli_opt(23, 59, 59, 999)
    } else {
        date.and_hms_opt(0, 0, 0)
    };
    time.map(|t| t.and_utc())
        .ok_or_else(|| anyhow::anyhow!("Invalid date '{}'", text))
}

fn export_options(
    format: Option<&str>,
    from: Option<&str>,
    to: Option<&str>,
    config: &RiskwiseConfig,
) -> anyhow::Result<ExportOptions> {
    let format = match format {
        Some(name) => name
            .parse::<ExportFormat>()
            .map_err(|e| anyhow::anyhow!(e.client_message()))?,
        None => config.export.default_format,
    };
    let date_range = match (from, to) {
        (Some(from), Some(to)) => Some(DateRange {
            from: parse_date_bound(from, false)?,
            to: parse_date_bound(to, true)?,
        }),
        _ => None,
    };
    Ok(ExportOptions {
        format,
        include_calculations: true,
        include_recommendations: true,
        date_range,
    })
}

fn handle_export(
    format: Option<String>,
    from: Option<String>,
    to: Option<String>,
    output: Option<PathBuf>,
    config: &RiskwiseConfig,
    workspace: &Path,
) -> anyhow::Result<()> {
    let options = export_options(format.as_deref(), from.as_deref(), to.as_deref(), config)?;
    let register = open_register(config, workspace)?;
    let entries = register
        .all()
        .map_err(|e| anyhow::anyhow!(e.client_message()))?;
    let doc = export(entries, &options, Utc::now())?;

    match output {
        Some(path) => {
            std::fs::write(&path, &doc.content)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            info!(path = %path.display(), suggested = %doc.filename, "Export written");
        }
        None => println!("{}", doc.content),
    }
    Ok(())
}

async fn handle_serve(
    host: Option<String>,
    port: Option<u16>,
    mut config: RiskwiseConfig,
    workspace: &Path,
) -> anyhow::Result<()> {
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }
    let register = open_register(&config, workspace)?;
    let state = AppState::new(config, register);
    riskwise_core::gateway::run(state).await?;
    Ok(())
}

fn handle_config(
    action: ConfigAction,
    config: &RiskwiseConfig,
    workspace: &Path,
) -> anyhow::Result<()> {
    match action {
        ConfigAction::Init => {
            let config_dir = workspace.join(WORKSPACE_DIR);
            std::fs::create_dir_all(&config_dir)?;

            let config_path = config_dir.join("config.toml");
            if config_path.exists() {
                println!(
                    "Configuration file already exists at: {}",
                    config_path.display()
                );
                return Ok(());
            }

            let toml_str = toml::to_string_pretty(&RiskwiseConfig::default())?;
            std::fs::write(&config_path, &toml_str)?;
            println!(
                "Created default configuration at: {}",
                config_path.display()
            );
            Ok(())
        }
        ConfigAction::Show => {
            let toml_str = toml::to_string_pretty(config)?;
            println!("{}", toml_str);
            Ok(())
        }
    }
}
