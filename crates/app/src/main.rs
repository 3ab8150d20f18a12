//! erpsync - ERP customer synchronization CLI
//!
//! Thin entry point over `erpsync-infra`: loads `.env` and configuration,
//! opens the registration database, and runs one task.

#![allow(clippy::print_stdout, clippy::print_stderr)]

use std::env;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{bail, Context};
use erpsync_core::MunicipalityTable;
use erpsync_domain::{Config, ConsolidatedBusinessEntity};
use erpsync_infra::{CustomerSyncService, DbManager, LocatorResult, SqliteRegistrationRepository};
use serde::Deserialize;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();

    match dotenvy::dotenv() {
        Ok(path) => tracing::debug!(path = %path.display(), "loaded .env"),
        Err(e) => tracing::debug!(error = %e, "no .env file loaded"),
    }

    let args: Vec<String> = env::args().skip(1).collect();
    let task = args.first().map(String::as_str);

    let result = match task {
        Some("sync") => run_sync(&args[1..]).await,
        Some("lookup") => run_lookup(&args[1..]).await,
        Some("check") => run_check(),
        Some("help") | None => {
            print_help();
            Ok(())
        }
        Some(unknown) => {
            eprintln!("Unknown task: {unknown}");
            eprintln!();
            print_help();
            Err(anyhow::anyhow!("Unknown task"))
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Task failed: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = env::var("ERPSYNC_LOG_JSON")
        .map(|v| matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr)).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr)).init();
    }
}

fn print_help() {
    println!("erpsync - ERP customer synchronization");
    println!();
    println!("USAGE:");
    println!("    erpsync <TASK> [ARGS]");
    println!();
    println!("TASKS:");
    println!("    sync <entity.json> [--local-id <ID>]  Sync one customer and print the report");
    println!("    lookup <tax-id> [--all]              Probe the ERP for a customer");
    println!("    check                                Validate configuration and database");
    println!("    help                                 Show this help message");
    println!();
    println!("ENVIRONMENT:");
    println!("    ERP_BASE_URL, ERP_USERNAME, ERP_PASSWORD   ERP connection (or erpsync.toml)");
    println!("    ERPSYNC_MUNICIPALITIES                     JSON file of municipality codes");
    println!("    ERPSYNC_LOG_JSON                           Emit JSON logs");
    println!("    RUST_LOG                                   Log filter (default: info)");
}

async fn run_sync(args: &[String]) -> anyhow::Result<()> {
    let Some(entity_path) = args.first() else {
        bail!("usage: erpsync sync <entity.json> [--local-id <ID>]");
    };
    let local_id = flag_value(args, "--local-id")
        .map(|raw| raw.parse::<i64>().with_context(|| format!("invalid --local-id '{raw}'")))
        .transpose()?;

    let entity = read_entity(Path::new(entity_path))?;
    let (config, service) = build_service()?;
    tracing::info!(db = %config.database.path, "syncing customer");

    let report = service.sync(&entity, local_id).await?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

async fn run_lookup(args: &[String]) -> anyhow::Result<()> {
    let Some(tax_id) = args.first() else {
        bail!("usage: erpsync lookup <tax-id> [--all]");
    };
    let (_, service) = build_service()?;

    if args.iter().any(|a| a == "--all") {
        let matches = service.locator().search_all(tax_id).await?;
        if matches.is_empty() {
            println!("not found");
        }
        for (code, record) in matches {
            println!("{} ({}): {} {}", code.code, code.label, record.external_id, record.legal_name);
        }
        return Ok(());
    }

    match service.locator().search(tax_id).await? {
        LocatorResult::Found { record, code, probes } => {
            println!("found after {probes} probe(s) as {} ({})", code.code, code.label);
            println!("{}", serde_json::to_string_pretty(&record)?);
        }
        LocatorResult::NotFound { probes } => println!("not found after {probes} probe(s)"),
    }
    Ok(())
}

fn run_check() -> anyhow::Result<()> {
    let config = erpsync_infra::config::load()?;
    let credentials = config.erp.credentials()?;
    println!("ERP: {} as {}", credentials.base_url, credentials.username);

    let db = open_database(&config)?;
    db.health_check()?;
    println!("Database: {} ok", db.path().display());
    Ok(())
}

fn build_service() -> anyhow::Result<(Config, CustomerSyncService)> {
    let config = erpsync_infra::config::load().context("failed to load configuration")?;
    let db = Arc::new(open_database(&config)?);
    let store = Arc::new(SqliteRegistrationRepository::new(db));
    let municipalities = Arc::new(load_municipalities()?);

    let service = CustomerSyncService::from_config(&config, store, municipalities)?;
    Ok((config, service))
}

fn open_database(config: &Config) -> anyhow::Result<DbManager> {
    let db = DbManager::new(&config.database.path, config.database.pool_size)
        .with_context(|| format!("failed to open database {}", config.database.path))?;
    db.run_migrations().context("failed to apply schema")?;
    Ok(db)
}

fn read_entity(path: &Path) -> anyhow::Result<ConsolidatedBusinessEntity> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&contents).with_context(|| format!("invalid entity JSON in {}", path.display()))
}

#[derive(Debug, Deserialize)]
struct MunicipalityEntry {
    city: String,
    state: String,
    code: String,
}

fn load_municipalities() -> anyhow::Result<MunicipalityTable> {
    let Some(path) = env::var_os("ERPSYNC_MUNICIPALITIES").map(PathBuf::from) else {
        return Ok(MunicipalityTable::new());
    };
    parse_municipalities(&path)
}

fn parse_municipalities(path: &Path) -> anyhow::Result<MunicipalityTable> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let entries: Vec<MunicipalityEntry> = serde_json::from_str(&contents)
        .with_context(|| format!("invalid municipality list in {}", path.display()))?;

    tracing::info!(count = entries.len(), "municipality table loaded");
    Ok(entries.into_iter().map(|e| (e.city, e.state, e.code)).collect())
}

fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.iter().position(|a| a == flag).and_then(|i| args.get(i + 1)).map(String::as_str)
}
