//! specforge - Entry Point
//!
//! Validates OpenAPI documents, synthesizes mock services from them and
//! runs the deployment and health pipeline behind a JSON API.

use std::collections::HashMap;
use std::env;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use colored::Colorize;
use serde_json::Value;

use specforge::app::options::AppOptions;
use specforge::app::run::run;
use specforge::codegen::generate_server;
use specforge::config::{Settings, DEFAULT_SETTINGS_FILE};
use specforge::logs::{init_logging, LogOptions};
use specforge::spec::{validate_text, DocumentFormat};
use specforge::utils::version_info;

use platform_models::{NewServer, ServerRecord, ValidationResult};
use tracing::{error, info};

#[tokio::main]
async fn main() {
    // Parse command line arguments
    let args: Vec<String> = env::args().collect();
    let mut cli_args: HashMap<String, String> = HashMap::new();

    for arg in args.iter().skip(1) {
        if let Some((key, value)) = arg.split_once('=') {
            // Handle --key=value format
            let clean_key = key.trim_start_matches('-');
            cli_args.insert(clean_key.to_string(), value.to_string());
        } else if arg.starts_with("--") {
            // Handle standalone flags like --version
            let clean_key = arg.trim_start_matches('-');
            cli_args.insert(clean_key.to_string(), "true".to_string());
        }
    }

    // Print version and exit
    let version = version_info();
    if cli_args.contains_key("version") {
        match serde_json::to_string_pretty(&version) {
            Ok(text) => println!("{}", text),
            Err(_) => println!("{}", version.version),
        }
        return;
    }

    // Offline modes
    if let Some(path) = cli_args.get("validate") {
        exit_on_error(validate_file(Path::new(path)).await);
        return;
    }
    if let Some(path) = cli_args.get("generate") {
        exit_on_error(generate_file(Path::new(path), &cli_args).await);
        return;
    }

    // Run the service starting here

    // Retrieve the settings file
    let settings_file = cli_args
        .get("settings")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_SETTINGS_FILE));
    let settings = match Settings::load(&settings_file).await {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Unable to read settings file: {}", e);
            std::process::exit(1);
        }
    };

    // Initialize logging
    let log_options = LogOptions {
        log_level: settings.log_level.clone(),
        log_dir: settings.log_dir.clone(),
        json_format: settings.log_json,
        ..Default::default()
    };
    let _log_guard = match init_logging(log_options) {
        Ok(guard) => guard,
        Err(e) => {
            println!("Failed to initialize logging: {e}");
            None
        }
    };

    // Run the server
    let options = AppOptions::from_settings(&settings);
    info!("Running specforge with options: {:?}", options);
    let result = run(version.version, options, await_shutdown_signal()).await;
    if let Err(e) = result {
        error!("Failed to run specforge: {e}");
        std::process::exit(1);
    }
}

fn exit_on_error(result: anyhow::Result<()>) {
    if let Err(e) = result {
        eprintln!("{} {:#}", "error:".red().bold(), e);
        std::process::exit(1);
    }
}

async fn read_document(path: &Path) -> anyhow::Result<(ValidationResult, Option<Value>)> {
    let format = DocumentFormat::from_path(path)?;
    let text = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("unable to read {}", path.display()))?;
    Ok(validate_text(&text, format))
}

fn print_validation(result: &ValidationResult) {
    if result.is_valid {
        println!("{}", "Specification is valid".green().bold());
        println!("  endpoints:      {}", result.endpoint_count);
        println!("  resource types: {}", result.resource_types.join(", "));
        println!("  authentication: {}", result.has_authentication);
    } else {
        println!("{}", "Specification is invalid".red().bold());
    }
    for err in &result.errors {
        println!("  {} {}", "✗".red(), err);
    }
    for warning in &result.warnings {
        println!("  {} {}", "!".yellow(), warning);
    }
}

async fn validate_file(path: &Path) -> anyhow::Result<()> {
    let (result, _) = read_document(path).await?;
    print_validation(&result);
    if !result.is_valid {
        bail!("{} failed validation", path.display());
    }
    Ok(())
}

async fn generate_file(path: &Path, cli_args: &HashMap<String, String>) -> anyhow::Result<()> {
    let (result, doc) = read_document(path).await?;
    let doc = match doc {
        Some(doc) if result.is_valid => doc,
        _ => {
            print_validation(&result);
            bail!("{} failed validation", path.display());
        }
    };

    let name = cli_args
        .get("name")
        .cloned()
        .or_else(|| doc["info"]["title"].as_str().map(str::to_string))
        .unwrap_or_else(|| "server".to_string());
    let mut config = NewServer::new(name, doc);
    if let Some(env) = cli_args.get("env") {
        config.environment = serde_json::from_value(Value::String(env.clone()))
            .with_context(|| format!("unknown environment '{}'", env))?;
    }
    if let Some(auth) = cli_args.get("auth") {
        config.authentication = serde_json::from_value(Value::String(auth.clone()))
            .with_context(|| format!("unknown authentication scheme '{}'", auth))?;
    }
    if let Some(limit) = cli_args.get("rate-limit") {
        config.rate_limit = limit
            .parse()
            .with_context(|| format!("invalid rate limit '{}'", limit))?;
        if config.rate_limit < 1 {
            bail!("rate limit must be at least 1");
        }
    }

    let record = ServerRecord::from_new(config, chrono::Utc::now());
    let generation = generate_server(&record);
    let (Some(code), Some(endpoint)) = (generation.code, generation.endpoint) else {
        bail!(
            "code generation failed: {}",
            generation.error.unwrap_or_default()
        );
    };

    match cli_args.get("out") {
        Some(out) => {
            tokio::fs::write(out, &code)
                .await
                .with_context(|| format!("unable to write {}", out))?;
            println!("{} {}", "Wrote".green().bold(), out);
        }
        None => print!("{}", code),
    }
    eprintln!("{} {}", "Endpoint:".cyan(), endpoint);
    Ok(())
}

async fn await_shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut sigterm = signal(SignalKind::terminate()).expect("Failed to listen for SIGTERM");
        let mut sigint = signal(SignalKind::interrupt()).expect("Failed to listen for SIGINT");

        tokio::select! {
            _ = sigterm.recv() => {
                info!("SIGTERM received, shutting down...");
            }
            _ = sigint.recv() => {
                info!("SIGINT received, shutting down...");
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Ctrl+C received, shutting down...");
            }
        }
    }

    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await.expect("Failed to listen for Ctrl+C");
        info!("Ctrl+C received, shutting down...");
    }
}
