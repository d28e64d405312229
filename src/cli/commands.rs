//! CLI command implementations

use std::fs;
use std::io::{self, Write};
use std::path::Path;

use axum::extract::Query;
use axum::http::Uri;

use crate::http_server::{build_registry, HttpServer, ServerConfig};
use crate::observability::{init_logging, log_event, log_event_with_fields, Event};
use crate::rest_api::{ParseMode, QuerySpec};

use super::args::Command;
use super::errors::{CliError, CliResult};

/// Dispatch a parsed command
pub fn run_command(command: Command) -> CliResult<()> {
    match command {
        Command::Init { config } => init(&config),
        Command::Serve { config, port } => serve(&config, port),
        Command::Translate { query, strict } => {
            let mode = if strict {
                ParseMode::Strict
            } else {
                ParseMode::Permissive
            };
            translate(&query, mode)
        }
    }
}

/// Write a default config file
pub fn init(config_path: &Path) -> CliResult<()> {
    if config_path.exists() {
        return Err(CliError::already_initialized(config_path));
    }

    let content = serde_json::to_string_pretty(&ServerConfig::default())?;
    fs::write(config_path, content + "\n")?;

    println!("Wrote {}", config_path.display());
    Ok(())
}

/// Load config, build the registry and serve until Ctrl-C
pub fn serve(config_path: &Path, port: Option<u16>) -> CliResult<()> {
    let mut config = ServerConfig::load(config_path)?;
    if let Some(port) = port {
        config.port = port;
        config.validate()?;
    }

    init_logging(&config.log.level, config.log.format);
    log_event(Event::BootStart);
    let path = config_path.display().to_string();
    log_event_with_fields(Event::ConfigLoaded, &[("path", path.as_str())]);

    let registry = build_registry(&config).map_err(|e| {
        let error = e.to_string();
        log_event_with_fields(Event::SeedFailed, &[("error", error.as_str())]);
        CliError::from(e)
    })?;
    let tables = registry.names().collect::<Vec<_>>().join(",");
    log_event_with_fields(Event::TablesRegistered, &[("tables", tables.as_str())]);

    let server = HttpServer::new(config, registry);
    let runtime = tokio::runtime::Runtime::new()?;
    runtime
        .block_on(server.start())
        .map_err(|e| CliError::serve_failed(e.to_string()))
}

/// Print the structured query for a query string
pub fn translate(query: &str, mode: ParseMode) -> CliResult<()> {
    let spec = translate_query(query, mode)?;

    let mut stdout = io::stdout();
    serde_json::to_writer_pretty(&mut stdout, &spec)?;
    writeln!(stdout)?;
    stdout.flush()?;
    Ok(())
}

/// Decode a raw query string the same way the HTTP layer does, then translate it
pub fn translate_query(query: &str, mode: ParseMode) -> CliResult<QuerySpec> {
    let query = query.trim().trim_start_matches('?');
    let uri: Uri = format!("/?{}", query)
        .parse()
        .map_err(|e| CliError::invalid_query(format!("{}", e)))?;

    let Query(params) = Query::<Vec<(String, String)>>::try_from_uri(&uri)
        .map_err(|e| CliError::invalid_query(e.to_string()))?;

    Ok(QuerySpec::parse_with_mode(params, mode)?)
}
