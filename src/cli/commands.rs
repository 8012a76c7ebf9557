//! CLI command implementations

use std::fs;
use std::io::{self, Write};
use std::net::SocketAddr;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::dataset::{is_valid_dataset_id, DatasetStore};
use crate::observability::Logger;
use crate::query::QueryEngine;
use crate::rest_api::ApiServer;
use crate::schema::RecordKind;

use super::args::{Cli, Command};
use super::errors::{CliError, CliResult};

/// Configuration file structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Bind host (default 127.0.0.1)
    #[serde(default = "default_host")]
    pub host: String,

    /// Bind port (default 4321)
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}
fn default_port() -> u16 {
    4321
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Config {
    /// Load configuration from file.
    ///
    /// A missing file yields the defaults; an unreadable or invalid file
    /// is an error.
    pub fn load(path: &Path) -> CliResult<Self> {
        if !path.exists() {
            return Ok(Config::default());
        }

        let content = fs::read_to_string(path)
            .map_err(|e| CliError::config_error(format!("failed to read config: {}", e)))?;

        let config: Config = serde_json::from_str(&content)
            .map_err(|e| CliError::config_error(format!("invalid config JSON: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    fn validate(&self) -> CliResult<()> {
        if self.host.trim().is_empty() {
            return Err(CliError::config_error("host must not be empty"));
        }
        if self.port == 0 {
            return Err(CliError::config_error("port must be non-zero"));
        }
        Ok(())
    }

    /// Socket address to bind
    pub fn addr(&self) -> CliResult<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| CliError::config_error(format!("invalid bind address: {}", e)))
    }
}

/// Parse arguments and dispatch to the selected command
pub fn run() -> CliResult<()> {
    match Cli::parse_args().command {
        Command::Start { config } => start(&config),
        Command::Query {
            records,
            kind,
            id,
            query,
        } => query_once(&records, &kind, &id, &query),
    }
}

/// Boot the REST server and serve until the process exits
fn start(config_path: &Path) -> CliResult<()> {
    let config = Config::load(config_path)?;
    let addr = config.addr()?;

    let runtime = tokio::runtime::Runtime::new()
        .map_err(|e| CliError::io_error(format!("failed to start runtime: {}", e)))?;

    Logger::info(
        "SERVER_STARTING",
        &[("host", &config.host), ("port", &config.port.to_string())],
    );
    runtime
        .block_on(ApiServer::new().serve(addr))
        .map_err(|e| CliError::io_error(format!("server failed: {}", e)))
}

/// Evaluate one query against a record file and print the rows
fn query_once(records: &Path, kind: &str, id: &str, query: &Path) -> CliResult<()> {
    let kind = RecordKind::parse(kind)
        .ok_or_else(|| CliError::invalid_arguments(format!("unknown record kind '{}'", kind)))?;
    if !is_valid_dataset_id(id) {
        return Err(CliError::invalid_arguments(format!(
            "invalid dataset id '{}'",
            id
        )));
    }

    let payload: Value = serde_json::from_str(&fs::read_to_string(records)?)?;
    let query: Value = serde_json::from_str(&fs::read_to_string(query)?)?;

    let mut store = DatasetStore::new();
    store
        .add(id, kind, &payload)
        .map_err(|e| CliError::invalid_arguments(e.to_string()))?;
    let dataset = store
        .get(id)
        .map_err(|e| CliError::query_failed(e.to_string()))?;

    let rows = QueryEngine::evaluate(&query, id, dataset.kind, &dataset.records)
        .map_err(|e| CliError::query_failed(e.to_string()))?;

    let mut stdout = io::stdout();
    serde_json::to_writer_pretty(&mut stdout, &serde_json::json!({ "result": rows }))?;
    writeln!(stdout)?;
    Ok(())
}
