//! CLI command implementations
//!
//! `serve` opens the store once and hands it to the HTTP server.
//! `import` validates a whole file before writing anything.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::{json, Value};

use super::args::{Cli, Command, Overrides};
use super::config::Config;
use super::errors::{CliError, CliResult};
use crate::http_server::HttpServer;
use crate::observability::init_tracing;
use crate::store::{BaladeStore, DocumentStore, NewBalade};

/// Parse arguments and run the selected command
pub fn run() -> CliResult<()> {
    let cli = Cli::parse_args();
    run_command(cli.command)
}

/// Run the appropriate command based on CLI args
pub fn run_command(cmd: Command) -> CliResult<()> {
    match cmd {
        Command::Serve { config, overrides } => serve(config.as_deref(), overrides),
        Command::Import {
            file,
            config,
            data_dir,
        } => import(&file, config.as_deref(), data_dir),
    }
}

/// Open the store and serve the HTTP API until Ctrl-C
pub fn serve(config_path: Option<&Path>, overrides: Overrides) -> CliResult<()> {
    let config = Config::load(config_path)?.with_overrides(overrides)?;
    init_tracing(&config.log_filter);

    let store: Arc<dyn BaladeStore> = Arc::new(DocumentStore::open(&config.store)?);
    let server = HttpServer::new(config.server, store);

    let rt = tokio::runtime::Runtime::new()
        .map_err(|e| CliError::server_failed(format!("Failed to create tokio runtime: {}", e)))?;

    rt.block_on(async {
        server
            .start()
            .await
            .map_err(|e| CliError::server_failed(format!("HTTP server failed: {}", e)))
    })
}

/// Bulk-load a JSON array of balades into the persistent store
pub fn import(file: &Path, config_path: Option<&Path>, data_dir: Option<PathBuf>) -> CliResult<()> {
    let overrides = Overrides {
        data_dir,
        ..Default::default()
    };
    let config = Config::load(config_path)?.with_overrides(overrides)?;
    init_tracing(&config.log_filter);

    let store = DocumentStore::open(&config.store)?;
    if !store.is_persistent() {
        return Err(CliError::config_error(
            "import needs a data directory (--data-dir or store.data_dir)",
        ));
    }

    let imported = import_file(&store, file)?;
    tracing::info!(count = imported, file = %file.display(), "import finished");

    println!("{}", json!({ "imported": imported }));
    Ok(())
}

/// Validate every entry of `file`, then insert them in one write.
///
/// Nothing is inserted if any entry fails validation.
pub fn import_file(store: &dyn BaladeStore, file: &Path) -> CliResult<usize> {
    let content = fs::read_to_string(file)
        .map_err(|e| CliError::io_error(format!("Failed to read {}: {}", file.display(), e)))?;

    let entries = match serde_json::from_str::<Value>(&content)? {
        Value::Array(entries) => entries,
        _ => {
            return Err(CliError::invalid_input(
                "import file must hold a JSON array of balades",
            ))
        }
    };

    let balades = entries
        .into_iter()
        .enumerate()
        .map(|(idx, entry)| {
            NewBalade::from_document(entry)
                .map_err(|e| CliError::invalid_input(format!("entry {}: {}", idx, e)))
        })
        .collect::<CliResult<Vec<_>>>()?;

    Ok(store.insert_many(balades)?.len())
}
