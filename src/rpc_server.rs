//! Smartmark RPC Server: JSON-RPC over stdin/stdout for a front-end shell.
//!
//! Protocol: one JSON object per line (newline-delimited JSON).
//! Request:  {"id":1, "method":"bookmark.add", "params":{"title":"...","url":"..."}}
//! Response: {"id":1, "result":{...}} or {"id":1, "error":"..."}
//!
//! Logs go to stderr so they never interleave with responses.

use std::env;
use std::process::ExitCode;

use serde_json::{json, Value};
use tokio::io::{self, AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use smartmark::app::App;
use smartmark::backend;
use smartmark::rpc_handler::handle_method;
use smartmark::services::settings_engine::{SettingsEngine, SettingsEngineTrait};

/// Overrides the configured `log_filter`.
const ENV_LOG: &str = "SMARTMARK_LOG";
/// Overrides the settings file location.
const ENV_CONFIG: &str = "SMARTMARK_CONFIG";

fn init_tracing(default_filter: &str) {
    let filter = EnvFilter::try_from_env(ENV_LOG)
        .or_else(|_| EnvFilter::try_new(default_filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn write_line(stdout: &mut io::Stdout, value: &Value) -> std::io::Result<()> {
    stdout.write_all(format!("{}\n", value).as_bytes()).await?;
    stdout.flush().await
}

async fn serve(app: &App) -> std::io::Result<()> {
    let mut stdout = io::stdout();
    write_line(
        &mut stdout,
        &json!({"event": "ready", "version": env!("CARGO_PKG_VERSION")}),
    )
    .await?;

    let mut lines = BufReader::new(io::stdin()).lines();

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }

        let req: Value = match serde_json::from_str(&line) {
            Ok(v) => v,
            Err(e) => {
                warn!(error = %e, "unparseable request");
                write_line(&mut stdout, &json!({"id": null, "error": format!("parse error: {}", e)}))
                    .await?;
                continue;
            }
        };

        let id = req.get("id").cloned().unwrap_or(Value::Null);

        let method = req.get("method").and_then(|v| v.as_str()).unwrap_or("");
        let params = req.get("params").cloned().unwrap_or(json!({}));

        let response = match handle_method(app, method, &params).await {
            Ok(val) => json!({"id": id, "result": val}),
            Err(err) => json!({"id": id, "error": err}),
        };
        write_line(&mut stdout, &response).await?;
    }

    info!("stdin closed, shutting down");
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let mut engine = SettingsEngine::new(env::var(ENV_CONFIG).ok());
    let load_result = engine.load();
    let settings = engine.apply_env_overrides().clone();

    init_tracing(&settings.log_filter);
    if let Err(e) = load_result {
        warn!(error = %e, path = engine.get_config_path(), "settings unreadable, using defaults");
    }

    let backend = match backend::from_settings(&settings.backend) {
        Ok(backend) => backend,
        Err(e) => {
            error!(error = %e, "failed to initialize backend");
            return ExitCode::FAILURE;
        }
    };

    let app = App::new(backend, settings);
    // A failed lookup is reported as a notice; the server keeps running signed out.
    if let Err(e) = app.startup().await {
        warn!(error = %e, "startup session lookup failed");
    }

    match serve(&app).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "stdio failure");
            ExitCode::FAILURE
        }
    }
}
