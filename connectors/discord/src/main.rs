//! FCP Discord Login - subprocess entrypoint
//!
//! Lets a host that is not written in Rust drive the login method over
//! line-delimited JSON on stdin/stdout.

#![forbid(unsafe_code)]

use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use fcp_discord_login::{
    DiscordLoginModule, ErrorBody, ExternalAccount, FixedCallbackUrl, LoginMethod, RedirectSource,
};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Discord login method host bridge.
#[derive(Parser)]
#[command(name = "fcp-discord-login")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Module directory containing module.json and config/config.json
    #[arg(long)]
    module_dir: PathBuf,

    /// Public base URL of the host; the callback becomes {base_url}/auth/r/{identifier}
    #[arg(long, conflicts_with = "callback_url")]
    base_url: Option<String>,

    /// Explicit OAuth2 callback URL
    #[arg(long)]
    callback_url: Option<String>,
}

fn main() -> Result<()> {
    // Logs go to stderr so stdout is clean for JSON responses.
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let redirect = match (cli.callback_url, cli.base_url) {
        (Some(url), _) => RedirectSource::Service(Arc::new(FixedCallbackUrl(url))),
        (None, Some(base)) => RedirectSource::BaseUrl(base),
        (None, None) => anyhow::bail!("one of --base-url or --callback-url is required"),
    };

    let module = DiscordLoginModule::from_dir(&cli.module_dir, &redirect)
        .with_context(|| format!("loading module from {}", cli.module_dir.display()))?;

    if !module.start_module() {
        tracing::warn!("Discord login module is disabled in its configuration");
    }
    module.initial();

    run_loop(&module)
}

/// Answer one JSON request per input line.
fn run_loop(module: &DiscordLoginModule) -> Result<()> {
    let stdin = std::io::stdin();
    let mut stdout = std::io::stdout();

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    for line in stdin.lock().lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        let response = runtime.block_on(handle_message(module, &line));

        writeln!(stdout, "{}", serde_json::to_string(&response)?)?;
        stdout.flush()?;
    }

    Ok(())
}

#[derive(Deserialize)]
struct StateParams {
    state: String,
}

#[derive(Deserialize)]
struct CodeParams {
    code: String,
}

#[derive(Deserialize)]
struct LangParams {
    lang: String,
}

fn params<T: for<'de> Deserialize<'de>>(value: Value) -> Result<T, ErrorBody> {
    serde_json::from_value(value)
        .map_err(|e| ErrorBody::new("invalid_request", format!("Invalid params: {e}")))
}

async fn handle_message(module: &DiscordLoginModule, message: &str) -> Value {
    let request: Value = match serde_json::from_str(message) {
        Ok(v) => v,
        Err(e) => {
            return json!({
                "error": ErrorBody::new("invalid_request", format!("Invalid JSON: {e}"))
            });
        }
    };

    let id = request.get("id").cloned();
    let method = request.get("method").and_then(Value::as_str).unwrap_or("");
    let params_value = request.get("params").cloned().unwrap_or_else(|| json!({}));

    let result = dispatch(module, method, params_value).await;

    let mut response = match result {
        Ok(value) => json!({ "result": value }),
        Err(error) => json!({ "error": error }),
    };
    if let Some(id) = id {
        response["id"] = id;
    }
    response
}

async fn dispatch(
    module: &DiscordLoginModule,
    method: &str,
    params_value: Value,
) -> Result<Value, ErrorBody> {
    match method {
        "info" => Ok(json!({
            "name": module.name(),
            "identifier": module.identifier(),
            "short_name": module.short_name(),
            "enabled": module.start_module(),
            "properties": module.properties(),
        })),
        "auth_url" => {
            let p: StateParams = params(params_value)?;
            Ok(json!({ "url": module.auth_url(&p.state) }))
        }
        "authorize" => {
            let p: CodeParams = params(params_value)?;
            let login = module.authorize(&p.code).await.map_err(|e| e.to_error_body())?;
            Ok(json!(login))
        }
        "connect" => {
            let account: ExternalAccount = params(params_value)?;
            Ok(json!(module.on_connect(&account).await))
        }
        "disconnect" => {
            let account: ExternalAccount = params(params_value)?;
            Ok(json!(module.on_disconnect(&account).await))
        }
        "messages" => {
            let p: LangParams = params(params_value)?;
            match module.messages(&p.lang).map_err(|e| e.to_error_body())? {
                Some(messages) => Ok(json!(messages)),
                None => Ok(Value::Bool(false)),
            }
        }
        _ => Err(ErrorBody::new(
            "invalid_request",
            format!("Unknown method: {method}"),
        )),
    }
}
