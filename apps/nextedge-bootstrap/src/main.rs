//! nextedge bootstrap - Lambda custom runtime for the edge handlers.
//!
//! Polls the Lambda runtime API for events and runs them through the handler
//! selected by `NEXTEDGE_HANDLER`, one invocation at a time.
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `AWS_LAMBDA_RUNTIME_API` | *(required)* | Runtime API `host:port`, set by Lambda |
//! | `NEXTEDGE_HANDLER` | `origin-auth` | `origin-auth` or `cache-key` |
//! | `NEXTEDGE_SIGNING_SERVICE` | `lambda` | SigV4 service name |
//! | `NEXTEDGE_APPLY_CHECKSUM` | `true` | Add `x-amz-content-sha256` to signed requests |
//! | `AWS_ACCESS_KEY_ID` | *(set by Lambda)* | Function role access key |
//! | `AWS_SECRET_ACCESS_KEY` | *(set by Lambda)* | Function role secret key |
//! | `AWS_SESSION_TOKEN` | *(set by Lambda)* | Function role session token |
//! | `LOG_LEVEL` | `info` | Log level filter |
//! | `LOG_FORMAT` | `text` | `text` or `json` |
//! | `RUST_LOG` | *(unset)* | Fine-grained tracing filter (overrides `LOG_LEVEL`) |

mod runtime;

use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Utc;
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

use nextedge_auth::EnvironmentCredentialProvider;
use nextedge_core::{LogFormat, NextEdgeConfig};
use nextedge_edge::{EdgeError, EdgeHandler};

use crate::runtime::{ErrorReport, Invocation, RuntimeClient};

const RUNTIME_API_VAR: &str = "AWS_LAMBDA_RUNTIME_API";

/// Initialize the tracing subscriber.
///
/// Uses `RUST_LOG` if set, otherwise falls back to the `LOG_LEVEL` config value.
fn init_tracing(config: &NextEdgeConfig) -> Result<()> {
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        EnvFilter::try_new(&config.log_level)
            .with_context(|| format!("invalid log level filter: {}", config.log_level))?
    };

    // Lambda stamps every log line itself.
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .without_time();

    match config.log_format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Text => builder.with_ansi(false).init(),
    }

    Ok(())
}

fn error_report(err: &EdgeError) -> ErrorReport {
    ErrorReport::new(err.error_type(), err.to_string())
}

fn process(
    client: &RuntimeClient,
    rt: &tokio::runtime::Runtime,
    handler: &EdgeHandler,
    invocation: &Invocation,
) -> Result<()> {
    let request_id = invocation.request_id.as_str();
    debug!(
        request_id,
        trace_id = invocation.trace_id.as_deref(),
        deadline_ms = invocation.deadline_ms,
        function_arn = invocation.function_arn.as_deref(),
        "Processing invocation"
    );

    match rt.block_on(handler.invoke(&invocation.payload, Utc::now())) {
        Ok(response) => client.send_response_or_error(request_id, &response),
        Err(err) => {
            error!(request_id, error_type = err.error_type(), error = %err, "Invocation failed");
            client.send_error(request_id, &error_report(&err))
        }
    }
}

fn main() -> Result<()> {
    let api = std::env::var(RUNTIME_API_VAR)
        .with_context(|| format!("{RUNTIME_API_VAR} is not set"))?;
    let client = RuntimeClient::new(&api);

    let config = match NextEdgeConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            client.send_init_error(&ErrorReport::new("InvalidConfiguration", err.to_string()))?;
            return Err(err).context("failed to load configuration");
        }
    };
    init_tracing(&config)?;

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .context("failed to build tokio runtime")?;

    let handler = EdgeHandler::from_config(Arc::new(EnvironmentCredentialProvider::new()), &config);

    info!(
        handler = %config.handler,
        signing_service = %config.signing_service,
        apply_checksum = config.apply_checksum,
        version = env!("CARGO_PKG_VERSION"),
        "nextedge bootstrap ready"
    );

    loop {
        let invocation = client.next_invocation()?;
        process(&client, &rt, &handler, &invocation)?;
    }
}
