//! Entry-point logic for `release-probe`.
//!
//! # Overview
//! Reads `server.domain` / `server.port` from a properties file, builds an
//! `HttpClient`, probes the server and posts a new-versions query. Startup
//! failures are returned as `StartupError` so `main` owns the exit code;
//! probe and POST failures are logged and reported in the `Outcome`.

use std::path::PathBuf;

use clap::Parser;
use release_core::{
    ClientError, ConfigError, HttpClient, JsonPayload, Properties, RelativeTarget, ServerSettings,
};
use serde::Serialize;
use tracing::{error, info, warn};

pub const DEFAULT_CONFIG: &str = "config.properties";
pub const DEFAULT_TARGET: &str = "/release/newVersions";

/// Command-line arguments.
#[derive(Debug, Clone, Parser)]
#[command(name = "release-probe", version, about = "Probe the release service and ask for newer versions")]
pub struct Args {
    /// Properties file holding `server.domain` and `server.port`.
    #[arg(long, default_value = DEFAULT_CONFIG)]
    pub config: PathBuf,

    /// Use https regardless of `server.https`.
    #[arg(long)]
    pub https: bool,

    /// Path the query is posted to, relative to the server root.
    #[arg(long, default_value = DEFAULT_TARGET)]
    pub target: String,

    /// Only probe; do not post the query.
    #[arg(long)]
    pub skip_post: bool,

    /// Log filter used when `RUST_LOG` is unset.
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

impl Args {
    pub fn for_config(config: impl Into<PathBuf>) -> Self {
        Self {
            config: config.into(),
            https: false,
            target: DEFAULT_TARGET.to_string(),
            skip_post: false,
            log_level: "info".to_string(),
        }
    }
}

/// Failures that stop the program before any request is sent: unreadable or
/// incomplete configuration, an invalid endpoint, or an invalid `--target`.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Client(#[from] ClientError),
}

/// What happened to the POST.
#[derive(Debug, Clone, PartialEq)]
pub enum PostOutcome {
    Skipped,
    /// Non-200 status or network failure.
    Absent,
    Received(JsonPayload),
    /// The server answered 200 with something that is not a JSON object.
    Malformed(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Outcome {
    pub connected: bool,
    pub post: PostOutcome,
}

/// Query asking which releases of an artifact are newer than `version`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewVersionsQuery {
    pub group_id: String,
    pub artifact_id: String,
    pub version: String,
    pub added_values: Vec<String>,
}

impl Default for NewVersionsQuery {
    fn default() -> Self {
        Self {
            group_id: "org.jgrapht".to_string(),
            artifact_id: "jgrapht-core".to_string(),
            version: "1.5.0".to_string(),
            added_values: ["CVE", "FRESHNESS", "POPULARITY_1_YEAR"]
                .map(String::from)
                .to_vec(),
        }
    }
}

impl NewVersionsQuery {
    pub fn to_payload(&self) -> Result<JsonPayload, ClientError> {
        match serde_json::to_value(self) {
            Ok(serde_json::Value::Object(map)) => Ok(map),
            Ok(_) => Err(ClientError::Serialization(
                "query did not serialize to an object".to_string(),
            )),
            Err(e) => Err(ClientError::Serialization(e.to_string())),
        }
    }
}

pub fn run(args: &Args) -> Result<Outcome, StartupError> {
    let properties = Properties::load(&args.config)?;
    let mut settings = ServerSettings::from_source(&properties)?;
    settings.use_https |= args.https;
    let target = RelativeTarget::parse(&args.target)?;

    let client = HttpClient::new(settings.endpoint()?);
    let server = format!("{}:{}", settings.domain, settings.port);

    let connected = client.is_connected();
    if connected {
        info!("Connected to {server}");
    } else {
        error!("Failed to connect to {server}");
    }

    if args.skip_post {
        return Ok(Outcome {
            connected,
            post: PostOutcome::Skipped,
        });
    }

    let query = NewVersionsQuery::default().to_payload()?;
    let post = match client.post_target(&target, &query) {
        Ok(Some(reply)) => {
            info!(response = %serde_json::Value::Object(reply.clone()), "received new versions");
            PostOutcome::Received(reply)
        }
        Ok(None) => {
            warn!(path = %target, "no response to new-versions query");
            PostOutcome::Absent
        }
        Err(err) => {
            warn!(path = %target, error = %err, "unusable response to new-versions query");
            PostOutcome::Malformed(err.to_string())
        }
    };
    Ok(Outcome { connected, post })
}
