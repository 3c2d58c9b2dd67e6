//! Configuration types and constants for the webhook server.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::profile::{DEFAULT_PROFILE_API, DEFAULT_PROFILE_TIMEOUT};

pub(crate) const DEFAULT_PORT: u16 = 10000;
pub(crate) const DEFAULT_HOST: &str = "0.0.0.0";
pub(crate) const DEFAULT_STORE_PATH: &str = "messages.db";

/// Webhook receiver for messaging-platform message events.
///
/// Stores one record per message event, enriched with the sender's display
/// name and picture when an access token is configured.
///
/// Configuration can be set via CLI arguments or environment variables.
/// CLI arguments take precedence over environment variables.
#[derive(Parser, Debug, Default)]
#[command(name = "linehook", version, about)]
pub struct Cli {
    /// Port to listen on [env: PORT] [default: 10000]
    #[arg(long, short = 'p')]
    pub port: Option<u16>,

    /// Interface to bind [env: LINEHOOK_HOST] [default: 0.0.0.0]
    #[arg(long)]
    pub host: Option<String>,

    /// Document store database file [env: LINEHOOK_STORE] [default: messages.db]
    #[arg(long, short = 's')]
    pub store: Option<PathBuf>,

    /// Channel access token for profile lookups [env: LINE_CHANNEL_ACCESS_TOKEN]
    #[arg(long)]
    pub access_token: Option<String>,

    /// Base URL of the profile API [env: LINE_PROFILE_API]
    #[arg(long)]
    pub profile_api: Option<String>,

    /// Profile lookup timeout in seconds [env: LINEHOOK_PROFILE_TIMEOUT_SECS] [default: 5]
    #[arg(long)]
    pub profile_timeout: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub bind_addr: String,
    pub store_path: PathBuf,
    pub access_token: Option<String>,
    pub profile_api: String,
    pub profile_timeout: Duration,
}

impl Config {
    pub fn from_cli_and_env(cli: Cli) -> Self {
        Self::from_cli_and_lookup(cli, |key| std::env::var(key).ok())
    }

    /// Resolve each setting as CLI > `env(key)` > default.
    pub fn from_cli_and_lookup(cli: Cli, env: impl Fn(&str) -> Option<String>) -> Self {
        let port = cli
            .port
            .or_else(|| env("PORT").and_then(|p| p.trim().parse().ok()))
            .unwrap_or(DEFAULT_PORT);

        let host = cli
            .host
            .or_else(|| env("LINEHOOK_HOST"))
            .unwrap_or_else(|| DEFAULT_HOST.to_string());

        let store_path = cli
            .store
            .or_else(|| env("LINEHOOK_STORE").map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_STORE_PATH));

        let access_token = cli
            .access_token
            .or_else(|| env("LINE_CHANNEL_ACCESS_TOKEN"))
            .filter(|t| !t.trim().is_empty());

        let profile_api = cli
            .profile_api
            .or_else(|| env("LINE_PROFILE_API"))
            .unwrap_or_else(|| DEFAULT_PROFILE_API.to_string());

        let profile_timeout = cli
            .profile_timeout
            .or_else(|| env("LINEHOOK_PROFILE_TIMEOUT_SECS").and_then(|s| s.trim().parse().ok()))
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_PROFILE_TIMEOUT);

        Self {
            bind_addr: format!("{host}:{port}"),
            store_path,
            access_token,
            profile_api,
            profile_timeout,
        }
    }
}
