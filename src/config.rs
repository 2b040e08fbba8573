use anyhow::{Context, Result, bail};
use clap::Parser;
use std::env;

/// Centralized application configuration.
/// Combines environment variables and CLI arguments.
#[derive(Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub influx_url: String,
    pub influx_token: String,
    pub username_template: Option<String>,
}

/// Command-line + environment configuration.
#[derive(Parser, Debug)]
#[command(author, version, about = "Dynamic credential provisioning API for InfluxDB v2")]
pub struct Args {
    /// Host to bind to (overrides INFLUX_CRED_HOST)
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind to (overrides INFLUX_CRED_PORT)
    #[arg(long)]
    pub port: Option<u16>,

    /// Base URL of the InfluxDB v2 instance (overrides INFLUX_CRED_INFLUX_URL)
    #[arg(long)]
    pub influx_url: Option<String>,

    /// Admin token for the InfluxDB v2 instance (overrides INFLUX_CRED_INFLUX_TOKEN)
    #[arg(long)]
    pub influx_token: Option<String>,

    /// Username template for provisioned users (overrides INFLUX_CRED_USERNAME_TEMPLATE)
    #[arg(long)]
    pub username_template: Option<String>,
}

impl AppConfig {
    /// Parse environment variables + CLI args into AppConfig.
    pub fn from_env_and_args() -> Result<Self> {
        // Parse CLI once
        let args = Args::parse();

        // --- Environment fallback ---
        let env_host = env::var("INFLUX_CRED_HOST").unwrap_or_else(|_| "0.0.0.0".into());
        let env_port = match env::var("INFLUX_CRED_PORT") {
            Ok(value) => value
                .parse::<u16>()
                .with_context(|| format!("parsing INFLUX_CRED_PORT value `{}`", value))?,
            Err(env::VarError::NotPresent) => 3000,
            Err(err) => return Err(err).context("reading INFLUX_CRED_PORT"),
        };
        let env_influx_url = env::var("INFLUX_CRED_INFLUX_URL").ok();
        let env_influx_token = env::var("INFLUX_CRED_INFLUX_TOKEN").ok();
        let env_template = env::var("INFLUX_CRED_USERNAME_TEMPLATE").ok();

        // --- Merge ---
        let Some(influx_url) = args.influx_url.or(env_influx_url) else {
            bail!("InfluxDB URL is required (--influx-url or INFLUX_CRED_INFLUX_URL)");
        };
        let Some(influx_token) = args.influx_token.or(env_influx_token) else {
            bail!("InfluxDB admin token is required (--influx-token or INFLUX_CRED_INFLUX_TOKEN)");
        };

        Ok(Self {
            host: args.host.unwrap_or(env_host),
            port: args.port.unwrap_or(env_port),
            influx_url,
            influx_token,
            username_template: args.username_template.or(env_template),
        })
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
