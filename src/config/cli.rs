use crate::config::toml_config::TomlConfig;
use crate::config::RenewalConfig;
use crate::domain::model::BundleLayout;
use crate::utils::error::Result;
use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(name = "ssl-renew")]
#[command(about = "Renew expiring Tencent Cloud SSL certificates and install them for nginx")]
pub struct CliConfig {
    #[arg(long, env = "TENCENT_SECRET_ID", hide_env_values = true, help = "set tencent secret-id")]
    pub secret_id: Option<String>,

    #[arg(long, env = "TENCENT_SECRET_KEY", hide_env_values = true, help = "set tencent secret-key")]
    pub secret_key: Option<String>,

    #[arg(long, help = "set region")]
    pub region: Option<String>,

    #[arg(long, help = "set certificates save path (default: OS temp dir)")]
    pub save_dir: Option<PathBuf>,

    #[arg(short, long, help = "TOML config file; flags override its values")]
    pub config: Option<PathBuf>,

    #[arg(long, value_enum, help = "How to unpack the bundle (default: full in temp dir, nginx elsewhere)")]
    pub layout: Option<BundleLayout>,

    #[arg(long)]
    pub renew_before_days: Option<i64>,

    #[arg(long)]
    pub poll_attempts: Option<u32>,

    #[arg(long)]
    pub poll_interval_secs: Option<u64>,

    #[arg(long, value_delimiter = ',', help = "Only renew these domains")]
    pub domains: Vec<String>,

    #[arg(long, help = "API endpoint, e.g. for a proxy")]
    pub endpoint: Option<String>,

    #[arg(long)]
    pub dv_auth_method: Option<String>,

    #[arg(long, help = "Restart command, split on whitespace")]
    pub restart_command: Option<String>,

    #[arg(long)]
    pub restart_timeout_secs: Option<u64>,

    #[arg(long, conflicts_with = "always_restart", help = "Never restart the web server")]
    pub no_restart: bool,

    #[arg(long, help = "Restart even when nothing was installed")]
    pub always_restart: bool,

    #[arg(long, help = "Only list certificates and show what would be renewed")]
    pub dry_run: bool,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Log as JSON lines")]
    pub log_json: bool,
}

impl CliConfig {
    /// Defaults, then the config file, then flags and environment.
    pub fn resolve(&self) -> Result<RenewalConfig> {
        let mut config = RenewalConfig::default();
        if let Some(path) = &self.config {
            tracing::info!("Loading configuration from: {}", path.display());
            config = config.merge_file(TomlConfig::from_file(path)?);
        }
        Ok(self.apply_overrides(config))
    }

    fn apply_overrides(&self, mut config: RenewalConfig) -> RenewalConfig {
        if self.secret_id.is_some() {
            config.secret_id = self.secret_id.clone();
        }
        if self.secret_key.is_some() {
            config.secret_key = self.secret_key.clone();
        }
        if let Some(region) = &self.region {
            config.region = region.clone();
        }
        if let Some(endpoint) = &self.endpoint {
            config.endpoint = endpoint.clone();
        }
        if let Some(method) = &self.dv_auth_method {
            config.dv_auth_method = method.clone();
        }
        if let Some(days) = self.renew_before_days {
            config.renew_before_days = days;
        }
        if let Some(attempts) = self.poll_attempts {
            config.poll_attempts = attempts;
        }
        if let Some(interval) = self.poll_interval_secs {
            config.poll_interval_secs = interval;
        }
        if !self.domains.is_empty() {
            config.domains = self.domains.clone();
        }
        if let Some(save_dir) = &self.save_dir {
            config.save_dir = save_dir.clone();
        }
        if self.layout.is_some() {
            config.layout = self.layout;
        }
        if let Some(command) = &self.restart_command {
            config.restart_command = command.split_whitespace().map(str::to_string).collect();
        }
        if let Some(timeout) = self.restart_timeout_secs {
            config.restart_timeout_secs = timeout;
        }
        if self.no_restart {
            config.restart_enabled = false;
        }
        if self.always_restart {
            config.always_restart = true;
        }
        config
    }
}
