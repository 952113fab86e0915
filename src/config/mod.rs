#[cfg(feature = "cli")]
pub mod cli;
pub mod toml_config;

use crate::adapters::restart::{CommandRestarter, DEFAULT_RESTART_COMMAND};
use crate::adapters::tencent::{Credential, TencentSslClient, DEFAULT_ENDPOINT, DV_AUTH_METHOD};
use crate::core::bundle::default_layout;
use crate::core::planner::DEFAULT_RENEW_BEFORE_DAYS;
use crate::domain::model::BundleLayout;
use crate::domain::ports::ConfigProvider;
use crate::utils::error::{RenewError, Result};
use crate::utils::validation::{self, Validate};
use std::path::{Path, PathBuf};
use std::time::Duration;
use toml_config::{has_placeholder, TomlConfig};

const DV_AUTH_METHODS: [&str; 3] = ["DNS_AUTO", "DNS", "FILE"];

/// Fully resolved settings for one run.
#[derive(Clone)]
pub struct RenewalConfig {
    pub secret_id: Option<String>,
    pub secret_key: Option<String>,
    pub region: String,
    pub endpoint: String,
    pub request_timeout_secs: u64,
    pub dv_auth_method: String,
    pub renew_before_days: i64,
    pub poll_attempts: u32,
    pub poll_interval_secs: u64,
    pub domains: Vec<String>,
    pub save_dir: PathBuf,
    pub layout: Option<BundleLayout>,
    pub restart_enabled: bool,
    pub always_restart: bool,
    pub restart_command: Vec<String>,
    pub restart_timeout_secs: u64,
}

impl Default for RenewalConfig {
    fn default() -> Self {
        Self {
            secret_id: None,
            secret_key: None,
            region: String::new(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            request_timeout_secs: 30,
            dv_auth_method: DV_AUTH_METHOD.to_string(),
            renew_before_days: DEFAULT_RENEW_BEFORE_DAYS,
            poll_attempts: 10,
            poll_interval_secs: 1,
            domains: Vec::new(),
            save_dir: std::env::temp_dir(),
            layout: None,
            restart_enabled: true,
            always_restart: false,
            restart_command: DEFAULT_RESTART_COMMAND.iter().map(|s| s.to_string()).collect(),
            restart_timeout_secs: 30,
        }
    }
}

impl std::fmt::Debug for RenewalConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenewalConfig")
            .field("secret_id", &self.secret_id)
            .field("secret_key", &self.secret_key.as_ref().map(|_| "***"))
            .field("region", &self.region)
            .field("endpoint", &self.endpoint)
            .field("dv_auth_method", &self.dv_auth_method)
            .field("renew_before_days", &self.renew_before_days)
            .field("poll_attempts", &self.poll_attempts)
            .field("poll_interval_secs", &self.poll_interval_secs)
            .field("domains", &self.domains)
            .field("save_dir", &self.save_dir)
            .field("layout", &self.layout)
            .field("restart_enabled", &self.restart_enabled)
            .field("always_restart", &self.always_restart)
            .field("restart_command", &self.restart_command)
            .field("restart_timeout_secs", &self.restart_timeout_secs)
            .finish()
    }
}

impl RenewalConfig {
    /// Overlays the values present in a config file onto `self`.
    pub fn merge_file(mut self, file: TomlConfig) -> Self {
        let TomlConfig {
            tencent,
            renewal,
            install,
            restart,
        } = file;

        if tencent.secret_id.is_some() {
            self.secret_id = tencent.secret_id;
        }
        if tencent.secret_key.is_some() {
            self.secret_key = tencent.secret_key;
        }
        if let Some(region) = tencent.region {
            self.region = region;
        }
        if let Some(endpoint) = tencent.endpoint {
            self.endpoint = endpoint;
        }
        if let Some(timeout) = tencent.request_timeout_secs {
            self.request_timeout_secs = timeout;
        }

        if let Some(days) = renewal.renew_before_days {
            self.renew_before_days = days;
        }
        if let Some(method) = renewal.dv_auth_method {
            self.dv_auth_method = method;
        }
        if let Some(attempts) = renewal.poll_attempts {
            self.poll_attempts = attempts;
        }
        if let Some(interval) = renewal.poll_interval_secs {
            self.poll_interval_secs = interval;
        }
        if let Some(domains) = renewal.domains {
            self.domains = domains;
        }

        if let Some(save_dir) = install.save_dir {
            self.save_dir = save_dir;
        }
        if install.layout.is_some() {
            self.layout = install.layout;
        }

        if let Some(enabled) = restart.enabled {
            self.restart_enabled = enabled;
        }
        if let Some(always) = restart.always {
            self.always_restart = always;
        }
        if let Some(command) = restart.command {
            self.restart_command = command;
        }
        if let Some(timeout) = restart.timeout_secs {
            self.restart_timeout_secs = timeout;
        }

        self
    }

    pub fn credential(&self) -> Result<Credential> {
        let secret_id = validation::validate_required_field("secret_id", &self.secret_id)?;
        let secret_key = validation::validate_required_field("secret_key", &self.secret_key)?;

        for (field, value) in [("secret_id", secret_id), ("secret_key", secret_key)] {
            if has_placeholder(value) {
                return Err(RenewError::MissingConfigError {
                    field: format!("{} (unresolved placeholder {})", field, value),
                });
            }
        }

        Ok(Credential {
            secret_id: secret_id.to_string(),
            secret_key: secret_key.to_string(),
        })
    }

    pub fn build_client(&self) -> Result<TencentSslClient> {
        Ok(TencentSslClient::with_endpoint(
            self.credential()?,
            self.region.clone(),
            &self.endpoint,
            Duration::from_secs(self.request_timeout_secs),
        )?
        .with_dv_auth_method(self.dv_auth_method.clone()))
    }

    /// `None` when restarts are disabled; the command is not checked then.
    pub fn build_restarter(&self) -> Result<Option<CommandRestarter>> {
        if !self.restart_enabled {
            return Ok(None);
        }
        CommandRestarter::new(
            &self.restart_command,
            Duration::from_secs(self.restart_timeout_secs),
        )
        .map(Some)
    }
}

impl ConfigProvider for RenewalConfig {
    fn save_dir(&self) -> &Path {
        &self.save_dir
    }

    fn layout(&self) -> BundleLayout {
        self.layout.unwrap_or_else(|| default_layout(&self.save_dir))
    }

    fn renew_before(&self) -> chrono::Duration {
        chrono::Duration::try_days(self.renew_before_days).unwrap_or(chrono::Duration::MAX)
    }

    fn poll_attempts(&self) -> u32 {
        self.poll_attempts
    }

    fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    fn domain_filter(&self) -> &[String] {
        &self.domains
    }

    fn restart_enabled(&self) -> bool {
        self.restart_enabled
    }

    fn always_restart(&self) -> bool {
        self.always_restart
    }
}

impl Validate for RenewalConfig {
    fn validate(&self) -> Result<()> {
        self.credential()?;
        validation::validate_url("tencent.endpoint", &self.endpoint)?;
        validation::validate_range("tencent.request_timeout_secs", self.request_timeout_secs, 1, 300)?;

        if !DV_AUTH_METHODS.contains(&self.dv_auth_method.as_str()) {
            return Err(RenewError::InvalidConfigValueError {
                field: "renewal.dv_auth_method".to_string(),
                value: self.dv_auth_method.clone(),
                reason: format!("Valid methods: {}", DV_AUTH_METHODS.join(", ")),
            });
        }
        validation::validate_range("renewal.renew_before_days", self.renew_before_days, 1, 365)?;
        validation::validate_range("renewal.poll_attempts", self.poll_attempts, 1, 120)?;
        validation::validate_range("renewal.poll_interval_secs", self.poll_interval_secs, 0, 60)?;

        validation::validate_path("install.save_dir", &self.save_dir.to_string_lossy())?;

        if self.restart_enabled {
            validation::validate_non_empty_list("restart.command", &self.restart_command)?;
            validation::validate_range("restart.timeout_secs", self.restart_timeout_secs, 1, 600)?;
        }

        Ok(())
    }
}
