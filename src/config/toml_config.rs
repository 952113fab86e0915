use crate::domain::model::BundleLayout;
use crate::utils::error::{RenewError, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// On-disk configuration. Every key is optional; missing keys keep their defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TomlConfig {
    #[serde(default)]
    pub tencent: TencentSection,
    #[serde(default)]
    pub renewal: RenewalSection,
    #[serde(default)]
    pub install: InstallSection,
    #[serde(default)]
    pub restart: RestartSection,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TencentSection {
    pub secret_id: Option<String>,
    pub secret_key: Option<String>,
    pub region: Option<String>,
    pub endpoint: Option<String>,
    pub request_timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RenewalSection {
    pub renew_before_days: Option<i64>,
    pub dv_auth_method: Option<String>,
    pub poll_attempts: Option<u32>,
    pub poll_interval_secs: Option<u64>,
    pub domains: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InstallSection {
    pub save_dir: Option<PathBuf>,
    pub layout: Option<BundleLayout>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RestartSection {
    pub enabled: Option<bool>,
    pub always: Option<bool>,
    pub command: Option<Vec<String>>,
    pub timeout_secs: Option<u64>,
}

impl TomlConfig {
    /// Loads configuration from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(|e| RenewError::ConfigError {
            message: format!("cannot read {}: {}", path.as_ref().display(), e),
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| RenewError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// Replaces `${VAR}` placeholders from the environment; unset variables are left as-is.
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| RenewError::ConfigError {
            message: e.to_string(),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }
}

/// True for values that still contain an unresolved `${VAR}` placeholder.
pub fn has_placeholder(value: &str) -> bool {
    value.contains("${")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_full_config() {
        let toml_content = r#"
[tencent]
secret_id = "AKID"
secret_key = "KEY"
region = "ap-guangzhou"

[renewal]
renew_before_days = 20
poll_attempts = 5
domains = ["example.com", "www.example.com"]

[install]
save_dir = "/etc/nginx/ssl"
layout = "nginx"

[restart]
command = ["nginx", "-s", "reload"]
timeout_secs = 10
"#;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();

        assert_eq!(config.tencent.region.as_deref(), Some("ap-guangzhou"));
        assert_eq!(config.renewal.renew_before_days, Some(20));
        assert_eq!(config.renewal.domains.unwrap().len(), 2);
        assert_eq!(config.install.layout, Some(BundleLayout::Nginx));
        assert_eq!(
            config.restart.command.unwrap(),
            vec!["nginx", "-s", "reload"]
        );
        assert!(config.restart.enabled.is_none());
    }

    #[test]
    fn test_empty_config_is_valid() {
        let config = TomlConfig::from_toml_str("").unwrap();
        assert!(config.tencent.secret_id.is_none());
        assert!(config.install.save_dir.is_none());
    }

    #[test]
    fn test_unknown_keys_are_rejected() {
        let err = TomlConfig::from_toml_str("[install]\nsave_directory = \"/tmp\"\n").unwrap_err();
        assert!(matches!(err, RenewError::ConfigError { .. }));
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("SSL_RENEW_TEST_SECRET_ID", "AKIDFROMENV");

        let toml_content = r#"
[tencent]
secret_id = "${SSL_RENEW_TEST_SECRET_ID}"
secret_key = "${SSL_RENEW_TEST_UNSET_VARIABLE}"
"#;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();
        assert_eq!(config.tencent.secret_id.as_deref(), Some("AKIDFROMENV"));
        let key = config.tencent.secret_key.unwrap();
        assert_eq!(key, "${SSL_RENEW_TEST_UNSET_VARIABLE}");
        assert!(has_placeholder(&key));

        std::env::remove_var("SSL_RENEW_TEST_SECRET_ID");
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file
            .write_all(b"[renewal]\npoll_interval_secs = 3\n")
            .unwrap();

        let config = TomlConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.renewal.poll_interval_secs, Some(3));
    }

    #[test]
    fn test_example_config_parses() {
        let config = TomlConfig::from_toml_str(include_str!("../../ssl-renew.example.toml")).unwrap();
        assert_eq!(config.restart.timeout_secs, Some(30));
    }
}
