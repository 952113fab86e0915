use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// One entry of the certificate listing, as the API reports it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CertificateSummary {
    pub certificate_id: String,
    #[serde(default)]
    pub domain: Option<String>,
    /// `YYYY-MM-DD HH:MM:SS`, China Standard Time.
    #[serde(default)]
    pub cert_end_time: Option<String>,
    #[serde(default)]
    pub status: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DomainState {
    pub needs_renewal: bool,
    pub certificate_id: Option<String>,
}

/// Renewal decision per domain, ordered by domain name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenewalPlan {
    pub domains: BTreeMap<String, DomainState>,
}

impl RenewalPlan {
    pub fn due(&self) -> impl Iterator<Item = &str> {
        self.domains
            .iter()
            .filter(|(_, state)| state.needs_renewal)
            .map(|(domain, _)| domain.as_str())
    }

    pub fn due_count(&self) -> usize {
        self.due().count()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum BundleLayout {
    /// Whole archive, directories preserved, under `<save_dir>/<domain>/`.
    Full,
    /// Only the `Nginx/` entries, flattened into `<save_dir>`.
    Nginx,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomainOutcome {
    Installed {
        certificate_id: String,
        files: Vec<PathBuf>,
    },
    NotDeployable {
        certificate_id: String,
    },
    ApplyFailed {
        reason: String,
    },
    InstallFailed {
        certificate_id: String,
        reason: String,
    },
}

impl DomainOutcome {
    pub fn is_installed(&self) -> bool {
        matches!(self, DomainOutcome::Installed { .. })
    }
}

#[derive(Debug, Clone, Default)]
pub struct RenewalReport {
    pub planned: usize,
    pub outcomes: BTreeMap<String, DomainOutcome>,
    pub restarted: bool,
}

impl RenewalReport {
    pub fn installed_count(&self) -> usize {
        self.outcomes.values().filter(|o| o.is_installed()).count()
    }

    pub fn failed_count(&self) -> usize {
        self.outcomes.len() - self.installed_count()
    }
}
