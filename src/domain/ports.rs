use crate::domain::model::{BundleLayout, CertificateSummary};
use crate::utils::error::{RenewError, Result};
use async_trait::async_trait;
use std::path::Path;
use std::time::Duration;

#[async_trait]
pub trait CertificateApi: Send + Sync {
    async fn describe_certificates(&self) -> Result<Vec<CertificateSummary>>;
    /// Returns the id of the newly requested certificate.
    async fn apply_certificate(&self, domain: &str) -> Result<String>;
    /// Whether the certificate has been issued and can be deployed.
    async fn describe_certificate(&self, certificate_id: &str) -> Result<bool>;
    /// Raw zip bundle, already base64-decoded.
    async fn download_certificate(&self, certificate_id: &str) -> Result<Vec<u8>>;
}

#[async_trait]
pub trait ServiceRestarter: Send + Sync {
    async fn restart(&self) -> Result<()>;
}

/// `None` stands for a run with restarts disabled.
#[async_trait]
impl<R: ServiceRestarter> ServiceRestarter for Option<R> {
    async fn restart(&self) -> Result<()> {
        match self {
            Some(restarter) => restarter.restart().await,
            None => Err(RenewError::ConfigError {
                message: "no restart command configured".to_string(),
            }),
        }
    }
}

pub trait ConfigProvider: Send + Sync {
    fn save_dir(&self) -> &Path;
    fn layout(&self) -> BundleLayout;
    fn renew_before(&self) -> chrono::Duration;
    fn poll_attempts(&self) -> u32;
    fn poll_interval(&self) -> Duration;
    fn domain_filter(&self) -> &[String];
    fn restart_enabled(&self) -> bool;
    fn always_restart(&self) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Succeeds;

    #[async_trait]
    impl ServiceRestarter for Succeeds {
        async fn restart(&self) -> Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_optional_restarter() {
        assert!(Some(Succeeds).restart().await.is_ok());
        assert!(matches!(
            None::<Succeeds>.restart().await,
            Err(RenewError::ConfigError { .. })
        ));
    }
}
