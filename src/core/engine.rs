use crate::core::bundle::install_bundle;
use crate::core::planner::plan_renewals;
use crate::domain::model::{DomainOutcome, RenewalPlan, RenewalReport};
use crate::domain::ports::{CertificateApi, ConfigProvider, ServiceRestarter};
use crate::utils::error::Result;
use chrono::{DateTime, Utc};

pub struct RenewalEngine<A: CertificateApi, R: ServiceRestarter, C: ConfigProvider> {
    api: A,
    restarter: R,
    config: C,
}

impl<A: CertificateApi, R: ServiceRestarter, C: ConfigProvider> RenewalEngine<A, R, C> {
    pub fn new(api: A, restarter: R, config: C) -> Self {
        Self {
            api,
            restarter,
            config,
        }
    }

    pub async fn plan(&self) -> Result<RenewalPlan> {
        self.plan_at(Utc::now()).await
    }

    pub async fn plan_at(&self, now: DateTime<Utc>) -> Result<RenewalPlan> {
        let certificates = self.api.describe_certificates().await?;
        tracing::info!("Found {} certificates", certificates.len());

        let plan = plan_renewals(
            &certificates,
            now,
            self.config.renew_before(),
            self.config.domain_filter(),
        );
        tracing::info!(
            "{} of {} domains need renewal",
            plan.due_count(),
            plan.domains.len()
        );
        Ok(plan)
    }

    pub async fn run(&self) -> Result<RenewalReport> {
        self.run_at(Utc::now()).await
    }

    pub async fn run_at(&self, now: DateTime<Utc>) -> Result<RenewalReport> {
        tracing::info!("Save dir: {}", self.config.save_dir().display());
        let plan = self.plan_at(now).await?;

        let mut report = RenewalReport {
            planned: plan.due_count(),
            ..Default::default()
        };

        for domain in plan.due() {
            tracing::info!("Need apply: {}", domain);
            let outcome = self.renew_domain(domain).await;
            report.outcomes.insert(domain.to_string(), outcome);
        }

        let should_restart = self.config.restart_enabled()
            && (report.installed_count() > 0 || self.config.always_restart());

        if should_restart {
            match self.restarter.restart().await {
                Ok(()) => {
                    tracing::info!("Web server restarted");
                    report.restarted = true;
                }
                Err(e) => {
                    tracing::error!("Restart failed: {}", e);
                    log_summary(&report);
                    return Err(e);
                }
            }
        } else {
            tracing::info!("Skipping web server restart");
        }

        log_summary(&report);
        Ok(report)
    }

    async fn renew_domain(&self, domain: &str) -> DomainOutcome {
        let certificate_id = match self.api.apply_certificate(domain).await {
            Ok(id) => id,
            Err(e) => {
                tracing::error!("Apply failed for {}: {}", domain, e);
                return DomainOutcome::ApplyFailed {
                    reason: e.to_string(),
                };
            }
        };
        tracing::info!("Applied for {}: {}", domain, certificate_id);

        if !self.wait_deployable(&certificate_id).await {
            tracing::warn!(
                "Certificate {} for {} is not deployable after {} checks",
                certificate_id,
                domain,
                self.config.poll_attempts()
            );
            return DomainOutcome::NotDeployable { certificate_id };
        }
        tracing::info!("Apply success: {}", domain);

        let installed = match self.api.download_certificate(&certificate_id).await {
            Ok(bundle) => install_bundle(
                &bundle,
                self.config.save_dir(),
                self.config.layout(),
                domain,
            ),
            Err(e) => Err(e),
        };

        match installed {
            Ok(files) => {
                tracing::info!("Download certificate success: {} ({} files)", domain, files.len());
                DomainOutcome::Installed {
                    certificate_id,
                    files,
                }
            }
            Err(e) => {
                tracing::error!("Download certificate error for {}: {}", domain, e);
                DomainOutcome::InstallFailed {
                    certificate_id,
                    reason: e.to_string(),
                }
            }
        }
    }

    /// Sleeps before every check; API errors spend an attempt.
    async fn wait_deployable(&self, certificate_id: &str) -> bool {
        let attempts = self.config.poll_attempts();
        for attempt in 1..=attempts {
            tokio::time::sleep(self.config.poll_interval()).await;
            match self.api.describe_certificate(certificate_id).await {
                Ok(true) => return true,
                Ok(false) => {
                    tracing::debug!("{} not deployable yet ({}/{})", certificate_id, attempt, attempts)
                }
                Err(e) => tracing::warn!("Status check {}/{} failed: {}", attempt, attempts, e),
            }
        }
        false
    }
}

fn log_summary(report: &RenewalReport) {
    tracing::info!(
        "Renewal finished: {} planned, {} installed, {} failed, restarted: {}",
        report.planned,
        report.installed_count(),
        report.failed_count(),
        report.restarted
    );
}
