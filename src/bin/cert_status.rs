use anyhow::Context;
use chrono::Utc;
use clap::Parser;
use ssl_renew::core::planner::{is_near_expiry, plan_renewals};
use ssl_renew::domain::ports::{CertificateApi, ConfigProvider};
use ssl_renew::utils::logger;
use ssl_renew::utils::validation::Validate;
use ssl_renew::CliConfig;

/// Lists every certificate of the account with its expiry and the renewal
/// decision per domain. Read-only.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();
    logger::init_cli_logger(cli.verbose);

    let config = cli.resolve().context("loading configuration")?;
    config.validate().context("validating configuration")?;
    let client = config.build_client().context("building API client")?;

    let certificates = client
        .describe_certificates()
        .await
        .context("listing certificates")?;
    let now = Utc::now();
    let renew_before = config.renew_before();

    println!("{:<24} {:<40} {:<20} {}", "CERTIFICATE", "DOMAIN", "END (UTC+8)", "EXPIRING");
    for cert in &certificates {
        println!(
            "{:<24} {:<40} {:<20} {}",
            cert.certificate_id,
            cert.domain.as_deref().unwrap_or("-"),
            cert.cert_end_time.as_deref().unwrap_or("-"),
            if is_near_expiry(cert, now, renew_before) { "yes" } else { "no" }
        );
    }

    let plan = plan_renewals(&certificates, now, renew_before, config.domain_filter());
    println!();
    println!(
        "{} certificate(s), {} domain(s), {} due for renewal: {}",
        certificates.len(),
        plan.domains.len(),
        plan.due_count(),
        plan.due().collect::<Vec<_>>().join(", ")
    );

    Ok(())
}
