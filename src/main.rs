use clap::Parser;
use ssl_renew::domain::model::DomainOutcome;
use ssl_renew::utils::{logger, validation::Validate};
use ssl_renew::{CliConfig, RenewError, RenewalEngine};

fn fail(e: &RenewError) -> ! {
    tracing::error!(
        "❌ Renewal failed: {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());
    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 {}", e.recovery_suggestion());
    std::process::exit(e.exit_code().max(1));
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = CliConfig::parse();

    if cli.log_json {
        logger::init_json_logger(cli.verbose);
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    tracing::info!("Starting ssl-renew");

    let config = match cli.resolve() {
        Ok(config) => config,
        Err(e) => fail(&e),
    };
    tracing::debug!("Resolved config: {:?}", config);

    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        fail(&e);
    }

    let client = match config.build_client() {
        Ok(client) => client,
        Err(e) => fail(&e),
    };
    let restarter = match config.build_restarter() {
        Ok(restarter) => restarter,
        Err(e) => fail(&e),
    };
    let engine = RenewalEngine::new(client, restarter, config);

    if cli.dry_run {
        tracing::info!("🔍 DRY RUN MODE - nothing will be applied or restarted");
        match engine.plan().await {
            Ok(plan) => {
                for (domain, state) in &plan.domains {
                    let action = if state.needs_renewal { "renew" } else { "keep" };
                    println!(
                        "{:<6} {} ({})",
                        action,
                        domain,
                        state.certificate_id.as_deref().unwrap_or("-")
                    );
                }
                println!("{} domain(s) would be renewed", plan.due_count());
            }
            Err(e) => fail(&e),
        }
        return Ok(());
    }

    let report = match engine.run().await {
        Ok(report) => report,
        Err(e) => fail(&e),
    };

    for (domain, outcome) in &report.outcomes {
        match outcome {
            DomainOutcome::Installed { files, .. } => {
                println!("✅ {}: installed {} file(s)", domain, files.len())
            }
            DomainOutcome::NotDeployable { certificate_id } => {
                println!("⏳ {}: {} not issued yet", domain, certificate_id)
            }
            DomainOutcome::ApplyFailed { reason } => println!("❌ {}: apply failed: {}", domain, reason),
            DomainOutcome::InstallFailed { reason, .. } => {
                println!("❌ {}: install failed: {}", domain, reason)
            }
        }
    }
    println!(
        "{} renewed, {} failed, web server restarted: {}",
        report.installed_count(),
        report.failed_count(),
        report.restarted
    );

    // Partial failures are worth a retry on the next scheduled run.
    if report.failed_count() > 0 {
        std::process::exit(2);
    }

    Ok(())
}
