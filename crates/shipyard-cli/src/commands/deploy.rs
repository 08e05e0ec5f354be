//! `shipyard deploy` — rolling deployment of one application revision.

use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Args;
use tokio::sync::watch;
use tracing::{error, info, warn};

use shipyard_fleet::{HttpFleetClient, RunContext};
use shipyard_rollout::{deploy, DeployOptions, DeployReport, DeploymentIntent};

/// Upper bound for the rollout part of an invocation. A rollback runs on its
/// own `--rollback-wait` budget after it.
const OVERALL_DEADLINE: Duration = Duration::from_secs(30 * 60);

#[derive(Debug, Args)]
pub struct DeployArgs {
    /// Application name to be deployed
    #[arg(short, long)]
    pub application: String,
    /// The version of the application to deploy
    #[arg(long)]
    pub revision: String,
    /// Number of instances of this version to run (default: same as the current count)
    #[arg(long)]
    pub replica_count: Option<u32>,
    /// Seconds to wait for a successful deployment
    #[arg(short, long, default_value = "360")]
    pub wait: u64,
    /// Seconds a rollback may take, counted from when it starts
    #[arg(long, default_value = "300")]
    pub rollback_wait: u64,
    /// Seconds between two polls of the fleet
    #[arg(long, default_value = "5", value_parser = clap::value_parser!(u64).range(1..))]
    pub poll_interval: u64,
    /// Profile to use from the contexts file
    #[arg(long, env = "SHIPYARD_PROFILE", default_value = shipyard_config::DEFAULT_PROFILE)]
    pub profile: String,
    /// Contexts file (default: ./contexts.toml, then $HOME/.shipyard/contexts.toml)
    #[arg(long)]
    pub contexts: Option<PathBuf>,
}

impl DeployArgs {
    fn intent(&self) -> DeploymentIntent {
        DeploymentIntent {
            application: self.application.clone(),
            revision: self.revision.clone(),
            replicas: self.replica_count,
            timeout: Duration::from_secs(self.wait),
        }
    }

    fn options(&self) -> DeployOptions {
        DeployOptions {
            poll_interval: Duration::from_secs(self.poll_interval),
            rollback_timeout: Duration::from_secs(self.rollback_wait),
        }
    }
}

pub async fn run(args: DeployArgs) -> Result<()> {
    let profile = shipyard_config::load_profile(args.contexts.as_deref(), &args.profile)
        .with_context(|| format!("could not load profile '{}'", args.profile))?;
    info!(profile = %profile.name, url = %profile.url, "using fleet backend");

    let client = HttpFleetClient::new(profile.url.clone(), &profile.username)
        .context("could not create fleet client")?;

    let (cancel_tx, cancel_rx) = watch::channel(false);
    let ctx = RunContext::new(OVERALL_DEADLINE, cancel_rx);

    tokio::spawn(async move {
        if relay_interrupts(tokio::signal::ctrl_c, cancel_tx).await {
            std::process::exit(130);
        }
    });

    let intent = args.intent();
    match deploy(&ctx, Arc::new(client), &intent, &args.options()).await {
        Ok(report) => {
            println!("{}", summary(&intent, &report));
            Ok(())
        }
        Err(e) => {
            if e.needs_operator() {
                error!(
                    application = %intent.application,
                    "fleet may be left in a mixed state, manual intervention required"
                );
            }
            Err(e.into())
        }
    }
}

/// Turn interrupts into run cancellation.
///
/// The first interrupt cancels the run, which still rolls back. Returns
/// `true` on a second interrupt, when the caller should exit at once.
async fn relay_interrupts<F, Fut>(mut interrupt: F, cancel: watch::Sender<bool>) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = std::io::Result<()>>,
{
    if let Err(e) = interrupt().await {
        warn!(error = %e, "could not listen for interrupts");
        return false;
    }
    warn!("interrupt received, stopping rollout and rolling back (interrupt again to exit now)");
    let _ = cancel.send(true);

    if interrupt().await.is_err() {
        return false;
    }
    error!("second interrupt received, exiting before the rollback finished; the fleet may be left in a mixed state");
    true
}

fn summary(intent: &DeploymentIntent, report: &DeployReport) -> String {
    match report {
        DeployReport::Deployed {
            load_balancer,
            replicas,
        } => format!(
            "✓ Deployed {} revision {} on {} ({} replicas)",
            intent.application, intent.revision, load_balancer, replicas
        ),
        DeployReport::AlreadyDeployed {
            load_balancer,
            replicas,
        } => format!(
            "✓ {} revision {} already running on {} ({} replicas), nothing to do",
            intent.application, intent.revision, load_balancer, replicas
        ),
        DeployReport::Skipped { load_balancer } => format!(
            "• Replica count is zero and {load_balancer} is empty, skipped"
        ),
    }
}
