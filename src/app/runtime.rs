use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use ezshare_sync::{ClientConfig, DeviceClient, Syncer, Version};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::ProcessExit;
use crate::app::{exit_handler, terminal};
use crate::cli::Args;

pub(crate) async fn run_sync() -> Result<ProcessExit> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();

    terminal::init_tracing(terminal::resolve_default_log_level(
        args.verbose,
        args.quiet,
    ));
    debug!(?args, "CLI arguments parsed");

    let client = build_client(&args)?;

    let cancel = CancellationToken::new();
    let interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, stopping");
            interrupt.cancel();
        }
    });

    if args.device_info {
        let version = client
            .version(&cancel)
            .await
            .context("failed to query device version")?;
        print_version(&version);
        return Ok(ProcessExit::Success);
    }

    let Some(target) = args.target.as_deref() else {
        anyhow::bail!("--target is required");
    };

    if args.dry_run {
        info!("DRY RUN MODE - no files will be modified");
    }
    info!(url = %client.config().base_url(), target = %target.display(), "Syncing");

    let result = Syncer::new(&client, target)
        .dry_run(args.dry_run)
        .with_cancellation(cancel)
        .run()
        .await;

    match result {
        Ok(stats) => {
            println!(
                "Sync complete: {} synced, {} skipped, {} errors",
                stats.synced(),
                stats.skipped(),
                stats.errors()
            );
            Ok(exit_handler::determine_exit_outcome(&stats))
        }
        Err(e) if e.is_cancelled() => {
            warn!("Interrupted. Run again to resume.");
            Ok(ProcessExit::Failure)
        }
        Err(e) => Err(e).with_context(|| format!("sync into {} failed", target.display())),
    }
}

fn build_client(args: &Args) -> Result<DeviceClient> {
    let mut config = ClientConfig::new(&args.url)
        .with_context(|| format!("invalid --url {:?}", args.url))?
        .with_max_retries(args.max_retries)
        .with_timeout(Duration::from_secs(args.timeout));
    if let Some(proxy) = &args.proxy {
        config = config.with_socks5_proxy(proxy.clone());
    }
    DeviceClient::new(config).context("failed to create device client")
}

fn print_version(version: &Version) {
    println!("Chip model:       {}", version.chip_model);
    println!("Firmware version: {}", version.firmware_version);
    println!("Build date:       {}", version.date);
    println!("Build number:     {}", version.build_number);
}
