//! Bridge binary: exposes every configured lock as a door accessory.
//!
//! Locks are backed by the simulated device. Target writes are read from
//! stdin, one per line:
//!
//! ```text
//! <lock name> <percent>     write the target position (0, 50 or 100)
//! <lock name> refresh       ask the lock for its status
//! status                    print every accessory's position triple
//! ```

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, bail};
use clap::Parser;
use keyble_accessory::{AccessoryHandle, AccessoryInformation, BridgeConfig, LockAccessory};
use keyble_hardware::mock::MockLock;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// How often pushed characteristic updates are drained and logged.
const UPDATE_POLL_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Parser)]
#[command(name = "keyble-bridge")]
#[command(about = "Expose eqiva eQ-3 smart locks as door accessories", long_about = None)]
struct Cli {
    /// Bridge configuration file (JSON)
    #[arg(short, long)]
    config: PathBuf,

    /// Skip the status request sent when each accessory starts
    #[arg(long)]
    no_sync: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

/// A parsed stdin line.
#[derive(Debug, PartialEq, Eq)]
enum Request<'a> {
    SetTarget { lock: &'a str, value: u8 },
    Refresh { lock: &'a str },
    Status,
}

fn parse_request(line: &str) -> anyhow::Result<Request<'_>> {
    let line = line.trim();
    if line == "status" {
        return Ok(Request::Status);
    }
    let Some((lock, argument)) = line.rsplit_once(char::is_whitespace) else {
        bail!("expected '<lock> <percent>', '<lock> refresh' or 'status'");
    };
    let lock = lock.trim_end();
    if argument == "refresh" {
        return Ok(Request::Refresh { lock });
    }
    let value = argument
        .parse()
        .with_context(|| format!("invalid target '{argument}'"))?;
    Ok(Request::SetTarget { lock, value })
}

fn find<'a>(accessories: &'a [AccessoryHandle], lock: &str) -> anyhow::Result<&'a AccessoryHandle> {
    accessories
        .iter()
        .find(|a| a.information().name == lock)
        .with_context(|| format!("no lock named '{lock}'"))
}

async fn handle_line(accessories: &[AccessoryHandle], line: &str) -> anyhow::Result<()> {
    match parse_request(line)? {
        Request::SetTarget { lock, value } => {
            find(accessories, lock)?.set_target_position(value).await?
        }
        Request::Refresh { lock } => find(accessories, lock)?.refresh().await?,
        Request::Status => {
            for accessory in accessories {
                println!("{}: {}", accessory.information().name, accessory.snapshot());
            }
        }
    }
    Ok(())
}

fn log_updates(accessories: &mut [AccessoryHandle]) {
    for accessory in accessories {
        while let Some(update) = accessory.try_next_update() {
            info!(
                "{}: {} = {}",
                accessory.information().name,
                update.characteristic(),
                update.value()
            );
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    let config = BridgeConfig::load(&cli.config)
        .with_context(|| format!("failed to load {}", cli.config.display()))?;

    let mut accessories: Vec<AccessoryHandle> = config
        .locks
        .iter()
        .map(|lock| {
            info!(
                "{}: simulating lock {} (user {})",
                lock.name, lock.address, lock.user_id
            );
            let (device, _) = MockLock::with_name(lock.name.clone());
            LockAccessory::new(AccessoryInformation::from(lock), device)
                .sync_on_start(!cli.no_sync)
                .start()
        })
        .collect();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut poll = tokio::time::interval(UPDATE_POLL_INTERVAL);
    let interrupted = tokio::signal::ctrl_c();
    tokio::pin!(interrupted);

    loop {
        tokio::select! {
            _ = &mut interrupted => {
                info!("interrupted, shutting down");
                break;
            }
            line = lines.next_line() => match line? {
                Some(line) if line.trim().is_empty() => {}
                Some(line) => {
                    if let Err(e) = handle_line(&accessories, &line).await {
                        warn!("{:#}", e);
                    }
                }
                None => {
                    info!("stdin closed, shutting down");
                    break;
                }
            },
            _ = poll.tick() => log_updates(&mut accessories),
        }
    }

    log_updates(&mut accessories);
    for accessory in accessories {
        accessory.shutdown().await?;
    }
    Ok(())
}
