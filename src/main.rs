//! ipwatch - public IP change monitor.

use anyhow::Context;
use clap::{Parser, Subcommand};
use ipwatch::config::Config;
use ipwatch::dns::{CloudflareUpdater, DnsUpdater};
use ipwatch::fetcher::IpFetcher;
use ipwatch::ip::PublicIp;
use ipwatch::monitor::{IpMonitor, RunOutcome};
use ipwatch::notify::{Notifier, WxPusherNotifier};
use ipwatch::state::StateFile;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "ipwatch")]
#[command(about = "Public IP change monitor with DNS update and push notification")]
#[command(version)]
struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one check-and-propagate pass
    Run,

    /// Send the IP-change notification for a given address
    Notify {
        /// The public IP to announce
        ip: String,
    },

    /// Point the configured DNS record at a given address
    UpdateDns {
        /// The public IP to publish
        ip: String,
    },

    /// Print an example configuration file
    ExampleConfig,
}

fn get_config_path(cli_path: Option<PathBuf>) -> PathBuf {
    if let Some(path) = cli_path {
        return path;
    }

    // Default locations
    let candidates = [
        dirs::config_dir().map(|p| p.join("ipwatch/config.toml")),
        Some(PathBuf::from("/etc/ipwatch/config.toml")),
        Some(PathBuf::from("config.toml")),
    ];

    for candidate in candidates.into_iter().flatten() {
        if candidate.exists() {
            return candidate;
        }
    }

    // Return default even if it doesn't exist
    dirs::config_dir()
        .map(|p| p.join("ipwatch/config.toml"))
        .unwrap_or_else(|| PathBuf::from("config.toml"))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run => cmd_run(load_config(cli.config)?).await?,
        Commands::Notify { ip } => cmd_notify(load_config(cli.config)?, &ip).await?,
        Commands::UpdateDns { ip } => cmd_update_dns(load_config(cli.config)?, &ip).await?,
        Commands::ExampleConfig => print!("{}", toml::to_string_pretty(&Config::example())?),
    }

    Ok(())
}

fn load_config(cli_path: Option<PathBuf>) -> anyhow::Result<Config> {
    let config_path = get_config_path(cli_path);
    Config::load_from(&config_path)
        .with_context(|| format!("Failed to load {}", config_path.display()))
}

async fn cmd_run(config: Config) -> anyhow::Result<()> {
    let fetcher = IpFetcher::from_config(&config.ip_check)?;
    let state = StateFile::new(&config.ip_check.last_ip_file);
    let dns: Box<dyn DnsUpdater> = Box::new(CloudflareUpdater::from_config(&config.cloudflare));
    let notifier: Option<Box<dyn Notifier>> = if config.notification.enabled {
        Some(Box::new(WxPusherNotifier::from_config(&config.notification)))
    } else {
        None
    };

    let monitor = IpMonitor::new(fetcher, state, dns, notifier);

    match monitor.run().await? {
        RunOutcome::Unchanged(ip) => println!("IP unchanged: {}", ip),
        RunOutcome::FirstRun(ip) => println!("Baseline saved: {}", ip),
        RunOutcome::Propagated {
            ip,
            previous,
            notified,
            dns_updated,
        } => {
            println!("IP changed: {} -> {}", previous, ip);
            println!("  notification: {}", if notified { "sent" } else { "not sent" });
            println!("  dns update:   {}", if dns_updated { "ok" } else { "failed" });
        }
    }

    Ok(())
}

async fn cmd_notify(config: Config, ip: &str) -> anyhow::Result<()> {
    let ip = PublicIp::parse(ip)?;
    let notifier = WxPusherNotifier::from_config(&config.notification);

    notifier.notify(&ip).await?;
    println!("Notification sent for {}", ip);
    Ok(())
}

async fn cmd_update_dns(config: Config, ip: &str) -> anyhow::Result<()> {
    let ip = PublicIp::parse(ip)?;
    let updater = CloudflareUpdater::from_config(&config.cloudflare);

    let result = updater.update(&ip).await?;
    match result.previous {
        Some(previous) => println!("{}: {} -> {}", result.record, previous, result.ip),
        None => println!("{}: {}", result.record, result.ip),
    }
    Ok(())
}
