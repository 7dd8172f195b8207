//! # ipwatch
//!
//! Detects changes to this host's public IPv4 address and propagates a new
//! address to a Cloudflare DNS record and a WxPusher notification channel.
//!
//! One invocation is one run: fetch the current IP from an echo service
//! (with validation and retry), compare it against the last persisted value,
//! and on a genuine change overwrite the state file and trigger the two
//! downstream actions independently. Periodic execution is left to an
//! external scheduler such as cron or a systemd timer.
//!
//! ## Usage
//!
//! ```bash
//! # One monitoring pass
//! ipwatch run
//!
//! # Send a notification for a given IP (standalone)
//! ipwatch notify 2.2.2.2
//!
//! # Point the DNS record at a given IP (standalone)
//! ipwatch update-dns 2.2.2.2
//! ```

pub mod config;
pub mod dns;
pub mod error;
pub mod fetcher;
pub mod ip;
pub mod monitor;
pub mod notify;
pub mod state;

pub use config::Config;
pub use error::{MonitorError, Result};
pub use ip::PublicIp;
pub use monitor::{IpMonitor, RunOutcome};
