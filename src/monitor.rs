//! The check-and-propagate workflow.

use crate::dns::DnsUpdater;
use crate::error::Result;
use crate::fetcher::IpFetcher;
use crate::ip::PublicIp;
use crate::notify::Notifier;
use crate::state::StateFile;

/// Terminal state of one monitoring run.
#[derive(Debug)]
pub enum RunOutcome {
    /// Fetched IP equals the stored one; nothing was touched.
    Unchanged(PublicIp),

    /// No previous IP was on record. The baseline was persisted without
    /// triggering notification or DNS update.
    FirstRun(PublicIp),

    /// The IP changed: state was overwritten and both downstream actions
    /// were attempted independently.
    Propagated {
        ip: PublicIp,
        previous: PublicIp,
        notified: bool,
        dns_updated: bool,
    },
}

/// One-shot public IP monitor: fetch, compare, persist, propagate.
pub struct IpMonitor {
    fetcher: IpFetcher,
    state: StateFile,
    dns: Box<dyn DnsUpdater>,
    notifier: Option<Box<dyn Notifier>>,
}

impl IpMonitor {
    /// `notifier` is `None` when notifications are disabled in config.
    pub fn new(
        fetcher: IpFetcher,
        state: StateFile,
        dns: Box<dyn DnsUpdater>,
        notifier: Option<Box<dyn Notifier>>,
    ) -> Self {
        Self {
            fetcher,
            state,
            dns,
            notifier,
        }
    }

    /// Execute one monitoring pass.
    ///
    /// Fetch and persistence failures propagate as errors; failures of the
    /// notifier or the DNS updater are logged and reflected in the outcome
    /// but do not fail the run, and neither blocks the other.
    pub async fn run(&self) -> Result<RunOutcome> {
        let current = self.fetcher.fetch().await?;

        // A readable-but-broken slot means the previous value cannot be
        // confirmed; re-baseline instead of aborting.
        let previous = match self.state.read().await {
            Ok(previous) => previous,
            Err(e) => {
                tracing::warn!("Could not read last known IP, treating as absent: {}", e);
                None
            }
        };

        let last = match previous {
            Some(last) if last == current => {
                tracing::info!("Public IP unchanged: {}", current);
                return Ok(RunOutcome::Unchanged(current));
            }
            Some(last) => last,
            None => {
                self.state.write(&current).await?;
                tracing::info!(
                    "No previous IP on record; saved {} as the new baseline",
                    current
                );
                return Ok(RunOutcome::FirstRun(current));
            }
        };

        // Persist before propagating: if the new baseline is not durable,
        // downstream systems must not learn about it.
        self.state.write(&current).await?;
        tracing::info!("Public IP changed: {} -> {}", last, current);

        let notified = match &self.notifier {
            Some(notifier) => match notifier.notify(&current).await {
                Ok(()) => true,
                Err(e) => {
                    tracing::error!("Notification via {} failed: {}", notifier.name(), e);
                    false
                }
            },
            None => {
                tracing::debug!("Notifications disabled");
                false
            }
        };

        let dns_updated = match self.dns.update(&current).await {
            Ok(result) => {
                tracing::info!(
                    "DNS record {} now points at {}",
                    result.record,
                    result.ip
                );
                true
            }
            Err(e) => {
                tracing::error!(
                    "DNS update of {} via {} failed: {}",
                    self.dns.record(),
                    self.dns.name(),
                    e
                );
                false
            }
        };

        Ok(RunOutcome::Propagated {
            ip: current,
            previous: last,
            notified,
            dns_updated,
        })
    }
}
