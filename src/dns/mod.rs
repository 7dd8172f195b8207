//! DNS record update.

mod cloudflare;

pub use cloudflare::CloudflareUpdater;

use crate::error::Result;
use crate::ip::PublicIp;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[cfg(test)]
use mockall::automock;

/// Result of a DNS update operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateResult {
    /// Record that was updated.
    pub record: String,
    /// New record content.
    pub ip: String,
    /// Previous record content (if known).
    pub previous: Option<String>,
    /// Timestamp of the update.
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// A collaborator that points a DNS record at a new IP.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait DnsUpdater: Send + Sync {
    /// Provider name for logs.
    fn name(&self) -> &'static str;

    /// Record being managed.
    fn record(&self) -> String;

    /// Set the record's content to `ip`.
    async fn update(&self, ip: &PublicIp) -> Result<UpdateResult>;
}
