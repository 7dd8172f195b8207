//! User notification on IP change.

mod wxpusher;

pub use wxpusher::WxPusherNotifier;

use crate::error::Result;
use crate::ip::PublicIp;
use async_trait::async_trait;

#[cfg(test)]
use mockall::automock;

/// A collaborator that tells the user about a new public IP.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Channel name for logs.
    fn name(&self) -> &'static str;

    /// Deliver a notification for `ip`.
    async fn notify(&self, ip: &PublicIp) -> Result<()>;
}
