//! WxPusher notification channel.

use super::Notifier;
use crate::config::{resolve_env, NotificationConfig};
use crate::error::{MonitorError, Result};
use crate::ip::PublicIp;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://wxpusher.zjiecode.com";

/// WxPusher message codes: 1000 means the message was accepted.
const CODE_SUCCESS: i64 = 1000;

/// Sends an IP-change message through the WxPusher API.
pub struct WxPusherNotifier {
    client: reqwest::Client,
    app_token: String,
    uids: Vec<String>,
    s1_port: u16,
    s2_port: u16,
    max_retries: u32,
    retry_delay: Duration,
    base_url: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SendRequest<'a> {
    app_token: &'a str,
    content: String,
    summary: &'a str,
    content_type: u8,
    uids: &'a [String],
    url: &'a str,
    verify_pay: bool,
}

#[derive(Debug, Deserialize)]
struct SendResponse {
    code: i64,
    #[serde(default)]
    msg: String,
}

impl WxPusherNotifier {
    /// Build a notifier from the `[notification]` configuration section.
    pub fn from_config(config: &NotificationConfig) -> Self {
        Self::with_base_url(config, DEFAULT_BASE_URL.to_string())
    }

    /// Create with custom base URL (for testing).
    pub fn with_base_url(config: &NotificationConfig, base_url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            app_token: resolve_env(&config.wxpusher.app_token),
            uids: config.wxpusher.uids.clone(),
            s1_port: config.services.s1_port,
            s2_port: config.services.s2_port,
            max_retries: config.max_retries.max(1),
            retry_delay: config.retry_delay(),
            base_url,
        }
    }

    /// Render the fixed HTML message embedding the new IP and service URLs.
    fn render_message(&self, ip: &PublicIp) -> String {
        format!(
            "<h1>Public IP changed</h1><br/>\
             <p>Your services are now reachable at:</p>\
             <p>Service 1: <a href=\"http://{ip}:{s1}\">http://{ip}:{s1}</a></p>\
             <p>Service 2: <a href=\"http://{ip}:{s2}\">http://{ip}:{s2}</a></p>",
            ip = ip,
            s1 = self.s1_port,
            s2 = self.s2_port
        )
    }

    /// One delivery attempt.
    async fn send(&self, ip: &PublicIp) -> Result<()> {
        let request = SendRequest {
            app_token: &self.app_token,
            content: self.render_message(ip),
            summary: "Public IP changed",
            content_type: 2,
            uids: &self.uids,
            url: "",
            verify_pay: false,
        };

        let response = self
            .client
            .post(format!("{}/api/send/message", self.base_url))
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(MonitorError::Network(format!(
                "HTTP {} from WxPusher",
                response.status()
            )));
        }

        let body: SendResponse = response.json().await?;
        if body.code == CODE_SUCCESS {
            Ok(())
        } else {
            Err(MonitorError::Provider {
                provider: "wxpusher".to_string(),
                message: format!("code {}: {}", body.code, body.msg),
            })
        }
    }
}

#[async_trait]
impl Notifier for WxPusherNotifier {
    fn name(&self) -> &'static str {
        "wxpusher"
    }

    async fn notify(&self, ip: &PublicIp) -> Result<()> {
        let mut last_err = None;
        for attempt in 1..=self.max_retries {
            match self.send(ip).await {
                Ok(()) => {
                    tracing::info!("Notification sent for IP {}", ip);
                    return Ok(());
                }
                Err(e) => {
                    tracing::warn!(
                        "Notification attempt {}/{} failed: {}",
                        attempt,
                        self.max_retries,
                        e
                    );
                    last_err = Some(e);
                    if attempt < self.max_retries {
                        tokio::time::sleep(self.retry_delay).await;
                    }
                }
            }
        }

        Err(last_err.unwrap_or_else(|| MonitorError::Provider {
            provider: "wxpusher".to_string(),
            message: "Send failed".to_string(),
        }))
    }
}
