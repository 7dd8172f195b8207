//! Public IP detection against a configurable echo service.

use crate::config::IpCheckConfig;
use crate::error::{MonitorError, Result};
use crate::ip::PublicIp;
use regex::Regex;
use std::time::Duration;

/// Fetches the current public IP from an address-echoing HTTP service.
#[derive(Debug)]
pub struct IpFetcher {
    client: reqwest::Client,
    api_url: String,
    pattern: Regex,
    max_retries: u32,
    retry_delay: Duration,
}

impl IpFetcher {
    /// Build a fetcher from the `[ip_check]` configuration section.
    pub fn from_config(config: &IpCheckConfig) -> Result<Self> {
        let pattern = Regex::new(&config.ip_pattern).map_err(|e| {
            MonitorError::Config(format!("Invalid ip_pattern {:?}: {}", config.ip_pattern, e))
        })?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| MonitorError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_url: config.api_url.clone(),
            pattern,
            max_retries: config.max_retries.max(1),
            retry_delay: config.retry_delay(),
        })
    }

    /// Fetch and validate the current public IP.
    ///
    /// Transport errors and non-2xx responses are retried up to the
    /// configured ceiling with a pause between attempts. A response that
    /// arrives but carries no match for the extraction pattern, or whose
    /// match fails validation, ends the call immediately: repeating the same
    /// request is assumed futile.
    pub async fn fetch(&self) -> Result<PublicIp> {
        for attempt in 1..=self.max_retries {
            match self.try_fetch().await {
                Ok(body) => {
                    let candidate = match self
                        .pattern
                        .captures(&body)
                        .and_then(|c| c.get(1))
                        .map(|m| m.as_str())
                    {
                        Some(candidate) => candidate,
                        None => {
                            tracing::error!("No IP found in echo-service response");
                            return Err(MonitorError::IpNotFound(self.api_url.clone()));
                        }
                    };

                    let ip = PublicIp::parse(candidate).map_err(|e| {
                        tracing::error!("Echo service returned invalid IP {:?}", candidate);
                        e
                    })?;

                    tracing::info!("Fetched valid public IP: {}", ip);
                    return Ok(ip);
                }
                Err(e) => {
                    tracing::warn!("IP fetch attempt {}/{} failed: {}", attempt, self.max_retries, e);
                    if attempt < self.max_retries {
                        tokio::time::sleep(self.retry_delay).await;
                    }
                }
            }
        }

        Err(MonitorError::IpDetection(format!(
            "All {} fetch attempts against {} failed",
            self.max_retries, self.api_url
        )))
    }

    /// One transport attempt: GET the echo service, return the body on 2xx.
    async fn try_fetch(&self) -> Result<String> {
        let response = self.client.get(&self.api_url).send().await?;

        if !response.status().is_success() {
            return Err(MonitorError::Network(format!(
                "HTTP {} from {}",
                response.status(),
                self.api_url
            )));
        }

        Ok(response.text().await?)
    }
}
