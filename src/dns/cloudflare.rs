//! Cloudflare DNS updater.

use super::{DnsUpdater, UpdateResult};
use crate::config::{resolve_env, CloudflareConfig};
use crate::error::{MonitorError, Result};
use crate::ip::PublicIp;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://api.cloudflare.com";

/// Updates a single A record through the Cloudflare v4 API.
pub struct CloudflareUpdater {
    client: reqwest::Client,
    api_token: String,
    zone_id: String,
    dns_type: String,
    record_name: String,
    ttl: u32,
    proxied: bool,
    max_retries: u32,
    retry_delay: Duration,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct CloudflareResponse<T> {
    success: bool,
    result: Option<T>,
    #[serde(default)]
    errors: Vec<CloudflareError>,
}

#[derive(Debug, Deserialize)]
struct CloudflareError {
    message: String,
}

#[derive(Debug, Deserialize)]
struct DnsRecord {
    id: String,
    content: String,
}

#[derive(Debug, Serialize)]
struct UpdateRequest<'a> {
    #[serde(rename = "type")]
    record_type: &'a str,
    name: &'a str,
    content: &'a str,
    ttl: u32,
    proxied: bool,
}

impl CloudflareUpdater {
    /// Build an updater from the `[cloudflare]` configuration section.
    pub fn from_config(config: &CloudflareConfig) -> Self {
        Self::with_base_url(config, DEFAULT_BASE_URL.to_string())
    }

    /// Create with custom base URL (for testing).
    pub fn with_base_url(config: &CloudflareConfig, base_url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_token: resolve_env(&config.api_token),
            zone_id: config.zone_id.clone(),
            dns_type: config.dns_type.clone(),
            record_name: config.record_name.clone(),
            ttl: config.ttl,
            proxied: config.proxied,
            max_retries: config.max_retries.max(1),
            retry_delay: config.retry_delay(),
            base_url,
        }
    }

    /// Resolve the provider-assigned id of the configured record.
    ///
    /// Performed once per update call, never retried: an empty result set
    /// means the record does not exist and repeating the query changes
    /// nothing.
    async fn get_record(&self) -> Result<DnsRecord> {
        let url = format!(
            "{}/client/v4/zones/{}/dns_records?type={}&name={}",
            self.base_url, self.zone_id, self.dns_type, self.record_name
        );

        let response: CloudflareResponse<Vec<DnsRecord>> = self
            .client
            .get(&url)
            .header("Authorization", format!("Bearer {}", self.api_token))
            .send()
            .await?
            .json()
            .await?;

        if !response.success {
            return Err(MonitorError::Provider {
                provider: "cloudflare".to_string(),
                message: first_error(&response.errors),
            });
        }

        response
            .result
            .and_then(|records| records.into_iter().next())
            .ok_or_else(|| MonitorError::RecordNotFound(self.record_name.clone()))
    }

    /// One attempt at rewriting the record's content.
    async fn put_record(&self, record_id: &str, ip: &PublicIp) -> Result<()> {
        let url = format!(
            "{}/client/v4/zones/{}/dns_records/{}",
            self.base_url, self.zone_id, record_id
        );

        let request = UpdateRequest {
            record_type: &self.dns_type,
            name: &self.record_name,
            content: ip.as_str(),
            ttl: self.ttl,
            proxied: self.proxied,
        };

        let response: CloudflareResponse<DnsRecord> = self
            .client
            .put(&url)
            .header("Authorization", format!("Bearer {}", self.api_token))
            .json(&request)
            .send()
            .await?
            .json()
            .await?;

        if response.success {
            Ok(())
        } else {
            Err(MonitorError::Provider {
                provider: "cloudflare".to_string(),
                message: first_error(&response.errors),
            })
        }
    }
}

fn first_error(errors: &[CloudflareError]) -> String {
    errors
        .first()
        .map(|e| e.message.clone())
        .unwrap_or_else(|| "Unknown error".to_string())
}

#[async_trait]
impl DnsUpdater for CloudflareUpdater {
    fn name(&self) -> &'static str {
        "cloudflare"
    }

    fn record(&self) -> String {
        self.record_name.clone()
    }

    async fn update(&self, ip: &PublicIp) -> Result<UpdateResult> {
        let record = self.get_record().await?;
        tracing::debug!("Resolved DNS record id {} for {}", record.id, self.record_name);

        let mut last_err = None;
        for attempt in 1..=self.max_retries {
            match self.put_record(&record.id, ip).await {
                Ok(()) => {
                    tracing::info!("DNS record {} updated to {}", self.record_name, ip);
                    return Ok(UpdateResult {
                        record: self.record_name.clone(),
                        ip: ip.to_string(),
                        previous: Some(record.content.clone()),
                        timestamp: chrono::Utc::now(),
                    });
                }
                Err(e) => {
                    tracing::warn!(
                        "DNS update attempt {}/{} failed: {}",
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
            provider: "cloudflare".to_string(),
            message: "Update failed".to_string(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path_regex, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_config(max_retries: u32) -> CloudflareConfig {
        CloudflareConfig {
            zone_id: "zone-123".to_string(),
            api_token: "test-token".to_string(),
            dns_type: "A".to_string(),
            record_name: "home.example.com".to_string(),
            ttl: 120,
            proxied: false,
            max_retries,
            retry_delay_secs: 0,
        }
    }

    #[tokio::test]
    async fn test_update_success() {
        let mock_server = MockServer::start().await;

        let get_response =
            r#"{"success":true,"result":[{"id":"record-123","content":"1.1.1.1"}],"errors":[]}"#;
        let put_response =
            r#"{"success":true,"result":{"id":"record-123","content":"2.2.2.2"},"errors":[]}"#;

        Mock::given(method("GET"))
            .and(path_regex(r"/client/v4/zones/zone-123/dns_records"))
            .and(query_param("type", "A"))
            .and(query_param("name", "home.example.com"))
            .and(header("Authorization", "Bearer test-token"))
            .respond_with(ResponseTemplate::new(200).set_body_string(get_response))
            .expect(1)
            .mount(&mock_server)
            .await;

        Mock::given(method("PUT"))
            .and(path_regex(r"/client/v4/zones/zone-123/dns_records/record-123"))
            .and(header("Authorization", "Bearer test-token"))
            .respond_with(ResponseTemplate::new(200).set_body_string(put_response))
            .expect(1)
            .mount(&mock_server)
            .await;

        let updater = CloudflareUpdater::with_base_url(&test_config(3), mock_server.uri());
        let ip = PublicIp::parse("2.2.2.2").unwrap();
        let result = updater.update(&ip).await.unwrap();

        assert_eq!(result.record, "home.example.com");
        assert_eq!(result.ip, "2.2.2.2");
        assert_eq!(result.previous, Some("1.1.1.1".to_string()));
    }

    #[tokio::test]
    async fn test_record_not_found_skips_update() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path_regex(r"/client/v4/zones/.*/dns_records"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(r#"{"success":true,"result":[],"errors":[]}"#),
            )
            .expect(1)
            .mount(&mock_server)
            .await;

        // No PUT may be attempted when resolution finds nothing
        Mock::given(method("PUT"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&mock_server)
            .await;

        let updater = CloudflareUpdater::with_base_url(&test_config(3), mock_server.uri());
        let ip = PublicIp::parse("2.2.2.2").unwrap();
        let err = updater.update(&ip).await.unwrap_err();

        assert!(matches!(err, MonitorError::RecordNotFound(_)));
    }

    #[tokio::test]
    async fn test_auth_rejection_propagates() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path_regex(r"/client/v4/zones/.*/dns_records"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"{"success":false,"result":null,"errors":[{"message":"Invalid API token"}]}"#,
            ))
            .mount(&mock_server)
            .await;

        let updater = CloudflareUpdater::with_base_url(&test_config(3), mock_server.uri());
        let ip = PublicIp::parse("2.2.2.2").unwrap();
        let err = updater.update(&ip).await.unwrap_err();

        assert!(matches!(err, MonitorError::Provider { .. }));
    }

    #[tokio::test]
    async fn test_update_step_is_retried_but_resolution_is_not() {
        let mock_server = MockServer::start().await;

        let get_response =
            r#"{"success":true,"result":[{"id":"record-123","content":"1.1.1.1"}],"errors":[]}"#;

        Mock::given(method("GET"))
            .and(path_regex(r"/client/v4/zones/.*/dns_records"))
            .respond_with(ResponseTemplate::new(200).set_body_string(get_response))
            .expect(1)
            .mount(&mock_server)
            .await;

        Mock::given(method("PUT"))
            .and(path_regex(r"/client/v4/zones/.*/dns_records/record-123"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"{"success":false,"result":null,"errors":[{"message":"API busy"}]}"#,
            ))
            .expect(3)
            .mount(&mock_server)
            .await;

        let updater = CloudflareUpdater::with_base_url(&test_config(3), mock_server.uri());
        let ip = PublicIp::parse("2.2.2.2").unwrap();
        let err = updater.update(&ip).await.unwrap_err();

        assert!(matches!(err, MonitorError::Provider { .. }));
    }

    #[tokio::test]
    async fn test_update_recovers_on_second_attempt() {
        let mock_server = MockServer::start().await;

        let get_response =
            r#"{"success":true,"result":[{"id":"record-123","content":"1.1.1.1"}],"errors":[]}"#;

        Mock::given(method("GET"))
            .and(path_regex(r"/client/v4/zones/.*/dns_records"))
            .respond_with(ResponseTemplate::new(200).set_body_string(get_response))
            .mount(&mock_server)
            .await;

        Mock::given(method("PUT"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"{"success":false,"result":null,"errors":[{"message":"API busy"}]}"#,
            ))
            .up_to_n_times(1)
            .mount(&mock_server)
            .await;

        Mock::given(method("PUT"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"{"success":true,"result":{"id":"record-123","content":"2.2.2.2"},"errors":[]}"#,
            ))
            .mount(&mock_server)
            .await;

        let updater = CloudflareUpdater::with_base_url(&test_config(3), mock_server.uri());
        let ip = PublicIp::parse("2.2.2.2").unwrap();
        let result = updater.update(&ip).await.unwrap();

        assert_eq!(result.ip, "2.2.2.2");
    }
}
