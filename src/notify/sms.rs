use std::time::Duration;

use serde::Serialize;

use crate::config::{SmsConfig, SmsMode};

/// Text message sender behind a single `send(destination, message)` call.
#[derive(Clone)]
pub struct SmsSender {
    backend: SmsBackend,
}

#[derive(Clone)]
enum SmsBackend {
    Disabled,
    Log,
    Http {
        client: reqwest::Client,
        endpoint: String,
        api_key: String,
        sender_id: String,
    },
}

#[derive(Serialize)]
struct GatewayRequest<'a> {
    to: &'a str,
    from: &'a str,
    message: &'a str,
}

impl SmsSender {
    pub fn new(config: &SmsConfig) -> Result<Self, String> {
        let backend = match config.mode {
            SmsMode::Disabled => SmsBackend::Disabled,
            SmsMode::Log => SmsBackend::Log,
            SmsMode::Http => {
                if config.endpoint.trim().is_empty() {
                    return Err("SMS_MODE=http requires SMS_ENDPOINT".to_string());
                }
                let client = reqwest::Client::builder()
                    .timeout(Duration::from_secs(10))
                    .build()
                    .map_err(|e| format!("build SMS HTTP client: {e}"))?;
                SmsBackend::Http {
                    client,
                    endpoint: config.endpoint.clone(),
                    api_key: config.api_key.clone(),
                    sender_id: config.sender_id.clone(),
                }
            }
        };
        Ok(Self { backend })
    }

    pub fn disabled() -> Self {
        Self { backend: SmsBackend::Disabled }
    }

    pub fn is_enabled(&self) -> bool {
        !matches!(self.backend, SmsBackend::Disabled)
    }

    pub async fn send(&self, destination: &str, message: &str) -> Result<(), String> {
        let destination = destination.trim();
        if destination.is_empty() {
            return Err("empty SMS destination".to_string());
        }
        match &self.backend {
            SmsBackend::Disabled => {
                log::debug!("SMS disabled, dropping message to {destination}");
                Ok(())
            }
            SmsBackend::Log => {
                log::info!("SMS to {destination}: {message}");
                Ok(())
            }
            SmsBackend::Http { client, endpoint, api_key, sender_id } => {
                let mut request = client.post(endpoint).json(&GatewayRequest {
                    to: destination,
                    from: sender_id,
                    message,
                });
                if !api_key.is_empty() {
                    request = request.bearer_auth(api_key);
                }
                let response = request.send().await.map_err(|e| format!("SMS gateway request: {e}"))?;
                let status = response.status();
                if !status.is_success() {
                    let body = response.text().await.unwrap_or_default();
                    return Err(format!("SMS gateway returned {status}: {body}"));
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(mode: SmsMode, endpoint: &str) -> SmsConfig {
        SmsConfig {
            mode,
            endpoint: endpoint.into(),
            api_key: String::new(),
            sender_id: "SRC".into(),
        }
    }

    #[test]
    fn http_mode_needs_endpoint() {
        assert!(SmsSender::new(&config(SmsMode::Http, "")).is_err());
        assert!(SmsSender::new(&config(SmsMode::Http, "https://sms.example.com/send")).is_ok());
    }

    #[tokio::test]
    async fn log_mode_accepts_and_empty_destination_fails() {
        let sender = SmsSender::new(&config(SmsMode::Log, "")).unwrap();
        assert!(sender.is_enabled());
        assert!(sender.send("+233201234567", "Your feedback was resolved").await.is_ok());
        assert!(sender.send("  ", "x").await.is_err());
        assert!(!SmsSender::disabled().is_enabled());
    }
}
