use std::time::Duration;

use reqwest::Url;
use serde_json::Value;

use crate::config::{OAuthClientConfig, OAuthConfig};
use crate::errors::AppError;
use super::profile::{OAuthProfile, dev_profile, parse_profile, parse_token_response};
use super::provider::Provider;

/// True for credentials left at their unset or sample value.
pub fn is_placeholder(client_id: &str) -> bool {
    let id = client_id.trim();
    id.is_empty() || id.starts_with("YOUR_")
}

/// HTTP side of the authorization-code flow for both providers.
#[derive(Clone)]
pub struct OAuthClient {
    http: reqwest::Client,
    config: OAuthConfig,
    base_url: String,
}

impl OAuthClient {
    pub fn new(config: OAuthConfig, base_url: &str) -> Result<Self, AppError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            http,
            config,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn credentials(&self, provider: Provider) -> &OAuthClientConfig {
        match provider {
            Provider::Google => &self.config.google,
            Provider::Facebook => &self.config.facebook,
        }
    }

    /// Development mode needs the explicit flag and placeholder credentials.
    pub fn uses_dev_mode(&self, provider: Provider) -> bool {
        self.config.dev_mode && is_placeholder(&self.credentials(provider).client_id)
    }

    pub fn redirect_uri(&self, provider: Provider) -> String {
        format!("{}/auth/{}/callback", self.base_url, provider.as_str())
    }

    pub fn authorize_url(&self, provider: Provider, state: &str) -> Result<String, AppError> {
        let redirect_uri = self.redirect_uri(provider);
        let creds = self.credentials(provider);
        let mut params = vec![
            ("client_id", creds.client_id.as_str()),
            ("redirect_uri", redirect_uri.as_str()),
            ("response_type", "code"),
            ("scope", provider.scope()),
            ("state", state),
        ];
        if provider == Provider::Google {
            params.push(("access_type", "online"));
            params.push(("prompt", "select_account"));
        }
        let url = Url::parse_with_params(provider.authorize_endpoint(), &params)
            .map_err(|e| AppError::OAuth(format!("build {provider} authorize URL: {e}")))?;
        Ok(url.to_string())
    }

    /// Trade the authorization code for an access token.
    pub async fn exchange_code(&self, provider: Provider, code: &str) -> Result<String, AppError> {
        let redirect_uri = self.redirect_uri(provider);
        let creds = self.credentials(provider);
        let params = [
            ("client_id", creds.client_id.as_str()),
            ("client_secret", creds.client_secret.as_str()),
            ("redirect_uri", redirect_uri.as_str()),
            ("code", code),
            ("grant_type", "authorization_code"),
        ];
        let request = match provider {
            Provider::Google => self.http.post(provider.token_endpoint()).form(&params),
            Provider::Facebook => self.http.get(provider.token_endpoint()).query(&params),
        };
        let body: Value = request.send().await?.json().await?;
        parse_token_response(provider, &body)
    }

    pub async fn fetch_profile(&self, provider: Provider, access_token: &str) -> Result<OAuthProfile, AppError> {
        let body: Value = self
            .http
            .get(provider.profile_endpoint())
            .bearer_auth(access_token)
            .send()
            .await?
            .json()
            .await?;
        parse_profile(provider, &body)
    }

    /// Code → token → profile, or the fabricated profile in development mode.
    pub async fn complete(&self, provider: Provider, code: &str) -> Result<OAuthProfile, AppError> {
        if self.uses_dev_mode(provider) {
            log::warn!("OAuth development mode: skipping {provider} and using a fabricated profile");
            return Ok(dev_profile(provider));
        }
        if code.trim().is_empty() {
            return Err(AppError::OAuth(format!("{provider} callback without code")));
        }
        let token = self.exchange_code(provider, code).await?;
        self.fetch_profile(provider, &token).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(google_id: &str, dev_mode: bool) -> OAuthClient {
        let config = OAuthConfig {
            google: OAuthClientConfig { client_id: google_id.into(), client_secret: "s3cret".into() },
            facebook: OAuthClientConfig::default(),
            dev_mode,
        };
        OAuthClient::new(config, "https://portal.src.edu/").unwrap()
    }

    #[test]
    fn placeholder_detection() {
        assert!(is_placeholder(""));
        assert!(is_placeholder("YOUR_GOOGLE_CLIENT_ID"));
        assert!(!is_placeholder("1234.apps.googleusercontent.com"));
    }

    #[test]
    fn dev_mode_requires_flag_and_placeholder() {
        assert!(!client("1234.apps.googleusercontent.com", true).uses_dev_mode(Provider::Google));
        assert!(!client("", false).uses_dev_mode(Provider::Google));
        assert!(client("", true).uses_dev_mode(Provider::Google));
        assert!(client("1234.apps.googleusercontent.com", true).uses_dev_mode(Provider::Facebook));
    }

    #[test]
    fn authorize_url_carries_state_and_redirect() {
        let url = client("1234.apps.googleusercontent.com", false)
            .authorize_url(Provider::Google, "abc123")
            .unwrap();
        let parsed = Url::parse(&url).unwrap();
        assert_eq!(parsed.host_str(), Some("accounts.google.com"));
        let pairs: Vec<(String, String)> = parsed.query_pairs().into_owned().collect();
        assert!(pairs.contains(&("state".into(), "abc123".into())));
        assert!(pairs.contains(&(
            "redirect_uri".into(),
            "https://portal.src.edu/auth/google/callback".into()
        )));
        assert!(pairs.contains(&("response_type".into(), "code".into())));
    }

    #[actix_rt::test]
    async fn dev_mode_completes_without_network() {
        let profile = client("YOUR_CLIENT_ID", true).complete(Provider::Google, "").await.unwrap();
        assert_eq!(profile.provider, Provider::Google);
        assert!(profile.email.is_some());
    }
}
