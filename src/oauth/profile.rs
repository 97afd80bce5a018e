use serde_json::Value;

use crate::errors::AppError;
use super::provider::Provider;

/// Normalized identity returned by a provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OAuthProfile {
    pub provider: Provider,
    pub id: String,
    pub email: Option<String>,
    /// Whether the provider vouches that `email` belongs to this identity.
    pub email_verified: bool,
    pub first_name: String,
    pub last_name: String,
    pub picture: String,
}

impl OAuthProfile {
    /// The email, only when the provider has verified it.
    pub fn verified_email(&self) -> Option<&str> {
        self.email.as_deref().filter(|_| self.email_verified)
    }
}

fn str_field(v: &Value, key: &str) -> String {
    v.get(key)
        .and_then(Value::as_str)
        .map(|s| s.trim().to_string())
        .unwrap_or_default()
}

/// Ids arrive as strings from both providers, but accept numbers too.
fn id_field(v: &Value) -> Option<String> {
    match v.get("id")? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn email_field(v: &Value) -> Option<String> {
    let email = str_field(v, "email");
    if email.is_empty() { None } else { Some(email) }
}

/// Google's v2 userinfo sends `verified_email`, the OpenID endpoint `email_verified`.
fn google_email_verified(v: &Value) -> bool {
    ["verified_email", "email_verified"].iter().any(|key| match v.get(*key) {
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => s == "true",
        _ => false,
    })
}

/// Provider-reported error, if the body carries one.
fn provider_error(v: &Value) -> Option<String> {
    let err = v.get("error")?;
    let text = match err {
        Value::String(s) => {
            let desc = str_field(v, "error_description");
            if desc.is_empty() { s.clone() } else { format!("{s}: {desc}") }
        }
        Value::Object(_) => err
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("unknown error")
            .to_string(),
        other => other.to_string(),
    };
    Some(text)
}

/// Extract the access token from a token endpoint response.
pub fn parse_token_response(provider: Provider, body: &Value) -> Result<String, AppError> {
    if let Some(err) = provider_error(body) {
        return Err(AppError::OAuth(format!("{provider} token endpoint returned error: {err}")));
    }
    let token = str_field(body, "access_token");
    if token.is_empty() {
        return Err(AppError::OAuth(format!("{provider} token response has no access_token")));
    }
    Ok(token)
}

pub fn parse_google_profile(body: &Value) -> Result<OAuthProfile, AppError> {
    if let Some(err) = provider_error(body) {
        return Err(AppError::OAuth(format!("google userinfo error: {err}")));
    }
    let id = id_field(body).ok_or_else(|| AppError::OAuth("google profile has no id".to_string()))?;
    Ok(OAuthProfile {
        provider: Provider::Google,
        id,
        email: email_field(body),
        email_verified: google_email_verified(body),
        first_name: str_field(body, "given_name"),
        last_name: str_field(body, "family_name"),
        picture: str_field(body, "picture"),
    })
}

pub fn parse_facebook_profile(body: &Value) -> Result<OAuthProfile, AppError> {
    if let Some(err) = provider_error(body) {
        return Err(AppError::OAuth(format!("facebook graph error: {err}")));
    }
    let id = id_field(body).ok_or_else(|| AppError::OAuth("facebook profile has no id".to_string()))?;
    // The Graph API only returns confirmed addresses
    let email = email_field(body);
    let picture = body
        .pointer("/picture/data/url")
        .and_then(Value::as_str)
        .unwrap_or("")
        .to_string();
    Ok(OAuthProfile {
        provider: Provider::Facebook,
        id,
        email_verified: email.is_some(),
        email,
        first_name: str_field(body, "first_name"),
        last_name: str_field(body, "last_name"),
        picture,
    })
}

pub fn parse_profile(provider: Provider, body: &Value) -> Result<OAuthProfile, AppError> {
    match provider {
        Provider::Google => parse_google_profile(body),
        Provider::Facebook => parse_facebook_profile(body),
    }
}

/// Fixed identity used when development mode bypasses the provider.
pub fn dev_profile(provider: Provider) -> OAuthProfile {
    OAuthProfile {
        provider,
        id: format!("dev-{}-0001", provider.as_str()),
        email: Some(format!("dev.{}@example.com", provider.as_str())),
        email_verified: true,
        first_name: "Dev".to_string(),
        last_name: format!("{} User", provider.label()),
        picture: String::new(),
    }
}
